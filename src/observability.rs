/// Initialise `env_logger`. `RUST_LOG` wins; otherwise the service logs at info.
pub fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Info);
    }
    let _ = builder.try_init();
}
