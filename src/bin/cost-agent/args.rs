use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub question: Option<String>, // -q/--question
    pub config: Option<PathBuf>,  // -c/--config
    pub bind: Option<String>,     // -b/--bind
    pub once: bool,               // --once
    pub help: bool,               // -h/--help
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        Self::parse_from(&args[1..])
    }

    /// Parse from a slice of arguments (for testing)
    pub fn parse_from(args: &[String]) -> Result<Self> {
        let mut result = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];

            match arg.as_str() {
                "-q" | "--question" => {
                    i += 1;
                    if i >= args.len() {
                        return Err(anyhow!("{arg} requires a value"));
                    }
                    result.question = Some(args[i].clone());
                }
                "-c" | "--config" => {
                    i += 1;
                    if i >= args.len() {
                        return Err(anyhow!("{arg} requires a value"));
                    }
                    result.config = Some(PathBuf::from(&args[i]));
                }
                "-b" | "--bind" => {
                    i += 1;
                    if i >= args.len() {
                        return Err(anyhow!("{arg} requires a value"));
                    }
                    result.bind = Some(args[i].clone());
                }
                "--once" => {
                    result.once = true;
                }
                "-h" | "--help" => {
                    result.help = true;
                }
                unknown => {
                    return Err(anyhow!("Unknown argument: {unknown}"));
                }
            }

            i += 1;
        }

        if result.question.is_some() && !result.once {
            return Err(anyhow!("--question only applies with --once"));
        }

        Ok(result)
    }

    pub fn usage() -> &'static str {
        "Usage: cost-agent [--once [-q QUESTION]] [-c CONFIG] [-b ADDR]

  --once             run the pipeline once, print the report and exit
  -q, --question     question for --once (default: \"Explore my Azure costs\")
  -c, --config       JSON config file (default: .cost-agent/config.json)
  -b, --bind         listen address for the HTTP server
  -h, --help         show this help"
    }
}
