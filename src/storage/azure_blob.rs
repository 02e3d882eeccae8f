//! Azure Blob Storage uploads authenticated with the Shared Key scheme.
//!
//! Only `Put Blob` (BlockBlob, overwrite) is implemented.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;

use crate::errors::StorageError;
use crate::types::Report;

use super::{ReportStore, encode_report};

const STORAGE_API_VERSION: &str = "2021-08-06";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

type HmacSha256 = Hmac<Sha256>;

/// Parsed `DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...` string.
#[derive(Clone)]
pub struct ConnectionString {
    pub account_name: String,
    account_key: Vec<u8>,
    pub blob_endpoint: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut suffix = None;
        let mut blob_endpoint = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Account keys are base64 and may end in '=', so split on the first one only.
            let Some((key, value)) = part.split_once('=') else {
                return Err(StorageError::InvalidConnectionString(format!(
                    "segment without '=': {part}"
                )));
            };
            match key {
                "DefaultEndpointsProtocol" => protocol = Some(value.to_string()),
                "AccountName" => account_name = Some(value.to_string()),
                "AccountKey" => account_key = Some(value.to_string()),
                "EndpointSuffix" => suffix = Some(value.to_string()),
                "BlobEndpoint" => blob_endpoint = Some(value.to_string()),
                _ => {}
            }
        }

        let account_name = account_name.ok_or_else(|| {
            StorageError::InvalidConnectionString("missing AccountName".to_string())
        })?;
        let account_key = account_key.ok_or_else(|| {
            StorageError::InvalidConnectionString("missing AccountKey".to_string())
        })?;
        let account_key = BASE64.decode(account_key.as_bytes()).map_err(|e| {
            StorageError::InvalidConnectionString(format!("AccountKey is not base64: {e}"))
        })?;

        let blob_endpoint = match blob_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or("https"),
                account_name,
                suffix.as_deref().unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ),
        };

        Ok(Self {
            account_name,
            account_key,
            blob_endpoint,
        })
    }

    fn sign(&self, string_to_sign: &str) -> Result<String, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.account_key)
            .map_err(|e| StorageError::InvalidConnectionString(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

/// Canonical Shared Key string for a `PUT` with only `x-ms-*` headers set.
fn put_string_to_sign(
    content_length: usize,
    content_type: &str,
    ms_headers: &[(&str, &str)],
    canonical_resource: &str,
) -> String {
    let mut headers: Vec<(String, &str)> = ms_headers
        .iter()
        .map(|&(k, v)| (k.to_ascii_lowercase(), v.trim()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();

    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    // VERB, Content-Encoding, Content-Language, Content-Length, Content-MD5,
    // Content-Type, Date, If-Modified-Since, If-Match, If-None-Match,
    // If-Unmodified-Since, Range
    format!(
        "PUT\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
    )
}

pub struct AzureBlobStore {
    client: reqwest::Client,
    conn: ConnectionString,
    container: String,
}

impl AzureBlobStore {
    pub fn new(
        conn: ConnectionString,
        container: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            conn,
            container: container.into(),
        })
    }

    fn blob_url(&self, blob_name: &str) -> Result<reqwest::Url, StorageError> {
        let raw = format!(
            "{}/{}/{}",
            self.conn.blob_endpoint, self.container, blob_name
        );
        reqwest::Url::parse(&raw)
            .map_err(|e| StorageError::InvalidConnectionString(format!("bad blob URL {raw}: {e}")))
    }

    /// Upload `body` as a block blob, replacing any existing blob of that name.
    pub async fn put_blob(
        &self,
        blob_name: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.blob_url(blob_name)?;
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();

        let ms_headers = [
            ("x-ms-blob-type", "BlockBlob"),
            ("x-ms-date", date.as_str()),
            ("x-ms-version", STORAGE_API_VERSION),
        ];
        let canonical_resource = format!("/{}{}", self.conn.account_name, url.path());
        let string_to_sign =
            put_string_to_sign(body.len(), content_type, &ms_headers, &canonical_resource);
        let authorization = format!(
            "SharedKey {}:{}",
            self.conn.account_name,
            self.conn.sign(&string_to_sign)?
        );

        let mut request = self
            .client
            .put(url)
            .header("Content-Type", content_type)
            .header("Authorization", authorization);
        for (name, value) in ms_headers {
            request = request.header(name, value);
        }

        let res = request.body(body).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(StorageError::Upload { status, body });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReportStore for AzureBlobStore {
    async fn persist(&self, report: &Report) -> Result<String, StorageError> {
        let (name, body) = encode_report(report)?;
        self.put_blob(&name, body, "application/json").await?;
        log::info!(
            "report uploaded to {}/{}/{}",
            self.conn.blob_endpoint,
            self.container,
            name
        );
        Ok(name)
    }

    fn name(&self) -> &str {
        "azure-blob"
    }
}
