use std::time::Duration;

use crate::client::ClientOptions;
use crate::error::{Error, Result};

pub const ENV_BASE_URL: &str = "IRIDL_BASE_URL";
pub const ENV_VERIFY_TLS: &str = "IRIDL_VERIFY_TLS";
pub const ENV_TIMEOUT_SECS: &str = "IRIDL_TIMEOUT_SECS";
pub const ENV_CHUNK_SIZE: &str = "IRIDL_CHUNK_SIZE";

impl ClientOptions {
    /// Defaults overridden by `IRIDL_BASE_URL`, `IRIDL_VERIFY_TLS`,
    /// `IRIDL_TIMEOUT_SECS` and `IRIDL_CHUNK_SIZE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut opts = ClientOptions::default();
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            opts.base_url = url;
        }

        if let Some(v) = get(ENV_VERIFY_TLS) {
            opts.verify_tls = parse_bool(ENV_VERIFY_TLS, &v)?;
        }

        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = v
                .parse()
                .map_err(|_| Error::InvalidRequest(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {v}")))?;
            // 0 means no timeout, same as leaving it unset.
            opts.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(v) = get(ENV_CHUNK_SIZE) {
            let n: usize = v
                .parse()
                .map_err(|_| Error::InvalidRequest(format!("{ENV_CHUNK_SIZE} must be a byte count, got {v}")))?;
            if n == 0 {
                return Err(Error::InvalidRequest(format!("{ENV_CHUNK_SIZE} must be > 0")));
            }
            opts.chunk_size = n;
        }

        Ok(opts)
    }
}

fn parse_bool(key: &str, v: &str) -> Result<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidRequest(format!("{key} must be a boolean, got {v}"))),
    }
}
