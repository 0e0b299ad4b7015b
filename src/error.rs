use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid date format: {0} (expected YYYY-MM-DD, e.g. 1991-01-01)")]
    InvalidDateFormat(String),

    #[error("missing {missing} bound for {axis} range")]
    MissingRangeBound {
        axis: &'static str,
        missing: &'static str,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP {status} downloading {url}")]
    TransferStatus { url: String, status: u16 },

    #[error("transfer of {url} interrupted after {bytes_written} bytes: {source}")]
    TransferInterrupted {
        url: String,
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("integrity check failed for {url}: expected {expected} bytes, got {actual}")]
    Integrity {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures raised while talking to the data server or streaming its
    /// response, as opposed to request construction or local file errors.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Error::TransferStatus { .. }
                | Error::TransferInterrupted { .. }
                | Error::Integrity { .. }
                | Error::Http(_)
        )
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::TransferStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transfer_errors() {
        let e = Error::TransferStatus {
            url: "https://example.org/data.nc".into(),
            status: 404,
        };
        assert!(e.is_transfer());
        assert_eq!(e.status(), Some(404));

        assert!(!Error::InvalidDateFormat("2023/01/05".into()).is_transfer());
        assert!(
            !Error::MissingRangeBound {
                axis: "longitude",
                missing: "max"
            }
            .is_transfer()
        );
    }

    #[test]
    fn messages_carry_context() {
        let e = Error::InvalidDateFormat("2023/01/05".into());
        assert!(e.to_string().contains("2023/01/05"));

        let e = Error::MissingRangeBound {
            axis: "latitude",
            missing: "min",
        };
        assert_eq!(e.to_string(), "missing min bound for latitude range");
    }
}
