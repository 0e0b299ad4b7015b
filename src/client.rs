use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::request::ExtractionRequest;
use crate::sources::DEFAULT_BASE_URL;
use crate::transfer::{part_path, write_chunks, Chunks};

/// File name used when the caller does not pick one.
pub const DEFAULT_TARGET: &str = "data.nc";

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host the query path is appended to.
    pub base_url: String,
    pub verify_tls: bool,
    /// Whole-request timeout. `None` lets large extractions run as long as they need.
    pub timeout: Option<Duration>,
    /// Upper bound on bytes held in memory per read.
    pub chunk_size: usize,
    /// Draw a progress bar on stderr while downloading.
    pub progress: bool,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            verify_tls: true,
            timeout: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: false,
            user_agent: format!("iridl-extract-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Outcome of [`Client::retrieve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    pub url: String,
    pub target: PathBuf,
    pub size_bytes: u64,
}

/// Blocking client for the data library.
///
/// Holds no per-request state; clones share the connection pool and may be
/// used from several threads at once as long as each download writes to its
/// own destination.
#[derive(Debug, Clone)]
pub struct Client {
    opts: ClientOptions,
    http: HttpClient,
}

impl Client {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let base = Url::parse(&opts.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidRequest(format!(
                "base url must be http(s), got {}",
                opts.base_url
            )));
        }
        if opts.chunk_size == 0 {
            return Err(Error::InvalidRequest("chunk size must be > 0".into()));
        }

        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(&opts.user_agent)
            .map_err(|_| Error::InvalidRequest(format!("invalid user agent: {}", opts.user_agent)))?;
        headers.insert(USER_AGENT, ua);

        let mut builder = HttpClient::builder()
            .default_headers(headers)
            .timeout(opts.timeout);
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self { opts, http })
    }

    /// Client configured from `IRIDL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.opts
    }

    /// Query URL for `request` against the configured host.
    pub fn url_for(&self, request: &ExtractionRequest) -> Result<String> {
        request.url_with_base(&self.opts.base_url)
    }

    /// Build the query for `request` and download the subset to `target`.
    pub fn retrieve(&self, request: &ExtractionRequest, target: impl AsRef<Path>) -> Result<Retrieval> {
        let url = self.url_for(request)?;
        let target = resolve_target(target.as_ref());
        let size_bytes = self.download(&url, &target)?;
        Ok(Retrieval {
            url,
            target,
            size_bytes,
        })
    }

    /// Like [`Client::retrieve`], writing to [`DEFAULT_TARGET`].
    pub fn retrieve_default(&self, request: &ExtractionRequest) -> Result<Retrieval> {
        self.retrieve(request, DEFAULT_TARGET)
    }

    /// Stream `url` into `destination`, returning the number of bytes written.
    ///
    /// The body goes to `<destination>.part` first and is renamed into place
    /// once complete. A failed status leaves the filesystem untouched; a
    /// failure mid-stream leaves the `.part` file behind. No retries.
    pub fn download(&self, url: &str, destination: impl AsRef<Path>) -> Result<u64> {
        let destination = resolve_target(destination.as_ref());
        info!(url, target = %destination.display(), "starting download");

        let resp = self.http.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "data server rejected request");
            return Err(Error::TransferStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let expected = resp.content_length();

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let part = part_path(&destination);
        let mut out = BufWriter::new(File::create(&part)?);

        let pb = self.progress_bar(expected);
        let chunks = Chunks::new(resp, self.opts.chunk_size);
        let written = match write_chunks(url, chunks, &mut out, |n| pb.inc(n)) {
            Ok(n) => n,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        };
        out.flush()?;
        drop(out);
        pb.finish_and_clear();

        // hyper already fails a short body as a read error; this guards
        // transports that hand back a truncated body without one.
        if let Some(expected) = expected {
            if expected != written {
                warn!(url, expected, actual = written, "short download");
                return Err(Error::Integrity {
                    url: url.to_string(),
                    expected,
                    actual: written,
                });
            }
        }

        fs::rename(&part, &destination)?;
        info!(url, bytes = written, target = %destination.display(), "download complete");
        Ok(written)
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.opts.progress {
            return ProgressBar::hidden();
        }
        let pb = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        match ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
        ) {
            Ok(style) => pb.set_style(style.progress_chars("=>-")),
            Err(e) => debug!("progress template rejected: {e}"),
        }
        pb
    }
}

fn resolve_target(target: &Path) -> PathBuf {
    if target.as_os_str().is_empty() {
        PathBuf::from(DEFAULT_TARGET)
    } else {
        target.to_path_buf()
    }
}
