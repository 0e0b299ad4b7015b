#![forbid(unsafe_code)]

//! Rust client for extracting subsets of gridded climate datasets from the
//! IRIDL data library.
//!
//! An [`ExtractionRequest`] names a catalog entry (source, dataset, version,
//! frequency, resolution, variable, scope) and optionally a longitude/latitude
//! box and a time range. It is turned into the data library's positional query
//! path (`.../X/<min>/<max>/RANGE/Y/.../T/Jan%201991/Dec%202000/RANGE/data.nc`)
//! and the resulting NetCDF file is streamed to disk.
//!
//! **Quick start**
//! ```no_run
//! use iridl_extract::{Client, ClientOptions, DatasetIdentity, ExtractionRequest};
//!
//! let client = Client::new(ClientOptions::default())?;
//!
//! let identity = DatasetIdentity::preset("chirps-daily").expect("known preset");
//! let req = ExtractionRequest::new(identity)
//!     .point(38.75, 9.0192)
//!     .iso_dates("2023-01-01", "2023-01-05");
//!
//! let result = client.retrieve(&req, "chirps_addis.nc")?;
//! println!("{} bytes from {}", result.size_bytes, result.url);
//! # Ok::<(), iridl_extract::Error>(())
//! ```
//!
//! **URL only**
//! ```
//! use iridl_extract::{build_url, DatasetIdentity, SpatialRange, TemporalRange};
//!
//! let id = DatasetIdentity::new(".UCSB", ".CHIRPS", ".v2p0", ".daily", ".0p05", ".prcp")
//!     .with_scope(".global");
//! let url = build_url(
//!     &id,
//!     Some(&SpatialRange::bbox(48.0, 49.0, 16.0, 18.0)),
//!     Some(&TemporalRange::month_year("Jan", "1991", "Dec", "2000")),
//! )?;
//! assert!(url.ends_with("/X/48/49/RANGE/Y/16/18/RANGE/T/Jan%201991/Dec%202000/RANGE/data.nc"));
//! # Ok::<(), iridl_extract::Error>(())
//! ```
//!
//! Notes:
//! - Nothing is retried. Wrap [`Client::download`] yourself if you need that.
//! - No timeout is applied unless [`ClientOptions::timeout`] is set.

mod client;
mod config;
mod date;
mod error;
mod request;
mod sources;
mod transfer;
mod url_builder;

pub use crate::client::{Client, ClientOptions, Retrieval, DEFAULT_CHUNK_SIZE, DEFAULT_TARGET};
pub use crate::date::{encode_date, encode_month_year, EncodedDate, MONTH_ABBREVIATIONS};
pub use crate::error::{Error, Result};
pub use crate::request::{
    DatasetIdentity, ExtractionRequest, Interval, SpatialRange, TemporalRange, DEFAULT_SCOPE,
};
pub use crate::sources::{preset_names, DEFAULT_BASE_URL};
pub use crate::url_builder::{build_url, build_url_with_base, query_segments};
