use tracing::debug;

use crate::error::{Error, Result};
use crate::request::{DatasetIdentity, Interval, SpatialRange, TemporalRange};
use crate::sources::DEFAULT_BASE_URL;

/// Every query ends by asking for the subset as NetCDF.
pub const DATA_SUFFIX: &str = "data.nc";

const RANGE: &str = "RANGE";

/// `SOURCES/<source>/<dataset>/<version>/<frequency>/<scope>/<resolution>/<variable>`
pub fn identity_segments(identity: &DatasetIdentity) -> [&str; 8] {
    [
        "SOURCES",
        identity.source.as_str(),
        identity.dataset.as_str(),
        identity.version.as_str(),
        identity.frequency.as_str(),
        identity.scope.as_str(),
        identity.resolution.as_str(),
        identity.variable.as_str(),
    ]
}

/// `X/<min>/<max>/RANGE` style directive.
pub fn range_segment(axis: &str, min: impl std::fmt::Display, max: impl std::fmt::Display) -> String {
    format!("{axis}/{min}/{max}/{RANGE}")
}

fn interval_segment(axis: &str, interval: &Interval) -> Result<String> {
    if !interval.min.is_finite() || !interval.max.is_finite() {
        return Err(Error::InvalidRequest(format!(
            "{axis} range bounds must be finite, got {}..{}",
            interval.min, interval.max
        )));
    }
    Ok(range_segment(axis, interval.min, interval.max))
}

/// Ordered path segments of the query, without the host prefix.
///
/// The server reads these positionally; the order here is fixed.
pub fn query_segments(
    identity: &DatasetIdentity,
    spatial: Option<&SpatialRange>,
    temporal: Option<&TemporalRange>,
) -> Result<Vec<String>> {
    let mut segments: Vec<String> = Vec::with_capacity(24);

    let block = identity_segments(identity);
    segments.extend(block.iter().map(|s| s.to_string()));
    // Upstream publishes "-improved" products under a repeated catalog path.
    if identity.is_improved() {
        segments.extend(block.iter().map(|s| s.to_string()));
    }

    if let Some(spatial) = spatial {
        if let Some(lon) = &spatial.lon {
            segments.push(interval_segment("X", lon)?);
        }
        if let Some(lat) = &spatial.lat {
            segments.push(interval_segment("Y", lat)?);
        }
    }

    if let Some(temporal) = temporal {
        let (start, end) = temporal.encode()?;
        segments.push(range_segment("T", start, end));
    }

    segments.push(DATA_SUFFIX.to_string());
    Ok(segments)
}

/// Query URL on the public IRIDL host.
pub fn build_url(
    identity: &DatasetIdentity,
    spatial: Option<&SpatialRange>,
    temporal: Option<&TemporalRange>,
) -> Result<String> {
    build_url_with_base(DEFAULT_BASE_URL, identity, spatial, temporal)
}

/// Query URL under an explicit scheme+host prefix (mirrors, test servers).
///
/// Segments are joined verbatim: the `%20` inside encoded dates is already
/// escaped and must reach the server as-is.
pub fn build_url_with_base(
    base_url: &str,
    identity: &DatasetIdentity,
    spatial: Option<&SpatialRange>,
    temporal: Option<&TemporalRange>,
) -> Result<String> {
    let segments = query_segments(identity, spatial, temporal)?;
    let url = format!("{}/{}", base_url.trim_end_matches('/'), segments.join("/"));
    debug!(%url, "built extraction url");
    Ok(url)
}
