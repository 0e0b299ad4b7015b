use crate::request::DatasetIdentity;

/// IRIDL data library at Columbia (scheme + host, no trailing slash).
pub const DEFAULT_BASE_URL: &str = "https://iridl.ldeo.columbia.edu";

/// Built-in catalog entries, addressable by a short name.
///
/// Tokens carry the leading `.` that IRIDL uses to select a sub-entry.
pub fn preset(name: &str) -> Option<DatasetIdentity> {
    let frequency = match name {
        "chirps-daily" => ".daily",
        "chirps-daily-improved" => ".daily-improved",
        _ => return None,
    };

    Some(
        DatasetIdentity::new(".UCSB", ".CHIRPS", ".v2p0", frequency, ".0p05", ".prcp")
            .with_scope(".global"),
    )
}

pub fn preset_names() -> &'static [&'static str] {
    &["chirps-daily", "chirps-daily-improved"]
}
