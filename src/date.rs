use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};

/// Month tokens understood by the IRIDL `T` axis, independent of host locale.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Already URL-encoded space between month and year. Must not be encoded again.
pub const ENCODED_SPACE: &str = "%20";

/// A date in the form used inside a `T/<start>/<end>/RANGE` segment,
/// e.g. `Jan%201991`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedDate(String);

impl EncodedDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedDate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a strict `YYYY-MM-DD` string.
///
/// chrono alone would accept `2023-1-5` or a signed year, so the shape is
/// checked before the calendar is consulted.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    let b = s.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shape_ok {
        return Err(Error::InvalidDateFormat(s.to_string()));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::InvalidDateFormat(s.to_string()))
}

/// `1991-01-05` -> `Jan%201991`.
pub fn encode_date(iso_date: &str) -> Result<EncodedDate> {
    let d = parse_iso_date(iso_date)?;
    Ok(encode_naive_date(&d))
}

pub fn encode_naive_date(date: &NaiveDate) -> EncodedDate {
    let month = MONTH_ABBREVIATIONS[date.month0() as usize];
    EncodedDate(format!("{month}{ENCODED_SPACE}{:04}", date.year()))
}

/// Month/year tokens are taken as given; only presence is checked.
pub fn encode_month_year(month: &str, year: &str) -> Result<EncodedDate> {
    if month.trim().is_empty() {
        return Err(Error::MissingRangeBound {
            axis: "time",
            missing: "month",
        });
    }
    if year.trim().is_empty() {
        return Err(Error::MissingRangeBound {
            axis: "time",
            missing: "year",
        });
    }
    Ok(EncodedDate(format!("{month}{ENCODED_SPACE}{year}")))
}
