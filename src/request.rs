use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date::{encode_date, encode_month_year, EncodedDate};
use crate::error::{Error, Result};
use crate::url_builder;

/// Scope used when the caller does not name one.
pub const DEFAULT_SCOPE: &str = "global";

const IMPROVED_SUFFIX: &str = "-improved";

const IDENTITY_KEYS: [&str; 6] = ["source", "dataset", "version", "frequency", "resolution", "variable"];

const KNOWN_KEYS: [&str; 17] = [
    "source",
    "dataset",
    "version",
    "frequency",
    "resolution",
    "variable",
    "scope",
    "lon_min",
    "lon_max",
    "lat_min",
    "lat_max",
    "start_date",
    "end_date",
    "start_month",
    "start_year",
    "end_month",
    "end_year",
];

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

/// Catalog path of a dataset variable on the data library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetIdentity {
    pub source: String,
    pub dataset: String,
    pub version: String,
    pub frequency: String,
    pub resolution: String,
    pub variable: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl DatasetIdentity {
    pub fn new(
        source: impl Into<String>,
        dataset: impl Into<String>,
        version: impl Into<String>,
        frequency: impl Into<String>,
        resolution: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            dataset: dataset.into(),
            version: version.into(),
            frequency: frequency.into(),
            resolution: resolution.into(),
            variable: variable.into(),
            scope: default_scope(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Look up a built-in catalog entry such as `chirps-daily`.
    pub fn preset(name: &str) -> Option<Self> {
        crate::sources::preset(name)
    }

    /// The "-improved" frequency is published under a doubled catalog path.
    pub fn is_improved(&self) -> bool {
        self.frequency.ends_with(IMPROVED_SUFFIX)
    }
}

/// Closed `[min, max]` interval on one spatial axis.
///
/// No ordering is enforced; the server decides what a reversed range means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Pair up optional bounds: both or neither.
    pub fn from_bounds(min: Option<f64>, max: Option<f64>, axis: &'static str) -> Result<Option<Self>> {
        match (min, max) {
            (Some(min), Some(max)) => Ok(Some(Self { min, max })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::MissingRangeBound { axis, missing: "max" }),
            (None, Some(_)) => Err(Error::MissingRangeBound { axis, missing: "min" }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialRange {
    #[serde(default)]
    pub lon: Option<Interval>,
    #[serde(default)]
    pub lat: Option<Interval>,
}

impl SpatialRange {
    /// Single grid cell around a site.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            lon: Some(Interval::new(lon, lon)),
            lat: Some(Interval::new(lat, lat)),
        }
    }

    pub fn bbox(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            lon: Some(Interval::new(lon_min, lon_max)),
            lat: Some(Interval::new(lat_min, lat_max)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_none() && self.lat.is_none()
    }
}

/// Time subset, in either of the two forms callers hand us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemporalRange {
    /// `YYYY-MM-DD` endpoints. Only month and year survive encoding.
    Iso { start: String, end: String },
    /// Month abbreviation and year, already in the server's form.
    MonthYear {
        start_month: String,
        start_year: String,
        end_month: String,
        end_year: String,
    },
}

impl TemporalRange {
    pub fn iso(start: impl Into<String>, end: impl Into<String>) -> Self {
        TemporalRange::Iso {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn month_year(
        start_month: impl Into<String>,
        start_year: impl Into<String>,
        end_month: impl Into<String>,
        end_year: impl Into<String>,
    ) -> Self {
        TemporalRange::MonthYear {
            start_month: start_month.into(),
            start_year: start_year.into(),
            end_month: end_month.into(),
            end_year: end_year.into(),
        }
    }

    pub fn from_iso_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        match (start, end) {
            (Some(s), Some(e)) => Ok(Some(Self::iso(s, e))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::MissingRangeBound { axis: "time", missing: "end" }),
            (None, Some(_)) => Err(Error::MissingRangeBound { axis: "time", missing: "start" }),
        }
    }

    pub fn from_month_year_bounds(
        start_month: Option<&str>,
        start_year: Option<&str>,
        end_month: Option<&str>,
        end_year: Option<&str>,
    ) -> Result<Option<Self>> {
        match (start_month, start_year, end_month, end_year) {
            (Some(sm), Some(sy), Some(em), Some(ey)) => Ok(Some(Self::month_year(sm, sy, em, ey))),
            (None, None, None, None) => Ok(None),
            _ => {
                let missing = [
                    (start_month, "start month"),
                    (start_year, "start year"),
                    (end_month, "end month"),
                    (end_year, "end year"),
                ]
                .into_iter()
                .find(|(v, _)| v.is_none())
                .map(|(_, name)| name)
                .unwrap_or("time bound");
                Err(Error::MissingRangeBound { axis: "time", missing })
            }
        }
    }

    /// Resolve both endpoints to the `T` axis encoding.
    pub fn encode(&self) -> Result<(EncodedDate, EncodedDate)> {
        match self {
            TemporalRange::Iso { start, end } => Ok((encode_date(start)?, encode_date(end)?)),
            TemporalRange::MonthYear {
                start_month,
                start_year,
                end_month,
                end_year,
            } => Ok((
                encode_month_year(start_month, start_year)?,
                encode_month_year(end_month, end_year)?,
            )),
        }
    }
}

/// What to cut out of a dataset: catalog entry plus optional space/time subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub identity: DatasetIdentity,
    #[serde(default)]
    pub spatial: Option<SpatialRange>,
    #[serde(default)]
    pub temporal: Option<TemporalRange>,
}

impl ExtractionRequest {
    pub fn new(identity: DatasetIdentity) -> Self {
        Self {
            identity,
            spatial: None,
            temporal: None,
        }
    }

    pub fn spatial(mut self, spatial: SpatialRange) -> Self {
        self.spatial = if spatial.is_empty() { None } else { Some(spatial) };
        self
    }

    pub fn lon(mut self, min: f64, max: f64) -> Self {
        self.spatial.get_or_insert_with(SpatialRange::default).lon = Some(Interval::new(min, max));
        self
    }

    pub fn lat(mut self, min: f64, max: f64) -> Self {
        self.spatial.get_or_insert_with(SpatialRange::default).lat = Some(Interval::new(min, max));
        self
    }

    pub fn point(self, lon: f64, lat: f64) -> Self {
        self.spatial(SpatialRange::point(lon, lat))
    }

    pub fn temporal(mut self, temporal: TemporalRange) -> Self {
        self.temporal = Some(temporal);
        self
    }

    pub fn iso_dates(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.temporal(TemporalRange::iso(start, end))
    }

    pub fn month_year(
        self,
        start_month: impl Into<String>,
        start_year: impl Into<String>,
        end_month: impl Into<String>,
        end_year: impl Into<String>,
    ) -> Self {
        self.temporal(TemporalRange::month_year(start_month, start_year, end_month, end_year))
    }

    /// Query URL against the public data library.
    pub fn url(&self) -> Result<String> {
        url_builder::build_url(&self.identity, self.spatial.as_ref(), self.temporal.as_ref())
    }

    pub fn url_with_base(&self, base_url: &str) -> Result<String> {
        url_builder::build_url_with_base(
            base_url,
            &self.identity,
            self.spatial.as_ref(),
            self.temporal.as_ref(),
        )
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Build a request from keyword/value strings (typical for form or config input).
    ///
    /// Empty values count as absent. Recognized keys: the six identity tokens plus
    /// `scope`, `lon_min`/`lon_max`, `lat_min`/`lat_max`, `start_date`/`end_date`
    /// and `start_month`/`start_year`/`end_month`/`end_year`.
    pub fn from_str_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields: BTreeMap<String, String> = BTreeMap::new();
        for (k, v) in pairs {
            let key = k.as_ref().trim();
            if !KNOWN_KEYS.contains(&key) {
                return Err(Error::InvalidRequest(format!("unknown request key: {key}")));
            }
            let value = v.as_ref().trim();
            if !value.is_empty() {
                fields.insert(key.to_string(), value.to_string());
            }
        }

        let get = |k: &str| field(&fields, k);

        for k in IDENTITY_KEYS {
            if get(k).is_none() {
                return Err(Error::InvalidRequest(format!("missing required field: {k}")));
            }
        }
        let token = |k: &str| get(k).unwrap_or_default().to_string();
        let mut identity = DatasetIdentity::new(
            token("source"),
            token("dataset"),
            token("version"),
            token("frequency"),
            token("resolution"),
            token("variable"),
        );
        if let Some(scope) = get("scope") {
            identity.scope = scope.to_string();
        }

        let lon = Interval::from_bounds(parse_coord(&fields, "lon_min")?, parse_coord(&fields, "lon_max")?, "longitude")?;
        let lat = Interval::from_bounds(parse_coord(&fields, "lat_min")?, parse_coord(&fields, "lat_max")?, "latitude")?;

        let iso = TemporalRange::from_iso_bounds(get("start_date"), get("end_date"))?;
        let month_year = TemporalRange::from_month_year_bounds(
            get("start_month"),
            get("start_year"),
            get("end_month"),
            get("end_year"),
        )?;
        let temporal = match (iso, month_year) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidRequest(
                    "give either start_date/end_date or month/year pairs, not both".into(),
                ));
            }
            (a, b) => a.or(b),
        };

        let mut req = Self::new(identity).spatial(SpatialRange { lon, lat });
        req.temporal = temporal;
        Ok(req)
    }
}

fn field<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    fields.get(key).map(|s| s.as_str())
}

fn parse_coord(fields: &BTreeMap<String, String>, key: &str) -> Result<Option<f64>> {
    let Some(raw) = fields.get(key) else {
        return Ok(None);
    };
    let v: f64 = raw
        .parse()
        .map_err(|_| Error::InvalidRequest(format!("{key} is not a number: {raw}")))?;
    if !v.is_finite() {
        return Err(Error::InvalidRequest(format!("{key} must be finite, got {raw}")));
    }
    Ok(Some(v))
}
