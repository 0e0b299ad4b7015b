use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use iridl_extract::{
    preset_names, Client, ClientOptions, DatasetIdentity, ExtractionRequest, SpatialRange,
    TemporalRange,
};

/// Download a subset of an IRIDL dataset as NetCDF.
///
/// Example (CHIRPS daily rainfall at Addis Ababa, first week of 2023):
///   cargo run --example cli -- --preset chirps-daily --point 38.75,9.0192 \
///       --start 2023-01-01 --end 2023-01-05 -o addis.nc
#[derive(Debug, Parser)]
#[command(name = "iridl-extract")]
struct Args {
    /// Built-in catalog entry (see --list-presets).
    #[arg(long, conflicts_with_all = ["source", "request"])]
    preset: Option<String>,

    /// Catalog tokens, e.g. --source .UCSB --dataset .CHIRPS ...
    #[arg(
        long,
        requires = "dataset",
        requires = "version",
        requires = "frequency",
        requires = "resolution",
        requires = "variable"
    )]
    source: Option<String>,
    #[arg(long)]
    dataset: Option<String>,
    #[arg(long)]
    version: Option<String>,
    #[arg(long)]
    frequency: Option<String>,
    #[arg(long)]
    resolution: Option<String>,
    #[arg(long)]
    variable: Option<String>,
    #[arg(long)]
    scope: Option<String>,

    /// Whole request as a JSON document.
    #[arg(long)]
    request: Option<PathBuf>,

    /// Single site: LON,LAT
    #[arg(long, value_delimiter = ',', num_args = 2, allow_negative_numbers = true, conflicts_with_all = ["lon", "lat"])]
    point: Option<Vec<f64>>,
    /// Longitude range: MIN,MAX
    #[arg(long, value_delimiter = ',', num_args = 2, allow_negative_numbers = true)]
    lon: Option<Vec<f64>>,
    /// Latitude range: MIN,MAX
    #[arg(long, value_delimiter = ',', num_args = 2, allow_negative_numbers = true)]
    lat: Option<Vec<f64>>,

    /// First day, YYYY-MM-DD
    #[arg(long, requires = "end")]
    start: Option<String>,
    /// Last day, YYYY-MM-DD
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Month/year range: START_MONTH,START_YEAR,END_MONTH,END_YEAR (e.g. Jan,1991,Dec,2000)
    #[arg(long, value_delimiter = ',', num_args = 4, conflicts_with_all = ["start", "end"])]
    months: Option<Vec<String>>,

    /// Output file.
    #[arg(short, long, default_value = iridl_extract::DEFAULT_TARGET)]
    output: PathBuf,

    /// Print the query URL and exit.
    #[arg(long)]
    url_only: bool,

    #[arg(long)]
    list_presets: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.list_presets {
        for name in preset_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let request = build_request(&args)?;

    let opts = ClientOptions {
        progress: args.progress,
        ..ClientOptions::from_env()?
    };
    let client = Client::new(opts)?;

    if args.url_only {
        println!("{}", client.url_for(&request)?);
        return Ok(());
    }

    let result = client
        .retrieve(&request, &args.output)
        .with_context(|| format!("extraction to {} failed", args.output.display()))?;
    println!(
        "Downloaded {bytes} bytes to {target}",
        bytes = result.size_bytes,
        target = result.target.display()
    );
    Ok(())
}

fn build_request(args: &Args) -> Result<ExtractionRequest> {
    if let Some(path) = &args.request {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(ExtractionRequest::from_json(&text)?);
    }

    let identity = match (&args.preset, &args.source) {
        (Some(name), _) => DatasetIdentity::preset(name)
            .with_context(|| format!("unknown preset {name}; try --list-presets"))?,
        (None, Some(source)) => {
            let token = |v: &Option<String>| v.clone().unwrap_or_default();
            let id = DatasetIdentity::new(
                source.clone(),
                token(&args.dataset),
                token(&args.version),
                token(&args.frequency),
                token(&args.resolution),
                token(&args.variable),
            );
            match &args.scope {
                Some(scope) => id.with_scope(scope.clone()),
                None => id,
            }
        }
        (None, None) => bail!("give --preset, --source ... or --request"),
    };

    let mut req = ExtractionRequest::new(identity);

    if let Some(p) = &args.point {
        req = req.spatial(SpatialRange::point(p[0], p[1]));
    }
    if let Some(x) = &args.lon {
        req = req.lon(x[0], x[1]);
    }
    if let Some(y) = &args.lat {
        req = req.lat(y[0], y[1]);
    }

    if let Some(t) = TemporalRange::from_iso_bounds(args.start.as_deref(), args.end.as_deref())? {
        req = req.temporal(t);
    }
    if let Some(m) = &args.months {
        req = req.month_year(&m[0], &m[1], &m[2], &m[3]);
    }

    Ok(req)
}
