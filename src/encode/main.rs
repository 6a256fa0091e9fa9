//! Batch address generation.
//!
//! Reads a building FeatureCollection, resolves admin segments per building,
//! encodes every feature in parallel and writes the addresses as CSV.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use hashbrown::HashMap;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flate2::read::GzDecoder;
use project_address::config::Config;
use project_address::encoder::{self, AddressError};
use project_address::models::{AddressResult, AdminSelection, Feature, FeatureCollection};
use project_address::pip::PipService;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Duplicate addresses logged individually before summarizing
const MAX_DUPLICATE_WARNINGS: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "encode")]
#[command(about = "Generate addresses for a GeoJSON file of buildings")]
struct Args {
    /// Building FeatureCollection (.geojson, .json, optionally .gz)
    #[arg(short, long)]
    file: PathBuf,

    /// TOML config file with boundary settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output CSV (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Country segment, overrides resolved boundaries
    #[arg(long)]
    country: Option<String>,

    /// State / province segment
    #[arg(long)]
    state: Option<String>,

    /// City segment
    #[arg(long)]
    city: Option<String>,

    /// Village segment
    #[arg(long)]
    village: Option<String>,
}

/// One CSV row
#[derive(Debug, Serialize)]
struct AddressRow {
    id: String,
    addr: String,
    block_no: u32,
    building_no: u32,
    lon: f64,
    lat: f64,
}

fn main() -> Result<()> {
    // Initialize logging (stderr, so CSV on stdout stays clean)
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Project:Address batch encoder");
    info!("File: {}", args.file.display());

    let config = Config::load_or_default(args.config.as_deref())?;
    let pip = config.load_pip_service()?;

    let overrides = AdminSelection {
        country: args.country.clone().unwrap_or_default(),
        state: args.state.clone().unwrap_or_default(),
        district: String::new(),
        city: args.city.clone().unwrap_or_default(),
        village: args.village.clone().unwrap_or_default(),
    };

    let collection = read_features(&args.file)?;
    info!("Loaded {} features", collection.features.len());

    let pb = ProgressBar::new(collection.features.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let results: Vec<Result<AddressRow, (String, AddressError)>> = collection
        .features
        .par_iter()
        .enumerate()
        .map(|(i, feature)| {
            let result = encode_feature(i, feature, pip.as_ref(), &overrides);
            pb.inc(1);
            result
        })
        .collect();

    pb.finish_with_message("Encoding complete");

    let mut rows = Vec::with_capacity(results.len());
    let mut failed = 0usize;
    for result in results {
        match result {
            Ok(row) => rows.push(row),
            Err((id, e)) => {
                failed += 1;
                warn!("No address for feature {}: {}", id, e);
            }
        }
    }

    let duplicates = find_duplicates(&rows);
    for (addr, ids) in duplicates.iter().take(MAX_DUPLICATE_WARNINGS) {
        warn!("Address {} shared by features {}", addr, ids.join(", "));
    }
    if duplicates.len() > MAX_DUPLICATE_WARNINGS {
        warn!(
            "... and {} more shared addresses",
            duplicates.len() - MAX_DUPLICATE_WARNINGS
        );
    }

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).context("Failed to create output file")?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    write_rows(writer, &rows)?;

    info!(
        "Encoded {} features ({} failed, {} shared addresses)",
        rows.len(),
        failed,
        duplicates.len()
    );

    Ok(())
}

/// Read a FeatureCollection, transparently un-gzipping `.gz` files
fn read_features(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path).context("Failed to open building file")?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    serde_json::from_reader(BufReader::new(reader)).context("Failed to parse building GeoJSON")
}

fn encode_feature(
    index: usize,
    feature: &Feature,
    pip: Option<&PipService>,
    overrides: &AdminSelection,
) -> Result<AddressRow, (String, AddressError)> {
    let id = feature.display_id().unwrap_or_else(|| index.to_string());

    let mut admin = pip
        .and_then(|p| p.resolve_selection(feature))
        .unwrap_or_default();
    admin.overlay(overrides);

    let encoding = feature
        .geometry
        .as_ref()
        .ok_or(AddressError::NoGeometry)
        .and_then(encoder::encode_geometry);
    let encoding = match encoding {
        Ok(encoding) => encoding,
        Err(e) => return Err((id, e)),
    };

    let result = AddressResult::new(&admin, encoding.block_no, encoding.building_no);
    Ok(AddressRow {
        id,
        addr: result.addr,
        block_no: result.block_no,
        building_no: result.building_no,
        lon: encoding.centroid.lon,
        lat: encoding.centroid.lat,
    })
}

/// Addresses assigned to more than one feature, sorted by address
fn find_duplicates(rows: &[AddressRow]) -> Vec<(String, Vec<String>)> {
    let mut by_addr: HashMap<&str, Vec<String>> = HashMap::new();
    for row in rows {
        by_addr
            .entry(row.addr.as_str())
            .or_default()
            .push(row.id.clone());
    }

    let mut duplicates: Vec<(String, Vec<String>)> = by_addr
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(addr, ids)| (addr.to_string(), ids))
        .collect();
    duplicates.sort();
    duplicates
}

fn write_rows<W: Write>(writer: W, rows: &[AddressRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(id: &str, geometry: serde_json::Value) -> Feature {
        let mut feature = Feature::new(geometry);
        feature.id = Some(json!(id));
        feature
    }

    #[test]
    fn test_encode_feature_with_overrides() {
        let overrides = AdminSelection::new("LAO", "VTE", "Central", "V1");
        let f = feature("b-1", json!({"type": "Point", "coordinates": [102.6, 17.97]}));

        let row = encode_feature(0, &f, None, &overrides).unwrap();
        assert_eq!(row.id, "b-1");
        assert_eq!(row.addr, "LAO-VTE-Central-V1-99888.258");
        assert_eq!((row.lon, row.lat), (102.6, 17.97));
    }

    #[test]
    fn test_encode_feature_failure_keeps_index_id() {
        let f = Feature::new(json!({"type": "Polygon", "coordinates": [[]]}));
        let (id, err) = encode_feature(4, &f, None, &AdminSelection::default()).unwrap_err();
        assert_eq!(id, "4");
        assert_eq!(err, AddressError::EmptyCoordinates);
    }

    #[test]
    fn test_duplicate_geometry_shares_address() {
        let admin = AdminSelection::new("LAO", "VTE", "Central", "V1");
        let geometry = json!({"type": "Point", "coordinates": [102.6, 17.97]});
        let rows: Vec<AddressRow> = [
            feature("a", geometry.clone()),
            feature("b", geometry),
            feature("c", json!({"type": "Point", "coordinates": [102.60001, 17.97]})),
        ]
        .iter()
        .enumerate()
        .map(|(i, f)| encode_feature(i, f, None, &admin).unwrap())
        .collect();

        let duplicates = find_duplicates(&rows);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].1, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_write_rows() {
        let rows = vec![AddressRow {
            id: "b-1".to_string(),
            addr: "LAO-VTE-Central-V1-99888.258".to_string(),
            block_no: 99888,
            building_no: 258,
            lon: 102.6,
            lat: 17.97,
        }];
        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "id,addr,block_no,building_no,lon,lat\nb-1,LAO-VTE-Central-V1-99888.258,99888,258,102.6,17.97\n"
        );
    }

    #[test]
    fn test_read_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"id":"b-1"},"geometry":{"type":"Point","coordinates":[1,2]}},
                {"type":"Feature","properties":{},"geometry":null}
            ]}"#,
        )
        .unwrap();

        let collection = read_features(&path).unwrap();
        assert_eq!(collection.features.len(), 2);
        assert!(collection.features[1].geometry.is_none());
    }
}
