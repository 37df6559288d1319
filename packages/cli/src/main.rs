#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the building extraction pipeline.
//!
//! A bare `buildings` invocation reproduces the production extraction:
//! apartment buildings within Warszawa from the Mazowieckie snapshot,
//! written to `generated/buildings.js` for the front-end map scripts.
//! Flags override the operational knobs; everything else lives in
//! [`GenerateConfig`].

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use building_map_cli_utils::SpinnerProgress;
use building_map_generate::GenerateConfig;
use building_map_store::FeatureStore;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "buildings",
    about = "Extract significant apartment buildings within a city boundary"
)]
struct Cli {
    /// Path to the GeoJSON feature snapshot (optionally gzipped).
    #[arg(long, default_value = "data/mazowieckie.geojson")]
    store: PathBuf,

    /// Path of the generated JavaScript data file.
    #[arg(long, default_value = "generated/buildings.js")]
    output: PathBuf,

    /// Name of the boundary to extract within.
    #[arg(long, default_value = building_map_generate::DEFAULT_BOUNDARY_NAME)]
    boundary_name: String,

    /// Exclusive estimated-area cutoff for emitted buildings.
    #[arg(long, default_value_t = building_map_generate::DEFAULT_MIN_ESTIMATED_AREA)]
    min_area: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = building_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let store = FeatureStore::open(&cli.store)?;

    let config = GenerateConfig {
        boundary_name: cli.boundary_name,
        min_estimated_area: cli.min_area,
        ..GenerateConfig::default()
    };

    if let Some(parent) = cli.output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Prior output is replaced wholesale on every run; a run that fails
    // mid-way leaves an invalid file that the next run regenerates.
    let output = BufWriter::new(File::create(&cli.output)?);
    let progress = SpinnerProgress::records_spinner(&multi, "Scanning building candidates...");

    let emitted = building_map_generate::run(&store, &config, output, Some(progress))?;

    log::info!("Wrote {emitted} buildings to {}", cli.output.display());
    Ok(())
}
