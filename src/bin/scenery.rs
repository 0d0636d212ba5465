//! Provides the `scenery-cli` tool for checking two models against each other.
//!
//! Loads both models concurrently, optionally moves the second one, then
//! reports their bounds, the distance between their centers and whether
//! their bounding boxes collide.
//!
//! # Examples
//! ```text
//! scenery-cli ship.glb rock.obj --offset 0 0 4 --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use scenery::config::LoaderConfig;
use scenery::spatial::distance_between;
use scenery::{check_collision, Bounded, BoundingBox, ModelLoader};

#[derive(Debug, Parser)]
#[command(name = "scenery-cli", about = "Check two 3D models for bounding-box collision")]
struct Args {
    /// First model (path, file://, data: or http(s) URL).
    first: String,
    /// Second model.
    second: String,
    /// Translate the second model by X Y Z before testing.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    offset: Option<Vec<f32>>,
    /// Loader config file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    first: ModelSummary,
    second: ModelSummary,
    distance: f32,
    colliding: bool,
}

#[derive(Debug, Serialize)]
struct ModelSummary {
    url: String,
    triangles: usize,
    bounds: BoundingBox,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => LoaderConfig::from_path(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    let loader = ModelLoader::new(config);

    let (first, second) = tokio::join!(loader.load(&args.first), loader.load(&args.second));
    let first = first.with_context(|| format!("failed to load {}", args.first))?;
    let mut second = second.with_context(|| format!("failed to load {}", args.second))?;

    if let Some(&[x, y, z]) = args.offset.as_deref() {
        second.set_translation(Vec3::new(x, y, z));
    }

    let first_bounds = first.compute_bounding_box();
    let second_bounds = second.compute_bounding_box();

    let report = Report {
        distance: distance_between(&first, &second),
        colliding: check_collision(&first, &second),
        first: ModelSummary {
            url: args.first,
            triangles: first.triangles.len(),
            bounds: first_bounds,
        },
        second: ModelSummary {
            url: args.second,
            triangles: second.triangles.len(),
            bounds: second_bounds,
        },
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for summary in [&report.first, &report.second] {
            println!(
                "{}: {} triangles, bounds {} .. {}",
                summary.url, summary.triangles, summary.bounds.min, summary.bounds.max
            );
        }
        println!("center distance: {:.4}", report.distance);
        println!("colliding: {}", report.colliding);
    }

    Ok(())
}
