//! MVE Workspace Inspector
//!
//! Parses an MVE reconstruction workspace and prints the recovered cameras and
//! point cloud statistics. Optionally writes a JSON summary and the point cloud
//! as CSV.
//!
//! Usage:
//! ```bash
//! cargo run --example inspect_workspace -- \
//!   --workspace samples/mve_workspace \
//!   --points-csv output/points.csv
//! ```

use clap::Parser;
use flexi_logger::{colored_detailed_format, detailed_format, Duplicate, FileSpec, Logger};
use log::info;
use mve_importer::{export_points_csv, parse_workspace, ImportOptions, Resolution};
use std::path::PathBuf;

/// MVE workspace inspection tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory of the MVE workspace (contains `views/` and `synth_0.out`)
    #[arg(short = 'w', long)]
    workspace: PathBuf,

    /// Optional YAML file with import options
    #[arg(short = 'o', long)]
    options: Option<PathBuf>,

    /// Image width used when a view image cannot be read
    #[arg(long, requires = "default_height", value_parser = clap::value_parser!(u32).range(1..))]
    default_width: Option<u32>,

    /// Image height used when a view image cannot be read
    #[arg(long, requires = "default_width", value_parser = clap::value_parser!(u32).range(1..))]
    default_height: Option<u32>,

    /// Do not warn about radial distortion in the view calibrations
    #[arg(short = 's', long)]
    suppress_distortion_warnings: bool,

    /// Print the scene summary as JSON
    #[arg(long)]
    json: bool,

    /// Write the point cloud to this CSV file
    #[arg(long)]
    points_csv: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Logger::try_with_str("info")?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .suppress_timestamp()
                .suffix("log"),
        )
        .duplicate_to_stdout(Duplicate::All)
        .format_for_files(detailed_format)
        .format_for_stdout(colored_detailed_format)
        // error;warn;info;debug;trace
        .set_palette("196;208;76;39;178".to_string())
        .start()?;

    let cli = Cli::parse();

    let mut options = match &cli.options {
        Some(path) => {
            let path_str = path.to_str().ok_or("Invalid options path string")?;
            info!("Loading import options from: {}", path_str);
            ImportOptions::load_from_yaml(path_str)?
        }
        None => ImportOptions::default(),
    };
    if let (Some(width), Some(height)) = (cli.default_width, cli.default_height) {
        options.default_resolution = Some(Resolution { width, height });
    }
    options.suppress_distortion_warnings |= cli.suppress_distortion_warnings;
    info!("Import options: {:?}", options);

    let scene = parse_workspace(&cli.workspace, &options)?;

    for camera in &scene.cameras {
        let center = camera.camera_center();
        info!(
            "Camera {}: {}x{}, f = {:.2} px, c = ({:.2}, {:.2}), center = ({:.3}, {:.3}, {:.3}), image = {:?}",
            camera.name(),
            camera.resolution().width,
            camera.resolution().height,
            camera.focal_length(),
            camera.intrinsics().cx,
            camera.intrinsics().cy,
            center.x,
            center.y,
            center.z,
            camera.image().absolute_path()
        );
    }

    let summary = scene.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Cameras: {}", summary.num_cameras);
        println!("Points:  {}", summary.num_points);
        if let Some(bbox) = &summary.bounding_box {
            println!("Bounds:  {:?} .. {:?}", bbox.min, bbox.max);
        }
        println!("Warnings: {}", summary.num_warnings);
    }

    if let Some(csv_path) = &cli.points_csv {
        export_points_csv(&scene.points, csv_path)?;
        info!("Wrote {} points to {:?}", scene.points.len(), csv_path);
    }

    Ok(())
}
