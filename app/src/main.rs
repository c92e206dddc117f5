use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use serde::Serialize;

use pcd_cloud::{PointCloud, PointCloudError};
use pcd_core::pointcloud::{point::BoundingVolume, srs::EpsgCode};

#[derive(Parser, Debug)]
#[command(
    name = "pcloud",
    about = "Inspect and translate LAS/LAZ and delimited text point clouds",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print point count, bounds, offset and UTM zone
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Spatial reference to assume instead of the file's own
        #[arg(short, long)]
        epsg: Option<EpsgCode>,

        /// Keep only points with this classification before summarizing
        #[arg(short, long)]
        class: Option<u8>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Translate every point and write the result
    Transform {
        #[arg(value_name = "IN")]
        input: PathBuf,

        #[arg(value_name = "OUT")]
        output: PathBuf,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dx: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dy: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dz: f64,
    },
}

#[derive(Serialize, Debug, PartialEq)]
struct Summary {
    point_count: usize,
    bounds: BoundingVolume,
    offset: [i64; 3],
    geodetic_zone: i32,
}

impl From<&PointCloud> for Summary {
    fn from(cloud: &PointCloud) -> Self {
        Self {
            point_count: cloud.point_count(),
            bounds: *cloud.bounds(),
            offset: cloud.offset(),
            geodetic_zone: cloud.geodetic_zone(),
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let BoundingVolume { min, max } = self.bounds;
        writeln!(f, "points: {}", self.point_count)?;
        writeln!(f, "min:    {} {} {}", min[0], min[1], min[2])?;
        writeln!(f, "max:    {} {} {}", max[0], max[1], max[2])?;
        writeln!(
            f,
            "offset: {} {} {}",
            self.offset[0], self.offset[1], self.offset[2]
        )?;
        write!(f, "zone:   {}", self.geodetic_zone)
    }
}

fn info(
    input: &Path,
    epsg: Option<EpsgCode>,
    class: Option<u8>,
) -> Result<Summary, PointCloudError> {
    let mut cloud = PointCloud::new();
    match epsg {
        Some(epsg) => cloud.read_as(input, epsg)?,
        None => cloud.read(input)?,
    }

    let summary = match class {
        Some(class) => {
            let cropped = cloud.crop_to_class(class);
            log::info!(
                "{} of {} points have class {}",
                cropped.point_count(),
                cloud.point_count(),
                class
            );
            Summary::from(&cropped)
        }
        None => Summary::from(&cloud),
    };
    Ok(summary)
}

fn run(command: Command) -> Result<(), PointCloudError> {
    match command {
        Command::Info {
            input,
            epsg,
            class,
            json,
        } => {
            log::info!("input file: {:?}", input);
            let summary = info(&input, epsg, class)?;
            if json {
                println!("{:#}", serde_json::json!(summary));
            } else {
                println!("{}", summary);
            }
        }
        Command::Transform {
            input,
            output,
            dx,
            dy,
            dz,
        } => {
            log::info!("input file: {:?}", input);
            log::info!("output file: {:?}", output);
            log::info!("translation: [{}, {}, {}]", dx, dy, dz);
            PointCloud::transform_point_cloud(&input, &output, [dx, dy, dz])?;
        }
    }
    Ok(())
}

fn main() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .init();

    let args = Cli::parse();

    let start = std::time::Instant::now();
    if let Err(e) = run(args.command) {
        log::error!("{}", e);
        std::process::exit(1);
    }
    log::info!("Elapsed: {:?}", start.elapsed());
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_parse_info() {
        let cli = Cli::try_parse_from(["pcloud", "info", "a.las", "--epsg", "32618", "-c", "2"])
            .unwrap();
        match cli.command {
            Command::Info {
                input,
                epsg,
                class,
                json,
            } => {
                assert_eq!(input, PathBuf::from("a.las"));
                assert_eq!(epsg, Some(32618));
                assert_eq!(class, Some(2));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_transform_with_negative_offsets() {
        let cli = Cli::try_parse_from([
            "pcloud", "transform", "in.las", "out.laz", "--dx", "-583000", "--dz", "1.5",
        ])
        .unwrap();
        match cli.command {
            Command::Transform { dx, dy, dz, .. } => {
                assert_eq!([dx, dy, dz], [-583000.0, 0.0, 1.5]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_info_summary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(
            &input,
            "x,y,z,classification\n500000.5,10,1,2\n500003,12.5,4,6\n500001,11,2,2\n",
        )
        .unwrap();

        let all = info(&input, Some(32654), None).unwrap();
        assert_eq!(all.point_count, 3);
        assert_eq!(all.offset, [500000, 10, 1]);
        assert_eq!(all.geodetic_zone, 54);

        let ground = info(&input, None, Some(2)).unwrap();
        assert_eq!(ground.point_count, 2);
        assert_eq!(ground.bounds.max, [500001.0, 11.0, 2.0]);
        assert_eq!(ground.geodetic_zone, 0);

        let value = serde_json::json!(ground);
        assert_eq!(value["point_count"], 2);
        assert_eq!(value["bounds"]["min"][0], 500000.5);
    }

    #[test]
    fn test_info_of_missing_file_fails() {
        assert!(matches!(
            info(Path::new("/nonexistent/in.las"), None, None),
            Err(PointCloudError::Pipeline(_))
        ));
    }
}
