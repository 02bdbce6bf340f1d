//! Command-line arguments for `tnt`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tnt")]
#[command(about = "Track and Trace offline scan queue")]
#[command(long_about = "tnt - offline scan queue for Track and Trace

Scans captured while offline are stored locally and sent to the scan API
one at a time when a drain runs. Scans the API rejects are reported back
instead of being retried.

QUICK START:
  tnt capture BOX-42 --lat -13.96 --lon 33.78   Queue a scan
  tnt status                                    Show queue length and health
  tnt drain                                     Send everything queued
  tnt run                                       Drain in the background")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Config file to load instead of the environment / probed locations
    #[arg(short, long, global = true, env = "TNT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a scan of a box and append it to the offline queue
    Capture(CaptureArgs),

    /// Append scans from a JSON file (one object or an array)
    Enqueue {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Run one drain pass against the scan API
    Drain,

    /// Show queue length, parked failures and component health
    Status {
        /// Also probe the scan API health endpoint
        #[arg(long)]
        probe: bool,
    },

    /// Move parked failed scans back to the tail of the queue
    RequeueFailed,

    /// Run the background sync worker until Ctrl-C
    Run,
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Box identifier printed on the label
    pub box_id: String,

    /// Latitude of the scan in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the scan in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Reported accuracy in meters
    #[arg(long)]
    pub accuracy: Option<f64>,

    #[arg(long)]
    pub operator: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,

    /// Destination school latitude; sets `finalDestination`
    #[arg(long, allow_hyphen_values = true, requires = "school_lon")]
    pub school_lat: Option<f64>,

    /// Destination school longitude
    #[arg(long, allow_hyphen_values = true, requires = "school_lat")]
    pub school_lon: Option<f64>,

    /// Mark the box as received at its destination
    #[arg(long)]
    pub received: bool,
}
