//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    /// TOML file overriding the built-in product table
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Monthly wet-day statistics from daily precipitation
    Monthly {
        /// Name of reanalysis: CFSR, ERA-Interim, MERRA, MERRA2, JRA55
        product: String,
        #[arg(long, default_value = "PRECIP")]
        variable: String,
        /// Date to start processing (YYYYMMDD)
        #[arg(long, short = 's', default_value = "19800101")]
        start_date: String,
        /// Date to end processing (YYYYMMDD)
        #[arg(long, short = 'e', default_value = "20161231")]
        end_date: String,
        /// Daily total above which a day counts as wet (mm)
        #[arg(long, short = 't', default_value_t = 1.0)]
        threshold: f32,
        #[arg(long, short)]
        verbose: bool,
    },
    /// Monthly snowfall totals and snow-day counts
    Snowfall {
        product: String,
        #[arg(long, default_value = "SNOW")]
        variable: String,
        /// Date to start processing (YYYYMMDD)
        #[arg(long, short = 's', default_value = "19800101")]
        start_date: String,
        /// Date to end processing (YYYYMMDD)
        #[arg(long, short = 'e', default_value = "20161231")]
        end_date: String,
        /// Daily total above which a day counts as a snow day (mm)
        #[arg(long, short = 't', default_value_t = 0.0)]
        threshold: f32,
        #[arg(long, short)]
        verbose: bool,
    },
    /// August-April accumulation period summaries across years
    Accumulation {
        product: String,
        /// End year of the first accumulation period
        #[arg(long, default_value_t = 1981)]
        start_year: i32,
        /// End year of the last accumulation period
        #[arg(long, default_value_t = 2016)]
        end_year: i32,
        #[arg(long, short)]
        verbose: bool,
    },
    /// Climatology of an annual accumulation file
    Climatology {
        /// Path to the annual accumulation file
        file: PathBuf,
        #[arg(long, default_value_t = 1981)]
        start_year: i32,
        #[arg(long, default_value_t = 2015)]
        end_year: i32,
        #[arg(long, short)]
        verbose: bool,
    },
    /// Download daily files listed in a URL manifest
    Download {
        /// File containing one URL per line
        manifest: PathBuf,
        product: String,
        #[arg(long, default_value = "PRECIP")]
        variable: String,
        /// Skip files dated before this date (YYYYMMDD)
        #[arg(long, short = 'b')]
        begin: Option<String>,
        /// Skip files dated after this date (YYYYMMDD)
        #[arg(long, short = 'e')]
        end: Option<String>,
        /// Replace files already on disk
        #[arg(long, short)]
        overwrite: bool,
        #[arg(long, short)]
        verbose: bool,
    },
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}
