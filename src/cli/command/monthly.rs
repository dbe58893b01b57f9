//! Monthly wet-day statistics from daily precipitation files.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;

use crate::{
    cli::create_progress_bar, config::Config, paths, reader, stats::PrecipStats, writer,
};

/// Computes and writes one `PRECIP_STATS` file per month in the date range.
/// A month with missing or unreadable inputs is reported and skipped.
pub fn monthly(
    config: &Config,
    product: &str,
    variable: &str,
    start: NaiveDate,
    end: NaiveDate,
    threshold: f32,
    verbose: bool,
) -> Result<usize> {
    if verbose {
        println!(
            "% Processing {} from {} for {} to {}",
            variable, product, start, end
        );
    }

    let months = paths::months_in_range(start, end);
    let bar = create_progress_bar(
        months.len() as u64,
        "Computing monthly statistics...".to_string(),
    );
    let mut written = 0;

    for &(year, month) in &months {
        match process_month(config, product, variable, year, month, threshold, verbose) {
            Ok(Some(_)) => written += 1,
            Ok(None) => {}
            Err(e) => eprintln!("Warning: {:04}-{:02} skipped: {:#}", year, month, e),
        }
        bar.inc(1);
    }

    bar.finish_with_message("Monthly statistics complete");

    Ok(written)
}

fn process_month(
    config: &Config,
    product: &str,
    variable: &str,
    year: i32,
    month: u32,
    threshold: f32,
    verbose: bool,
) -> Result<Option<PathBuf>> {
    let files = paths::month_files(config, product, variable, year, month)?;
    if let Some(missing) = files.iter().find(|f| !f.exists()) {
        eprintln!(
            "Warning: {:04}-{:02} skipped: missing `{}`",
            year,
            month,
            missing.display()
        );
        return Ok(None);
    }

    if verbose {
        println!("    Generating statistics for {:04}{:02}", year, month);
    }

    let spec = paths::effective_product(config, product, year)?.variable(variable)?;
    let field = reader::read_month(&files, spec)?;
    let stats = PrecipStats::compute(&field.values, threshold);

    let out = paths::monthly_stats_file(config, product, variable, year, month)?;
    writer::write_monthly(&out, &stats, &field.lat, &field.lon, threshold)?;

    if verbose {
        println!("    Writing statistics to `{}`", out.display());
    }

    Ok(Some(out))
}

// -- Tests -------------------------------------------------------------------
