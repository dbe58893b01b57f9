//! August-April accumulation period summaries.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::{
    cli::create_progress_bar,
    config::Config,
    paths, reader,
    stats::{PeriodStats, PrecipStats},
    writer,
};

/// Summarizes monthly `PRECIP_STATS` files into one accumulation period per
/// year and writes the periods to a single annual file. A period with missing
/// months is reported and skipped.
pub fn accumulation(
    config: &Config,
    product: &str,
    start_year: i32,
    end_year: i32,
    verbose: bool,
) -> Result<PathBuf> {
    if verbose {
        println!(
            "% Processing {} PRECIP_STATS for {} to {}",
            product, start_year, end_year
        );
    }

    let bar = create_progress_bar(
        (end_year - start_year + 1).max(0) as u64,
        "Summarizing accumulation periods...".to_string(),
    );

    let mut years = Vec::new();
    let mut periods = Vec::new();
    let mut coords: Option<(Vec<f64>, Vec<f64>)> = None;

    for year in start_year..=end_year {
        match process_period(config, product, year, verbose) {
            Ok(Some((period, lat, lon))) => {
                if coords.is_none() {
                    coords = Some((lat, lon));
                }
                years.push(year);
                periods.push(period);
            }
            Ok(None) => {}
            Err(e) => eprintln!("Warning: period ending {} skipped: {:#}", year, e),
        }
        bar.inc(1);
    }

    bar.finish_with_message("Accumulation periods complete");

    let (lat, lon) = match coords {
        Some(coords) => coords,
        None => bail!(
            "no complete accumulation periods between {} and {}",
            start_year,
            end_year
        ),
    };

    let out = paths::annual_stats_file(config, product, "PRECIP")?;
    writer::write_annual(&out, &years, &periods, &lat, &lon)?;

    if verbose {
        println!("% Writing {} PRECIP_STATS to `{}`", product, out.display());
    }

    Ok(out)
}

type Period = (PeriodStats, Vec<f64>, Vec<f64>);

fn process_period(
    config: &Config,
    product: &str,
    year: i32,
    verbose: bool,
) -> Result<Option<Period>> {
    let months = paths::accumulation_months(year);

    let mut files = Vec::with_capacity(months.len());
    for &(y, m) in &months {
        files.push((paths::monthly_stats_file(config, product, "PRECIP", y, m)?, y, m));
    }

    if let Some((missing, _, _)) = files.iter().find(|(f, _, _)| !f.exists()) {
        eprintln!(
            "Warning: period ending {} skipped: missing `{}`",
            year,
            missing.display()
        );
        return Ok(None);
    }

    if verbose {
        println!("    Processing data for {}", year);
    }

    let mut monthly: Vec<(PrecipStats, u32)> = Vec::with_capacity(files.len());
    let mut coords: Option<(Vec<f64>, Vec<f64>)> = None;

    for (file, y, m) in &files {
        let record = reader::read_stats(file)?;
        if coords.is_none() {
            coords = Some((record.lat, record.lon));
        }
        monthly.push((record.stats, paths::days_in_month(*y, *m)));
    }

    let period = PeriodStats::combine(&monthly)?;
    let (lat, lon) = coords.unwrap_or_default();

    Ok(Some((period, lat, lon)))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::TempDir;

    fn monthly_stats(value: f32) -> PrecipStats {
        PrecipStats {
            wetday_mean: Array2::from_elem((1, 1), value / 30.0),
            wetday_frequency: Array2::from_elem((1, 1), 0.5),
            wetday_total: Array2::from_elem((1, 1), value),
            wetday_max: Array2::from_elem((1, 1), value / 3.0),
            prectot: Array2::from_elem((1, 1), value),
        }
    }

    fn write_months(config: &Config, year: i32, skip: Option<(i32, u32)>) {
        for (y, m) in paths::accumulation_months(year) {
            if skip == Some((y, m)) {
                continue;
            }
            let path = paths::monthly_stats_file(config, "MERRA2", "PRECIP", y, m).unwrap();
            writer::write_monthly(&path, &monthly_stats(10.0), &[80.0], &[0.0], 1.0).unwrap();
        }
    }

    #[test]
    fn should_skip_period_with_a_missing_month() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::builtin();
        config.data_root = dir.path().to_path_buf();

        // Period ending 1982 lacks its April file
        write_months(&config, 1982, Some((1982, 4)));

        let skipped = process_period(&config, "MERRA2", 1982, false).unwrap();
        assert!(skipped.is_none());
    }

    #[test]
    fn should_combine_a_complete_period() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::builtin();
        config.data_root = dir.path().to_path_buf();

        write_months(&config, 1982, None);

        let (period, lat, _lon) = process_period(&config, "MERRA2", 1982, false)
            .unwrap()
            .expect("complete period should combine");

        assert_eq!(lat, vec![80.0]);
        // Nine months of 10 mm each
        assert!((period.prectot[[0, 0]] - 90.0).abs() < 1.0e-4);
        // Aug 1981 through Apr 1982 has 273 days at frequency 0.5
        assert!((period.nwetdays[[0, 0]] - 136.5).abs() < 1.0e-3);
    }
}
