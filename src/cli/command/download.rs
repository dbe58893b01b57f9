//! Downloads daily files listed in a URL manifest.
//!
//! Querying the archive servers for file listings is unreliable, so the list
//! of URLs is prepared separately (e.g. with the archive's subsetter) and
//! passed in as a manifest with one URL per line.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;

use crate::{cli::create_progress_bar, config::Config, download::fetch, paths};

/// Fetches each manifest URL whose file name date falls in the range and
/// stores it under the canonical daily file name in the configured directory
/// layout. Failed transfers are reported and skipped.
#[allow(clippy::too_many_arguments)]
pub async fn download(
    config: &Config,
    manifest: &Path,
    product: &str,
    variable: &str,
    begin: Option<NaiveDate>,
    end: Option<NaiveDate>,
    overwrite: bool,
    verbose: bool,
) -> Result<usize> {
    let urls = read_manifest(manifest)?;
    let urls = subset_by_date(urls, begin, end)?;

    let bar = create_progress_bar(urls.len() as u64, "Downloading files...".to_string());
    let mut fetched = 0;

    for url in &urls {
        let name = file_name(url)?;
        let target = paths::download_target(config, product, variable, name)?;

        if target.exists() && !overwrite {
            if verbose {
                println!("    `{}` exists, skipping", target.display());
            }
            bar.inc(1);
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create directory `{}`", parent.display()))?;
        }

        if verbose {
            println!("    Getting `{}`", url);
        }

        match fetch(url, &target).await {
            Ok(()) => fetched += 1,
            Err(e) => eprintln!("Warning: `{}` skipped: {:#}", url, e),
        }
        bar.inc(1);
    }

    bar.finish_with_message("Downloads complete");

    Ok(fetched)
}

fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("cannot open manifest `{}`", path.display()))?;

    let mut urls = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        urls.push(line.to_string());
    }

    Ok(urls)
}

fn subset_by_date(
    urls: Vec<String>,
    begin: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<String>> {
    let mut subset = Vec::with_capacity(urls.len());

    for url in urls {
        let date = paths::date_from_filename(file_name(&url)?)?;
        let after_begin = begin.map_or(true, |b| date >= b);
        let before_end = end.map_or(true, |e| date <= e);
        if after_begin && before_end {
            subset.push(url);
        }
    }

    Ok(subset)
}

fn file_name(url: &str) -> Result<&str> {
    url.rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("no file name in url `{}`", url))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn should_read_manifest_skipping_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# MERRA2 PRECTOT daily files").unwrap();
        writeln!(file, "https://example.org/MERRA2_400.tavg1_2d_flx_Nx.20100301.nc4").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://example.org/MERRA2_400.tavg1_2d_flx_Nx.20100302.nc4").unwrap();

        let urls = read_manifest(file.path()).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with("20100301.nc4"));
    }

    #[test]
    fn should_subset_urls_by_date_range() {
        let urls = vec![
            "https://example.org/MERRA2_400.tavg1_2d_flx_Nx.20100228.nc4".to_string(),
            "https://example.org/MERRA2_400.tavg1_2d_flx_Nx.20100301.nc4".to_string(),
            "https://example.org/MERRA2_400.tavg1_2d_flx_Nx.20100302.nc4".to_string(),
        ];

        let subset =
            subset_by_date(urls, Some(date(2010, 3, 1)), Some(date(2010, 3, 1))).unwrap();

        assert_eq!(subset.len(), 1);
        assert!(subset[0].ends_with("20100301.nc4"));
    }

    #[test]
    fn should_extract_file_name_from_url() {
        let name =
            file_name("https://example.org/data/MERRA2_400.tavg1_2d_flx_Nx.20100301.nc4").unwrap();
        assert_eq!(name, "MERRA2_400.tavg1_2d_flx_Nx.20100301.nc4");
    }
}
