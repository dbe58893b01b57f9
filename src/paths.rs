//! Resolves on-disk paths from the product naming conventions.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, NaiveDate};

use crate::config::{Config, Product};

/// CFSR was replaced by CFSR2 at the start of 2011; paths for later dates
/// resolve through the CFSR2 conventions.
pub fn effective_product<'a>(config: &'a Config, name: &str, year: i32) -> Result<&'a Product> {
    if name == "CFSR" && year >= 2011 {
        config.product("CFSR2")
    } else {
        config.product(name)
    }
}

/// Path of the daily file for (product, variable, date).
pub fn daily_file(
    config: &Config,
    product_name: &str,
    variable: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    let product = effective_product(config, product_name, date.year())?;
    let spec = product.variable(variable)?;

    Ok(config
        .data_root
        .join(expand(&product.dir, &spec.name, Some(date)))
        .join(expand(&product.file, &spec.name, Some(date))))
}

/// Paths of all daily files expected for one calendar month.
pub fn month_files(
    config: &Config,
    product_name: &str,
    variable: &str,
    year: i32,
    month: u32,
) -> Result<Vec<PathBuf>> {
    (1..=days_in_month(year, month))
        .map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| anyhow!("invalid date {:04}-{:02}-{:02}", year, month, day))?;
            daily_file(config, product_name, variable, date)
        })
        .collect()
}

/// Path of the monthly statistics file for (product, variable, month).
pub fn monthly_stats_file(
    config: &Config,
    product_name: &str,
    variable: &str,
    year: i32,
    month: u32,
) -> Result<PathBuf> {
    let date = first_of_month(year, month)?;
    let product = effective_product(config, product_name, year)?;
    let spec = product.variable(variable)?;
    let period = format!("{}.month", date.format("%Y%m"));

    let name = expand(&product.stats_file, &spec.name, Some(date)).replace("{period}", &period);
    Ok(config
        .data_root
        .join(expand(&product.dir, &spec.name, Some(date)))
        .join(name))
}

/// Path of the accumulation-period annual file. It sits above the per-year
/// directories, so date-keyed components of the dir template are dropped.
pub fn annual_stats_file(config: &Config, product_name: &str, variable: &str) -> Result<PathBuf> {
    let product = config.product(product_name)?;
    let spec = product.variable(variable)?;

    let name = expand(&product.stats_file, &spec.name, None).replace("{period}", "accumulation.annual");
    Ok(config
        .data_root
        .join(static_dir(&product.dir, &spec.name))
        .join(name))
}

/// Where a downloaded file belongs in the directory layout, keyed by the date
/// in its remote file name. The file is stored under the canonical daily name
/// rather than the archive's own (MERRA2 manifests carry stream-numbered names
/// like `MERRA2_400...` that the daily-file lookup would never match).
pub fn download_target(
    config: &Config,
    product_name: &str,
    variable: &str,
    file_name: &str,
) -> Result<PathBuf> {
    let date = date_from_filename(file_name)?;
    daily_file(config, product_name, variable, date)
}

/// Extracts the YYYYMM or YYYYMMDD field from a file name.
pub fn date_from_filename(name: &str) -> Result<NaiveDate> {
    for part in name.split('.') {
        if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
            let padded = match part.len() {
                8 => part.to_string(),
                6 => format!("{}01", part),
                _ => continue,
            };
            return NaiveDate::parse_from_str(&padded, "%Y%m%d")
                .map_err(|e| anyhow!("bad date field `{}` in `{}`: {}", part, name, e));
        }
    }
    bail!("no date field in file name `{}`", name)
}

/// (year, month) pairs covering the given date range, inclusive.
pub fn months_in_range(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());

    while (year, month) <= (end.year(), end.month()) {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    months
}

/// The nine months of the accumulation period ending in spring of `year`:
/// August of the previous year through April.
pub fn accumulation_months(year: i32) -> Vec<(i32, u32)> {
    (8..=12)
        .map(|m| (year - 1, m))
        .chain((1..=4).map(|m| (year, m)))
        .collect()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("invalid month {:04}-{:02}", year, month))
}

fn expand(template: &str, variable: &str, date: Option<NaiveDate>) -> String {
    let mut out = template.replace("{variable}", variable);

    if let Some(date) = date {
        out = out
            .replace("{year}", &format!("{:04}", date.year()))
            .replace("{month}", &format!("{:02}", date.month()))
            .replace("{yyyymm}", &date.format("%Y%m").to_string())
            .replace("{yyyymmdd}", &date.format("%Y%m%d").to_string());
    }

    out
}

// Renders a dir template without its {year}/{month} components.
fn static_dir(template: &str, variable: &str) -> String {
    template
        .split('/')
        .filter(|c| !c.contains("{year}") && !c.contains("{month}"))
        .map(|c| c.replace("{variable}", variable))
        .collect::<Vec<_>>()
        .join("/")
}

// -- Tests -------------------------------------------------------------------
