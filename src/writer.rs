//! Serializes statistic fields to netCDF files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use ndarray::Array2;

use crate::stats::{PeriodStats, PrecipStats, SnowStats};

/// CF-conventions fill value for f32 grids.
pub const FILL_VALUE: f32 = 9.96921e36;

/// Writes the five monthly statistic fields.
pub fn write_monthly(
    path: &Path,
    stats: &PrecipStats,
    lat: &[f64],
    lon: &[f64],
    threshold: f32,
) -> Result<()> {
    let mut file = create_file(path)?;
    file.add_attribute("wetday_threshold_mm", threshold)?;
    add_coords(&mut file, lat, lon)?;

    put_grid(&mut file, "wetday_mean", "mm/day", &stats.wetday_mean)?;
    put_grid(&mut file, "wetday_frequency", "1", &stats.wetday_frequency)?;
    put_grid(&mut file, "wetday_total", "mm", &stats.wetday_total)?;
    put_grid(&mut file, "wetday_max", "mm/day", &stats.wetday_max)?;
    put_grid(&mut file, "prectot", "mm", &stats.prectot)?;

    Ok(())
}

/// Writes a monthly snowfall summary.
pub fn write_snowfall(
    path: &Path,
    stats: &SnowStats,
    lat: &[f64],
    lon: &[f64],
    threshold: f32,
) -> Result<()> {
    let mut file = create_file(path)?;
    file.add_attribute("snowday_threshold_mm", threshold)?;
    add_coords(&mut file, lat, lon)?;

    put_grid(&mut file, "snow", "mm", &stats.snow)?;
    put_grid(&mut file, "snowday", "days", &stats.snowday)?;

    Ok(())
}

/// Writes accumulation-period summaries as one file with a year dimension.
pub fn write_annual(
    path: &Path,
    years: &[i32],
    periods: &[PeriodStats],
    lat: &[f64],
    lon: &[f64],
) -> Result<()> {
    let mut file = create_file(path)?;
    file.add_dimension("time", years.len())?;
    add_coords(&mut file, lat, lon)?;

    {
        let mut year_var = file.add_variable::<i32>("year", &["time"])?;
        year_var.put_attribute("long_name", "end year of August-April accumulation period")?;
        year_var.put_values(years, ..)?;
    }

    put_cube(&mut file, "prectot", "mm", periods, |p| &p.prectot)?;
    put_cube(&mut file, "wetday_total", "mm", periods, |p| &p.wetday_total)?;
    put_cube(&mut file, "nwetdays", "days", periods, |p| &p.nwetdays)?;
    put_cube(&mut file, "wetday_frequency", "1", periods, |p| &p.wetday_frequency)?;
    put_cube(&mut file, "wetday_mean", "mm/day", periods, |p| &p.wetday_mean)?;

    Ok(())
}

/// Writes climatology grids, one 2-D variable per field.
pub fn write_climatology(
    path: &Path,
    fields: &[(String, Array2<f32>)],
    lat: &[f64],
    lon: &[f64],
) -> Result<()> {
    let mut file = create_file(path)?;
    add_coords(&mut file, lat, lon)?;

    for (name, data) in fields {
        put_grid(&mut file, name, units_for(name), data)?;
    }

    Ok(())
}

fn units_for(name: &str) -> &'static str {
    match name {
        "wetday_frequency" => "1",
        "nwetdays" | "snowday" => "days",
        "wetday_mean" | "wetday_max" => "mm/day",
        _ => "mm",
    }
}

fn create_file(path: &Path) -> Result<netcdf::FileMut> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory `{}`", parent.display()))?;
    }
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("cannot replace `{}`", path.display()))?;
    }

    netcdf::create(path).with_context(|| format!("cannot create `{}`", path.display()))
}

fn add_coords(file: &mut netcdf::FileMut, lat: &[f64], lon: &[f64]) -> Result<()> {
    file.add_dimension("lat", lat.len())?;
    file.add_dimension("lon", lon.len())?;

    let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
    lat_var.put_attribute("units", "degrees_north")?;
    lat_var.put_values(lat, ..)?;

    let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
    lon_var.put_attribute("units", "degrees_east")?;
    lon_var.put_values(lon, ..)?;

    Ok(())
}

fn put_grid(
    file: &mut netcdf::FileMut,
    name: &str,
    units: &str,
    data: &Array2<f32>,
) -> Result<()> {
    let mut var = file.add_variable::<f32>(name, &["lat", "lon"])?;
    var.put_attribute("units", units)?;
    var.set_fill_value(FILL_VALUE)?;

    let flat: Vec<f32> = data
        .iter()
        .map(|&v| if v.is_finite() { v } else { FILL_VALUE })
        .collect();
    var.put_values(&flat, ..)?;

    Ok(())
}

fn put_cube(
    file: &mut netcdf::FileMut,
    name: &str,
    units: &str,
    periods: &[PeriodStats],
    field: impl Fn(&PeriodStats) -> &Array2<f32>,
) -> Result<()> {
    let mut var = file.add_variable::<f32>(name, &["time", "lat", "lon"])?;
    var.put_attribute("units", units)?;
    var.set_fill_value(FILL_VALUE)?;

    let flat: Vec<f32> = periods
        .iter()
        .flat_map(|p| field(p).iter().copied())
        .map(|v| if v.is_finite() { v } else { FILL_VALUE })
        .collect();
    var.put_values(&flat, ..)?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
