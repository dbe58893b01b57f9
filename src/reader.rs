//! Reads daily grids and statistics files from netCDF.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array2, Array3, Axis};

use crate::config::VariableSpec;
use crate::stats::{PrecipStats, PERIOD_FIELDS};

/// One month of daily precipitation: time x lat x lon, in mm/day.
#[derive(Debug)]
pub struct MonthField {
    pub values: Array3<f32>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

/// Monthly statistics read back from a `PRECIP_STATS` file.
#[derive(Debug)]
pub struct StatsRecord {
    pub stats: PrecipStats,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

/// An annual accumulation file: one grid per field per year.
#[derive(Debug)]
pub struct AnnualRecord {
    pub years: Vec<i32>,
    pub fields: Vec<(String, Array3<f32>)>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

/// Opens the daily files of one calendar month, concatenates them along time
/// and rescales to mm/day.
pub fn read_month<P: AsRef<Path>>(files: &[P], spec: &VariableSpec) -> Result<MonthField> {
    if files.is_empty() {
        bail!("no files to read");
    }

    let mut lat = Vec::new();
    let mut lon = Vec::new();
    let mut days: Vec<Array2<f32>> = Vec::with_capacity(files.len());

    for path in files {
        let path = path.as_ref();
        let file = netcdf::open(path)
            .with_context(|| format!("cannot open `{}`", path.display()))?;

        if days.is_empty() {
            lat = coord(&file, &["lat", "latitude"], path)?;
            lon = coord(&file, &["lon", "longitude"], path)?;
        }

        let field = daily_field(&file, spec, path)?;
        if let Some(first) = days.first() {
            if field.raw_dim() != first.raw_dim() {
                bail!(
                    "grid shape of `{}` is {:?}, expected {:?}",
                    path.display(),
                    field.raw_dim(),
                    first.raw_dim()
                );
            }
        }
        days.push(field);
    }

    let (nlat, nlon) = days[0].dim();
    let mut values = Array3::zeros((days.len(), nlat, nlon));
    for (i, day) in days.iter().enumerate() {
        values.index_axis_mut(Axis(0), i).assign(day);
    }

    Ok(MonthField { values, lat, lon })
}

/// Reads back the five monthly statistic fields.
pub fn read_stats(path: &Path) -> Result<StatsRecord> {
    let file =
        netcdf::open(path).with_context(|| format!("cannot open `{}`", path.display()))?;

    let stats = PrecipStats {
        wetday_mean: grid(&file, "wetday_mean", path)?,
        wetday_frequency: grid(&file, "wetday_frequency", path)?,
        wetday_total: grid(&file, "wetday_total", path)?,
        wetday_max: grid(&file, "wetday_max", path)?,
        prectot: grid(&file, "prectot", path)?,
    };

    Ok(StatsRecord {
        stats,
        lat: coord(&file, &["lat", "latitude"], path)?,
        lon: coord(&file, &["lon", "longitude"], path)?,
    })
}

/// Reads an annual accumulation file. Fill values become NaN so that
/// climatology means can skip them.
pub fn read_annual(path: &Path) -> Result<AnnualRecord> {
    let file =
        netcdf::open(path).with_context(|| format!("cannot open `{}`", path.display()))?;

    let years_var = file
        .variable("year")
        .ok_or_else(|| anyhow!("no `year` variable in `{}`", path.display()))?;
    let years = years_var.get_values::<i32, _>(..)?;

    let mut fields = Vec::with_capacity(PERIOD_FIELDS.len());
    for name in PERIOD_FIELDS {
        let cube = cube(&file, name, path)?;
        if cube.len_of(Axis(0)) != years.len() {
            bail!(
                "`{}` in `{}` has {} time steps for {} years",
                name,
                path.display(),
                cube.len_of(Axis(0)),
                years.len()
            );
        }
        fields.push((name.to_string(), cube));
    }

    Ok(AnnualRecord {
        years,
        fields,
        lat: coord(&file, &["lat", "latitude"], path)?,
        lon: coord(&file, &["lon", "longitude"], path)?,
    })
}

// Reads one daily grid, averaging sub-daily steps and applying the unit
// scale. Fill values become NaN, which the reducers treat as missing.
fn daily_field(file: &netcdf::File, spec: &VariableSpec, path: &Path) -> Result<Array2<f32>> {
    let var = file.variable(&spec.name).ok_or_else(|| {
        anyhow!("no variable `{}` in `{}`", spec.name, path.display())
    })?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values = var.get_values::<f32, _>(..)?;

    let field = match shape.len() {
        2 => Array2::from_shape_vec((shape[0], shape[1]), values)?,
        3 => {
            let steps = Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)?;
            steps
                .mean_axis(Axis(0))
                .ok_or_else(|| anyhow!("empty time axis in `{}`", path.display()))?
        }
        n => bail!(
            "variable `{}` in `{}` has {} dimensions, expected 2 or 3",
            spec.name,
            path.display(),
            n
        ),
    };

    Ok(field.mapv(|v| {
        if v.is_finite() && v.abs() < 1.0e30 {
            v * spec.scale as f32
        } else {
            f32::NAN
        }
    }))
}

fn grid(file: &netcdf::File, name: &str, path: &Path) -> Result<Array2<f32>> {
    let var = file
        .variable(name)
        .ok_or_else(|| anyhow!("no variable `{}` in `{}`", name, path.display()))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape.len() != 2 {
        bail!(
            "variable `{}` in `{}` is not a 2-D grid",
            name,
            path.display()
        );
    }

    let values = var.get_values::<f32, _>(..)?;
    Ok(Array2::from_shape_vec((shape[0], shape[1]), values)?)
}

fn cube(file: &netcdf::File, name: &str, path: &Path) -> Result<Array3<f32>> {
    let var = file
        .variable(name)
        .ok_or_else(|| anyhow!("no variable `{}` in `{}`", name, path.display()))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape.len() != 3 {
        bail!(
            "variable `{}` in `{}` is not a 3-D field",
            name,
            path.display()
        );
    }

    let values = var.get_values::<f32, _>(..)?;
    let cube = Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)?;

    Ok(cube.mapv(|v| if v.abs() < 1.0e30 { v } else { f32::NAN }))
}

fn coord(file: &netcdf::File, names: &[&str], path: &Path) -> Result<Vec<f64>> {
    for name in names {
        if let Some(var) = file.variable(name) {
            return Ok(var.get_values::<f64, _>(..)?);
        }
    }
    bail!(
        "no coordinate variable ({}) in `{}`",
        names.join("/"),
        path.display()
    )
}

// -- Tests -------------------------------------------------------------------
