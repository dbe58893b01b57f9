//! Climatology of an annual accumulation file.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use ndarray::Axis;

use crate::{cli::create_spinner, reader, stats, writer};

/// Averages an annual accumulation file over a range of years and writes the
/// result alongside the input with an `annual.clm` marker.
pub fn climatology(
    file: &Path,
    start_year: i32,
    end_year: i32,
    verbose: bool,
) -> Result<PathBuf> {
    if verbose {
        println!(
            "% Calculating climatology of `{}` for {} to {}",
            file.display(),
            start_year,
            end_year
        );
    }

    let spinner = create_spinner("Calculating climatology...".to_string());

    let annual = reader::read_annual(file)?;
    let selected: Vec<usize> = annual
        .years
        .iter()
        .enumerate()
        .filter(|(_, &y)| y >= start_year && y <= end_year)
        .map(|(i, _)| i)
        .collect();

    if selected.is_empty() {
        bail!(
            "`{}` has no years between {} and {}",
            file.display(),
            start_year,
            end_year
        );
    }

    let mut fields = Vec::with_capacity(annual.fields.len());
    for (name, cube) in &annual.fields {
        let grids: Vec<_> = selected
            .iter()
            .map(|&i| cube.index_axis(Axis(0), i).to_owned())
            .collect();
        fields.push((name.clone(), stats::nan_mean(&grids)?));
    }

    let out = climatology_file(file)?;
    writer::write_climatology(&out, &fields, &annual.lat, &annual.lon)?;

    spinner.finish_with_message("Climatology complete");

    Ok(out)
}

fn climatology_file(file: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("bad file name `{}`", file.display()))?;

    if !name.contains("annual") {
        bail!("`{}` does not follow the annual naming convention", name);
    }

    Ok(file.with_file_name(name.replace("annual", "annual.clm")))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_name_climatology_after_the_annual_file() {
        let out = climatology_file(Path::new(
            "/data/MERRA2.tavg1_2d_flx_Nx.PRECIP_STATS.accumulation.annual.nc4",
        ))
        .unwrap();

        assert_eq!(
            out,
            PathBuf::from("/data/MERRA2.tavg1_2d_flx_Nx.PRECIP_STATS.accumulation.annual.clm.nc4")
        );
    }

    #[test]
    fn should_reject_files_outside_the_convention() {
        assert!(climatology_file(Path::new("/data/stats.nc")).is_err());
    }
}
