//! Product naming conventions and unit scales.
//!
//! Each reanalysis product names its files differently and stores precipitation
//! in different units. The table of conventions is an explicit record built at
//! startup and passed to the path and reader code; a TOML file can override or
//! extend the built-in entries.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// How a variable is named in a product's files. `scale` converts the native
/// unit to mm/day (e.g. CFSR PRATE is kg m-2 s-1, so 86400).
#[derive(Debug, Clone, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub scale: f64,
}

/// Naming convention for one reanalysis product.
///
/// Templates understand `{variable}`, `{year}`, `{month}`, `{yyyymm}`,
/// `{yyyymmdd}` and `{period}` placeholders.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    /// Directory template, relative to `data_root`.
    pub dir: String,
    /// Daily file name template.
    pub file: String,
    /// Statistics file name template.
    pub stats_file: String,
    pub variables: HashMap<String, VariableSpec>,
}

impl Product {
    pub fn variable(&self, key: &str) -> Result<&VariableSpec> {
        self.variables
            .get(key)
            .ok_or_else(|| anyhow!("no variable `{}` configured for this product", key))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_root: PathBuf,
    pub products: HashMap<String, Product>,
}

/// On-disk layout of a config file. Missing fields fall back to the built-ins.
#[derive(Debug, Deserialize)]
struct FileConfig {
    data_root: Option<PathBuf>,
    #[serde(default)]
    products: HashMap<String, Product>,
}

impl Config {
    /// Built-in table, optionally merged with overrides from `path`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::builtin();

        if let Some(path) = path {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config file `{}`", path.display()))?;
            let overrides: FileConfig = toml::from_str(&text)
                .with_context(|| format!("cannot parse config file `{}`", path.display()))?;

            if let Some(root) = overrides.data_root {
                config.data_root = root;
            }
            config.products.extend(overrides.products);
        }

        Ok(config)
    }

    pub fn product(&self, name: &str) -> Result<&Product> {
        self.products
            .get(name)
            .ok_or_else(|| anyhow!("unknown reanalysis product `{}`", name))
    }

    /// Conventions for the products used in the snow-on-sea-ice analysis.
    pub fn builtin() -> Self {
        let mut products = HashMap::new();

        products.insert(
            "ERA-Interim".to_string(),
            Product {
                dir: "ERA_Interim/daily/{variable}/{year}".to_string(),
                file: "era_interim.{variable}.{yyyymmdd}.day.nc".to_string(),
                stats_file: "era_interim.PRECIP_STATS.{period}.nc".to_string(),
                variables: HashMap::from([
                    ("PRECIP".to_string(), var("PRECTOT", 1.0e3)), // m -> mm
                    ("T2M".to_string(), var("T2M", 1.0)),
                ]),
            },
        );

        products.insert(
            "MERRA".to_string(),
            Product {
                dir: "MERRA/daily/{variable}/{year}/{month}".to_string(),
                file: "MERRA.prod.assim.tavg1_2d_flx_Nx.{variable}.{yyyymmdd}.nc4".to_string(),
                stats_file: "MERRA.prod.assim.tavg1_2d_flx_Nx.PRECIP_STATS.{period}.nc4"
                    .to_string(),
                variables: HashMap::from([("PRECIP".to_string(), var("PRECTOT", 1.0))]),
            },
        );

        products.insert(
            "MERRA2".to_string(),
            Product {
                dir: "MERRA2/daily/{variable}/{year}/{month}".to_string(),
                file: "MERRA2.tavg1_2d_flx_Nx.{variable}.{yyyymmdd}.nc4".to_string(),
                stats_file: "MERRA2.tavg1_2d_flx_Nx.PRECIP_STATS.{period}.nc4".to_string(),
                variables: HashMap::from([
                    ("PRECIP".to_string(), var("PRECTOT", 1.0)),
                    ("SNOW".to_string(), var("PRECSNO", 1.0)),
                ]),
            },
        );

        products.insert(
            "CFSR".to_string(),
            Product {
                dir: "CFSR/{variable}/{year}/{month}".to_string(),
                file: "CFSR.flxf06.gdas.{variable}.{yyyymmdd}.nc".to_string(),
                stats_file: "CFSR.flxf06.gdas.PRECIP_STATS.{period}.nc".to_string(),
                variables: HashMap::from([
                    ("PRECIP".to_string(), var("PRATE", 86400.0)), // kg m-2 s-1 -> mm/day
                    ("T2M".to_string(), var("T2M", 1.0)),
                ]),
            },
        );

        products.insert(
            "CFSR2".to_string(),
            Product {
                dir: "CFSR2/{variable}/{year}/{month}".to_string(),
                file: "CFSR2.flxf06.gdas.{variable}.{yyyymmdd}.nc".to_string(),
                stats_file: "CFSR2.flxf06.gdas.PRECIP_STATS.{period}.nc".to_string(),
                variables: HashMap::from([
                    ("PRECIP".to_string(), var("PRATE", 86400.0)),
                    ("T2M".to_string(), var("T2M", 1.0)),
                ]),
            },
        );

        products.insert(
            "JRA55".to_string(),
            Product {
                dir: "JRA55/{variable}/{year}/{month}".to_string(),
                file: "fcst_phy2m.061_tprat.reg_tl319.{variable}.{yyyymmdd}.nc4".to_string(),
                stats_file: "fcst_phy2m.061_tprat.reg_tl319.PRECIP_STATS.{period}.nc4"
                    .to_string(),
                // 3-hourly accumulations, eight per day
                variables: HashMap::from([("PRECIP".to_string(), var("PRECTOT", 0.125))]),
            },
        );

        Config {
            data_root: PathBuf::from("."),
            products,
        }
    }
}

fn var(name: &str, scale: f64) -> VariableSpec {
    VariableSpec {
        name: name.to_string(),
        scale,
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn should_contain_builtin_products() {
        let config = Config::builtin();

        for name in ["ERA-Interim", "MERRA", "MERRA2", "CFSR", "CFSR2", "JRA55"] {
            assert!(config.products.contains_key(name), "missing {}", name);
        }

        let cfsr = config.product("CFSR").unwrap();
        assert_eq!(cfsr.variable("PRECIP").unwrap().name, "PRATE");
        assert_eq!(cfsr.variable("PRECIP").unwrap().scale, 86400.0);
    }

    #[test]
    fn should_reject_unknown_product() {
        let config = Config::builtin();
        assert!(config.product("NCEP").is_err());
    }

    #[test]
    fn should_merge_overrides_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_root = "/data/reanalysis"

[products.ERA5]
dir = "ERA5/daily/{{variable}}/{{year}}/{{month}}"
file = "era5.single_level.{{variable}}.{{yyyymmdd}}.nc4"
stats_file = "era5.single_level.PRECIP_STATS.{{period}}.nc4"

[products.ERA5.variables.PRECIP]
name = "TOTPREC"
scale = 1000.0
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.data_root, PathBuf::from("/data/reanalysis"));
        // Built-ins survive the merge
        assert!(config.product("MERRA2").is_ok());

        let era5 = config.product("ERA5").unwrap();
        assert_eq!(era5.variable("PRECIP").unwrap().name, "TOTPREC");
    }
}
