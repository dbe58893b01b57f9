//! Reductions over the time axis of daily precipitation grids.
//!
//! A wet day is a day whose precipitation total exceeds the threshold
//! (strictly greater than; a value equal to the threshold is a dry day).
//! Dry days contribute zero to totals and means but still count in the
//! denominator of mean and frequency.

use anyhow::{bail, Result};
use ndarray::{Array2, Array3, Axis, Zip};

/// Variable names of an accumulation-period summary file.
pub const PERIOD_FIELDS: [&str; 5] = [
    "prectot",
    "wetday_total",
    "nwetdays",
    "wetday_frequency",
    "wetday_mean",
];

/// The five monthly statistic fields.
#[derive(Debug, Clone)]
pub struct PrecipStats {
    pub wetday_mean: Array2<f32>,
    pub wetday_frequency: Array2<f32>,
    pub wetday_total: Array2<f32>,
    pub wetday_max: Array2<f32>,
    pub prectot: Array2<f32>,
}

impl PrecipStats {
    pub fn compute(data: &Array3<f32>, threshold: f32) -> Self {
        PrecipStats {
            wetday_mean: wetday_mean(data, threshold),
            wetday_frequency: wetday_frequency(data, threshold),
            wetday_total: wetday_total(data, threshold),
            wetday_max: wetday_max(data),
            prectot: all_total(data),
        }
    }
}

/// Mean daily precipitation with dry days contributing zero.
pub fn wetday_mean(data: &Array3<f32>, threshold: f32) -> Array2<f32> {
    data.map_axis(Axis(0), |days| {
        let wet: f32 = days.iter().filter(|&&v| v > threshold).sum();
        wet / days.len() as f32
    })
}

/// Fraction of days exceeding the threshold.
pub fn wetday_frequency(data: &Array3<f32>, threshold: f32) -> Array2<f32> {
    data.map_axis(Axis(0), |days| {
        let wet = days.iter().filter(|&&v| v > threshold).count();
        wet as f32 / days.len() as f32
    })
}

/// Total precipitation on wet days. Not the same as the sum of all
/// precipitation.
pub fn wetday_total(data: &Array3<f32>, threshold: f32) -> Array2<f32> {
    data.map_axis(Axis(0), |days| {
        days.iter().filter(|&&v| v > threshold).sum()
    })
}

/// Maximum daily precipitation over all days, wet or dry.
pub fn wetday_max(data: &Array3<f32>) -> Array2<f32> {
    data.map_axis(Axis(0), |days| days.iter().copied().fold(f32::MIN, f32::max))
}

/// Total precipitation over all days.
pub fn all_total(data: &Array3<f32>) -> Array2<f32> {
    data.sum_axis(Axis(0))
}

/// Snowfall summary for one month: total and count of snow days.
#[derive(Debug, Clone)]
pub struct SnowStats {
    pub snow: Array2<f32>,
    pub snowday: Array2<f32>,
}

impl SnowStats {
    pub fn compute(data: &Array3<f32>, threshold: f32) -> Self {
        SnowStats {
            snow: all_total(data),
            snowday: data.map_axis(Axis(0), |days| {
                days.iter().filter(|&&v| v > threshold).count() as f32
            }),
        }
    }
}

/// Accumulation-period summary fields combined from monthly statistics.
#[derive(Debug, Clone)]
pub struct PeriodStats {
    pub prectot: Array2<f32>,
    pub wetday_total: Array2<f32>,
    pub nwetdays: Array2<f32>,
    pub wetday_frequency: Array2<f32>,
    pub wetday_mean: Array2<f32>,
}

impl PeriodStats {
    /// Combines monthly statistics into period totals. Each entry pairs the
    /// monthly fields with the number of days in that month, which weights
    /// the frequency sum. Cells with no wet days get a NaN mean, mapped to
    /// the fill value on write.
    pub fn combine(months: &[(PrecipStats, u32)]) -> Result<Self> {
        let (first, _) = match months.split_first() {
            Some(split) => split,
            None => bail!("no months to combine"),
        };

        let shape = first.0.prectot.raw_dim();
        let mut prectot = Array2::<f32>::zeros(shape);
        let mut wetday_total = Array2::<f32>::zeros(shape);
        let mut nwetdays = Array2::<f32>::zeros(shape);
        let mut total_days = 0.0f32;

        for (month, ndays) in months {
            if month.prectot.raw_dim() != shape {
                bail!(
                    "grid shape mismatch between months: {:?} vs {:?}",
                    month.prectot.raw_dim(),
                    shape
                );
            }
            prectot += &month.prectot;
            wetday_total += &month.wetday_total;
            nwetdays += &(&month.wetday_frequency * *ndays as f32);
            total_days += *ndays as f32;
        }

        let wetday_frequency = &nwetdays / total_days;
        let wetday_mean = Zip::from(&wetday_total)
            .and(&nwetdays)
            .map_collect(|&total, &n| if n > 0.0 { total / n } else { f32::NAN });

        Ok(PeriodStats {
            prectot,
            wetday_total,
            nwetdays,
            wetday_frequency,
            wetday_mean,
        })
    }
}

/// Cell-wise mean over a stack of grids, ignoring NaN and fill values.
pub fn nan_mean(fields: &[Array2<f32>]) -> Result<Array2<f32>> {
    let first = match fields.first() {
        Some(first) => first,
        None => bail!("no fields to average"),
    };

    let shape = first.raw_dim();
    let mut sum = Array2::<f32>::zeros(shape);
    let mut count = Array2::<f32>::zeros(shape);

    for field in fields {
        if field.raw_dim() != shape {
            bail!(
                "grid shape mismatch: {:?} vs {:?}",
                field.raw_dim(),
                shape
            );
        }
        Zip::from(&mut sum)
            .and(&mut count)
            .and(field)
            .for_each(|s, c, &v| {
                if v.is_finite() && v.abs() < 1.0e30 {
                    *s += v;
                    *c += 1.0;
                }
            });
    }

    Ok(Zip::from(&sum)
        .and(&count)
        .map_collect(|&s, &c| if c > 0.0 { s / c } else { f32::NAN }))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr3;

    const EPS: f32 = 1.0e-5;

    // One grid cell, five days
    fn month(values: [f32; 5]) -> Array3<f32> {
        Array3::from_shape_vec((5, 1, 1), values.to_vec()).unwrap()
    }

    #[test]
    fn should_return_zeros_for_all_dry_month() {
        let data = month([0.0, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(wetday_mean(&data, 1.0)[[0, 0]], 0.0);
        assert_eq!(wetday_frequency(&data, 1.0)[[0, 0]], 0.0);
        assert_eq!(wetday_total(&data, 1.0)[[0, 0]], 0.0);
        assert_eq!(wetday_max(&data)[[0, 0]], 0.0);
    }

    #[test]
    fn should_return_full_frequency_when_every_day_is_wet() {
        let data = month([2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(wetday_frequency(&data, 1.0)[[0, 0]], 1.0);
    }

    #[test]
    fn should_relate_total_to_mean_through_day_count() {
        let data = month([0.5, 2.0, 0.0, 4.0, 1.5]);

        let mean = wetday_mean(&data, 1.0)[[0, 0]];
        let total = wetday_total(&data, 1.0)[[0, 0]];

        // The mean carries the all-day denominator, so total = mean * ndays
        assert!((total - mean * 5.0).abs() < EPS);
        assert!((total - 7.5).abs() < EPS);
    }

    #[test]
    fn should_keep_max_at_least_mean() {
        let data = month([0.5, 2.0, 0.0, 4.0, 1.5]);
        assert!(wetday_max(&data)[[0, 0]] >= wetday_mean(&data, 1.0)[[0, 0]]);
        assert_eq!(wetday_max(&data)[[0, 0]], 4.0);
    }

    #[test]
    fn should_exclude_values_at_the_threshold() {
        let at = month([1.0, 0.0, 0.0, 0.0, 0.0]);
        let above = month([1.0001, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(wetday_frequency(&at, 1.0)[[0, 0]], 0.0);
        assert!((wetday_frequency(&above, 1.0)[[0, 0]] - 0.2).abs() < EPS);
        assert_eq!(wetday_total(&at, 1.0)[[0, 0]], 0.0);
        assert!((wetday_total(&above, 1.0)[[0, 0]] - 1.0001).abs() < EPS);
    }

    #[test]
    fn should_not_gate_max_by_threshold() {
        let data = month([0.2, 0.4, 0.1, 0.0, 0.3]);
        assert!((wetday_max(&data)[[0, 0]] - 0.4).abs() < EPS);
    }

    #[test]
    fn should_total_all_days_regardless_of_threshold() {
        let data = month([0.5, 2.0, 0.0, 4.0, 1.5]);
        assert!((all_total(&data)[[0, 0]] - 8.0).abs() < EPS);
    }

    #[test]
    fn should_reduce_each_cell_independently() {
        let data = arr3(&[
            [[0.0, 5.0], [2.0, 0.5]],
            [[0.0, 3.0], [2.0, 0.5]],
        ]);

        let freq = wetday_frequency(&data, 1.0);
        assert_eq!(freq[[0, 0]], 0.0);
        assert_eq!(freq[[0, 1]], 1.0);
        assert_eq!(freq[[1, 0]], 1.0);
        assert_eq!(freq[[1, 1]], 0.0);
    }

    #[test]
    fn should_treat_nan_days_as_missing() {
        let data = month([2.0, f32::NAN, 0.0, 4.0, 0.5]);

        // NaN never passes the threshold filter and never wins the max
        assert!((wetday_total(&data, 1.0)[[0, 0]] - 6.0).abs() < EPS);
        assert!((wetday_frequency(&data, 1.0)[[0, 0]] - 0.4).abs() < EPS);
        assert_eq!(wetday_max(&data)[[0, 0]], 4.0);
    }

    #[test]
    fn should_count_snow_days() {
        let data = month([0.0, 0.1, 2.0, 0.0, 0.5]);
        let stats = SnowStats::compute(&data, 0.0);

        assert_eq!(stats.snowday[[0, 0]], 3.0);
        assert!((stats.snow[[0, 0]] - 2.6).abs() < EPS);
    }

    #[test]
    fn should_combine_months_into_period() {
        // Two one-cell months: 30 days at freq 0.5, 31 days at freq 1.0
        let stats = |freq: f32, total: f32, prectot: f32| PrecipStats {
            wetday_mean: Array2::zeros((1, 1)),
            wetday_frequency: Array2::from_elem((1, 1), freq),
            wetday_total: Array2::from_elem((1, 1), total),
            wetday_max: Array2::zeros((1, 1)),
            prectot: Array2::from_elem((1, 1), prectot),
        };

        let months = vec![(stats(0.5, 30.0, 40.0), 30), (stats(1.0, 62.0, 70.0), 31)];
        let period = PeriodStats::combine(&months).unwrap();

        assert!((period.prectot[[0, 0]] - 110.0).abs() < EPS);
        assert!((period.wetday_total[[0, 0]] - 92.0).abs() < EPS);
        assert!((period.nwetdays[[0, 0]] - 46.0).abs() < EPS);
        assert!((period.wetday_frequency[[0, 0]] - 46.0 / 61.0).abs() < EPS);
        assert!((period.wetday_mean[[0, 0]] - 2.0).abs() < EPS);
    }

    #[test]
    fn should_mark_mean_undefined_where_no_wet_days() {
        let dry = PrecipStats {
            wetday_mean: Array2::zeros((1, 1)),
            wetday_frequency: Array2::zeros((1, 1)),
            wetday_total: Array2::zeros((1, 1)),
            wetday_max: Array2::zeros((1, 1)),
            prectot: Array2::zeros((1, 1)),
        };

        let period = PeriodStats::combine(&[(dry, 30)]).unwrap();
        assert!(period.wetday_mean[[0, 0]].is_nan());
    }

    #[test]
    fn should_reject_mismatched_shapes() {
        let a = PrecipStats {
            wetday_mean: Array2::zeros((1, 1)),
            wetday_frequency: Array2::zeros((1, 1)),
            wetday_total: Array2::zeros((1, 1)),
            wetday_max: Array2::zeros((1, 1)),
            prectot: Array2::zeros((1, 1)),
        };
        let b = PrecipStats {
            wetday_mean: Array2::zeros((2, 2)),
            wetday_frequency: Array2::zeros((2, 2)),
            wetday_total: Array2::zeros((2, 2)),
            wetday_max: Array2::zeros((2, 2)),
            prectot: Array2::zeros((2, 2)),
        };

        assert!(PeriodStats::combine(&[(a, 30), (b, 31)]).is_err());
    }

    #[test]
    fn should_skip_nan_in_climatology_mean() {
        let fields = vec![
            Array2::from_elem((1, 1), 2.0),
            Array2::from_elem((1, 1), f32::NAN),
            Array2::from_elem((1, 1), 4.0),
        ];

        let mean = nan_mean(&fields).unwrap();
        assert!((mean[[0, 0]] - 3.0).abs() < EPS);
    }

    #[test]
    fn should_leave_nan_where_no_valid_values() {
        let fields = vec![Array2::from_elem((1, 1), f32::NAN)];
        assert!(nan_mean(&fields).unwrap()[[0, 0]].is_nan());
    }
}
