//! Across-replication aggregation: mean, sample variance, standard error,
//! and a 95% Student-t confidence half-width per metric.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::report::RunReport;

/// Two-sided 95% Student-t critical values for 1..=30 degrees of freedom.
const T_95: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

/// Two-sided 95% critical value for `dof` degrees of freedom.
pub fn t_critical_95(dof: usize) -> f64 {
    match dof {
        0 => f64::INFINITY,
        1..=30 => T_95[dof - 1],
        31..=40 => 2.021,
        41..=60 => 2.000,
        61..=120 => 1.980,
        _ => 1.960,
    }
}

/// Sample statistics for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub samples: Vec<f64>,
    pub mean: f64,
    /// Sample variance with `n - 1` in the denominator; `0.0` below two samples.
    pub variance: f64,
    pub std_error: f64,
    /// 95% confidence half-width; `0.0` below two samples.
    pub half_width: f64,
}

impl Summary {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self {
                samples: Vec::new(),
                mean: 0.0,
                variance: 0.0,
                std_error: 0.0,
                half_width: 0.0,
            };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let (variance, std_error, half_width) = if n < 2 {
            (0.0, 0.0, 0.0)
        } else {
            let ss: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            let variance = ss / (n - 1) as f64;
            let std_error = (variance / n as f64).sqrt();
            (variance, std_error, t_critical_95(n - 1) * std_error)
        };
        Self {
            samples: samples.to_vec(),
            mean,
            variance,
            std_error,
            half_width,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub name: String,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Per-metric summaries across a set of run reports, in metric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationSummary {
    pub replications: usize,
    pub metrics: Vec<MetricSummary>,
}

impl ReplicationSummary {
    pub fn from_reports(reports: &[RunReport]) -> Self {
        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
        for report in reports {
            for (i, (name, value)) in report.metrics().into_iter().enumerate() {
                match columns.get_mut(i) {
                    Some((existing, values)) if *existing == name => values.push(value),
                    _ => columns.push((name, vec![value])),
                }
            }
        }
        Self {
            replications: reports.len(),
            metrics: columns
                .into_iter()
                .map(|(name, values)| MetricSummary {
                    name,
                    summary: Summary::from_samples(&values),
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Summary> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.summary)
    }
}

impl fmt::Display for ReplicationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "summary over {} replications", self.replications)?;
        writeln!(
            f,
            "  {:<16} {:>12} {:>14} {:>12}",
            "metric", "mean", "variance", "95% +/-"
        )?;
        for m in &self.metrics {
            writeln!(
                f,
                "  {:<16} {:>12.4} {:>14.8} {:>12.4}",
                m.name, m.summary.mean, m.summary.variance, m.summary.half_width
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_variance_uses_n_minus_one() {
        let s = Summary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.variance - 32.0 / 7.0).abs() < 1e-12);
        assert!((s.std_error - (32.0 / 7.0 / 8.0f64).sqrt()).abs() < 1e-12);
        assert!((s.half_width - 2.365 * s.std_error).abs() < 1e-12);
    }

    #[test]
    fn degenerate_sample_sizes() {
        let empty = Summary::from_samples(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.mean, 0.0);

        let one = Summary::from_samples(&[3.5]);
        assert_eq!(one.mean, 3.5);
        assert_eq!(one.variance, 0.0);
        assert_eq!(one.half_width, 0.0);
    }

    #[test]
    fn t_table_edges() {
        assert_eq!(t_critical_95(1), 12.706);
        assert_eq!(t_critical_95(30), 2.042);
        assert_eq!(t_critical_95(1000), 1.960);
        assert!(t_critical_95(0).is_infinite());
    }
}
