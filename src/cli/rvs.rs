//! Radial-velocity table command implementation

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::star::HeaderInfo;
use crate::timeseries::rjd_to_utc;

use super::{build_star, entry_filter, Cli, CliError};

/// Rvs subcommand
#[derive(Debug, Args)]
pub struct RvsCommand {
    /// Catalog name of the target star
    pub target: String,

    /// Restrict to instruments whose name contains this token
    #[arg(long)]
    pub instrument: Option<String>,

    /// Restrict to observation modes whose name contains this token
    #[arg(long)]
    pub mode: Option<String>,

    /// Restrict to pipelines whose name contains this token
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Write the table to a CSV file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// One radial-velocity measurement row
#[derive(Debug, Serialize)]
struct RvRecord {
    instrument: String,
    pipeline: String,
    mode: String,
    rjd: f64,
    date_utc: String,
    rv: f64,
    rv_err: f64,
}

impl RvsCommand {
    /// Print or export the radial-velocity table
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let star = build_star(&self.target, cli.api_user.as_deref());
        let filter = entry_filter(
            self.instrument.as_deref(),
            self.mode.as_deref(),
            self.pipeline.as_deref(),
        );

        let table = star.radial_velocities(&filter)?;
        let records = flatten_rv_table(&table)?;

        match &self.output {
            Some(path) => {
                let mut writer = csv::Writer::from_path(path).map_err(|e| {
                    CliError::OutputError(format!("failed to open {}: {e}", path.display()))
                })?;
                for record in &records {
                    writer
                        .serialize(record)
                        .map_err(|e| CliError::OutputError(e.to_string()))?;
                }
                writer
                    .flush()
                    .map_err(|e| CliError::OutputError(e.to_string()))?;
                println!("Wrote {} rows to {}", records.len(), path.display());
            }
            None => {
                let mut writer = csv::Writer::from_writer(std::io::stdout());
                for record in &records {
                    writer
                        .serialize(record)
                        .map_err(|e| CliError::OutputError(e.to_string()))?;
                }
                writer
                    .flush()
                    .map_err(|e| CliError::OutputError(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Turn the nested header table into per-measurement rows
fn flatten_rv_table(table: &HeaderInfo) -> Result<Vec<RvRecord>, CliError> {
    let mut records = Vec::new();

    for (instrument, modes) in table {
        for (mode, pipelines) in modes {
            for (pipeline, metrics) in pipelines {
                let series = |name: &str| -> Result<Vec<f64>, CliError> {
                    metrics
                        .get(name)
                        .and_then(|v| v.to_number_series())
                        .ok_or_else(|| {
                            CliError::OutputError(format!(
                                "metric {name} of {instrument}/{pipeline}/{mode} is not numeric"
                            ))
                        })
                };
                let rjd = series("rjd")?;
                let rv = series("rv")?;
                let rv_err = series("rv_err")?;

                if rjd.len() != rv.len() || rv.len() != rv_err.len() {
                    return Err(CliError::OutputError(format!(
                        "metric series of {instrument}/{pipeline}/{mode} have mismatched lengths"
                    )));
                }

                for i in 0..rjd.len() {
                    records.push(RvRecord {
                        instrument: instrument.clone(),
                        pipeline: pipeline.clone(),
                        mode: mode.clone(),
                        rjd: rjd[i],
                        date_utc: rjd_to_utc(rjd[i])
                            .map(|dt| dt.to_rfc3339())
                            .unwrap_or_default(),
                        rv: rv[i],
                        rv_err: rv_err[i],
                    });
                }
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::{MetricMap, MetricValue};

    #[test]
    fn test_flatten_rv_table() {
        let mut metrics = MetricMap::new();
        metrics.insert("rjd".into(), MetricValue::Numbers(vec![57000.0, 57001.0]));
        metrics.insert("rv".into(), MetricValue::Numbers(vec![10.0, 11.0]));
        metrics.insert("rv_err".into(), MetricValue::Numbers(vec![0.1, 0.2]));

        let mut table = HeaderInfo::new();
        table
            .entry("HARPN".into())
            .or_default()
            .entry("HR".into())
            .or_default()
            .insert("2.3.5".into(), metrics);

        let records = flatten_rv_table(&table).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].instrument, "HARPN");
        assert_eq!(records[0].pipeline, "2.3.5");
        assert_eq!(records[1].rv, 11.0);
        assert!(!records[0].date_utc.is_empty());
    }

    #[test]
    fn test_flatten_rejects_mismatched_series() {
        let mut metrics = MetricMap::new();
        metrics.insert("rjd".into(), MetricValue::Numbers(vec![57000.0]));
        metrics.insert("rv".into(), MetricValue::Numbers(vec![10.0, 11.0]));
        metrics.insert("rv_err".into(), MetricValue::Numbers(vec![0.1]));

        let mut table = HeaderInfo::new();
        table
            .entry("HARPN".into())
            .or_default()
            .entry("HR".into())
            .or_default()
            .insert("2.3.5".into(), metrics);

        assert!(flatten_rv_table(&table).is_err());
    }
}
