//! Run summaries.
//!
//! The text summary keeps the fixed layout downstream scripts parse. The
//! optional JSON report carries the same statistics plus run metadata for
//! tool consumption.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    conversion::{ConversionSummary, HaploidizeConfig},
    locus::ChromosomeMatch,
    sex::SexAssignment,
    tally::{ChromosomeTallies, RunTallies},
};

/// File name prefix shared by the summary and report files.
///
/// For `out.vcf.gz` this is `out`; names without `.vcf` are used whole.
pub fn output_prefix(output: &Path) -> String {
    let name = output
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    match name.find(".vcf") {
        Some(index) => name[..index].to_string(),
        None => name,
    }
}

pub fn summary_path(output: &Path) -> PathBuf {
    output.with_file_name(format!("{}_summary.txt", output_prefix(output)))
}

pub fn report_path(output: &Path) -> PathBuf {
    output.with_file_name(format!("{}_report.json", output_prefix(output)))
}

pub fn render_summary(summary: &ConversionSummary) -> String {
    let tallies = &summary.tallies;

    let mut out = format!(
        "{} males in {} total samples\n\n{} loci in total\n\n",
        summary.male_samples, summary.total_samples, tallies.total_loci
    );
    out.push_str(&render_chromosome("Y", &tallies.y));
    out.push('\n');
    out.push_str(&render_chromosome("X", &tallies.x));

    out
}

fn render_chromosome(name: &str, tallies: &ChromosomeTallies) -> String {
    format!(
        "{name} chromosome:\n\
         \t{} loci in total\n\
         \t{} loci contain hetero snps\n\n\
         \t{} snps are hetero\n\
         \t{} snps are homo\n\
         \t{} snps are missing\n",
        tallies.loci,
        tallies.heterozygous_loci,
        tallies.heterozygous,
        tallies.homozygous,
        tallies.missing,
    )
}

pub fn write_summary(path: &Path, summary: &ConversionSummary) -> Result<()> {
    fs::write(path, render_summary(summary))
        .with_context(|| format!("failed to write summary {}", path.display()))
}

/// Complete report of a conversion run.
/// Serialized to JSON alongside the output file.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Tool version
    pub version: String,
    /// Timestamp of run (ISO 8601)
    pub timestamp: String,
    pub input: String,
    pub output: String,
    pub chromosomes: ChromosomeInfo,
    pub samples: SampleInfo,
    pub statistics: RunTallies,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChromosomeInfo {
    pub y: String,
    pub x: String,
    #[serde(rename = "match")]
    pub match_mode: ChromosomeMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleInfo {
    pub total: usize,
    pub males: usize,
    /// Sex assignment file, or `None` when every sample was taken as male.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex_assignment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub females: Vec<String>,
}

impl RunReport {
    pub fn new(
        config: &HaploidizeConfig,
        assignment: Option<&SexAssignment>,
        summary: &ConversionSummary,
    ) -> Self {
        let now = time::OffsetDateTime::now_utc();
        let timestamp = now
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        RunReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp,
            input: config.input.display().to_string(),
            output: config.output.display().to_string(),
            chromosomes: ChromosomeInfo {
                y: config.y_chromosome.clone(),
                x: config.x_chromosome.clone(),
                match_mode: config.chromosome_match,
            },
            samples: SampleInfo {
                total: summary.total_samples,
                males: summary.male_samples,
                sex_assignment: config
                    .sex_assignment
                    .as_ref()
                    .map(|path| path.display().to_string()),
                females: assignment
                    .map(|a| a.females().map(str::to_string).collect())
                    .unwrap_or_default(),
            },
            statistics: summary.tallies,
        }
    }

    /// Write the report as JSON to a file alongside the output.
    /// For output.vcf, writes output_report.json
    pub fn write(&self, output_path: &Path) -> Result<PathBuf> {
        let report_path = report_path(output_path);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&report_path, json)?;
        tracing::info!("Wrote run report to {}", report_path.display());
        Ok(report_path)
    }
}
