use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, anyhow};
use thiserror::Error;

use crate::{
    locus::{ChromosomeMatch, ChromosomeTargets, Line, LocusError, rewrite_locus},
    output::StagedOutput,
    report::{self, RunReport},
    sex::{MaleColumns, SampleError, SexAssignment, SexLabelPolicy},
    smart_reader,
    tally::RunTallies,
};

/// Configuration required to drive a conversion.
#[derive(Debug, Clone)]
pub struct HaploidizeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Overrides the summary path derived from `output`.
    pub summary: Option<PathBuf>,
    pub y_chromosome: String,
    pub x_chromosome: String,
    pub chromosome_match: ChromosomeMatch,
    /// Sample sex table; all samples are male when absent.
    pub sex_assignment: Option<PathBuf>,
    pub sex_label_policy: SexLabelPolicy,
    pub json_report: bool,
}

impl HaploidizeConfig {
    pub fn summary_path(&self) -> PathBuf {
        self.summary
            .clone()
            .unwrap_or_else(|| report::summary_path(&self.output))
    }

    pub fn targets(&self) -> ChromosomeTargets {
        ChromosomeTargets::new(
            self.y_chromosome.clone(),
            self.x_chromosome.clone(),
            self.chromosome_match,
        )
    }
}

/// Aggregate counts of a finished run.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ConversionSummary {
    pub male_samples: usize,
    pub total_samples: usize,
    pub tallies: RunTallies,
}

/// Errors tied to a specific input line.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct RecordError {
    pub line: u64,
    #[source]
    pub kind: RecordErrorKind,
}

#[derive(Debug, Error)]
pub enum RecordErrorKind {
    #[error(transparent)]
    Locus(#[from] LocusError),
    #[error(transparent)]
    Samples(#[from] SampleError),
    #[error("locus on {chromosome} appears before the #CHROM header")]
    MissingHeader { chromosome: String },
    #[error("duplicate #CHROM header line")]
    DuplicateHeader,
}

impl RecordError {
    fn new(line: u64, kind: impl Into<RecordErrorKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }
}

/// Haploidize the male sex chromosome genotypes of a VCF file.
///
/// The output and its summary only appear once the whole input has been
/// processed successfully.
pub fn haploidize_vcf_file(config: &HaploidizeConfig) -> Result<ConversionSummary> {
    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        y = %config.y_chromosome,
        x = %config.x_chromosome,
        chromosome_match = ?config.chromosome_match,
        "starting conversion",
    );

    let assignment = match &config.sex_assignment {
        Some(path) => {
            let assignment = SexAssignment::from_path(path, config.sex_label_policy)
                .with_context(|| format!("failed to load sex assignment {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                samples = assignment.len(),
                males = assignment.males().count(),
                "sex assignment file was specified",
            );
            Some(assignment)
        }
        None => {
            tracing::warn!(
                "all samples are assumed to be male; pass a sex assignment file if the input also contains females"
            );
            None
        }
    };

    let reader = smart_reader::open_input(&config.input)
        .with_context(|| format!("failed to open input {}", config.input.display()))?;
    let mut output = StagedOutput::create(&config.output)?;

    let summary = haploidize_stream(reader, &mut output, &config.targets(), assignment.as_ref())
        .with_context(|| format!("failed to convert {}", config.input.display()))?;

    let destination = output.destination().to_path_buf();
    output.commit()?;
    tracing::info!("Wrote output to {}", destination.display());

    let summary_path = config.summary_path();
    report::write_summary(&summary_path, &summary)?;
    tracing::info!("Wrote summary to {}", summary_path.display());

    if config.json_report {
        RunReport::new(config, assignment.as_ref(), &summary)
            .write(&config.output)
            .context("failed to write run report")?;
    }

    tracing::info!(
        loci = summary.tallies.total_loci,
        y_loci = summary.tallies.y.loci,
        x_loci = summary.tallies.x.loci,
        "conversion finished",
    );

    Ok(summary)
}

/// Rewrite a VCF stream line by line.
///
/// Line terminators are preserved, so every line other than a rewritten sex
/// chromosome locus is copied byte for byte.
pub fn haploidize_stream<R, W>(
    mut reader: R,
    writer: &mut W,
    targets: &ChromosomeTargets,
    assignment: Option<&SexAssignment>,
) -> Result<ConversionSummary>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut males: Option<MaleColumns> = None;
    let mut tallies = RunTallies::default();
    let mut buf = String::new();
    let mut line_number = 0u64;
    tracing::debug!(y = targets.y(), x = targets.x(), "classifying loci");

    loop {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .with_context(|| format!("failed to read line {}", line_number + 1))?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let (content, terminator) = split_terminator(&buf);

        match Line::parse(content) {
            Line::Blank | Line::Metadata => writer.write_all(content.as_bytes())?,
            Line::Header => {
                if males.is_some() {
                    return Err(RecordError::new(line_number, RecordErrorKind::DuplicateHeader).into());
                }
                let columns = MaleColumns::from_header(content, assignment)
                    .map_err(|e| RecordError::new(line_number, e))?;
                tracing::info!(
                    males = columns.male_count(),
                    samples = columns.sample_count(),
                    "resolved male sample columns",
                );
                tracing::debug!(columns = ?columns.columns(), "male column indexes");
                males = Some(columns);
                writer.write_all(content.as_bytes())?;
            }
            Line::Locus { chromosome } => match targets.classify(chromosome) {
                None => {
                    tallies.record_other();
                    writer.write_all(content.as_bytes())?;
                }
                Some(sex_chromosome) => {
                    let Some(columns) = males.as_ref() else {
                        return Err(RecordError::new(
                            line_number,
                            RecordErrorKind::MissingHeader {
                                chromosome: chromosome.to_string(),
                            },
                        )
                        .into());
                    };
                    let rewritten = rewrite_locus(content, columns)
                        .map_err(|e| RecordError::new(line_number, e))?;
                    tallies.record_locus(sex_chromosome, &rewritten.tally);
                    writer.write_all(rewritten.line.as_bytes())?;
                }
            },
        }

        writer.write_all(terminator.as_bytes())?;
    }

    writer.flush()?;

    let males = males.ok_or_else(|| anyhow!("input contains no #CHROM header line"))?;

    Ok(ConversionSummary {
        male_samples: males.male_count(),
        total_samples: males.sample_count(),
        tallies,
    })
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}
