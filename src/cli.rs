use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    ConversionSummary, HaploidizeConfig, haploidize_vcf_file, locus::ChromosomeMatch,
    sex::SexLabelPolicy,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Convert diploid genotypes to haploid genotypes on the sex chromosomes of male samples",
    long_about = "Convert diploid genotypes to haploid genotypes on the sex chromosomes of male \
                  samples in a VCF file. Only GT subfields are modified. Heterozygous genotypes \
                  on the sex chromosomes of males, if any, are converted to missing."
)]
struct Cli {
    /// Input VCF file (plain or gzip-compressed)
    #[arg(short = 'i', long = "input-vcf", alias = "input_vcf", value_name = "VCF")]
    input_vcf: PathBuf,

    /// Output VCF file; gzip-compressed when the name ends in .gz
    #[arg(
        short = 'o',
        long = "output-vcf",
        alias = "output_vcf",
        value_name = "VCF",
        default_value = "./output.vcf"
    )]
    output_vcf: PathBuf,

    /// Name of the Y chromosome in the reference sequence
    #[arg(short = 'y', long, value_name = "NAME")]
    ychrom: String,

    /// Name of the X chromosome in the reference sequence
    #[arg(short = 'x', long, value_name = "NAME")]
    xchrom: String,

    /// Sex assignment file (sample<TAB>sex), required when the input contains females
    #[arg(short = 's', long, value_name = "FILE")]
    sex: Option<PathBuf>,

    /// How the CHROM field is compared with --ychrom and --xchrom
    #[arg(long, value_enum, default_value_t = ChromosomeMatch::Exact)]
    chrom_match: ChromosomeMatch,

    /// Exclude sex assignment rows labelled neither male nor female instead of failing
    #[arg(long)]
    skip_unknown_sex: bool,

    /// Summary file path (default: <output prefix>_summary.txt)
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Also write a JSON run report next to the output
    #[arg(long)]
    json_report: bool,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> HaploidizeConfig {
        HaploidizeConfig {
            input: self.input_vcf,
            output: self.output_vcf,
            summary: self.summary,
            y_chromosome: self.ychrom,
            x_chromosome: self.xchrom,
            chromosome_match: self.chrom_match,
            sex_assignment: self.sex,
            sex_label_policy: if self.skip_unknown_sex {
                SexLabelPolicy::Skip
            } else {
                SexLabelPolicy::Reject
            },
            json_report: self.json_report,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.into_config();
    let summary = haploidize_vcf_file(&config)?;
    print_summary(&summary, &config);

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
    Ok(())
}

fn print_summary(summary: &ConversionSummary, config: &HaploidizeConfig) {
    let tallies = &summary.tallies;

    println!(
        "Processed {loci} loci for {males} males in {total} samples.",
        loci = tallies.total_loci,
        males = summary.male_samples,
        total = summary.total_samples,
    );

    for (name, chromosome, counts) in [
        ("Y", &config.y_chromosome, &tallies.y),
        ("X", &config.x_chromosome, &tallies.x),
    ] {
        println!(
            "{name} ({chromosome}): {loci} loci, {het} hetero / {hom} homo / {mis} missing genotypes.",
            loci = counts.loci,
            het = counts.heterozygous,
            hom = counts.homozygous,
            mis = counts.missing,
        );
    }

    if tallies.y.heterozygous_loci > 0 || tallies.x.heterozygous_loci > 0 {
        println!(
            "Set {count} heterozygous male genotypes to missing.",
            count = tallies.y.heterozygous + tallies.x.heterozygous
        );
    }

    if tallies.y.loci == 0 && tallies.x.loci == 0 {
        println!(
            "No loci matched --ychrom {y} or --xchrom {x}; check the chromosome names.",
            y = config.y_chromosome,
            x = config.x_chromosome,
        );
    }

    println!("Summary written to {}", config.summary_path().display());
}
