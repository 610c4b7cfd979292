#![doc = include_str!("../README.md")]

pub mod cli;
pub mod conversion;
pub mod genotype;
pub mod locus;
pub mod output;
pub mod report;
pub mod sex;
pub mod smart_reader;
pub mod tally;

pub use conversion::{ConversionSummary, HaploidizeConfig, haploidize_stream, haploidize_vcf_file};
