use serde::Serialize;

use crate::genotype::Zygosity;
use crate::locus::SexChromosome;

/// Genotype classes seen on a single rewritten locus.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LocusTally {
    pub heterozygous: u64,
    pub homozygous: u64,
    pub missing: u64,
}

impl LocusTally {
    pub fn record(&mut self, zygosity: Zygosity) {
        match zygosity {
            Zygosity::Heterozygous => self.heterozygous += 1,
            Zygosity::Homozygous => self.homozygous += 1,
            Zygosity::Missing => self.missing += 1,
        }
    }

    pub fn has_heterozygous(&self) -> bool {
        self.heterozygous > 0
    }
}

/// Running counts for one sex chromosome.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct ChromosomeTallies {
    pub loci: u64,
    /// Loci with at least one heterozygous male call.
    pub heterozygous_loci: u64,
    pub heterozygous: u64,
    pub homozygous: u64,
    pub missing: u64,
}

impl ChromosomeTallies {
    pub fn record(&mut self, locus: &LocusTally) {
        self.loci += 1;
        if locus.has_heterozygous() {
            self.heterozygous_loci += 1;
        }
        self.heterozygous += locus.heterozygous;
        self.homozygous += locus.homozygous;
        self.missing += locus.missing;
    }

    /// Total male genotypes classified on this chromosome.
    pub fn genotypes(&self) -> u64 {
        self.heterozygous + self.homozygous + self.missing
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct RunTallies {
    /// Every data line, sex chromosome or not.
    pub total_loci: u64,
    pub y: ChromosomeTallies,
    pub x: ChromosomeTallies,
}

impl RunTallies {
    pub fn record_locus(&mut self, chromosome: SexChromosome, locus: &LocusTally) {
        self.total_loci += 1;
        self.chromosome_mut(chromosome).record(locus);
    }

    pub fn record_other(&mut self) {
        self.total_loci += 1;
    }

    pub fn chromosome(&self, chromosome: SexChromosome) -> &ChromosomeTallies {
        match chromosome {
            SexChromosome::Y => &self.y,
            SexChromosome::X => &self.x,
        }
    }

    fn chromosome_mut(&mut self, chromosome: SexChromosome) -> &mut ChromosomeTallies {
        match chromosome {
            SexChromosome::Y => &mut self.y,
            SexChromosome::X => &mut self.x,
        }
    }
}
