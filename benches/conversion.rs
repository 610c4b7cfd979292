use std::{fs, io::Cursor, path::PathBuf};

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use diploid2haploid::{
    HaploidizeConfig, genotype::haploidize_sample_field, haploidize_stream, haploidize_vcf_file,
    locus::{ChromosomeMatch, ChromosomeTargets},
    sex::SexLabelPolicy,
};
use tempfile::tempdir;

const GENOTYPES: [&str; 4] = ["0/0:12", "0/1:30", "1/1:25", "./.:0"];

fn create_vcf(records: usize, samples: usize) -> String {
    let names: Vec<String> = (1..=samples).map(|i| format!("S{i}")).collect();
    let mut content = format!(
        "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}\n",
        names.join("\t")
    );
    for i in 1..=records {
        let chrom = match i % 3 {
            0 => "chr1",
            1 => "chrX",
            _ => "chrY",
        };
        content.push_str(&format!("{chrom}\t{i}\t.\tA\tG\t.\tPASS\t.\tGT:DP"));
        for s in 0..samples {
            content.push('\t');
            content.push_str(GENOTYPES[(i + s) % GENOTYPES.len()]);
        }
        content.push('\n');
    }
    content
}

fn base_config(input: PathBuf, output: PathBuf) -> HaploidizeConfig {
    HaploidizeConfig {
        input,
        output,
        summary: None,
        y_chromosome: String::from("chrY"),
        x_chromosome: String::from("chrX"),
        chromosome_match: ChromosomeMatch::Exact,
        sex_assignment: None,
        sex_label_policy: SexLabelPolicy::Reject,
        json_report: false,
    }
}

fn bench_sample_field(c: &mut Criterion) {
    c.bench_function("haploidize_sample_field", |b| {
        b.iter(|| {
            for field in GENOTYPES {
                black_box(haploidize_sample_field(black_box(field)).unwrap());
            }
        });
    });
}

fn bench_stream(c: &mut Criterion) {
    let targets = ChromosomeTargets::new("chrY", "chrX", ChromosomeMatch::Exact);

    let mut group = c.benchmark_group("haploidize_stream");
    for samples in [10, 100] {
        let data = create_vcf(1000, samples);
        group.bench_with_input(BenchmarkId::from_parameter(samples), &data, |b, data| {
            b.iter(|| {
                let mut out = Vec::with_capacity(data.len());
                let summary =
                    haploidize_stream(Cursor::new(data.as_bytes()), &mut out, &targets, None)
                        .expect("conversion");
                black_box((summary, out));
            });
        });
    }
    group.finish();
}

fn bench_file_pipeline(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.vcf");
    fs::write(&input_path, create_vcf(5000, 50)).unwrap();
    let output_path = dir.path().join("output.vcf");

    c.bench_function("haploidize_vcf_file", |b| {
        b.iter_batched(
            || base_config(input_path.clone(), output_path.clone()),
            |config| {
                haploidize_vcf_file(&config).expect("conversion");
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    conversion_benches,
    bench_sample_field,
    bench_stream,
    bench_file_pipeline
);
criterion_main!(conversion_benches);
