fn main() -> anyhow::Result<()> {
    diploid2haploid::cli::run()
}
