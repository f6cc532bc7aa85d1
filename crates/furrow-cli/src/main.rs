use clap::Parser;

fn main() -> anyhow::Result<()> {
    furrow_cli::run(furrow_cli::Args::parse())
}
