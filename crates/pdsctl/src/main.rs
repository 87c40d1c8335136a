use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parsing handles --help and --version, exiting on its own.
    let cli = pdsctl::Cli::parse();
    pdsctl::run(cli).await
}
