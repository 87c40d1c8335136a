//! `pdsctl` drives the harvest: extract collections, records, and PDS3
//! objects from the upstream services, then transform them into the local
//! STAC tree. The subcommands are thin; the durable state and all
//! idempotence live in the storage layer.

mod check_cmd;
mod context;
mod driver;
mod extract_cmd;
mod logging;
mod reset_cmd;
mod transform_cmd;

use clap::Parser;

pub use context::{ConfigArgs, Context};
pub use logging::{init_logging, LogArgs, LogFormat};

/// Harvests planetary data set descriptions into a STAC tree.
#[derive(Debug, Parser)]
#[command(author, version, name = "pdsctl")]
pub struct Cli {
    #[clap(flatten)]
    log: LogArgs,

    #[clap(flatten)]
    config: ConfigArgs,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
#[command(rename_all = "kebab-case")]
pub enum Subcommand {
    /// Pull collections, record pages, or PDS3 objects from upstream.
    Extract(extract_cmd::ExtractArgs),
    /// Build or enrich the STAC tree from harvested files.
    Transform(transform_cmd::TransformArgs),
    /// Report missing pages and PDS3 files per collection.
    #[command(alias = "check_extract")]
    CheckExtract(check_cmd::CheckArgs),
    /// Delete harvested files or STAC output, by scope.
    Reset(reset_cmd::ResetArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(&cli.log);
    let ctx = Context::new(&cli.config)?;

    let result = match cli.subcommand {
        Subcommand::Extract(args) => extract_cmd::run(&ctx, args).await,
        Subcommand::Transform(args) => transform_cmd::run(&ctx, args).await,
        Subcommand::CheckExtract(args) => check_cmd::run(&ctx, args).await,
        Subcommand::Reset(args) => reset_cmd::run(&ctx, args).await,
    };
    if let Err(err) = result.as_ref() {
        tracing::error!(error = ?err, "subcommand failed");
    }
    result
}
