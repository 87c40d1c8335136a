//! The `reset` subcommand: scoped deletion, for forcing a clean reharvest
//! when the upstream changed under us.

use anyhow::Context as _;
use stores::ResetScope;

use crate::context::Context;

#[derive(Debug, clap::Args)]
pub struct ResetArgs {
    /// What to delete.
    #[arg(long, value_enum)]
    pub scope: Scope,

    /// Required for `--scope collection`.
    #[arg(long = "dataset-id", alias = "dataset_id")]
    pub dataset_id: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Scope {
    /// All harvested record pages and PDS3 objects; STAC output stays.
    Files,
    /// The whole STAC tree.
    Stac,
    /// Everything belonging to one collection.
    Collection,
}

pub async fn run(ctx: &Context, args: ResetArgs) -> anyhow::Result<()> {
    let scope = match args.scope {
        Scope::Files => ResetScope::Files,
        Scope::Stac => ResetScope::Stac,
        Scope::Collection => {
            let dataset_id = args
                .dataset_id
                .as_deref()
                .context("--scope collection requires --dataset-id")?;
            let descriptor = ctx
                .registry
                .find_by_dataset(dataset_id)?
                .with_context(|| format!("dataset {dataset_id} is not registered"))?;
            ResetScope::Collection(descriptor.fingerprint())
        }
    };
    tracing::info!(?scope, "resetting");
    ctx.files.reset(scope)?;
    Ok(())
}
