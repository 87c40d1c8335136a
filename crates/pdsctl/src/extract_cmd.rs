//! The `extract` subcommand: collection discovery, record pagination, and
//! PDS3 object scraping.

use stores::CollectionReport;

use crate::context::Context;
use crate::driver::{select_collections, spawn_event_logger, PhaseRunner};

#[derive(Debug, clap::Args)]
pub struct ExtractArgs {
    /// What to extract.
    #[arg(long = "type-extract", alias = "type_extract", value_enum)]
    pub type_extract: ExtractType,

    /// Restrict discovery to one planet's metadata database.
    #[arg(long)]
    pub planet: Option<String>,

    /// Operate on a single data set.
    #[arg(long = "dataset-id", alias = "dataset_id")]
    pub dataset_id: Option<String>,

    /// Sample mode: only the first N record pages per collection.
    #[arg(long)]
    pub sample: Option<u64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ExtractType {
    /// Discover georeferenced collections, register them, and print them.
    #[value(alias = "ode_collections")]
    OdeCollections,
    /// Same as ode-collections, without the listing on stdout.
    #[value(alias = "ode_collections_save")]
    OdeCollectionsSave,
    /// Fetch the missing record pages of the selected collections.
    #[value(alias = "ode_records")]
    OdeRecords,
    /// Scrape and fetch the PDS3 catalog objects of the selected
    /// collections.
    #[value(alias = "pds3_objects")]
    Pds3Objects,
}

pub async fn run(ctx: &Context, args: ExtractArgs) -> anyhow::Result<()> {
    match args.type_extract {
        // Both discovery variants write through to the registry; the plain
        // form additionally prints what it registered.
        ExtractType::OdeCollections => {
            let descriptors = extract::discover(
                &ctx.pool,
                &ctx.registry,
                &ctx.endpoints,
                args.planet.as_deref(),
                &ctx.cancel,
            )
            .await?;
            for d in &descriptors {
                println!(
                    "{}\t{}\t{}\t{}\t{} products",
                    d.target, d.instrument_host_id, d.instrument_id, d.dataset_id, d.number_products
                );
            }
            tracing::info!(collections = descriptors.len(), "discovery finished");
        }
        ExtractType::OdeCollectionsSave => {
            let descriptors = extract::discover(
                &ctx.pool,
                &ctx.registry,
                &ctx.endpoints,
                args.planet.as_deref(),
                &ctx.cancel,
            )
            .await?;
            tracing::info!(written = descriptors.len(), "registry updated");
        }
        ExtractType::OdeRecords => {
            let collections = select_collections(ctx, args.dataset_id.as_deref(), args.planet.as_deref())?;
            let mut runner = PhaseRunner::new("extract_records");
            for descriptor in collections {
                let fingerprint = descriptor.fingerprint();
                let mut report = CollectionReport::default();
                match extract::extract_records(
                    &ctx.pool,
                    &ctx.files,
                    &ctx.endpoints,
                    &descriptor,
                    args.sample,
                    Some(spawn_event_logger()),
                    &ctx.cancel,
                )
                .await
                {
                    Ok(outcome) => {
                        for (url, error) in &outcome.failed {
                            report.record("fetch", format!("{url}: {error}"));
                        }
                    }
                    Err(error) => report.record("extract", error.to_string()),
                }
                runner.finish_collection(ctx, &fingerprint, &report)?;
                if ctx.cancel.is_cancelled() {
                    break;
                }
            }
            runner.finish(ctx)?;
        }
        ExtractType::Pds3Objects => {
            let collections = select_collections(ctx, args.dataset_id.as_deref(), args.planet.as_deref())?;
            let mut runner = PhaseRunner::new("extract_pds3");
            for descriptor in collections {
                let fingerprint = descriptor.fingerprint();
                let mut report = CollectionReport::default();
                match extract::extract_pds3(
                    &ctx.pool,
                    &ctx.files,
                    &descriptor,
                    Some(spawn_event_logger()),
                    &ctx.cancel,
                )
                .await
                {
                    Ok(outcome) => {
                        for (url, error) in &outcome.failed {
                            report.record("fetch", format!("{url}: {error}"));
                        }
                    }
                    Err(error) => report.record("extract", error.to_string()),
                }
                runner.finish_collection(ctx, &fingerprint, &report)?;
                if ctx.cancel.is_cancelled() {
                    break;
                }
            }
            runner.finish(ctx)?;
        }
    }
    Ok(())
}
