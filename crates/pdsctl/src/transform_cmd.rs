//! The `transform` subcommand: builds the STAC tree from what the extract
//! phase persisted.

use stores::CollectionReport;

use crate::context::Context;
use crate::driver::{select_collections, PhaseRunner};

#[derive(Debug, clap::Args)]
pub struct TransformArgs {
    /// What to transform.
    #[arg(long = "type-stac", alias = "type_stac", value_enum)]
    pub type_stac: StacType,

    /// Operate on a single data set.
    #[arg(long = "dataset-id", alias = "dataset_id")]
    pub dataset_id: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StacType {
    /// Record pages become STAC items and the shallow collection
    /// documents.
    Records,
    /// PDS3 catalog objects enrich the collection and parent catalogs.
    #[value(alias = "pds3_objects")]
    Pds3Objects,
}

pub async fn run(ctx: &Context, args: TransformArgs) -> anyhow::Result<()> {
    let collections = select_collections(ctx, args.dataset_id.as_deref(), None)?;
    let phase = match args.type_stac {
        StacType::Records => "transform_records",
        StacType::Pds3Objects => "transform_pds3",
    };
    let mut runner = PhaseRunner::new(phase);

    for descriptor in collections {
        let fingerprint = descriptor.fingerprint();
        let mut report = CollectionReport::default();

        let result = match args.type_stac {
            StacType::Records => {
                transform::transform_records(&ctx.tree, &descriptor, &mut report).map(|stats| {
                    tracing::info!(
                        collection = %fingerprint,
                        items = stats.items_written,
                        "records transformed"
                    );
                })
            }
            StacType::Pds3Objects => transform::transform_pds3(&ctx.tree, &descriptor, &mut report),
        };

        // Storage failures are fatal to this collection's transform, not
        // to the phase; the next collection still runs.
        if let Err(error) = result {
            tracing::error!(collection = %fingerprint, %error, "transform failed");
            report.record("transform", error.to_string());
        }
        runner.finish_collection(ctx, &fingerprint, &report)?;
        if ctx.cancel.is_cancelled() {
            break;
        }
    }
    runner.finish(ctx)?;
    Ok(())
}
