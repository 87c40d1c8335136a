//! The `check-extract` subcommand: reports what is still missing per
//! collection before a transform is worth running.

use models::CatalogKind;

use crate::context::Context;
use crate::driver::select_collections;

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Check a single data set.
    #[arg(long = "dataset-id", alias = "dataset_id")]
    pub dataset_id: Option<String>,

    /// Check only one planet's collections.
    #[arg(long)]
    pub planet: Option<String>,
}

pub async fn run(ctx: &Context, args: CheckArgs) -> anyhow::Result<()> {
    let collections = select_collections(ctx, args.dataset_id.as_deref(), args.planet.as_deref())?;
    let mut incomplete = 0usize;

    for descriptor in collections {
        let fingerprint = descriptor.fingerprint();
        let total_pages = descriptor.page_count(extract::PAGE_SIZE);
        let missing_pages = ctx.files.list_missing_pages(&fingerprint, total_pages);

        let present: Vec<CatalogKind> =
            ctx.files.list_pds3(&fingerprint)?.into_iter().map(|(kind, _)| kind).collect();
        let missing_pds3: Vec<CatalogKind> =
            CatalogKind::all().filter(|k| !present.contains(k)).collect();

        if missing_pages.is_empty() && missing_pds3.is_empty() {
            println!("{fingerprint}: complete ({total_pages} pages)");
            continue;
        }
        incomplete += 1;
        println!(
            "{fingerprint}: {} of {} pages missing; pds3 missing: {}",
            missing_pages.len(),
            total_pages,
            if missing_pds3.is_empty() {
                "none".to_string()
            } else {
                missing_pds3.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
            }
        );
    }

    tracing::info!(incomplete, "check finished");
    Ok(())
}
