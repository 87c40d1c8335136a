//! Shared phase plumbing: collection selection, fetch-event logging, and
//! the per-phase summary written at the storage root.

use anyhow::Context as _;
use chrono::Utc;
use fetch::FetchEvent;
use models::{CollectionDescriptor, Fingerprint};
use stores::{CollectionReport, PhaseSummary};
use tokio::sync::mpsc::UnboundedSender;

use crate::context::Context;

/// Resolves the collections a phase runs over: one by dataset id, or
/// every registered descriptor (optionally per planet).
pub fn select_collections(
    ctx: &Context,
    dataset_id: Option<&str>,
    planet: Option<&str>,
) -> anyhow::Result<Vec<CollectionDescriptor>> {
    match dataset_id {
        Some(id) => {
            let descriptor = ctx
                .registry
                .find_by_dataset(id)?
                .with_context(|| {
                    format!(
                        "dataset {id} is not registered; run \
                         `extract --type-extract ode-collections-save` first"
                    )
                })?;
            Ok(vec![descriptor])
        }
        None => {
            let mut descriptors: Vec<_> = ctx.registry.descriptors(planet)?.collect();
            descriptors.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));
            Ok(descriptors)
        }
    }
}

/// Spawns a logger draining the fetch pool's event stream, and returns
/// the sender to hand to the pool.
pub fn spawn_event_logger() -> UnboundedSender<FetchEvent> {
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match event {
                FetchEvent::Started { url } => tracing::debug!(%url, "download started"),
                FetchEvent::Progress { url, bytes } => {
                    tracing::trace!(%url, bytes, "download progress")
                }
                FetchEvent::Completed { url, dest } => {
                    tracing::debug!(%url, dest = %dest.display(), "download complete")
                }
                FetchEvent::Failed { url, error } => tracing::warn!(%url, error, "download failed"),
            }
        }
    });
    sender
}

/// Collects per-collection outcomes of one phase and writes the summary
/// at the storage root when done.
pub struct PhaseRunner {
    summary: PhaseSummary,
    failures: usize,
}

impl PhaseRunner {
    pub fn new(phase: &str) -> Self {
        Self { summary: PhaseSummary::new(phase, Utc::now()), failures: 0 }
    }

    /// Records one collection's outcome and writes its report file. A
    /// collection failure never fails the phase.
    pub fn finish_collection(
        &mut self,
        ctx: &Context,
        fingerprint: &Fingerprint,
        report: &CollectionReport,
    ) -> anyhow::Result<()> {
        if !report.is_empty() {
            self.failures += report.total();
            tracing::warn!(collection = %fingerprint, failures = report.total(), "collection finished with failures");
        }
        report.write(&ctx.files.stac_dir(fingerprint))?;
        self.summary.outcome(fingerprint.to_string(), report);
        Ok(())
    }

    pub fn finish(self, ctx: &Context) -> anyhow::Result<()> {
        let failures = self.failures;
        self.summary.write(ctx.files.root(), Utc::now())?;
        if failures > 0 {
            tracing::warn!(failures, "phase finished with per-collection failures");
        }
        Ok(())
    }
}
