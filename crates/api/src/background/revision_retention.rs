//! Periodic pruning of old revisions.
//!
//! Spawns a loop that keeps the newest `keep_count` revisions of every
//! document with history. Runs on a fixed interval using
//! `tokio::time::interval`; the first sweep happens immediately.

use std::time::Duration;

use folio_core::versioning::VersioningEngine;
use tokio_util::sync::CancellationToken;

/// Run the revision retention loop until `cancel` is triggered.
///
/// A failed sweep is logged and retried on the next tick.
pub async fn run(
    engine: VersioningEngine,
    keep_count: i64,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        keep_count,
        interval_secs = interval.as_secs(),
        "Revision retention job started"
    );

    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Revision retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.sweep_retention(keep_count).await {
                    Ok(sweep) => {
                        if sweep.deleted > 0 || sweep.failed > 0 {
                            tracing::info!(
                                documents = sweep.documents,
                                deleted = sweep.deleted,
                                failed = sweep.failed,
                                "Revision retention: sweep finished"
                            );
                        } else {
                            tracing::debug!(
                                documents = sweep.documents,
                                "Revision retention: nothing to prune"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Revision retention: sweep failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use folio_core::block::BlockContent;
    use folio_core::content::{ContentStatus, DocumentMetadata};
    use folio_core::revision::RevisionChangeType;
    use folio_core::versioning::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn prunes_on_first_tick_and_stops_on_cancel() {
        let store = InMemoryStore::new();
        let engine = VersioningEngine::new(Arc::new(store.clone()));
        let doc = store
            .create_document(
                DocumentMetadata {
                    title: "Doc".into(),
                    description: None,
                    content_type: "article".into(),
                    author: "ann".into(),
                    tags: vec![],
                    category: None,
                    featured: false,
                    image_url: None,
                    status: ContentStatus::Draft,
                    slug: "doc".into(),
                },
                vec![BlockContent::paragraph("p")],
            )
            .await
            .unwrap();
        for _ in 0..4 {
            engine
                .create_revision(doc.id, RevisionChangeType::Edit, None, "ann")
                .await
                .unwrap();
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            engine,
            2,
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        let mut remaining = store.revision_count(doc.id).await;
        for _ in 0..100 {
            if remaining == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            remaining = store.revision_count(doc.id).await;
        }
        assert_eq!(remaining, 2);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("retention job did not stop")
            .unwrap();
    }
}
