use std::sync::Arc;

use bson::oid::ObjectId;
use eyre::eyre;
use log::{info, warn};
use model::errors::{Entity, ModerationError};
use storage::{
    batch::{Batch, Recount},
    ModerationStore,
};

use super::store_failure;

/// Post whose cached counter disagreed with its comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drift {
    pub post_id: ObjectId,
    pub previous: i64,
    pub count: i64,
    /// Visible comments that were not counted before the re-sync.
    pub marked: u64,
}

#[derive(Clone)]
pub struct Counts {
    store: Arc<dyn ModerationStore>,
}

impl Counts {
    pub(crate) fn new(store: Arc<dyn ModerationStore>) -> Self {
        Counts { store }
    }

    /// Recomputes the post counter from its counted comments and stores it.
    pub async fn reconcile(&self, post_id: ObjectId) -> Result<i64, ModerationError> {
        let (recount, _) = self.recount(post_id, Batch::new().recount(post_id)).await?;
        Ok(recount.count)
    }

    /// Reconciles every post and reports the ones that had drifted. Visible
    /// comments that were never counted are marked as counted first, so they
    /// are also uncounted when deleted later.
    pub async fn reconcile_all(&self) -> Result<Vec<Drift>, ModerationError> {
        let mut drifts = Vec::new();
        for post_id in self.store.post_ids().await? {
            let (recount, marked) = self
                .recount(post_id, Batch::new().backfill_and_recount(post_id))
                .await?;
            if recount.drifted() || marked > 0 {
                drifts.push(Drift {
                    post_id,
                    previous: recount.previous,
                    count: recount.count,
                    marked,
                });
            }
        }
        info!("Reconciled all posts, {} drifted", drifts.len());
        Ok(drifts)
    }

    async fn recount(&self, post_id: ObjectId, batch: Batch) -> Result<(Recount, u64), ModerationError> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(ModerationError::not_found(Entity::Post, post_id));
        }
        let receipt = self.store.commit(batch).await.map_err(store_failure)?;
        let recount = receipt
            .recount
            .ok_or_else(|| eyre!("Recount of post {} reported nothing", post_id))?;
        if receipt.marked > 0 {
            warn!(
                "Marked {} visible comment(s) of post {} as counted",
                receipt.marked, post_id
            );
        }
        if recount.drifted() {
            warn!(
                "Comment count of post {} drifted: {} -> {}",
                post_id, recount.previous, recount.count
            );
        }
        Ok((recount, receipt.marked))
    }
}
