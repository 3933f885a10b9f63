use std::sync::Arc;

use bson::oid::ObjectId;
use log::{info, warn};
use model::{
    comment::Comment,
    delete_request::{DeletionRequest, RequestStatus, Resolution},
    errors::{Entity, ModerationError},
    identity::AuthSession,
    thread::ReplyIndex,
};
use serde::Serialize;
use storage::{
    batch::{Batch, CommitError, Op, Receipt},
    ModerationStore, TeamDirectory,
};

use super::store_failure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub instantly_deleted: bool,
    /// Comments removed, the target included. Only set on the instant path.
    pub deleted_count: Option<u64>,
    /// Request queued for a moderator. Only set on the queued path.
    pub request_id: Option<ObjectId>,
}

impl DeleteOutcome {
    pub fn message(&self) -> String {
        match self.deleted_count {
            Some(count) if self.instantly_deleted => format!("Deleted {} comment(s)", count),
            _ => "Deletion request submitted for moderator review".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub status: RequestStatus,
    pub deleted_count: u64,
}

#[derive(Clone)]
pub struct Deletion {
    store: Arc<dyn ModerationStore>,
    directory: Arc<dyn TeamDirectory>,
}

impl Deletion {
    pub(crate) fn new(store: Arc<dyn ModerationStore>, directory: Arc<dyn TeamDirectory>) -> Self {
        Deletion { store, directory }
    }

    pub async fn delete(
        &self,
        comment_id: ObjectId,
        requester_email: &str,
        session: Option<&AuthSession>,
        reason: Option<String>,
    ) -> Result<DeleteOutcome, ModerationError> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| ModerationError::not_found(Entity::Comment, comment_id))?;

        // Exact match: emails are compared the way they were stored.
        let requester_email = requester_email.trim();
        if requester_email != comment.email {
            warn!("Delete of comment {} refused: email mismatch", comment_id);
            return Err(ModerationError::Unauthorized);
        }

        if self.has_authority(&comment, session).await? {
            let deleted = self.delete_thread(&comment, Batch::new(), None).await?;
            info!(
                "Deleted comment {} with its replies ({} removed)",
                comment_id, deleted
            );
            return Ok(DeleteOutcome {
                instantly_deleted: true,
                deleted_count: Some(deleted),
                request_id: None,
            });
        }

        let request = DeletionRequest::new(&comment, requester_email, reason);
        let request_id = request.id;
        self.commit(Batch::new().push(Op::InsertDeleteRequest(request)), None)
            .await?;
        info!(
            "Queued deletion request {} for comment {}",
            request_id, comment_id
        );
        Ok(DeleteOutcome {
            instantly_deleted: false,
            deleted_count: None,
            request_id: Some(request_id),
        })
    }

    pub async fn resolve(
        &self,
        request_id: ObjectId,
        resolution: Resolution,
    ) -> Result<Resolved, ModerationError> {
        let request = self
            .store
            .get_delete_request(request_id)
            .await?
            .ok_or_else(|| ModerationError::not_found(Entity::DeletionRequest, request_id))?;
        if request.status.is_terminal() {
            warn!("Deletion request {} is already {}", request_id, request.status);
            return Err(ModerationError::AlreadyResolved(request_id));
        }

        let status = resolution.status();
        let batch = Batch::new().resolve_request(request_id, status);
        let comment = match resolution {
            Resolution::Approve => self.store.get_comment(request.comment_id).await?,
            Resolution::Reject => None,
        };
        let deleted_count = match comment {
            Some(comment) => self.delete_thread(&comment, batch, Some(request_id)).await?,
            None => {
                if resolution == Resolution::Approve {
                    info!(
                        "Comment {} of request {} is already gone",
                        request.comment_id, request_id
                    );
                }
                self.commit(batch, Some(request_id)).await?.deleted
            }
        };
        info!("Deletion request {} {}", request_id, status);
        Ok(Resolved {
            status,
            deleted_count,
        })
    }

    pub async fn pending(&self) -> Result<Vec<DeletionRequest>, ModerationError> {
        Ok(self.store.pending_delete_requests().await?)
    }

    async fn has_authority(
        &self,
        comment: &Comment,
        session: Option<&AuthSession>,
    ) -> Result<bool, ModerationError> {
        let Some(session) = session else {
            return Ok(false);
        };
        if !session.is_admin() && !session.matches(&comment.email) {
            return Ok(false);
        }
        if session.is_admin() {
            return Ok(true);
        }
        let profile = self.directory.find_account(&session.email).await?;
        Ok(profile.map(|p| p.is_team_member()).unwrap_or(false))
    }

    /// Deletes `comment` and every reply below it, together with whatever
    /// `batch` already holds.
    async fn delete_thread(
        &self,
        comment: &Comment,
        batch: Batch,
        request: Option<ObjectId>,
    ) -> Result<u64, ModerationError> {
        let comments = self.store.post_comments(comment.post_id).await?;
        let index = ReplyIndex::new(&comments);
        let ids: Vec<ObjectId> = std::iter::once(comment.id)
            .chain(index.descendants(comment.id).into_iter().map(|c| c.id))
            .collect();
        let receipt = self
            .commit(batch.delete_thread(comment.post_id, ids), request)
            .await?;
        Ok(receipt.deleted)
    }

    /// A failed precondition means the deletion request resolved by `batch`
    /// was resolved concurrently.
    async fn commit(
        &self,
        batch: Batch,
        request: Option<ObjectId>,
    ) -> Result<Receipt, ModerationError> {
        match (self.store.commit(batch).await, request) {
            (Ok(receipt), _) => Ok(receipt),
            (Err(CommitError::Precondition(reason)), Some(request)) => {
                warn!("Deletion request resolved concurrently: {}", reason);
                Err(ModerationError::AlreadyResolved(request))
            }
            (Err(err), _) => Err(store_failure(err)),
        }
    }
}
