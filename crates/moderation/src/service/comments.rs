use std::sync::Arc;

use bson::oid::ObjectId;
use log::{info, warn};
use model::{
    comment::{Comment, Submission},
    errors::{Entity, ModerationError},
    identity::AuthSession,
    thread::{self, ThreadNode},
};
use serde::{Serialize, Serializer};
use storage::{
    batch::{Batch, Op},
    ModerationStore,
};

use super::{
    identity::IdentityResolver,
    rate_limit::{identity_key, RateLimiter},
    store_failure,
};

/// Result of a stored submission. Serializes without the commenter email.
#[derive(Debug, Clone, Serialize)]
pub struct Submitted {
    pub approved: bool,
    pub is_team_member: bool,
    #[serde(serialize_with = "public_comment")]
    pub comment: Comment,
}

fn public_comment<S: Serializer>(comment: &Comment, serializer: S) -> Result<S::Ok, S::Error> {
    comment.public().serialize(serializer)
}

impl Submitted {
    pub fn message(&self) -> &'static str {
        if self.approved {
            "Comment posted"
        } else {
            "Comment submitted and awaiting moderation"
        }
    }
}

#[derive(Clone)]
pub struct Comments {
    store: Arc<dyn ModerationStore>,
    identity: IdentityResolver,
    limiter: Arc<dyn RateLimiter>,
    max_comment_length: usize,
}

impl Comments {
    pub(crate) fn new(
        store: Arc<dyn ModerationStore>,
        identity: IdentityResolver,
        limiter: Arc<dyn RateLimiter>,
        max_comment_length: usize,
    ) -> Self {
        Comments {
            store,
            identity,
            limiter,
            max_comment_length,
        }
    }

    pub async fn submit(
        &self,
        mut submission: Submission,
        session: Option<&AuthSession>,
    ) -> Result<Submitted, ModerationError> {
        submission.validate(self.max_comment_length)?;
        if !self.limiter.allow(&identity_key(&submission.email)) {
            warn!("Rate limited comment from {}", submission.email);
            return Err(ModerationError::RateLimited);
        }

        let trust = self
            .identity
            .resolve(
                &submission.email,
                session,
                submission.verification_code.as_deref(),
            )
            .await?;

        let post_id = submission.post_id;
        if self.store.get_post(post_id).await?.is_none() {
            return Err(ModerationError::not_found(Entity::Post, post_id));
        }
        if let Some(parent_id) = submission.parent_comment_id {
            let parent = self
                .store
                .get_comment(parent_id)
                .await?
                .ok_or_else(|| ModerationError::not_found(Entity::Comment, parent_id))?;
            if parent.post_id != post_id {
                return Err(ModerationError::Validation(
                    "Reply must belong to the same post as its parent".to_owned(),
                ));
            }
        }

        let comment = Comment::new(submission, &trust).map_err(|err| {
            warn!("Rejected unverified comment from reserved email");
            err
        })?;
        self.store
            .commit(Batch::new().insert_comment(comment.clone()))
            .await
            .map_err(store_failure)?;
        info!(
            "New comment {} on post {} (approved: {})",
            comment.id, comment.post_id, comment.approved
        );
        Ok(Submitted {
            approved: comment.approved,
            is_team_member: comment.is_team_member,
            comment,
        })
    }

    pub async fn list_approved(&self, post_id: ObjectId) -> Result<Vec<ThreadNode>, ModerationError> {
        let comments = self.store.approved_comments(post_id).await?;
        Ok(thread::assemble(&comments))
    }

    /// Makes a comment visible and counted. Returns false if it already was
    /// both.
    pub async fn approve(&self, comment_id: ObjectId) -> Result<bool, ModerationError> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| ModerationError::not_found(Entity::Comment, comment_id))?;
        if comment.approved && comment.is_counted() {
            return Ok(false);
        }
        let receipt = self
            .store
            .commit(Batch::new().push(Op::ApproveComment {
                id: comment.id,
                post: comment.post_id,
            }))
            .await
            .map_err(store_failure)?;
        info!("Approved comment {}", comment_id);
        Ok(receipt.approved + receipt.counted > 0)
    }

    pub async fn pending(&self, limit: i64, offset: u64) -> Result<Vec<Comment>, ModerationError> {
        Ok(self.store.pending_comments(limit, offset).await?)
    }

    pub async fn is_reserved_email(&self, email: &str) -> Result<bool, ModerationError> {
        Ok(self.identity.is_reserved(email.trim()).await?)
    }
}
