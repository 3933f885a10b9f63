use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use model::{comment::Comment, delete_request::DeletionRequest, delete_request::RequestStatus};
use thiserror::Error;

/// A single write inside a [`Batch`].
#[derive(Debug, Clone)]
pub enum Op {
    InsertComment(Comment),
    /// `$inc` on the post counter; a missing counter starts from zero.
    IncrementCommentCount { post: ObjectId },
    /// Makes a comment visible and counts it. A comment that is already
    /// counted is not counted twice.
    ApproveComment { id: ObjectId, post: ObjectId },
    /// Deletes the listed comments of `post`. The counter drops by the number
    /// of counted comments that still existed, never below zero. Ids that are
    /// already gone are skipped.
    DeleteThread { post: ObjectId, ids: Vec<ObjectId> },
    /// Marks every visible comment of `post` that is not counted yet as
    /// counted. Does not touch the counter; follow with a recount.
    MarkCounted { post: ObjectId },
    /// Recomputes the counter from the counted comments and overwrites it.
    RecountComments { post: ObjectId },
    InsertDeleteRequest(DeletionRequest),
    /// Moves a request out of `pending`. Fails the whole batch if the request
    /// is not pending anymore.
    ResolveDeleteRequest {
        id: ObjectId,
        status: RequestStatus,
        reviewed_at: DateTime<Utc>,
    },
}

/// Writes committed all together or not at all.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    pub fn new() -> Batch {
        Batch::default()
    }

    pub fn push(mut self, op: Op) -> Batch {
        self.ops.push(op);
        self
    }

    pub fn insert_comment(self, comment: Comment) -> Batch {
        let post = comment.post_id;
        let counted = comment.is_counted();
        let batch = self.push(Op::InsertComment(comment));
        if counted {
            batch.push(Op::IncrementCommentCount { post })
        } else {
            batch
        }
    }

    pub fn delete_thread(self, post: ObjectId, ids: Vec<ObjectId>) -> Batch {
        self.push(Op::DeleteThread { post, ids })
    }

    /// Counts legacy visible comments, then recomputes the counter.
    pub fn backfill_and_recount(self, post: ObjectId) -> Batch {
        self.push(Op::MarkCounted { post }).recount(post)
    }

    pub fn recount(self, post: ObjectId) -> Batch {
        self.push(Op::RecountComments { post })
    }

    pub fn resolve_request(self, id: ObjectId, status: RequestStatus) -> Batch {
        self.push(Op::ResolveDeleteRequest {
            id,
            status,
            reviewed_at: Utc::now(),
        })
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// What a committed batch actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Receipt {
    pub deleted: u64,
    /// Comments made visible.
    pub approved: u64,
    /// Counted comments removed from post counters.
    pub uncounted: u64,
    /// Comments newly added to post counters.
    pub counted: u64,
    /// Visible comments marked as counted by a backfill.
    pub marked: u64,
    pub recount: Option<Recount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recount {
    pub previous: i64,
    pub count: i64,
}

impl Recount {
    pub fn drifted(&self) -> bool {
        self.previous != self.count
    }
}

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Batch precondition failed: {0}")]
    Precondition(String),
    #[error("Mongo error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error(transparent)]
    Store(#[from] eyre::Error),
}

impl CommitError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, CommitError::Precondition(_))
    }
}
