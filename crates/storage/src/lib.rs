pub mod batch;
pub mod comments;
pub mod delete_requests;
pub mod memory;
pub mod posts;
pub mod session;
pub mod team;

use async_trait::async_trait;
use batch::{Batch, CommitError, Op, Receipt, Recount};
use bson::oid::ObjectId;
use comments::CommentStore;
use delete_requests::DeleteRequestStore;
use eyre::{eyre, Result};
use log::info;
use model::{
    comment::Comment, delete_request::DeletionRequest, identity::TeamProfile, post::Post,
};
use posts::PostStore;
use session::{Db, Session};
use team::TeamStore;
use tx_macro::tx;

pub use memory::MemoryStore;

pub const DB_NAME: &str = "comments_db";

/// Document store operations the moderation core relies on.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    async fn get_post(&self, id: ObjectId) -> Result<Option<Post>>;
    async fn post_ids(&self) -> Result<Vec<ObjectId>>;

    async fn get_comment(&self, id: ObjectId) -> Result<Option<Comment>>;
    /// Every comment of the post, approved or not.
    async fn post_comments(&self, post: ObjectId) -> Result<Vec<Comment>>;
    async fn approved_comments(&self, post: ObjectId) -> Result<Vec<Comment>>;
    /// Comments waiting for a moderator, newest first.
    async fn pending_comments(&self, limit: i64, offset: u64) -> Result<Vec<Comment>>;
    /// Number of comments of the post with `auto_approved` set.
    async fn count_counted(&self, post: ObjectId) -> Result<u64>;

    async fn get_delete_request(&self, id: ObjectId) -> Result<Option<DeletionRequest>>;
    async fn pending_delete_requests(&self) -> Result<Vec<DeletionRequest>>;

    /// Applies every op of the batch atomically.
    async fn commit(&self, batch: Batch) -> Result<Receipt, CommitError>;
}

/// Lookup of team accounts by email. Emails match case-insensitively.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn find_account(&self, email: &str) -> Result<Option<TeamProfile>>;
}

/// MongoDB backed store.
pub struct Storage {
    pub db: Db,
    pub comments: CommentStore,
    pub posts: PostStore,
    pub delete_requests: DeleteRequestStore,
    pub team: TeamStore,
}

impl Storage {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let db = Db::new(uri, db_name).await?;
        let comments = CommentStore::new(&db).await?;
        let posts = PostStore::new(&db);
        let delete_requests = DeleteRequestStore::new(&db).await?;
        let team = TeamStore::new(&db).await?;
        Ok(Storage {
            db,
            comments,
            posts,
            delete_requests,
            team,
        })
    }

    #[tx]
    async fn apply(&self, session: &mut Session, batch: Batch) -> Result<Receipt, CommitError> {
        let mut receipt = Receipt::default();
        for op in batch.into_ops() {
            match op {
                Op::InsertComment(comment) => {
                    self.comments.insert(session, &comment).await?;
                }
                Op::IncrementCommentCount { post } => {
                    self.posts.inc_comment_count(session, post, 1).await?;
                    receipt.counted += 1;
                }
                Op::ApproveComment { id, post } => {
                    let comment = self
                        .comments
                        .get(session, id)
                        .await?
                        .ok_or_else(|| eyre!("Comment not found: {}", id))?;
                    if comment.approved && comment.auto_approved {
                        continue;
                    }
                    self.comments.approve(session, id).await?;
                    if !comment.approved {
                        receipt.approved += 1;
                    }
                    if !comment.auto_approved {
                        self.posts.inc_comment_count(session, post, 1).await?;
                        receipt.counted += 1;
                    }
                }
                Op::DeleteThread { post, ids } => {
                    let counted = self
                        .comments
                        .count_counted(session, post, Some(ids.as_slice()))
                        .await?;
                    let deleted = self.comments.delete_many(session, post, &ids).await?;
                    if counted > 0 {
                        self.posts
                            .dec_comment_count(session, post, counted as i64)
                            .await?;
                    }
                    receipt.deleted += deleted;
                    receipt.uncounted += counted;
                }
                Op::MarkCounted { post } => {
                    receipt.marked += self.comments.mark_counted(session, post).await?;
                }
                Op::RecountComments { post } => {
                    let previous = self
                        .posts
                        .get(session, post)
                        .await?
                        .ok_or_else(|| eyre!("Post not found: {}", post))?
                        .comment_count;
                    let count = self.comments.count_counted(session, post, None).await? as i64;
                    if count != previous {
                        self.posts.set_comment_count(session, post, count).await?;
                    }
                    receipt.recount = Some(Recount { previous, count });
                }
                Op::InsertDeleteRequest(request) => {
                    self.delete_requests.insert(session, &request).await?;
                }
                Op::ResolveDeleteRequest {
                    id,
                    status,
                    reviewed_at,
                } => {
                    if !self
                        .delete_requests
                        .resolve(session, id, status, reviewed_at)
                        .await?
                    {
                        return Err(CommitError::Precondition(format!(
                            "deletion request {} is not pending",
                            id
                        )));
                    }
                }
            }
        }
        Ok(receipt)
    }
}

#[async_trait]
impl ModerationStore for Storage {
    async fn get_post(&self, id: ObjectId) -> Result<Option<Post>> {
        let mut session = self.db.start_session().await?;
        self.posts.get(&mut session, id).await
    }

    async fn post_ids(&self) -> Result<Vec<ObjectId>> {
        let mut session = self.db.start_session().await?;
        self.posts.ids(&mut session).await
    }

    async fn get_comment(&self, id: ObjectId) -> Result<Option<Comment>> {
        let mut session = self.db.start_session().await?;
        self.comments.get(&mut session, id).await
    }

    async fn post_comments(&self, post: ObjectId) -> Result<Vec<Comment>> {
        let mut session = self.db.start_session().await?;
        self.comments.by_post(&mut session, post).await
    }

    async fn approved_comments(&self, post: ObjectId) -> Result<Vec<Comment>> {
        let mut session = self.db.start_session().await?;
        self.comments.approved_by_post(&mut session, post).await
    }

    async fn pending_comments(&self, limit: i64, offset: u64) -> Result<Vec<Comment>> {
        let mut session = self.db.start_session().await?;
        self.comments.pending(&mut session, limit, offset).await
    }

    async fn count_counted(&self, post: ObjectId) -> Result<u64> {
        let mut session = self.db.start_session().await?;
        self.comments.count_counted(&mut session, post, None).await
    }

    async fn get_delete_request(&self, id: ObjectId) -> Result<Option<DeletionRequest>> {
        let mut session = self.db.start_session().await?;
        self.delete_requests.get(&mut session, id).await
    }

    async fn pending_delete_requests(&self) -> Result<Vec<DeletionRequest>> {
        let mut session = self.db.start_session().await?;
        self.delete_requests.pending(&mut session).await
    }

    async fn commit(&self, batch: Batch) -> Result<Receipt, CommitError> {
        if batch.is_empty() {
            return Ok(Receipt::default());
        }
        let ops = batch.ops().len();
        let mut session = self.db.start_session().await?;
        let receipt = self.apply(&mut session, batch).await?;
        info!("Committed batch of {} ops: {:?}", ops, receipt);
        Ok(receipt)
    }
}

#[async_trait]
impl TeamDirectory for Storage {
    async fn find_account(&self, email: &str) -> Result<Option<TeamProfile>> {
        let mut session = self.db.start_session().await?;
        self.team.find_by_email(&mut session, email).await
    }
}
