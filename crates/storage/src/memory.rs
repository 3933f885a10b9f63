use std::collections::HashMap;

use async_trait::async_trait;
use bson::oid::ObjectId;
use eyre::{eyre, Result};
use model::{
    comment::Comment,
    delete_request::{DeletionRequest, RequestStatus},
    identity::{Account, Author, Department, TeamProfile},
    post::Post,
};
use parking_lot::Mutex;

use crate::{
    batch::{Batch, CommitError, Op, Receipt, Recount},
    ModerationStore, TeamDirectory,
};

#[derive(Clone, Default)]
struct State {
    posts: HashMap<ObjectId, Post>,
    comments: HashMap<ObjectId, Comment>,
    requests: HashMap<ObjectId, DeletionRequest>,
    accounts: Vec<Account>,
    authors: HashMap<ObjectId, Author>,
    departments: HashMap<ObjectId, Department>,
}

/// In-process store. A batch is applied to a copy of the state which replaces
/// the live state only if every op succeeded.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_commits: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn add_post(&self, post: Post) {
        self.state.lock().posts.insert(post.id, post);
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().accounts.push(account);
    }

    pub fn add_author(&self, author: Author) {
        self.state.lock().authors.insert(author.id, author);
    }

    pub fn add_department(&self, department: Department) {
        self.state.lock().departments.insert(department.id, department);
    }

    /// Writes a comment without touching any counter, as an out-of-band edit
    /// would.
    pub fn put_comment(&self, comment: Comment) {
        self.state.lock().comments.insert(comment.id, comment);
    }

    pub fn remove_comment(&self, id: ObjectId) -> Option<Comment> {
        self.state.lock().comments.remove(&id)
    }

    pub fn set_comment_count(&self, post: ObjectId, count: i64) {
        if let Some(post) = self.state.lock().posts.get_mut(&post) {
            post.comment_count = count;
        }
    }

    pub fn post(&self, id: ObjectId) -> Option<Post> {
        self.state.lock().posts.get(&id).cloned()
    }

    pub fn comment(&self, id: ObjectId) -> Option<Comment> {
        self.state.lock().comments.get(&id).cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().comments.len()
    }

    pub fn delete_requests(&self) -> Vec<DeletionRequest> {
        self.state.lock().requests.values().cloned().collect()
    }

    /// Makes every following commit fail with the given message until reset
    /// with `None`.
    pub fn fail_commits(&self, message: Option<&str>) {
        *self.fail_commits.lock() = message.map(|m| m.to_owned());
    }
}

impl State {
    fn apply(&mut self, op: Op, receipt: &mut Receipt) -> Result<(), CommitError> {
        match op {
            Op::InsertComment(comment) => {
                if self.comments.contains_key(&comment.id) {
                    return Err(eyre!("Duplicate comment id: {}", comment.id).into());
                }
                self.comments.insert(comment.id, comment);
            }
            Op::IncrementCommentCount { post } => {
                self.post_mut(post)?.comment_count += 1;
                receipt.counted += 1;
            }
            Op::ApproveComment { id, post } => {
                let comment = self
                    .comments
                    .get_mut(&id)
                    .ok_or_else(|| eyre!("Comment not found: {}", id))?;
                if !comment.approved {
                    comment.approved = true;
                    receipt.approved += 1;
                }
                if !comment.auto_approved {
                    comment.auto_approved = true;
                    self.post_mut(post)?.comment_count += 1;
                    receipt.counted += 1;
                }
            }
            Op::DeleteThread { post, ids } => {
                let mut counted = 0;
                for id in ids {
                    let in_post = self
                        .comments
                        .get(&id)
                        .map(|c| c.post_id == post)
                        .unwrap_or(false);
                    if !in_post {
                        continue;
                    }
                    if let Some(comment) = self.comments.remove(&id) {
                        receipt.deleted += 1;
                        if comment.auto_approved {
                            counted += 1;
                        }
                    }
                }
                if counted > 0 {
                    if let Some(post) = self.posts.get_mut(&post) {
                        post.comment_count = (post.comment_count - counted as i64).max(0);
                    }
                }
                receipt.uncounted += counted;
            }
            Op::MarkCounted { post } => {
                for comment in self.comments.values_mut() {
                    if comment.post_id == post && comment.approved && !comment.auto_approved {
                        comment.auto_approved = true;
                        receipt.marked += 1;
                    }
                }
            }
            Op::RecountComments { post } => {
                let count = self
                    .comments
                    .values()
                    .filter(|c| c.post_id == post && c.auto_approved)
                    .count() as i64;
                let post = self.post_mut(post)?;
                receipt.recount = Some(Recount {
                    previous: post.comment_count,
                    count,
                });
                post.comment_count = count;
            }
            Op::InsertDeleteRequest(request) => {
                self.requests.insert(request.id, request);
            }
            Op::ResolveDeleteRequest {
                id,
                status,
                reviewed_at,
            } => match self.requests.get_mut(&id) {
                Some(request) if request.status == RequestStatus::Pending => {
                    request.status = status;
                    request.reviewed_at = Some(reviewed_at);
                }
                _ => {
                    return Err(CommitError::Precondition(format!(
                        "deletion request {} is not pending",
                        id
                    )))
                }
            },
        }
        Ok(())
    }

    fn post_mut(&mut self, id: ObjectId) -> Result<&mut Post, CommitError> {
        self.posts
            .get_mut(&id)
            .ok_or_else(|| eyre!("Post not found: {}", id).into())
    }
}

#[async_trait]
impl ModerationStore for MemoryStore {
    async fn get_post(&self, id: ObjectId) -> Result<Option<Post>> {
        Ok(self.post(id))
    }

    async fn post_ids(&self) -> Result<Vec<ObjectId>> {
        Ok(self.state.lock().posts.keys().copied().collect())
    }

    async fn get_comment(&self, id: ObjectId) -> Result<Option<Comment>> {
        Ok(self.comment(id))
    }

    async fn post_comments(&self, post: ObjectId) -> Result<Vec<Comment>> {
        Ok(self
            .state
            .lock()
            .comments
            .values()
            .filter(|c| c.post_id == post)
            .cloned()
            .collect())
    }

    async fn approved_comments(&self, post: ObjectId) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .state
            .lock()
            .comments
            .values()
            .filter(|c| c.post_id == post && c.approved)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn pending_comments(&self, limit: i64, offset: u64) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .state
            .lock()
            .comments
            .values()
            .filter(|c| !c.approved)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_counted(&self, post: ObjectId) -> Result<u64> {
        Ok(self
            .state
            .lock()
            .comments
            .values()
            .filter(|c| c.post_id == post && c.auto_approved)
            .count() as u64)
    }

    async fn get_delete_request(&self, id: ObjectId) -> Result<Option<DeletionRequest>> {
        Ok(self.state.lock().requests.get(&id).cloned())
    }

    async fn pending_delete_requests(&self) -> Result<Vec<DeletionRequest>> {
        let mut requests: Vec<DeletionRequest> = self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn commit(&self, batch: Batch) -> Result<Receipt, CommitError> {
        if let Some(message) = self.fail_commits.lock().clone() {
            return Err(eyre!(message).into());
        }
        let mut state = self.state.lock();
        let mut draft = state.clone();
        let mut receipt = Receipt::default();
        for op in batch.into_ops() {
            draft.apply(op, &mut receipt)?;
        }
        *state = draft;
        Ok(receipt)
    }
}

#[async_trait]
impl TeamDirectory for MemoryStore {
    async fn find_account(&self, email: &str) -> Result<Option<TeamProfile>> {
        let state = self.state.lock();
        let email = email.trim();
        let Some(account) = state
            .accounts
            .iter()
            .find(|a| a.email.trim().eq_ignore_ascii_case(email))
            .cloned()
        else {
            return Ok(None);
        };
        let author = account.author.and_then(|id| state.authors.get(&id).cloned());
        let department = author
            .as_ref()
            .and_then(|a| a.department)
            .and_then(|id| state.departments.get(&id).cloned());
        Ok(Some(TeamProfile {
            account,
            author,
            department,
        }))
    }
}
