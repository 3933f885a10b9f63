use std::sync::Arc;

use bson::oid::ObjectId;
use log::{error, warn};
use model::{
    comment::{Comment, Submission},
    delete_request::{DeletionRequest, RequestStatus, Resolution},
    errors::ModerationError,
    identity::AuthSession,
    thread::ThreadNode,
};
use service::{
    comments::{Comments, Submitted},
    counts::{Counts, Drift},
    deletion::{DeleteOutcome, Deletion},
    identity::IdentityResolver,
    rate_limit::{FixedWindowLimiter, RateLimiter},
};
use storage::{ModerationStore, TeamDirectory};

pub mod config;
pub mod service;

pub use config::ModerationConfig;

/// Comment moderation entry point. Cheap to clone; every clone shares the
/// same store and rate limiter.
#[derive(Clone)]
pub struct Moderation {
    pub comments: Comments,
    pub counts: Counts,
    pub deletion: Deletion,
}

impl Moderation {
    pub fn new(
        store: Arc<dyn ModerationStore>,
        directory: Arc<dyn TeamDirectory>,
        config: ModerationConfig,
    ) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::new(config.rate_limit, config.rate_window));
        Moderation::with_rate_limiter(store, directory, config, limiter)
    }

    pub fn with_rate_limiter(
        store: Arc<dyn ModerationStore>,
        directory: Arc<dyn TeamDirectory>,
        config: ModerationConfig,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let identity = IdentityResolver::new(directory.clone(), &config);
        let comments = Comments::new(
            store.clone(),
            identity,
            limiter,
            config.max_comment_length,
        );
        let counts = Counts::new(store.clone());
        let deletion = Deletion::new(store, directory);
        Moderation {
            comments,
            counts,
            deletion,
        }
    }

    pub async fn submit_comment(
        &self,
        submission: Submission,
        session: Option<&AuthSession>,
    ) -> Result<Submitted, ModerationError> {
        report(
            "submit comment",
            self.comments.submit(submission, session).await,
        )
    }

    pub async fn list_approved_comments(
        &self,
        post_id: ObjectId,
    ) -> Result<Vec<ThreadNode>, ModerationError> {
        report("list comments", self.comments.list_approved(post_id).await)
    }

    pub async fn delete_comment(
        &self,
        comment_id: ObjectId,
        requester_email: &str,
        session: Option<&AuthSession>,
        reason: Option<String>,
    ) -> Result<DeleteOutcome, ModerationError> {
        report(
            "delete comment",
            self.deletion
                .delete(comment_id, requester_email, session, reason)
                .await,
        )
    }

    pub async fn resolve_deletion_request(
        &self,
        request_id: ObjectId,
        resolution: Resolution,
    ) -> Result<RequestStatus, ModerationError> {
        report(
            "resolve deletion request",
            self.deletion
                .resolve(request_id, resolution)
                .await
                .map(|r| r.status),
        )
    }

    pub async fn reconcile_comment_count(&self, post_id: ObjectId) -> Result<i64, ModerationError> {
        report("reconcile comment count", self.counts.reconcile(post_id).await)
    }

    pub async fn reconcile_all_comment_counts(&self) -> Result<Vec<Drift>, ModerationError> {
        report("reconcile comment counts", self.counts.reconcile_all().await)
    }

    pub async fn approve_comment(&self, comment_id: ObjectId) -> Result<bool, ModerationError> {
        report("approve comment", self.comments.approve(comment_id).await)
    }

    pub async fn pending_comments(
        &self,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Comment>, ModerationError> {
        report("load pending comments", self.comments.pending(limit, offset).await)
    }

    pub async fn pending_deletion_requests(&self) -> Result<Vec<DeletionRequest>, ModerationError> {
        report("load deletion requests", self.deletion.pending().await)
    }

    pub async fn is_reserved_email(&self, email: &str) -> Result<bool, ModerationError> {
        report("check email", self.comments.is_reserved_email(email).await)
    }
}

fn report<T>(action: &str, result: Result<T, ModerationError>) -> Result<T, ModerationError> {
    if let Err(err) = &result {
        match err {
            ModerationError::Store(cause) => error!("Failed to {}: {:#}", action, cause),
            other => warn!("Failed to {}: {}", action, other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bson::oid::ObjectId;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use eyre::Result;
    use model::{
        comment::{Comment, Submission},
        delete_request::{DeletionRequest, RequestStatus, Resolution},
        errors::{ModerationError, ReasonCode},
        identity::{Account, AccountRole, AuthSession, Author, Department, TrustLabel},
        post::Post,
    };
    use storage::{
        batch::{Batch, CommitError, Receipt},
        MemoryStore, ModerationStore,
    };

    use super::{Moderation, ModerationConfig};

    const EDITOR: &str = "editor@uni.edu";
    const VISITOR: &str = "reader@gmail.com";

    struct Site {
        store: Arc<MemoryStore>,
        moderation: Moderation,
        post: ObjectId,
    }

    impl Site {
        fn new() -> Site {
            Site::with_config(ModerationConfig::default())
        }

        fn with_config(config: ModerationConfig) -> Site {
            let store = Arc::new(MemoryStore::new());
            let post = Post::new("Campus news");
            let post_id = post.id;
            store.add_post(post);

            let department = Department {
                id: ObjectId::new(),
                name: "Technology".to_owned(),
                full_name: "Department of Technology".to_owned(),
            };
            let author = Author {
                id: ObjectId::new(),
                name: "Editor".to_owned(),
                role: Some("Editor".to_owned()),
                department: Some(department.id),
            };
            let mut editor = Account::new(EDITOR, AccountRole::Contributor);
            editor.author = Some(author.id);
            editor.verification_code = Some("tech-2024".to_owned());
            store.add_department(department);
            store.add_author(author);
            store.add_account(editor);
            store.add_account(Account::new("admin@uni.edu", AccountRole::Admin));

            let moderation = Moderation::new(store.clone(), store.clone(), config);
            Site {
                store,
                moderation,
                post: post_id,
            }
        }

        fn count(&self) -> i64 {
            self.store
                .post(self.post)
                .map(|p| p.comment_count)
                .unwrap_or_default()
        }

        fn editor_session() -> AuthSession {
            AuthSession::new(EDITOR, AccountRole::Contributor)
        }

        async fn editor_comment(&self, parent: Option<ObjectId>) -> ObjectId {
            let mut submission = Submission::new(self.post, "Editor", EDITOR, "From the desk");
            submission.parent_comment_id = parent;
            self.moderation
                .submit_comment(submission, Some(&Site::editor_session()))
                .await
                .unwrap()
                .comment
                .id
        }

        async fn visitor_comment(&self, email: &str) -> ObjectId {
            self.moderation
                .submit_comment(Submission::new(self.post, "Reader", email, "Nice post"), None)
                .await
                .unwrap()
                .comment
                .id
        }
    }

    #[tokio::test]
    async fn test_anonymous_comment_is_held() {
        let site = Site::new();
        let submitted = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Reader", VISITOR, "Nice post"),
                None,
            )
            .await
            .unwrap();
        assert!(!submitted.approved);
        assert!(!submitted.is_team_member);
        assert!(!submitted.comment.auto_approved);
        assert_eq!(site.count(), 0);
        assert!(site
            .moderation
            .list_approved_comments(site.post)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_team_member_comment_is_published_and_counted() {
        let site = Site::new();
        let submitted = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Editor", EDITOR, "From the desk"),
                Some(&Site::editor_session()),
            )
            .await
            .unwrap();
        assert!(submitted.approved);
        assert!(submitted.is_team_member);
        assert!(submitted.comment.auto_approved);
        assert_eq!(
            submitted.comment.team_badge.as_deref(),
            Some("Technology Department")
        );
        assert_eq!(site.count(), 1);

        let tree = site.moderation.list_approved_comments(site.post).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].team_badge.as_deref(), Some("Technology Department"));
    }

    #[tokio::test]
    async fn test_owner_deletes_whole_thread() {
        let site = Site::new();
        let root = site.editor_comment(None).await;
        let reply = site.editor_comment(Some(root)).await;
        site.editor_comment(Some(reply)).await;
        assert_eq!(site.count(), 3);

        let outcome = site
            .moderation
            .delete_comment(root, EDITOR, Some(&Site::editor_session()), None)
            .await
            .unwrap();
        assert!(outcome.instantly_deleted);
        assert_eq!(outcome.deleted_count, Some(3));
        assert_eq!(outcome.request_id, None);
        assert_eq!(site.store.comment_count(), 0);
        assert_eq!(site.count(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_delete_is_queued() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;

        let outcome = site
            .moderation
            .delete_comment(comment, VISITOR, None, Some("Typo".to_owned()))
            .await
            .unwrap();
        assert!(!outcome.instantly_deleted);
        assert_eq!(outcome.deleted_count, None);
        assert!(outcome.request_id.is_some());
        assert!(site.store.comment(comment).is_some());
        assert_eq!(site.count(), 0);

        let pending = site.moderation.pending_deletion_requests().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, RequestStatus::Pending);
        assert_eq!(pending[0].comment_id, comment);
        assert_eq!(pending[0].comment_content, "Nice post");
        assert_eq!(pending[0].reason, "Typo");
    }

    #[tokio::test]
    async fn test_email_mismatch_is_unauthorized() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;

        // Stored emails are compared exactly.
        let err = site
            .moderation
            .delete_comment(comment, "Reader@gmail.com", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::Unauthorized));
        assert!(site.store.delete_requests().is_empty());
        assert!(site.store.comment(comment).is_some());
    }

    #[tokio::test]
    async fn test_session_without_profile_is_queued() {
        let site = Site::new();
        site.store
            .add_account(Account::new(VISITOR, AccountRole::Contributor));
        let comment = site.visitor_comment(VISITOR).await;
        let session = AuthSession::new(VISITOR, AccountRole::Contributor);

        let outcome = site
            .moderation
            .delete_comment(comment, VISITOR, Some(&session), None)
            .await
            .unwrap();
        assert!(!outcome.instantly_deleted);
    }

    #[tokio::test]
    async fn test_admin_deletes_instantly() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;
        let admin = AuthSession::new("admin@uni.edu", AccountRole::Admin);

        let outcome = site
            .moderation
            .delete_comment(comment, VISITOR, Some(&admin), None)
            .await
            .unwrap();
        assert!(outcome.instantly_deleted);
        assert_eq!(outcome.deleted_count, Some(1));
        assert_eq!(site.count(), 0);
    }

    #[tokio::test]
    async fn test_approved_request_deletes_thread_once() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;
        assert!(site.moderation.approve_comment(comment).await.unwrap());
        assert_eq!(site.count(), 1);
        let reply = site.editor_comment(Some(comment)).await;
        assert_eq!(site.count(), 2);

        let request = site
            .moderation
            .delete_comment(comment, VISITOR, None, None)
            .await
            .unwrap()
            .request_id
            .unwrap();
        let status = site
            .moderation
            .resolve_deletion_request(request, Resolution::Approve)
            .await
            .unwrap();
        assert_eq!(status, RequestStatus::Approved);
        assert!(site.store.comment(comment).is_none());
        assert!(site.store.comment(reply).is_none());
        assert_eq!(site.count(), 0);

        let err = site
            .moderation
            .resolve_deletion_request(request, Resolution::Reject)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::AlreadyResolved(id) if id == request));
        assert_eq!(err.code(), ReasonCode::AlreadyResolved);
    }

    #[tokio::test]
    async fn test_rejected_request_keeps_comment() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;
        let request = site
            .moderation
            .delete_comment(comment, VISITOR, None, None)
            .await
            .unwrap()
            .request_id
            .unwrap();

        let status = site
            .moderation
            .resolve_deletion_request(request, Resolution::Reject)
            .await
            .unwrap();
        assert_eq!(status, RequestStatus::Rejected);
        assert!(site.store.comment(comment).is_some());
        assert!(site
            .moderation
            .pending_deletion_requests()
            .await
            .unwrap()
            .is_empty());

        let err = site
            .moderation
            .resolve_deletion_request(request, Resolution::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::AlreadyResolved(_)));
        assert!(site.store.comment(comment).is_some());
    }

    #[tokio::test]
    async fn test_request_for_removed_comment() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;
        let request = site
            .moderation
            .delete_comment(comment, VISITOR, None, None)
            .await
            .unwrap()
            .request_id
            .unwrap();
        site.store.remove_comment(comment);

        let resolved = site
            .moderation
            .deletion
            .resolve(request, Resolution::Approve)
            .await
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Approved);
        assert_eq!(resolved.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let site = Site::new();
        let err = site
            .moderation
            .resolve_deletion_request(ObjectId::new(), Resolution::Approve)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::NotFound);

        let err = site
            .moderation
            .delete_comment(ObjectId::new(), VISITOR, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::NotFound);

        let err = site
            .moderation
            .submit_comment(
                Submission::new(ObjectId::new(), "Reader", VISITOR, "Hi"),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::NotFound);
    }

    #[tokio::test]
    async fn test_reply_must_stay_in_post() {
        let site = Site::new();
        let other = Post::new("Other");
        let other_id = other.id;
        site.store.add_post(other);
        let parent = site.editor_comment(None).await;

        let err = site
            .moderation
            .submit_comment(
                Submission::new(other_id, "Editor", EDITOR, "Wrong place").reply_to(parent),
                Some(&Site::editor_session()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::Validation);
        assert_eq!(site.count(), 1);
    }

    #[tokio::test]
    async fn test_reserved_email_needs_code() {
        let site = Site::new();
        assert!(site.moderation.is_reserved_email(" EDITOR@uni.edu").await.unwrap());
        assert!(!site.moderation.is_reserved_email(VISITOR).await.unwrap());

        let err = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Impostor", EDITOR, "Hello"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::ReservedIdentityUnverified));
        assert_eq!(err.status(), 403);
        assert_eq!(site.store.comment_count(), 0);

        let submitted = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Editor", EDITOR, "Hello").with_code("tech-2024"),
                None,
            )
            .await
            .unwrap();
        assert!(submitted.approved);
        assert_eq!(site.count(), 1);
    }

    #[tokio::test]
    async fn test_fourth_comment_is_rate_limited() {
        let site = Site::new();
        for _ in 0..3 {
            site.visitor_comment(VISITOR).await;
        }
        let err = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Reader", "READER@gmail.com", "Again"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::RateLimited));
        assert_eq!(err.status(), 429);
        assert_eq!(site.store.comment_count(), 3);

        // Other commenters have their own quota.
        site.visitor_comment("other@gmail.com").await;
    }

    #[tokio::test]
    async fn test_invalid_submission_is_not_throttled() {
        let config = ModerationConfig {
            rate_limit: 1,
            ..ModerationConfig::default()
        };
        let site = Site::with_config(config);
        let err = site
            .moderation
            .submit_comment(Submission::new(site.post, "Reader", VISITOR, "   "), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::Validation);
        site.visitor_comment(VISITOR).await;
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drift() {
        let site = Site::new();
        site.editor_comment(None).await;
        site.editor_comment(None).await;
        site.visitor_comment(VISITOR).await;
        site.store.set_comment_count(site.post, 17);

        assert_eq!(
            site.moderation.reconcile_comment_count(site.post).await.unwrap(),
            2
        );
        assert_eq!(site.count(), 2);

        let drifts = site.moderation.reconcile_all_comment_counts().await.unwrap();
        assert!(drifts.is_empty());

        site.store.set_comment_count(site.post, -4);
        let drifts = site.moderation.reconcile_all_comment_counts().await.unwrap();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].previous, -4);
        assert_eq!(drifts[0].count, 2);
    }

    #[tokio::test]
    async fn test_counter_matches_after_mixed_operations() {
        let site = Site::new();
        let held = site.visitor_comment(VISITOR).await;
        let root = site.editor_comment(None).await;
        site.editor_comment(Some(root)).await;
        assert!(site.moderation.approve_comment(held).await.unwrap());
        assert!(!site.moderation.approve_comment(held).await.unwrap());
        site.moderation
            .delete_comment(root, EDITOR, Some(&Site::editor_session()), None)
            .await
            .unwrap();

        assert_eq!(site.count(), 1);
        assert_eq!(
            site.moderation.reconcile_comment_count(site.post).await.unwrap(),
            1
        );
        assert!(site.moderation.pending_comments(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_generic() {
        let site = Site::new();
        site.store.fail_commits(Some("write concern timeout on shard-2"));
        let err = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Reader", VISITOR, "Hello"),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::StoreFailure);
        assert_eq!(err.status(), 500);
        assert!(!err.public_message().contains("shard-2"));
        assert_eq!(site.store.comment_count(), 0);
    }

    #[tokio::test]
    async fn test_resync_counts_legacy_visible_comments() {
        let site = Site::new();
        let mut legacy = Comment::new(
            Submission::new(site.post, "Reader", VISITOR, "From before counters"),
            &TrustLabel::Anonymous,
        )
        .unwrap();
        legacy.approved = true;
        site.store.put_comment(legacy.clone());
        site.editor_comment(None).await;
        assert_eq!(site.count(), 1);

        // A single-post reconcile only counts what is already marked.
        assert_eq!(
            site.moderation.reconcile_comment_count(site.post).await.unwrap(),
            1
        );

        let drifts = site.moderation.reconcile_all_comment_counts().await.unwrap();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].previous, 1);
        assert_eq!(drifts[0].count, 2);
        assert_eq!(drifts[0].marked, 1);
        assert!(site.store.comment(legacy.id).unwrap().auto_approved);
        assert_eq!(site.count(), 2);

        // Now counted, so deleting it lowers the counter.
        let admin = AuthSession::new("admin@uni.edu", AccountRole::Admin);
        site.moderation
            .delete_comment(legacy.id, VISITOR, Some(&admin), None)
            .await
            .unwrap();
        assert_eq!(site.count(), 1);
        assert!(site
            .moderation
            .reconcile_all_comment_counts()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_approve_shows_hidden_counted_comment() {
        let site = Site::new();
        let id = site.editor_comment(None).await;
        let mut hidden = site.store.comment(id).unwrap();
        hidden.approved = false;
        site.store.put_comment(hidden);

        assert!(site.moderation.approve_comment(id).await.unwrap());
        let shown = site.store.comment(id).unwrap();
        assert!(shown.approved);
        assert!(shown.auto_approved);
        // Already counted, so the counter does not move.
        assert_eq!(site.count(), 1);
        assert_eq!(
            site.moderation.list_approved_comments(site.post).await.unwrap().len(),
            1
        );

        assert!(!site.moderation.approve_comment(id).await.unwrap());
        assert_eq!(site.count(), 1);
    }

    /// Resolves `request` behind the caller's back the first time a comment
    /// is read, as a second moderator would.
    struct RacingStore {
        inner: Arc<MemoryStore>,
        request: ObjectId,
        raced: AtomicBool,
    }

    #[async_trait]
    impl ModerationStore for RacingStore {
        async fn get_post(&self, id: ObjectId) -> Result<Option<Post>> {
            self.inner.get_post(id).await
        }

        async fn post_ids(&self) -> Result<Vec<ObjectId>> {
            self.inner.post_ids().await
        }

        async fn get_comment(&self, id: ObjectId) -> Result<Option<Comment>> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner
                    .commit(Batch::new().resolve_request(self.request, RequestStatus::Rejected))
                    .await?;
            }
            self.inner.get_comment(id).await
        }

        async fn post_comments(&self, post: ObjectId) -> Result<Vec<Comment>> {
            self.inner.post_comments(post).await
        }

        async fn approved_comments(&self, post: ObjectId) -> Result<Vec<Comment>> {
            self.inner.approved_comments(post).await
        }

        async fn pending_comments(&self, limit: i64, offset: u64) -> Result<Vec<Comment>> {
            self.inner.pending_comments(limit, offset).await
        }

        async fn count_counted(&self, post: ObjectId) -> Result<u64> {
            self.inner.count_counted(post).await
        }

        async fn get_delete_request(&self, id: ObjectId) -> Result<Option<DeletionRequest>> {
            self.inner.get_delete_request(id).await
        }

        async fn pending_delete_requests(&self) -> Result<Vec<DeletionRequest>> {
            self.inner.pending_delete_requests().await
        }

        async fn commit(&self, batch: Batch) -> Result<Receipt, CommitError> {
            self.inner.commit(batch).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_resolution_loses() {
        let site = Site::new();
        let comment = site.visitor_comment(VISITOR).await;
        assert!(site.moderation.approve_comment(comment).await.unwrap());
        let request = site
            .moderation
            .delete_comment(comment, VISITOR, None, None)
            .await
            .unwrap()
            .request_id
            .unwrap();

        let racing = Arc::new(RacingStore {
            inner: site.store.clone(),
            request,
            raced: AtomicBool::new(false),
        });
        let moderation = Moderation::new(racing, site.store.clone(), ModerationConfig::default());
        let err = moderation
            .resolve_deletion_request(request, Resolution::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::AlreadyResolved(id) if id == request));

        // The other moderator's rejection stands and nothing was deleted.
        let stored = site.store.get_delete_request(request).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);
        assert!(site.store.comment(comment).is_some());
        assert_eq!(site.count(), 1);
    }

    #[tokio::test]
    async fn test_submitted_json_hides_email() {
        let site = Site::new();
        let submitted = site
            .moderation
            .submit_comment(
                Submission::new(site.post, "Reader", VISITOR, "Nice post"),
                None,
            )
            .await
            .unwrap();
        let json = serde_json::to_value(&submitted).unwrap();
        assert_eq!(json["approved"], false);
        assert_eq!(json["comment"]["name"], "Reader");
        assert!(json["comment"].get("email").is_none());
        assert!(!json.to_string().contains(VISITOR));
    }
}
