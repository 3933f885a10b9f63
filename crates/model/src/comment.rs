use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors::ModerationError, identity::TrustLabel};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub post_id: ObjectId,
    #[serde(default)]
    pub parent_comment_id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub approved: bool,
    /// Set when the comment has been added to the post's `comment_count`.
    #[serde(default)]
    pub auto_approved: bool,
    #[serde(default)]
    pub is_team_member: bool,
    #[serde(default)]
    pub team_badge: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Builds the document for a submission whose commenter has already been
    /// resolved. Reserved identities never reach this point.
    pub fn new(submission: Submission, trust: &TrustLabel) -> Result<Comment, ModerationError> {
        let decision = Decision::for_label(trust)?;
        Ok(Comment {
            id: ObjectId::new(),
            post_id: submission.post_id,
            parent_comment_id: submission.parent_comment_id,
            name: submission.name,
            email: submission.email,
            body: submission.body,
            approved: decision.approved,
            auto_approved: decision.auto_approved,
            is_team_member: decision.is_team_member,
            team_badge: decision.badge,
            created_at: Utc::now(),
        })
    }

    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    /// Whether this comment currently contributes to `Post::comment_count`.
    pub fn is_counted(&self) -> bool {
        self.auto_approved
    }

    /// Reader-facing fields. The email never leaves the store.
    pub fn public(&self) -> PublicComment<'_> {
        PublicComment {
            id: self.id,
            post_id: self.post_id,
            parent_comment_id: self.parent_comment_id,
            name: &self.name,
            body: &self.body,
            approved: self.approved,
            is_team_member: self.is_team_member,
            team_badge: self.team_badge.as_deref(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PublicComment<'a> {
    pub id: ObjectId,
    pub post_id: ObjectId,
    pub parent_comment_id: Option<ObjectId>,
    pub name: &'a str,
    pub body: &'a str,
    pub approved: bool,
    pub is_team_member: bool,
    pub team_badge: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Raw comment fields as submitted by a reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub post_id: ObjectId,
    pub parent_comment_id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub body: String,
    /// Inline team verification code, only meaningful for reserved emails.
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl Submission {
    pub fn new(post_id: ObjectId, name: &str, email: &str, body: &str) -> Submission {
        Submission {
            post_id,
            parent_comment_id: None,
            name: name.to_owned(),
            email: email.to_owned(),
            body: body.to_owned(),
            verification_code: None,
        }
    }

    pub fn reply_to(mut self, parent: ObjectId) -> Submission {
        self.parent_comment_id = Some(parent);
        self
    }

    pub fn with_code(mut self, code: &str) -> Submission {
        self.verification_code = Some(code.to_owned());
        self
    }

    /// Trims the text fields and rejects empty or oversized input.
    pub fn validate(&mut self, max_body_len: usize) -> Result<(), ModerationError> {
        self.name = self.name.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self.body = self.body.trim().to_owned();

        if self.name.is_empty() || self.email.is_empty() || self.body.is_empty() {
            return Err(ModerationError::Validation("All fields are required".to_owned()));
        }
        if !looks_like_email(&self.email) {
            return Err(ModerationError::Validation("Invalid email address".to_owned()));
        }
        if self.body.chars().count() > max_body_len {
            return Err(ModerationError::Validation(format!(
                "Comment must be at most {} characters",
                max_body_len
            )));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Outcome of the moderation decision table for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub approved: bool,
    pub auto_approved: bool,
    pub is_team_member: bool,
    pub badge: Option<String>,
}

impl Decision {
    pub fn for_label(trust: &TrustLabel) -> Result<Decision, ModerationError> {
        match trust {
            TrustLabel::TeamVerified { badge, .. } => Ok(Decision {
                approved: true,
                auto_approved: true,
                is_team_member: true,
                badge: Some(badge.clone()),
            }),
            TrustLabel::TeamReserved => Err(ModerationError::ReservedIdentityUnverified),
            TrustLabel::Anonymous => Ok(Decision {
                approved: false,
                auto_approved: false,
                is_team_member: false,
                badge: None,
            }),
        }
    }
}
