use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::comment::Comment;

pub const DEFAULT_REASON: &str = "No reason provided";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Approve,
    Reject,
}

impl Resolution {
    pub fn status(&self) -> RequestStatus {
        match self {
            Resolution::Approve => RequestStatus::Approved,
            Resolution::Reject => RequestStatus::Rejected,
        }
    }
}

/// A reader's request to remove their own comment, waiting for a moderator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeletionRequest {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub comment_id: ObjectId,
    /// Copy of the comment body taken when the request was filed.
    pub comment_content: String,
    pub requester_email: String,
    pub reason: String,
    pub status: RequestStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "optional_bson_datetime")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl DeletionRequest {
    pub fn new(comment: &Comment, requester_email: &str, reason: Option<String>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_owned());
        DeletionRequest {
            id: ObjectId::new(),
            comment_id: comment.id,
            comment_content: comment.body.clone(),
            requester_email: requester_email.to_owned(),
            reason,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }
}

/// `Option<DateTime<Utc>>` stored as a BSON date, like `created_at`.
mod optional_bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize as _, Deserializer, Serialize as _, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value
            .map(bson::DateTime::from_chrono)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|dt| dt.to_chrono()))
    }
}
