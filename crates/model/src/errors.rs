use bson::oid::ObjectId;
use strum::{AsRefStr, Display};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Entity {
    Post,
    Comment,
    #[strum(serialize = "Deletion request")]
    DeletionRequest,
}

#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("{0}")]
    Validation(String),
    #[error("Too many comments. Please try again later")]
    RateLimited,
    #[error("This email is reserved for verified team members")]
    ReservedIdentityUnverified,
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: ObjectId },
    #[error("Not authorized to delete this comment")]
    Unauthorized,
    #[error("Deletion request already resolved: {0}")]
    AlreadyResolved(ObjectId),
    #[error("Store error: {0}")]
    Store(#[from] eyre::Error),
}

/// Stable, client-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ReasonCode {
    Validation,
    RateLimited,
    ReservedIdentityUnverified,
    NotFound,
    Unauthorized,
    AlreadyResolved,
    StoreFailure,
}

impl ModerationError {
    pub fn not_found(entity: Entity, id: ObjectId) -> ModerationError {
        ModerationError::NotFound { entity, id }
    }

    pub fn code(&self) -> ReasonCode {
        match self {
            ModerationError::Validation(_) => ReasonCode::Validation,
            ModerationError::RateLimited => ReasonCode::RateLimited,
            ModerationError::ReservedIdentityUnverified => ReasonCode::ReservedIdentityUnverified,
            ModerationError::NotFound { .. } => ReasonCode::NotFound,
            ModerationError::Unauthorized => ReasonCode::Unauthorized,
            ModerationError::AlreadyResolved(_) => ReasonCode::AlreadyResolved,
            ModerationError::Store(_) => ReasonCode::StoreFailure,
        }
    }

    /// HTTP status the request layer should answer with.
    pub fn status(&self) -> u16 {
        match self.code() {
            ReasonCode::Validation => 400,
            ReasonCode::RateLimited => 429,
            ReasonCode::ReservedIdentityUnverified => 403,
            ReasonCode::NotFound => 404,
            ReasonCode::Unauthorized => 403,
            ReasonCode::AlreadyResolved => 409,
            ReasonCode::StoreFailure => 500,
        }
    }

    /// Message safe to show to the caller. Store details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ModerationError::Store(_) => "Something went wrong. Please try again".to_owned(),
            ModerationError::NotFound { entity, .. } => format!("{} not found", entity),
            other => other.to_string(),
        }
    }
}
