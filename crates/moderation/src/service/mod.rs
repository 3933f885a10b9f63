pub mod comments;
pub mod counts;
pub mod deletion;
pub mod identity;
pub mod rate_limit;

use model::errors::ModerationError;
use storage::batch::CommitError;

/// Store level failure of a batch. Stale preconditions are mapped by the
/// caller that knows what the precondition was about.
pub(crate) fn store_failure(err: CommitError) -> ModerationError {
    match err {
        CommitError::Store(err) => ModerationError::Store(err),
        other => ModerationError::Store(other.into()),
    }
}
