use std::time::Duration;

pub const DEFAULT_RATE_LIMIT: u32 = 3;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_COMMENT_LENGTH: usize = 5000;

#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Comments one email may submit per window.
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub max_comment_length: usize,
    /// Team members prove who they are with a logged-in session.
    pub session_verification: bool,
    /// Team members prove who they are with the code stored on their account.
    pub code_verification: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        ModerationConfig {
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: DEFAULT_RATE_WINDOW,
            max_comment_length: DEFAULT_MAX_COMMENT_LENGTH,
            session_verification: true,
            code_verification: true,
        }
    }
}
