use std::{env::var, str::FromStr, sync::Arc, time::Duration};

use dotenv::dotenv;
use eyre::{eyre, Context, Error};
use log::info;

const DEFAULT_DB: &str = "comments_db";
const DEFAULT_RUST_LOG: &str = "info";

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    mongo_url: String,
    rust_log: String,
    db_name: String,
    rate_limit: u32,
    rate_window: Duration,
    session_verification: bool,
    code_verification: bool,
    max_comment_length: usize,
}

impl Env {
    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    pub fn db_name(&self) -> &str {
        &self.0.db_name
    }

    pub fn rate_limit(&self) -> u32 {
        self.0.rate_limit
    }

    pub fn rate_window(&self) -> Duration {
        self.0.rate_window
    }

    pub fn session_verification(&self) -> bool {
        self.0.session_verification
    }

    pub fn code_verification(&self) -> bool {
        self.0.code_verification
    }

    pub fn max_comment_length(&self) -> usize {
        self.0.max_comment_length
    }

    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            info!("No .env file loaded: {}", err);
        }

        Ok(Env(Arc::new(EnvInner {
            mongo_url: var("MONGO_URL").context("MONGO_URL is not set")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.to_owned()),
            db_name: var("COMMENTS_DB").unwrap_or_else(|_| DEFAULT_DB.to_owned()),
            rate_limit: parse("COMMENT_RATE_LIMIT", var("COMMENT_RATE_LIMIT").ok(), 3)?,
            rate_window: Duration::from_secs(parse(
                "COMMENT_RATE_WINDOW_SECS",
                var("COMMENT_RATE_WINDOW_SECS").ok(),
                3600,
            )?),
            session_verification: flag(
                "COMMENT_SESSION_VERIFICATION",
                var("COMMENT_SESSION_VERIFICATION").ok(),
            )?,
            code_verification: flag(
                "COMMENT_CODE_VERIFICATION",
                var("COMMENT_CODE_VERIFICATION").ok(),
            )?,
            max_comment_length: parse(
                "COMMENT_MAX_LENGTH",
                var("COMMENT_MAX_LENGTH").ok(),
                5000,
            )?,
        })))
    }
}

fn parse<T>(name: &str, value: Option<String>, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .with_context(|| format!("{} is not valid: {}", name, value)),
    }
}

/// Boolean switch, on unless set to a false-like value.
fn flag(name: &str, value: Option<String>) -> Result<bool, Error> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => Err(eyre!("{} is not a boolean: {}", name, other)),
    }
}
