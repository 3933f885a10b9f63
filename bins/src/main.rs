use std::sync::Arc;

use bson::oid::ObjectId;
use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Context, Result};
use log::info;
use model::delete_request::Resolution;
use moderation::{Moderation, ModerationConfig};

/// Administrative tasks for blog comments.
#[derive(Parser)]
#[command(name = "moderation-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute comment counters, for one post or for every post.
    Reconcile { post_id: Option<ObjectId> },
    /// List comments waiting for approval, newest first.
    Pending {
        #[arg(default_value_t = 20)]
        limit: i64,
        #[arg(default_value_t = 0)]
        offset: u64,
    },
    /// List pending deletion requests.
    Requests,
    /// Approve a held comment.
    Approve { comment_id: ObjectId },
    /// Approve or reject a deletion request.
    Resolve {
        request_id: ObjectId,
        #[arg(value_enum)]
        resolution: ResolutionArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolutionArg {
    Approve,
    Reject,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Approve => Resolution::Approve,
            ResolutionArg::Reject => Resolution::Reject,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = env::Env::load()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", env.rust_log());
    }
    pretty_env_logger::init();
    color_eyre::install()?;

    let cli = Cli::parse();

    info!("connecting to mongo");
    let storage = Arc::new(
        storage::Storage::new(env.mongo_url(), env.db_name())
            .await
            .context("Failed to create storage")?,
    );
    let config = ModerationConfig {
        rate_limit: env.rate_limit(),
        rate_window: env.rate_window(),
        max_comment_length: env.max_comment_length(),
        session_verification: env.session_verification(),
        code_verification: env.code_verification(),
    };
    let moderation = Moderation::new(storage.clone(), storage, config);

    match cli.command {
        Command::Reconcile {
            post_id: Some(post),
        } => {
            let count = moderation.reconcile_comment_count(post).await?;
            println!("post {}: {} comments", post, count);
        }
        Command::Reconcile { post_id: None } => {
            let drifts = moderation.reconcile_all_comment_counts().await?;
            for drift in &drifts {
                println!(
                    "post {}: {} -> {} ({} newly counted)",
                    drift.post_id, drift.previous, drift.count, drift.marked
                );
            }
            println!("{} post(s) corrected", drifts.len());
        }
        Command::Pending { limit, offset } => {
            let comments = moderation.pending_comments(limit, offset).await?;
            println!("{}", serde_json::to_string_pretty(&comments)?);
        }
        Command::Requests => {
            let requests = moderation.pending_deletion_requests().await?;
            println!("{}", serde_json::to_string_pretty(&requests)?);
        }
        Command::Approve { comment_id } => {
            if moderation.approve_comment(comment_id).await? {
                println!("comment {} approved", comment_id);
            } else {
                println!("comment {} was already approved", comment_id);
            }
        }
        Command::Resolve {
            request_id,
            resolution,
        } => {
            let status = moderation
                .resolve_deletion_request(request_id, resolution.into())
                .await?;
            println!("request {} {}", request_id, status);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use model::delete_request::Resolution;

    use super::{Cli, Command};

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("moderation-cli").chain(line.split_whitespace()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_commands() {
        assert!(matches!(
            parse("reconcile").unwrap().command,
            Command::Reconcile { post_id: None }
        ));
        assert!(matches!(
            parse("pending 5").unwrap().command,
            Command::Pending {
                limit: 5,
                offset: 0
            }
        ));
        match parse("resolve 65f1c0a1b2c3d4e5f6a7b8c9 reject").unwrap().command {
            Command::Resolve {
                request_id,
                resolution,
            } => {
                assert_eq!(request_id.to_hex(), "65f1c0a1b2c3d4e5f6a7b8c9");
                assert_eq!(Resolution::from(resolution), Resolution::Reject);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(parse("resolve 65f1c0a1b2c3d4e5f6a7b8c9 maybe").is_err());
        assert!(parse("approve not-an-id").is_err());
        assert!(parse("").is_err());
    }
}
