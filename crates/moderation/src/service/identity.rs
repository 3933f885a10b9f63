use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use log::info;
use model::identity::{AuthSession, TrustLabel, VerifiedBy};
use storage::TeamDirectory;

use crate::config::ModerationConfig;

/// What a commenter presents about themselves.
#[derive(Debug, Clone, Copy)]
pub struct Claim<'a> {
    pub email: &'a str,
    pub session: Option<&'a AuthSession>,
    pub code: Option<&'a str>,
}

impl Claim<'_> {
    fn session_owns_email(&self) -> bool {
        self.session.map(|s| s.matches(self.email)).unwrap_or(false)
    }
}

/// One way of telling team members apart from visitors.
#[async_trait]
pub trait Verification: Send + Sync {
    /// `None` leaves the decision to the next strategy.
    async fn check(&self, claim: &Claim<'_>) -> Result<Option<TrustLabel>>;
}

/// A logged-in session for the submitted email whose account links to an
/// author profile.
pub struct SessionVerification {
    directory: Arc<dyn TeamDirectory>,
}

impl SessionVerification {
    pub fn new(directory: Arc<dyn TeamDirectory>) -> Self {
        SessionVerification { directory }
    }
}

#[async_trait]
impl Verification for SessionVerification {
    async fn check(&self, claim: &Claim<'_>) -> Result<Option<TrustLabel>> {
        let Some(session) = claim.session.filter(|_| claim.session_owns_email()) else {
            return Ok(None);
        };
        let profile = self.directory.find_account(&session.email).await?;
        Ok(profile
            .filter(|p| p.is_team_member())
            .map(|p| TrustLabel::TeamVerified {
                badge: p.badge(),
                by: VerifiedBy::Session,
            }))
    }
}

/// Accounts with a verification code reserve their email: it can only be used
/// together with the code.
pub struct CodeVerification {
    directory: Arc<dyn TeamDirectory>,
}

impl CodeVerification {
    pub fn new(directory: Arc<dyn TeamDirectory>) -> Self {
        CodeVerification { directory }
    }
}

#[async_trait]
impl Verification for CodeVerification {
    async fn check(&self, claim: &Claim<'_>) -> Result<Option<TrustLabel>> {
        // A session for this very email already proved ownership.
        if claim.session_owns_email() {
            return Ok(None);
        }
        let Some(profile) = self.directory.find_account(claim.email).await? else {
            return Ok(None);
        };
        if !profile.account.is_reserved() {
            return Ok(None);
        }

        let expected = profile.account.verification_code.as_deref().map(str::trim);
        let supplied = claim.code.map(str::trim).filter(|c| !c.is_empty());
        if supplied.is_some() && supplied == expected {
            Ok(Some(TrustLabel::TeamVerified {
                badge: profile.badge(),
                by: VerifiedBy::SecretCode,
            }))
        } else {
            Ok(Some(TrustLabel::TeamReserved))
        }
    }
}

/// Runs the enabled strategies in order; the first decision wins and nobody
/// deciding means anonymous.
#[derive(Clone)]
pub struct IdentityResolver {
    strategies: Arc<Vec<Box<dyn Verification>>>,
    directory: Arc<dyn TeamDirectory>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn TeamDirectory>, config: &ModerationConfig) -> Self {
        let mut strategies: Vec<Box<dyn Verification>> = Vec::new();
        if config.session_verification {
            strategies.push(Box::new(SessionVerification::new(directory.clone())));
        }
        if config.code_verification {
            strategies.push(Box::new(CodeVerification::new(directory.clone())));
        }
        IdentityResolver {
            strategies: Arc::new(strategies),
            directory,
        }
    }

    pub async fn resolve(
        &self,
        email: &str,
        session: Option<&AuthSession>,
        code: Option<&str>,
    ) -> Result<TrustLabel> {
        let claim = Claim {
            email,
            session,
            code,
        };
        for strategy in self.strategies.iter() {
            if let Some(label) = strategy.check(&claim).await? {
                info!("Resolved commenter {}: {:?}", email, label);
                return Ok(label);
            }
        }
        Ok(TrustLabel::Anonymous)
    }

    /// True if submitting with this email needs team verification.
    pub async fn is_reserved(&self, email: &str) -> Result<bool> {
        Ok(self
            .directory
            .find_account(email)
            .await?
            .map(|p| p.account.is_reserved())
            .unwrap_or(false))
    }
}
