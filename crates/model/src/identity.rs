use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

const PRESIDENT: &str = "President";
const TEAM_MEMBER: &str = "Team Member";

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountRole {
    Admin,
    #[default]
    Contributor,
}

/// Site login account. Owned by the dashboard, read-only here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    #[serde(default)]
    pub role: AccountRole,
    /// Linked team member profile.
    #[serde(default)]
    pub author: Option<ObjectId>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl Account {
    pub fn new(email: &str, role: AccountRole) -> Account {
        Account {
            id: ObjectId::new(),
            email: email.to_owned(),
            role,
            author: None,
            verification_code: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    /// A reserved email can only be used by someone who proves team membership.
    pub fn is_reserved(&self) -> bool {
        self.verification_code
            .as_deref()
            .map(|code| !code.is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<ObjectId>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Department {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub full_name: String,
}

/// An account together with whatever team profile it links to.
#[derive(Debug, Clone)]
pub struct TeamProfile {
    pub account: Account,
    pub author: Option<Author>,
    pub department: Option<Department>,
}

impl TeamProfile {
    pub fn is_team_member(&self) -> bool {
        self.author.is_some()
    }

    pub fn badge(&self) -> String {
        team_badge(
            self.author.as_ref().and_then(|a| a.role.as_deref()),
            self.department.as_ref().map(|d| d.name.as_str()),
        )
    }
}

pub fn team_badge(role: Option<&str>, department: Option<&str>) -> String {
    if role.map(|r| r.trim().eq_ignore_ascii_case(PRESIDENT)) == Some(true) {
        return PRESIDENT.to_owned();
    }
    match department {
        Some(department) if !department.trim().is_empty() => {
            format!("{} Department", department.trim())
        }
        _ => TEAM_MEMBER.to_owned(),
    }
}

/// Identity proved by the authentication provider for the current request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub email: String,
    pub role: AccountRole,
}

impl AuthSession {
    pub fn new(email: &str, role: AccountRole) -> AuthSession {
        AuthSession {
            email: email.to_owned(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    pub fn matches(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedBy {
    Session,
    SecretCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustLabel {
    TeamVerified { badge: String, by: VerifiedBy },
    /// Email belongs to a team account but ownership was not proven.
    TeamReserved,
    Anonymous,
}

impl TrustLabel {
    pub fn is_verified(&self) -> bool {
        matches!(self, TrustLabel::TeamVerified { .. })
    }
}
