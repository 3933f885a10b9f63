use bson::{doc, oid::ObjectId};
use eyre::Error;
use model::identity::{Account, Author, Department, TeamProfile};
use mongodb::{Collection, IndexModel};

use crate::session::Session;

const ACCOUNTS: &str = "users";
const AUTHORS: &str = "authors";
const DEPARTMENTS: &str = "departments";

/// Read-only view of the site's accounts and team profiles.
pub struct TeamStore {
    accounts: Collection<Account>,
    authors: Collection<Author>,
    departments: Collection<Department>,
}

impl TeamStore {
    pub(crate) async fn new(db: &mongodb::Database) -> Result<Self, Error> {
        let accounts = db.collection(ACCOUNTS);
        accounts
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).build())
            .await?;
        Ok(TeamStore {
            accounts,
            authors: db.collection(AUTHORS),
            departments: db.collection(DEPARTMENTS),
        })
    }

    pub async fn find_by_email(
        &self,
        session: &mut Session,
        email: &str,
    ) -> Result<Option<TeamProfile>, Error> {
        let pattern = format!("^{}$", escape_regex(email.trim()));
        let account = self
            .accounts
            .find_one(doc! { "email": { "$regex": pattern, "$options": "i" } })
            .session(&mut *session)
            .await?;
        let Some(account) = account else {
            return Ok(None);
        };

        let author = match account.author {
            Some(id) => self.author(session, id).await?,
            None => None,
        };
        let department = match author.as_ref().and_then(|a| a.department) {
            Some(id) => self.department(session, id).await?,
            None => None,
        };
        Ok(Some(TeamProfile {
            account,
            author,
            department,
        }))
    }

    async fn author(&self, session: &mut Session, id: ObjectId) -> Result<Option<Author>, Error> {
        Ok(self
            .authors
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    async fn department(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<Option<Department>, Error> {
        Ok(self
            .departments
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }
}

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if "\\.+*?()|[]{}^$#&-~".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
