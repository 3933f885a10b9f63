use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::Error;
use futures_util::TryStreamExt as _;
use model::delete_request::{DeletionRequest, RequestStatus};
use mongodb::{Collection, IndexModel};

use crate::session::Session;

const COLLECTION: &str = "delete_requests";

pub struct DeleteRequestStore {
    store: Collection<DeletionRequest>,
}

impl DeleteRequestStore {
    pub(crate) async fn new(db: &mongodb::Database) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "created_at": 1 })
                    .build(),
            )
            .await?;
        Ok(DeleteRequestStore { store })
    }

    pub async fn get(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<Option<DeletionRequest>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn insert(&self, session: &mut Session, request: &DeletionRequest) -> Result<(), Error> {
        self.store
            .insert_one(request)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn pending(&self, session: &mut Session) -> Result<Vec<DeletionRequest>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "status": RequestStatus::Pending.as_ref() })
            .sort(doc! { "created_at": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Returns false if the request is missing or not pending anymore.
    pub async fn resolve(
        &self,
        session: &mut Session,
        id: ObjectId,
        status: RequestStatus,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = self
            .store
            .update_one(
                doc! { "_id": id, "status": RequestStatus::Pending.as_ref() },
                doc! { "$set": {
                    "status": status.as_ref(),
                    "reviewed_at": bson::DateTime::from_chrono(reviewed_at),
                } },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count == 1)
    }
}
