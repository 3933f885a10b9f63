use bson::{doc, oid::ObjectId};
use eyre::Error;
use futures_util::TryStreamExt as _;
use model::comment::Comment;
use mongodb::{Collection, IndexModel};

use crate::session::Session;

const COLLECTION: &str = "comments";

pub struct CommentStore {
    store: Collection<Comment>,
}

impl CommentStore {
    pub(crate) async fn new(db: &mongodb::Database) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "post_id": 1, "approved": 1, "created_at": 1 })
                    .build(),
            )
            .await?;
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "post_id": 1, "auto_approved": 1 })
                    .build(),
            )
            .await?;
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "approved": 1, "created_at": -1 })
                    .build(),
            )
            .await?;
        Ok(CommentStore { store })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Comment>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn insert(&self, session: &mut Session, comment: &Comment) -> Result<(), Error> {
        self.store
            .insert_one(comment)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    /// All comments of a post regardless of moderation state.
    pub async fn by_post(&self, session: &mut Session, post: ObjectId) -> Result<Vec<Comment>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "post_id": post })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn approved_by_post(
        &self,
        session: &mut Session,
        post: ObjectId,
    ) -> Result<Vec<Comment>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "post_id": post, "approved": true })
            .sort(doc! { "created_at": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn pending(
        &self,
        session: &mut Session,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Comment>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "approved": false })
            .sort(doc! { "created_at": -1 })
            .skip(offset)
            .limit(limit)
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn count_counted(
        &self,
        session: &mut Session,
        post: ObjectId,
        ids: Option<&[ObjectId]>,
    ) -> Result<u64, Error> {
        let mut filter = doc! { "post_id": post, "auto_approved": true };
        if let Some(ids) = ids {
            filter.insert("_id", doc! { "$in": ids.to_vec() });
        }
        Ok(self
            .store
            .count_documents(filter)
            .session(&mut *session)
            .await?)
    }

    pub async fn delete_many(
        &self,
        session: &mut Session,
        post: ObjectId,
        ids: &[ObjectId],
    ) -> Result<u64, Error> {
        let result = self
            .store
            .delete_many(doc! { "post_id": post, "_id": { "$in": ids.to_vec() } })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }

    pub async fn approve(&self, session: &mut Session, id: ObjectId) -> Result<(), Error> {
        self.store
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "approved": true, "auto_approved": true } },
            )
            .session(&mut *session)
            .await?;
        Ok(())
    }

    /// Sets `auto_approved` on the visible comments of the post that lack it.
    pub async fn mark_counted(&self, session: &mut Session, post: ObjectId) -> Result<u64, Error> {
        let result = self
            .store
            .update_many(
                doc! { "post_id": post, "approved": true, "auto_approved": { "$ne": true } },
                doc! { "$set": { "auto_approved": true } },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count)
    }
}
