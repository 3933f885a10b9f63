use bson::{doc, oid::ObjectId};
use eyre::{eyre, Error};
use futures_util::TryStreamExt as _;
use model::post::Post;
use mongodb::Collection;

use crate::session::Session;

const COLLECTION: &str = "posts";

pub struct PostStore {
    store: Collection<Post>,
}

impl PostStore {
    pub(crate) fn new(db: &mongodb::Database) -> Self {
        PostStore {
            store: db.collection(COLLECTION),
        }
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Post>, Error> {
        Ok(self
            .store
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn ids(&self, session: &mut Session) -> Result<Vec<ObjectId>, Error> {
        let mut cursor = self
            .store
            .find(doc! {})
            .projection(doc! { "_id": 1, "comment_count": 1 })
            .session(&mut *session)
            .await?;
        let posts: Vec<Post> = cursor.stream(&mut *session).try_collect().await?;
        Ok(posts.into_iter().map(|p| p.id).collect())
    }

    pub async fn inc_comment_count(
        &self,
        session: &mut Session,
        id: ObjectId,
        delta: i64,
    ) -> Result<(), Error> {
        let result = self
            .store
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "comment_count": delta } },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count == 0 {
            return Err(eyre!("Post not found: {}", id));
        }
        Ok(())
    }

    /// Decrements the counter, clamping at zero. Missing counters count as zero.
    pub async fn dec_comment_count(
        &self,
        session: &mut Session,
        id: ObjectId,
        delta: i64,
    ) -> Result<(), Error> {
        let pipeline = vec![doc! {
            "$set": {
                "comment_count": {
                    "$max": [
                        0,
                        { "$subtract": [{ "$ifNull": ["$comment_count", 0] }, delta] },
                    ]
                }
            }
        }];
        self.store
            .update_one(doc! { "_id": id }, pipeline)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn set_comment_count(
        &self,
        session: &mut Session,
        id: ObjectId,
        count: i64,
    ) -> Result<(), Error> {
        let result = self
            .store
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "comment_count": count } },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count == 0 {
            return Err(eyre!("Post not found: {}", id));
        }
        Ok(())
    }
}
