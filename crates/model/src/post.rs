use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// The slice of the externally owned post document this crate cares about.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: String,
    /// Cached number of counted comments. Missing on posts created before
    /// comments existed.
    #[serde(default)]
    pub comment_count: i64,
}

impl Post {
    pub fn new(title: &str) -> Post {
        Post {
            id: ObjectId::new(),
            title: title.to_owned(),
            comment_count: 0,
        }
    }
}
