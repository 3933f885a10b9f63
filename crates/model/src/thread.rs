use std::collections::{HashMap, HashSet};

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::comment::Comment;

/// A comment as shown to readers, with its replies nested below it.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ThreadNode {
    pub id: ObjectId,
    pub name: String,
    pub body: String,
    pub is_team_member: bool,
    pub team_badge: Option<String>,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    fn new(comment: &Comment, replies: Vec<ThreadNode>) -> ThreadNode {
        ThreadNode {
            id: comment.id,
            name: comment.name.clone(),
            body: comment.body.clone(),
            is_team_member: comment.is_team_member,
            team_badge: comment.team_badge.clone(),
            created_at: comment.created_at,
            replies,
        }
    }

    /// Number of comments in this subtree, the node itself included.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(ThreadNode::size).sum::<usize>()
    }
}

/// Parent -> children adjacency over the comments of a single post.
/// Siblings are kept oldest first.
pub struct ReplyIndex<'a> {
    roots: Vec<&'a Comment>,
    children: HashMap<ObjectId, Vec<&'a Comment>>,
}

impl<'a> ReplyIndex<'a> {
    pub fn new(comments: &'a [Comment]) -> ReplyIndex<'a> {
        let mut roots = Vec::new();
        let mut children: HashMap<ObjectId, Vec<&'a Comment>> = HashMap::new();
        for comment in comments {
            match comment.parent_comment_id {
                Some(parent) => children.entry(parent).or_default().push(comment),
                None => roots.push(comment),
            }
        }

        roots.sort_by(|a, b| chronological(a, b));
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| chronological(a, b));
        }
        ReplyIndex { roots, children }
    }

    pub fn roots(&self) -> &[&'a Comment] {
        &self.roots
    }

    pub fn children(&self, id: ObjectId) -> &[&'a Comment] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every comment transitively replying to `id`, depth first.
    pub fn descendants(&self, id: ObjectId) -> Vec<&'a Comment> {
        let mut seen = HashSet::from([id]);
        self.walk(self.children(id), &mut seen)
    }

    /// Pre-order depth-first walk. Uses an explicit stack so thread depth is
    /// not bounded by the call stack, and never yields a comment twice even
    /// if the stored references form a loop.
    fn walk(&self, start: &[&'a Comment], seen: &mut HashSet<ObjectId>) -> Vec<&'a Comment> {
        let mut order = Vec::new();
        let mut stack: Vec<&'a Comment> = start.iter().rev().copied().collect();
        while let Some(comment) = stack.pop() {
            if !seen.insert(comment.id) {
                continue;
            }
            order.push(comment);
            stack.extend(self.children(comment.id).iter().rev().copied());
        }
        order
    }
}

fn chronological(a: &Comment, b: &Comment) -> std::cmp::Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.bytes().cmp(&b.id.bytes()))
}

/// Builds the reader-facing forest from the visible comments of one post.
///
/// Comments whose parent is not among `comments` are left out together with
/// their replies: a hidden parent hides the whole branch.
pub fn assemble(comments: &[Comment]) -> Vec<ThreadNode> {
    let index = ReplyIndex::new(comments);
    let order = index.walk(index.roots(), &mut HashSet::new());

    // Reverse pre-order visits every child before its parent.
    let mut built: HashMap<ObjectId, Vec<ThreadNode>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in order.iter().rev() {
        let mut replies = built.remove(&comment.id).unwrap_or_default();
        replies.reverse();
        let node = ThreadNode::new(comment, replies);
        match comment.parent_comment_id {
            Some(parent) => built.entry(parent).or_default().push(node),
            None => roots.push(node),
        }
    }
    roots.reverse();
    roots
}
