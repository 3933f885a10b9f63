pub mod comment;
pub mod delete_request;
pub mod errors;
pub mod identity;
pub mod post;
pub mod thread;
