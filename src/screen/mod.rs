//! Serializable screen state and the utilities it is built from.

pub mod content_state;
pub mod conversation;
pub mod deferred;
