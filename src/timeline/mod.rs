//! The timeline data model and the grouping/annotation pass over it.

pub mod grouping;
pub mod items;
pub mod message;
