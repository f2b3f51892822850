//! Application services: the listing pipeline and its collaborators.

pub mod error;
pub mod listing;
pub mod render;
pub mod repos;
