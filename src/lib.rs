//! Responsive card listings of syntax-highlighted code snippets.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
