//! Content sources backing the two listing feeds.

mod graphql;
mod static_store;

pub use graphql::{GET_SNIPPETS_QUERY, GraphqlSnippetSource};
pub use static_store::StaticPostSource;
