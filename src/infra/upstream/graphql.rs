use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{
    application::repos::{SnippetSource, SourceError},
    domain::snippets::Snippet,
    infra::error::InfraError,
};

/// Query sent to the snippet API. Fields mirror [`Snippet`].
pub const GET_SNIPPETS_QUERY: &str =
    "query GetSnippets { snippets { id title language code postedAt } }";

const OPERATION_NAME: &str = "GetSnippets";

/// Fetches snippets from a GraphQL endpoint on every call.
#[derive(Clone, Debug)]
pub struct GraphqlSnippetSource {
    client: Client,
    endpoint: Url,
}

impl GraphqlSnippetSource {
    pub fn new(endpoint: Url) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::upstream(format!("failed to build http client: {err}")))?;
        Ok(Self { client, endpoint })
    }

    fn user_agent() -> &'static str {
        concat!("codebases/", env!("CARGO_PKG_VERSION"))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a> {
    operation_name: &'a str,
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<SnippetsData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Deserialize)]
struct SnippetsData {
    snippets: Vec<Snippet>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[async_trait]
impl SnippetSource for GraphqlSnippetSource {
    async fn fetch_snippets(&self) -> Result<Vec<Snippet>, SourceError> {
        let body = GraphqlRequest {
            operation_name: OPERATION_NAME,
            query: GET_SNIPPETS_QUERY,
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(SourceError::transport)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(SourceError::transport)?;
        parse_response(status, &bytes)
    }
}

fn parse_response(status: StatusCode, bytes: &[u8]) -> Result<Vec<Snippet>, SourceError> {
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
        });
    }

    let payload: GraphqlResponse = serde_json::from_slice(bytes)
        .map_err(|err| SourceError::invalid_payload(format!("failed to parse body: {err}")))?;

    if !payload.errors.is_empty() {
        return Err(SourceError::Graphql(
            payload.errors.into_iter().map(|entry| entry.message).collect(),
        ));
    }

    payload
        .data
        .map(|data| data.snippets)
        .ok_or_else(|| SourceError::invalid_payload("response carried neither data nor errors"))
}
