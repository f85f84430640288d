//! Web search via the Serper API

use super::{Tool, ToolContext, ToolOutput, TOOL_HTTP_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Number of results requested per query
const RESULT_COUNT: u32 = 10;

pub struct WebSearchTool {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(api_key: String, endpoint: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(TOOL_HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    async fn search(&self, query: &str) -> Result<SearchResults, reqwest::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: query,
                num: RESULT_COUNT,
            })
            .send()
            .await?
            .error_for_status()?;

        let data: SerperResponse = response.json().await?;
        Ok(SearchResults::from_serper(query, data))
    }
}

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> String {
        "Search the web to find relevant URLs and information. Returns organic results \
         (title, link, snippet) plus an answer box or knowledge graph summary when available."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query string"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let query = match WebSearchInput::deserialize(&input) {
            Ok(input) => input.query,
            Err(e) => {
                let query = input.get("query").and_then(Value::as_str).unwrap_or_default();
                return ToolOutput::failure(search_failure(query, &format!("Invalid input: {e}")));
            }
        };

        let result = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => {
                return ToolOutput::failure(search_failure(&query, "Search cancelled"));
            }
            result = self.search(&query) => result,
        };

        match result {
            Ok(results) => {
                tracing::info!(
                    thread_id = %ctx.thread_id,
                    query = %query,
                    results = results.organic_results.len(),
                    "Web search completed"
                );
                match serde_json::to_value(&results) {
                    Ok(value) => ToolOutput::success(value),
                    Err(e) => ToolOutput::failure(search_failure(&query, &e.to_string())),
                }
            }
            Err(e) => {
                tracing::error!(
                    thread_id = %ctx.thread_id,
                    query = %query,
                    error = %e,
                    "Web search failed"
                );
                ToolOutput::failure(search_failure(&query, &e.to_string()))
            }
        }
    }
}

fn search_failure(query: &str, error: &str) -> Value {
    json!({
        "query": query,
        "error": error,
        "organic_results": [],
    })
}

// Serper wire types

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
    #[serde(rename = "answerBox")]
    answer_box: Option<SerperAnswerBox>,
    #[serde(rename = "knowledgeGraph")]
    knowledge_graph: Option<SerperKnowledgeGraph>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerperAnswerBox {
    answer: Option<String>,
    snippet: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerperKnowledgeGraph {
    title: Option<String>,
    description: Option<String>,
}

// Result shape handed to the model

#[derive(Debug, Serialize)]
struct SearchResults {
    query: String,
    organic_results: Vec<OrganicResult>,
    answer_box: Option<AnswerBox>,
    knowledge_graph: Option<KnowledgeGraph>,
}

#[derive(Debug, Serialize)]
struct OrganicResult {
    title: String,
    link: String,
    snippet: String,
}

#[derive(Debug, Serialize)]
struct AnswerBox {
    answer: String,
    snippet: String,
    title: String,
}

#[derive(Debug, Serialize)]
struct KnowledgeGraph {
    title: String,
    description: String,
}

impl SearchResults {
    fn from_serper(query: &str, data: SerperResponse) -> Self {
        Self {
            query: query.to_string(),
            organic_results: data
                .organic
                .into_iter()
                .map(|item| OrganicResult {
                    title: item.title.unwrap_or_default(),
                    link: item.link.unwrap_or_default(),
                    snippet: item.snippet.unwrap_or_default(),
                })
                .collect(),
            answer_box: data.answer_box.map(|b| AnswerBox {
                answer: b.answer.unwrap_or_default(),
                snippet: b.snippet.unwrap_or_default(),
                title: b.title.unwrap_or_default(),
            }),
            knowledge_graph: data.knowledge_graph.map(|k| KnowledgeGraph {
                title: k.title.unwrap_or_default(),
                description: k.description.unwrap_or_default(),
            }),
        }
    }
}
