//! Web page content extraction

use super::{Tool, ToolContext, ToolOutput, TOOL_HTTP_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{json, Value};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Maximum characters of page text returned to the model
pub const MAX_CONTENT_CHARS: usize = 10_000;

const TRUNCATION_MARKER: &str = "...";

/// Elements that never contribute page text
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Candidate primary-content regions, in priority order
const MAIN_SELECTORS: &[&str] = &["main", "article", "[role='main']", ".content", "#content"];

const NO_TITLE: &str = "No title found";

pub struct ScrapePageTool {
    client: Client,
}

impl ScrapePageTool {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(TOOL_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed")
            ));
        }

        response.text().await.map_err(|e| e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ScrapePageInput {
    url: String,
}

#[async_trait]
impl Tool for ScrapePageTool {
    fn name(&self) -> &'static str {
        "scrape_page"
    }

    fn description(&self) -> String {
        format!(
            "Fetch a web page and extract its readable text. Returns the page title, meta \
             description and main content (scripts, navigation, headers and footers removed), \
             truncated to {MAX_CONTENT_CHARS} characters."
        )
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the web page to scrape"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let url = match ScrapePageInput::deserialize(&input) {
            Ok(input) => input.url,
            Err(e) => {
                let url = input.get("url").and_then(Value::as_str).unwrap_or_default();
                return ToolOutput::failure(scrape_failure(url, &format!("Invalid input: {e}")));
            }
        };

        let fetched = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => Err("Scrape cancelled".to_string()),
            result = self.fetch(&url) => result,
        };

        match fetched {
            Ok(html) => {
                let page = extract_page(&url, &html);
                tracing::info!(thread_id = %ctx.thread_id, url = %url, "Scraped page");
                ToolOutput::success(page)
            }
            Err(error) => {
                tracing::error!(thread_id = %ctx.thread_id, url = %url, error = %error, "Scrape failed");
                ToolOutput::failure(scrape_failure(&url, &error))
            }
        }
    }
}

fn scrape_failure(url: &str, error: &str) -> Value {
    json!({
        "url": url,
        "error": error,
        "status": "error",
    })
}

/// Build the success payload for a fetched document
pub fn extract_page(url: &str, html: &str) -> Value {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "title")
        .or_else(|| first_attr(&doc, "meta[property='og:title']", "content"))
        .unwrap_or_else(|| NO_TITLE.to_string());

    let description = first_attr(&doc, "meta[name='description']", "content")
        .or_else(|| first_attr(&doc, "meta[property='og:description']", "content"))
        .unwrap_or_default();

    let content = MAIN_SELECTORS
        .iter()
        .filter_map(|selector| {
            let sel = Selector::parse(selector).ok()?;
            doc.select(&sel).find(|el| !is_inside_stripped(*el))
        })
        .map(visible_text)
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| visible_text(doc.root_element()));

    json!({
        "url": url,
        "title": title,
        "description": description,
        "content": truncate(content),
        "status": "success",
    })
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

fn first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let value = el.value().attr(attr)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn is_stripped(el: ElementRef<'_>) -> bool {
    STRIPPED_TAGS.contains(&el.value().name())
}

fn is_inside_stripped(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_stripped)
}

/// Text of `root` with stripped subtrees skipped and whitespace collapsed
fn visible_text(root: ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_text(root, &mut buf);
    collapse_whitespace(&buf)
}

fn collect_text(el: ElementRef<'_>, buf: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            buf.push_str(text);
            buf.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !is_stripped(child_el) {
                collect_text(child_el, buf);
            }
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(content: String) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content;
    }
    let mut truncated: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
