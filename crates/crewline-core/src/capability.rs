//! Capabilities: named callables an agent may use through the collaborator.
//!
//! The pipeline never calls a capability itself. Capabilities are handed to
//! the [`AgentExecutor`](crate::collaborator::AgentExecutor), which decides
//! when to invoke them.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{SearchConfig, SERPER_API_KEY_VAR};
use crate::error::{CapabilityError, CrewError, Result};

const MAX_SEARCH_RESULTS: usize = 5;
const MAX_SCRAPED_CHARS: usize = 10_000;

/// A tool an agent may invoke.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// agent that lists it.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Stable identifier, unique within an agent's capability list.
    fn name(&self) -> &str;

    /// One-line description shown to the reasoning model.
    fn description(&self) -> &str;

    async fn invoke(&self, input: &str) -> std::result::Result<String, CapabilityError>;
}

impl std::fmt::Debug for dyn Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name())
            .finish()
    }
}

/// Ordered, name-unique list of capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    items: Vec<Arc<dyn Capability>>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        if self.get(capability.name()).is_some() {
            return Err(CrewError::InvalidConfiguration(format!(
                "duplicate capability: {}",
                capability.name()
            )));
        }
        self.items.push(capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.items.iter().find(|c| c.name() == name)
    }

    pub fn as_slice(&self) -> &[Arc<dyn Capability>] {
        &self.items
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("crewline/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Web search backed by the Serper Google search API.
pub struct WebSearchCapability {
    config: SearchConfig,
    client: reqwest::Client,
}

impl WebSearchCapability {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            client: http_client(),
        }
    }
}

#[async_trait]
impl Capability for WebSearchCapability {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Input is a search query."
    }

    async fn invoke(&self, input: &str) -> std::result::Result<String, CapabilityError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(CapabilityError::InvalidInput(
                "search query must not be empty".to_string(),
            ));
        }
        let api_key =
            self.config
                .api_key
                .as_deref()
                .ok_or_else(|| CapabilityError::MissingCredential {
                    variable: SERPER_API_KEY_VAR.to_string(),
                })?;

        debug!(query = %query, "web search");
        let response = self
            .client
            .post(format!("{}/search", self.config.base_url))
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
            .map_err(|e| CapabilityError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Http(format!(
                "search provider returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CapabilityError::Http(e.to_string()))?;
        Ok(render_search_results(&body))
    }
}

/// Render the organic results of a Serper response as markdown.
pub fn render_search_results(body: &Value) -> String {
    let mut results = Vec::new();
    if let Some(organic) = body.get("organic").and_then(|r| r.as_array()) {
        for item in organic.iter().take(MAX_SEARCH_RESULTS) {
            let title = item
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("No Title");
            let snippet = item.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
            let link = item.get("link").and_then(|v| v.as_str()).unwrap_or("");
            results.push(format!("### {title}\n{snippet}\nSource: {link}"));
        }
    }

    if results.is_empty() {
        "No results found.".to_string()
    } else {
        results.join("\n\n")
    }
}

/// Fetches a web page and returns its visible text.
pub struct ScrapeWebsiteCapability {
    client: reqwest::Client,
}

impl Default for ScrapeWebsiteCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeWebsiteCapability {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

#[async_trait]
impl Capability for ScrapeWebsiteCapability {
    fn name(&self) -> &str {
        "scrape_website"
    }

    fn description(&self) -> &str {
        "Read the text content of a web page. Input is an http(s) URL."
    }

    async fn invoke(&self, input: &str) -> std::result::Result<String, CapabilityError> {
        let url = input.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CapabilityError::InvalidInput(format!(
                "expected an http(s) URL, got '{url}'"
            )));
        }

        debug!(url = %url, "scraping page");
        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CapabilityError::Http(e.to_string()))?
            .text()
            .await
            .map_err(|e| CapabilityError::Http(e.to_string()))?;

        Ok(html_to_text(&html, MAX_SCRAPED_CHARS))
    }
}

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")
            .expect("static pattern")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern"))
}

/// Strip markup from `html`, collapse whitespace and cap the output at
/// `max_chars` characters.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let without_code = script_style_re().replace_all(html, " ");
    let without_tags = tag_re().replace_all(&without_code, " ");
    let text = without_tags.split_whitespace().collect::<Vec<_>>().join(" ");

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... [content truncated]", &text[..cut]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::EchoCapability;

    #[test]
    fn test_capability_set_rejects_duplicate_names() {
        let mut set = CapabilitySet::new();
        set.register(Arc::new(EchoCapability::new("echo"))).unwrap();
        let err = set
            .register(Arc::new(EchoCapability::new("echo")))
            .unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfiguration(_)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_capability_set_preserves_order() {
        let mut set = CapabilitySet::new();
        set.register(Arc::new(EchoCapability::new("b"))).unwrap();
        set.register(Arc::new(EchoCapability::new("a"))).unwrap();
        assert_eq!(set.names(), vec!["b", "a"]);
        assert!(set.get("a").is_some());
        assert!(set.get("c").is_none());
    }

    #[test]
    fn test_render_search_results_limits_to_five() {
        let organic: Vec<Value> = (0..8)
            .map(|i| {
                json!({
                    "title": format!("Result {i}"),
                    "snippet": "snippet",
                    "link": format!("https://example.com/{i}"),
                })
            })
            .collect();
        let rendered = render_search_results(&json!({ "organic": organic }));
        assert_eq!(rendered.matches("### ").count(), 5);
        assert!(rendered.starts_with("### Result 0\nsnippet\nSource: https://example.com/0"));
        assert!(!rendered.contains("Result 5"));
    }

    #[test]
    fn test_render_search_results_empty() {
        assert_eq!(render_search_results(&json!({})), "No results found.");
    }

    #[test]
    fn test_html_to_text_drops_scripts_and_tags() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script type="text/javascript">var x = "<b>";</script></head>
            <body><h1>Title</h1>
            <p>Hello   <em>world</em></p></body></html>"#;
        assert_eq!(html_to_text(html, 1000), "Title Hello world");
    }

    #[test]
    fn test_html_to_text_truncates_on_char_boundary() {
        let text = html_to_text("<p>ééééé</p>", 3);
        assert_eq!(text, "ééé... [content truncated]");
    }

    #[tokio::test]
    async fn test_scrape_rejects_non_http_input() {
        let scrape = ScrapeWebsiteCapability::new();
        let err = scrape.invoke("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_search_without_key_reports_missing_credential() {
        let search = WebSearchCapability::new(SearchConfig::default());
        let err = search.invoke("rust agents").await.unwrap_err();
        assert_eq!(
            err,
            CapabilityError::MissingCredential {
                variable: "SERPER_API_KEY".to_string()
            }
        );
    }
}
