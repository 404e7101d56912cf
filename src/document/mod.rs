//! Rendered-document abstraction over the browser that loads the vault page.
//!
//! The pipeline only needs a handful of capabilities from a browser: run a
//! structural query (optionally scoped to an element), read an element's
//! visible text, and release the session afterwards. Queries are typed
//! ([`Query`]) so that every backend evaluates the same small set of shapes.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod webdriver;

pub use mock::{MockDocument, MockSource, Node};
pub use webdriver::{WebDriverDocument, WebDriverSource};

/// Opaque handle to an element of a rendered document.
///
/// Handles are only meaningful for the document that returned them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(String);

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Element(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Structural element query, evaluated against the document or a scope element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Elements with a direct text node containing the phrase (case-sensitive).
    ContainsText(String),
    /// Descendants with the given tag name.
    Tag(String),
    /// Descendants tagged `inner` that sit below a descendant tagged `outer`
    /// (the CSS selector `outer inner`).
    Nested { outer: String, inner: String },
    /// Descendants carrying the given ARIA `role` attribute.
    Role(String),
    /// The nearest ancestor-or-self of the scope that contains a `tag` descendant.
    ClosestWith(String),
}

impl Query {
    pub fn text(phrase: impl Into<String>) -> Self {
        Query::ContainsText(phrase.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Query::Tag(tag.into())
    }

    pub fn nested(outer: impl Into<String>, inner: impl Into<String>) -> Self {
        Query::Nested {
            outer: outer.into(),
            inner: inner.into(),
        }
    }

    pub fn role(role: impl Into<String>) -> Self {
        Query::Role(role.into())
    }

    pub fn closest_with(tag: impl Into<String>) -> Self {
        Query::ClosestWith(tag.into())
    }

    /// XPath 1.0 expression relative to the context node.
    pub fn to_xpath(&self) -> String {
        match self {
            Query::ContainsText(phrase) => {
                format!(".//*[text()[contains(., {})]]", xpath_literal(phrase))
            }
            Query::Tag(tag) => format!(".//{}", tag),
            Query::Nested { outer, inner } => format!(".//{}//{}", outer, inner),
            Query::Role(role) => format!(".//*[@role={}]", xpath_literal(role)),
            Query::ClosestWith(tag) => format!("ancestor-or-self::*[.//{}][1]", tag),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::ContainsText(phrase) => write!(f, "text={:?}", phrase),
            Query::Tag(tag) => write!(f, "{}", tag),
            Query::Nested { outer, inner } => write!(f, "{} {}", outer, inner),
            Query::Role(role) => write!(f, "[role='{}']", role),
            Query::ClosestWith(tag) => write!(f, "closest(:has({}))", tag),
        }
    }
}

/// Quote a string as an XPath literal, splitting on `'` when both quote kinds appear.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A loaded, rendered page.
#[async_trait]
pub trait Document: Send + Sync + fmt::Debug {
    /// Run a query against the whole document (`scope = None`) or below an element.
    ///
    /// Results are in document order.
    async fn query_all(
        &self,
        scope: Option<&Element>,
        query: &Query,
    ) -> Result<Vec<Element>, DocumentError>;

    /// Visible text of an element, as the browser renders it.
    async fn inner_text(&self, element: &Element) -> Result<String, DocumentError>;

    /// Number of matches for a query.
    async fn count(&self, scope: Option<&Element>, query: &Query) -> Result<usize, DocumentError> {
        Ok(self.query_all(scope, query).await?.len())
    }

    /// Release the underlying browser session.
    async fn close(&self) -> Result<(), DocumentError> {
        Ok(())
    }
}

/// Opens documents by navigating a browser to an address.
#[async_trait]
pub trait DocumentSource: Send + Sync + fmt::Debug {
    /// Navigate to `url` and return the rendered document.
    ///
    /// Implementations wait (bounded) for the page to settle; failing to reach
    /// an idle state is not an error.
    async fn open(&self, url: &str) -> Result<Box<dyn Document>, DocumentError>;
}

/// Error type for document operations.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// Browser session could not be created or was lost.
    #[error("browser session error: {0}")]
    Session(String),
    /// Network error talking to the browser driver.
    #[error("network error: {0}")]
    Network(String),
    /// Non-success response from the browser driver.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    /// Malformed or unexpected driver response.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The browser rejected the query.
    #[error("invalid query {query}: {message}")]
    Query { query: String, message: String },
    /// The element handle no longer refers to a live element.
    #[error("stale element: {0}")]
    StaleElement(String),
}
