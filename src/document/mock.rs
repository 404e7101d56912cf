//! In-memory document for testing without a browser.
//!
//! A page is described as a tree of [`Node`]s. Pages can be staged over time
//! (`then_after`) to imitate a table whose rows stream in after the first
//! render; the stage clock is tokio's, so paused-time tests stay deterministic.

use super::{Document, DocumentError, DocumentSource, Element, Query};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Element description used to build mock pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    tag: String,
    role: Option<String>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set the element's own (direct) text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// A conventional `<table>` with a `<thead>` header row and `<tbody>` data rows.
    pub fn table(headers: &[&str], rows: &[&[&str]]) -> Self {
        let header_row = Node::new("tr")
            .with_children(headers.iter().map(|h| Node::new("th").with_text(*h)));
        let body_rows = rows.iter().map(|cells| {
            Node::new("tr").with_children(cells.iter().map(|c| Node::new("td").with_text(*c)))
        });
        Node::new("table")
            .with_child(Node::new("thead").with_child(header_row))
            .with_child(Node::new("tbody").with_children(body_rows))
    }
}

/// Flattened node in document (pre-)order.
#[derive(Debug)]
struct Slot {
    tag: String,
    role: Option<String>,
    text: String,
    parent: Option<usize>,
    /// Exclusive end of this node's subtree in the arena.
    end: usize,
}

#[derive(Debug)]
struct Arena {
    slots: Vec<Slot>,
}

impl Arena {
    fn build(root: &Node) -> Self {
        let mut slots = Vec::new();
        Self::push(&mut slots, root, None);
        Self { slots }
    }

    fn push(slots: &mut Vec<Slot>, node: &Node, parent: Option<usize>) {
        let idx = slots.len();
        slots.push(Slot {
            tag: node.tag.clone(),
            role: node.role.clone(),
            text: node.text.clone(),
            parent,
            end: idx + 1,
        });
        for child in &node.children {
            Self::push(slots, child, Some(idx));
        }
        slots[idx].end = slots.len();
    }

    /// Descendants of `scope` in document order; the whole document for `None`.
    fn descendants(&self, scope: Option<usize>) -> std::ops::Range<usize> {
        match scope {
            Some(idx) => idx + 1..self.slots[idx].end,
            None => 0..self.slots.len(),
        }
    }

    fn has_ancestor_tagged(&self, idx: usize, tag: &str, stop: Option<usize>) -> bool {
        let mut current = self.slots[idx].parent;
        while let Some(p) = current {
            if Some(p) == stop {
                return false;
            }
            if self.slots[p].tag == tag {
                return true;
            }
            current = self.slots[p].parent;
        }
        false
    }

    fn evaluate(&self, scope: Option<usize>, query: &Query) -> Vec<usize> {
        match query {
            Query::ContainsText(phrase) => self
                .descendants(scope)
                .filter(|&i| self.slots[i].text.contains(phrase.as_str()))
                .collect(),
            Query::Tag(tag) => self
                .descendants(scope)
                .filter(|&i| self.slots[i].tag == *tag)
                .collect(),
            Query::Nested { outer, inner } => self
                .descendants(scope)
                .filter(|&i| self.slots[i].tag == *inner && self.has_ancestor_tagged(i, outer, scope))
                .collect(),
            Query::Role(role) => self
                .descendants(scope)
                .filter(|&i| self.slots[i].role.as_deref() == Some(role.as_str()))
                .collect(),
            Query::ClosestWith(tag) => {
                let mut current = scope;
                while let Some(idx) = current {
                    if self
                        .descendants(Some(idx))
                        .any(|i| self.slots[i].tag == *tag)
                    {
                        return vec![idx];
                    }
                    current = self.slots[idx].parent;
                }
                Vec::new()
            }
        }
    }

    fn inner_text(&self, idx: usize) -> String {
        (idx..self.slots[idx].end)
            .map(|i| self.slots[i].text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug)]
struct Stage {
    at: Duration,
    arena: Arena,
}

#[derive(Debug)]
struct Inner {
    described: Vec<(Duration, Node)>,
    stages: Vec<Stage>,
    opened_at: Mutex<Instant>,
    fail_text_queries: bool,
    closed: AtomicBool,
}

/// Mock document serving one or more staged page renders.
#[derive(Debug, Clone)]
pub struct MockDocument {
    inner: Arc<Inner>,
}

impl MockDocument {
    /// A document whose page never changes.
    pub fn new(root: Node) -> Self {
        Self::staged(vec![(Duration::ZERO, root)], false)
    }

    /// Replace the page with `root` once `after` has elapsed since opening.
    pub fn then_after(self, after: Duration, root: Node) -> Self {
        let mut described = self.inner.described.clone();
        described.push((after, root));
        Self::staged(described, self.inner.fail_text_queries)
    }

    /// Make every text query fail, as a browser whose text engine is broken would.
    pub fn with_failing_text_queries(self) -> Self {
        Self::staged(self.inner.described.clone(), true)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn staged(mut described: Vec<(Duration, Node)>, fail_text_queries: bool) -> Self {
        described.sort_by_key(|(at, _)| *at);
        let stages = described
            .iter()
            .map(|(at, root)| Stage {
                at: *at,
                arena: Arena::build(root),
            })
            .collect();
        Self {
            inner: Arc::new(Inner {
                described,
                stages,
                opened_at: Mutex::new(Instant::now()),
                fail_text_queries,
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn reset_clock(&self) {
        if let Ok(mut opened_at) = self.inner.opened_at.lock() {
            *opened_at = Instant::now();
        }
    }

    fn current_stage(&self) -> usize {
        let elapsed = self
            .inner
            .opened_at
            .lock()
            .map(|opened_at| opened_at.elapsed())
            .unwrap_or_default();
        self.inner
            .stages
            .iter()
            .rposition(|stage| stage.at <= elapsed)
            .unwrap_or(0)
    }

    fn resolve(&self, element: &Element, stage: usize) -> Result<usize, DocumentError> {
        let (element_stage, idx) = element
            .id()
            .split_once(':')
            .and_then(|(s, i)| Some((s.parse::<usize>().ok()?, i.parse::<usize>().ok()?)))
            .ok_or_else(|| DocumentError::Protocol(format!("unknown element {}", element.id())))?;
        if element_stage != stage || idx >= self.inner.stages[stage].arena.slots.len() {
            return Err(DocumentError::StaleElement(element.id().to_string()));
        }
        Ok(idx)
    }
}

#[async_trait]
impl Document for MockDocument {
    async fn query_all(
        &self,
        scope: Option<&Element>,
        query: &Query,
    ) -> Result<Vec<Element>, DocumentError> {
        if self.inner.fail_text_queries && matches!(query, Query::ContainsText(_)) {
            return Err(DocumentError::Query {
                query: query.to_string(),
                message: "text engine unavailable".to_string(),
            });
        }

        let stage = self.current_stage();
        let scope = scope.map(|el| self.resolve(el, stage)).transpose()?;
        Ok(self.inner.stages[stage]
            .arena
            .evaluate(scope, query)
            .into_iter()
            .map(|idx| Element::new(format!("{}:{}", stage, idx)))
            .collect())
    }

    async fn inner_text(&self, element: &Element) -> Result<String, DocumentError> {
        let stage = self.current_stage();
        let idx = self.resolve(element, stage)?;
        Ok(self.inner.stages[stage].arena.inner_text(idx))
    }

    async fn close(&self) -> Result<(), DocumentError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Source handing out a prepared [`MockDocument`].
#[derive(Debug, Clone)]
pub struct MockSource {
    document: MockDocument,
    opened: Arc<Mutex<Vec<String>>>,
    open_error: Option<DocumentError>,
}

impl MockSource {
    pub fn new(document: MockDocument) -> Self {
        Self {
            document,
            opened: Arc::new(Mutex::new(Vec::new())),
            open_error: None,
        }
    }

    /// Make `open` fail with the given error.
    pub fn failing(error: DocumentError) -> Self {
        let mut source = Self::new(MockDocument::new(Node::new("body")));
        source.open_error = Some(error);
        source
    }

    /// URLs passed to `open`, in call order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().map(|urls| urls.clone()).unwrap_or_default()
    }

    pub fn document(&self) -> &MockDocument {
        &self.document
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn open(&self, url: &str) -> Result<Box<dyn Document>, DocumentError> {
        if let Ok(mut urls) = self.opened.lock() {
            urls.push(url.to_string());
        }
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        self.document.reset_clock();
        Ok(Box::new(self.document.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Node {
        Node::new("body")
            .with_child(
                Node::new("section")
                    .with_child(Node::new("h2").with_text("Perpetual Positions"))
                    .with_child(Node::table(
                        &["Coin", "Leverage", "Size", "Mark Price"],
                        &[&["BTC", "5x", "2.5", "60000"], &["ETH", "10x", "-20", "3500"]],
                    )),
            )
            .with_child(Node::new("div").with_role("row").with_text("stray"))
    }

    #[tokio::test]
    async fn test_mock_document_tag_queries() {
        let doc = MockDocument::new(page());
        let tables = doc.query_all(None, &Query::tag("table")).await.unwrap();
        assert_eq!(tables.len(), 1);

        let body_rows = doc
            .query_all(Some(&tables[0]), &Query::nested("tbody", "tr"))
            .await
            .unwrap();
        assert_eq!(body_rows.len(), 2);

        let all_rows = doc.count(Some(&tables[0]), &Query::tag("tr")).await.unwrap();
        assert_eq!(all_rows, 3);

        let cells = doc.query_all(Some(&body_rows[1]), &Query::tag("td")).await.unwrap();
        assert_eq!(doc.inner_text(&cells[2]).await.unwrap(), "-20");
    }

    #[tokio::test]
    async fn test_mock_document_closest_with() {
        let doc = MockDocument::new(page());
        let headings = doc
            .query_all(None, &Query::text("Perpetual Positions"))
            .await
            .unwrap();
        assert_eq!(headings.len(), 1);

        let scope = doc
            .query_all(Some(&headings[0]), &Query::closest_with("table"))
            .await
            .unwrap();
        assert_eq!(scope.len(), 1);
        assert!(doc
            .inner_text(&scope[0])
            .await
            .unwrap()
            .starts_with("Perpetual Positions Coin"));
    }

    #[tokio::test]
    async fn test_mock_document_role_scoped_to_document() {
        let doc = MockDocument::new(page());
        assert_eq!(doc.count(None, &Query::role("row")).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_document_stages_and_stale_handles() {
        let doc = MockDocument::new(Node::new("body").with_child(Node::table(&["Coin"], &[])))
            .then_after(Duration::from_secs(2), page());

        let early = doc.query_all(None, &Query::tag("table")).await.unwrap();
        assert_eq!(doc.count(Some(&early[0]), &Query::tag("td")).await.unwrap(), 0);

        tokio::time::sleep(Duration::from_secs(3)).await;

        let err = doc.inner_text(&early[0]).await.unwrap_err();
        assert!(matches!(err, DocumentError::StaleElement(_)));

        let late = doc.query_all(None, &Query::tag("table")).await.unwrap();
        assert_eq!(doc.count(Some(&late[0]), &Query::tag("td")).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_mock_document_failing_text_queries() {
        let doc = MockDocument::new(page()).with_failing_text_queries();
        let err = doc
            .query_all(None, &Query::text("Perpetual Positions"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Query { .. }));
        assert_eq!(doc.count(None, &Query::tag("table")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_records_urls_and_close() {
        let source = MockSource::new(MockDocument::new(page()));
        let doc = source.open("https://example.test/vault").await.unwrap();
        doc.close().await.unwrap();
        assert_eq!(source.opened_urls(), vec!["https://example.test/vault"]);
        assert!(source.document().is_closed());
    }
}
