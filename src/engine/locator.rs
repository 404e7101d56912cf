//! Locating the perpetual positions table on the vault page.
//!
//! The page markup carries no stable identifiers, so the table is found by
//! heuristics tried in priority order. The first strategy that yields a table
//! wins; a strategy that errors is logged and skipped.

use crate::document::{Document, DocumentError, Element, Query};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, warn};

/// Heading rendered above the positions grid.
pub const POSITIONS_HEADING: &str = "Perpetual Positions";

/// Upper-cased header keywords that identify the positions grid.
pub const POSITIONS_HEADER_KEYWORDS: [&str; 3] = ["COIN", "SIZE", "MARK"];

/// One heuristic for finding the target table.
#[async_trait]
pub trait TableStrategy: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    async fn find_table(&self, document: &dyn Document) -> Result<Option<Element>, DocumentError>;
}

/// Finds the first table sharing the nearest enclosing container with a heading.
#[derive(Debug, Clone)]
pub struct HeadingProximity {
    heading: String,
}

impl HeadingProximity {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
        }
    }
}

impl Default for HeadingProximity {
    fn default() -> Self {
        Self::new(POSITIONS_HEADING)
    }
}

#[async_trait]
impl TableStrategy for HeadingProximity {
    fn name(&self) -> &'static str {
        "heading"
    }

    async fn find_table(&self, document: &dyn Document) -> Result<Option<Element>, DocumentError> {
        let headings = document
            .query_all(None, &Query::text(self.heading.as_str()))
            .await?;

        for heading in &headings {
            let scopes = document
                .query_all(Some(heading), &Query::closest_with("table"))
                .await?;
            let Some(scope) = scopes.first() else {
                continue;
            };
            let tables = document.query_all(Some(scope), &Query::tag("table")).await?;
            if let Some(table) = tables.into_iter().next() {
                return Ok(Some(table));
            }
        }

        Ok(None)
    }
}

/// Finds the first table whose header cells mention every keyword.
#[derive(Debug, Clone)]
pub struct HeaderKeywords {
    keywords: Vec<String>,
}

impl HeaderKeywords {
    /// Keywords are matched against upper-cased header text.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_uppercase())
                .collect(),
        }
    }
}

impl Default for HeaderKeywords {
    fn default() -> Self {
        Self::new(POSITIONS_HEADER_KEYWORDS)
    }
}

#[async_trait]
impl TableStrategy for HeaderKeywords {
    fn name(&self) -> &'static str {
        "header keywords"
    }

    async fn find_table(&self, document: &dyn Document) -> Result<Option<Element>, DocumentError> {
        let tables = document.query_all(None, &Query::tag("table")).await?;
        debug!("Scanning {} table element(s) for PERP data.", tables.len());

        for (idx, table) in tables.into_iter().enumerate() {
            let header_cells = document.query_all(Some(&table), &Query::tag("th")).await?;
            let mut headers = Vec::with_capacity(header_cells.len());
            for cell in &header_cells {
                headers.push(document.inner_text(cell).await?.trim().to_string());
            }

            let headers_upper = headers.join(" ").to_uppercase();
            if !headers_upper.is_empty()
                && self
                    .keywords
                    .iter()
                    .all(|keyword| headers_upper.contains(keyword.as_str()))
            {
                debug!("Using table #{} with headers: {:?}", idx, headers);
                return Ok(Some(table));
            }
        }

        Ok(None)
    }
}

/// Ordered list of table strategies.
#[derive(Debug)]
pub struct TableLocator {
    strategies: Vec<Box<dyn TableStrategy>>,
}

impl TableLocator {
    pub fn new(strategies: Vec<Box<dyn TableStrategy>>) -> Self {
        Self { strategies }
    }

    /// Try every strategy in order and return the first table found.
    ///
    /// A failing strategy never stops the search. When no table is found and
    /// some strategy failed, the last failure is returned so callers can
    /// report it.
    pub async fn locate(&self, document: &dyn Document) -> Result<Option<Element>, DocumentError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.find_table(document).await {
                Ok(Some(table)) => {
                    debug!("Table located via {} strategy", strategy.name());
                    return Ok(Some(table));
                }
                Ok(None) => debug!("No table matched the {} strategy", strategy.name()),
                Err(e) => {
                    warn!("Unable to resolve table via {}: {}", strategy.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

impl Default for TableLocator {
    /// Heading proximity first, header keywords as the fallback.
    fn default() -> Self {
        Self::new(vec![
            Box::new(HeadingProximity::default()),
            Box::new(HeaderKeywords::default()),
        ])
    }
}
