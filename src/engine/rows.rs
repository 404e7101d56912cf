//! Row extraction from a located table.

use crate::document::{Document, DocumentError, Element, Query};
use crate::domain::RawRow;

/// Row selections in preference order: body rows, any rows, ARIA rows.
pub fn row_queries() -> [Query; 3] {
    [
        Query::nested("tbody", "tr"),
        Query::tag("tr"),
        Query::role("row"),
    ]
}

/// Cell selections in preference order: data cells, then ARIA cells.
fn cell_queries() -> [Query; 2] {
    [Query::tag("td"), Query::role("cell")]
}

/// Row count under the first row selection that matches anything.
///
/// A selection whose query fails counts as empty; if every selection came up
/// empty and one of them failed, that failure is returned.
pub async fn count_rows(document: &dyn Document, table: &Element) -> Result<usize, DocumentError> {
    let mut last_error = None;
    for query in row_queries() {
        match document.count(Some(table), &query).await {
            Ok(count) if count > 0 => return Ok(count),
            Ok(_) => {}
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(0),
    }
}

/// Extract the cell texts of every data row in `table`.
///
/// Uses the first row selection that produces at least one row with cells;
/// rows without cells (e.g. header rows made of `th`) are skipped. Selections
/// are never merged. An empty result is not an error.
pub async fn collect_rows(
    document: &dyn Document,
    table: &Element,
) -> Result<Vec<RawRow>, DocumentError> {
    for query in row_queries() {
        let row_elements = document.query_all(Some(table), &query).await?;
        if row_elements.is_empty() {
            continue;
        }

        let mut rows = Vec::with_capacity(row_elements.len());
        for row in &row_elements {
            let cells = row_cells(document, row).await?;
            if cells.is_empty() {
                continue;
            }

            let mut texts = Vec::with_capacity(cells.len());
            for cell in &cells {
                texts.push(document.inner_text(cell).await?.trim().to_string());
            }
            rows.push(RawRow::new(texts));
        }

        if !rows.is_empty() {
            return Ok(rows);
        }
    }

    Ok(Vec::new())
}

async fn row_cells(document: &dyn Document, row: &Element) -> Result<Vec<Element>, DocumentError> {
    for query in cell_queries() {
        let cells = document.query_all(Some(row), &query).await?;
        if !cells.is_empty() {
            return Ok(cells);
        }
    }
    Ok(Vec::new())
}
