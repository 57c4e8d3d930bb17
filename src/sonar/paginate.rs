//! Page accumulation over SonarQube search endpoints
//!
//! Search endpoints take `p` (1-based page) and `ps` (page size) and
//! report `paging.total`. We keep requesting pages until one of three
//! things happens: a page comes back empty, we hold at least the
//! reported total, or we hit the item cap.

use super::client::JsonSource;
use serde_json::Value;
use tracing::debug;

/// Largest page size SonarQube accepts
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Hard cap on items accumulated per collection
pub const DEFAULT_MAX_ITEMS: usize = 5000;

/// Items accumulated across pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    /// Last `paging.total` the server reported, if any
    pub total_reported: Option<u64>,
}

/// Append paging parameters to a path that may already carry a query.
fn paged_path(path: &str, page: usize, page_size: usize) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{}{}p={}&ps={}", path, sep, page, page_size)
}

/// `paging.total`, falling back to the top-level `total` older servers send.
fn reported_total(body: &Value) -> Option<u64> {
    body.get("paging")
        .and_then(|p| p.get("total"))
        .and_then(Value::as_u64)
        .or_else(|| body.get("total").and_then(Value::as_u64))
}

/// Fetch every page of `path`, collecting the array under `items_field`.
///
/// Returns `None` only when the very first request fails. A failure on a
/// later page keeps what was already collected. The result never holds
/// more than `max_items` entries.
pub fn fetch_all_pages(
    source: &dyn JsonSource,
    path: &str,
    items_field: &str,
    page_size: usize,
    max_items: usize,
) -> Option<Page> {
    let mut items: Vec<Value> = Vec::new();
    let mut total_reported: Option<u64> = None;
    let mut fetched_any = false;
    let mut page = 1;

    loop {
        let Some(body) = source.get_json(&paged_path(path, page, page_size)) else {
            break;
        };
        fetched_any = true;

        let batch = body
            .get(items_field)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let batch_len = batch.len();
        items.extend(batch);
        if let Some(total) = reported_total(&body) {
            total_reported = Some(total);
        }

        debug!(
            "{} page {}: {} items ({} accumulated, total {:?})",
            path,
            page,
            batch_len,
            items.len(),
            total_reported
        );

        let done = batch_len == 0
            || total_reported.is_some_and(|total| items.len() as u64 >= total)
            || items.len() >= max_items;
        if done {
            break;
        }
        page += 1;
    }

    if !fetched_any {
        return None;
    }

    items.truncate(max_items);
    Some(Page {
        items,
        total_reported,
    })
}
