//! SonarQube Web API access
//!
//! - [`SonarClient`] issues authenticated GETs (sync, via ureq)
//! - [`fetch_all_pages`] walks `p`/`ps` paged search endpoints
//! - `api` turns responses into [`crate::models`] types
//!
//! Every fetch returns `Option`: absence means "data unavailable" and the
//! caller decides whether that is fatal.

pub mod api;
mod client;
mod paginate;

pub use api::{
    fetch_hotspots, fetch_issues, fetch_measures, fetch_quality_gate, parse_effort,
    server_status, HotspotSet, IssueSet,
};
pub use client::{basic_auth_header, JsonSource, SonarClient, REQUEST_TIMEOUT_SECS};
pub use paginate::{fetch_all_pages, Page, DEFAULT_MAX_ITEMS, DEFAULT_PAGE_SIZE};
