pub mod extract;
pub mod rows;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::model::{ParseOutcome, SourceFormat};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Where listing links point and which region names a company's location.
#[derive(Debug, Clone)]
pub struct Site {
    pub origin: String,
    pub region: String,
}

/// Parse one listing page body, JSON array or rendered HTML, into records.
///
/// An empty page is a normal outcome, never an error.
pub fn parse_listing(body: &str, page: u32, site: &Site) -> ParseOutcome {
    if let Some(items) = json_array(body) {
        let records: Vec<_> = items.iter().filter_map(extract::json::extract).collect();
        info!(
            "Page {}: {} companies from JSON ({} items)",
            page,
            records.len(),
            items.len()
        );
        return ParseOutcome {
            records,
            source_format: SourceFormat::Json,
        };
    }

    if rows::has_row_markers(body) {
        let fragments = rows::split_rows(body);
        let records: Vec<_> = fragments
            .iter()
            .filter_map(|f| extract::html::extract(f, site))
            .collect();
        info!(
            "Page {}: {} companies from HTML ({} rows)",
            page,
            records.len(),
            fragments.len()
        );
        return ParseOutcome {
            records,
            source_format: SourceFormat::Html,
        };
    }

    debug!("Page {}: unrecognized body ({} bytes)", page, body.len());
    ParseOutcome::unrecognized()
}

/// A page has real data when at least one row carries a complete company
/// (name, organisation number, registration date), whatever its entity type.
pub fn has_real_data(body: &str) -> bool {
    if let Some(items) = json_array(body) {
        return items.iter().any(|i| extract::json::extract(i).is_some());
    }
    rows::split_rows(body)
        .into_iter()
        .any(extract::html::is_complete)
}

fn json_array(body: &str) -> Option<Vec<Value>> {
    if !body.trim_start().starts_with('[') {
        return None;
    }
    serde_json::from_str::<Vec<Value>>(body).ok()
}

/// Decode the handful of entities the registry emits in text nodes.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Drop markup and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

// ── Tests ──
