use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{capitalize, is_business_name};
use crate::model::CompanyRecord;
use crate::parser::{decode_entities, Site};

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(/foretag/[^"]*)"[^>]*>([^<]+)</a>"#).unwrap());
static ORG_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="/foretag/[^/"]*/[^/"]*/[^/"]*/(\d+)""#).unwrap());
static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="/foretag/[^/"]*/([^/"]*)/"#).unwrap());
static FOUNDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Registrerad[^>]*>\s*<span[^>]*>(\d{4}-\d{2}-\d{2})</span>").unwrap()
});

/// Build a record from one listing row. Any missing mandatory field, or a
/// name failing the business-name filter, drops the whole row.
pub fn extract(fragment: &str, site: &Site) -> Option<CompanyRecord> {
    let anchor = ANCHOR_RE.captures(fragment)?;
    let detail_path = &anchor[1];
    let name = decode_entities(anchor[2].trim());
    if name.is_empty() {
        return None;
    }

    if !is_business_name(&name) {
        debug!("Skipping {} - not an AB/Aktiebolag name", name);
        return None;
    }

    let Some(organization_id) = organization_id(fragment) else {
        debug!("No organisation number for {}", name);
        return None;
    };

    let location = location(fragment, &site.region);

    let Some(founded_date) = founded_date(fragment) else {
        debug!("No registration date for {}", name);
        return None;
    };

    let mut record = CompanyRecord::new(&name, organization_id, founded_date, &location);
    record.detail_url = Some(format!("{}{}", site.origin.trim_end_matches('/'), detail_path));
    Some(record)
}

/// Name, organisation number and registration date are all present.
/// The business-name filter is deliberately not applied.
pub fn is_complete(fragment: &str) -> bool {
    ANCHOR_RE.is_match(fragment)
        && organization_id(fragment).is_some()
        && founded_date(fragment).is_some()
}

fn organization_id(fragment: &str) -> Option<&str> {
    ORG_ID_RE
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn founded_date(fragment: &str) -> Option<&str> {
    FOUNDED_RE
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `"<Municipality>, <region>"` from the detail path, or just the region.
fn location(fragment: &str, region: &str) -> String {
    let segment = LOCATION_RE
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");
    if segment.is_empty() {
        return region.to_string();
    }
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    format!("{}, {}", capitalize(&decoded), region)
}
