use std::sync::LazyLock;

use regex::Regex;

use crate::model::Enrichment;
use crate::parser::{decode_entities, strip_tags};

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Verksamhet\s*(?:&amp;|&)\s*ändamål\s*</[^>]+>(.*?)</(?:p|div|section|dd)>")
        .unwrap()
});
static CEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Verkställande direktör\s*</[^>]+>\s*(?:<[^>/][^>]*>\s*)*([^<]+)<").unwrap()
});
static SNI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)SNI-kod\s*</[^>]+>\s*(?:<[^>/][^>]*>\s*)*([^<]+)<").unwrap()
});

const MIN_DESCRIPTION_LEN: usize = 20;
const MIN_CEO_LEN: usize = 3;

/// Pull the optional detail-page fields. Missing sections leave their field empty.
pub fn extract(html: &str) -> Enrichment {
    let description = DESCRIPTION_RE
        .captures(html)
        .map(|c| decode_entities(&strip_tags(&c[1])))
        .filter(|d| d.chars().count() >= MIN_DESCRIPTION_LEN);

    let ceo = CEO_RE
        .captures(html)
        .map(|c| decode_entities(c[1].trim()))
        .filter(|n| n.chars().count() >= MIN_CEO_LEN);

    let codes: Vec<String> = SNI_RE
        .captures_iter(html)
        .map(|c| decode_entities(c[1].trim()))
        .filter(|c| !c.is_empty())
        .collect();
    let classification_codes = if codes.is_empty() {
        None
    } else {
        Some(codes.join(", "))
    };

    Enrichment {
        description,
        ceo,
        classification_codes,
    }
}
