use std::sync::LazyLock;

use regex::Regex;

static ROW_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<li class="MuiListItem-root[^"]*"[^>]*>"#).unwrap());
static LIST_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)(li|ul|ol)\b[^>]*>").unwrap());

/// Does the document contain at least one listing row opener?
pub fn has_row_markers(html: &str) -> bool {
    ROW_OPEN_RE.is_match(html)
}

/// Split a listing document into the inner HTML of each row, in document order.
///
/// Lists nested inside a row are tracked by their `<ul>`/`<ol>` tags, so their
/// items may omit `</li>`. A row ends at its own `</li>`, or implicitly at the
/// next sibling `<li>` or the close of the enclosing list. A row still open at
/// the end of the document is dropped.
pub fn split_rows(html: &str) -> Vec<&str> {
    let mut rows = Vec::new();
    let mut pos = 0;

    while let Some(open) = ROW_OPEN_RE.find_at(html, pos) {
        let inner_start = open.end();
        match row_end(html, inner_start) {
            Some((inner_end, next)) => {
                rows.push(&html[inner_start..inner_end]);
                pos = next;
            }
            None => break,
        }
    }

    rows
}

/// End of the row body starting at `from`: (body end, scan resume position).
fn row_end(html: &str, from: usize) -> Option<(usize, usize)> {
    let mut nested_lists = 0usize;

    for caps in LIST_TAG_RE.captures_iter(&html[from..]) {
        let tag = caps.get(0)?;
        let closing = !caps[1].is_empty();
        let is_item = caps[2].eq_ignore_ascii_case("li");
        let (start, end) = (from + tag.start(), from + tag.end());

        match (closing, is_item) {
            (false, false) => nested_lists += 1,
            (true, false) if nested_lists > 0 => nested_lists -= 1,
            // Items of a nested list, closed or not, stay inside the row.
            (_, true) if nested_lists > 0 => {}
            (true, true) => return Some((start, end)),
            // Sibling item or end of the enclosing list.
            _ => return Some((start, start)),
        }
    }

    None
}

// ── Tests ──
