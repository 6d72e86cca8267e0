use std::collections::HashSet;

use anyhow::Result;
use tracing::{info, warn};

use crate::model::{CategoryCode, CompanyRecord, Listing};

/// Persistence the pipeline consumes. Identity is the organisation number.
pub trait Store: Send + Sync {
    fn known_ids(&self) -> Result<HashSet<String>>;
    fn upsert_companies(&self, records: &[CompanyRecord]) -> Result<usize>;
    fn recipients(&self) -> Result<Vec<String>>;
    fn category_codes(&self) -> Result<Vec<CategoryCode>>;
}

/// Listing fetched for one category code.
pub struct CodeListing {
    pub code: CategoryCode,
    pub listing: Listing,
}

#[derive(Debug, Default)]
pub struct Selection {
    /// Unseen companies tagged with their category, in input order.
    pub new_records: Vec<CompanyRecord>,
    /// Codes whose listing carried sample records that were withheld.
    pub skipped_codes: Vec<String>,
}

/// Keep only companies absent from `known`, each organisation number at most
/// once, tagged with the code that found it. Sample records are withheld
/// unless `include_samples`; live records of the same listing are kept.
/// Pure: same input, same output.
pub fn select_new(
    listings: &[CodeListing],
    known: &HashSet<String>,
    include_samples: bool,
) -> Selection {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selection = Selection::default();

    for CodeListing { code, listing } in listings {
        let withheld = if include_samples {
            0
        } else {
            listing.records.iter().filter(|r| r.sample).count()
        };
        if withheld > 0 {
            warn!("Code {}: ignoring {} sample record(s)", code.code, withheld);
            selection.skipped_codes.push(code.code.clone());
        }

        let before = selection.new_records.len();
        for record in &listing.records {
            if record.sample && !include_samples {
                continue;
            }
            let id = record.organization_id.as_str();
            if known.contains(id) || !seen.insert(id) {
                continue;
            }
            selection.new_records.push(record.clone().with_category(code));
        }
        info!(
            "Found {} new companies for {} ({} fetched)",
            selection.new_records.len() - before,
            code.code,
            listing.records.len()
        );
    }

    selection
}

/// Select unseen companies and upsert them in one batch. Returns the selection.
pub fn sync(
    store: &dyn Store,
    listings: &[CodeListing],
    known: &HashSet<String>,
    include_samples: bool,
) -> Result<Selection> {
    let selection = select_new(listings, known, include_samples);
    if !selection.new_records.is_empty() {
        let n = store.upsert_companies(&selection.new_records)?;
        info!("Saved {} new companies", n);
    }
    Ok(selection)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    fn code(c: &str) -> CategoryCode {
        CategoryCode {
            id: 1,
            code: c.to_string(),
            name: format!("Name {}", c),
        }
    }

    fn record(org: &str, sample: bool) -> CompanyRecord {
        CompanyRecord {
            sample,
            ..CompanyRecord::new(&format!("Company {} AB", org), org, "2025-07-01", "Lund, Skåne")
        }
    }

    fn listing(orgs: &[&str], degraded: bool) -> Listing {
        Listing {
            records: orgs.iter().map(|o| record(o, degraded)).collect(),
            degraded,
            pages: Vec::new(),
        }
    }

    fn known(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn drops_known_and_tags_category() {
        let input = vec![CodeListing {
            code: code("A"),
            listing: listing(&["1", "2", "3"], false),
        }];
        let sel = select_new(&input, &known(&["2"]), false);
        let orgs: Vec<&str> = sel.new_records.iter().map(|r| r.organization_id.as_str()).collect();
        assert_eq!(orgs, vec!["1", "3"]);
        assert!(sel.new_records.iter().all(|r| r.category_code.as_deref() == Some("A")));
        assert_eq!(sel.new_records[0].category_name.as_deref(), Some("Name A"));
    }

    #[test]
    fn repeated_selection_is_identical() {
        let input = vec![
            CodeListing { code: code("A"), listing: listing(&["1", "2"], false) },
            CodeListing { code: code("B"), listing: listing(&["3"], false) },
        ];
        let k = known(&["1"]);
        let first = select_new(&input, &k, false).new_records;
        let second = select_new(&input, &k, false).new_records;
        assert_eq!(first, second);
    }

    #[test]
    fn ids_are_unique_across_codes_and_pages() {
        let input = vec![
            CodeListing { code: code("A"), listing: listing(&["1", "2", "1"], false) },
            CodeListing { code: code("B"), listing: listing(&["2", "3"], false) },
        ];
        let sel = select_new(&input, &HashSet::new(), false);
        let orgs: Vec<&str> = sel.new_records.iter().map(|r| r.organization_id.as_str()).collect();
        assert_eq!(orgs, vec!["1", "2", "3"]);
        // First code to report a company owns it
        assert_eq!(sel.new_records[1].category_code.as_deref(), Some("A"));
    }

    #[test]
    fn degraded_listings_are_skipped_unless_asked() {
        let input = vec![
            CodeListing { code: code("A"), listing: listing(&["1"], true) },
            CodeListing { code: code("B"), listing: listing(&["2"], false) },
        ];
        let sel = select_new(&input, &HashSet::new(), false);
        assert_eq!(sel.skipped_codes, vec!["A"]);
        assert_eq!(sel.new_records.len(), 1);

        let sel = select_new(&input, &HashSet::new(), true);
        assert!(sel.skipped_codes.is_empty());
        assert_eq!(sel.new_records.len(), 2);
    }

    #[test]
    fn live_records_survive_a_partial_outage() {
        let input = vec![CodeListing {
            code: code("A"),
            listing: Listing {
                records: vec![record("777", false), record("123456789", true), record("234567890", true)],
                degraded: true,
                pages: Vec::new(),
            },
        }];
        let sel = select_new(&input, &HashSet::new(), false);
        let orgs: Vec<&str> = sel.new_records.iter().map(|r| r.organization_id.as_str()).collect();
        assert_eq!(orgs, vec!["777"]);
        assert_eq!(sel.skipped_codes, vec!["A"]);

        let sel = select_new(&input, &HashSet::new(), true);
        assert_eq!(sel.new_records.len(), 3);
    }

    #[test]
    fn synced_companies_are_known_next_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("r.sqlite")).unwrap();
        let input = vec![CodeListing { code: code("A"), listing: listing(&["1", "2"], false) }];

        let first = sync(&store, &input, &store.known_ids().unwrap(), false).unwrap();
        assert_eq!(first.new_records.len(), 2);

        let second = sync(&store, &input, &store.known_ids().unwrap(), false).unwrap();
        assert!(second.new_records.is_empty());
    }
}
