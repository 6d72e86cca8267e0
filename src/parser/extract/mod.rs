pub mod detail;
pub mod html;
pub mod json;

/// Entity-suffix heuristic: literal, case-sensitive substring match on
/// `"AB"` or `"Aktiebolag"`. `"CollAB Partners"` passes too.
pub fn is_business_name(name: &str) -> bool {
    name.contains("AB") || name.contains("Aktiebolag")
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rows::split_rows;
    use crate::parser::Site;

    fn site() -> Site {
        Site {
            origin: "https://www.allabolag.se".to_string(),
            region: "Skåne".to_string(),
        }
    }

    fn row(name: &str) -> String {
        format!(
            r#"<h2><a href="/foretag/x/malm%C3%B6/-/5591234567">{}</a></h2><span>Registrerad</span><span>2025-07-01</span>"#,
            name
        )
    }

    #[test]
    fn name_filter_drops_private_names() {
        assert!(html::extract(&row("Svensson Konsult"), &site()).is_none());
        let kept = html::extract(&row("Nordic AB"), &site());
        assert_eq!(kept.map(|r| r.name), Some("Nordic AB".to_string()));
    }

    #[test]
    fn name_filter_is_literal_substring() {
        assert!(is_business_name("CollAB Partners"));
        assert!(is_business_name("Bygg Aktiebolag"));
        assert!(!is_business_name("Labb Konsult"));
        assert!(!is_business_name("nordic ab"));
    }

    #[test]
    fn html_row_fields() {
        let r = html::extract(&row("Nordic AB"), &site()).unwrap();
        assert_eq!(r.organization_id, "5591234567");
        assert_eq!(r.founded_date, "2025-07-01");
        assert_eq!(r.location, "Malmö, Skåne");
        assert_eq!(
            r.detail_url.as_deref(),
            Some("https://www.allabolag.se/foretag/x/malm%C3%B6/-/5591234567")
        );
        assert!(r.category_code.is_none());
    }

    #[test]
    fn fixture_listing_rows() {
        let doc = std::fs::read_to_string("tests/fixtures/listing.html").unwrap();
        let records: Vec<_> = split_rows(&doc)
            .into_iter()
            .filter_map(|f| html::extract(f, &site()))
            .collect();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Nordic Solutions AB", "Byggbolaget Aktiebolag", "Tom & Jerry AB"]
        );
        // Nested tag list inside the first row must not cut off its date
        assert_eq!(records[0].founded_date, "2025-07-01");
        assert_eq!(records[1].location, "Lund, Skåne");
        // Empty municipality segment falls back to the region
        assert_eq!(records[2].location, "Skåne");
    }

    #[test]
    fn completeness_ignores_name_filter() {
        assert!(html::is_complete(&row("Svensson Konsult")));
        assert!(!html::is_complete(r#"<a href="/foretag/x/y/-/123">A AB</a>"#));
    }

    #[test]
    fn json_row_requires_all_fields() {
        let ok = serde_json::json!({
            "displayName": "Nordic AB",
            "orgnr": "5591234567",
            "foundationDate": "2025-07-01",
            "location": { "municipality": "Malmö", "county": "Skåne" }
        });
        let r = json::extract(&ok).unwrap();
        assert_eq!(r.location, "Malmö, Skåne");
        assert!(r.detail_url.is_none());

        let missing_county = serde_json::json!({
            "displayName": "Nordic AB",
            "orgnr": "5591234567",
            "foundationDate": "2025-07-01",
            "location": { "municipality": "Malmö" }
        });
        assert!(json::extract(&missing_county).is_none());

        let blank_name = serde_json::json!({
            "displayName": "  ",
            "orgnr": 5591234567u64,
            "foundationDate": "2025-07-01",
            "location": { "municipality": "Malmö", "county": "Skåne" }
        });
        assert!(json::extract(&blank_name).is_none());
    }

    #[test]
    fn json_numeric_orgnr() {
        let item = serde_json::json!({
            "displayName": "Nordic AB",
            "orgnr": 5591234567u64,
            "foundationDate": "2025-07-01",
            "location": { "municipality": "Malmö", "county": "Skåne" }
        });
        assert_eq!(json::extract(&item).unwrap().organization_id, "5591234567");
    }

    #[test]
    fn detail_fixture() {
        let doc = std::fs::read_to_string("tests/fixtures/detail.html").unwrap();
        let e = detail::extract(&doc);
        assert_eq!(
            e.description.as_deref(),
            Some("Bolaget ska bedriva konsultverksamhet inom IT och därmed förenlig verksamhet.")
        );
        assert_eq!(e.ceo.as_deref(), Some("Anna Nordin"));
        assert_eq!(
            e.classification_codes.as_deref(),
            Some("62010 Dataprogrammering, 62020 Datakonsultverksamhet")
        );
    }

    #[test]
    fn detail_noise_is_discarded() {
        let doc = "<h3>Verksamhet &amp; ändamål</h3><p>Kort.</p><dt>Verkställande direktör</dt><dd>Al</dd>";
        let e = detail::extract(doc);
        assert!(e.description.is_none());
        assert!(e.ceo.is_none());
        assert!(e.classification_codes.is_none());
        assert!(e.is_empty());
    }

    #[test]
    fn capitalize_unicode() {
        assert_eq!(capitalize("örkelljunga"), "Örkelljunga");
        assert_eq!(capitalize(""), "");
    }
}
