use serde::{Deserialize, Serialize};

/// One company discovered in the registry. `organization_id` is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub name: String,
    pub organization_id: String,
    /// `YYYY-MM-DD`, kept as an opaque token.
    pub founded_date: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_codes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Substituted from the built-in dataset rather than read from the registry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sample: bool,
}

impl CompanyRecord {
    pub fn new(name: &str, organization_id: &str, founded_date: &str, location: &str) -> Self {
        CompanyRecord {
            name: name.to_string(),
            organization_id: organization_id.to_string(),
            founded_date: founded_date.to_string(),
            location: location.to_string(),
            detail_url: None,
            description: None,
            ceo: None,
            classification_codes: None,
            category_code: None,
            category_name: None,
            sample: false,
        }
    }

    pub fn with_enrichment(mut self, e: Enrichment) -> Self {
        self.description = e.description;
        self.ceo = e.ceo;
        self.classification_codes = e.classification_codes;
        self
    }

    pub fn with_category(mut self, code: &CategoryCode) -> Self {
        self.category_code = Some(code.code.clone());
        self.category_name = Some(code.name.clone());
        self
    }
}

/// Registry filter owned by the store; opaque fetch parameter and grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCode {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Optional fields scraped from a company's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub description: Option<String>,
    pub ceo: Option<String>,
    pub classification_codes: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.ceo.is_none() && self.classification_codes.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceFormat {
    Json,
    Html,
    Unrecognized,
}

/// Result of parsing one listing page body.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub records: Vec<CompanyRecord>,
    pub source_format: SourceFormat,
}

impl ParseOutcome {
    pub fn unrecognized() -> Self {
        ParseOutcome {
            records: Vec::new(),
            source_format: SourceFormat::Unrecognized,
        }
    }
}

/// How a single page of a listing was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Live(SourceFormat),
    /// Transport failure; the page was replaced by sample records.
    FetchFailed,
    /// Reachable, but no page of the listing held live records; replaced by
    /// sample records.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: u32,
    pub source: PageSource,
    pub records: usize,
}

/// All records fetched for one category code across a page range.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub records: Vec<CompanyRecord>,
    /// True when any sample record from the built-in dataset was substituted.
    /// Which records are samples is carried on each record.
    pub degraded: bool,
    pub pages: Vec<PageReport>,
}
