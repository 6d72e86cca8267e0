use serde_json::Value;

use crate::model::CompanyRecord;

/// Build a record from one element of a JSON listing. Rows missing any of
/// `displayName`, `location.municipality`, `location.county`,
/// `foundationDate` or `orgnr` are skipped.
pub fn extract(item: &Value) -> Option<CompanyRecord> {
    let name = text(item.get("displayName"))?;
    let location = item.get("location")?;
    let municipality = text(location.get("municipality"))?;
    let county = text(location.get("county"))?;
    let founded_date = text(item.get("foundationDate"))?;
    let organization_id = text(item.get("orgnr"))?;

    Some(CompanyRecord::new(
        &name,
        &organization_id,
        &founded_date,
        &format!("{}, {}", municipality, county),
    ))
}

/// Non-empty string, or a number rendered as one (org numbers sometimes arrive unquoted).
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
