use crate::model::CompanyRecord;

pub const PAGE_SIZE: usize = 8;

// (name, organisation number, founded, location)
const SAMPLE: &[(&str, &str, &str, &str)] = &[
    ("Tim Scharinger", "123456789", "2025-07-25", "Lund, Skåne"),
    ("Johan Engdahl", "234567890", "2025-07-18", "Vellinge, Skåne"),
    ("F.W.S. i Helsingborg AB", "345678901", "2025-07-01", "Helsingborg, Skåne"),
    ("André Ekberg", "456789012", "2025-06-27", "Fjälkinge, Skåne"),
    ("Samra Osmancevic", "567890123", "2025-06-19", "Bunkeflostrand, Skåne"),
    ("Pham IT", "678901234", "2025-06-17", "Malmö, Skåne"),
    ("Elias Fambri", "789012345", "2025-06-13", "Malmö, Skåne"),
    ("Amjad Al Shayeb", "890123456", "2025-06-13", "Landskrona, Skåne"),
    ("Nordic Solutions AB", "901234567", "2025-06-10", "Malmö, Skåne"),
    ("Skåne Tech Innovation", "012345678", "2025-06-08", "Lund, Skåne"),
    ("Green Energy Consulting", "111222333", "2025-06-05", "Helsingborg, Skåne"),
    ("Digital Marketing Pro", "222333444", "2025-06-01", "Malmö, Skåne"),
    ("Construction Solutions", "333444555", "2025-05-28", "Vellinge, Skåne"),
    ("Food Delivery Express", "444555666", "2025-05-25", "Lund, Skåne"),
    ("Health Care Services", "555666777", "2025-05-20", "Landskrona, Skåne"),
    ("Transport & Logistics", "666777888", "2025-05-15", "Helsingborg, Skåne"),
];

/// Built-in sample records for `page` (1-based), `PAGE_SIZE` per page.
/// Pages past the end of the dataset are empty.
pub fn sample_page(page: u32) -> Vec<CompanyRecord> {
    let start = (page.max(1) as usize - 1) * PAGE_SIZE;
    SAMPLE
        .iter()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|(name, org, founded, location)| CompanyRecord {
            sample: true,
            ..CompanyRecord::new(name, org, founded, location)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_slice_the_dataset() {
        let p1 = sample_page(1);
        let p2 = sample_page(2);
        assert_eq!(p1.len(), PAGE_SIZE);
        assert_eq!(p2.len(), PAGE_SIZE);
        assert_eq!(p1[0].organization_id, "123456789");
        assert_eq!(p2[0].name, "Nordic Solutions AB");
        assert!(sample_page(3).is_empty());
        assert!(p1.iter().chain(&p2).all(|r| r.sample));
    }

    #[test]
    fn page_zero_is_page_one() {
        assert_eq!(sample_page(0), sample_page(1));
    }
}
