use crate::CanonicalRecord;
use tabled::settings::{object::Columns, Modify, Style, Width};
use tabled::{Table, Tabled};

#[derive(Tabled)]
pub struct RecordTableRow {
    #[tabled(rename = "Listing")]
    pub listing: String,
    #[tabled(rename = "Platform")]
    pub platform: String,
    #[tabled(rename = "Price", display_with = "display_right_10")]
    pub price: String,
    #[tabled(rename = "Beds", display_with = "display_right_4")]
    pub beds: String,
    #[tabled(rename = "Baths", display_with = "display_right_5")]
    pub baths: String,
    #[tabled(rename = "Sq Ft", display_with = "display_right_6")]
    pub area: String,
    #[tabled(rename = "$/Sq Ft", display_with = "display_right_8")]
    pub price_per_area: String,
    #[tabled(rename = "Address")]
    pub address: String,
}

fn display_right_4(s: &str) -> String {
    format!("{:>4}", s)
}

fn display_right_5(s: &str) -> String {
    format!("{:>5}", s)
}

fn display_right_6(s: &str) -> String {
    format!("{:>6}", s)
}

fn display_right_8(s: &str) -> String {
    format!("{:>8}", s)
}

fn display_right_10(s: &str) -> String {
    format!("{:>10}", s)
}

impl RecordTableRow {
    pub fn from_record(record: &CanonicalRecord) -> Self {
        let price_str = record
            .list_price
            .map(|p| format!("${}k", (p / 1000.0).round() as i64))
            .unwrap_or_else(|| "N/A".to_string());

        let beds_str = record
            .bedroom_count
            .map(|b| format!("{}", b))
            .unwrap_or_else(|| "N/A".to_string());

        let baths_str = record
            .bathroom_count
            .map(|b| format!("{}", b))
            .unwrap_or_else(|| "N/A".to_string());

        let area_str = record
            .interior_area
            .map(|a| a.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let per_area_str = record
            .price_per_area
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "N/A".to_string());

        let address = [
            record.address.street.as_deref(),
            record.address.city.as_deref(),
            record.address.region.as_deref(),
        ]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            listing: record.listing_id.clone(),
            platform: record.source_platform.to_string(),
            price: price_str,
            beds: beds_str,
            baths: baths_str,
            area: area_str,
            price_per_area: per_area_str,
            address,
        }
    }
}

pub fn create_record_table(records: &[CanonicalRecord]) -> String {
    let rows: Vec<RecordTableRow> = records.iter().map(RecordTableRow::from_record).collect();

    let mut table = Table::new(&rows);
    table
        .with(Style::modern())
        .with(Modify::new(Columns::single(0)).with(Width::truncate(18)))
        .with(Modify::new(Columns::single(7)).with(Width::wrap(48)));

    table.to_string()
}
