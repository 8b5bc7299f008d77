//! Read-only projection of the order ledger into JSON, CSV, XML and YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyRecord {
    pub id: i32,
    pub username: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsRecord {
    pub pickup: String,
    pub dropoff: String,
    pub time: String,
    pub price: f64,
    pub distance_km: f64,
}

/// One order joined with both parties and its details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: i32,
    pub driver: Option<PartyRecord>,
    pub passenger: PartyRecord,
    pub details: DetailsRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Yaml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Xml,
        ExportFormat::Yaml,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Yaml => "yaml",
        }
    }
}

const CSV_HEADER: [&str; 12] = [
    "order_id",
    "driver_id",
    "driver_username",
    "driver_rating",
    "passenger_id",
    "passenger_username",
    "passenger_rating",
    "pickup",
    "dropoff",
    "time",
    "price",
    "distance_km",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    order_id: i32,
    driver_id: Option<i32>,
    driver_username: Option<&'a str>,
    driver_rating: Option<f64>,
    passenger_id: i32,
    passenger_username: &'a str,
    passenger_rating: f64,
    pickup: &'a str,
    dropoff: &'a str,
    time: &'a str,
    price: f64,
    distance_km: f64,
}

impl<'a> From<&'a OrderRecord> for CsvRow<'a> {
    fn from(record: &'a OrderRecord) -> Self {
        let driver = record.driver.as_ref();
        Self {
            order_id: record.order_id,
            driver_id: driver.map(|d| d.id),
            driver_username: driver.map(|d| d.username.as_str()),
            driver_rating: driver.map(|d| d.rating),
            passenger_id: record.passenger.id,
            passenger_username: &record.passenger.username,
            passenger_rating: record.passenger.rating,
            pickup: &record.details.pickup,
            dropoff: &record.details.dropoff,
            time: &record.details.time,
            price: record.details.price,
            distance_km: record.details.distance_km,
        }
    }
}

// quick-xml has no notion of null, so an unassigned driver is left out entirely.
#[derive(Serialize)]
struct XmlOrder<'a> {
    order_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    driver: Option<&'a PartyRecord>,
    passenger: &'a PartyRecord,
    details: &'a DetailsRecord,
}

#[derive(Serialize)]
struct XmlOrders<'a> {
    order: Vec<XmlOrder<'a>>,
}

pub fn render(records: &[OrderRecord], format: ExportFormat) -> AppResult<String> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(records)
            .map_err(|e| AppError::Export(format!("JSON: {}", e))),
        ExportFormat::Yaml => {
            serde_norway::to_string(records).map_err(|e| AppError::Export(format!("YAML: {}", e)))
        }
        ExportFormat::Csv => render_csv(records),
        ExportFormat::Xml => render_xml(records),
    }
}

fn render_csv(records: &[OrderRecord]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| AppError::Export(format!("CSV: {}", e)))?;
    for record in records {
        writer
            .serialize(CsvRow::from(record))
            .map_err(|e| AppError::Export(format!("CSV: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Export(format!("CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Export(format!("CSV: {}", e)))
}

fn render_xml(records: &[OrderRecord]) -> AppResult<String> {
    let document = XmlOrders {
        order: records
            .iter()
            .map(|record| XmlOrder {
                order_id: record.order_id,
                driver: record.driver.as_ref(),
                passenger: &record.passenger,
                details: &record.details,
            })
            .collect(),
    };

    let body = quick_xml::se::to_string_with_root("orders", &document)
        .map_err(|e| AppError::Export(format!("XML: {}", e)))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n", body))
}

/// Writes `orders.<ext>` for every format into `dir`, creating it if needed.
pub fn write_all(records: &[OrderRecord], dir: &Path) -> AppResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::Export(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let mut written = Vec::with_capacity(ExportFormat::ALL.len());
    for format in ExportFormat::ALL {
        let path = dir.join(format!("orders.{}", format.extension()));
        let contents = render(records, format)?;
        fs::write(&path, contents)
            .map_err(|e| AppError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), orders = records.len(), "export written");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<OrderRecord> {
        vec![
            OrderRecord {
                order_id: 1,
                driver: Some(PartyRecord {
                    id: 2,
                    username: "ivan".to_string(),
                    rating: 4.7,
                }),
                passenger: PartyRecord {
                    id: 3,
                    username: "pavel".to_string(),
                    rating: 2.8,
                },
                details: DetailsRecord {
                    pickup: "Osipenko St, 82".to_string(),
                    dropoff: "Nizhnevolzhskaya St, 19".to_string(),
                    time: "19:59".to_string(),
                    price: 427.0,
                    distance_km: 5.0,
                },
            },
            OrderRecord {
                order_id: 2,
                driver: None,
                passenger: PartyRecord {
                    id: 1,
                    username: "kira".to_string(),
                    rating: 4.3,
                },
                details: DetailsRecord {
                    pickup: "A & B".to_string(),
                    dropoff: "B".to_string(),
                    time: "10:00".to_string(),
                    price: 100.0,
                    distance_km: 1.5,
                },
            },
        ]
    }

    #[test]
    fn test_json_keeps_null_driver() {
        let json = render(&sample(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["order_id"], 1);
        assert_eq!(value[0]["driver"]["username"], "ivan");
        assert_eq!(value[0]["details"]["distance_km"], 5.0);
        assert!(value[1]["driver"].is_null());
    }

    #[test]
    fn test_csv_flattens_rows() {
        let csv = render(&sample(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("1,2,ivan,4.7,3,pavel,2.8,"));
        assert!(lines[2].starts_with("2,,,,1,kira,4.3,A & B,B,10:00,"));
    }

    #[test]
    fn test_csv_header_written_for_empty_ledger() {
        let csv = render(&[], ExportFormat::Csv).unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn test_xml_nests_orders_and_escapes_text() {
        let xml = render(&sample(), ExportFormat::Xml).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<orders>"));
        assert_eq!(xml.matches("<order>").count(), 2);
        assert_eq!(xml.matches("<driver>").count(), 1);
        assert!(xml.contains("<username>ivan</username>"));
        assert!(xml.contains("<pickup>A &amp; B</pickup>"));
    }

    #[test]
    fn test_yaml_round_trips() {
        let records = sample();
        let yaml = render(&records, ExportFormat::Yaml).unwrap();
        let parsed: Vec<OrderRecord> = serde_norway::from_str(&yaml).unwrap();

        assert_eq!(parsed, records);
    }

    #[test]
    fn test_write_all_creates_one_file_per_format() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");

        let paths = write_all(&sample(), &target).unwrap();

        assert_eq!(paths.len(), 4);
        for format in ExportFormat::ALL {
            let path = target.join(format!("orders.{}", format.extension()));
            assert!(path.is_file(), "missing {}", path.display());
        }
    }
}
