//! # Daily Log Table
//!
//! Shapes daily logs for the overview table: dates are shown as
//! `dd/mm/yyyy`, rows can be narrowed to those whose displayed value in one
//! column equals a chosen value, and the visible columns can be projected.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use shared::{DailyLogFields, DailyLogTableResponse, RecordListResponse, DAILY_LOG_TIMESTAMP_FORMAT};

use crate::error::{CareError, CareResult};

/// Every column of the daily log table, in display order
pub const DAILY_LOG_COLUMNS: &[&str] = &[
    "id",
    "data",
    "temperatura",
    "saturacao",
    "frequencia_cardiaca",
    "pressao",
    "sono",
    "observacao",
    "observacao_geral",
    "evacuacoes",
    "aspecto_fezes",
    "diurese",
    "aspecto_urina",
    "cuidador",
];

const DATE_COLUMN: &str = "data";
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Filter and projection requested by the table view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyLogTableQuery {
    pub column: Option<String>,
    pub value: Option<String>,
    /// Visible columns; all of them when empty
    pub columns: Vec<String>,
}

#[derive(Clone, Default)]
pub struct DailyLogTableService;

impl DailyLogTableService {
    pub fn new() -> Self {
        Self
    }

    pub fn build_table(
        &self,
        listing: RecordListResponse<DailyLogFields>,
        query: &DailyLogTableQuery,
    ) -> CareResult<DailyLogTableResponse> {
        let columns = self.visible_columns(query)?;
        let filter = self.filter(query)?;

        let mut rows = Vec::with_capacity(listing.records.len());
        for record in listing.records {
            let Value::Object(mut row) = serde_json::to_value(&record)? else {
                continue;
            };
            if let Some(Value::String(date)) = row.get(DATE_COLUMN) {
                let display = display_date(date);
                row.insert(DATE_COLUMN.to_string(), Value::String(display));
            }

            if let Some((column, value)) = &filter {
                if cell_text(row.get(column.as_str())) != *value {
                    continue;
                }
            }

            rows.push(project(row, &columns));
        }

        Ok(DailyLogTableResponse {
            columns,
            rows,
            error: listing.error,
        })
    }

    fn visible_columns(&self, query: &DailyLogTableQuery) -> CareResult<Vec<String>> {
        if query.columns.is_empty() {
            return Ok(DAILY_LOG_COLUMNS.iter().map(|c| c.to_string()).collect());
        }
        for column in &query.columns {
            if !DAILY_LOG_COLUMNS.contains(&column.as_str()) {
                return Err(CareError::validation("columns", format!("unknown column '{}'", column)));
            }
        }
        // Keep display order regardless of request order
        Ok(DAILY_LOG_COLUMNS
            .iter()
            .filter(|c| query.columns.iter().any(|requested| requested == *c))
            .map(|c| c.to_string())
            .collect())
    }

    fn filter(&self, query: &DailyLogTableQuery) -> CareResult<Option<(String, String)>> {
        let Some(column) = query.column.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        if column == "id" {
            return Err(CareError::validation("column", "filtering by id is not supported"));
        }
        if !DAILY_LOG_COLUMNS.contains(&column) {
            return Err(CareError::validation("column", format!("unknown column '{}'", column)));
        }
        let value = query
            .value
            .clone()
            .ok_or_else(|| CareError::validation("value", "is required when filtering"))?;
        Ok(Some((column.to_string(), value)))
    }
}

/// Date part of a stored timestamp as dd/mm/yyyy. Timestamps in an
/// unrecognised format are shown unchanged.
pub fn display_date(stored: &str) -> String {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(stored, DAILY_LOG_TIMESTAMP_FORMAT) {
        return parsed.format(DISPLAY_DATE_FORMAT).to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(stored) {
        return parsed.format(DISPLAY_DATE_FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(stored, "%Y-%m-%d") {
        return parsed.format(DISPLAY_DATE_FORMAT).to_string();
    }
    stored.to_string()
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn project(mut row: Map<String, Value>, columns: &[String]) -> Map<String, Value> {
    columns
        .iter()
        .map(|column| {
            let value = row.remove(column).unwrap_or(Value::Null);
            (column.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Record, SleepDuration};

    fn log(id: i64, timestamp: &str, temperature: f64, caregiver: &str) -> Record<DailyLogFields> {
        Record {
            id,
            fields: DailyLogFields {
                timestamp: timestamp.to_string(),
                temperature,
                oxygen_saturation: None,
                heart_rate: None,
                blood_pressure: "120x80".to_string(),
                sleep: SleepDuration::parse("8h").unwrap(),
                behavior_notes: String::new(),
                shift_notes: String::new(),
                bowel_movements: None,
                stool_character: None,
                urinations: None,
                urine_appearance: None,
                caregiver: caregiver.to_string(),
            },
        }
    }

    fn listing() -> RecordListResponse<DailyLogFields> {
        RecordListResponse {
            records: vec![
                log(1, "01-03-2025 08:00:00", 36.5, "Ana"),
                log(2, "02-03-2025 08:00:00", 37.2, "Bia"),
                log(3, "02-03-2025 20:00:00", 36.8, "Ana"),
            ],
            error: None,
        }
    }

    #[test]
    fn test_dates_are_formatted_for_display() {
        let table = DailyLogTableService::new()
            .build_table(listing(), &DailyLogTableQuery::default())
            .unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0]["data"], "01/03/2025");
        assert_eq!(table.columns.len(), DAILY_LOG_COLUMNS.len());
        assert_eq!(table.rows[0]["saturacao"], Value::Null);
    }

    #[test]
    fn test_filter_by_caregiver_and_by_display_date() {
        let service = DailyLogTableService::new();
        let by_caregiver = DailyLogTableQuery {
            column: Some("cuidador".to_string()),
            value: Some("Ana".to_string()),
            columns: vec![],
        };
        let table = service.build_table(listing(), &by_caregiver).unwrap();
        let ids: Vec<_> = table.rows.iter().map(|row| row["id"].clone()).collect();
        assert_eq!(ids, vec![Value::from(1), Value::from(3)]);

        let by_date = DailyLogTableQuery {
            column: Some("data".to_string()),
            value: Some("02/03/2025".to_string()),
            columns: vec![],
        };
        assert_eq!(service.build_table(listing(), &by_date).unwrap().rows.len(), 2);

        let by_temperature = DailyLogTableQuery {
            column: Some("temperatura".to_string()),
            value: Some("37.2".to_string()),
            columns: vec![],
        };
        assert_eq!(service.build_table(listing(), &by_temperature).unwrap().rows.len(), 1);
    }

    #[test]
    fn test_projection_keeps_display_order() {
        let query = DailyLogTableQuery {
            columns: vec!["cuidador".to_string(), "data".to_string()],
            ..Default::default()
        };
        let table = DailyLogTableService::new().build_table(listing(), &query).unwrap();
        assert_eq!(table.columns, vec!["data", "cuidador"]);
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_rejects_bad_queries() {
        let service = DailyLogTableService::new();
        for query in [
            DailyLogTableQuery {
                column: Some("id".to_string()),
                value: Some("1".to_string()),
                columns: vec![],
            },
            DailyLogTableQuery {
                column: Some("paciente".to_string()),
                value: Some("x".to_string()),
                columns: vec![],
            },
            DailyLogTableQuery {
                column: Some("cuidador".to_string()),
                value: None,
                columns: vec![],
            },
            DailyLogTableQuery {
                columns: vec!["senha".to_string()],
                ..Default::default()
            },
        ] {
            assert!(service.build_table(listing(), &query).is_err(), "{:?}", query);
        }
    }

    #[test]
    fn test_listing_error_is_carried_through() {
        let failed = RecordListResponse {
            records: vec![],
            error: Some("Failed to load 'registros_diarios'".to_string()),
        };
        let table = DailyLogTableService::new()
            .build_table(failed, &DailyLogTableQuery::default())
            .unwrap();
        assert!(table.rows.is_empty());
        assert!(table.error.is_some());
    }

    #[test]
    fn test_display_date_fallbacks() {
        assert_eq!(display_date("2025-03-01T10:00:00+00:00"), "01/03/2025");
        assert_eq!(display_date("2025-03-01"), "01/03/2025");
        assert_eq!(display_date("ontem"), "ontem");
    }
}
