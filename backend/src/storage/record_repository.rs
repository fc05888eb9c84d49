//! # Record Repository
//!
//! Typed reads and writes against the four record collections. A repository
//! is bound to one caller's access token and is cheap to build, so handlers
//! construct one per request.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use shared::{
    CaregiverFields, DailyLogFields, MealFields, MedicationFields, Record, RecordId,
    RecordListResponse, TABLE_CAREGIVERS, TABLE_DAILY_LOGS, TABLE_MEALS, TABLE_MEDICATIONS,
};
use tracing::{debug, error, info, warn};

use crate::error::CareResult;
use crate::storage::traits::RemoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    DailyLogs,
    Caregivers,
    Medications,
    Meals,
}

impl RecordKind {
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::DailyLogs => TABLE_DAILY_LOGS,
            RecordKind::Caregivers => TABLE_CAREGIVERS,
            RecordKind::Medications => TABLE_MEDICATIONS,
            RecordKind::Meals => TABLE_MEALS,
        }
    }
}

/// Column set of one record kind
pub trait StoredFields: Serialize + DeserializeOwned + Send + Sync {
    const KIND: RecordKind;
}

impl StoredFields for DailyLogFields {
    const KIND: RecordKind = RecordKind::DailyLogs;
}

impl StoredFields for CaregiverFields {
    const KIND: RecordKind = RecordKind::Caregivers;
}

impl StoredFields for MedicationFields {
    const KIND: RecordKind = RecordKind::Medications;
}

impl StoredFields for MealFields {
    const KIND: RecordKind = RecordKind::Meals;
}

#[derive(Clone)]
pub struct RecordRepository {
    store: Arc<dyn RemoteStore>,
    access_token: Option<String>,
}

impl RecordRepository {
    pub fn new(store: Arc<dyn RemoteStore>, access_token: Option<String>) -> Self {
        Self {
            store,
            access_token,
        }
    }

    fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Every row of the collection for `T`.
    ///
    /// Never fails: a store error yields an empty listing with the message in
    /// `error`, so callers can keep rendering. Rows that do not decode are
    /// skipped and counted in `error`; the remaining rows are still returned.
    pub async fn list_all<T: StoredFields>(&self) -> RecordListResponse<T> {
        let table = T::KIND.table();
        debug!("Listing '{}'", table);

        let rows = match self.store.select_all(table, self.bearer()).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to load '{}': {}", table, e);
                return RecordListResponse {
                    records: Vec::new(),
                    error: Some(format!("Failed to load '{}': {}", table, e)),
                };
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = Vec::new();
        for row in rows {
            let id = row.get("id").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<Record<T>>(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping unreadable row {} in '{}': {}", id, table, e);
                    skipped.push(format!("row {}: {}", id, e));
                }
            }
        }

        info!("Loaded {} rows from '{}'", records.len(), table);
        let error = (!skipped.is_empty()).then(|| {
            format!(
                "Skipped {} unreadable row(s) in '{}': {}",
                skipped.len(),
                table,
                skipped.join("; ")
            )
        });
        RecordListResponse { records, error }
    }

    /// Insert `fields` and return the stored record with its generated id
    pub async fn insert<T: StoredFields>(&self, fields: &T) -> CareResult<Record<T>> {
        let table = T::KIND.table();
        let payload = serde_json::to_value(fields)?;

        let row = self.store.insert(table, payload, self.bearer()).await?;
        let record: Record<T> = serde_json::from_value(row)?;

        info!("Inserted row {} into '{}'", record.id, table);
        Ok(record)
    }

    /// Point a medication's back-reference at a daily log. Re-applying the
    /// same pair leaves the row unchanged.
    pub async fn update_link(&self, medication_id: RecordId, daily_log_id: RecordId) -> CareResult<()> {
        self.store
            .update(
                TABLE_MEDICATIONS,
                json!({ "registro_id": daily_log_id }),
                medication_id,
                self.bearer(),
            )
            .await?;

        info!("Linked medication {} to daily log {}", medication_id, daily_log_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::storage::traits::TableStore;
    use shared::{Frequency, Specialty};

    fn ana() -> CaregiverFields {
        CaregiverFields {
            name: "Ana".to_string(),
            age: 30,
            phone: "111".to_string(),
            specialty: Specialty::Nurse,
            availability: 3,
        }
    }

    #[tokio::test]
    async fn test_caregiver_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let repo = RecordRepository::new(store, None);

        let created = repo.insert(&ana()).await.unwrap();
        let listing = repo.list_all::<CaregiverFields>().await;

        assert!(listing.error.is_none());
        assert_eq!(listing.records, vec![created.clone()]);
        assert_eq!(created.fields, ana());
    }

    #[tokio::test]
    async fn test_list_all_on_empty_collection() {
        let repo = RecordRepository::new(Arc::new(MemoryStore::new()), None);
        let listing = repo.list_all::<MealFields>().await;
        assert!(listing.records.is_empty());
        assert!(listing.error.is_none());
    }

    #[tokio::test]
    async fn test_list_all_swallows_store_errors() {
        let store = Arc::new(MemoryStore::new());
        store.fail_select(TABLE_DAILY_LOGS);
        let repo = RecordRepository::new(store, None);

        let listing = repo.list_all::<DailyLogFields>().await;
        assert!(listing.records.is_empty());
        assert!(listing.error.unwrap().contains("registros_diarios"));
    }

    #[tokio::test]
    async fn test_list_all_skips_undecodable_rows() {
        let store = Arc::new(MemoryStore::new());
        let repo = RecordRepository::new(store.clone(), None);
        let good = repo.insert(&ana()).await.unwrap();
        store
            .insert(TABLE_CAREGIVERS, json!({ "nome": "Sem idade" }), None)
            .await
            .unwrap();
        store
            .insert(
                TABLE_CAREGIVERS,
                json!({ "nome": "Velha", "idade": 300, "telefone": "", "especialidade": "Geral", "disponibilidade": 1 }),
                None,
            )
            .await
            .unwrap();

        let listing = repo.list_all::<CaregiverFields>().await;
        assert_eq!(listing.records, vec![good]);
        let error = listing.error.unwrap();
        assert!(error.contains("Skipped 2"), "{}", error);
    }

    #[tokio::test]
    async fn test_update_link_sets_back_reference() {
        let store = Arc::new(MemoryStore::new());
        let repo = RecordRepository::new(store.clone(), None);
        let medication = repo
            .insert(&MedicationFields {
                name: "Losartana".to_string(),
                dosage: "50mg".to_string(),
                frequency: Frequency::OnceDaily,
                time: "08:00".to_string(),
                notes: String::new(),
                caregiver_id: 1,
                daily_log_id: None,
            })
            .await
            .unwrap();

        repo.update_link(medication.id, 7).await.unwrap();
        repo.update_link(medication.id, 7).await.unwrap();

        let listing = repo.list_all::<MedicationFields>().await;
        assert_eq!(listing.records[0].fields.daily_log_id, Some(7));
    }
}
