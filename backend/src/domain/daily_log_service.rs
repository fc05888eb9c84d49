//! # Daily Log Workflow
//!
//! The only multi-step write in the system. A submission first inserts the
//! daily log, then points every selected medication at it. The second step
//! is a saga rather than a transaction: each medication link is attempted
//! once and its outcome recorded, so a failed link never hides the fact that
//! the log itself was saved.

use chrono::{Local, NaiveDateTime};
use shared::{
    CreateDailyLogRequest, DailyLogFields, DailyLogSubmissionResponse, LinkFailure, RecordId,
    RecordListResponse, DAILY_LOG_TIMESTAMP_FORMAT,
};
use tracing::{error, info};

use crate::domain::caregiver_service::CaregiverService;
use crate::domain::form_fields::{bounded, parse_temperature, selected_caregiver};
use crate::error::CareResult;
use crate::storage::RecordRepository;

pub const MIN_OXYGEN_SATURATION: i64 = 50;
pub const MAX_OXYGEN_SATURATION: i64 = 100;
pub const MIN_HEART_RATE: i64 = 30;
pub const MAX_HEART_RATE: i64 = 200;

#[derive(Clone)]
pub struct DailyLogService {
    repository: RecordRepository,
    caregivers: CaregiverService,
}

impl DailyLogService {
    pub fn new(repository: RecordRepository) -> Self {
        let caregivers = CaregiverService::new(repository.clone());
        Self {
            repository,
            caregivers,
        }
    }

    pub async fn list_daily_logs(&self) -> RecordListResponse<DailyLogFields> {
        self.repository.list_all::<DailyLogFields>().await
    }

    /// Submit a daily log stamped with the current local time
    pub async fn submit(&self, request: CreateDailyLogRequest) -> CareResult<DailyLogSubmissionResponse> {
        self.submit_at(request, Local::now().naive_local()).await
    }

    pub async fn submit_at(
        &self,
        request: CreateDailyLogRequest,
        now: NaiveDateTime,
    ) -> CareResult<DailyLogSubmissionResponse> {
        info!(
            "Submitting daily log with {} medication(s)",
            request.medication_ids.len()
        );

        let fields = self.validate(&request, now).await?;
        let daily_log = self.repository.insert(&fields).await?;

        let mut medication_ids = request.medication_ids;
        medication_ids.sort_unstable();
        medication_ids.dedup();

        let (linked_medication_ids, link_failures) =
            self.link_medications(&medication_ids, daily_log.id).await;

        let success_message = if link_failures.is_empty() {
            "Daily log saved and medications linked".to_string()
        } else {
            format!(
                "Daily log saved, but {} medication(s) could not be linked",
                link_failures.len()
            )
        };

        Ok(DailyLogSubmissionResponse {
            daily_log,
            linked_medication_ids,
            link_failures,
            success_message,
        })
    }

    async fn validate(&self, request: &CreateDailyLogRequest, now: NaiveDateTime) -> CareResult<DailyLogFields> {
        let temperature = parse_temperature(&request.temperature)?;
        let caregiver_name = selected_caregiver(request.caregiver.as_deref())?;

        let oxygen_saturation = request
            .oxygen_saturation
            .map(|value| bounded("oxygen_saturation", value, MIN_OXYGEN_SATURATION, MAX_OXYGEN_SATURATION))
            .transpose()?
            .map(|value| value as u8);
        let heart_rate = request
            .heart_rate
            .map(|value| bounded("heart_rate", value, MIN_HEART_RATE, MAX_HEART_RATE))
            .transpose()?
            .map(|value| value as u16);

        let caregiver = self.caregivers.find_by_name(&caregiver_name).await?;

        Ok(DailyLogFields {
            timestamp: now.format(DAILY_LOG_TIMESTAMP_FORMAT).to_string(),
            temperature,
            oxygen_saturation,
            heart_rate,
            blood_pressure: request.blood_pressure.trim().to_string(),
            sleep: request.sleep,
            behavior_notes: request.behavior_notes.clone(),
            shift_notes: request.shift_notes.clone(),
            bowel_movements: request.bowel_movements,
            stool_character: request.stool_character,
            urinations: request.urinations,
            urine_appearance: request.urine_appearance,
            caregiver: caregiver.fields.name,
        })
    }

    async fn link_medications(
        &self,
        medication_ids: &[RecordId],
        daily_log_id: RecordId,
    ) -> (Vec<RecordId>, Vec<LinkFailure>) {
        let mut linked = Vec::new();
        let mut failures = Vec::new();

        for &medication_id in medication_ids {
            match self.repository.update_link(medication_id, daily_log_id).await {
                Ok(()) => linked.push(medication_id),
                Err(e) => {
                    error!(
                        "Failed to link medication {} to daily log {}: {}",
                        medication_id, daily_log_id, e
                    );
                    failures.push(LinkFailure {
                        medication_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        (linked, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CareError;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use shared::{
        CaregiverFields, EliminationCount, Frequency, MedicationFields, SleepDuration, Specialty,
        StoolCharacter, TABLE_CAREGIVERS, TABLE_DAILY_LOGS, TABLE_MEDICATIONS,
    };
    use crate::storage::TableStore;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: DailyLogService,
        medication_ids: Vec<RecordId>,
    }

    async fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let repository = RecordRepository::new(store.clone(), None);
        let ana = repository
            .insert(&CaregiverFields {
                name: "Ana".to_string(),
                age: 30,
                phone: "111".to_string(),
                specialty: Specialty::Nurse,
                availability: 3,
            })
            .await
            .unwrap();

        let mut medication_ids = Vec::new();
        for name in ["Losartana", "Dipirona"] {
            let medication = repository
                .insert(&MedicationFields {
                    name: name.to_string(),
                    dosage: "50mg".to_string(),
                    frequency: Frequency::OnceDaily,
                    time: "08:00".to_string(),
                    notes: String::new(),
                    caregiver_id: ana.id,
                    daily_log_id: None,
                })
                .await
                .unwrap();
            medication_ids.push(medication.id);
        }

        Fixture {
            store,
            service: DailyLogService::new(repository),
            medication_ids,
        }
    }

    fn request(temperature: &str, caregiver: Option<&str>, medication_ids: Vec<RecordId>) -> CreateDailyLogRequest {
        CreateDailyLogRequest {
            temperature: temperature.to_string(),
            oxygen_saturation: None,
            heart_rate: None,
            blood_pressure: "120x80".to_string(),
            sleep: SleepDuration::parse("7h 30min").unwrap(),
            behavior_notes: "Calmo".to_string(),
            shift_notes: String::new(),
            bowel_movements: Some(EliminationCount::One),
            stool_character: Some(StoolCharacter::Normal),
            urinations: Some(EliminationCount::FourOrMore),
            urine_appearance: None,
            caregiver: caregiver.map(str::to_string),
            medication_ids,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(12, 5, 30)
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_without_medications() {
        let fx = setup().await;

        let result = fx
            .service
            .submit_at(request("37,2", Some("Ana"), vec![]), noon())
            .await
            .unwrap();

        assert_eq!(result.daily_log.fields.temperature, 37.2);
        assert_eq!(result.daily_log.fields.timestamp, "09-03-2025 12:05:30");
        assert_eq!(result.daily_log.fields.caregiver, "Ana");
        assert!(result.linked_medication_ids.is_empty());
        assert!(result.link_failures.is_empty());
        assert_eq!(fx.store.update_calls(), 0);
        assert_eq!(fx.store.rows(TABLE_DAILY_LOGS).len(), 1);
    }

    #[tokio::test]
    async fn test_timestamp_is_read_back_verbatim() {
        let fx = setup().await;
        fx.service
            .submit_at(request("36,5", Some("Ana"), vec![]), noon())
            .await
            .unwrap();

        let listing = fx.service.list_daily_logs().await;
        assert_eq!(listing.records[0].fields.timestamp, "09-03-2025 12:05:30");
    }

    #[tokio::test]
    async fn test_links_every_selected_medication() {
        let fx = setup().await;

        let result = fx
            .service
            .submit_at(request("36,5", Some("Ana"), fx.medication_ids.clone()), noon())
            .await
            .unwrap();

        assert_eq!(result.linked_medication_ids, fx.medication_ids);
        for row in fx.store.rows(TABLE_MEDICATIONS) {
            assert_eq!(row["registro_id"], result.daily_log.id);
        }
    }

    #[tokio::test]
    async fn test_partial_link_failure_is_reported() {
        let fx = setup().await;
        let (ok_id, failing_id) = (fx.medication_ids[0], fx.medication_ids[1]);
        fx.store.fail_update(TABLE_MEDICATIONS, failing_id);

        let result = fx
            .service
            .submit_at(request("36,5", Some("Ana"), vec![ok_id, failing_id]), noon())
            .await
            .unwrap();

        assert_eq!(fx.store.rows(TABLE_DAILY_LOGS).len(), 1);
        assert_eq!(result.linked_medication_ids, vec![ok_id]);
        assert_eq!(result.link_failures.len(), 1);
        assert_eq!(result.link_failures[0].medication_id, failing_id);
        assert!(result.success_message.contains("could not be linked"));

        let rows = fx.store.rows(TABLE_MEDICATIONS);
        let linked = rows.iter().find(|row| row["id"] == ok_id).unwrap();
        let unlinked = rows.iter().find(|row| row["id"] == failing_id).unwrap();
        assert_eq!(linked["registro_id"], result.daily_log.id);
        assert!(unlinked.get("registro_id").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_medication_ids_are_linked_once() {
        let fx = setup().await;
        let id = fx.medication_ids[0];

        let result = fx
            .service
            .submit_at(request("36,5", Some("Ana"), vec![id, id]), noon())
            .await
            .unwrap();

        assert_eq!(result.linked_medication_ids, vec![id]);
        assert_eq!(fx.store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_temperature_never_reaches_store() {
        let fx = setup().await;

        for temperature in ["36.5", "quente", ""] {
            let err = fx
                .service
                .submit_at(request(temperature, Some("Ana"), fx.medication_ids.clone()), noon())
                .await
                .unwrap_err();
            assert_eq!(err, CareError::validation("temperature", "use a number such as 36,5"));
        }
        assert!(fx.store.rows(TABLE_DAILY_LOGS).is_empty());
        assert_eq!(fx.store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_caregiver_is_required_and_must_exist() {
        let fx = setup().await;

        let missing = fx.service.submit_at(request("36,5", None, vec![]), noon()).await;
        let unknown = fx.service.submit_at(request("36,5", Some("Bia"), vec![]), noon()).await;

        assert!(matches!(missing, Err(CareError::Validation { ref field, .. }) if field == "caregiver"));
        assert!(matches!(unknown, Err(CareError::Validation { ref field, .. }) if field == "caregiver"));
        assert!(fx.store.rows(TABLE_DAILY_LOGS).is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_caregiver_row_does_not_block_submission() {
        let fx = setup().await;
        fx.store
            .insert(
                TABLE_CAREGIVERS,
                json!({ "nome": "Legado", "idade": 300, "especialidade": "Fisioterapeuta" }),
                None,
            )
            .await
            .unwrap();

        let response = fx
            .service
            .submit_at(request("36,5", Some("Ana"), vec![]), noon())
            .await
            .unwrap();
        assert_eq!(response.daily_log.fields.caregiver, "Ana");
        assert_eq!(fx.store.rows(TABLE_DAILY_LOGS).len(), 1);

        // The unreadable row itself cannot be chosen
        let legacy = fx.service.submit_at(request("36,5", Some("Legado"), vec![]), noon()).await;
        assert!(matches!(legacy, Err(CareError::Store(_))));
        assert_eq!(fx.store.rows(TABLE_DAILY_LOGS).len(), 1);
    }

    #[tokio::test]
    async fn test_extended_vitals_are_range_checked() {
        let fx = setup().await;

        let mut too_low = request("36,5", Some("Ana"), vec![]);
        too_low.oxygen_saturation = Some(49);
        assert!(fx.service.submit_at(too_low, noon()).await.is_err());

        let mut too_fast = request("36,5", Some("Ana"), vec![]);
        too_fast.heart_rate = Some(201);
        assert!(fx.service.submit_at(too_fast, noon()).await.is_err());

        let mut extended = request("36,5", Some("Ana"), vec![]);
        extended.oxygen_saturation = Some(97);
        extended.heart_rate = Some(72);
        let saved = fx.service.submit_at(extended, noon()).await.unwrap();
        assert_eq!(saved.daily_log.fields.oxygen_saturation, Some(97));
        assert_eq!(saved.daily_log.fields.heart_rate, Some(72));
    }

    #[tokio::test]
    async fn test_insert_failure_aborts_before_linking() {
        let fx = setup().await;
        fx.store.fail_insert(TABLE_DAILY_LOGS);

        let err = fx
            .service
            .submit_at(request("36,5", Some("Ana"), fx.medication_ids.clone()), noon())
            .await
            .unwrap_err();

        assert!(matches!(err, CareError::Store(_)));
        assert_eq!(fx.store.update_calls(), 0);
    }
}
