use chrono::NaiveTime;
use shared::{CreateMedicationRequest, MedicationFields, RecordCreatedResponse, RecordListResponse};
use tracing::info;

use crate::domain::caregiver_service::CaregiverService;
use crate::domain::form_fields::{required_text, selected_caregiver, time_of_day};
use crate::error::CareResult;
use crate::storage::RecordRepository;

/// Medication catalog. Entries start unlinked; the daily log workflow links
/// them afterwards.
#[derive(Clone)]
pub struct MedicationService {
    repository: RecordRepository,
    caregivers: CaregiverService,
}

impl MedicationService {
    pub fn new(repository: RecordRepository) -> Self {
        let caregivers = CaregiverService::new(repository.clone());
        Self {
            repository,
            caregivers,
        }
    }

    pub async fn list_medications(&self) -> RecordListResponse<MedicationFields> {
        self.repository.list_all::<MedicationFields>().await
    }

    pub async fn create_medication(
        &self,
        request: CreateMedicationRequest,
    ) -> CareResult<RecordCreatedResponse<MedicationFields>> {
        info!("Creating medication: name={}", request.name);

        let caregiver_name = selected_caregiver(request.caregiver.as_deref())?;
        let name = required_text("name", &request.name)?;
        let time = time_of_day("time", request.time.as_deref(), default_time())?;
        let caregiver = self.caregivers.find_by_name(&caregiver_name).await?;

        let fields = MedicationFields {
            name,
            dosage: request.dosage.trim().to_string(),
            frequency: request.frequency,
            time,
            notes: request.notes,
            caregiver_id: caregiver.id,
            daily_log_id: None,
        };
        let record = self.repository.insert(&fields).await?;

        Ok(RecordCreatedResponse {
            success_message: format!("Medication {} registered successfully", record.fields.name),
            record,
        })
    }
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}
