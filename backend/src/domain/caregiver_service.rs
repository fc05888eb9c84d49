use shared::{
    Caregiver, CaregiverFields, CreateCaregiverRequest, RecordCreatedResponse, RecordListResponse,
};
use tracing::{info, warn};

use crate::domain::form_fields::{bounded, required_text};
use crate::error::{CareError, CareResult};
use crate::storage::RecordRepository;

pub const MIN_CAREGIVER_AGE: i64 = 18;
pub const MAX_CAREGIVER_AGE: i64 = 100;
/// On-call days per week
pub const MAX_AVAILABILITY_DAYS: i64 = 4;

/// Caregiver roster: registration and lookup by name
#[derive(Clone)]
pub struct CaregiverService {
    repository: RecordRepository,
}

impl CaregiverService {
    pub fn new(repository: RecordRepository) -> Self {
        Self { repository }
    }

    pub async fn list_caregivers(&self) -> RecordListResponse<CaregiverFields> {
        self.repository.list_all::<CaregiverFields>().await
    }

    pub async fn create_caregiver(
        &self,
        request: CreateCaregiverRequest,
    ) -> CareResult<RecordCreatedResponse<CaregiverFields>> {
        info!("Creating caregiver: name={}", request.name);

        let fields = Self::validate(request)?;
        let record = self.repository.insert(&fields).await?;

        Ok(RecordCreatedResponse {
            success_message: format!("Caregiver {} registered successfully", record.fields.name),
            record,
        })
    }

    /// Resolve a caregiver chosen by name against the live roster.
    ///
    /// Unreadable roster rows do not block the lookup; they only matter when
    /// the name is not among the rows that could be read.
    pub async fn find_by_name(&self, name: &str) -> CareResult<Caregiver> {
        let listing = self.list_caregivers().await;
        if let Some(caregiver) = listing
            .records
            .into_iter()
            .find(|caregiver| caregiver.fields.name == name)
        {
            return Ok(caregiver);
        }

        if let Some(error) = listing.error {
            return Err(CareError::Store(error));
        }
        warn!("Caregiver not found: {}", name);
        Err(CareError::validation("caregiver", format!("unknown caregiver '{}'", name)))
    }

    fn validate(request: CreateCaregiverRequest) -> CareResult<CaregiverFields> {
        let name = required_text("name", &request.name)?;
        let age = bounded("age", request.age, MIN_CAREGIVER_AGE, MAX_CAREGIVER_AGE)?;
        let availability = bounded("availability", request.availability, 0, MAX_AVAILABILITY_DAYS)?;

        Ok(CaregiverFields {
            name,
            age: age as u8,
            phone: request.phone.trim().to_string(),
            specialty: request.specialty,
            availability: availability as u8,
        })
    }
}
