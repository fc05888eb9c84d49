use chrono::NaiveTime;
use shared::{CreateMealRequest, MealFields, RecordCreatedResponse, RecordListResponse};
use tracing::info;

use crate::domain::caregiver_service::CaregiverService;
use crate::domain::form_fields::{selected_caregiver, time_of_day};
use crate::error::CareResult;
use crate::storage::RecordRepository;

#[derive(Clone)]
pub struct MealService {
    repository: RecordRepository,
    caregivers: CaregiverService,
}

impl MealService {
    pub fn new(repository: RecordRepository) -> Self {
        let caregivers = CaregiverService::new(repository.clone());
        Self {
            repository,
            caregivers,
        }
    }

    pub async fn list_meals(&self) -> RecordListResponse<MealFields> {
        self.repository.list_all::<MealFields>().await
    }

    /// Record a meal. The responsible caregiver is stored both by name and by id.
    pub async fn create_meal(
        &self,
        request: CreateMealRequest,
    ) -> CareResult<RecordCreatedResponse<MealFields>> {
        info!("Creating meal: type={}", request.meal_type);

        let caregiver_name = selected_caregiver(request.caregiver.as_deref())?;
        let time = time_of_day("time", request.time.as_deref(), default_time())?;
        let caregiver = self.caregivers.find_by_name(&caregiver_name).await?;

        let fields = MealFields {
            meal_type: request.meal_type,
            foods: request.foods,
            quantity: request.quantity,
            acceptance: request.acceptance,
            time,
            caregiver_name: caregiver.fields.name,
            caregiver_id: caregiver.id,
            notes: request.notes,
        };
        let record = self.repository.insert(&fields).await?;

        Ok(RecordCreatedResponse {
            success_message: format!(
                "Meal recorded: {} at {}",
                record.fields.meal_type, record.fields.time
            ),
            record,
        })
    }
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CareError;
    use crate::storage::MemoryStore;
    use shared::{Acceptance, CaregiverFields, MealType, Specialty, TABLE_MEALS};
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryStore>, MealService, i64) {
        let store = Arc::new(MemoryStore::new());
        let repository = RecordRepository::new(store.clone(), None);
        let bia = repository
            .insert(&CaregiverFields {
                name: "Bia".to_string(),
                age: 42,
                phone: "222".to_string(),
                specialty: Specialty::Caregiver,
                availability: 2,
            })
            .await
            .unwrap();
        (store, MealService::new(repository), bia.id)
    }

    fn request(caregiver: Option<&str>, time: Option<&str>) -> CreateMealRequest {
        CreateMealRequest {
            caregiver: caregiver.map(str::to_string),
            meal_type: MealType::Lunch,
            foods: "Arroz, feijão e frango".to_string(),
            quantity: "1 prato".to_string(),
            acceptance: Acceptance::Partial,
            time: time.map(str::to_string),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_meal_with_default_time() {
        let (_store, service, bia_id) = setup().await;

        let created = service.create_meal(request(Some("Bia"), None)).await.unwrap();

        assert_eq!(created.record.fields.time, "12:00");
        assert_eq!(created.record.fields.caregiver_name, "Bia");
        assert_eq!(created.record.fields.caregiver_id, bia_id);
        assert_eq!(created.success_message, "Meal recorded: Almoço at 12:00");
    }

    #[tokio::test]
    async fn test_invalid_meal_is_not_stored() {
        let (store, service, _) = setup().await;

        let no_caregiver = service.create_meal(request(None, None)).await;
        let bad_time = service.create_meal(request(Some("Bia"), Some("meio-dia"))).await;

        assert!(matches!(no_caregiver, Err(CareError::Validation { .. })));
        assert!(matches!(bad_time, Err(CareError::Validation { .. })));
        assert!(store.rows(TABLE_MEALS).is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let (store, service, _) = setup().await;
        store.fail_insert(TABLE_MEALS);

        let result = service.create_meal(request(Some("Bia"), Some("19:30"))).await;
        assert!(matches!(result, Err(CareError::Store(_))));
    }
}
