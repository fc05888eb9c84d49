use shared::{
    Acceptance, CaregiverFields, EliminationCount, FormOptionsResponse, Frequency, MealType,
    MedicationFields, MedicationOption, SleepDuration, Specialty, StoolCharacter, UrineAppearance,
    DAILY_LOG_TIMESTAMP_FORMAT,
};
use tracing::info;

use crate::storage::RecordRepository;

/// Builds the choices offered by every form. Caregiver and medication
/// choices come from the live collections; a collection that fails to load
/// contributes no choices and an entry in `errors`.
#[derive(Clone)]
pub struct FormOptionsService {
    repository: RecordRepository,
    patient_name: String,
}

impl FormOptionsService {
    pub fn new(repository: RecordRepository, patient_name: String) -> Self {
        Self {
            repository,
            patient_name,
        }
    }

    pub async fn form_options(&self) -> FormOptionsResponse {
        let caregivers = self.repository.list_all::<CaregiverFields>().await;
        let medications = self.repository.list_all::<MedicationFields>().await;
        let errors: Vec<String> = [caregivers.error, medications.error]
            .into_iter()
            .flatten()
            .collect();

        let mut caregiver_names: Vec<String> = Vec::new();
        for caregiver in caregivers.records {
            if !caregiver_names.contains(&caregiver.fields.name) {
                caregiver_names.push(caregiver.fields.name);
            }
        }

        let medication_options: Vec<MedicationOption> = medications
            .records
            .iter()
            .map(|medication| MedicationOption {
                id: medication.id,
                label: medication.option_label(),
            })
            .collect();

        info!(
            "Form options: {} caregiver(s), {} medication(s)",
            caregiver_names.len(),
            medication_options.len()
        );

        FormOptionsResponse {
            patient_name: self.patient_name.clone(),
            timestamp_format: DAILY_LOG_TIMESTAMP_FORMAT.to_string(),
            caregivers: caregiver_names,
            medications: medication_options,
            sleep_durations: SleepDuration::all(),
            specialties: Specialty::ALL.to_vec(),
            frequencies: Frequency::ALL.to_vec(),
            meal_types: MealType::ALL.to_vec(),
            acceptance_levels: Acceptance::ALL.to_vec(),
            elimination_counts: EliminationCount::ALL.to_vec(),
            stool_characters: StoolCharacter::ALL.to_vec(),
            urine_appearances: UrineAppearance::ALL.to_vec(),
            errors,
        }
    }
}
