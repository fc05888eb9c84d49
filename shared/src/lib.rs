use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the remote store on insert.
///
/// The tables use `bigint` identity primary keys, and `registro_id` and
/// `cuidador_id` reference them as integers. A table keyed by `uuid` would
/// need a different id type; its rows are reported as unreadable instead.
pub type RecordId = i64;

/// Collection names in the remote store
pub const TABLE_DAILY_LOGS: &str = "registros_diarios";
pub const TABLE_CAREGIVERS: &str = "cuidadores";
pub const TABLE_MEDICATIONS: &str = "medicamentos";
pub const TABLE_MEALS: &str = "alimentacao";

/// Format of the creation timestamp stored verbatim on every daily log
pub const DAILY_LOG_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// A persisted row: the store-assigned id plus the entity's own columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: T,
}

/// Declares a closed set of choices whose wire value is the label shown on the form.
macro_rules! labelled_choices {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_choices! {
    /// Caregiver specialty
    pub enum Specialty {
        General => "Geral",
        NursingTechnician => "Técnico em Enfermagem",
        Nurse => "Enfermeiro",
        Caregiver => "Cuidador",
        Other => "Outro",
    }
}

labelled_choices! {
    /// How often a medication is given
    pub enum Frequency {
        OnceDaily => "1x ao dia",
        TwiceDaily => "2x ao dia",
        ThriceDaily => "3x ao dia",
        Every8Hours => "A cada 8h",
        OnDemand => "Sob demanda",
    }
}

labelled_choices! {
    pub enum MealType {
        Breakfast => "Café da Manhã",
        Lunch => "Almoço",
        Snack => "Lanche",
        Dinner => "Jantar",
        Supper => "Ceia",
    }
}

labelled_choices! {
    /// How much of a meal the patient accepted
    pub enum Acceptance {
        Full => "Sim",
        Partial => "Parcialmente",
        Refused => "Recusou",
    }
}

labelled_choices! {
    /// Number of bowel movements or urinations during the logged period
    pub enum EliminationCount {
        Zero => "0",
        One => "1",
        Two => "2",
        Three => "3",
        FourOrMore => "4+",
    }
}

labelled_choices! {
    pub enum StoolCharacter {
        Normal => "Normal",
        Soft => "Pastosa",
        Liquid => "Líquida",
        Hard => "Ressecada",
        NotObserved => "Não observado",
    }
}

labelled_choices! {
    pub enum UrineAppearance {
        Clear => "Clara",
        DarkYellow => "Amarelo-escura",
        Concentrated => "Concentrada",
        Bloody => "Com sangue",
        NotObserved => "Não observado",
    }
}

/// Hours of sleep, chosen in half-hour steps from 3h to 12h 30min.
///
/// Serialized as the form label, e.g. `"7h"` or `"7h 30min"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SleepDuration {
    minutes: u16,
}

impl SleepDuration {
    pub const MIN_MINUTES: u16 = 3 * 60;
    pub const MAX_MINUTES: u16 = 12 * 60 + 30;
    const STEP_MINUTES: u16 = 30;

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        let in_range = (Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&minutes);
        (in_range && minutes % Self::STEP_MINUTES == 0).then_some(Self { minutes })
    }

    pub fn minutes(&self) -> u16 {
        self.minutes
    }

    /// Every selectable duration in ascending order
    pub fn all() -> Vec<SleepDuration> {
        (Self::MIN_MINUTES..=Self::MAX_MINUTES)
            .step_by(Self::STEP_MINUTES as usize)
            .map(|minutes| SleepDuration { minutes })
            .collect()
    }

    pub fn label(&self) -> String {
        let hours = self.minutes / 60;
        match self.minutes % 60 {
            0 => format!("{}h", hours),
            rest => format!("{}h {}min", hours, rest),
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let (hours, rest) = label.split_once('h')?;
        let hours: u16 = hours.parse().ok()?;
        let extra: u16 = match rest.trim() {
            "" => 0,
            minutes => minutes.strip_suffix("min")?.parse().ok()?,
        };
        let minutes = hours.checked_mul(60)?.checked_add(extra)?;
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for SleepDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl TryFrom<String> for SleepDuration {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SleepDuration::parse(&value).ok_or_else(|| format!("invalid sleep duration: {}", value))
    }
}

impl From<SleepDuration> for String {
    fn from(value: SleepDuration) -> Self {
        value.label()
    }
}

// ---------------------------------------------------------------------------
// Stored entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaregiverFields {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "idade")]
    pub age: u8,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "especialidade")]
    pub specialty: Specialty,
    /// On-call days per week (0-4)
    #[serde(rename = "disponibilidade")]
    pub availability: u8,
}

pub type Caregiver = Record<CaregiverFields>;

/// Daily patient observations. Saturation and heart rate are only present in
/// logs written by the extended form; elimination columns may be missing on
/// rows written before they existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogFields {
    /// Creation time exactly as formatted at submission
    #[serde(rename = "data")]
    pub timestamp: String,
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    #[serde(rename = "saturacao", default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<u8>,
    #[serde(rename = "frequencia_cardiaca", default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u16>,
    #[serde(rename = "pressao", default)]
    pub blood_pressure: String,
    #[serde(rename = "sono")]
    pub sleep: SleepDuration,
    #[serde(rename = "observacao", default)]
    pub behavior_notes: String,
    #[serde(rename = "observacao_geral", default)]
    pub shift_notes: String,
    #[serde(rename = "evacuacoes", default, skip_serializing_if = "Option::is_none")]
    pub bowel_movements: Option<EliminationCount>,
    #[serde(rename = "aspecto_fezes", default, skip_serializing_if = "Option::is_none")]
    pub stool_character: Option<StoolCharacter>,
    #[serde(rename = "diurese", default, skip_serializing_if = "Option::is_none")]
    pub urinations: Option<EliminationCount>,
    #[serde(rename = "aspecto_urina", default, skip_serializing_if = "Option::is_none")]
    pub urine_appearance: Option<UrineAppearance>,
    /// Name of the responsible caregiver
    #[serde(rename = "cuidador")]
    pub caregiver: String,
}

pub type DailyLog = Record<DailyLogFields>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationFields {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "dosagem", default)]
    pub dosage: String,
    #[serde(rename = "frequencia")]
    pub frequency: Frequency,
    /// Scheduled time of day, HH:MM
    #[serde(rename = "horario")]
    pub time: String,
    #[serde(rename = "observacoes", default)]
    pub notes: String,
    #[serde(rename = "cuidador_id")]
    pub caregiver_id: RecordId,
    /// Daily log this medication was administered under, once linked
    #[serde(rename = "registro_id", default, skip_serializing_if = "Option::is_none")]
    pub daily_log_id: Option<RecordId>,
}

pub type Medication = Record<MedicationFields>;

impl Medication {
    /// Label used on the daily log form, e.g. "Losartana (50mg)"
    pub fn option_label(&self) -> String {
        format!("{} ({})", self.fields.name, self.fields.dosage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealFields {
    #[serde(rename = "refeicao")]
    pub meal_type: MealType,
    #[serde(rename = "alimentos", default)]
    pub foods: String,
    #[serde(rename = "quantidade", default)]
    pub quantity: String,
    #[serde(rename = "aceitou")]
    pub acceptance: Acceptance,
    /// HH:MM
    #[serde(rename = "horario")]
    pub time: String,
    /// Name of the responsible caregiver
    #[serde(rename = "responsavel")]
    pub caregiver_name: String,
    #[serde(rename = "cuidador_id")]
    pub caregiver_id: RecordId,
    #[serde(rename = "observacoes", default)]
    pub notes: String,
}

pub type Meal = Record<MealFields>;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Identity returned by the authentication provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub success_message: String,
}

/// Bearer token relayed from an OAuth redirect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLoginRequest {
    pub token: String,
}

/// Snapshot of a session as seen by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub authenticated: bool,
    pub user: Option<UserIdentity>,
    pub token_consumed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLoginResponse {
    pub session: SessionResponse,
    /// The session had already consumed a credential; the store was not called
    pub already_processed: bool,
    /// The client should drop any token left in its URL or query state
    pub clear_token: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthProviderResponse {
    pub provider: String,
    pub authorize_url: String,
}

// ---------------------------------------------------------------------------
// Form submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCaregiverRequest {
    pub name: String,
    pub age: i64,
    #[serde(default)]
    pub phone: String,
    pub specialty: Specialty,
    pub availability: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDailyLogRequest {
    /// Locale formatted decimal, e.g. "36,5"
    pub temperature: String,
    #[serde(default)]
    pub oxygen_saturation: Option<i64>,
    #[serde(default)]
    pub heart_rate: Option<i64>,
    #[serde(default)]
    pub blood_pressure: String,
    pub sleep: SleepDuration,
    #[serde(default)]
    pub behavior_notes: String,
    #[serde(default)]
    pub shift_notes: String,
    #[serde(default)]
    pub bowel_movements: Option<EliminationCount>,
    #[serde(default)]
    pub stool_character: Option<StoolCharacter>,
    #[serde(default)]
    pub urinations: Option<EliminationCount>,
    #[serde(default)]
    pub urine_appearance: Option<UrineAppearance>,
    #[serde(default)]
    pub caregiver: Option<String>,
    /// Medications administered during this log
    #[serde(default)]
    pub medication_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMedicationRequest {
    #[serde(default)]
    pub caregiver: Option<String>,
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    pub frequency: Frequency,
    /// HH:MM, defaults to 08:00
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMealRequest {
    #[serde(default)]
    pub caregiver: Option<String>,
    pub meal_type: MealType,
    #[serde(default)]
    pub foods: String,
    #[serde(default)]
    pub quantity: String,
    pub acceptance: Acceptance,
    /// HH:MM, defaults to 12:00
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Rows of one collection. `error` is set when the collection could not be
/// loaded, in which case `records` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordListResponse<T> {
    pub records: Vec<Record<T>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCreatedResponse<T> {
    pub record: Record<T>,
    pub success_message: String,
}

/// A medication that could not be linked to a freshly saved daily log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkFailure {
    pub medication_id: RecordId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogSubmissionResponse {
    pub daily_log: DailyLog,
    pub linked_medication_ids: Vec<RecordId>,
    pub link_failures: Vec<LinkFailure>,
    pub success_message: String,
}

/// Daily logs shaped for the overview table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogTableResponse {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationOption {
    pub id: RecordId,
    pub label: String,
}

/// Choices for every form select box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOptionsResponse {
    pub patient_name: String,
    pub timestamp_format: String,
    pub caregivers: Vec<String>,
    pub medications: Vec<MedicationOption>,
    pub sleep_durations: Vec<SleepDuration>,
    pub specialties: Vec<Specialty>,
    pub frequencies: Vec<Frequency>,
    pub meal_types: Vec<MealType>,
    pub acceptance_levels: Vec<Acceptance>,
    pub elimination_counts: Vec<EliminationCount>,
    pub stool_characters: Vec<StoolCharacter>,
    pub urine_appearances: Vec<UrineAppearance>,
    /// Collections that failed to load while building the options
    pub errors: Vec<String>,
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub field: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_durations_cover_half_hours() {
        let all = SleepDuration::all();
        assert_eq!(all.len(), 20);
        assert_eq!(all.first().unwrap().label(), "3h");
        assert_eq!(all[1].label(), "3h 30min");
        assert_eq!(all.last().unwrap().label(), "12h 30min");
    }

    #[test]
    fn test_oversized_sleep_labels_are_rejected() {
        assert_eq!(SleepDuration::parse("1100h"), None);
        assert_eq!(SleepDuration::parse("3h 65500min"), None);
        assert_eq!(SleepDuration::parse("65535h 65535min"), None);
        assert!(serde_json::from_str::<SleepDuration>("\"3h 65500min\"").is_err());
        assert_eq!(SleepDuration::parse("7h 30min").map(|d| d.minutes()), Some(450));
    }

    #[test]
    fn test_sleep_duration_rejects_out_of_range() {
        assert!(SleepDuration::parse("2h 30min").is_none());
        assert!(SleepDuration::parse("13h").is_none());
        assert!(SleepDuration::parse("7h 15min").is_none());
        assert!(SleepDuration::parse("sete horas").is_none());
        assert_eq!(SleepDuration::parse("7h 30min").unwrap().minutes(), 450);
    }

    #[test]
    fn test_choices_use_form_labels_on_the_wire() {
        let json = serde_json::to_string(&Specialty::NursingTechnician).unwrap();
        assert_eq!(json, "\"Técnico em Enfermagem\"");
        let parsed: Acceptance = serde_json::from_str("\"Parcialmente\"").unwrap();
        assert_eq!(parsed, Acceptance::Partial);
    }

    #[test]
    fn test_base_variant_daily_log_row_decodes() {
        let row = serde_json::json!({
            "id": 4,
            "data": "01-02-2025 08:15:00",
            "temperatura": 36.5,
            "pressao": "120x80",
            "sono": "8h",
            "observacao": "",
            "observacao_geral": "",
            "cuidador": "Ana"
        });
        let log: DailyLog = serde_json::from_value(row).unwrap();
        assert_eq!(log.id, 4);
        assert_eq!(log.fields.timestamp, "01-02-2025 08:15:00");
        assert!(log.fields.oxygen_saturation.is_none());
        assert!(log.fields.bowel_movements.is_none());
    }

    #[test]
    fn test_record_ids_are_integers() {
        let row = |id: serde_json::Value| {
            serde_json::json!({
                "id": id,
                "nome": "Ana",
                "idade": 30,
                "telefone": "111",
                "especialidade": "Enfermeiro",
                "disponibilidade": 3
            })
        };
        let caregiver: Caregiver = serde_json::from_value(row(serde_json::json!(42))).unwrap();
        assert_eq!(caregiver.id, 42);
        assert!(serde_json::from_value::<Caregiver>(row(serde_json::json!(
            "0b6f0c2e-5a7e-4d0e-9f43-2f1f0f0d8c11"
        )))
        .is_err());
    }

    #[test]
    fn test_unlinked_medication_omits_back_reference() {
        let fields = MedicationFields {
            name: "Dipirona".to_string(),
            dosage: "500mg".to_string(),
            frequency: Frequency::OnDemand,
            time: "08:00".to_string(),
            notes: String::new(),
            caregiver_id: 1,
            daily_log_id: None,
        };
        let value = serde_json::to_value(&fields).unwrap();
        assert!(value.get("registro_id").is_none());
        assert_eq!(value["frequencia"], "Sob demanda");
    }
}
