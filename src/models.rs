use serde::{ Deserialize, Serialize };

// ===== ENUMS =====

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl From<&str> for Sex {
    fn from(s: &str) -> Self {
        match s {
            "Male" => Sex::Male,
            "Female" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgeClass {
    Adult,
    #[serde(rename = "Sub-adult")]
    SubAdult,
    Juvenile,
    Unknown,
}

impl From<&str> for AgeClass {
    fn from(s: &str) -> Self {
        match s {
            "Adult" => AgeClass::Adult,
            "Sub-adult" => AgeClass::SubAdult,
            "Juvenile" => AgeClass::Juvenile,
            _ => AgeClass::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
}

/// Monitoring status of a tracked tiger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TigerStatus {
    Alive,
    Monitoring,
    Missing,
    Dead,
    Unknown,
}

impl From<&str> for TigerStatus {
    fn from(s: &str) -> Self {
        match s {
            "Alive" => TigerStatus::Alive,
            "Monitoring" => TigerStatus::Monitoring,
            "Missing" => TigerStatus::Missing,
            "Dead" => TigerStatus::Dead,
            _ => TigerStatus::Unknown,
        }
    }
}

/// Transmission status of a tracked elephant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ElephantStatus {
    Active,
    Inactive,
    Missing,
    Unknown,
}

impl From<&str> for ElephantStatus {
    fn from(s: &str) -> Self {
        match s {
            "Active" => ElephantStatus::Active,
            "Inactive" => ElephantStatus::Inactive,
            "Missing" => ElephantStatus::Missing,
            _ => ElephantStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConflictType {
    #[serde(rename = "Crop Damage")]
    CropDamage,
    #[serde(rename = "Human Injury")]
    HumanInjury,
    #[serde(rename = "Livestock Loss")]
    LivestockLoss,
    #[serde(rename = "Property Damage")]
    PropertyDamage,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConflictSeverity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConflictStatus {
    #[serde(rename = "Under Investigation")]
    UnderInvestigation,
    Resolved,
    Compensated,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Species {
    Tiger,
    Elephant,
    Other,
}

impl Species {
    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Tiger => "Tiger",
            Species::Elephant => "Elephant",
            Species::Other => "Other",
        }
    }
}

impl From<&str> for Species {
    fn from(s: &str) -> Self {
        match s {
            "Tiger" | "tiger" => Species::Tiger,
            "Elephant" | "elephant" => Species::Elephant,
            _ => Species::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollarStatus {
    Collared,
    Uncollared,
}

// ===== ANIMAL RECORDS =====

/// A tracked tiger row as stored in the `tigers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tiger {
    pub id: String,
    pub name: Option<String>,
    pub sex: Sex,
    pub age_class: AgeClass,
    pub state: String,
    pub district: String,
    pub reserve: String,
    pub stripe_match_id: Option<String>,
    pub confidence: Option<f64>,
    pub image_count: i64,
    pub last_seen: Option<String>,
    pub status: TigerStatus,
    pub collared: bool,
    pub collar_id: Option<String>,
    pub battery: Option<i64>,
    pub signal: Option<SignalStrength>,
    pub conflicts: i64,
    pub coordinates: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Tiger {
    /// Collar sub-fields must be mutually present or mutually null.
    pub fn collar_telemetry_consistent(&self) -> bool {
        if self.collared {
            self.collar_id.is_some()
        } else {
            self.collar_id.is_none() && self.battery.is_none() && self.signal.is_none()
        }
    }
}

/// A tracked elephant row as stored in the `elephants` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elephant {
    pub id: String,
    pub name: Option<String>,
    pub sex: Sex,
    pub age_class: AgeClass,
    pub state: String,
    pub district: String,
    pub reserve: String,
    pub collared: bool,
    pub collar_id: Option<String>,
    pub last_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub movement_distance: Option<f64>,
    pub battery: Option<i64>,
    pub signal: Option<SignalStrength>,
    pub last_transmission: Option<String>,
    pub status: ElephantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Elephant {
    pub fn collar_telemetry_consistent(&self) -> bool {
        if self.collared {
            self.collar_id.is_some()
        } else {
            self.collar_id.is_none() && self.battery.is_none() && self.signal.is_none()
        }
    }
}

/// Row shape used when registering a new animal. The remaining profile
/// columns come from table defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalInsert {
    pub id: String,
    pub name: String,
    pub state: String,
    pub image_count: i64,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
    pub created_at: String,
}

/// Partial update applied after flank images finish uploading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalImageUpdate {
    pub image_count: i64,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
}

/// A human-wildlife conflict report from the `conflicts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub species: Species,
    pub animal_id: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: String,
    pub status: ConflictStatus,
    pub casualties: Option<String>,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A field sighting from the `sightings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: String,
    pub animal_id: String,
    pub species: Species,
    pub name: Option<String>,
    pub location: String,
    pub reserve: String,
    pub coordinates: String,
    pub latitude: f64,
    pub longitude: f64,
    pub sex: Sex,
    pub age: AgeClass,
    pub status: CollarStatus,
    pub sighted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ===== FILTERS =====

/// Optional predicate set applied to list queries. Sentinel values of the
/// form `all-*` mean "no constraint" and are treated identically to the
/// field being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub state: Option<String>,
    pub district: Option<String>,
    pub reserve: Option<String>,
    pub year: Option<String>,
    pub species: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl FilterParams {
    fn active<'a>(value: &'a Option<String>, sentinel: &str) -> Option<&'a str> {
        match value.as_deref() {
            Some(v) if !v.is_empty() && v != sentinel => Some(v),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&str> {
        Self::active(&self.state, "all-states")
    }

    pub fn district(&self) -> Option<&str> {
        Self::active(&self.district, "all-districts")
    }

    pub fn reserve(&self) -> Option<&str> {
        Self::active(&self.reserve, "all-reserves")
    }

    pub fn year(&self) -> Option<&str> {
        Self::active(&self.year, "all-years")
    }

    pub fn species(&self) -> Option<&str> {
        Self::active(&self.species, "all-species")
    }

    pub fn status(&self) -> Option<&str> {
        Self::active(&self.status, "all-status")
    }

    pub fn search(&self) -> Option<&str> {
        match self.search.as_deref() {
            Some(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// True when every field is absent or holds its `all-*` sentinel.
    pub fn is_unconstrained(&self) -> bool {
        self.state().is_none() &&
            self.district().is_none() &&
            self.reserve().is_none() &&
            self.year().is_none() &&
            self.species().is_none() &&
            self.status().is_none() &&
            self.search().is_none()
    }
}

// ===== AGGREGATES =====

/// Dashboard counter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_tigers: u64,
    pub total_elephants: u64,
    pub collared_animals: u64,
    pub active_conflicts: u64,
    pub tiger_trend: f64,
    pub elephant_trend: f64,
    pub collared_trend: f64,
    pub conflict_trend: f64,
}

/// One pin on the map view: tigers and elephants flattened into a single
/// tagged list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalLocation {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub animal_type: String,
    pub location: String,
    pub status: String,
    pub lat: f64,
    pub lng: f64,
}

/// Projected columns fetched for the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    pub id: String,
    pub name: Option<String>,
    pub reserve: String,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ===== STRIPE IDENTIFICATION =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeMatch {
    pub tiger_id: String,
    pub name: Option<String>,
    pub confidence: f64,
}

/// Response shape of the `identify-tiger` edge function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeIdentificationResult {
    pub tiger_id: String,
    pub name: Option<String>,
    pub reserve: String,
    pub last_seen: String,
    pub status: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_matches: Option<Vec<AlternativeMatch>>,
}

/// Request payload for the `identify-tiger` edge function. A side whose
/// upload failed is submitted with a null URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyRequest {
    pub left_flank_url: Option<String>,
    pub right_flank_url: Option<String>,
    pub left_flank_filename: String,
    pub right_flank_filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_values_equal_absent_fields() {
        let sentinels = FilterParams {
            state: Some("all-states".to_string()),
            district: Some("all-districts".to_string()),
            reserve: Some("all-reserves".to_string()),
            year: Some("all-years".to_string()),
            species: Some("all-species".to_string()),
            status: Some("all-status".to_string()),
            search: None,
        };
        assert!(sentinels.is_unconstrained());
        assert_eq!(sentinels.state(), None);
        assert_eq!(sentinels.status(), None);

        let empty = FilterParams::default();
        assert!(empty.is_unconstrained());
    }

    #[test]
    fn concrete_filter_values_survive_normalization() {
        let filters = FilterParams {
            state: Some("Madhya Pradesh".to_string()),
            status: Some("Alive".to_string()),
            search: Some("Collarwali".to_string()),
            ..Default::default()
        };
        assert!(!filters.is_unconstrained());
        assert_eq!(filters.state(), Some("Madhya Pradesh"));
        assert_eq!(filters.status(), Some("Alive"));
        assert_eq!(filters.search(), Some("Collarwali"));
        assert_eq!(filters.district(), None);
    }

    #[test]
    fn enum_wire_names_match_table_values() {
        let status = serde_json::to_string(&ConflictStatus::UnderInvestigation).unwrap();
        assert_eq!(status, "\"Under Investigation\"");

        let age: AgeClass = serde_json::from_str("\"Sub-adult\"").unwrap();
        assert_eq!(age, AgeClass::SubAdult);

        let kind = serde_json::to_string(&ConflictType::CropDamage).unwrap();
        assert_eq!(kind, "\"Crop Damage\"");
    }

    #[test]
    fn conflict_row_round_trips_with_type_field() {
        let raw = serde_json::json!({
            "id": "CF-2024-001",
            "type": "Crop Damage",
            "severity": "Medium",
            "species": "Elephant",
            "animal_id": "IN-AS-008",
            "location": "Kaziranga Buffer Zone, Assam",
            "latitude": 26.5775,
            "longitude": 93.1711,
            "date": "2024-01-14",
            "status": "Under Investigation",
            "casualties": "None",
            "description": null
        });
        let conflict: Conflict = serde_json::from_value(raw).unwrap();
        assert_eq!(conflict.conflict_type, ConflictType::CropDamage);
        assert_eq!(conflict.status, ConflictStatus::UnderInvestigation);
    }
}
