//! Fixed in-memory datasets used whenever the remote store is unavailable
//! or unconfigured. Records are synthesized per call and never mutated.

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::auth::Role;
use crate::models::{
    AgeClass,
    AlternativeMatch,
    AnimalLocation,
    CollarStatus,
    Conflict,
    ConflictSeverity,
    ConflictStatus,
    ConflictType,
    Elephant,
    ElephantStatus,
    FilterParams,
    Sex,
    Sighting,
    SignalStrength,
    Species,
    Stats,
    StripeIdentificationResult,
    Tiger,
    TigerStatus,
};

pub fn tigers() -> Vec<Tiger> {
    vec![
        Tiger {
            id: "IN-MP-045".to_string(),
            name: Some("Collarwali".to_string()),
            sex: Sex::Female,
            age_class: AgeClass::Adult,
            state: "Madhya Pradesh".to_string(),
            district: "Seoni".to_string(),
            reserve: "Pench Tiger Reserve".to_string(),
            stripe_match_id: Some("SM-2024-045".to_string()),
            confidence: Some(98.5),
            image_count: 47,
            last_seen: Some("2024-01-15".to_string()),
            status: TigerStatus::Alive,
            collared: true,
            collar_id: Some("PTR-045-C".to_string()),
            battery: Some(85),
            signal: Some(SignalStrength::Strong),
            conflicts: 0,
            coordinates: Some("21.7679° N, 79.2961° E".to_string()),
            latitude: Some(21.7679),
            longitude: Some(79.2961),
            left_image_url: None,
            right_image_url: None,
            created_at: None,
            updated_at: None,
        },
        Tiger {
            id: "IN-RJ-012".to_string(),
            name: Some("T-91".to_string()),
            sex: Sex::Male,
            age_class: AgeClass::Adult,
            state: "Rajasthan".to_string(),
            district: "Sawai Madhopur".to_string(),
            reserve: "Ranthambore".to_string(),
            stripe_match_id: Some("SM-2024-012".to_string()),
            confidence: Some(95.2),
            image_count: 123,
            last_seen: Some("2024-01-14".to_string()),
            status: TigerStatus::Monitoring,
            collared: true,
            collar_id: Some("RTR-012-C".to_string()),
            battery: Some(62),
            signal: Some(SignalStrength::Medium),
            conflicts: 2,
            coordinates: Some("26.0173° N, 76.5026° E".to_string()),
            latitude: Some(26.0173),
            longitude: Some(76.5026),
            left_image_url: None,
            right_image_url: None,
            created_at: None,
            updated_at: None,
        },
        Tiger {
            id: "IN-KA-078".to_string(),
            name: Some("Bandipur Male".to_string()),
            sex: Sex::Male,
            age_class: AgeClass::SubAdult,
            state: "Karnataka".to_string(),
            district: "Chamarajanagar".to_string(),
            reserve: "Bandipur National Park".to_string(),
            stripe_match_id: Some("SM-2024-078".to_string()),
            confidence: Some(92.8),
            image_count: 34,
            last_seen: Some("2024-01-13".to_string()),
            status: TigerStatus::Alive,
            collared: false,
            collar_id: None,
            battery: None,
            signal: None,
            conflicts: 1,
            coordinates: Some("11.6643° N, 76.6862° E".to_string()),
            latitude: Some(11.6643),
            longitude: Some(76.6862),
            left_image_url: None,
            right_image_url: None,
            created_at: None,
            updated_at: None,
        },
    ]
}

pub fn elephants() -> Vec<Elephant> {
    vec![
        Elephant {
            id: "IN-KA-023".to_string(),
            name: Some("Tusker Raja".to_string()),
            sex: Sex::Male,
            age_class: AgeClass::Adult,
            state: "Karnataka".to_string(),
            district: "Chamarajanagar".to_string(),
            reserve: "Bandipur National Park".to_string(),
            collared: true,
            collar_id: Some("BNP-023-C".to_string()),
            last_location: Some("11.6643° N, 76.6862° E".to_string()),
            latitude: Some(11.6643),
            longitude: Some(76.6862),
            movement_distance: Some(12.4),
            battery: Some(78),
            signal: Some(SignalStrength::Strong),
            last_transmission: Some("15 min ago".to_string()),
            status: ElephantStatus::Active,
            left_image_url: None,
            right_image_url: None,
            created_at: None,
            updated_at: None,
        },
        Elephant {
            id: "IN-AS-008".to_string(),
            name: None,
            sex: Sex::Female,
            age_class: AgeClass::Adult,
            state: "Assam".to_string(),
            district: "Golaghat".to_string(),
            reserve: "Kaziranga National Park".to_string(),
            collared: true,
            collar_id: Some("KNP-008-C".to_string()),
            last_location: Some("26.5775° N, 93.1711° E".to_string()),
            latitude: Some(26.5775),
            longitude: Some(93.1711),
            movement_distance: Some(8.7),
            battery: Some(92),
            signal: Some(SignalStrength::Strong),
            last_transmission: Some("32 min ago".to_string()),
            status: ElephantStatus::Active,
            left_image_url: None,
            right_image_url: None,
            created_at: None,
            updated_at: None,
        },
        Elephant {
            id: "IN-WB-034".to_string(),
            name: Some("Matriarch Mala".to_string()),
            sex: Sex::Female,
            age_class: AgeClass::Adult,
            state: "West Bengal".to_string(),
            district: "Alipurduar".to_string(),
            reserve: "Jaldapara National Park".to_string(),
            collared: false,
            collar_id: None,
            last_location: Some("26.7311° N, 89.2844° E".to_string()),
            latitude: Some(26.7311),
            longitude: Some(89.2844),
            movement_distance: None,
            battery: None,
            signal: None,
            last_transmission: None,
            status: ElephantStatus::Active,
            left_image_url: None,
            right_image_url: None,
            created_at: None,
            updated_at: None,
        },
    ]
}

pub fn conflicts() -> Vec<Conflict> {
    vec![
        Conflict {
            id: "CF-2024-001".to_string(),
            conflict_type: ConflictType::CropDamage,
            severity: ConflictSeverity::Medium,
            species: Species::Elephant,
            animal_id: Some("IN-AS-008".to_string()),
            location: "Kaziranga Buffer Zone, Assam".to_string(),
            latitude: Some(26.5775),
            longitude: Some(93.1711),
            date: "2024-01-14".to_string(),
            status: ConflictStatus::UnderInvestigation,
            casualties: Some("None".to_string()),
            description: None,
            created_at: None,
            updated_at: None,
        },
        Conflict {
            id: "CF-2024-002".to_string(),
            conflict_type: ConflictType::HumanInjury,
            severity: ConflictSeverity::High,
            species: Species::Tiger,
            animal_id: Some("IN-RJ-012".to_string()),
            location: "Ranthambore Village Area, Rajasthan".to_string(),
            latitude: Some(26.0173),
            longitude: Some(76.5026),
            date: "2024-01-12".to_string(),
            status: ConflictStatus::Resolved,
            casualties: Some("1 injured".to_string()),
            description: None,
            created_at: None,
            updated_at: None,
        },
        Conflict {
            id: "CF-2024-003".to_string(),
            conflict_type: ConflictType::LivestockLoss,
            severity: ConflictSeverity::Low,
            species: Species::Tiger,
            animal_id: Some("IN-MP-045".to_string()),
            location: "Pench Buffer Zone, MP".to_string(),
            latitude: Some(21.7679),
            longitude: Some(79.2961),
            date: "2024-01-10".to_string(),
            status: ConflictStatus::Compensated,
            casualties: Some("2 cattle".to_string()),
            description: None,
            created_at: None,
            updated_at: None,
        },
    ]
}

pub fn sightings() -> Vec<Sighting> {
    let now = Utc::now().to_rfc3339();
    vec![
        Sighting {
            id: "SIGHT-001".to_string(),
            animal_id: "IN-MP-045".to_string(),
            species: Species::Tiger,
            name: Some("Collarwali".to_string()),
            location: "Pench Tiger Reserve".to_string(),
            reserve: "Pench Tiger Reserve".to_string(),
            coordinates: "21.7679° N, 79.2961° E".to_string(),
            latitude: 21.7679,
            longitude: 79.2961,
            sex: Sex::Female,
            age: AgeClass::Adult,
            status: CollarStatus::Collared,
            sighted_at: now.clone(),
            created_at: None,
        },
        Sighting {
            id: "SIGHT-002".to_string(),
            animal_id: "IN-RJ-012".to_string(),
            species: Species::Tiger,
            name: Some("T-91".to_string()),
            location: "Ranthambore".to_string(),
            reserve: "Ranthambore".to_string(),
            coordinates: "26.0173° N, 76.5026° E".to_string(),
            latitude: 26.0173,
            longitude: 76.5026,
            sex: Sex::Male,
            age: AgeClass::Adult,
            status: CollarStatus::Collared,
            sighted_at: now.clone(),
            created_at: None,
        },
        Sighting {
            id: "SIGHT-003".to_string(),
            animal_id: "IN-KA-078".to_string(),
            species: Species::Tiger,
            name: Some("Bandipur Male".to_string()),
            location: "Bandipur National Park".to_string(),
            reserve: "Bandipur National Park".to_string(),
            coordinates: "11.6643° N, 76.6862° E".to_string(),
            latitude: 11.6643,
            longitude: 76.6862,
            sex: Sex::Male,
            age: AgeClass::SubAdult,
            status: CollarStatus::Uncollared,
            sighted_at: now,
            created_at: None,
        },
    ]
}

pub fn locations(species: Option<Species>) -> Vec<AnimalLocation> {
    let mut locations = Vec::new();

    if species.is_none() || species == Some(Species::Tiger) {
        locations.push(AnimalLocation {
            id: "IN-MP-045".to_string(),
            name: Some("Collarwali".to_string()),
            animal_type: "tiger".to_string(),
            location: "Pench, MP".to_string(),
            status: "Active".to_string(),
            lat: 21.7679,
            lng: 79.2961,
        });
        locations.push(AnimalLocation {
            id: "IN-RJ-012".to_string(),
            name: Some("T-91".to_string()),
            animal_type: "tiger".to_string(),
            location: "Ranthambore, RJ".to_string(),
            status: "Monitoring".to_string(),
            lat: 26.0173,
            lng: 76.5026,
        });
    }

    if species.is_none() || species == Some(Species::Elephant) {
        locations.push(AnimalLocation {
            id: "IN-KA-023".to_string(),
            name: Some("Tusker Raja".to_string()),
            animal_type: "elephant".to_string(),
            location: "Bandipur, KA".to_string(),
            status: "Active".to_string(),
            lat: 11.6643,
            lng: 76.6862,
        });
    }

    locations
}

pub fn stats() -> Stats {
    Stats {
        total_tigers: 3167,
        total_elephants: 27312,
        collared_animals: 428,
        active_conflicts: 23,
        tiger_trend: 8.2,
        elephant_trend: 3.5,
        collared_trend: 3.0,
        conflict_trend: -15.3,
    }
}

pub fn stripe_match() -> StripeIdentificationResult {
    StripeIdentificationResult {
        tiger_id: "IN-MP-045".to_string(),
        name: Some("Collarwali".to_string()),
        reserve: "Pench Tiger Reserve".to_string(),
        last_seen: "2024-01-15".to_string(),
        status: "Alive".to_string(),
        confidence: 95.2,
        alternative_matches: Some(vec![
            AlternativeMatch {
                tiger_id: "IN-RJ-012".to_string(),
                name: Some("T-91".to_string()),
                confidence: 87.3,
            },
            AlternativeMatch {
                tiger_id: "IN-KA-078".to_string(),
                name: Some("Bandipur Male".to_string()),
                confidence: 82.1,
            },
        ]),
    }
}

// ===== LOCAL USER LIST =====

#[derive(Debug, Clone)]
pub struct MockUser {
    pub email: &'static str,
    pub password: &'static str,
    pub role: Role,
}

pub static USERS: Lazy<Vec<MockUser>> = Lazy::new(|| {
    vec![
        MockUser {
            email: "admin@tigertrack.local",
            password: "admin123",
            role: Role::Administrator,
        },
        MockUser {
            email: "user@tigertrack.local",
            password: "password123",
            role: Role::User,
        },
        MockUser {
            email: "test@example.com",
            password: "test123",
            role: Role::User,
        },
    ]
});

// ===== FILTER APPLICATION =====
// Mock mode honors the same filter semantics as the remote query path so the
// two modes stay consistent.

fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn search_matches(search: &str, id: &str, name: Option<&str>, reserve: &str) -> bool {
    let needle = search.to_lowercase();
    id.to_lowercase().contains(&needle) ||
        name.map(|n| n.to_lowercase().contains(&needle)).unwrap_or(false) ||
        reserve.to_lowercase().contains(&needle)
}

pub fn tigers_matching(filters: &FilterParams) -> Vec<Tiger> {
    tigers()
        .into_iter()
        .filter(|t| filters.state().map(|v| t.state == v).unwrap_or(true))
        .filter(|t| filters.district().map(|v| t.district == v).unwrap_or(true))
        .filter(|t| filters.reserve().map(|v| t.reserve == v).unwrap_or(true))
        .filter(|t| filters.status().map(|v| wire_name(&t.status) == v).unwrap_or(true))
        .filter(|t| {
            filters
                .search()
                .map(|s| search_matches(s, &t.id, t.name.as_deref(), &t.reserve))
                .unwrap_or(true)
        })
        .collect()
}

pub fn elephants_matching(filters: &FilterParams) -> Vec<Elephant> {
    elephants()
        .into_iter()
        .filter(|e| filters.state().map(|v| e.state == v).unwrap_or(true))
        .filter(|e| filters.district().map(|v| e.district == v).unwrap_or(true))
        .filter(|e| filters.reserve().map(|v| e.reserve == v).unwrap_or(true))
        .filter(|e| filters.status().map(|v| wire_name(&e.status) == v).unwrap_or(true))
        .filter(|e| {
            filters
                .search()
                .map(|s| search_matches(s, &e.id, e.name.as_deref(), &e.reserve))
                .unwrap_or(true)
        })
        .collect()
}

pub fn conflicts_matching(filters: &FilterParams) -> Vec<Conflict> {
    conflicts()
        .into_iter()
        .filter(|c| {
            filters
                .state()
                .map(|v| c.location.contains(v))
                .unwrap_or(true)
        })
        .filter(|c| filters.species().map(|v| wire_name(&c.species) == v).unwrap_or(true))
        .filter(|c| filters.status().map(|v| wire_name(&c.status) == v).unwrap_or(true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasets_are_deterministic() {
        assert_eq!(tigers(), tigers());
        assert_eq!(elephants(), elephants());
        assert_eq!(conflicts(), conflicts());
        assert_eq!(stats(), stats());
    }

    #[test]
    fn collar_invariant_holds_for_every_mock_record() {
        assert!(tigers().iter().all(Tiger::collar_telemetry_consistent));
        assert!(elephants().iter().all(Elephant::collar_telemetry_consistent));
    }

    #[test]
    fn unconstrained_filters_return_everything() {
        let filters = FilterParams::default();
        assert_eq!(tigers_matching(&filters), tigers());
        assert_eq!(elephants_matching(&filters), elephants());
        assert_eq!(conflicts_matching(&filters), conflicts());
    }

    #[test]
    fn state_filter_narrows_tigers() {
        let filters = FilterParams {
            state: Some("Madhya Pradesh".to_string()),
            ..Default::default()
        };
        let matched = tigers_matching(&filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "IN-MP-045");
    }

    #[test]
    fn state_filter_narrows_conflicts() {
        let filters = FilterParams {
            state: Some("Assam".to_string()),
            ..Default::default()
        };
        let matched = conflicts_matching(&filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "CF-2024-001");
    }

    #[test]
    fn status_filter_uses_wire_names() {
        let filters = FilterParams {
            status: Some("Under Investigation".to_string()),
            ..Default::default()
        };
        let matched = conflicts_matching(&filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "CF-2024-001");
    }

    #[test]
    fn search_is_case_insensitive_across_id_name_reserve() {
        let filters = FilterParams {
            search: Some("collarwali".to_string()),
            ..Default::default()
        };
        assert_eq!(tigers_matching(&filters).len(), 1);

        let filters = FilterParams {
            search: Some("bandipur".to_string()),
            ..Default::default()
        };
        // Matches Bandipur Male by name and the reserve of one elephant.
        assert_eq!(tigers_matching(&filters).len(), 1);
        assert_eq!(elephants_matching(&filters).len(), 1);
    }

    #[test]
    fn species_scopes_mock_locations() {
        assert_eq!(locations(None).len(), 3);
        assert_eq!(locations(Some(Species::Tiger)).len(), 2);
        assert_eq!(locations(Some(Species::Elephant)).len(), 1);
    }
}
