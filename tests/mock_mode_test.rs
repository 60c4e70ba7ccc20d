use tigertrack_rs::client::TrackClient;
use tigertrack_rs::mock;
use tigertrack_rs::db_client::DatabaseConfig;
use tigertrack_rs::models::{ ElephantStatus, FilterParams, Species, TigerStatus };
use tigertrack_rs::storage::FlankImage;

fn sentinel_filters() -> FilterParams {
    FilterParams {
        state: Some("all-states".to_string()),
        district: Some("all-districts".to_string()),
        reserve: Some("all-reserves".to_string()),
        year: Some("all-years".to_string()),
        species: Some("all-species".to_string()),
        status: Some("all-status".to_string()),
        search: None,
    }
}

#[tokio::test]
async fn sentinel_filters_match_absent_filters() {
    let client = TrackClient::mock();
    let absent = FilterParams::default();
    let sentinels = sentinel_filters();

    assert_eq!(
        client.get_tigers(&absent).await,
        client.get_tigers(&sentinels).await
    );
    assert_eq!(
        client.get_elephants(&absent).await,
        client.get_elephants(&sentinels).await
    );
    assert_eq!(
        client.get_conflicts(&absent).await,
        client.get_conflicts(&sentinels).await
    );
}

#[tokio::test]
async fn unconstrained_lists_return_full_mock_datasets() {
    let client = TrackClient::mock();
    let filters = FilterParams::default();

    assert_eq!(client.get_tigers(&filters).await, mock::tigers());
    assert_eq!(client.get_elephants(&filters).await, mock::elephants());
    assert_eq!(client.get_conflicts(&filters).await, mock::conflicts());
}

#[tokio::test]
async fn filters_narrow_mock_results() {
    let client = TrackClient::mock();

    let filters = FilterParams {
        state: Some("Rajasthan".to_string()),
        ..Default::default()
    };
    let tigers = client.get_tigers(&filters).await;
    assert_eq!(tigers.len(), 1);
    assert_eq!(tigers[0].id, "IN-RJ-012");

    let filters = FilterParams {
        species: Some("Tiger".to_string()),
        ..Default::default()
    };
    let conflicts = client.get_conflicts(&filters).await;
    assert!(!conflicts.is_empty());
    assert!(conflicts.iter().all(|c| c.species == Species::Tiger));
}

#[tokio::test]
async fn lookup_by_id_finds_known_and_rejects_unknown() {
    let client = TrackClient::mock();

    let tiger = client.get_tiger_by_id("IN-MP-045").await;
    assert_eq!(tiger.unwrap().name.as_deref(), Some("Collarwali"));
    assert!(client.get_tiger_by_id("IN-ZZ-999").await.is_none());

    let elephant = client.get_elephant_by_id("IN-KA-023").await;
    assert_eq!(elephant.unwrap().name.as_deref(), Some("Tusker Raja"));
    assert!(client.get_elephant_by_id("IN-ZZ-999").await.is_none());

    let conflict = client.get_conflict_by_id("CF-2024-002").await;
    assert_eq!(conflict.unwrap().animal_id.as_deref(), Some("IN-RJ-012"));
    assert!(client.get_conflict_by_id("CF-0000-000").await.is_none());
}

#[tokio::test]
async fn sightings_respect_the_limit() {
    let client = TrackClient::mock();

    assert_eq!(client.get_recent_sightings(2).await.len(), 2);
    assert_eq!(client.get_recent_sightings(50).await.len(), mock::sightings().len());
}

#[tokio::test]
async fn locations_are_scoped_by_species() {
    let client = TrackClient::mock();

    let all = client.get_animal_locations(None).await;
    let tigers = client.get_animal_locations(Some(Species::Tiger)).await;
    let elephants = client.get_animal_locations(Some(Species::Elephant)).await;

    assert_eq!(all.len(), tigers.len() + elephants.len());
    assert!(tigers.iter().all(|l| l.animal_type == "tiger"));
    assert!(elephants.iter().all(|l| l.animal_type == "elephant"));
}

#[tokio::test]
async fn stats_match_the_mock_snapshot() {
    let client = TrackClient::mock();
    assert_eq!(client.get_stats().await, mock::stats());
}

#[tokio::test]
async fn transport_failure_degrades_to_the_full_mock_snapshot() {
    // Remote mode against a port nothing listens on: every query fails in
    // transport, not in configuration.
    let config = DatabaseConfig::new(
        "http://127.0.0.1:9".to_string(),
        "anon".to_string(),
    );
    let client = TrackClient::with_config(config);
    assert!(!client.is_mock());

    // No partially populated aggregate, exactly the mock snapshot.
    assert_eq!(client.get_stats().await, mock::stats());

    let filters = FilterParams::default();
    assert_eq!(client.get_tigers(&filters).await, mock::tigers());
    assert!(client.get_tiger_by_id("IN-ZZ-999").await.is_none());
}

#[tokio::test]
async fn identification_returns_the_mock_match() {
    let client = TrackClient::mock();

    let left = FlankImage::new("left.jpg", vec![0u8; 16]);
    let right = FlankImage::new("right.jpg", vec![0u8; 16]);
    let result = client.identify_tiger(&left, &right).await;

    assert_eq!(result, mock::stripe_match());
    assert_eq!(result.tiger_id, "IN-MP-045");
    assert!(result.alternative_matches.unwrap().len() >= 2);
}

#[tokio::test]
async fn registration_hands_out_a_state_scoped_id() {
    let client = TrackClient::mock();

    let tiger = client
        .create_tiger("Test Tiger", "MP", None, None).await
        .unwrap();
    assert!(tiger.id.starts_with("IN-MP-"));
    let suffix = tiger.id.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 3);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(tiger.name.as_deref(), Some("Test Tiger"));
    assert_eq!(tiger.image_count, 0);
    assert!(tiger.collar_telemetry_consistent());
    // Nothing is known about a freshly registered animal.
    assert_eq!(tiger.status, TigerStatus::Unknown);
    assert_eq!(tiger.last_seen, None);

    let elephant = client
        .create_elephant("Test Elephant", "AS", None, None).await
        .unwrap();
    assert!(elephant.id.starts_with("IN-AS-"));
    assert_eq!(elephant.name.as_deref(), Some("Test Elephant"));
    assert_eq!(elephant.status, ElephantStatus::Unknown);
}
