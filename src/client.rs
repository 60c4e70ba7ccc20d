//! High-level data access for the monitoring dashboard. Every read degrades
//! to the fixed mock datasets when the remote store is unconfigured or a
//! query fails; callers never see transport errors from the read paths.

use anyhow::{ anyhow, Result };
use chrono::Utc;
use serde::Deserialize;
use tracing::{ info, warn };

use crate::db_client::{ DatabaseConfig, TrackDbClient };
use crate::mock;
use crate::models::{
    AgeClass,
    AnimalImageUpdate,
    AnimalInsert,
    AnimalLocation,
    Conflict,
    Elephant,
    ElephantStatus,
    FilterParams,
    IdentifyRequest,
    LocationRow,
    Sex,
    Sighting,
    Species,
    Stats,
    StripeIdentificationResult,
    Tiger,
    TigerStatus,
};
use crate::storage::{ object_name, FlankImage, StorageClient, StorageConfig };

/// Attempts at generating a fresh animal ID before giving up on a
/// concurrent-registration race.
const MAX_ID_RETRIES: usize = 3;

// Population trends come from the annual census review and are updated by
// hand; the store carries no historical baseline to derive them from.
const TIGER_TREND: f64 = 8.2;
const ELEPHANT_TREND: f64 = 3.5;
const COLLARED_TREND: f64 = 3.0;
const CONFLICT_TREND: f64 = -15.3;

#[derive(Debug, Clone, Deserialize)]
struct IdRow {
    id: String,
}

/// Next sequential ID for a state prefix: the highest existing numeric
/// suffix plus one, zero padded to three digits. IDs that do not parse as
/// `IN-<CODE>-<number>` are ignored.
fn next_animal_id<'a>(existing_ids: impl IntoIterator<Item = &'a str>, code: &str) -> String {
    let prefix = format!("IN-{}-", code);
    let highest = existing_ids
        .into_iter()
        .filter_map(|id| id.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("IN-{}-{:03}", code, highest + 1)
}

/// ID handed out in mock mode, derived from the clock so repeated
/// registrations in one session stay distinguishable.
fn mock_created_id(state_code: &str) -> String {
    format!("IN-{}-{:03}", state_code, Utc::now().timestamp_millis() % 1000)
}

/// Patch recording the uploaded image URLs. `None` when neither upload
/// produced a URL, so the inserted row keeps its zero image count.
fn image_update(
    left_image_url: Option<String>,
    right_image_url: Option<String>,
) -> Option<AnimalImageUpdate> {
    if left_image_url.is_none() && right_image_url.is_none() {
        return None;
    }
    Some(AnimalImageUpdate {
        image_count: 2,
        left_image_url,
        right_image_url,
    })
}

/// Unique-constraint violation on insert, as reported by the store.
fn is_duplicate_key(error: &anyhow::Error) -> bool {
    let text = error.to_string();
    text.contains("duplicate key") || text.contains("23505")
}

struct RemoteBackend {
    db: TrackDbClient,
    storage: StorageClient,
    http_client: reqwest::Client,
    functions_url: String,
    anon_key: String,
}

enum Backend {
    Remote(RemoteBackend),
    Mock,
}

/// Dashboard-facing client. The backend is chosen once at construction and
/// never switches for the life of the process.
pub struct TrackClient {
    backend: Backend,
}

impl TrackClient {
    /// Reads store credentials from the environment. Missing or empty
    /// credentials select mock mode.
    pub fn from_env() -> Self {
        match DatabaseConfig::from_env() {
            Some(config) => Self::with_config(config),
            None => {
                info!("Store credentials not set, serving mock data");
                Self::mock()
            }
        }
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        let mut db = TrackDbClient::new(config.clone());
        db.connect();
        if !db.is_configured() {
            return Self::mock();
        }

        let storage = match StorageClient::new(StorageConfig::from_database_config(&config)) {
            Ok(storage) => storage,
            Err(e) => {
                warn!("Storage client unavailable, serving mock data: {}", e);
                return Self::mock();
            }
        };

        info!("Connected to remote store at {}", config.rest_url());
        Self {
            backend: Backend::Remote(RemoteBackend {
                db,
                storage,
                http_client: reqwest::Client::new(),
                functions_url: config.functions_url(),
                anon_key: config.anon_key,
            }),
        }
    }

    /// Client pinned to the fixed mock datasets.
    pub fn mock() -> Self {
        Self { backend: Backend::Mock }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.backend, Backend::Mock)
    }

    // ===== ANIMAL LISTS =====

    pub async fn get_tigers(&self, filters: &FilterParams) -> Vec<Tiger> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::tigers_matching(filters);
            }
        };

        let result = remote.db.query::<Tiger>(|client| {
            let mut query = client.from("tigers").select("*");
            if let Some(v) = filters.state() {
                query = query.eq("state", v);
            }
            if let Some(v) = filters.district() {
                query = query.eq("district", v);
            }
            if let Some(v) = filters.reserve() {
                query = query.eq("reserve", v);
            }
            if let Some(v) = filters.status() {
                query = query.eq("status", v);
            }
            if let Some(s) = filters.search() {
                query = query.or(
                    format!("id.ilike.%{s}%,name.ilike.%{s}%,reserve.ilike.%{s}%")
                );
            }
            query.order("last_seen.desc")
        }).await;

        match result {
            Ok(tigers) => tigers,
            Err(e) => {
                warn!("Error fetching tigers, falling back to mock data: {}", e);
                mock::tigers_matching(filters)
            }
        }
    }

    pub async fn get_tiger_by_id(&self, id: &str) -> Option<Tiger> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::tigers().into_iter().find(|t| t.id == id);
            }
        };

        match remote.db.query_one::<Tiger>(|c| c.from("tigers").select("*").eq("id", id)).await {
            Ok(tiger) => tiger,
            Err(e) => {
                warn!("Error fetching tiger {}, falling back to mock data: {}", id, e);
                mock::tigers().into_iter().find(|t| t.id == id)
            }
        }
    }

    pub async fn get_elephants(&self, filters: &FilterParams) -> Vec<Elephant> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::elephants_matching(filters);
            }
        };

        let result = remote.db.query::<Elephant>(|client| {
            let mut query = client.from("elephants").select("*");
            if let Some(v) = filters.state() {
                query = query.eq("state", v);
            }
            if let Some(v) = filters.district() {
                query = query.eq("district", v);
            }
            if let Some(v) = filters.reserve() {
                query = query.eq("reserve", v);
            }
            if let Some(v) = filters.status() {
                query = query.eq("status", v);
            }
            if let Some(s) = filters.search() {
                query = query.or(
                    format!("id.ilike.%{s}%,name.ilike.%{s}%,reserve.ilike.%{s}%")
                );
            }
            query.order("last_transmission.desc")
        }).await;

        match result {
            Ok(elephants) => elephants,
            Err(e) => {
                warn!("Error fetching elephants, falling back to mock data: {}", e);
                mock::elephants_matching(filters)
            }
        }
    }

    pub async fn get_elephant_by_id(&self, id: &str) -> Option<Elephant> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::elephants().into_iter().find(|e| e.id == id);
            }
        };

        match
            remote.db.query_one::<Elephant>(|c| c.from("elephants").select("*").eq("id", id)).await
        {
            Ok(elephant) => elephant,
            Err(e) => {
                warn!("Error fetching elephant {}, falling back to mock data: {}", id, e);
                mock::elephants().into_iter().find(|e| e.id == id)
            }
        }
    }

    // ===== CONFLICTS AND SIGHTINGS =====

    pub async fn get_conflicts(&self, filters: &FilterParams) -> Vec<Conflict> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::conflicts_matching(filters);
            }
        };

        let result = remote.db.query::<Conflict>(|client| {
            let mut query = client.from("conflicts").select("*");
            if let Some(v) = filters.state() {
                query = query.eq("state", v);
            }
            if let Some(v) = filters.species() {
                query = query.eq("species", v);
            }
            if let Some(v) = filters.status() {
                query = query.eq("status", v);
            }
            if let Some(year) = filters.year() {
                query = query
                    .gte("date", format!("{}-01-01", year))
                    .lte("date", format!("{}-12-31", year));
            }
            query.order("date.desc")
        }).await;

        match result {
            Ok(conflicts) => conflicts,
            Err(e) => {
                warn!("Error fetching conflicts, falling back to mock data: {}", e);
                mock::conflicts_matching(filters)
            }
        }
    }

    pub async fn get_conflict_by_id(&self, id: &str) -> Option<Conflict> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::conflicts().into_iter().find(|c| c.id == id);
            }
        };

        match
            remote.db.query_one::<Conflict>(|c| c.from("conflicts").select("*").eq("id", id)).await
        {
            Ok(conflict) => conflict,
            Err(e) => {
                warn!("Error fetching conflict {}, falling back to mock data: {}", id, e);
                mock::conflicts().into_iter().find(|c| c.id == id)
            }
        }
    }

    pub async fn get_recent_sightings(&self, limit: usize) -> Vec<Sighting> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                let mut sightings = mock::sightings();
                sightings.truncate(limit);
                return sightings;
            }
        };

        let result = remote.db.query::<Sighting>(|c| {
            c.from("sightings").select("*").order("sighted_at.desc").limit(limit)
        }).await;

        match result {
            Ok(sightings) => sightings,
            Err(e) => {
                warn!("Error fetching sightings, falling back to mock data: {}", e);
                let mut sightings = mock::sightings();
                sightings.truncate(limit);
                sightings
            }
        }
    }

    // ===== MAP VIEW =====

    /// Tigers and elephants with known coordinates, flattened into one
    /// tagged list of map pins.
    pub async fn get_animal_locations(&self, species: Option<Species>) -> Vec<AnimalLocation> {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::locations(species);
            }
        };

        match Self::fetch_locations(remote, species).await {
            Ok(locations) => locations,
            Err(e) => {
                warn!("Error fetching animal locations, falling back to mock data: {}", e);
                mock::locations(species)
            }
        }
    }

    async fn fetch_locations(
        remote: &RemoteBackend,
        species: Option<Species>,
    ) -> Result<Vec<AnimalLocation>> {
        let mut locations = Vec::new();

        if species.is_none() || species == Some(Species::Tiger) {
            let rows = Self::fetch_location_rows(remote, "tigers").await?;
            locations.extend(rows.into_iter().filter_map(|r| Self::into_pin(r, "tiger")));
        }
        if species.is_none() || species == Some(Species::Elephant) {
            let rows = Self::fetch_location_rows(remote, "elephants").await?;
            locations.extend(rows.into_iter().filter_map(|r| Self::into_pin(r, "elephant")));
        }

        Ok(locations)
    }

    async fn fetch_location_rows(remote: &RemoteBackend, table: &str) -> Result<Vec<LocationRow>> {
        remote.db.query::<LocationRow>(|c| {
            c.from(table)
                .select("id,name,reserve,status,latitude,longitude")
                .not("is", "latitude", "null")
                .not("is", "longitude", "null")
        }).await
    }

    fn into_pin(row: LocationRow, animal_type: &str) -> Option<AnimalLocation> {
        Some(AnimalLocation {
            id: row.id,
            name: row.name,
            animal_type: animal_type.to_string(),
            location: row.reserve,
            status: row.status,
            lat: row.latitude?,
            lng: row.longitude?,
        })
    }

    // ===== DASHBOARD STATS =====

    /// Dashboard counters. Counts come from the store; a failure in any of
    /// them yields the complete mock snapshot rather than a mixed one.
    pub async fn get_stats(&self) -> Stats {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::stats();
            }
        };

        match Self::fetch_stats(remote).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Error fetching stats, falling back to mock data: {}", e);
                mock::stats()
            }
        }
    }

    async fn fetch_stats(remote: &RemoteBackend) -> Result<Stats> {
        let db = &remote.db;

        let (total_tigers, total_elephants, collared_tigers, active_conflicts) = tokio::join!(
            db.count(|c| c.from("tigers").select("id")),
            db.count(|c| c.from("elephants").select("id")),
            db.count(|c| c.from("tigers").select("id").eq("collared", "true")),
            db.count(|c| {
                c.from("conflicts").select("id").eq("status", "Under Investigation")
            })
        );

        let collared_elephants = db.count(|c| {
            c.from("elephants").select("id").eq("collared", "true")
        }).await?;

        Ok(Stats {
            total_tigers: total_tigers?,
            total_elephants: total_elephants?,
            collared_animals: collared_tigers? + collared_elephants,
            active_conflicts: active_conflicts?,
            tiger_trend: TIGER_TREND,
            elephant_trend: ELEPHANT_TREND,
            collared_trend: COLLARED_TREND,
            conflict_trend: CONFLICT_TREND,
        })
    }

    // ===== STRIPE IDENTIFICATION =====

    /// Submits a flank image pair for stripe-pattern matching. A side whose
    /// upload fails is submitted with a null URL; a failed match call
    /// degrades to the mock result like every other read.
    pub async fn identify_tiger(
        &self,
        left: &FlankImage,
        right: &FlankImage,
    ) -> StripeIdentificationResult {
        let remote = match &self.backend {
            Backend::Remote(remote) => remote,
            Backend::Mock => {
                return mock::stripe_match();
            }
        };

        let left_flank_url = Self::upload_flank(remote, "left", left).await;
        let right_flank_url = Self::upload_flank(remote, "right", right).await;

        let request = IdentifyRequest {
            left_flank_url,
            right_flank_url,
            left_flank_filename: left.file_name.clone(),
            right_flank_filename: right.file_name.clone(),
        };

        match Self::invoke_identify(remote, &request).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Stripe identification failed, falling back to mock match: {}", e);
                mock::stripe_match()
            }
        }
    }

    async fn upload_flank(
        remote: &RemoteBackend,
        side: &str,
        image: &FlankImage,
    ) -> Option<String> {
        let object_path = format!("tiger-identification/{}", object_name(side, &image.file_name));
        match remote.storage.upload(&object_path, image).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Upload of {} flank image failed: {}", side, e);
                None
            }
        }
    }

    async fn invoke_identify(
        remote: &RemoteBackend,
        request: &IdentifyRequest,
    ) -> Result<StripeIdentificationResult> {
        let response = remote.http_client
            .post(format!("{}/identify-tiger", remote.functions_url))
            .header("apikey", &remote.anon_key)
            .bearer_auth(&remote.anon_key)
            .json(request)
            .send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("identify-tiger failed: HTTP {} - {}", status, error_text));
        }

        Ok(response.json::<StripeIdentificationResult>().await?)
    }

    // ===== REGISTRATION =====

    /// Registers a new tiger and returns the stored record. Flank images
    /// are uploaded after the row exists; an upload failure leaves the
    /// corresponding URL null but keeps the registration.
    pub async fn create_tiger(
        &self,
        name: &str,
        state_code: &str,
        left: Option<FlankImage>,
        right: Option<FlankImage>,
    ) -> Result<Tiger> {
        match &self.backend {
            Backend::Mock => {
                Ok(synthesized_tiger(name, state_code, left.is_some() || right.is_some()))
            }
            Backend::Remote(remote) => {
                Self::create_animal::<Tiger>(remote, "tigers", name, state_code, left, right).await
            }
        }
    }

    /// Registers a new elephant and returns the stored record.
    pub async fn create_elephant(
        &self,
        name: &str,
        state_code: &str,
        left: Option<FlankImage>,
        right: Option<FlankImage>,
    ) -> Result<Elephant> {
        match &self.backend {
            Backend::Mock => Ok(synthesized_elephant(name, state_code)),
            Backend::Remote(remote) => {
                Self::create_animal::<Elephant>(
                    remote,
                    "elephants",
                    name,
                    state_code,
                    left,
                    right,
                ).await
            }
        }
    }

    async fn create_animal<T>(
        remote: &RemoteBackend,
        table: &str,
        name: &str,
        state_code: &str,
        left: Option<FlankImage>,
        right: Option<FlankImage>,
    ) -> Result<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let (id, inserted) = Self::insert_animal_row::<T>(remote, table, name, state_code).await?;
        info!("Registered {} record {}", table, id);

        if left.is_none() && right.is_none() {
            return Ok(inserted);
        }

        let left_image_url = match &left {
            Some(image) => Self::upload_animal_image(remote, table, &id, "left", image).await,
            None => None,
        };
        let right_image_url = match &right {
            Some(image) => Self::upload_animal_image(remote, table, &id, "right", image).await,
            None => None,
        };

        let update = match image_update(left_image_url, right_image_url) {
            Some(update) => update,
            None => {
                return Ok(inserted);
            }
        };
        let updated: Result<Vec<T>> = remote.db.update(&update, |c| {
            c.from(table).eq("id", &id)
        }).await;

        match updated {
            Ok(mut rows) if !rows.is_empty() => Ok(rows.remove(0)),
            Ok(_) => Ok(inserted),
            Err(e) => {
                warn!("Image URLs for {} were not recorded: {}", id, e);
                Ok(inserted)
            }
        }
    }

    /// Inserts the new row, regenerating the ID when a concurrent
    /// registration claimed it first.
    async fn insert_animal_row<T>(
        remote: &RemoteBackend,
        table: &str,
        name: &str,
        state_code: &str,
    ) -> Result<(String, T)>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let prefix = format!("IN-{}-", state_code);

        for _attempt in 0..MAX_ID_RETRIES {
            let existing: Vec<IdRow> = remote.db.query(|c| {
                c.from(table).select("id").like("id", format!("{}%", prefix))
            }).await?;
            let id = next_animal_id(
                existing.iter().map(|r| r.id.as_str()),
                state_code,
            );

            let insert = AnimalInsert {
                id: id.clone(),
                name: name.to_string(),
                state: state_code.to_string(),
                image_count: 0,
                left_image_url: None,
                right_image_url: None,
                created_at: Utc::now().to_rfc3339(),
            };

            match remote.db.insert::<_, T>(table, &insert).await {
                Ok(mut rows) if !rows.is_empty() => {
                    return Ok((id, rows.remove(0)));
                }
                Ok(_) => {
                    return Err(anyhow!("Insert into {} returned no row", table));
                }
                Err(e) if is_duplicate_key(&e) => {
                    warn!("ID {} was claimed concurrently, regenerating", id);
                }
                Err(e) => {
                    return Err(e);
                }
            }
        }

        Err(anyhow!("Could not allocate a unique ID after {} attempts", MAX_ID_RETRIES))
    }

    async fn upload_animal_image(
        remote: &RemoteBackend,
        table: &str,
        id: &str,
        side: &str,
        image: &FlankImage,
    ) -> Option<String> {
        let object_path = format!("{}/{}/{}", table, id, object_name(side, &image.file_name));
        match remote.storage.upload(&object_path, image).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Upload of {} image for {} failed: {}", side, id, e);
                None
            }
        }
    }
}

/// Mock-mode registration result: a minimal record with a clock-derived ID.
fn synthesized_tiger(name: &str, state_code: &str, has_images: bool) -> Tiger {
    let now = Utc::now();
    Tiger {
        id: mock_created_id(state_code),
        name: Some(name.to_string()),
        sex: Sex::Unknown,
        age_class: AgeClass::Unknown,
        state: state_code.to_string(),
        district: String::new(),
        reserve: String::new(),
        stripe_match_id: None,
        confidence: None,
        image_count: if has_images { 2 } else { 0 },
        last_seen: None,
        status: TigerStatus::Unknown,
        collared: false,
        collar_id: None,
        battery: None,
        signal: None,
        conflicts: 0,
        coordinates: None,
        latitude: None,
        longitude: None,
        left_image_url: None,
        right_image_url: None,
        created_at: Some(now.to_rfc3339()),
        updated_at: None,
    }
}

fn synthesized_elephant(name: &str, state_code: &str) -> Elephant {
    let now = Utc::now();
    Elephant {
        id: mock_created_id(state_code),
        name: Some(name.to_string()),
        sex: Sex::Unknown,
        age_class: AgeClass::Unknown,
        state: state_code.to_string(),
        district: String::new(),
        reserve: String::new(),
        collared: false,
        collar_id: None,
        last_location: None,
        latitude: None,
        longitude: None,
        movement_distance: None,
        battery: None,
        signal: None,
        last_transmission: None,
        status: ElephantStatus::Unknown,
        left_image_url: None,
        right_image_url: None,
        created_at: Some(now.to_rfc3339()),
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_is_max_plus_one() {
        let ids = ["IN-MP-001", "IN-MP-007", "IN-MP-003"];
        assert_eq!(next_animal_id(ids, "MP"), "IN-MP-008");
    }

    #[test]
    fn first_id_in_a_state_starts_at_one() {
        assert_eq!(next_animal_id(std::iter::empty::<&str>(), "MP"), "IN-MP-001");
    }

    #[test]
    fn unparseable_suffixes_are_ignored() {
        let ids = ["IN-MP-xyz", "IN-MP-", "IN-RJ-900", "IN-MP-042"];
        assert_eq!(next_animal_id(ids, "MP"), "IN-MP-043");
    }

    #[test]
    fn padding_gives_way_past_three_digits() {
        assert_eq!(next_animal_id(["IN-MP-999"], "MP"), "IN-MP-1000");
    }

    #[test]
    fn failed_uploads_never_inflate_the_image_count() {
        assert_eq!(image_update(None, None), None);

        let update = image_update(Some("left-url".to_string()), None).unwrap();
        assert_eq!(update.image_count, 2);
        assert_eq!(update.left_image_url.as_deref(), Some("left-url"));
        assert_eq!(update.right_image_url, None);

        let update = image_update(
            Some("left-url".to_string()),
            Some("right-url".to_string()),
        ).unwrap();
        assert_eq!(update.image_count, 2);
    }

    #[test]
    fn mock_ids_carry_the_state_code() {
        let id = mock_created_id("KA");
        assert!(id.starts_with("IN-KA-"));
        assert_eq!(id.len(), "IN-KA-000".len());
    }

    #[test]
    fn duplicate_key_errors_are_recognized() {
        let err = anyhow!(
            "Database insert error: duplicate key value violates unique constraint \"tigers_pkey\""
        );
        assert!(is_duplicate_key(&err));

        let err = anyhow!("Database insert error: SQLSTATE 23505");
        assert!(is_duplicate_key(&err));

        let err = anyhow!("connection reset by peer");
        assert!(!is_duplicate_key(&err));
    }

    #[tokio::test]
    async fn env_free_construction_serves_mock_data() {
        let client = TrackClient::mock();
        assert!(client.is_mock());
        assert_eq!(client.get_stats().await, mock::stats());
    }
}
