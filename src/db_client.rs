use anyhow::{ anyhow, Result };
use postgrest::Postgrest;
use serde::{ Deserialize, Serialize };
use tracing::warn;
use url::Url;

/// Names of the environment variables gating all remote behavior. Their
/// absence is the switch between live and mock modes.
pub const ENV_SUPABASE_URL: &str = "TIGERTRACK_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "TIGERTRACK_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub supabase_url: String,
    pub anon_key: String,
}

impl DatabaseConfig {
    /// Reads the store URL and access key from the environment. Returns
    /// `None` when either is unset or empty; that is mock mode, not an error.
    pub fn from_env() -> Option<Self> {
        dotenv::dotenv().ok();

        let supabase_url = std::env::var(ENV_SUPABASE_URL).unwrap_or_default();
        let anon_key = std::env::var(ENV_SUPABASE_ANON_KEY).unwrap_or_default();

        if supabase_url.is_empty() || anon_key.is_empty() {
            return None;
        }

        Some(Self::new(supabase_url, anon_key))
    }

    pub fn new(supabase_url: String, anon_key: String) -> Self {
        // Accept URLs with or without the PostgREST suffix.
        let supabase_url = supabase_url
            .trim_end_matches('/')
            .trim_end_matches("/rest/v1")
            .to_string();
        Self { supabase_url, anon_key }
    }

    /// PostgREST endpoint for table queries.
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }

    /// Blob storage endpoint.
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.supabase_url)
    }

    /// Password-grant auth endpoint.
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.supabase_url)
    }

    /// Edge function invocation endpoint.
    pub fn functions_url(&self) -> String {
        format!("{}/functions/v1", self.supabase_url)
    }
}

/// Thin wrapper around the PostgREST client. Constructed once per process;
/// a malformed URL degrades to "not configured" instead of raising.
pub struct TrackDbClient {
    config: DatabaseConfig,
    client: Option<Postgrest>,
}

impl std::fmt::Debug for TrackDbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackDbClient")
            .field("rest_url", &self.config.rest_url())
            .field(
                "client",
                if self.client.is_some() {
                    &"Connected"
                } else {
                    &"Disconnected"
                },
            )
            .finish()
    }
}

impl TrackDbClient {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, client: None }
    }

    /// Builds the PostgREST client. This is the only failure-containment
    /// point for connectivity: an unparseable URL leaves the client absent.
    pub fn connect(&mut self) {
        let rest_url = self.config.rest_url();

        if let Err(e) = Url::parse(&rest_url) {
            warn!("Invalid store URL {}, falling back to mock data: {}", rest_url, e);
            self.client = None;
            return;
        }

        let client = Postgrest::new(&rest_url)
            .insert_header("apikey", &self.config.anon_key)
            .insert_header("Authorization", format!("Bearer {}", self.config.anon_key));

        self.client = Some(client);
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn client(&self) -> Result<&Postgrest> {
        self.client.as_ref().ok_or_else(|| anyhow!("No PostgREST client available"))
    }

    /// Parses a PostgREST response body as rows of `T`, surfacing the error
    /// payload when the store rejected the request.
    fn parse_rows<T>(body: &str, context: &str) -> Result<Vec<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        if let Ok(rows) = serde_json::from_str::<Vec<T>>(body) {
            return Ok(rows);
        }

        if let Ok(error_response) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(error_msg) = error_response.get("error") {
                return Err(anyhow!("Database {} error: {}", context, error_msg));
            } else if let Some(message) = error_response.get("message") {
                return Err(anyhow!("Database {} message: {}", context, message));
            }
            return Err(anyhow!("Database {} returned unexpected format: {}", context, body));
        }

        Err(anyhow!("Failed to parse database {} response as JSON: {}", context, body))
    }

    /// Executes a query and returns the matching rows.
    pub async fn query<T>(
        &self,
        query_builder: impl FnOnce(&Postgrest) -> postgrest::Builder,
    ) -> Result<Vec<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let client = self.client()?;

        let response = query_builder(client).execute().await?;
        let body = response.text().await?;

        Self::parse_rows(&body, "query")
    }

    /// Executes a query expected to match at most one row.
    pub async fn query_one<T>(
        &self,
        query_builder: impl FnOnce(&Postgrest) -> postgrest::Builder,
    ) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let rows: Vec<T> = self.query(query_builder).await?;
        Ok(rows.into_iter().next())
    }

    /// Issues an exact-count query and parses the total from the
    /// `content-range` header (`items 0-24/3167`).
    pub async fn count(
        &self,
        query_builder: impl FnOnce(&Postgrest) -> postgrest::Builder,
    ) -> Result<u64> {
        let client = self.client()?;

        let response = query_builder(client).exact_count().execute().await?;

        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("Count query returned no content-range header"))?;

        let total = content_range
            .rsplit('/')
            .next()
            .and_then(|n| n.parse::<u64>().ok())
            .ok_or_else(|| anyhow!("Unparseable content-range header: {}", content_range))?;

        Ok(total)
    }

    /// Inserts a row and returns the stored representation.
    pub async fn insert<I, T>(&self, table: &str, data: &I) -> Result<Vec<T>>
    where
        I: serde::Serialize,
        T: for<'de> serde::Deserialize<'de>,
    {
        let client = self.client()?;

        let json_data = serde_json::to_string(data)?;
        let response = client.from(table).insert(&json_data).execute().await?;
        let body = response.text().await?;

        Self::parse_rows(&body, "insert")
    }

    /// Updates rows selected by the filter and returns the new versions.
    pub async fn update<I, T>(
        &self,
        data: &I,
        filter_builder: impl FnOnce(&Postgrest) -> postgrest::Builder,
    ) -> Result<Vec<T>>
    where
        I: serde::Serialize,
        T: for<'de> serde::Deserialize<'de>,
    {
        let client = self.client()?;

        let json_data = serde_json::to_string(data)?;
        let response = filter_builder(client).update(&json_data).execute().await?;
        let body = response.text().await?;

        Self::parse_rows(&body, "update")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_normalizes_rest_suffix() {
        let plain = DatabaseConfig::new(
            "https://demo.supabase.co".to_string(),
            "anon".to_string(),
        );
        let suffixed = DatabaseConfig::new(
            "https://demo.supabase.co/rest/v1".to_string(),
            "anon".to_string(),
        );

        assert_eq!(plain.rest_url(), "https://demo.supabase.co/rest/v1");
        assert_eq!(plain.rest_url(), suffixed.rest_url());
        assert_eq!(plain.functions_url(), "https://demo.supabase.co/functions/v1");
        assert_eq!(plain.storage_url(), "https://demo.supabase.co/storage/v1");
    }

    #[test]
    fn malformed_url_degrades_to_unconfigured() {
        let config = DatabaseConfig::new("not a url at all".to_string(), "anon".to_string());
        let mut db = TrackDbClient::new(config);
        db.connect();
        assert!(!db.is_configured());
    }

    #[test]
    fn valid_url_connects() {
        let config = DatabaseConfig::new(
            "https://demo.supabase.co".to_string(),
            "anon".to_string(),
        );
        let mut db = TrackDbClient::new(config);
        db.connect();
        assert!(db.is_configured());
    }

    #[test]
    fn parse_rows_surfaces_error_payload() {
        let err = TrackDbClient::parse_rows::<serde_json::Value>(
            r#"{"message":"permission denied for table tigers"}"#,
            "query",
        )
        .unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }
}
