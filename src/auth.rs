//! Client-side session management: credential verification, role
//! resolution, and a persisted session record mirroring every change.

use anyhow::{ anyhow, Result };
use serde::{ Deserialize, Serialize };
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{ error, warn };

use crate::db_client::{ DatabaseConfig, TrackDbClient };
use crate::mock;

/// Persisted-storage key for the active session record.
pub const SESSION_KEY: &str = "auth_user";

/// Persisted-storage key for the per-email role cache.
pub fn role_key(email: &str) -> String {
    format!("role_{}", email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    User,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "administrator" => Role::Administrator,
            _ => Role::User,
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::User => "user",
        }
    }
}

/// The sole persisted authentication artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub email: String,
    pub role: Role,
}

/// Outcome of a login attempt. Credential failure is a structured result,
/// never an error to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResult {
    pub success: bool,
    pub error: Option<String>,
}

impl LoginResult {
    fn ok() -> Self {
        Self { success: true, error: None }
    }

    fn failed(message: &str) -> Self {
        Self { success: false, error: Some(message.to_string()) }
    }
}

// ===== SESSION STORES =====

/// Stand-in for the browser's persisted local storage. Implementations log
/// and swallow their own I/O failures; the in-memory session stays
/// authoritative for the rest of the process.
pub trait SessionStore {
    fn load_session(&self) -> Option<AuthSession>;
    fn store_session(&self, session: &AuthSession);
    fn clear_session(&self);
    fn role_for(&self, email: &str) -> Option<Role>;
    fn store_role(&self, email: &str, role: Role);
}

/// In-memory store, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load_session(&self) -> Option<AuthSession> {
        let entries = self.entries.lock().ok()?;
        entries.get(SESSION_KEY).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn store_session(&self, session: &AuthSession) {
        if let (Ok(mut entries), Ok(value)) = (self.entries.lock(), serde_json::to_value(session)) {
            entries.insert(SESSION_KEY.to_string(), value);
        }
    }

    fn clear_session(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(SESSION_KEY);
        }
    }

    fn role_for(&self, email: &str) -> Option<Role> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(&role_key(email))
            .and_then(|v| v.as_str())
            .map(Role::from)
    }

    fn store_role(&self, email: &str, role: Role) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(role_key(email), serde_json::Value::String(role.as_str().to_string()));
        }
    }
}

/// JSON-file-backed store keyed like the browser storage it replaces:
/// `auth_user` holds the session, `role_<email>` the role cache.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> HashMap<String, serde_json::Value> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) =>
                serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("Corrupt session store {}: {}", self.path.display(), e);
                    HashMap::new()
                }),
            Err(_) => HashMap::new(),
        }
    }

    fn write_all(&self, entries: &HashMap<String, serde_json::Value>) {
        let serialized = match serde_json::to_string_pretty(entries) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not serialize session store: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!("Could not persist session store {}: {}", self.path.display(), e);
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load_session(&self) -> Option<AuthSession> {
        self.read_all()
            .remove(SESSION_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    fn store_session(&self, session: &AuthSession) {
        if let Ok(value) = serde_json::to_value(session) {
            let mut entries = self.read_all();
            entries.insert(SESSION_KEY.to_string(), value);
            self.write_all(&entries);
        }
    }

    fn clear_session(&self) {
        let mut entries = self.read_all();
        if entries.remove(SESSION_KEY).is_some() {
            self.write_all(&entries);
        }
    }

    fn role_for(&self, email: &str) -> Option<Role> {
        self.read_all()
            .get(&role_key(email))
            .and_then(|v| v.as_str())
            .map(Role::from)
    }

    fn store_role(&self, email: &str, role: Role) {
        let mut entries = self.read_all();
        entries.insert(role_key(email), serde_json::Value::String(role.as_str().to_string()));
        self.write_all(&entries);
    }
}

// ===== AUTH BACKENDS =====

#[derive(Debug, Clone, PartialEq)]
struct AuthOutcome {
    authenticated: bool,
    role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
struct RoleRow {
    role: Role,
}

/// Password-grant authentication against the hosted auth endpoint, with
/// role lookup in the `users` table.
pub struct RemoteAuth {
    http_client: reqwest::Client,
    auth_url: String,
    anon_key: String,
    db_client: TrackDbClient,
}

impl RemoteAuth {
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut db_client = TrackDbClient::new(config.clone());
        db_client.connect();

        Self {
            http_client: reqwest::Client::new(),
            auth_url: config.auth_url(),
            anon_key: config.anon_key.clone(),
            db_client,
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let response = self.http_client
            .post(format!("{}/token?grant_type=password", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send().await?;

        let status = response.status();
        if status.is_success() {
            // The token response carries no application role.
            return Ok(AuthOutcome { authenticated: true, role: None });
        }
        if status.is_client_error() {
            return Ok(AuthOutcome { authenticated: false, role: None });
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(anyhow!("Auth endpoint failed: HTTP {} - {}", status, error_text))
    }

    async fn lookup_role(&self, email: &str) -> Option<Role> {
        let email = email.to_string();
        let result = self.db_client.query_one::<RoleRow>(|client| {
            client.from("users").select("role").eq("email", &email).limit(1)
        }).await;

        match result {
            Ok(row) => row.map(|r| r.role),
            Err(e) => {
                warn!("Error fetching user role: {}", e);
                None
            }
        }
    }
}

enum AuthBackend {
    Local,
    Remote(RemoteAuth),
}

fn local_authenticate(email: &str, password: &str) -> AuthOutcome {
    let authenticated = mock::USERS
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(email) && u.password == password);
    AuthOutcome { authenticated, role: None }
}

fn local_lookup_role(email: &str) -> Option<Role> {
    mock::USERS
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .map(|u| u.role)
}

// ===== AUTH GATE =====

/// Verifies credentials, resolves a role, and keeps the single in-memory
/// session mirrored to the persisted store on every change.
pub struct AuthGate<S: SessionStore> {
    store: S,
    backend: AuthBackend,
    session: Option<AuthSession>,
}

impl<S: SessionStore> AuthGate<S> {
    /// Gate backed by the fixed local user list (mock mode).
    pub fn new(store: S) -> Self {
        let session = store.load_session();
        Self { store, backend: AuthBackend::Local, session }
    }

    /// Gate backed by the hosted auth endpoint.
    pub fn with_remote(store: S, config: &DatabaseConfig) -> Self {
        let session = store.load_session();
        Self {
            store,
            backend: AuthBackend::Remote(RemoteAuth::new(config)),
            session,
        }
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    fn set_session(&mut self, session: Option<AuthSession>) {
        match &session {
            Some(s) => self.store.store_session(s),
            None => self.store.clear_session(),
        }
        self.session = session;
    }

    /// Verifies credentials and installs a session. Role resolution order:
    /// role from the auth call, then the persisted per-email mapping, then a
    /// role lookup by email, then the `user` default.
    pub async fn login(&mut self, email: &str, password: &str) -> LoginResult {
        let outcome = match &self.backend {
            AuthBackend::Local => Ok(local_authenticate(email, password)),
            AuthBackend::Remote(remote) => remote.authenticate(email, password).await,
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Login error: {}", e);
                return LoginResult::failed("Login failed. Please try again.");
            }
        };

        if !outcome.authenticated {
            return LoginResult::failed("Invalid email or password");
        }

        let mut role = outcome.role.or_else(|| self.store.role_for(email));
        if role.is_none() {
            role = match &self.backend {
                AuthBackend::Local => local_lookup_role(email),
                AuthBackend::Remote(remote) => remote.lookup_role(email).await,
            };
        }
        let role = role.unwrap_or_default();

        self.store.store_role(email, role);
        self.set_session(Some(AuthSession { email: email.to_string(), role }));

        LoginResult::ok()
    }

    /// Persists a role mapping for an email; when it matches the active
    /// session, the session role follows.
    pub fn set_role_for_user(&mut self, email: &str, role: Role) {
        self.store.store_role(email, role);

        if let Some(session) = &mut self.session {
            if session.email.eq_ignore_ascii_case(email) {
                session.role = role;
                self.store.store_session(session);
            }
        }
    }

    /// Clears the session from memory and persisted storage.
    pub fn logout(&mut self) {
        self.set_session(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn valid_mock_credentials_authenticate() {
        let mut gate = AuthGate::new(MemorySessionStore::new());
        assert!(!gate.is_authenticated());

        let result = gate.login("user@tigertrack.local", "password123").await;
        assert!(result.success);
        assert!(result.error.is_none());
        assert!(gate.is_authenticated());
        assert_eq!(gate.session().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn invalid_credentials_return_structured_failure() {
        let mut gate = AuthGate::new(MemorySessionStore::new());

        let result = gate.login("user@tigertrack.local", "wrong").await;
        assert!(!result.success);
        assert!(!result.error.as_deref().unwrap_or("").is_empty());
        assert!(!gate.is_authenticated());
    }

    #[tokio::test]
    async fn admin_role_resolves_from_user_list() {
        let mut gate = AuthGate::new(MemorySessionStore::new());

        let result = gate.login("admin@tigertrack.local", "admin123").await;
        assert!(result.success);
        assert_eq!(gate.session().unwrap().role, Role::Administrator);
    }

    #[tokio::test]
    async fn persisted_role_mapping_wins_over_list_lookup() {
        let mut gate = AuthGate::new(MemorySessionStore::new());
        gate.set_role_for_user("test@example.com", Role::Administrator);

        let result = gate.login("test@example.com", "test123").await;
        assert!(result.success);
        assert_eq!(gate.session().unwrap().role, Role::Administrator);
    }

    #[tokio::test]
    async fn set_role_updates_active_session() {
        let mut gate = AuthGate::new(MemorySessionStore::new());
        gate.login("user@tigertrack.local", "password123").await;
        assert_eq!(gate.session().unwrap().role, Role::User);

        gate.set_role_for_user("user@tigertrack.local", Role::Administrator);
        assert_eq!(gate.session().unwrap().role, Role::Administrator);

        // Other identities do not touch the active session.
        gate.set_role_for_user("someone@else.org", Role::User);
        assert_eq!(gate.session().unwrap().role, Role::Administrator);
    }

    #[tokio::test]
    async fn logout_clears_memory_and_store() {
        let store = MemorySessionStore::new();
        let mut gate = AuthGate::new(store);
        gate.login("user@tigertrack.local", "password123").await;
        assert!(gate.is_authenticated());

        gate.logout();
        assert!(!gate.is_authenticated());
        assert!(gate.session().is_none());
    }

    #[tokio::test]
    async fn session_round_trips_across_fresh_gates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let mut gate = AuthGate::new(FileSessionStore::new(&path));
            let result = gate.login("admin@tigertrack.local", "admin123").await;
            assert!(result.success);
        }

        // Fresh process start: rehydrate from persisted storage.
        let gate = AuthGate::new(FileSessionStore::new(&path));
        assert!(gate.is_authenticated());
        let session = gate.session().unwrap();
        assert_eq!(session.email, "admin@tigertrack.local");
        assert_eq!(session.role, Role::Administrator);
    }

    #[tokio::test]
    async fn logout_survives_process_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let mut gate = AuthGate::new(FileSessionStore::new(&path));
            gate.login("user@tigertrack.local", "password123").await;
            gate.logout();
        }

        let gate = AuthGate::new(FileSessionStore::new(&path));
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn file_store_tolerates_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::new(&path);
        assert!(store.load_session().is_none());

        std::fs::write(&path, "not json").unwrap();
        assert!(store.load_session().is_none());

        // Writes recover from a corrupt file.
        store.store_role("a@b.com", Role::Administrator);
        assert_eq!(store.role_for("a@b.com"), Some(Role::Administrator));
    }

    #[test]
    fn role_defaults_to_user() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::from("administrator"), Role::Administrator);
        assert_eq!(Role::from("anything else"), Role::User);
    }
}
