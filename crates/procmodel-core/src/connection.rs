//! Connection strings: a builder for SQL Server connection strings and a
//! thread-safe registry of named connections.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, check_argument};

/// Default initial catalog.
pub const DEFAULT_CATALOG: &str = "Master";
/// Default application name.
pub const DEFAULT_APPLICATION_NAME: &str = "SqlDataLayer";

fn default_catalog() -> String {
    DEFAULT_CATALOG.to_string()
}

fn default_application_name() -> String {
    DEFAULT_APPLICATION_NAME.to_string()
}

/// SQL Server connection string settings.
///
/// Deserializable, so it can be read straight from JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlConnectionString {
    /// Server name or address.
    pub server: String,
    /// Use Windows integrated security.
    #[serde(default)]
    pub integrated_security: bool,
    /// Database to open (default: `Master`).
    #[serde(default = "default_catalog")]
    pub initial_catalog: String,
    /// Application name reported to the server (default: `SqlDataLayer`).
    #[serde(default = "default_application_name")]
    pub application_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SqlConnectionString {
    /// Integrated security, no credentials.
    pub fn integrated(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            integrated_security: true,
            initial_catalog: default_catalog(),
            application_name: default_application_name(),
            user_id: None,
            password: None,
        }
    }

    /// SQL authentication with a user id and password.
    pub fn with_credentials(
        server: impl Into<String>,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            integrated_security: false,
            user_id: Some(user_id.into()),
            password: Some(password.into()),
            ..Self::integrated(server)
        }
    }

    /// Set the initial catalog.
    #[must_use]
    pub fn initial_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.initial_catalog = catalog.into();
        self
    }

    /// Set the application name.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Toggle integrated security.
    #[must_use]
    pub fn integrated_security(mut self, enabled: bool) -> Self {
        self.integrated_security = enabled;
        self
    }

    /// Whether a user id or password was given.
    pub fn has_credentials(&self) -> bool {
        self.user_id.is_some() || self.password.is_some()
    }

    /// Render the connection string.
    pub fn to_connection_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SqlConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Server={};Integrated Security={};Initial Catalog={};Application Name={};",
            self.server, self.integrated_security, self.initial_catalog, self.application_name
        )?;
        if self.has_credentials() {
            write!(
                f,
                "User ID={};Password={};",
                self.user_id.as_deref().unwrap_or_default(),
                self.password.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

/// A connection given either verbatim or as settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionSource {
    Raw(String),
    Settings(SqlConnectionString),
}

impl ConnectionSource {
    fn render(&self) -> String {
        match self {
            ConnectionSource::Raw(s) => s.clone(),
            ConnectionSource::Settings(settings) => settings.to_connection_string(),
        }
    }
}

/// One named connection in a [`ConnectionsConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedConnection {
    pub key: String,
    pub connection: ConnectionSource,
}

/// Serialized form of a [`ConnectionStrings`] registry.
///
/// ```json
/// {
///   "current": "reporting",
///   "connections": [
///     { "key": "main", "connection": "Server=db;Integrated Security=true;" },
///     { "key": "reporting", "connection": { "server": "replica", "initial_catalog": "Reports" } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub connections: Vec<NamedConnection>,
}

#[derive(Debug, Default)]
struct Registry {
    /// Insertion order is kept so a deleted current key can fall back to the
    /// most recent remaining entry.
    entries: Vec<(String, String)>,
    current: Option<String>,
}

impl Registry {
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

/// Thread-safe registry of connection strings by key, with a current key.
///
/// Keys are case-sensitive. Reads take a shared lock; updates are serialized.
#[derive(Debug, Default)]
pub struct ConnectionStrings {
    registry: RwLock<Registry>,
}

impl ConnectionStrings {
    /// An empty registry with no current connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding one connection, which becomes current.
    pub fn with(key: &str, connection: impl Into<String>) -> Result<Self> {
        let registry = Self::new();
        registry.upsert(key, connection)?;
        Ok(registry)
    }

    /// Build a registry from its serialized form.
    ///
    /// `current` is applied only when it names a listed key; otherwise the
    /// first listed connection is current.
    pub fn from_config(config: &ConnectionsConfig) -> Result<Self> {
        let registry = Self::new();
        for named in &config.connections {
            registry.upsert(&named.key, named.connection.render())?;
        }
        if let Some(current) = &config.current {
            registry.set_current(current)?;
        }
        Ok(registry)
    }

    /// Parse a JSON [`ConnectionsConfig`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ConnectionsConfig = serde_json::from_str(json)
            .map_err(|e| Error::argument("config", format!("invalid connections config: {e}")))?;
        Self::from_config(&config)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a connection or replace an existing one.
    ///
    /// When this leaves exactly one entry, that key becomes current.
    pub fn upsert(&self, key: &str, connection: impl Into<String>) -> Result<()> {
        let connection = connection.into();
        check_argument(key, "key")?;
        check_argument(&connection, "connection")?;

        let mut registry = self.write();
        match registry.position(key) {
            Some(index) => registry.entries[index].1 = connection,
            None => registry.entries.push((key.to_string(), connection)),
        }
        if registry.entries.len() == 1 {
            registry.current = Some(key.to_string());
        }
        tracing::debug!(key, entries = registry.entries.len(), "Upserted connection");
        Ok(())
    }

    /// Insert or replace a connection given as settings.
    pub fn upsert_settings(&self, key: &str, settings: &SqlConnectionString) -> Result<()> {
        self.upsert(key, settings.to_connection_string())
    }

    /// Make `key` current. Unknown keys leave the current key unchanged.
    pub fn set_current(&self, key: &str) -> Result<()> {
        check_argument(key, "key")?;
        let mut registry = self.write();
        if registry.position(key).is_some() {
            registry.current = Some(key.to_string());
        } else {
            tracing::debug!(key, "Ignoring unknown current connection key");
        }
        Ok(())
    }

    /// Remove a connection.
    ///
    /// Deleting the current key moves current to the most recently inserted
    /// remaining key, or clears it when the registry is empty.
    pub fn delete(&self, key: &str) -> Result<()> {
        check_argument(key, "key")?;
        let mut registry = self.write();
        if let Some(index) = registry.position(key) {
            registry.entries.remove(index);
        }
        if registry.current.as_deref() == Some(key) {
            registry.current = registry.entries.last().map(|(k, _)| k.clone());
            tracing::debug!(
                deleted = key,
                current = registry.current.as_deref(),
                "Deleted current connection"
            );
        }
        Ok(())
    }

    /// Connection for `key`, `None` if it is not registered.
    pub fn select(&self, key: &str) -> Result<Option<String>> {
        check_argument(key, "key")?;
        let registry = self.read();
        Ok(registry
            .position(key)
            .map(|index| registry.entries[index].1.clone()))
    }

    /// Connection for the current key, `None` while the registry is empty.
    pub fn current(&self) -> Option<String> {
        let registry = self.read();
        let key = registry.current.as_deref()?;
        registry
            .position(key)
            .map(|index| registry.entries[index].1.clone())
    }

    /// The current key.
    pub fn current_key(&self) -> Option<String> {
        self.read().current.clone()
    }

    /// Registered keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.read().entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}
