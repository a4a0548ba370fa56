/// Configuration for the Postgres-backed stores.
#[derive(Debug, Clone)]
pub struct PostgresStoreConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Table name prefix (e.g. `"chronicle_"`).
    pub prefix: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
}

impl PostgresStoreConfig {
    /// Create a new configuration with the given URL and defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: "chronicle_".to_owned(),
            max_connections: 5,
        }
    }

    /// Set the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the maximum pool size.
    #[must_use]
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}
