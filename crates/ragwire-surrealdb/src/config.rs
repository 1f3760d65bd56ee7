use ragwire_core::RagwireError;

/// Distance metric used for scoring and for the MTREE index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distance {
    /// Cosine similarity, higher is closer.
    #[default]
    Cosine,
    /// Euclidean distance, lower is closer.
    Euclidean,
    /// Manhattan distance, lower is closer.
    Manhattan,
}

impl Distance {
    /// SurrealQL function computing the score between a stored and a query vector.
    pub fn score_function(&self) -> &'static str {
        match self {
            Distance::Cosine => "vector::similarity::cosine",
            Distance::Euclidean => "vector::distance::euclidean",
            Distance::Manhattan => "vector::distance::manhattan",
        }
    }

    /// Keyword used in `DEFINE INDEX ... DIST <keyword>`.
    pub fn index_keyword(&self) -> &'static str {
        match self {
            Distance::Cosine => "COSINE",
            Distance::Euclidean => "EUCLIDEAN",
            Distance::Manhattan => "MANHATTAN",
        }
    }

    pub fn higher_is_closer(&self) -> bool {
        matches!(self, Distance::Cosine)
    }
}

/// How requests authenticate against the database.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SurrealAuth {
    #[default]
    None,
    /// HTTP basic auth with a root, namespace or database user.
    Basic { username: String, password: String },
    /// A JWT obtained from a previous `signin`.
    Bearer(String),
}

/// Configuration for connecting to a SurrealDB instance.
#[derive(Debug, Clone)]
pub struct SurrealConfig {
    /// Server URL (default: `http://localhost:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Table holding the documents. Must be a plain identifier.
    pub table: String,
    pub auth: SurrealAuth,
    /// Embedding dimension. Required by [`ensure_index`](crate::SurrealVectorStore::ensure_index)
    /// and used to reject mismatched vectors before they are sent.
    pub dimension: Option<usize>,
    pub distance: Distance,
}

impl SurrealConfig {
    pub fn new(
        url: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            namespace: namespace.into(),
            database: database.into(),
            table: table.into(),
            auth: SurrealAuth::None,
            dimension: None,
            distance: Distance::default(),
        }
    }

    /// Read the connection from `SURREALDB_URL`, `SURREALDB_NS`, `SURREALDB_DB`,
    /// `SURREALDB_TABLE`, `SURREALDB_USER` and `SURREALDB_PASS`.
    ///
    /// Unset values fall back to `http://localhost:8000`, `ns`, `db` and `documents`.
    /// Credentials are only used when both user and password are set.
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let config = Self::new(
            var("SURREALDB_URL", "http://localhost:8000"),
            var("SURREALDB_NS", "ns"),
            var("SURREALDB_DB", "db"),
            var("SURREALDB_TABLE", "documents"),
        );
        match (std::env::var("SURREALDB_USER"), std::env::var("SURREALDB_PASS")) {
            (Ok(user), Ok(pass)) => config.with_credentials(user, pass),
            _ => config,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = SurrealAuth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = SurrealAuth::Bearer(token.into());
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub(crate) fn rpc_url(&self) -> String {
        format!("{}/rpc", self.url.trim_end_matches('/'))
    }

    /// Check the parts of the config that end up spliced into SurrealQL text.
    pub fn validate(&self) -> Result<(), RagwireError> {
        if !is_identifier(&self.table) {
            return Err(RagwireError::Config(format!(
                "invalid SurrealDB table name: {:?}",
                self.table
            )));
        }
        if self.namespace.is_empty() || self.database.is_empty() {
            return Err(RagwireError::Config(
                "SurrealDB namespace and database must not be empty".to_string(),
            ));
        }
        if self.dimension == Some(0) {
            return Err(RagwireError::Config(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
