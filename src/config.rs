//! Configuration types for filing-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

/// Registry and archive connection settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Identification string sent as `User-Agent` on every request (operator + contact).
    ///
    /// The registry rejects anonymous traffic, so an empty value is a configuration error.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fixed delay before every outbound request (default: 100ms)
    #[serde(default = "default_request_delay", with = "duration_millis_serde")]
    pub request_delay: Duration,

    /// Per-request transport timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Base URL of the submissions metadata endpoint
    #[serde(default = "default_submissions_base")]
    pub submissions_base: String,

    /// Base URL of the document archive
    #[serde(default = "default_archive_base")]
    pub archive_base: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_delay: default_request_delay(),
            request_timeout: default_request_timeout(),
            submissions_base: default_submissions_base(),
            archive_base: default_archive_base(),
        }
    }
}

/// Filing selection and output layout settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives the converted PDFs (default: "./output_pdfs")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Form type to select (default: "10-K"); amendments never match
    #[serde(default = "default_form_type")]
    pub form_type: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            form_type: default_form_type(),
        }
    }
}

/// External rendering tool configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the wkhtmltopdf executable (auto-detected if None)
    #[serde(default)]
    pub renderer_path: Option<PathBuf>,

    /// Whether to search PATH for the renderer if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            renderer_path: None,
            search_path: true,
        }
    }
}

/// Background job settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// How long finished jobs stay queryable (None = until process exit)
    #[serde(default, with = "optional_duration_serde")]
    pub job_retention: Option<Duration>,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /api/docs (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Ticker to registry key (CIK) mapping
///
/// Keys are stored upper-cased; lookups are case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct CompanyMap(BTreeMap<String, String>);

impl From<BTreeMap<String, String>> for CompanyMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self::new(entries)
    }
}

impl From<CompanyMap> for BTreeMap<String, String> {
    fn from(map: CompanyMap) -> Self {
        map.0
    }
}

impl CompanyMap {
    /// Build a mapping from `(ticker, cik)` pairs
    pub fn new<I, T, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(ticker, cik)| (ticker.into().to_uppercase(), cik.into()))
                .collect(),
        )
    }

    /// Look up the registry key for a ticker
    pub fn get(&self, ticker: &str) -> Option<&str> {
        self.0.get(&ticker.to_uppercase()).map(String::as_str)
    }

    /// Whether the ticker is known
    pub fn contains(&self, ticker: &str) -> bool {
        self.get(ticker).is_some()
    }

    /// Iterate `(ticker, cik)` pairs in ticker order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    /// Number of known companies
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CompanyMap {
    fn default() -> Self {
        Self::new([
            ("AAPL", "0000320193"),
            ("META", "0001326801"),
            ("GOOGL", "0001652044"),
            ("AMZN", "0001018724"),
            ("NFLX", "0001065280"),
            ("GS", "0000886982"),
        ])
    }
}

/// Main configuration for filing-dl
///
/// Fields are organized into logical sub-configs:
/// - [`registry`](RegistryConfig): identification header, pacing, endpoints
/// - [`output`](OutputConfig): output directory and form type
/// - [`tools`](ToolsConfig): renderer binary discovery
/// - [`jobs`](JobConfig): background job retention
/// - [`api`](ApiConfig): REST API server
/// - `companies`: ticker to CIK mapping
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry connection settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Background job settings
    #[serde(default)]
    pub jobs: JobConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Known companies
    #[serde(default)]
    pub companies: CompanyMap,
}

impl Config {
    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.registry.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "an identification User-Agent is required by the registry".into(),
                key: Some("registry.user_agent".into()),
            });
        }
        for (key, value) in [
            ("registry.submissions_base", &self.registry.submissions_base),
            ("registry.archive_base", &self.registry.archive_base),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(Error::Config {
                    message: format!("not a valid URL: {value}"),
                    key: Some(key.into()),
                });
            }
        }
        if self.output.form_type.trim().is_empty() {
            return Err(Error::Config {
                message: "form type must not be empty".into(),
                key: Some("output.form_type".into()),
            });
        }
        Ok(())
    }
}

// Default value functions
fn default_user_agent() -> String {
    format!("filing-dl/{} contact@example.com", env!("CARGO_PKG_VERSION"))
}

fn default_request_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_submissions_base() -> String {
    "https://data.sec.gov/submissions".into()
}

fn default_archive_base() -> String {
    "https://www.sec.gov/Archives/edgar/data".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output_pdfs")
}

fn default_form_type() -> String {
    "10-K".into()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Request delays are sub-second, so they are written in milliseconds
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
