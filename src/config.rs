use crate::data::lecture::Lecture;
use crate::error::ConfigurationError;
use crate::util;
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("workload".to_string())
}

fn default_session_days() -> i64 {
    7
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    MongoDb,
    /// Nothing is persisted; meant for development.
    Memory,
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::MongoDb
    }
}

fn default_remote_user_header() -> String {
    "X-Remote-User".to_string()
}

fn default_identifier_marker() -> Option<String> {
    Some("de/shibboleth!".to_string())
}

fn default_attribute_headers() -> Vec<String> {
    vec![crate::identity::TERMS_OF_STUDY.to_string()]
}

/// Where the fronting service provider puts the identity assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_remote_user_header")]
    pub remote_user_header: String,
    /// Provider specific part of the remote user identifier that precedes
    /// the student's persistent id.
    #[serde(default = "default_identifier_marker")]
    pub identifier_marker: Option<String>,
    #[serde(default = "default_attribute_headers")]
    pub attribute_headers: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            remote_user_header: default_remote_user_header(),
            identifier_marker: default_identifier_marker(),
            attribute_headers: default_attribute_headers(),
        }
    }
}

fn default_client_marker_header() -> String {
    "User-Agent".to_string()
}

fn default_client_marker() -> String {
    "Workload_App_Android_CSRF_EXCEMPT".to_string()
}

/// The mobile client identifies itself by including the marker in a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_client_marker_header")]
    pub client_marker_header: String,
    #[serde(default = "default_client_marker")]
    pub client_marker: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            client_marker_header: default_client_marker_header(),
            client_marker: default_client_marker(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default)]
    pub storage: StorageKind,
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    #[serde(default = "default_session_days")]
    pub session_days: i64,

    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub api: ApiConfig,

    /// Seeded into the store on every start.
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            storage: StorageKind::default(),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            session_days: default_session_days(),
            identity: IdentityConfig::default(),
            api: ApiConfig::default(),
            lectures: vec![],
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(dir) = self.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}
