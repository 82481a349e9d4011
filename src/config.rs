use std::fmt;

use zeroize::Zeroizing;

use crate::error::{FengError, Result};
use crate::settings::Settings;

pub const ENV_ENDPOINT: &str = "APPWRITE_ENDPOINT";
pub const ENV_PROJECT: &str = "APPWRITE_PROJECT_ID";
pub const ENV_DATABASE: &str = "APPWRITE_DATABASE_ID";
pub const ENV_API_KEY: &str = "APPWRITE_API_KEY";
pub const ENV_BUCKET: &str = "APPWRITE_BUCKET_ID";

/// Fully resolved connection settings. Construct through [`resolve_config`].
#[derive(Clone)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub api_key: Zeroizing<String>,
    pub bucket_id: Option<String>,
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field("api_key", &"<redacted>")
            .field("bucket_id", &self.bucket_id)
            .finish()
    }
}

/// Where a setting came from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Flags,
    Settings,
    Environment,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flags => "flag",
            Self::Settings => "settings",
            Self::Environment => "environment",
        })
    }
}

/// One layer of partially specified settings.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub kind: SourceKind,
    pub values: Settings,
}

impl ConfigSource {
    pub fn flags(values: Settings) -> Self {
        Self { kind: SourceKind::Flags, values }
    }

    pub fn settings(values: Settings) -> Self {
        Self { kind: SourceKind::Settings, values }
    }

    /// Read the `APPWRITE_*` variables through `lookup` (normally `std::env::var`).
    pub fn environment<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            kind: SourceKind::Environment,
            values: Settings {
                endpoint: lookup(ENV_ENDPOINT),
                project_id: lookup(ENV_PROJECT),
                database_id: lookup(ENV_DATABASE),
                api_key: lookup(ENV_API_KEY),
                bucket_id: lookup(ENV_BUCKET),
            },
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|v| !v.trim().is_empty())
}

/// First non-empty value of a field across `sources`, with the source it came from.
pub fn pick<'a>(
    sources: &'a [ConfigSource],
    field: impl Fn(&Settings) -> &Option<String>,
) -> Option<(&'a str, SourceKind)> {
    sources
        .iter()
        .find_map(|s| non_empty(field(&s.values)).map(|v| (v.trim(), s.kind)))
}

/// Fold ordered sources into a complete configuration, failing on the first missing field.
pub fn resolve_config(sources: &[ConfigSource]) -> Result<AppwriteConfig> {
    let required = |name: &'static str, field: fn(&Settings) -> &Option<String>| {
        pick(sources, field)
            .map(|(v, _)| v.to_string())
            .ok_or(FengError::MissingConfig(name))
    };

    let endpoint = required("endpoint", |s| &s.endpoint)?;
    let project_id = required("project", |s| &s.project_id)?;
    let database_id = required("database", |s| &s.database_id)?;
    let api_key = required("api key", |s| &s.api_key)?;
    let bucket_id = pick(sources, |s| &s.bucket_id).map(|(v, _)| v.to_string());

    Ok(AppwriteConfig {
        endpoint: endpoint.trim_end_matches('/').to_string(),
        project_id,
        database_id,
        api_key: Zeroizing::new(api_key),
        bucket_id,
    })
}

/// The standard chain: flags, then the settings file, then the process environment.
pub fn standard_sources(flags: Settings, stored: Settings) -> Vec<ConfigSource> {
    dotenvy::dotenv().ok();
    vec![
        ConfigSource::flags(flags),
        ConfigSource::settings(stored),
        ConfigSource::environment(|k| std::env::var(k).ok()),
    ]
}
