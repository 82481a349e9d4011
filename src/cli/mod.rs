pub mod check;
pub mod config;
pub mod entities;
pub mod export;
pub mod files;
pub mod import;
pub mod list;
pub mod schema;

use std::io::Write;

use clap::{Args, Parser, Subcommand};

use crate::appwrite::AppwriteClient;
use crate::config::{resolve_config, standard_sources, AppwriteConfig};
use crate::entities::{resolve, EntityKind};
use crate::error::Result;
use crate::schema::DEFAULT_THROTTLE;
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "fengdash",
    version,
    about = "CSV import/export and schema migration for the 鋒兄 Appwrite dashboard."
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log requests and per-record progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides. Anything left unset falls back to the settings file, then the
/// `APPWRITE_*` environment variables.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Appwrite API endpoint, e.g. https://cloud.appwrite.io/v1
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
    /// Project id
    #[arg(long, global = true)]
    pub project: Option<String>,
    /// Database id
    #[arg(long, global = true)]
    pub database: Option<String>,
    /// Server API key
    #[arg(long = "api-key", global = true)]
    pub api_key: Option<String>,
    /// Storage bucket id, needed for file operations
    #[arg(long, global = true)]
    pub bucket: Option<String>,
}

impl ConnectionArgs {
    pub fn to_settings(&self) -> Settings {
        Settings {
            endpoint: self.endpoint.clone(),
            project_id: self.project.clone(),
            database_id: self.database.clone(),
            api_key: self.api_key.clone(),
            bucket_id: self.bucket.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the supported entities and their CSV columns.
    Entities,
    /// Show or change the stored connection settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// List the documents of an entity's collection.
    List {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Show at most this many documents
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Validate a CSV file against an entity without touching the remote store.
    Check {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Path to the CSV file
        file: String,
    },
    /// Import a CSV file, updating documents whose key already exists and creating the rest.
    Import {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Path to the CSV file
        file: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export an entity's collection to CSV.
    Export {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Output path (default: ./appwrite-<Entity>.csv)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Delete a document and the storage files it references.
    Delete {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Document id
        id: String,
    },
    /// Upload a file and link it from a document's file column.
    Attach {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Document id
        id: String,
        /// File column, e.g. photo or file1
        column: String,
        /// Path of the file to upload
        file: String,
    },
    /// Compare a collection's attributes with the expected schema, or migrate it.
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved settings and where each value comes from.
    Show,
    /// Save the connection flags given on this command line to the settings file.
    Set {
        /// Read the API key from the terminal instead of a flag
        #[arg(long = "prompt-key")]
        prompt_key: bool,
    },
}

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Report missing, narrower, conflicting and extra attributes.
    Analyze {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
    },
    /// Create missing attributes and widen string attributes.
    Update {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Pause between attribute operations, in milliseconds
        #[arg(long = "throttle-ms", default_value_t = DEFAULT_THROTTLE.as_millis() as u64)]
        throttle_ms: u64,
    },
}

fn parse_entity(name: &str) -> std::result::Result<EntityKind, String> {
    resolve(name).map_err(|e| e.to_string())
}

/// Resolve the configuration and build a client. Fails before any network traffic when
/// a required setting is missing.
pub(crate) fn connect(connection: &ConnectionArgs) -> Result<(AppwriteConfig, AppwriteClient)> {
    let sources = standard_sources(connection.to_settings(), load_settings());
    let config = resolve_config(&sources)?;
    let client = AppwriteClient::new(&config)?;
    Ok((config, client))
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fengdash", "export", "bank", "--endpoint", "https://x/v1", "--api-key", "k",
        ])
        .unwrap();
        assert_eq!(cli.connection.endpoint.as_deref(), Some("https://x/v1"));
        assert_eq!(cli.connection.to_settings().api_key.as_deref(), Some("k"));
        assert!(matches!(cli.command, Commands::Export { entity: EntityKind::Bank, output: None }));
    }

    #[test]
    fn test_entity_names_are_case_insensitive() {
        let cli = Cli::try_parse_from(["fengdash", "check", "CommonDocument", "a.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { entity: EntityKind::CommonDocument, .. }));
        assert!(Cli::try_parse_from(["fengdash", "check", "music", "a.csv"]).is_err());
    }

    #[test]
    fn test_throttle_default() {
        let cli = Cli::try_parse_from(["fengdash", "schema", "update", "article"]).unwrap();
        match cli.command {
            Commands::Schema { command: SchemaCommands::Update { throttle_ms, yes, .. } } => {
                assert_eq!(throttle_ms, 200);
                assert!(!yes);
            }
            _ => panic!("expected schema update"),
        }
    }
}
