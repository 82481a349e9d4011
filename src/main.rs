mod appwrite;
mod cli;
mod config;
mod entities;
mod error;
mod exporter;
mod files;
mod fmt;
mod importer;
mod models;
mod remote;
mod schema;
mod settings;
mod tokenizer;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands, SchemaCommands};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fengdash=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let conn = &cli.connection;

    let result = match cli.command {
        Commands::Entities => cli::entities::run(),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(conn),
            ConfigCommands::Set { prompt_key } => cli::config::set(conn, prompt_key),
        },
        Commands::List { entity, limit } => cli::list::run(conn, entity, limit),
        Commands::Check { entity, file } => cli::check::run(entity, &file),
        Commands::Import { entity, file, yes } => cli::import::run(conn, entity, &file, yes),
        Commands::Export { entity, output } => cli::export::run(conn, entity, output),
        Commands::Delete { entity, id } => cli::files::delete(conn, entity, &id),
        Commands::Attach {
            entity,
            id,
            column,
            file,
        } => cli::files::attach(conn, entity, &id, &column, &file),
        Commands::Schema { command } => match command {
            SchemaCommands::Analyze { entity } => cli::schema::analyze(conn, entity),
            SchemaCommands::Update {
                entity,
                yes,
                throttle_ms,
            } => cli::schema::update(conn, entity, yes, throttle_ms),
        },
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fengdash", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
