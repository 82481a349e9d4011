use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::ConnectionArgs;
use crate::config::{pick, standard_sources};
use crate::error::{FengError, Result};
use crate::fmt::mask_secret;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

pub fn show(connection: &ConnectionArgs) -> Result<()> {
    let sources = standard_sources(connection.to_settings(), load_settings());
    let fields: [(&str, fn(&Settings) -> &Option<String>); 5] = [
        ("endpoint", |s| &s.endpoint),
        ("project", |s| &s.project_id),
        ("database", |s| &s.database_id),
        ("api key", |s| &s.api_key),
        ("bucket", |s| &s.bucket_id),
    ];

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value", "Source"]);
    for (name, field) in fields {
        let (value, source) = match pick(&sources, field) {
            Some((v, kind)) if name == "api key" => (mask_secret(v), kind.to_string()),
            Some((v, kind)) => (v.to_string(), kind.to_string()),
            None => ("(not set)".dimmed().to_string(), String::new()),
        };
        table.add_row(vec![Cell::new(name), Cell::new(value), Cell::new(source)]);
    }
    println!("Settings file: {}", settings_path().display());
    println!("{table}");
    Ok(())
}

pub fn set(connection: &ConnectionArgs, prompt_key: bool) -> Result<()> {
    let mut settings = load_settings();
    let given = connection.to_settings();
    let mut changed = Vec::new();

    let mut apply = |name: &'static str, value: Option<String>, slot: &mut Option<String>| {
        if let Some(v) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            *slot = Some(v);
            changed.push(name);
        }
    };
    apply("endpoint", given.endpoint, &mut settings.endpoint);
    apply("project", given.project_id, &mut settings.project_id);
    apply("database", given.database_id, &mut settings.database_id);
    apply("bucket", given.bucket_id, &mut settings.bucket_id);

    let key = if prompt_key {
        Some(rpassword::prompt_password("Appwrite API key: ")?)
    } else {
        given.api_key
    };
    apply("api key", key, &mut settings.api_key);

    if changed.is_empty() {
        return Err(FengError::Other(
            "nothing to save; pass --endpoint, --project, --database, --api-key, --bucket or --prompt-key".into(),
        ));
    }
    save_settings(&settings)?;
    println!("Saved {} to {}", changed.join(", "), settings_path().display());
    Ok(())
}
