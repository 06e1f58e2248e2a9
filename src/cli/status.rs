//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::context::{probe_api, resolve_config_path};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;
use crate::output::json;
use crate::sync::Connectivity;

#[derive(serde::Serialize)]
struct StatusReport<'a> {
    config_file: String,
    config_found: bool,
    api_url: &'a str,
    api_token_configured: bool,
    farm_id: Option<u64>,
    connectivity: Connectivity,
}

/// Run the status command to display configuration and connectivity
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = resolve_config_path(opts.config_ref())?;
    let config_found = config_path.exists();
    let mut config = Config::load_or_default(&config_path)?;
    if let Some(url) = opts.api_url_ref() {
        config.api_url = url.to_string();
    }
    if let Some(farm) = opts.farm {
        config.farm_id = Some(farm);
    }

    let connectivity = probe_api(&config.api_url).await;

    if opts.format == Some(OutputFormat::Json) {
        let report = StatusReport {
            config_file: config_path.display().to_string(),
            config_found,
            api_url: &config.api_url,
            api_token_configured: config.api_token.is_some(),
            farm_id: config.farm_id,
            connectivity,
        };
        println!("{}", json::format_json(&report)?);
        return Ok(());
    }

    println!("{}\n", "CropSync Status".bold());

    println!("Config file: {}", config_path.display().to_string().cyan());
    if !config_found {
        println!("{} Config file not found, using defaults", "○".dimmed());
    }
    println!();

    println!("{} API URL: {}", "○".dimmed(), config.api_url.cyan());

    if config.api_token.is_some() {
        println!("{} API token configured", "✓".green());
    } else {
        println!("{} No API token configured", "○".dimmed());
        println!("  → Set `api_token` in {}", config_path.display());
    }

    if let Some(farm_id) = config.farm_id {
        println!("{} Default farm: {}", "✓".green(), farm_id);
    } else {
        println!("{} No default farm set (commands cover every farm)", "○".dimmed());
        println!("  → Pass --farm <ID> or set `farm_id` in the config");
    }

    match connectivity {
        Connectivity::Online => println!("{} API reachable", "✓".green()),
        Connectivity::Offline => println!(
            "{} API unreachable (reads fall back to cached data, changes are retried)",
            "⚠".yellow()
        ),
    }

    println!();
    Ok(())
}
