//! Command execution context
//!
//! Provides a unified context for command execution: config loading with
//! flag overrides, the HTTP client, the connectivity probe and the sync engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::args::GlobalOptions;
use crate::cli::OutputFormat;
use crate::client::{FarmClient, Scope};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{Connectivity, ConsoleNotifier, FlushReport, SyncEngine, probe};

/// Upper bound for one connectivity probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Context for command execution containing config, engine, and runtime options.
pub struct CommandContext {
    /// Loaded configuration with CLI overrides applied
    pub config: Config,
    /// Sync engine over the HTTP client
    pub engine: SyncEngine<FarmClient>,
    /// Output format preference
    pub format: OutputFormat,
    /// Whether the response cache may be consulted
    pub no_cache: bool,
}

impl CommandContext {
    /// Create a new command context with full initialization.
    ///
    /// This handles:
    /// - Loading config from path (or defaults when no file exists)
    /// - Applying API URL and farm overrides
    /// - Creating the API client
    /// - Probing the API host to seed the network monitor
    ///
    /// # Errors
    /// Returns error if the config file is malformed or the client cannot be built.
    pub async fn new(opts: &GlobalOptions) -> Result<Self> {
        let config_path = resolve_config_path(opts.config_ref())?;
        let config = apply_overrides(Config::load_or_default(&config_path)?, opts)?;

        let format = opts
            .format
            .or_else(|| {
                config
                    .preferences
                    .format
                    .as_deref()
                    .and_then(OutputFormat::from_config)
            })
            .unwrap_or_default();

        let client = FarmClient::new(
            &config.api_url,
            config.api_token.clone(),
            Duration::from_secs(config.preferences.request_timeout_secs),
            config.preferences.requests_per_second,
        )?;

        let connectivity = probe_api(client.base_url()).await;
        log::debug!("Initial connectivity to {}: {}", client.base_url(), connectivity);

        let engine = SyncEngine::new(
            client,
            connectivity,
            Arc::new(ConsoleNotifier),
            Arc::new(SystemClock),
        );

        Ok(Self {
            config,
            engine,
            format,
            no_cache: opts.no_cache,
        })
    }

    /// Farm scope from `--farm` or the config, else every visible record.
    pub fn scope(&self) -> Scope {
        Scope::from_farm(self.config.farm_id)
    }

    /// Whether a read of `key` may be served from the cache.
    ///
    /// With `--no-cache` the entry is dropped, so the read goes to the API
    /// and nothing older can stand in for it.
    pub fn use_cache_for(&self, key: &str) -> bool {
        if self.no_cache && self.engine.invalidate(key) {
            log::debug!("Dropped cached entry {}", key);
        }
        !self.no_cache
    }

    /// Probe the API host again and feed the result to the engine.
    ///
    /// Returns the flush report when the probe brought the engine back online.
    pub async fn reprobe(&self) -> Option<FlushReport> {
        let connectivity = probe_api(&self.config.api_url).await;
        self.engine.connectivity_changed(connectivity).await
    }
}

/// Config file location from `--config` / `CROPSYNC_CONFIG`, else the default.
pub fn resolve_config_path(config_path: Option<&str>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(PathBuf::from(path)),
        None => Config::default_path(),
    }
}

fn apply_overrides(mut config: Config, opts: &GlobalOptions) -> Result<Config> {
    if let Some(url) = opts.api_url_ref() {
        config.api_url = url.to_string();
        config.validate()?;
    }
    if let Some(farm) = opts.farm {
        config.farm_id = Some(farm);
    }
    Ok(config)
}

/// TCP reachability of the host in `api_url`.
pub async fn probe_api(api_url: &str) -> Connectivity {
    let url = match reqwest::Url::parse(api_url) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Cannot probe unparsable API URL {}: {}", api_url, e);
            return Connectivity::Offline;
        }
    };

    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => probe(host, port, PROBE_TIMEOUT).await,
        _ => Connectivity::Offline,
    }
}
