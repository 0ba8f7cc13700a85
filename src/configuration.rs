use serde::Deserialize;

use crate::domain::country::Country;
use crate::services::relevance::FilterMode;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub scrape: ScrapeSettings,
    pub filter: FilterSettings,
    pub state: StateSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeSettings {
    /// Concurrent scrape workers.
    pub workers: usize,
    /// Cap on elements taken from a matching selector.
    pub max_elements: usize,
    pub fetch_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// Randomized pre-fetch delay; politeness only, off in tests.
    pub polite_delay: bool,
    pub roster_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterSettings {
    pub mode: FilterMode,
    pub target_countries: Vec<Country>,
    /// Only consulted in country-and-title mode.
    pub title_keywords: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateSettings {
    pub seen_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipient: String,
}

/// Reads `configuration.yaml` and layers `APP__`-prefixed environment
/// variables on top (`APP__EMAIL__PASSWORD` and friends), so secrets stay
/// out of the file.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    let settings = config::Config::builder()
        .add_source(config::File::from(base_path.join("configuration.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
