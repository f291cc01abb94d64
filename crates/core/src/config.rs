use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `INFLUENCER_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Sizing and seeding for the synthetic dataset generator.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_influencer_count")]
    pub influencers: usize,
    #[serde(default = "default_post_count")]
    pub posts: usize,
    #[serde(default = "default_event_count")]
    pub tracking_events: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Number of rows in the ROAS leaderboard.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

// Default functions
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_seed() -> u64 {
    42
}
fn default_influencer_count() -> usize {
    10
}
fn default_post_count() -> usize {
    60
}
fn default_event_count() -> usize {
    300
}
fn default_leaderboard_size() -> usize {
    5
}
fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            influencers: default_influencer_count(),
            posts: default_post_count(),
            tracking_events: default_event_count(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            generator: GeneratorConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("INFLUENCER_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.generator.seed, 42);
        assert_eq!(config.generator.influencers, 10);
        assert_eq!(config.report.leaderboard_size, 5);
    }
}
