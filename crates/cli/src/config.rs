//! Demo configuration read from the process environment.
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct CliConfig {
    /// Content directory; the embedded content is used when unset.
    pub data_dir: Option<PathBuf>,
    /// Directory for a `duel.log` file next to stderr output.
    pub log_dir: Option<PathBuf>,
    pub ticks: u64,
    pub seed: u64,
    /// Ticks the predicting peer runs ahead of the authority.
    pub lead: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_dir: None,
            ticks: 120,
            seed: 0x5eed,
            lead: 2,
        }
    }
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ABILITY_DATA_DIR` - Content directory (default: embedded content)
    /// - `ABILITY_LOG_DIR` - Also write logs to a file here (default: stderr only)
    /// - `ABILITY_TICKS` - Authority ticks to simulate (default: 120)
    /// - `ABILITY_SEED` - Root seed of the hero (default: 0x5eed)
    /// - `ABILITY_LEAD` - Prediction lead in ticks (default: 2)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.data_dir = env::var("ABILITY_DATA_DIR").ok().map(PathBuf::from);
        config.log_dir = env::var("ABILITY_LOG_DIR").ok().map(PathBuf::from);

        if let Some(ticks) = read_env::<u64>("ABILITY_TICKS") {
            config.ticks = ticks.max(1);
        }
        if let Some(seed) = read_env::<u64>("ABILITY_SEED") {
            config.seed = seed;
        }
        if let Some(lead) = read_env::<u64>("ABILITY_LEAD") {
            config.lead = lead;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
