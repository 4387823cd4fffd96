use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HelpboardConfig {
    pub api_port: u16,
    pub paths: HelpboardPaths,
    pub stats: StatsConfig,
}

impl HelpboardConfig {
    pub fn from_env() -> Result<Self> {
        let paths = HelpboardPaths::discover()?;
        let api_port = env::var("HELPBOARD_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let stats = StatsConfig::from_env();
        Ok(Self {
            api_port,
            paths,
            stats,
        })
    }

    pub fn new(api_port: u16, paths: HelpboardPaths) -> Self {
        Self {
            api_port,
            paths,
            stats: StatsConfig::default(),
        }
    }

    pub fn with_stats(api_port: u16, paths: HelpboardPaths, stats: StatsConfig) -> Self {
        Self {
            api_port,
            paths,
            stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub refresh_interval: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
        }
    }
}

impl StatsConfig {
    pub fn from_env() -> Self {
        let refresh_interval = env::var("HELPBOARD_STATS_REFRESH_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Self::default().refresh_interval);
        Self { refresh_interval }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HelpboardPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl HelpboardPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("helpboard.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            logs_dir,
        })
    }
}
