use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use serde_json::from_reader;

use crate::error::ConfigError;
use crate::reducer::DEFAULT_WORKER_COUNT;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Reduce,
    Sweep,
    Counter,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    File,
    Random,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    #[serde(default = "default_mode")]
    pub mode: RunMode,

    #[serde(default = "default_data_source")]
    pub data_source: DataSource,
    // path of a headerless csv, used when data_source is "file"
    #[serde(default)]
    pub location: String,

    // shape of a generated matrix, used when data_source is "random"
    #[serde(default = "default_dimension")]
    pub rows: usize,
    #[serde(default = "default_dimension")]
    pub cols: usize,
    pub seed: Option<u64>,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    // sweep runs 1..=max_workers, each repeated `repeats` times
    #[serde(default = "default_worker_count")]
    pub max_workers: usize,
    #[serde(default = "default_repeats")]
    pub repeats: usize,

    pub log_location: Option<String>,
    pub plot_location: Option<String>,

    #[serde(default = "default_counter_tick_ms")]
    pub counter_tick_ms: u64,
    #[serde(default = "default_counter_run_ms")]
    pub counter_run_ms: u64,
}

fn default_mode() -> RunMode {
    RunMode::Reduce
}

fn default_data_source() -> DataSource {
    DataSource::Random
}

fn default_dimension() -> usize {
    1000
}

fn default_worker_count() -> usize {
    *DEFAULT_WORKER_COUNT
}

fn default_repeats() -> usize {
    3
}

fn default_counter_tick_ms() -> u64 {
    100
}

fn default_counter_run_ms() -> u64 {
    10_000
}

impl RunConfig {
    // get config from the json file
    pub fn from_json(path: &str) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: RunConfig = from_reader(reader)?;
        Ok(config.normalized())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    // worker_count is left alone so that zero reaches the reducer and is rejected there
    fn normalized(mut self) -> Self {
        self.max_workers = self.max_workers.max(1);
        self.repeats = self.repeats.max(1);
        self.counter_tick_ms = self.counter_tick_ms.max(1);
        if self.data_source == DataSource::File && self.location.is_empty() {
            log::warn!("data_source is \"file\" but no location was given");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = RunConfig::from_json_str("{}").unwrap();
        assert_eq!(config.mode, RunMode::Reduce);
        assert_eq!(config.data_source, DataSource::Random);
        assert_eq!(config.rows, 1000);
        assert_eq!(config.worker_count, *DEFAULT_WORKER_COUNT);
        assert_eq!(config.repeats, 3);
        assert!(config.log_location.is_none());
    }

    #[test]
    fn parses_a_file_sweep() {
        let config = RunConfig::from_json_str(
            r#"{
                "mode": "sweep",
                "data_source": "file",
                "location": "./data/demo/matrix.csv",
                "max_workers": 0,
                "repeats": 0,
                "plot_location": "sweep.png"
            }"#,
        )
        .unwrap();
        assert_eq!(config.mode, RunMode::Sweep);
        assert_eq!(config.data_source, DataSource::File);
        assert_eq!(config.max_workers, 1);
        assert_eq!(config.repeats, 1);
        assert_eq!(config.plot_location.as_deref(), Some("sweep.png"));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(matches!(
            RunConfig::from_json_str(r#"{"mode": "train"}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
