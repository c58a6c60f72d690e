use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Named default settings for the analyzer.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisProfile {
    /// 10 second windows merged within 5 BPM.
    #[default]
    Detailed,
    /// 15 second windows merged within 8 BPM.
    Quick,
}

impl AnalysisProfile {
    pub fn config(self) -> AnalysisConfig {
        match self {
            AnalysisProfile::Detailed => AnalysisConfig {
                window_duration: 10.0,
                tolerance: 5.0,
            },
            AnalysisProfile::Quick => AnalysisConfig {
                window_duration: 15.0,
                tolerance: 8.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seconds per analysis window.
    pub window_duration: f64,
    /// BPM delta under which adjacent windows merge.
    pub tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisProfile::default().config()
    }
}

impl AnalysisConfig {
    pub fn new(window_duration: f64, tolerance: f64) -> Result<Self, DomainError> {
        let config = Self {
            window_duration,
            tolerance,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.window_duration.is_finite() || self.window_duration <= 0.0 {
            return Err(DomainError::validation(
                "window duration must be a positive number of seconds",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(DomainError::validation(
                "tolerance must be a non-negative bpm delta",
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, DomainError> {
        let config: Self = serde_yaml::from_str(input)
            .map_err(|err| DomainError::Serialization(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(input: &str) -> Result<Self, DomainError> {
        let config: Self = serde_json::from_str(input)
            .map_err(|err| DomainError::Serialization(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, picking the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            other => Err(DomainError::validation(format!(
                "unsupported config extension {:?}",
                other
            ))),
        }
    }
}
