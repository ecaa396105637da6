use anyhow::{Context, Result};
use cadence_core::UrgencyModel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_cadence_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub weights: WeightsSection,
    pub schedule: ScheduleSection,
    pub llm: LlmSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsSection {
    pub urgency: f64,
    pub importance: f64,
    pub mood: f64,
}

impl Default for WeightsSection {
    fn default() -> Self {
        Self {
            urgency: 0.5,
            importance: 0.3,
            mood: 0.2,
        }
    }
}

impl WeightsSection {
    /// Scale the weights to sum to 1. The scheduler applies weights as-is,
    /// so the CLI normalizes whatever the user configured before handing
    /// them over. Degenerate input (sum <= 0) falls back to the defaults.
    pub fn normalized(&self) -> (f64, f64, f64) {
        let sum = self.urgency + self.importance + self.mood;
        if sum <= 0.0 {
            let d = WeightsSection::default();
            return (d.urgency, d.importance, d.mood);
        }
        (self.urgency / sum, self.importance / sum, self.mood / sum)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub deadline_hour: u32,
    pub work_increment_hours: f64,
    pub top_n: usize,
    pub urgency_model: UrgencyModel,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            work_start_hour: 9,
            work_end_hour: 19,
            deadline_hour: 19,
            work_increment_hours: 2.0,
            top_n: 3,
            urgency_model: UrgencyModel::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "anthropic" or "openai"; empty means pick by available credentials.
    pub provider: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            temperature: 0.4,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_cadence_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_normalize_to_unit_sum() {
        let w = WeightsSection {
            urgency: 0.6,
            importance: 0.5,
            mood: 0.2,
        };
        let (u, i, m) = w.normalized();
        assert!((u + i + m - 1.0).abs() < 1e-9);
        // Proportions are preserved.
        assert!((u / i - 0.6 / 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unit_weights_pass_through() {
        let (u, i, m) = WeightsSection::default().normalized();
        assert_eq!((u, i, m), (0.5, 0.3, 0.2));
    }

    #[test]
    fn test_degenerate_weights_fall_back_to_defaults() {
        let w = WeightsSection {
            urgency: 0.0,
            importance: 0.0,
            mood: 0.0,
        };
        assert_eq!(w.normalized(), (0.5, 0.3, 0.2));
    }
}
