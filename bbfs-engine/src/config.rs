use serde::{Deserialize, Serialize};

use crate::strategies::{BalancedConfig, Strategy, WeightedProfile};

/// Série maximale tolérée par stratégie pour qu'un backtest soit jugé conforme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub precision: u32,
    pub balanced: u32,
    pub aggressive: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            precision: 20,
            balanced: 5,
            aggressive: 19,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub precision: WeightedProfile,
    pub balanced: BalancedConfig,
    pub aggressive: WeightedProfile,
    pub thresholds: Thresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: WeightedProfile::precision(),
            balanced: BalancedConfig::default(),
            aggressive: WeightedProfile::aggressive(),
            thresholds: Thresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn threshold(&self, strategy: Strategy) -> u32 {
        match strategy {
            Strategy::Precision => self.thresholds.precision,
            Strategy::Balanced => self.thresholds.balanced,
            Strategy::Aggressive => self.thresholds.aggressive,
        }
    }
}

pub fn save_config(config: &EngineConfig, path: &std::path::Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config(path: &std::path::Path) -> anyhow::Result<EngineConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&json)?;
    Ok(config)
}
