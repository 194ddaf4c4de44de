//! Orchestrator configuration (§2.1, §9), following the same
//! `Default`/`from_env`/`validate` shape the teacher crate uses for its
//! `LightningConfig`.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_RETRY_DELAY;

/// Policy knobs for the retry controller. The Open Questions in §9
/// (retry cap, retry delay) both resolve to fields here rather than
/// hardcoded constants, so a caller can tighten either without forking
/// the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayConfig {
    /// Default `maxfeepercent` when the `pay` command omits it.
    pub default_max_fee_percent: f64,
    /// Default `riskfactor` when the `pay` command omits it.
    pub default_riskfactor: f64,
    /// Wait between a delayed retry's classification and its next
    /// `getroute` (§4.1). Serialized as whole seconds.
    #[serde(with = "duration_secs")]
    pub retry_delay: Duration,
    /// Optional hard cap on `getroute_tries`. `None` (the default)
    /// preserves upstream's unbounded-until-expiry behavior.
    pub max_attempts: Option<u32>,
}

impl Default for PayConfig {
    fn default() -> Self {
        Self {
            default_max_fee_percent: 0.5,
            default_riskfactor: 1.0,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_attempts: None,
        }
    }
}

impl PayConfig {
    /// Reads overrides from environment variables, falling back to
    /// [`Default`] for anything unset or unparsable.
    ///
    /// - `PAYROUTE_MAX_FEE_PERCENT`
    /// - `PAYROUTE_RISKFACTOR`
    /// - `PAYROUTE_RETRY_DELAY_SECS`
    /// - `PAYROUTE_MAX_ATTEMPTS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("PAYROUTE_MAX_FEE_PERCENT") {
            if let Ok(parsed) = v.parse() {
                config.default_max_fee_percent = parsed;
            }
        }
        if let Ok(v) = std::env::var("PAYROUTE_RISKFACTOR") {
            if let Ok(parsed) = v.parse() {
                config.default_riskfactor = parsed;
            }
        }
        if let Ok(v) = std::env::var("PAYROUTE_RETRY_DELAY_SECS") {
            if let Ok(parsed) = v.parse() {
                config.retry_delay = Duration::from_secs(parsed);
            }
        }
        if let Ok(v) = std::env::var("PAYROUTE_MAX_ATTEMPTS") {
            if let Ok(parsed) = v.parse() {
                config.max_attempts = Some(parsed);
            }
        }

        config
    }

    /// Rejects configurations the controller could never satisfy.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.default_max_fee_percent) {
            return Err(anyhow!(
                "default_max_fee_percent must be within [0.0, 100.0], got {}",
                self.default_max_fee_percent
            ));
        }
        if self.default_riskfactor < 0.0 {
            return Err(anyhow!(
                "default_riskfactor must be non-negative, got {}",
                self.default_riskfactor
            ));
        }
        if self.retry_delay.is_zero() {
            return Err(anyhow!("retry_delay must be non-zero"));
        }
        if let Some(max) = self.max_attempts {
            if max == 0 {
                return Err(anyhow!("max_attempts, if set, must be non-zero"));
            }
        }
        Ok(())
    }

    /// Persists the config as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads and validates a config previously written by [`Self::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
