//! Transaction and polling parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fee and energy parameters attached to transactions the dashboard builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxSettings {
    /// Maximum TRX (in sun) a transaction may burn for energy.
    pub fee_limit: u64,
    /// Share of energy paid by contract callers, in percent.
    pub user_fee_percentage: u8,
    /// Energy the deployer contributes per call.
    pub origin_energy_limit: u64,
    /// TRX (in sun) attached to every mint call.
    pub mint_call_value: u64,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            fee_limit: 1_000_000_000,
            user_fee_percentage: 10,
            origin_energy_limit: 10,
            mint_call_value: 1,
        }
    }
}

/// Timing for transaction lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Pause before a delayed fetch.
    #[serde(with = "millis_serde", rename = "delay_ms")]
    pub delay: Duration,
    /// Fetch attempts made while waiting for confirmation.
    pub attempts: u32,
    /// Pause between confirmation attempts.
    #[serde(with = "millis_serde", rename = "interval_ms")]
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(300),
            attempts: 20,
            interval: Duration::from_millis(3000),
        }
    }
}

impl PollPolicy {
    /// Longest a confirmation wait can take, ignoring provider latency.
    pub fn max_wait(&self) -> Duration {
        self.delay + self.interval * self.attempts.saturating_sub(1)
    }
}

pub(crate) mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(dur: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(dur.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
