//! Hardware-dependent limits for palette assembly.
//!
//! A [`HardwareProfile`] is an immutable snapshot. Recalibrating produces a
//! new snapshot instead of mutating the old one, so a query engine keeps
//! the [`Limits`] it was built with for its whole lifetime.

use std::time::Duration;

use serde::Serialize;

/// Below this much available memory the machine counts as low-power.
pub const LOW_POWER_RAM_BYTES: u64 = 8 * 1024 * 1024 * 1024;

/// Below this many cores the machine counts as low-power.
pub const LOW_POWER_CORES: usize = 6;

/// Generation speed (tokens/second) below which the machine is low-power.
pub const LOW_POWER_TPS: f64 = 15.0;

/// Throughput assumed before any benchmark has run.
pub const DEFAULT_TPS: f64 = 10.0;

const FALLBACK_TPS: f64 = 5.0;
const CHARS_PER_TOKEN: f64 = 3.0;
const OUTPUT_TOKEN_RESERVE: f64 = 2048.0;
const TIMEOUT_MARGIN: f64 = 1.2;
const TIMEOUT_OVERHEAD_SECS: f64 = 10.0;
const MIN_TIMEOUT_SECS: f64 = 60.0;

/// Limits applied to retrieval and prompt construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    /// Most paragraphs a palette may contain.
    pub max_examples: usize,
    /// Candidates fetched from the winning document.
    pub retrieval_limit: usize,
    pub context_window: usize,
    pub max_input_chars: usize,
}

impl Limits {
    pub const LOW_POWER: Self = Self {
        max_examples: 3,
        retrieval_limit: 10,
        context_window: 4096,
        max_input_chars: 3500,
    };

    pub const HIGH_POWER: Self = Self {
        max_examples: 10,
        retrieval_limit: 30,
        context_window: 8192,
        max_input_chars: 12000,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::LOW_POWER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HardwareProfile {
    /// `None` when the platform does not expose it.
    pub available_ram_bytes: Option<u64>,
    pub cores: usize,
    pub tokens_per_second: f64,
    pub low_power: bool,
}

impl HardwareProfile {
    /// Build a profile from explicit measurements.
    pub fn new(
        available_ram_bytes: Option<u64>,
        cores: usize,
        tokens_per_second: f64,
    ) -> Self {
        let low_ram =
            available_ram_bytes.is_some_and(|b| b < LOW_POWER_RAM_BYTES);
        Self {
            available_ram_bytes,
            cores,
            tokens_per_second,
            low_power: low_ram || cores < LOW_POWER_CORES,
        }
    }

    /// Inspect the current machine. Cores are counted as logical CPUs.
    pub fn detect() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let profile = Self::new(available_ram(), cores, DEFAULT_TPS);
        tracing::debug!(?profile, "hardware detected");
        profile
    }

    /// Snapshot with a measured throughput. The measurement replaces the
    /// RAM and core heuristic: only slow generation means low power.
    pub fn with_benchmark(&self, tokens_per_second: f64) -> Self {
        Self {
            tokens_per_second,
            low_power: tokens_per_second < LOW_POWER_TPS,
            ..*self
        }
    }

    pub fn limits(&self) -> Limits {
        if self.low_power {
            Limits::LOW_POWER
        } else {
            Limits::HIGH_POWER
        }
    }

    /// Time budget for generating a response to `input_chars` of input.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use docstyle::profile::HardwareProfile;
    ///
    /// let fast = HardwareProfile::new(None, 8, 100.0);
    /// assert_eq!(fast.estimate_timeout(300), Duration::from_secs(60));
    /// ```
    pub fn estimate_timeout(&self, input_chars: usize) -> Duration {
        let tps = if self.tokens_per_second > 0.0 {
            self.tokens_per_second
        } else {
            FALLBACK_TPS
        };
        let tokens =
            input_chars as f64 / CHARS_PER_TOKEN + OUTPUT_TOKEN_RESERVE;
        let secs = tokens / tps * TIMEOUT_MARGIN + TIMEOUT_OVERHEAD_SECS;
        Duration::from_secs_f64(secs.max(MIN_TIMEOUT_SECS))
    }
}

/// `MemAvailable` from `/proc/meminfo`.
fn available_ram() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo(&meminfo)
}

fn parse_meminfo(meminfo: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix("MemAvailable:")?;
        let kib: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
        Some(kib * 1024)
    })
}
