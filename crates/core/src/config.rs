//! Configuration system for the co-simulation harness.
//!
//! This module defines all configuration structures used to parameterize a
//! run. It provides:
//! 1. **Defaults:** Baseline constants matching the reference board setup
//!    (an mt48lc32m8a2-class part: 8192 rows × 1024 columns × 4 banks × 8 bits).
//! 2. **Structures:** Hierarchical config for the loop, the SDRAM model, the
//!    video decoder, and the pin-name bindings.
//! 3. **Enums:** Data word width and sync pulse polarity.
//!
//! Configuration is construction-time only: supply JSON via
//! [`Config::from_json_file`] or use `Config::default()`.

use std::fs;

use serde::Deserialize;

use crate::common::error::SimError;

/// Default configuration constants for the harness.
mod defaults {
    /// Row address width in bits (8192 rows).
    pub const ROW_BITS: u32 = 13;

    /// Column address width in bits (1024 columns).
    pub const COL_BITS: u32 = 10;

    /// Bank address width in bits (4 banks).
    pub const BANK_BITS: u32 = 2;

    /// CAS latency in controller clock cycles.
    ///
    /// Read data appears on the bus this many cycles after the read command.
    pub const CAS_LATENCY: u32 = 2;

    /// Burst length in words per read/write command.
    pub const BURST_LEN: u32 = 1;

    /// Consecutive agreeing rows required before the video decoder trusts
    /// its inferred active width.
    pub const LOCK_ROWS: usize = 8;

    /// Color depth per channel in bits.
    pub const COLOR_DEPTH: u32 = 8;

    /// Cycle budget for a run; 0 means unlimited.
    pub const MAX_CYCLES: u64 = 0;
}

/// SDRAM data bus width.
///
/// Fixed at construction; every bus transfer is masked or widened to this
/// width. Matches the width flags of the reference controller model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DataWidth {
    /// 8-bit words.
    #[default]
    #[serde(alias = "8")]
    W8,
    /// 16-bit words.
    #[serde(alias = "16")]
    W16,
    /// 32-bit words.
    #[serde(alias = "32")]
    W32,
    /// 64-bit words.
    #[serde(alias = "64")]
    W64,
}

impl DataWidth {
    /// Word width in bits.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Word width in bytes (also the number of DQM byte lanes).
    #[inline]
    pub fn bytes(self) -> u32 {
        self.bits() / 8
    }

    /// Mask covering one word.
    #[inline]
    pub fn mask(self) -> u64 {
        match self {
            Self::W64 => u64::MAX,
            _ => (1u64 << self.bits()) - 1,
        }
    }
}

/// Polarity of the video sync pulses.
///
/// Classic 640×480 VGA uses active-low sync on both axes; other modes
/// invert one or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SyncPolarity {
    /// Sync is asserted while the line is low.
    #[default]
    ActiveLow,
    /// Sync is asserted while the line is high.
    ActiveHigh,
}

impl SyncPolarity {
    /// Returns `true` when the sampled level means "sync asserted".
    #[inline]
    pub fn asserted(self, level: bool) -> bool {
        match self {
            Self::ActiveLow => !level,
            Self::ActiveHigh => level,
        }
    }
}

/// Simulation loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Maximum full clock cycles to run; 0 means unlimited.
    pub max_cycles: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// SDRAM model geometry and timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SdramConfig {
    /// Row address width in bits.
    pub row_bits: u32,
    /// Column address width in bits.
    pub col_bits: u32,
    /// Bank address width in bits.
    pub bank_bits: u32,
    /// Data bus width.
    pub width: DataWidth,
    /// Initial CAS latency; a mode-register load may change it.
    pub cas_latency: u32,
    /// Initial burst length; a mode-register load may change it.
    pub burst_len: u32,
    /// Optional raw image preloaded into the backing array at construction.
    pub image: Option<String>,
}

impl Default for SdramConfig {
    fn default() -> Self {
        Self {
            row_bits: defaults::ROW_BITS,
            col_bits: defaults::COL_BITS,
            bank_bits: defaults::BANK_BITS,
            width: DataWidth::default(),
            cas_latency: defaults::CAS_LATENCY,
            burst_len: defaults::BURST_LEN,
            image: None,
        }
    }
}

impl SdramConfig {
    /// Validates geometry and timing ranges.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(1..=16).contains(&self.row_bits) {
            return Err(SimError::Config(format!(
                "sdram.row_bits {} out of range 1..=16",
                self.row_bits
            )));
        }
        if !(1..=14).contains(&self.col_bits) {
            return Err(SimError::Config(format!(
                "sdram.col_bits {} out of range 1..=14",
                self.col_bits
            )));
        }
        if !(1..=3).contains(&self.bank_bits) {
            return Err(SimError::Config(format!(
                "sdram.bank_bits {} out of range 1..=3",
                self.bank_bits
            )));
        }
        if !(1..=3).contains(&self.cas_latency) {
            return Err(SimError::Config(format!(
                "sdram.cas_latency {} out of range 1..=3",
                self.cas_latency
            )));
        }
        if !matches!(self.burst_len, 1 | 2 | 4 | 8) {
            return Err(SimError::Config(format!(
                "sdram.burst_len {} must be 1, 2, 4 or 8",
                self.burst_len
            )));
        }
        Ok(())
    }
}

/// Video decoder settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Sync pulse polarity for both axes.
    pub polarity: SyncPolarity,
    /// Consecutive agreeing rows required for geometry lock.
    pub lock_rows: usize,
    /// Color depth per channel in bits (1..=8); samples are widened to 8.
    pub color_depth: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            polarity: SyncPolarity::default(),
            lock_rows: defaults::LOCK_ROWS,
            color_depth: defaults::COLOR_DEPTH,
        }
    }
}

impl VideoConfig {
    /// Validates decoder parameter ranges.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.lock_rows == 0 {
            return Err(SimError::Config(
                "video.lock_rows must be at least 1".to_owned(),
            ));
        }
        if !(1..=8).contains(&self.color_depth) {
            return Err(SimError::Config(format!(
                "video.color_depth {} out of range 1..=8",
                self.color_depth
            )));
        }
        Ok(())
    }
}

/// Pin-name bindings between the harness and the design.
///
/// Defaults match the signal names of the reference harness. All names are
/// resolved once at startup; a missing required pin is fatal.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinNames {
    /// Master clock input toggled by the loop.
    pub clk: String,
    /// Completion output; empty disables completion-pin termination.
    pub done: String,
    /// SDRAM controller clock output.
    pub sdram_clock: String,
    /// SDRAM clock-enable output; empty means always enabled.
    pub sdram_cke: String,
    /// SDRAM chip select (active low).
    pub sdram_cs: String,
    /// SDRAM row address strobe (active low).
    pub sdram_ras: String,
    /// SDRAM column address strobe (active low).
    pub sdram_cas: String,
    /// SDRAM write enable (active low).
    pub sdram_we: String,
    /// SDRAM bank address.
    pub sdram_ba: String,
    /// SDRAM row/column address.
    pub sdram_a: String,
    /// SDRAM byte-lane write mask.
    pub sdram_dqm: String,
    /// Design-driven data bus value.
    pub sdram_dq_o: String,
    /// Design-side data bus output enable.
    pub sdram_dq_en: String,
    /// Data bus value fed back into the design.
    pub sdram_dq_i: String,
    /// Pixel clock output.
    pub video_clock: String,
    /// Vertical sync output.
    pub video_vs: String,
    /// Horizontal sync output.
    pub video_hs: String,
    /// Red channel output.
    pub video_r: String,
    /// Green channel output.
    pub video_g: String,
    /// Blue channel output.
    pub video_b: String,
}

impl Default for PinNames {
    fn default() -> Self {
        Self {
            clk: "clk".to_owned(),
            done: "done".to_owned(),
            sdram_clock: "sdram_clock".to_owned(),
            sdram_cke: String::new(),
            sdram_cs: "sdram_cs".to_owned(),
            sdram_ras: "sdram_ras".to_owned(),
            sdram_cas: "sdram_cas".to_owned(),
            sdram_we: "sdram_we".to_owned(),
            sdram_ba: "sdram_ba".to_owned(),
            sdram_a: "sdram_a".to_owned(),
            sdram_dqm: "sdram_dqm".to_owned(),
            sdram_dq_o: "sdram_dq_o".to_owned(),
            sdram_dq_en: "sdram_dq_en".to_owned(),
            sdram_dq_i: "sdram_dq_i".to_owned(),
            video_clock: "video_clock".to_owned(),
            video_vs: "video_vs".to_owned(),
            video_hs: "video_hs".to_owned(),
            video_r: "video_r".to_owned(),
            video_g: "video_g".to_owned(),
            video_b: "video_b".to_owned(),
        }
    }
}

/// Root configuration structure containing all harness settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use pinsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.sdram.row_bits, 13);
/// assert_eq!(config.loop_cfg.max_cycles, 0);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Simulation loop settings.
    #[serde(rename = "loop")]
    pub loop_cfg: LoopConfig,
    /// SDRAM model settings.
    pub sdram: SdramConfig,
    /// Video decoder settings.
    pub video: VideoConfig,
    /// Pin-name bindings.
    pub pins: PinNames,
}

impl Config {
    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: &str) -> Result<Self, SimError> {
        let text = fs::read_to_string(path).map_err(|e| SimError::ConfigFile {
            path: path.to_owned(),
            detail: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| SimError::ConfigFile {
            path: path.to_owned(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), SimError> {
        self.sdram.validate()?;
        self.video.validate()?;
        Ok(())
    }
}
