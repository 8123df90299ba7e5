//! SDR-SDRAM controller model.
//!
//! This module models a single-data-rate synchronous DRAM part at command
//! level. It provides:
//! 1. **Command decode:** CS/RAS/CAS/WE truth table sampled per rising edge.
//! 2. **Protocol state:** Per-bank open rows, burst engine, mode register,
//!    and a CAS-latency pipeline deciding exactly when the part drives the
//!    data bus.
//! 3. **Storage:** A lazily allocated (bank, row, column) word array with
//!    optional raw-image preload and dump.
//!
//! Invalid command sequences are protocol violations: logged, counted, and
//! ignored, mirroring real hardware's undefined-but-non-fatal behavior. The
//! model never raises a fatal error of its own; bus contention is detected
//! by the loop's arbitration, not here.

/// Backing array addressed by (bank, row, column).
pub mod array;

/// Lazily allocated byte buffer backing the array.
pub mod buffer;

/// Command-line decoding.
pub mod command;

use std::collections::VecDeque;
use std::path::Path;

use tracing::{debug, warn};

use crate::common::bus::BusState;
use crate::common::error::SimError;
use crate::config::{PinNames, SdramConfig};
use crate::design::{PinId, PinSet};
use crate::periph::{Peripheral, PinDrive};
use self::array::MemoryArray;
use self::command::Command;

/// Address bit that turns a precharge into precharge-all.
const A10: u64 = 1 << 10;

/// Controller protocol state, reported for observation and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlState {
    /// No row open, nothing in flight.
    Idle,
    /// At least one bank has an open row.
    RowActive,
    /// A read burst is active or read data is still draining.
    Reading,
    /// A write burst is active.
    Writing,
    /// A precharge is closing a row this cycle.
    Precharging,
    /// An auto-refresh cycle.
    Refreshing,
}

/// Command and violation counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SdramCounters {
    /// Row activations accepted.
    pub activates: u64,
    /// Read commands accepted.
    pub reads: u64,
    /// Write commands accepted.
    pub writes: u64,
    /// Precharge commands accepted.
    pub precharges: u64,
    /// Auto-refresh commands accepted.
    pub refreshes: u64,
    /// Mode-register loads accepted.
    pub mode_loads: u64,
    /// Burst-stop commands accepted.
    pub burst_stops: u64,
    /// Command sequences rejected as protocol violations.
    pub protocol_violations: u64,
}

/// Mode register fields the model honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRegister {
    /// Words per read/write burst.
    pub burst_len: u32,
    /// Cycles between a read command and its first data word.
    pub cas_latency: u32,
}

/// Everything the controller samples at one rising edge of its clock.
#[derive(Debug, Clone, Copy)]
pub struct CommandInput {
    /// Clock enable; while low the edge is ignored and outputs hold.
    pub cke: bool,
    /// Chip select, active low.
    pub cs_n: bool,
    /// Row address strobe, active low.
    pub ras_n: bool,
    /// Column address strobe, active low.
    pub cas_n: bool,
    /// Write enable, active low.
    pub we_n: bool,
    /// Bank address lines.
    pub bank: u64,
    /// Row/column address lines.
    pub addr: u64,
    /// Byte-lane write mask; a set bit masks its lane.
    pub dqm: u64,
    /// Design-side state of the shared data bus.
    pub dq: BusState,
}

struct Burst {
    bank: u64,
    row: u64,
    col: u64,
    remaining: u32,
    write: bool,
}

/// The protocol engine, independent of any pin binding.
///
/// Tests and alternative harnesses drive [`step`](Self::step) directly with
/// a [`CommandInput`] per rising edge; the [`Sdram`] wrapper adapts it to
/// the [`Peripheral`] pin interface.
pub struct SdramCtrl {
    array: MemoryArray,
    banks: Vec<Option<u64>>,
    mode: ModeRegister,
    burst: Option<Burst>,
    pipe: VecDeque<Option<u64>>,
    precharge_timer: u32,
    refresh_timer: u32,
    state: CtrlState,
    last_drive: BusState,
    counters: SdramCounters,
}

impl SdramCtrl {
    /// Builds the engine from configuration, preloading the backing array
    /// if an image path is configured.
    pub fn new(cfg: &SdramConfig) -> Result<Self, SimError> {
        cfg.validate()?;
        let mut array = MemoryArray::new(cfg);
        if let Some(path) = &cfg.image {
            array.load_image(path)?;
        }
        let banks = vec![None; 1 << cfg.bank_bits];
        let mode = ModeRegister {
            burst_len: cfg.burst_len,
            cas_latency: cfg.cas_latency,
        };
        let pipe = VecDeque::from(vec![None; cfg.cas_latency as usize]);
        Ok(Self {
            array,
            banks,
            mode,
            burst: None,
            pipe,
            precharge_timer: 0,
            refresh_timer: 0,
            state: CtrlState::Idle,
            last_drive: BusState::HighZ,
            counters: SdramCounters::default(),
        })
    }

    /// Current protocol state.
    pub fn state(&self) -> CtrlState {
        self.state
    }

    /// The row currently open in `bank`, if any.
    pub fn open_row(&self, bank: u64) -> Option<u64> {
        self.banks
            .get((bank & self.array.bank_mask()) as usize)
            .copied()
            .flatten()
    }

    /// Current mode register contents.
    pub fn mode(&self) -> ModeRegister {
        self.mode
    }

    /// Command and violation counters.
    pub fn counters(&self) -> SdramCounters {
        self.counters
    }

    /// The backing word array.
    pub fn array(&self) -> &MemoryArray {
        &self.array
    }

    /// Mutable access to the backing word array (preloading in tests).
    pub fn array_mut(&mut self) -> &mut MemoryArray {
        &mut self.array
    }

    fn violation(&mut self, edge: u64, cmd: Command, detail: &str) {
        warn!(edge, %cmd, "protocol violation: {detail}");
        self.counters.protocol_violations += 1;
    }

    /// Advances the engine by one rising edge of the controller clock and
    /// returns what the part puts on the data bus for the cycle.
    pub fn step(&mut self, edge: u64, input: &CommandInput) -> BusState {
        if !input.cke {
            // Clock suspended: the edge is invisible, outputs hold.
            return self.last_drive;
        }

        // A burst that drained last cycle still counted as Reading/Writing
        // for that cycle; retire it now.
        if self.burst.as_ref().is_some_and(|b| b.remaining == 0) {
            self.burst = None;
        }
        if self.precharge_timer > 0 {
            self.precharge_timer -= 1;
        }
        if self.refresh_timer > 0 {
            self.refresh_timer -= 1;
        }

        let out = self.pipe.pop_front().flatten();
        self.pipe.push_back(None);

        let cmd = Command::decode(input.cs_n, input.ras_n, input.cas_n, input.we_n);
        self.apply(edge, cmd, input);
        self.progress_burst(edge, input);

        self.last_drive = out.map_or(BusState::HighZ, BusState::Driven);
        self.state = self.derive_state();
        self.last_drive
    }

    fn apply(&mut self, edge: u64, cmd: Command, input: &CommandInput) {
        match cmd {
            Command::Deselect | Command::Nop => {}
            Command::Active => {
                let bank = (input.bank & self.array.bank_mask()) as usize;
                let row = input.addr & self.array.row_mask();
                if self.banks[bank].is_some() {
                    self.violation(edge, cmd, "activate on a bank with an open row");
                    return;
                }
                debug!(edge, bank, row, "row activated");
                self.banks[bank] = Some(row);
                self.counters.activates += 1;
            }
            Command::Read | Command::Write => {
                let write = cmd == Command::Write;
                let bank = input.bank & self.array.bank_mask();
                let Some(row) = self.banks[bank as usize] else {
                    self.violation(edge, cmd, "read/write on a bank with no open row");
                    return;
                };
                let col = input.addr & self.array.col_mask();
                self.burst = Some(Burst {
                    bank,
                    row,
                    col,
                    remaining: self.mode.burst_len,
                    write,
                });
                if write {
                    self.counters.writes += 1;
                } else {
                    self.counters.reads += 1;
                }
            }
            Command::BurstStop => {
                self.burst = None;
                self.counters.burst_stops += 1;
            }
            Command::Precharge => {
                if input.addr & A10 != 0 {
                    self.banks.fill(None);
                    self.burst = None;
                } else {
                    let bank = input.bank & self.array.bank_mask();
                    self.banks[bank as usize] = None;
                    if self.burst.as_ref().is_some_and(|b| b.bank == bank) {
                        self.burst = None;
                    }
                }
                self.precharge_timer = 1;
                self.counters.precharges += 1;
            }
            Command::Refresh => {
                self.refresh_timer = 1;
                self.counters.refreshes += 1;
            }
            Command::LoadMode => {
                if self.banks.iter().any(Option::is_some) {
                    self.violation(edge, cmd, "mode register load with a row open");
                    return;
                }
                self.load_mode(edge, input.addr);
            }
        }
    }

    fn load_mode(&mut self, edge: u64, addr: u64) {
        let bl_field = (addr & 0x7) as u32;
        if bl_field > 3 {
            self.violation(edge, Command::LoadMode, "full-page burst not supported");
            return;
        }
        if addr & 0x8 != 0 {
            self.violation(edge, Command::LoadMode, "interleaved burst not supported");
            return;
        }
        let cl_field = ((addr >> 4) & 0x7) as u32;
        if !(1..=3).contains(&cl_field) {
            self.violation(edge, Command::LoadMode, "CAS latency outside 1..=3");
            return;
        }
        self.mode = ModeRegister {
            burst_len: 1 << bl_field,
            cas_latency: cl_field,
        };
        // In-flight read data is dropped; a legal LMR happens with all
        // banks idle and nothing draining.
        self.pipe = VecDeque::from(vec![None; cl_field as usize]);
        self.counters.mode_loads += 1;
        debug!(edge, burst_len = self.mode.burst_len, cas_latency = cl_field, "mode register loaded");
    }

    fn progress_burst(&mut self, edge: u64, input: &CommandInput) {
        let lanes_all = ((1u64 << self.array.width().bytes()) - 1) as u8;
        let Some(burst) = self.burst.as_mut() else {
            return;
        };
        if burst.remaining == 0 {
            return;
        }
        if burst.write {
            match input.dq {
                BusState::Driven(v) => {
                    let lanes = !(input.dqm as u8) & lanes_all;
                    self.array
                        .write(burst.bank, burst.row, burst.col, v, lanes);
                }
                BusState::HighZ => {
                    warn!(edge, "protocol violation: write burst cycle with undriven data bus");
                    self.counters.protocol_violations += 1;
                }
            }
        } else {
            let word = self.array.read(burst.bank, burst.row, burst.col);
            if let Some(slot) = self.pipe.back_mut() {
                *slot = Some(word);
            }
        }
        burst.col = (burst.col + 1) & self.array.col_mask();
        burst.remaining -= 1;
    }

    fn derive_state(&self) -> CtrlState {
        if let Some(b) = &self.burst {
            return if b.write {
                CtrlState::Writing
            } else {
                CtrlState::Reading
            };
        }
        if self.pipe.iter().any(Option::is_some) || self.last_drive.is_driven() {
            return CtrlState::Reading;
        }
        if self.precharge_timer > 0 {
            return CtrlState::Precharging;
        }
        if self.refresh_timer > 0 {
            return CtrlState::Refreshing;
        }
        if self.banks.iter().any(Option::is_some) {
            return CtrlState::RowActive;
        }
        CtrlState::Idle
    }
}

impl std::fmt::Debug for SdramCtrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdramCtrl")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("array", &self.array)
            .finish_non_exhaustive()
    }
}

/// Resolved pin handles for the SDRAM wiring.
#[derive(Debug, Clone, Copy)]
pub struct SdramPins {
    /// Controller clock output of the design.
    pub clock: PinId,
    /// Optional clock enable; absent means always enabled.
    pub cke: Option<PinId>,
    /// Chip select, active low.
    pub cs_n: PinId,
    /// Row address strobe, active low.
    pub ras_n: PinId,
    /// Column address strobe, active low.
    pub cas_n: PinId,
    /// Write enable, active low.
    pub we_n: PinId,
    /// Bank address lines.
    pub ba: PinId,
    /// Row/column address lines.
    pub addr: PinId,
    /// Byte-lane write mask.
    pub dqm: PinId,
    /// Design-driven data bus value.
    pub dq_o: PinId,
    /// Design-side data bus output enable.
    pub dq_en: PinId,
    /// Data bus value fed back into the design.
    pub dq_i: PinId,
}

impl SdramPins {
    /// Resolves the configured pin names against the design's pin set.
    pub fn bind(pins: &PinSet, names: &PinNames) -> Result<Self, SimError> {
        let cke = if names.sdram_cke.is_empty() {
            None
        } else {
            Some(pins.resolve(&names.sdram_cke)?)
        };
        Ok(Self {
            clock: pins.resolve(&names.sdram_clock)?,
            cke,
            cs_n: pins.resolve(&names.sdram_cs)?,
            ras_n: pins.resolve(&names.sdram_ras)?,
            cas_n: pins.resolve(&names.sdram_cas)?,
            we_n: pins.resolve(&names.sdram_we)?,
            ba: pins.resolve(&names.sdram_ba)?,
            addr: pins.resolve(&names.sdram_a)?,
            dqm: pins.resolve(&names.sdram_dqm)?,
            dq_o: pins.resolve(&names.sdram_dq_o)?,
            dq_en: pins.resolve(&names.sdram_dq_en)?,
            dq_i: pins.resolve(&names.sdram_dq_i)?,
        })
    }
}

/// The SDRAM model as a pin-attached peripheral.
///
/// Detects rising edges of the design's controller clock and feeds the
/// sampled command lines to the protocol engine. Between edges the part's
/// bus drive holds.
pub struct Sdram {
    ctrl: SdramCtrl,
    pins: SdramPins,
    last_clk: bool,
    drive: BusState,
}

impl Sdram {
    /// Builds the model and binds its pins.
    pub fn new(cfg: &SdramConfig, pins: SdramPins) -> Result<Self, SimError> {
        Ok(Self {
            ctrl: SdramCtrl::new(cfg)?,
            pins,
            last_clk: false,
            drive: BusState::HighZ,
        })
    }

    /// The protocol engine.
    pub fn ctrl(&self) -> &SdramCtrl {
        &self.ctrl
    }

    /// Mutable access to the protocol engine.
    pub fn ctrl_mut(&mut self) -> &mut SdramCtrl {
        &mut self.ctrl
    }

    /// Dumps the backing array to a raw image file.
    pub fn dump_image(&self, path: &Path) -> Result<(), SimError> {
        self.ctrl.array().dump_image(path)
    }
}

impl Peripheral for Sdram {
    fn name(&self) -> &str {
        "SDRAM"
    }

    fn eval(&mut self, edge: u64, pins: &PinSet) -> Result<(), SimError> {
        let clk = pins.is_high(self.pins.clock);
        let rising = clk && !self.last_clk;
        self.last_clk = clk;
        if !rising {
            return Ok(());
        }

        let dq = if pins.is_high(self.pins.dq_en) {
            BusState::Driven(pins.read(self.pins.dq_o))
        } else {
            BusState::HighZ
        };
        let input = CommandInput {
            cke: self.pins.cke.is_none_or(|p| pins.is_high(p)),
            cs_n: pins.is_high(self.pins.cs_n),
            ras_n: pins.is_high(self.pins.ras_n),
            cas_n: pins.is_high(self.pins.cas_n),
            we_n: pins.is_high(self.pins.we_n),
            bank: pins.read(self.pins.ba),
            addr: pins.read(self.pins.addr),
            dqm: pins.read(self.pins.dqm),
            dq,
        };
        self.drive = self.ctrl.step(edge, &input);
        Ok(())
    }

    fn drives(&self, out: &mut Vec<PinDrive>) {
        out.push(PinDrive {
            pin: self.pins.dq_i,
            state: self.drive,
        });
    }

    fn as_sdram_mut(&mut self) -> Option<&mut Sdram> {
        Some(self)
    }
}

impl std::fmt::Debug for Sdram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdram")
            .field("ctrl", &self.ctrl)
            .finish_non_exhaustive()
    }
}
