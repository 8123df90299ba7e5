//! Top-level simulator: owns the design, the peripheral models, and the
//! bus bindings.
//!
//! Each half-cycle is a strict sequence: toggle the clock pin, settle the
//! design, hand the settled pins to every peripheral, arbitrate each
//! bidirectional bus exactly once, and write the resolved levels back onto
//! the design's inputs. The cycle counter is explicit state owned here and
//! passed to whoever needs it; there are no process-wide counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::common::bus::{self, BusClaim, BusState};
use crate::common::error::SimError;
use crate::config::Config;
use crate::design::{Design, PinId};
use crate::periph::sdram::{Sdram, SdramPins};
use crate::periph::video::frame::Frame;
use crate::periph::video::{Vga, VideoPins};
use crate::periph::{Peripheral, PinDrive};
use crate::stats::SimStats;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The design asserted its completion pin.
    Completed,
    /// An external stop request arrived.
    Stopped,
    /// The configured cycle budget ran out.
    CycleLimit,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Why the run ended.
    pub exit: ExitReason,
    /// Full clock cycles stepped.
    pub cycles: u64,
    /// Frames the video decoder committed.
    pub frames_committed: u64,
    /// Whether the video decoder reached geometry lock.
    pub video_locked: bool,
    /// SDRAM protocol violations logged and ignored.
    pub protocol_violations: u64,
}

/// One bidirectional bus between the design and the peripherals.
///
/// The design side is a value/enable pin pair; peripherals claim the bus
/// through [`Peripheral::drives`]. When nobody drives, the last resolved
/// level is retained: a floating bus keeps its charge, it does not read
/// as zero.
#[derive(Debug)]
pub struct BusBinding {
    name: String,
    data_out: PinId,
    output_enable: PinId,
    data_in: PinId,
    last_level: u64,
}

impl BusBinding {
    /// Creates a binding from the design-side pins.
    pub fn new(name: &str, data_out: PinId, output_enable: PinId, data_in: PinId) -> Self {
        Self {
            name: name.to_owned(),
            data_out,
            output_enable,
            data_in,
            last_level: 0,
        }
    }
}

/// The simulation loop.
pub struct Simulator {
    design: Box<dyn Design>,
    peripherals: Vec<Box<dyn Peripheral>>,
    buses: Vec<BusBinding>,
    clk: PinId,
    done: Option<PinId>,
    stop: Arc<AtomicBool>,
    max_cycles: u64,
    edge: u64,
    stats: SimStats,
    drive_buf: Vec<PinDrive>,
}

impl Simulator {
    /// Builds the standard harness: the design wired to the SDRAM model and
    /// the VGA decoder, with the data bus arbitrated between the design and
    /// the controller.
    ///
    /// All required pin names are resolved here; a missing pin is fatal
    /// before the first clock edge.
    pub fn new(design: Box<dyn Design>, config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let mut sim = Self::bare(design, config)?;

        let sdram_pins = SdramPins::bind(sim.design.pins(), &config.pins)?;
        let dq = BusBinding::new(
            "sdram_dq",
            sdram_pins.dq_o,
            sdram_pins.dq_en,
            sdram_pins.dq_i,
        );
        sim.add_peripheral(Box::new(Sdram::new(&config.sdram, sdram_pins)?));
        sim.add_bus(dq);

        let video_pins = VideoPins::bind(sim.design.pins(), &config.pins)?;
        sim.add_peripheral(Box::new(Vga::new(&config.video, video_pins)?));

        Ok(sim)
    }

    /// Builds a loop with no peripherals attached; callers add their own
    /// with [`add_peripheral`](Self::add_peripheral) and
    /// [`add_bus`](Self::add_bus).
    pub fn bare(design: Box<dyn Design>, config: &Config) -> Result<Self, SimError> {
        let clk = design.pins().resolve(&config.pins.clk)?;
        let done = if config.pins.done.is_empty() {
            None
        } else {
            Some(design.pins().resolve(&config.pins.done)?)
        };
        Ok(Self {
            design,
            peripherals: Vec::new(),
            buses: Vec::new(),
            clk,
            done,
            stop: Arc::new(AtomicBool::new(false)),
            max_cycles: config.loop_cfg.max_cycles,
            edge: 0,
            stats: SimStats::new(),
            drive_buf: Vec::new(),
        })
    }

    /// Attaches a peripheral; models are evaluated in attachment order.
    pub fn add_peripheral(&mut self, peripheral: Box<dyn Peripheral>) {
        self.peripherals.push(peripheral);
    }

    /// Registers a bidirectional bus for per-half-cycle arbitration.
    pub fn add_bus(&mut self, bus: BusBinding) {
        self.buses.push(bus);
    }

    /// Shared stop flag; set it from a signal handler or another thread to
    /// end the run after the current cycle.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// The design under simulation.
    pub fn design(&self) -> &dyn Design {
        &*self.design
    }

    /// Half-cycle edges stepped so far.
    pub fn edges(&self) -> u64 {
        self.edge
    }

    /// Statistics for the run so far.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// The attached SDRAM model, if any.
    pub fn sdram_mut(&mut self) -> Option<&mut Sdram> {
        self.peripherals.iter_mut().find_map(|p| p.as_sdram_mut())
    }

    /// The attached video decoder, if any.
    pub fn video_mut(&mut self) -> Option<&mut Vga> {
        self.peripherals.iter_mut().find_map(|p| p.as_video_mut())
    }

    /// Drains the frames the video decoder has committed so far.
    pub fn take_frames(&mut self) -> Vec<Frame> {
        self.video_mut()
            .map_or_else(Vec::new, |v| v.decoder_mut().take_frames())
    }

    /// Advances the simulation by one half-cycle edge.
    pub fn half_step(&mut self) -> Result<(), SimError> {
        let level = self.design.pins().read(self.clk);
        self.design.pins_mut().write(self.clk, level ^ 1);
        self.design.advance();

        for p in &mut self.peripherals {
            p.eval(self.edge, self.design.pins())?;
        }

        for i in 0..self.buses.len() {
            let data_in = self.buses[i].data_in;
            let design_state = {
                let pins = self.design.pins();
                if pins.is_high(self.buses[i].output_enable) {
                    BusState::Driven(pins.read(self.buses[i].data_out))
                } else {
                    BusState::HighZ
                }
            };
            let resolved = {
                let mut claims = vec![BusClaim {
                    driver: "design",
                    state: design_state,
                }];
                for p in &self.peripherals {
                    self.drive_buf.clear();
                    p.drives(&mut self.drive_buf);
                    for d in &self.drive_buf {
                        if d.pin == data_in {
                            claims.push(BusClaim {
                                driver: p.name(),
                                state: d.state,
                            });
                        }
                    }
                }
                bus::resolve(&self.buses[i].name, self.edge, &claims)?
            };
            if let Some(v) = resolved.level() {
                self.buses[i].last_level = v;
            }
            let level = self.buses[i].last_level;
            self.design.pins_mut().write(data_in, level);
        }

        self.edge += 1;
        self.stats.edges += 1;
        Ok(())
    }

    /// Advances the simulation by one full clock cycle (both edges).
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.half_step()?;
        self.half_step()?;
        self.stats.cycles += 1;
        Ok(())
    }

    /// Runs until the design completes, a stop is requested, or the cycle
    /// budget runs out. A peripheral fault or bus contention aborts with an
    /// error; the simulation state is not meaningful afterwards.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        info!(max_cycles = self.max_cycles, "simulation started");
        let exit = loop {
            // The stop flag is honored once per full cycle, not mid-cycle.
            if self.stop.load(Ordering::Relaxed) {
                break ExitReason::Stopped;
            }
            if self.max_cycles > 0 && self.stats.cycles >= self.max_cycles {
                break ExitReason::CycleLimit;
            }
            self.tick()?;
            if let Some(done) = self.done {
                if self.design.pins().is_high(done) {
                    break ExitReason::Completed;
                }
            }
        };
        self.collect_counters();
        info!(cycles = self.stats.cycles, ?exit, "simulation finished");
        Ok(RunSummary {
            exit,
            cycles: self.stats.cycles,
            frames_committed: self.stats.video.frames_committed,
            video_locked: self.stats.video_locked,
            protocol_violations: self.stats.sdram.protocol_violations,
        })
    }

    /// Copies the peripheral models' counters into [`SimStats`].
    pub fn collect_counters(&mut self) {
        if let Some(sdram) = self.sdram_mut() {
            let counters = sdram.ctrl().counters();
            self.stats.sdram = counters;
        }
        if let Some(video) = self.video_mut() {
            let counters = video.decoder().counters();
            let locked = video.decoder().locked();
            self.stats.video = counters;
            self.stats.video_locked = locked;
        }
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("edge", &self.edge)
            .field("peripherals", &self.peripherals.len())
            .field("buses", &self.buses.len())
            .finish_non_exhaustive()
    }
}
