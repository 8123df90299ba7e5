//! A scriptable design double.
//!
//! `ScriptedDesign` declares the full default pin interface and replays
//! scheduled pin writes at chosen rising-edge indices, so a test reads as a
//! timeline of commands. Idle levels are restored one edge after each
//! command, matching how a real controller FSM returns its lines to NOP.

use std::collections::BTreeMap;

use pinsim_core::Design;
use pinsim_core::design::{PinId, PinSet};

/// A design double driven by a pre-programmed pin timeline.
pub struct ScriptedDesign {
    pins: PinSet,
    clk: PinId,
    prev_clk: bool,
    edge_idx: u64,
    script: BTreeMap<u64, Vec<(PinId, u64)>>,
    mirrors: Vec<PinId>,
    advances: u64,
}

impl ScriptedDesign {
    /// Declares the full default-named pin interface (clock, completion,
    /// SDRAM wiring, video wiring) with the default geometry widths.
    pub fn full() -> Self {
        let mut pins = PinSet::new();
        let clk = pins.declare("clk", 1);
        let _ = pins.declare("done", 1);
        let sdram_clock = pins.declare("sdram_clock", 1);
        let cs = pins.declare("sdram_cs", 1);
        let ras = pins.declare("sdram_ras", 1);
        let cas = pins.declare("sdram_cas", 1);
        let we = pins.declare("sdram_we", 1);
        let _ = pins.declare("sdram_ba", 2);
        let _ = pins.declare("sdram_a", 13);
        let _ = pins.declare("sdram_dqm", 1);
        let _ = pins.declare("sdram_dq_o", 8);
        let _ = pins.declare("sdram_dq_en", 1);
        let _ = pins.declare("sdram_dq_i", 8);
        let video_clock = pins.declare("video_clock", 1);
        let vs = pins.declare("video_vs", 1);
        let hs = pins.declare("video_hs", 1);
        let _ = pins.declare("video_r", 8);
        let _ = pins.declare("video_g", 8);
        let _ = pins.declare("video_b", 8);

        // Idle levels: everything active-low deasserted.
        for pin in [cs, ras, cas, we, vs, hs] {
            pins.write(pin, 1);
        }

        Self {
            pins,
            clk,
            prev_clk: false,
            edge_idx: 0,
            script: BTreeMap::new(),
            mirrors: vec![sdram_clock, video_clock],
            advances: 0,
        }
    }

    /// Schedules `pin = value` at rising edge `cycle`.
    ///
    /// Writes scheduled later for the same cycle win, so command helpers can
    /// be layered. Panics on an undeclared pin name: a broken test script
    /// is a bug, not a condition.
    pub fn at(&mut self, cycle: u64, pin: &str, value: u64) {
        let id = match self.pins.resolve(pin) {
            Ok(id) => id,
            Err(e) => panic!("script references {e}"),
        };
        self.script.entry(cycle).or_default().push((id, value));
    }

    fn restore_idle(&mut self, cycle: u64) {
        self.at(cycle, "sdram_cs", 1);
        self.at(cycle, "sdram_ras", 1);
        self.at(cycle, "sdram_cas", 1);
        self.at(cycle, "sdram_we", 1);
        self.at(cycle, "sdram_dq_en", 0);
    }

    /// Schedules an ACTIVE command.
    pub fn cmd_active(&mut self, cycle: u64, bank: u64, row: u64) {
        self.at(cycle, "sdram_cs", 0);
        self.at(cycle, "sdram_ras", 0);
        self.at(cycle, "sdram_cas", 1);
        self.at(cycle, "sdram_we", 1);
        self.at(cycle, "sdram_ba", bank);
        self.at(cycle, "sdram_a", row);
        self.restore_idle(cycle + 1);
    }

    /// Schedules a WRITE command with the design driving the bus.
    pub fn cmd_write(&mut self, cycle: u64, bank: u64, col: u64, data: u64) {
        self.at(cycle, "sdram_cs", 0);
        self.at(cycle, "sdram_ras", 1);
        self.at(cycle, "sdram_cas", 0);
        self.at(cycle, "sdram_we", 0);
        self.at(cycle, "sdram_ba", bank);
        self.at(cycle, "sdram_a", col);
        self.at(cycle, "sdram_dq_o", data);
        self.at(cycle, "sdram_dq_en", 1);
        self.restore_idle(cycle + 1);
    }

    /// Schedules a READ command.
    pub fn cmd_read(&mut self, cycle: u64, bank: u64, col: u64) {
        self.at(cycle, "sdram_cs", 0);
        self.at(cycle, "sdram_ras", 1);
        self.at(cycle, "sdram_cas", 0);
        self.at(cycle, "sdram_we", 1);
        self.at(cycle, "sdram_ba", bank);
        self.at(cycle, "sdram_a", col);
        self.restore_idle(cycle + 1);
    }

    /// Schedules a PRECHARGE-all command.
    pub fn cmd_precharge_all(&mut self, cycle: u64) {
        self.at(cycle, "sdram_cs", 0);
        self.at(cycle, "sdram_ras", 0);
        self.at(cycle, "sdram_cas", 1);
        self.at(cycle, "sdram_we", 0);
        self.at(cycle, "sdram_a", 1 << 10);
        self.restore_idle(cycle + 1);
    }

    /// Schedules the completion pin to assert.
    pub fn assert_done_at(&mut self, cycle: u64) {
        self.at(cycle, "done", 1);
    }

    /// Number of `advance()` calls observed.
    pub fn advances(&self) -> u64 {
        self.advances
    }
}

impl Design for ScriptedDesign {
    fn pins(&self) -> &PinSet {
        &self.pins
    }

    fn pins_mut(&mut self) -> &mut PinSet {
        &mut self.pins
    }

    fn advance(&mut self) {
        self.advances += 1;
        let clk = self.pins.is_high(self.clk);
        let rising = clk && !self.prev_clk;
        self.prev_clk = clk;

        for &mirror in &self.mirrors {
            self.pins.write(mirror, u64::from(clk));
        }
        if !rising {
            return;
        }

        if let Some(writes) = self.script.get(&self.edge_idx) {
            for &(pin, value) in writes {
                self.pins.write(pin, value);
            }
        }
        self.edge_idx += 1;
    }
}
