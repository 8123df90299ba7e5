//! Built-in demo design.
//!
//! A small synthetic design standing in for a compiled video pipeline: it
//! generates a VGA test pattern with standard 640×480 timing and, while the
//! raster runs, performs a scripted SDRAM self-check (mode load, activate,
//! write burst, read back, precharge) over the shared data bus. The read
//! data is compared against what was written, so a run exercises the full
//! command path end to end.

use pinsim_core::Design;
use pinsim_core::design::{PinId, PinSet};

/// One raster axis: sync pulse, back porch, active area, front porch.
///
/// The sync pulse leads the line/frame, so a decoder sees one sync edge per
/// line and one per frame, each at a fixed offset from the active area.
#[derive(Debug, Clone, Copy)]
pub struct RasterTiming {
    /// Sync pulse length in pixels/lines.
    pub sync: u32,
    /// Back porch length.
    pub back: u32,
    /// Active area length.
    pub active: u32,
    /// Front porch length.
    pub front: u32,
}

impl RasterTiming {
    /// Total length of the axis.
    pub fn total(self) -> u32 {
        self.sync + self.back + self.active + self.front
    }

    /// Standard 640-pixel horizontal timing (800 clocks per line).
    pub fn standard_h() -> Self {
        Self {
            sync: 96,
            back: 48,
            active: 640,
            front: 16,
        }
    }

    /// Standard 480-line vertical timing (525 lines per frame).
    pub fn standard_v() -> Self {
        Self {
            sync: 2,
            back: 33,
            active: 480,
            front: 10,
        }
    }
}

struct DemoPins {
    clk: PinId,
    done: PinId,
    status: PinId,
    sdram_clock: PinId,
    cs: PinId,
    ras: PinId,
    cas: PinId,
    we: PinId,
    ba: PinId,
    a: PinId,
    dqm: PinId,
    dq_o: PinId,
    dq_en: PinId,
    dq_i: PinId,
    video_clock: PinId,
    vs: PinId,
    hs: PinId,
    r: PinId,
    g: PinId,
    b: PinId,
}

enum ScriptStep {
    LoadMode,
    Nop,
    Activate { bank: u64, row: u64 },
    Write { col: u64, data: u64 },
    Read { col: u64 },
    PrechargeAll,
}

/// Edges to capture from the read-back window: burst words plus CAS latency
/// plus registration slack.
const CAPTURE_EDGES: u32 = 14;

/// The demo design.
pub struct DemoDesign {
    pins: PinSet,
    ids: DemoPins,
    h: RasterTiming,
    v: RasterTiming,
    hcount: u32,
    vcount: u32,
    frame: u32,
    frames_to_run: u32,
    prev_clk: bool,
    script: Vec<ScriptStep>,
    script_pos: usize,
    capturing: Option<u32>,
    captured: Vec<u64>,
    expected: Vec<u64>,
    self_check: Option<bool>,
}

impl DemoDesign {
    /// Builds a demo with standard 640×480 timing.
    pub fn new(frames: u32) -> Self {
        Self::with_timing(RasterTiming::standard_h(), RasterTiming::standard_v(), frames)
    }

    /// Builds a demo with custom raster timing.
    pub fn with_timing(h: RasterTiming, v: RasterTiming, frames: u32) -> Self {
        let mut pins = PinSet::new();
        let ids = DemoPins {
            clk: pins.declare("clk", 1),
            done: pins.declare("done", 1),
            status: pins.declare("status", 2),
            sdram_clock: pins.declare("sdram_clock", 1),
            cs: pins.declare("sdram_cs", 1),
            ras: pins.declare("sdram_ras", 1),
            cas: pins.declare("sdram_cas", 1),
            we: pins.declare("sdram_we", 1),
            ba: pins.declare("sdram_ba", 2),
            a: pins.declare("sdram_a", 13),
            dqm: pins.declare("sdram_dqm", 1),
            dq_o: pins.declare("sdram_dq_o", 8),
            dq_en: pins.declare("sdram_dq_en", 1),
            dq_i: pins.declare("sdram_dq_i", 8),
            video_clock: pins.declare("video_clock", 1),
            vs: pins.declare("video_vs", 1),
            hs: pins.declare("video_hs", 1),
            r: pins.declare("video_r", 8),
            g: pins.declare("video_g", 8),
            b: pins.declare("video_b", 8),
        };
        // Sync lines idle high (active low).
        pins.write(ids.vs, 1);
        pins.write(ids.hs, 1);
        pins.write(ids.cs, 1);
        pins.write(ids.ras, 1);
        pins.write(ids.cas, 1);
        pins.write(ids.we, 1);

        let mut script = vec![ScriptStep::LoadMode, ScriptStep::Nop];
        script.push(ScriptStep::Activate { bank: 0, row: 5 });
        script.push(ScriptStep::Nop);
        let expected: Vec<u64> = (0..8).map(|col| 0xA0 + col).collect();
        for (col, &data) in expected.iter().enumerate() {
            script.push(ScriptStep::Write {
                col: col as u64,
                data,
            });
        }
        script.push(ScriptStep::Nop);
        for col in 0..8u64 {
            script.push(ScriptStep::Read { col });
        }
        for _ in 0..6 {
            script.push(ScriptStep::Nop);
        }
        script.push(ScriptStep::PrechargeAll);

        Self {
            pins,
            ids,
            h,
            v,
            hcount: 0,
            vcount: 0,
            frame: 0,
            frames_to_run: frames,
            prev_clk: false,
            script,
            script_pos: 0,
            capturing: None,
            captured: Vec::new(),
            expected,
            self_check: None,
        }
    }

    fn capture_tick(&mut self) {
        let Some(remaining) = self.capturing else {
            return;
        };
        self.captured.push(self.pins.read(self.ids.dq_i));
        if remaining > 1 {
            self.capturing = Some(remaining - 1);
        } else {
            self.capturing = None;
            let ok = self
                .captured
                .windows(self.expected.len())
                .any(|w| w == self.expected.as_slice());
            self.self_check = Some(ok);
            // Report on the status pin: 1 = pass, 2 = fail.
            self.pins.write(self.ids.status, if ok { 1 } else { 2 });
        }
    }

    fn raster_tick(&mut self) {
        if self.frame >= self.frames_to_run && self.hcount == 0 && self.vcount == 0 {
            self.pins.write(self.ids.done, 1);
        }

        let h = self.h;
        let v = self.v;
        let hs = self.hcount < h.sync;
        let vs = self.vcount < v.sync;
        // Active low.
        self.pins.write(self.ids.hs, (!hs) as u64);
        self.pins.write(self.ids.vs, (!vs) as u64);

        let h0 = h.sync + h.back;
        let v0 = v.sync + v.back;
        let active = (h0..h0 + h.active).contains(&self.hcount)
            && (v0..v0 + v.active).contains(&self.vcount);
        if active {
            let x = self.hcount - h0;
            let y = self.vcount - v0;
            self.pins.write(self.ids.r, (x & 0xFF) as u64);
            self.pins.write(self.ids.g, (y & 0xFF) as u64);
            self.pins
                .write(self.ids.b, (0x40 + (self.frame & 0x3F)) as u64);
        } else {
            self.pins.write(self.ids.r, 0);
            self.pins.write(self.ids.g, 0);
            self.pins.write(self.ids.b, 0);
        }

        self.hcount += 1;
        if self.hcount == h.total() {
            self.hcount = 0;
            self.vcount += 1;
            if self.vcount == v.total() {
                self.vcount = 0;
                self.frame += 1;
            }
        }
    }

    fn sdram_tick(&mut self) {
        // Deselect unless the script says otherwise.
        self.pins.write(self.ids.cs, 1);
        self.pins.write(self.ids.ras, 1);
        self.pins.write(self.ids.cas, 1);
        self.pins.write(self.ids.we, 1);
        self.pins.write(self.ids.dq_en, 0);
        self.pins.write(self.ids.dqm, 0);

        let Some(step) = self.script.get(self.script_pos) else {
            return;
        };
        match *step {
            ScriptStep::LoadMode => {
                self.pins.write(self.ids.cs, 0);
                self.pins.write(self.ids.ras, 0);
                self.pins.write(self.ids.cas, 0);
                self.pins.write(self.ids.we, 0);
                // CL=2, sequential, burst length 1.
                self.pins.write(self.ids.a, 0x20);
            }
            ScriptStep::Nop => {
                self.pins.write(self.ids.cs, 0);
            }
            ScriptStep::Activate { bank, row } => {
                self.pins.write(self.ids.cs, 0);
                self.pins.write(self.ids.ras, 0);
                self.pins.write(self.ids.ba, bank);
                self.pins.write(self.ids.a, row);
            }
            ScriptStep::Write { col, data } => {
                self.pins.write(self.ids.cs, 0);
                self.pins.write(self.ids.cas, 0);
                self.pins.write(self.ids.we, 0);
                self.pins.write(self.ids.ba, 0);
                self.pins.write(self.ids.a, col);
                self.pins.write(self.ids.dq_o, data);
                self.pins.write(self.ids.dq_en, 1);
            }
            ScriptStep::Read { col } => {
                self.pins.write(self.ids.cs, 0);
                self.pins.write(self.ids.cas, 0);
                self.pins.write(self.ids.ba, 0);
                self.pins.write(self.ids.a, col);
                if self.capturing.is_none() && self.self_check.is_none() {
                    self.capturing = Some(CAPTURE_EDGES);
                }
            }
            ScriptStep::PrechargeAll => {
                self.pins.write(self.ids.cs, 0);
                self.pins.write(self.ids.ras, 0);
                self.pins.write(self.ids.we, 0);
                self.pins.write(self.ids.a, 1 << 10);
            }
        }
        self.script_pos += 1;
    }
}

impl Design for DemoDesign {
    fn pins(&self) -> &PinSet {
        &self.pins
    }

    fn pins_mut(&mut self) -> &mut PinSet {
        &mut self.pins
    }

    fn advance(&mut self) {
        let clk = self.pins.is_high(self.ids.clk);
        let rising = clk && !self.prev_clk;
        self.prev_clk = clk;

        // Clock mirrors settle combinationally on both edges.
        self.pins.write(self.ids.sdram_clock, clk as u64);
        self.pins.write(self.ids.video_clock, clk as u64);
        if !rising {
            return;
        }

        // dq_i was latched by the harness during the previous half-cycle.
        self.capture_tick();
        self.raster_tick();
        self.sdram_tick();
    }
}

impl std::fmt::Debug for DemoDesign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoDesign")
            .field("frame", &self.frame)
            .field("hcount", &self.hcount)
            .field("vcount", &self.vcount)
            .finish_non_exhaustive()
    }
}
