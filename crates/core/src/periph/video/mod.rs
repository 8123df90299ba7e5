//! VGA signal decoder model.
//!
//! The decoder is purely observational: it samples the color channels and
//! both sync lines once per pixel clock and reconstructs frames from pulse
//! timing alone, with no out-of-band geometry descriptor. It provides:
//! 1. **Row framing:** A sync edge on the horizontal line ends the current
//!    row; one on the vertical line commits the current frame.
//! 2. **Geometry lock:** The active window is inferred from the extent of
//!    non-blank samples, trusted only after a configured number of
//!    consecutive agreeing rows plus one full frame (the warm-up a monitor
//!    goes through when locking onto an unfamiliar signal).
//! 3. **Frame emission:** Once locked, every committed frame has identical
//!    dimensions; inconsistent frames are dropped and the lock restarts.

/// Decoded frame and sample types.
pub mod frame;

use std::mem;

use tracing::{debug, warn};

use crate::common::error::SimError;
use crate::config::{PinNames, SyncPolarity, VideoConfig};
use crate::design::{PinId, PinSet};
use crate::periph::Peripheral;
use self::frame::{Frame, Rgb};

/// Decoder observation counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoCounters {
    /// Sync-delimited rows observed, including blanking rows.
    pub rows_observed: u64,
    /// Frames committed and emitted.
    pub frames_committed: u64,
    /// Frames discarded during warm-up or after a consistency failure.
    pub frames_discarded: u64,
}

struct RowInfo {
    samples: Vec<Rgb>,
    /// (start, width) of the non-blank extent, if any sample was non-blank.
    extent: Option<(usize, usize)>,
}

/// The decoder core, independent of any pin binding.
///
/// Feed it one [`sample`](Self::sample) per pixel-clock rising edge; the
/// [`Vga`] wrapper adapts it to the [`Peripheral`] pin interface. The output
/// is the growing sequence of committed frames, drained with
/// [`take_frames`](Self::take_frames); restarting the stream means
/// reconstructing the decoder.
pub struct VgaDecoder {
    polarity: SyncPolarity,
    lock_rows: usize,
    depth_mask: u8,
    depth_shift: u32,
    initialized: bool,
    last_hs: bool,
    last_vs: bool,
    row: Vec<Rgb>,
    rows: Vec<RowInfo>,
    candidate: Option<(usize, usize)>,
    consec: usize,
    geometry: Option<(usize, usize)>,
    window: Option<(usize, usize)>,
    frames: Vec<Frame>,
    counters: VideoCounters,
}

impl VgaDecoder {
    /// Builds a decoder from configuration.
    pub fn new(cfg: &VideoConfig) -> Result<Self, SimError> {
        cfg.validate()?;
        Ok(Self {
            polarity: cfg.polarity,
            lock_rows: cfg.lock_rows,
            depth_mask: ((1u16 << cfg.color_depth) - 1) as u8,
            depth_shift: 8 - cfg.color_depth,
            initialized: false,
            last_hs: false,
            last_vs: false,
            row: Vec::new(),
            rows: Vec::new(),
            candidate: None,
            consec: 0,
            geometry: None,
            window: None,
            frames: Vec::new(),
            counters: VideoCounters::default(),
        })
    }

    /// Returns `true` once both the horizontal extent and the vertical
    /// window are locked.
    pub fn locked(&self) -> bool {
        self.geometry.is_some() && self.window.is_some()
    }

    /// The inferred (start, width) of the active area, once known.
    pub fn active_extent(&self) -> Option<(usize, usize)> {
        self.geometry
    }

    /// Observation counters.
    pub fn counters(&self) -> VideoCounters {
        self.counters
    }

    /// Number of committed frames waiting to be drained.
    pub fn frames_pending(&self) -> usize {
        self.frames.len()
    }

    /// Drains all committed frames, oldest first.
    pub fn take_frames(&mut self) -> Vec<Frame> {
        mem::take(&mut self.frames)
    }

    fn scale(&self, raw: u64) -> u8 {
        ((raw as u8) & self.depth_mask) << self.depth_shift
    }

    /// Consumes one pixel-clock sample.
    ///
    /// `hs`/`vs` are raw line levels; the configured polarity decides what
    /// "asserted" means. Color channels are raw lane values, masked to the
    /// configured depth and widened to 8 bits.
    pub fn sample(&mut self, vs: bool, hs: bool, r: u64, g: u64, b: u64) {
        let hs_now = self.polarity.asserted(hs);
        let vs_now = self.polarity.asserted(vs);
        if !self.initialized {
            self.last_hs = hs_now;
            self.last_vs = vs_now;
            self.initialized = true;
        }
        let hs_edge = hs_now && !self.last_hs;
        let vs_edge = vs_now && !self.last_vs;
        self.last_hs = hs_now;
        self.last_vs = vs_now;

        if hs_edge {
            self.end_row();
        }
        if vs_edge {
            self.commit_frame();
        }

        self.row
            .push(Rgb::new(self.scale(r), self.scale(g), self.scale(b)));
    }

    fn end_row(&mut self) {
        let samples = mem::take(&mut self.row);
        let extent = row_extent(&samples);
        self.counters.rows_observed += 1;

        if self.geometry.is_none() {
            if let Some(ext) = extent {
                if self.candidate == Some(ext) {
                    self.consec += 1;
                } else {
                    self.candidate = Some(ext);
                    self.consec = 1;
                }
                if self.consec >= self.lock_rows {
                    debug!(x0 = ext.0, width = ext.1, "active width locked");
                    self.geometry = Some(ext);
                }
            }
        }

        self.rows.push(RowInfo { samples, extent });
    }

    fn commit_frame(&mut self) {
        let rows = mem::take(&mut self.rows);
        // A partial row between the last hsync and the vsync edge is
        // blanking-interval garbage.
        self.row.clear();
        if rows.is_empty() {
            return;
        }

        let Some((x0, width)) = self.geometry else {
            self.counters.frames_discarded += 1;
            debug!("frame discarded: active width not yet locked");
            return;
        };

        if let Some((y0, height)) = self.window {
            self.emit(&rows, x0, width, y0, height);
            return;
        }

        // First committed frame after the width lock fixes the vertical
        // window; it is consumed by the lock, not emitted.
        let matching: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.extent == Some((x0, width)))
            .map(|(i, _)| i)
            .collect();
        self.counters.frames_discarded += 1;
        match (matching.first(), matching.last()) {
            (Some(&first), Some(&last)) if last - first + 1 == matching.len() => {
                let height = matching.len();
                debug!(y0 = first, height, "vertical window locked");
                self.window = Some((first, height));
            }
            (Some(_), Some(_)) => {
                debug!("frame discarded: active rows not contiguous");
            }
            _ => {
                debug!("frame discarded: no rows match the locked width");
            }
        }
    }

    fn emit(&mut self, rows: &[RowInfo], x0: usize, width: usize, y0: usize, height: usize) {
        let complete = rows.len() >= y0 + height
            && rows[y0..y0 + height]
                .iter()
                .all(|r| r.samples.len() >= x0 + width);
        if !complete {
            warn!(
                rows = rows.len(),
                "inconsistent frame after geometry lock; re-locking"
            );
            self.counters.frames_discarded += 1;
            self.window = None;
            return;
        }
        let mut pixels = Vec::with_capacity(width * height);
        for r in &rows[y0..y0 + height] {
            pixels.extend_from_slice(&r.samples[x0..x0 + width]);
        }
        self.frames.push(Frame::new(width, height, pixels));
        self.counters.frames_committed += 1;
    }
}

impl std::fmt::Debug for VgaDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VgaDecoder")
            .field("geometry", &self.geometry)
            .field("window", &self.window)
            .field("frames_pending", &self.frames.len())
            .finish_non_exhaustive()
    }
}

fn row_extent(samples: &[Rgb]) -> Option<(usize, usize)> {
    let first = samples.iter().position(|p| !p.is_blank())?;
    let last = samples.iter().rposition(|p| !p.is_blank())?;
    Some((first, last - first + 1))
}

/// Resolved pin handles for the video wiring.
#[derive(Debug, Clone, Copy)]
pub struct VideoPins {
    /// Pixel clock output of the design.
    pub clock: PinId,
    /// Vertical sync line.
    pub vs: PinId,
    /// Horizontal sync line.
    pub hs: PinId,
    /// Red channel lanes.
    pub r: PinId,
    /// Green channel lanes.
    pub g: PinId,
    /// Blue channel lanes.
    pub b: PinId,
}

impl VideoPins {
    /// Resolves the configured pin names against the design's pin set.
    pub fn bind(pins: &PinSet, names: &PinNames) -> Result<Self, SimError> {
        Ok(Self {
            clock: pins.resolve(&names.video_clock)?,
            vs: pins.resolve(&names.video_vs)?,
            hs: pins.resolve(&names.video_hs)?,
            r: pins.resolve(&names.video_r)?,
            g: pins.resolve(&names.video_g)?,
            b: pins.resolve(&names.video_b)?,
        })
    }
}

/// The video decoder as a pin-attached peripheral.
pub struct Vga {
    decoder: VgaDecoder,
    pins: VideoPins,
    last_clk: bool,
}

impl Vga {
    /// Builds the decoder and binds its pins.
    pub fn new(cfg: &VideoConfig, pins: VideoPins) -> Result<Self, SimError> {
        Ok(Self {
            decoder: VgaDecoder::new(cfg)?,
            pins,
            last_clk: false,
        })
    }

    /// The decoder core.
    pub fn decoder(&self) -> &VgaDecoder {
        &self.decoder
    }

    /// Mutable access to the decoder core.
    pub fn decoder_mut(&mut self) -> &mut VgaDecoder {
        &mut self.decoder
    }
}

impl Peripheral for Vga {
    fn name(&self) -> &str {
        "VGA"
    }

    fn eval(&mut self, _edge: u64, pins: &PinSet) -> Result<(), SimError> {
        let clk = pins.is_high(self.pins.clock);
        let rising = clk && !self.last_clk;
        self.last_clk = clk;
        if !rising {
            return Ok(());
        }
        self.decoder.sample(
            pins.is_high(self.pins.vs),
            pins.is_high(self.pins.hs),
            pins.read(self.pins.r),
            pins.read(self.pins.g),
            pins.read(self.pins.b),
        );
        Ok(())
    }

    fn as_video_mut(&mut self) -> Option<&mut Vga> {
        Some(self)
    }
}

impl std::fmt::Debug for Vga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vga")
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}
