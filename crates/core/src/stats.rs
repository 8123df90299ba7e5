//! Simulation statistics collection and reporting.
//!
//! Tracks the run's progress counters:
//! 1. **Time:** Full cycles and half-cycle edges stepped, plus wall-clock
//!    rate.
//! 2. **SDRAM command mix:** Activates, reads, writes, precharges,
//!    refreshes, and protocol violations.
//! 3. **Video:** Rows observed, frames committed and discarded, lock state.

use std::time::Instant;

use crate::periph::sdram::SdramCounters;
use crate::periph::video::VideoCounters;

/// Statistics for one simulation run.
#[derive(Debug, Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Full clock cycles stepped.
    pub cycles: u64,
    /// Half-cycle edges stepped.
    pub edges: u64,
    /// SDRAM model counters, collected at run end.
    pub sdram: SdramCounters,
    /// Video decoder counters, collected at run end.
    pub video: VideoCounters,
    /// Whether the video decoder reached geometry lock.
    pub video_locked: bool,
}

impl SimStats {
    /// Creates zeroed statistics stamped with the current time.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            edges: 0,
            sdram: SdramCounters::default(),
            video: VideoCounters::default(),
            video_locked: false,
        }
    }

    /// Wall-clock seconds since construction.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Simulated cycles per wall-clock second.
    pub fn cycles_per_sec(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            self.cycles as f64 / secs
        } else {
            0.0
        }
    }

    /// Prints a human-readable report to stdout.
    pub fn print(&self) {
        println!("=== Simulation Statistics ===");
        println!(
            "Cycles:        {} ({} edges, {:.0} cycles/s)",
            self.cycles,
            self.edges,
            self.cycles_per_sec()
        );
        println!("SDRAM commands:");
        println!("  activate:    {}", self.sdram.activates);
        println!("  read:        {}", self.sdram.reads);
        println!("  write:       {}", self.sdram.writes);
        println!("  precharge:   {}", self.sdram.precharges);
        println!("  refresh:     {}", self.sdram.refreshes);
        println!("  load mode:   {}", self.sdram.mode_loads);
        println!("  burst stop:  {}", self.sdram.burst_stops);
        println!("  violations:  {}", self.sdram.protocol_violations);
        println!("Video:");
        println!("  rows:        {}", self.video.rows_observed);
        println!("  frames:      {}", self.video.frames_committed);
        println!("  discarded:   {}", self.video.frames_discarded);
        println!(
            "  geometry:    {}",
            if self.video_locked { "locked" } else { "not locked" }
        );
    }
}

impl Default for SimStats {
    fn default() -> Self {
        Self::new()
    }
}
