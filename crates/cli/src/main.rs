//! Co-simulation harness CLI.
//!
//! This binary runs the built-in demo design through the co-simulation
//! loop. It performs:
//! 1. **Configuration:** Defaults or a JSON file (`--config`).
//! 2. **Simulation:** Steps the demo design against the SDRAM model and the
//!    VGA decoder until completion, stop, or the cycle budget.
//! 3. **Output:** A statistics report, optional PPM dumps of decoded
//!    frames, and an optional raw dump of the SDRAM array.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pinsim_core::periph::video::frame::Frame;
use pinsim_core::sim::ExitReason;
use pinsim_core::{Config, Simulator};

mod demo;

use demo::DemoDesign;

#[derive(Parser, Debug)]
#[command(
    name = "pinsim",
    author,
    version,
    about = "Cycle-stepped co-simulation harness",
    long_about = "Drive a synchronous design against an SDRAM controller model and a VGA \
                  decoder, half-cycle by half-cycle.\n\nExamples:\n  pinsim run\n  pinsim run \
                  --frames 5 --dump-frames out/\n  pinsim run --config harness.json --cycles 2000000"
)]
struct Cli {
    /// Raise the log filter to debug (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in demo design.
    Run {
        /// JSON configuration file; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Override the cycle budget (0 = unlimited).
        #[arg(long)]
        cycles: Option<u64>,

        /// Frames the demo design generates before asserting completion.
        #[arg(long, default_value_t = 3)]
        frames: u32,

        /// Directory for PPM dumps of the decoded frames.
        #[arg(long)]
        dump_frames: Option<PathBuf>,

        /// Path for a raw dump of the SDRAM array after the run.
        #[arg(long)]
        dump_memory: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            config,
            cycles,
            frames,
            dump_frames,
            dump_memory,
        } => cmd_run(config, cycles, frames, dump_frames, dump_memory),
    }
}

fn cmd_run(
    config_path: Option<String>,
    cycles: Option<u64>,
    frames: u32,
    dump_frames: Option<PathBuf>,
    dump_memory: Option<PathBuf>,
) {
    let mut config = match config_path {
        Some(path) => match Config::from_json_file(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(budget) = cycles {
        config.loop_cfg.max_cycles = budget;
    }

    let design = DemoDesign::new(frames);
    let mut sim = match Simulator::new(Box::new(design), &config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    println!(
        "[*] Demo design: {frames} frame(s), SDRAM {} rows x {} cols x {} banks x {} bits",
        1u32 << config.sdram.row_bits,
        1u32 << config.sdram.col_bits,
        1u32 << config.sdram.bank_bits,
        config.sdram.width.bits()
    );

    let summary = match sim.run() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            process::exit(1);
        }
    };

    let reason = match summary.exit {
        ExitReason::Completed => "design completed",
        ExitReason::Stopped => "stop requested",
        ExitReason::CycleLimit => "cycle budget exhausted",
    };
    println!("\n[*] Run finished: {reason} after {} cycles", summary.cycles);

    // The demo reports its SDRAM read-back result on a status pin.
    if let Ok(status) = sim.design().pins().resolve("status") {
        match sim.design().pins().read(status) {
            0 => println!("[*] SDRAM self-check: not completed"),
            1 => println!("[*] SDRAM self-check: pass"),
            _ => println!("[!] SDRAM self-check: FAIL"),
        }
    }

    sim.stats().print();

    let decoded = sim.take_frames();
    if let Some(dir) = dump_frames {
        if let Err(e) = dump_frame_files(&dir, &decoded) {
            eprintln!("Error writing frames: {e}");
            process::exit(1);
        }
        println!("[*] Wrote {} frame(s) to {}", decoded.len(), dir.display());
    }

    if let Some(path) = dump_memory {
        let result = sim
            .sdram_mut()
            .map(|sdram| sdram.dump_image(&path))
            .transpose();
        if let Err(e) = result {
            eprintln!("Error: {e}");
            process::exit(1);
        }
        println!("[*] Wrote SDRAM image to {}", path.display());
    }

    process::exit(0);
}

/// Writes each frame as a binary PPM file (`frame_NNN.ppm`) under `dir`.
fn dump_frame_files(dir: &Path, frames: &[Frame]) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("frame_{i:03}.ppm"));
        let mut data = format!("P6\n{} {}\n255\n", frame.width(), frame.height()).into_bytes();
        for px in frame.pixels() {
            data.extend_from_slice(&[px.r, px.g, px.b]);
        }
        let mut file = fs::File::create(path)?;
        file.write_all(&data)?;
    }
    Ok(())
}
