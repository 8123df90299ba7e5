//! Run control tests: termination conditions, startup pin resolution,
//! peripheral evaluation order, and fault propagation.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use pinsim_core::common::error::SimError;
use pinsim_core::sim::ExitReason;
use pinsim_core::{Config, Simulator};
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;
use crate::common::init_tracing;
use crate::common::mocks::design::ScriptedDesign;
use crate::common::mocks::peripheral::MockPeriph;

// ══════════════════════════════════════════════════════════
// 1. Termination
// ══════════════════════════════════════════════════════════

#[test]
fn completion_pin_ends_the_run() {
    let mut design = ScriptedDesign::full();
    design.assert_done_at(20);

    let mut ctx = TestContext::with_defaults(design);
    let summary = ctx.sim.run().unwrap();
    assert_eq!(summary.exit, ExitReason::Completed);
    // The pin asserts at rising edge 20, which is the 21st cycle; the loop
    // honors it at the end of that cycle.
    assert_eq!(summary.cycles, 21);
}

#[test]
fn stop_flag_checked_once_per_cycle() {
    let design = ScriptedDesign::full();
    let mut ctx = TestContext::with_defaults(design);

    let stop = ctx.sim.stop_handle();
    stop.store(true, Ordering::Relaxed);
    let summary = ctx.sim.run().unwrap();
    assert_eq!(summary.exit, ExitReason::Stopped);
    assert_eq!(summary.cycles, 0);
}

#[test]
fn cycle_budget_ends_the_run() {
    let design = ScriptedDesign::full();
    let mut config = Config::default();
    config.loop_cfg.max_cycles = 5;

    let mut ctx = TestContext::new(design, &config);
    let summary = ctx.sim.run().unwrap();
    assert_eq!(summary.exit, ExitReason::CycleLimit);
    assert_eq!(summary.cycles, 5);
}

#[test]
fn completion_pin_is_optional() {
    let mut design = ScriptedDesign::full();
    design.assert_done_at(1);

    let mut config = Config::default();
    config.pins.done = String::new();
    config.loop_cfg.max_cycles = 3;

    let mut ctx = TestContext::new(design, &config);
    let summary = ctx.sim.run().unwrap();
    // With no completion pin bound, the asserted design pin is ignored.
    assert_eq!(summary.exit, ExitReason::CycleLimit);
    assert_eq!(summary.cycles, 3);
}

// ══════════════════════════════════════════════════════════
// 2. Startup pin resolution
// ══════════════════════════════════════════════════════════

#[test]
fn missing_pin_is_fatal_before_the_first_edge() {
    init_tracing();
    let design = ScriptedDesign::full();
    let mut config = Config::default();
    config.pins.sdram_cs = "sdram_csn".to_owned();

    let err = Simulator::new(Box::new(design), &config).unwrap_err();
    match err {
        SimError::UnknownPin(name) => assert_eq!(name, "sdram_csn"),
        other => panic!("expected UnknownPin, got {other}"),
    }
}

// ══════════════════════════════════════════════════════════
// 3. Peripheral evaluation
// ══════════════════════════════════════════════════════════

#[test]
fn peripherals_evaluated_in_attachment_order() {
    init_tracing();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut first = MockPeriph::new();
    let log = Arc::clone(&order);
    let _ = first.expect_eval().returning(move |_, _| {
        log.lock().unwrap().push("first");
        Ok(())
    });

    let mut second = MockPeriph::new();
    let log = Arc::clone(&order);
    let _ = second.expect_eval().returning(move |_, _| {
        log.lock().unwrap().push("second");
        Ok(())
    });

    let mut sim = Simulator::bare(Box::new(ScriptedDesign::full()), &Config::default()).unwrap();
    sim.add_peripheral(Box::new(first));
    sim.add_peripheral(Box::new(second));

    sim.half_step().unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);

    sim.half_step().unwrap();
    assert_eq!(order.lock().unwrap().len(), 4, "both edges evaluate");
}

#[test]
fn peripheral_fault_aborts_the_run() {
    init_tracing();
    let mut faulty = MockPeriph::new();
    let _ = faulty.expect_eval().returning(|edge, _| {
        Err(SimError::PeripheralFault {
            edge,
            peripheral: "mock".to_owned(),
            detail: "injected fault".to_owned(),
        })
    });

    let mut sim = Simulator::bare(Box::new(ScriptedDesign::full()), &Config::default()).unwrap();
    sim.add_peripheral(Box::new(faulty));

    let err = sim.tick().unwrap_err();
    assert!(matches!(err, SimError::PeripheralFault { edge: 0, .. }));
}

#[test]
fn scripted_design_mirrors_its_clock() {
    use pinsim_core::Design;

    let mut design = ScriptedDesign::full();
    let clk = design.pins().resolve("clk").unwrap();
    let sdram_clock = design.pins().resolve("sdram_clock").unwrap();

    design.pins_mut().write(clk, 1);
    design.advance();
    assert_eq!(design.pins().read(sdram_clock), 1);

    design.pins_mut().write(clk, 0);
    design.advance();
    assert_eq!(design.pins().read(sdram_clock), 0);
    assert_eq!(design.advances(), 2);
}

// ══════════════════════════════════════════════════════════
// 4. Statistics
// ══════════════════════════════════════════════════════════

#[test]
fn stats_count_cycles_and_edges() {
    let design = ScriptedDesign::full();
    let mut ctx = TestContext::with_defaults(design);
    ctx.run_cycles(7).unwrap();
    assert_eq!(ctx.sim.stats().cycles, 7);
    assert_eq!(ctx.sim.stats().edges, 14);
    assert_eq!(ctx.sim.edges(), 14);
}
