use adcs_sim::config::presets;
use adcs_sim::device::DeviceSet;
use adcs_sim::dynamics::SystemSnapshot;
use adcs_sim::gnc::{Controller, ControllerBuilder, Goal, PidGains};
use adcs_sim::sim::{FnSink, MonotonicClock, Simulator};
use adcs_sim::{Clock, Result};
use nalgebra::Vector3;

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // -----------------------------------------------------------------------
    // Satellite: four-wheel pyramid, 20 s ramped slew
    // -----------------------------------------------------------------------
    let config = presets::pyramid();
    let goal = Goal::new(Vector3::new(0.30, -0.20, 0.45))
        .ramp_time(Clock::from_secs(20))
        .required_accuracy(1e-3)
        .hold_time(Clock::from_secs(30));
    let gains = PidGains {
        kp: Vector3::new(0.04, 0.05, 0.06),
        ki: Vector3::repeat(4e-4),
        kd: Vector3::new(0.16, 0.20, 0.24),
        filter: 5.0,
    };

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let mut peak_rate = 0.0_f64;
    let mut peak_wheel = 0.0_f64;
    let mut reports = 0_usize;

    let (summary, snapshot, end, steps) = {
        let sink = FnSink(|s: &SystemSnapshot, _time: Clock, _step: Clock| {
            peak_rate = peak_rate.max(s.satellite.omega_b.norm());
            peak_wheel = s.reaction_wheels.iter().map(|w| w.omega.abs()).fold(peak_wheel, f64::max);
            reports += 1;
        });
        let mut sim = Simulator::from_config(&config, sink, MonotonicClock::new())?;
        let mut controller = ControllerBuilder::new()
            .devices(DeviceSet::from_config(&config)?)
            .gains(gains)
            .goal(goal.clone())
            .build()?;

        let summary = controller.run(&mut sim)?;
        (summary, sim.snapshot().clone(), sim.time(), sim.steps())
    };

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    let sat = &snapshot.satellite;
    let error = goal.attitude - sat.theta_b;

    println!();
    println!("====================================================================");
    println!("  ADCS SIMULATION — {} reaction wheels, pyramid", snapshot.reaction_wheels.len());
    println!("====================================================================");
    println!();
    println!("  Run");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Simulated:     {}   steps: {:>8}   reports: {:>6}", end, steps, reports);
    println!(
        "  Control:       {:>8} cycles   saturated: {:>6}   clamped: {:>6}",
        summary.cycles, summary.saturated_cycles, summary.clamped_commands
    );
    println!();

    println!("  Attitude (rad)            x           y           z");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Target         {:>12.5} {:>11.5} {:>11.5}",
        goal.attitude.x, goal.attitude.y, goal.attitude.z
    );
    println!(
        "  Final          {:>12.5} {:>11.5} {:>11.5}",
        sat.theta_b.x, sat.theta_b.y, sat.theta_b.z
    );
    println!("  Error          {:>12.2e} {:>11.2e} {:>11.2e}", error.x, error.y, error.z);
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Peak body rate:     {:>10.4} rad/s", peak_rate);
    println!("  Peak wheel speed:   {:>10.1} rad/s", peak_wheel);
    println!("  Peak wheel torque:  {:>10.2e} N·m", summary.peak_wheel_torque);
    println!("  Final |H|:          {:>10.2e} N·m·s", snapshot.total_momentum().norm());
    match goal.required_accuracy {
        Some(acc) if error.norm() <= acc => println!("  Pointing:           within {:.1e} rad", acc),
        Some(acc) => println!("  Pointing:           outside {:.1e} rad", acc),
        None => {}
    }
    println!();

    Ok(())
}
