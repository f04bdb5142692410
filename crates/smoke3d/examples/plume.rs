//! Headless smoke plume demo.
//!
//! Runs a top-emitter plume for a second of simulated time and prints the
//! smoke mass and stage timings every few frames.
//!
//! Run with: cargo run --release --example plume

use smoke3d::{EmitterPos, SimConfig, SmokeSimulation};

fn main() {
    env_logger::init();

    let config = SimConfig {
        nx: 32,
        ny: 64,
        nz: 32,
        dt: 0.02,
        emit_duration: 1.0,
        finish_time: 1.0,
        emitter_pos: EmitterPos::Top,
        ..SimConfig::default()
    };
    let steps = (config.finish_time / config.dt).round() as usize;

    let mut sim = SmokeSimulation::new(config).expect("valid config");

    for step in 0..steps {
        sim.update();

        if step % 10 == 0 {
            let total: f64 = sim.density().iter().sum();
            let stats = sim.solver_stats();
            println!(
                "t={:.2}s  smoke mass {:.1}  solver {} iters (residual {:.2e})",
                sim.time(),
                total,
                stats.iterations,
                stats.residual
            );
        }
    }

    println!("\n{}", sim.performance_report());
}
