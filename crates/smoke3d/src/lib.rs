//! 3D Eulerian Smoke Simulation
//!
//! A grid-based smoke solver on a regular staggered grid: buoyancy and
//! vorticity-confinement forcing, semi-Lagrangian advection, and an
//! incomplete-Cholesky preconditioned conjugate-gradient pressure
//! projection, plus a light-transparency accumulation pass over the same
//! grid.
//!
//! # Example
//!
//! ```
//! use smoke3d::{SimConfig, SmokeSimulation};
//!
//! let config = SimConfig {
//!     nx: 16,
//!     ny: 16,
//!     nz: 16,
//!     ..SimConfig::default()
//! };
//! let mut sim = SmokeSimulation::new(config).unwrap();
//!
//! // Advance a few frames and hand the density field to a renderer.
//! for _ in 0..3 {
//!     sim.update();
//! }
//! let density: &[f64] = sim.density();
//! assert!(density.iter().any(|&d| d > 0.0));
//! ```

pub mod advection;
pub mod config;
pub mod emitter;
pub mod forces;
pub mod grid;
pub mod light;
pub mod metrics;
pub mod pressure;
pub mod solver;

pub use config::{ConfigError, EmitterPos, SimConfig};
pub use glam::DVec3;
pub use grid::SmokeGrid;
pub use metrics::SimMetrics;
pub use solver::SolveStats;

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use pressure::PressureSolver;

/// Replacement source term installed with [`SmokeSimulation::set_emitter`].
pub type EmitterFn = Box<dyn FnMut(&mut SmokeGrid) + Send>;

/// One smoke simulation instance.
///
/// Owns every field, the cached Poisson matrix and preconditioner, and the
/// simulation clock. All memory is allocated at construction; `update()`
/// allocates nothing.
pub struct SmokeSimulation {
    /// Field storage; exposed for inspection and scene setup.
    pub grid: SmokeGrid,
    config: SimConfig,
    solver: PressureSolver,
    metrics: SimMetrics,
    rng: StdRng,
    custom_emitter: Option<EmitterFn>,

    time: f64,
    dt: f64,
    ambient_temperature: f64,
    alpha: f64,
    beta: f64,
    vort_eps: f64,
    decay_factor: f64,
    light_position: DVec3,
    light_factor: f64,
}

impl SmokeSimulation {
    /// Build a simulator from a validated configuration.
    ///
    /// Assembles and factors the Poisson matrix, seeds the emitter RNG, and
    /// runs the initial emission if the emit duration is positive.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = SmokeGrid::new(
            config.nx,
            config.ny,
            config.nz,
            config.voxel_size,
            config.ambient_temperature,
        );
        let solver = PressureSolver::new(
            config.nx,
            config.ny,
            config.nz,
            config.tolerance,
            config.max_iterations,
        );

        let mut sim = Self {
            grid,
            solver,
            metrics: SimMetrics::new(),
            rng: StdRng::seed_from_u64(config.seed),
            custom_emitter: None,
            time: 0.0,
            dt: config.dt,
            ambient_temperature: config.ambient_temperature,
            alpha: config.alpha,
            beta: config.beta,
            vort_eps: config.vort_eps,
            decay_factor: config.decay_factor,
            light_position: DVec3::from_array(config.light_position),
            light_factor: config.light_factor,
            config,
        };

        if sim.time < sim.config.emit_duration {
            sim.emit();
        }
        Ok(sim)
    }

    /// Advance the simulation by one time step.
    ///
    /// Runs the ten pipeline stages in order; a no-op once the clock has
    /// passed the configured finish time.
    pub fn update(&mut self) {
        if self.time > self.config.finish_time {
            return;
        }
        self.metrics.begin_step();

        let t = Instant::now();
        forces::buoyancy(&mut self.grid, self.alpha, self.beta, self.ambient_temperature);
        self.metrics.record("buoyancy", t.elapsed());

        let t = Instant::now();
        forces::vorticity_confinement(&mut self.grid, self.vort_eps);
        self.metrics.record("vorticity_confinement", t.elapsed());

        let t = Instant::now();
        forces::apply_forces(&mut self.grid, self.dt);
        self.metrics.record("apply_forces", t.elapsed());

        let t = Instant::now();
        advection::advect_velocity(&mut self.grid, self.dt);
        self.metrics.record("advect_velocity", t.elapsed());

        let t = Instant::now();
        let stats = self.solver.solve(&mut self.grid, self.dt);
        self.metrics.set_solver_stats(stats);
        self.metrics.record("pressure_solve", t.elapsed());

        let t = Instant::now();
        pressure::apply_pressure(&mut self.grid, self.dt);
        self.metrics.record("apply_pressure", t.elapsed());

        let t = Instant::now();
        advection::advect_scalars(&mut self.grid, self.dt, self.decay_factor);
        self.metrics.record("advect_scalars", t.elapsed());

        let t = Instant::now();
        emitter::fix_occupied_voxels(&mut self.grid, self.ambient_temperature);
        self.metrics.record("occupancy", t.elapsed());

        let t = Instant::now();
        light::gen_transparency_map(&mut self.grid, self.light_position, self.light_factor);
        self.metrics.record("transparency", t.elapsed());

        if self.time < self.config.emit_duration {
            let t = Instant::now();
            self.emit();
            self.metrics.record("emission", t.elapsed());
        }

        self.metrics.end_step();
        self.time += self.dt;
    }

    fn emit(&mut self) {
        if let Some(custom) = self.custom_emitter.as_mut() {
            custom(&mut self.grid);
        } else {
            emitter::add_source(&mut self.grid, &self.config, &mut self.rng);
            emitter::set_emitter_velocity(&mut self.grid, &self.config, &mut self.rng);
        }
    }

    /// Zero all fields, restore the ambient temperature, drop the solver
    /// warm start, and rewind the clock to zero.
    pub fn reset(&mut self) {
        self.grid.clear(self.ambient_temperature);
        self.solver.reset();
        self.metrics.clear();
        self.time = 0.0;
    }

    // ========== Accessors ==========

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Smoke density field, row-major per the grid index convention.
    pub fn density(&self) -> &[f64] {
        &self.grid.density
    }

    /// Transparency field, row-major per the grid index convention.
    pub fn transparency(&self) -> &[f64] {
        &self.grid.transparency
    }

    /// Magnitude of the vorticity-confinement force per cell, for
    /// diagnostics and visualization.
    pub fn vorticity_magnitude(&self) -> &[f64] {
        &self.grid.vort
    }

    /// The configuration this simulator was built from.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Stats of the most recent pressure solve.
    pub fn solver_stats(&self) -> SolveStats {
        self.metrics.solver_stats()
    }

    /// Stage timings of the last step plus solver iteration count and
    /// residual, as free-form text.
    pub fn performance_report(&self) -> String {
        self.metrics.format_report()
    }

    // ========== Setters ==========

    /// Install the solid obstacle mask. Must cover every cell.
    pub fn set_occupied_voxels(&mut self, occupied: &[bool]) -> Result<(), ConfigError> {
        if occupied.len() != self.grid.cell_count() {
            return Err(ConfigError::OccupancyLenMismatch {
                got: occupied.len(),
                expected: self.grid.cell_count(),
            });
        }
        self.grid.occupied.copy_from_slice(occupied);
        Ok(())
    }

    /// Change the ambient temperature used by buoyancy, occupancy fix-up,
    /// and reset.
    pub fn set_ambient_temperature(&mut self, temperature: f64) {
        self.ambient_temperature = temperature;
    }

    /// Change the smoke-weight buoyancy coefficient.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    /// Change the thermal buoyancy coefficient.
    pub fn set_beta(&mut self, beta: f64) {
        self.beta = beta;
    }

    /// Change the vorticity confinement strength.
    pub fn set_vort_eps(&mut self, vort_eps: f64) {
        self.vort_eps = vort_eps;
    }

    /// Change the per-step density decay (1.0 disables decay).
    pub fn set_decay_factor(&mut self, decay_factor: f64) {
        self.decay_factor = decay_factor;
    }

    /// Change the time step.
    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    /// Replace the built-in source with a custom emitter. The closure runs
    /// whenever emission is active; pass-through of the built-in source is
    /// restored with [`SmokeSimulation::clear_emitter`].
    pub fn set_emitter(&mut self, emitter: EmitterFn) {
        self.custom_emitter = Some(emitter);
    }

    /// Restore the built-in source.
    pub fn clear_emitter(&mut self) {
        self.custom_emitter = None;
    }
}
