//! Simulation configuration.
//!
//! All grid dimensions, physical constants, emitter parameters, and solver
//! budgets live in [`SimConfig`]. The simulator owns a copy; there are no
//! process-global tunables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placement of the smoke source along the Y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitterPos {
    /// Source box near j = 0; smoke is pushed in +Y.
    #[default]
    Top,
    /// Source box near j = Ny; smoke is pushed in -Y.
    Bottom,
}

/// Errors reported when a configuration cannot produce a valid simulator.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// One or more grid dimensions is zero.
    #[error("grid dimensions must be positive, got {nx}x{ny}x{nz}")]
    InvalidGridSize {
        /// Cells along X.
        nx: usize,
        /// Cells along Y.
        ny: usize,
        /// Cells along Z.
        nz: usize,
    },

    /// Voxel spacing must be a positive length.
    #[error("voxel size must be positive, got {0}")]
    InvalidVoxelSize(f64),

    /// Time step must be positive.
    #[error("time step must be positive, got {0}")]
    InvalidTimeStep(f64),

    /// Solver tolerance must be positive.
    #[error("solver tolerance must be positive, got {0}")]
    InvalidTolerance(f64),

    /// The emitter box does not fit inside the grid.
    #[error(
        "source box {size_x}x{size_y}x{size_z} with Y margin {margin} \
         does not fit a {nx}x{ny}x{nz} grid"
    )]
    SourceOutOfBounds {
        /// Source extent along X.
        size_x: usize,
        /// Source extent along Y.
        size_y: usize,
        /// Source extent along Z.
        size_z: usize,
        /// Vertical margin between the source box and the domain edge.
        margin: usize,
        /// Cells along X.
        nx: usize,
        /// Cells along Y.
        ny: usize,
        /// Cells along Z.
        nz: usize,
    },

    /// An occupancy mask of the wrong length was supplied.
    #[error("occupancy mask has {got} entries, grid has {expected} cells")]
    OccupancyLenMismatch {
        /// Length of the supplied mask.
        got: usize,
        /// Nx * Ny * Nz.
        expected: usize,
    },
}

/// Full configuration for a [`crate::SmokeSimulation`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Cells along X.
    pub nx: usize,
    /// Cells along Y (vertical).
    pub ny: usize,
    /// Cells along Z.
    pub nz: usize,
    /// Uniform voxel spacing h in world units.
    pub voxel_size: f64,
    /// Fixed simulation time step.
    pub dt: f64,

    /// Ambient temperature the domain relaxes to (Kelvin-like).
    pub ambient_temperature: f64,
    /// Smoke weight coefficient; denser smoke settles with force -alpha * density.
    pub alpha: f64,
    /// Thermal buoyancy coefficient; warm smoke rises with beta * (T - ambient).
    pub beta: f64,
    /// Vorticity confinement strength.
    pub vort_eps: f64,
    /// Per-step multiplicative density decay (1.0 disables decay).
    pub decay_factor: f64,

    /// Density written into source cells on emission.
    pub init_density: f64,
    /// Magnitude of the emitter velocity seed.
    pub init_velocity: f64,
    /// Emission runs while simulation time is below this value.
    pub emit_duration: f64,
    /// `update()` becomes a no-op once simulation time exceeds this value.
    pub finish_time: f64,

    /// Source box extent along X, centered horizontally.
    pub source_size_x: usize,
    /// Source box extent along Y.
    pub source_size_y: usize,
    /// Source box extent along Z, centered horizontally.
    pub source_size_z: usize,
    /// Vertical gap between the source box and the nearest Y boundary.
    pub source_y_margin: usize,
    /// Which end of the Y axis the source sits at.
    pub emitter_pos: EmitterPos,

    /// Pressure solver iteration budget.
    pub max_iterations: usize,
    /// Pressure solver residual tolerance (l2 norm).
    pub tolerance: f64,

    /// World-space light position for the transparency pass.
    pub light_position: [f64; 3],
    /// Optical extinction factor for the transparency pass.
    pub light_factor: f64,

    /// Seed for the emitter's random temperature and velocity draws.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nx: 32,
            ny: 64,
            nz: 32,
            voxel_size: 1.0,
            dt: 0.02,
            ambient_temperature: 273.0,
            alpha: 9.8,
            beta: 1.0,
            vort_eps: 0.25,
            decay_factor: 1.0,
            init_density: 1.0,
            init_velocity: 4.0,
            emit_duration: 2.0,
            finish_time: 10.0,
            source_size_x: 8,
            source_size_y: 4,
            source_size_z: 8,
            source_y_margin: 4,
            emitter_pos: EmitterPos::Top,
            max_iterations: 200,
            tolerance: 1e-6,
            light_position: [16.0, 128.0, 16.0],
            light_factor: 1.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Total cell count Nx * Ny * Nz.
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Check that the configuration can produce a valid simulator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(ConfigError::InvalidGridSize {
                nx: self.nx,
                ny: self.ny,
                nz: self.nz,
            });
        }
        if !(self.voxel_size > 0.0) {
            return Err(ConfigError::InvalidVoxelSize(self.voxel_size));
        }
        if !(self.dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.dt));
        }
        if !(self.tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        let fits_y = self.source_y_margin + self.source_size_y <= self.ny;
        if !fits_y || self.source_size_x > self.nx || self.source_size_z > self.nz {
            return Err(ConfigError::SourceOutOfBounds {
                size_x: self.source_size_x,
                size_y: self.source_size_y,
                size_z: self.source_size_z,
                margin: self.source_y_margin,
                nx: self.nx,
                ny: self.ny,
                nz: self.nz,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let cfg = SimConfig {
            ny: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidGridSize { .. })
        ));
    }

    #[test]
    fn non_positive_steps_are_rejected() {
        let cfg = SimConfig {
            dt: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidTimeStep(_))));

        let cfg = SimConfig {
            voxel_size: -1.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidVoxelSize(_))
        ));
    }

    #[test]
    fn oversized_source_box_is_rejected() {
        let cfg = SimConfig {
            ny: 8,
            source_y_margin: 6,
            source_size_y: 4,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::SourceOutOfBounds { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_serde() {
        let cfg = SimConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nx, cfg.nx);
        assert_eq!(back.emitter_pos, cfg.emitter_pos);
        assert_eq!(back.tolerance, cfg.tolerance);
    }
}
