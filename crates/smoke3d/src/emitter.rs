//! Smoke sources and obstacle handling.

use std::ops::Range;

use rand::Rng;

use crate::config::{EmitterPos, SimConfig};
use crate::grid::SmokeGrid;

/// Index ranges of the source box for the configured emitter placement.
///
/// The box is centered along X and Z; along Y it hangs `source_y_margin`
/// cells from the top (j = 0) or bottom (j = Ny) of the domain.
pub fn source_box(cfg: &SimConfig) -> (Range<usize>, Range<usize>, Range<usize>) {
    let i_range = (cfg.nx - cfg.source_size_x) / 2..(cfg.nx + cfg.source_size_x) / 2;
    let k_range = (cfg.nz - cfg.source_size_z) / 2..(cfg.nz + cfg.source_size_z) / 2;
    let j_range = match cfg.emitter_pos {
        EmitterPos::Top => cfg.source_y_margin..cfg.source_y_margin + cfg.source_size_y,
        EmitterPos::Bottom => {
            cfg.ny - cfg.source_y_margin - cfg.source_size_y..cfg.ny - cfg.source_y_margin
        }
    };
    (i_range, j_range, k_range)
}

/// Seed density and temperature inside the source box.
///
/// Density is set to the configured initial density; temperature is drawn
/// uniformly from [800, 1000) per cell.
pub fn add_source(grid: &mut SmokeGrid, cfg: &SimConfig, rng: &mut impl Rng) {
    let (i_range, j_range, k_range) = source_box(cfg);
    for k in k_range {
        for j in j_range.clone() {
            for i in i_range.clone() {
                let idx = grid.idx(i, j, k);
                grid.density[idx] = cfg.init_density;
                grid.temperature[idx] = rng.gen_range(800.0..1000.0);
            }
        }
    }
}

/// Seed the v velocity component inside the source box.
///
/// Top emitters push in +Y with per-cell random strength; bottom emitters
/// push in -Y at full strength. The seed is mirrored into `v0` so the next
/// back-trace sees it.
pub fn set_emitter_velocity(grid: &mut SmokeGrid, cfg: &SimConfig, rng: &mut impl Rng) {
    let (i_range, j_range, k_range) = source_box(cfg);
    for k in k_range {
        for j in j_range.clone() {
            for i in i_range.clone() {
                let idx = grid.idx(i, j, k);
                let v = match cfg.emitter_pos {
                    EmitterPos::Top => cfg.init_velocity * rng.gen_range(0.0..1.0),
                    EmitterPos::Bottom => -cfg.init_velocity,
                };
                grid.v[idx] = v;
                grid.v0[idx] = v;
            }
        }
    }
}

/// Reset fluid quantities inside occupied voxels.
///
/// Zeroes the minus-side face velocities stored at the cell, clears density,
/// and restores the ambient temperature. The mask itself is never touched.
pub fn fix_occupied_voxels(grid: &mut SmokeGrid, ambient: f64) {
    for idx in 0..grid.cell_count() {
        if grid.occupied[idx] {
            grid.u[idx] = 0.0;
            grid.v[idx] = 0.0;
            grid.w[idx] = 0.0;
            grid.density[idx] = 0.0;
            grid.temperature[idx] = ambient;
        }
    }
}
