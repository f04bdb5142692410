//! Semi-Lagrangian advection of velocity and scalar fields.
//!
//! Each kernel snapshots its inputs into the `*0` buffers first, then every
//! output cell back-traces through the snapshot velocity and resamples.
//! Outputs are written exactly once per cell, so the cell loops run in
//! parallel.

use glam::DVec3;
use rayon::prelude::*;

use crate::grid::{SmokeGrid, VelocitySampler};

#[inline]
fn split_index(idx: usize, nx: usize, ny: usize) -> (usize, usize, usize) {
    let i = idx % nx;
    let j = (idx / nx) % ny;
    let k = idx / (nx * ny);
    (i, j, k)
}

/// Self-advect the staggered velocity field.
///
/// Snapshots (u, v, w) into (u0, v0, w0), then sets each face component to
/// the snapshot field sampled at the back-traced face position.
pub fn advect_velocity(grid: &mut SmokeGrid, dt: f64) {
    grid.snapshot_velocity();

    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let h = grid.voxel_size;
    let prev = VelocitySampler::new(&grid.u0, &grid.v0, &grid.w0, nx, ny, nz, h);

    grid.u.par_iter_mut().enumerate().for_each(|(idx, out)| {
        let (i, j, k) = split_index(idx, nx, ny);
        let pos = DVec3::new(i as f64 * h, (j as f64 + 0.5) * h, (k as f64 + 0.5) * h);
        let traced = pos - dt * prev.at(pos);
        *out = prev.u_at(traced);
    });
    grid.v.par_iter_mut().enumerate().for_each(|(idx, out)| {
        let (i, j, k) = split_index(idx, nx, ny);
        let pos = DVec3::new((i as f64 + 0.5) * h, j as f64 * h, (k as f64 + 0.5) * h);
        let traced = pos - dt * prev.at(pos);
        *out = prev.v_at(traced);
    });
    grid.w.par_iter_mut().enumerate().for_each(|(idx, out)| {
        let (i, j, k) = split_index(idx, nx, ny);
        let pos = DVec3::new((i as f64 + 0.5) * h, (j as f64 + 0.5) * h, k as f64 * h);
        let traced = pos - dt * prev.at(pos);
        *out = prev.w_at(traced);
    });
}

/// Advect density and temperature through the just-projected velocity.
///
/// Snapshots the velocity and both scalars, back-traces from each cell
/// center, and resamples the scalar snapshots. Density is then scaled by
/// `decay_factor` (1.0 leaves it untouched).
pub fn advect_scalars(grid: &mut SmokeGrid, dt: f64, decay_factor: f64) {
    grid.snapshot_velocity();
    grid.snapshot_scalars();

    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let h = grid.voxel_size;
    let prev = VelocitySampler::new(&grid.u0, &grid.v0, &grid.w0, nx, ny, nz, h);
    let density0 = &grid.density0;
    let temperature0 = &grid.temperature0;

    grid.density
        .par_iter_mut()
        .zip(grid.temperature.par_iter_mut())
        .enumerate()
        .for_each(|(idx, (density, temperature))| {
            let (i, j, k) = split_index(idx, nx, ny);
            let center = DVec3::new(
                (i as f64 + 0.5) * h,
                (j as f64 + 0.5) * h,
                (k as f64 + 0.5) * h,
            );
            let traced = center - dt * prev.at(center);
            let gx = traced.x / h - 0.5;
            let gy = traced.y / h - 0.5;
            let gz = traced.z / h - 0.5;
            *density = decay_factor * crate::grid::trilinear(density0, nx, ny, nz, gx, gy, gz);
            *temperature = crate::grid::trilinear(temperature0, nx, ny, nz, gx, gy, gz);
        });
}
