//! Transparency map accumulation.
//!
//! For every cell, a ray is marched from the cell center toward the light
//! position, accumulating trilinearly sampled density at voxel-sized steps.
//! Transparency is `exp(-factor * optical_depth)`, so it decreases
//! monotonically with accumulated density.

use glam::DVec3;
use rayon::prelude::*;

use crate::grid::{trilinear, SmokeGrid};

/// Recompute the transparency field for the given light.
pub fn gen_transparency_map(grid: &mut SmokeGrid, light_position: DVec3, factor: f64) {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let h = grid.voxel_size;
    let bounds = grid.world_size();
    let density = &grid.density;

    grid.transparency
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, out)| {
            let i = idx % nx;
            let j = (idx / nx) % ny;
            let k = idx / (nx * ny);
            let origin = DVec3::new(
                (i as f64 + 0.5) * h,
                (j as f64 + 0.5) * h,
                (k as f64 + 0.5) * h,
            );

            let to_light = light_position - origin;
            let distance = to_light.length();
            if distance < h {
                *out = 1.0;
                return;
            }
            let dir = to_light / distance;

            let mut depth = 0.0;
            let mut t = 0.0;
            while t < distance {
                let p = origin + dir * t;
                if p.x < 0.0
                    || p.y < 0.0
                    || p.z < 0.0
                    || p.x > bounds.x
                    || p.y > bounds.y
                    || p.z > bounds.z
                {
                    break;
                }
                let sample = trilinear(
                    density,
                    nx,
                    ny,
                    nz,
                    p.x / h - 0.5,
                    p.y / h - 0.5,
                    p.z / h - 0.5,
                );
                depth += sample * h;
                t += h;
            }

            *out = (-factor * depth).exp();
        });
}
