//! Body-force assembly: buoyancy, vorticity confinement, and the staggered
//! force application.

use glam::DVec3;

use crate::grid::SmokeGrid;

/// Assemble the buoyancy force into (fx, fy, fz).
///
/// Dense, cool smoke settles (negative fy); smoke warmer than ambient rises.
/// Overwrites the force arrays; confinement accumulates on top afterwards.
pub fn buoyancy(grid: &mut SmokeGrid, alpha: f64, beta: f64, ambient: f64) {
    for idx in 0..grid.cell_count() {
        grid.fx[idx] = 0.0;
        grid.fy[idx] =
            -alpha * grid.density[idx] + beta * (grid.temperature[idx] - ambient);
        grid.fz[idx] = 0.0;
    }
}

/// Compute vorticity and accumulate the confinement force into (fx, fy, fz).
///
/// Three passes: cell-centered velocity averages, central-difference curl on
/// interior cells, then the confinement force from the gradient of |omega|.
/// Boundary cells keep their previous vorticity; only interior cells are
/// meaningful.
pub fn vorticity_confinement(grid: &mut SmokeGrid, vort_eps: f64) {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let h = grid.voxel_size;

    // Cell-centered velocity. The +side face of the last cell along each
    // axis does not exist, so those cells take the face value directly.
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = grid.idx(i, j, k);
                grid.avg_u[idx] = if i + 1 < nx {
                    0.5 * (grid.u[idx] + grid.u[grid.idx(i + 1, j, k)])
                } else {
                    grid.u[idx]
                };
                grid.avg_v[idx] = if j + 1 < ny {
                    0.5 * (grid.v[idx] + grid.v[grid.idx(i, j + 1, k)])
                } else {
                    grid.v[idx]
                };
                grid.avg_w[idx] = if k + 1 < nz {
                    0.5 * (grid.w[idx] + grid.w[grid.idx(i, j, k + 1)])
                } else {
                    grid.w[idx]
                };
            }
        }
    }

    // omega = curl(avg velocity), central differences over one voxel.
    let scale = 0.5 / h;
    for k in 1..nz.saturating_sub(1) {
        for j in 1..ny.saturating_sub(1) {
            for i in 1..nx.saturating_sub(1) {
                let idx = grid.idx(i, j, k);
                grid.omega_x[idx] = scale
                    * (grid.avg_w[grid.idx(i, j + 1, k)] - grid.avg_w[grid.idx(i, j - 1, k)]
                        - grid.avg_v[grid.idx(i, j, k + 1)]
                        + grid.avg_v[grid.idx(i, j, k - 1)]);
                grid.omega_y[idx] = scale
                    * (grid.avg_u[grid.idx(i, j, k + 1)] - grid.avg_u[grid.idx(i, j, k - 1)]
                        - grid.avg_w[grid.idx(i + 1, j, k)]
                        + grid.avg_w[grid.idx(i - 1, j, k)]);
                grid.omega_z[idx] = scale
                    * (grid.avg_v[grid.idx(i + 1, j, k)] - grid.avg_v[grid.idx(i - 1, j, k)]
                        - grid.avg_u[grid.idx(i, j + 1, k)]
                        + grid.avg_u[grid.idx(i, j - 1, k)]);
            }
        }
    }

    // Confinement force: f = eps * h * (omega x N), N = grad|omega| normalized.
    let omega_at = |grid: &SmokeGrid, i: usize, j: usize, k: usize| {
        let idx = (k * ny + j) * nx + i;
        DVec3::new(grid.omega_x[idx], grid.omega_y[idx], grid.omega_z[idx])
    };
    for k in 1..nz.saturating_sub(1) {
        for j in 1..ny.saturating_sub(1) {
            for i in 1..nx.saturating_sub(1) {
                let idx = grid.idx(i, j, k);

                let grad = DVec3::new(
                    omega_at(grid, i + 1, j, k).length() - omega_at(grid, i - 1, j, k).length(),
                    omega_at(grid, i, j + 1, k).length() - omega_at(grid, i, j - 1, k).length(),
                    omega_at(grid, i, j, k + 1).length() - omega_at(grid, i, j, k - 1).length(),
                ) * scale;

                let norm = grad.length();
                let n_hat = if norm != 0.0 { grad / norm } else { DVec3::ZERO };

                let omega = omega_at(grid, i, j, k);
                let force = vort_eps * h * omega.cross(n_hat);

                grid.vort[idx] = force.length();
                grid.fx[idx] += force.x;
                grid.fy[idx] += force.y;
                grid.fz[idx] += force.z;
            }
        }
    }
}

/// Apply the assembled cell forces to the staggered velocity components.
///
/// Each interior face receives the average of the forces in its two
/// adjacent cells; index-0 boundary faces are never written.
pub fn apply_forces(grid: &mut SmokeGrid, dt: f64) {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);

    for k in 0..nz {
        for j in 0..ny {
            for i in 1..nx {
                let idx = grid.idx(i, j, k);
                grid.u[idx] += dt * 0.5 * (grid.fx[grid.idx(i - 1, j, k)] + grid.fx[idx]);
            }
        }
    }
    for k in 0..nz {
        for j in 1..ny {
            for i in 0..nx {
                let idx = grid.idx(i, j, k);
                grid.v[idx] += dt * 0.5 * (grid.fy[grid.idx(i, j - 1, k)] + grid.fy[idx]);
            }
        }
    }
    for k in 1..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = grid.idx(i, j, k);
                grid.w[idx] += dt * 0.5 * (grid.fz[grid.idx(i, j, k - 1)] + grid.fz[idx]);
            }
        }
    }
}
