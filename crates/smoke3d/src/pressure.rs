//! Pressure projection: divergence right-hand side, Poisson solve, and
//! gradient subtraction.
//!
//! The Poisson matrix and its incomplete-Cholesky factorization are built
//! once per simulator and shared read-only by every solve. The solution
//! vector is warm-started from the previous step.

use crate::grid::SmokeGrid;
use crate::solver::{
    build_poisson_3d, pcg, CsrMatrix, IncompleteCholesky, PcgWorkspace, SolveStats,
};

/// Cached solver state for the projection stage.
pub struct PressureSolver {
    matrix: CsrMatrix,
    precon: IncompleteCholesky,
    workspace: PcgWorkspace,
    rhs: Vec<f64>,
    x: Vec<f64>,
    /// Residual tolerance (l2 norm) for the conjugate-gradient solve.
    pub tolerance: f64,
    /// Iteration budget per solve.
    pub max_iterations: usize,
    /// Stats of the most recent solve.
    pub stats: SolveStats,
}

impl PressureSolver {
    /// Assemble and factor the Poisson matrix for an `nx * ny * nz` grid.
    pub fn new(nx: usize, ny: usize, nz: usize, tolerance: f64, max_iterations: usize) -> Self {
        let matrix = build_poisson_3d(nx, ny, nz);
        let precon = IncompleteCholesky::factor(&matrix);
        let n = matrix.nrows;
        Self {
            matrix,
            precon,
            workspace: PcgWorkspace::new(n),
            rhs: vec![0.0; n],
            x: vec![0.0; n],
            tolerance,
            max_iterations,
            stats: SolveStats::default(),
        }
    }

    /// Solve for the pressure that cancels the divergence of (u, v, w).
    ///
    /// The divergence b masks faces on the domain boundary; the matrix `A`
    /// is the negated 7-point Laplacian, so the system solved is
    /// `A * x = -b`. The result is rescaled by h/dt into `grid.pressure`.
    pub fn solve(&mut self, grid: &mut SmokeGrid, dt: f64) -> SolveStats {
        let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);

        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let idx = grid.idx(i, j, k);
                    let mut div = 0.0;
                    if i > 0 {
                        div -= grid.u[idx];
                    }
                    if i + 1 < nx {
                        div += grid.u[grid.idx(i + 1, j, k)];
                    }
                    if j > 0 {
                        div -= grid.v[idx];
                    }
                    if j + 1 < ny {
                        div += grid.v[grid.idx(i, j + 1, k)];
                    }
                    if k > 0 {
                        div -= grid.w[idx];
                    }
                    if k + 1 < nz {
                        div += grid.w[grid.idx(i, j, k + 1)];
                    }
                    self.rhs[idx] = -div;
                }
            }
        }

        self.stats = pcg(
            &self.matrix,
            &self.precon,
            &self.rhs,
            &mut self.x,
            &mut self.workspace,
            self.tolerance,
            self.max_iterations,
        );
        if !self.stats.converged {
            log::warn!(
                "pressure solve stopped at {} iterations, residual {:.3e}",
                self.stats.iterations,
                self.stats.residual
            );
        } else {
            log::debug!(
                "pressure solve: {} iterations, residual {:.3e}",
                self.stats.iterations,
                self.stats.residual
            );
        }

        let scale = grid.voxel_size / dt;
        for (p, x) in grid.pressure.iter_mut().zip(&self.x) {
            *p = x * scale;
        }
        self.stats
    }

    /// Drop the warm start, e.g. after a state reset.
    pub fn reset(&mut self) {
        self.x.fill(0.0);
        self.stats = SolveStats::default();
    }
}

/// Subtract the pressure gradient from the staggered velocity field.
///
/// Faces on the domain boundary are untouched (Neumann).
pub fn apply_pressure(grid: &mut SmokeGrid, dt: f64) {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let scale = dt / grid.voxel_size;

    for k in 0..nz {
        for j in 0..ny {
            for i in 1..nx {
                let idx = grid.idx(i, j, k);
                grid.u[idx] -= scale * (grid.pressure[idx] - grid.pressure[grid.idx(i - 1, j, k)]);
            }
        }
    }
    for k in 0..nz {
        for j in 1..ny {
            for i in 0..nx {
                let idx = grid.idx(i, j, k);
                grid.v[idx] -= scale * (grid.pressure[idx] - grid.pressure[grid.idx(i, j - 1, k)]);
            }
        }
    }
    for k in 1..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = grid.idx(i, j, k);
                grid.w[idx] -= scale * (grid.pressure[idx] - grid.pressure[grid.idx(i, j, k - 1)]);
            }
        }
    }
}

/// Boundary-masked divergence of the velocity field at one cell.
///
/// Matches the right-hand side assembled by [`PressureSolver::solve`];
/// useful for tests and diagnostics.
pub fn divergence_at(grid: &SmokeGrid, i: usize, j: usize, k: usize) -> f64 {
    let idx = grid.idx(i, j, k);
    let mut div = 0.0;
    if i > 0 {
        div -= grid.u[idx];
    }
    if i + 1 < grid.nx {
        div += grid.u[grid.idx(i + 1, j, k)];
    }
    if j > 0 {
        div -= grid.v[idx];
    }
    if j + 1 < grid.ny {
        div += grid.v[grid.idx(i, j + 1, k)];
    }
    if k > 0 {
        div -= grid.w[idx];
    }
    if k + 1 < grid.nz {
        div += grid.w[grid.idx(i, j, k + 1)];
    }
    div
}
