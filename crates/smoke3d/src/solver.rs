//! Sparse linear algebra for the pressure projection.
//!
//! The discrete Poisson matrix is assembled once as a CSR matrix in its
//! positive-definite form (diagonal = number of existing neighbors,
//! off-diagonals = -1, Neumann boundaries) and factored once into a
//! zero-fill incomplete Cholesky preconditioner. Every per-step solve reuses
//! both, so the hot path allocates nothing.

/// Sparse matrix in Compressed Sparse Row format, columns sorted per row.
pub struct CsrMatrix {
    /// Number of rows (and columns; the matrix is square and symmetric).
    pub nrows: usize,
    /// Row start offsets, length `nrows + 1`.
    pub row_ptr: Vec<u32>,
    /// Column index per non-zero.
    pub col_indices: Vec<u32>,
    /// Value per non-zero.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Compute `y = A * x` without allocating.
    pub fn matvec_into(&self, x: &[f64], y: &mut [f64]) {
        for i in 0..self.nrows {
            let start = self.row_ptr[i] as usize;
            let end = self.row_ptr[i + 1] as usize;
            let mut sum = 0.0;
            for t in start..end {
                sum += self.values[t] * x[self.col_indices[t] as usize];
            }
            y[i] = sum;
        }
    }
}

/// Assemble the 7-point 3-D Poisson matrix with Neumann boundaries.
///
/// Row layout follows the field index convention
/// `idx(i,j,k) = (k*ny + j)*nx + i`. This is the negation of the Laplacian
/// the projection solves against; see [`crate::pressure`] for the sign
/// bookkeeping.
pub fn build_poisson_3d(nx: usize, ny: usize, nz: usize) -> CsrMatrix {
    let n = nx * ny * nz;
    let idx = |i: usize, j: usize, k: usize| (k * ny + j) * nx + i;

    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    row_ptr.push(0u32);

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let mut neighbors = 0u32;
                // Column order is ascending by construction: -z, -y, -x,
                // diagonal, +x, +y, +z.
                if k > 0 {
                    col_indices.push(idx(i, j, k - 1) as u32);
                    values.push(-1.0);
                    neighbors += 1;
                }
                if j > 0 {
                    col_indices.push(idx(i, j - 1, k) as u32);
                    values.push(-1.0);
                    neighbors += 1;
                }
                if i > 0 {
                    col_indices.push(idx(i - 1, j, k) as u32);
                    values.push(-1.0);
                    neighbors += 1;
                }
                let diag_slot = values.len();
                col_indices.push(idx(i, j, k) as u32);
                values.push(0.0);
                if i + 1 < nx {
                    col_indices.push(idx(i + 1, j, k) as u32);
                    values.push(-1.0);
                    neighbors += 1;
                }
                if j + 1 < ny {
                    col_indices.push(idx(i, j + 1, k) as u32);
                    values.push(-1.0);
                    neighbors += 1;
                }
                if k + 1 < nz {
                    col_indices.push(idx(i, j, k + 1) as u32);
                    values.push(-1.0);
                    neighbors += 1;
                }
                values[diag_slot] = neighbors as f64;
                row_ptr.push(col_indices.len() as u32);
            }
        }
    }

    CsrMatrix {
        nrows: n,
        row_ptr,
        col_indices,
        values,
    }
}

/// Zero-fill incomplete Cholesky factorization `A ~ L * L^T`.
///
/// Stores the lower triangle in CSR with the diagonal entry last in each
/// row. The pure-Neumann Poisson matrix is only semi-definite; a pivot floor
/// keeps the factorization positive when the trailing pivots collapse.
pub struct IncompleteCholesky {
    n: usize,
    row_ptr: Vec<u32>,
    col_indices: Vec<u32>,
    values: Vec<f64>,
}

const PIVOT_FLOOR: f64 = 1e-10;

impl IncompleteCholesky {
    /// Factor a symmetric positive (semi-)definite CSR matrix.
    pub fn factor(a: &CsrMatrix) -> Self {
        let n = a.nrows;
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut cols: Vec<u32> = Vec::new();
        let mut vals: Vec<f64> = Vec::new();
        row_ptr.push(0u32);

        for i in 0..n {
            let a_start = a.row_ptr[i] as usize;
            let a_end = a.row_ptr[i + 1] as usize;
            let row_start = cols.len();
            let mut diag_a = 0.0;

            // Seed the strict lower part of row i with A's values.
            for t in a_start..a_end {
                let j = a.col_indices[t] as usize;
                if j < i {
                    cols.push(j as u32);
                    vals.push(a.values[t]);
                } else if j == i {
                    diag_a = a.values[t];
                }
            }

            // L(i,j) = (A(i,j) - sum_k L(i,k) * L(j,k)) / L(j,j), k < j.
            for t in row_start..cols.len() {
                let j = cols[t] as usize;
                let j_start = row_ptr[j] as usize;
                let j_diag = row_ptr[j + 1] as usize - 1;

                let mut sum = 0.0;
                let mut a_idx = row_start;
                let mut b_idx = j_start;
                while a_idx < t && b_idx < j_diag {
                    let ca = cols[a_idx];
                    let cb = cols[b_idx];
                    if ca == cb {
                        sum += vals[a_idx] * vals[b_idx];
                        a_idx += 1;
                        b_idx += 1;
                    } else if ca < cb {
                        a_idx += 1;
                    } else {
                        b_idx += 1;
                    }
                }

                vals[t] = (vals[t] - sum) / vals[j_diag];
            }

            let mut sum_sq = 0.0;
            for t in row_start..cols.len() {
                sum_sq += vals[t] * vals[t];
            }
            let mut pivot = diag_a - sum_sq;
            if pivot <= PIVOT_FLOOR {
                pivot = diag_a.max(PIVOT_FLOOR);
            }
            cols.push(i as u32);
            vals.push(pivot.sqrt());
            row_ptr.push(cols.len() as u32);
        }

        Self {
            n,
            row_ptr,
            col_indices: cols,
            values: vals,
        }
    }

    /// Apply the preconditioner: `z = (L * L^T)^-1 * r`.
    ///
    /// `tmp` is caller-provided scratch of length `n`.
    pub fn apply(&self, r: &[f64], tmp: &mut [f64], z: &mut [f64]) {
        // Forward substitution: L * tmp = r.
        for i in 0..self.n {
            let start = self.row_ptr[i] as usize;
            let diag = self.row_ptr[i + 1] as usize - 1;
            let mut sum = r[i];
            for t in start..diag {
                sum -= self.values[t] * tmp[self.col_indices[t] as usize];
            }
            tmp[i] = sum / self.values[diag];
        }
        // Backward substitution: L^T * z = tmp, column sweep over L's rows.
        z.copy_from_slice(tmp);
        for i in (0..self.n).rev() {
            let start = self.row_ptr[i] as usize;
            let diag = self.row_ptr[i + 1] as usize - 1;
            z[i] /= self.values[diag];
            let zi = z[i];
            for t in start..diag {
                z[self.col_indices[t] as usize] -= self.values[t] * zi;
            }
        }
    }
}

/// Outcome of one preconditioned conjugate-gradient solve.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolveStats {
    /// Iterations consumed.
    pub iterations: usize,
    /// Final l2 residual norm.
    pub residual: f64,
    /// Whether the residual tolerance was met within the iteration budget.
    pub converged: bool,
}

/// Preallocated work vectors for [`pcg`].
pub struct PcgWorkspace {
    r: Vec<f64>,
    z: Vec<f64>,
    p: Vec<f64>,
    ap: Vec<f64>,
    tmp: Vec<f64>,
}

impl PcgWorkspace {
    /// Allocate scratch for systems of dimension `n`.
    pub fn new(n: usize) -> Self {
        Self {
            r: vec![0.0; n],
            z: vec![0.0; n],
            p: vec![0.0; n],
            ap: vec![0.0; n],
            tmp: vec![0.0; n],
        }
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solve `A * x = b` by incomplete-Cholesky preconditioned CG.
///
/// `x` is used as the initial guess (warm start) and holds the best iterate
/// on return, converged or not.
pub fn pcg(
    a: &CsrMatrix,
    precon: &IncompleteCholesky,
    b: &[f64],
    x: &mut [f64],
    ws: &mut PcgWorkspace,
    tolerance: f64,
    max_iterations: usize,
) -> SolveStats {
    let n = a.nrows;

    // r = b - A * x
    a.matvec_into(x, &mut ws.ap);
    for i in 0..n {
        ws.r[i] = b[i] - ws.ap[i];
    }
    let mut residual = dot(&ws.r, &ws.r).sqrt();
    if residual <= tolerance {
        return SolveStats {
            iterations: 0,
            residual,
            converged: true,
        };
    }

    precon.apply(&ws.r, &mut ws.tmp, &mut ws.z);
    ws.p.copy_from_slice(&ws.z);
    let mut rz = dot(&ws.r, &ws.z);

    for iteration in 1..=max_iterations {
        a.matvec_into(&ws.p, &mut ws.ap);
        let pap = dot(&ws.p, &ws.ap);
        if pap.abs() < f64::MIN_POSITIVE {
            return SolveStats {
                iterations: iteration - 1,
                residual,
                converged: false,
            };
        }
        let alpha = rz / pap;
        for i in 0..n {
            x[i] += alpha * ws.p[i];
            ws.r[i] -= alpha * ws.ap[i];
        }
        residual = dot(&ws.r, &ws.r).sqrt();
        if residual <= tolerance {
            return SolveStats {
                iterations: iteration,
                residual,
                converged: true,
            };
        }

        precon.apply(&ws.r, &mut ws.tmp, &mut ws.z);
        let rz_new = dot(&ws.r, &ws.z);
        let beta = rz_new / rz;
        for i in 0..n {
            ws.p[i] = ws.z[i] + beta * ws.p[i];
        }
        rz = rz_new;
    }

    SolveStats {
        iterations: max_iterations,
        residual,
        converged: false,
    }
}
