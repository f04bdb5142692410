//! Staggered grid storage for all simulation fields.
//!
//! Velocity components are conceptually face-centered:
//! - u (X-velocity): `u(i,j,k)` sits on the face between cells (i-1,j,k) and (i,j,k)
//! - v (Y-velocity): `v(i,j,k)` sits on the face between cells (i,j-1,k) and (i,j,k)
//! - w (Z-velocity): `w(i,j,k)` sits on the face between cells (i,j,k-1) and (i,j,k)
//!
//! but every field, staggered or cell-centered, is stored as one dense
//! `nx * ny * nz` array indexed by `idx(i, j, k) = (k * ny + j) * nx + i`.
//! The +X face of the last cell column (and the Y/Z analogues) does not
//! exist; stencils skip it.

use glam::DVec3;

/// Dense field storage for one smoke simulation.
///
/// Every array has length `nx * ny * nz` and is allocated exactly once; the
/// stepper stages mutate fields in place and never resize them.
pub struct SmokeGrid {
    /// Cells along X.
    pub nx: usize,
    /// Cells along Y (vertical).
    pub ny: usize,
    /// Cells along Z.
    pub nz: usize,
    /// Uniform voxel spacing.
    pub voxel_size: f64,

    /// X-velocity on -X faces.
    pub u: Vec<f64>,
    /// Y-velocity on -Y faces.
    pub v: Vec<f64>,
    /// Z-velocity on -Z faces.
    pub w: Vec<f64>,
    /// Snapshot of `u` taken before the advection that consumes it.
    pub u0: Vec<f64>,
    /// Snapshot of `v`.
    pub v0: Vec<f64>,
    /// Snapshot of `w`.
    pub w0: Vec<f64>,

    /// Smoke concentration at cell centers.
    pub density: Vec<f64>,
    /// Snapshot of `density`.
    pub density0: Vec<f64>,
    /// Temperature at cell centers.
    pub temperature: Vec<f64>,
    /// Snapshot of `temperature`.
    pub temperature0: Vec<f64>,
    /// Pressure at cell centers, in units of h/dt.
    pub pressure: Vec<f64>,

    /// External force, X component, cell-centered.
    pub fx: Vec<f64>,
    /// External force, Y component.
    pub fy: Vec<f64>,
    /// External force, Z component.
    pub fz: Vec<f64>,

    /// Cell-centered X-velocity (face average).
    pub avg_u: Vec<f64>,
    /// Cell-centered Y-velocity.
    pub avg_v: Vec<f64>,
    /// Cell-centered Z-velocity.
    pub avg_w: Vec<f64>,

    /// Vorticity vector, X component.
    pub omega_x: Vec<f64>,
    /// Vorticity vector, Y component.
    pub omega_y: Vec<f64>,
    /// Vorticity vector, Z component.
    pub omega_z: Vec<f64>,
    /// Magnitude of the confinement force, for diagnostics.
    pub vort: Vec<f64>,

    /// Solid obstacle mask, externally supplied.
    pub occupied: Vec<bool>,
    /// Light transparency in [0, 1].
    pub transparency: Vec<f64>,
}

impl SmokeGrid {
    /// Allocate a grid with zeroed velocities and the given ambient temperature.
    pub fn new(nx: usize, ny: usize, nz: usize, voxel_size: f64, ambient: f64) -> Self {
        let n = nx * ny * nz;
        Self {
            nx,
            ny,
            nz,
            voxel_size,
            u: vec![0.0; n],
            v: vec![0.0; n],
            w: vec![0.0; n],
            u0: vec![0.0; n],
            v0: vec![0.0; n],
            w0: vec![0.0; n],
            density: vec![0.0; n],
            density0: vec![0.0; n],
            temperature: vec![ambient; n],
            temperature0: vec![ambient; n],
            pressure: vec![0.0; n],
            fx: vec![0.0; n],
            fy: vec![0.0; n],
            fz: vec![0.0; n],
            avg_u: vec![0.0; n],
            avg_v: vec![0.0; n],
            avg_w: vec![0.0; n],
            omega_x: vec![0.0; n],
            omega_y: vec![0.0; n],
            omega_z: vec![0.0; n],
            vort: vec![0.0; n],
            occupied: vec![false; n],
            transparency: vec![1.0; n],
        }
    }

    /// Total cell count.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Flat index of cell (i, j, k).
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny + j) * self.nx + i
    }

    /// World position of the cell center.
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.voxel_size;
        DVec3::new(
            (i as f64 + 0.5) * h,
            (j as f64 + 0.5) * h,
            (k as f64 + 0.5) * h,
        )
    }

    /// World position of the u-component face stored at (i, j, k).
    #[inline]
    pub fn u_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.voxel_size;
        DVec3::new(i as f64 * h, (j as f64 + 0.5) * h, (k as f64 + 0.5) * h)
    }

    /// World position of the v-component face stored at (i, j, k).
    #[inline]
    pub fn v_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.voxel_size;
        DVec3::new((i as f64 + 0.5) * h, j as f64 * h, (k as f64 + 0.5) * h)
    }

    /// World position of the w-component face stored at (i, j, k).
    #[inline]
    pub fn w_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.voxel_size;
        DVec3::new((i as f64 + 0.5) * h, (j as f64 + 0.5) * h, k as f64 * h)
    }

    /// World extent of the domain.
    #[inline]
    pub fn world_size(&self) -> DVec3 {
        DVec3::new(
            self.nx as f64 * self.voxel_size,
            self.ny as f64 * self.voxel_size,
            self.nz as f64 * self.voxel_size,
        )
    }

    /// Snapshot (u, v, w) into (u0, v0, w0).
    pub fn snapshot_velocity(&mut self) {
        self.u0.copy_from_slice(&self.u);
        self.v0.copy_from_slice(&self.v);
        self.w0.copy_from_slice(&self.w);
    }

    /// Snapshot density and temperature into their `*0` buffers.
    pub fn snapshot_scalars(&mut self) {
        self.density0.copy_from_slice(&self.density);
        self.temperature0.copy_from_slice(&self.temperature);
    }

    /// Trilinear sample of a cell-centered field at a world position.
    ///
    /// Coordinates are clamped to the cell-center domain, so out-of-domain
    /// positions snap to the nearest interior sample.
    #[inline]
    pub fn sample_scalar(&self, field: &[f64], pos: DVec3) -> f64 {
        let h = self.voxel_size;
        trilinear(
            field,
            self.nx,
            self.ny,
            self.nz,
            pos.x / h - 0.5,
            pos.y / h - 0.5,
            pos.z / h - 0.5,
        )
    }

    /// Trilinear sample of a staggered velocity field at a world position.
    ///
    /// Each component is interpolated on its own face grid.
    #[inline]
    pub fn sample_velocity(&self, u: &[f64], v: &[f64], w: &[f64], pos: DVec3) -> DVec3 {
        VelocitySampler::new(u, v, w, self.nx, self.ny, self.nz, self.voxel_size).at(pos)
    }

    /// Zero every field, restore temperature to `ambient`, clear transparency.
    pub fn clear(&mut self, ambient: f64) {
        self.u.fill(0.0);
        self.v.fill(0.0);
        self.w.fill(0.0);
        self.u0.fill(0.0);
        self.v0.fill(0.0);
        self.w0.fill(0.0);
        self.density.fill(0.0);
        self.density0.fill(0.0);
        self.temperature.fill(ambient);
        self.temperature0.fill(ambient);
        self.pressure.fill(0.0);
        self.fx.fill(0.0);
        self.fy.fill(0.0);
        self.fz.fill(0.0);
        self.avg_u.fill(0.0);
        self.avg_v.fill(0.0);
        self.avg_w.fill(0.0);
        self.omega_x.fill(0.0);
        self.omega_y.fill(0.0);
        self.omega_z.fill(0.0);
        self.vort.fill(0.0);
        self.transparency.fill(1.0);
    }
}

/// Trilinear interpolation over one dense field in index space.
///
/// `gx, gy, gz` are sample-node coordinates (node m sits at coordinate m);
/// they are clamped to `[0, n-1]` per axis. Written as a lerp chain so a
/// sample exactly on a node returns the stored value bit-for-bit.
#[inline]
pub fn trilinear(
    field: &[f64],
    nx: usize,
    ny: usize,
    nz: usize,
    gx: f64,
    gy: f64,
    gz: f64,
) -> f64 {
    let gx = gx.clamp(0.0, (nx - 1) as f64);
    let gy = gy.clamp(0.0, (ny - 1) as f64);
    let gz = gz.clamp(0.0, (nz - 1) as f64);

    let i0 = gx.floor() as usize;
    let j0 = gy.floor() as usize;
    let k0 = gz.floor() as usize;
    let i1 = (i0 + 1).min(nx - 1);
    let j1 = (j0 + 1).min(ny - 1);
    let k1 = (k0 + 1).min(nz - 1);

    let tx = gx - i0 as f64;
    let ty = gy - j0 as f64;
    let tz = gz - k0 as f64;

    let at = |i: usize, j: usize, k: usize| field[(k * ny + j) * nx + i];
    let lerp = |a: f64, b: f64, t: f64| a + t * (b - a);

    let c00 = lerp(at(i0, j0, k0), at(i1, j0, k0), tx);
    let c10 = lerp(at(i0, j1, k0), at(i1, j1, k0), tx);
    let c01 = lerp(at(i0, j0, k1), at(i1, j0, k1), tx);
    let c11 = lerp(at(i0, j1, k1), at(i1, j1, k1), tx);

    let c0 = lerp(c00, c10, ty);
    let c1 = lerp(c01, c11, ty);
    lerp(c0, c1, tz)
}

/// Borrowed view over one staggered velocity field for interpolation.
///
/// Exists so advection kernels can sample a snapshot while writing the live
/// field of the same grid.
pub struct VelocitySampler<'a> {
    u: &'a [f64],
    v: &'a [f64],
    w: &'a [f64],
    nx: usize,
    ny: usize,
    nz: usize,
    voxel_size: f64,
}

impl<'a> VelocitySampler<'a> {
    /// Wrap three component slices of a `nx * ny * nz` grid.
    pub fn new(
        u: &'a [f64],
        v: &'a [f64],
        w: &'a [f64],
        nx: usize,
        ny: usize,
        nz: usize,
        voxel_size: f64,
    ) -> Self {
        Self {
            u,
            v,
            w,
            nx,
            ny,
            nz,
            voxel_size,
        }
    }

    /// X-component at a world position, interpolated on the u face grid.
    #[inline]
    pub fn u_at(&self, pos: DVec3) -> f64 {
        let h = self.voxel_size;
        trilinear(
            self.u,
            self.nx,
            self.ny,
            self.nz,
            pos.x / h,
            pos.y / h - 0.5,
            pos.z / h - 0.5,
        )
    }

    /// Y-component at a world position, interpolated on the v face grid.
    #[inline]
    pub fn v_at(&self, pos: DVec3) -> f64 {
        let h = self.voxel_size;
        trilinear(
            self.v,
            self.nx,
            self.ny,
            self.nz,
            pos.x / h - 0.5,
            pos.y / h,
            pos.z / h - 0.5,
        )
    }

    /// Z-component at a world position, interpolated on the w face grid.
    #[inline]
    pub fn w_at(&self, pos: DVec3) -> f64 {
        let h = self.voxel_size;
        trilinear(
            self.w,
            self.nx,
            self.ny,
            self.nz,
            pos.x / h - 0.5,
            pos.y / h - 0.5,
            pos.z / h,
        )
    }

    /// Full velocity vector at a world position.
    #[inline]
    pub fn at(&self, pos: DVec3) -> DVec3 {
        DVec3::new(self.u_at(pos), self.v_at(pos), self.w_at(pos))
    }
}
