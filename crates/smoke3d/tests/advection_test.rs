//! Semi-Lagrangian advection tests
//!
//! Covers the identity and transport behavior of velocity self-advection
//! and scalar advection, including the clamped sampling at domain edges.

use smoke3d::advection::{advect_scalars, advect_velocity};
use smoke3d::{DVec3, SmokeGrid};

#[test]
fn test_zero_velocity_is_identity_on_everything() {
    let n = 8;
    let mut grid = SmokeGrid::new(n, n, n, 1.0, 273.0);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let idx = grid.idx(i, j, k);
                grid.density[idx] = ((i * 31 + j * 7 + k) % 13) as f64 * 0.05;
                grid.temperature[idx] = 273.0 + ((i + j + k) % 5) as f64;
            }
        }
    }
    let density = grid.density.clone();
    let temperature = grid.temperature.clone();

    advect_velocity(&mut grid, 0.5);
    advect_scalars(&mut grid, 0.5, 1.0);

    assert!(grid.u.iter().all(|&x| x == 0.0));
    assert!(grid.v.iter().all(|&x| x == 0.0));
    assert!(grid.w.iter().all(|&x| x == 0.0));
    assert_eq!(grid.density, density);
    assert_eq!(grid.temperature, temperature);
}

#[test]
fn test_scalar_transport_follows_the_flow() {
    // Constant +Y flow; a marked slab moves one cell per unit of v * dt.
    let n = 10;
    let mut grid = SmokeGrid::new(n, n, n, 1.0, 273.0);
    grid.v.fill(2.0);
    for k in 0..n {
        for i in 0..n {
            let idx = grid.idx(i, 3, k);
            grid.density[idx] = 1.0;
        }
    }

    advect_scalars(&mut grid, 0.5, 1.0);

    for k in 0..n {
        for i in 0..n {
            assert!(
                (grid.density[grid.idx(i, 4, k)] - 1.0).abs() < 1e-12,
                "slab did not arrive at j=4"
            );
            assert!(
                grid.density[grid.idx(i, 3, k)].abs() < 1e-12,
                "slab left residue at j=3"
            );
        }
    }
}

#[test]
fn test_velocity_self_advection_translates_profile() {
    // A v-profile varying along Y, carried by uniform +Y flow of the same
    // field: each face picks up the value one cell upstream.
    let n = 10;
    let mut grid = SmokeGrid::new(n, n, n, 1.0, 273.0);
    // Uniform carrier in v so the trace distance is exactly one cell.
    grid.v.fill(1.0);
    // Mark a stripe in u to watch it move.
    for k in 0..n {
        for i in 0..n {
            let idx = grid.idx(i, 5, k);
            grid.u[idx] = 3.0;
        }
    }

    advect_velocity(&mut grid, 1.0);

    for k in 1..n - 1 {
        for i in 1..n - 1 {
            assert!(
                (grid.u[grid.idx(i, 6, k)] - 3.0).abs() < 1e-12,
                "u stripe did not advect from j=5 to j=6"
            );
            assert!(grid.u[grid.idx(i, 5, k)].abs() < 1e-12);
        }
    }
    // The carrier itself is uniform and stays uniform away from walls.
    for k in 1..n - 1 {
        for i in 1..n - 1 {
            for j in 2..n - 1 {
                assert!((grid.v[grid.idx(i, j, k)] - 1.0).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn test_out_of_domain_trace_clamps_to_boundary_values() {
    let n = 6;
    let mut grid = SmokeGrid::new(n, n, n, 1.0, 273.0);
    // Strong flow in +X: the left columns back-trace out of the domain and
    // must clamp to the x=0 boundary samples instead of reading garbage.
    grid.u.fill(4.0);
    for k in 0..n {
        for j in 0..n {
            let idx = grid.idx(0, j, k);
            grid.density[idx] = 0.75;
        }
    }

    advect_scalars(&mut grid, 1.0, 1.0);

    for k in 0..n {
        for j in 0..n {
            for i in 0..4 {
                // Everything within the trace distance of the wall takes the
                // clamped boundary value.
                assert!(
                    (grid.density[grid.idx(i, j, k)] - 0.75).abs() < 1e-12,
                    "clamped value wrong at ({i},{j},{k})"
                );
            }
        }
    }

    assert!(grid.density.iter().all(|d| d.is_finite()));
}

#[test]
fn test_advection_preserves_uniform_fields() {
    // A uniform scalar field is a fixed point of advection under any flow.
    let n = 8;
    let mut grid = SmokeGrid::new(n, n, n, 1.0, 273.0);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let idx = grid.idx(i, j, k);
                grid.u[idx] = ((i + j) % 3) as f64 - 1.0;
                grid.v[idx] = ((j + k) % 3) as f64 - 1.0;
                grid.w[idx] = ((i + k) % 3) as f64 - 1.0;
            }
        }
    }
    grid.density.fill(0.42);
    grid.temperature.fill(300.0);

    advect_scalars(&mut grid, 0.3, 1.0);

    for &d in &grid.density {
        assert!((d - 0.42).abs() < 1e-12);
    }
    for &t in &grid.temperature {
        assert!((t - 300.0).abs() < 1e-12);
    }
}

#[test]
fn test_sampling_respects_component_staggering() {
    // u lives on x-faces: sampling at a u face must reproduce u exactly,
    // and the v component sampled there is an average of nearby v faces.
    let n = 6;
    let mut grid = SmokeGrid::new(n, n, n, 1.0, 273.0);
    let idx = grid.idx(3, 2, 2);
    grid.u[idx] = 5.0;

    let at_face = grid.sample_velocity(&grid.u, &grid.v, &grid.w, grid.u_position(3, 2, 2));
    assert_eq!(at_face.x, 5.0);

    // Half a cell off in x, the sample is the mean of the two faces.
    let off = grid.u_position(3, 2, 2) + DVec3::new(0.5, 0.0, 0.0);
    let mid = grid.sample_velocity(&grid.u, &grid.v, &grid.w, off);
    assert!((mid.x - 2.5).abs() < 1e-12);
}
