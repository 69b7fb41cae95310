//! Helper functions used in testing, specifically point generators, as well as the surfaces that
//! discretise the boundary of a cube used by kernel independent expansions.
use num::Float;
use rand::prelude::*;
use rlst::RlstScalar;

use super::types::PointSet;

/// Points fixture for testing, uniformly samples in each axis from min to max.
///
/// # Arguments
/// * `n_points` - The number of points to sample.
/// * `dim` - Spatial dimension.
/// * `min` - The minimum coordinate value along each axis, defaults to 0.
/// * `max` - The maximum coordinate value along each axis, defaults to 1.
/// * `seed` - Random seed, defaults to 0.
pub fn points_fixture<T: Float + RlstScalar + rand::distributions::uniform::SampleUniform>(
    n_points: usize,
    dim: usize,
    min: Option<T>,
    max: Option<T>,
    seed: Option<u64>,
) -> PointSet<T> {
    let seed = seed.unwrap_or(0);
    let mut range = StdRng::seed_from_u64(seed);

    let between = if let (Some(min), Some(max)) = (min, max) {
        rand::distributions::Uniform::from(min..max)
    } else {
        rand::distributions::Uniform::from(<T as num::Zero>::zero()..<T as num::One>::one())
    };

    let coordinates = (0..n_points * dim)
        .map(|_| between.sample(&mut range))
        .collect();

    // Dimension is positive and divides the number of coordinates by construction
    PointSet::new(dim.max(1), coordinates).unwrap()
}

/// Number of points discretising the surface of a cube, for a given expansion order.
///
/// # Arguments
/// * `expansion_order` - Number of points along each edge of the cube.
pub fn ncoeffs_kifmm(expansion_order: usize) -> usize {
    6 * (expansion_order - 1).pow(2) + 2
}

/// Points discretising the surface of the cube `[-1, 1]^3`, in row major order.
///
/// # Arguments
/// * `expansion_order` - Number of points along each edge of the cube, at least 2.
pub fn surface_grid<T: RlstScalar + Float>(expansion_order: usize) -> Vec<T> {
    let dim = 3;
    let n_coeffs = ncoeffs_kifmm(expansion_order);

    let mut surface: Vec<T> = vec![<T as num::Zero>::zero(); dim * n_coeffs];

    let lower = 0;
    let upper = expansion_order - 1;

    let mut idx = 0;

    for k in 0..expansion_order {
        for j in 0..expansion_order {
            for i in 0..expansion_order {
                if k == lower
                    || k == upper
                    || i == lower
                    || i == upper
                    || j == lower
                    || j == upper
                {
                    surface[dim * idx] = T::from(i).unwrap();
                    surface[dim * idx + 1] = T::from(j).unwrap();
                    surface[dim * idx + 2] = T::from(k).unwrap();
                    idx += 1;
                }
            }
        }
    }

    // Shift and scale surface so that it's centered at the origin and has a half side length of 1
    let two = T::from(2.0).unwrap();
    let one = <T as num::One>::one();
    let scale = two / (T::from(expansion_order).unwrap() - one);

    surface
        .iter_mut()
        .for_each(|point| *point = *point * scale - one);

    surface
}

/// Scale a surface about the origin.
///
/// # Arguments
/// * `surface` - Row major surface points.
/// * `scale` - Multiplier applied to every coordinate.
pub fn scale_surface<T: RlstScalar + Float>(surface: &[T], scale: T) -> Vec<T> {
    surface.iter().map(|&x| x * scale).collect()
}
