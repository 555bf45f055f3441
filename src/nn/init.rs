//! Parameters' initialization functions.
//!
//! Every initializer takes the random number generator as an argument, so that two models built
//! from the same seed start from exactly the same weights.
//!
//! ```
//! use image_orderer::nn::init::xavier_uniform;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let weights = xavier_uniform((4, 8), &mut rng);
//!
//! assert_eq!(weights.shape(), &[4, 8]);
//! ```
use ndarray::{Array, Dimension, ShapeBuilder};
use ndarray_rand::{rand_distr::Uniform, RandomExt};
use rand::Rng;

/// Returns the *fan_in* and the *fan_out* of a parameter with the given shape.
///
/// For matrices they are respectively the number of columns and of rows. For higher dimensional
/// parameters the size of the receptive field, i.e. the product of the trailing dimensions,
/// multiplies both. One dimensional parameters have equal fans.
///
/// # Arguments
///
/// `shape` - shape of the parameter.
pub fn calculate_fan_in_fan_out(shape: &[usize]) -> (f64, f64) {
    match shape.len() {
        0 => (1., 1.),
        1 => (shape[0] as f64, shape[0] as f64),
        _ => {
            let receptive_field_size: usize = shape.iter().skip(2).product();
            let fan_in = shape[1] * receptive_field_size;
            let fan_out = shape[0] * receptive_field_size;

            (fan_in as f64, fan_out as f64)
        }
    }
}

/// Returns an array filled with values sampled from *U(-a, a)* where
/// *a = sqrt(6 / (fan_in + fan_out))*.
///
/// Also known as **Glorot initialization**, this method is described in
/// [Understanding the difficulty of training deep feedforward neural networks](http://proceedings.mlr.press/v9/glorot10a/glorot10a.pdf).
///
/// # Arguments
///
/// * `shape` - shape of the resulting array.
///
/// * `rng` - random number generator.
pub fn xavier_uniform<Sh, R>(shape: Sh, rng: &mut R) -> Array<f64, Sh::Dim>
where
    Sh: ShapeBuilder,
    R: Rng + ?Sized,
{
    let shape = shape.into_shape();
    let dim = shape.raw_dim().clone();
    let (fan_in, fan_out) = calculate_fan_in_fan_out(dim.slice());
    let bound = (6. / (fan_in + fan_out).max(1.)).sqrt();

    if bound == 0. {
        return Array::zeros(dim);
    }

    Array::random_using(dim, Uniform::new_inclusive(-bound, bound), rng)
}

#[cfg(test)]
mod test {
    use ndarray::Ix2;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn fans() {
        assert_eq!(calculate_fan_in_fan_out(&[4, 8]), (8., 4.));
        assert_eq!(calculate_fan_in_fan_out(&[5]), (5., 5.));
        assert_eq!(calculate_fan_in_fan_out(&[2, 3, 4, 5]), (60., 40.));
    }

    #[test]
    fn xavier_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let array = xavier_uniform(Ix2(16, 32), &mut rng);
        let bound = (6.0_f64 / 48.).sqrt();

        assert!(array.iter().all(|el| el.abs() <= bound));
        assert!(array.iter().any(|el| *el != 0.));
    }
}
