use ndarray::{s, Array2, ArrayD, Ix2, IxDyn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{nn::init, Error, Result};

/// An owned n-dimensional array of `f64` together with its shape.
///
/// Tensors are the values exchanged with the outside world: image features coming from the
/// conversion collaborator, encodings handed back to the caller and parameter snapshots. Inside
/// the computational graph the data lives in plain `ndarray` matrices and is copied out into a
/// fresh `Tensor` whenever it is extracted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor", into = "RawTensor")]
pub struct Tensor {
    array: ArrayD<f64>,
}

impl Tensor {
    /// Creates a tensor from a shape and its row-major data.
    ///
    /// Fails with [`Error::ShapeMismatch`] when `data.len()` differs from the product of `shape`.
    ///
    /// # Examples
    ///
    /// ```
    /// use image_orderer::Tensor;
    ///
    /// let t = Tensor::from_shape_vec(&[2, 2], vec![1., 2., 3., 4.]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(3.));
    ///
    /// assert!(Tensor::from_shape_vec(&[2, 3], vec![1., 2.]).is_err());
    /// ```
    pub fn from_shape_vec(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::shape(&[expected], &[data.len()]));
        }

        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(|array| Self { array })
            .map_err(|_| Error::shape(shape, &[expected]))
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            array: ArrayD::zeros(IxDyn(shape)),
        }
    }

    /// Creates a tensor whose entries are drawn from the Xavier uniform distribution
    /// *U(-a, a)* with *a = sqrt(6 / (fan_in + fan_out))*.
    ///
    /// The generator is supplied by the caller so that initialization can be reproduced.
    pub fn xavier_uniform<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self {
        Self {
            array: init::xavier_uniform(IxDyn(shape), rng),
        }
    }

    /// Returns the shape.
    pub fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Returns `true` if the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Returns the element at `index`, or `None` if the index has the wrong number of
    /// components or is out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.array.ndim() {
            return None;
        }
        self.array.get(IxDyn(index)).copied()
    }

    /// Returns a view of the underlying array.
    pub fn as_array(&self) -> &ArrayD<f64> {
        &self.array
    }

    /// Returns the data in row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.array.iter().copied().collect()
    }

    /// Copies the tensor into a matrix. One dimensional tensors become a single row.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        match self.array.ndim() {
            1 => Ok(self
                .array
                .clone()
                .into_shape((1, self.array.len()))
                .map_err(|_| Error::shape(&[1, self.array.len()], self.shape()))?),
            2 => Ok(self
                .array
                .clone()
                .into_dimensionality::<Ix2>()
                .map_err(|_| Error::shape(&[0, 0], self.shape()))?),
            _ => Err(Error::shape(&[0, 0], self.shape())),
        }
    }

    /// Mean of the brightness channel, that is of the left half of the columns of an image
    /// tensor shaped *(rows, 2 * cols)*.
    ///
    /// Used as the *lightness* score when a target order is derived from the images themselves.
    pub fn mean_brightness(&self) -> Result<f64> {
        let matrix = self.to_matrix()?;
        let (rows, cols) = matrix.dim();
        if cols == 0 || cols % 2 != 0 || rows == 0 {
            return Err(Error::shape(&[rows, cols + cols % 2], &[rows, cols]));
        }

        Ok(matrix.slice(s![.., ..cols / 2]).mean().unwrap_or(0.))
    }
}

impl From<Array2<f64>> for Tensor {
    fn from(array: Array2<f64>) -> Self {
        Self {
            array: array.into_dyn(),
        }
    }
}

impl From<ArrayD<f64>> for Tensor {
    fn from(array: ArrayD<f64>) -> Self {
        Self { array }
    }
}

#[derive(Serialize, Deserialize)]
struct RawTensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = Error;

    fn try_from(raw: RawTensor) -> Result<Self> {
        Tensor::from_shape_vec(&raw.shape, raw.data)
    }
}

impl From<Tensor> for RawTensor {
    fn from(tensor: Tensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            data: tensor.to_vec(),
        }
    }
}

#[cfg(test)]
mod test {
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn creation() {
        let t = Tensor::from_shape_vec(&[2, 3], (0..6).map(f64::from).collect()).unwrap();

        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.len(), 6);
        assert_eq!(t.get(&[1, 2]), Some(5.));
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[1]), None);
    }

    #[test]
    fn creation_shape_mismatch() {
        let err = Tensor::from_shape_vec(&[3, 3], vec![0.; 8]).unwrap_err();

        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn xavier_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Tensor::xavier_uniform(&[4, 8], &mut rng);
        let bound = (6.0_f64 / 12.).sqrt();

        assert_eq!(t.shape(), &[4, 8]);
        assert!(t.to_vec().iter().all(|el| el.abs() <= bound));
    }

    #[test]
    fn xavier_seeded() {
        let first = Tensor::xavier_uniform(&[4, 4], &mut StdRng::seed_from_u64(3));
        let second = Tensor::xavier_uniform(&[4, 4], &mut StdRng::seed_from_u64(3));

        assert_eq!(first, second);
    }

    #[test]
    fn to_matrix() {
        let vector = Tensor::from(array![1., 2., 3.].into_dyn());
        assert_eq!(vector.to_matrix().unwrap(), array![[1., 2., 3.]]);

        let cube = Tensor::zeros(&[2, 2, 2]);
        assert!(cube.to_matrix().is_err());
    }

    #[test]
    fn mean_brightness() {
        let image = Tensor::from(array![[0.2, 0.4, 3.0, 1.0], [0.6, 0.8, 2.0, 0.5]]);
        approx::assert_abs_diff_eq!(image.mean_brightness().unwrap(), 0.5, epsilon = 1e-12);

        let odd = Tensor::from(array![[0.2, 0.4, 3.0]]);
        assert!(odd.mean_brightness().is_err());
    }

    #[test]
    fn serde_round_trip() {
        let t = Tensor::from(array![[1., 2.], [3., 4.]]);
        let json = serde_json::to_string(&t).unwrap();

        assert_eq!(serde_json::from_str::<Tensor>(&json).unwrap(), t);
        assert!(serde_json::from_str::<Tensor>(r#"{"shape":[2,2],"data":[1.0]}"#).is_err());
    }
}
