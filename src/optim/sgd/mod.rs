use std::cell::Cell;

use ndarray::{Array2, Zip};

use crate::{nn::Parameter, Error, Result};

/// **Gradient Descent** optimizer with a fixed learning rate.
#[derive(Debug)]
pub struct GradientDescent {
    lr: Cell<f64>,
}

impl GradientDescent {
    /// Creates a new *gradient descent* optimizer.
    ///
    /// # Arguments
    ///
    /// * `lr` - learning rate, must be finite and positive.
    pub fn new(lr: f64) -> Result<Self> {
        check_lr(lr)?;

        Ok(Self { lr: Cell::new(lr) })
    }

    /// Returns the current learning rate.
    pub fn get_lr(&self) -> f64 {
        self.lr.get()
    }

    /// Sets a new value for the learning rate.
    pub fn set_lr(&self, lr: f64) -> Result<()> {
        check_lr(lr)?;
        self.lr.set(lr);

        Ok(())
    }

    /// Returns `param` − *lr* · `grad`, leaving `param` untouched.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the two arrays have different shapes.
    pub fn update(&self, param: &Array2<f64>, grad: &Array2<f64>) -> Result<Array2<f64>> {
        if param.dim() != grad.dim() {
            return Err(Error::shape(param.shape(), grad.shape()));
        }

        let lr = self.lr.get();
        Ok(Zip::from(param)
            .and(grad)
            .map_collect(|param_el, grad_el| param_el - lr * grad_el))
    }

    /// Updates every parameter with its gradient.
    ///
    /// All the updates are computed before any parameter is replaced: if one of the pairs has
    /// mismatched shapes no parameter changes.
    pub fn step(&self, params: &[(&Parameter, &Array2<f64>)]) -> Result<()> {
        let updated = params
            .iter()
            .map(|(param, grad)| self.update(&param.data(), grad))
            .collect::<Result<Vec<_>>>()?;

        params
            .iter()
            .zip(updated)
            .for_each(|((param, _), array)| param.replace(array));

        Ok(())
    }
}

fn check_lr(lr: f64) -> Result<()> {
    if !lr.is_finite() || lr <= 0. {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and positive, got {}",
            lr
        )));
    }

    Ok(())
}
