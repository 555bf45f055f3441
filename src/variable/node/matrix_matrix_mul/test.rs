use std::error::Error;

use ndarray::{array, Array2};

use crate::variable::utils::{are_similar, new_shared};

mod forward {
    use super::super::{Forward, MatrixMatrixMul};
    use super::*;

    #[test]
    fn creation() -> Result<(), Box<dyn Error>> {
        let left = Array2::from_elem((3, 3), 1.);
        let right = Array2::from_elem((3, 3), 2.);
        let op = MatrixMatrixMul::new(
            new_shared(left.clone()),
            new_shared(right.clone()),
            new_shared(Array2::zeros((3, 3))),
        );

        are_similar(op.left_data.borrow(), &left)?;
        are_similar(op.right_data.borrow(), &right)?;
        are_similar(op.data.borrow(), &Array2::zeros((3, 3)))
    }

    #[test]
    fn computation() -> Result<(), Box<dyn Error>> {
        let op = MatrixMatrixMul::new(
            new_shared(array![[1., 2., 3.], [4., 5., 6.]]),
            new_shared(array![[1., 0.], [0., 1.], [1., 1.]]),
            new_shared(Array2::zeros((2, 2))),
        );

        op.forward();
        are_similar(op.data.borrow(), &array![[4., 5.], [10., 11.]])?;

        // The result is overwritten, not accumulated.
        op.forward();
        are_similar(op.data.borrow(), &array![[4., 5.], [10., 11.]])
    }
}

mod backward {
    use std::rc::Rc;

    use super::super::{
        Backward, MatrixMatrixMulBackward, MatrixMatrixMulBackwardLeft,
        MatrixMatrixMulBackwardRight,
    };
    use super::*;
    use crate::variable::gradient::Gradient;

    #[test]
    fn left() -> Result<(), Box<dyn Error>> {
        let op = MatrixMatrixMulBackwardLeft::new(
            new_shared(array![[1., 2.], [3., 4.], [5., 6.]]),
            Rc::new(Gradient::from_ndarray(Array2::zeros((2, 3)))),
            Rc::new(Gradient::from_ndarray(Array2::from_elem((2, 2), 1.))),
        );

        op.backward();
        are_similar(
            op.left_gradient.borrow(),
            &array![[3., 7., 11.], [3., 7., 11.]],
        )?;

        op.backward();
        are_similar(
            op.left_gradient.borrow(),
            &array![[6., 14., 22.], [6., 14., 22.]],
        )
    }

    #[test]
    fn right() -> Result<(), Box<dyn Error>> {
        let op = MatrixMatrixMulBackwardRight::new(
            new_shared(array![[1., 2., 3.], [4., 5., 6.]]),
            Rc::new(Gradient::from_ndarray(Array2::zeros((3, 2)))),
            Rc::new(Gradient::from_ndarray(Array2::from_elem((2, 2), 1.))),
        );

        op.backward();
        are_similar(
            op.right_gradient.borrow(),
            &array![[5., 5.], [7., 7.], [9., 9.]],
        )
    }

    #[test]
    fn both() -> Result<(), Box<dyn Error>> {
        let gradient = Rc::new(Gradient::from_ndarray(Array2::from_elem((2, 2), 1.)));
        let left = MatrixMatrixMulBackwardLeft::new(
            new_shared(Array2::eye(2)),
            Rc::new(Gradient::zeros(ndarray::Ix2(2, 2))),
            gradient.clone(),
        );
        let right = MatrixMatrixMulBackwardRight::new(
            new_shared(Array2::eye(2)),
            Rc::new(Gradient::zeros(ndarray::Ix2(2, 2))),
            gradient,
        );
        let op = MatrixMatrixMulBackward::new(left, right);

        op.backward();
        are_similar(op.left.left_gradient.borrow(), &Array2::from_elem((2, 2), 1.))?;
        are_similar(op.right.right_gradient.borrow(), &Array2::from_elem((2, 2), 1.))
    }
}
