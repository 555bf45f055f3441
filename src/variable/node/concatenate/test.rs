use std::error::Error;

use ndarray::{array, Array, Array2};

use crate::variable::utils::{are_similar, new_shared};

mod forward {
    use super::super::{Concatenate, Forward};
    use super::*;

    #[test]
    fn rows() -> Result<(), Box<dyn Error>> {
        let op = Concatenate::new(
            new_shared(Array::linspace(-4., 1., 6).into_shape((2, 3))?),
            new_shared(Array::linspace(2., 4., 3).into_shape((1, 3))?),
            new_shared(Array2::zeros((3, 3))),
        );

        op.forward();
        are_similar(
            op.data.borrow(),
            &Array::linspace(-4., 4., 9).into_shape((3, 3))?,
        )
    }
}

mod backward {
    use std::rc::Rc;

    use super::super::{
        Backward, ConcatenateBackward, ConcatenateBackwardLeft, ConcatenateBackwardRight,
    };
    use super::*;
    use crate::variable::gradient::Gradient;

    fn upstream() -> Rc<Gradient> {
        Rc::new(Gradient::from_ndarray(array![
            [1., 2.],
            [3., 4.],
            [5., 6.]
        ]))
    }

    #[test]
    fn left() -> Result<(), Box<dyn Error>> {
        let op = ConcatenateBackwardLeft::new(
            Rc::new(Gradient::from_ndarray(Array2::zeros((2, 2)))),
            upstream(),
        );

        op.backward();
        are_similar(op.operand_gradient.borrow(), &array![[1., 2.], [3., 4.]])?;

        op.backward();
        are_similar(op.operand_gradient.borrow(), &array![[2., 4.], [6., 8.]])
    }

    #[test]
    fn right() -> Result<(), Box<dyn Error>> {
        let op = ConcatenateBackwardRight::new(
            Rc::new(Gradient::from_ndarray(Array2::zeros((1, 2)))),
            upstream(),
            2,
        );

        op.backward();
        are_similar(op.operand_gradient.borrow(), &array![[5., 6.]])
    }

    #[test]
    fn both() -> Result<(), Box<dyn Error>> {
        let gradient = upstream();
        let op = ConcatenateBackward::new(
            ConcatenateBackwardLeft::new(
                Rc::new(Gradient::from_ndarray(Array2::zeros((1, 2)))),
                gradient.clone(),
            ),
            ConcatenateBackwardRight::new(
                Rc::new(Gradient::from_ndarray(Array2::zeros((2, 2)))),
                gradient,
                1,
            ),
        );

        op.backward();
        are_similar(op.left.operand_gradient.borrow(), &array![[1., 2.]])?;
        are_similar(op.right.operand_gradient.borrow(), &array![[3., 4.], [5., 6.]])
    }
}
