use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

#[cfg(test)]
use ndarray::Array2;

/// Shorthand for `Rc<RefCell<T>>`.
pub(crate) type Shared<T> = Rc<RefCell<T>>;

thread_local! {
    static OPERATIONS_COUNTER: Cell<usize> = Cell::new(0);
}

/// Returns a fresh operation id. Ids grow monotonically within a thread, so an operation always
/// has a greater id than every operation it depends on.
pub(crate) fn next_operation_id() -> usize {
    OPERATIONS_COUNTER.with(|counter| {
        let id = counter.get() + 1;
        counter.set(id);
        id
    })
}

pub(crate) fn new_shared<T>(item: T) -> Shared<T> {
    Rc::new(RefCell::new(item))
}

#[cfg(test)]
pub(crate) const EPSILON: f64 = 1e-9;

#[cfg(test)]
pub(crate) fn are_similar(
    result: std::cell::Ref<Array2<f64>>,
    expected: &Array2<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !result.abs_diff_eq(expected, EPSILON) {
        return Err(format!("Result: {} | Expected: {}", result, expected).into());
    }

    Ok(())
}
