/// Forward-propagation behavior.
///
/// Implemented by every node that computes a value. Calling `.forward()` overwrites the node's
/// data with the result computed from its operands' current data.
pub(crate) trait Forward {
    fn forward(&self);
}

/// Back-propagation behavior.
///
/// Implemented by the backward components of the differentiable nodes. Calling `.backward()`
/// reads the node's gradient and **accumulates** the local contribution into the gradients of
/// its operands, so that operands consumed more than once receive the sum of all contributions.
pub(crate) trait Backward {
    fn backward(&self);
}
