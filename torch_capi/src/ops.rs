//! Pass-through tensor operations. These only see borrowed tensors and hand
//! back owned results; wrapping them in handles is the caller's job.

use tch::{Kind, Tensor};

use crate::autograd;
use crate::error::CapiError;

pub(crate) fn sum(tensor: &Tensor) -> Result<Tensor, CapiError> {
    Ok(tensor.f_sum(None::<Kind>)?)
}

/// Accumulated gradient of `tensor`. An undefined tensor comes back as-is
/// when nothing has been accumulated.
pub(crate) fn grad(tensor: &Tensor) -> Result<Tensor, CapiError> {
    Ok(tensor.f_grad()?)
}

/// Runs the backward pass rooted at `tensor`, accumulating into every leaf
/// of its graph. Without `gradient` the seed is an implicit scalar one.
///
/// An explicit seed is folded into a scalar root, `sum(tensor * seed)`, whose
/// gradient with respect to `tensor` is exactly `seed`. The seed is detached
/// so it never collects gradient itself.
pub(crate) fn backward(
    tensor: &Tensor,
    gradient: Option<&Tensor>,
    keep_graph: bool,
    create_graph: bool,
) -> Result<(), CapiError> {
    match gradient {
        None => autograd::run_backward(tensor, keep_graph, create_graph)?,
        Some(seed) => {
            let expected = tensor.size();
            let found = seed.size();
            if expected != found {
                return Err(CapiError::GradientShape { expected, found });
            }
            let root = tensor.f_mul(&seed.f_detach()?)?.f_sum(None::<Kind>)?;
            autograd::run_backward(&root, keep_graph, create_graph)?
        }
    }
    Ok(())
}

pub(crate) fn add(lhs: &Tensor, rhs: &Tensor) -> Result<Tensor, CapiError> {
    Ok(lhs.f_add(rhs)?)
}
