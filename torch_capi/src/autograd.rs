//! Direct libtorch autograd entry points that `tch` does not expose with the
//! full set of flags.

use std::ffi::CStr;

use libc::{c_int, c_void};
use tch::{TchError, Tensor};

/// `torch::Tensor::backward` on `root` with an implicit seed.
pub(crate) fn run_backward(
    root: &Tensor,
    keep_graph: bool,
    create_graph: bool,
) -> Result<(), TchError> {
    unsafe {
        torch_sys::at_backward(
            root.as_ptr() as *mut _,
            keep_graph as c_int,
            create_graph as c_int,
        );
    }
    take_last_error()
}

/// Moves libtorch's pending C++ error for this thread, if any, into a
/// `TchError`. The message is malloc'd on the C side.
fn take_last_error() -> Result<(), TchError> {
    let err = unsafe { torch_sys::get_and_reset_last_err() };
    if err.is_null() {
        return Ok(());
    }
    let msg = unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned();
    unsafe { libc::free(err as *mut c_void) };
    Err(TchError::Torch(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_backward_accumulates_one() {
        let x = Tensor::from_slice(&[2.0f64]).reshape(&[] as &[i64]).set_requires_grad(true);
        run_backward(&x, false, false).unwrap();
        assert_eq!(x.grad().double_value(&[]), 1.0);
    }

    #[test]
    fn native_error_is_taken_once() {
        let x = Tensor::from_slice(&[1.0f64, 2.0]).set_requires_grad(true);
        let err = run_backward(&x, false, false).unwrap_err();
        assert!(matches!(err, TchError::Torch(_)));
        assert!(take_last_error().is_ok());
    }
}
