//! Tensor handles and their lifecycle.
//!
//! A handle is a `Box<TensorHandle>` leaked to the caller with
//! `Box::into_raw`. Its address is the caller's only view of the tensor, and
//! it is reclaimed exactly once by [`release`]. Everything that reads through
//! a raw handle lives here or in `marshal`.

use std::sync::atomic::{AtomicI64, Ordering};

#[cfg(feature = "torch")]
use tch::Tensor;

#[cfg(feature = "torch")]
use crate::dtype::ElementType;
#[cfg(feature = "torch")]
use crate::error::CapiError;

static LIVE_HANDLES: AtomicI64 = AtomicI64::new(0);

/// Opaque to the foreign caller.
pub struct TensorHandle {
    #[cfg(feature = "torch")]
    tensor: Tensor,
}

impl Drop for TensorHandle {
    fn drop(&mut self) {
        LIVE_HANDLES.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn live_handles() -> i64 {
    LIVE_HANDLES.load(Ordering::SeqCst)
}

/// Moves `tensor` into a fresh heap handle owned by the caller.
#[cfg(feature = "torch")]
pub(crate) fn into_raw(tensor: Tensor) -> *mut TensorHandle {
    LIVE_HANDLES.fetch_add(1, Ordering::SeqCst);
    let ptr = Box::into_raw(Box::new(TensorHandle { tensor }));
    log::debug!("tensor handle {:p} created", ptr);
    ptr
}

/// Borrows the tensor behind a live handle.
///
/// # Safety
/// `ptr` must be null or a handle returned by this crate that has not been
/// destroyed. The borrow must not outlive the handle.
#[cfg(feature = "torch")]
pub(crate) unsafe fn borrow<'a>(
    ptr: *const TensorHandle,
    what: &'static str,
) -> Result<&'a Tensor, CapiError> {
    match unsafe { ptr.as_ref() } {
        Some(handle) => Ok(&handle.tensor),
        None => Err(CapiError::NullHandle(what)),
    }
}

/// Drops the handle and its reference to native storage. Null is a no-op.
///
/// # Safety
/// `ptr` must be null or a live handle returned by this crate; it must not
/// be used afterwards.
pub(crate) unsafe fn release(ptr: *mut TensorHandle) {
    if ptr.is_null() {
        return;
    }
    log::debug!("tensor handle {:p} destroyed", ptr);
    drop(unsafe { Box::from_raw(ptr) });
}

/// Builds a tensor that owns a private copy of `byte_len` bytes at `data`.
///
/// The copy is allocated by libtorch and freed by libtorch once the last
/// reference to its storage goes away; `data` itself is never retained.
///
/// # Safety
/// `data` must be readable for `byte_len` bytes and `shape` for `dim`
/// entries. `byte_len` must equal the shape product times the element size
/// of `type_code`; this is not checked.
#[cfg(feature = "torch")]
pub(crate) unsafe fn tensor_from_raw(
    data: *const u8,
    byte_len: usize,
    type_code: i32,
    shape: *const i64,
    dim: usize,
    requires_grad: bool,
) -> Result<Tensor, CapiError> {
    let ty = ElementType::from_code(type_code)?;
    let bytes: &[u8] = if byte_len == 0 {
        &[]
    } else if data.is_null() {
        return Err(CapiError::NullPointer("data"));
    } else {
        unsafe { std::slice::from_raw_parts(data, byte_len) }
    };
    let sizes: &[i64] = if dim == 0 {
        &[]
    } else if shape.is_null() {
        return Err(CapiError::NullPointer("shape"));
    } else {
        unsafe { std::slice::from_raw_parts(shape, dim) }
    };
    let tensor = Tensor::f_from_data_size(bytes, sizes, ty.kind())?;
    if requires_grad {
        Ok(tensor.set_requires_grad(true))
    } else {
        Ok(tensor)
    }
}
