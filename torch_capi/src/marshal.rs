//! Copies between tensors and caller-owned memory.

use std::ffi::CString;

use libc::{c_char, c_void};
use tch::Tensor;

use crate::dtype::ElementType;
use crate::error::CapiError;

// `dim`, `size`, `numel` and `data_ptr` abort on an undefined tensor, so every
// query goes through this first.
fn defined(tensor: &Tensor) -> Result<&Tensor, CapiError> {
    if tensor.defined() {
        Ok(tensor)
    } else {
        Err(CapiError::UndefinedTensor)
    }
}

pub(crate) fn element_type(tensor: &Tensor) -> Result<ElementType, CapiError> {
    ElementType::from_kind(defined(tensor)?.f_kind()?)
}

pub(crate) fn ndimension(tensor: &Tensor) -> Result<i64, CapiError> {
    Ok(defined(tensor)?.dim() as i64)
}

/// Bytes of element data held by `tensor`.
pub(crate) fn byte_size(tensor: &Tensor) -> Result<usize, CapiError> {
    let width = element_type(tensor)?.size_in_bytes();
    Ok(tensor.numel() * width)
}

/// Writes the dimension sizes of `tensor` into `out`, in order.
///
/// # Safety
/// `out` must be writable for `ndimension(tensor)` entries.
pub(crate) unsafe fn sizes_into(tensor: &Tensor, out: *mut i64) -> Result<(), CapiError> {
    let sizes = defined(tensor)?.size();
    if sizes.is_empty() {
        return Ok(());
    }
    if out.is_null() {
        return Err(CapiError::NullPointer("sizes buffer"));
    }
    unsafe { std::ptr::copy_nonoverlapping(sizes.as_ptr(), out, sizes.len()) };
    Ok(())
}

/// Borrowed pointer into the tensor's live storage.
pub(crate) fn data_ptr(tensor: &Tensor) -> Result<*mut c_void, CapiError> {
    Ok(defined(tensor)?.data_ptr())
}

/// Copies `len` bytes of element data into `out`.
///
/// # Safety
/// `out` must be writable for `len` bytes, and `len` must not exceed the
/// tensor's byte size.
pub(crate) unsafe fn copy_data_out(
    tensor: &Tensor,
    out: *mut c_void,
    len: usize,
) -> Result<(), CapiError> {
    let src = data_ptr(tensor)? as *const u8;
    if len == 0 {
        return Ok(());
    }
    if out.is_null() {
        return Err(CapiError::NullPointer("data buffer"));
    }
    unsafe { std::ptr::copy_nonoverlapping(src, out as *mut u8, len) };
    Ok(())
}

/// Renders `tensor` into a NUL-terminated string the caller now owns. It must
/// come back through `tcapi_string_free`.
pub(crate) fn to_owned_cstring(tensor: &Tensor) -> Result<*mut c_char, CapiError> {
    let text = format!("{}", tensor);
    CString::new(text)
        .map(CString::into_raw)
        .map_err(|_| CapiError::InteriorNul)
}
