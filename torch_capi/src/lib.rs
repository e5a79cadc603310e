use libc::{c_char, c_int, c_void};
use std::ffi::CString;
use std::ptr;

#[cfg(feature = "torch")]
mod autograd;
pub mod dtype;
pub mod error;
pub mod handle;
pub mod header;
pub mod logging;
#[cfg(feature = "torch")]
mod marshal;
#[cfg(feature = "torch")]
mod ops;

pub use dtype::ElementType;
pub use error::{last_error_message, CapiError};
pub use handle::TensorHandle;

use error::{ffi_guard, report, set_error};
#[cfg(feature = "torch")]
use handle::{borrow, into_raw};

#[no_mangle]
/// # Safety
/// `data` must be readable for `byte_len` bytes and `shape` for `dim` entries.
/// `byte_len` must equal the product of `shape` times the element size of
/// `type_code`. `data` stays owned by the caller.
pub unsafe extern "C" fn tcapi_tensor_from_data(
    data: *const c_void,
    byte_len: usize,
    type_code: c_int,
    shape: *const i64,
    dim: usize,
    requires_grad: c_int,
) -> *mut TensorHandle {
    ffi_guard(ptr::null_mut(), || {
        #[cfg(feature = "torch")]
        {
            let tensor = unsafe {
                handle::tensor_from_raw(
                    data as *const u8,
                    byte_len,
                    type_code,
                    shape,
                    dim,
                    requires_grad != 0,
                )
            };
            report(ptr::null_mut(), tensor.map(into_raw))
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = (data, byte_len, shape, dim, requires_grad);
            // Type codes are still checked first so misuse reads the same
            // with or without a backend.
            let result = ElementType::from_code(type_code).and(Err(CapiError::BackendDisabled));
            report(ptr::null_mut(), result)
        }
    })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle; it must not be used afterwards.
pub unsafe extern "C" fn tcapi_tensor_destroy(tensor: *mut TensorHandle) {
    ffi_guard((), || unsafe { handle::release(tensor) })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle. The returned string belongs to the
/// caller and must be released with `tcapi_string_free`.
pub unsafe extern "C" fn tcapi_tensor_to_string(tensor: *const TensorHandle) -> *mut c_char {
    ffi_guard(ptr::null_mut(), || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }.and_then(marshal::to_owned_cstring);
            report(ptr::null_mut(), result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(ptr::null_mut(), Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `ptr` must be null or a string returned by this library that has not been
/// freed yet.
pub unsafe extern "C" fn tcapi_string_free(ptr: *mut c_char) {
    ffi_guard((), || {
        if ptr.is_null() {
            return;
        }
        drop(unsafe { CString::from_raw(ptr) });
    })
}

#[no_mangle]
/// Element type code of `tensor`, or -1 on failure.
///
/// # Safety
/// `tensor` must be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_dtype(tensor: *const TensorHandle) -> i8 {
    ffi_guard(-1, || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }
                .and_then(marshal::element_type)
                .map(ElementType::code);
            report(-1, result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(-1, Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_ndimension(tensor: *const TensorHandle) -> i64 {
    ffi_guard(-1, || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }.and_then(marshal::ndimension);
            report(-1, result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(-1, Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle, and `out` must have room for
/// `tcapi_tensor_ndimension(tensor)` entries. Capacity is not checked.
pub unsafe extern "C" fn tcapi_tensor_sizes(tensor: *const TensorHandle, out: *mut i64) -> c_int {
    ffi_guard(1, || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }
                .and_then(|t| unsafe { marshal::sizes_into(t, out) })
                .map(|()| 0);
            report(1, result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = (tensor, out);
            report(1, Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// Size in bytes of the tensor's element data, or -1 on failure.
///
/// # Safety
/// `tensor` must be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_nbytes(tensor: *const TensorHandle) -> i64 {
    ffi_guard(-1, || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }
                .and_then(marshal::byte_size)
                .map(|n| n as i64);
            report(-1, result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(-1, Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// Borrowed pointer into the tensor's storage. Valid until the handle is
/// destroyed; the caller must never free it.
///
/// # Safety
/// `tensor` must be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_data_ptr(tensor: *const TensorHandle) -> *mut c_void {
    ffi_guard(ptr::null_mut(), || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }.and_then(marshal::data_ptr);
            report(ptr::null_mut(), result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(ptr::null_mut(), Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle, `out` must be writable for `len`
/// bytes, and `len` must not exceed `tcapi_tensor_nbytes(tensor)`.
pub unsafe extern "C" fn tcapi_tensor_data_copy(
    tensor: *const TensorHandle,
    out: *mut c_void,
    len: usize,
) -> c_int {
    ffi_guard(1, || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }
                .and_then(|t| unsafe { marshal::copy_data_out(t, out, len) })
                .map(|()| 0);
            report(1, result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = (tensor, out, len);
            report(1, Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_sum(tensor: *const TensorHandle) -> *mut TensorHandle {
    ffi_guard(ptr::null_mut(), || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }
                .and_then(ops::sum)
                .map(into_raw);
            report(ptr::null_mut(), result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(ptr::null_mut(), Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `tensor` must be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_grad(tensor: *const TensorHandle) -> *mut TensorHandle {
    ffi_guard(ptr::null_mut(), || {
        #[cfg(feature = "torch")]
        {
            let result = unsafe { borrow(tensor, "tensor") }
                .and_then(ops::grad)
                .map(into_raw);
            report(ptr::null_mut(), result)
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = tensor;
            report(ptr::null_mut(), Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// Backward pass rooted at `tensor`. A null `gradient` seeds with an implicit
/// scalar one, which only works for single-element tensors.
///
/// # Safety
/// `tensor` must be null or a live handle; `gradient` must be null or a live
/// handle.
pub unsafe extern "C" fn tcapi_tensor_backward(
    tensor: *const TensorHandle,
    gradient: *const TensorHandle,
    keep_graph: c_int,
    create_graph: c_int,
) -> c_int {
    ffi_guard(1, || {
        #[cfg(feature = "torch")]
        {
            let result = (|| {
                let tensor = unsafe { borrow(tensor, "tensor") }?;
                let gradient = if gradient.is_null() {
                    None
                } else {
                    Some(unsafe { borrow(gradient, "gradient") }?)
                };
                ops::backward(tensor, gradient, keep_graph != 0, create_graph != 0)
            })();
            report(1, result.map(|()| 0))
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = (tensor, gradient, keep_graph, create_graph);
            report(1, Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// # Safety
/// `a` and `b` must each be null or a live handle.
pub unsafe extern "C" fn tcapi_tensor_add(
    a: *const TensorHandle,
    b: *const TensorHandle,
) -> *mut TensorHandle {
    ffi_guard(ptr::null_mut(), || {
        #[cfg(feature = "torch")]
        {
            let result = (|| {
                let a = unsafe { borrow(a, "lhs") }?;
                let b = unsafe { borrow(b, "rhs") }?;
                ops::add(a, b)
            })();
            report(ptr::null_mut(), result.map(into_raw))
        }
        #[cfg(not(feature = "torch"))]
        {
            let _ = (a, b);
            report(ptr::null_mut(), Err(CapiError::BackendDisabled))
        }
    })
}

#[no_mangle]
/// Last error recorded on this thread, or null. Borrowed; valid until the
/// next `tcapi_*` call on the same thread.
pub extern "C" fn tcapi_last_error() -> *const c_char {
    error::last_error_ptr()
}

#[no_mangle]
pub extern "C" fn tcapi_live_handles() -> i64 {
    handle::live_handles()
}

#[no_mangle]
/// # Safety
/// `out_json` and `out_len` must be valid writable pointers for this call.
/// The string written to `out_json` is released with `tcapi_string_free`.
pub unsafe extern "C" fn tcapi_dtype_list(out_json: *mut *mut c_char, out_len: *mut usize) -> c_int {
    ffi_guard(1, || {
        if out_json.is_null() || out_len.is_null() {
            set_error("dtype list output pointer is null");
            return 1;
        }
        let json = dtype::table_json();
        let len = json.len();
        match CString::new(json) {
            Ok(c) => {
                unsafe {
                    *out_len = len;
                    *out_json = c.into_raw();
                }
                0
            }
            Err(_) => report(1, Err(CapiError::InteriorNul)),
        }
    })
}

#[no_mangle]
/// Installs `env_logger` filtered by `TCAPI_LOG` (default `warn`).
pub extern "C" fn tcapi_init_logging() -> c_int {
    ffi_guard(1, || report(1, logging::init_logging().map(|()| 0)))
}
