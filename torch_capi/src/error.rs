use std::cell::RefCell;
use std::ffi::CString;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapiError {
    #[error("unknown element type code {0}")]
    UnknownTypeCode(i32),

    /// Inverse lookup of a native kind that has no wire code.
    #[error("element kind {0} has no registered type code")]
    UnregisteredKind(String),

    #[error("null tensor handle passed as {0}")]
    NullHandle(&'static str),

    #[error("null pointer passed as {0}")]
    NullPointer(&'static str),

    /// Placeholder handle, e.g. the gradient of a tensor that never tracked one.
    #[error("tensor is undefined")]
    UndefinedTensor,

    #[error("gradient shape {found:?} does not match tensor shape {expected:?}")]
    GradientShape { expected: Vec<i64>, found: Vec<i64> },

    #[error("tensor string contained an interior nul byte")]
    InteriorNul,

    #[error("torch backend not enabled")]
    BackendDisabled,

    #[error("logger setup failed: {0}")]
    Logging(String),

    #[cfg(feature = "torch")]
    #[error("native: {0}")]
    Native(#[from] tch::TchError),
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

pub(crate) fn set_error(message: impl Into<String>) {
    let msg = message.into();
    log::warn!("tcapi: {}", msg);
    let cstr = CString::new(msg).unwrap_or_else(|_| CString::new("Unknown error").unwrap());
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = Some(cstr);
    });
}

pub(crate) fn clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Pointer to the current thread's last error message, or null. The pointer
/// stays valid until the next boundary call on this thread.
pub(crate) fn last_error_ptr() -> *const libc::c_char {
    LAST_ERROR.with(|cell| match &*cell.borrow() {
        Some(msg) => msg.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Owned copy of the current thread's last error message.
pub fn last_error_message() -> Option<String> {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|msg| msg.to_string_lossy().into_owned())
    })
}

/// Records `err` and yields `default`, or unwraps the value.
pub(crate) fn report<T>(default: T, result: Result<T, CapiError>) -> T {
    match result {
        Ok(v) => v,
        Err(err) => {
            set_error(err.to_string());
            default
        }
    }
}

/// Runs `f` with the last-error slot cleared, converting any panic into a
/// recorded error so nothing unwinds into the foreign caller.
pub(crate) fn ffi_guard<T, F>(default: T, f: F) -> T
where
    F: FnOnce() -> T,
{
    clear_error();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                *s
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.as_str()
            } else {
                "panic across FFI boundary"
            };
            set_error(format!("panic: {}", msg));
            default
        }
    }
}
