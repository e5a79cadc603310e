#![cfg(feature = "torch")]

use std::ffi::c_void;
use std::ptr;

use torch_capi::{ElementType, TensorHandle};

fn create(bytes: &[u8], code: i32, shape: &[i64], requires_grad: bool) -> *mut TensorHandle {
    unsafe {
        torch_capi::tcapi_tensor_from_data(
            bytes.as_ptr() as *const c_void,
            bytes.len(),
            code,
            shape.as_ptr(),
            shape.len(),
            requires_grad as i32,
        )
    }
}

#[test]
fn every_registered_code_round_trips_through_dtype() {
    for ty in ElementType::all() {
        let shape = [2i64, 3];
        let bytes = vec![0u8; 6 * ty.size_in_bytes()];
        let t = create(&bytes, ty.code() as i32, &shape, false);
        assert!(!t.is_null(), "create failed for {}", ty.name());
        assert_eq!(unsafe { torch_capi::tcapi_tensor_dtype(t) }, ty.code());
        unsafe { torch_capi::tcapi_tensor_destroy(t) };
    }
}

#[test]
fn reserved_codes_allocate_no_handle() {
    let bytes = [0u8; 8];
    let shape = [4i64];
    for code in [12, 13, 14, 15, 64] {
        let t = create(&bytes, code, &shape, false);
        assert!(t.is_null());
        let msg = torch_capi::last_error_message().expect("error recorded");
        assert!(msg.contains("unknown element type code"), "{}", msg);
    }
}

#[test]
fn data_copy_round_trips_bytes() {
    let values: Vec<i64> = vec![7, -1, 0, i64::MAX, i64::MIN, 42];
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let t = create(&bytes, ElementType::Int64.code() as i32, &[3, 2], false);
    assert!(!t.is_null());
    assert_eq!(unsafe { torch_capi::tcapi_tensor_nbytes(t) }, bytes.len() as i64);

    let mut out = vec![0u8; bytes.len()];
    let rc = unsafe {
        torch_capi::tcapi_tensor_data_copy(t, out.as_mut_ptr() as *mut c_void, out.len())
    };
    assert_eq!(rc, 0);
    assert_eq!(out, bytes);
    unsafe { torch_capi::tcapi_tensor_destroy(t) };
}

#[test]
fn source_buffer_stays_with_caller() {
    let mut bytes: Vec<u8> = [1.0f32, 2.0].iter().flat_map(|v| v.to_ne_bytes()).collect();
    let t = create(&bytes, ElementType::Float32.code() as i32, &[2], false);
    assert!(!t.is_null());
    let data = unsafe { torch_capi::tcapi_tensor_data_ptr(t) };
    assert_ne!(data as *const u8, bytes.as_ptr());

    // Scribbling over the source must not reach the tensor.
    bytes.iter_mut().for_each(|b| *b = 0xff);
    let mut out = [0u8; 8];
    unsafe { torch_capi::tcapi_tensor_data_copy(t, out.as_mut_ptr() as *mut c_void, 8) };
    assert_eq!(f32::from_ne_bytes(out[0..4].try_into().unwrap()), 1.0);
    assert_eq!(f32::from_ne_bytes(out[4..8].try_into().unwrap()), 2.0);
    unsafe { torch_capi::tcapi_tensor_destroy(t) };
    drop(bytes);
}

#[test]
fn zero_dimensional_tensor_needs_no_shape() {
    let bytes = 2.5f64.to_ne_bytes();
    let t = unsafe {
        torch_capi::tcapi_tensor_from_data(
            bytes.as_ptr() as *const c_void,
            bytes.len(),
            ElementType::Float64.code() as i32,
            ptr::null(),
            0,
            0,
        )
    };
    assert!(!t.is_null());
    assert_eq!(unsafe { torch_capi::tcapi_tensor_ndimension(t) }, 0);
    unsafe { torch_capi::tcapi_tensor_destroy(t) };
}

#[test]
fn null_data_with_length_is_rejected() {
    let shape = [2i64];
    let t = unsafe {
        torch_capi::tcapi_tensor_from_data(ptr::null(), 8, 6, shape.as_ptr(), 1, 0)
    };
    assert!(t.is_null());
    assert_eq!(
        torch_capi::last_error_message().as_deref(),
        Some("null pointer passed as data")
    );
}

#[test]
fn destroy_null_is_safe() {
    unsafe {
        torch_capi::tcapi_tensor_destroy(ptr::null_mut());
        torch_capi::tcapi_tensor_destroy(ptr::null_mut());
    }
    assert!(torch_capi::tcapi_last_error().is_null());
}
