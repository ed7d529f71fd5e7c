//! FFI bindings for trip scoring
//!
//! This module provides C-compatible functions for calling the scorer from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `tripscore_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{score_chunks_json, validate_chunks_json};
use crate::ENGINE_VERSION;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn run_json_call(
    json: *const c_char,
    call: fn(String) -> Result<String, crate::ScoreError>,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match call(json_str) {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Score a trip given as a JSON array of chunks and return the report JSON.
///
/// # Safety
/// - `chunks_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tripscore_free_string`.
/// - Returns NULL on error; call `tripscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tripscore_score_json(chunks_json: *const c_char) -> *mut c_char {
    run_json_call(chunks_json, score_chunks_json)
}

/// Run only the validity gate and return the verdict JSON.
///
/// # Safety
/// Same contract as `tripscore_score_json`.
#[no_mangle]
pub unsafe extern "C" fn tripscore_validate_json(chunks_json: *const c_char) -> *mut c_char {
    run_json_call(chunks_json, validate_chunks_json)
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a static string that is valid until the next
///   scoring call on the same thread.
/// - Returns NULL if no error has occurred.
/// - Do NOT free the returned pointer.
#[no_mangle]
pub unsafe extern "C" fn tripscore_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string allocated by this library.
///
/// # Safety
/// - `s` must have been returned by a tripscore function, or be NULL.
/// - Each string must only be freed once.
#[no_mangle]
pub unsafe extern "C" fn tripscore_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the engine version. The returned string must be freed with `tripscore_free_string`.
#[no_mangle]
pub extern "C" fn tripscore_version() -> *mut c_char {
    string_to_cstr(ENGINE_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::steady_trip;

    #[test]
    fn test_ffi_score_roundtrip() {
        let chunks = serde_json::to_string(&steady_trip(20, 30.0).chunks).unwrap();
        let input = CString::new(chunks).unwrap();

        unsafe {
            let result = tripscore_score_json(input.as_ptr());
            assert!(!result.is_null());
            assert!(tripscore_last_error().is_null());

            let output = CStr::from_ptr(result).to_str().unwrap().to_string();
            let report: serde_json::Value = serde_json::from_str(&output).unwrap();
            assert_eq!(report["result"]["total_score"], 10.0);

            tripscore_free_string(result);
        }
    }

    #[test]
    fn test_ffi_validate() {
        let input = CString::new("[]").unwrap();

        unsafe {
            let result = tripscore_validate_json(input.as_ptr());
            assert!(!result.is_null());

            let output = CStr::from_ptr(result).to_str().unwrap();
            assert!(output.contains("too_short_distance"));

            tripscore_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not valid json").unwrap();

        unsafe {
            let result = tripscore_score_json(invalid.as_ptr());
            assert!(result.is_null());

            let error = tripscore_last_error();
            assert!(!error.is_null());
            let message = CStr::from_ptr(error).to_str().unwrap();
            assert!(message.contains("Failed to parse trip chunks"));
        }
    }

    #[test]
    fn test_ffi_null_pointer() {
        unsafe {
            let result = tripscore_score_json(ptr::null());
            assert!(result.is_null());
            assert!(!tripscore_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        let version = tripscore_version();
        assert!(!version.is_null());

        unsafe {
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, ENGINE_VERSION);
            tripscore_free_string(version);
        }
    }
}
