//! FFI bindings for flowfit
//!
//! This module provides C-compatible functions for calling flowfit from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `flowfit_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::ConvertOptions;
use crate::pipeline::convert_json;

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

// ============================================================================
// Conversion
// ============================================================================

/// Repair a JSON message list and return the corrected list as JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `options_json` may be NULL for default options; otherwise it must be a
///   valid null-terminated C string holding a JSON options object.
/// - Returns a newly allocated string that must be freed with `flowfit_free_string`.
/// - Returns NULL on error; call `flowfit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn flowfit_convert_json(
    json: *const c_char,
    options_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let options = if options_json.is_null() {
        ConvertOptions::default()
    } else {
        let options_str = match cstr_to_string(options_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid options string pointer");
                return ptr::null_mut();
            }
        };
        match ConvertOptions::from_json(&options_str) {
            Ok(options) => options,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match convert_json(&json_str, options) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by flowfit.
///
/// # Safety
/// - `ptr` must have been returned by a flowfit function, or be NULL.
/// - Must not be called twice on the same pointer.
#[no_mangle]
pub unsafe extern "C" fn flowfit_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next flowfit call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn flowfit_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the flowfit library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn flowfit_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
