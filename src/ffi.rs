//! FFI bindings for the biomarker progress engine
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `biomarker_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::classifier::classify;
use crate::error::EngineError;
use crate::evaluator::{evaluate_json, preview_json};
use crate::progress::compare;
use crate::registry::BiomarkerRegistry;

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

/// Hand a result back across the boundary, recording the error on failure
fn finish(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn classify_json(name: &str, value: f64) -> Result<String, EngineError> {
    let def = BiomarkerRegistry::standard().definition_for(name)?;
    Ok(serde_json::to_string(&classify(def, Some(value)))?)
}

fn compare_json(name: &str, baseline: f64, retest: f64) -> Result<String, EngineError> {
    let def = BiomarkerRegistry::standard().definition_for(name)?;
    Ok(serde_json::to_string(&compare(def, Some(baseline), Some(retest)))?)
}

// ============================================================================
// Evaluation API
// ============================================================================

/// Evaluate baseline and retest JSON objects and return the report JSON.
///
/// # Safety
/// - `baseline_json` and `retest_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `biomarker_free_string`.
/// - Returns NULL on error; call `biomarker_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn biomarker_evaluate(
    baseline_json: *const c_char,
    retest_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let baseline = match cstr_to_string(baseline_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid baseline string pointer");
            return ptr::null_mut();
        }
    };

    let retest = match cstr_to_string(retest_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid retest string pointer");
            return ptr::null_mut();
        }
    };

    finish(evaluate_json(&baseline, &retest))
}

/// Per-biomarker rows for possibly incomplete input, as a JSON array.
///
/// # Safety
/// - `baseline_json` and `retest_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `biomarker_free_string`.
/// - Returns NULL on error; call `biomarker_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn biomarker_preview(
    baseline_json: *const c_char,
    retest_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let (baseline, retest) = match (cstr_to_string(baseline_json), cstr_to_string(retest_json)) {
        (Some(b), Some(r)) => (b, r),
        _ => {
            set_last_error("Invalid measurement string pointer");
            return ptr::null_mut();
        }
    };

    finish(preview_json(&baseline, &retest))
}

/// Classify a single value for a named biomarker, as JSON.
///
/// # Safety
/// - `name` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `biomarker_free_string`.
/// - Returns NULL on error; call `biomarker_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn biomarker_classify(name: *const c_char, value: f64) -> *mut c_char {
    clear_last_error();

    let name = match cstr_to_string(name) {
        Some(s) => s,
        None => {
            set_last_error("Invalid name string pointer");
            return ptr::null_mut();
        }
    };

    finish(classify_json(&name, value))
}

/// Compare a baseline and retest value for a named biomarker, as JSON.
///
/// # Safety
/// - `name` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `biomarker_free_string`.
/// - Returns NULL on error; call `biomarker_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn biomarker_compare(
    name: *const c_char,
    baseline: f64,
    retest: f64,
) -> *mut c_char {
    clear_last_error();

    let name = match cstr_to_string(name) {
        Some(s) => s,
        None => {
            set_last_error("Invalid name string pointer");
            return ptr::null_mut();
        }
    };

    finish(compare_json(&name, baseline, retest))
}

/// The standard registry as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `biomarker_free_string`.
#[no_mangle]
pub unsafe extern "C" fn biomarker_registry_json() -> *mut c_char {
    clear_last_error();
    finish(BiomarkerRegistry::standard().to_json())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn biomarker_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn biomarker_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn biomarker_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
