//! FFI bindings for fertility-insight
//!
//! This module provides C-compatible functions for calling the estimator and the
//! assistant from other languages. All functions use C strings (null-terminated)
//! and return allocated memory that must be freed by the caller using
//! `fertility_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::InsightConfig;
use crate::pipeline::{estimate_json, report_json, FertilityProcessor};
use crate::types::{CycleProfile, FertilityEstimate};
use crate::wearable::WearableParser;

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

/// Read a required argument, recording an error naming it when the pointer is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

/// Read an optional argument: NULL means absent, a non-NULL invalid pointer is an error
unsafe fn optional_arg(ptr: *const c_char, name: &str) -> Result<Option<String>, ()> {
    if ptr.is_null() {
        return Ok(None);
    }
    required_arg(ptr, name).map(Some).ok_or(())
}

// ============================================================================
// Stateless API
// ============================================================================

/// Estimate the fertile window from a profile JSON.
///
/// # Safety
/// - `profile_json` must be a valid null-terminated C string.
/// - `wearable_json` is either NULL or a valid null-terminated C string holding
///   a JSON array of wearable records.
/// - Returns a newly allocated string that must be freed with `fertility_free_string`.
/// - Returns NULL on error; call `fertility_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fertility_estimate_json(
    profile_json: *const c_char,
    wearable_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(profile) = required_arg(profile_json, "profile JSON") else {
        return ptr::null_mut();
    };
    let Ok(wearable) = optional_arg(wearable_json, "wearable JSON") else {
        return ptr::null_mut();
    };

    match estimate_json(&profile, wearable.as_deref()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Build the full fertility report from a profile JSON.
///
/// # Safety
/// - Same contract as `fertility_estimate_json`.
#[no_mangle]
pub unsafe extern "C" fn fertility_report_json(
    profile_json: *const c_char,
    wearable_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(profile) = required_arg(profile_json, "profile JSON") else {
        return ptr::null_mut();
    };
    let Ok(wearable) = optional_arg(wearable_json, "wearable JSON") else {
        return ptr::null_mut();
    };

    match report_json(&profile, wearable.as_deref()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a FertilityProcessor
pub struct FertilityProcessorHandle {
    processor: FertilityProcessor,
}

/// Create a processor configured from the environment.
///
/// Without an API key the processor still works; chat falls back to canned replies
/// and insights report an error.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `fertility_processor_free`.
/// - Returns NULL when the environment configuration is invalid.
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_new() -> *mut FertilityProcessorHandle {
    clear_last_error();

    match InsightConfig::from_env() {
        Ok(config) => {
            let processor = FertilityProcessor::from_config(&config);
            Box::into_raw(Box::new(FertilityProcessorHandle { processor }))
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fertility_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_free(processor: *mut FertilityProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Generate free-form insights for a profile.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fertility_processor_new`.
/// - `profile_json` must be a valid null-terminated C string.
/// - `wearable_json` is either NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `fertility_free_string`.
/// - Returns NULL on error (including when text generation is unavailable).
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_insights(
    processor: *mut FertilityProcessorHandle,
    profile_json: *const c_char,
    wearable_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(profile_str) = required_arg(profile_json, "profile JSON") else {
        return ptr::null_mut();
    };
    let Ok(wearable_str) = optional_arg(wearable_json, "wearable JSON") else {
        return ptr::null_mut();
    };

    let profile = match CycleProfile::from_json(&profile_str) {
        Ok(p) => p,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    let wearable = match wearable_str.as_deref().map(WearableParser::parse_array).transpose() {
        Ok(w) => w,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match handle.processor.insights(&profile, wearable.as_ref()) {
        Ok(text) => string_to_cstr(&text),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Send one chat message and return the reply as JSON (`{"content", "source"}`).
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fertility_processor_new`.
/// - `input` and `profile_json` must be valid null-terminated C strings.
/// - `estimate_json` is either NULL or a valid null-terminated C string holding
///   an estimate previously returned by `fertility_estimate_json`.
/// - Returns a newly allocated string that must be freed with `fertility_free_string`.
/// - Returns NULL on error; call `fertility_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_chat(
    processor: *mut FertilityProcessorHandle,
    input: *const c_char,
    profile_json: *const c_char,
    estimate_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(input) = required_arg(input, "input") else {
        return ptr::null_mut();
    };
    let Some(profile_str) = required_arg(profile_json, "profile JSON") else {
        return ptr::null_mut();
    };
    let Ok(estimate_str) = optional_arg(estimate_json, "estimate JSON") else {
        return ptr::null_mut();
    };

    let profile = match CycleProfile::from_json(&profile_str) {
        Ok(p) => p,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    let estimate: Option<FertilityEstimate> =
        match estimate_str.as_deref().map(serde_json::from_str).transpose() {
            Ok(e) => e,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        };

    let reply = handle.processor.chat(&input, &profile, estimate.as_ref());
    match serde_json::to_string(&reply) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save the processor's chat session to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fertility_processor_new`.
/// - Returns a newly allocated string that must be freed with `fertility_free_string`.
/// - Returns NULL on error; call `fertility_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_save_session(
    processor: *mut FertilityProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_session() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load a chat session from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fertility_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `fertility_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_load_session(
    processor: *mut FertilityProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return -1;
    };

    match handle.processor.load_session(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Clear the processor's chat history.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `fertility_processor_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn fertility_processor_clear_chat(processor: *mut FertilityProcessorHandle) {
    if let Some(handle) = processor.as_mut() {
        handle.processor.session_mut().clear();
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by fertility-insight functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a `fertility_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn fertility_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next `fertility_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn fertility_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn fertility_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_profile_json() -> CString {
        CString::new(r#"{"startDate": "2024-01-01", "cycleLength": 28, "stressLevel": 6}"#).unwrap()
    }

    fn sample_wearable_json() -> CString {
        CString::new(
            r#"[
                {"date": "2024-01-01", "BBT": 97.2},
                {"date": "2024-01-02", "BBT": 97.9},
                {"date": "2024-01-03", "BBT": 97.4}
            ]"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        fertility_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_estimate_json() {
        let profile = sample_profile_json();

        unsafe {
            let json = take_string(fertility_estimate_json(profile.as_ptr(), ptr::null()));
            let estimate: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(estimate["ovulation_date"], "2024-01-12");
            assert!(estimate.get("wearable").is_none());
        }
    }

    #[test]
    fn test_ffi_estimate_with_wearable() {
        let profile = sample_profile_json();
        let wearable = sample_wearable_json();

        unsafe {
            let json = take_string(fertility_estimate_json(profile.as_ptr(), wearable.as_ptr()));
            let estimate: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(estimate["ovulation_date"], "2024-01-02");
            assert_eq!(estimate["window_extension_days"], 0);
        }
    }

    #[test]
    fn test_ffi_report_json() {
        let profile = sample_profile_json();

        unsafe {
            let json = take_string(fertility_report_json(profile.as_ptr(), ptr::null()));
            let report: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(report["producer"]["name"], crate::PRODUCER_NAME);
            assert!(report["advisories"].as_array().is_some());
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        let profile = sample_profile_json();
        let input = CString::new("Any tips for sleep?").unwrap();

        unsafe {
            let processor = Box::into_raw(Box::new(FertilityProcessorHandle {
                processor: FertilityProcessor::new(),
            }));

            let reply = take_string(fertility_processor_chat(
                processor,
                input.as_ptr(),
                profile.as_ptr(),
                ptr::null(),
            ));
            let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
            assert_eq!(reply["source"], "fallback");

            let insights = fertility_processor_insights(processor, profile.as_ptr(), ptr::null());
            assert!(insights.is_null());
            assert!(!fertility_last_error().is_null());

            let saved = fertility_processor_save_session(processor);
            assert!(!saved.is_null());

            let processor2 = Box::into_raw(Box::new(FertilityProcessorHandle {
                processor: FertilityProcessor::new(),
            }));
            assert_eq!(fertility_processor_load_session(processor2, saved), 0);
            assert_eq!((*processor2).processor.session().len(), 2);

            fertility_processor_clear_chat(processor2);
            assert!((*processor2).processor.session().is_empty());

            fertility_free_string(saved);
            fertility_processor_free(processor);
            fertility_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = fertility_estimate_json(invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = fertility_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            assert!(fertility_estimate_json(ptr::null(), ptr::null()).is_null());
            let error = CStr::from_ptr(fertility_last_error()).to_str().unwrap();
            assert_eq!(error, "Invalid profile JSON string pointer");

            let long_cycle =
                CString::new(r#"{"startDate": "2024-01-01", "cycleLength": 4000000000}"#).unwrap();
            assert!(fertility_estimate_json(long_cycle.as_ptr(), ptr::null()).is_null());
            let error = CStr::from_ptr(fertility_last_error()).to_str().unwrap();
            assert!(error.starts_with("Invalid profile"));

            assert!(fertility_processor_save_session(ptr::null_mut()).is_null());
            assert_eq!(fertility_processor_load_session(ptr::null_mut(), ptr::null()), -1);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = fertility_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::INSIGHT_VERSION);
        }
    }
}
