//! FFI bindings for the streak engine
//!
//! This module provides C-compatible functions for calling the engine from other languages.
//! All functions take a habits.dataset.v1 JSON snapshot as a C string (null-terminated)
//! and return a JSON streak report in allocated memory that must be freed by the caller
//! using `habits_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{streak_report_json, StreakQuery};
use crate::schema::local_today;
use crate::types::Periodicity;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Run a query against a dataset pointer, recording failures in LAST_ERROR
unsafe fn report_for(dataset_json: *const c_char, query: &StreakQuery) -> *mut c_char {
    let json_str = match cstr_to_string(dataset_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid dataset JSON string pointer");
            return ptr::null_mut();
        }
    };

    let today = local_today();
    match streak_report_json(&json_str, query, today) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Streak Queries
// ============================================================================

/// Longest streak across all habits, as a JSON report.
///
/// # Safety
/// - `dataset_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `habits_free_string`.
/// - Returns NULL on error; call `habits_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habits_max_streak(dataset_json: *const c_char) -> *mut c_char {
    clear_last_error();
    report_for(dataset_json, &StreakQuery::All)
}

/// Longest streak among habits of one periodicity (`daily` or `weekly`).
///
/// # Safety
/// - `dataset_json` and `periodicity` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `habits_free_string`.
/// - Returns NULL on error; call `habits_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habits_max_streak_for_periodicity(
    dataset_json: *const c_char,
    periodicity: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let periodicity = match cstr_to_string(periodicity) {
        Some(s) => s,
        None => {
            set_last_error("Invalid periodicity string pointer");
            return ptr::null_mut();
        }
    };

    let periodicity: Periodicity = match periodicity.parse() {
        Ok(p) => p,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    report_for(dataset_json, &StreakQuery::Periodicity(periodicity))
}

/// Longest streak of one named habit.
///
/// # Safety
/// - `dataset_json` and `name` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `habits_free_string`.
/// - Returns NULL on error; call `habits_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habits_max_streak_for_habit(
    dataset_json: *const c_char,
    name: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let name = match cstr_to_string(name) {
        Some(s) => s,
        None => {
            set_last_error("Invalid habit name string pointer");
            return ptr::null_mut();
        }
    };

    report_for(dataset_json, &StreakQuery::Habit(name))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by the habits_* functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a habits_* function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn habits_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next habits_* call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn habits_last_error() -> *const c_char {
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
pub unsafe extern "C" fn habits_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_dataset() -> CString {
        CString::new(
            r#"{
            "schema_version": "habits.dataset.v1",
            "habits": [
                {
                    "id": 1, "name": "Studying", "task": "10 hours per week", "periodicity": "weekly",
                    "created_at": "2021-11-01T06:00:00Z", "updated_at": "2021-11-01T06:00:00Z"
                },
                {
                    "id": 4, "name": "Waking up", "task": "Wake up at 5am", "periodicity": "daily",
                    "created_at": "2021-11-01T06:00:00Z", "updated_at": "2021-11-01T06:00:00Z"
                }
            ],
            "check_offs": [
                { "habit_id": 1, "date": "2021-11-01 06:23" },
                { "habit_id": 1, "date": "2021-11-11 19:34" },
                { "habit_id": 4, "date": "2021-11-02" },
                { "habit_id": 4, "date": "2021-11-03" },
                { "habit_id": 4, "date": "2021-11-04" }
            ]
        }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        habits_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_max_streak() {
        let dataset = sample_dataset();

        unsafe {
            let report = take_string(habits_max_streak(dataset.as_ptr()));
            assert_eq!(report["status"], "ok");
            assert_eq!(report["rows"][0]["name"], "Waking up");
            assert_eq!(report["rows"][0]["streak_count"], 3);
        }
    }

    #[test]
    fn test_ffi_queries() {
        let dataset = sample_dataset();
        let weekly = CString::new("weekly").unwrap();
        let name = CString::new("Studying").unwrap();

        unsafe {
            let report = take_string(habits_max_streak_for_periodicity(dataset.as_ptr(), weekly.as_ptr()));
            assert_eq!(report["query"], "periodicity:weekly");
            assert_eq!(report["rows"][0]["streak_count"], 2);

            let report = take_string(habits_max_streak_for_habit(dataset.as_ptr(), name.as_ptr()));
            assert_eq!(report["query"], "habit:Studying");
            assert_eq!(report["rows"][0]["periodicity"], "weekly");
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let dataset = sample_dataset();
        let monthly = CString::new("monthly").unwrap();
        let invalid_json = CString::new("not json").unwrap();

        unsafe {
            let result = habits_max_streak_for_periodicity(dataset.as_ptr(), monthly.as_ptr());
            assert!(result.is_null());
            let error = CStr::from_ptr(habits_last_error()).to_str().unwrap();
            assert!(error.contains("monthly"));

            let result = habits_max_streak(invalid_json.as_ptr());
            assert!(result.is_null());
            assert!(!habits_last_error().is_null());

            let result = habits_max_streak(ptr::null());
            assert!(result.is_null());

            let ok = habits_max_streak(dataset.as_ptr());
            assert!(habits_last_error().is_null());
            habits_free_string(ok);
        }
    }

    #[test]
    fn test_ffi_accepts_local_today() {
        let today = local_today().format("%Y-%m-%d").to_string();
        let dataset = CString::new(format!(
            r#"{{
            "habits": [{{
                "id": 1, "name": "Waking up", "periodicity": "daily",
                "created_at": "2021-11-01T06:00:00Z", "updated_at": "2021-11-01T06:00:00Z"
            }}],
            "check_offs": [{{ "habit_id": 1, "date": "{today}" }}]
        }}"#
        ))
        .unwrap();

        unsafe {
            let report = take_string(habits_max_streak(dataset.as_ptr()));
            assert_eq!(report["status"], "ok");
            assert_eq!(report["rows"][0]["streak_count"], 1);
        }
    }

    #[test]
    fn test_ffi_largest_habit_id_is_an_error() {
        let dataset = CString::new(
            r#"{
            "habits": [{
                "id": 9223372036854775807, "name": "Jogging", "periodicity": "weekly",
                "created_at": "2021-11-01T06:00:00Z", "updated_at": "2021-11-01T06:00:00Z"
            }]
        }"#,
        )
        .unwrap();

        unsafe {
            let result = habits_max_streak(dataset.as_ptr());
            assert!(result.is_null());
            let error = CStr::from_ptr(habits_last_error()).to_str().unwrap();
            assert!(error.contains("9223372036854775807"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = habits_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::VERSION);
        }
    }
}
