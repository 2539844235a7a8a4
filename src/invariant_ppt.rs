//! Control-plane invariants and the record of which ones were checked.
//!
//! Engine operations call [`assert_invariant`] with one of the ids below.
//! With the `ppt` feature the id is remembered, so a test can prove with
//! [`contract_test`] that an operation actually evaluated its invariant.
//! Without the feature only the condition is checked.

// IMPORTANT: Never call into this module from the render path; it locks and allocates.

#[cfg(feature = "ppt")]
use lazy_static::lazy_static;
#[cfg(feature = "ppt")]
use std::collections::HashSet;
#[cfg(feature = "ppt")]
use std::sync::Mutex;

/// Every cutoff-derived coefficient is finite and in `(0, 1]`.
pub const COEFFS_FINITE: u32 = 1;
/// The volume the render plane will read lies in `[0, 1]`.
pub const VOLUME_CLAMPED: u32 = 2;
/// A type change advances the epoch and zeroes filter memory.
pub const TYPE_SWITCH_RESETS_FILTERS: u32 = 3;
/// After `stop` the type is off and the device reports an idle transport.
pub const STOP_SETS_OFF: u32 = 4;
/// The device holds at most one render source at a time.
pub const ATTACH_ONCE: u32 = 5;
/// The device transport is idle when the render source is released.
pub const TEARDOWN_ORDERED: u32 = 6;

/// Symbolic name of an invariant id, for failure messages.
pub fn invariant_name(id: u32) -> &'static str {
    match id {
        COEFFS_FINITE => "COEFFS_FINITE",
        VOLUME_CLAMPED => "VOLUME_CLAMPED",
        TYPE_SWITCH_RESETS_FILTERS => "TYPE_SWITCH_RESETS_FILTERS",
        STOP_SETS_OFF => "STOP_SETS_OFF",
        ATTACH_ONCE => "ATTACH_ONCE",
        TEARDOWN_ORDERED => "TEARDOWN_ORDERED",
        _ => "UNKNOWN",
    }
}

fn violation(id: u32, message: &str, context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!("{} violated: {} [{}]", invariant_name(id), message, ctx),
        None => format!("{} violated: {}", invariant_name(id), message),
    }
}

#[cfg(feature = "ppt")]
lazy_static! {
    static ref CHECKED: Mutex<HashSet<u32>> = Mutex::new(HashSet::new());
}

/// Panic with a named message when `condition` is false; otherwise record `id`.
#[cfg(feature = "ppt")]
pub(crate) fn assert_invariant(id: u32, condition: bool, message: &str, context: Option<&str>) {
    if !condition {
        let msg = violation(id, message, context);
        tracing::error!(invariant = id, "{}", msg);
        panic!("{}", msg);
    }
    // A poisoned log only loses bookkeeping.
    if let Ok(mut checked) = CHECKED.lock() {
        checked.insert(id);
    }
}

#[cfg(not(feature = "ppt"))]
pub(crate) fn assert_invariant(id: u32, condition: bool, message: &str, context: Option<&str>) {
    if !condition {
        panic!("{}", violation(id, message, context));
    }
}

/// Panic unless every id in `required` has been checked since the last clear.
#[cfg(feature = "ppt")]
pub fn contract_test(test_name: &str, required: &[u32]) {
    let unchecked: Vec<&str> = {
        let checked = CHECKED.lock().unwrap_or_else(|e| e.into_inner());
        required
            .iter()
            .filter(|id| !checked.contains(id))
            .map(|&id| invariant_name(id))
            .collect()
    };
    if !unchecked.is_empty() {
        panic!("contract '{}' never checked {:?}", test_name, unchecked);
    }
}

#[cfg(not(feature = "ppt"))]
pub fn contract_test(_test_name: &str, _required: &[u32]) {}

#[cfg(feature = "ppt")]
pub fn clear_invariant_log() {
    CHECKED.lock().unwrap_or_else(|e| e.into_inner()).clear();
}

#[cfg(not(feature = "ppt"))]
pub fn clear_invariant_log() {}
