//! Recording adapters that write avatar downloads to cassettes.

pub mod avatar_source;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::cassette::recorder::CassetteRecorder;

/// Append one call to the cassette as `{"Ok": value}` or `{"Err": message}`.
///
/// A call that cannot be serialized is skipped with a warning; the live
/// result is returned to the caller either way.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let envelope = match result {
        Ok(value) => serde_json::to_value(value).map(|inner| json!({ "Ok": inner })),
        Err(e) => Ok(json!({ "Err": e.to_string() })),
    };
    let (input, output): (Value, Value) = match (serde_json::to_value(input), envelope) {
        (Ok(input), Ok(output)) => (input, output),
        (Err(e), _) | (_, Err(e)) => {
            warn!(port, method, error = %e, "skipping unserializable interaction");
            return;
        }
    };

    match recorder.lock() {
        Ok(mut guard) => guard.record(port, method, input, output),
        Err(e) => warn!(port, method, error = %e, "cassette recorder lock poisoned"),
    }
}
