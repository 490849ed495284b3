//! `time_now` and the gated host bridge.

use chrono::Utc;

use super::CallEnv;
use crate::{interpreter::Machine, security::Capability, signal::RunResult, value::Value};

/// Seconds since the Unix epoch, as a float.
pub fn time_now(_env: &CallEnv) -> RunResult<Value> {
    let now = Utc::now();
    Ok(Value::Float(now.timestamp_micros() as f64 / 1_000_000.0))
}

/// The host-language bridge.
///
/// The capability gate is consulted first; this runtime then rejects the
/// call even when the gate allows it, because there is no embedded host
/// interpreter to hand the code to.
pub fn pyapi(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    machine
        .security
        .security_prompt(&Capability::PyApiAccess)
        .map_err(|denied| env.rt(denied.to_string()))?;

    let code = env.arg("code");
    let ns = env.arg("ns");
    if !matches!(code, Value::Str(_)) {
        return Err(env.rt("Code must be string"));
    }
    if !matches!(ns, Value::Map(_)) {
        return Err(env.rt("Namespace must be hashmap"));
    }
    Err(env.rt("pyapi is not supported by this runtime"))
}
