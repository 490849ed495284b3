//! Structural predicates on the value variant.

use super::CallEnv;
use crate::{signal::RunResult, value::Value};

pub fn is_num(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Int(_) | Value::Float(_))))
}

pub fn is_int(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Int(_))))
}

pub fn is_float(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Float(_))))
}

pub fn is_str(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Str(_))))
}

pub fn is_bool(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Bool(_))))
}

pub fn is_array(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Array(_))))
}

/// True for every callable: user functions, builtins and bound methods.
pub fn is_fun(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(
        env.arg("value"),
        Value::Function(_) | Value::Builtin(_) | Value::Method(_)
    )))
}

pub fn is_null(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(matches!(env.arg("value"), Value::Null)))
}
