//! Type coercions: `int`, `float`, `str`, `bool`, `type`.

use super::CallEnv;
use crate::{
    interpreter::{Machine, stringify},
    signal::RunResult,
    value::Value,
};

pub fn int(env: &CallEnv) -> RunResult<Value> {
    match env.arg("value") {
        Value::Int(n) => Ok(Value::Int(n)),
        // Truncates toward zero.
        Value::Float(n) if n.is_finite() => Ok(Value::Int(n as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| env.rt("Could not convert to int")),
        _ => Err(env.rt("Could not convert to int")),
    }
}

pub fn float(env: &CallEnv) -> RunResult<Value> {
    match env.arg("value") {
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Float(n) => Ok(Value::Float(n)),
        Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(b)))),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| env.rt("Could not convert to float")),
        _ => Err(env.rt("Could not convert to float")),
    }
}

pub fn str(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let value = env.arg("value");
    let text = match &value {
        // Arrays stringify as the bracketed element list.
        Value::Array(_) => value.repr_string(),
        other => stringify(other, env.span, env.ctx, machine)?,
    };
    Ok(Value::str(text))
}

pub fn bool(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Bool(env.arg("value").is_true()))
}

pub fn type_(env: &CallEnv) -> RunResult<Value> {
    Ok(Value::Type(env.arg("value").type_name()))
}
