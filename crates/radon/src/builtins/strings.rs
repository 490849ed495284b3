//! String helpers mirroring the array ones.

use std::rc::Rc;

use super::CallEnv;
use crate::{error::ErrorKind, signal::RunResult, value::Value};

fn expect_string(env: &CallEnv, value: &Value, what: &str) -> RunResult<Rc<str>> {
    match value {
        Value::Str(s) => Ok(Rc::clone(s)),
        _ => Err(env.rt(format!("{what} must be string"))),
    }
}

pub fn str_len(env: &CallEnv) -> RunResult<Value> {
    let string = expect_string(env, &env.arg("string"), "Argument")?;
    Ok(Value::Int(string.chars().count() as i64))
}

/// Returns the character index of the first occurrence of `value`, or `-1`.
pub fn str_find(env: &CallEnv) -> RunResult<Value> {
    let string = expect_string(env, &env.arg("string"), "First argument")?;
    let needle = expect_string(env, &env.arg("value"), "Second argument")?;
    let index = string
        .find(needle.as_ref())
        .map_or(-1, |byte_offset| string[..byte_offset].chars().count() as i64);
    Ok(Value::Int(index))
}

pub fn str_get(env: &CallEnv) -> RunResult<Value> {
    let string = expect_string(env, &env.arg("string"), "First argument")?;
    let index = match &env.arg("index") {
        Value::Int(n) => *n,
        Value::Float(n) => *n as i64,
        _ => return Err(env.rt("Second argument must be number")),
    };
    let count = string.chars().count() as i64;
    let actual = if index < 0 { index + count } else { index };
    string
        .chars()
        .nth(usize::try_from(actual).unwrap_or(usize::MAX))
        .map(|c| Value::str(c.to_string()))
        .ok_or_else(|| env.tagged(ErrorKind::IndexError, format!("Index {index} out of bounds")))
}
