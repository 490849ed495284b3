//! `print` and `print_ret`.

use super::{CallEnv, emit_line};
use crate::{
    interpreter::{Machine, stringify},
    signal::RunResult,
    value::Value,
};

/// Stringifies the value through its display protocol and writes it to
/// stdout with a trailing newline. Returns null.
pub fn print(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let value = env.arg("value");
    let text = stringify(&value, env.span, env.ctx, machine)?;
    emit_line(machine, env, &text)?;
    Ok(Value::Null)
}

/// Returns the string form without writing anything.
pub fn print_ret(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let value = env.arg("value");
    let text = stringify(&value, env.span, env.ctx, machine)?;
    Ok(Value::str(text))
}
