//! `input` and `input_int`: blocking stdin reads.

use super::{CallEnv, emit, emit_line};
use crate::{
    interpreter::{Machine, stringify},
    signal::RunResult,
    value::Value,
};

/// Writes the prompt, then reads one line from stdin.
pub fn input(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let prompt = env.arg("value");
    let prompt = stringify(&prompt, env.span, env.ctx, machine)?;
    emit(machine, env, &prompt)?;
    let line = machine
        .stdin
        .read_line()
        .map_err(|e| env.rt(format!("I/O error: {e}")))?;
    Ok(Value::str(line))
}

/// Reads lines until one parses as an integer, re-prompting on failure.
pub fn input_int(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    loop {
        let line = machine
            .stdin
            .read_line()
            .map_err(|e| env.rt(format!("I/O error: {e}")))?;
        match line.trim().parse::<i64>() {
            Ok(number) => return Ok(Value::Int(number)),
            Err(_) => {
                emit_line(machine, env, &format!("'{line}' must be an integer. Try again!"))?;
            }
        }
    }
}
