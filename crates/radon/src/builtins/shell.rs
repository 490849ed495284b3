//! Shell-facing builtins: `clear`, `license`, `credits`, `copyright`, `help`.

use std::fs;

use super::{CallEnv, emit, emit_line};
use crate::{error::ErrorKind, interpreter::Machine, run::base_dir, signal::RunResult, value::Value};

/// Clears the terminal with an ANSI escape instead of shelling out, so the
/// builtin stays portable and its output capturable.
pub fn clear(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    emit(machine, env, "\x1b[2J\x1b[H")?;
    Ok(Value::Null)
}

/// Prints the license text from the installation root.
pub fn license(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let text = fs::read_to_string(base_dir().join("LICENSE")).map_err(|_| env.rt("Failed to read LICENSE"))?;
    for line in text.lines() {
        emit_line(machine, env, line)?;
    }
    Ok(Value::Null)
}

pub fn credits(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    emit_line(machine, env, "Radon is developed and maintained by its contributors.")?;
    emit_line(machine, env, "See the project repository for the full list.")?;
    Ok(Value::Null)
}

pub fn copyright(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    emit_line(machine, env, "Copyright (c) Radon contributors.")?;
    emit_line(machine, env, "All rights reserved.")?;
    Ok(Value::Null)
}

/// Prints the object's self-documentation.
pub fn help(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let obj = env.arg("obj");
    if matches!(obj, Value::Null) {
        return Err(env.tagged(ErrorKind::TypeError, "Argument is null"));
    }
    emit_line(machine, env, &help_text(&obj))?;
    Ok(Value::Null)
}

/// The self-documentation hook: a short description of what the value is
/// and how to call it.
pub fn help_text(value: &Value) -> String {
    match value {
        Value::Builtin(builtin) => {
            format!("<built-in function {builtin}>\n  arguments: ({})", builtin.arg_names().join(", "))
        }
        Value::Function(func) => {
            let params: Vec<String> = func
                .arg_names
                .iter()
                .zip(&func.defaults)
                .map(|(name, default)| match default {
                    Some(value) => format!("{name}={}", value.repr_string()),
                    None => name.to_string(),
                })
                .collect();
            let mut text = format!("<function {}({})>", func.name, params.join(", "));
            if let Some(desc) = &func.desc {
                text.push('\n');
                text.push_str("  ");
                text.push_str(desc);
            }
            text
        }
        Value::BuiltinClass(class) => format!("{}\n  {}", value.repr_string(), class.doc),
        Value::BuiltinInstance(instance) => {
            format!("<{} instance>\n  {}", instance.class.name, instance.class.doc)
        }
        Value::Class(class) => format!("<class {}>", class.name),
        Value::Instance(instance) => format!("<{} instance>", instance.class.name),
        Value::Module(module) => format!("<module {}>", module.name),
        other => format!("{} (type {})", other.repr_string(), other.type_name()),
    }
}
