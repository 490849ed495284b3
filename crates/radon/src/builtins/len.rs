//! The `len` builtin.

use super::CallEnv;
use crate::{
    error::ErrorKind,
    interpreter::{Machine, call_instance_hook},
    signal::RunResult,
    value::Value,
};

/// Dispatches on the value: arrays count elements, strings count characters,
/// instances go through their `__len__` (or `__exec_len__`) hook, builtin
/// instances through the host length hook.
pub fn len(machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let value = env.arg("value");
    match &value {
        Value::Array(elements) => Ok(Value::Int(elements.borrow().len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Map(map) => Ok(Value::Int(map.borrow().len() as i64)),
        Value::Instance(instance) => {
            for hook in ["__len__", "__exec_len__"] {
                if let Some(result) = call_instance_hook(instance, hook, vec![], env.span, env.ctx, machine) {
                    let length = result?;
                    return match length {
                        Value::Int(_) => Ok(length),
                        other => Err(env.tagged(
                            ErrorKind::TypeError,
                            format!("{hook} must return an integer, not '{}'", other.type_name()),
                        )),
                    };
                }
            }
            Err(no_len(env, &value))
        }
        Value::BuiltinInstance(instance) => {
            let length = instance.state.borrow().len();
            length.map(Value::Int).ok_or_else(|| no_len(env, &value))
        }
        _ => Err(no_len(env, &value)),
    }
}

fn no_len(env: &CallEnv, value: &Value) -> crate::signal::Signal {
    env.tagged(
        ErrorKind::TypeError,
        format!("Object of type \"{}\" has no len()", value.type_name()),
    )
}
