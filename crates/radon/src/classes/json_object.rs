//! The `Json` builtin class: encode and decode JSON text.

use std::{cell::RefCell, rc::Rc};

use super::{BuiltinInstance, HostOps, MethodSpec};
use crate::{
    builtins::CallEnv,
    interpreter::Machine,
    signal::RunResult,
    value::{MapKey, Value},
};

/// Stateless host object; the methods are pure transformations.
#[derive(Debug)]
pub struct JsonObject;

impl HostOps for JsonObject {}

fn one_required() -> Vec<Option<Value>> {
    vec![None]
}

pub(crate) static METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "loads",
        arg_names: &["string"],
        defaults: one_required,
        handler: loads,
    },
    MethodSpec {
        name: "dumps",
        arg_names: &["value"],
        defaults: one_required,
        handler: dumps,
    },
    MethodSpec {
        name: "is_valid",
        arg_names: &["string"],
        defaults: one_required,
        handler: is_valid,
    },
];

fn loads(_recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let Value::Str(text) = env.arg("string") else {
        return Err(env.rt("Json.loads takes a string"));
    };
    let parsed: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| env.rt(format!("Invalid JSON: {e}")))?;
    Ok(json_to_value(parsed))
}

fn dumps(_recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let json = to_json(&env.arg("value"), env)?;
    let text = serde_json::to_string(&json).map_err(|e| env.rt(format!("Could not encode JSON: {e}")))?;
    Ok(Value::str(text))
}

fn is_valid(_recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let Value::Str(text) = env.arg("string") else {
        return Err(env.rt("Json.is_valid takes a string"));
    };
    Ok(Value::Bool(serde_json::from_str::<serde_json::Value>(&text).is_ok()))
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(elements) => Value::array(elements.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(entries) => {
            let map = entries
                .into_iter()
                .map(|(key, value)| (MapKey::Str(Rc::from(key.as_str())), json_to_value(value)))
                .collect();
            Value::Map(Rc::new(RefCell::new(map)))
        }
    }
}

pub(crate) fn to_json(value: &Value, env: &CallEnv) -> RunResult<serde_json::Value> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::from(*n)),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| env.rt("Non-finite number is not JSON serializable")),
        Value::Str(s) => Ok(serde_json::Value::String(s.to_string())),
        Value::Array(elements) => {
            let mut out = Vec::with_capacity(elements.borrow().len());
            for element in elements.borrow().iter() {
                out.push(to_json(element, env)?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Map(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.borrow().iter() {
                let key = match key {
                    MapKey::Str(s) => s.to_string(),
                    MapKey::Int(n) => n.to_string(),
                    MapKey::Bool(b) => b.to_string(),
                    MapKey::Null => "null".to_owned(),
                };
                out.insert(key, to_json(entry, env)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        other => Err(env.rt(format!("Object of type \"{}\" is not JSON serializable", other.type_name()))),
    }
}
