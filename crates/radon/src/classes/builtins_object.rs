//! The `builtins` class: introspection over the installed globals.

use std::rc::Rc;

use super::{BuiltinInstance, HostOps, MethodSpec};
use crate::{
    builtins::{CallEnv, shell::help_text},
    interpreter::Machine,
    run::global_symbol_table,
    signal::RunResult,
    value::Value,
};

/// Stateless host object reading the global symbol table on demand.
#[derive(Debug)]
pub struct BuiltinsObject;

impl HostOps for BuiltinsObject {}

fn one_required() -> Vec<Option<Value>> {
    vec![None]
}

fn no_defaults() -> Vec<Option<Value>> {
    Vec::new()
}

pub(crate) static METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "names",
        arg_names: &[],
        defaults: no_defaults,
        handler: names,
    },
    MethodSpec {
        name: "has",
        arg_names: &["name"],
        defaults: one_required,
        handler: has,
    },
    MethodSpec {
        name: "doc",
        arg_names: &["name"],
        defaults: one_required,
        handler: doc,
    },
];

/// All names installed in the global symbol table, sorted.
fn names(_recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    let globals = global_symbol_table();
    let mut all: Vec<String> = globals.borrow().entries().map(|(name, _)| name.to_string()).collect();
    all.sort_unstable();
    Ok(Value::array(all.into_iter().map(Value::str).collect()))
}

fn has(_recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let Value::Str(name) = env.arg("name") else {
        return Err(env.rt("Name must be a string"));
    };
    Ok(Value::Bool(global_symbol_table().borrow().contains(&name)))
}

/// The self-documentation of a global, by name.
fn doc(_recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let Value::Str(name) = env.arg("name") else {
        return Err(env.rt("Name must be a string"));
    };
    let value = global_symbol_table()
        .borrow()
        .get_local(&name)
        .ok_or_else(|| env.rt(format!("No builtin named '{name}'")))?;
    Ok(Value::str(help_text(&value)))
}
