//! The `dir` builtin: sorted classification of an object's symbols.

use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use super::CallEnv;
use crate::{classes, error::ErrorKind, scope::SymbolTable, signal::RunResult, value::Value};

#[derive(Default)]
struct Partition {
    variables: BTreeSet<String>,
    functions: BTreeSet<String>,
    classes: BTreeSet<String>,
    builtin_class_functions: BTreeSet<String>,
}

/// Classifies the symbol-table entries of a module, class or instance as
/// variables, functions, classes and builtin-class functions, each group
/// sorted lexicographically. The reserved names `true`, `false` and `null`
/// are excluded, and members of builtin instances are flattened into the
/// output.
pub fn dir(env: &CallEnv) -> RunResult<Value> {
    let obj = env.arg("obj");
    let mut partition = Partition::default();
    match &obj {
        Value::Module(module) => collect_table(&module.symbol_table, &mut partition),
        Value::Class(class) => collect_table(&class.symbol_table, &mut partition),
        Value::Instance(instance) => collect_table(&instance.symbol_table, &mut partition),
        Value::BuiltinClass(class) => {
            partition
                .builtin_class_functions
                .extend(classes::method_names(class).map(str::to_owned));
        }
        Value::BuiltinInstance(instance) => {
            partition
                .builtin_class_functions
                .extend(classes::method_names(&instance.class).map(str::to_owned));
        }
        _ => {
            return Err(env.tagged(ErrorKind::TypeError, "Argument must be a module or class"));
        }
    }

    let Partition {
        variables,
        functions,
        classes,
        builtin_class_functions,
    } = partition;
    let names = variables
        .into_iter()
        .chain(functions)
        .chain(classes)
        .chain(builtin_class_functions)
        .map(Value::str)
        .collect();
    Ok(Value::array(names))
}

fn collect_table(table: &Rc<RefCell<SymbolTable>>, partition: &mut Partition) {
    for (name, value) in table.borrow().entries() {
        match value {
            Value::Function(_) | Value::Method(_) => {
                partition.functions.insert(name.to_string());
            }
            Value::Class(_) | Value::BuiltinClass(_) => {
                partition.classes.insert(name.to_string());
            }
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Array(_)
            | Value::Map(_) => {
                if !matches!(name.as_ref(), "true" | "false" | "null") {
                    partition.variables.insert(name.to_string());
                }
            }
            Value::BuiltinInstance(instance) => {
                partition
                    .builtin_class_functions
                    .extend(classes::method_names(&instance.class).map(str::to_owned));
            }
            // Global builtin functions, types and modules are not listed.
            Value::Builtin(_) | Value::Type(_) | Value::Instance(_) | Value::Module(_) => {}
        }
    }
}
