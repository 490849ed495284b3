//! The builtin class framework.
//!
//! A builtin class exposes a host object to Radon code: it has a name, a doc
//! string, a constructor spec, a method table and a set of operator hooks.
//! Instantiating one produces a `BuiltinInstance` wrapping fresh host state;
//! method lookup consults the class's static method table and binds the
//! receiver.
//!
//! Operator hooks are a trait (`HostOps`) with absent-by-default methods, so
//! each host object overrides only what it supports and everything else
//! falls back to the interpreter's default behavior.

mod builtins_object;
mod file_object;
mod json_object;
mod requests_object;
mod string_object;

use std::{cell::RefCell, rc::Rc};

pub use builtins_object::BuiltinsObject;
pub use file_object::FileObject;
pub use json_object::JsonObject;
pub use requests_object::RequestsObject;
pub use string_object::StringObject;

use crate::{
    builtins::CallEnv,
    function::check_and_populate_args,
    interpreter::Machine,
    position::Span,
    scope::{Context, SymbolTable},
    signal::RunResult,
    value::{BoundMethod, Value},
};

/// A host-implemented class exposed to Radon code.
#[derive(Debug)]
pub struct BuiltinClass {
    pub name: &'static str,
    pub doc: &'static str,
    pub kind: HostKind,
}

/// An instance of a builtin class: the class reference plus the host state.
#[derive(Debug)]
pub struct BuiltinInstance {
    pub class: Rc<BuiltinClass>,
    pub state: RefCell<HostObject>,
}

/// The host state of a builtin instance.
#[derive(Debug)]
pub enum HostObject {
    File(FileObject),
    String(StringObject),
    Json(JsonObject),
    Requests(RequestsObject),
    Builtins(BuiltinsObject),
}

impl HostObject {
    fn ops(&self) -> &dyn HostOps {
        match self {
            Self::File(o) => o,
            Self::String(o) => o,
            Self::Json(o) => o,
            Self::Requests(o) => o,
            Self::Builtins(o) => o,
        }
    }

    /// The `__string_display__` hook.
    pub fn display(&self) -> Option<String> {
        self.ops().display()
    }

    /// The `__len__` hook.
    pub fn len(&self) -> Option<i64> {
        self.ops().len()
    }

    /// The `__add__` hook.
    pub fn add(&self, other: &Value, span: &Span, ctx: &Rc<Context>) -> Option<RunResult<Value>> {
        self.ops().add(other, span, ctx)
    }
}

/// Operator hooks a host object may support.
///
/// Default implementations report the hook as absent; the interpreter then
/// applies its default behavior or fails with an illegal-operation error.
pub trait HostOps {
    fn display(&self) -> Option<String> {
        None
    }

    fn len(&self) -> Option<i64> {
        None
    }

    fn add(&self, _other: &Value, _span: &Span, _ctx: &Rc<Context>) -> Option<RunResult<Value>> {
        None
    }
}

/// Which host object a class constructs, and where its tables live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    File,
    String,
    Json,
    Requests,
    Builtins,
}

/// A constructor's argument spec.
pub struct CtorSpec {
    pub arg_names: &'static [&'static str],
    pub defaults: fn() -> Vec<Option<Value>>,
}

/// One entry in a builtin class's method table.
pub struct MethodSpec {
    pub name: &'static str,
    pub arg_names: &'static [&'static str],
    pub defaults: fn() -> Vec<Option<Value>>,
    pub handler: fn(&Rc<BuiltinInstance>, &mut Machine, &CallEnv) -> RunResult<Value>,
}

impl std::fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodSpec").field("name", &self.name).finish()
    }
}

/// A builtin-class method bound to its receiving instance.
#[derive(Debug)]
pub struct BoundBuiltinMethod {
    pub recv: Rc<BuiltinInstance>,
    pub spec: &'static MethodSpec,
}

impl HostKind {
    pub(crate) fn ctor_spec(self) -> CtorSpec {
        match self {
            Self::File => CtorSpec {
                arg_names: &["path", "mode"],
                defaults: || vec![None, Some(Value::str("r"))],
            },
            Self::String => CtorSpec {
                arg_names: &["value"],
                defaults: || vec![Some(Value::str(""))],
            },
            Self::Json | Self::Requests | Self::Builtins => CtorSpec {
                arg_names: &[],
                defaults: Vec::new,
            },
        }
    }

    pub(crate) fn methods(self) -> &'static [MethodSpec] {
        match self {
            Self::File => file_object::METHODS,
            Self::String => string_object::METHODS,
            Self::Json => json_object::METHODS,
            Self::Requests => requests_object::METHODS,
            Self::Builtins => builtins_object::METHODS,
        }
    }

    fn construct(self, env: &CallEnv) -> RunResult<HostObject> {
        match self {
            Self::File => Ok(HostObject::File(FileObject::construct(env)?)),
            Self::String => Ok(HostObject::String(StringObject::construct(env)?)),
            Self::Json => Ok(HostObject::Json(JsonObject)),
            Self::Requests => Ok(HostObject::Requests(RequestsObject::new())),
            Self::Builtins => Ok(HostObject::Builtins(BuiltinsObject)),
        }
    }
}

/// The five builtin classes installed into the global symbol table.
pub fn builtin_classes() -> Vec<Rc<BuiltinClass>> {
    vec![
        Rc::new(BuiltinClass {
            name: "File",
            doc: "Built-in file object supporting read, write and close.",
            kind: HostKind::File,
        }),
        Rc::new(BuiltinClass {
            name: "String",
            doc: "Built-in string manipulation object.",
            kind: HostKind::String,
        }),
        Rc::new(BuiltinClass {
            name: "Json",
            doc: "Built-in JSON encoder and decoder.",
            kind: HostKind::Json,
        }),
        Rc::new(BuiltinClass {
            name: "Requests",
            doc: "Built-in blocking HTTP client.",
            kind: HostKind::Requests,
        }),
        Rc::new(BuiltinClass {
            name: "builtins",
            doc: "Introspection over the installed global builtins.",
            kind: HostKind::Builtins,
        }),
    ]
}

/// Calls a builtin class: binds constructor arguments, builds fresh host
/// state, and wraps it in a `BuiltinInstance`.
pub fn instantiate(
    class: &Rc<BuiltinClass>,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
) -> RunResult<Value> {
    let spec = class.kind.ctor_spec();
    let env = bind_call(class.name, spec.arg_names, &(spec.defaults)(), args, kwargs, span, ctx)?;
    let env_ref = CallEnv {
        ctx: &env,
        span,
    };
    let state = class.kind.construct(&env_ref)?;
    Ok(Value::BuiltinInstance(Rc::new(BuiltinInstance {
        class: Rc::clone(class),
        state: RefCell::new(state),
    })))
}

/// Calls a bound builtin-class method.
pub fn call_bound_method(
    bound: &BoundBuiltinMethod,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    let spec = bound.spec;
    let env = bind_call(spec.name, spec.arg_names, &(spec.defaults)(), args, kwargs, span, ctx)?;
    let env_ref = CallEnv {
        ctx: &env,
        span,
    };
    (spec.handler)(&bound.recv, machine, &env_ref)
}

/// Looks a method up in the class's table and binds it to the receiver.
pub fn method_lookup(instance: &Rc<BuiltinInstance>, name: &str) -> Option<Value> {
    instance
        .class
        .kind
        .methods()
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| {
            Value::Method(Rc::new(BoundMethod::Builtin(BoundBuiltinMethod {
                recv: Rc::clone(instance),
                spec,
            })))
        })
}

/// The method names of a builtin class, for `dir`.
pub fn method_names(class: &BuiltinClass) -> impl Iterator<Item = &'static str> {
    class.kind.methods().iter().map(|spec| spec.name)
}

/// Creates the call's child context and binds arguments into it, using the
/// builtin arm of the call protocol (keyword arguments rejected).
fn bind_call(
    name: &str,
    arg_names: &[&'static str],
    defaults: &[Option<Value>],
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
) -> RunResult<Rc<Context>> {
    let table = Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(&ctx.symbol_table))));
    let child = Context::child(Rc::from(name), ctx, span.start.clone(), Rc::clone(&table));
    check_and_populate_args(name, arg_names, defaults, args, kwargs, true, &table, span, ctx)?;
    Ok(child)
}
