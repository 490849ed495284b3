#![doc = include_str!("../../../README.md")]

mod ast;
mod builtins;
mod classes;
mod error;
mod function;
mod interpreter;
mod io;
mod lexer;
mod parser;
mod position;
mod run;
mod scope;
mod security;
mod signal;
mod value;

pub use crate::{
    builtins::BuiltinFn,
    classes::{BuiltinClass, BuiltinInstance},
    error::{Error, ErrorKind, StackFrame},
    function::Function,
    interpreter::Machine,
    io::{CollectStringPrint, InputReader, NoPrint, PrintWriter, QueuedInput, StdInput, StdPrint},
    position::{Position, Span},
    run::{REDACTED, RunOutput, STDLIBS, base_dir, global_symbol_table, run, run_with_context},
    scope::{Context, SymbolTable},
    security::{Capability, PermissionDenied, SecurityGate},
    signal::{RunResult, Signal},
    value::{BoundMethod, Class, Instance, MapKey, Module, Value},
};
