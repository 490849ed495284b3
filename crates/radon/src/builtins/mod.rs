//! The builtin function registry.
//!
//! Each builtin declares its name, argument names and defaults in one static
//! table (`arg_names`/`defaults`) and dispatches through an explicit match in
//! `BuiltinFn::call`. Implementations live in one submodule per concern
//! group.

mod arrays;
mod casts;
mod dir;
mod input;
mod len;
mod misc;
mod predicates;
mod print;
mod require;
pub(crate) mod shell;
mod strings;

use std::rc::Rc;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    error::{Error, ErrorKind},
    interpreter::Machine,
    position::Span,
    scope::Context,
    signal::{RunResult, Signal},
    value::Value,
};

/// Every builtin function installed into the global symbol table.
///
/// The strum-serialized name (snake_case) is the global identifier, e.g.
/// `PrintRet` -> `print_ret`. `cls` is registered as an alias of `Clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinFn {
    Print,
    PrintRet,
    Input,
    InputInt,
    Clear,
    Require,
    Exit,
    Len,
    IsNum,
    IsInt,
    IsFloat,
    IsStr,
    IsBool,
    IsArray,
    IsFun,
    IsNull,
    ArrAppend,
    ArrPop,
    ArrExtend,
    ArrLen,
    ArrChunk,
    ArrGet,
    StrLen,
    StrFind,
    StrGet,
    Int,
    Float,
    Str,
    Bool,
    Type,
    Pyapi,
    TimeNow,
    License,
    Credits,
    Copyright,
    Help,
    Dir,
}

impl BuiltinFn {
    /// The declared parameter names, bound into the call's child symbol table.
    pub fn arg_names(self) -> &'static [&'static str] {
        match self {
            Self::Print | Self::PrintRet | Self::Input | Self::Len | Self::Int | Self::Float | Self::Str
            | Self::Bool | Self::Type => &["value"],
            Self::IsNum | Self::IsInt | Self::IsFloat | Self::IsStr | Self::IsBool | Self::IsArray | Self::IsFun
            | Self::IsNull => &["value"],
            Self::InputInt | Self::Clear | Self::Exit | Self::TimeNow | Self::License | Self::Credits
            | Self::Copyright => &[],
            Self::Require => &["module"],
            Self::ArrAppend => &["array", "value"],
            Self::ArrPop | Self::ArrGet => &["array", "index"],
            Self::ArrExtend => &["arrayA", "arrayB"],
            Self::ArrLen => &["array"],
            Self::ArrChunk => &["array", "value"],
            Self::StrLen => &["string"],
            Self::StrFind => &["string", "value"],
            Self::StrGet => &["string", "index"],
            Self::Pyapi => &["code", "ns"],
            Self::Help | Self::Dir => &["obj"],
        }
    }

    /// Index-aligned defaults; `None` marks a required parameter.
    pub fn defaults(self) -> Vec<Option<Value>> {
        match self {
            // `arr_pop` removes the last element by default.
            Self::ArrPop => vec![None, Some(Value::Int(-1))],
            other => vec![None; other.arg_names().len()],
        }
    }

    /// Dispatches to the implementation. Arguments are already bound into
    /// `env`'s symbol table by the call protocol.
    pub fn call(self, machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
        match self {
            Self::Print => print::print(machine, env),
            Self::PrintRet => print::print_ret(machine, env),
            Self::Input => input::input(machine, env),
            Self::InputInt => input::input_int(machine, env),
            Self::Clear => shell::clear(machine, env),
            Self::Require => require::require(machine, env),
            Self::Exit => Err(Signal::Exit(Value::Null)),
            Self::Len => len::len(machine, env),
            Self::IsNum => predicates::is_num(env),
            Self::IsInt => predicates::is_int(env),
            Self::IsFloat => predicates::is_float(env),
            Self::IsStr => predicates::is_str(env),
            Self::IsBool => predicates::is_bool(env),
            Self::IsArray => predicates::is_array(env),
            Self::IsFun => predicates::is_fun(env),
            Self::IsNull => predicates::is_null(env),
            Self::ArrAppend => arrays::arr_append(env),
            Self::ArrPop => arrays::arr_pop(env),
            Self::ArrExtend => arrays::arr_extend(env),
            Self::ArrLen => arrays::arr_len(env),
            Self::ArrChunk => arrays::arr_chunk(env),
            Self::ArrGet => arrays::arr_get(env),
            Self::StrLen => strings::str_len(env),
            Self::StrFind => strings::str_find(env),
            Self::StrGet => strings::str_get(env),
            Self::Int => casts::int(env),
            Self::Float => casts::float(env),
            Self::Str => casts::str(machine, env),
            Self::Bool => casts::bool(env),
            Self::Type => casts::type_(env),
            Self::Pyapi => misc::pyapi(machine, env),
            Self::TimeNow => misc::time_now(env),
            Self::License => shell::license(machine, env),
            Self::Credits => shell::credits(machine, env),
            Self::Copyright => shell::copyright(machine, env),
            Self::Help => shell::help(machine, env),
            Self::Dir => dir::dir(env),
        }
    }
}

/// The environment a builtin handler runs in: the call's child context
/// (holding the bound arguments) and the call-site span for errors.
pub struct CallEnv<'a> {
    pub ctx: &'a Rc<Context>,
    pub span: &'a Span,
}

impl CallEnv<'_> {
    /// Fetches a bound argument by its declared name.
    ///
    /// The call protocol guarantees every declared name is bound, so a miss
    /// here is a registry bug, not a user error.
    pub fn arg(&self, name: &str) -> Value {
        self.ctx
            .symbol_table
            .borrow()
            .get_local(name)
            .unwrap_or_else(|| panic!("builtin argument '{name}' was not bound"))
    }

    pub fn rt(&self, message: impl Into<String>) -> Signal {
        Error::rt(self.span, self.ctx, message).into()
    }

    pub fn tagged(&self, kind: ErrorKind, message: impl Into<String>) -> Signal {
        Error::tagged(kind, self.span, self.ctx, message).into()
    }
}

/// Writes a chunk of text to the machine's stdout, mapping I/O failures to
/// runtime errors.
pub(crate) fn emit(machine: &mut Machine, env: &CallEnv, text: &str) -> RunResult<()> {
    machine
        .stdout
        .stdout_write(text.into())
        .map_err(|e| env.rt(format!("I/O error: {e}")))
}

/// Writes text followed by a newline.
pub(crate) fn emit_line(machine: &mut Machine, env: &CallEnv, text: &str) -> RunResult<()> {
    emit(machine, env, text)?;
    machine
        .stdout
        .stdout_push('\n')
        .map_err(|e| env.rt(format!("I/O error: {e}")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_names_are_stable() {
        assert_eq!(BuiltinFn::Print.to_string(), "print");
        assert_eq!(BuiltinFn::PrintRet.to_string(), "print_ret");
        assert_eq!(BuiltinFn::IsNum.to_string(), "is_num");
        assert_eq!(BuiltinFn::ArrChunk.to_string(), "arr_chunk");
        assert_eq!(BuiltinFn::TimeNow.to_string(), "time_now");
        assert_eq!(BuiltinFn::Pyapi.to_string(), "pyapi");
    }

    #[test]
    fn defaults_align_with_arg_names() {
        for builtin in [
            BuiltinFn::Print,
            BuiltinFn::ArrPop,
            BuiltinFn::ArrChunk,
            BuiltinFn::Require,
            BuiltinFn::Exit,
            BuiltinFn::Pyapi,
        ] {
            assert_eq!(builtin.defaults().len(), builtin.arg_names().len());
        }
        assert_eq!(BuiltinFn::ArrPop.defaults()[1], Some(Value::Int(-1)));
    }
}
