//! The `File` builtin class.

use std::{
    fs::{File, OpenOptions},
    io::{Read as _, Write as _},
    rc::Rc,
};

use super::{BuiltinInstance, HostObject, HostOps, MethodSpec};
use crate::{builtins::CallEnv, interpreter::Machine, signal::RunResult, value::Value};

/// Host state: the path, the open mode, and the handle.
///
/// `close` drops the handle explicitly; dropping the instance releases it in
/// any case, so a handle never outlives its object.
#[derive(Debug)]
pub struct FileObject {
    path: String,
    mode: Mode,
    handle: Option<File>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
    Append,
}

impl FileObject {
    /// `__constructor__(path, mode="r")`.
    pub(crate) fn construct(env: &CallEnv) -> RunResult<Self> {
        let Value::Str(path) = env.arg("path") else {
            return Err(env.rt("File path must be a string"));
        };
        let Value::Str(mode) = env.arg("mode") else {
            return Err(env.rt("File mode must be a string"));
        };
        let mode = match mode.as_ref() {
            "r" => Mode::Read,
            "w" => Mode::Write,
            "a" => Mode::Append,
            other => return Err(env.rt(format!("Invalid file mode '{other}'"))),
        };
        let handle = match mode {
            Mode::Read => File::open(path.as_ref()),
            Mode::Write => File::create(path.as_ref()),
            Mode::Append => OpenOptions::new().create(true).append(true).open(path.as_ref()),
        }
        .map_err(|e| env.rt(format!("Could not open file \"{path}\": {e}")))?;
        Ok(Self {
            path: path.to_string(),
            mode,
            handle: Some(handle),
        })
    }
}

impl HostOps for FileObject {
    fn display(&self) -> Option<String> {
        let state = if self.handle.is_some() { "open" } else { "closed" };
        Some(format!("<File \"{}\" ({state})>", self.path))
    }
}

fn no_defaults() -> Vec<Option<Value>> {
    Vec::new()
}

fn write_defaults() -> Vec<Option<Value>> {
    vec![None]
}

pub(crate) static METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "read",
        arg_names: &[],
        defaults: no_defaults,
        handler: read,
    },
    MethodSpec {
        name: "write",
        arg_names: &["value"],
        defaults: write_defaults,
        handler: write,
    },
    MethodSpec {
        name: "close",
        arg_names: &[],
        defaults: no_defaults,
        handler: close,
    },
    MethodSpec {
        name: "is_closed",
        arg_names: &[],
        defaults: no_defaults,
        handler: is_closed,
    },
];

fn read(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let mut state = recv.state.borrow_mut();
    let HostObject::File(file) = &mut *state else {
        unreachable!("File method bound to a non-File host");
    };
    if file.mode != Mode::Read {
        return Err(env.rt("File not open for reading"));
    }
    let Some(handle) = file.handle.as_mut() else {
        return Err(env.rt("I/O operation on closed file"));
    };
    let mut contents = String::new();
    handle
        .read_to_string(&mut contents)
        .map_err(|e| env.rt(format!("Could not read file \"{}\": {e}", file.path)))?;
    Ok(Value::str(contents))
}

fn write(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let Value::Str(text) = env.arg("value") else {
        return Err(env.rt("Can only write a string to a file"));
    };
    let mut state = recv.state.borrow_mut();
    let HostObject::File(file) = &mut *state else {
        unreachable!("File method bound to a non-File host");
    };
    if file.mode == Mode::Read {
        return Err(env.rt("File not open for writing"));
    }
    let Some(handle) = file.handle.as_mut() else {
        return Err(env.rt("I/O operation on closed file"));
    };
    handle
        .write_all(text.as_bytes())
        .map_err(|e| env.rt(format!("Could not write file \"{}\": {e}", file.path)))?;
    Ok(Value::Null)
}

fn close(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    let mut state = recv.state.borrow_mut();
    let HostObject::File(file) = &mut *state else {
        unreachable!("File method bound to a non-File host");
    };
    file.handle = None;
    Ok(Value::Null)
}

fn is_closed(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    let state = recv.state.borrow();
    let HostObject::File(file) = &*state else {
        unreachable!("File method bound to a non-File host");
    };
    Ok(Value::Bool(file.handle.is_none()))
}
