//! The `String` builtin class: a string-manipulation host object.

use std::rc::Rc;

use super::{BuiltinInstance, HostObject, HostOps, MethodSpec};
use crate::{
    builtins::CallEnv,
    interpreter::Machine,
    position::Span,
    scope::Context,
    signal::RunResult,
    value::Value,
};

/// Host state: the wrapped string.
#[derive(Debug)]
pub struct StringObject {
    pub value: String,
}

impl StringObject {
    /// `__constructor__(value="")`.
    pub(crate) fn construct(env: &CallEnv) -> RunResult<Self> {
        match env.arg("value") {
            Value::Str(s) => Ok(Self { value: s.to_string() }),
            _ => Err(env.rt("String() argument must be a string")),
        }
    }
}

impl HostOps for StringObject {
    fn display(&self) -> Option<String> {
        Some(self.value.clone())
    }

    fn len(&self) -> Option<i64> {
        Some(self.value.chars().count() as i64)
    }

    fn add(&self, other: &Value, span: &Span, ctx: &Rc<Context>) -> Option<RunResult<Value>> {
        match other {
            Value::Str(s) => Some(Ok(Value::str(format!("{}{}", self.value, s)))),
            Value::BuiltinInstance(instance) => match &*instance.state.borrow() {
                HostObject::String(s) => Some(Ok(Value::str(format!("{}{}", self.value, s.value)))),
                _ => None,
            },
            _ => {
                let _ = (span, ctx);
                None
            }
        }
    }
}

fn with_string<T>(recv: &Rc<BuiltinInstance>, f: impl FnOnce(&StringObject) -> T) -> T {
    match &*recv.state.borrow() {
        HostObject::String(obj) => f(obj),
        _ => unreachable!("String method bound to a non-String host"),
    }
}

fn expect_str_arg(env: &CallEnv, name: &str, action: &str) -> RunResult<Rc<str>> {
    match env.arg(name) {
        Value::Str(s) => Ok(s),
        _ => Err(env.rt(format!("Cannot {action} a non-string"))),
    }
}

fn no_defaults() -> Vec<Option<Value>> {
    Vec::new()
}

fn default_empty() -> Vec<Option<Value>> {
    vec![Some(Value::str(""))]
}

fn default_space() -> Vec<Option<Value>> {
    vec![Some(Value::str(" "))]
}

fn default_two_empty() -> Vec<Option<Value>> {
    vec![Some(Value::str("")), Some(Value::str(""))]
}

pub(crate) static METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "upper",
        arg_names: &[],
        defaults: no_defaults,
        handler: upper,
    },
    MethodSpec {
        name: "lower",
        arg_names: &[],
        defaults: no_defaults,
        handler: lower,
    },
    MethodSpec {
        name: "title",
        arg_names: &[],
        defaults: no_defaults,
        handler: title,
    },
    MethodSpec {
        name: "capitalize",
        arg_names: &[],
        defaults: no_defaults,
        handler: capitalize,
    },
    MethodSpec {
        name: "swapcase",
        arg_names: &[],
        defaults: no_defaults,
        handler: swapcase,
    },
    MethodSpec {
        name: "length",
        arg_names: &[],
        defaults: no_defaults,
        handler: length,
    },
    MethodSpec {
        name: "count",
        arg_names: &["string"],
        defaults: default_empty,
        handler: count,
    },
    MethodSpec {
        name: "replace",
        arg_names: &["string", "value"],
        defaults: default_two_empty,
        handler: replace,
    },
    MethodSpec {
        name: "find",
        arg_names: &["string"],
        defaults: default_empty,
        handler: find,
    },
    MethodSpec {
        name: "startswith",
        arg_names: &["string"],
        defaults: default_empty,
        handler: startswith,
    },
    MethodSpec {
        name: "endswith",
        arg_names: &["string"],
        defaults: default_empty,
        handler: endswith,
    },
    MethodSpec {
        name: "split",
        arg_names: &["string"],
        defaults: default_space,
        handler: split,
    },
    MethodSpec {
        name: "join",
        arg_names: &["string"],
        defaults: default_empty,
        handler: join,
    },
    MethodSpec {
        name: "strip",
        arg_names: &["string"],
        defaults: default_empty,
        handler: strip,
    },
    MethodSpec {
        name: "lstrip",
        arg_names: &["string"],
        defaults: default_empty,
        handler: lstrip,
    },
    MethodSpec {
        name: "rstrip",
        arg_names: &["string"],
        defaults: default_empty,
        handler: rstrip,
    },
];

fn upper(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    with_string(recv, |s| Ok(Value::str(s.value.to_uppercase())))
}

fn lower(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    with_string(recv, |s| Ok(Value::str(s.value.to_lowercase())))
}

/// Uppercases the first letter of every word, lowercasing the rest.
fn title(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    with_string(recv, |s| {
        let mut out = String::with_capacity(s.value.len());
        let mut at_word_start = true;
        for c in s.value.chars() {
            if c.is_alphabetic() {
                if at_word_start {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                at_word_start = false;
            } else {
                out.push(c);
                at_word_start = true;
            }
        }
        Ok(Value::str(out))
    })
}

fn capitalize(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    with_string(recv, |s| {
        let mut chars = s.value.chars();
        let out = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        };
        Ok(Value::str(out))
    })
}

fn swapcase(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    with_string(recv, |s| {
        let out: String = s
            .value
            .chars()
            .flat_map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().collect::<Vec<_>>()
                } else {
                    c.to_uppercase().collect::<Vec<_>>()
                }
            })
            .collect();
        Ok(Value::str(out))
    })
}

fn length(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, _env: &CallEnv) -> RunResult<Value> {
    with_string(recv, |s| Ok(Value::Int(s.value.chars().count() as i64)))
}

fn count(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let needle = expect_str_arg(env, "string", "count")?;
    if needle.is_empty() {
        return Err(env.rt("Cannot count an empty string"));
    }
    with_string(recv, |s| Ok(Value::Int(s.value.matches(needle.as_ref()).count() as i64)))
}

fn replace(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let from = expect_str_arg(env, "string", "replace")?;
    let to = expect_str_arg(env, "value", "replace")?;
    with_string(recv, |s| Ok(Value::str(s.value.replace(from.as_ref(), to.as_ref()))))
}

fn find(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let needle = expect_str_arg(env, "string", "find")?;
    with_string(recv, |s| {
        let index = s
            .value
            .find(needle.as_ref())
            .map_or(-1, |byte_offset| s.value[..byte_offset].chars().count() as i64);
        Ok(Value::Int(index))
    })
}

fn startswith(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let prefix = expect_str_arg(env, "string", "startswith")?;
    with_string(recv, |s| Ok(Value::Bool(s.value.starts_with(prefix.as_ref()))))
}

fn endswith(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let suffix = expect_str_arg(env, "string", "endswith")?;
    with_string(recv, |s| Ok(Value::Bool(s.value.ends_with(suffix.as_ref()))))
}

fn split(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let separator = expect_str_arg(env, "string", "split")?;
    with_string(recv, |s| {
        let parts: Vec<Value> = if separator.is_empty() {
            s.value.chars().map(|c| Value::str(c.to_string())).collect()
        } else {
            s.value.split(separator.as_ref()).map(Value::str).collect()
        };
        Ok(Value::array(parts))
    })
}

/// Joins the characters of the wrapped string with the separator.
fn join(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let separator = expect_str_arg(env, "string", "join")?;
    with_string(recv, |s| {
        let joined: Vec<String> = s.value.chars().map(|c| c.to_string()).collect();
        Ok(Value::str(joined.join(&separator)))
    })
}

fn strip_chars(value: &str, chars: &str, left: bool, right: bool) -> String {
    let matcher = |c: char| {
        if chars.is_empty() {
            c.is_whitespace()
        } else {
            chars.contains(c)
        }
    };
    let mut result = value;
    if left {
        result = result.trim_start_matches(matcher);
    }
    if right {
        result = result.trim_end_matches(matcher);
    }
    result.to_owned()
}

fn strip(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let chars = expect_str_arg(env, "string", "strip")?;
    with_string(recv, |s| Ok(Value::str(strip_chars(&s.value, &chars, true, true))))
}

fn lstrip(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let chars = expect_str_arg(env, "string", "lstrip")?;
    with_string(recv, |s| Ok(Value::str(strip_chars(&s.value, &chars, true, false))))
}

fn rstrip(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let chars = expect_str_arg(env, "string", "rstrip")?;
    with_string(recv, |s| Ok(Value::str(strip_chars(&s.value, &chars, false, true))))
}
