//! The `Requests` builtin class: a blocking HTTP client.

use std::rc::Rc;

use super::{BuiltinInstance, HostObject, HostOps, MethodSpec};
use crate::{builtins::CallEnv, interpreter::Machine, signal::RunResult, value::Value};

/// Host state: one HTTP agent shared across the instance's requests so
/// connections can be reused.
pub struct RequestsObject {
    agent: ureq::Agent,
}

impl std::fmt::Debug for RequestsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestsObject").finish_non_exhaustive()
    }
}

impl RequestsObject {
    pub(crate) fn new() -> Self {
        Self { agent: ureq::agent() }
    }
}

impl HostOps for RequestsObject {}

fn one_required() -> Vec<Option<Value>> {
    vec![None]
}

fn url_and_optional_data() -> Vec<Option<Value>> {
    vec![None, Some(Value::str(""))]
}

pub(crate) static METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "get",
        arg_names: &["url"],
        defaults: one_required,
        handler: get,
    },
    MethodSpec {
        name: "post",
        arg_names: &["url", "data"],
        defaults: url_and_optional_data,
        handler: post,
    },
    MethodSpec {
        name: "put",
        arg_names: &["url", "data"],
        defaults: url_and_optional_data,
        handler: put,
    },
    MethodSpec {
        name: "delete",
        arg_names: &["url"],
        defaults: one_required,
        handler: delete,
    },
];

fn expect_url(env: &CallEnv) -> RunResult<Rc<str>> {
    match env.arg("url") {
        Value::Str(url) => Ok(url),
        _ => Err(env.rt("URL must be a string")),
    }
}

/// Reads the response body, treating HTTP error statuses like successes:
/// the caller gets the body either way, as with the original client.
fn body(env: &CallEnv, result: Result<ureq::Response, ureq::Error>) -> RunResult<Value> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(e) => return Err(env.rt(format!("Request failed: {e}"))),
    };
    response
        .into_string()
        .map(Value::str)
        .map_err(|e| env.rt(format!("Could not read response body: {e}")))
}

fn send(env: &CallEnv, request: ureq::Request) -> RunResult<Value> {
    match env.arg("data") {
        Value::Str(data) if data.is_empty() => body(env, request.call()),
        Value::Str(data) => body(env, request.send_string(&data)),
        Value::Map(_) | Value::Array(_) => {
            let json = super::json_object::to_json(&env.arg("data"), env)?;
            body(env, request.send_json(json))
        }
        _ => Err(env.rt("Request data must be a string, array or hashmap")),
    }
}

fn with_agent<T>(recv: &Rc<BuiltinInstance>, f: impl FnOnce(&ureq::Agent) -> T) -> T {
    match &*recv.state.borrow() {
        HostObject::Requests(requests) => f(&requests.agent),
        _ => unreachable!("Requests method bound to a non-Requests host"),
    }
}

fn get(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let url = expect_url(env)?;
    let request = with_agent(recv, |agent| agent.get(&url));
    body(env, request.call())
}

fn post(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let url = expect_url(env)?;
    let request = with_agent(recv, |agent| agent.post(&url));
    send(env, request)
}

fn put(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let url = expect_url(env)?;
    let request = with_agent(recv, |agent| agent.put(&url));
    send(env, request)
}

fn delete(recv: &Rc<BuiltinInstance>, _machine: &mut Machine, env: &CallEnv) -> RunResult<Value> {
    let url = expect_url(env)?;
    let request = with_agent(recv, |agent| agent.delete(&url));
    body(env, request.call())
}
