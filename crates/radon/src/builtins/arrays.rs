//! In-place array helpers.

use std::{cell::RefCell, rc::Rc};

use super::CallEnv;
use crate::{signal::RunResult, value::Value};

fn expect_array(env: &CallEnv, value: &Value, what: &str) -> RunResult<Rc<RefCell<Vec<Value>>>> {
    match value {
        Value::Array(elements) => Ok(Rc::clone(elements)),
        _ => Err(env.rt(format!("{what} must be array"))),
    }
}

fn expect_index(env: &CallEnv, value: &Value, what: &str) -> RunResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(n) => Ok(*n as i64),
        _ => Err(env.rt(format!("{what} must be number"))),
    }
}

pub fn arr_append(env: &CallEnv) -> RunResult<Value> {
    let array = expect_array(env, &env.arg("array"), "First argument")?;
    array.borrow_mut().push(env.arg("value"));
    Ok(Value::Null)
}

/// Removes and returns the element at `index` (default `-1`, the last).
pub fn arr_pop(env: &CallEnv) -> RunResult<Value> {
    let array = expect_array(env, &env.arg("array"), "First argument")?;
    let index = expect_index(env, &env.arg("index"), "Second argument")?;
    let mut elements = array.borrow_mut();
    let len = elements.len() as i64;
    let actual = if index < 0 { index + len } else { index };
    if actual < 0 || actual >= len {
        return Err(env.rt("Element at this index could not be removed from array because index is out of bounds"));
    }
    Ok(elements.remove(actual as usize))
}

pub fn arr_extend(env: &CallEnv) -> RunResult<Value> {
    let first = expect_array(env, &env.arg("arrayA"), "First argument")?;
    let second = expect_array(env, &env.arg("arrayB"), "Second argument")?;
    if Rc::ptr_eq(&first, &second) {
        // Extending an array with itself: snapshot first so the borrow
        // does not overlap.
        let copy = second.borrow().clone();
        first.borrow_mut().extend(copy);
    } else {
        first.borrow_mut().extend(second.borrow().iter().cloned());
    }
    Ok(Value::Null)
}

/// Splits the array into consecutive chunks of at most `value` elements.
///
/// The concatenation of the result equals the input, and every chunk but
/// possibly the last has exactly `value` elements.
pub fn arr_chunk(env: &CallEnv) -> RunResult<Value> {
    let array = expect_array(env, &env.arg("array"), "First argument")?;
    let size = expect_index(env, &env.arg("value"), "Second argument")?;
    if size <= 0 {
        return Err(env.rt("Second argument must be a positive number"));
    }
    let elements = array.borrow();
    let chunks = elements
        .chunks(size as usize)
        .map(|chunk| Value::array(chunk.to_vec()))
        .collect();
    Ok(Value::array(chunks))
}

pub fn arr_get(env: &CallEnv) -> RunResult<Value> {
    let array = match &env.arg("array") {
        Value::Array(elements) => Rc::clone(elements),
        _ => return Err(env.rt("First argument must be an array")),
    };
    let index = match &env.arg("index") {
        Value::Int(n) => *n,
        Value::Float(n) => *n as i64,
        _ => return Err(env.rt("Second argument must be a number")),
    };
    let elements = array.borrow();
    let len = elements.len() as i64;
    let actual = if index < 0 { index + len } else { index };
    if actual < 0 || actual >= len {
        return Err(env.rt(format!("Index {index} out of bounds")));
    }
    Ok(elements[actual as usize].clone())
}

pub fn arr_len(env: &CallEnv) -> RunResult<Value> {
    match &env.arg("array") {
        Value::Array(elements) => Ok(Value::Int(elements.borrow().len() as i64)),
        _ => Err(env.rt("Argument must be array")),
    }
}
