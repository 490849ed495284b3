use std::{cell::RefCell, rc::Rc};

use crate::{
    ast::{BinaryOp, Node, NodeKind, Param, UnaryOp},
    builtins::{BuiltinFn, CallEnv},
    classes,
    error::{Error, ErrorKind},
    function::{Function, check_and_populate_args},
    io::{InputReader, PrintWriter},
    position::Span,
    scope::{Context, SymbolTable},
    security::SecurityGate,
    signal::{RunResult, Signal},
    value::{BoundMethod, Class, Instance, MapKey, Value},
};

/// Maximum interpreter call depth.
///
/// Each Radon call consumes several Rust stack frames, so this is deliberately
/// far below anything that could overflow the host stack.
const MAX_CALL_DEPTH: u32 = 200;

/// The mutable machinery shared by a whole run: where output goes, where
/// input comes from, the capability gate, and call bookkeeping.
pub struct Machine<'io> {
    pub stdout: &'io mut dyn PrintWriter,
    pub stdin: &'io mut dyn InputReader,
    pub security: SecurityGate,
    /// Replace file names with `[REDACTED]` in nested `require` runs.
    pub hide_paths: bool,
    call_depth: u32,
}

impl<'io> Machine<'io> {
    pub fn new(stdout: &'io mut dyn PrintWriter, stdin: &'io mut dyn InputReader) -> Self {
        Self {
            stdout,
            stdin,
            security: SecurityGate::deny_all(),
            hide_paths: false,
            call_depth: 0,
        }
    }

    #[must_use]
    pub fn with_security(mut self, security: SecurityGate) -> Self {
        self.security = security;
        self
    }

    #[must_use]
    pub fn with_hidden_paths(mut self, hide_paths: bool) -> Self {
        self.hide_paths = hide_paths;
        self
    }
}

/// Evaluates one AST node under a context.
pub fn eval(node: &Node, ctx: &Rc<Context>, machine: &mut Machine) -> RunResult<Value> {
    let span = &node.span;
    match &node.kind {
        NodeKind::Int(n) => Ok(Value::Int(*n)),
        NodeKind::Float(n) => Ok(Value::Float(*n)),
        NodeKind::Str(s) => Ok(Value::Str(Rc::clone(s))),
        NodeKind::Array(elements) => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(eval(element, ctx, machine)?);
            }
            Ok(Value::array(values))
        }
        NodeKind::Map(pairs) => {
            let mut map = indexmap::IndexMap::new();
            for (key_node, value_node) in pairs {
                let key = eval(key_node, ctx, machine)?;
                let value = eval(value_node, ctx, machine)?;
                let Some(key) = MapKey::from_value(&key) else {
                    return Err(Error::tagged(
                        ErrorKind::TypeError,
                        &key_node.span,
                        ctx,
                        format!("unhashable key of type '{}'", key.type_name()),
                    )
                    .into());
                };
                map.insert(key, value);
            }
            Ok(Value::Map(Rc::new(RefCell::new(map))))
        }
        NodeKind::Ident(name) => SymbolTable::lookup(&ctx.symbol_table, name).ok_or_else(|| {
            Error::tagged(ErrorKind::NameError, span, ctx, format!("'{name}' is not defined")).into()
        }),
        NodeKind::Let { name, value } => {
            let value = eval(value, ctx, machine)?;
            ctx.symbol_table.borrow_mut().set(Rc::clone(name), value.clone());
            Ok(value)
        }
        NodeKind::SetIndex { target, index, value } => {
            let obj = eval(target, ctx, machine)?;
            let index = eval(index, ctx, machine)?;
            let value = eval(value, ctx, machine)?;
            eval_index_set(obj, index, value, span, ctx, machine)
        }
        NodeKind::SetAttr { target, attr, value } => {
            let obj = eval(target, ctx, machine)?;
            let value = eval(value, ctx, machine)?;
            eval_attr_set(obj, attr, value, span, ctx)
        }
        NodeKind::Unary { op, operand } => {
            let value = eval(operand, ctx, machine)?;
            eval_unary(*op, value, span, ctx, machine)
        }
        NodeKind::Binary { op, lhs, rhs } => {
            let left = eval(lhs, ctx, machine)?;
            let right = eval(rhs, ctx, machine)?;
            eval_binary(*op, left, right, span, ctx, machine)
        }
        NodeKind::If { cases, otherwise } => {
            for (cond, body) in cases {
                if eval(cond, ctx, machine)?.is_true() {
                    return eval_statements(body, ctx, machine);
                }
            }
            match otherwise {
                Some(body) => eval_statements(body, ctx, machine),
                None => Ok(Value::Null),
            }
        }
        NodeKind::While { cond, body } => {
            loop {
                if !eval(cond, ctx, machine)?.is_true() {
                    break;
                }
                match eval_statements(body, ctx, machine) {
                    Ok(_) => {}
                    Err(Signal::Break) => break,
                    Err(Signal::Continue) => {}
                    // The nearest enclosing loop sees a plain continue.
                    Err(Signal::ContinueOuter) => return Err(Signal::Continue),
                    Err(other) => return Err(other),
                }
            }
            Ok(Value::Null)
        }
        NodeKind::For { var, iterable, body } => {
            let iterable = eval(iterable, ctx, machine)?;
            let items = iter_items(iterable, span, ctx, machine)?;
            for item in items {
                ctx.symbol_table.borrow_mut().set(Rc::clone(var), item);
                match eval_statements(body, ctx, machine) {
                    Ok(_) => {}
                    Err(Signal::Break) => break,
                    Err(Signal::Continue) => {}
                    Err(Signal::ContinueOuter) => return Err(Signal::Continue),
                    Err(other) => return Err(other),
                }
            }
            Ok(Value::Null)
        }
        NodeKind::FunDef {
            name,
            params,
            body,
            auto_return,
        } => {
            let function = make_function(name.as_ref(), params, body, *auto_return, ctx, machine)?;
            let value = Value::Function(Rc::new(function));
            if let Some(name) = name {
                ctx.symbol_table.borrow_mut().set(Rc::clone(name), value.clone());
            }
            Ok(value)
        }
        NodeKind::ClassDef { name, body } => {
            let table = Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(&ctx.symbol_table))));
            let class_ctx = Context::child(
                Rc::from(format!("<class {name}>")),
                ctx,
                span.start.clone(),
                Rc::clone(&table),
            );
            eval_statements(body, &class_ctx, machine)?;
            let class = Value::Class(Rc::new(Class {
                name: Rc::clone(name),
                symbol_table: table,
            }));
            ctx.symbol_table.borrow_mut().set(Rc::clone(name), class.clone());
            Ok(class)
        }
        NodeKind::Call { callee, args, kwargs } => {
            let callee_value = eval(callee, ctx, machine)?;
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(eval(arg, ctx, machine)?);
            }
            let mut kwarg_values = Vec::with_capacity(kwargs.len());
            for (name, value) in kwargs {
                kwarg_values.push((Rc::clone(name), eval(value, ctx, machine)?));
            }
            call_value(callee_value, arg_values, kwarg_values, span, ctx, machine)
        }
        NodeKind::Index { obj, index } => {
            let obj = eval(obj, ctx, machine)?;
            let index = eval(index, ctx, machine)?;
            eval_index_get(obj, index, span, ctx, machine)
        }
        NodeKind::Attr { obj, attr } => {
            let obj = eval(obj, ctx, machine)?;
            eval_attr_get(obj, attr, span, ctx)
        }
        NodeKind::Return(value) => {
            let value = match value {
                Some(node) => eval(node, ctx, machine)?,
                None => Value::Null,
            };
            Err(Signal::Return(value))
        }
        NodeKind::Break => Err(Signal::Break),
        NodeKind::Continue => Err(Signal::Continue),
        NodeKind::ContinueOuter => Err(Signal::ContinueOuter),
        NodeKind::Statements(statements) => eval_statements(statements, ctx, machine),
    }
}

/// Evaluates a statement list, producing the last statement's value.
pub fn eval_statements(statements: &[Node], ctx: &Rc<Context>, machine: &mut Machine) -> RunResult<Value> {
    let mut last = Value::Null;
    for statement in statements {
        last = eval(statement, ctx, machine)?;
    }
    Ok(last)
}

fn make_function(
    name: Option<&Rc<str>>,
    params: &[Param],
    body: &[Node],
    auto_return: bool,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Function> {
    let mut arg_names = Vec::with_capacity(params.len());
    let mut defaults = Vec::with_capacity(params.len());
    for param in params {
        arg_names.push(Rc::clone(&param.name));
        // Defaults are evaluated once, at definition time.
        defaults.push(match &param.default {
            Some(node) => Some(eval(node, ctx, machine)?),
            None => None,
        });
    }
    Ok(Function {
        name: name.map_or_else(|| Rc::from("<anonymous>"), Rc::clone),
        arg_names,
        defaults,
        body: body.to_vec().into(),
        auto_return,
        desc: None,
        closure_table: Rc::clone(&ctx.symbol_table),
        defining_ctx: Rc::downgrade(ctx),
    })
}

/// Calls any callable value with already-evaluated arguments.
///
/// This is the single dispatch point used by call expressions, operator
/// hooks, and builtins that invoke user code.
pub fn call_value(
    callee: Value,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    machine.call_depth += 1;
    if machine.call_depth > MAX_CALL_DEPTH {
        machine.call_depth -= 1;
        return Err(Error::rt(span, ctx, "maximum recursion depth exceeded").into());
    }
    let result = call_value_inner(callee, args, kwargs, span, ctx, machine);
    machine.call_depth -= 1;
    result
}

fn call_value_inner(
    callee: Value,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    match callee {
        Value::Function(func) => call_function(&func, None, args, kwargs, span, ctx, machine),
        Value::Method(method) => match method.as_ref() {
            BoundMethod::User { recv, func } => {
                call_function(func, Some(Rc::clone(recv)), args, kwargs, span, ctx, machine)
            }
            BoundMethod::Builtin(bound) => classes::call_bound_method(bound, args, kwargs, span, ctx, machine),
        },
        Value::Builtin(builtin) => call_builtin(builtin, args, kwargs, span, ctx, machine),
        Value::Class(class) => instantiate_class(&class, args, kwargs, span, ctx, machine),
        Value::BuiltinClass(class) => classes::instantiate(&class, args, kwargs, span, ctx),
        other => Err(Error::tagged(
            ErrorKind::TypeError,
            span,
            ctx,
            format!("'{}' is not callable", other.type_name()),
        )
        .into()),
    }
}

fn call_function(
    func: &Rc<Function>,
    this: Option<Rc<Instance>>,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    let parent = func.call_parent(ctx);
    let table = Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(&func.closure_table))));
    let child = Context::child(Rc::clone(&func.name), &parent, span.start.clone(), Rc::clone(&table));
    check_and_populate_args(
        &func.name,
        &func.arg_names,
        &func.defaults,
        args,
        kwargs,
        false,
        &table,
        span,
        ctx,
    )?;
    if let Some(recv) = this {
        table.borrow_mut().set("this", Value::Instance(recv));
    }
    match eval_statements(&func.body, &child, machine) {
        Ok(value) => Ok(if func.auto_return { value } else { Value::Null }),
        Err(Signal::Return(value)) => Ok(value),
        Err(other) => Err(other),
    }
}

fn call_builtin(
    builtin: BuiltinFn,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    // Builtins hang off the call site, so the traceback shows where the
    // call happened.
    let table = Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(&ctx.symbol_table))));
    let child = Context::child(Rc::from(builtin.to_string()), ctx, span.start.clone(), Rc::clone(&table));
    check_and_populate_args(
        &builtin.to_string(),
        builtin.arg_names(),
        &builtin.defaults(),
        args,
        kwargs,
        true,
        &table,
        span,
        ctx,
    )?;
    let env = CallEnv { ctx: &child, span };
    builtin.call(machine, &env)
}

fn instantiate_class(
    class: &Rc<Class>,
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    let instance = Rc::new(Instance {
        class: Rc::clone(class),
        symbol_table: Rc::new(RefCell::new(SymbolTable::new())),
    });
    let constructor = class.symbol_table.borrow().get_local("__constructor__");
    match constructor {
        Some(Value::Function(ctor)) => {
            call_function(&ctor, Some(Rc::clone(&instance)), args, kwargs, span, ctx, machine)?;
        }
        Some(other) => {
            return Err(Error::tagged(
                ErrorKind::TypeError,
                span,
                ctx,
                format!("__constructor__ of '{}' is not a function", other.type_name()),
            )
            .into());
        }
        None => {
            if !args.is_empty() || !kwargs.is_empty() {
                return Err(Error::rt(span, ctx, format!("too many args passed into '{}'", class.name)).into());
            }
        }
    }
    Ok(Value::Instance(instance))
}

/// Looks up an attribute on an instance: instance table first, then the
/// class table.
fn instance_attr(instance: &Rc<Instance>, name: &str) -> Option<Value> {
    instance
        .symbol_table
        .borrow()
        .get_local(name)
        .or_else(|| instance.class.symbol_table.borrow().get_local(name))
}

/// Binds a function fetched off an instance to its receiver.
fn bind_attr(value: Value, instance: &Rc<Instance>) -> Value {
    match value {
        Value::Function(func) => Value::Method(Rc::new(BoundMethod::User {
            recv: Rc::clone(instance),
            func,
        })),
        other => other,
    }
}

/// Invokes an operator hook on an instance if the instance (or its class)
/// defines it. Returns `None` when the hook is absent so the caller can fall
/// back to default behavior.
pub fn call_instance_hook(
    instance: &Rc<Instance>,
    hook: &str,
    args: Vec<Value>,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> Option<RunResult<Value>> {
    let method = instance_attr(instance, hook)?;
    Some(call_value(
        bind_attr(method, instance),
        args,
        vec![],
        span,
        ctx,
        machine,
    ))
}

/// Turns a value into its printable string, honoring the
/// `__string_display__` hook on instances.
pub fn stringify(value: &Value, span: &Span, ctx: &Rc<Context>, machine: &mut Machine) -> RunResult<String> {
    if let Value::Instance(instance) = value {
        if let Some(result) = call_instance_hook(instance, "__string_display__", vec![], span, ctx, machine) {
            return Ok(result?.display_string());
        }
    }
    Ok(value.display_string())
}

fn eval_unary(op: UnaryOp, value: Value, span: &Span, ctx: &Rc<Context>, machine: &mut Machine) -> RunResult<Value> {
    match op {
        UnaryOp::Neg => match value {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| Error::rt(span, ctx, "Integer overflow").into()),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(illegal_unary("-", &other, span, ctx)),
        },
        UnaryOp::Pos => match value {
            Value::Int(_) | Value::Float(_) => Ok(value),
            other => Err(illegal_unary("+", &other, span, ctx)),
        },
        UnaryOp::Not => {
            if let Value::Instance(instance) = &value {
                if let Some(result) = call_instance_hook(instance, "__not__", vec![], span, ctx, machine) {
                    return result;
                }
            }
            Ok(Value::Bool(!value.is_true()))
        }
    }
}

fn illegal_unary(op: &str, value: &Value, span: &Span, ctx: &Rc<Context>) -> Signal {
    Error::rt(span, ctx, format!("Illegal operation: {op} {}", value.type_name())).into()
}

fn illegal_operation(op: BinaryOp, lhs: &Value, rhs: &Value, span: &Span, ctx: &Rc<Context>) -> Signal {
    Error::rt(
        span,
        ctx,
        format!(
            "Illegal operation: {} {} {}",
            lhs.type_name(),
            op.symbol(),
            rhs.type_name()
        ),
    )
    .into()
}

fn eval_binary(
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    // Instances get first crack through their operator hooks.
    if let Value::Instance(instance) = &lhs {
        if let Some(result) = call_instance_hook(instance, op.hook(), vec![rhs.clone()], span, ctx, machine) {
            let value = result?;
            return Ok(match op {
                // `!=` is the negation of the `__eq__` hook.
                BinaryOp::Ne => Value::Bool(!value.is_true()),
                _ => value,
            });
        }
    }
    if let Value::BuiltinInstance(instance) = &lhs {
        if op == BinaryOp::Add {
            if let Some(result) = instance.state.borrow().add(&rhs, span, ctx) {
                return result;
            }
        }
    }

    match op {
        BinaryOp::Eq => return Ok(Value::Bool(lhs.eq_value(&rhs))),
        BinaryOp::Ne => return Ok(Value::Bool(!lhs.eq_value(&rhs))),
        BinaryOp::And => return Ok(Value::Bool(lhs.is_true() && rhs.is_true())),
        BinaryOp::Or => return Ok(Value::Bool(lhs.is_true() || rhs.is_true())),
        _ => {}
    }

    match (op, &lhs, &rhs) {
        // Integer arithmetic stays integer.
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::rt(span, ctx, "Integer overflow").into()),
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => a
            .checked_sub(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::rt(span, ctx, "Integer overflow").into()),
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => a
            .checked_mul(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::rt(span, ctx, "Integer overflow").into()),
        (BinaryOp::Mod, Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                Err(Error::rt(span, ctx, "Division by zero").into())
            } else {
                // Result takes the sign of the divisor.
                Ok(Value::Int(((a % b) + b) % b))
            }
        }
        (BinaryOp::Pow, Value::Int(a), Value::Int(b)) => {
            if *b >= 0 {
                let exp = u32::try_from(*b).map_err(|_| Signal::from(Error::rt(span, ctx, "Integer overflow")))?;
                a.checked_pow(exp)
                    .map(Value::Int)
                    .ok_or_else(|| Error::rt(span, ctx, "Integer overflow").into())
            } else {
                Ok(Value::Float((*a as f64).powi(*b as i32)))
            }
        }

        // Division always yields a float.
        (BinaryOp::Div, _, _) if is_number(&lhs) && is_number(&rhs) => {
            let (a, b) = (as_f64(&lhs), as_f64(&rhs));
            if b == 0.0 {
                Err(Error::rt(span, ctx, "Division by zero").into())
            } else {
                Ok(Value::Float(a / b))
            }
        }
        (BinaryOp::Add, _, _) if is_number(&lhs) && is_number(&rhs) => Ok(Value::Float(as_f64(&lhs) + as_f64(&rhs))),
        (BinaryOp::Sub, _, _) if is_number(&lhs) && is_number(&rhs) => Ok(Value::Float(as_f64(&lhs) - as_f64(&rhs))),
        (BinaryOp::Mul, _, _) if is_number(&lhs) && is_number(&rhs) => Ok(Value::Float(as_f64(&lhs) * as_f64(&rhs))),
        (BinaryOp::Mod, _, _) if is_number(&lhs) && is_number(&rhs) => {
            let (a, b) = (as_f64(&lhs), as_f64(&rhs));
            if b == 0.0 {
                Err(Error::rt(span, ctx, "Division by zero").into())
            } else {
                Ok(Value::Float(a - b * (a / b).floor()))
            }
        }
        (BinaryOp::Pow, _, _) if is_number(&lhs) && is_number(&rhs) => {
            Ok(Value::Float(as_f64(&lhs).powf(as_f64(&rhs))))
        }

        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::str(s))
        }
        (BinaryOp::Mul, Value::Str(s), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
            let count = usize::try_from(*n).unwrap_or(0);
            Ok(Value::str(s.repeat(count)))
        }
        (BinaryOp::Add, Value::Array(a), Value::Array(b)) => {
            let mut elements = a.borrow().clone();
            elements.extend(b.borrow().iter().cloned());
            Ok(Value::array(elements))
        }
        (BinaryOp::Mul, Value::Array(a), Value::Int(n)) => {
            let count = usize::try_from(*n).unwrap_or(0);
            let source = a.borrow();
            let mut elements = Vec::with_capacity(source.len() * count);
            for _ in 0..count {
                elements.extend(source.iter().cloned());
            }
            Ok(Value::array(elements))
        }

        (BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge, _, _) if is_number(&lhs) && is_number(&rhs) => {
            let (a, b) = (as_f64(&lhs), as_f64(&rhs));
            Ok(Value::Bool(match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Gt => a > b,
                BinaryOp::Le => a <= b,
                _ => a >= b,
            }))
        }
        (BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge, Value::Str(a), Value::Str(b)) => {
            Ok(Value::Bool(match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Gt => a > b,
                BinaryOp::Le => a <= b,
                _ => a >= b,
            }))
        }

        _ => Err(illegal_operation(op, &lhs, &rhs, span, ctx)),
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("as_f64 called on a non-number"),
    }
}

/// Normalizes an index against a collection length, supporting negative
/// indices counting from the end.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

fn eval_index_get(
    obj: Value,
    index: Value,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    match (&obj, &index) {
        (Value::Array(elements), Value::Int(i)) => {
            let elements = elements.borrow();
            normalize_index(*i, elements.len())
                .map(|idx| elements[idx].clone())
                .ok_or_else(|| {
                    Error::tagged(ErrorKind::IndexError, span, ctx, format!("Index {i} out of bounds")).into()
                })
        }
        (Value::Str(s), Value::Int(i)) => {
            let count = s.chars().count();
            normalize_index(*i, count)
                .and_then(|idx| s.chars().nth(idx))
                .map(|c| Value::str(c.to_string()))
                .ok_or_else(|| {
                    Error::tagged(ErrorKind::IndexError, span, ctx, format!("Index {i} out of bounds")).into()
                })
        }
        (Value::Map(map), key) => {
            let Some(key) = MapKey::from_value(key) else {
                return Err(Error::tagged(
                    ErrorKind::TypeError,
                    span,
                    ctx,
                    format!("unhashable key of type '{}'", key.type_name()),
                )
                .into());
            };
            map.borrow().get(&key).cloned().ok_or_else(|| {
                Error::tagged(
                    ErrorKind::KeyError,
                    span,
                    ctx,
                    format!("Key {} not found", key.to_value().repr_string()),
                )
                .into()
            })
        }
        (Value::Instance(instance), _) => {
            match call_instance_hook(instance, "__index__", vec![index.clone()], span, ctx, machine) {
                Some(result) => result,
                None => Err(Error::tagged(
                    ErrorKind::TypeError,
                    span,
                    ctx,
                    format!("'{}' is not indexable", obj.type_name()),
                )
                .into()),
            }
        }
        _ => Err(Error::tagged(
            ErrorKind::TypeError,
            span,
            ctx,
            format!("'{}' is not indexable", obj.type_name()),
        )
        .into()),
    }
}

fn eval_index_set(
    obj: Value,
    index: Value,
    value: Value,
    span: &Span,
    ctx: &Rc<Context>,
    machine: &mut Machine,
) -> RunResult<Value> {
    match (&obj, &index) {
        (Value::Array(elements), Value::Int(i)) => {
            let mut elements = elements.borrow_mut();
            let len = elements.len();
            match normalize_index(*i, len) {
                Some(idx) => {
                    elements[idx] = value;
                    Ok(Value::Null)
                }
                None => Err(Error::tagged(ErrorKind::IndexError, span, ctx, format!("Index {i} out of bounds")).into()),
            }
        }
        (Value::Map(map), key) => {
            let Some(key) = MapKey::from_value(key) else {
                return Err(Error::tagged(
                    ErrorKind::TypeError,
                    span,
                    ctx,
                    format!("unhashable key of type '{}'", key.type_name()),
                )
                .into());
            };
            map.borrow_mut().insert(key, value);
            Ok(Value::Null)
        }
        (Value::Instance(instance), _) => {
            match call_instance_hook(instance, "__set_index__", vec![index.clone(), value], span, ctx, machine) {
                Some(result) => result,
                None => Err(Error::tagged(
                    ErrorKind::TypeError,
                    span,
                    ctx,
                    format!("'{}' does not support index assignment", obj.type_name()),
                )
                .into()),
            }
        }
        _ => Err(Error::tagged(
            ErrorKind::TypeError,
            span,
            ctx,
            format!("'{}' does not support index assignment", obj.type_name()),
        )
        .into()),
    }
}

fn eval_attr_get(obj: Value, attr: &str, span: &Span, ctx: &Rc<Context>) -> RunResult<Value> {
    let missing = |what: &str| -> Signal {
        Error::tagged(
            ErrorKind::AttributeError,
            span,
            ctx,
            format!("'{what}' has no attribute '{attr}'"),
        )
        .into()
    };
    match &obj {
        Value::Instance(instance) => instance_attr(instance, attr)
            .map(|value| bind_attr(value, instance))
            .ok_or_else(|| missing(&instance.class.name)),
        Value::Class(class) => class
            .symbol_table
            .borrow()
            .get_local(attr)
            .ok_or_else(|| missing(&class.name)),
        Value::Module(module) => module
            .symbol_table
            .borrow()
            .get_local(attr)
            .ok_or_else(|| missing(&module.name)),
        Value::BuiltinInstance(instance) => {
            classes::method_lookup(instance, attr).ok_or_else(|| missing(instance.class.name))
        }
        other => Err(missing(&other.type_name())),
    }
}

fn eval_attr_set(obj: Value, attr: &Rc<str>, value: Value, span: &Span, ctx: &Rc<Context>) -> RunResult<Value> {
    match &obj {
        Value::Instance(instance) => {
            instance.symbol_table.borrow_mut().set(Rc::clone(attr), value);
            Ok(Value::Null)
        }
        Value::Module(module) => {
            module.symbol_table.borrow_mut().set(Rc::clone(attr), value);
            Ok(Value::Null)
        }
        other => Err(Error::tagged(
            ErrorKind::TypeError,
            span,
            ctx,
            format!("cannot set attribute on '{}'", other.type_name()),
        )
        .into()),
    }
}

/// Materializes the items a `for` loop walks over.
///
/// Arrays iterate a snapshot of their elements, strings iterate characters,
/// hashmaps iterate keys, and instances go through their `__iter__` hook
/// (which must produce an array).
fn iter_items(iterable: Value, span: &Span, ctx: &Rc<Context>, machine: &mut Machine) -> RunResult<Vec<Value>> {
    match &iterable {
        Value::Array(elements) => Ok(elements.borrow().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
        Value::Map(map) => Ok(map.borrow().keys().map(MapKey::to_value).collect()),
        Value::Instance(instance) => {
            match call_instance_hook(instance, "__iter__", vec![], span, ctx, machine) {
                Some(result) => match result? {
                    Value::Array(elements) => Ok(elements.borrow().clone()),
                    other => Err(Error::tagged(
                        ErrorKind::TypeError,
                        span,
                        ctx,
                        format!("__iter__ must return an Array, not '{}'", other.type_name()),
                    )
                    .into()),
                },
                None => Err(Error::tagged(
                    ErrorKind::TypeError,
                    span,
                    ctx,
                    format!("'{}' is not iterable", iterable.type_name()),
                )
                .into()),
            }
        }
        _ => Err(Error::tagged(
            ErrorKind::TypeError,
            span,
            ctx,
            format!("'{}' is not iterable", iterable.type_name()),
        )
        .into()),
    }
}
