use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    ast::Node,
    error::Error,
    position::Span,
    scope::{Context, SymbolTable},
    signal::RunResult,
    value::Value,
};

/// A user-defined function.
///
/// `defaults` is index-aligned with `arg_names`: `None` marks a required
/// parameter, `Some` carries the default value evaluated at definition time.
///
/// The lexical environment is captured as the owner edge (`closure_table`,
/// strong) so functions installed into the global table by `require` keep
/// resolving names after their program context is gone. The context itself
/// is the back-edge (`defining_ctx`, weak): it only parents call contexts
/// for traceback rendering, and a call falls back to the call-site context
/// when the definer has been dropped.
#[derive(Debug)]
pub struct Function {
    pub name: Rc<str>,
    pub arg_names: Vec<Rc<str>>,
    pub defaults: Vec<Option<Value>>,
    pub body: Rc<[Node]>,
    pub auto_return: bool,
    pub desc: Option<Rc<str>>,
    pub closure_table: Rc<RefCell<SymbolTable>>,
    pub defining_ctx: Weak<Context>,
}

impl Function {
    /// The context a call of this function should hang off: the defining
    /// context while it lives, the call site once it is gone.
    pub fn call_parent(&self, call_site: &Rc<Context>) -> Rc<Context> {
        self.defining_ctx.upgrade().unwrap_or_else(|| Rc::clone(call_site))
    }
}

/// Validates arity and binds arguments into a call's fresh symbol table.
///
/// The steps, in order:
/// 1. keyword arguments are rejected for builtins;
/// 2. more positionals than parameters fails with "too many args";
/// 3. fewer positionals than required parameters fails with "too few args";
/// 4. positionals bind left to right, keywords fill remaining names,
///    defaults cover the rest.
///
/// On success every parameter name has a binding in `table`.
#[expect(clippy::too_many_arguments, reason = "the call protocol carries the full call shape")]
pub fn check_and_populate_args<N: AsRef<str>>(
    name: &str,
    arg_names: &[N],
    defaults: &[Option<Value>],
    args: Vec<Value>,
    kwargs: Vec<(Rc<str>, Value)>,
    builtin: bool,
    table: &Rc<RefCell<SymbolTable>>,
    span: &Span,
    ctx: &Rc<Context>,
) -> RunResult<()> {
    debug_assert_eq!(arg_names.len(), defaults.len());

    if builtin && !kwargs.is_empty() {
        return Err(Error::rt(span, ctx, "Keyword arguments are not yet supported for built-in functions.").into());
    }

    if args.len() > arg_names.len() {
        return Err(Error::rt(span, ctx, format!("too many args passed into '{name}'")).into());
    }
    let required = defaults.iter().filter(|d| d.is_none()).count();
    if args.len() < required {
        return Err(Error::rt(span, ctx, format!("too few args passed into '{name}'")).into());
    }

    let positional_count = args.len();
    let mut bound: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    bound.resize_with(arg_names.len(), || None);

    for (key, value) in kwargs {
        let Some(index) = arg_names.iter().position(|n| n.as_ref() == key.as_ref()) else {
            return Err(Error::rt(span, ctx, format!("unexpected keyword argument '{key}' for '{name}'")).into());
        };
        if index < positional_count || bound[index].is_some() {
            return Err(Error::rt(span, ctx, format!("'{name}' got multiple values for argument '{key}'")).into());
        }
        bound[index] = Some(value);
    }

    let mut table = table.borrow_mut();
    for (index, slot) in bound.into_iter().enumerate() {
        let value = match slot {
            Some(value) => value,
            // Count checks above guarantee unbound slots have defaults.
            None => defaults[index].clone().expect("unbound parameter without default"),
        };
        table.set(arg_names[index].as_ref(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn names(names: &[&str]) -> Vec<Rc<str>> {
        names.iter().map(|n| Rc::from(*n)).collect()
    }

    fn call(
        arg_names: &[Rc<str>],
        defaults: &[Option<Value>],
        args: Vec<Value>,
        kwargs: Vec<(Rc<str>, Value)>,
        builtin: bool,
    ) -> (RunResult<()>, Rc<RefCell<SymbolTable>>) {
        let table = Rc::new(RefCell::new(SymbolTable::new()));
        let ctx = Context::program(Rc::clone(&table), None);
        let result = check_and_populate_args(
            "f",
            arg_names,
            defaults,
            args,
            kwargs,
            builtin,
            &table,
            &Span::internal(),
            &ctx,
        );
        (result, table)
    }

    #[test]
    fn binds_positionals_then_defaults() {
        let (result, table) = call(
            &names(&["x", "y"]),
            &[None, Some(Value::Int(2))],
            vec![Value::Int(3)],
            vec![],
            false,
        );
        result.unwrap();
        let table = table.borrow();
        assert_eq!(table.get_local("x"), Some(Value::Int(3)));
        assert_eq!(table.get_local("y"), Some(Value::Int(2)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn too_few_and_too_many() {
        let arg_names = names(&["x", "y"]);
        let defaults = [None, Some(Value::Int(2))];

        let (result, _) = call(&arg_names, &defaults, vec![], vec![], false);
        let err = result.unwrap_err().into_error().unwrap();
        assert_eq!(err.kind, ErrorKind::RTError);
        assert_eq!(err.message, "too few args passed into 'f'");

        let (result, _) = call(
            &arg_names,
            &defaults,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            vec![],
            false,
        );
        let err = result.unwrap_err().into_error().unwrap();
        assert_eq!(err.message, "too many args passed into 'f'");
    }

    #[test]
    fn kwargs_fill_remaining_names() {
        let (result, table) = call(
            &names(&["x", "y"]),
            &[None, Some(Value::Int(2))],
            vec![Value::Int(1)],
            vec![(Rc::from("y"), Value::Int(9))],
            false,
        );
        result.unwrap();
        assert_eq!(table.borrow().get_local("y"), Some(Value::Int(9)));
    }

    #[test]
    fn kwargs_rejected_for_builtins() {
        let (result, _) = call(
            &names(&["x"]),
            &[None],
            vec![],
            vec![(Rc::from("x"), Value::Int(1))],
            true,
        );
        let err = result.unwrap_err().into_error().unwrap();
        assert_eq!(err.message, "Keyword arguments are not yet supported for built-in functions.");
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let (result, _) = call(
            &names(&["x"]),
            &[None],
            vec![Value::Int(1)],
            vec![(Rc::from("x"), Value::Int(2))],
            false,
        );
        let err = result.unwrap_err().into_error().unwrap();
        assert_eq!(err.message, "'f' got multiple values for argument 'x'");
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let (result, _) = call(
            &names(&["x"]),
            &[None],
            vec![Value::Int(1)],
            vec![(Rc::from("z"), Value::Int(2))],
            false,
        );
        let err = result.unwrap_err().into_error().unwrap();
        assert_eq!(err.message, "unexpected keyword argument 'z' for 'f'");
    }
}
