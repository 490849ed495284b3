use std::{cell::RefCell, fmt::Write as _, rc::Rc};

use indexmap::IndexMap;

use crate::{
    builtins::BuiltinFn,
    classes::{BoundBuiltinMethod, BuiltinClass, BuiltinInstance},
    function::Function,
    scope::{Context, SymbolTable},
};

/// A Radon runtime value.
///
/// Small immediate values (`Null`, `Bool`, `Int`, `Float`) are stored inline;
/// everything shared or mutable sits behind an `Rc`. Arrays and hashmaps are
/// mutable in place, so they carry a `RefCell`. Functions hold a weak edge to
/// their defining context (see `Function`), which keeps the
/// context <-> value graph acyclic under reference counting.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<IndexMap<MapKey, Value>>>),
    /// The reified runtime type of a value, as produced by `type()`.
    Type(Rc<str>),
    Function(Rc<Function>),
    Builtin(BuiltinFn),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    BuiltinClass(Rc<BuiltinClass>),
    BuiltinInstance(Rc<BuiltinInstance>),
    /// A method looked up on an instance, bound to its receiver.
    Method(Rc<BoundMethod>),
    Module(Rc<Module>),
}

/// A user-defined class: a name and the symbol table its body populated
/// (methods and class-level attributes).
#[derive(Debug)]
pub struct Class {
    pub name: Rc<str>,
    pub symbol_table: Rc<RefCell<SymbolTable>>,
}

/// An instance of a user-defined class.
///
/// Attribute lookup consults the instance table first, then the class table;
/// both lookups are local so enclosing scopes never leak in as attributes.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub symbol_table: Rc<RefCell<SymbolTable>>,
}

/// A loaded module: a name and the symbol table of its finished program
/// context.
#[derive(Debug)]
pub struct Module {
    pub name: Rc<str>,
    pub symbol_table: Rc<RefCell<SymbolTable>>,
}

impl Module {
    /// Reifies a finished program context as a module value, sharing its
    /// symbol table.
    pub fn reify(name: impl Into<Rc<str>>, context: &Context) -> Self {
        Self {
            name: name.into(),
            symbol_table: Rc::clone(&context.symbol_table),
        }
    }
}

/// A method bound to its receiver at attribute-access time.
#[derive(Debug)]
pub enum BoundMethod {
    /// A user function found on an instance or its class; calling it binds
    /// `this` to the receiver.
    User { recv: Rc<Instance>, func: Rc<Function> },
    /// A builtin-class method; calling it runs the host handler against the
    /// receiver's host state.
    Builtin(BoundBuiltinMethod),
}

/// A hashable key of a Radon hashmap.
///
/// Mutable and floating-point values cannot key a map; `from_value` returns
/// `None` for them and the caller raises `TypeError: unhashable key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Null,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
}

impl MapKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Int(n) => Some(Self::Int(*n)),
            Value::Str(s) => Some(Self::Str(Rc::clone(s))),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(n) => Value::Int(*n),
            Self::Str(s) => Value::Str(Rc::clone(s)),
        }
    }
}

impl Value {
    /// Builds a string value.
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// Builds an array value from elements.
    pub fn array(elements: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(elements)))
    }

    /// The runtime type name, as reported by `type()` and error messages.
    ///
    /// Instances report their class name.
    pub fn type_name(&self) -> Rc<str> {
        match self {
            Self::Null => Rc::from("Null"),
            Self::Bool(_) => Rc::from("Boolean"),
            Self::Int(_) | Self::Float(_) => Rc::from("Number"),
            Self::Str(_) => Rc::from("String"),
            Self::Array(_) => Rc::from("Array"),
            Self::Map(_) => Rc::from("HashMap"),
            Self::Type(_) => Rc::from("Type"),
            Self::Function(_) | Self::Builtin(_) | Self::Method(_) => Rc::from("Function"),
            Self::Class(c) => Rc::clone(&c.name),
            Self::Instance(i) => Rc::clone(&i.class.name),
            Self::BuiltinClass(c) => Rc::from(c.name),
            Self::BuiltinInstance(i) => Rc::from(i.class.name),
            Self::Module(_) => Rc::from("Module"),
        }
    }

    /// The truth protocol: `null`, zero, and empty strings/arrays/hashmaps
    /// are false; everything else is true.
    pub fn is_true(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Array(a) => !a.borrow().is_empty(),
            Self::Map(m) => !m.borrow().is_empty(),
            _ => true,
        }
    }

    /// Structural equality.
    ///
    /// Numbers compare across the integer/float split; arrays and hashmaps
    /// compare element-wise; callables, classes, instances and modules
    /// compare by identity.
    pub fn eq_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.eq_value(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.eq_value(other)))
            }
            (Self::Type(a), Self::Type(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            (Self::BuiltinClass(a), Self::BuiltinClass(b)) => Rc::ptr_eq(a, b),
            (Self::BuiltinInstance(a), Self::BuiltinInstance(b)) => Rc::ptr_eq(a, b),
            (Self::Module(a), Self::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The display form: what `print` writes. Strings appear raw; inside
    /// containers they appear quoted (see `repr_string`).
    pub fn display_string(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            other => other.repr_string(),
        }
    }

    /// The repr form: strings are quoted and escaped, containers render
    /// their elements in repr form.
    pub fn repr_string(&self) -> String {
        let mut out = String::new();
        self.repr_into(&mut out);
        out
    }

    fn repr_into(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Float(n) => {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*n));
            }
            Self::Str(s) => {
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        '\r' => out.push_str("\\r"),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            Self::Array(elements) => {
                out.push('[');
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    element.repr_into(out);
                }
                out.push(']');
            }
            Self::Map(map) => {
                out.push('{');
                for (i, (key, value)) in map.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.to_value().repr_into(out);
                    out.push_str(": ");
                    value.repr_into(out);
                }
                out.push('}');
            }
            Self::Type(name) => {
                let _ = write!(out, "<class '{name}'>");
            }
            Self::Function(f) => {
                let _ = write!(out, "<function {}>", f.name);
            }
            Self::Builtin(b) => {
                let _ = write!(out, "<built-in function {b}>");
            }
            Self::Class(c) => {
                let _ = write!(out, "<class {}>", c.name);
            }
            Self::Instance(i) => {
                let _ = write!(out, "<{} instance>", i.class.name);
            }
            Self::BuiltinClass(c) => {
                let _ = write!(out, "<built-in class {}>", c.name);
            }
            Self::BuiltinInstance(i) => {
                // Host objects can provide their own display form.
                if let Some(display) = i.state.borrow().display() {
                    out.push_str(&display);
                } else {
                    let _ = write!(out, "<{} instance>", i.class.name);
                }
            }
            Self::Method(m) => match m.as_ref() {
                BoundMethod::User { func, .. } => {
                    let _ = write!(out, "<bound method {}>", func.name);
                }
                BoundMethod::Builtin(b) => {
                    let _ = write!(out, "<bound method {}>", b.spec.name);
                }
            },
            Self::Module(m) => {
                let _ = write!(out, "<module {}>", m.name);
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn truthiness_of_empty_and_zero_values() {
        assert!(!Value::Null.is_true());
        assert!(!Value::Int(0).is_true());
        assert!(!Value::Float(0.0).is_true());
        assert!(!Value::str("").is_true());
        assert!(!Value::array(vec![]).is_true());
        assert!(!Value::Map(Rc::new(RefCell::new(IndexMap::new()))).is_true());

        assert!(Value::Int(-1).is_true());
        assert!(Value::Float(0.5).is_true());
        assert!(Value::str("x").is_true());
        assert!(Value::array(vec![Value::Null]).is_true());
        assert!(Value::Bool(true).is_true());
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert!(Value::Int(1) != Value::Float(1.5));
    }

    #[test]
    fn display_and_repr_of_strings_differ() {
        let s = Value::str("a\"b");
        assert_eq!(s.display_string(), "a\"b");
        assert_eq!(s.repr_string(), "\"a\\\"b\"");
    }

    #[test]
    fn arrays_render_elements_in_repr_form() {
        let arr = Value::array(vec![Value::Int(1), Value::str("x"), Value::Float(2.5)]);
        assert_eq!(arr.display_string(), "[1, \"x\", 2.5]");
    }

    #[test]
    fn floats_keep_their_point() {
        assert_eq!(Value::Float(5.0).display_string(), "5.0");
    }
}
