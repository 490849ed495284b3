use std::{cell::RefCell, path::PathBuf, rc::Rc};

use ahash::AHashMap;

use crate::{position::Position, value::Value};

/// A lexical scope: identifier bindings plus an optional parent scope.
///
/// `lookup` walks the parent chain; `set` and `remove` act on this table
/// only. The names `true`, `false` and `null` are reserved and pre-populated
/// in the global table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: AHashMap<Rc<str>, Value>,
    parent: Option<Rc<RefCell<SymbolTable>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Rc<RefCell<Self>>) -> Self {
        Self {
            symbols: AHashMap::new(),
            parent: Some(parent),
        }
    }

    /// Resolves a name against this table and its ancestors.
    pub fn lookup(table: &Rc<RefCell<Self>>, name: &str) -> Option<Value> {
        let mut current = Rc::clone(table);
        loop {
            let next = {
                let borrowed = current.borrow();
                if let Some(value) = borrowed.symbols.get(name) {
                    return Some(value.clone());
                }
                borrowed.parent.clone()
            };
            current = next?;
        }
    }

    /// Looks up a name in this table only, ignoring ancestors.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.symbols.get(name).cloned()
    }

    pub fn set(&mut self, name: impl Into<Rc<str>>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) {
        self.symbols.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates this table's own bindings (not ancestors'), in no
    /// particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.symbols.iter()
    }
}

/// A runtime scope record: the display name rendered in tracebacks, the
/// parent context, the position at which this context was entered, the
/// symbol table, and the directory `require` resolves user modules against.
///
/// The parent chain is finite and acyclic, terminating in the root
/// `<program>` context. Values that must refer back to their defining
/// context (functions) hold a `Weak` edge to avoid ownership cycles.
#[derive(Debug)]
pub struct Context {
    pub display_name: Rc<str>,
    pub parent: Option<Rc<Context>>,
    pub parent_entry_pos: Option<Position>,
    pub symbol_table: Rc<RefCell<SymbolTable>>,
    pub import_cwd: Option<PathBuf>,
}

impl Context {
    /// The root context of a program run.
    pub fn program(symbol_table: Rc<RefCell<SymbolTable>>, import_cwd: Option<PathBuf>) -> Rc<Self> {
        Rc::new(Self {
            display_name: Rc::from("<program>"),
            parent: None,
            parent_entry_pos: None,
            symbol_table,
            import_cwd,
        })
    }

    /// A child context entered at `entry_pos`, inheriting the parent's
    /// import cwd.
    pub fn child(
        display_name: Rc<str>,
        parent: &Rc<Self>,
        entry_pos: Position,
        symbol_table: Rc<RefCell<SymbolTable>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            display_name,
            parent: Some(Rc::clone(parent)),
            parent_entry_pos: Some(entry_pos),
            symbol_table,
            import_cwd: parent.import_cwd.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lookup_walks_the_parent_chain() {
        let parent = Rc::new(RefCell::new(SymbolTable::new()));
        parent.borrow_mut().set("a", Value::Int(1));
        let child = Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(&parent))));
        child.borrow_mut().set("b", Value::Int(2));

        assert_eq!(SymbolTable::lookup(&child, "a"), Some(Value::Int(1)));
        assert_eq!(SymbolTable::lookup(&child, "b"), Some(Value::Int(2)));
        assert_eq!(SymbolTable::lookup(&child, "c"), None);
    }

    #[test]
    fn set_shadows_without_touching_parent() {
        let parent = Rc::new(RefCell::new(SymbolTable::new()));
        parent.borrow_mut().set("a", Value::Int(1));
        let child = Rc::new(RefCell::new(SymbolTable::with_parent(Rc::clone(&parent))));
        child.borrow_mut().set("a", Value::Int(9));

        assert_eq!(SymbolTable::lookup(&child, "a"), Some(Value::Int(9)));
        assert_eq!(SymbolTable::lookup(&parent, "a"), Some(Value::Int(1)));

        child.borrow_mut().remove("a");
        assert_eq!(SymbolTable::lookup(&child, "a"), Some(Value::Int(1)));
    }
}
