//! Public interface for running Radon code.
//!
//! `run` sequences lexer, parser and tree-walking interpreter against the
//! shared global symbol table. `require` uses the same pipeline through
//! `run_script` to load modules into the caller's scope.

use std::{
    cell::{OnceCell, RefCell},
    env,
    path::{Path, PathBuf},
    rc::Rc,
};

use strum::IntoEnumIterator as _;

use crate::{
    builtins::BuiltinFn,
    classes::builtin_classes,
    error::Error,
    interpreter::{Machine, eval},
    lexer::lex,
    parser::parse,
    position::Position,
    scope::{Context, SymbolTable},
    signal::Signal,
    value::Value,
};

/// Module names resolved under `<BASE_DIR>/stdlib/` instead of the caller's
/// working directory. Fixed at build time.
pub const STDLIBS: &[&str] = &["array", "math", "string"];

/// The sentinel substituted for file names when path hiding is on.
pub const REDACTED: &str = "[REDACTED]";

/// The installation root of the interpreter, used to locate `stdlib/`.
///
/// `RADON_HOME` overrides; the fallback is the build-time workspace root,
/// which keeps a development checkout self-hosting.
#[must_use]
pub fn base_dir() -> PathBuf {
    if let Ok(home) = env::var("RADON_HOME") {
        return PathBuf::from(home);
    }
    let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    workspace.canonicalize().unwrap_or(workspace)
}

thread_local! {
    /// The process-wide global symbol table, created once on first use.
    ///
    /// It holds `Rc` values and is therefore confined to one thread; running
    /// interpreters on several threads gives each thread its own table.
    /// Concurrent `run()` calls against one table require external
    /// serialization, which single-threaded execution provides by
    /// construction.
    static GLOBAL_SYMBOLS: OnceCell<Rc<RefCell<SymbolTable>>> = const { OnceCell::new() };
}

/// Returns the shared global symbol table, creating it on first call.
#[must_use]
pub fn global_symbol_table() -> Rc<RefCell<SymbolTable>> {
    GLOBAL_SYMBOLS.with(|cell| Rc::clone(cell.get_or_init(create_global_symbol_table)))
}

/// Populates the table every program context shares: the three literal
/// singletons, every builtin function under its stable name (plus the `cls`
/// alias), and the builtin classes.
fn create_global_symbol_table() -> Rc<RefCell<SymbolTable>> {
    let mut table = SymbolTable::new();
    table.set("null", Value::Null);
    table.set("false", Value::Bool(false));
    table.set("true", Value::Bool(true));
    for builtin in BuiltinFn::iter() {
        table.set(builtin.to_string(), Value::Builtin(builtin));
    }
    table.set("cls", Value::Builtin(BuiltinFn::Clear));
    for class in builtin_classes() {
        table.set(class.name, Value::BuiltinClass(class));
    }
    Rc::new(RefCell::new(table))
}

/// What a finished run produced: at most one of `value` and `error`, plus
/// whether `exit()` was reached.
#[derive(Debug)]
pub struct RunOutput {
    pub value: Option<Value>,
    pub error: Option<Error>,
    pub should_exit: bool,
}

impl RunOutput {
    fn error(error: Error) -> Self {
        Self {
            value: None,
            error: Some(error),
            should_exit: false,
        }
    }
}

/// Runs Radon source text to completion.
///
/// The program context shares the global symbol table, so top-level
/// definitions persist across runs within the thread.
pub fn run(file: &str, text: &str, machine: &mut Machine) -> RunOutput {
    run_with_context(file, text, machine, None, None, None)
}

/// The pipeline behind `require`: same as `run`, with the entry position of
/// the requiring call (for tracebacks) and the module's directory as the
/// import cwd.
pub(crate) fn run_script(
    file: &str,
    text: &str,
    machine: &mut Machine,
    entry_pos: Option<Position>,
    import_cwd: Option<PathBuf>,
) -> RunOutput {
    run_with_context(file, text, machine, None, entry_pos, import_cwd)
}

/// Runs source text under an optional parent context.
///
/// With no parent, the program context uses the shared global symbol table;
/// with a parent it inherits the parent's table, which is how a nested run
/// installs its definitions into the enclosing scope.
pub fn run_with_context(
    file: &str,
    text: &str,
    machine: &mut Machine,
    parent: Option<Rc<Context>>,
    entry_pos: Option<Position>,
    import_cwd: Option<PathBuf>,
) -> RunOutput {
    let file = if machine.hide_paths { REDACTED } else { file };

    let tokens = match lex(file, text) {
        Ok(tokens) => tokens,
        Err(error) => return RunOutput::error(error),
    };
    let ast = match parse(tokens) {
        Ok(ast) => ast,
        Err(error) => return RunOutput::error(error),
    };

    let ctx = match parent {
        Some(parent) => Rc::new(Context {
            display_name: Rc::from("<program>"),
            symbol_table: Rc::clone(&parent.symbol_table),
            import_cwd: import_cwd.or_else(|| parent.import_cwd.clone()),
            parent: Some(parent),
            parent_entry_pos: entry_pos,
        }),
        None => Context::program(global_symbol_table(), import_cwd),
    };

    match eval(&ast, &ctx, machine) {
        Ok(value) => RunOutput {
            value: Some(value),
            error: None,
            should_exit: false,
        },
        Err(Signal::Error(error)) => RunOutput::error(*error),
        Err(Signal::Exit(value)) => RunOutput {
            value: Some(value),
            error: None,
            should_exit: true,
        },
        Err(Signal::Return(value)) => RunOutput {
            value: Some(value),
            error: None,
            should_exit: false,
        },
        // Loop signals that escape every loop die at the program boundary.
        Err(Signal::Break | Signal::Continue | Signal::ContinueOuter) => RunOutput {
            value: None,
            error: None,
            should_exit: false,
        },
    }
}
