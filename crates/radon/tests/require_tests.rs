use std::{env, fs, rc::Rc};

use pretty_assertions::assert_eq;
use radon::{
    CollectStringPrint, Context, ErrorKind, Machine, Module, QueuedInput, RunOutput, Value,
    global_symbol_table, run,
};

fn run_code(src: &str) -> (RunOutput, String) {
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(Vec::<String>::new());
    let mut machine = Machine::new(&mut out, &mut input);
    let output = run("test.rn", src, &mut machine);
    drop(machine);
    (output, out.into_output())
}

fn eval_value(src: &str) -> Value {
    let (output, _) = run_code(src);
    assert!(output.error.is_none(), "unexpected error: {:?}", output.error);
    output.value.expect("run produced no value")
}

fn write_module(name: &str, text: &str) -> String {
    let path = env::temp_dir().join(format!("{name}_{}.rn", std::process::id()));
    fs::write(&path, text).unwrap();
    path.display().to_string()
}

#[test]
fn require_installs_top_level_names_and_returns_null() {
    let path = write_module(
        "radon_req_install",
        "let exported_value = 7\nfun exported_fun(x) -> x * 2\n",
    );
    let src = format!("let r = require(\"{path}\")\n[is_null(r), exported_fun(exported_value)]");
    assert_eq!(eval_value(&src).display_string(), "[true, 14]");
    fs::remove_file(&path).ok();
}

#[test]
fn required_functions_survive_their_module_run() {
    let path = write_module("radon_req_survive", "fun survivor() -> 99\n");
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(Vec::<String>::new());
    let mut machine = Machine::new(&mut out, &mut input);
    let first = run("a.rn", &format!("require(\"{path}\")"), &mut machine);
    assert!(first.error.is_none(), "unexpected error: {:?}", first.error);
    // A later run calls the imported function after the module's program
    // context is gone.
    let second = run("b.rn", "survivor()", &mut machine);
    assert!(second.error.is_none(), "unexpected error: {:?}", second.error);
    assert_eq!(second.value, Some(Value::Int(99)));
    fs::remove_file(&path).ok();
}

#[test]
fn require_of_missing_module() {
    let (output, _) = run_code("require(\"not_a_module.rn\")");
    let error = output.error.expect("expected an error");
    assert_eq!(error.kind, ErrorKind::RNModuleNotFoundError);
    assert!(
        error.message.starts_with("No module named 'not_a_module.rn'"),
        "message: {}",
        error.message
    );
}

#[test]
fn require_demands_the_rn_extension() {
    let (output, _) = run_code("require(\"module.txt\")");
    assert_eq!(
        output.error.expect("expected an error").message,
        "A Radon script must have a .rn extension"
    );
}

#[test]
fn require_wraps_nested_failures() {
    let path = write_module("radon_req_broken", "let x = 1\nundefined_name\n");
    let (output, _) = run_code(&format!("require(\"{path}\")"));
    let error = output.error.expect("expected an error");
    assert!(
        error.message.starts_with(&format!("Failed to finish executing script \"{path}\"")),
        "message: {}",
        error.message
    );
    assert!(error.message.contains("NameError"), "message: {}", error.message);
    fs::remove_file(&path).ok();
}

#[test]
fn require_propagates_exit() {
    let path = write_module("radon_req_exit", "exit()\n");
    let (output, _) = run_code(&format!("require(\"{path}\")\nprint(\"unreachable\")"));
    assert!(output.should_exit);
    assert!(output.error.is_none());
    fs::remove_file(&path).ok();
}

#[test]
fn stdlib_math_module() {
    let src = "require(\"math\")\n[abs(0 - 5), factorial(5), max(2, 9), clamp(12, 0, 10)]";
    assert_eq!(eval_value(src).display_string(), "[5, 120, 9, 10]");
}

#[test]
fn stdlib_array_module() {
    let src = "require(\"array\")\n[arr_reverse([1, 2, 3]), arr_map([1, 2, 3], fun (x) -> x * x), arr_sum([1, 2, 3])]";
    assert_eq!(eval_value(src).display_string(), "[[3, 2, 1], [1, 4, 9], 6]");
}

#[test]
fn stdlib_string_module() {
    let src = "require(\"string\")\n[str_upper(\"abc\"), str_contains(\"hello\", \"ell\"), str_reverse(\"abc\"), str_join([\"a\", \"b\"], \"-\")]";
    assert_eq!(eval_value(src).display_string(), "[\"ABC\", true, \"cba\", \"a-b\"]");
}

#[test]
fn dir_partitions_and_sorts_module_symbols() {
    // Populate the (thread-local) global table, then reify it as a module.
    let (output, _) = run_code("let answer = 42\nfun helper() -> 1\nclass Thing {}");
    assert!(output.error.is_none());
    let ctx = Context::program(global_symbol_table(), None);
    let module = Value::Module(Rc::new(Module::reify("m", &ctx)));
    global_symbol_table().borrow_mut().set("m", module);

    let listing = eval_value("dir(m)").display_string();
    // Variables first, then functions, then classes; reserved literals and
    // builtin functions are excluded.
    assert_eq!(
        listing,
        "[\"answer\", \"helper\", \"File\", \"Json\", \"Requests\", \"String\", \"Thing\", \"builtins\"]"
    );
}

#[test]
fn dir_rejects_primitives() {
    let (output, _) = run_code("dir(42)");
    let error = output.error.expect("expected an error");
    assert_eq!(error.kind, ErrorKind::TypeError);
    assert_eq!(error.message, "Argument must be a module or class");
}

#[test]
fn dir_of_builtin_instance_lists_methods() {
    let listing = eval_value("dir(String(\"x\"))").display_string();
    assert!(listing.contains("\"upper\""), "listing: {listing}");
    assert!(listing.contains("\"strip\""), "listing: {listing}");
}
