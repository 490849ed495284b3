use std::{env, fs};

use pretty_assertions::assert_eq;
use radon::{CollectStringPrint, Machine, QueuedInput, RunOutput, Value, run};

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

fn eval_display(src: &str) -> String {
    eval_value(src).display_string()
}

#[test]
fn string_object_case_methods() {
    assert_eq!(eval_display("String(\"Hello\").upper()"), "HELLO");
    assert_eq!(eval_display("String(\"Hello\").lower()"), "hello");
    assert_eq!(eval_display("String(\"hello world\").title()"), "Hello World");
    assert_eq!(eval_display("String(\"hELLO\").capitalize()"), "Hello");
    assert_eq!(eval_display("String(\"AbC\").swapcase()"), "aBc");
}

#[test]
fn string_object_search_methods() {
    assert_eq!(eval_value("String(\"banana\").count(\"an\")"), Value::Int(2));
    assert_eq!(eval_value("String(\"banana\").find(\"nan\")"), Value::Int(2));
    assert_eq!(eval_value("String(\"banana\").startswith(\"ban\")"), Value::Bool(true));
    assert_eq!(eval_value("String(\"banana\").endswith(\"ana\")"), Value::Bool(true));
    assert_eq!(eval_value("String(\"banana\").length()"), Value::Int(6));
}

#[test]
fn string_object_transform_methods() {
    assert_eq!(eval_display("String(\"a b c\").split(\" \")"), "[\"a\", \"b\", \"c\"]");
    assert_eq!(eval_display("String(\"abc\").join(\"-\")"), "a-b-c");
    assert_eq!(eval_display("String(\"  pad  \").strip(\"\")"), "pad");
    assert_eq!(eval_display("String(\"xxabxx\").strip(\"x\")"), "ab");
    assert_eq!(eval_display("String(\"xxab\").lstrip(\"x\")"), "ab");
    assert_eq!(eval_display("String(\"abxx\").rstrip(\"x\")"), "ab");
    assert_eq!(eval_display("String(\"a.b\").replace(\".\", \"-\")"), "a-b");
}

#[test]
fn string_object_count_rejects_empty_needle() {
    let (output, _) = run_code("String(\"abc\").count(\"\")");
    assert_eq!(output.error.expect("expected an error").message, "Cannot count an empty string");
    let (output, _) = run_code("String(\"abc\").count(1)");
    assert_eq!(output.error.expect("expected an error").message, "Cannot count a non-string");
}

#[test]
fn string_object_operators() {
    // __add__ accepts plain strings and other String instances.
    assert_eq!(eval_display("String(\"ab\") + \"cd\""), "abcd");
    assert_eq!(eval_display("String(\"ab\") + String(\"cd\")"), "abcd");
    // __len__ feeds the len builtin; __string_display__ feeds print.
    assert_eq!(eval_value("len(String(\"four\"))"), Value::Int(4));
    let (_, stdout) = run_code("print(String(\"shown\"))");
    assert_eq!(stdout, "shown\n");
}

#[test]
fn string_object_defaults_to_empty() {
    assert_eq!(eval_value("len(String())"), Value::Int(0));
}

#[test]
fn file_object_write_read_close() {
    let path = env::temp_dir().join(format!("radon_file_test_{}.txt", std::process::id()));
    let path_str = path.display().to_string();
    let src = format!(
        "let f = File(\"{path_str}\", \"w\")\nf.write(\"line one\")\nf.close()\nlet g = File(\"{path_str}\")\nlet text = g.read()\ng.close()\ntext"
    );
    let value = eval_value(&src);
    assert_eq!(value, Value::str("line one"));
    fs::remove_file(&path).ok();
}

#[test]
fn file_object_close_is_observable() {
    let path = env::temp_dir().join(format!("radon_file_close_{}.txt", std::process::id()));
    fs::write(&path, "x").unwrap();
    let path_str = path.display().to_string();
    let src = format!("let f = File(\"{path_str}\")\nlet before = f.is_closed()\nf.close()\n[before, f.is_closed()]");
    assert_eq!(eval_display(&src), "[false, true]");

    let src = format!("let f = File(\"{path_str}\")\nf.close()\nf.read()");
    let (output, _) = run_code(&src);
    assert_eq!(output.error.expect("expected an error").message, "I/O operation on closed file");
    fs::remove_file(&path).ok();
}

#[test]
fn file_object_missing_file_errors() {
    let (output, _) = run_code("File(\"/definitely/not/here.txt\")");
    let error = output.error.expect("expected an error");
    assert!(error.message.starts_with("Could not open file"));
}

#[test]
fn json_loads_nested_structures() {
    let src = "let j = Json()\nlet v = j.loads(\"{\\\"a\\\": [1, 2.5, null], \\\"b\\\": {\\\"c\\\": true}}\")\nv[\"a\"]";
    assert_eq!(eval_display(src), "[1, 2.5, null]");
}

#[test]
fn json_dumps_maps_and_arrays() {
    assert_eq!(
        eval_display("Json().dumps({\"a\": 1, \"b\": [true, null]})"),
        "{\"a\":1,\"b\":[true,null]}"
    );
}

#[test]
fn json_rejects_invalid_text_and_unserializable_values() {
    let (output, _) = run_code("Json().loads(\"{oops\")");
    assert!(output.error.expect("expected an error").message.starts_with("Invalid JSON"));
    let (output, _) = run_code("Json().dumps(print)");
    assert_eq!(
        output.error.expect("expected an error").message,
        "Object of type \"Function\" is not JSON serializable"
    );
    assert_eq!(eval_value("Json().is_valid(\"[1, 2]\")"), Value::Bool(true));
    assert_eq!(eval_value("Json().is_valid(\"[1,\")"), Value::Bool(false));
}

#[test]
fn builtins_object_introspection() {
    assert_eq!(eval_value("builtins().has(\"print\")"), Value::Bool(true));
    assert_eq!(eval_value("builtins().has(\"no_such_builtin\")"), Value::Bool(false));
    let src = "let names = builtins().names()\n[arr_len(names) > 40, arr_contains_name(names)]";
    // Spot-check membership without a stdlib dependency.
    let helper = "fun arr_contains_name(names) {\n    for n in names {\n        if n == \"require\" {\n            return true\n        }\n    }\n    return false\n}\n";
    assert_eq!(eval_display(&format!("{helper}{src}")), "[true, true]");
}

#[test]
fn requests_object_constructs_without_network() {
    // Construction allocates the agent only; no request is made.
    assert_eq!(eval_display("let r = Requests()\ntype(r)"), "<class 'Requests'>");
    let (output, _) = run_code("Requests().get(123)");
    assert_eq!(output.error.expect("expected an error").message, "URL must be a string");
}
