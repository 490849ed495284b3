use pretty_assertions::assert_eq;
use radon::{CollectStringPrint, ErrorKind, Machine, QueuedInput, RunOutput, SecurityGate, Value, run};

fn run_with_input(src: &str, lines: &[&str]) -> (RunOutput, String) {
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(lines.iter().copied());
    let mut machine = Machine::new(&mut out, &mut input);
    let output = run("test.rn", src, &mut machine);
    drop(machine);
    (output, out.into_output())
}

fn run_code(src: &str) -> (RunOutput, String) {
    run_with_input(src, &[])
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
fn type_predicates() {
    assert_eq!(eval_value("is_num(1)"), Value::Bool(true));
    assert_eq!(eval_value("is_num(1.5)"), Value::Bool(true));
    assert_eq!(eval_value("is_int(1)"), Value::Bool(true));
    assert_eq!(eval_value("is_int(1.5)"), Value::Bool(false));
    assert_eq!(eval_value("is_float(1.5)"), Value::Bool(true));
    assert_eq!(eval_value("is_str(\"x\")"), Value::Bool(true));
    assert_eq!(eval_value("is_bool(true)"), Value::Bool(true));
    assert_eq!(eval_value("is_array([])"), Value::Bool(true));
    assert_eq!(eval_value("is_fun(print)"), Value::Bool(true));
    assert_eq!(eval_value("fun f() -> 1\nis_fun(f)"), Value::Bool(true));
    assert_eq!(eval_value("is_null(null)"), Value::Bool(true));
    assert_eq!(eval_value("is_null(0)"), Value::Bool(false));
}

#[test]
fn truth_protocol() {
    for falsy in ["null", "0", "0.0", "\"\"", "[]", "{}"] {
        assert_eq!(eval_value(&format!("bool({falsy})")), Value::Bool(false), "bool({falsy})");
    }
    for truthy in ["1", "-1", "0.5", "\"x\"", "[0]", "{\"k\": 0}", "print"] {
        assert_eq!(eval_value(&format!("bool({truthy})")), Value::Bool(true), "bool({truthy})");
    }
}

#[test]
fn casts_roundtrip_integers() {
    // str(int(x)) == str(x) for integer numbers.
    for x in ["0", "7", "-13", "1000000"] {
        assert_eq!(eval_display(&format!("str(int({x}))")), eval_display(&format!("str({x})")));
    }
    assert_eq!(eval_value("int(\"42\")"), Value::Int(42));
    assert_eq!(eval_value("int(2.9)"), Value::Int(2));
    assert_eq!(eval_value("float(2)"), Value::Float(2.0));
    assert_eq!(eval_value("float(\"2.5\")"), Value::Float(2.5));
}

#[test]
fn failed_casts_error() {
    let (output, _) = run_code("int(\"not a number\")");
    assert_eq!(output.error.expect("expected an error").message, "Could not convert to int");
}

#[test]
fn str_of_array_uses_bracketed_form() {
    assert_eq!(eval_display("str([1, 2, 3])"), "[1, 2, 3]");
    assert_eq!(eval_display("str(\"plain\")"), "plain");
}

#[test]
fn type_reifies_the_runtime_type() {
    assert_eq!(eval_display("type(1)"), "<class 'Number'>");
    assert_eq!(eval_display("type(\"x\")"), "<class 'String'>");
    assert_eq!(eval_value("type(1) == type(2)"), Value::Bool(true));
    assert_eq!(eval_value("type(1) == type(\"x\")"), Value::Bool(false));
}

#[test]
fn array_builtins() {
    assert_eq!(eval_display("let a = [1]\narr_append(a, 2)\na"), "[1, 2]");
    assert_eq!(eval_value("let a = [1, 2, 3]\narr_pop(a, -1)"), Value::Int(3));
    assert_eq!(eval_display("let a = [1, 2, 3]\narr_pop(a, 0)\na"), "[2, 3]");
    assert_eq!(eval_display("let a = [1]\narr_extend(a, [2, 3])\na"), "[1, 2, 3]");
    assert_eq!(eval_value("arr_len([1, 2, 3])"), Value::Int(3));
    assert_eq!(eval_value("arr_get([1, 2, 3], 1)"), Value::Int(2));
    assert_eq!(eval_value("arr_get([1, 2, 3], -1)"), Value::Int(3));
}

#[test]
fn arr_pop_out_of_bounds() {
    let (output, _) = run_code("arr_pop([1], 5)");
    assert_eq!(
        output.error.expect("expected an error").message,
        "Element at this index could not be removed from array because index is out of bounds"
    );
}

#[test]
fn arr_type_errors() {
    let (output, _) = run_code("arr_append(1, 2)");
    assert_eq!(output.error.expect("expected an error").message, "First argument must be array");
}

#[test]
fn arr_chunk_concatenation_equals_input() {
    for (len, n) in [(0_i64, 1_i64), (1, 1), (5, 2), (6, 2), (7, 3), (9, 4)] {
        let src = format!(
            "let a = []\nlet i = 0\nwhile i < {len} {{\n    arr_append(a, i)\n    i = i + 1\n}}\nlet joined = []\nfor chunk in arr_chunk(a, {n}) {{\n    arr_extend(joined, chunk)\n}}\njoined == a"
        );
        assert_eq!(eval_value(&src), Value::Bool(true), "len={len} n={n}");
    }
    // Every chunk but the last is full.
    assert_eq!(eval_display("arr_chunk([1, 2, 3, 4, 5], 2)"), "[[1, 2], [3, 4], [5]]");
}

#[test]
fn string_builtins() {
    assert_eq!(eval_value("str_len(\"hello\")"), Value::Int(5));
    assert_eq!(eval_value("str_find(\"hello\", \"ll\")"), Value::Int(2));
    assert_eq!(eval_value("str_find(\"hello\", \"zz\")"), Value::Int(-1));
    assert_eq!(eval_display("str_get(\"hello\", 1)"), "e");
    let (output, _) = run_code("str_get(\"hi\", 9)");
    assert_eq!(output.error.expect("expected an error").kind, ErrorKind::IndexError);
}

#[test]
fn len_matches_element_and_character_counts() {
    assert_eq!(eval_value("len([1, 2, 3])"), Value::Int(3));
    assert_eq!(eval_value("len(\"hello\")"), Value::Int(5));
    assert_eq!(eval_value("len({\"a\": 1})"), Value::Int(1));
    assert_eq!(eval_value("len(String(\"four\"))"), Value::Int(4));
    let (output, _) = run_code("len(1)");
    let error = output.error.expect("expected an error");
    assert_eq!(error.kind, ErrorKind::TypeError);
    assert_eq!(error.message, "Object of type \"Number\" has no len()");
}

#[test]
fn print_ret_returns_without_writing() {
    let (output, stdout) = run_code("print_ret([1, \"two\"])");
    assert_eq!(stdout, "");
    assert_eq!(output.value, Some(Value::str("[1, \"two\"]")));
}

#[test]
fn input_reads_a_line_after_prompting() {
    let (output, stdout) = run_with_input("input(\"Name? \")", &["Ada"]);
    assert_eq!(stdout, "Name? ");
    assert_eq!(output.value, Some(Value::str("Ada")));
}

#[test]
fn input_int_reprompts_until_integer() {
    let (output, stdout) = run_with_input("input_int()", &["abc", "7"]);
    assert_eq!(stdout, "'abc' must be an integer. Try again!\n");
    assert_eq!(output.value, Some(Value::Int(7)));
}

#[test]
fn time_now_returns_epoch_seconds() {
    let Value::Float(now) = eval_value("time_now()") else {
        panic!("time_now must return a float");
    };
    // After 2020, before 2100.
    assert!(now > 1_577_836_800.0 && now < 4_102_444_800.0);
}

#[test]
fn pyapi_is_denied_by_default() {
    let (output, _) = run_code("pyapi(\"1\", {})");
    assert_eq!(
        output.error.expect("expected an error").message,
        "capability 'pyapi_access' was denied"
    );
}

#[test]
fn pyapi_rejects_even_when_allowed() {
    let mut out = CollectStringPrint::new();
    let mut input = QueuedInput::new(Vec::<String>::new());
    let mut machine = Machine::new(&mut out, &mut input)
        .with_security(SecurityGate::deny_by_default(vec![radon::Capability::PyApiAccess]));
    let output = run("test.rn", "pyapi(\"1\", {})", &mut machine);
    assert_eq!(
        output.error.expect("expected an error").message,
        "pyapi is not supported by this runtime"
    );
}

#[test]
fn help_prints_self_documentation() {
    let (output, stdout) = run_code("help(print)");
    assert!(output.error.is_none());
    assert!(stdout.contains("built-in function print"));

    let (_, stdout) = run_code("help(String)");
    assert!(stdout.contains("string manipulation"));
}

#[test]
fn clear_emits_ansi_escape() {
    let (_, stdout) = run_code("clear()");
    assert_eq!(stdout, "\x1b[2J\x1b[H");
    let (_, stdout) = run_code("cls()");
    assert_eq!(stdout, "\x1b[2J\x1b[H");
}
