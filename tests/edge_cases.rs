//! Edge case tests for cleave

mod harness;

use harness::{TestWorkspace, json_summary, run_cleave};

fn diagnostic_kinds(summary: &serde_json::Value) -> Vec<String> {
    summary["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["kind"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_brace_in_string_literal_needs_lexical_mode() {
    let source = "void Foo::open() {\n    puts(\"{\");\n}\n\nvoid Foo::close() {\n}\n";

    // Literal counting sees the quoted brace and never returns to zero
    // within `open`, swallowing `close` as well.
    let workspace = TestWorkspace::new();
    workspace.add_file("Foo.cpp", source);
    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json", "--dry-run"]);
    let summary = json_summary(&output);
    assert_eq!(summary["counts"]["unterminated"], 1);
    assert_eq!(output.code, Some(1));

    let workspace = TestWorkspace::new();
    workspace.add_file("Foo.cpp", source);
    let output = run_cleave(
        workspace.path(),
        &["Foo.cpp", "--json", "--scan-mode", "lexical", "--helper", "open", "--helper", "close"],
    );
    assert!(output.success(), "{}", output.stdout);
    let helpers = workspace.read("generators/helpers/gen_all_helpers.cpp");
    assert!(helpers.contains("puts(\"{\");\n}\n\nvoid Foo::close() {\n}\n"));
}

#[test]
fn test_orphaned_code_withholds_until_forced() {
    let workspace = TestWorkspace::new();
    let source = "void Foo::a() {\n}\n\nstatic int counter = 0;\n\nvoid Foo::b() {\n}\n";
    workspace.add_file("Foo.cpp", source);

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json", "--helper", "a", "--helper", "b"]);
    assert_eq!(output.code, Some(1));
    let summary = json_summary(&output);
    assert_eq!(summary["aggregator"]["status"], "withheld");
    assert_eq!(summary["aggregator"]["reasons"][0]["reason"], "orphaned_code");
    assert!(diagnostic_kinds(&summary).contains(&"orphaned_code".to_string()));
    assert_eq!(workspace.read("Foo.cpp"), source);

    let output = run_cleave(
        workspace.path(),
        &["Foo.cpp", "--json", "--helper", "a", "--helper", "b", "--force"],
    );
    assert!(output.success());
    assert_eq!(json_summary(&output)["aggregator"]["status"], "rewritten");
    assert_eq!(
        workspace.read("Foo.cpp"),
        "#include \"generators/helpers/gen_all_helpers.cpp\"\n"
    );
}

#[test]
fn test_duplicate_definition_reported() {
    let workspace = TestWorkspace::new();
    workspace.add_file(
        "Foo.cpp",
        "void Foo::visit(Leaf& a) { one(); }\n\nvoid Foo::visit(Leaf &b) { two(); }\n",
    );

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json"]);
    assert_eq!(output.code, Some(1));
    let summary = json_summary(&output);
    assert_eq!(summary["counts"]["duplicates"], 1);
    assert_eq!(summary["aggregator"]["status"], "withheld");

    let leaf = workspace.read("generators/gen_visit_Leaf.cpp");
    assert!(leaf.contains("one();"));
    assert!(!leaf.contains("two();"));
}

#[test]
fn test_overloads_are_not_duplicates() {
    let workspace = TestWorkspace::new();
    workspace.add_file(
        "Foo.cpp",
        "void Foo::emit(int op) {\n}\n\nvoid Foo::emit(int op, int arg) {\n}\n",
    );

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--helper", "emit"]);
    assert!(output.success(), "{}", output.stderr);
    let helpers = workspace.read("generators/helpers/gen_all_helpers.cpp");
    assert_eq!(helpers.matches("void Foo::emit(").count(), 2);
}

#[test]
fn test_single_line_mode_reports_wrapped_signatures() {
    let workspace = TestWorkspace::new();
    workspace.add_file("Foo.cpp", "void Foo::a() {\n}\n\nvoid Foo::b()\n{\n}\n");

    let output = run_cleave(
        workspace.path(),
        &["Foo.cpp", "--json", "--single-line", "--dry-run", "--helper", "a"],
    );
    let summary = json_summary(&output);
    assert_eq!(summary["counts"]["extracted"], 1);
    assert_eq!(summary["counts"]["unrecognized"], 1);
    assert!(diagnostic_kinds(&summary).contains(&"unrecognized_signature_shape".to_string()));
}

#[test]
fn test_strict_fails_on_default_classification() {
    let workspace = TestWorkspace::new();
    workspace.add_file("Foo.cpp", "void Foo::mystery() {\n}\n");

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--dry-run"]);
    assert!(output.success());
    assert!(output.stdout.contains("routed to helpers by default"));

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--dry-run", "--strict"]);
    assert_eq!(output.code, Some(1));
}

#[test]
fn test_no_definitions_leaves_input_alone() {
    let workspace = TestWorkspace::new();
    let source = "#include \"Other.h\"\nint Other::x() { return 0; }\n";
    workspace.add_file("Foo.cpp", source);

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json"]);
    assert!(output.success());
    assert_eq!(json_summary(&output)["aggregator"]["status"], "nothing_to_split");
    assert_eq!(workspace.read("Foo.cpp"), source);
    assert!(!workspace.exists("generators"));
}

#[test]
fn test_write_failure_is_reported_and_batch_continues() {
    let workspace = TestWorkspace::new();
    workspace.add_file("Foo.cpp", "void Foo::a() {\n}\n");
    // A file where the output directory should be.
    workspace.add_file("generators", "not a directory");

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json", "--helper", "a"]);
    assert_eq!(output.code, Some(1));
    let summary = json_summary(&output);
    assert!(diagnostic_kinds(&summary).contains(&"output_write_failure".to_string()));
    assert_eq!(summary["destinations"][0]["status"], "failed");
    assert_eq!(summary["aggregator"]["status"], "withheld");
    assert_eq!(workspace.read("Foo.cpp"), "void Foo::a() {\n}\n");
}

fn latin1_source() -> Vec<u8> {
    let mut bytes = b"// caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\n#include \"Foo.h\"\nvoid Foo::a() {\n}\n");
    bytes
}

#[test]
fn test_invalid_utf8_is_decoded_lossily() {
    let workspace = TestWorkspace::new();
    std::fs::write(workspace.path().join("Foo.cpp"), latin1_source()).unwrap();

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json", "--dry-run", "--helper", "a"]);
    let summary = json_summary(&output);
    assert!(diagnostic_kinds(&summary).contains(&"lossy_decode".to_string()));
    assert_eq!(summary["aggregator"]["status"], "withheld");
    assert_eq!(summary["aggregator"]["reasons"][0]["reason"], "lossy_input");
}

#[test]
fn test_invalid_utf8_input_keeps_its_bytes_until_forced() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("Foo.cpp");
    std::fs::write(&path, latin1_source()).unwrap();

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--helper", "a"]);
    assert_eq!(output.code, Some(1));
    assert_eq!(std::fs::read(&path).unwrap(), latin1_source());

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--helper", "a", "--force"]);
    assert!(output.success(), "{}", output.stderr);
    assert!(workspace.read("Foo.cpp").ends_with(
        "#include \"Foo.h\"\n#include \"generators/helpers/gen_all_helpers.cpp\"\n"
    ));
}

#[cfg(unix)]
#[test]
fn test_rewrite_keeps_input_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let workspace = TestWorkspace::new();
    let input = workspace.add_file("Foo.cpp", "void Foo::a() {\n}\n");
    std::fs::set_permissions(&input, std::fs::Permissions::from_mode(0o644)).unwrap();

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--helper", "a"]);
    assert!(output.success(), "{}", output.stderr);

    fn mode(path: &std::path::Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }
    assert_eq!(mode(&input), 0o644);
    assert_eq!(
        mode(&workspace.path().join("generators/helpers/gen_all_helpers.cpp")),
        0o644
    );
}

#[test]
fn test_constructor_with_brace_initializers_is_whole() {
    let workspace = TestWorkspace::new();
    workspace.add_file(
        "Foo.cpp",
        "Foo::Foo() : x_{1}, y_{2} {\n    run();\n}\n",
    );

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--core", "Foo::Foo"]);
    assert!(output.success(), "{}", output.stdout);
    assert_eq!(
        workspace.read("generators/Foo_core.cpp"),
        "Foo::Foo() : x_{1}, y_{2} {\n    run();\n}\n"
    );
}

#[test]
fn test_parameters_with_parentheses_are_recognized() {
    let workspace = TestWorkspace::new();
    workspace.add_file(
        "Foo.cpp",
        "void Foo::on(std::function<void(int)> cb) {\n    cb(1);\n}\n\n\
         int Foo::apply(int (*fn)(int), int x) {\n    return fn(x);\n}\n",
    );

    let output = run_cleave(
        workspace.path(),
        &["Foo.cpp", "--json", "--helper", "on", "--helper", "apply"],
    );
    assert!(output.success(), "{}", output.stdout);
    let summary = json_summary(&output);
    assert_eq!(summary["counts"]["extracted"], 2);
    assert_eq!(summary["counts"]["unrecognized"], 0);
    assert_eq!(summary["aggregator"]["status"], "rewritten");
}

#[test]
fn test_comment_block_travels_with_next_function() {
    let workspace = TestWorkspace::new();
    workspace.add_file(
        "Foo.cpp",
        "void Foo::a() {\n}\n\n/// Emits the opcode.\nvoid Foo::b() {\n}\n",
    );

    let output = run_cleave(workspace.path(), &["Foo.cpp", "--json", "--helper", "a", "--helper", "b"]);
    assert!(output.success());
    assert_eq!(json_summary(&output)["counts"]["comment_blocks_dropped"], 0);
    assert_eq!(
        workspace.read("generators/helpers/gen_all_helpers.cpp"),
        "void Foo::a() {\n}\n\n/// Emits the opcode.\nvoid Foo::b() {\n}\n"
    );
}

#[test]
fn test_missing_input_is_fatal() {
    let workspace = TestWorkspace::new();
    let output = run_cleave(workspace.path(), &["Missing.cpp"]);
    assert_eq!(output.code, Some(2));
    assert!(output.stderr.contains("cannot read"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let workspace = TestWorkspace::new();
    workspace.add_file("Foo.cpp", "void Foo::a() {\n}\n");
    workspace.add_file("cleave.toml", "unknown_option = true\n");

    let output = run_cleave(workspace.path(), &["Foo.cpp"]);
    assert_eq!(output.code, Some(2));
    assert!(output.stderr.contains("invalid config"));
    assert_eq!(workspace.read("Foo.cpp"), "void Foo::a() {\n}\n");
}

#[test]
fn test_namespaced_owner_and_custom_output_dir() {
    let workspace = TestWorkspace::new();
    workspace.add_file("impl.cpp", "void ns::Foo::visit(const ast::Leaf* leaf) {\n}\n");

    let output = run_cleave(
        workspace.path(),
        &["impl.cpp", "--owner", "ns::Foo", "--output-dir", "out"],
    );
    assert!(output.success(), "{}", output.stderr);
    assert!(workspace.exists("out/gen_visit_ast_Leaf.cpp"));
    assert_eq!(
        workspace.read("impl.cpp"),
        "#include \"out/gen_visit_ast_Leaf.cpp\"\n"
    );
}
