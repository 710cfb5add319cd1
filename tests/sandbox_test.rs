//! Python subprocess sandbox, end to end. These tests spawn a real
//! interpreter and are ignored by default: they need python3 with pandas and
//! numpy on PATH. Run with `cargo test -- --ignored`.

mod common;

use std::time::Duration;

use common::sample_table;
use serde_json::json;
use tablechat::error::AnalysisError;
use tablechat::sandbox::python::PythonSandbox;
use tablechat::sandbox::CodeRunner;

fn sandbox() -> PythonSandbox {
    PythonSandbox::new("python3".into(), Duration::from_secs(30))
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn result_assignment_comes_back() {
    let out = sandbox()
        .execute("result = len(df)", &sample_table())
        .await
        .unwrap();
    assert_eq!(out.value, json!(3));
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn bindings_are_available() {
    let code = "result = {'cols': df.columns.tolist(), 'sum_b': int(np.sum(df['b'])), 'mean_a': float(pd.Series(df['a']).mean())}";
    let out = sandbox().execute(code, &sample_table()).await.unwrap();
    assert_eq!(out.value["cols"], json!(["a", "b"]));
    assert_eq!(out.value["sum_b"], json!(12));
    assert_eq!(out.value["mean_a"], json!(3.0));
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn missing_result_is_no_result() {
    let err = sandbox()
        .execute("x = len(df)", &sample_table())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NoResult));
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn explicit_none_counts_as_result() {
    let out = sandbox()
        .execute("result = None", &sample_table())
        .await
        .unwrap();
    assert_eq!(out.value, serde_json::Value::Null);
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn runtime_fault_is_caught() {
    let err = sandbox()
        .execute("result = undefined_name", &sample_table())
        .await
        .unwrap_err();
    match err {
        AnalysisError::Execution(msg) => assert!(msg.contains("NameError"), "got: {msg}"),
        other => panic!("expected execution fault, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn syntax_fault_is_caught() {
    let err = sandbox()
        .execute("result = = 1", &sample_table())
        .await
        .unwrap_err();
    match err {
        AnalysisError::Execution(msg) => assert!(msg.contains("SyntaxError"), "got: {msg}"),
        other => panic!("expected execution fault, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn input_table_is_never_mutated() {
    let table = sample_table();
    let before = table.clone();
    let code = "df.loc[0, 'a'] = 999\ndf['new'] = 0\nresult = int(df.loc[0, 'a'])";
    let out = sandbox().execute(code, &table).await.unwrap();
    // the subprocess saw its own mutated copy
    assert_eq!(out.value, json!(999));
    // the host-side table did not change
    assert_eq!(table, before);
}

#[tokio::test]
#[ignore = "requires python3 with pandas and numpy"]
async fn printed_output_is_captured_not_leaked() {
    let out = sandbox()
        .execute("print('debugging')\nresult = 1", &sample_table())
        .await
        .unwrap();
    assert_eq!(out.value, json!(1));
    assert!(out.stdout.contains("debugging"));
}

#[tokio::test]
#[ignore = "requires python3"]
async fn runaway_code_is_killed_by_timeout() {
    let sandbox = PythonSandbox::new("python3".into(), Duration::from_secs(1));
    let err = sandbox
        .execute("while True:\n    pass", &sample_table())
        .await
        .unwrap_err();
    match err {
        AnalysisError::Execution(msg) => assert!(msg.contains("timed out"), "got: {msg}"),
        other => panic!("expected timeout fault, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_interpreter_is_an_execution_error() {
    let sandbox = PythonSandbox::new("definitely-not-a-python".into(), Duration::from_secs(5));
    let err = sandbox
        .execute("result = 1", &sample_table())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Execution(_)));
}
