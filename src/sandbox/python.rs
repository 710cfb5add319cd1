//! Python subprocess sandbox. Each execution spawns `python -I -c <harness>`
//! in a fresh temp directory, feeds one JSON payload on stdin, and reads one
//! JSON reply line back. The table crosses the boundary by value, so the
//! in-process copy cannot be touched; a wall-clock timeout kills the child.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::table::Table;

use super::{CodeRunner, ExecutionOutput};

/// Harness run inside the interpreter. Builds the execution scope with the
/// fixed bindings (`pd`, `np`, `df`) and an unset-sentinel result slot,
/// redirects the code's stdout into a buffer so the reply line stays clean,
/// and reports exactly one of: ok / fault / no_result.
const HARNESS: &str = r#"
import io
import json
import sys
from contextlib import redirect_stdout


def emit(reply):
    try:
        line = json.dumps(reply, default=str)
    except (TypeError, ValueError):
        reply["value"] = str(reply.get("value"))
        line = json.dumps(reply, default=str)
    sys.stdout.write(line + "\n")
    sys.stdout.flush()


def main():
    payload = json.load(sys.stdin)
    import pandas as pd
    import numpy as np

    df = pd.DataFrame(payload["table"]["rows"], columns=payload["table"]["columns"])
    unset = object()
    scope = {"pd": pd, "np": np, "df": df, "result": unset}
    captured = io.StringIO()
    try:
        code = compile(payload["code"], "<generated>", "exec")
        with redirect_stdout(captured):
            exec(code, scope)
    except BaseException as exc:
        emit({
            "status": "fault",
            "message": "%s: %s" % (type(exc).__name__, exc),
            "stdout": captured.getvalue(),
        })
        return
    result = scope.get("result", unset)
    if result is unset:
        emit({"status": "no_result", "stdout": captured.getvalue()})
        return
    emit({"status": "ok", "value": result, "stdout": captured.getvalue()})


main()
"#;

#[derive(Debug, Clone)]
pub struct PythonSandbox {
    python_bin: String,
    timeout: Duration,
}

impl PythonSandbox {
    pub fn new(python_bin: String, timeout: Duration) -> Self {
        Self { python_bin, timeout }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.python_bin(), cfg.exec_timeout())
    }
}

#[async_trait]
impl CodeRunner for PythonSandbox {
    async fn execute(&self, code: &str, table: &Table) -> Result<ExecutionOutput, AnalysisError> {
        let payload = json!({
            "code": code,
            "table": { "columns": table.headers, "rows": table.rows },
        });

        let workdir = tempfile::tempdir()
            .map_err(|e| AnalysisError::Execution(format!("failed to create workdir: {e}")))?;

        let mut child = Command::new(&self.python_bin)
            .arg("-I") // isolated: no site-packages from env vars, no cwd on sys.path
            .arg("-c")
            .arg(HARNESS)
            .current_dir(workdir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalysisError::Execution(format!("failed to start interpreter: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AnalysisError::Execution("interpreter stdin unavailable".into()))?;
        stdin
            .write_all(payload.to_string().as_bytes())
            .await
            .map_err(|e| AnalysisError::Execution(format!("failed to send payload: {e}")))?;
        drop(stdin);

        // on timeout the future is dropped and kill_on_drop reaps the child
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(waited) => waited
                .map_err(|e| AnalysisError::Execution(format!("interpreter failed: {e}")))?,
            Err(_) => {
                return Err(AnalysisError::Execution(format!(
                    "execution timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply_line = stdout.lines().rev().find(|l| !l.trim().is_empty());

        let reply: Reply = match reply_line.and_then(|l| serde_json::from_str(l).ok()) {
            Some(reply) => reply,
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(AnalysisError::Execution(if stderr.trim().is_empty() {
                    "interpreter produced no reply".into()
                } else {
                    stderr.trim().to_string()
                }));
            }
        };

        debug!(status = %reply.status, "sandbox reply");
        match reply.status.as_str() {
            "ok" => Ok(ExecutionOutput { value: reply.value, stdout: reply.stdout }),
            "no_result" => Err(AnalysisError::NoResult),
            "fault" => Err(AnalysisError::Execution(if reply.message.is_empty() {
                "execution fault".into()
            } else {
                reply.message
            })),
            other => Err(AnalysisError::Execution(format!("unknown sandbox status: {other}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    status: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    message: String,
    #[serde(default)]
    stdout: String,
}
