//! Shared test doubles: a scripted model backend and a canned code runner,
//! both counting invocations.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tablechat::backend::ModelBackend;
use tablechat::error::AnalysisError;
use tablechat::pipeline::prompt::BuiltPrompt;
use tablechat::sandbox::{CodeRunner, ExecutionOutput};
use tablechat::table::Table;

pub struct MockBackend {
    pub reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl MockBackend {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply.to_string()), calls: AtomicUsize::new(0) })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err(message.to_string()), calls: AtomicUsize::new(0) })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, _prompt: &BuiltPrompt) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(AnalysisError::Backend(msg.clone())),
        }
    }
}

pub struct MockRunner {
    pub outcome: Result<Value, AnalysisError>,
    pub calls: AtomicUsize,
    pub last_code: std::sync::Mutex<Option<String>>,
}

impl MockRunner {
    pub fn returning(value: Value) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(value),
            calls: AtomicUsize::new(0),
            last_code: std::sync::Mutex::new(None),
        })
    }

    pub fn no_result() -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(AnalysisError::NoResult),
            calls: AtomicUsize::new(0),
            last_code: std::sync::Mutex::new(None),
        })
    }

    pub fn faulting(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(AnalysisError::Execution(message.to_string())),
            calls: AtomicUsize::new(0),
            last_code: std::sync::Mutex::new(None),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeRunner for MockRunner {
    async fn execute(&self, code: &str, _table: &Table) -> Result<ExecutionOutput, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code.lock().unwrap() = Some(code.to_string());
        match &self.outcome {
            Ok(value) => Ok(ExecutionOutput { value: value.clone(), stdout: String::new() }),
            Err(AnalysisError::NoResult) => Err(AnalysisError::NoResult),
            Err(AnalysisError::Execution(m)) => Err(AnalysisError::Execution(m.clone())),
            Err(_) => unreachable!("mock runner only models execution outcomes"),
        }
    }
}

pub fn sample_table() -> Table {
    use serde_json::json;
    let mut t = Table::new(vec!["a".into(), "b".into()]);
    t.push_row(vec![json!(1), json!(2)]).unwrap();
    t.push_row(vec![json!(3), json!(4)]).unwrap();
    t.push_row(vec![json!(5), json!(6)]).unwrap();
    t
}
