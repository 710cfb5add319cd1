//! tablechat: upload a spreadsheet, ask a question, get an answer computed by
//! model-generated pandas code executed in a subprocess sandbox.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod sandbox;
pub mod server;
pub mod table;
