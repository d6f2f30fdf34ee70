// Library root
// -----------
// The binary (`main.rs`) parses arguments with `cli` and hands off to `ui`,
// which drives the two independent tools:
// - `remote`: argv builders and process runners for ssh/scp/ssh-copy-id.
// - `vision`: the image → vision API → JSON batch.
// `config` and `error` are shared by both.
pub mod cli;
pub mod config;
pub mod error;
pub mod remote;
pub mod ui;
pub mod vision;

pub use error::{Error, Result};
