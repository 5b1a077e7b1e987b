//! Line-oriented terminal front end for `navvy`.
//!
//! Plain input lines are sent to the model and the response is streamed to
//! stdout. Lines starting with `/` are local commands; see [`commands`].
//! Diagnostics go to stderr through `tracing`, filtered by `NAVVY_LOG`.

pub mod commands;
pub mod logging;
pub mod repl;
