//! myshell - a small Unix command shell
//!
//! Command lines are split into `;`-separated units, each unit into `|`
//! connected stages with optional `<`, `>` and `>>` redirections. Units
//! ending in `&` run in the background and are tracked as jobs until they
//! are reaped.

#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]

/// Logs the error held by a `Result` and discards it.
#[macro_export]
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            log::error!(concat!($fmt, ": {}"), e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            log::error!(concat!($fmt, ": {}"), $($arg)*, e);
        }
    }};
}

pub mod core;
pub mod editor;
pub mod errors;
pub mod execute_command;
pub mod shell;

pub use crate::editor::{BatchSource, Editor, LineSource, StdinSource};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::shell::{create_shell, Shell, ShellConfig};
