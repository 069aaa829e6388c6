//! User interface module - terminal output for the command-line front end.

pub mod formatter;

pub use formatter::{
    display_error, display_status, display_success, display_version_report,
    format_version_report,
};
