//! Output formatting for audit results.
//!
//! This module handles presenting audit findings:
//! - [`csv`] - CSV violation export
//! - [`terminal`] - Terminal report with colors

mod csv;
mod terminal;

pub use csv::{print_violations_csv, render_violations_csv};
pub use terminal::{format_field, print_report};
