//! Report generation for collected repository metrics
//!
//! Every generator renders the same input, a finished [`RunReport`](crate::facts::RunReport),
//! into a `core::fmt::Write` sink:
//! - **Console**: Terminal output, optionally colored
//! - **Markdown**: One section per area, one block of fields per repository
//! - **JSON**: Full metric records plus a flat summary per repository
//! - **CSV**: One row per repository, one column per scalar field
//!
//! A value that could not be collected is shown as `ERROR` (`null` in JSON), never as
//! zero. A repository that failed entirely is still listed with its error.

mod common;
mod console;
mod csv;
mod json;
mod markdown;

pub use console::generate as generate_console;
pub use csv::generate as generate_csv;
pub use json::generate as generate_json;
pub use markdown::generate as generate_markdown;
