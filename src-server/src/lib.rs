//! `docx-batch` HTTP server.
//!
//! Wires the access gate, the spreadsheet/merge engine and the archive
//! packager into an Axum application: log in, upload a `.docx` template and
//! a spreadsheet, download one rendered document per row as a zip.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use routes::router;
