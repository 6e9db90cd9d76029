//! Rendering of assembled [`quire_engine::Document`] records into pages, and
//! writing both the page and the record into the output tree.
pub mod output;
pub mod template;

pub use output::{document_dir, write_document};
pub use template::{DEFAULT_TEMPLATE, render, render_body};
