//! Window report output
//!
//! Handlers that persist each closed window to JSONL or SQLite, plus a wrapper
//! that turns external stop requests into [`HandlerFlow::Stop`](crate::results_core::HandlerFlow).

pub mod jsonl_writer;
pub mod sqlite_writer;
pub mod stop;
pub mod writer;
pub mod writer_backend;

pub use jsonl_writer::JsonlWindowWriter;
pub use sqlite_writer::SqliteWindowWriter;
pub use stop::StoppableHandler;
pub use writer::WindowWriter;
pub use writer_backend::{EventWindowStats, ReportWriterError, WindowRecord};
