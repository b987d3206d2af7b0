//! Results Core - Windowed Event-Result Aggregation
//!
//! Turns the append-only stream of benchmark event results into sliding-window
//! statistics per event name.
//!
//! # Architecture
//!
//! ```text
//! ResultStore (SQLite or memory) → query_range(start, end, chart_only, skip, limit)
//!     ↓
//! WindowedAggregator (paged scan, rebased report-period boundaries)
//!     ↓
//! WindowState: event name → WindowRing of window_size / report_period slots
//!     ↓
//! ResultHandler (one WindowReport per closed window, Continue/Stop)
//! ```
//!
//! A result at time T is written into every open slot of its event's ring, so it
//! is counted in `window_size / report_period` consecutive reports.

pub mod aggregator;
pub mod handler;
pub mod record;
pub mod ring;
pub mod sqlite_store;
pub mod statistics;
pub mod store;
pub mod summary;

pub use aggregator::{AggregationError, AggregationParams, RunSummary, WindowedAggregator};
pub use handler::{from_fn, HandlerError, HandlerFlow, ResultHandler, WindowReport};
pub use record::EventRecord;
pub use ring::{WindowRing, WindowSlot};
pub use sqlite_store::SqliteResultStore;
pub use statistics::{FailureCounter, Statistics};
pub use store::{MemoryResultStore, ResultStore, StoreError};
pub use summary::{collate_summaries, ResultSummary, SummaryRow};
