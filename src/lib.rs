//! sacct Reconcile Library
//!
//! Reconciles pipe-delimited Slurm `sacct` exports into filtered job records and
//! renders them as JSON documents or CSV tables for reporting.
//!
//! ## Core Features
//!
//! - **Job/step pairing**: each job line is paired with the step line that
//!   follows it, since peak memory is only recorded on the step
//! - **Normalization**: `MaxRSS` unit suffixes and empty numeric fields are
//!   turned into plain kilobyte/second counts
//! - **Filtering**: a required comment substring and a minimum memory threshold
//! - **Classification**: ordered keyword/regex rules derive a job type
//! - **Stable output**: memory-descending order with insertion-order ties
//!
//! ## Architecture Overview
//!
//! - [`parser`] - positional field splitting and value normalization
//! - [`pairs`] - lazy job/step pair iterator over the raw lines
//! - [`classify`] - job type rules
//! - [`reconciler`] - builds the [`JobMap`] from an export
//! - [`projector`] - sorting plus JSON and CSV rendering
//! - [`collect`] - date windows and `sacct` invocation for gathering exports
//! - [`cache`] - confirm-before-delete for the collected export
//! - [`config`] - configuration with file and environment support
//! - [`logging`] - structured logging setup
//! - [`display`] - terminal summary
//!
//! ## Example
//!
//! ```rust
//! use sacct_reconcile::{projector, reconcile, Classifier, Filters};
//!
//! # fn example() -> anyhow::Result<()> {
//! let export = "100|sim|fre/ocean_run123|0|3600|node01|2023-02-01|COMPLETED\n\
//!               100.batch|batch||512K|3600|node01|2023-02-01|COMPLETED";
//! let filters = Filters::new().with_required_substring("fre/");
//!
//! let jobs = reconcile(export.lines(), &filters, &Classifier::default())?;
//! let sorted = projector::sort(jobs);
//!
//! let mut json = Vec::new();
//! projector::render_document(&sorted, &mut json)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod classify;
pub mod collect;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod pairs;
pub mod parser;
pub mod projector;
pub mod reconciler;

pub use classify::Classifier;
pub use error::{ReconcileError, RenderError};
pub use models::*;
pub use projector::TableLayout;
pub use reconciler::reconcile;
