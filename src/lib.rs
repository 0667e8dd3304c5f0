//! Core library for the sitecheck-tools command line application.
//!
//! The library turns human-authored construction inspection checklists into a
//! normalized row model and back, and rolls their scores up by category and by
//! assignee. Responsibilities are kept narrow: cell-level parsing lives in
//! [`sitecheck::tools::date`] and [`sitecheck::tools::score`], the sheet
//! transforms in [`sitecheck::tools::decode`] and [`sitecheck::tools::encode`],
//! rollups in [`sitecheck::tools::aggregate`], spreadsheet adapters under
//! [`sitecheck::tools::io`], and file-level orchestration in
//! [`sitecheck::tools::sync`].

pub mod sitecheck;

pub use sitecheck::tools::{
    Result, ToolError, aggregate, date, decode, encode, error, io, layout, model, schema, score,
    sync,
};
