//! Core library for the weekly report consolidator.
//!
//! The pipeline is: scan a root directory for eligible report files, read
//! each file's three tables, concatenate them in scan order, renumber the
//! rows continuing from the master workbook's highest sequence numbers,
//! append everything to the master, and (optionally) sanitize the source
//! files down to their header and formula rows.

pub mod backup;
pub mod cli;
pub mod config;
pub mod consolidate;
pub mod domain;
pub mod error;
pub mod report;
pub mod scan;
pub mod sheet;
pub mod ui;
