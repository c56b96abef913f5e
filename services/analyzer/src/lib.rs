//! Command-line analyzer library.
//!
//! The binary drives [`analysis_runner::AnalysisRunner`]; this crate holds
//! the console interaction so it can be tested without a terminal.

pub mod console;
