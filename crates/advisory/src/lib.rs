//! Generative language model commentary on analysis summaries.
//!
//! - [`Advisory`]: the seam the orchestration calls; [`GeminiClient`] talks to
//!   the Gemini REST API and [`NoAdvisory`] stands in when no model is wanted
//! - [`prompts`]: default risk prompt, custom prompt wrapper, personalized
//!   prompt from a [`UserProfile`]
//! - [`format`]: model output (JSON report or free text) to console text,
//!   with a basic summary when there is no output

pub mod client;
pub mod error;
pub mod format;
pub mod prompts;

pub use client::{Advisory, GeminiClient, GeminiConfig, NoAdvisory, DEFAULT_MODEL};
pub use error::{AdvisoryError, Result};
pub use format::{format_analysis, format_basic_summary, parse_report, AnalysisReport, DroughtLevel};
pub use prompts::{custom_prompt, default_prompt, personalized_prompt, UserProfile};
