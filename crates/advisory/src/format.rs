//! Turning model output into console text.
//!
//! A response is treated as JSON when it is an object (optionally inside a
//! Markdown code fence); anything else is shown verbatim. Without a response
//! the summary record itself is printed.

use std::collections::BTreeMap;
use std::fmt::Write;

use field_pipeline::SummaryRecord;
use serde::Deserialize;

const RULE_WIDTH: usize = 50;

/// Structured model answer. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisReport {
    #[serde(default, alias = "ozet")]
    pub summary: Option<String>,
    #[serde(default, alias = "riskler")]
    pub risks: Option<Risks>,
    #[serde(default, alias = "oneriler")]
    pub recommendations: Option<Recommendations>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Risks {
    ByCategory(BTreeMap<String, serde_json::Value>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Recommendations {
    List(Vec<serde_json::Value>),
    Text(String),
}

/// Drought risk bands over the mean drought index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroughtLevel {
    Low,
    Moderate,
    High,
}

impl DroughtLevel {
    /// High above 0.7, Moderate above 0.3, Low otherwise.
    pub fn from_index(index: f64) -> Self {
        if index > 0.7 {
            DroughtLevel::High
        } else if index > 0.3 {
            DroughtLevel::Moderate
        } else {
            DroughtLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DroughtLevel::Low => "Low",
            DroughtLevel::Moderate => "Moderate",
            DroughtLevel::High => "High",
        }
    }
}

impl std::fmt::Display for DroughtLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a JSON report, tolerating a surrounding ``` fence.
pub fn parse_report(response: &str) -> Option<AnalysisReport> {
    let body = strip_code_fence(response.trim());
    if !body.starts_with('{') {
        return None;
    }
    serde_json::from_str(body).ok()
}

/// Format whatever the model returned, or the basic summary without a response.
pub fn format_analysis(response: Option<&str>, summary: &SummaryRecord) -> String {
    match response.filter(|r| !r.trim().is_empty()) {
        None => format_basic_summary(summary),
        Some(text) => match parse_report(text) {
            Some(report) => format_report(&report),
            None => format_text(text),
        },
    }
}

pub fn format_report(report: &AnalysisReport) -> String {
    let mut out = banner("WEATHER ANALYSIS");

    if let Some(summary) = &report.summary {
        let _ = writeln!(out, "SUMMARY:\n{}\n", summary);
    }

    if let Some(risks) = &report.risks {
        out.push_str("RISKS:\n");
        match risks {
            Risks::ByCategory(map) => {
                for (key, value) in map {
                    let _ = writeln!(out, "• {}: {}", title_case(key), value_text(value));
                }
            }
            Risks::Text(text) => {
                let _ = writeln!(out, "{}", text);
            }
        }
        out.push('\n');
    }

    if let Some(recommendations) = &report.recommendations {
        out.push_str("RECOMMENDATIONS:\n");
        match recommendations {
            Recommendations::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    let _ = writeln!(out, "{}. {}", i + 1, value_text(item));
                }
            }
            Recommendations::Text(text) => {
                let _ = writeln!(out, "{}", text);
            }
        }
    }

    out
}

pub fn format_text(text: &str) -> String {
    let mut out = banner("WEATHER ANALYSIS");
    out.push_str(text);
    out
}

/// Summary record as text, used when no model answer is available.
pub fn format_basic_summary(summary: &SummaryRecord) -> String {
    let mut out = banner("WEATHER SUMMARY");
    let _ = writeln!(out, "Dates: {}", summary.dates);
    let _ = writeln!(out, "Region: {}\n", summary.bbox);

    if let Some(t) = summary.temp_mean_c {
        let _ = writeln!(out, "Mean temperature: {:.1}°C", t);
    }
    if let Some(p) = summary.precip_mean_mm_per_day {
        let _ = writeln!(out, "Mean precipitation: {:.2} mm/day", p);
    }
    if let Some(w) = summary.wind_mean_m_s {
        let _ = writeln!(out, "Mean wind: {:.1} m/s", w);
    }
    if let Some(d) = summary.drought_index_mean {
        let _ = writeln!(out, "Drought risk: {} ({:.2})", DroughtLevel::from_index(d), d);
    }
    out
}

fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n{title}\n{rule}\n\n")
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json)
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Capitalize each word, `snake_case` words included.
fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
