//! Console prompts and output for the interactive analyzer.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use field_pipeline::SummaryRecord;
use geo_common::dates::parse_date;
use geo_common::DateRange;

/// Answers accepted as "yes" to the AI question.
const YES_ANSWERS: [&str; 4] = ["y", "yes", "evet", "e"];

pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    YES_ANSWERS.contains(&answer.as_str())
}

/// Print `prompt` and read one trimmed line; `None` at end of input.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask for a start and end date until both parse and are ordered.
///
/// Returns `None` when the input ends.
pub fn read_dates<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<DateRange>> {
    loop {
        let Some(start) = ask(input, output, "Start date (YYYY-MM-DD): ")? else {
            return Ok(None);
        };
        let Some(end) = ask(input, output, "End date (YYYY-MM-DD): ")? else {
            return Ok(None);
        };

        match (parse_date(&start), parse_date(&end)) {
            (Ok(start), Ok(end)) => match DateRange::new(start, end) {
                Ok(range) => return Ok(Some(range)),
                Err(e) => writeln!(output, "Invalid date range: {}", e)?,
            },
            _ => writeln!(output, "Invalid date format! Use YYYY-MM-DD.")?,
        }
    }
}

/// Short console summary printed after a run.
pub fn quick_summary(summary: &SummaryRecord) -> String {
    let mut out = String::from("\nQUICK SUMMARY:\n");
    out.push_str(&"-".repeat(30));
    out.push('\n');
    if let Some(t) = summary.temp_mean_c {
        let _ = writeln!(out, "Temperature: {:.1}°C", t);
    }
    if let Some(p) = summary.precip_mean_mm_per_day {
        let _ = writeln!(out, "Precipitation: {:.2} mm/day", p);
    }
    if let Some(w) = summary.wind_mean_m_s {
        let _ = writeln!(out, "Wind: {:.1} m/s", w);
    }
    if let Some(map) = &summary.map_path {
        let _ = writeln!(out, "Map: {}", map);
    }
    out
}
