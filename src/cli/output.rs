//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{OutputFormat, SkillsArgs};
use crate::error::Result;

/// Date range of a quarter.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuarterRangeResult {
    pub quarter: String,
    pub start: String,
    pub end: String,
}

/// Quarter a date falls in.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuarterOfResult {
    pub date: String,
    pub quarter: String,
}

/// Dates in a range.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatesResult {
    pub count: usize,
    pub dates: Vec<String>,
}

/// Result of an upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResult {
    pub source: String,
    pub destination: String,
    pub bytes: u64,
}

/// Result of a download.
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResult {
    pub source: String,
    pub destination: String,
    pub bytes: usize,
}

/// Files under a prefix.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResult {
    pub prefix: String,
    pub files: Vec<String>,
}

/// Record counts of a JSON-lines file.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonlCheckResult {
    pub path: String,
    pub lines: usize,
    pub records: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &SkillsArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &SkillsArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    for line in human_lines(&value) {
        println!("{line}");
    }
    Ok(())
}

/// `key: value` lines for an object; lists are printed one entry per line.
fn human_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => {
            let mut lines = Vec::new();
            for (key, val) in obj {
                match val {
                    Value::Array(items) if !items.is_empty() => {
                        lines.push(format!("{key}:"));
                        lines.extend(items.iter().map(|item| format!("  {}", format_value(item))));
                    }
                    _ => lines.push(format!("{key}: {}", format_value(val))),
                }
            }
            lines
        }
        _ => vec![format_value(value)],
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SkillsArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for human output.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        Value::Object(_) => "[object]".to_string(),
        Value::Null => "null".to_string(),
    }
}
