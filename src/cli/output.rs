//! CLI output formatting.
//!
//! Handles output formatting for the different formats (text, JSON) plus the
//! progress spinner shown while transactions await inclusion.

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::error::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// Pretty JSON format
    JsonPretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            _ => Err(Error::Config(format!("unknown output format: {}", s))),
        }
    }
}

impl OutputFormat {
    /// True for either JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonPretty)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMATTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Output formatter for CLI
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    /// Output format
    format: OutputFormat,
    /// Color enabled
    color: bool,
}

impl OutputFormatter {
    /// Create new formatter
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: true,
        }
    }

    /// Disable color
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Get format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.format.is_json() {
            self.print_json(&serde_json::json!({
                "status": "success",
                "message": message
            }));
        } else if self.color {
            println!("\x1b[32m✓\x1b[0m {}", message);
        } else {
            println!("OK: {}", message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        if self.format.is_json() {
            self.print_json(&serde_json::json!({
                "status": "error",
                "message": message
            }));
        } else if self.color {
            eprintln!("\x1b[31m✗\x1b[0m {}", message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.format.is_json() {
            self.print_json(&serde_json::json!({
                "status": "warning",
                "message": message
            }));
        } else if self.color {
            println!("\x1b[33m⚠\x1b[0m {}", message);
        } else {
            println!("WARNING: {}", message);
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.format.is_json() {
            self.print_json(&serde_json::json!({
                "status": "info",
                "message": message
            }));
        } else if self.color {
            println!("\x1b[34mℹ\x1b[0m {}", message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print data
    pub fn data<T: Serialize>(&self, data: &T) {
        if self.format.is_json() {
            self.print_json(data);
        } else if let Ok(json) = serde_json::to_value(data) {
            self.print_text(&json, 0);
        }
    }

    /// Print key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.format.is_json() {
            self.print_json(&serde_json::json!({ key: value }));
        } else if self.color {
            println!("\x1b[1m{}\x1b[0m: {}", key, value);
        } else {
            println!("{}: {}", key, value);
        }
    }

    /// Print section header
    pub fn section(&self, title: &str) {
        if matches!(self.format, OutputFormat::Text) {
            println!();
            if self.color {
                println!("\x1b[1;36m=== {} ===\x1b[0m", title);
            } else {
                println!("=== {} ===", title);
            }
            println!();
        }
    }

    /// Print table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.format.is_json() {
            let data: Vec<HashMap<&str, &str>> = rows
                .iter()
                .map(|row| {
                    headers
                        .iter()
                        .zip(row.iter())
                        .map(|(h, v)| (*h, v.as_str()))
                        .collect()
                })
                .collect();
            self.print_json(&data);
        } else {
            self.print_table_text(headers, rows);
        }
    }

    /// Print JSON data
    fn print_json<T: Serialize>(&self, data: &T) {
        let output = if matches!(self.format, OutputFormat::JsonPretty) {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };

        if let Ok(json) = output {
            println!("{}", json);
        }
    }

    /// Print text formatted data
    fn print_text(&self, json: &serde_json::Value, indent: usize) {
        let prefix = "  ".repeat(indent);

        match json {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            if self.color {
                                println!("{}\x1b[1m{}\x1b[0m:", prefix, key);
                            } else {
                                println!("{}{}:", prefix, key);
                            }
                            self.print_text(value, indent + 1);
                        }
                        _ => {
                            if self.color {
                                println!("{}\x1b[1m{}\x1b[0m: {}", prefix, key, format_value(value));
                            } else {
                                println!("{}{}: {}", prefix, key, format_value(value));
                            }
                        }
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    println!("{}[{}]:", prefix, i);
                    self.print_text(item, indent + 1);
                }
            }
            _ => {
                println!("{}{}", prefix, format_value(json));
            }
        }
    }

    /// Print text table
    fn print_table_text(&self, headers: &[&str], rows: &[Vec<String>]) {
        if headers.is_empty() {
            return;
        }

        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        // Print header
        let header_line: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect();

        if self.color {
            println!("\x1b[1m{}\x1b[0m", header_line.join(" | "));
        } else {
            println!("{}", header_line.join(" | "));
        }

        // Print separator
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        println!("{}", separator.join("-+-"));

        // Print rows
        for row in rows {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = widths.get(i).copied().unwrap_or(cell.len());
                    format!("{:width$}", cell, width = width)
                })
                .collect();
            println!("{}", cells.join(" | "));
        }
    }
}

/// Format a JSON value for text output
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".into(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPINNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Spinner shown while a transaction awaits signing and inclusion
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
