//! Console output for the `bulletin` commands
//!
//! Human output goes to stdout with a status glyph per line; problems go
//! to stderr. In JSON mode each command prints one document through
//! [`OutputFormatter::print_json`] and the free-text helpers stay quiet,
//! except for errors and warnings which become one-line JSON on stderr.

use serde_json::{json, Value};

/// Width of the label column in [`OutputFormatter::field`]
const LABEL_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }

    pub fn formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Human => Box::new(HumanFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// Indented `label: value` line with aligned values
    fn field(&self, label: &str, value: &str);
    fn print_json(&self, value: &Value);
}

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn field(&self, label: &str, value: &str) {
        println!("  {}", format_field(label, value));
    }
    fn print_json(&self, _value: &Value) {}
}

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, _message: &str) {}
    fn error(&self, message: &str) {
        eprintln!("{}", json!({"success": false, "error": message}));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", json!({"level": "warning", "message": message}));
    }
    fn info(&self, _message: &str) {}
    fn field(&self, _label: &str, _value: &str) {}
    fn print_json(&self, value: &Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }
}

fn format_field(label: &str, value: &str) -> String {
    let label = format!("{}:", label);
    format!("{:<width$} {}", label, value, width = LABEL_WIDTH + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_aligns_values() {
        assert_eq!(format_field("Fetched", "3"), "Fetched:    3");
        assert_eq!(format_field("Sent", "12"), "Sent:       12");
    }

    #[test]
    fn test_format_field_long_label() {
        assert_eq!(format_field("Institution", "Lycee1"), "Institution: Lycee1");
    }
}
