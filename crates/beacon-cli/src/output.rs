//! Terminal output for the `beacon` commands
//!
//! Commands describe their result once: a status, a one-line message, a
//! JSON document and some labelled fields. Human output shows the message
//! and the fields; JSON output prints the document with `status` and
//! `message` merged in, and nothing else on stdout.

use serde_json::{Map, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Human => Box::new(HumanFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

/// Outcome of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    /// A labelled value under the result message.
    fn field(&self, label: &str, value: &str);
    /// Free-form detail line, e.g. a line of YAML.
    fn line(&self, text: &str);
    /// Final result of the command, with its machine-readable form.
    fn result(&self, status: Status, message: &str, document: Value);
}

/// Human-readable output with status marks and aligned fields
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn field(&self, label: &str, value: &str) {
        println!("{}", human_field(label, value));
    }
    fn line(&self, text: &str) {
        println!("  {}", text);
    }
    fn result(&self, status: Status, message: &str, _document: Value) {
        match status {
            Status::Ok => println!("{}", human_headline(status, message)),
            _ => eprintln!("{}", human_headline(status, message)),
        }
    }
}

/// JSON output; fields and detail lines are carried by the document instead
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn field(&self, _label: &str, _value: &str) {}
    fn line(&self, _text: &str) {}
    fn result(&self, status: Status, message: &str, document: Value) {
        let value = json_result(status, message, document);
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    }
}

fn human_headline(status: Status, message: &str) -> String {
    match status {
        Status::Ok => format!("\u{2713} {}", message),
        Status::Warning => format!("\u{26a0} {}", message),
        Status::Error => format!("\u{2717} {}", message),
    }
}

fn human_field(label: &str, value: &str) -> String {
    format!("  {:<14} {}", format!("{}:", label), value)
}

/// Merges `status` and `message` into an object document; any other
/// document is nested under `data`.
fn json_result(status: Status, message: &str, document: Value) -> Value {
    let mut result = Map::new();
    result.insert("status".to_string(), status.as_str().into());
    result.insert("message".to_string(), message.into());
    match document {
        Value::Object(fields) => {
            for (key, field) in fields {
                result.entry(key).or_insert(field);
            }
        }
        Value::Null => {}
        other => {
            result.insert("data".to_string(), other);
        }
    }
    Value::Object(result)
}
