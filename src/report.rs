//! Console and JSON reporting
//!
//! The console reporter prints one line per step as the run progresses and
//! a final summary. The JSON report is the serialized [`Outcome`] with
//! secrets elided.

use std::path::Path;

use colored::Colorize;
use serde_json::Value;

use crate::common::Result;
use crate::http::HttpRequest;
use crate::runner::redact;
use crate::runner::{CallStep, Outcome, RunObserver, StepFailure, StepRecord};

/// Characters of a failing response body shown in the console summary
const BODY_PREVIEW: usize = 500;

/// Prints step progress to stdout
pub struct ConsoleReporter {
    verbose: bool,
    total: usize,
}

impl ConsoleReporter {
    pub fn new(total: usize, verbose: bool) -> Self {
        Self { verbose, total }
    }

    /// Print the run header
    pub fn header(&self, name: &str, description: Option<&str>, base_url: &str) {
        println!("\n{} {}", "Running:".blue().bold(), name.white().bold());
        if let Some(desc) = description {
            println!("  {}", desc.dimmed());
        }
        println!("  {} {}", "API:".dimmed(), base_url.dimmed());
        println!("\n{}", "Steps:".cyan());
    }
}

impl RunObserver for ConsoleReporter {
    fn step_started(&mut self, index: usize, step: &CallStep, request: &HttpRequest) {
        if self.verbose {
            println!(
                "  {} [{}/{}] {} {} {}",
                "→".dimmed(),
                index + 1,
                self.total,
                step.description,
                request.method.as_str().dimmed(),
                request.url.dimmed()
            );
        }
    }

    fn step_passed(&mut self, record: &StepRecord) {
        let extracted = if record.extracted.is_empty() {
            String::new()
        } else {
            format!(" -> {}", record.extracted.join(", "))
        };
        println!(
            "  {} Step {}: {} {}{}",
            "✓".green(),
            record.index + 1,
            record.description,
            format!("({} in {} ms)", record.status, record.elapsed_ms).dimmed(),
            extracted.dimmed()
        );
    }

    fn step_failed(&mut self, failure: &StepFailure) {
        println!(
            "  {} Step {}: {} [{}]",
            "✗".red(),
            failure.step_index + 1,
            failure.step_name,
            failure.kind.to_string().red()
        );
    }
}

/// Print the final summary: stdout on success, stderr on failure
pub fn print_summary(outcome: &Outcome) {
    match outcome {
        Outcome::Success { context, steps, .. } => {
            println!(
                "\n{} {}",
                "✓".green().bold(),
                format!("All {} steps passed", steps.len()).green().bold()
            );
            for (key, value) in context {
                println!("  {} = {}", key.cyan(), display_value(&redact::redact_named(key, value)));
            }
            println!();
        }
        Outcome::Failure { plan, failure } => {
            eprintln!(
                "\n{} {} failed at step {} ({})",
                "✗".red().bold(),
                plan.red().bold(),
                failure.step_index + 1,
                failure.step_name
            );
            eprintln!("  {}: {}", failure.kind.to_string().red(), redact::redact_text(&failure.message));
            if let Some(status) = failure.status {
                eprintln!("  HTTP status: {}", status);
            }
            if let Some(body) = &failure.body {
                eprintln!("  Response: {}", preview(&redact::redact_json(body)).dimmed());
            }
            eprintln!();
        }
    }
}

/// Print the outcome as pretty JSON on stdout
pub fn print_json(outcome: &Outcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&redacted(outcome)?)?);
    Ok(())
}

/// Write the outcome as pretty JSON to `path`
pub fn write_json(outcome: &Outcome, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&redacted(outcome)?)?)?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}

/// Serialized outcome with secrets elided
pub fn redacted(outcome: &Outcome) -> Result<Value> {
    let mut value = serde_json::to_value(outcome)?;
    if let Some(context) = value.get("context").cloned() {
        value["context"] = redact::redact_json(&context);
    }
    if let Some(body) = value.get("body").cloned() {
        value["body"] = redact::redact_json(&body);
    }
    if let Some(message) = value.get("message").and_then(Value::as_str).map(redact::redact_text) {
        value["message"] = Value::String(message);
    }
    Ok(value)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= BODY_PREVIEW {
        return text;
    }
    let cut: String = text.chars().take(BODY_PREVIEW).collect();
    format!("{}...", cut)
}
