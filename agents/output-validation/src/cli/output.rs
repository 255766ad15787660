//! Output formatting for the CLI
//!
//! JSON and YAML print the verdict exactly as the engine produced it; the
//! table format is a colored, human-readable rendering.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::contracts::{
    SemanticResult, StructuralError, ValidationLevel, ValidationRequest, ValidationVerdict,
};
use crate::error::{EngineError, Result};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    Yaml,
}

/// A verdict together with the request parameters that produced it
#[derive(Debug, Clone, Serialize)]
pub struct VerdictOutput<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub level: ValidationLevel,
    #[serde(flatten)]
    pub verdict: &'a ValidationVerdict,
}

impl<'a> VerdictOutput<'a> {
    pub fn new(request: &'a ValidationRequest, verdict: &'a ValidationVerdict) -> Self {
        Self {
            kind: &request.kind,
            level: request.level,
            verdict,
        }
    }

    /// One-line summary of the verdict
    pub fn summary(&self) -> String {
        let structural = &self.verdict.structural;
        match (&self.verdict.semantic, structural.is_structurally_valid) {
            (_, false) => format!(
                "Record is invalid: {} structural error(s)",
                structural.errors.len()
            ),
            (Some(semantic), true) if !semantic.is_semantically_valid => format!(
                "Record is invalid: {} semantic issue(s)",
                semantic.issues.len()
            ),
            (Some(_), true) => "Record is valid".to_string(),
            (None, true) => "Record is structurally valid".to_string(),
        }
    }

    /// Render output in the specified format
    pub fn render(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(self)
                    .map_err(|e| EngineError::SerializationError(e.to_string()))?;
                println!("{}", json);
                Ok(())
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(self)
                    .map_err(|e| EngineError::SerializationError(e.to_string()))?;
                println!("{}", yaml);
                Ok(())
            }
            OutputFormat::Table => {
                self.render_table();
                Ok(())
            }
        }
    }

    fn render_table(&self) {
        let mut stdout = io::stdout();

        writeln!(stdout).ok();
        writeln!(
            stdout,
            "{} ({} / {})",
            "Validation Results".cyan().bold(),
            self.kind,
            self.level
        )
        .ok();
        writeln!(stdout, "{}", "=".repeat(60)).ok();
        writeln!(stdout).ok();

        let status = if self.verdict.is_valid {
            "+".green()
        } else {
            "x".red()
        };
        writeln!(stdout, "{} {}", status, self.summary()).ok();

        let structural = &self.verdict.structural;
        if !structural.errors.is_empty() {
            writeln!(stdout).ok();
            writeln!(stdout, "{}", "Structural errors:".cyan().bold()).ok();
            writeln!(stdout, "{}", "-".repeat(60)).ok();
            for error in &structural.errors {
                render_error_row(&mut stdout, error);
            }
        }

        match &self.verdict.semantic {
            Some(semantic) => render_semantic(&mut stdout, semantic),
            None => {
                writeln!(stdout).ok();
                writeln!(stdout, "{}", "Semantic validation skipped".dimmed()).ok();
            }
        }

        stdout.flush().ok();
    }
}

fn render_error_row(stdout: &mut io::Stdout, error: &StructuralError) {
    writeln!(stdout).ok();
    writeln!(
        stdout,
        "{} [{}] {}",
        "x".red(),
        error.kind.as_str().dimmed(),
        error.msg
    )
    .ok();
    writeln!(stdout, "  {} {}", "Path:".dimmed(), error.loc.cyan()).ok();
    if let Some(suggestion) = &error.suggestion {
        writeln!(stdout, "  {} {}", "Fix:".dimmed(), suggestion.green()).ok();
    }
}

fn render_semantic(stdout: &mut io::Stdout, semantic: &SemanticResult) {
    writeln!(stdout).ok();
    let score = format!("{:.2}", semantic.semantic_score);
    let score = if semantic.is_semantically_valid {
        score.green()
    } else {
        score.red()
    };
    writeln!(stdout, "{} score {}", "Semantic validation:".cyan().bold(), score).ok();

    for issue in &semantic.issues {
        writeln!(stdout, "  {} {}", "!".yellow(), issue).ok();
    }
    for suggestion in &semantic.suggestions {
        writeln!(stdout, "  {} {}", "->".blue(), suggestion).ok();
    }
}
