//! Output formatting for resolved flag reports.

use crate::envflags::FlagReport;
use crate::error::ValueError;
use crate::value::FlagValue;

/// Output format for flag reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl FlagValue for OutputFormat {
    fn parse_flag(raw: &str) -> Result<Self, ValueError> {
        Self::from_str(raw).ok_or(ValueError::Syntax)
    }

    fn format_flag(&self) -> String {
        self.as_str().to_string()
    }
}

/// Format a report in the requested format.
pub fn format_report(report: &[FlagReport], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Markdown => Ok(format_report_markdown(report)),
    }
}

/// Format a report as markdown.
pub fn format_report_markdown(report: &[FlagReport]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Flags ({})\n", report.len()));

    for flag in report {
        md.push_str(&format!("\n## --{}\n", flag.name));
        md.push_str(&format!("- **value**: `{}`\n", flag.value));
        md.push_str(&format!("- **source**: {}\n", flag.source));
        if !flag.default_value.is_empty() {
            md.push_str(&format!("- **default**: `{}`\n", flag.default_value));
        }
        if let Some(ref env) = flag.env {
            md.push_str(&format!("- **env**: `{}`\n", env));
        }
        if !flag.usage.is_empty() {
            md.push_str(&format!("- **usage**: {}\n", flag.usage));
        }
    }

    md
}
