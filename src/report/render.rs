//! Report rendering.
//!
//! Only HTML rendering is implemented. TXT, JSON and PDF are accepted as
//! configuration values but rendering them fails loudly with
//! `RenderError::Unsupported` instead of producing an empty report.

use chrono::Local;
use serde::{Deserialize, Serialize};

use super::classify::VerificationStatus;

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    Txt,
    Json,
    Pdf,
}

impl ReportFormat {
    /// File extension used when the report is persisted.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }
}

/// Error type for report rendering.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// The requested format has no renderer.
    #[error("Report format {0:?} is not implemented")]
    Unsupported(ReportFormat),
}

/// A rendered verification report.
#[derive(Debug, Clone)]
pub struct Report {
    /// Rendered report body.
    pub body: String,
    /// Format the body was rendered in.
    pub format: ReportFormat,
    /// Status the report describes.
    pub status: VerificationStatus,
}

/// Renders verification reports from classified tool output.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    tool_name: String,
}

impl ReportRenderer {
    /// Create a renderer that labels reports with the given tool name.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }

    /// Render a report in the requested format.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Unsupported` for every format except HTML.
    pub fn render(
        &self,
        format: ReportFormat,
        file_name: &str,
        status: VerificationStatus,
        tool_output: &str,
    ) -> Result<Report, RenderError> {
        match format {
            ReportFormat::Html => Ok(Report {
                body: self.render_html(file_name, status, tool_output),
                format,
                status,
            }),
            unsupported => Err(RenderError::Unsupported(unsupported)),
        }
    }

    fn render_html(
        &self,
        file_name: &str,
        status: VerificationStatus,
        tool_output: &str,
    ) -> String {
        let (color, description) = match status {
            VerificationStatus::SignedOk => ("green", "App is signed."),
            VerificationStatus::Warning => (
                "orange",
                "App is signed (note: some warnings exist, see below for details).",
            ),
            VerificationStatus::UnsignedOrMissigned => {
                ("red", "App is unsigned or incorrectly signed.")
            }
            VerificationStatus::Error => ("red", "Error or exception processing app."),
        };
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

        format!(
            "<html>\n<head><title>{tool} Report</title></head>\n<body>\n\
             <h2>{tool} Report</h2>\n\
             <p>File: {file}</p>\n\
             <p>Generated: {timestamp}</p>\n\
             <p>Status: <span style=\"color:{color}\"><b>{status}</b></span></p>\n\
             <p>Description: {description}</p>\n\
             <hr>\n\
             <pre>{output}</pre>\n\
             </body>\n</html>\n",
            tool = escape_html(&self.tool_name),
            file = escape_html(file_name),
            status = status.name(),
            output = escape_html(tool_output),
        )
    }
}

/// Escape text for embedding in HTML.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_report_contains_status_and_output() {
        let renderer = ReportRenderer::new("Signature Verifier");
        let report = renderer
            .render(
                ReportFormat::Html,
                "app.apk",
                VerificationStatus::SignedOk,
                "jar verified.",
            )
            .unwrap();
        assert_eq!(report.format, ReportFormat::Html);
        assert_eq!(report.status, VerificationStatus::SignedOk);
        assert!(report.body.contains("SIGNED_OK"));
        assert!(report.body.contains("jar verified."));
        assert!(report.body.contains("app.apk"));
    }

    #[test]
    fn test_html_report_escapes_tool_output() {
        let renderer = ReportRenderer::new("Signature Verifier");
        let report = renderer
            .render(
                ReportFormat::Html,
                "app.apk",
                VerificationStatus::Error,
                "<script>alert(1)</script>",
            )
            .unwrap();
        assert!(!report.body.contains("<script>"));
        assert!(report.body.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_unsupported_formats_fail_loudly() {
        let renderer = ReportRenderer::new("Signature Verifier");
        for format in [ReportFormat::Txt, ReportFormat::Json, ReportFormat::Pdf] {
            let err = renderer
                .render(format, "app.apk", VerificationStatus::SignedOk, "ok")
                .unwrap_err();
            assert!(matches!(err, RenderError::Unsupported(f) if f == format));
        }
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(ReportFormat::Html.extension(), "html");
        assert_eq!(ReportFormat::Txt.extension(), "txt");
        assert_eq!(ReportFormat::Json.extension(), "json");
        assert_eq!(ReportFormat::Pdf.extension(), "pdf");
    }
}
