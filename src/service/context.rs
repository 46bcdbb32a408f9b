//! Per-request context.

use std::path::{Path, PathBuf};

use crate::report::ReportFormat;

/// Name (without extension) of the persisted report file.
pub const REPORT_NAME: &str = "report";

/// Immutable per-request identifiers and paths.
///
/// One value is built per upload and owned by that request alone, so
/// concurrent verifications never observe each other's paths.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// App identifier supplied by the caller.
    pub app_id: String,
    /// Base name of the uploaded artifact.
    pub file_name: String,
    /// Directory holding this app's artifact and report.
    pub app_dir: PathBuf,
    /// Where the uploaded artifact is saved.
    pub artifact_path: PathBuf,
    /// Where the report is persisted under asynchronous delivery.
    pub report_path: PathBuf,
}

impl RequestContext {
    /// Derive all request paths from the apps directory and identifiers.
    #[must_use]
    pub fn new(apps_dir: &Path, app_id: &str, file_name: &str, format: ReportFormat) -> Self {
        let app_dir = apps_dir.join(app_id);
        Self {
            app_id: app_id.to_string(),
            file_name: file_name.to_string(),
            artifact_path: app_dir.join(file_name),
            report_path: app_dir.join(format!("{REPORT_NAME}.{}", format.extension())),
            app_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_keyed_by_app_id() {
        let ctx = RequestContext::new(
            Path::new("/tmp/sigbridge"),
            "app-42",
            "demo.apk",
            ReportFormat::Html,
        );
        assert_eq!(ctx.app_dir, PathBuf::from("/tmp/sigbridge/app-42"));
        assert_eq!(
            ctx.artifact_path,
            PathBuf::from("/tmp/sigbridge/app-42/demo.apk")
        );
        assert_eq!(
            ctx.report_path,
            PathBuf::from("/tmp/sigbridge/app-42/report.html")
        );
    }
}
