//! Classification of tool output into a verification status.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Verification outcome derived from captured tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Artifact is signed with no warnings.
    SignedOk,
    /// Artifact is unsigned or its signature did not verify.
    UnsignedOrMissigned,
    /// Artifact is signed but the tool emitted warnings.
    Warning,
    /// Tool failed, produced no recognized markers, or reported an
    /// internal error.
    Error,
}

impl VerificationStatus {
    /// Wire name of the status, as carried in report callbacks.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SignedOk => "SIGNED_OK",
            Self::UnsignedOrMissigned => "UNSIGNED_OR_MISSIGNED",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Classifies tool output text via ordered pattern rules.
#[derive(Debug, Clone)]
pub struct ReportClassifier {
    unsigned: Regex,
    warning: Regex,
    signed: Regex,
}

impl Default for ReportClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportClassifier {
    /// Build the classifier with its built-in marker patterns.
    ///
    /// # Panics
    ///
    /// Panics if the built-in patterns fail to compile, which would be a
    /// programming error caught by the tests below.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unsigned: Regex::new(
                r"(?i)unsigned|invalid signature|incorrectly signed|not signed|does not verify|verification failed",
            )
            .expect("unsigned marker pattern"),
            warning: Regex::new(r"(?i)warning").expect("warning marker pattern"),
            signed: Regex::new(r"(?i)verifie[sd]|\bsigned\b|signature verified")
                .expect("signed marker pattern"),
        }
    }

    /// Map captured tool output to a verification status.
    ///
    /// Text may match several marker sets, so rules are evaluated in a
    /// fixed order and the first match wins:
    ///
    /// 1. an unsigned / invalid-signature marker -> `UnsignedOrMissigned`
    /// 2. a signed marker together with a warning marker -> `Warning`
    /// 3. a signed marker alone -> `SignedOk`
    /// 4. anything else, including internal-error markers -> `Error`
    ///
    /// Deterministic and side-effect free: identical text always yields
    /// the identical status.
    #[must_use]
    pub fn classify(&self, text: &str) -> VerificationStatus {
        if self.unsigned.is_match(text) {
            VerificationStatus::UnsignedOrMissigned
        } else if self.signed.is_match(text) {
            if self.warning.is_match(text) {
                VerificationStatus::Warning
            } else {
                VerificationStatus::SignedOk
            }
        } else {
            VerificationStatus::Error
        }
    }
}
