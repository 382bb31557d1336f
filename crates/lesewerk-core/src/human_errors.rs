// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for extraction failures.
//
// End users never see the internal failure kinds. Every failure maps to the
// same headline; only the suggestion changes.

use crate::types::{ExtractionFailure, FailureKind};

/// Headline shown for any failed extraction.
pub const GENERIC_FAILURE_MESSAGE: &str = "We could not extract text from this document.";

/// Severity of a failure from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A service hiccup — trying again later may work.
    Transient,
    /// The user should supply a different file.
    ActionRequired,
    /// Nothing the user can do with this file.
    Permanent,
}

/// A human-readable failure with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert an [`ExtractionFailure`] into something safe to show a user.
pub fn humanize_failure(failure: &ExtractionFailure) -> HumanError {
    match failure.kind {
        FailureKind::UnsupportedFormat => HumanError {
            message: GENERIC_FAILURE_MESSAGE.into(),
            suggestion: "Upload a PDF, JPEG, PNG, or TIFF file instead.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        FailureKind::UnsupportedDocument => HumanError {
            message: GENERIC_FAILURE_MESSAGE.into(),
            suggestion: "The file may be encrypted or damaged. Try removing the password or re-exporting it as a new PDF.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        FailureKind::OcrFailed => HumanError {
            message: GENERIC_FAILURE_MESSAGE.into(),
            suggestion: "Text recognition is temporarily unavailable. Please try again in a few minutes.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: FailureKind) -> ExtractionFailure {
        ExtractionFailure {
            kind,
            message: "internal detail".into(),
        }
    }

    #[test]
    fn every_kind_uses_the_generic_headline() {
        for kind in [
            FailureKind::UnsupportedFormat,
            FailureKind::UnsupportedDocument,
            FailureKind::OcrFailed,
        ] {
            let human = humanize_failure(&failure(kind));
            assert_eq!(human.message, GENERIC_FAILURE_MESSAGE);
            assert!(!human.suggestion.contains("internal detail"));
        }
    }

    #[test]
    fn ocr_outage_is_retriable() {
        let human = humanize_failure(&failure(FailureKind::OcrFailed));
        assert!(human.retriable);
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn wrong_format_needs_user_action() {
        let human = humanize_failure(&failure(FailureKind::UnsupportedFormat));
        assert_eq!(human.severity, Severity::ActionRequired);
    }
}
