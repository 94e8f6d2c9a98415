//! End of run handling

use sprout_installer::InstallReport;

/// Header of the failure block
pub const FAILURE_HEADER: &str = "Installer failed:";

/// What the run ends with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalization {
    /// Nothing failed; continue at the post-install location
    HandOff { location: String, installed: usize },
    /// At least one failure was recorded
    Failed { messages: Vec<String> },
}

impl Finalization {
    /// Decide the ending of a run from its report
    pub fn from_report(report: &InstallReport, post_install: &str) -> Self {
        if report.errors.is_empty() {
            Finalization::HandOff {
                location: post_install.to_string(),
                installed: report.installed.len(),
            }
        } else {
            Finalization::Failed {
                messages: report.errors.messages().to_vec(),
            }
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Finalization::HandOff { .. } => 0,
            Finalization::Failed { .. } => 1,
        }
    }

    /// The failure block, one line per message
    pub fn failure_lines(&self) -> Option<Vec<String>> {
        match self {
            Finalization::HandOff { .. } => None,
            Finalization::Failed { messages } => Some(
                std::iter::once(FAILURE_HEADER.to_string())
                    .chain(messages.iter().cloned())
                    .collect(),
            ),
        }
    }
}
