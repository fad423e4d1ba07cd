use std::fmt;

use crate::{
    domain::{FolderId, MembershipRule},
    errors::Error,
};

/// Pipeline states, in order. `Failed` is terminal and reachable from any non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Fetching,
    Partitioning,
    Classifying,
    ValidatingPlan,
    Allocating,
    Reporting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Fetching => "fetching",
            PipelineStage::Partitioning => "partitioning",
            PipelineStage::Classifying => "classifying",
            PipelineStage::ValidatingPlan => "validating plan",
            PipelineStage::Allocating => "allocating",
            PipelineStage::Reporting => "reporting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderResult {
    Created(FolderId),
    Failed(String),
    Skipped(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderOutcome {
    pub title: String,
    pub chat_count: usize,
    pub rule: MembershipRule,
    pub result: FolderResult,
}

impl FolderOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self.result, FolderResult::Created(_))
    }
}

/// Per-folder outcomes of a run that got past plan validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrganizationReport {
    pub outcomes: Vec<FolderOutcome>,
    /// Set when allocation stopped early (id range exhausted).
    pub aborted: Option<String>,
}

impl OrganizationReport {
    pub fn created(&self) -> impl Iterator<Item = &FolderOutcome> {
        self.outcomes.iter().filter(|o| o.is_created())
    }

    pub fn not_created(&self) -> impl Iterator<Item = &FolderOutcome> {
        self.outcomes.iter().filter(|o| !o.is_created())
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.outcomes.iter().all(FolderOutcome::is_created)
    }

    /// User-facing reply text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.is_complete() {
            out.push_str("✅ Data processing and folder organization completed!\n\n");
        } else {
            out.push_str("⚠️ Folder organization finished with errors.\n\n");
        }

        out.push_str("📊 Folders created:\n");
        let mut any = false;
        for o in self.created() {
            any = true;
            out.push_str(&format!("- {} ({} chats)\n", o.title, o.chat_count));
        }
        if !any {
            out.push_str("- none\n");
        }

        let mut failed = self.not_created().peekable();
        if failed.peek().is_some() {
            out.push_str("\n❌ Failed:\n");
            for o in failed {
                match &o.result {
                    FolderResult::Failed(reason) => {
                        out.push_str(&format!("- {}: {reason}\n", o.title))
                    }
                    FolderResult::Skipped(reason) => {
                        out.push_str(&format!("- {}: skipped ({reason})\n", o.title))
                    }
                    FolderResult::Created(_) => {}
                }
            }
        }

        if let Some(reason) = &self.aborted {
            out.push_str(&format!("\nAllocation stopped: {reason}\n"));
        }

        out.trim_end().to_string()
    }
}

/// A run that ended in `Failed` before any folder was touched.
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub error: Error,
}

impl PipelineFailure {
    pub fn render(&self) -> String {
        format!("❌ Error while {}: {}", self.stage, self.error)
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
