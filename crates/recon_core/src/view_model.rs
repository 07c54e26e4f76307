use crate::{Banner, Feature, JobId, JobStatus, TargetId};

/// Everything the HTML renderer needs for one module page. Built by
/// [`crate::ModuleState::view`]; holds no references back into state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleViewModel {
    pub feature: Feature,
    pub live: bool,
    pub status_line: String,
    pub last_updated: Option<String>,
    pub stale_notice: Option<String>,
    pub banner: Option<Banner>,
    pub primary: Option<PrimaryProgressView>,
    pub form: FormView,
    pub cards: Vec<JobCardView>,
}

/// Single-slot progress indicator at the top of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryProgressView {
    pub job_id: JobId,
    pub headline: String,
    pub percent: u8,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub targets: Vec<(TargetId, String)>,
    pub selected_target: Option<TargetId>,
    /// Choices for the subdomain option: id and host name.
    pub subdomains: Vec<(u64, String)>,
    pub options: Vec<(String, String)>,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardView {
    pub job_id: JobId,
    pub target_label: String,
    pub job_type: String,
    pub status: JobStatus,
    pub started: Option<String>,
    pub progress: Option<ProgressView>,
    pub summary: Option<SummaryView>,
    pub actions: Vec<JobAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub percent: u8,
    pub phase: String,
    pub elapsed_secs: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub headline: Option<u64>,
    pub metrics: Vec<(String, u64)>,
    /// The job finished but its results have not arrived or did not parse.
    pub pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Stop,
    ViewResults,
    Export,
}

impl JobAction {
    pub fn label(self) -> &'static str {
        match self {
            JobAction::Stop => "Stop",
            JobAction::ViewResults => "View Results",
            JobAction::Export => "Export",
        }
    }
}
