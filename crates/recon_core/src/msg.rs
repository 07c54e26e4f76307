use chrono::{DateTime, Utc};

use crate::{ExportFormat, Job, JobId, Subdomain, Target, TargetId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Target list arrived for the picker and for job labels.
    TargetsLoaded(Vec<Target>),
    /// The target list could not be loaded.
    TargetsFailed { message: String },
    /// User picked (or cleared) the target in the start form.
    TargetSelected(Option<TargetId>),
    /// Active subdomains of `target_id` arrived for the subdomain picker.
    SubdomainsLoaded {
        target_id: TargetId,
        subdomains: Vec<Subdomain>,
    },
    SubdomainsFailed { target_id: TargetId, message: String },
    /// User changed one of the start form options.
    OptionChanged { key: String, value: String },
    /// User submitted the start form.
    SubmitClicked,
    /// Backend accepted the start request.
    SubmitSucceeded { job_id: Option<JobId> },
    /// Start request failed at transport or application level.
    SubmitFailed { message: String },
    /// A poll completed; `jobs` is authoritative as of `at`.
    JobsFetched { jobs: Vec<Job>, at: DateTime<Utc> },
    /// A poll failed; the previous job list stays on screen.
    FetchFailed { message: String },
    /// User asked to stop a job.
    StopClicked { job_id: JobId },
    StopSucceeded { job_id: JobId },
    StopFailed { job_id: JobId, message: String },
    /// User asked to see the full results of a finished job.
    ViewClicked { job_id: JobId },
    ViewFinished { job_id: JobId, location: String },
    ViewFailed { job_id: JobId, message: String },
    /// User asked for an export of a finished job.
    ExportClicked { job_id: JobId, format: ExportFormat },
    ExportFinished { job_id: JobId, location: String },
    ExportFailed { job_id: JobId, message: String },
    /// User toggled live updates.
    ToggleAutoRefresh,
    /// User asked for an immediate refresh of the job list.
    RefreshClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
