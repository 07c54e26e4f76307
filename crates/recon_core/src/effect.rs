use crate::{ExportFormat, JobId, StartRequest, TargetId};

/// Side effects requested by [`crate::update`]; the runtime executes them and
/// reports back with a [`crate::Msg`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartJob(StartRequest),
    LoadSubdomains { target_id: TargetId },
    StopJob { job_id: JobId },
    /// Write the results page of a finished job.
    ViewJob { job_id: JobId },
    ExportJob { job_id: JobId, format: ExportFormat },
    /// One out-of-band poll, outside the regular schedule.
    PollNow,
    PausePolling,
    ResumePolling,
}
