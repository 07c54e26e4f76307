use crate::state::{Banner, SubmissionPhase};
use crate::{Effect, JobId, JobStatus, ModuleState, Msg, SUBDOMAIN_OPTION};

/// Pure update function: applies a message to module state and returns any
/// effects the runtime has to carry out.
pub fn update(mut state: ModuleState, msg: Msg) -> (ModuleState, Vec<Effect>) {
    let effects = match msg {
        Msg::TargetsLoaded(targets) => {
            state.set_targets(targets);
            Vec::new()
        }
        Msg::TargetsFailed { message } => {
            state.set_banner(Banner::error(format!("Failed to load targets: {message}")));
            Vec::new()
        }
        Msg::TargetSelected(target) => {
            if !target.is_none_or(|id| state.targets().contains(id)) {
                state.set_banner(Banner::error("Unknown target"));
                return (state, Vec::new());
            }
            state.select_target(target);
            match target {
                Some(target_id) if state.feature().uses_subdomains() => {
                    vec![Effect::LoadSubdomains { target_id }]
                }
                _ => Vec::new(),
            }
        }
        Msg::SubdomainsLoaded {
            target_id,
            subdomains,
        } => {
            // A late answer for a target the user already moved away from.
            if state.form().target() == Some(target_id) {
                state.set_subdomains(subdomains);
            }
            Vec::new()
        }
        Msg::SubdomainsFailed { target_id, message } => {
            if state.form().target() == Some(target_id) {
                state.set_banner(Banner::error(format!(
                    "Failed to load subdomains: {message}"
                )));
            }
            Vec::new()
        }
        Msg::OptionChanged { key, value } => {
            let value = value.trim();
            let unknown_subdomain = key == SUBDOMAIN_OPTION
                && !value.is_empty()
                && !state
                    .subdomains()
                    .iter()
                    .any(|sub| sub.id.to_string() == value);
            if unknown_subdomain {
                state.set_banner(Banner::error(format!("Unknown subdomain {value}")));
            } else if let Err(err) = state.form_mut().set_option(&key, value) {
                state.set_banner(Banner::error(err.to_string()));
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.phase() == SubmissionPhase::Submitting {
                return (state, Vec::new());
            }
            match state.form().validate() {
                Ok(request) => {
                    state.set_phase(SubmissionPhase::Submitting);
                    state.set_banner(Banner::info(format!(
                        "Starting {}...",
                        state.feature().title()
                    )));
                    vec![Effect::StartJob(request)]
                }
                Err(err) => {
                    state.set_banner(Banner::error(err.to_string()));
                    Vec::new()
                }
            }
        }
        Msg::SubmitSucceeded { job_id } => {
            state.set_phase(SubmissionPhase::Idle);
            state.reset_form();
            let text = match job_id {
                Some(id) => format!(
                    "{} started (job {id}). Progress will update automatically.",
                    state.feature().title()
                ),
                None => format!(
                    "{} started. Progress will update automatically.",
                    state.feature().title()
                ),
            };
            state.set_banner(Banner::success(text));
            Vec::new()
        }
        Msg::SubmitFailed { message } => {
            state.set_phase(SubmissionPhase::Idle);
            state.set_banner(Banner::error(format!(
                "Failed to start {}: {message}",
                state.feature().title()
            )));
            Vec::new()
        }
        Msg::JobsFetched { jobs, at } => {
            state.replace_jobs(jobs, at);
            Vec::new()
        }
        Msg::FetchFailed { message } => {
            state.record_poll_error(message);
            Vec::new()
        }
        Msg::StopClicked { job_id } => match state.job(job_id).map(|job| job.status) {
            Some(JobStatus::Running) => vec![Effect::StopJob { job_id }],
            Some(_) => {
                state.set_banner(Banner::error(format!("Job {job_id} is not running")));
                Vec::new()
            }
            None => {
                state.set_banner(Banner::error(format!("Unknown job {job_id}")));
                Vec::new()
            }
        },
        Msg::StopSucceeded { job_id } => {
            state.set_banner(Banner::success(format!("Job {job_id} stopped")));
            Vec::new()
        }
        Msg::StopFailed { job_id, message } => {
            state.set_banner(Banner::error(format!(
                "Failed to stop job {job_id}: {message}"
            )));
            Vec::new()
        }
        Msg::ViewClicked { job_id } => {
            if finished(&mut state, job_id, "view") {
                vec![Effect::ViewJob { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::ViewFinished { job_id, location } => {
            state.set_banner(Banner::success(format!(
                "Results of job {job_id} written to {location}"
            )));
            Vec::new()
        }
        Msg::ViewFailed { job_id, message } => {
            state.set_banner(Banner::error(format!(
                "Failed to load results of job {job_id}: {message}"
            )));
            Vec::new()
        }
        Msg::ExportClicked { job_id, format } => {
            if finished(&mut state, job_id, "export") {
                vec![Effect::ExportJob { job_id, format }]
            } else {
                Vec::new()
            }
        }
        Msg::ExportFinished { job_id, location } => {
            state.set_banner(Banner::success(format!(
                "Exported job {job_id} to {location}"
            )));
            Vec::new()
        }
        Msg::ExportFailed { job_id, message } => {
            state.set_banner(Banner::error(format!(
                "Failed to export job {job_id}: {message}"
            )));
            Vec::new()
        }
        Msg::ToggleAutoRefresh => {
            let enabled = !state.auto_refresh();
            state.set_auto_refresh(enabled);
            if enabled {
                vec![Effect::ResumePolling]
            } else {
                vec![Effect::PausePolling]
            }
        }
        Msg::RefreshClicked => vec![Effect::PollNow],
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// True when `job_id` is a completed job; otherwise explains why not.
fn finished(state: &mut ModuleState, job_id: JobId, verb: &str) -> bool {
    match state.job(job_id).map(|job| job.status) {
        Some(JobStatus::Completed) => true,
        Some(_) => {
            state.set_banner(Banner::error(format!(
                "Job {job_id} has no results to {verb} yet"
            )));
            false
        }
        None => {
            state.set_banner(Banner::error(format!("Unknown job {job_id}")));
            false
        }
    }
}
