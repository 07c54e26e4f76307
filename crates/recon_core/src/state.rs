use chrono::{DateTime, Utc};

use crate::render::build_view;
use crate::view_model::ModuleViewModel;
use crate::{Feature, Job, JobId, ScanForm, Subdomain, Target, TargetCache, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            text: text.into(),
        }
    }
}

/// State of one open feature module. Built when the module is activated and
/// dropped when the router switches away.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleState {
    feature: Feature,
    targets: TargetCache,
    /// Subdomains of the selected target.
    subdomains: Vec<Subdomain>,
    jobs: Vec<Job>,
    form: ScanForm,
    phase: SubmissionPhase,
    banner: Option<Banner>,
    auto_refresh: bool,
    last_updated: Option<DateTime<Utc>>,
    last_poll_error: Option<String>,
    dirty: bool,
}

impl ModuleState {
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            targets: TargetCache::default(),
            subdomains: Vec::new(),
            jobs: Vec::new(),
            form: ScanForm::new(feature),
            phase: SubmissionPhase::Idle,
            banner: None,
            auto_refresh: true,
            last_updated: None,
            last_poll_error: None,
            dirty: true,
        }
    }

    /// Starts with live updates on or off, e.g. from saved preferences.
    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == job_id)
    }

    pub fn targets(&self) -> &TargetCache {
        &self.targets
    }

    pub fn subdomains(&self) -> &[Subdomain] {
        &self.subdomains
    }

    pub fn form(&self) -> &ScanForm {
        &self.form
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn last_poll_error(&self) -> Option<&str> {
        self.last_poll_error.as_deref()
    }

    pub fn view(&self, now: DateTime<Utc>) -> ModuleViewModel {
        build_view(self, now)
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn form_mut(&mut self) -> &mut ScanForm {
        self.dirty = true;
        &mut self.form
    }

    pub(crate) fn set_targets(&mut self, targets: Vec<Target>) {
        self.targets = TargetCache::new(targets);
        if let Some(selected) = self.form.target() {
            if !self.targets.contains(selected) {
                self.select_target(None);
            }
        }
        self.dirty = true;
    }

    pub(crate) fn select_target(&mut self, target: Option<TargetId>) {
        self.form.select_target(target);
        self.form.clear_subdomain();
        self.subdomains.clear();
        self.dirty = true;
    }

    pub(crate) fn set_subdomains(&mut self, subdomains: Vec<Subdomain>) {
        self.subdomains = subdomains;
        self.dirty = true;
    }

    /// Back to a blank form after a successful start.
    pub(crate) fn reset_form(&mut self) {
        self.form.reset();
        self.subdomains.clear();
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: SubmissionPhase) {
        self.phase = phase;
        self.dirty = true;
    }

    pub(crate) fn set_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
        self.dirty = true;
    }

    /// Full replace: each completed fetch is authoritative at that moment.
    pub(crate) fn replace_jobs(&mut self, jobs: Vec<Job>, at: DateTime<Utc>) {
        self.jobs = jobs;
        self.last_updated = Some(at);
        self.last_poll_error = None;
        self.dirty = true;
    }

    pub(crate) fn record_poll_error(&mut self, message: String) {
        self.last_poll_error = Some(message);
        self.dirty = true;
    }

    pub(crate) fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
        self.dirty = true;
    }
}
