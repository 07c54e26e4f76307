//! Recon dashboard core: data model, result compatibility mapping, start form,
//! pure module state machine and the HTML renderer.
pub mod compat;
mod effect;
mod feature;
mod form;
mod msg;
mod render;
mod state;
mod types;
mod update;
mod view_model;

pub use compat::{Metric, ResultSummary, COMPAT_VERSION};
pub use effect::Effect;
pub use feature::Feature;
pub use form::{enabled_sources, FormError, ScanForm, SUBDOMAIN_OPTION};
pub use msg::Msg;
pub use render::{
    build_cards, escape_html, primary_progress, render_cards, render_html, render_results_page,
    status_line,
};
pub use state::{Banner, BannerKind, ModuleState, SubmissionPhase};
pub use types::{
    parse_timestamp, Envelope, ExportFormat, Job, JobId, JobStatus, StartRequest, StartedJob,
    Subdomain, Target, TargetCache, TargetId,
};
pub use update::update;
pub use view_model::{
    FormView, JobAction, JobCardView, ModuleViewModel, PrimaryProgressView, ProgressView,
    SummaryView,
};
