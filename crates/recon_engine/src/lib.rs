//! Recon engine: backend client, job status polling, submission and export.
mod client;
mod export;
mod output;
mod poller;
mod submit;

pub use client::{ApiError, ApiFailureKind, ClientSettings, ReqwestScanApi, ScanApi, UNKNOWN_ERROR};
pub use export::{
    build_export, escape_xml, fetch_and_export, fetch_and_view, write_export, ExportDocument,
    ExportError,
};
pub use output::{OutputDir, PersistError};
pub use poller::{FeatureJobFetcher, JobFetcher, JobStatusPoller, RenderSink, TickOutcome};
pub use submit::{FormSubmitter, SubmitError};
