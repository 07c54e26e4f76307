use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use recon_core::{Feature, FormError, JobId, ScanForm, StartRequest};
use thiserror::Error;

use crate::client::{ApiError, ScanApi};
use crate::poller::JobStatusPoller;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The form did not validate; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Sends start and stop requests for one feature and refreshes the job list
/// once after each accepted request.
pub struct FormSubmitter {
    api: Arc<dyn ScanApi>,
    feature: Feature,
}

impl FormSubmitter {
    pub fn new(api: Arc<dyn ScanApi>, feature: Feature) -> Self {
        Self { api, feature }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Validates `form` and starts a job from it. Returns the new job id when
    /// the backend reports one.
    pub async fn submit(
        &self,
        form: &ScanForm,
        poller: &JobStatusPoller,
    ) -> Result<Option<JobId>, SubmitError> {
        let request = form.validate()?;
        Ok(self.start(request, poller).await?)
    }

    /// Starts a job from an already validated request.
    pub async fn start(
        &self,
        request: StartRequest,
        poller: &JobStatusPoller,
    ) -> Result<Option<JobId>, ApiError> {
        let started = self
            .api
            .start_job(self.feature, &request)
            .await
            .inspect_err(|err| {
                engine_warn!("Starting {} failed: {}", self.feature.title(), err);
            })?;
        engine_info!(
            "{} started for target {} (job {:?})",
            self.feature.title(),
            request.target_id,
            started.job_id
        );
        poller.poll_now().await;
        Ok(started.job_id)
    }

    pub async fn stop(&self, job_id: JobId, poller: &JobStatusPoller) -> Result<(), ApiError> {
        self.api
            .stop_job(self.feature, job_id)
            .await
            .inspect_err(|err| engine_warn!("Stopping job {} failed: {}", job_id, err))?;
        engine_info!("Job {} stopped", job_id);
        poller.poll_now().await;
        Ok(())
    }
}
