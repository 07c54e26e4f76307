use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_warn};
use recon_core::{Effect, Feature, Job, ModuleState, Msg};
use recon_engine::{
    fetch_and_export, fetch_and_view, ApiError, FormSubmitter, JobStatusPoller, OutputDir,
    RenderSink, ScanApi,
};
use tokio::sync::mpsc::UnboundedSender;

/// Feeds poll results back into the module's update loop.
pub struct ChannelSink {
    tx: UnboundedSender<Msg>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Msg>) -> Self {
        Self { tx }
    }
}

impl RenderSink for ChannelSink {
    fn render(&self, jobs: &[Job], fetched_at: DateTime<Utc>) {
        let _ = self.tx.send(Msg::JobsFetched {
            jobs: jobs.to_vec(),
            at: fetched_at,
        });
    }

    fn fetch_failed(&self, error: &ApiError) {
        let _ = self.tx.send(Msg::FetchFailed {
            message: error.message.clone(),
        });
    }
}

/// Executes effects produced by `recon_core::update` on the tokio runtime.
/// Every outcome comes back as a [`Msg`] on the module's channel.
pub struct EffectRunner {
    feature: Feature,
    api: Arc<dyn ScanApi>,
    submitter: Arc<FormSubmitter>,
    poller: Arc<JobStatusPoller>,
    exports: OutputDir,
    tx: UnboundedSender<Msg>,
}

impl EffectRunner {
    pub fn new(
        feature: Feature,
        api: Arc<dyn ScanApi>,
        poller: Arc<JobStatusPoller>,
        exports: OutputDir,
        tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            feature,
            submitter: Arc::new(FormSubmitter::new(api.clone(), feature)),
            api,
            poller,
            exports,
            tx,
        }
    }

    /// `state` is the state the effects were produced from; exports read the
    /// job and its target label from it.
    pub fn run(&self, effects: Vec<Effect>, state: &ModuleState) {
        for effect in effects {
            engine_debug!("{} effect: {:?}", self.feature.key(), effect);
            match effect {
                Effect::StartJob(request) => {
                    let submitter = self.submitter.clone();
                    let poller = self.poller.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let msg = match submitter.start(request, &poller).await {
                            Ok(job_id) => Msg::SubmitSucceeded { job_id },
                            Err(err) => Msg::SubmitFailed {
                                message: err.message,
                            },
                        };
                        let _ = tx.send(msg);
                    });
                }
                Effect::LoadSubdomains { target_id } => {
                    let api = self.api.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let msg = match api.list_subdomains(target_id).await {
                            Ok(subdomains) => Msg::SubdomainsLoaded {
                                target_id,
                                subdomains,
                            },
                            Err(err) => {
                                engine_warn!("Failed to load subdomains of {}: {}", target_id, err);
                                Msg::SubdomainsFailed {
                                    target_id,
                                    message: err.message,
                                }
                            }
                        };
                        let _ = tx.send(msg);
                    });
                }
                Effect::StopJob { job_id } => {
                    let submitter = self.submitter.clone();
                    let poller = self.poller.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let msg = match submitter.stop(job_id, &poller).await {
                            Ok(()) => Msg::StopSucceeded { job_id },
                            Err(err) => Msg::StopFailed {
                                job_id,
                                message: err.message,
                            },
                        };
                        let _ = tx.send(msg);
                    });
                }
                Effect::ViewJob { job_id } => {
                    let Some(job) = state.job(job_id).cloned() else {
                        let _ = self.tx.send(Msg::ViewFailed {
                            job_id,
                            message: "job is no longer listed".to_string(),
                        });
                        continue;
                    };
                    let label = state.targets().label_for(&job);
                    let api = self.api.clone();
                    let pages = self.exports.clone();
                    let feature = self.feature;
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let msg = match fetch_and_view(api.as_ref(), feature, &job, &label, &pages)
                            .await
                        {
                            Ok(path) => Msg::ViewFinished {
                                job_id,
                                location: path.display().to_string(),
                            },
                            Err(err) => Msg::ViewFailed {
                                job_id,
                                message: err.to_string(),
                            },
                        };
                        let _ = tx.send(msg);
                    });
                }
                Effect::ExportJob { job_id, format } => {
                    let Some(job) = state.job(job_id).cloned() else {
                        let _ = self.tx.send(Msg::ExportFailed {
                            job_id,
                            message: "job is no longer listed".to_string(),
                        });
                        continue;
                    };
                    let label = state.targets().label_for(&job);
                    let api = self.api.clone();
                    let exports = self.exports.clone();
                    let feature = self.feature;
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = fetch_and_export(
                            api.as_ref(),
                            feature,
                            &job,
                            &label,
                            format,
                            &exports,
                            Utc::now(),
                        )
                        .await;
                        let msg = match result {
                            Ok(path) => Msg::ExportFinished {
                                job_id,
                                location: path.display().to_string(),
                            },
                            Err(err) => Msg::ExportFailed {
                                job_id,
                                message: err.to_string(),
                            },
                        };
                        let _ = tx.send(msg);
                    });
                }
                Effect::PollNow => {
                    let poller = self.poller.clone();
                    tokio::spawn(async move {
                        let outcome = poller.poll_now().await;
                        engine_debug!("Manual refresh: {:?}", outcome);
                    });
                }
                Effect::PausePolling => self.poller.pause(),
                Effect::ResumePolling => self.poller.resume(),
            }
        }
    }
}
