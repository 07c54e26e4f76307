use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_error, engine_info, engine_warn};
use recon_core::{render_html, update, Feature, ModuleState, ModuleViewModel, Msg, TargetId};
use recon_engine::{FeatureJobFetcher, JobStatusPoller, OutputDir, ScanApi};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::effects::{ChannelSink, EffectRunner};
use super::persistence::ModulePrefs;

/// One feature page: its state, its poller and the channel that carries poll
/// results and effect outcomes back to the update loop.
pub struct ActiveModule {
    feature: Feature,
    state: ModuleState,
    api: Arc<dyn ScanApi>,
    poller: Arc<JobStatusPoller>,
    effects: EffectRunner,
    output: OutputDir,
    tx: UnboundedSender<Msg>,
    rx: UnboundedReceiver<Msg>,
}

impl ActiveModule {
    pub fn new(feature: Feature, api: Arc<dyn ScanApi>, output: OutputDir, prefs: ModulePrefs) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Arc::new(JobStatusPoller::new());
        let effects = EffectRunner::new(
            feature,
            api.clone(),
            poller.clone(),
            output.clone(),
            tx.clone(),
        );
        Self {
            feature,
            state: ModuleState::new(feature).with_auto_refresh(prefs.auto_refresh),
            api,
            poller,
            effects,
            output,
            tx,
            rx,
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Loads targets, restores the last selected one and starts polling.
    pub fn init(&mut self, interval: Duration, last_target: Option<TargetId>) {
        engine_info!("Opening {} (polling every {:?})", self.feature.title(), interval);

        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match api.list_targets().await {
                Ok(targets) => {
                    let restore = last_target.filter(|id| targets.iter().any(|t| t.id == *id));
                    let _ = tx.send(Msg::TargetsLoaded(targets));
                    if restore.is_some() {
                        let _ = tx.send(Msg::TargetSelected(restore));
                    }
                }
                Err(err) => {
                    engine_warn!("Failed to load targets: {}", err);
                    let _ = tx.send(Msg::TargetsFailed {
                        message: err.message,
                    });
                }
            }
        });

        if !self.state.auto_refresh() {
            self.poller.pause();
        }
        self.poller.start(
            interval,
            Arc::new(FeatureJobFetcher::new(self.api.clone(), self.feature)),
            Arc::new(ChannelSink::new(self.tx.clone())),
        );
        self.state.consume_dirty();
        self.render();
    }

    /// Stops the poller; messages still in flight are dropped with the module.
    pub fn cleanup(&mut self) {
        self.poller.stop();
        engine_info!("Closed {}", self.feature.title());
    }

    /// Next poll result or effect outcome for this module.
    pub async fn recv(&mut self) -> Option<Msg> {
        self.rx.recv().await
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::replace(&mut self.state, ModuleState::new(self.feature));
        let (state, effects) = update(state, msg);
        self.state = state;
        self.effects.run(effects, &self.state);
        if self.state.consume_dirty() {
            self.render();
        }
    }

    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    pub fn prefs(&self) -> ModulePrefs {
        ModulePrefs {
            auto_refresh: self.state.auto_refresh(),
            last_target: self.state.form().target(),
        }
    }

    fn render(&mut self) {
        let view = self.state.view(Utc::now());
        let filename = format!("{}.html", self.feature.slug());
        if let Err(err) = self.output.write_atomic(&filename, &render_html(&view)) {
            engine_error!("Failed to write {}: {}", filename, err);
        }
        println!("{}", console_line(&view));
    }
}

impl Drop for ActiveModule {
    fn drop(&mut self) {
        self.poller.stop();
    }
}

/// One-line summary printed after every change.
pub fn console_line(view: &ModuleViewModel) -> String {
    let mut line = format!(
        "[{}] {} | {}",
        view.feature.title(),
        if view.live { "LIVE" } else { "PAUSED" },
        view.status_line
    );
    if let Some(primary) = &view.primary {
        line.push_str(&format!(" | {} {}%", primary.headline, primary.percent));
    }
    if let Some(notice) = &view.stale_notice {
        line.push_str(&format!(" | {notice}"));
    }
    if let Some(banner) = &view.banner {
        line.push_str(&format!(" | {}", banner.text));
    }
    line
}
