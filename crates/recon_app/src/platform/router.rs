use std::sync::Arc;
use std::time::Duration;

use engine_logging::engine_info;
use recon_core::{Feature, Msg};
use recon_engine::{OutputDir, ScanApi};

use super::commands::{Command, HELP};
use super::module::ActiveModule;
use super::persistence::{save_prefs, DashboardPrefs};

/// Keeps exactly one module open at a time and routes commands to it.
pub struct Router {
    api: Arc<dyn ScanApi>,
    output: OutputDir,
    poll_override: Option<Duration>,
    prefs: DashboardPrefs,
    active: Option<ActiveModule>,
}

impl Router {
    pub fn new(
        api: Arc<dyn ScanApi>,
        output: OutputDir,
        poll_override: Option<Duration>,
        prefs: DashboardPrefs,
    ) -> Self {
        Self {
            api,
            output,
            poll_override,
            prefs,
            active: None,
        }
    }

    pub fn prefs(&self) -> &DashboardPrefs {
        &self.prefs
    }

    pub fn active_feature(&self) -> Option<Feature> {
        self.active.as_ref().map(ActiveModule::feature)
    }

    /// Cleans up the current module and initializes `feature` in its place.
    pub fn open(&mut self, feature: Feature) {
        if self.active_feature() == Some(feature) {
            engine_info!("{} is already open", feature.title());
            return;
        }
        self.close();

        let module_prefs = self.prefs.module(feature);
        let mut module = ActiveModule::new(
            feature,
            self.api.clone(),
            self.output.clone(),
            module_prefs,
        );
        module.init(
            self.poll_override.unwrap_or(feature.default_interval()),
            module_prefs.last_target,
        );
        self.active = Some(module);

        self.prefs.last_feature = Some(feature.key().to_string());
        save_prefs(&self.output, &self.prefs);
    }

    pub fn close(&mut self) {
        if let Some(mut module) = self.active.take() {
            module.cleanup();
        }
    }

    /// Next message for the open module; never resolves while none is open.
    pub async fn next_msg(&mut self) -> Msg {
        match self.active.as_mut() {
            Some(module) => match module.recv().await {
                Some(msg) => msg,
                None => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let Some(module) = self.active.as_mut() else {
            return;
        };
        module.dispatch(msg);
        if self.prefs.set_module(module.feature(), module.prefs()) {
            save_prefs(&self.output, &self.prefs);
        }
    }

    /// Applies a parsed command. `Quit` is left to the caller.
    pub fn handle(&mut self, command: Command) {
        let msg = match command {
            Command::Open(feature) => {
                self.open(feature);
                return;
            }
            Command::Help | Command::Quit => {
                println!("{HELP}");
                return;
            }
            Command::Target(target) => Msg::TargetSelected(target),
            Command::Set { key, value } => Msg::OptionChanged { key, value },
            Command::Submit => Msg::SubmitClicked,
            Command::Stop(job_id) => Msg::StopClicked { job_id },
            Command::View(job_id) => Msg::ViewClicked { job_id },
            Command::Export { job_id, format } => Msg::ExportClicked { job_id, format },
            Command::Pause => self.toggle_msg(false),
            Command::Resume => self.toggle_msg(true),
            Command::Refresh => Msg::RefreshClicked,
        };

        if self.active.is_none() {
            println!("No module open. Use `open <feature>`; features: {}", feature_keys());
            return;
        }
        self.dispatch(msg);
    }

    /// Toggling is only needed when live updates are not already `live`.
    fn toggle_msg(&self, live: bool) -> Msg {
        match &self.active {
            Some(module) if module.state().auto_refresh() == live => Msg::NoOp,
            _ => Msg::ToggleAutoRefresh,
        }
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.close();
    }
}

fn feature_keys() -> String {
    Feature::ALL
        .iter()
        .map(|feature| feature.key())
        .collect::<Vec<_>>()
        .join(", ")
}
