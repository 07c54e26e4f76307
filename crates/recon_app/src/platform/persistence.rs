use std::collections::BTreeMap;

use engine_logging::{engine_error, engine_info, engine_warn};
use recon_core::{Feature, TargetId};
use recon_engine::OutputDir;
use serde::{Deserialize, Serialize};

pub const PREFS_FILENAME: &str = ".recon_dashboard.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePrefs {
    pub auto_refresh: bool,
    pub last_target: Option<TargetId>,
}

impl Default for ModulePrefs {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            last_target: None,
        }
    }
}

/// What the dashboard remembers between runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardPrefs {
    /// Key of the module that was open last.
    pub last_feature: Option<String>,
    /// Keyed by feature key.
    pub modules: BTreeMap<String, ModulePrefs>,
}

impl DashboardPrefs {
    pub fn module(&self, feature: Feature) -> ModulePrefs {
        self.modules.get(feature.key()).copied().unwrap_or_default()
    }

    /// Records `prefs` for `feature`; returns whether anything changed.
    pub fn set_module(&mut self, feature: Feature, prefs: ModulePrefs) -> bool {
        let previous = self.modules.insert(feature.key().to_string(), prefs);
        previous != Some(prefs)
    }

    pub fn last_feature(&self) -> Option<Feature> {
        self.last_feature.as_deref().and_then(Feature::parse)
    }
}

/// Reads preferences, falling back to defaults on any problem.
pub fn load_prefs(dir: &OutputDir) -> DashboardPrefs {
    let content = match dir.read(PREFS_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return DashboardPrefs::default(),
        Err(err) => {
            engine_warn!("Failed to read preferences from {:?}: {}", dir.path(), err);
            return DashboardPrefs::default();
        }
    };

    match ron::from_str(&content) {
        Ok(prefs) => {
            engine_info!("Loaded preferences from {:?}", dir.path());
            prefs
        }
        Err(err) => {
            engine_warn!("Failed to parse preferences in {:?}: {}", dir.path(), err);
            DashboardPrefs::default()
        }
    }
}

pub fn save_prefs(dir: &OutputDir, prefs: &DashboardPrefs) {
    let content = match ron::ser::to_string_pretty(prefs, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize preferences: {}", err);
            return;
        }
    };

    if let Err(err) = dir.write_atomic(PREFS_FILENAME, &content) {
        engine_error!("Failed to write preferences to {:?}: {}", dir.path(), err);
    }
}
