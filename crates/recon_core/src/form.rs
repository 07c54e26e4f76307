use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{Feature, StartRequest, TargetId};

/// Form option holding the optional subdomain a job is narrowed to.
pub const SUBDOMAIN_OPTION: &str = "subdomain_id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please select a target")]
    MissingTarget,
    #[error("Please specify custom ports")]
    MissingCustomPorts,
    #[error("Unknown option `{0}`")]
    UnknownOption(String),
}

/// Start-job form for one feature: the selected target plus string options
/// seeded from [`Feature::default_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanForm {
    feature: Feature,
    target: Option<TargetId>,
    options: BTreeMap<String, String>,
}

impl ScanForm {
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            target: None,
            options: defaults(feature),
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn select_target(&mut self, target: Option<TargetId>) {
        self.target = target;
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), FormError> {
        match self.options.get_mut(key) {
            Some(slot) => {
                *slot = value.trim().to_string();
                Ok(())
            }
            None => Err(FormError::UnknownOption(key.to_string())),
        }
    }

    /// Checks the form and builds the start request. Nothing here touches the
    /// network, so a failure means no request is ever sent.
    pub fn validate(&self) -> Result<StartRequest, FormError> {
        let target_id = self.target.ok_or(FormError::MissingTarget)?;
        if self.option("port_profile") == Some("custom")
            && self.option("custom_ports").is_none_or(str::is_empty)
        {
            return Err(FormError::MissingCustomPorts);
        }
        Ok(StartRequest {
            target_id,
            config: self.to_config(),
        })
    }

    pub fn to_config(&self) -> Value {
        let mut config = Map::new();
        for (key, raw) in &self.options {
            config.insert(key.clone(), typed_value(raw));
        }
        if self.feature == Feature::PortScanning && self.option("port_profile") != Some("custom") {
            config.insert("custom_ports".to_string(), Value::Null);
        }
        if self.feature == Feature::Osint {
            let kind = self.option("intelligence_type").unwrap_or("comprehensive");
            let sources = enabled_sources(kind)
                .iter()
                .map(|s| Value::String((*s).to_string()))
                .collect();
            config.insert("enabled_sources".to_string(), Value::Array(sources));
        }
        Value::Object(config)
    }

    /// Drops the subdomain choice; it only makes sense for the target it was
    /// picked under.
    pub fn clear_subdomain(&mut self) {
        if let Some(slot) = self.options.get_mut(SUBDOMAIN_OPTION) {
            slot.clear();
        }
    }

    /// Back to defaults, target cleared.
    pub fn reset(&mut self) {
        self.target = None;
        self.options = defaults(self.feature);
    }
}

/// OSINT sources enabled for each intelligence type.
pub fn enabled_sources(intelligence_type: &str) -> &'static [&'static str] {
    match intelligence_type {
        "breach_analysis" => &["breach", "paste_sites", "dark_web"],
        "social_media" => &["social_media", "employees", "linkedin"],
        "technology" => &["technology", "cloud_services", "third_party"],
        _ => &["email", "breach", "social_media", "technology", "threat_intel"],
    }
}

fn defaults(feature: Feature) -> BTreeMap<String, String> {
    feature
        .default_options()
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn typed_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    match raw.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(raw.to_string()),
    }
}
