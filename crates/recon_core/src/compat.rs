//! Compatibility mapping for job result payloads.
//!
//! The backend has renamed result fields several times and different job
//! types nest their payloads differently. Everything that reads a count out
//! of `results` goes through this module so the alias tables live in one
//! place. Bump [`COMPAT_VERSION`] whenever an alias list changes.

use serde_json::{Map, Value};

use crate::Feature;

pub const COMPAT_VERSION: u32 = 1;

/// Wrapper keys some job types put around their real payload.
const NESTED_WRAPPERS: &[&str] = &["api_discovery_results", "workflow_results"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalCount,
    OpenPorts,
    Technologies,
    Apis,
    Endpoints,
    Vulnerabilities,
    CriticalVulnerabilities,
    Emails,
    Breaches,
    Employees,
    HighValueTargets,
    AttackChains,
}

impl Metric {
    /// Field names tried in order. Dotted entries walk nested objects.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Metric::TotalCount => &["total_count", "total_results", "total", "count"],
            Metric::OpenPorts => &["open_ports", "total_ports", "ports_found", "ports"],
            Metric::Technologies => &[
                "technologies",
                "technologies_found",
                "detected_technologies",
                "technology_intelligence.technologies",
            ],
            Metric::Apis => &["discovered_apis", "apis", "total_apis", "api_endpoints"],
            Metric::Endpoints => &[
                "endpoints",
                "discovered_endpoints",
                "total_endpoints",
                "endpoints_found",
            ],
            Metric::Vulnerabilities => &[
                "total_vulnerabilities",
                "vulnerabilities",
                "vulnerabilities_found",
                "consolidated_findings.vulnerabilities",
            ],
            Metric::CriticalVulnerabilities => &["critical_vulnerabilities", "critical_findings"],
            Metric::Emails => &["email_intelligence.discovered_emails", "discovered_emails", "emails"],
            Metric::Breaches => &["breach_intelligence.known_breaches", "known_breaches", "breaches"],
            Metric::Employees => &[
                "employee_intelligence.linkedin_employees",
                "linkedin_employees",
                "employees",
            ],
            Metric::HighValueTargets => &["high_value_targets"],
            Metric::AttackChains => &["attack_chains"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::TotalCount => "Total",
            Metric::OpenPorts => "Open Ports",
            Metric::Technologies => "Technologies",
            Metric::Apis => "APIs",
            Metric::Endpoints => "Endpoints",
            Metric::Vulnerabilities => "Vulnerabilities",
            Metric::CriticalVulnerabilities => "Critical",
            Metric::Emails => "Emails",
            Metric::Breaches => "Breaches",
            Metric::Employees => "Employees",
            Metric::HighValueTargets => "High-Value Targets",
            Metric::AttackChains => "Attack Chains",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSummary {
    /// Single number shown on the card; `None` renders as a placeholder.
    pub headline: Option<u64>,
    pub metrics: Vec<(Metric, u64)>,
}

/// Turns a raw `results` value into an object we can read from.
///
/// Accepts an object or a JSON-encoded string of one, and unwraps the known
/// wrapper keys. Anything else yields `None`.
pub fn normalize_results(raw: Option<&Value>) -> Option<Map<String, Value>> {
    let object = match raw? {
        Value::Object(map) => map.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => return None,
        },
        _ => return None,
    };

    for wrapper in NESTED_WRAPPERS {
        if let Some(Value::Object(inner)) = object.get(*wrapper) {
            return Some(inner.clone());
        }
    }
    Some(object)
}

/// First alias of `metric` that resolves to a count.
pub fn metric_value(results: &Map<String, Value>, metric: Metric) -> Option<u64> {
    metric
        .aliases()
        .iter()
        .find_map(|alias| lookup(results, alias).and_then(count_of))
}

pub fn summarize(feature: Feature, results: &Map<String, Value>) -> ResultSummary {
    let metrics: Vec<(Metric, u64)> = feature
        .metrics()
        .iter()
        .filter_map(|&metric| metric_value(results, metric).map(|count| (metric, count)))
        .collect();

    let headline = metric_value(results, Metric::TotalCount).or_else(|| {
        feature
            .metrics()
            .first()
            .and_then(|primary| metric_value(results, *primary))
    });

    ResultSummary { headline, metrics }
}

fn lookup<'a>(results: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = results.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f.is_finite() && f > 0.0 { f as u64 } else { 0 })),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Array(items) => Some(items.len() as u64),
        // Objects group findings by category: count every grouped item.
        Value::Object(groups) => Some(
            groups
                .values()
                .map(|group| match group {
                    Value::Array(items) => items.len() as u64,
                    Value::Null => 0,
                    _ => 1,
                })
                .sum(),
        ),
        Value::Bool(_) | Value::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        normalize_results(Some(&value)).unwrap()
    }

    #[test]
    fn string_payload_is_parsed() {
        let raw = Value::String(r#"{"open_ports": 4}"#.to_string());
        let results = normalize_results(Some(&raw)).unwrap();
        assert_eq!(metric_value(&results, Metric::OpenPorts), Some(4));
    }

    #[test]
    fn garbage_payload_is_none() {
        assert_eq!(normalize_results(Some(&json!("not json"))), None);
        assert_eq!(normalize_results(Some(&json!([1, 2]))), None);
        assert_eq!(normalize_results(None), None);
    }

    #[test]
    fn negative_counts_floor_at_zero() {
        let results = object(json!({"total_count": -3.5}));
        assert_eq!(metric_value(&results, Metric::TotalCount), Some(0));
    }

    #[test]
    fn booleans_are_not_counts() {
        let results = object(json!({"open_ports": true, "ports": 2}));
        assert_eq!(metric_value(&results, Metric::OpenPorts), Some(2));
    }
}
