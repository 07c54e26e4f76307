use recon_core::compat::{metric_value, normalize_results, summarize};
use recon_core::{Feature, Metric, COMPAT_VERSION};
use serde_json::{json, Value};

fn results(value: Value) -> serde_json::Map<String, Value> {
    normalize_results(Some(&value)).expect("object payload")
}

#[test]
fn compat_table_is_version_one() {
    assert_eq!(COMPAT_VERSION, 1);
}

#[test]
fn every_open_port_alias_resolves() {
    for alias in ["open_ports", "total_ports", "ports_found", "ports"] {
        let payload = results(json!({ alias: 12 }));
        assert_eq!(
            metric_value(&payload, Metric::OpenPorts),
            Some(12),
            "alias {alias}"
        );
    }
}

#[test]
fn newest_alias_wins_over_legacy() {
    let payload = results(json!({"ports_found": 1, "open_ports": 5}));
    assert_eq!(metric_value(&payload, Metric::OpenPorts), Some(5));
}

#[test]
fn legacy_list_field_is_counted() {
    let payload = results(json!({
        "ports_found": [
            {"port": 22}, {"port": 80}, {"port": 443}
        ]
    }));
    let summary = summarize(Feature::PortScanning, &payload);
    assert_eq!(summary.headline, Some(3));
    assert_eq!(summary.metrics, vec![(Metric::OpenPorts, 3)]);
}

#[test]
fn grouped_technologies_are_flattened() {
    let payload = results(json!({
        "technologies": {
            "frameworks": ["react", "next"],
            "servers": ["nginx"],
            "cdn": []
        }
    }));
    assert_eq!(metric_value(&payload, Metric::Technologies), Some(3));
}

#[test]
fn wrapped_api_results_are_unwrapped() {
    let payload = results(json!({
        "api_discovery_results": {
            "discovered_apis": {"rest": ["/a", "/b"], "graphql": ["/graphql"]}
        }
    }));
    let summary = summarize(Feature::ApiDiscovery, &payload);
    assert_eq!(summary.headline, Some(3));
}

#[test]
fn workflow_results_wrapper_is_unwrapped() {
    let payload = results(json!({
        "workflow_results": {"total_vulnerabilities": 4, "attack_chains": [{}, {}]}
    }));
    let summary = summarize(Feature::BugBountyWorkflow, &payload);
    assert_eq!(summary.headline, Some(4));
    assert!(summary.metrics.contains(&(Metric::AttackChains, 2)));
}

#[test]
fn osint_nested_paths_resolve() {
    let payload = results(json!({
        "email_intelligence": {"discovered_emails": ["a@x", "b@x"]},
        "breach_intelligence": {"known_breaches": [{}]},
        "employee_intelligence": {"linkedin_employees": []},
        "technology_intelligence": {"technologies": {"cms": ["wordpress"]}}
    }));
    let summary = summarize(Feature::Osint, &payload);
    assert_eq!(
        summary.metrics,
        vec![
            (Metric::Emails, 2),
            (Metric::Breaches, 1),
            (Metric::Employees, 0),
            (Metric::Technologies, 1),
        ]
    );
    assert_eq!(summary.headline, Some(2));
}

#[test]
fn total_count_takes_priority_for_headline() {
    let payload = results(json!({"total_count": 7, "open_ports": 2}));
    assert_eq!(summarize(Feature::PortScanning, &payload).headline, Some(7));
}

#[test]
fn numeric_strings_count() {
    let payload = results(json!({"total_vulnerabilities": "11"}));
    assert_eq!(metric_value(&payload, Metric::Vulnerabilities), Some(11));
}

#[test]
fn missing_fields_give_no_headline() {
    let payload = results(json!({}));
    let summary = summarize(Feature::DynamicEndpoints, &payload);
    assert_eq!(summary.headline, None);
    assert!(summary.metrics.is_empty());
}
