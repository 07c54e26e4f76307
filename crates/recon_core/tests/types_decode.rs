use recon_core::{Envelope, Feature, Job, JobStatus, StartRequest, StartedJob};
use serde_json::json;

#[test]
fn sparse_job_decodes_with_defaults() {
    let job: Job = serde_json::from_value(json!({"id": 1})).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.progress(), 0);
    assert_eq!(job.target_id, None);
    assert!(job.results.is_none());
}

#[test]
fn loose_backend_fields_are_tolerated() {
    let job: Job = serde_json::from_value(json!({
        "id": 2,
        "target_id": "14",
        "job_type": null,
        "status": "exploded",
        "progress_percentage": 142.7,
    }))
    .unwrap();
    assert_eq!(job.target_id, Some(14));
    assert_eq!(job.job_type, "");
    assert_eq!(job.status, JobStatus::Unknown);
    assert_eq!(job.progress(), 100);
}

#[test]
fn envelope_reports_message_then_error() {
    let env: Envelope<Vec<Job>> =
        serde_json::from_value(json!({"success": false, "error": "quota exceeded"})).unwrap();
    assert!(!env.success);
    assert_eq!(env.failure_message(), Some("quota exceeded"));

    let env: Envelope<Vec<Job>> =
        serde_json::from_value(json!({"success": false, "message": " "})).unwrap();
    assert_eq!(env.failure_message(), None);
}

#[test]
fn start_request_uses_camel_case_target() {
    let body = serde_json::to_value(StartRequest {
        target_id: 3,
        config: json!({"a": 1}),
    })
    .unwrap();
    assert_eq!(body, json!({"targetId": 3, "config": {"a": 1}}));
}

#[test]
fn started_job_accepts_id_spellings() {
    let a: StartedJob = serde_json::from_value(json!({"job_id": 5})).unwrap();
    let b: StartedJob = serde_json::from_value(json!({"jobId": "6"})).unwrap();
    let c: StartedJob = serde_json::from_value(json!({})).unwrap();
    assert_eq!(a.job_id, Some(5));
    assert_eq!(b.job_id, Some(6));
    assert_eq!(c.job_id, None);
}

#[test]
fn features_parse_from_key_slug_and_title() {
    assert_eq!(Feature::parse("ports"), Some(Feature::PortScanning));
    assert_eq!(Feature::parse("enhanced-bugbounty"), Some(Feature::BugBountyWorkflow));
    assert_eq!(Feature::parse("OSINT"), Some(Feature::Osint));
    assert_eq!(Feature::parse("chatbot"), None);
}
