use chrono::{DateTime, TimeZone, Utc};
use recon_core::{ExportFormat, Feature, Job, JobId, StartRequest, StartedJob, Subdomain, Target, TargetId};
use recon_engine::{
    build_export, fetch_and_export, fetch_and_view, ApiError, ExportError, OutputDir, ScanApi,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap()
}

fn completed(results: Value) -> Job {
    serde_json::from_value(json!({
        "id": 12,
        "status": "completed",
        "job_type": "port_scan",
        "started_at": "2024-03-09 08:00:00",
        "results": results,
    }))
    .unwrap()
}

#[test]
fn legacy_ports_found_still_totals_in_csv() {
    let job = completed(json!({"ports_found": [{"port": 22}, {"port": 80}, {"port": 443}]}));
    let doc = build_export(Feature::PortScanning, &job, "example.com", ExportFormat::Csv, now())
        .unwrap();

    assert_eq!(doc.filename, "port-scanning_12_2024-03-09.csv");
    assert_eq!(doc.mime_type, "text/csv");
    let lines: Vec<&str> = doc.content.lines().collect();
    assert_eq!(lines[0], "Field,Value");
    assert!(lines.contains(&"Target,example.com"));
    assert!(lines.contains(&"Total,3"));
    assert!(lines.contains(&"Open Ports,3"));
    assert!(lines.contains(&"Completed,N/A"));
}

#[test]
fn csv_quotes_values_with_commas() {
    let job = completed(json!({"open_ports": 1}));
    let doc = build_export(Feature::PortScanning, &job, "a,b", ExportFormat::Csv, now()).unwrap();
    assert!(doc.content.lines().any(|line| line == "Target,\"a,b\""));
}

#[test]
fn json_export_keeps_raw_results_and_summary() {
    let job = completed(json!({"api_discovery_results": {"total_count": 5, "endpoints": ["/a"]}}));
    let doc = build_export(Feature::ApiDiscovery, &job, "api.example", ExportFormat::Json, now())
        .unwrap();

    let value: Value = serde_json::from_str(&doc.content).unwrap();
    assert_eq!(value["feature"], "advanced-api-discovery");
    assert_eq!(value["job"]["id"], 12);
    assert_eq!(value["summary"]["total"], 5);
    assert_eq!(value["results"]["endpoints"], json!(["/a"]));
    assert_eq!(value["exported_at"], "2024-03-09T08:30:00+00:00");
}

#[test]
fn xml_export_escapes_everything() {
    let job = completed(json!({"banner": "<b>\"x\" & 'y'</b>", "ports": [80]}));
    let doc = build_export(Feature::PortScanning, &job, "a&b", ExportFormat::Xml, now()).unwrap();

    assert!(doc.content.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(doc.content.contains("<field name=\"Target\">a&amp;b</field>"));
    assert!(doc
        .content
        .contains("&lt;b&gt;&quot;x&quot; &amp; &apos;y&apos;&lt;/b&gt;"));
    assert!(doc.content.contains("<item>80</item>"));
    assert!(!doc.content.contains("<b>"));
}

#[test]
fn unreadable_results_export_placeholder() {
    let job = completed(json!("not json at all"));
    let doc = build_export(Feature::Osint, &job, "x", ExportFormat::Csv, now()).unwrap();
    assert!(doc.content.lines().any(|line| line == "Total,N/A"));
}

struct ResultsApi {
    results: Value,
}

#[async_trait::async_trait]
impl ScanApi for ResultsApi {
    async fn list_jobs(&self, _feature: Feature) -> Result<Vec<Job>, ApiError> {
        Ok(Vec::new())
    }

    async fn job_results(&self, _feature: Feature, _job_id: JobId) -> Result<Value, ApiError> {
        Ok(self.results.clone())
    }

    async fn start_job(
        &self,
        _feature: Feature,
        _request: &StartRequest,
    ) -> Result<StartedJob, ApiError> {
        Ok(StartedJob::default())
    }

    async fn stop_job(&self, _feature: Feature, _job_id: JobId) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_targets(&self) -> Result<Vec<Target>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_subdomains(&self, _target_id: TargetId) -> Result<Vec<Subdomain>, ApiError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn fetches_results_when_cache_has_none() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path().join("exports"));
    dir.ensure().unwrap();
    let api = ResultsApi {
        results: json!({"technologies": {"cms": ["wordpress"], "cdn": ["cloudflare"]}}),
    };
    let job = Job {
        id: 4,
        ..Job::default()
    };

    let path = fetch_and_export(
        &api,
        Feature::TechnologyDetection,
        &job,
        "shop.example",
        ExportFormat::Csv,
        &dir,
        now(),
    )
    .await
    .unwrap();

    assert_eq!(path.file_name().unwrap(), "technology-detection_4_2024-03-09.csv");
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("Technologies,2"));
}

#[tokio::test]
async fn missing_results_everywhere_is_an_error() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());
    let api = ResultsApi {
        results: Value::Null,
    };
    let job = Job {
        id: 5,
        ..Job::default()
    };

    let err = fetch_and_export(&api, Feature::Osint, &job, "x", ExportFormat::Json, &dir, now())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NoResults(5)));
}

#[tokio::test]
async fn view_writes_results_page_from_fetched_results() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());
    let api = ResultsApi {
        results: json!({"technologies": {"cms": ["wordpress"], "cdn": ["cloudflare"]}}),
    };
    let job = Job {
        id: 4,
        ..Job::default()
    };

    let path = fetch_and_view(&api, Feature::TechnologyDetection, &job, "shop.example", &dir)
        .await
        .unwrap();

    assert_eq!(path.file_name().unwrap(), "technology-detection_job_4.html");
    let page = std::fs::read_to_string(&path).unwrap();
    assert!(page.contains("<dt>Target</dt><dd>shop.example</dd>"));
    assert!(page.contains("<span class=\"metric\">2 Technologies</span>"));
    assert!(page.contains("<h2>technologies</h2>"));
    assert!(page.contains("&quot;wordpress&quot;"));
}

#[tokio::test]
async fn view_without_results_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());
    let api = ResultsApi {
        results: Value::Null,
    };
    let job = Job {
        id: 6,
        ..Job::default()
    };

    let err = fetch_and_view(&api, Feature::PortScanning, &job, "x", &dir)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NoResults(6)));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}
