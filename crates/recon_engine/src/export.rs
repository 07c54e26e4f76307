use std::path::PathBuf;

use chrono::{DateTime, Utc};
use engine_logging::engine_info;
use recon_core::compat::{normalize_results, summarize};
use recon_core::{render_results_page, ExportFormat, Feature, Job, JobId, ResultSummary};
use serde_json::{json, Map, Value};

use crate::client::{ApiError, ScanApi};
use crate::output::{OutputDir, PersistError};

const PLACEHOLDER: &str = "N/A";

/// A rendered export, ready to be written or handed to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("job {0} has no results yet")]
    NoResults(JobId),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

struct ExportContext<'a> {
    feature: Feature,
    job: &'a Job,
    target_label: &'a str,
    exported_at: DateTime<Utc>,
    results: Option<Map<String, Value>>,
    summary: ResultSummary,
}

impl<'a> ExportContext<'a> {
    fn new(feature: Feature, job: &'a Job, target_label: &'a str, now: DateTime<Utc>) -> Self {
        let results = normalize_results(job.results.as_ref());
        let summary = results
            .as_ref()
            .map(|map| summarize(feature, map))
            .unwrap_or_default();
        Self {
            feature,
            job,
            target_label,
            exported_at: now,
            results,
            summary,
        }
    }

    /// Job metadata in the order it appears in every format.
    fn fields(&self) -> Vec<(&'static str, String)> {
        let opt = |value: &Option<String>| value.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
        vec![
            ("Job ID", self.job.id.to_string()),
            ("Feature", self.feature.title().to_string()),
            ("Target", self.target_label.to_string()),
            ("Type", self.job.job_type.clone()),
            ("Status", self.job.status.to_string()),
            ("Created", opt(&self.job.created_at)),
            ("Started", opt(&self.job.started_at)),
            ("Completed", opt(&self.job.completed_at)),
            ("Exported", self.exported_at.to_rfc3339()),
        ]
    }

    fn total(&self) -> String {
        self.summary
            .headline
            .map(|n| n.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }
}

/// Builds an export of one job. `{feature}_{job}_{date}.{ext}` names the file.
pub fn build_export(
    feature: Feature,
    job: &Job,
    target_label: &str,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<ExportDocument, ExportError> {
    let ctx = ExportContext::new(feature, job, target_label, now);
    let content = match format {
        ExportFormat::Csv => to_csv(&ctx)?,
        ExportFormat::Json => to_json(&ctx)?,
        ExportFormat::Xml => to_xml(&ctx),
    };
    Ok(ExportDocument {
        filename: format!(
            "{}_{}_{}.{}",
            feature.slug(),
            job.id,
            now.format("%Y-%m-%d"),
            format.extension()
        ),
        mime_type: format.mime_type(),
        content,
    })
}

pub fn write_export(dir: &OutputDir, doc: &ExportDocument) -> Result<PathBuf, ExportError> {
    let path = dir.write_atomic(&doc.filename, &doc.content)?;
    engine_info!("Exported {} ({} bytes)", path.display(), doc.content.len());
    Ok(path)
}

/// Exports `job`, fetching its results first when the cached copy has none.
pub async fn fetch_and_export(
    api: &dyn ScanApi,
    feature: Feature,
    job: &Job,
    target_label: &str,
    format: ExportFormat,
    dir: &OutputDir,
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let job = with_results(api, feature, job).await?;
    let doc = build_export(feature, &job, target_label, format, now)?;
    write_export(dir, &doc)
}

/// Writes the results page of a finished job as `{feature}_job_{id}.html`.
pub async fn fetch_and_view(
    api: &dyn ScanApi,
    feature: Feature,
    job: &Job,
    target_label: &str,
    dir: &OutputDir,
) -> Result<PathBuf, ExportError> {
    let job = with_results(api, feature, job).await?;
    let filename = format!("{}_job_{}.html", feature.slug(), job.id);
    let path = dir.write_atomic(&filename, &render_results_page(feature, &job, target_label))?;
    engine_info!("Wrote results of job {} to {}", job.id, path.display());
    Ok(path)
}

/// `job` as cached when its results are readable, otherwise with results
/// fetched from the backend.
async fn with_results(api: &dyn ScanApi, feature: Feature, job: &Job) -> Result<Job, ExportError> {
    if normalize_results(job.results.as_ref()).is_some() {
        return Ok(job.clone());
    }
    let fetched = api.job_results(feature, job.id).await?;
    if normalize_results(Some(&fetched)).is_none() {
        return Err(ExportError::NoResults(job.id));
    }
    Ok(Job {
        results: Some(fetched),
        ..job.clone()
    })
}

fn to_csv(ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Field", "Value"])?;
    for (field, value) in ctx.fields() {
        wtr.write_record([field, value.as_str()])?;
    }
    wtr.write_record(["Total", ctx.total().as_str()])?;
    for (metric, count) in &ctx.summary.metrics {
        wtr.write_record([metric.label(), count.to_string().as_str()])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8(data)?)
}

fn to_json(ctx: &ExportContext<'_>) -> Result<String, ExportError> {
    let metrics: Map<String, Value> = ctx
        .summary
        .metrics
        .iter()
        .map(|(metric, count)| (metric.label().to_string(), json!(count)))
        .collect();
    let document = json!({
        "exported_at": ctx.exported_at.to_rfc3339(),
        "feature": ctx.feature.slug(),
        "job": {
            "id": ctx.job.id,
            "target": ctx.target_label,
            "job_type": ctx.job.job_type,
            "status": ctx.job.status.as_str(),
            "created_at": ctx.job.created_at,
            "started_at": ctx.job.started_at,
            "completed_at": ctx.job.completed_at,
        },
        "summary": {
            "total": ctx.summary.headline,
            "metrics": metrics,
        },
        "results": ctx.results,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

fn to_xml(ctx: &ExportContext<'_>) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<export feature=\"{}\" exported_at=\"{}\">\n",
        escape_xml(ctx.feature.slug()),
        escape_xml(&ctx.exported_at.to_rfc3339())
    ));
    xml.push_str("  <job>\n");
    for (field, value) in ctx.fields() {
        xml.push_str(&format!(
            "    <field name=\"{}\">{}</field>\n",
            escape_xml(field),
            escape_xml(&value)
        ));
    }
    xml.push_str("  </job>\n");
    xml.push_str(&format!(
        "  <summary total=\"{}\">\n",
        escape_xml(&ctx.total())
    ));
    for (metric, count) in &ctx.summary.metrics {
        xml.push_str(&format!(
            "    <metric name=\"{}\">{count}</metric>\n",
            escape_xml(metric.label())
        ));
    }
    xml.push_str("  </summary>\n");
    match &ctx.results {
        Some(results) => {
            xml.push_str("  <results>\n");
            for (key, value) in results {
                write_xml_value(&mut xml, Some(key), value, 2);
            }
            xml.push_str("  </results>\n");
        }
        None => xml.push_str("  <results/>\n"),
    }
    xml.push_str("</export>\n");
    xml
}

fn write_xml_value(xml: &mut String, name: Option<&str>, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    let open = match name {
        Some(name) => format!("<field name=\"{}\"", escape_xml(name)),
        None => "<item".to_string(),
    };
    let close = if name.is_some() { "</field>" } else { "</item>" };
    match value {
        Value::Object(map) => {
            xml.push_str(&format!("{indent}{open}>\n"));
            for (key, inner) in map {
                write_xml_value(xml, Some(key), inner, depth + 1);
            }
            xml.push_str(&format!("{indent}{close}\n"));
        }
        Value::Array(items) => {
            xml.push_str(&format!("{indent}{open}>\n"));
            for inner in items {
                write_xml_value(xml, None, inner, depth + 1);
            }
            xml.push_str(&format!("{indent}{close}\n"));
        }
        Value::Null => xml.push_str(&format!("{indent}{open}/>\n")),
        Value::String(text) => {
            xml.push_str(&format!("{indent}{open}>{}{close}\n", escape_xml(text)));
        }
        other => xml.push_str(&format!("{indent}{open}>{other}{close}\n")),
    }
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
