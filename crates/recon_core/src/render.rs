//! Pure job-list rendering: state → view model → HTML.
//!
//! Nothing here performs IO or reads the clock; callers pass `now`. The same
//! inputs always produce byte-identical output, so a duplicated or missed poll
//! can never leave a half-updated page behind.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::compat::{normalize_results, summarize};
use crate::state::{BannerKind, ModuleState, SubmissionPhase};
use crate::view_model::{
    FormView, JobAction, JobCardView, ModuleViewModel, PrimaryProgressView, ProgressView,
    SummaryView,
};
use crate::{Feature, Job, JobStatus, TargetCache, SUBDOMAIN_OPTION};

pub(crate) fn build_view(state: &ModuleState, now: DateTime<Utc>) -> ModuleViewModel {
    let feature = state.feature();
    let jobs = state.jobs();
    ModuleViewModel {
        feature,
        live: state.auto_refresh(),
        status_line: status_line(feature, jobs),
        last_updated: state
            .last_updated()
            .map(|at| format!("Updated: {}", at.format("%H:%M:%S"))),
        stale_notice: state
            .last_poll_error()
            .map(|err| format!("Live update failed, showing last known state ({err})")),
        banner: state.banner().cloned(),
        primary: primary_progress(jobs, state.targets(), now),
        form: FormView {
            targets: state
                .targets()
                .iter()
                .map(|t| (t.id, t.domain.clone()))
                .collect(),
            selected_target: state.form().target(),
            subdomains: state
                .subdomains()
                .iter()
                .map(|sub| (sub.id, sub.subdomain.clone()))
                .collect(),
            options: state
                .form()
                .options()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            submitting: state.phase() == SubmissionPhase::Submitting,
        },
        cards: build_cards(feature, jobs, state.targets(), now),
    }
}

pub fn build_cards(
    feature: Feature,
    jobs: &[Job],
    targets: &TargetCache,
    now: DateTime<Utc>,
) -> Vec<JobCardView> {
    jobs.iter()
        .map(|job| build_card(feature, job, targets, now))
        .collect()
}

fn build_card(feature: Feature, job: &Job, targets: &TargetCache, now: DateTime<Utc>) -> JobCardView {
    let progress = job.status.is_active().then(|| ProgressView {
        percent: job.progress(),
        phase: job
            .current_phase
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "Processing...".to_string()),
        elapsed_secs: elapsed_secs(job, now),
    });

    let summary = (job.status == JobStatus::Completed).then(|| {
        match normalize_results(job.results.as_ref()) {
            Some(results) => {
                let summary = summarize(feature, &results);
                SummaryView {
                    headline: summary.headline,
                    metrics: summary
                        .metrics
                        .into_iter()
                        .map(|(metric, count)| (metric.label().to_string(), count))
                        .collect(),
                    pending: false,
                }
            }
            None => SummaryView {
                headline: None,
                metrics: Vec::new(),
                pending: true,
            },
        }
    });

    let actions = match job.status {
        JobStatus::Running => vec![JobAction::Stop],
        JobStatus::Completed => vec![JobAction::ViewResults, JobAction::Export],
        _ => Vec::new(),
    };

    JobCardView {
        job_id: job.id,
        target_label: targets.label_for(job),
        job_type: if job.job_type.is_empty() {
            feature.key().to_string()
        } else {
            job.job_type.clone()
        },
        status: job.status,
        started: job
            .started()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        progress,
        summary,
        actions,
    }
}

/// The first active job in backend order (most recent first) owns the
/// single-slot indicator.
pub fn primary_progress(
    jobs: &[Job],
    targets: &TargetCache,
    now: DateTime<Utc>,
) -> Option<PrimaryProgressView> {
    let job = jobs.iter().find(|job| job.status.is_active())?;
    let percent = job.progress();
    let elapsed = elapsed_secs(job, now).unwrap_or(0);
    let job_type = if job.job_type.is_empty() {
        "scan"
    } else {
        job.job_type.as_str()
    };
    Some(PrimaryProgressView {
        job_id: job.id,
        headline: format!("In progress for {}...", targets.label_for(job)),
        percent,
        detail: format!("Progress: {percent}% • Elapsed: {elapsed}s • Type: {job_type}"),
    })
}

pub fn status_line(feature: Feature, jobs: &[Job]) -> String {
    let noun = feature.job_noun();
    let running = jobs.iter().filter(|job| job.status.is_active()).count();
    if running > 0 {
        return format!("{running} {}{} running", noun, plural(running));
    }
    let completed = jobs
        .iter()
        .filter(|job| job.status == JobStatus::Completed)
        .count();
    format!("{completed} {}{} completed", noun, plural(completed))
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn elapsed_secs(job: &Job, now: DateTime<Utc>) -> Option<i64> {
    job.started()
        .map(|started| (now - started).num_seconds().max(0))
}

/// Renders the whole module page.
pub fn render_html(view: &ModuleViewModel) -> String {
    let mut out = String::new();
    let title = view.feature.title();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(
        out,
        "<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
        escape_html(title)
    );
    let _ = writeln!(
        out,
        "<header><h1>{} <span class=\"indicator\">{}</span></h1>",
        escape_html(title),
        if view.live { "[LIVE]" } else { "[PAUSED]" }
    );
    let _ = writeln!(
        out,
        "<p class=\"status-line\">{}</p>",
        escape_html(&view.status_line)
    );
    if let Some(updated) = &view.last_updated {
        let _ = writeln!(out, "<p class=\"updated\">{}</p>", escape_html(updated));
    }
    if let Some(notice) = &view.stale_notice {
        let _ = writeln!(out, "<p class=\"stale\">{}</p>", escape_html(notice));
    }
    let _ = writeln!(out, "</header>");

    if let Some(banner) = &view.banner {
        let class = match banner.kind {
            BannerKind::Info => "info",
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        };
        let _ = writeln!(
            out,
            "<div class=\"message {class}\">{}</div>",
            escape_html(&banner.text)
        );
    }

    if let Some(primary) = &view.primary {
        let _ = writeln!(out, "<section class=\"primary\" data-job=\"{}\">", primary.job_id);
        let _ = writeln!(out, "<p>{}</p>", escape_html(&primary.headline));
        render_bar(&mut out, primary.percent);
        let _ = writeln!(out, "<p class=\"detail\">{}</p>", escape_html(&primary.detail));
        let _ = writeln!(out, "</section>");
    }

    render_form(&mut out, &view.form);
    out.push_str(&render_cards(&view.cards));
    let _ = writeln!(out, "</body></html>");
    out
}

/// Renders only the job list section of the page.
pub fn render_cards(cards: &[JobCardView]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<section class=\"jobs\">");
    if cards.is_empty() {
        let _ = writeln!(
            out,
            "<p class=\"empty\">Nothing yet. Start a job above and it will show up here.</p>"
        );
    }
    for card in cards {
        render_card(&mut out, card);
    }
    let _ = writeln!(out, "</section>");
    out
}

fn render_card(out: &mut String, card: &JobCardView) {
    let _ = writeln!(
        out,
        "<article class=\"job status-{}\" data-job=\"{}\">",
        card.status, card.job_id
    );
    let _ = writeln!(
        out,
        "<h3>{}</h3><p class=\"meta\">Job ID: {} | Type: {}</p>",
        escape_html(&card.target_label),
        card.job_id,
        escape_html(&card.job_type)
    );
    if let Some(started) = &card.started {
        let _ = writeln!(out, "<p class=\"meta\">Started: {}</p>", escape_html(started));
    }
    let _ = writeln!(
        out,
        "<span class=\"badge\">{}</span>",
        card.status.as_str().to_ascii_uppercase()
    );

    if let Some(progress) = &card.progress {
        let _ = writeln!(
            out,
            "<p class=\"progress-text\">Progress: {}% <span class=\"phase\">{}</span></p>",
            progress.percent,
            escape_html(&progress.phase)
        );
        render_bar(out, progress.percent);
        if let Some(elapsed) = progress.elapsed_secs {
            let _ = writeln!(out, "<p class=\"elapsed\">Elapsed: {elapsed}s</p>");
        }
    }

    if let Some(summary) = &card.summary {
        let _ = writeln!(out, "<div class=\"summary\">");
        if summary.pending {
            let _ = writeln!(out, "<span class=\"headline\">Results pending</span>");
        } else {
            let headline = summary
                .headline
                .map(|h| h.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(out, "<span class=\"headline\">{headline}</span>");
            for (label, count) in &summary.metrics {
                let _ = writeln!(
                    out,
                    "<span class=\"metric\">{count} {}</span>",
                    escape_html(label)
                );
            }
        }
        let _ = writeln!(out, "</div>");
    }

    if !card.actions.is_empty() {
        let _ = write!(out, "<div class=\"actions\">");
        for action in &card.actions {
            let _ = write!(
                out,
                "<button data-action=\"{}\" data-job=\"{}\">{}</button>",
                action.label().to_ascii_lowercase().replace(' ', "-"),
                card.job_id,
                action.label()
            );
        }
        let _ = writeln!(out, "</div>");
    }
    let _ = writeln!(out, "</article>");
}

fn render_bar(out: &mut String, percent: u8) {
    let _ = writeln!(
        out,
        "<div class=\"progress\"><div class=\"progress-bar\" style=\"width: {percent}%\"></div></div>"
    );
}

fn render_form(out: &mut String, form: &FormView) {
    let _ = writeln!(out, "<form class=\"start\">");
    let _ = writeln!(out, "<select name=\"target\">");
    let _ = writeln!(out, "<option value=\"\">Select target...</option>");
    for (id, domain) in &form.targets {
        let selected = if form.selected_target == Some(*id) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "<option value=\"{id}\"{selected}>{}</option>",
            escape_html(domain)
        );
    }
    let _ = writeln!(out, "</select>");
    for (key, value) in &form.options {
        if key == SUBDOMAIN_OPTION {
            render_subdomain_select(out, form, value);
            continue;
        }
        let _ = writeln!(
            out,
            "<label>{k}<input name=\"{k}\" value=\"{v}\"></label>",
            k = escape_html(key),
            v = escape_html(value)
        );
    }
    let _ = writeln!(
        out,
        "<button type=\"submit\"{}>{}</button>",
        if form.submitting { " disabled" } else { "" },
        if form.submitting { "Starting..." } else { "Start" }
    );
    let _ = writeln!(out, "</form>");
}

fn render_subdomain_select(out: &mut String, form: &FormView, value: &str) {
    let _ = writeln!(out, "<label>{SUBDOMAIN_OPTION}<select name=\"{SUBDOMAIN_OPTION}\">");
    let _ = writeln!(out, "<option value=\"\">All subdomains</option>");
    for (id, host) in &form.subdomains {
        let selected = if id.to_string() == value {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "<option value=\"{id}\"{selected}>{}</option>",
            escape_html(host)
        );
    }
    let _ = writeln!(out, "</select></label>");
}

/// Standalone page with everything known about one finished job: metadata,
/// the summary shown on its card and each raw result section.
pub fn render_results_page(feature: Feature, job: &Job, target_label: &str) -> String {
    let mut out = String::new();
    let title = format!("{} results: job {}", feature.title(), job.id);
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(
        out,
        "<html><head><meta charset=\"utf-8\"><title>{t}</title></head><body>\n<h1>{t}</h1>",
        t = escape_html(&title)
    );

    let _ = writeln!(out, "<dl class=\"job-meta\">");
    let type_label = if job.job_type.is_empty() {
        feature.key()
    } else {
        job.job_type.as_str()
    };
    let rows = [
        ("Target", Some(target_label)),
        ("Type", Some(type_label)),
        ("Status", Some(job.status.as_str())),
        ("Started", job.started_at.as_deref()),
        ("Completed", job.completed_at.as_deref()),
    ];
    for (label, value) in rows {
        let _ = writeln!(
            out,
            "<dt>{label}</dt><dd>{}</dd>",
            escape_html(value.unwrap_or("N/A"))
        );
    }
    let _ = writeln!(out, "</dl>");

    match normalize_results(job.results.as_ref()) {
        Some(results) => {
            let summary = summarize(feature, &results);
            let headline = summary
                .headline
                .map(|h| h.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(out, "<div class=\"summary\">");
            let _ = writeln!(out, "<span class=\"headline\">{headline}</span>");
            for (metric, count) in &summary.metrics {
                let _ = writeln!(
                    out,
                    "<span class=\"metric\">{count} {}</span>",
                    escape_html(metric.label())
                );
            }
            let _ = writeln!(out, "</div>");
            for (section, value) in &results {
                let body = serde_json::to_string_pretty(value).unwrap_or_default();
                let _ = writeln!(
                    out,
                    "<section class=\"result\"><h2>{}</h2><pre>{}</pre></section>",
                    escape_html(section),
                    escape_html(&body)
                );
            }
        }
        None => {
            let _ = writeln!(out, "<p class=\"empty\">Results pending</p>");
        }
    }
    let _ = writeln!(out, "</body></html>");
    out
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
