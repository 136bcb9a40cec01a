use jobwatch_core::{AppViewModel, PollMode, ResultBadge, SearchCounters, Theme, Verdict};
use jobwatch_engine::{export_url, ExportTarget};
use url::Url;

/// Pending URLs listed before the rest is summarised.
pub const PENDING_PREVIEW: usize = 10;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// ANSI colours; off when stdout is not a terminal.
    pub color: bool,
    /// Server root used to print export links.
    pub base_url: Option<Url>,
}

pub fn render(view: &AppViewModel, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();

    let mode = match view.mode {
        Some(PollMode::Full) => "queue",
        Some(PollMode::SearchOnly) => "search",
        None => "idle",
    };
    let mut header = match &view.job_id {
        Some(job_id) => format!("== job {job_id} ({mode})"),
        None => "== no job".to_string(),
    };
    if let Some(badge) = view.badge {
        header.push_str(&format!(" [{}]", badge_label(badge)));
    }
    if let Some((done, total)) = view.progress {
        header.push_str(&format!(" {done}/{total}"));
    }
    lines.push(header);
    lines.push(format!("Status: {}", view.status_line));

    if let Some(phase) = &view.phase {
        let label = phase.label();
        if phase.highlighted && options.color {
            lines.push(format!("Phase: {BOLD}{label}{RESET}"));
        } else if phase.highlighted {
            lines.push(format!("Phase: {label} *"));
        } else {
            lines.push(format!("Phase: {label}"));
        }
    }
    if let Some(eta) = &view.eta {
        lines.push(eta.to_string());
    }
    if view.job_id.is_some() && view.progress.is_some() {
        lines.push(counters_line(view.collected_count, view.counters.as_ref()));
    }
    if let Some(url) = &view.current_url {
        lines.push(format!("Now: {url}"));
    }

    if !view.pending.is_empty() {
        lines.push(format!("Pending ({}):", view.pending.len()));
        for url in view.pending.iter().take(PENDING_PREVIEW) {
            lines.push(format!("  {url}"));
        }
        if view.pending.len() > PENDING_PREVIEW {
            lines.push(format!("  ... and {} more", view.pending.len() - PENDING_PREVIEW));
        }
    }

    if view.progress.is_some() {
        let shown: Vec<&str> = view
            .filter
            .enabled()
            .into_iter()
            .map(Verdict::as_str)
            .collect();
        let filter = if shown.is_empty() {
            "none".to_string()
        } else {
            shown.join(",")
        };
        lines.push(format!(
            "Results ({}) showing: {filter}",
            view.tally.summary_line()
        ));
        for row in &view.results {
            let badge = paint(verdict_badge(row.verdict), row.verdict, view.theme, options.color);
            match &row.reason {
                Some(reason) if !reason.is_empty() => {
                    lines.push(format!("  {badge} {} ({reason})", row.url))
                }
                _ => lines.push(format!("  {badge} {}", row.url)),
            }
        }
    }

    if let Some(base) = &options.base_url {
        if let Some(export) = &view.result_export {
            let target = ExportTarget::Results {
                job_id: export.job_id.clone(),
                verdict_query: export.verdict_query.clone(),
            };
            if let Ok(url) = export_url(base, &target) {
                lines.push(format!("Export: {url}"));
            }
        }
        if let Some(job_id) = &view.search_export {
            let target = ExportTarget::Search {
                job_id: job_id.clone(),
            };
            if let Ok(url) = export_url(base, &target) {
                lines.push(format!("Search export: {url}"));
            }
        }
    }

    if view.collected_urls > 0 && !view.form_locked {
        lines.push(format!(
            "{} collected URLs ready; type 'batch' to test them",
            view.collected_urls
        ));
    }
    if view.resume_visible {
        lines.push("Job was stopped; type 'resume' to continue watching it".to_string());
    }

    lines
}

fn badge_label(badge: ResultBadge) -> &'static str {
    match badge {
        ResultBadge::Running => "Running",
        ResultBadge::Done => "Done",
        ResultBadge::Error => "Error",
    }
}

/// `Collected: N | Seller/Search: kept/total | Checked: c/total`
pub fn counters_line(collected: Option<u64>, counters: Option<&SearchCounters>) -> String {
    let collected = collected
        .map(|count| count.to_string())
        .unwrap_or_else(|| "—".to_string());
    let (search, checked) = match counters {
        Some(counters) => {
            let search = match counters.seller_kept {
                Some(kept) => format!("Seller/Search: {kept}/{}", counters.search_total),
                None => format!("Search: {}", counters.search_total),
            };
            let checked = format!("{}/{}", counters.checked, counters.search_total);
            (search, checked)
        }
        None => ("Search: —".to_string(), "—".to_string()),
    };
    format!("Collected: {collected} | {search} | Checked: {checked}")
}

fn verdict_badge(verdict: Verdict) -> String {
    format!("[{:<3}]", verdict.badge())
}

fn paint(text: String, verdict: Verdict, theme: Theme, color: bool) -> String {
    if !color {
        return text;
    }
    let code = match (theme, verdict) {
        (Theme::Dark, Verdict::Ok) => "\x1b[92m",
        (Theme::Dark, Verdict::Nok) => "\x1b[91m",
        (Theme::Dark, Verdict::Unknown) => "\x1b[93m",
        (Theme::Dark, Verdict::Error) => "\x1b[95m",
        (Theme::Light, Verdict::Ok) => "\x1b[32m",
        (Theme::Light, Verdict::Nok) => "\x1b[31m",
        (Theme::Light, Verdict::Unknown) => "\x1b[33m",
        (Theme::Light, Verdict::Error) => "\x1b[35m",
    };
    format!("{code}{text}{RESET}")
}
