use std::path::Path;

use crate::runner::BenchmarkResult;

/// A complete baseline containing results from all scenes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Baseline {
    pub label: String,
    pub results: Vec<BenchmarkResult>,
}

/// Load a baseline from a JSON file. Returns None if the file is missing or unreadable.
pub fn load_baseline(path: &Path) -> Option<Baseline> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

pub fn save_baseline(path: &Path, baseline: &Baseline) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(baseline).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

fn pct_change(current: f64, base: f64) -> Option<f64> {
    (base > 0.0).then(|| (current - base) / base * 100.0)
}

/// Compare current results against a baseline. Returns (scene/metric, percent
/// change) for every metric slower than the threshold.
pub fn compare(
    current: &[BenchmarkResult],
    baseline: &Baseline,
    threshold_pct: f64,
) -> Vec<(String, f64)> {
    let mut regressions = Vec::new();

    for result in current {
        let Some(base) = baseline
            .results
            .iter()
            .find(|b| b.scene_name == result.scene_name)
        else {
            continue;
        };
        let metrics = [
            ("fill", result.fill_ms, base.fill_ms),
            ("step", result.steps.mean_ms, base.steps.mean_ms),
            ("edit", result.edits.mean_ms, base.edits.mean_ms),
            ("shutdown", result.shutdown_ms, base.shutdown_ms),
        ];
        for (metric, now, then) in metrics {
            if let Some(pct) = pct_change(now, then) {
                if pct > threshold_pct {
                    regressions.push((format!("{}/{}", result.scene_name, metric), pct));
                }
            }
        }
    }

    regressions
}

/// Format results as a markdown summary table.
pub fn format_markdown(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    out.push_str("| Scene | Backend | Chunks | Fill (ms) | Step mean (ms) | Step P95 (ms) | Edit mean (ms) | Edit P95 (ms) | Shutdown (ms) |\n");
    out.push_str("|-------|---------|--------|-----------|----------------|---------------|----------------|---------------|---------------|\n");

    for r in results {
        out.push_str(&format!(
            "| {} | {} | {} | {:.2} | {:.2} | {:.2} | {:.3} | {:.3} | {:.2} |\n",
            r.scene_name,
            r.backend,
            r.chunk_count,
            r.fill_ms,
            r.steps.mean_ms,
            r.steps.p95_ms,
            r.edits.mean_ms,
            r.edits.p95_ms,
            r.shutdown_ms,
        ));
    }

    out
}

/// Plain-text verdict for a comparison, slowest metric first.
pub fn format_comparison(regressions: &[(String, f64)], threshold_pct: f64) -> String {
    if regressions.is_empty() {
        return format!("No metric slowed down by more than {threshold_pct:.0}%.\n");
    }

    let mut sorted = regressions.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = format!(
        "{} metric(s) over the {threshold_pct:.0}% threshold:\n",
        sorted.len()
    );
    for (metric, pct) in sorted {
        out.push_str(&format!("  {metric:<28} +{pct:.1}%\n"));
    }
    out
}
