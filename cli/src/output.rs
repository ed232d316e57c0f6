//! Console output formatting

use finqa_domain::run::RunReport;
use finqa_domain::AgentError;

pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Plain answer block: answer, citations, and selection summary.
    pub fn format(report: &RunReport) -> String {
        let mut out = String::new();
        out.push_str(&report.final_response);
        out.push_str("\n\nSources: ");
        out.push_str(
            &report
                .citations
                .iter()
                .map(|c| format!("[{c}]"))
                .collect::<Vec<_>>()
                .join(" "),
        );
        out.push_str(&format!(
            "\n\n({} | variant {} | score {} | {} ms)",
            report.run_id,
            report.selected_variant_id,
            report
                .selected_score
                .map(|s| format!("{s:.3}"))
                .unwrap_or_else(|| "n/a".to_string()),
            report.elapsed_ms
        ));
        out
    }

    /// Full JSON envelope, traces included when the run emitted them.
    pub fn format_json(report: &RunReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }

    /// Structured error block: code, status class, and details payload.
    pub fn format_error(err: &AgentError) -> String {
        format!(
            "error: {err}\ncode: {}\nstatus: {}\ndetails: {}",
            err.code(),
            err.http_status(),
            err.details()
        )
    }
}
