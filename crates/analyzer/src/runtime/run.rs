//! Command dispatch and result rendering.
//!
//! Reports print as tab-separated rows with a header line, or as a JSON
//! document when `--json` is set. Diagnostics go to the logger (stderr),
//! results to stdout.

use tracing::info;

use crate::analytics::ReportOutput;
use crate::cli::{Action, Cli};
use crate::config::AnalyzerConfig;
use crate::ingest;
use crate::store::SharedStore;

pub async fn run(
    cli: Cli,
    store: SharedStore,
    config: AnalyzerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.into_action() {
        Action::Import {
            log_file,
            on_failure,
        } => {
            let policy = on_failure.unwrap_or(config.import.on_failure);
            let report = ingest::import_file(store.as_ref(), &log_file, policy).await?;
            println!(
                "Imported {} records ({} skipped)",
                report.inserted,
                report.failures.len()
            );
        }
        Action::Export { out_file } => {
            let exported = ingest::export_file(store.as_ref(), &out_file).await?;
            println!("Exported {} records to {}", exported, out_file.display());
        }
        Action::Report(report) => {
            let records = store.scan().await?;
            info!(records = records.len(), "running report");
            let output = report.run(&records);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{}", render_text(&output));
            }
        }
    }
    Ok(())
}

/// Tab-separated rendering with a header row, one line per result row.
fn render_text(output: &ReportOutput) -> String {
    let mut out = String::new();
    match output {
        ReportOutput::IpUserAgent(rows) => {
            out.push_str("IP Address\tUser Agent\tFrequency\n");
            for row in rows {
                out.push_str(&format!(
                    "{}\t{}\t{}\n",
                    row.ip_address, row.user_agent, row.count
                ));
            }
        }
        ReportOutput::Buckets(rows) => {
            out.push_str("Period\tFrequency\n");
            for row in rows {
                out.push_str(&format!("{}\t{}\n", row.bucket, row.count));
            }
        }
        ReportOutput::UserAgents(rows) => {
            out.push_str("User Agent\tFrequency\n");
            for row in rows {
                out.push_str(&format!("{}\t{}\n", row.user_agent, row.count));
            }
        }
        ReportOutput::Statuses(rows) => {
            out.push_str("Status Code\tFrequency\n");
            for row in rows {
                out.push_str(&format!("{}\t{}\n", row.status_code, row.count));
            }
        }
        ReportOutput::Durations(rows) => {
            out.push_str("Request\tTime Taken\n");
            for row in rows {
                out.push_str(&format!("{}\t{}\n", row.request, row.time_taken));
            }
        }
        ReportOutput::Patterns(rows) => {
            out.push_str("Request Pattern\tFrequency\n");
            for row in rows {
                out.push_str(&format!("{}\t{}\n", row.pattern, row.count));
            }
        }
        ReportOutput::Workers(rows) => {
            out.push_str("Worker\tFrequency\tAvg Time Taken\n");
            for row in rows {
                out.push_str(&format!(
                    "{}\t{}\t{:.2}\n",
                    row.worker, row.count, row.avg_time_taken
                ));
            }
        }
        ReportOutput::Domains(rows) => {
            out.push_str("Domain\tConversions\n");
            for row in rows {
                out.push_str(&format!("{}\t{}\n", row.domain, row.count));
            }
        }
        ReportOutput::Window(summary) => {
            out.push_str("Requests\tAvg Time Taken\n");
            match summary.avg_time_taken {
                Some(avg) => out.push_str(&format!("{}\t{:.2}\n", summary.count, avg)),
                None => out.push_str(&format!("{}\t-\n", summary.count)),
            }
        }
    }
    out
}
