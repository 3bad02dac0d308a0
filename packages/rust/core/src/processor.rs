//! End-to-end dataset run: parse → enrich rows → upload → notify.
//!
//! A run moves through `ParsingHeader → ProcessingRows → Finalizing` and
//! terminates in success (artifact uploaded) or failure (missing header,
//! upload error). Row-level failures are absorbed into the output labels
//! and never abort the run; the two dataset-level failures do. The task
//! wrapper sends exactly one terminal notification either way.

use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use leadscrub_classifier::LeadClassifier;
use leadscrub_delivery::{DriveUploader, Notifier};
use leadscrub_mx::MxClassifier;
use leadscrub_shared::{Result, RunId, RunReport};
use leadscrub_table::{Dataset, OutputTable};

use crate::bundle::BundleAssigner;
use crate::row::RowPipeline;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Per-run parameters supplied by the ingress layer.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Display filename the artifact is uploaded under.
    pub file_name: String,
    /// Prompt template with the `[POSICION]` placeholder.
    pub prompt_template: String,
    /// Pause before each MX lookup.
    pub lookup_delay: Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each row is handled.
    fn row_processed(&self, current: usize, total: usize);
    /// Called when the run completes successfully.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_processed(&self, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Dataset run
// ---------------------------------------------------------------------------

/// Run the enrichment pipeline over one dataset and upload the result.
///
/// Rows are processed strictly in arrival order (bundling correctness
/// depends on it) by a single sequential worker. Independent datasets can
/// run concurrently as separate calls; nothing is shared between runs.
#[instrument(skip_all, fields(file_name = %config.file_name))]
pub async fn process_dataset(
    csv_data: &str,
    config: &RunConfig,
    mx: &MxClassifier,
    classifier: &LeadClassifier,
    uploader: &DriveUploader,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, "starting dataset run");

    // --- Phase 1: Parse header + rows ---
    progress.phase("Parsing CSV");
    let dataset = Dataset::parse(csv_data).inspect_err(|e| {
        error!(%run_id, error = %e, "input rejected, no artifact will be produced");
    })?;

    // --- Phase 2: Enrich rows ---
    progress.phase("Enriching rows");
    let pipeline = RowPipeline {
        headers: &dataset.headers,
        mx,
        classifier,
        prompt_template: &config.prompt_template,
        lookup_delay: config.lookup_delay,
    };

    let mut bundles = BundleAssigner::new();
    let mut table = OutputTable::new(&dataset.headers);
    let total = dataset.rows.len();
    let mut rows_skipped = 0;

    for row in &dataset.rows {
        match pipeline.process(row, &mut bundles).await {
            Some(record) => table.push(record),
            None => rows_skipped += 1,
        }
        progress.row_processed(row.index + 1, total);
    }

    if rows_skipped > 0 {
        warn!(%run_id, rows_skipped, "malformed rows were dropped from the output");
    }

    // --- Phase 3: Finalize + upload ---
    progress.phase("Uploading artifact");
    let csv_bytes = table.to_csv()?;
    let artifact_link = uploader
        .upload_csv(csv_bytes, &config.file_name)
        .await
        .inspect_err(|e| {
            error!(%run_id, error = %e, "artifact upload failed");
        })?;

    let report = RunReport {
        run_id: run_id.clone(),
        message: "File processed and uploaded".to_string(),
        artifact_link,
        file_name: config.file_name.clone(),
        rows_processed: table.len(),
        rows_skipped,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        %run_id,
        rows_processed = report.rows_processed,
        rows_skipped = report.rows_skipped,
        elapsed_ms = report.elapsed.as_millis(),
        "dataset run complete"
    );

    Ok(report)
}

/// Run a dataset as a task: process, then send exactly one terminal
/// notification. Notification failures are logged and swallowed; they
/// never change the task's reported outcome.
pub async fn run_dataset_task(
    csv_data: &str,
    config: &RunConfig,
    mx: &MxClassifier,
    classifier: &LeadClassifier,
    uploader: &DriveUploader,
    notifier: &Notifier,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    match process_dataset(csv_data, config, mx, classifier, uploader, progress).await {
        Ok(report) => {
            let subject = format!("Lead list processed: {}", report.file_name);
            let body = format!(
                "{}\n\nFile: {}\nRows: {} ({} skipped)\nLink: {}\nCompleted: {}\n",
                report.message,
                report.file_name,
                report.rows_processed,
                report.rows_skipped,
                report.artifact_link,
                chrono::Utc::now().to_rfc3339(),
            );
            if let Err(e) = notifier.send(&subject, &body).await {
                warn!(error = %e, "success notification failed");
            }
            Ok(report)
        }
        Err(e) => {
            let subject = format!("Lead list processing failed: {}", config.file_name);
            let body = format!(
                "Error: {e}\n\nFile: {}\nFailed: {}\n",
                config.file_name,
                chrono::Utc::now().to_rfc3339(),
            );
            if let Err(notify_err) = notifier.send(&subject, &body).await {
                warn!(error = %notify_err, "failure notification failed");
            }
            Err(e)
        }
    }
}
