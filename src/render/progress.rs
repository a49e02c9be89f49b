use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use console::style;
use crate::pipeline::{JobStatus, ProgressAggregate, Stage, StageRuntimeStatus, StageStatus};
use crate::utils::formatting::{format_duration, format_remaining, format_tokens};
use super::{EventRenderer, TrackerEvent};

/// Manages indicatif bars while a job is being watched: one overall bar,
/// one line per stage and a status line.
pub struct WatchProgress {
    multi: MultiProgress,
    overall: Option<ProgressBar>,
    stage_lines: Vec<(Stage, ProgressBar)>,
    status_bar: ProgressBar,
}

impl WatchProgress {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Renders nowhere; state is still tracked.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap()
        );
        status_bar.set_message("Waiting for first status...");
        status_bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self {
            multi,
            overall: None,
            stage_lines: Vec::new(),
            status_bar,
        }
    }

    fn on_started(&mut self, job_id: &str, stages: &[Stage]) {
        let bar = self.multi.insert_before(
            &self.status_bar,
            ProgressBar::new(stages.len() as u64),
        );
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:30.cyan/dark_gray} {pos}/{len} stages | {msg}")
                .unwrap()
                .progress_chars("█▓░")
        );
        bar.set_message(format!("Analysis {}", job_id));
        self.overall = Some(bar);

        for stage in stages {
            let line = self.multi.insert_before(&self.status_bar, ProgressBar::new_spinner());
            line.set_style(
                ProgressStyle::default_spinner()
                    .template("    {prefix} {msg}")
                    .unwrap()
            );
            line.set_prefix(glyph(StageStatus::Pending));
            line.set_message(stage.name.clone());
            self.stage_lines.push((stage.clone(), line));
        }
    }

    fn on_updated(&mut self, statuses: &[StageRuntimeStatus], aggregate: &ProgressAggregate) {
        for ((stage, line), status) in self.stage_lines.iter().zip(statuses) {
            line.set_prefix(glyph(status.status));
            line.set_message(stage_message(stage, status));
        }

        if let Some(bar) = &self.overall {
            bar.set_position(aggregate.completed_stages as u64);
            bar.set_message(format!("{}%", aggregate.percent_complete));
        }

        self.status_bar.set_message(format!(
            "{} elapsed | {} tokens | {} remaining",
            format_duration(aggregate.elapsed.as_millis() as u64),
            format_tokens(aggregate.tokens_used),
            format_remaining(aggregate.estimated_remaining_secs),
        ));
    }

    fn on_finished(&mut self, status: JobStatus, error: Option<&str>) {
        match status {
            JobStatus::Failed => {
                let message = error.unwrap_or("unknown error");
                if let Some(bar) = self.overall.take() {
                    bar.abandon_with_message("Failed");
                }
                self.status_bar.finish_with_message(format!(
                    "{} Analysis failed: {}",
                    style("✖").red(),
                    message
                ));
            }
            _ => {
                if let Some(bar) = self.overall.take() {
                    bar.finish_with_message("100%");
                }
                self.status_bar.finish_with_message(format!(
                    "{} Analysis complete",
                    style("✔").green()
                ));
            }
        }
        for (_, line) in &self.stage_lines {
            line.finish();
        }
    }

    fn on_cancelled(&mut self) {
        if let Some(bar) = self.overall.take() {
            bar.abandon_with_message("Cancelled");
        }
        for (_, line) in &self.stage_lines {
            line.abandon();
        }
        self.status_bar.finish_with_message("Stopped watching");
    }

    /// Current text of each stage line, as (glyph, message).
    pub fn stage_lines(&self) -> Vec<(String, String)> {
        self.stage_lines
            .iter()
            .map(|(_, line)| (line.prefix(), line.message()))
            .collect()
    }

    pub fn status_line(&self) -> String {
        self.status_bar.message()
    }
}

impl Default for WatchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRenderer for WatchProgress {
    fn handle_event(&mut self, event: &TrackerEvent) {
        match event {
            TrackerEvent::Started { job_id, stages } => self.on_started(job_id, stages),
            TrackerEvent::Updated { statuses, aggregate } => self.on_updated(statuses, aggregate),
            TrackerEvent::Finished { snapshot } => {
                self.on_finished(snapshot.status, snapshot.error_message.as_deref())
            }
            TrackerEvent::Cancelled => self.on_cancelled(),
        }
    }
}

fn glyph(status: StageStatus) -> String {
    match status {
        StageStatus::Pending => style("○").dim().to_string(),
        StageStatus::Running => style("▶").yellow().to_string(),
        StageStatus::Completed => style("✔").green().to_string(),
        StageStatus::Error => style("✖").red().to_string(),
    }
}

/// Stage name plus whatever metrics the backend reported for it.
pub fn stage_message(stage: &Stage, status: &StageRuntimeStatus) -> String {
    let mut details = Vec::new();
    if let Some(secs) = status.duration_secs {
        details.push(format_duration((secs * 1000.0).round() as u64));
    }
    if let Some(tokens) = status.tokens_used {
        details.push(format!("{} tokens", format_tokens(tokens)));
    }
    if status.status == StageStatus::Running && stage.estimated_secs > 0 {
        details.push(format!("est. {}", format_remaining(stage.estimated_secs)));
    }

    if details.is_empty() {
        stage.name.clone()
    } else {
        format!("{} ({})", stage.name, details.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{JobSnapshot, Reconciler};
    use std::time::Duration;

    fn stages() -> Vec<Stage> {
        ["extract", "analyze", "report"]
            .iter()
            .map(|id| Stage {
                id: id.to_string(),
                name: id.to_uppercase(),
                description: String::new(),
                icon: "step".to_string(),
                estimated_secs: 30,
            })
            .collect()
    }

    #[test]
    fn test_stage_message_with_metrics() {
        let stages = stages();
        let stage = &stages[0];
        let status = StageRuntimeStatus {
            stage_id: "extract".into(),
            status: StageStatus::Completed,
            duration_secs: Some(2.5),
            tokens_used: Some(1200),
        };
        assert_eq!(stage_message(stage, &status), "EXTRACT (2.5s, 1,200 tokens)");
    }

    #[test]
    fn test_stage_message_running_shows_estimate() {
        let stages = stages();
        let stage = &stages[1];
        let mut status = StageRuntimeStatus::pending("analyze");
        status.status = StageStatus::Running;
        assert_eq!(stage_message(stage, &status), "ANALYZE (est. ~30s)");
    }

    #[test]
    fn test_stage_message_plain() {
        let stages = stages();
        let stage = &stages[2];
        assert_eq!(stage_message(stage, &StageRuntimeStatus::pending("report")), "REPORT");
    }

    #[test]
    fn test_progress_tracks_updates() {
        let reconciler = Reconciler::new(stages()).unwrap();
        let snapshot = JobSnapshot::new(JobStatus::Running)
            .with_current("analyze")
            .with_completion("extract", 10, None);
        let statuses = reconciler.reduce(&snapshot);
        let aggregate = reconciler.aggregate(&statuses, &snapshot, Duration::from_secs(2));

        let mut progress = WatchProgress::hidden();
        progress.handle_event(&TrackerEvent::Started {
            job_id: "job-1".into(),
            stages: stages(),
        });
        progress.handle_event(&TrackerEvent::Updated { statuses, aggregate });

        let lines = progress.stage_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].1, "EXTRACT (10 tokens)");
        assert!(lines[1].1.starts_with("ANALYZE"));
        assert!(progress.status_line().contains("2.0s elapsed"));
    }

    #[test]
    fn test_progress_failed_shows_error() {
        let mut progress = WatchProgress::hidden();
        progress.handle_event(&TrackerEvent::Started {
            job_id: "job-1".into(),
            stages: stages(),
        });
        progress.handle_event(&TrackerEvent::Finished {
            snapshot: JobSnapshot::new(JobStatus::Failed).with_error("timeout"),
        });
        assert!(progress.status_line().contains("timeout"));
    }
}
