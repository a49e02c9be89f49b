use std::io::Write;
use chrono::Utc;
use super::{EventRenderer, TrackerEvent};
use tracing::warn;

/// Writes one JSON object per event, stamped with `observed_at`.
pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventRenderer for JsonLines<W> {
    fn handle_event(&mut self, event: &TrackerEvent) {
        let mut value = match serde_json::to_value(event) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to serialize tracker event");
                return;
            }
        };
        if let Some(obj) = value.as_object_mut() {
            obj.insert("observed_at".to_string(), Utc::now().to_rfc3339().into());
        }
        if let Err(e) = writeln!(self.out, "{}", value).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write tracker event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{JobSnapshot, JobStatus};

    fn lines(buf: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_json_lines_tags_events() {
        let mut renderer = JsonLines::new(Vec::new());
        renderer.handle_event(&TrackerEvent::Finished {
            snapshot: JobSnapshot::new(JobStatus::Failed).with_error("timeout"),
        });
        renderer.handle_event(&TrackerEvent::Cancelled);

        let out = lines(renderer.into_inner());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["event"], "finished");
        assert_eq!(out[0]["snapshot"]["status"], "failed");
        assert_eq!(out[0]["snapshot"]["error_message"], "timeout");
        assert!(out[0]["observed_at"].is_string());
        assert_eq!(out[1]["event"], "cancelled");
    }
}
