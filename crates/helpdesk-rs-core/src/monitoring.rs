//! Interaction monitoring events and the aggregate report.

use chrono::{DateTime, Utc};
use helpdesk_rs_protocol::{Priority, Provenance, Sentiment, TicketId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Monitoring event appended for every exchange, rating and upstream failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorEvent {
    Interaction {
        user: String,
        ticket: TicketId,
        question: String,
        answer: String,
        provenance: Provenance,
        sentiment: Sentiment,
        priority: Priority,
        fallback: bool,
        response_time_ms: u64,
        model_version: String,
        timestamp: DateTime<Utc>,
    },
    Feedback {
        user: String,
        ticket: TicketId,
        index: usize,
        liked: bool,
        timestamp: DateTime<Utc>,
    },
    Error {
        user: String,
        error_kind: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// Aggregate statistics over a stream of monitoring events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoringReport {
    pub total_responses: usize,
    pub unique_users: usize,
    pub average_response_ms: f64,
    /// Share of responses that used the fallback answer.
    pub fallback_rate: f64,
    pub thumbs_up: usize,
    pub thumbs_down: usize,
    /// `(up - down) / (up + down)`, zero without feedback.
    pub satisfaction: f64,
    pub errors: usize,
}

impl MonitoringReport {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a MonitorEvent>) -> Self {
        let mut report = MonitoringReport::default();
        let mut users = HashSet::new();
        let mut total_ms = 0u64;
        let mut fallbacks = 0usize;
        for event in events {
            match event {
                MonitorEvent::Interaction {
                    user,
                    fallback,
                    response_time_ms,
                    ..
                } => {
                    report.total_responses += 1;
                    users.insert(user.as_str());
                    total_ms += response_time_ms;
                    if *fallback {
                        fallbacks += 1;
                    }
                }
                MonitorEvent::Feedback { liked, .. } => {
                    if *liked {
                        report.thumbs_up += 1;
                    } else {
                        report.thumbs_down += 1;
                    }
                }
                MonitorEvent::Error { .. } => report.errors += 1,
            }
        }
        report.unique_users = users.len();
        if report.total_responses > 0 {
            report.average_response_ms = total_ms as f64 / report.total_responses as f64;
            report.fallback_rate = fallbacks as f64 / report.total_responses as f64;
        }
        let rated = report.thumbs_up + report.thumbs_down;
        if rated > 0 {
            report.satisfaction =
                (report.thumbs_up as f64 - report.thumbs_down as f64) / rated as f64;
        }
        report
    }
}

impl fmt::Display for MonitoringReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Helpdesk monitoring report")?;
        writeln!(f, "  total responses:   {}", self.total_responses)?;
        writeln!(f, "  unique users:      {}", self.unique_users)?;
        writeln!(f, "  avg response time: {:.1} ms", self.average_response_ms)?;
        writeln!(f, "  fallback rate:     {:.1}%", self.fallback_rate * 100.0)?;
        writeln!(
            f,
            "  satisfaction:      {:.2} ({} up / {} down)",
            self.satisfaction, self.thumbs_up, self.thumbs_down
        )?;
        write!(f, "  errors:            {}", self.errors)
    }
}
