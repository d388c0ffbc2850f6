//! Tasks and their embedded frequencies.

use crate::model::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A recurring activity definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned id.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Display name; never blank.
    pub name: String,
    /// Recurrence rules. Never empty; the first one drives the activity cycle.
    pub frequencies: Vec<Frequency>,
}

impl Task {
    /// Period of the first frequency, if it is usable as a timer interval.
    #[must_use]
    pub fn first_period(&self) -> Option<Duration> {
        self.frequencies.first().and_then(Frequency::period_duration)
    }
}

/// A recurrence rule embedded in a [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    /// Id of the embedded document.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// When the rule starts applying. Defaults to creation time.
    #[serde(rename = "startDT")]
    pub start_dt: DateTime<Utc>,
    /// When the rule stops applying.
    #[serde(rename = "endDT", default, skip_serializing_if = "Option::is_none")]
    pub end_dt: Option<DateTime<Utc>>,
    /// Reference point the period is counted from.
    #[serde(rename = "anchorDT", default, skip_serializing_if = "Option::is_none")]
    pub anchor_dt: Option<DateTime<Utc>>,
    /// Toggle interval in milliseconds.
    pub period: f64,
}

impl Frequency {
    /// The period as a [`Duration`], or `None` when it is not a positive
    /// finite number of milliseconds.
    #[must_use]
    pub fn period_duration(&self) -> Option<Duration> {
        if self.period.is_finite() && self.period > 0.0 {
            Duration::try_from_secs_f64(self.period / 1000.0).ok()
        } else {
            None
        }
    }
}

/// Client-side body for creating a task.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    pub name: String,
    pub frequencies: Vec<NewFrequency>,
}

impl NewTask {
    /// A task with a single frequency of `period_ms`.
    pub fn with_period(name: impl Into<String>, period_ms: f64) -> Self {
        Self {
            name: name.into(),
            frequencies: vec![NewFrequency::every(period_ms)],
        }
    }
}

/// Client-side body for one frequency.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewFrequency {
    pub period: f64,
    #[serde(rename = "startDT", skip_serializing_if = "Option::is_none")]
    pub start_dt: Option<DateTime<Utc>>,
    #[serde(rename = "endDT", skip_serializing_if = "Option::is_none")]
    pub end_dt: Option<DateTime<Utc>>,
    #[serde(rename = "anchorDT", skip_serializing_if = "Option::is_none")]
    pub anchor_dt: Option<DateTime<Utc>>,
}

impl NewFrequency {
    /// A frequency with only a period.
    #[must_use]
    pub fn every(period_ms: f64) -> Self {
        Self {
            period: period_ms,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn frequency(period: f64) -> Frequency {
        Frequency {
            id: RecordId::generate(),
            start_dt: Utc::now(),
            end_dt: None,
            anchor_dt: None,
            period,
        }
    }

    #[test]
    fn first_period_uses_first_frequency() {
        let task = Task {
            id: RecordId::generate(),
            name: "Water plants".to_owned(),
            frequencies: vec![frequency(250.0), frequency(10.0)],
        };
        assert_eq!(task.first_period(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn unusable_periods_have_no_duration() {
        assert!(frequency(0.0).period_duration().is_none());
        assert!(frequency(-5.0).period_duration().is_none());
        assert!(frequency(f64::NAN).period_duration().is_none());
    }

    #[test]
    fn task_serializes_wire_names() {
        let task = Task {
            id: RecordId::parse("4edd40c86762e0fb12000005").unwrap(),
            name: "Task".to_owned(),
            frequencies: vec![frequency(10.0)],
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["_id"], "4edd40c86762e0fb12000005");
        assert!(json["frequencies"][0].get("startDT").is_some());
        assert!(json["frequencies"][0].get("endDT").is_none());
        assert_eq!(json["frequencies"][0]["period"], 10.0);
    }

    #[test]
    fn new_task_body_omits_unset_dates() {
        let body = serde_json::to_value(NewTask::with_period("Task", 10.0)).unwrap();
        assert_eq!(body["name"], "Task");
        assert_eq!(body["frequencies"][0], serde_json::json!({ "period": 10.0 }));
    }
}
