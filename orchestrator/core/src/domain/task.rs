// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Caller-supplied identifier for a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Priority of a task, driving compression quality and vote weighting.
///
/// Callers may express priority either as a name (`"high"`) or as a numeric
/// level; levels 0–3 map to `Low`, 4–7 to `Medium`, 8 and above to `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn from_level(level: u8) -> Self {
        match level {
            0..=3 => Self::Low,
            4..=7 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Level(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Level(level) => Ok(Self::from_level(level)),
            Repr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "low" => Ok(Self::Low),
                "medium" => Ok(Self::Medium),
                "high" => Ok(Self::High),
                other => Err(serde::de::Error::custom(format!(
                    "unknown priority '{}'",
                    other
                ))),
            },
        }
    }
}

/// A unit of work routed through the delegation pipeline.
///
/// Immutable once delegation begins; the orchestrator never mutates a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(rename = "type", default = "default_task_type")]
    pub task_type: String,
    #[serde(default)]
    pub priority: TaskPriority,
}

fn default_task_type() -> String {
    "general".to_string()
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(id),
            description: description.into(),
            task_type: default_task_type(),
            priority: TaskPriority::default(),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_numeric_level() {
        assert_eq!(TaskPriority::from_level(0), TaskPriority::Low);
        assert_eq!(TaskPriority::from_level(3), TaskPriority::Low);
        assert_eq!(TaskPriority::from_level(5), TaskPriority::Medium);
        assert_eq!(TaskPriority::from_level(8), TaskPriority::High);
        assert_eq!(TaskPriority::from_level(255), TaskPriority::High);
    }

    #[test]
    fn test_priority_deserializes_from_name_or_number() {
        let named: TaskPriority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(named, TaskPriority::High);

        let numeric: TaskPriority = serde_json::from_str("5").unwrap();
        assert_eq!(numeric, TaskPriority::Medium);

        assert!(serde_json::from_str::<TaskPriority>("\"urgent\"").is_err());
    }

    #[test]
    fn test_task_deserializes_with_defaults() {
        let task: Task =
            serde_json::from_str(r#"{"id":"t1","description":"fix the slow login bug","priority":5}"#)
                .unwrap();
        assert_eq!(task.id.as_str(), "t1");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.task_type, "general");
    }
}
