use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IssueSummary {
    pub id: u64,
    pub subject: String,
    pub status: Option<String>,
    pub project: Option<String>,
    pub created_on: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IssueDetail {
    pub id: u64,
    pub subject: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub project: Option<String>,
    pub tracker: Option<String>,
    pub priority: Option<String>,
    pub author: Option<String>,
    pub assigned_to: Option<String>,
    pub category: Option<String>,
    pub fixed_version: Option<String>,
    pub parent_id: Option<u64>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub closed_on: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    pub done_ratio: Option<u64>,
    pub estimated_hours: Option<f64>,
    pub total_estimated_hours: Option<f64>,
    pub spent_hours: Option<f64>,
    pub total_spent_hours: Option<f64>,
    pub custom_fields: HashMap<String, Value>,
    pub journals: Vec<JournalRecord>,
    pub attachments: Vec<AttachmentRecord>,
    pub relations: Vec<RelationRecord>,
    pub watchers: Vec<String>,
    pub children: Vec<ChildRecord>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JournalRecord {
    pub id: u64,
    pub user: Option<String>,
    pub notes: Option<String>,
    pub created_on: Option<String>,
    pub private_notes: bool,
    pub details: Vec<JournalDetailRecord>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JournalDetailRecord {
    pub property: Option<String>,
    pub name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AttachmentRecord {
    pub id: u64,
    pub filename: String,
    pub filesize: Option<u64>,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub content_url: Option<String>,
    pub author: Option<String>,
    pub created_on: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RelationRecord {
    pub id: u64,
    pub issue_id: u64,
    pub issue_to_id: u64,
    pub relation_type: String,
    pub delay: Option<i64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChildRecord {
    pub id: u64,
    pub subject: Option<String>,
    pub tracker: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub project: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeEntryRecord {
    pub id: u64,
    pub hours: f64,
    pub user: Option<String>,
    pub activity: Option<String>,
    pub spent_on: Option<String>,
    pub comments: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeAggregate {
    pub issue_id: u64,
    pub total_hours: f64,
    pub entries_count: usize,
}

/// Caller-visible failure that is not a fault: unknown user, unknown
/// tracker, malformed date.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ToolFailure {
    pub error: String,
}

/// Either the tool's records or a one-element `[{"error": ..}]` payload.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ToolResponse<T> {
    Records(T),
    Failure([ToolFailure; 1]),
}

impl<T> ToolResponse<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        ToolResponse::Failure([ToolFailure {
            error: message.into(),
        }])
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ToolResponse::Failure([failure]) => Some(failure.error.as_str()),
            ToolResponse::Records(_) => None,
        }
    }
}
