use serde::Deserialize;
use serde_json::Value;

/// `{ "id": .., "name": .. }` reference used for status, project, tracker,
/// user and friends. Either half may be missing.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct NamedRef {
    pub id: Option<u64>,
    pub name: Option<String>,
}

/// Parent links only carry an id.
#[derive(Deserialize, Debug, Clone)]
pub struct IdRef {
    pub id: u64,
}

#[derive(Deserialize, Debug)]
pub struct RedmineIssue {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    pub description: Option<String>,
    pub project: Option<NamedRef>,
    pub tracker: Option<NamedRef>,
    pub status: Option<NamedRef>,
    pub priority: Option<NamedRef>,
    pub author: Option<NamedRef>,
    pub assigned_to: Option<NamedRef>,
    pub category: Option<NamedRef>,
    pub fixed_version: Option<NamedRef>,
    pub parent: Option<IdRef>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub done_ratio: Option<u64>,
    pub estimated_hours: Option<f64>,
    pub total_estimated_hours: Option<f64>,
    pub spent_hours: Option<f64>,
    pub total_spent_hours: Option<f64>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    pub closed_on: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub watchers: Vec<NamedRef>,
    #[serde(default)]
    pub children: Vec<ChildIssue>,
}

#[derive(Deserialize, Debug)]
pub struct IssueEnvelope {
    pub issue: RedmineIssue,
}

#[derive(Deserialize, Debug)]
pub struct CustomField {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Deserialize, Debug)]
pub struct Journal {
    pub id: u64,
    pub user: Option<NamedRef>,
    pub notes: Option<String>,
    pub created_on: Option<String>,
    #[serde(default)]
    pub private_notes: bool,
    #[serde(default)]
    pub details: Vec<JournalDetail>,
}

#[derive(Deserialize, Debug)]
pub struct JournalDetail {
    pub property: Option<String>,
    pub name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Attachment {
    pub id: u64,
    #[serde(default)]
    pub filename: String,
    pub filesize: Option<u64>,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub content_url: Option<String>,
    pub author: Option<NamedRef>,
    pub created_on: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Relation {
    pub id: u64,
    pub issue_id: u64,
    pub issue_to_id: u64,
    pub relation_type: String,
    pub delay: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct ChildIssue {
    pub id: u64,
    pub tracker: Option<NamedRef>,
    pub subject: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TimeEntry {
    pub id: u64,
    pub hours: Option<f64>,
    pub user: Option<NamedRef>,
    pub activity: Option<NamedRef>,
    pub spent_on: Option<String>,
    pub comments: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SearchResult {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub project: Option<NamedRef>,
}

#[derive(Deserialize, Debug)]
pub struct RedmineUser {
    pub id: u64,
    pub login: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UserListResponse {
    #[serde(default)]
    pub users: Vec<RedmineUser>,
}

#[derive(Deserialize, Debug)]
pub struct Tracker {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct TrackerListResponse {
    #[serde(default)]
    pub trackers: Vec<Tracker>,
}

#[derive(Deserialize, Debug)]
pub struct IssueListResponse {
    #[serde(default)]
    pub issues: Vec<RedmineIssue>,
    #[serde(default)]
    pub total_count: u64,
}
