use crate::models::*;
use crate::records::*;
use serde_json::Value;
use std::collections::HashMap;

pub const ISSUE_SEARCH_TYPE: &str = "issue";

fn name_of(reference: &Option<NamedRef>) -> Option<String> {
    reference.as_ref().and_then(|r| r.name.clone())
}

pub fn normalize_issue_summary(issue: RedmineIssue) -> IssueSummary {
    IssueSummary {
        status: name_of(&issue.status),
        project: name_of(&issue.project),
        id: issue.id,
        subject: issue.subject,
        created_on: issue.created_on,
    }
}

pub fn normalize_issue_detail(issue: RedmineIssue) -> IssueDetail {
    IssueDetail {
        id: issue.id,
        status: name_of(&issue.status),
        project: name_of(&issue.project),
        tracker: name_of(&issue.tracker),
        priority: name_of(&issue.priority),
        author: name_of(&issue.author),
        assigned_to: name_of(&issue.assigned_to),
        category: name_of(&issue.category),
        fixed_version: name_of(&issue.fixed_version),
        parent_id: issue.parent.map(|parent| parent.id),
        subject: issue.subject,
        description: issue.description,
        start_date: issue.start_date,
        due_date: issue.due_date,
        closed_on: issue.closed_on,
        created_on: issue.created_on,
        updated_on: issue.updated_on,
        done_ratio: issue.done_ratio,
        estimated_hours: issue.estimated_hours,
        total_estimated_hours: issue.total_estimated_hours,
        spent_hours: issue.spent_hours,
        total_spent_hours: issue.total_spent_hours,
        custom_fields: normalize_custom_fields(issue.custom_fields),
        journals: issue.journals.into_iter().map(normalize_journal).collect(),
        attachments: issue
            .attachments
            .into_iter()
            .map(normalize_attachment)
            .collect(),
        relations: issue.relations.into_iter().map(normalize_relation).collect(),
        watchers: issue
            .watchers
            .into_iter()
            .filter_map(|watcher| watcher.name)
            .collect(),
        children: issue.children.into_iter().map(normalize_child).collect(),
    }
}

/// Later entries with the same name overwrite earlier ones.
pub fn normalize_custom_fields(fields: Vec<CustomField>) -> HashMap<String, Value> {
    fields
        .into_iter()
        .map(|field| (field.name, field.value))
        .collect()
}

pub fn normalize_journal(journal: Journal) -> JournalRecord {
    JournalRecord {
        id: journal.id,
        user: name_of(&journal.user),
        notes: journal.notes,
        created_on: journal.created_on,
        private_notes: journal.private_notes,
        details: journal
            .details
            .into_iter()
            .map(|detail| JournalDetailRecord {
                property: detail.property,
                name: detail.name,
                old_value: detail.old_value,
                new_value: detail.new_value,
            })
            .collect(),
    }
}

pub fn normalize_attachment(attachment: Attachment) -> AttachmentRecord {
    AttachmentRecord {
        author: name_of(&attachment.author),
        id: attachment.id,
        filename: attachment.filename,
        filesize: attachment.filesize,
        content_type: attachment.content_type,
        description: attachment.description,
        content_url: attachment.content_url,
        created_on: attachment.created_on,
    }
}

pub fn normalize_relation(relation: Relation) -> RelationRecord {
    RelationRecord {
        id: relation.id,
        issue_id: relation.issue_id,
        issue_to_id: relation.issue_to_id,
        relation_type: relation.relation_type,
        delay: relation.delay,
    }
}

fn normalize_child(child: ChildIssue) -> ChildRecord {
    ChildRecord {
        tracker: name_of(&child.tracker),
        id: child.id,
        subject: child.subject,
    }
}

/// Returns `None` for anything that is not an issue (wiki pages, documents,
/// news...).
pub fn normalize_search_hit(result: SearchResult) -> Option<SearchHit> {
    if result.kind != ISSUE_SEARCH_TYPE {
        return None;
    }
    Some(SearchHit {
        project: name_of(&result.project),
        id: result.id,
        title: result.title,
        description: result.description,
        url: result.url,
    })
}

pub fn normalize_time_entry(entry: TimeEntry) -> TimeEntryRecord {
    TimeEntryRecord {
        id: entry.id,
        hours: entry.hours.unwrap_or(0.0),
        user: name_of(&entry.user),
        activity: name_of(&entry.activity),
        spent_on: entry.spent_on,
        comments: entry.comments,
    }
}

pub fn aggregate_time_entries(issue_id: u64, entries: &[TimeEntryRecord]) -> TimeAggregate {
    TimeAggregate {
        issue_id,
        total_hours: entries.iter().map(|entry| entry.hours).sum(),
        entries_count: entries.len(),
    }
}
