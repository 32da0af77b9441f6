use crate::config::Config;
use crate::error::ToolError;
use crate::models::*;
use crate::normalizer::*;
use crate::paginator::Paginator;
use crate::records::*;
use crate::redmine_client::{query, Query, RedmineApi};
use chrono::NaiveDate;
use itertools::Itertools;
use tracing::{info, warn};

pub const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD.";
pub const MISSING_IDENTITY_MESSAGE: &str = "Provide either a username or a user_id.";

const ISSUE_DETAIL_INCLUDES: [&str; 5] = ["journals", "relations", "attachments", "watchers", "children"];

/// How `get_issues_by_tracker` narrows results to a project.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectScope {
    Id(u64),
    /// Sent as the project identifier.
    Name(String),
    All,
}

impl ProjectScope {
    pub fn from_params(project_id: Option<u64>, project_name: Option<String>) -> Self {
        match (project_id, project_name) {
            (Some(id), _) => ProjectScope::Id(id),
            (None, Some(name)) if !name.trim().is_empty() => {
                ProjectScope::Name(name.trim().to_string())
            }
            _ => ProjectScope::All,
        }
    }
}

pub struct RedmineTools<C> {
    client: C,
    config: Config,
}

impl<C: RedmineApi> RedmineTools<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self { client, config }
    }

    fn paginator(&self) -> Paginator<'_, C> {
        Paginator::new(&self.client, &self.config)
    }

    /// Issues assigned to the API key's owner, any status.
    ///
    /// Only the first page the tracker returns is read; this listing is
    /// deliberately not walked like the others.
    pub async fn get_assigned_issues(&self) -> Result<Vec<IssueSummary>, ToolError> {
        let body = self
            .client
            .get_json(
                "/issues.json",
                &query([("assigned_to_id", "me"), ("status_id", "*")]),
            )
            .await?;
        let response: IssueListResponse = serde_json::from_value(body)?;

        if response.total_count > response.issues.len() as u64 {
            warn!(
                returned = response.issues.len(),
                total_count = response.total_count,
                "Assigned issues truncated to the first page"
            );
        }

        Ok(response
            .issues
            .into_iter()
            .map(normalize_issue_summary)
            .collect())
    }

    pub async fn get_issue_details(&self, issue_id: u64) -> Result<IssueDetail, ToolError> {
        let body = self
            .client
            .get_json(
                &format!("/issues/{}.json", issue_id),
                &query([("include", ISSUE_DETAIL_INCLUDES.iter().join(","))]),
            )
            .await?;
        let envelope: IssueEnvelope = serde_json::from_value(body)?;
        Ok(normalize_issue_detail(envelope.issue))
    }

    /// Issues assigned to a user, optionally limited to a creation-date
    /// range. `user_id` takes precedence over `username`.
    pub async fn search_issues_by_assignee(
        &self,
        username: Option<&str>,
        user_id: Option<u64>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<ToolResponse<Vec<IssueSummary>>, ToolError> {
        let created_on = match created_on_filter(start_date, end_date) {
            Ok(filter) => filter,
            Err(()) => return Ok(ToolResponse::failure(INVALID_DATE_MESSAGE)),
        };

        let user_id = match (user_id, non_blank(username)) {
            (Some(id), _) => id,
            (None, Some(name)) => match self.find_user_id(name).await? {
                Some(id) => id,
                None => {
                    return Ok(ToolResponse::failure(format!(
                        "No user found for '{}'",
                        name
                    )))
                }
            },
            (None, None) => return Ok(ToolResponse::failure(MISSING_IDENTITY_MESSAGE)),
        };

        let mut filters = query([
            ("assigned_to_id", user_id.to_string()),
            ("status_id", "*".to_string()),
        ]);
        if let Some(created_on) = created_on {
            filters.push(("created_on".to_string(), created_on));
        }

        let issues = self.collect_issues(&filters).await?;
        info!(user_id, count = issues.len(), "Assignee search finished");
        Ok(ToolResponse::Records(issues))
    }

    pub async fn search_issues_by_keyword(&self, keyword: &str) -> Result<Vec<SearchHit>, ToolError> {
        let filters = query([
            ("q", keyword.trim()),
            ("scope", "all"),
            ("issues", "1"),
        ]);
        self.paginator()
            .collect("/search.json", &filters, "results", normalize_search_hit)
            .await
    }

    pub async fn get_issues_by_tracker(
        &self,
        tracker_name: &str,
        scope: ProjectScope,
    ) -> Result<ToolResponse<Vec<IssueSummary>>, ToolError> {
        let tracker_id = match self.find_tracker_id(tracker_name).await? {
            Some(id) => id,
            None => {
                return Ok(ToolResponse::failure(format!(
                    "Tracker '{}' not found",
                    tracker_name
                )))
            }
        };

        let mut filters = query([
            ("tracker_id", tracker_id.to_string()),
            ("status_id", "*".to_string()),
        ]);
        match scope {
            ProjectScope::Id(id) => filters.push(("project_id".to_string(), id.to_string())),
            ProjectScope::Name(name) => filters.push(("project_id".to_string(), name)),
            ProjectScope::All => {}
        }

        Ok(ToolResponse::Records(self.collect_issues(&filters).await?))
    }

    pub async fn get_issue_hours_booked(&self, issue_id: u64) -> Result<TimeAggregate, ToolError> {
        let entries = self
            .paginator()
            .collect(
                "/time_entries.json",
                &query([("issue_id", issue_id.to_string())]),
                "time_entries",
                |entry: TimeEntry| Some(normalize_time_entry(entry)),
            )
            .await?;
        Ok(aggregate_time_entries(issue_id, &entries))
    }

    async fn collect_issues(&self, filters: &Query) -> Result<Vec<IssueSummary>, ToolError> {
        self.paginator()
            .collect("/issues.json", filters, "issues", |issue: RedmineIssue| {
                Some(normalize_issue_summary(issue))
            })
            .await
    }

    async fn find_user_id(&self, username: &str) -> Result<Option<u64>, ToolError> {
        let body = self
            .client
            .get_json("/users.json", &query([("name", username)]))
            .await?;
        let response: UserListResponse = serde_json::from_value(body)?;
        Ok(best_user_match(&response.users, username))
    }

    async fn find_tracker_id(&self, tracker_name: &str) -> Result<Option<u64>, ToolError> {
        let body = self.client.get_json("/trackers.json", &[]).await?;
        let response: TrackerListResponse = serde_json::from_value(body)?;
        let wanted = tracker_name.trim().to_lowercase();
        Ok(response
            .trackers
            .iter()
            .find(|tracker| tracker.name.to_lowercase() == wanted)
            .map(|tracker| tracker.id))
    }
}

/// The user lookup matches substrings of login, names and mail, so prefer an
/// exact login, then an exact full name, then whatever came first.
fn best_user_match(users: &[RedmineUser], wanted: &str) -> Option<u64> {
    let wanted = wanted.to_lowercase();
    let full_name = |user: &RedmineUser| {
        format!(
            "{} {}",
            user.firstname.as_deref().unwrap_or_default(),
            user.lastname.as_deref().unwrap_or_default()
        )
        .trim()
        .to_lowercase()
    };

    users
        .iter()
        .find(|user| {
            user.login
                .as_deref()
                .map_or(false, |login| login.to_lowercase() == wanted)
        })
        .or_else(|| users.iter().find(|user| full_name(*user) == wanted))
        .or_else(|| users.first())
        .map(|user| user.id)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Strict `YYYY-MM-DD`; chrono alone also accepts signed years and
/// unpadded or space-padded fields.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let shaped = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Builds the tracker's `created_on` filter. Both bounds must parse when both
/// are given.
fn created_on_filter(start: Option<&str>, end: Option<&str>) -> Result<Option<String>, ()> {
    let start = non_blank(start).map(|s| parse_date(s).ok_or(())).transpose()?;
    let end = non_blank(end).map(|s| parse_date(s).ok_or(())).transpose()?;

    Ok(match (start, end) {
        (Some(start), Some(end)) => Some(format!(
            "><{}|{}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )),
        (Some(start), None) => Some(format!(">={}", start.format("%Y-%m-%d"))),
        (None, Some(end)) => Some(format!("<={}", end.format("%Y-%m-%d"))),
        (None, None) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redmine_client::fake::FakeRedmine;
    use serde_json::{json, Value};

    fn tools(client: FakeRedmine) -> RedmineTools<FakeRedmine> {
        RedmineTools::new(client, Config::new("https://example.plan.io", "key"))
    }

    fn issue(id: u64) -> Value {
        json!({
            "id": id,
            "subject": format!("Issue {}", id),
            "status": { "id": 1, "name": "New" },
            "project": { "id": 1, "name": "Ops" },
            "created_on": "2024-01-15T09:00:00Z"
        })
    }

    #[test]
    fn date_filter_encodings() {
        assert_eq!(created_on_filter(None, None), Ok(None));
        assert_eq!(
            created_on_filter(Some("2024-01-01"), Some("2024-02-01")),
            Ok(Some("><2024-01-01|2024-02-01".to_string()))
        );
        assert_eq!(
            created_on_filter(Some("2024-01-01"), None),
            Ok(Some(">=2024-01-01".to_string()))
        );
        assert_eq!(
            created_on_filter(None, Some("2024-02-01")),
            Ok(Some("<=2024-02-01".to_string()))
        );
        assert_eq!(created_on_filter(Some("2024-1-5"), None), Err(()));
        assert_eq!(created_on_filter(Some("2024-02-01"), Some("2024-02-30")), Err(()));
        for malformed in ["+024-01-01", "-999-01-01", "2024- 1-01", "2024-01- 1", "2024/01/01"] {
            assert_eq!(created_on_filter(Some(malformed), None), Err(()), "{}", malformed);
            assert_eq!(created_on_filter(None, Some(malformed)), Err(()), "{}", malformed);
        }
    }

    #[test]
    fn project_scope_prefers_id() {
        assert_eq!(
            ProjectScope::from_params(Some(4), Some("ops".into())),
            ProjectScope::Id(4)
        );
        assert_eq!(
            ProjectScope::from_params(None, Some("ops".into())),
            ProjectScope::Name("ops".into())
        );
        assert_eq!(
            ProjectScope::from_params(None, Some(" ops ".into())),
            ProjectScope::Name("ops".into())
        );
        assert_eq!(ProjectScope::from_params(None, Some("  ".into())), ProjectScope::All);
        assert_eq!(ProjectScope::from_params(None, None), ProjectScope::All);
    }

    #[tokio::test]
    async fn assigned_issues_is_a_single_unpaginated_fetch() {
        let client = FakeRedmine::new().reply(
            "/issues.json",
            json!({ "issues": [issue(1), { "id": 2, "subject": "No project" }], "total_count": 2 }),
        );
        let tools = tools(client);

        let issues = tools.get_assigned_issues().await.unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].project.as_deref(), Some("Ops"));
        assert_eq!(issues[1].project, None);

        let calls = tools.client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].param("assigned_to_id"), Some("me"));
        assert_eq!(calls[0].param("status_id"), Some("*"));
        assert_eq!(calls[0].param("offset"), None);
    }

    #[tokio::test]
    async fn issue_details_requests_nested_includes() {
        let client = FakeRedmine::new().reply(
            "/issues/42.json",
            json!({ "issue": { "id": 42, "subject": "Detail", "journals": [{ "id": 1, "notes": "hi" }] } }),
        );
        let tools = tools(client);

        let detail = tools.get_issue_details(42).await.unwrap();

        assert_eq!(detail.id, 42);
        assert_eq!(detail.journals[0].notes.as_deref(), Some("hi"));
        assert_eq!(detail.assigned_to, None);
        assert_eq!(
            tools.client.calls()[0].param("include"),
            Some("journals,relations,attachments,watchers,children")
        );
    }

    #[tokio::test]
    async fn issue_details_surfaces_http_errors() {
        let tools = tools(FakeRedmine::new().fail("/issues/5.json", 403));

        let result = tools.get_issue_details(5).await;

        assert!(matches!(result, Err(ToolError::Client(_))));
    }

    #[tokio::test]
    async fn invalid_date_returns_structured_error_without_listing() {
        let tools = tools(FakeRedmine::new());

        let response = tools
            .search_issues_by_assignee(None, Some(3), Some("2024-13-01"), Some("2024-02-01"))
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!([{ "error": "Invalid date format. Use YYYY-MM-DD." }])
        );
        assert!(tools.client.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_username_returns_structured_error() {
        let tools = tools(FakeRedmine::new().reply("/users.json", json!({ "users": [], "total_count": 0 })));

        let response = tools
            .search_issues_by_assignee(Some("nonexistent"), None, None, None)
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!([{ "error": "No user found for 'nonexistent'" }])
        );
        assert!(tools.client.calls_to("/issues.json").is_empty());
        assert_eq!(
            tools.client.calls_to("/users.json")[0].param("name"),
            Some("nonexistent")
        );
    }

    #[tokio::test]
    async fn missing_identity_returns_structured_error() {
        let tools = tools(FakeRedmine::new());

        let response = tools
            .search_issues_by_assignee(Some("  "), None, None, None)
            .await
            .unwrap();

        assert_eq!(response.error_message(), Some(MISSING_IDENTITY_MESSAGE));
        assert!(tools.client.calls().is_empty());
    }

    #[tokio::test]
    async fn assignee_search_resolves_username_and_filters_dates() {
        let client = FakeRedmine::new()
            .reply("/users.json", json!({ "users": [{ "id": 17, "login": "ada" }] }))
            .reply("/issues.json", json!({ "issues": [issue(1), issue(2)], "total_count": 2 }));
        let tools = tools(client);

        let response = tools
            .search_issues_by_assignee(Some("ada"), None, Some("2024-01-01"), Some("2024-02-01"))
            .await
            .unwrap();

        match response {
            ToolResponse::Records(issues) => assert_eq!(issues.len(), 2),
            ToolResponse::Failure(f) => panic!("unexpected failure: {:?}", f),
        }
        let listings = tools.client.calls_to("/issues.json");
        let listing = &listings[0];
        assert_eq!(listing.param("assigned_to_id"), Some("17"));
        assert_eq!(listing.param("created_on"), Some("><2024-01-01|2024-02-01"));
        assert_eq!(listing.param("offset"), Some("0"));
    }

    #[tokio::test]
    async fn username_prefers_exact_login_then_full_name() {
        let client = FakeRedmine::new()
            .reply(
                "/users.json",
                json!({ "users": [
                    { "id": 1, "login": "adam", "firstname": "Adam", "lastname": "Smith" },
                    { "id": 2, "login": "ada", "firstname": "Ada", "lastname": "Lovelace" }
                ] }),
            )
            .reply("/issues.json", json!({ "issues": [], "total_count": 0 }))
            .reply(
                "/users.json",
                json!({ "users": [
                    { "id": 3, "login": "alovelace2", "firstname": "Ada", "lastname": "Lovelace-Byron" },
                    { "id": 4, "login": "alovelace", "firstname": "Ada", "lastname": "Lovelace" }
                ] }),
            )
            .reply("/issues.json", json!({ "issues": [], "total_count": 0 }));
        let tools = tools(client);

        tools
            .search_issues_by_assignee(Some("ada"), None, None, None)
            .await
            .unwrap();
        tools
            .search_issues_by_assignee(Some("Ada Lovelace"), None, None, None)
            .await
            .unwrap();

        let listings = tools.client.calls_to("/issues.json");
        assert_eq!(listings[0].param("assigned_to_id"), Some("2"));
        assert_eq!(listings[1].param("assigned_to_id"), Some("4"));
    }

    #[test]
    fn username_falls_back_to_first_result() {
        let users: Vec<RedmineUser> = serde_json::from_value(json!([
            { "id": 8, "login": "jdoe" },
            { "id": 9 }
        ]))
        .unwrap();

        assert_eq!(best_user_match(&users, "doe"), Some(8));
        assert_eq!(best_user_match(&[], "doe"), None);
    }

    #[tokio::test]
    async fn user_id_skips_lookup() {
        let client = FakeRedmine::new()
            .reply("/issues.json", json!({ "issues": [], "total_count": 0 }));
        let tools = tools(client);

        tools
            .search_issues_by_assignee(Some("ignored"), Some(5), None, None)
            .await
            .unwrap();

        assert!(tools.client.calls_to("/users.json").is_empty());
        assert_eq!(
            tools.client.calls_to("/issues.json")[0].param("assigned_to_id"),
            Some("5")
        );
    }

    #[tokio::test]
    async fn keyword_search_keeps_only_issue_hits_in_order() {
        let client = FakeRedmine::new().reply(
            "/search.json",
            json!({
                "results": [
                    { "id": 1, "title": "Bug #1", "type": "issue", "url": "u1", "description": "d1" },
                    { "id": 2, "title": "Wiki", "type": "wiki_page", "url": "u2", "description": "" },
                    { "id": 3, "title": "Bug #3", "type": "issue", "url": "u3", "description": "d3" },
                    { "id": 4, "title": "Doc", "type": "document", "url": "u4", "description": "" }
                ],
                "total_count": 4,
                "offset": 0,
                "limit": 100
            }),
        );
        let tools = tools(client);

        let hits = tools.search_issues_by_keyword("crash").await.unwrap();

        let ids: Vec<u64> = hits.iter().map(|hit| hit.id).collect();
        assert_eq!(ids, vec![1, 3]);
        let calls = tools.client.calls();
        let call = &calls[0];
        assert_eq!(call.param("q"), Some("crash"));
        assert_eq!(call.param("scope"), Some("all"));
        assert_eq!(call.param("issues"), Some("1"));
    }

    #[tokio::test]
    async fn tracker_lookup_is_case_insensitive() {
        let client = FakeRedmine::new()
            .reply(
                "/trackers.json",
                json!({ "trackers": [{ "id": 1, "name": "Bug" }, { "id": 2, "name": "Feature" }] }),
            )
            .reply("/issues.json", json!({ "issues": [issue(8)], "total_count": 1 }));
        let tools = tools(client);

        let response = tools
            .get_issues_by_tracker("feature", ProjectScope::Name("ops".into()))
            .await
            .unwrap();

        assert!(response.error_message().is_none());
        let listings = tools.client.calls_to("/issues.json");
        let listing = &listings[0];
        assert_eq!(listing.param("tracker_id"), Some("2"));
        assert_eq!(listing.param("project_id"), Some("ops"));
    }

    #[tokio::test]
    async fn unknown_tracker_returns_structured_error() {
        let client = FakeRedmine::new()
            .reply("/trackers.json", json!({ "trackers": [{ "id": 1, "name": "Bug" }] }));
        let tools = tools(client);

        let response = tools
            .get_issues_by_tracker("Epic", ProjectScope::All)
            .await
            .unwrap();

        assert_eq!(response.error_message(), Some("Tracker 'Epic' not found"));
        assert!(tools.client.calls_to("/issues.json").is_empty());
    }

    #[tokio::test]
    async fn hours_booked_sums_across_pages() {
        let config = Config::new("https://example.plan.io", "key").with_page_size(2);
        let client = FakeRedmine::new()
            .reply(
                "/time_entries.json",
                json!({ "time_entries": [{ "id": 1, "hours": 1.5 }, { "id": 2, "hours": 2.0 }], "total_count": 3 }),
            )
            .reply(
                "/time_entries.json",
                json!({ "time_entries": [{ "id": 3, "hours": 3.25 }], "total_count": 3 }),
            );
        let tools = RedmineTools::new(client, config);

        let aggregate = tools.get_issue_hours_booked(99).await.unwrap();

        let value = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(value["total_hours"], json!(6.75));
        assert_eq!(value["entries_count"], json!(3));
        assert_eq!(aggregate.issue_id, 99);
        assert_eq!(tools.client.calls().len(), 2);
        assert_eq!(tools.client.calls()[0].param("issue_id"), Some("99"));
    }
}
