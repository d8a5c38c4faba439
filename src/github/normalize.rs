//! Pure mappers from raw page records to the canonical model. Missing
//! optional fields default to zero/empty and unknown fields are ignored;
//! only a missing or malformed identity field (`date`, a login) is an
//! error.

use crate::model::{DailyOrgMetric, DailyUserMetric, EditorCounts, MetricsError, Result, Seat};
use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use serde_json::Value;

pub fn org_metrics(records: &[Value]) -> Result<Vec<DailyOrgMetric>> {
    records.iter().map(org_metric).collect()
}

pub fn user_metrics(records: &[Value]) -> Result<Vec<DailyUserMetric>> {
    records.iter().map(user_metric).collect()
}

pub fn seats(records: &[Value]) -> Result<Vec<Seat>> {
    records.iter().map(seat).collect()
}

fn org_metric(record: &Value) -> Result<DailyOrgMetric> {
    let date = required_day(record, "date", "org metric")?;

    let total_suggestions = count(record, "total_suggestions_count");
    let total_acceptances = count(record, "total_acceptances_count");
    if total_acceptances > total_suggestions {
        return Err(MetricsError::schema(
            date,
            format!("{total_acceptances} acceptances exceed {total_suggestions} suggestions"),
        ));
    }
    let active_users = count(record, "total_active_users");
    let engaged_users = count(record, "total_engaged_users");
    if engaged_users > active_users {
        return Err(MetricsError::schema(
            date,
            format!("{engaged_users} engaged users exceed {active_users} active users"),
        ));
    }

    let mut by_editor: IndexMap<String, EditorCounts> = IndexMap::new();
    for entry in record
        .get("breakdown")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let editor = entry
            .get("editor")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let counts = by_editor.entry(editor.to_string()).or_default();
        counts.suggestions += count(entry, "suggestions_count");
        counts.acceptances += count(entry, "acceptances_count");
    }

    Ok(DailyOrgMetric {
        date,
        total_suggestions,
        total_acceptances,
        total_lines_suggested: count(record, "total_lines_suggested"),
        total_lines_accepted: count(record, "total_lines_accepted"),
        active_users,
        engaged_users,
        by_editor,
    })
}

fn user_metric(record: &Value) -> Result<DailyUserMetric> {
    let Some(login) = record.get("user_login").and_then(Value::as_str) else {
        return Err(MetricsError::schema(
            "user metric",
            "missing `user_login` field",
        ));
    };
    let date = required_day(record, "date", login)?;

    Ok(DailyUserMetric {
        date,
        login: login.to_string(),
        interactions: count(record, "user_initiated_interaction_count"),
        code_generations: count(record, "code_generation_activity_count"),
        code_acceptances: count(record, "code_acceptance_activity_count"),
        lines_suggested: count(record, "loc_suggested"),
        lines_accepted: count(record, "loc_added"),
        last_activity_at: timestamp(record, "last_activity_at"),
    })
}

fn seat(record: &Value) -> Result<Seat> {
    let Some(login) = record
        .get("assignee")
        .and_then(|assignee| assignee.get("login"))
        .and_then(Value::as_str)
    else {
        return Err(MetricsError::schema(
            "seat",
            "missing `assignee.login` field",
        ));
    };

    Ok(Seat {
        login: login.to_string(),
        assigned_at: timestamp(record, "created_at"),
        last_activity_at: timestamp(record, "last_activity_at"),
        last_activity_editor: record
            .get("last_activity_editor")
            .and_then(Value::as_str)
            .map(String::from),
        pending_cancellation: record
            .get("pending_cancellation_date")
            .and_then(Value::as_str)
            .is_some(),
    })
}

fn required_day(record: &Value, key: &str, identity: &str) -> Result<NaiveDate> {
    let Some(raw) = record.get(key).and_then(Value::as_str) else {
        return Err(MetricsError::schema(identity, format!("missing `{key}` field")));
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| MetricsError::schema(identity, format!("`{raw}` is not a YYYY-MM-DD date")))
}

fn count(record: &Value, key: &str) -> u64 {
    record.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn timestamp(record: &Value, key: &str) -> Option<DateTime<FixedOffset>> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
}
