use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category id used when the backend reference cannot be resolved
pub const UNKNOWN_CATEGORY_ID: i64 = -1;

/// Matches the id in the backend's default object repr, `Category object (14)`
static CATEGORY_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)\)").expect("category reference pattern is valid"));

/// Extract the category id from a backend reference string.
///
/// `"Category object (14)"` yields 14. Anything without a parenthesized
/// integer yields `UNKNOWN_CATEGORY_ID`.
pub fn parse_category_ref(reference: &str) -> i64 {
    CATEGORY_REF_RE
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(UNKNOWN_CATEGORY_ID)
}

/// Parse `HH:mm` or `HH:mm:ss` (the backend sends seconds, the client does not)
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::None,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
    ];

    /// Lowercase name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::None => "none",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Frequency::None => "None",
            Frequency::Daily => "Every day",
            Frequency::Weekly => "Every week",
            Frequency::Monthly => "Every month",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Frequency::None),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unknown frequency '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Backend id; None until the task has been created
    pub id: Option<i64>,
    pub title: String,
    pub category_id: i64,
    pub has_reminder: bool,
    pub location: String,
    pub notes: String,
    pub frequency: Frequency,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm`
    pub time_start: String,
    /// `HH:mm`
    pub time_end: String,
}

impl Task {
    pub fn new(title: impl Into<String>, category_id: i64, date: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            category_id,
            has_reminder: false,
            location: String::new(),
            notes: String::new(),
            frequency: Frequency::None,
            date: date.into(),
            time_start: String::new(),
            time_end: String::new(),
        }
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        parse_time(&self.time_start)
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        parse_time(&self.time_end)
    }

    /// `date` combined with `time_start`.
    ///
    /// Always derived from the current field values, never stored.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        Some(self.calendar_date()?.and_time(self.start_time()?))
    }

    /// JSON body for create and update calls
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title,
            "category": self.category_id,
            "date": self.date,
            "time_start": self.time_start,
            "time_end": self.time_end,
            "reminder": self.has_reminder,
            "location": self.location,
            "notes": self.notes,
            "frequency": self.frequency.as_str(),
        })
    }
}

/// Task as returned by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    /// `"Category object (14)"`, a bare primary key, or null
    #[serde(default)]
    pub category: serde_json::Value,
    pub date: String,
    pub time_start: String,
    #[serde(default)]
    pub time_end: Option<String>,
    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
}

/// Resolve the `category` field, whichever shape the backend sent
fn category_from_value(category: &serde_json::Value) -> i64 {
    match category {
        serde_json::Value::String(reference) => parse_category_ref(reference),
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(UNKNOWN_CATEGORY_ID),
        _ => UNKNOWN_CATEGORY_ID,
    }
}

impl TaskRecord {
    pub fn into_task(self) -> Result<Task, String> {
        let frequency = match self.frequency.as_deref() {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("task {}: {}", self.id, e))?,
            None => Frequency::None,
        };
        let category_id = category_from_value(&self.category);

        Ok(Task {
            id: Some(self.id),
            title: self.title,
            category_id,
            has_reminder: self.reminder,
            location: self.location.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            frequency,
            date: self.date,
            time_start: self.time_start,
            time_end: self.time_end.unwrap_or_default(),
        })
    }
}

fn default_draft_start() -> String {
    "00:00".to_string()
}

/// Task proposed by the backend from free text; not stored until created
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub category: serde_json::Value,
    pub date: String,
    #[serde(default = "default_draft_start")]
    pub time_start: String,
    #[serde(default)]
    pub time_end: String,
    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    pub frequency: String,
}

impl TaskDraft {
    /// Convert into an uncreated `Task`. The date and start time must parse.
    pub fn into_task(self) -> Result<Task, String> {
        let frequency: Frequency = self.frequency.parse()?;
        let task = Task {
            id: None,
            title: self.title,
            category_id: category_from_value(&self.category),
            has_reminder: self.reminder,
            location: self.location,
            notes: self.notes,
            frequency,
            date: self.date,
            time_start: self.time_start,
            time_end: self.time_end,
        };
        if task.date_time().is_none() {
            return Err(format!(
                "draft has no valid date and start time: '{}' '{}'",
                task.date, task.time_start
            ));
        }
        Ok(task)
    }
}
