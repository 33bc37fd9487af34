use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Category, Frequency, Task};

/// How many upcoming tasks the summary lists
pub const NEXT_UP_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category_id: i64,
    pub name: String,
    pub count: usize,
    /// Share of all tasks, 0.0 to 1.0
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub total: usize,
    pub with_reminders: usize,
    pub upcoming: usize,
    /// Only categories that have at least one task, largest first
    pub by_category: Vec<CategoryShare>,
    pub by_frequency: BTreeMap<Frequency, usize>,
    /// Ids of the next `NEXT_UP_LIMIT` upcoming tasks, soonest first
    pub next_up: Vec<Option<i64>>,
}

impl TaskStatistics {
    /// Summarize `tasks`. A task is upcoming when its start is after `now`;
    /// tasks with an unknown category are left out of `by_category`.
    pub fn compute(tasks: &[Task], categories: &[Category], now: NaiveDateTime) -> Self {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for task in tasks {
            if categories.iter().any(|c| c.id == task.category_id) {
                *counts.entry(task.category_id).or_default() += 1;
            }
        }

        let total = tasks.len();
        let mut by_category: Vec<CategoryShare> = categories
            .iter()
            .filter_map(|category| {
                let count = *counts.get(&category.id)?;
                Some(CategoryShare {
                    category_id: category.id,
                    name: category.name.clone(),
                    count,
                    fraction: count as f64 / total as f64,
                })
            })
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        let mut by_frequency: BTreeMap<Frequency, usize> =
            Frequency::ALL.iter().map(|f| (*f, 0)).collect();
        for task in tasks {
            *by_frequency.entry(task.frequency).or_default() += 1;
        }

        let mut upcoming: Vec<(NaiveDateTime, Option<i64>)> = tasks
            .iter()
            .filter_map(|t| t.date_time().filter(|dt| *dt > now).map(|dt| (dt, t.id)))
            .collect();
        upcoming.sort();

        Self {
            total,
            with_reminders: tasks.iter().filter(|t| t.has_reminder).count(),
            upcoming: upcoming.len(),
            by_category,
            by_frequency,
            next_up: upcoming
                .into_iter()
                .take(NEXT_UP_LIMIT)
                .map(|(_, id)| id)
                .collect(),
        }
    }
}
