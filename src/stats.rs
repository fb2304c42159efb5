use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::priority::Priority;
use crate::entities::todo;
use crate::query::YearMonth;

/// 未完了TODOの優先度別件数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub urgent: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    pub month: String,
    pub month_name: String,
    pub tasks_started: u64,
    pub tasks_completed: u64,
}

/// ダッシュボード用の集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
    pub overdue: u64,
    pub completion_rate: f64,
    pub by_priority: PriorityBreakdown,
    pub monthly_stats: Option<MonthlyStats>,
}

impl TodoStats {
    /// 集計します。`month` 指定時は作成月で絞り込みますが、
    /// `overdue` だけは常に全件が対象です。
    pub fn compute(todos: &[todo::Model], month: Option<YearMonth>, now: DateTime<Utc>) -> Self {
        let scoped: Vec<&todo::Model> = todos
            .iter()
            .filter(|t| month.map_or(true, |m| m.contains(&t.created_at)))
            .collect();

        let total = scoped.len() as u64;
        let completed = scoped.iter().filter(|t| t.completed).count() as u64;

        let mut by_priority = PriorityBreakdown::default();
        for t in scoped.iter().filter(|t| !t.completed) {
            match t.priority {
                Priority::Urgent => by_priority.urgent += 1,
                Priority::High => by_priority.high += 1,
                Priority::Medium => by_priority.medium += 1,
                Priority::Low => by_priority.low += 1,
            }
        }

        let overdue = todos
            .iter()
            .filter(|t| !t.completed && t.due_date.map_or(false, |d| d < now))
            .count() as u64;

        let completion_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        TodoStats {
            total,
            completed,
            active: total - completed,
            overdue,
            completion_rate,
            by_priority,
            monthly_stats: month.map(|m| MonthlyStats {
                month: m.to_string(),
                month_name: m.display_name(),
                tasks_started: total,
                tasks_completed: completed,
            }),
        }
    }
}

/// 作成月の一覧 (新しい順、重複なし)
pub fn available_months<'a, I>(created: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a sea_orm::prelude::DateTimeWithTimeZone>,
{
    let mut months: Vec<YearMonth> = created.into_iter().map(YearMonth::of).collect();
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    months.into_iter().map(|m| m.to_string()).collect()
}
