//! Derived statistics over a loaded task set.
//!
//! Everything here is read-only and recomputed from the task slice; the
//! drawing of charts belongs to the caller.

use crate::tasks::models::{Priority, Task};
use chrono::{Days, NaiveDate};

/// Per-category task count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    /// Category name.
    pub label: String,
    /// Number of tasks in it.
    pub count: usize,
}

/// One day of the 7-day creation trend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendDay {
    /// The calendar day.
    pub date: NaiveDate,
    /// Tasks created that day.
    pub count: usize,
    /// Count relative to the busiest day of the week (0 when the whole
    /// week is empty).
    pub ratio: f64,
}

/// Summary counts for a loaded task set.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStats {
    /// All tasks.
    pub total: usize,
    /// Finished tasks.
    pub done: usize,
    /// Unfinished tasks.
    pub pending: usize,
    /// High-priority tasks.
    pub high: usize,
    /// Normal-priority tasks.
    pub normal: usize,
    /// Low-priority tasks.
    pub low: usize,
    /// Per-category counts, largest first.
    pub categories: Vec<CategoryCount>,
    /// Creation counts for the 7 days ending at the reference day.
    pub weekly_trend: Vec<TrendDay>,
}

impl TaskStats {
    /// Build statistics for `tasks`, with the trend ending at `today`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(tasks: &[Task], today: NaiveDate) -> Self {
        let total = tasks.len();
        let done = tasks.iter().filter(|task| task.is_done).count();

        let mut categories: Vec<CategoryCount> = Vec::new();
        for task in tasks {
            match categories.iter_mut().find(|entry| entry.label == task.category) {
                Some(entry) => entry.count += 1,
                None => categories.push(CategoryCount { label: task.category.clone(), count: 1 }),
            }
        }
        categories.sort_by(|a, b| b.count.cmp(&a.count));

        let start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
        let daily: Vec<(NaiveDate, usize)> = (0..7)
            .map(|offset| {
                let date = start.checked_add_days(Days::new(offset)).unwrap_or(start);
                let count =
                    tasks.iter().filter(|task| task.created_at.date_naive() == date).count();
                (date, count)
            })
            .collect();
        let busiest = daily.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let weekly_trend = daily
            .into_iter()
            .map(|(date, count)| TrendDay {
                date,
                count,
                ratio: if busiest == 0 { 0.0 } else { count as f64 / busiest as f64 },
            })
            .collect();

        Self {
            total,
            done,
            pending: total - done,
            high: count_priority(tasks, Priority::High),
            normal: count_priority(tasks, Priority::Normal),
            low: count_priority(tasks, Priority::Low),
            categories,
            weekly_trend,
        }
    }

    /// Fraction of tasks done (0 when there are none).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn done_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Tasks at exactly the given priority.
fn count_priority(tasks: &[Task], priority: Priority) -> usize {
    tasks.iter().filter(|task| task.priority == priority).count()
}
