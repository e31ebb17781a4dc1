//! Completion fractions and time rollups.
//!
//! Missing durations count as zero and give zero progress. Nothing here
//! fails or caches.

use serde::{Deserialize, Serialize};

use super::{Dream, Goal, Task};

/// Fraction of `duration` covered by `time_spent`, in `[0, 1]`.
///
/// Rounded to three decimals before clamping. Zero when there is no
/// positive duration.
pub fn compute_progress(time_spent: u64, duration: Option<u64>) -> f64 {
    match duration {
        Some(duration) if duration > 0 => {
            let ratio = time_spent as f64 / duration as f64;
            ((ratio * 1000.0).round() / 1000.0).min(1.0)
        }
        _ => 0.0,
    }
}

pub fn task_progress(task: &Task) -> f64 {
    compute_progress(task.time_spent, task.duration)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRollup {
    /// Sum of child task durations.
    pub total_duration: u64,
    /// Sum of child task time spent.
    pub tasks_time_spent: u64,
    pub progress: f64,
    /// The goal's own time plus all of its tasks'.
    pub total_time_spent: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamRollup {
    /// Sum of durations of every task under every goal.
    pub total_duration: u64,
    /// Sum of time spent on every task under every goal.
    pub tasks_time_spent: u64,
    pub progress: f64,
    /// The dream's own time plus every descendant goal's and task's.
    pub total_time_spent: u64,
}

pub fn roll_up_goal(goal: &Goal) -> GoalRollup {
    let (total_duration, tasks_time_spent) = goal.tasks.iter().fold(
        (0u64, 0u64),
        |(duration, spent), task| {
            (
                duration.saturating_add(task.duration.unwrap_or(0)),
                spent.saturating_add(task.time_spent),
            )
        },
    );
    GoalRollup {
        total_duration,
        tasks_time_spent,
        progress: compute_progress(tasks_time_spent, Some(total_duration)),
        total_time_spent: goal.time_spent.saturating_add(tasks_time_spent),
    }
}

/// Roll a dream up from rollups of its goals (see [`Dream::roll_up`]).
pub fn roll_up_dream(dream: &Dream, rolled_up_goals: &[GoalRollup]) -> DreamRollup {
    let (total_duration, tasks_time_spent, goals_total) = rolled_up_goals.iter().fold(
        (0u64, 0u64, 0u64),
        |(duration, spent, total), goal| {
            (
                duration.saturating_add(goal.total_duration),
                spent.saturating_add(goal.tasks_time_spent),
                total.saturating_add(goal.total_time_spent),
            )
        },
    );
    DreamRollup {
        total_duration,
        tasks_time_spent,
        progress: compute_progress(tasks_time_spent, Some(total_duration)),
        total_time_spent: dream.time_spent.saturating_add(goals_total),
    }
}
