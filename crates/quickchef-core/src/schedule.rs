//! Deterministic post-processing of the model's shop/prep/cook timeline.

use std::cmp::Ordering;

use crate::error::RescheduleError;
use crate::model::{MealPlan, ScheduleItem, TaskKind};

/// Hour at which cook tasks are pinned when no other hour is configured.
pub const DEFAULT_COOK_START_HOUR: u32 = 18;

/// Tasks moved to this hour or later are flagged as late-night cooking.
pub const LATE_NIGHT_HOUR: u32 = 20;

/// Time block written onto cook tasks: `Day 2 @ 18:00`.
pub fn cook_time_block(day: u32, hour: u32) -> String {
    format!("Day {day} @ {hour:02}:00")
}

/// Ordering weight within a day. Unrecognized task types sort with shopping.
pub fn precedence(kind: TaskKind) -> u8 {
    match kind {
        TaskKind::Shop | TaskKind::Other => 0,
        TaskKind::Prep => 1,
        TaskKind::Cook => 2,
    }
}

/// Pin cook tasks to `start_hour` and order the schedule by day, then by
/// task precedence. The sort is stable, so equal tasks keep model order.
///
/// Idempotent for a fixed `start_hour`.
pub fn refine_schedule(mut schedule: Vec<ScheduleItem>, start_hour: u32) -> Vec<ScheduleItem> {
    for item in &mut schedule {
        if item.kind == TaskKind::Cook {
            item.time_block = cook_time_block(item.day, start_hour);
        }
    }
    schedule.sort_by(|a, b| {
        a.day
            .cmp(&b.day)
            .then_with(|| precedence(a.kind).cmp(&precedence(b.kind)))
    });
    schedule
}

/// Apply [`refine_schedule`] to a plan in place.
pub fn refine_plan(plan: &mut MealPlan, start_hour: u32) {
    let schedule = std::mem::take(&mut plan.schedule);
    plan.schedule = refine_schedule(schedule, start_hour);
}

/// Hour of a time block: the digits right before its first `:`.
///
/// `"Day 1 @ 18:00"` gives 18, `"7:30 am"` gives 7, `"evening"` gives `None`.
pub fn parse_hour(time_block: &str) -> Option<u32> {
    let (before, _) = time_block.split_once(':')?;
    let digits: String = before
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .take(2)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok().filter(|h| *h < 24)
}

/// Result of moving a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescheduleOutcome {
    /// The new time is at or after [`LATE_NIGHT_HOUR`]; consumers may
    /// suggest a quicker cooking mode for the next plan.
    pub late_night: bool,
}

/// Move task `task_id` to `day`/`time_block` and re-sort the schedule by
/// day, then by time block text.
pub fn reschedule(
    plan: &mut MealPlan,
    task_id: &str,
    day: u32,
    time_block: &str,
) -> Result<RescheduleOutcome, RescheduleError> {
    let days = plan.days.len();
    if day == 0 || day as usize > days {
        return Err(RescheduleError::DayOutOfRange { day, days });
    }
    let task = plan
        .schedule
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| RescheduleError::UnknownTask(task_id.to_string()))?;

    task.day = day;
    task.time_block = time_block.to_string();
    plan.schedule.sort_by(by_day_then_time);

    let late_night = parse_hour(time_block).is_some_and(|h| h >= LATE_NIGHT_HOUR);
    if late_night {
        tracing::info!(task = task_id, day, time_block, "task moved to late night");
    }
    Ok(RescheduleOutcome { late_night })
}

fn by_day_then_time(a: &ScheduleItem, b: &ScheduleItem) -> Ordering {
    a.day
        .cmp(&b.day)
        .then_with(|| a.time_block.cmp(&b.time_block))
}
