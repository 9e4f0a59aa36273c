//! iCalendar export of a plan's schedule.
//!
//! Each task becomes a `VEVENT` on `anchor + day` at the hour found in its
//! time block (09:00 when there is none), lasting `duration_minutes`.
//! Times are written in UTC.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::model::{MealPlan, ScheduleItem};
use crate::schedule::parse_hour;

pub const PRODID: &str = "-//QuickChef//Pro//EN";

/// Hour used when a time block carries no parsable hour.
pub const DEFAULT_EVENT_HOUR: u32 = 9;

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const MAX_LINE_OCTETS: usize = 75;

/// Render `schedule` as an iCalendar document. `stamp` becomes every
/// event's `DTSTAMP`.
pub fn to_ics(schedule: &[ScheduleItem], anchor: NaiveDate, stamp: DateTime<Utc>) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{PRODID}"));
    push_line(&mut out, "CALSCALE:GREGORIAN");

    for item in schedule {
        let start = event_start(anchor, item);
        let end = start + TimeDelta::minutes(i64::from(item.duration_minutes));

        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}@quickchef", escape_text(&item.id)));
        push_line(&mut out, &format!("DTSTAMP:{}", stamp.format(STAMP_FORMAT)));
        push_line(&mut out, &format!("DTSTART:{}", start.format(STAMP_FORMAT)));
        push_line(&mut out, &format!("DTEND:{}", end.format(STAMP_FORMAT)));
        push_line(
            &mut out,
            &format!(
                "SUMMARY:{}",
                escape_text(&format!(
                    "QuickChef: {} - {}",
                    item.kind.as_str().to_uppercase(),
                    item.description
                ))
            ),
        );
        push_line(
            &mut out,
            &format!("DESCRIPTION:{}", escape_text(&item.description)),
        );
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Export a plan's schedule, stamped with the current time.
pub fn plan_to_ics(plan: &MealPlan, anchor: NaiveDate) -> String {
    to_ics(&plan.schedule, anchor, Utc::now())
}

fn event_start(anchor: NaiveDate, item: &ScheduleItem) -> DateTime<Utc> {
    let date = anchor
        .checked_add_days(Days::new(u64::from(item.day)))
        .unwrap_or(anchor);
    let hour = parse_hour(&item.time_block).unwrap_or(DEFAULT_EVENT_HOUR);
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time).and_utc()
}

/// Escape a TEXT value: backslash, semicolon, comma and newlines.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Append a content line, folded at 75 octets, terminated by CRLF.
fn push_line(out: &mut String, line: &str) {
    let mut used = 0;
    for c in line.chars() {
        if used + c.len_utf8() > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(c);
        used += c.len_utf8();
    }
    out.push_str("\r\n");
}
