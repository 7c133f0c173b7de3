use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;
use tracing::debug;

use shared_utils::datetime::DateTimeError;

use crate::models::{
    AvailabilitySlot, CalendarCell, CalendarMonth, CalendarWeek, CalendarYear, DaySummary,
    MonthSummary,
};

fn count_by_day(slots: &[AvailabilitySlot]) -> HashMap<NaiveDate, (usize, usize)> {
    let mut counts: HashMap<NaiveDate, (usize, usize)> = HashMap::new();
    for slot in slots {
        let entry = counts.entry(slot.date).or_default();
        if slot.is_booked {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }
    counts
}

fn summarize(date: NaiveDate, counts: &HashMap<NaiveDate, (usize, usize)>) -> DaySummary {
    match counts.get(&date) {
        Some((available, booked)) => DaySummary {
            date,
            available: *available,
            booked: *booked,
        },
        None => DaySummary::empty(date),
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, DateTimeError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DateTimeError::InvalidDate(format!("{:04}-{:02}", year, month)))
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32, DateTimeError> {
    let first = first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };
    Ok((next - first).num_days() as u32)
}

/// Month grid, Sunday first, padded to whole weeks.
pub fn month_view(
    year: i32,
    month: u32,
    slots: &[AvailabilitySlot],
) -> Result<CalendarMonth, DateTimeError> {
    let first = first_of_month(year, month)?;
    let total_days = days_in_month(year, month)?;
    let leading = first.weekday().num_days_from_sunday() as usize;
    let counts = count_by_day(slots);

    let mut cells = vec![CalendarCell::Padding; leading];
    cells.extend((0..total_days).map(|offset| {
        let date = first + Duration::days(offset as i64);
        CalendarCell::Day(summarize(date, &counts))
    }));

    let trailing = (7 - cells.len() % 7) % 7;
    cells.extend(std::iter::repeat(CalendarCell::Padding).take(trailing));

    debug!("Built month view {}-{:02} with {} cells", year, month, cells.len());

    Ok(CalendarMonth { year, month, cells })
}

/// The Sunday-to-Saturday week containing `anchor`.
pub fn week_view(anchor: NaiveDate, slots: &[AvailabilitySlot]) -> CalendarWeek {
    let start = anchor - Duration::days(anchor.weekday().num_days_from_sunday() as i64);
    let counts = count_by_day(slots);

    CalendarWeek {
        days: (0..7)
            .map(|offset| summarize(start + Duration::days(offset), &counts))
            .collect(),
    }
}

pub fn year_view(year: i32, slots: &[AvailabilitySlot]) -> CalendarYear {
    let mut months: Vec<MonthSummary> = (1..=12)
        .map(|month| MonthSummary {
            month,
            available: 0,
            booked: 0,
        })
        .collect();

    for slot in slots.iter().filter(|slot| slot.date.year() == year) {
        let summary = &mut months[slot.date.month0() as usize];
        if slot.is_booked {
            summary.booked += 1;
        } else {
            summary.available += 1;
        }
    }

    CalendarYear { year, months }
}
