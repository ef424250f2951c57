//! Folding working hour entries into chart series.
//!
//! Everything in here is a pure function of its inputs: lectures are reported
//! in the order they're given (the student's subscription order) and weeks in
//! the order of the week axis.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::data::entry::{Hours, WorkingHoursEntry};
use crate::data::lecture::{Lecture, LectureId};
use crate::week::{weeks_between, IsoWeek};

pub const ATTENDING: &str = "attending";
pub const HOMEWORK: &str = "homework";
pub const STUDIES: &str = "studies";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// A pie chart slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Total hours per week, one series per lecture.
    pub weekly: Chart,
    /// Hours per activity, one category per lecture.
    pub activities: Chart,
    pub activity_totals: Vec<Slice>,
    pub lecture_totals: Vec<Slice>,
}

/// How far before registration entries still extend the week axis.
pub const AXIS_WEEKS_BEFORE: i64 = 520;
/// How far after the current week entries still extend the week axis.
pub const AXIS_WEEKS_AFTER: i64 = 52;

/// Weeks a student could have reported hours for.
///
/// Starts with the earlier of the registration week and the first entry,
/// ends with the later of the current week and the last entry. Entries
/// outside of [`AXIS_WEEKS_BEFORE`] and [`AXIS_WEEKS_AFTER`] don't widen
/// the axis; they still count towards the totals.
pub fn student_weeks(
    registered: NaiveDate,
    entries: &[WorkingHoursEntry],
    today: NaiveDate,
) -> Vec<IsoWeek> {
    let lower = registered
        .min(today)
        .checked_sub_signed(Duration::weeks(AXIS_WEEKS_BEFORE))
        .unwrap_or(NaiveDate::MIN);
    let upper = today
        .max(registered)
        .checked_add_signed(Duration::weeks(AXIS_WEEKS_AFTER))
        .unwrap_or(NaiveDate::MAX);

    let in_window = entries
        .iter()
        .map(|e| e.week)
        .filter(|w| (lower..=upper).contains(w));
    let first = in_window.clone().min();
    let last = in_window.max();

    let from = first.map_or(registered, |f| f.min(registered));
    let to = last.map_or(today, |l| l.max(today));

    weeks_between(IsoWeek::containing(from), IsoWeek::containing(to))
}

fn hours_by_week(entries: &[WorkingHoursEntry]) -> HashMap<(LectureId, NaiveDate), Hours> {
    entries
        .iter()
        .map(|e| ((e.lecture, e.week), e.hours()))
        .collect()
}

fn hours_by_lecture(entries: &[WorkingHoursEntry]) -> HashMap<LectureId, Hours> {
    let mut sums: HashMap<LectureId, Hours> = HashMap::new();
    for entry in entries {
        let sum = sums.entry(entry.lecture).or_default();
        sum.hours_in_lecture += entry.hours_in_lecture;
        sum.hours_for_homework += entry.hours_for_homework;
        sum.hours_studying += entry.hours_studying;
    }
    sums
}

/// Total hours of every lecture in every week. Weeks without an entry count
/// as zero.
pub fn weekly_series(
    lectures: &[Lecture],
    weeks: &[IsoWeek],
    entries: &[WorkingHoursEntry],
) -> Chart {
    let hours = hours_by_week(entries);

    let series = lectures
        .iter()
        .map(|lecture| Series {
            name: lecture.name.clone(),
            data: weeks
                .iter()
                .map(|week| {
                    hours
                        .get(&(lecture.id, week.monday()))
                        .map_or(0.0, Hours::total)
                })
                .collect(),
        })
        .collect();

    Chart {
        categories: weeks.iter().map(|w| w.to_string()).collect(),
        series,
    }
}

/// Hours per activity summed over all weeks, one data point per lecture.
pub fn activity_series(lectures: &[Lecture], entries: &[WorkingHoursEntry]) -> Chart {
    let sums = hours_by_lecture(entries);
    let per_lecture: Vec<Hours> = lectures
        .iter()
        .map(|l| sums.get(&l.id).copied().unwrap_or_default())
        .collect();

    let activity = |name: &str, pick: fn(&Hours) -> f64| Series {
        name: name.to_string(),
        data: per_lecture.iter().map(pick).collect(),
    };

    Chart {
        categories: lectures.iter().map(|l| l.name.clone()).collect(),
        series: vec![
            activity(ATTENDING, |h| h.hours_in_lecture),
            activity(HOMEWORK, |h| h.hours_for_homework),
            activity(STUDIES, |h| h.hours_studying),
        ],
    }
}

/// Collapses each series of a chart into a single slice.
pub fn totals(chart: &Chart) -> Vec<Slice> {
    chart
        .series
        .iter()
        .map(|s| Slice {
            name: s.name.clone(),
            y: s.data.iter().sum(),
        })
        .collect()
}

/// Combined hours per lecture.
pub fn lecture_totals(lectures: &[Lecture], entries: &[WorkingHoursEntry]) -> Vec<Slice> {
    let sums = hours_by_lecture(entries);
    lectures
        .iter()
        .map(|l| Slice {
            name: l.name.clone(),
            y: sums.get(&l.id).map_or(0.0, Hours::total),
        })
        .collect()
}

pub fn dashboard(
    lectures: &[Lecture],
    weeks: &[IsoWeek],
    entries: &[WorkingHoursEntry],
) -> Dashboard {
    let activities = activity_series(lectures, entries);

    Dashboard {
        weekly: weekly_series(lectures, weeks, entries),
        activity_totals: totals(&activities),
        lecture_totals: lecture_totals(lectures, entries),
        activities,
    }
}
