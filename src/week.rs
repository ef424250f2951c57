use std::fmt::{Display, Formatter};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[error("year {year} has no ISO week {week}")]
pub struct InvalidWeek {
    pub year: i32,
    pub week: i64,
}

/// A week of the ISO-8601 week-numbering year, represented by its Monday.
///
/// Week 1 is the week containing the first Thursday of the year, so the
/// Monday of week 1 can fall into the previous calendar year and a year has
/// either 52 or 53 weeks. Entries are keyed by [`IsoWeek::monday`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct IsoWeek(NaiveDate);

impl IsoWeek {
    /// Fails for week 0 and for week 53 of years that only have 52 weeks.
    pub fn new(year: i32, week: u32) -> Result<IsoWeek, InvalidWeek> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(IsoWeek)
            .ok_or(InvalidWeek {
                year,
                week: i64::from(week),
            })
    }

    /// Like [`IsoWeek::new`] for week numbers taken from untrusted input.
    pub fn parse(year: i32, week: i64) -> Result<IsoWeek, InvalidWeek> {
        u32::try_from(week)
            .map_err(|_| InvalidWeek { year, week })
            .and_then(|w| IsoWeek::new(year, w))
    }

    pub fn containing(date: NaiveDate) -> IsoWeek {
        let offset = date.weekday().num_days_from_monday();
        IsoWeek(date - Duration::days(offset as i64))
    }

    pub fn year(self) -> i32 {
        self.0.iso_week().year()
    }

    pub fn week(self) -> u32 {
        self.0.iso_week().week()
    }

    pub fn monday(self) -> NaiveDate {
        self.0
    }

    /// `None` past the last week chrono can represent.
    pub fn next(self) -> Option<IsoWeek> {
        self.0.checked_add_signed(Duration::weeks(1)).map(IsoWeek)
    }
}

impl Display for IsoWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year(), self.week())
    }
}

/// All weeks from `from` up to and including `to`, ascending.
pub fn weeks_between(from: IsoWeek, to: IsoWeek) -> Vec<IsoWeek> {
    let first = Some(from).filter(|w| *w <= to);
    std::iter::successors(first, |w| w.next().filter(|n| *n <= to)).collect()
}

/// Week as exposed to clients.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, ToSchema)]
pub struct WeekView {
    pub year: i32,
    pub week: u32,
    pub monday: NaiveDate,
}

impl From<IsoWeek> for WeekView {
    fn from(value: IsoWeek) -> Self {
        WeekView {
            year: value.year(),
            week: value.week(),
            monday: value.monday(),
        }
    }
}

/// Academic semester a week belongs to.
///
/// The summer semester runs from April through September. The winter
/// semester starts in October and ends in March of the following year; it is
/// identified by the year it starts in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Semester {
    Winter(i32),
    Summer(i32),
}

impl Semester {
    pub fn of(week: IsoWeek) -> Semester {
        let monday = week.monday();
        match monday.month() {
            4..=9 => Semester::Summer(monday.year()),
            10..=12 => Semester::Winter(monday.year()),
            _ => Semester::Winter(monday.year() - 1),
        }
    }
}

impl Display for Semester {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Semester::Summer(year) => write!(f, "Summer {}", year),
            Semester::Winter(year) => write!(f, "Winter {}/{:02}", year, (year + 1) % 100),
        }
    }
}

/// Splits an ordered list of weeks into runs belonging to the same semester.
pub fn group_by_semester(weeks: &[IsoWeek]) -> Vec<(Semester, Vec<IsoWeek>)> {
    let mut groups: Vec<(Semester, Vec<IsoWeek>)> = vec![];

    for week in weeks {
        let semester = Semester::of(*week);
        match groups.last_mut() {
            Some((current, members)) if *current == semester => members.push(*week),
            _ => groups.push((semester, vec![*week])),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_roundtrips_for_every_valid_week() {
        for year in 1990..2040 {
            let mut week = 1;
            while let Ok(iso) = IsoWeek::new(year, week) {
                let monday = iso.monday();
                assert_eq!(monday.weekday(), Weekday::Mon, "{} isn't a monday", iso);
                assert_eq!(monday.iso_week().year(), year);
                assert_eq!(monday.iso_week().week(), week);
                week += 1;
            }
            assert!(week == 53 || week == 54, "{} ended at week {}", year, week);
        }
    }

    #[test]
    fn week_one_can_start_in_previous_year() {
        let w = IsoWeek::new(2020, 1).unwrap();
        assert_eq!(w.monday(), date(2019, 12, 30));

        let w = IsoWeek::new(2021, 1).unwrap();
        assert_eq!(w.monday(), date(2021, 1, 4));
    }

    #[test]
    fn week_53_only_exists_in_long_years() {
        assert_eq!(IsoWeek::new(2020, 53).unwrap().monday(), date(2020, 12, 28));
        assert_eq!(
            IsoWeek::new(2021, 53),
            Err(InvalidWeek {
                year: 2021,
                week: 53
            })
        );
        assert!(IsoWeek::new(2021, 0).is_err());
        assert!(IsoWeek::new(2021, 54).is_err());
        assert_eq!(
            IsoWeek::parse(2021, -1),
            Err(InvalidWeek {
                year: 2021,
                week: -1
            })
        );
        assert_eq!(IsoWeek::parse(2021, 1), IsoWeek::new(2021, 1));
    }

    #[test]
    fn containing_finds_monday() {
        let sunday = date(2024, 1, 7);
        let w = IsoWeek::containing(sunday);
        assert_eq!(w.monday(), date(2024, 1, 1));
        assert_eq!((w.year(), w.week()), (2024, 1));
        assert_eq!(w.to_string(), "2024-W01");
    }

    #[test]
    fn weeks_between_is_inclusive() {
        let from = IsoWeek::new(2020, 52).unwrap();
        let to = IsoWeek::new(2021, 2).unwrap();
        let weeks: Vec<String> = weeks_between(from, to)
            .into_iter()
            .map(|w| w.to_string())
            .collect();
        assert_eq!(weeks, vec!["2020-W52", "2020-W53", "2021-W01", "2021-W02"]);

        assert!(weeks_between(to, from).is_empty());
    }

    #[test]
    fn last_representable_week_has_no_successor() {
        let last = IsoWeek::new(262142, 52).unwrap();
        assert_eq!(last.next(), None);
        assert_eq!(weeks_between(last, last), vec![last]);

        let before = IsoWeek::new(262142, 51).unwrap();
        assert_eq!(before.next(), Some(last));
        assert_eq!(weeks_between(before, last), vec![before, last]);
    }

    #[test]
    fn semesters_group_consecutive_weeks() {
        let from = IsoWeek::containing(date(2023, 9, 18));
        let to = IsoWeek::containing(date(2023, 10, 9));
        let groups = group_by_semester(&weeks_between(from, to));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Semester::Summer(2023));
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, Semester::Winter(2023));
        assert_eq!(groups[1].0.to_string(), "Winter 2023/24");

        let march = IsoWeek::containing(date(2024, 3, 11));
        assert_eq!(Semester::of(march), Semester::Winter(2023));
    }
}
