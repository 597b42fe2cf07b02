//! Forecast windowing and per-day aggregation.
//!
//! Both functions are pure: they never touch the network or the clock, so the
//! caller passes in "today".

use chrono::{Days, NaiveDate};

use crate::model::{DailyAggregate, RawForecastEntry};

/// Returns the leading entries dated strictly before `today + forecast_days`.
///
/// Ordering is trusted from the provider; the first entry on or past the
/// boundary ends the window. An entry stamped exactly at midnight of the
/// boundary date is excluded.
pub fn window(
    entries: &[RawForecastEntry],
    today: NaiveDate,
    forecast_days: u32,
) -> &[RawForecastEntry] {
    let Some(boundary) = today.checked_add_days(Days::new(u64::from(forecast_days))) else {
        return entries;
    };

    let end = entries.iter().position(|e| e.date() >= boundary).unwrap_or(entries.len());
    &entries[..end]
}

/// Buckets entries by calendar date and summarises each bucket.
///
/// Output follows the order in which each date first appears. Callers that need
/// chronological order should sort by `date`.
pub fn daily(entries: &[RawForecastEntry]) -> Vec<DailyAggregate> {
    let mut groups: Vec<DayAccumulator<'_>> = Vec::new();

    for entry in entries {
        let date = entry.date();
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.push(entry),
            None => groups.push(DayAccumulator::new(entry)),
        }
    }

    groups.into_iter().map(DayAccumulator::finish).collect()
}

struct DayAccumulator<'a> {
    date: NaiveDate,
    temp_min: f64,
    temp_max: f64,
    humidity_sum: f64,
    wind_sum: f64,
    count: usize,
    descriptions: Tally<'a>,
    icons: Tally<'a>,
}

impl<'a> DayAccumulator<'a> {
    fn new(first: &'a RawForecastEntry) -> Self {
        let mut acc = Self {
            date: first.date(),
            temp_min: f64::INFINITY,
            temp_max: f64::NEG_INFINITY,
            humidity_sum: 0.0,
            wind_sum: 0.0,
            count: 0,
            descriptions: Tally::default(),
            icons: Tally::default(),
        };
        acc.push(first);
        acc
    }

    fn push(&mut self, entry: &'a RawForecastEntry) {
        self.temp_min = self.temp_min.min(entry.temp_min_c);
        self.temp_max = self.temp_max.max(entry.temp_max_c);
        self.humidity_sum += f64::from(entry.humidity_pct);
        self.wind_sum += entry.wind_speed_mps;
        self.count += 1;
        self.descriptions.add(&entry.description);
        self.icons.add(&entry.icon);
    }

    fn finish(self) -> DailyAggregate {
        // count >= 1: a group only exists once an entry was pushed into it
        let n = self.count as f64;
        DailyAggregate {
            date: self.date,
            temp_min_c: self.temp_min,
            temp_max_c: self.temp_max,
            humidity_pct: self.humidity_sum / n,
            wind_speed_mps: self.wind_sum / n,
            description: self.descriptions.mode().to_string(),
            icon: self.icons.mode().to_string(),
        }
    }
}

/// Frequency counter that remembers first-seen order.
#[derive(Default)]
struct Tally<'a> {
    counts: Vec<(&'a str, usize)>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, value: &'a str) {
        match self.counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((value, 1)),
        }
    }

    /// Most frequent value; ties go to the one seen first.
    fn mode(&self) -> &'a str {
        let mut best: Option<(&'a str, usize)> = None;
        for &(value, n) in &self.counts {
            if best.is_none_or(|(_, top)| n > top) {
                best = Some((value, n));
            }
        }
        best.map(|(v, _)| v).unwrap_or_default()
    }
}
