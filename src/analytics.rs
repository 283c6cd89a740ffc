use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Visit,
    Like,
    Download,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MonthStats {
    pub visits: u32,
    pub likes: u32,
    pub downloads: u32,
}

/// Monthly counters keyed by `YYYY-MM`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalyticsLog {
    #[serde(default)]
    pub months: BTreeMap<String, MonthStats>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MonthPoint {
    pub month: String,
    pub name: String,
    pub visits: u32,
    pub likes: u32,
    pub downloads: u32,
}

fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// `(year, month)` stepped back `offset` months from the given one.
fn months_back(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - offset as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

impl AnalyticsLog {
    pub fn record(&mut self, event: Event, at: DateTime<Utc>) {
        let stats = self
            .months
            .entry(month_key(at.year(), at.month()))
            .or_default();
        match event {
            Event::Visit => stats.visits += 1,
            Event::Like => stats.likes += 1,
            Event::Download => stats.downloads += 1,
        }
    }

    /// The `count` months ending with `now`'s month, oldest first; gaps read as zero.
    pub fn series(&self, now: DateTime<Utc>, count: u32) -> Vec<MonthPoint> {
        (0..count)
            .rev()
            .map(|offset| {
                let (year, month) = months_back(now.year(), now.month(), offset);
                let key = month_key(year, month);
                let stats = self.months.get(&key).cloned().unwrap_or_default();
                let name = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|date| date.format("%b").to_string())
                    .unwrap_or_default();
                MonthPoint {
                    month: key,
                    name,
                    visits: stats.visits,
                    likes: stats.likes,
                    downloads: stats.downloads,
                }
            })
            .collect()
    }

    pub fn totals(&self) -> MonthStats {
        self.months
            .values()
            .fold(MonthStats::default(), |mut total, month| {
                total.visits += month.visits;
                total.likes += month.likes;
                total.downloads += month.downloads;
                total
            })
    }
}
