use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A recurring demand window, inclusive on both ends, expressed as month/day
/// so it applies to every year in the generation window. A window whose
/// start falls after its end wraps over the new year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalEvent {
    pub name: String,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
    pub multiplier: f64,
}

impl SeasonalEvent {
    pub fn new(name: &str, start: (u32, u32), end: (u32, u32), multiplier: f64) -> Self {
        Self {
            name: name.to_string(),
            start_month: start.0,
            start_day: start.1,
            end_month: end.0,
            end_day: end.1,
            multiplier,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let key = date.month() * 100 + date.day();
        let from = self.start_month * 100 + self.start_day;
        let to = self.end_month * 100 + self.end_day;
        if from <= to {
            key >= from && key <= to
        } else {
            key >= from || key <= to
        }
    }
}

/// Ordered list of events; the first event containing a date decides its
/// multiplier, days outside every event weigh 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonalCalendar {
    pub events: Vec<SeasonalEvent>,
}

impl SeasonalCalendar {
    pub fn event_for(&self, date: NaiveDate) -> Option<&SeasonalEvent> {
        self.events.iter().find(|e| e.contains(date))
    }

    pub fn multiplier(&self, date: NaiveDate) -> f64 {
        self.event_for(date).map(|e| e.multiplier).unwrap_or(1.0)
    }
}

impl Default for SeasonalCalendar {
    fn default() -> Self {
        Self {
            events: vec![
                SeasonalEvent::new("Black Friday / Cyber Monday", (11, 20), (11, 30), 2.5),
                SeasonalEvent::new("Holiday shopping", (12, 1), (12, 24), 2.2),
                SeasonalEvent::new("Valentine's week", (2, 7), (2, 14), 1.6),
                SeasonalEvent::new("Mother's Day", (5, 1), (5, 14), 1.5),
                SeasonalEvent::new("Back to school", (8, 1), (9, 30), 1.2),
                SeasonalEvent::new("January sales", (1, 1), (1, 31), 1.15),
                SeasonalEvent::new("July sales", (7, 1), (7, 31), 1.15),
                SeasonalEvent::new("Summer lull", (6, 1), (6, 30), 0.85),
            ],
        }
    }
}
