use super::error::GenerateError;
use crate::catalog::ReferenceTables;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Checks that a weight table is non-empty, has only finite non-negative
/// weights, and does not sum to zero.
pub fn check_weights(
    table: &'static str,
    weights: impl Iterator<Item = f64>,
) -> Result<(), GenerateError> {
    let mut count = 0usize;
    let mut total = 0.0f64;
    for w in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(GenerateError::InvalidWeights {
                table,
                reason: format!("weight {} is negative or not finite", w),
            });
        }
        count += 1;
        total += w;
    }
    if count == 0 {
        return Err(GenerateError::EmptyTable(table));
    }
    if total <= 0.0 {
        return Err(GenerateError::InvalidWeights {
            table,
            reason: "all weights are zero".to_string(),
        });
    }
    Ok(())
}

fn weighted_index(
    table: &'static str,
    weights: impl Iterator<Item = f64>,
) -> Result<WeightedIndex<f64>, GenerateError> {
    let weights: Vec<f64> = weights.collect();
    check_weights(table, weights.iter().copied())?;
    WeightedIndex::new(weights).map_err(|e| GenerateError::InvalidWeights {
        table,
        reason: e.to_string(),
    })
}

/// Weighted choice over a borrowed slice (cumulative weights + binary
/// search inside `WeightedIndex`).
pub struct WeightedTable<'a, T> {
    items: &'a [T],
    index: WeightedIndex<f64>,
}

impl<'a, T> WeightedTable<'a, T> {
    pub fn new<F>(table: &'static str, items: &'a [T], weight: F) -> Result<Self, GenerateError>
    where
        F: Fn(&T) -> f64,
    {
        let index = weighted_index(table, items.iter().map(weight))?;
        Ok(Self { items, index })
    }

    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a T {
        &self.items[self.sample_index(rng)]
    }
}

/// Relative demand for one calendar day: seasonal multiplier times
/// day-of-week multiplier.
pub fn day_weight(tables: &ReferenceTables, date: NaiveDate) -> f64 {
    let dow = date.weekday().num_days_from_monday() as usize;
    tables.calendar.multiplier(date) * tables.weekday_multipliers[dow]
}

/// Draws order timestamps from `[start, end)`: a day bucket by seasonal
/// weight, an hour by the hour table, then a uniform minute and second.
pub struct TimestampSampler {
    days: Vec<NaiveDate>,
    day_index: WeightedIndex<f64>,
    hour_index: WeightedIndex<f64>,
}

impl TimestampSampler {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        tables: &ReferenceTables,
    ) -> Result<Self, GenerateError> {
        if start >= end {
            return Err(GenerateError::EmptyWindow { start, end });
        }
        let days: Vec<NaiveDate> = start.iter_days().take_while(|d| *d < end).collect();
        let day_index = weighted_index("calendar", days.iter().map(|d| day_weight(tables, *d)))?;
        let hour_index = weighted_index("hour_weights", tables.hour_weights.iter().copied())?;
        Ok(Self {
            days,
            day_index,
            hour_index,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> NaiveDateTime {
        let day = self.days[self.day_index.sample(rng)];
        let hour = self.hour_index.sample(rng) as i64;
        let minute: i64 = rng.gen_range(0..60);
        let second: i64 = rng.gen_range(0..60);
        day.and_time(NaiveTime::default())
            + Duration::seconds(hour * 3600 + minute * 60 + second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn check_weights_reports_problems() {
        assert_eq!(
            check_weights("t", std::iter::empty()),
            Err(GenerateError::EmptyTable("t"))
        );
        assert!(matches!(
            check_weights("t", [0.0, 0.0].into_iter()),
            Err(GenerateError::InvalidWeights { table: "t", .. })
        ));
        assert!(matches!(
            check_weights("t", [1.0, f64::NAN].into_iter()),
            Err(GenerateError::InvalidWeights { .. })
        ));
        assert!(check_weights("t", [0.0, 2.0].into_iter()).is_ok());
    }

    #[test]
    fn weighted_table_never_picks_zero_weight() {
        let items = ["never", "always"];
        let table = WeightedTable::new("t", &items, |s| if *s == "never" { 0.0 } else { 1.0 })
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            assert_eq!(*table.sample(&mut rng), "always");
        }
    }

    #[test]
    fn weighted_table_follows_weights() {
        let items = [1u8, 2u8];
        let table = WeightedTable::new("t", &items, |v| if *v == 1 { 3.0 } else { 1.0 }).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let ones = (0..20_000).filter(|_| *table.sample(&mut rng) == 1).count();
        let share = ones as f64 / 20_000.0;
        assert!((share - 0.75).abs() < 0.02, "share was {}", share);
    }

    #[test]
    fn friday_outweighs_monday() {
        let tables = ReferenceTables::default();
        // 2025-03-03 is a Monday, 2025-03-07 a Friday; no events in early March.
        assert!(day_weight(&tables, d(2025, 3, 7)) > day_weight(&tables, d(2025, 3, 3)));
    }

    #[test]
    fn timestamps_stay_inside_window() {
        let tables = ReferenceTables::default();
        let start = d(2024, 7, 1);
        let end = d(2024, 7, 3);
        let sampler = TimestampSampler::new(start, end, &tables).unwrap();
        assert_eq!(sampler.days, vec![start, d(2024, 7, 2)]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..2_000 {
            let ts = sampler.sample(&mut rng);
            assert!(ts.date() >= start && ts.date() < end, "{}", ts);
        }
    }

    #[test]
    fn zero_calendar_is_rejected() {
        let mut tables = ReferenceTables::default();
        tables.weekday_multipliers = [0.0; 7];
        let err = TimestampSampler::new(d(2024, 7, 1), d(2024, 7, 8), &tables)
            .err()
            .unwrap();
        assert!(matches!(err, GenerateError::InvalidWeights { table: "calendar", .. }));
    }
}
