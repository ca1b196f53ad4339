use crate::error::DagError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// A half-open window `[start, end)` of data a single run is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl fmt::Display for DataInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// When a DAG runs.
///
/// Runs are laid out back to back from `start_date`, one per `interval`.
/// The run for an interval becomes due once that interval has ended.
/// `catchup` decides what happens to intervals that ended while nothing
/// was running: with it every missed interval is run in order, without it
/// only the most recent one is.
///
/// All boundary arithmetic is done in whole nanoseconds, so interval `k`
/// ends exactly where interval `k + 1` starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    #[serde(rename = "interval_secs", serialize_with = "super::duration_secs::serialize")]
    interval: Duration,
    #[serde(skip)]
    step_nanos: i64,
    start_date: DateTime<Utc>,
    catchup: bool,
}

impl Schedule {
    /// Creates a schedule starting at `start_date` with one run per `interval`.
    ///
    /// # Arguments
    /// * `interval`: Length of each data interval
    /// * `start_date`: Start of the first data interval
    /// * `catchup`: Whether missed intervals are all run or only the latest one
    ///
    /// # Errors
    /// * [`DagError::NonPositiveInterval`] if `interval` is zero or negative
    /// * [`DagError::IntervalTooLong`] if `interval` does not fit in `i64` nanoseconds
    ///   (roughly 292 years)
    pub fn new(
        interval: Duration,
        start_date: DateTime<Utc>,
        catchup: bool,
    ) -> Result<Self, DagError> {
        if interval <= Duration::zero() {
            return Err(DagError::NonPositiveInterval(interval.to_string()));
        }
        let step_nanos = interval
            .num_nanoseconds()
            .ok_or_else(|| DagError::IntervalTooLong(interval.to_string()))?;

        Ok(Self {
            interval,
            step_nanos,
            start_date,
            catchup,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn catchup(&self) -> bool {
        self.catchup
    }

    /// Returns the data interval with the given index, counted from `start_date`.
    ///
    /// `None` when a boundary falls outside the range of `DateTime<Utc>`.
    pub fn interval_at(&self, index: i64) -> Option<DataInterval> {
        Some(DataInterval {
            start: self.boundary(index)?,
            end: self.boundary(index.checked_add(1)?)?,
        })
    }

    /// Lazily yields the runs that should be started at `now`, oldest first.
    ///
    /// `last_run_end` is the end of the most recent interval that already ran,
    /// if any. With `catchup` on, a short interval and an old start date can
    /// make this very long; callers bound it with `take`.
    pub fn due_runs(
        &self,
        last_run_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = DataInterval> + '_ {
        let (first, end) = self.due_range(last_run_end, now);
        (first..end).map_while(move |i| self.interval_at(i))
    }

    /// How many runs [`due_runs`](Self::due_runs) would yield.
    pub fn due_count(&self, last_run_end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
        let (first, end) = self.due_range(last_run_end, now);
        end.abs_diff(first)
    }

    /// The first interval that has not ended yet at `now`.
    pub fn next_interval(&self, now: DateTime<Utc>) -> Option<DataInterval> {
        self.interval_at(self.completed_by(now))
    }

    // Index range of due intervals, empty when nothing is due.
    fn due_range(&self, last_run_end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (i64, i64) {
        let completed = self.completed_by(now);
        let first = last_run_end.map_or(0, |end| self.completed_by(end));
        if first >= completed {
            (0, 0)
        } else if self.catchup {
            (first, completed)
        } else {
            (completed - 1, completed)
        }
    }

    fn boundary(&self, index: i64) -> Option<DateTime<Utc>> {
        let offset = self.step_nanos.checked_mul(index)?;
        self.start_date.checked_add_signed(Duration::nanoseconds(offset))
    }

    // Number of intervals whose end is at or before `at`.
    fn completed_by(&self, at: DateTime<Utc>) -> i64 {
        if at < self.start_date {
            return 0;
        }
        let elapsed = at - self.start_date;
        let elapsed_nanos =
            i128::from(elapsed.num_seconds()) * 1_000_000_000 + i128::from(elapsed.subsec_nanos());
        let completed = elapsed_nanos / i128::from(self.step_nanos);
        i64::try_from(completed).unwrap_or(i64::MAX)
    }
}

/// Midnight UTC of the given calendar day.
///
/// # Errors
/// [`DagError::InvalidStartDate`] if the day does not exist.
pub fn utc_midnight(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, DagError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DagError::InvalidStartDate(format!("{:04}-{:02}-{:02}", year, month, day)))
}
