//! Calendar-month query windows
//!
//! The portal's search endpoint is scoped by a date range, so each run walks a
//! fixed number of whole calendar months ending at the current one.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};

/// Format the portal expects on each side of the range
const PORTAL_DATE_FORMAT: &str = "%m/%d/%Y";

/// One calendar month, first day through last day inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Window covering the month that contains `day`
    pub fn month_of(day: NaiveDate) -> Option<Self> {
        let start = day.with_day(1)?;
        let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self { start, end })
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Portal display string, e.g. `01/01/2024 - 01/31/2024`
    pub fn filter_label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format(PORTAL_DATE_FORMAT),
            self.end.format(PORTAL_DATE_FORMAT)
        )
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filter_label())
    }
}

/// Plan `month_count` consecutive month windows ending at the month of `today`,
/// most recent first.
pub fn plan_windows(today: NaiveDate, month_count: u32) -> Vec<DateWindow> {
    (0..month_count)
        .filter_map(|offset| today.checked_sub_months(Months::new(offset)))
        .filter_map(DateWindow::month_of)
        .collect()
}
