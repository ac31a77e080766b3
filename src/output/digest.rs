//! Weekly and monthly digest of published books
//!
//! The digest lists books whose publication date falls in the current
//! week (Monday to Sunday) and, separately, the rest of the current month.

use crate::storage::{BookRecord, IngestionStore};
use crate::Result;
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// An inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The Monday-to-Sunday week containing `day`
    pub fn week_of(day: NaiveDate) -> Self {
        let start = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// The calendar month containing `day`
    pub fn month_of(day: NaiveDate) -> Self {
        let start = day.with_day(1).unwrap_or(day);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }
}

/// Books to report, split by window
#[derive(Debug, Clone)]
pub struct Digest {
    pub week: DateWindow,
    pub month: DateWindow,

    /// Published this week
    pub weekly: Vec<BookRecord>,

    /// Published this month, outside this week
    pub monthly: Vec<BookRecord>,
}

/// Queries the store for the books to report as of `today`
pub fn compose_digest(storage: &dyn IngestionStore, today: NaiveDate) -> Result<Digest> {
    let week = DateWindow::week_of(today);
    let month = DateWindow::month_of(today);

    let weekly = storage.books_in_range(week.start, week.end)?;
    let weekly_ids: HashSet<i64> = weekly.iter().map(|book| book.id).collect();

    let monthly = storage
        .books_in_range(month.start, month.end)?
        .into_iter()
        .filter(|book| !weekly_ids.contains(&book.id))
        .collect();

    Ok(Digest {
        week,
        month,
        weekly,
        monthly,
    })
}

/// Formats a digest as markdown
pub fn format_digest(digest: &Digest) -> String {
    let mut md = String::new();

    md.push_str("# News from your bookshops\n\n");

    md.push_str(&format!(
        "## Published this week ({} to {})\n\n",
        digest.week.start, digest.week.end
    ));
    push_books(&mut md, &digest.weekly, "No new books or editions this week.");

    md.push_str(&format!(
        "## Also published this month ({} to {})\n\n",
        digest.month.start, digest.month.end
    ));
    push_books(&mut md, &digest.monthly, "No other new books or editions this month.");

    md
}

fn push_books(md: &mut String, books: &[BookRecord], empty_line: &str) {
    if books.is_empty() {
        md.push_str(empty_line);
        md.push_str("\n\n");
        return;
    }

    for book in books {
        md.push_str(&format!(
            "- {} by {} ({})\n",
            book.title.as_deref().unwrap_or("Untitled"),
            book.author.as_deref().unwrap_or("unknown author"),
            book.publication_date.as_deref().unwrap_or("date unknown")
        ));
    }
    md.push('\n');
}

/// Writes the formatted digest to `output_path`, or stdout when `None`
pub fn write_digest(digest: &Digest, output_path: Option<&Path>) -> Result<()> {
    let markdown = format_digest(digest);

    match output_path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(markdown.as_bytes())?;
            tracing::info!("Digest written to {}", path.display());
        }
        None => print!("{}", markdown),
    }

    Ok(())
}
