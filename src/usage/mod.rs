//! Session usage tracking.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClauderockError, Result};
use crate::models::profile_id::to_friendly_name;
use crate::pricing::estimate_cost_per_launch;

/// One finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub profile: String,
    /// Model identifiers the session ran with, main model first.
    pub identifiers: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// `exited` or `validation-killed`.
    pub ended_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
}

impl SessionRecord {
    pub fn new(
        profile: &str,
        identifiers: Vec<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        exit_code: Option<i32>,
        ended_by: &str,
    ) -> Self {
        Self {
            profile: profile.to_string(),
            identifiers,
            started_at,
            ended_at,
            duration_secs: (ended_at - started_at).num_seconds().max(0),
            exit_code,
            ended_by: ended_by.to_string(),
            working_directory: std::env::current_dir().ok(),
        }
    }

    /// Friendly name of the main model.
    pub fn main_model(&self) -> String {
        self.identifiers
            .first()
            .map(|id| to_friendly_name(id))
            .unwrap_or_default()
    }
}

/// Receives finished sessions. Failures are reported but never fail a launch.
pub trait UsageSink: Send + Sync {
    fn record_session(&self, record: &SessionRecord) -> Result<()>;
}

/// Appends one JSON object per line.
#[derive(Debug)]
pub struct JsonlUsageSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlUsageSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every readable record in the log. Malformed lines are skipped.
    pub fn read_all(&self) -> Result<Vec<SessionRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ClauderockError::Io(err)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(line = index + 1, error = %err, "skipping malformed usage record"),
            }
        }
        Ok(records)
    }

    /// Delete the log.
    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ClauderockError::Io(err)),
        }
    }
}

impl UsageSink for JsonlUsageSink {
    fn record_session(&self, record: &SessionRecord) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClauderockError::Configuration("usage log lock poisoned".into()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}

/// Which records a summary covers.
#[derive(Debug, Clone, Default)]
pub struct UsageFilter {
    pub profile: Option<String>,
    /// Friendly main-model name.
    pub model: Option<String>,
    /// First included day (UTC start date).
    pub since: Option<NaiveDate>,
    /// Last included day.
    pub until: Option<NaiveDate>,
}

impl UsageFilter {
    pub fn matches(&self, record: &SessionRecord) -> bool {
        if let Some(profile) = &self.profile {
            if &record.profile != profile {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if &record.main_model() != model {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.started_at.date_naive() < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.started_at.date_naive() > until {
                return false;
            }
        }
        true
    }

    pub fn with_range(mut self, since: NaiveDate, until: NaiveDate) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }
}

/// Monday of the week containing `today`, through `today`.
pub fn week_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(today.weekday().num_days_from_monday());
    let monday = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
    (monday, today)
}

/// First through last day of a `YYYY-MM` month.
pub fn month_range(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || ClauderockError::InvalidArgument("invalid month format, use YYYY-MM".into());
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

/// Matching records, longest first.
pub fn longest_sessions<'a>(
    records: &'a [SessionRecord],
    filter: &UsageFilter,
    limit: usize,
) -> Vec<&'a SessionRecord> {
    let mut matching: Vec<_> = records.iter().filter(|r| filter.matches(r)).collect();
    matching.sort_by(|a, b| b.duration_secs.cmp(&a.duration_secs));
    matching.truncate(limit);
    matching
}

const CSV_HEADER: &str = "Start Time,Duration (min),Profile Name,Model,Exit Code,Ended By,Estimated Cost";

/// Matching records as CSV, one row per session.
pub fn export_csv<'a>(
    records: impl IntoIterator<Item = &'a SessionRecord>,
    filter: &UsageFilter,
    mut out: impl Write,
) -> Result<usize> {
    writeln!(out, "{CSV_HEADER}")?;
    let mut rows = 0;
    for record in records.into_iter().filter(|r| filter.matches(r)) {
        let model = record.main_model();
        let exit_code = record.exit_code.map(|c| c.to_string()).unwrap_or_default();
        writeln!(
            out,
            "{},{:.1},{},{},{},{},{:.4}",
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            record.duration_secs as f64 / 60.0,
            csv_field(&record.profile),
            csv_field(&model),
            exit_code,
            csv_field(&record.ended_by),
            estimate_cost_per_launch(&model),
        )?;
        rows += 1;
    }
    out.flush()?;
    Ok(rows)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Aggregate statistics over recorded sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSummary {
    pub total_sessions: usize,
    pub total_hours: f64,
    pub avg_session_minutes: f64,
    /// Sessions per friendly main-model name.
    pub by_model: BTreeMap<String, usize>,
    pub by_profile: BTreeMap<String, usize>,
    pub validation_kills: usize,
    /// Rough cost from per-launch averages.
    pub estimated_cost: f64,
}

impl UsageSummary {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a SessionRecord>,
        filter: &UsageFilter,
    ) -> Self {
        let mut summary = Self::default();
        let mut total_secs: i64 = 0;
        for record in records.into_iter().filter(|r| filter.matches(r)) {
            summary.total_sessions += 1;
            total_secs += record.duration_secs;
            let model = record.main_model();
            summary.estimated_cost += estimate_cost_per_launch(&model);
            *summary.by_model.entry(model).or_default() += 1;
            *summary
                .by_profile
                .entry(record.profile.clone())
                .or_default() += 1;
            if record.ended_by == "validation-killed" {
                summary.validation_kills += 1;
            }
        }
        if summary.total_sessions > 0 {
            summary.total_hours = total_secs as f64 / 3600.0;
            summary.avg_session_minutes =
                total_secs as f64 / 60.0 / summary.total_sessions as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    const SONNET: &str = "global.anthropic.claude-sonnet-4-5-20250929-v1:0";

    fn record(profile: &str, model: &str, minutes: i64) -> SessionRecord {
        let start = Utc.with_ymd_and_hms(2025, 10, 20, 9, 0, 0).unwrap();
        SessionRecord::new(
            profile,
            vec![model.to_string()],
            start,
            start + Duration::minutes(minutes),
            Some(0),
            "exited",
        )
    }

    #[test]
    fn jsonl_sink_appends_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlUsageSink::new(dir.path().join("nested/usage.jsonl"));
        sink.record_session(&record("default", SONNET, 30)).unwrap();
        sink.record_session(&record("work", SONNET, 90)).unwrap();

        let records = sink.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].profile, "work");
        assert_eq!(records[1].duration_secs, 90 * 60);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlUsageSink::new(dir.path().join("usage.jsonl"));
        sink.record_session(&record("default", SONNET, 1)).unwrap();
        let mut file = OpenOptions::new().append(true).open(sink.path()).unwrap();
        writeln!(file, "not json").unwrap();
        assert_eq!(sink.read_all().unwrap().len(), 1);

        sink.reset().unwrap();
        assert!(sink.read_all().unwrap().is_empty());
    }

    #[test]
    fn summary_aggregates_by_model_and_profile() {
        let records = vec![
            record("default", SONNET, 30),
            record("work", SONNET, 90),
            record("work", "us.meta.llama3-2-90b-instruct-v1:0", 60),
        ];
        let summary = UsageSummary::from_records(&records, &UsageFilter::default());
        assert_eq!(summary.total_sessions, 3);
        assert!((summary.total_hours - 3.0).abs() < 1e-9);
        assert!((summary.avg_session_minutes - 60.0).abs() < 1e-9);
        assert_eq!(summary.by_model["anthropic.claude-sonnet-4-5"], 2);
        assert_eq!(summary.by_profile["work"], 2);
        assert!(summary.estimated_cost > 0.0);
    }

    #[test]
    fn filter_limits_records() {
        let records = vec![record("default", SONNET, 30), record("work", SONNET, 90)];
        let filter = UsageFilter {
            profile: Some("work".into()),
            ..UsageFilter::default()
        };
        let summary = UsageSummary::from_records(&records, &filter);
        assert_eq!(summary.total_sessions, 1);

        let later = UsageFilter {
            since: NaiveDate::from_ymd_opt(2025, 11, 1),
            ..UsageFilter::default()
        };
        assert_eq!(UsageSummary::from_records(&records, &later).total_sessions, 0);

        let earlier = UsageFilter {
            until: NaiveDate::from_ymd_opt(2025, 10, 19),
            ..UsageFilter::default()
        };
        assert_eq!(UsageSummary::from_records(&records, &earlier).total_sessions, 0);

        // Both bounds are inclusive.
        let day = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let same_day = UsageFilter::default().with_range(day, day);
        assert_eq!(UsageSummary::from_records(&records, &same_day).total_sessions, 2);
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_range_covers_whole_month() {
        assert_eq!(month_range("2025-10").unwrap(), (ymd(2025, 10, 1), ymd(2025, 10, 31)));
        assert_eq!(month_range("2025-12").unwrap(), (ymd(2025, 12, 1), ymd(2025, 12, 31)));
        assert_eq!(month_range("2024-02").unwrap(), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(month_range("2025-02").unwrap(), (ymd(2025, 2, 1), ymd(2025, 2, 28)));

        for bad in ["2025-13", "October", "2025/10", ""] {
            let err = month_range(bad).unwrap_err();
            assert!(err.to_string().contains("use YYYY-MM"), "{bad}");
        }
    }

    #[test]
    fn week_range_starts_on_monday() {
        // 2025-10-20 is a Monday, 2025-10-26 a Sunday.
        assert_eq!(week_range(ymd(2025, 10, 20)), (ymd(2025, 10, 20), ymd(2025, 10, 20)));
        assert_eq!(week_range(ymd(2025, 10, 23)), (ymd(2025, 10, 20), ymd(2025, 10, 23)));
        assert_eq!(week_range(ymd(2025, 10, 26)), (ymd(2025, 10, 20), ymd(2025, 10, 26)));
        // Crosses a month boundary.
        assert_eq!(week_range(ymd(2025, 11, 1)), (ymd(2025, 10, 27), ymd(2025, 11, 1)));
    }

    #[test]
    fn longest_sessions_sorts_and_limits() {
        let records = vec![
            record("a", SONNET, 10),
            record("b", SONNET, 90),
            record("c", SONNET, 45),
        ];
        let top = longest_sessions(&records, &UsageFilter::default(), 2);
        let profiles: Vec<_> = top.iter().map(|r| r.profile.as_str()).collect();
        assert_eq!(profiles, vec!["b", "c"]);
    }

    #[test]
    fn csv_export_writes_header_and_quoted_rows() {
        let mut killed = record("client, inc", SONNET, 90);
        killed.exit_code = None;
        killed.ended_by = "validation-killed".into();
        let records = vec![record("default", SONNET, 30), killed];

        let mut buf = Vec::new();
        let rows = export_csv(&records, &UsageFilter::default(), &mut buf).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("2025-10-20 09:00:00,30.0,default,anthropic.claude-sonnet-4-5,0,exited,"));
        assert!(lines[2].starts_with("2025-10-20 09:00:00,90.0,\"client, inc\",anthropic.claude-sonnet-4-5,,validation-killed,"));
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
