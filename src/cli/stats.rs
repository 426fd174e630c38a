//! `clauderock manage stats`.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use super::context::AppContext;
use crate::error::{ClauderockError, Result};
use crate::pricing::estimate_cost_per_launch;
use crate::usage::{
    export_csv, longest_sessions, month_range, week_range, SessionRecord, UsageFilter,
    UsageSummary,
};

const DETAILED_SESSIONS: usize = 5;

#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: Option<StatsCommands>,
    /// Only sessions of this profile
    #[arg(long)]
    pub profile: Option<String>,
    /// Only sessions whose main model has this friendly name
    #[arg(long)]
    pub model: Option<String>,
    /// Only sessions started on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,
    /// Only sessions started on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,
    /// Only sessions of this month (YYYY-MM)
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub month: Option<String>,
    /// Only today's sessions
    #[arg(long, conflicts_with_all = ["since", "until", "month", "week"])]
    pub today: bool,
    /// Only sessions since Monday of this week
    #[arg(long, conflicts_with_all = ["since", "until", "month"])]
    pub week: bool,
    /// Also list the longest sessions and cost per model
    #[arg(long)]
    pub detailed: bool,
    /// Write matching sessions to a CSV file instead of printing a summary
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Delete all recorded sessions
    Reset {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },
}

pub fn handle(ctx: &AppContext, args: StatsArgs) -> Result<()> {
    let sink = ctx.usage_sink();
    if let Some(StatsCommands::Reset { yes }) = args.command {
        if !yes {
            return Err(ClauderockError::InvalidArgument(
                "this deletes all usage history; re-run with --yes to confirm".into(),
            ));
        }
        sink.reset()?;
        println!("Usage history cleared");
        return Ok(());
    }

    let filter = filter_from(&args, Utc::now().date_naive())?;
    let records = sink.read_all()?;

    if let Some(path) = &args.export {
        let file = BufWriter::new(File::create(path)?);
        let rows = export_csv(&records, &filter, file)?;
        tracing::debug!(rows, path = %path.display(), "exported usage");
        println!("Exported to {}", path.display());
        return Ok(());
    }

    let summary = UsageSummary::from_records(&records, &filter);
    print!("{}", render_summary(&summary, &filter));
    if args.detailed && summary.total_sessions > 0 {
        print!("{}", render_details(&records, &filter, &summary));
    }
    Ok(())
}

/// `today` anchors the `--today` and `--week` windows (UTC, like recorded start times).
fn filter_from(args: &StatsArgs, today: NaiveDate) -> Result<UsageFilter> {
    let filter = UsageFilter {
        profile: args.profile.clone(),
        model: args.model.clone(),
        ..UsageFilter::default()
    };
    if args.today {
        return Ok(filter.with_range(today, today));
    }
    if args.week {
        let (monday, today) = week_range(today);
        return Ok(filter.with_range(monday, today));
    }
    if let Some(month) = &args.month {
        let (first, last) = month_range(month)?;
        return Ok(filter.with_range(first, last));
    }
    Ok(UsageFilter {
        since: parse_date(args.since.as_deref(), "since")?,
        until: parse_date(args.until.as_deref(), "until")?,
        ..filter
    })
}

fn parse_date(raw: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    raw.map(|raw| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ClauderockError::InvalidArgument(format!(
                "invalid {flag} date '{raw}', use YYYY-MM-DD"
            ))
        })
    })
    .transpose()
}

fn period_label(filter: &UsageFilter) -> String {
    match (filter.since, filter.until) {
        (Some(since), Some(until)) => format!("{since} to {until}"),
        (Some(since), None) => format!("Since {since}"),
        (None, Some(until)) => format!("Until {until}"),
        (None, None) => "All Time".to_string(),
    }
}

fn render_summary(summary: &UsageSummary, filter: &UsageFilter) -> String {
    let period = period_label(filter);
    let mut out = format!("Session Statistics ({period})\n\n");
    if summary.total_sessions == 0 {
        out.push_str("No sessions found matching the criteria.\n");
        return out;
    }

    out.push_str(&format!("  Sessions:        {}\n", summary.total_sessions));
    out.push_str(&format!("  Total time:      {:.1} h\n", summary.total_hours));
    out.push_str(&format!("  Average session: {:.1} min\n", summary.avg_session_minutes));
    if summary.validation_kills > 0 {
        out.push_str(&format!("  Stopped by validation: {}\n", summary.validation_kills));
    }
    out.push_str(&format!("  Estimated cost:  ${:.2}\n", summary.estimated_cost));

    out.push_str("\nBy model:\n");
    for (model, count) in &summary.by_model {
        out.push_str(&format!("  {model}: {count}\n"));
    }
    out.push_str("\nBy profile:\n");
    for (profile, count) in &summary.by_profile {
        out.push_str(&format!("  {profile}: {count}\n"));
    }
    out
}

fn render_details(records: &[SessionRecord], filter: &UsageFilter, summary: &UsageSummary) -> String {
    let mut out = String::from("\nLongest sessions:\n");
    for record in longest_sessions(records, filter, DETAILED_SESSIONS) {
        out.push_str(&format!(
            "  {}  {:>6.1} min  {}  ({})\n",
            record.started_at.format("%Y-%m-%d %H:%M"),
            record.duration_secs as f64 / 60.0,
            record.main_model(),
            record.profile,
        ));
    }
    out.push_str("\nEstimated cost by model:\n");
    for (model, count) in &summary.by_model {
        let cost = estimate_cost_per_launch(model) * *count as f64;
        out.push_str(&format!("  {model}: ${cost:.2}\n"));
    }
    out
}
