//! Analytics and alerts commands

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::client::ListFlags;
use crate::insights::{AnalyticsSnapshot, DataQuality, DismissedAlerts};
use crate::sync::engine::records_key;
use crate::models::{AlertDisplay, HarvestDisplay, OverdueDisplay};
use crate::output::{Formattable, json};

/// One line of the analytics summary table
#[derive(Tabled, Serialize)]
struct MetricRow {
    #[tabled(rename = "METRIC")]
    metric: String,

    #[tabled(rename = "VALUE")]
    value: String,
}

impl MetricRow {
    fn new(metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}

/// Run the analytics command
pub async fn analytics(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let use_cache = ctx.use_cache_for(&records_key(ctx.scope(), ListFlags::analytics()));
    let snapshot = ctx.engine.analytics(ctx.scope(), use_cache).await;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&snapshot)?),
        OutputFormat::Table => {
            summary_rows(&snapshot).print(OutputFormat::Table)?;
            if !snapshot.upcoming_harvests.is_empty() {
                upcoming_rows(&snapshot).print(OutputFormat::Table)?;
            }
            if !snapshot.overdue_stages.is_empty() {
                overdue_rows(&snapshot).print(OutputFormat::Table)?;
            }
        }
        OutputFormat::Pretty => print_pretty(&ctx, &snapshot)?,
    }

    Ok(())
}

/// Run the alerts command
pub async fn alerts(opts: &GlobalOptions, dismiss: &[String]) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let dismissed: DismissedAlerts = dismiss.iter().cloned().collect();

    let use_cache = ctx.use_cache_for(&records_key(ctx.scope(), ListFlags::default()));
    let alerts = ctx.engine.alerts(ctx.scope(), &dismissed, use_cache).await?;
    log::debug!("{} alert(s) after {} dismissal(s)", alerts.len(), dismissed.len());

    let display: Vec<AlertDisplay> = alerts.into_iter().map(AlertDisplay::from).collect();
    match ctx.format {
        OutputFormat::Pretty if display.is_empty() => {
            println!("{} No alerts", "✓".green());
        }
        OutputFormat::Pretty => {
            for alert in &display {
                let marker = match alert.priority.as_str() {
                    "critical" => "●".red(),
                    "high" => "●".yellow(),
                    "medium" => "●".cyan(),
                    _ => "●".dimmed(),
                };
                println!("{} {}  {}", marker, alert.message, alert.id.dimmed());
            }
        }
        format => display.print(format)?,
    }

    Ok(())
}

fn summary_rows(snapshot: &AnalyticsSnapshot) -> Vec<MetricRow> {
    let mut rows = vec![
        MetricRow::new("Records", snapshot.total_count),
        MetricRow::new(
            "Average growth days",
            format!("{:.1}", snapshot.average_growth_days),
        ),
        MetricRow::new(
            "Yield efficiency",
            format!("{:.1}%", snapshot.yield_efficiency_percent),
        ),
        MetricRow::new("Upcoming harvests (7d)", snapshot.upcoming_harvests.len()),
        MetricRow::new("Overdue stages", snapshot.overdue_stages.len()),
    ];
    rows.extend(
        snapshot
            .stage_distribution
            .iter()
            .map(|(stage, count)| MetricRow::new(format!("Stage: {}", stage), count)),
    );
    rows.extend(
        snapshot
            .health_distribution
            .iter()
            .map(|(health, count)| MetricRow::new(format!("Health: {}", health), count)),
    );
    rows.push(MetricRow::new("Data quality", quality_label(snapshot.quality)));
    rows
}

fn upcoming_rows(snapshot: &AnalyticsSnapshot) -> Vec<HarvestDisplay> {
    snapshot
        .upcoming_harvests
        .iter()
        .map(HarvestDisplay::from)
        .collect()
}

fn overdue_rows(snapshot: &AnalyticsSnapshot) -> Vec<OverdueDisplay> {
    snapshot
        .overdue_stages
        .iter()
        .map(OverdueDisplay::from)
        .collect()
}

fn quality_label(quality: DataQuality) -> &'static str {
    match quality {
        DataQuality::Good => "good",
        DataQuality::Insufficient => "insufficient",
        DataQuality::Error => "error",
    }
}

fn print_pretty(ctx: &CommandContext, snapshot: &AnalyticsSnapshot) -> Result<()> {
    println!("{} ({})\n", "Crop Analytics".bold(), ctx.scope());

    match snapshot.quality {
        DataQuality::Error => {
            println!("{} No data available: the API is unreachable and nothing is cached", "✗".red());
            return Ok(());
        }
        DataQuality::Insufficient => {
            println!("{} No crop stage records yet", "○".dimmed());
            return Ok(());
        }
        DataQuality::Good => {}
    }

    println!("Records:             {}", snapshot.total_count.to_string().bold());
    println!("Average growth days: {:.1}", snapshot.average_growth_days);
    println!("Yield efficiency:    {:.1}%", snapshot.yield_efficiency_percent);

    println!("\n{}", "Stages".bold());
    for (stage, count) in &snapshot.stage_distribution {
        println!("  {:<16} {}", stage, count);
    }

    println!("\n{}", "Health".bold());
    for (health, count) in &snapshot.health_distribution {
        let line = format!("  {:<16} {}", health, count);
        match health.as_str() {
            "critical" | "poor" => println!("{}", line.red()),
            "needs_attention" => println!("{}", line.yellow()),
            _ => println!("{}", line),
        }
    }

    if !snapshot.upcoming_harvests.is_empty() {
        println!("\n{}", "Upcoming harvests".bold());
        upcoming_rows(snapshot).print(OutputFormat::Table)?;
    }
    if !snapshot.overdue_stages.is_empty() {
        println!("\n{}", "Overdue stages".bold());
        overdue_rows(snapshot).print(OutputFormat::Table)?;
    }

    println!(
        "\n{}",
        format!("Computed {}", snapshot.computed_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    );
    Ok(())
}
