//! Crop stage record commands

use std::path::Path;
use std::time::Duration;

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::{CropRecordDraft, ListFlags};
use crate::error::{ConfigError, Error, Result, SyncError};
use crate::models::{PendingDisplay, RecordDisplay};
use crate::output::{Formattable, json};
use crate::sync::engine::records_key;
use crate::sync::{FlushReport, MAX_RETRY_ATTEMPTS, MutationOutcome, MutationResult};

/// Run the records list command
pub async fn list(opts: &GlobalOptions, history: bool) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let flags = if history {
        ListFlags::history()
    } else {
        ListFlags::default()
    };

    log::debug!("Listing crop stages for {}", ctx.scope());
    let use_cache = ctx.use_cache_for(&records_key(ctx.scope(), flags));
    let fetched = ctx.engine.records(ctx.scope(), flags, use_cache).await?;

    log::debug!("Sync stats: {:?}", ctx.engine.stats());

    if fetched.is_stale() {
        eprintln!(
            "{} API unreachable, showing records cached at {}",
            "⚠".yellow(),
            fetched.stored_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    match ctx.format {
        OutputFormat::Json => {
            let display: Vec<RecordDisplay> = fetched.value.iter().map(RecordDisplay::from).collect();
            let mut output = json::JsonOutput::new(display);
            if fetched.is_stale() {
                output = output.stale_since(fetched.stored_at);
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        format => {
            let display: Vec<RecordDisplay> = fetched.value.iter().map(RecordDisplay::from).collect();
            display.print(format)?;
        }
    }

    Ok(())
}

/// Run the records create command
pub async fn create(opts: &GlobalOptions, file: &Path) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let draft = read_draft(file)?;

    let scope = ctx.scope();
    if scope.farm_id().is_none() && draft.farm.is_none() {
        return Err(ConfigError::MissingFarmId.into());
    }

    let outcome = ctx.engine.create(scope, draft).await?;
    finish(&ctx, outcome).await
}

/// Run the records update command
pub async fn update(opts: &GlobalOptions, id: u64, file: &Path) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;
    let draft = read_draft(file)?;

    let outcome = ctx.engine.update(ctx.scope(), id, draft).await?;
    finish(&ctx, outcome).await
}

/// Run the records delete command
pub async fn delete(opts: &GlobalOptions, id: u64) -> Result<()> {
    let ctx = CommandContext::new(opts).await?;

    let outcome = ctx.engine.delete(ctx.scope(), id).await?;
    finish(&ctx, outcome).await
}

/// Read a mutation payload; `.json` files are parsed as JSON, anything else as YAML.
fn read_draft(path: &Path) -> Result<CropRecordDraft> {
    let contents = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        serde_yaml::from_str(&contents)
            .map_err(|e| Error::Other(format!("Invalid record file {}: {}", path.display(), e)))
    }
}

async fn finish(ctx: &CommandContext, outcome: MutationOutcome) -> Result<()> {
    let result = match outcome {
        MutationOutcome::Applied(result) => print_result(ctx.format, &result),
        MutationOutcome::Queued { retry_id } => {
            log::debug!("Mutation queued as #{}", retry_id);
            drain(ctx).await.and_then(|results| {
                results
                    .iter()
                    .try_for_each(|result| print_result(ctx.format, result))
            })
        }
    };
    log::debug!("Sync stats: {:?}", ctx.engine.stats());
    result
}

/// Keep flushing until the queue is empty or the retry budget is spent.
///
/// The process is about to exit and queued changes do not outlive it, so
/// anything still pending afterwards is reported as an error.
async fn drain(ctx: &CommandContext) -> Result<Vec<MutationResult>> {
    let base_delay = Duration::from_secs(ctx.config.preferences.retry_delay_secs);
    let mut replayed = Vec::new();
    let mut dropped = Vec::new();

    for round in 1..=MAX_RETRY_ATTEMPTS + 1 {
        if ctx.engine.pending().is_empty() {
            break;
        }
        let delay = next_delay(base_delay, ctx.engine.retry_after());
        log::debug!("Drain round {}: waiting {:?}", round, delay);
        tokio::time::sleep(delay).await;

        let report = match ctx.reprobe().await {
            Some(report) => Some(report),
            None if ctx.engine.monitor().is_online() => Some(ctx.engine.flush().await),
            None => None,
        };

        match report {
            Some(FlushReport {
                replayed: done,
                dropped: failed,
                remaining,
                status,
            }) => {
                log::debug!("Drain round {}: {:?}, {} remaining", round, status, remaining);
                replayed.extend(done.into_iter().map(|r| r.result));
                dropped.extend(failed);
            }
            None => log::debug!("Drain round {}: still offline", round),
        }
    }

    let remaining = ctx.engine.pending();
    if !remaining.is_empty() {
        if ctx.format != OutputFormat::Json {
            let display: Vec<PendingDisplay> = remaining.iter().cloned().map(PendingDisplay::from).collect();
            eprintln!("{}", display.format(OutputFormat::Table)?);
        }
        return Err(SyncError::Unsynced(remaining.len()).into());
    }
    if let Some(err) = dropped.into_iter().next() {
        return Err(err.into());
    }
    Ok(replayed)
}

/// Configured pause, stretched to what a rate-limited API asked for.
fn next_delay(base: Duration, retry_after: Option<Duration>) -> Duration {
    retry_after.map_or(base, |after| after.max(base))
}

fn print_result(format: OutputFormat, result: &MutationResult) -> Result<()> {
    match (format, result) {
        (OutputFormat::Json, result) => println!("{}", json::format_json(result)?),
        (format, MutationResult::Created(record) | MutationResult::Updated(record)) => {
            vec![RecordDisplay::from(record)].print(format)?
        }
        (_, MutationResult::Deleted(id)) => println!("Deleted crop stage {}", id),
    }
    Ok(())
}
