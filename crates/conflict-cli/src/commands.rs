//! Subcommand implementations. Results go to stdout, diagnostics to the log.

use crate::config::Config;
use crate::SearchArgs;
use conflict_core::{DateRange, Event, EventQuery, ImpactRecord};
use conflict_db::{ConflictPolicy, Store};
use conflict_export::{ExportFormat, Exporter};
use conflict_fetch::Fetcher;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;

type CmdResult<T = ()> = Result<T, Box<dyn Error>>;

fn open_store(config: &Config) -> CmdResult<Store> {
    Ok(Store::open(&config.database_path)?.with_policy(config.conflict_policy))
}

pub fn init(config: &Config) -> CmdResult {
    let store = open_store(config)?;
    println!("Store ready at {}", config.database_path.display());
    println!("{}", store.counts()?);
    Ok(())
}

pub fn fetch(config: &Config, ingest_after: bool, output_dir: Option<PathBuf>) -> CmdResult {
    let mut fetch_config = config.fetch.clone();
    if let Some(dir) = output_dir {
        fetch_config.output_dir = dir;
    }

    let fetcher = Fetcher::new(fetch_config)?;
    let Some(path) = fetcher.fetch_or_none()? else {
        println!("Fetch failed; nothing was saved.");
        return Ok(());
    };
    println!("Data fetched and saved to {}", path.display());

    if ingest_after {
        ingest(config, &path, false)?;
    }
    Ok(())
}

pub fn ingest(config: &Config, file: &Path, replace: bool) -> CmdResult {
    let records = ImpactRecord::load_batch(file)?;
    let mut store = open_store(config)?;
    if replace {
        store = store.with_policy(ConflictPolicy::Replace);
    }

    let report = store.ingest(&records)?;
    println!("{}", report);
    Ok(())
}

pub fn search(config: &Config, args: &SearchArgs) -> CmdResult {
    let store = open_store(config)?;
    print!("{}", run_search(&store, args)?);
    Ok(())
}

pub fn actor(config: &Config, key: &str) -> CmdResult {
    let store = open_store(config)?;
    match store.threat_actor(key)? {
        Some(actor) => println!("{}", actor),
        None => println!("Threat actor not found."),
    }
    Ok(())
}

pub fn summary(config: &Config, with_counts: bool) -> CmdResult {
    let store = open_store(config)?;
    print!("{}", render_summary(&store, with_counts)?);
    Ok(())
}

/// Build the query described by the search flags.
fn build_query(args: &SearchArgs) -> conflict_core::Result<EventQuery> {
    let mut query = if args.ukraine_russia {
        EventQuery::ukraine_attacked_by_russia()
    } else {
        EventQuery::new()
    };

    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        query = query.in_range(DateRange::parse(from, to)?);
    }
    if let Some(event_type) = &args.event_type {
        query = query.of_type(event_type.clone());
    }
    if let Some(keyword) = &args.keyword {
        query = query.with_keyword(keyword.clone());
    }
    if let Some(country) = &args.country {
        query = query.in_country(country.clone());
    }
    if let Some(key) = &args.actor_key {
        query = query.by_threat_actor_key(key.clone());
    }
    if let Some(name) = &args.actor_name {
        query = query.by_threat_actor_name(name.clone());
    }
    if let Some(allegiance) = &args.allegiance {
        query = query.by_allegiance(allegiance.clone());
    }
    Ok(query)
}

/// Run a search and render its output.
///
/// Plain event listings are used when the query only reads event columns and
/// no format or export was requested; otherwise the results are the
/// event/threat actor join, rendered by the exporter.
fn run_search(store: &Store, args: &SearchArgs) -> CmdResult<String> {
    let query = build_query(args)?;
    let format = args
        .format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()?;

    if args.export.is_none() && format.is_none() && !query.needs_threat_actor() {
        let events = store.search(&query)?;
        return Ok(render_events(&events));
    }

    let rows = store.search_attributed(&query)?;
    let exporter = Exporter::new(&rows);
    match &args.export {
        Some(path) => {
            let format = format
                .or_else(|| ExportFormat::from_path(path))
                .unwrap_or(ExportFormat::Csv);
            exporter.write_file(path, format)?;
            info!(rows = rows.len(), path = %path.display(), ?format, "exported results");
            Ok(format!(
                "Exported {} events to {}\n",
                rows.len(),
                path.display()
            ))
        }
        None => Ok(exporter.export(format.unwrap_or(ExportFormat::Text))?),
    }
}

fn render_events(events: &[Event]) -> String {
    let mut output = format!("{} events\n", events.len());
    for event in events {
        output.push_str(&format!(
            "{}  {}  {}  {}\n",
            event.key,
            event.date_from.as_deref().unwrap_or("-"),
            event.event_type.as_deref().unwrap_or("-"),
            event.name.as_deref().unwrap_or("-")
        ));
    }
    output
}

fn render_summary(store: &Store, with_counts: bool) -> CmdResult<String> {
    if with_counts {
        return Ok(store.summary()?.to_string());
    }

    let mut output = format!("{}\n", store.counts()?);
    output.push_str("\nEvent types:\n");
    for event_type in store.unique_event_types()? {
        output.push_str(&format!("  {}\n", event_type));
    }
    output.push_str("\nThreat actors:\n");
    for name in store.unique_threat_actor_names()? {
        output.push_str(&format!("  {}\n", name));
    }
    output.push_str("\nThreat actor keys:\n");
    for key in store.unique_threat_actor_keys()? {
        output.push_str(&format!("  {}\n", key));
    }
    Ok(output)
}
