use std::{path::Path, time::Duration};

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, Command},
    config::TalkSources,
    http::{Fetch, HttpClient},
    orcid::OrcidId,
    output::{LogSink, PROFILE_FILE, PUBLICATIONS_FILE, TALKS_FILE, output_path, report, write_json},
};

mod cli;
mod config;
mod extract;
mod http;
mod orcid;
mod output;
mod talks;
mod text;

fn main() -> anyhow::Result<()> {
    let logs = LogSink::default();
    tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Cli::parse();
    let http = HttpClient::new(Duration::from_secs(args.timeout));

    match &args.command {
        Command::Profile { orcid } => sync_profile(&http, orcid, &args.out_dir)?,
        Command::Publications { orcid } => sync_publications(&http, orcid, &args.out_dir)?,
        Command::Talks { sources } => sync_talks(&http, sources, &args.out_dir, &logs)?,
        Command::All { orcid, sources } => {
            sync_profile(&http, orcid, &args.out_dir)?;
            sync_publications(&http, orcid, &args.out_dir)?;
            sync_talks(&http, sources, &args.out_dir, &logs)?;
        }
    }
    Ok(())
}

fn sync_profile(fetcher: &dyn Fetch, orcid: &OrcidId, out_dir: &Path) -> anyhow::Result<()> {
    let snapshot = orcid::profile::fetch_snapshot(fetcher, orcid, Utc::now())?;
    let path = output_path(out_dir, PROFILE_FILE);
    write_json(&path, &snapshot)?;
    report(
        &format!(
            "profile with {} educations, {} memberships",
            snapshot.educations.len(),
            snapshot.memberships.len()
        ),
        &path,
    );
    Ok(())
}

fn sync_publications(fetcher: &dyn Fetch, orcid: &OrcidId, out_dir: &Path) -> anyhow::Result<()> {
    let publications = orcid::works::fetch_publications(fetcher, orcid)?;
    let path = output_path(out_dir, PUBLICATIONS_FILE);
    write_json(&path, &publications)?;
    report(&format!("{} publications", publications.len()), &path);
    Ok(())
}

fn sync_talks(
    fetcher: &dyn Fetch,
    sources: &Path,
    out_dir: &Path,
    logs: &LogSink,
) -> anyhow::Result<()> {
    let sources = TalkSources::load(sources)?;
    let progress = output::talk_progress(logs)?;
    let talks = talks::collect_talks(fetcher, &sources, &progress);
    let path = output_path(out_dir, TALKS_FILE);
    write_json(&path, &talks)?;
    report(&format!("{} talks", talks.len()), &path);
    Ok(())
}
