use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::orcid::OrcidId;

#[derive(Parser, Debug)]
#[command(version, about = "Sync ORCID and YouTube metadata into JSON snapshots", long_about = None)]
pub struct Cli {
    /// Directory the JSON documents are written to
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write orcid_profile.json: profile, educations and memberships
    Profile {
        #[arg(long, value_name = "ID")]
        orcid: OrcidId,
    },
    /// Write publications.json from the ORCID works list
    Publications {
        #[arg(long, value_name = "ID")]
        orcid: OrcidId,
    },
    /// Write talks.json from YouTube channel feeds and featured videos
    Talks {
        #[arg(long, value_name = "FILE", default_value = "talk_sources.json")]
        sources: PathBuf,
    },
    /// Run profile, publications and talks in that order
    All {
        #[arg(long, value_name = "ID")]
        orcid: OrcidId,
        #[arg(long, value_name = "FILE", default_value = "talk_sources.json")]
        sources: PathBuf,
    },
}
