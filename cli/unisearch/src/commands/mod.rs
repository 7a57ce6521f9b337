mod list;
mod profile;
mod show;

use std::fmt;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use tracing::debug;
use unisearch_catalog::{CatalogClient, CatalogClientConfig};
use unisearch_core::QueryCodec;
use unisearch_core::profile::{FileBackend, ProfileStore};
use unisearch_sdk::{SharedProfile, shared_profile};

use crate::config::Config;

const UNISEARCH_DESCRIPTION: &'_ str = indoc! {"
    Search the university catalog, compare tuition and admission requirements,
    and keep a profile of your budget and exam results."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(UNISEARCH_DESCRIPTION))]
pub struct UnisearchCli(#[bpaf(external(unisearch_args))] pub UnisearchArgs);

/// Main unisearch args parser
///
/// To parse the unisearch CLI, use [`UnisearchCli`] instead using [`unisearch_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct UnisearchArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

/// Everything a command needs to run.
pub(crate) struct Session {
    pub config: Config,
    pub client: CatalogClient,
    pub profile: SharedProfile,
}

impl Session {
    fn new(config: Config) -> Result<Self> {
        let client_config = CatalogClientConfig {
            user_agent: Some(format!("unisearch/{}", env!("CARGO_PKG_VERSION"))),
            ..CatalogClientConfig::new(config.catalog_url.as_str())
        };
        let client = CatalogClient::new(client_config)
            .with_context(|| format!("Invalid catalog URL '{}'", config.catalog_url))?;

        let profile_path = config.profile_path();
        debug!(path = %profile_path.display(), "opening profile");
        let profile = shared_profile(ProfileStore::open(FileBackend::new(profile_path)));

        Ok(Session {
            config,
            client,
            profile,
        })
    }

    pub fn codec(&self) -> QueryCodec {
        QueryCodec::new(self.config.page_size)
    }
}

impl UnisearchArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        let session = Session::new(config)?;
        match self.command {
            Commands::List(args) => args.handle(session).await,
            Commands::Show(args) => args.handle(session).await,
            Commands::Profile(args) => args.handle(session).await,
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Search universities
    #[bpaf(command)]
    List(#[bpaf(external(list::list))] list::List),

    /// Show details of a university
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// View and edit your profile
    #[bpaf(command)]
    Profile(#[bpaf(external(profile::profile_commands))] profile::ProfileCommands),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<UnisearchArgs, bpaf::ParseFailure> {
        unisearch_cli()
            .run_inner(args)
            .map(|UnisearchCli(args)| args)
    }

    #[test]
    fn verbosity_flags() {
        let args = parse(&["-vv", "profile", "show"]).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Verbose(2)));

        let args = parse(&["--quiet", "profile", "show"]).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Quiet));

        let args = parse(&["profile", "show"]).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Verbose(0)));
    }

    #[test]
    fn command_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn unknown_sort_is_a_parse_error() {
        assert!(parse(&["list", "--sort", "cheapest"]).is_err());
        assert!(parse(&["list", "--sort", "tuition_asc"]).is_ok());
    }

    #[test]
    fn show_id_is_optional_for_the_parser() {
        assert!(parse(&["show"]).is_ok());
        assert!(parse(&["show", "--json", "mit"]).is_ok());
    }
}
