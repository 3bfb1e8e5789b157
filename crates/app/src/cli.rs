use clap::{Parser, ValueEnum};

use crate::wiring::StoreBackend;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Which store backs comments and reactions.
    #[arg(long, value_enum, default_value = "auto")]
    pub store: StoreChoice,
    #[arg(long, default_value_t = false)]
    pub skip_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreChoice {
    /// Postgres when a database url is configured, memory otherwise.
    Auto,
    Postgres,
    Memory,
}

impl StoreChoice {
    pub fn resolve(self, database_url: Option<&str>) -> Option<StoreBackend> {
        match (self, database_url) {
            (StoreChoice::Memory, _) | (StoreChoice::Auto, None) => Some(StoreBackend::Memory),
            (StoreChoice::Auto | StoreChoice::Postgres, Some(_)) => Some(StoreBackend::Postgres),
            (StoreChoice::Postgres, None) => None,
        }
    }
}
