use std::ffi::OsString;

use clap::Command;

use crate::config::Settings;
use crate::db::MongoLifecycle;
use crate::errors::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    Ping,
}

pub fn cli() -> Command {
    Command::new("yourdrobe-api")
        .about("YourDrobe API server. Runs the HTTP server when no subcommand is given.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(
            Command::new("ping").about("Connect to MongoDB, verify it answers a ping, and exit"),
        )
}

pub fn parse<I, T>(args: I) -> Result<Option<CliCommand>, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = cli().try_get_matches_from(args)?;

    Ok(match matches.subcommand() {
        Some(("ping", _)) => Some(CliCommand::Ping),
        _ => None,
    })
}

/// One full connection cycle against the configured server.
pub async fn ping(settings: &Settings) -> Result<(), DbError> {
    let mongo = MongoLifecycle::default();
    mongo.initialize(&settings.mongodb_uri).await?;

    let result = mongo.database().map(|database| {
        println!("MongoDB is reachable (database: {})", database.name());
    });

    mongo.shutdown().await;
    result
}
