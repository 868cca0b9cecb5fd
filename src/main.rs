mod cli;
mod pages;

use crate::cli::{Cli, Command, DataLocation, Settings};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, info};
use serde::Serialize;
use stats_api::{
    Collection, DataSource, DataStore, DirSource, Entity, Game, HttpSource, Player, SeasonTotals,
    Team, TeamLeaderGroup, TeamRecordGroup,
};
use std::fmt::Display;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli);

    better_panic::install();
    Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str())).init();

    debug!("settings: {settings:?}");
    match &settings.data {
        DataLocation::Http(url) => {
            info!("reading data from {url}");
            let source = HttpSource::new(url.as_str()).with_timeout(settings.timeout);
            run(DataStore::new(source), cli.command, &settings).await
        }
        DataLocation::Dir(root) => {
            info!("reading data from {}", root.display());
            run(DataStore::new(DirSource::new(root.clone())), cli.command, &settings).await
        }
    }
}

async fn run<S: DataSource>(
    store: DataStore<S>,
    command: Command,
    settings: &Settings,
) -> anyhow::Result<()> {
    match command {
        Command::Teams => emit(&pages::teams_page(&store).await, settings.json),
        Command::Team { team, season, kind } => {
            let page = pages::team_page(&store, &team, season.as_deref(), kind, settings.top).await;
            emit_or_missing(page, "team", &team, settings.json)
        }
        Command::Player { player } => {
            let page = pages::player_page(&store, &player).await;
            emit_or_missing(page, "player", &player, settings.json)
        }
        Command::Game { id } => {
            let page = pages::game_page(&store, &id).await;
            emit_or_missing(page, "game", &id, settings.json)
        }
        Command::Rebuild => {
            let derived = stats_api::derive::rebuild(&store).await;
            if derived.skipped > 0 {
                info!("{} game(s) left out of the rebuild for want of a boxscore", derived.skipped);
            }
            print_json(&derived)
        }
        Command::Dump { collection } => match collection {
            Collection::Teams => dump::<Team, S>(&store).await,
            Collection::Players => dump::<Player, S>(&store).await,
            Collection::Games => dump::<Game, S>(&store).await,
            Collection::PlayerTotals => dump::<SeasonTotals, S>(&store).await,
            Collection::TeamLeaders => dump::<TeamLeaderGroup, S>(&store).await,
            Collection::TeamRecords => dump::<TeamRecordGroup, S>(&store).await,
        },
    }
}

async fn dump<T: Entity, S: DataSource>(store: &DataStore<S>) -> anyhow::Result<()> {
    let items = store.get::<T>().await;
    print_json(items.as_slice())
}

fn emit<P: Serialize + Display>(page: &P, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(page)
    } else {
        print!("{page}");
        Ok(())
    }
}

fn emit_or_missing<P: Serialize + Display>(
    page: Option<P>,
    what: &str,
    key: &str,
    json: bool,
) -> anyhow::Result<()> {
    match page {
        Some(page) => emit(&page, json),
        None if json => print_json(&serde_json::Value::Null),
        None => {
            println!("No {what} found for '{key}'.");
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
