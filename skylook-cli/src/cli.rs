use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use skylook_core::{CityDirectory, Config, Favorites, Session};
use tokio_util::sync::CancellationToken;

use crate::{configure, render, watch};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skylook", version, about = "Current weather for a city or your location")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, default city and location mode.
    Configure,

    /// Show the weather for a city (default city or your location if omitted).
    Show {
        /// City name, e.g. "Lisbon".
        city: Option<String>,

        /// Print the view state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the weather where you are.
    Here {
        #[arg(long)]
        json: bool,
    },

    /// List known cities starting with the given text.
    Suggest {
        prefix: String,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Keep the display updated with a live clock.
    Watch {
        city: Option<String>,

        /// Seconds between weather refreshes.
        #[arg(long, default_value_t = 600)]
        refresh: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    Add { city: String },
    Remove { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                let config = Config::load()?;
                let updated = configure::run(config)?;
                updated.save()?;
                println!("Configuration saved to {}", Config::config_file_path()?.display());
            }
            Command::Show { city, json } => {
                let config = Config::load()?;
                let city = city.or_else(|| config.default_city.clone());
                let mut session = Session::from_config(&config)?;
                let cancel = cancel_on_ctrl_c();

                match city {
                    Some(city) => session.lookup_city(&city, &cancel).await,
                    None => session.lookup_here(&cancel).await,
                };
                present(&mut session, json)?;
            }
            Command::Here { json } => {
                let config = Config::load()?;
                let mut session = Session::from_config(&config)?;
                let cancel = cancel_on_ctrl_c();

                session.lookup_here(&cancel).await;
                present(&mut session, json)?;
            }
            Command::Suggest { prefix } => {
                let hits = CityDirectory::builtin().suggest(&prefix);
                if hits.is_empty() {
                    println!("No cities match '{prefix}'.");
                }
                for entry in hits {
                    println!("{} ({})", entry.name, entry.country);
                }
            }
            Command::Favorites { action } => {
                let mut favorites = Favorites::load(Config::favorites_file_path()?)?;
                match action {
                    FavoritesAction::List => {
                        if favorites.names().is_empty() {
                            println!("No favorites yet. Add one with `skylook favorites add <city>`.");
                        }
                        for name in favorites.names() {
                            println!("{name}");
                        }
                    }
                    FavoritesAction::Add { city } => {
                        if favorites.add(&city)? {
                            println!("Added {} to favorites.", city.trim());
                        } else {
                            println!("{} is already a favorite.", city.trim());
                        }
                    }
                    FavoritesAction::Remove { city } => {
                        if !favorites.remove(&city)? {
                            return Err(anyhow!("{} is not a favorite.", city.trim()));
                        }
                        println!("Removed {} from favorites.", city.trim());
                    }
                }
            }
            Command::Watch { city, refresh } => {
                let config = Config::load()?;
                let city = city.or_else(|| config.default_city.clone());
                let session = Session::from_config(&config)?;
                watch::run(session, city, refresh, cancel_on_ctrl_c()).await?;
            }
        }

        Ok(())
    }
}

fn present(session: &mut Session, json: bool) -> anyhow::Result<()> {
    let alerts = session.take_alerts();
    if json {
        let mut value = serde_json::to_value(session.state()).context("Failed to serialize view state")?;
        value["alerts"] = serde_json::json!(alerts);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for alert in &alerts {
        eprintln!("! {alert}");
    }
    print!("{}", render::render(session.state()));
    Ok(())
}

/// Token cancelled when the user presses Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Ctrl-C received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}
