mod app;
mod config;
mod db;
mod fish_api;
mod ui;

use app::{FishTrackerApp, ListOptions};
use clap::{Args, Parser, Subcommand};
use config::{Config, CONFIG_PATH};
use db::SqliteBackend;
use fish_api::{DescriptionClient, FishApiClient};
use fishtracker_core::{encode_photo, CustomFishInput, FishTrackerError, Rarity, Result, SeenFilter, SightingInput};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fishtracker", version, about = "Keep track of the fish you have spotted")]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured user id
    #[arg(long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog
    List {
        /// all, seen or unseen
        #[arg(long, default_value = "all")]
        filter: SeenFilter,
        /// Only show one rarity (COMMON, RARE, EPIC)
        #[arg(long)]
        rarity: Option<String>,
        /// Rarest first
        #[arg(long)]
        sort_rarity: bool,
    },
    /// Show how many species have been spotted
    Progress,
    /// Flip the spotted mark of a fish
    Toggle { id: String },
    /// Record a sighting of a catalog fish
    Record {
        id: String,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Add a species that is not in the catalog
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "COMMON")]
        rarity: String,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Show a fish with its generated description
    Show { id: String },
    /// List your sightings of a fish
    History { id: String },
}

#[derive(Args)]
struct LocationArgs {
    #[arg(long, allow_hyphen_values = true)]
    lat: String,
    #[arg(long, allow_hyphen_values = true)]
    lon: String,
    /// Depth in meters
    #[arg(long, allow_hyphen_values = true)]
    depth: String,
    /// Water temperature in °C
    #[arg(long, allow_hyphen_values = true)]
    temp: String,
    /// JPEG, PNG or WebP file, at most 5 MB
    #[arg(long)]
    photo: Option<PathBuf>,
}

impl LocationArgs {
    fn into_input(self) -> Result<SightingInput> {
        let mut input = SightingInput {
            latitude: self.lat,
            longitude: self.lon,
            depth: self.depth,
            temperature: self.temp,
            photo: None,
            photo_name: None,
        };
        if let Some(path) = self.photo {
            let bytes = std::fs::read(&path)
                .map_err(|e| FishTrackerError::InvalidData(format!("{}: {}", path.display(), e)))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            input = input.with_photo(encode_photo(&bytes)?, name);
        }
        Ok(input)
    }
}

fn load_config(path: &Path, user: Option<String>) -> Result<Config> {
    let mut config = Config::load_from(path);
    config.apply_env();
    if let Some(user) = user {
        config.user_id = user;
    }
    if !config.is_valid() {
        return Err(FishTrackerError::Config(format!(
            "set user_id and api_base_url in {} (or FISHTRACKER_USER / FISHTRACKER_API_URL)",
            path.display()
        )));
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<String> {
    let config = load_config(&cli.config, cli.user)?;
    tracing::debug!(user = %config.user_id, api = %config.api_base_url, "Loaded config");

    let backend = SqliteBackend::open(&config.db_path)?;
    let mut app = FishTrackerApp::new(
        backend,
        &config.user_id,
        Box::new(FishApiClient::from_config(&config)?),
        Box::new(DescriptionClient::from_config(&config)?),
    )?;

    match cli.command {
        Command::List { filter, rarity, sort_rarity } => app.list(&ListOptions {
            filter,
            rarity: rarity.map(Rarity::from),
            sort_by_rarity: sort_rarity,
        }),
        Command::Progress => app.progress(),
        Command::Toggle { id } => app.toggle(&id),
        Command::Record { id, location } => app.record(&id, &location.into_input()?),
        Command::Add { name, rarity, location } => app.add(&CustomFishInput {
            name,
            rarity: Rarity::from(rarity),
            location: location.into_input()?,
        }),
        Command::Show { id } => app.show(&id),
        Command::History { id } => Ok(app.history(&id)),
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fishtracker=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "fishtracker", "record", "fish-1", "--lat", "-33.9", "--lon", "151.2", "--depth", "4", "--temp", "22",
        ])
        .unwrap();
        let Command::Record { id, location } = cli.command else {
            panic!("expected record command");
        };
        assert_eq!(id, "fish-1");
        let input = location.into_input().unwrap();
        assert_eq!(input.latitude, "-33.9");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_filter() {
        assert!(Cli::try_parse_from(["fishtracker", "list", "--filter", "maybe"]).is_err());
    }

    #[test]
    fn user_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user_id = \"\"\n").unwrap();
        // An explicit --user is enough
        let config = load_config(&path, Some("diver@example.com".to_string())).unwrap();
        assert_eq!(config.user_id, "diver@example.com");
    }
}
