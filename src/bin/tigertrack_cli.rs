use clap::{ Parser, Subcommand };
use std::path::PathBuf;
use tigertrack_rs::client::TrackClient;
use tigertrack_rs::models::{ FilterParams, Species };
use tigertrack_rs::storage::FlankImage;
use tracing::info;
use tracing_subscriber;

#[derive(Parser)]
#[command(name = "tigertrack_cli")]
#[command(about = "Query the TigerTrack monitoring store from the command line")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Filter by state name
    #[arg(long)]
    state: Option<String>,

    /// Filter by district name
    #[arg(long)]
    district: Option<String>,

    /// Filter by reserve name
    #[arg(long)]
    reserve: Option<String>,

    /// Filter by year (conflicts only)
    #[arg(long)]
    year: Option<String>,

    /// Filter by species (conflicts only)
    #[arg(long)]
    species: Option<String>,

    /// Filter by status
    #[arg(long)]
    status: Option<String>,

    /// Free-text search over ID, name, and reserve
    #[arg(long)]
    search: Option<String>,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            state: args.state,
            district: args.district,
            reserve: args.reserve,
            year: args.year,
            species: args.species,
            status: args.status,
            search: args.search,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List tracked tigers
    Tigers {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List tracked elephants
    Elephants {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List human-wildlife conflict reports
    Conflicts {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show the most recent field sightings
    Sightings {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show map pins for animals with known coordinates
    Locations {
        /// Restrict to one species (tiger or elephant)
        #[arg(long)]
        species: Option<String>,
    },
    /// Show dashboard counters
    Stats,
    /// Submit a flank image pair for stripe identification
    Identify {
        /// Left flank image path
        #[arg(long)]
        left: PathBuf,

        /// Right flank image path
        #[arg(long)]
        right: PathBuf,
    },
    /// Register a new animal
    Register {
        /// tiger or elephant
        #[arg(long, value_parser = ["tiger", "elephant"])]
        species: String,

        #[arg(long)]
        name: String,

        /// Two-letter state code embedded in the assigned ID
        #[arg(long)]
        state_code: String,

        /// Left flank image path
        #[arg(long)]
        left: Option<PathBuf>,

        /// Right flank image path
        #[arg(long)]
        right: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_unknown_species() {
        let result = Args::try_parse_from([
            "tigertrack_cli",
            "register",
            "--species",
            "giraffe",
            "--name",
            "G-1",
            "--state-code",
            "KA",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn register_accepts_known_species() {
        for species in ["tiger", "elephant"] {
            let result = Args::try_parse_from([
                "tigertrack_cli",
                "register",
                "--species",
                species,
                "--name",
                "A-1",
                "--state-code",
                "AS",
            ]);
            assert!(result.is_ok());
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_env_filter(format!("tigertrack_rs={}", args.log_level)).init();

    let client = TrackClient::from_env();
    if client.is_mock() {
        info!("Running against mock data");
    }

    match args.command {
        Command::Tigers { filters } => {
            print_json(&client.get_tigers(&filters.into()).await)?;
        }
        Command::Elephants { filters } => {
            print_json(&client.get_elephants(&filters.into()).await)?;
        }
        Command::Conflicts { filters } => {
            print_json(&client.get_conflicts(&filters.into()).await)?;
        }
        Command::Sightings { limit } => {
            print_json(&client.get_recent_sightings(limit).await)?;
        }
        Command::Locations { species } => {
            let species = species.as_deref().map(Species::from);
            print_json(&client.get_animal_locations(species).await)?;
        }
        Command::Stats => {
            print_json(&client.get_stats().await)?;
        }
        Command::Identify { left, right } => {
            let left = FlankImage::from_path(&left)?;
            let right = FlankImage::from_path(&right)?;
            print_json(&client.identify_tiger(&left, &right).await)?;
        }
        Command::Register { species, name, state_code, left, right } => {
            let left = left.as_deref().map(FlankImage::from_path).transpose()?;
            let right = right.as_deref().map(FlankImage::from_path).transpose()?;
            if species == "elephant" {
                print_json(&client.create_elephant(&name, &state_code, left, right).await?)?;
            } else {
                print_json(&client.create_tiger(&name, &state_code, left, right).await?)?;
            }
        }
    }

    Ok(())
}
