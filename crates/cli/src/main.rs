use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use medir_backend::{BackendClient, EdgeMatchingService, RestStore};
use medir_core::config::request_timeout_from_env_value;
use medir_core::{
    DataStore, DiscoveryConfig, DiscoverySession, DoctorMatchQuery, DropdownView,
    LocationRegistry, MatchingService, MemoryStore, PlaceSelection, ResultsView, SelectorEvent,
};
use medir_types::RecordId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medir")]
#[command(about = "Medical directory doctor discovery CLI")]
struct Cli {
    /// Read tables from a JSON fixture instead of the backend
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pathology catalog
    Pathologies {
        /// Only show pathologies whose name or code contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search doctors
    Search {
        #[command(subcommand)]
        by: SearchBy,
    },
    /// Manage doctor locations
    Locations {
        #[command(subcommand)]
        action: LocationAction,
    },
}

#[derive(Subcommand)]
enum SearchBy {
    /// Type into the pathology selector and commit a candidate
    Pathology {
        /// Text typed into the selector
        text: String,
        /// Candidate row to commit (0-based)
        #[arg(long, default_value_t = 0)]
        pick: usize,
    },
    /// Search by the city of a geocoded place
    Place {
        /// JSON file holding the place selection
        place: PathBuf,
    },
}

#[derive(Subcommand)]
enum LocationAction {
    /// Register a practice location
    Add {
        doctor_id: String,
        /// JSON file holding the place selection
        place: PathBuf,
    },
    /// List a doctor's locations, newest first
    List { doctor_id: String },
    /// Delete a practice location
    Remove { location_id: String },
}

/// Collaborators for one CLI run.
struct Backend {
    store: Arc<dyn DataStore>,
    matcher: Arc<dyn MatchingService>,
    timeout: Duration,
}

impl Backend {
    fn query(&self) -> DoctorMatchQuery {
        DoctorMatchQuery::new(self.store.clone(), self.matcher.clone(), self.timeout)
    }

    fn registry(&self) -> LocationRegistry {
        LocationRegistry::new(self.store.clone(), self.timeout)
    }
}

/// Main entry point for the medir CLI
///
/// # Environment Variables
/// - `MEDIR_BACKEND_URL`: Base URL of the backend (required without `--fixture`)
/// - `MEDIR_ANON_KEY`: Public API key (required without `--fixture`)
/// - `MEDIR_ACCESS_TOKEN`: Signed-in user token, sent instead of the anon key when set
/// - `MEDIR_MATCHING_FUNCTION`: Edge function name (default: "doctors-by-pathology")
/// - `MEDIR_REQUEST_TIMEOUT_SECS`: Per-call timeout (default: 10)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("medir=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let backend = connect(cli.fixture.as_deref())?;

    match cli.command {
        Commands::Pathologies { filter } => list_pathologies(&backend, filter.as_deref()).await,
        Commands::Search {
            by: SearchBy::Pathology { text, pick },
        } => search_pathology(&backend, text, pick).await,
        Commands::Search {
            by: SearchBy::Place { place },
        } => search_place(&backend, &place).await,
        Commands::Locations {
            action: LocationAction::Add { doctor_id, place },
        } => add_location(&backend, &doctor_id, &place).await,
        Commands::Locations {
            action: LocationAction::List { doctor_id },
        } => list_locations(&backend, &doctor_id).await,
        Commands::Locations {
            action: LocationAction::Remove { location_id },
        } => remove_location(&backend, &location_id).await,
    }
}

fn connect(fixture: Option<&Path>) -> anyhow::Result<Backend> {
    let timeout =
        request_timeout_from_env_value(std::env::var("MEDIR_REQUEST_TIMEOUT_SECS").ok())?;

    if let Some(path) = fixture {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let tables = serde_json::from_str(&raw)
            .with_context(|| format!("fixture {} is not valid JSON", path.display()))?;
        let store = Arc::new(MemoryStore::from_fixture(tables)?);
        tracing::info!("using fixture {}", path.display());
        return Ok(Backend {
            store: store.clone(),
            matcher: store,
            timeout,
        });
    }

    let backend_url = std::env::var("MEDIR_BACKEND_URL")
        .context("MEDIR_BACKEND_URL is not set (or pass --fixture)")?;
    let anon_key = std::env::var("MEDIR_ANON_KEY").context("MEDIR_ANON_KEY is not set")?;
    let config = DiscoveryConfig::new(
        &backend_url,
        &anon_key,
        std::env::var("MEDIR_ACCESS_TOKEN").ok(),
        std::env::var("MEDIR_MATCHING_FUNCTION").ok(),
        timeout,
    )?;
    tracing::info!("using backend {}", config.backend_url());

    let client = BackendClient::new(config)?;
    Ok(Backend {
        store: Arc::new(RestStore::new(client.clone())),
        matcher: Arc::new(EdgeMatchingService::new(client)),
        timeout,
    })
}

async fn loaded_session(backend: &Backend) -> anyhow::Result<DiscoverySession> {
    let mut session = DiscoverySession::new();
    session
        .load_catalog(&backend.query())
        .await
        .context("failed to load pathologies")?;
    Ok(session)
}

async fn list_pathologies(backend: &Backend, filter: Option<&str>) -> anyhow::Result<()> {
    let session = loaded_session(backend).await?;
    let pathologies = session.catalog().filter(filter.unwrap_or_default());
    if pathologies.is_empty() {
        println!("No pathologies found.");
    }
    for pathology in pathologies {
        match &pathology.code {
            Some(code) => println!("{} ({}) [{}]", pathology.name, code, pathology.id),
            None => println!("{} [{}]", pathology.name, pathology.id),
        }
    }
    Ok(())
}

async fn search_pathology(backend: &Backend, text: String, pick: usize) -> anyhow::Result<()> {
    let query = backend.query();
    let mut session = loaded_session(backend).await?;

    session.handle_selector(SelectorEvent::InputChanged(text.clone()));
    let DropdownView::Candidates { items, .. } = session.dropdown() else {
        bail!("no pathology matches '{text}'");
    };
    if pick >= items.len() {
        bail!("there is no candidate {pick} for '{text}' ({} found)", items.len());
    }
    for _ in 0..pick {
        session.handle_selector(SelectorEvent::ArrowDown);
    }
    let Some(pending) = session.handle_selector(SelectorEvent::Enter) else {
        bail!("no pathology was committed for '{text}'");
    };

    println!("Pathology: {}", session.selector().input());
    session.search(&query, pending).await;
    print_results(&session)
}

async fn search_place(backend: &Backend, place: &Path) -> anyhow::Result<()> {
    let query = backend.query();
    let place = read_place(place)?;
    let mut session = DiscoverySession::new();

    let Some(pending) = session.handle_place(&place) else {
        match session.location_notice() {
            Some(notice) => bail!("{notice}"),
            None => bail!("no search was started"),
        }
    };
    if let Some(city) = session.selected_city() {
        println!("City: {city}");
    }
    session.search(&query, pending).await;
    print_results(&session)
}

async fn add_location(backend: &Backend, doctor_id: &str, place: &Path) -> anyhow::Result<()> {
    let doctor_id = RecordId::new(doctor_id)?;
    let place = read_place(place)?;
    let location = backend.registry().register(&doctor_id, &place).await?;
    println!(
        "Registered location {}: {} ({}, {})",
        location.id, location.formatted_address, location.latitude, location.longitude
    );
    Ok(())
}

async fn list_locations(backend: &Backend, doctor_id: &str) -> anyhow::Result<()> {
    let doctor_id = RecordId::new(doctor_id)?;
    let locations = backend.registry().list(&doctor_id).await?;
    if locations.is_empty() {
        println!("No locations found.");
    }
    for location in locations {
        println!(
            "ID: {}, Address: {}, City: {}, Created: {}",
            location.id,
            location.formatted_address,
            location.city.as_deref().unwrap_or("-"),
            location
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".into())
        );
    }
    Ok(())
}

async fn remove_location(backend: &Backend, location_id: &str) -> anyhow::Result<()> {
    let location_id = RecordId::new(location_id)?;
    backend.registry().remove(&location_id).await?;
    println!("Removed location {location_id}");
    Ok(())
}

fn read_place(path: &Path) -> anyhow::Result<PlaceSelection> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read place {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid place in {}", path.display()))
}

fn print_results(session: &DiscoverySession) -> anyhow::Result<()> {
    if let Some(error) = session.search_error() {
        bail!("search failed: {error}");
    }
    match session.results() {
        ResultsView::Searching => println!("Searching..."),
        ResultsView::Empty(state) => println!("{state}"),
        ResultsView::Doctors(doctors) => {
            for doctor in doctors {
                println!(
                    "ID: {}, Name: {}, Specialty: {}",
                    doctor.id,
                    doctor.display_name(),
                    doctor.specialty.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}
