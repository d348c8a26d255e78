use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use config::Config;
use controller::{Field, FitmentSession, LoadStatus, SelectError, SessionError, SessionHandle};
use entity::FitmentContext;
use tokio::io::BufReader;
use tracing::info;
use url::Url;
use usecase::{
    http_client, stored_context, CatalogFetcher, FileStore, FitmentStore, Handoff,
    MetaobjectSource, StorefrontClient,
};

mod config;
mod controller;
mod entity;
mod usecase;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON config file, FITMENT_* environment variables override it
    #[arg(short, long, default_value = "fitment.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a vehicle from flags and print the filtered catalog URL
    Resolve {
        #[arg(long)]
        year: String,
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        submodel: Option<String>,
        #[arg(long)]
        engine: Option<String>,
    },
    /// Choose a vehicle interactively on stdin
    Pick,
    /// Print the stored vehicle
    Current,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load(Some(&args.config))?;

    match args.command {
        Command::Current => {
            match current(&config)? {
                Some(context) => println!("{}", serde_json::to_string_pretty(&context)?),
                None => println!("no vehicle selected"),
            }
            Ok(())
        }
        Command::Resolve {
            year,
            make,
            model,
            submodel,
            engine,
        } => {
            let session = start_session(&config)?;
            let url = resolve(
                &session,
                [
                    (Field::Year, Some(year)),
                    (Field::Make, Some(make)),
                    (Field::Model, Some(model)),
                    (Field::Submodel, submodel),
                    (Field::Engine, engine),
                ],
            )
            .await?;
            println!("{}", url);
            Ok(())
        }
        Command::Pick => {
            let session = start_session(&config)?;
            let input = BufReader::new(tokio::io::stdin());
            let url = controller::pick(&session, input, &mut std::io::stdout()).await?;
            println!("{}", url);
            Ok(())
        }
    }
}

// Reads local storage only, no storefront settings are needed.
fn current(config: &Config) -> anyhow::Result<Option<FitmentContext>> {
    let store = FileStore::new(&config.storage_path);
    stored_context(&store).context("failed to read the stored vehicle")
}

// Credentials are checked here so a bad setup fails before any request.
fn start_session(config: &Config) -> anyhow::Result<SessionHandle> {
    config.validate()?;
    let store: Arc<dyn FitmentStore> = Arc::new(FileStore::new(&config.storage_path));
    let handoff = Handoff::new(store, config)?;

    let client = StorefrontClient::new(http_client()?, config)?;
    info!("loading vehicles from {}", client.endpoint());
    let source: Arc<dyn MetaobjectSource> = Arc::new(client);
    let fetcher = CatalogFetcher::new(source, config);
    Ok(FitmentSession::new(Arc::new(fetcher), Arc::new(handoff)).spawn())
}

async fn resolve(
    session: &SessionHandle,
    values: [(Field, Option<String>); 5],
) -> anyhow::Result<Url> {
    let view = session.loaded().await?;
    match view.status {
        LoadStatus::Failed(e) => bail!("vehicle catalog unavailable: {}", e),
        LoadStatus::Empty => bail!("no vehicles are available"),
        LoadStatus::Loading | LoadStatus::Ready { .. } => {}
    }

    for (field, value) in values {
        let Some(value) = value else {
            continue;
        };
        match session.select(field, value).await {
            Ok(_) => {}
            // an earlier value matched nothing, resolving reports the miss
            Err(SessionError::Select(SelectError::Locked(_))) => break,
            Err(e) => return Err(e).with_context(|| format!("cannot set {}", field)),
        }
    }

    match session.resolve().await {
        Ok(url) => Ok(url),
        Err(SessionError::Unresolved(e)) => bail!("{}: {}", e, e.detail()),
        Err(e) => Err(e.into()),
    }
}
