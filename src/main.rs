use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use pubvec::config::Config;
use pubvec::corpus::preprocess::{preprocess, TaggedDocument};
use pubvec::corpus::store::load_records;
use pubvec::corpus::AbstractRecord;
use pubvec::entrez::client::{ClientIdentity, EntrezClient};
use pubvec::pipeline::fetch::FetchPlan;

/// pubvec: paragraph embeddings over a random sample of PubMed abstracts.
///
/// With no subcommand, runs the whole pipeline: fetch, train, predict.
#[derive(Parser)]
#[command(name = "pubvec", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch abstracts, train the model, and predict on a random abstract
    Run,

    /// Sample PMIDs and download their abstracts into the data directory
    Fetch,

    /// Train the Doc2Vec model on the cached abstracts
    Train,

    /// Find abstracts similar to a randomly chosen one
    Predict,

    /// Show what is cached in the data directory
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pubvec=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            fetch(&config).await?;
            let (records, documents) = load_corpus(&config)?;
            train(&config, documents.clone()).await?;
            predict(&config, &records, &documents)?;
        }

        Commands::Fetch => {
            fetch(&config).await?;
        }

        Commands::Train => {
            let (_, documents) = load_corpus(&config)?;
            train(&config, documents).await?;
        }

        Commands::Predict => {
            let (records, documents) = load_corpus(&config)?;
            predict(&config, &records, &documents)?;
        }

        Commands::Status => {
            pubvec::status::show(&config)?;
        }
    }

    Ok(())
}

/// Sample PMIDs and write the abstract cache.
async fn fetch(config: &Config) -> Result<()> {
    config.require_contact()?;

    let client = EntrezClient::new(
        &config.eutils_url,
        ClientIdentity {
            email: config.entrez_email.clone(),
            api_key: config.ncbi_api_key.clone(),
        },
    )?;
    let plan = FetchPlan::with_seed(config.sample_seed);

    println!(
        "Retrieving up to {} PubMed abstracts (seed {})...",
        plan.quota, plan.seed
    );

    let pmids = pubvec::pipeline::fetch::run(
        &client,
        &plan,
        &config.abstracts_path(),
        &config.pmids_path(),
    )
    .await?;

    println!(
        "{}",
        format!("Saved {} abstracts to {}", pmids.len(), config.data_dir().display()).bold()
    );
    Ok(())
}

/// Read the cache files and tokenize them into the training corpus.
fn load_corpus(config: &Config) -> Result<(Vec<AbstractRecord>, Vec<TaggedDocument>)> {
    let records = load_records(&config.abstracts_path(), &config.pmids_path())?;
    let documents = preprocess(&records);
    info!(documents = documents.len(), "Prepared training corpus");
    Ok((records, documents))
}

async fn train(config: &Config, documents: Vec<TaggedDocument>) -> Result<()> {
    pubvec::pipeline::train::run(documents, &config.model_path()).await?;
    Ok(())
}

fn predict(config: &Config, records: &[AbstractRecord], documents: &[TaggedDocument]) -> Result<()> {
    println!("Predicting on a random abstract...");

    // A fixed seed reproduces the pick; otherwise draw a fresh one.
    let mut rng = match config.predict_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };

    let prediction =
        pubvec::pipeline::predict::run(documents, &config.model_path(), &mut rng)?;
    pubvec::output::terminal::display_prediction(&prediction, records);

    println!("\n{}", "Done predicting on a random abstract.".bold());
    Ok(())
}
