//! Interaction verifier CLI
//!
//! Usage:
//!   interaction-verifier                                   # API server, replay mode
//!   interaction-verifier --mode live serve                 # API server on live data
//!   interaction-verifier generate-fixtures \
//!       --sample-subject alice --sample-target brand \
//!       --sample-content-url https://x.com/brand/status/1  # Record replay fixtures

use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

use interaction_verifier::core::{
    run_server, ApifyDataSource, FileCacheStore, FileFixtureStore, FixtureSample, TemporalCache,
    VerificationEngine,
};
use interaction_verifier::types::{RunMode, ScoringMode};
use interaction_verifier::{COMMENT_FETCH_LIMIT, FIXTURE_COMMENT_LIMIT, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "interaction-verifier",
    version = VERSION,
    about = "Verify that an account followed a target and commented on a post",
    long_about = "Checks social-media interactions for one subject against one post.\n\n\
                  Modes:\n  \
                  replay  Answer from recorded fixtures, no network\n  \
                  live    Query the data source, with a temporal follower cache\n\n\
                  Scoring:\n  \
                  two-action    follows + commented\n  \
                  three-action  follows + commented + retweeted"
)]
struct Args {
    /// Where facts are read from
    #[arg(long, value_enum, env = "VERIFIER_MODE", default_value = "replay")]
    mode: ModeArg,

    /// Which actions count toward the score
    #[arg(long, value_enum, env = "VERIFIER_SCORING", default_value = "two-action")]
    scoring: ScoringArg,

    /// Server address
    #[arg(long, env = "VERIFIER_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,

    /// Directory for cached follower lists
    #[arg(long, default_value = "./cache")]
    cache_dir: String,

    /// Directory for replay fixtures
    #[arg(long, default_value = "./fixtures")]
    fixture_dir: String,

    /// Apify API token (live mode)
    #[arg(long, env = "APIFY_TOKEN", hide_env_values = true)]
    apify_token: Option<String>,

    /// Fixture sample: account whose actions are recorded
    #[arg(long)]
    sample_subject: Option<String>,

    /// Fixture sample: post whose comments are recorded
    #[arg(long)]
    sample_content_url: Option<String>,

    /// Fixture sample: account whose followers are recorded
    #[arg(long)]
    sample_target: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Record the sample from the live data source into the fixture directory
    GenerateFixtures,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Replay,
    Live,
}

impl From<ModeArg> for RunMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Replay => RunMode::Replay,
            ModeArg::Live => RunMode::Live,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ScoringArg {
    TwoAction,
    ThreeAction,
}

impl From<ScoringArg> for ScoringMode {
    fn from(arg: ScoringArg) -> Self {
        match arg {
            ScoringArg::TwoAction => ScoringMode::TwoAction,
            ScoringArg::ThreeAction => ScoringMode::ThreeAction,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!("interaction-verifier v{}", VERSION);

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(&args).await,
        Command::GenerateFixtures => run_generate(&args).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "exiting");
        std::process::exit(1);
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mode = RunMode::from(args.mode);
    let engine = build_engine(args, COMMENT_FETCH_LIMIT)?;

    if mode == RunMode::Live && !engine.has_source() {
        tracing::warn!("live mode without an Apify token; every verification will fail upstream");
    }

    run_server(&args.addr, Arc::new(engine), mode).await
}

/// Record fixtures; always reads live data
async fn run_generate(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(args, FIXTURE_COMMENT_LIMIT)?;
    let report = engine.generate_fixtures(RunMode::Live).await?;

    for fixture in &report.fixtures {
        tracing::info!(fixture = %fixture.name, items = fixture.items, "fixture written");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_engine(
    args: &Args,
    comment_limit: usize,
) -> Result<VerificationEngine, Box<dyn std::error::Error>> {
    let cache_store = Arc::new(FileCacheStore::new(&args.cache_dir));
    let fixtures = Arc::new(FileFixtureStore::new(&args.fixture_dir));
    tracing::info!(
        cache_dir = %cache_store.dir().display(),
        fixture_dir = %fixtures.dir().display(),
        "using file stores"
    );

    let mut engine = VerificationEngine::new(TemporalCache::with_store(cache_store), fixtures)
        .with_scoring(args.scoring.into());

    if let Some(token) = args.apify_token.as_deref().filter(|t| !t.trim().is_empty()) {
        let source = ApifyDataSource::new(token)?.with_comment_limit(comment_limit);
        engine = engine.with_source(Arc::new(source));
    }

    if let Some(sample) = fixture_sample(args)? {
        engine = engine.with_fixture_sample(sample);
    }

    Ok(engine)
}

/// All three sample flags, or none
fn fixture_sample(args: &Args) -> Result<Option<FixtureSample>, String> {
    match (&args.sample_subject, &args.sample_content_url, &args.sample_target) {
        (Some(subject), Some(content_url), Some(target)) => Ok(Some(FixtureSample {
            subject: subject.clone(),
            content_url: content_url.clone(),
            target_account: target.clone(),
        })),
        (None, None, None) => Ok(None),
        _ => Err(
            "--sample-subject, --sample-content-url and --sample-target must be given together"
                .to_string(),
        ),
    }
}
