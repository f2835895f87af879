//! pubsift — PubMed search filtered to top journals.
//! Entry point for the command-line binary.

mod config;
mod render;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pubsift_ingestion::sources::pubmed::PubMedClient;
use pubsift_ingestion::{ArticleType, SearchPipeline, SearchRequest, SortOrder};
use pubsift_journals::JournalTableLoader;

#[derive(Debug, Parser)]
#[command(name = "pubsift", version, about = "Search PubMed and keep articles from top journals")]
struct Cli {
    /// Search terms
    #[arg(required = true)]
    query: Vec<String>,

    /// Article type: "Research Article", RCT, "Meta-Analysis", "Systematic Review", "Clinical Trial", Review
    #[arg(long = "type", value_name = "LABEL")]
    article_type: Option<String>,

    /// Include animal and other non-human studies
    #[arg(long)]
    all_subjects: bool,

    /// Only free full-text articles
    #[arg(long)]
    open_access: bool,

    /// How many years back to search
    #[arg(long)]
    years_back: Option<u32>,

    /// Maximum articles to retrieve (capped at 100)
    #[arg(long)]
    max_results: Option<usize>,

    /// Keep articles from every journal, not only indexed ones
    #[arg(long)]
    show_all: bool,

    /// relevance, jif-desc, jif-asc, quartile-asc or quartile-desc
    #[arg(long, default_value = "relevance")]
    sort: SortOrder,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pubsift=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {e}");
    }
    let config = config::Config::load()?;

    let index = JournalTableLoader::new(config.journals.candidates.clone()).load_index();
    info!(journals = index.journal_count(), keys = index.len(), "Journal index ready");

    let client = PubMedClient::new(config.identity(), config.request_policy())?
        .with_base_url(&config.ncbi.base_url);
    let pipeline = SearchPipeline::new(Arc::new(client), Arc::new(index));

    let request = SearchRequest {
        query: cli.query.join(" "),
        article_type: cli.article_type.as_deref().and_then(ArticleType::from_label),
        humans_only: config.search.humans_only && !cli.all_subjects,
        open_access: cli.open_access,
        years_back: cli.years_back.unwrap_or(config.search.years_back),
        max_results: cli.max_results.unwrap_or(config.search.max_results),
        show_all_journals: cli.show_all,
        sort: cli.sort,
    };

    let outcome = pipeline.run(&request).await;

    if cli.json {
        println!("{}", render::to_json(&outcome)?);
    } else {
        println!("{}", render::to_text(&outcome));
    }

    if outcome.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}
