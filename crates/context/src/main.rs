//! ResearchForge CLI
//!
//! Loads the local corpus once, builds the BM25 index, then researches
//! either the topic given on the command line or topics read from stdin
//! until `exit`, `quit` or `q`.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use researchforge_common::config::{AppConfig, ObservabilityConfig};
use researchforge_common::{metrics, VERSION};
use researchforge_context::{create_generator, PipelineSettings, PipelineState, ResearchPipeline, WikipediaClient};
use researchforge_ingestion::{Chunker, ChunkingConfig, CorpusLoader};
use researchforge_search::{Bm25Index, Bm25Params};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const RULE: &str = "============================================================";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.observability);

    info!("Starting ResearchForge v{}", VERSION);

    if config.observability.metrics_port > 0 {
        install_metrics_exporter(config.observability.metrics_port)?;
    }
    metrics::register_metrics();

    // Corpus and index
    let chunker = Chunker::new(ChunkingConfig::from_retrieval(&config.retrieval)?);
    let loader = CorpusLoader::new(chunker, &config.corpus);
    let report = loader.load(&config.corpus.dir);
    if let Err(e) = report.require_chunks(&config.corpus.dir) {
        warn!(error = %e, "Continuing with encyclopedia sources only");
    }
    let index = Bm25Index::with_params(report.chunks, Bm25Params::from(&config.retrieval));

    // Collaborators
    let generator = create_generator(&config.llm)?;
    let wikipedia = WikipediaClient::new(config.wikipedia.clone())?;

    let pipeline = ResearchPipeline::new(
        Arc::new(index),
        Arc::new(wikipedia),
        generator,
        PipelineSettings::from(&config),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let state = pipeline.run(&args.join(" ")).await?;
        print_report(&state);
        return Ok(());
    }

    repl(&pipeline).await?;
    info!("ResearchForge shutting down");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn install_metrics_exporter(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("generation_duration_seconds".to_string()),
            metrics::GENERATION_BUCKETS,
        )?
        .install()?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

async fn repl(pipeline: &ResearchPipeline) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nResearch topic (or 'exit'): ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let topic = line.trim();
        if topic.is_empty() {
            continue;
        }
        if matches!(topic.to_lowercase().as_str(), "exit" | "quit" | "q") {
            break;
        }

        match pipeline.run(topic).await {
            Ok(state) => print_report(&state),
            Err(e) => {
                error!(error = %e, code = e.code().as_code(), "Research failed");
                eprintln!("Research failed: {}", e);
            }
        }
    }

    Ok(())
}

fn print_report(state: &PipelineState) {
    let section = |title: &str, body: Option<&str>| {
        println!("\n{}\n{}\n{}", title, "-".repeat(title.len()), body.unwrap_or("(none)"));
    };

    println!("\n{}\nTOPIC: {}\n{}", RULE, state.topic(), RULE);
    section("Summary", state.summary());
    section("Critique A", state.critique_a());
    section("Critique B", state.critique_b());
    section("Collective Insight", state.insight());

    println!("\nSources");
    println!("-------");
    if state.sources().is_empty() {
        println!("(none)");
    }
    for source in state.sources() {
        println!("- {}", source);
    }
    println!("{}", RULE);
}
