//! CLI entrypoint for finqa
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod output;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::Cli;
use finqa_application::config::ExecutionMode;
use finqa_application::{RunAgentInput, RunAgentUseCase};
use finqa_domain::retrieval::RetrievalFilter;
use finqa_domain::{AgentError, Question};
use finqa_infrastructure::{ChromaRetrievalGateway, ConfigLoader, OpenAiSynthesisGateway};
use output::ConsoleFormatter;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else {
        match cli.verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"), // -vvv or more
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("config error: {e}"))?
    };
    config.validate().context("invalid configuration")?;

    let question = Question::try_new(cli.question.clone())
        .ok_or_else(|| anyhow!("question cannot be empty"))?;

    // Agent parameters: config file first, CLI flags override
    let mut params = config.agent.execution_params();
    if let Some(top_k) = cli.top_k {
        params = params.with_top_k(top_k);
    }
    if let Some(iterations) = cli.iterations {
        params = params.with_self_reflection_iterations(iterations);
    }
    if let Some(max) = cli.max_variants {
        params = params.with_max_variants(max);
    }
    if cli.no_variants {
        params = params.with_query_variants(false);
    }
    if cli.no_scoring {
        params = params.with_output_scoring(false);
    }

    let filters = parse_filters(&cli.filter)?;

    // === Dependency Injection ===
    let api_key = config
        .llm
        .api_key
        .clone()
        .ok_or_else(|| anyhow!("missing API key (set FINQA_LLM__API_KEY or llm.api_key)"))?;
    let synthesis = Arc::new(OpenAiSynthesisGateway::new(
        &config.llm.base_url,
        api_key,
        &config.llm.model,
        config.llm_timeout(),
    )?);
    let retrieval = Arc::new(ChromaRetrievalGateway::new(
        &config.vector.base_url,
        &config.vector.collection,
        config.vector_timeout(),
    )?);

    info!(question = question.content(), "starting run");

    let mut input = RunAgentInput::new(question)
        .with_filters(filters)
        .with_params(params)
        .with_scoring_model(
            cli.scoring_model
                .clone()
                .unwrap_or_else(|| config.agent.scoring_model.clone()),
        );
    if cli.sequential {
        input = input.with_execution_mode(ExecutionMode::Sequential);
    }
    if let Some(year) = &cli.year {
        input = input.with_preferred_year(year.as_str());
    }
    if cli.no_traces {
        input = input.without_traces();
    }

    let use_case = RunAgentUseCase::new(retrieval, synthesis);

    match use_case.execute(input).await {
        Ok(report) => {
            let rendered = if cli.json {
                ConsoleFormatter::format_json(&report)?
            } else {
                ConsoleFormatter::format(&report)
            };
            println!("{rendered}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", ConsoleFormatter::format_error(&err));
            std::process::exit(exit_code(&err));
        }
    }
}

/// Parse repeated `--filter key=value` flags into a retrieval filter.
fn parse_filters(pairs: &[String]) -> Result<RetrievalFilter> {
    let mut filter = RetrievalFilter::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid filter '{pair}', expected key=value"))?;
        if key.trim().is_empty() || value.trim().is_empty() {
            return Err(anyhow!("invalid filter '{pair}', expected key=value"));
        }
        filter.insert(key.trim(), value.trim());
    }
    Ok(filter)
}

/// Map the error taxonomy onto conventional exit codes: 2 for not-found,
/// 3 for unprocessable answers, 4 for upstream/availability failures.
fn exit_code(err: &AgentError) -> i32 {
    match err.http_status() {
        404 => 2,
        401 | 422 => 3,
        _ => 4,
    }
}
