use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::{OpenAi, Perplexity, TextAnalyzer};
use tubescope_common::{channel_url, ChannelIdentifier, ChannelSummary, Config, DiscoveryError};
use tubescope_discovery::decoder::decode_table;
use tubescope_discovery::similarity::MAX_SEED_TITLES;
use tubescope_discovery::{
    ChannelGateway, ContentIdea, ContentPlanner, DiscoveryReport, KeywordDiscovery,
    NoCandidatesReason, SeedProfile, SimilarityRanker, SubscriberBand,
};
use youtube_client::YouTubeClient;

#[derive(Parser)]
#[command(name = "tubescope", about = "Find YouTube channels related to a seed channel")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank channels related to a seed channel
    Related {
        /// Channel id, @handle, username or channel URL
        channel: String,
        #[arg(long, value_enum, default_value_t = Pipeline::Llm)]
        pipeline: Pipeline,
        #[arg(long)]
        min_subscribers: Option<u64>,
        #[arg(long)]
        max_subscribers: Option<u64>,
        /// Keep model suggestions as names instead of looking them up
        #[arg(long)]
        no_resolve: bool,
    },
    /// Print the search keywords extracted for a channel
    Keywords { channel: String },
    /// Decode a saved model response into similarity records
    Decode { file: PathBuf },
    /// Related channels, then content ideas built from them
    Ideas { channel: String },
    /// Write a video script for an idea
    Script {
        channel: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pipeline {
    /// Model-reported similarity
    Llm,
    /// Keyword search frequency
    Keywords,
}

/// Gateways and analyzers built from config. Missing keys leave `None`.
struct Services {
    youtube: Option<YouTubeClient>,
    perplexity: Option<Perplexity>,
    openai: Option<OpenAi>,
}

impl Services {
    fn from_config(config: &Config) -> Self {
        let youtube = match YouTubeClient::from_key(config.youtube_api_key.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Channel lookups disabled");
                None
            }
        };
        let perplexity = config
            .perplexity_api_key
            .as_ref()
            .map(|key| Perplexity::new(key.clone(), config.perplexity_model.clone()));
        let openai = config
            .openai_api_key
            .as_ref()
            .map(|key| OpenAi::new(key.clone(), config.openai_model.clone()));
        Self {
            youtube,
            perplexity,
            openai,
        }
    }

    fn gateway(&self) -> Option<&dyn ChannelGateway> {
        self.youtube.as_ref().map(|c| c as &dyn ChannelGateway)
    }

    /// Search-grounded model for similarity, OpenAI otherwise.
    fn similarity_analyzer(&self) -> Option<&dyn TextAnalyzer> {
        match (&self.perplexity, &self.openai) {
            (Some(p), _) => Some(p as &dyn TextAnalyzer),
            (None, Some(o)) => Some(o as &dyn TextAnalyzer),
            (None, None) => None,
        }
    }

    /// OpenAI for keywords and writing, Perplexity otherwise.
    fn writing_analyzer(&self) -> Option<&dyn TextAnalyzer> {
        match (&self.openai, &self.perplexity) {
            (Some(o), _) => Some(o as &dyn TextAnalyzer),
            (None, Some(p)) => Some(p as &dyn TextAnalyzer),
            (None, None) => None,
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_channel(input: &str) -> Result<ChannelIdentifier> {
    ChannelIdentifier::parse(input).ok_or_else(|| anyhow!("Not a channel id, handle or channel URL: {input}"))
}

/// Look up the seed through the gateway. `Err` carries the report to print.
async fn load_seed(
    gateway: Option<&dyn ChannelGateway>,
    identifier: &ChannelIdentifier,
) -> std::result::Result<ChannelSummary, DiscoveryReport> {
    let Some(gateway) = gateway else {
        return Err(DiscoveryReport::unavailable(&DiscoveryError::ConfigurationMissing(
            "YOUTUBE_API_KEY".into(),
        )));
    };
    match gateway.get_channel(identifier).await {
        Ok(Some(channel)) => Ok(channel),
        Ok(None) => {
            info!(seed = %identifier, "Seed channel not found");
            Err(DiscoveryReport::no_candidates(NoCandidatesReason::UnknownSeed))
        }
        Err(e) => {
            warn!(seed = %identifier, error = %e, "Failed to fetch seed channel");
            Err(DiscoveryReport::unavailable(&DiscoveryError::upstream(e)))
        }
    }
}

/// Seed profile for the similarity pass. Without a gateway the model only
/// gets what was typed.
async fn seed_profile(
    gateway: Option<&dyn ChannelGateway>,
    identifier: &ChannelIdentifier,
    input: &str,
) -> std::result::Result<(Option<ChannelSummary>, SeedProfile), DiscoveryReport> {
    let Some(g) = gateway else {
        let url = if input.contains("youtube.com/") {
            input.to_string()
        } else {
            match identifier {
                ChannelIdentifier::Id(id) => channel_url(id),
                ChannelIdentifier::Handle(handle) => format!("https://www.youtube.com/{handle}"),
                ChannelIdentifier::Username(name) => format!("https://www.youtube.com/c/{name}"),
            }
        };
        return Ok((None, SeedProfile::new(identifier.as_str(), url, Vec::new())));
    };

    let channel = load_seed(gateway, identifier).await?;
    let videos = g
        .get_recent_videos(&channel.id, MAX_SEED_TITLES)
        .await
        .unwrap_or_else(|e| {
            warn!(seed = channel.id.as_str(), error = %e, "Failed to fetch recent videos");
            Vec::new()
        });
    let profile = SeedProfile::from_channel(&channel, &videos);
    Ok((Some(channel), profile))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON result.
    let filter = EnvFilter::from_default_env().add_directive("tubescope=info".parse()?);
    if cli.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = Config::from_env();
    config.log_redacted();
    let services = Services::from_config(&config);
    let gateway = services.gateway();

    match cli.command {
        Command::Related {
            channel,
            pipeline,
            min_subscribers,
            max_subscribers,
            no_resolve,
        } => {
            let identifier = parse_channel(&channel)?;
            let report = match pipeline {
                Pipeline::Llm => {
                    let mut ranker = SimilarityRanker::new(services.similarity_analyzer())
                        .with_concurrency(config.search_concurrency);
                    if let Some(g) = gateway {
                        ranker = ranker.with_gateway(g);
                    }
                    if no_resolve {
                        ranker = ranker.without_resolution();
                    }
                    match seed_profile(gateway, &identifier, &channel).await {
                        Ok((_, seed)) => ranker.rank(&seed).await,
                        Err(report) => report,
                    }
                }
                Pipeline::Keywords => match load_seed(gateway, &identifier).await {
                    Ok(seed) => {
                        let band = SubscriberBand::new(
                            min_subscribers.unwrap_or(config.min_subscribers),
                            max_subscribers.unwrap_or(config.max_subscribers),
                        );
                        // load_seed succeeded, so a gateway exists.
                        let gateway = gateway.context("channel gateway")?;
                        KeywordDiscovery::new(gateway, services.writing_analyzer())
                            .with_band(band)
                            .with_concurrency(config.search_concurrency)
                            .discover(&seed.id)
                            .await
                    }
                    Err(report) => report,
                },
            };
            info!("{report}");
            print_json(&report)?;
        }

        Command::Keywords { channel } => {
            let identifier = parse_channel(&channel)?;
            match load_seed(gateway, &identifier).await {
                Ok(seed) => {
                    let gateway = gateway.context("channel gateway")?;
                    let discovery = KeywordDiscovery::new(gateway, services.writing_analyzer());
                    match discovery.keywords(&seed.id).await {
                        Ok(keywords) => print_json(&json!({ "channel": seed.title, "keywords": keywords }))?,
                        Err(e) => {
                            warn!(error = %e, "Keyword extraction unavailable");
                            print_json(&DiscoveryReport::unavailable(&e))?;
                        }
                    }
                }
                Err(report) => print_json(&report)?,
            }
        }

        Command::Decode { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let table = decode_table(&raw);
            let skipped: Vec<String> = table.rejected.iter().map(|e| e.to_string()).collect();
            print_json(&json!({ "records": table.records, "skipped": skipped }))?;
        }

        Command::Ideas { channel } => {
            let identifier = parse_channel(&channel)?;
            let (seed, profile) = match seed_profile(gateway, &identifier, &channel).await {
                Ok(loaded) => loaded,
                Err(report) => {
                    print_json(&json!({ "related": report, "ideas": [] }))?;
                    return Ok(());
                }
            };
            let seed = seed.unwrap_or_else(|| ChannelSummary::named(profile.name.clone()));

            let mut ranker = SimilarityRanker::new(services.similarity_analyzer())
                .with_concurrency(config.search_concurrency);
            let mut planner = ContentPlanner::new(services.writing_analyzer())
                .with_concurrency(config.search_concurrency);
            if let Some(g) = gateway {
                ranker = ranker.with_gateway(g);
                planner = planner.with_gateway(g);
            }

            let related = ranker.rank(&profile).await;
            info!("{related}");
            let ideas = planner.generate_ideas(&seed, &related.candidates).await;
            print_json(&json!({ "related": related, "ideas": ideas }))?;
        }

        Command::Script {
            channel,
            title,
            description,
        } => {
            let identifier = parse_channel(&channel)?;
            let seed = match gateway {
                Some(_) => match load_seed(gateway, &identifier).await {
                    Ok(seed) => seed,
                    Err(report) => {
                        print_json(&json!({ "status": report.status, "script": null }))?;
                        return Ok(());
                    }
                },
                None => ChannelSummary::named(identifier.as_str()),
            };
            let idea = ContentIdea {
                title,
                description,
                rationale: String::new(),
            };
            let script = ContentPlanner::new(services.writing_analyzer())
                .generate_script(&seed, &idea)
                .await;
            print_json(&json!({ "channel": seed.title, "idea": idea, "script": script }))?;
        }
    }

    Ok(())
}
