//! Career advisor: assessment scoring and vector-matching recommendations

use career_advisor::advisor::{
    ActivePrompts, AdviceParams, AdvisorStores, CareerAdvisor,
};
use career_advisor::catalog::{FileQuestionSource, QuestionCatalog};
use career_advisor::cli::{self, Cli, Commands, ConfigAction};
use career_advisor::config::Config;
use career_advisor::error::Result;
use career_advisor::profile::CatalogEmbedder;
use career_advisor::providers::{NullEmbedding, NullGenerator};
use career_advisor::rag::RagContextAssembler;
use career_advisor::scoring::AssessmentService;
use career_advisor::storage::InMemoryStore;
use clap::Parser;
use log::{error, info};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(cli: Cli, config: Config) -> Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(|| config.catalog.data_dir.clone());

    let store = if data_dir.exists() {
        Arc::new(InMemoryStore::load_from_dir(&data_dir)?)
    } else {
        Arc::new(InMemoryStore::new())
    };

    let catalog = Arc::new(QuestionCatalog::new(
        Box::new(FileQuestionSource::new(data_dir.clone())),
        Duration::from_secs(config.catalog.cache_ttl_secs),
    ));

    // No external providers are wired into the CLI; provider-backed steps
    // run their fallback paths.
    let embedder = Arc::new(NullEmbedding);
    let generator = Arc::new(NullGenerator);

    match cli.command {
        Commands::Questions { test_type } => {
            let test_type = cli::parse_test_type(&test_type)?;
            let set = catalog.get(test_type).await?;
            println!("{}", serde_json::to_string_pretty(&set.for_frontend())?);
        }

        Commands::Score {
            test_type,
            answers,
            user,
        } => {
            let test_type = cli::parse_test_type(&test_type)?;
            let answer_set = cli::parse_answers_file(test_type, &answers)?;

            let service = AssessmentService::new(
                catalog,
                store.clone(),
                store.clone(),
                store.clone(),
            );
            let outcome = service.score_assessment(&user, answer_set).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Recommend {
            user,
            paths,
            courses_per_path,
        } => {
            let advisor = CareerAdvisor::new(
                config,
                embedder,
                generator,
                AdvisorStores {
                    profiles: store.clone(),
                    industries: store.clone(),
                    careers: store.clone(),
                    courses: store.clone(),
                    recommendations: store.clone(),
                    learning_paths: store.clone(),
                },
            );

            let response = advisor
                .recommend(
                    &user,
                    AdviceParams {
                        paths,
                        courses_per_path,
                    },
                    &ActivePrompts::Default,
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Rag { query } => {
            let assembler = RagContextAssembler::new(
                embedder,
                store.clone(),
                config.matching,
                config.embedding,
            );
            println!("{}", assembler.build_context(&query).await);
        }

        Commands::Backfill { re_embed } => {
            let catalog_embedder = CatalogEmbedder::new(
                embedder,
                store.clone(),
                store.clone(),
                store.clone(),
                config.embedding,
            );

            info!("Backfilling career vectors...");
            let careers = catalog_embedder.backfill_careers(re_embed).await?;
            info!("Backfilling course vectors...");
            let courses = catalog_embedder.backfill_courses(re_embed).await?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "careers": careers,
                    "courses": courses,
                }))?
            );
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Reset) => {
                let config = Config::default();
                config.save()?;
                println!("Configuration reset to defaults");
            }
            Some(ConfigAction::Show) | None => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}
