use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use lorehawk_core::{
    load_config, AssessmentPipeline, LorehawkConfig, PipelineOptions,
};
use lorehawk_provider::{create_completion_provider, create_speech_provider};
use lorehawk_schema::{AssessmentRequest, LanguageCode, RawInput};
use lorehawk_server::state::AppState;
use lorehawk_store::ResultStore;

#[derive(Parser)]
#[command(name = "lorehawk", version, about = "lorehawk knowledge assessment service")]
struct Cli {
    #[arg(
        long,
        default_value = "config/lorehawk.yaml",
        help = "Path to the configuration file"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP server")]
    Serve {
        #[arg(long, help = "Override the configured bind address")]
        bind: Option<String>,
    },
    #[command(about = "Assess a submission from the command line")]
    Assess {
        #[arg(help = "Subject of the submission")]
        subject: String,
        #[arg(long, conflicts_with_all = ["file", "audio"], help = "Submission text")]
        text: Option<String>,
        #[arg(long, help = "Read the submission text from a file")]
        file: Option<PathBuf>,
        #[arg(long, help = "Read an audio recording from a file")]
        audio: Option<PathBuf>,
    },
    #[command(about = "Generate a 6-event subject timeline")]
    Timeline {
        #[arg(help = "Subject of the timeline")]
        subject: String,
        #[arg(long, help = "Language code, e.g. es")]
        lang: Option<String>,
    },
    #[command(about = "Explain a single topic")]
    Explain {
        #[arg(help = "Subject")]
        subject: String,
        #[arg(help = "Topic name")]
        topic: String,
        #[arg(long, default_value = "", help = "Topic description")]
        description: String,
        #[arg(long, help = "Language code, e.g. es")]
        lang: Option<String>,
    },
    #[command(about = "Validate the configuration file")]
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate => {
            let config = load_config(&cli.config)?;
            println!(
                "Config valid. app={} provider={:?} model={} transcription={}",
                config.app.name,
                config.completion.provider.provider_type,
                config.completion.model,
                if config.transcription.enabled { "on" } else { "off" },
            );
        }
        Commands::Serve { bind } => {
            let config = load_config(&cli.config)?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let store = Arc::new(ResultStore::open(&config.storage.path)?);
            let pipeline = Arc::new(build_pipeline(&config));
            lorehawk_server::serve(AppState::new(pipeline, store), &bind).await?;
        }
        Commands::Assess {
            subject,
            text,
            file,
            audio,
        } => {
            let config = load_config(&cli.config)?;
            let pipeline = build_pipeline(&config);
            let store = ResultStore::open(&config.storage.path)?;

            let input = submission_input(text, file, audio)?;
            let result = pipeline
                .assess(AssessmentRequest { subject, input })
                .await?;
            store.insert(&result).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Timeline { subject, lang } => {
            let config = load_config(&cli.config)?;
            let pipeline = build_pipeline(&config);
            let language = parse_language(lang.as_deref());
            let events = pipeline.generate_timeline(&subject, &language).await;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Commands::Explain {
            subject,
            topic,
            description,
            lang,
        } => {
            let config = load_config(&cli.config)?;
            let pipeline = build_pipeline(&config);
            let language = parse_language(lang.as_deref());
            let enriched = pipeline
                .explain_topic(&subject, &topic, &description, &language)
                .await;
            println!("{}", serde_json::to_string_pretty(&enriched)?);
        }
    }

    Ok(())
}

fn build_pipeline(config: &LorehawkConfig) -> AssessmentPipeline {
    let completion = create_completion_provider(&config.completion.provider);
    let speech = create_speech_provider(&config.transcription);
    AssessmentPipeline::new(
        completion,
        speech,
        PipelineOptions {
            model: config.completion.model.clone(),
            transcription_model: config.transcription.model.clone(),
        },
    )
}

fn parse_language(raw: Option<&str>) -> LanguageCode {
    raw.and_then(LanguageCode::parse).unwrap_or_default()
}

fn submission_input(
    text: Option<String>,
    file: Option<PathBuf>,
    audio: Option<PathBuf>,
) -> Result<RawInput> {
    if let Some(text) = text {
        return Ok(RawInput::Text(text));
    }
    if let Some(path) = file {
        return Ok(RawInput::Text(std::fs::read_to_string(&path)?));
    }
    if let Some(path) = audio {
        let bytes = std::fs::read(&path)?;
        return Ok(RawInput::Audio {
            bytes,
            mime_type: mime_for_path(&path),
        });
    }
    Err(anyhow!("provide one of --text, --file or --audio"))
}

fn mime_for_path(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        _ => "application/octet-stream",
    }
    .to_string()
}
