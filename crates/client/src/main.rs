mod cli;

use anyhow::Context;
use clap::Parser;
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use veritas_client::{
    AssistantClient, ChatSession, ClientConfig, ConsoleSpeaker, FaceCheckSession,
    RemoteImageAnalyzer, ResolvedConfig, Vault,
};
use veritas_protocol::Language;
use veritas_scanner::{analyze_profile, ProfileSnapshot};
use veritas_supabase::{Credentials, StorageClient};

use crate::cli::{parse_repl_input, Args, Command, ReplInput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match args.command {
        Command::Chat { language } => {
            let config = load_config(args.config.as_deref())?;
            run_chat(config, language).await
        }
        Command::FaceCheck { image } => run_face_check(args.config.as_deref(), &image).await,
        Command::ScanProfile {
            username,
            followers,
            posts,
            bio,
            synthetic_photo,
            json,
        } => scan_profile(
            ProfileSnapshot {
                username,
                followers,
                posts,
                bio,
                synthetic_photo,
            },
            json,
        ),
        Command::Vault { file } => {
            let config = load_config(args.config.as_deref())?;
            let vault = Vault::new(storage_client(&config, build_http_client(&config)?));
            let stored = vault
                .store(&file)
                .await
                .with_context(|| format!("failed to store {}", file.display()))?;
            println!(
                "Stored {} ({} bytes, {}) in {}",
                stored.object_path, stored.size, stored.content_type, stored.bucket
            );
            Ok(())
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env();
    config.resolve()
}

fn build_http_client(config: &ResolvedConfig) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(concat!("veritas/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(config.timeout)
        .build()
        .context("failed to build http client")
}

fn storage_client(config: &ResolvedConfig, http: Client) -> StorageClient {
    StorageClient::new(
        http,
        Credentials::new(config.storage_url.clone(), config.publishable_key.clone()),
    )
}

async fn run_chat(config: ResolvedConfig, language: Option<Language>) -> anyhow::Result<()> {
    let http = build_http_client(&config)?;
    let backend = AssistantClient::new(http, &config.functions_url, config.publishable_key.clone());
    info!(endpoint = backend.endpoint(), "chat session starting");
    let speaker = ConsoleSpeaker::new(std::io::stdout(), config.voices.clone());
    let mut session = ChatSession::new(
        Arc::new(backend),
        Box::new(speaker),
        language.unwrap_or(config.language),
    );
    println!(
        "VERITAS assistant ({}). Commands: /clear, /lang <code>, /quit",
        session.language().label()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to write prompt")?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match parse_repl_input(&line) {
            ReplInput::Quit => break,
            ReplInput::Clear => {
                session.clear();
                println!("Conversation cleared.");
            }
            ReplInput::Language(code) => match code.parse::<Language>() {
                Ok(language) => {
                    session.set_language(language);
                    println!("Language: {} ({})", language.label(), language.native_label());
                }
                Err(err) => eprintln!("{err}"),
            },
            ReplInput::Message(text) => {
                if let Err(err) = session.send(text).await {
                    eprintln!("{err}");
                }
            }
        }
    }
    Ok(())
}

async fn run_face_check(config_path: Option<&Path>, image: &Path) -> anyhow::Result<()> {
    let mut session = FaceCheckSession::new();
    session.select_file(image).await?;

    let config = load_config(config_path)?;
    let http = build_http_client(&config)?;
    let analyzer = RemoteImageAnalyzer::new(
        storage_client(&config, http.clone()),
        http,
        &config.functions_url,
        config.publishable_key.clone(),
    );
    let result = session.analyze(&analyzer).await?;
    println!("Risk level: {}", result.risk_level);
    if let Some(confidence) = result.confidence_score {
        println!("Confidence: {confidence}%");
    }
    println!("{}", result.analysis);
    if result.is_fallback() {
        println!("Automatic analysis was unavailable; treat this profile with caution.");
    }
    Ok(())
}

fn scan_profile(profile: ProfileSnapshot, json: bool) -> anyhow::Result<()> {
    let result = analyze_profile(&profile);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("Threat score: {}/5", result.threat_score);
    println!("Verdict: {}", result.verdict.as_str());
    println!("Confidence: {}%", result.confidence);
    println!("{}", result.explanation);
    Ok(())
}
