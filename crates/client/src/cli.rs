use clap::{Parser, Subcommand};
use std::path::PathBuf;
use veritas_protocol::Language;

#[derive(Parser, Debug)]
#[command(
    name = "veritas",
    version,
    about = "VERITAS client: safety assistant, face check, profile scan and evidence vault"
)]
pub(crate) struct Args {
    /// Optional TOML file with endpoints, keys and voices.
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub(crate) log_level: String,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Talk to the safety assistant. Type /clear, /lang <code> or /quit.
    Chat {
        #[arg(long)]
        language: Option<Language>,
    },
    /// Check a profile photo for signs of AI generation or reuse.
    FaceCheck { image: PathBuf },
    /// Score a social media profile with the local heuristics.
    ScanProfile {
        #[arg(long)]
        username: String,
        #[arg(long, default_value_t = 0)]
        followers: u64,
        #[arg(long, default_value_t = 0)]
        posts: u64,
        #[arg(long)]
        bio: Option<String>,
        /// The profile photo looks AI-generated.
        #[arg(long, default_value_t = false)]
        synthetic_photo: bool,
        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Store a file in the private evidence vault.
    Vault { file: PathBuf },
}

/// One line typed into the chat REPL.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReplInput<'a> {
    Quit,
    Clear,
    Language(&'a str),
    Message(&'a str),
}

pub(crate) fn parse_repl_input(line: &str) -> ReplInput<'_> {
    let line = line.trim();
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, rest)| (command, rest.trim()));
    match command {
        "/quit" | "/exit" => ReplInput::Quit,
        "/clear" => ReplInput::Clear,
        "/lang" => ReplInput::Language(rest),
        _ => ReplInput::Message(line),
    }
}
