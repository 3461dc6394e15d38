use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "veritas-edge",
    version,
    about = "VERITAS edge functions: voice assistant and facial recognition proxies"
)]
pub(crate) struct Args {
    /// Optional TOML file overriding upstream endpoints and models.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, default_value = "127.0.0.1:54321")]
    pub(crate) listen_addr: String,
    /// Directory for daily-rotated JSON logs.
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
}
