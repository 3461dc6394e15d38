//! Client side of VERITAS: the assistant chat, the face check flow and the
//! evidence vault, each behind an explicit session object.

pub mod assistant;
pub mod config;
pub mod face_check;
pub mod session;
pub mod speech;
pub mod vault;

#[cfg(test)]
mod test_support;

pub use assistant::{AssistantClient, AssistantError, ChatBackend};
pub use config::{ClientConfig, ResolvedConfig};
pub use face_check::{FaceCheckError, FaceCheckSession, ImageAnalyzer, RemoteImageAnalyzer};
pub use session::ChatSession;
pub use speech::{ConsoleSpeaker, Speaker, Utterance, Voice};
pub use vault::{StoredEvidence, Vault, VaultError};

pub(crate) fn join_base_path(base: &str, path: &str) -> String {
    let normalized_base = base.trim().trim_end_matches('/');
    let normalized_path = path.trim_start_matches('/');
    format!("{normalized_base}/{normalized_path}")
}
