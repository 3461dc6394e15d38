use serde::Deserialize;
use std::io::Write;
use tracing::{debug, warn};
use veritas_protocol::Language;

pub const SPEECH_RATE: f32 = 0.9;
pub const SPEECH_PITCH: f32 = 1.0;
pub const SPEECH_VOLUME: f32 = 1.0;

/// A synthesis voice as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: Language,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
            volume: SPEECH_VOLUME,
        }
    }
}

/// Output side of the assistant. `speak` replaces whatever is playing.
pub trait Speaker: Send {
    fn speak(&mut self, utterance: Utterance);
    fn cancel(&mut self);
}

/// Picks the voice for a language. Google voices come first, then Microsoft
/// ones, both only when they speak the language; after that any exact locale
/// match, then any voice sharing the primary subtag.
pub fn select_voice(voices: &[Voice], language: Language) -> Option<&Voice> {
    let exact = |voice: &&Voice| voice.lang == language.code();
    let same_subtag =
        |voice: &&Voice| primary_subtag(&voice.lang) == language.primary_subtag();
    let vendor = |vendor: &'static str| {
        move |voice: &&Voice| {
            voice.name.to_lowercase().contains(vendor) && (exact(voice) || same_subtag(voice))
        }
    };
    voices
        .iter()
        .find(vendor("google"))
        .or_else(|| voices.iter().find(vendor("microsoft")))
        .or_else(|| voices.iter().find(exact))
        .or_else(|| voices.iter().find(same_subtag))
}

fn primary_subtag(lang: &str) -> &str {
    lang.split(['-', '_']).next().unwrap_or(lang)
}

/// Writes replies to a terminal, tagged with the voice that would read them.
pub struct ConsoleSpeaker<W> {
    out: W,
    voices: Vec<Voice>,
    speaking: bool,
}

impl<W: Write + Send> ConsoleSpeaker<W> {
    pub fn new(out: W, voices: Vec<Voice>) -> Self {
        Self {
            out,
            voices,
            speaking: false,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Speaker for ConsoleSpeaker<W> {
    fn speak(&mut self, utterance: Utterance) {
        self.cancel();
        let voice = select_voice(&self.voices, utterance.language);
        debug!(
            language = utterance.language.code(),
            voice = voice.map(|voice| voice.name.as_str()),
            rate = utterance.rate,
            "speaking reply"
        );
        let tag = match voice {
            Some(voice) => format!("assistant ({})", voice.name),
            None => "assistant".to_string(),
        };
        let written = writeln!(self.out, "{tag}: {}", utterance.text).and_then(|_| self.out.flush());
        if let Err(err) = written {
            warn!(error = %err, "failed to write reply");
            return;
        }
        self.speaking = true;
    }

    fn cancel(&mut self) {
        if self.speaking {
            debug!("speech cancelled");
        }
        self.speaking = false;
    }
}
