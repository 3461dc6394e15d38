use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use veritas_protocol::{ChatMessage, ChatRole, Language, WireMessage};

use crate::assistant::{AssistantError, ChatBackend};
use crate::speech::{Speaker, Utterance};

/// One assistant conversation: the message history, the active language and
/// the speaker that reads replies aloud.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    speaker: Box<dyn Speaker>,
    messages: Vec<ChatMessage>,
    language: Language,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        speaker: Box<dyn Speaker>,
        language: Language,
    ) -> Self {
        Self {
            backend,
            speaker,
            messages: Vec::new(),
            language,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches the reply language. Any reply still being read is cut off.
    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        self.speaker.cancel();
        info!(from = %self.language, to = %language, "chat language changed");
        self.language = language;
    }

    /// Sends one user turn. Blank input is ignored and returns `Ok(None)`.
    ///
    /// The user message stays in the history even when the backend fails, so
    /// the caller can retry without retyping.
    pub async fn send(&mut self, text: &str) -> Result<Option<&ChatMessage>, AssistantError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.push(ChatRole::User, text.to_string());
        let history: Vec<WireMessage> = self.messages.iter().map(ChatMessage::to_wire).collect();
        debug!(turns = history.len(), language = %self.language, "sending conversation");
        let reply = self.backend.reply(&history, self.language).await?;
        self.speaker.speak(Utterance::new(reply.clone(), self.language));
        self.push(ChatRole::Assistant, reply);
        Ok(self.messages.last())
    }

    pub fn clear(&mut self) {
        self.speaker.cancel();
        self.messages.clear();
    }

    fn push(&mut self, role: ChatRole, content: String) {
        self.messages.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<(Vec<WireMessage>, Language)>>,
        fail_with: Mutex<Option<AssistantError>>,
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn reply(
            &self,
            messages: &[WireMessage],
            language: Language,
        ) -> Result<String, AssistantError> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), language));
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(format!("reply to {last}"))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSpeaker {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&mut self, utterance: Utterance) {
            self.events
                .lock()
                .unwrap()
                .push(format!("speak {} {}", utterance.language, utterance.text));
        }

        fn cancel(&mut self) {
            self.events.lock().unwrap().push("cancel".to_string());
        }
    }

    fn session(backend: Arc<FakeBackend>) -> (ChatSession, RecordingSpeaker) {
        let speaker = RecordingSpeaker::default();
        let session = ChatSession::new(backend, Box::new(speaker.clone()), Language::EnglishUs);
        (session, speaker)
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let backend = Arc::new(FakeBackend::default());
        let (mut session, _) = session(backend.clone());
        assert!(session.send("   \n").await.unwrap().is_none());
        assert!(session.messages().is_empty());
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_text_is_sent_as_typed() {
        let backend = Arc::new(FakeBackend::default());
        let (mut session, _speaker) = session(backend.clone());

        session.send("  line one\nline two ").await.unwrap();
        assert_eq!(session.messages()[0].content, "  line one\nline two ");
        let calls = backend.calls.lock().unwrap();
        assert_eq!(
            calls[0].0,
            vec![WireMessage::new(ChatRole::User, "  line one\nline two ")]
        );
    }

    #[tokio::test]
    async fn reply_is_appended_and_spoken() {
        let backend = Arc::new(FakeBackend::default());
        let (mut session, speaker) = session(backend.clone());
        session.set_language(Language::Hindi);

        let reply = session.send("hello").await.unwrap().unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "reply to hello");

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_ne!(messages[0].id, messages[1].id);

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].1, Language::Hindi);
        assert_eq!(calls[0].0, vec![WireMessage::new(ChatRole::User, "hello")]);
        assert_eq!(
            *speaker.events.lock().unwrap(),
            vec!["cancel".to_string(), "speak hi-IN reply to hello".to_string()]
        );
    }

    #[tokio::test]
    async fn history_accumulates_across_turns() {
        let backend = Arc::new(FakeBackend::default());
        let (mut session, _) = session(backend.clone());
        session.send("one").await.unwrap();
        session.send("two").await.unwrap();
        let calls = backend.calls.lock().unwrap();
        let roles: Vec<ChatRole> = calls[1].0.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
    }

    #[tokio::test]
    async fn failed_reply_keeps_user_message() {
        let backend = Arc::new(FakeBackend::default());
        *backend.fail_with.lock().unwrap() = Some(AssistantError::RateLimited);
        let (mut session, speaker) = session(backend);

        let err = session.send("help").await.unwrap_err();
        assert!(matches!(err, AssistantError::RateLimited));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::User);
        assert!(speaker.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_history_and_stops_speech() {
        let backend = Arc::new(FakeBackend::default());
        let (mut session, speaker) = session(backend);
        session.send("hello").await.unwrap();
        session.clear();
        assert!(session.messages().is_empty());
        assert_eq!(
            speaker.events.lock().unwrap().last().map(String::as_str),
            Some("cancel")
        );
    }

    #[test]
    fn same_language_does_not_interrupt() {
        let (mut session, speaker) = session(Arc::new(FakeBackend::default()));
        session.set_language(Language::EnglishUs);
        assert!(speaker.events.lock().unwrap().is_empty());
        session.set_language(Language::Kannada);
        assert_eq!(session.language(), Language::Kannada);
        assert_eq!(*speaker.events.lock().unwrap(), vec!["cancel".to_string()]);
    }
}
