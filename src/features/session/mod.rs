//! # Chat Session
//!
//! UI-independent state machine for one chat session: persona selection,
//! submission and streamed reply accumulation.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ```text
//! Idle ──render──▶ AwaitingInput ──submit──▶ Streaming ──done/failed──▶ Idle
//! ```
//!
//! Only one exchange is in flight at a time: `submit` and `select_persona`
//! are refused while streaming.

use crate::core::error::{CompletionServiceError, SessionError};
use crate::features::completion::{CompletionClient, StreamEvent};
use crate::features::conversation::{ConversationState, Message, Role};
use crate::features::personas::{Persona, PersonaRegistry};
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for persona selection or text input
    Idle,
    /// Transcript drawn, input open
    AwaitingInput,
    /// A reply is streaming in; input is blocked
    Streaming,
}

/// Assistant reply being streamed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingReply {
    text: String,
    fragments: usize,
}

impl PendingReply {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }
}

/// Last exchange that failed. Shown to the user, never stored in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedReply {
    pub partial: String,
    pub error: CompletionServiceError,
}

/// Effect of one stream event on the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamProgress {
    Continuing,
    Completed,
    Failed,
    /// Event arrived while no reply was streaming
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Completed(String),
    Failed(FailedReply),
}

pub struct ChatSession {
    id: Uuid,
    registry: Arc<PersonaRegistry>,
    conversation: Option<ConversationState>,
    phase: Phase,
    pending: Option<PendingReply>,
    failed: Option<FailedReply>,
}

impl ChatSession {
    pub fn new(registry: Arc<PersonaRegistry>) -> Self {
        let id = Uuid::new_v4();
        debug!("Session {id} created");
        ChatSession {
            id,
            registry,
            conversation: None,
            phase: Phase::Idle,
            pending: None,
            failed: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    pub fn conversation(&self) -> Option<&ConversationState> {
        self.conversation.as_ref()
    }

    pub fn active_persona(&self) -> Option<&Persona> {
        let id = self.conversation.as_ref()?.persona_id();
        self.registry.get_persona(id).ok()
    }

    /// Full history including the system message (empty before any selection)
    pub fn history(&self) -> &[Message] {
        self.conversation
            .as_ref()
            .map(|c| c.history())
            .unwrap_or(&[])
    }

    /// Messages to draw, system messages excluded
    pub fn visible_history(&self) -> Vec<&Message> {
        self.conversation
            .as_ref()
            .map(|c| c.visible_history().collect())
            .unwrap_or_default()
    }

    pub fn pending_reply(&self) -> Option<&PendingReply> {
        self.pending.as_ref()
    }

    pub fn failed_reply(&self) -> Option<&FailedReply> {
        self.failed.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.phase == Phase::Streaming
    }

    /// Activate a persona. Reselecting the active persona keeps the ongoing
    /// conversation; another persona resets it.
    ///
    /// Returns `true` if the conversation was (re)initialized.
    pub fn select_persona(&mut self, id: &str) -> Result<bool, SessionError> {
        if self.is_streaming() {
            return Err(SessionError::Busy);
        }
        let persona = self.registry.get_persona(id)?;

        let reset = ConversationState::select(&mut self.conversation, persona);
        if reset {
            info!("Session {}: persona switched to {}", self.id, persona.id);
            self.failed = None;
        }
        self.phase = Phase::AwaitingInput;
        Ok(reset)
    }

    /// Note that the transcript has been drawn; opens input once a persona is active.
    pub fn mark_rendered(&mut self) {
        if self.phase == Phase::Idle && self.conversation.is_some() {
            self.phase = Phase::AwaitingInput;
        }
    }

    /// Append the user's message and enter streaming.
    ///
    /// Returns the full history to send to the completion service.
    pub fn submit(&mut self, text: &str) -> Result<Vec<Message>, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.is_streaming() {
            return Err(SessionError::Busy);
        }
        let conversation = self
            .conversation
            .as_mut()
            .ok_or(SessionError::NoActivePersona)?;

        conversation.append(Role::User, text);
        self.phase = Phase::Streaming;
        self.pending = Some(PendingReply::default());
        self.failed = None;
        debug!(
            "Session {}: submitted message, history length {}",
            self.id,
            conversation.len()
        );
        Ok(conversation.history().to_vec())
    }

    /// Add one fragment to the in-progress reply
    pub fn push_fragment(&mut self, fragment: &str) -> bool {
        match self.pending.as_mut() {
            Some(pending) if self.phase == Phase::Streaming => {
                pending.text.push_str(fragment);
                pending.fragments += 1;
                true
            }
            _ => {
                debug!("Session {}: dropped fragment outside of streaming", self.id);
                false
            }
        }
    }

    /// Store the accumulated reply as an assistant message
    pub fn finish_reply(&mut self) -> Option<&Message> {
        if self.phase != Phase::Streaming {
            return None;
        }
        let pending = self.pending.take().unwrap_or_default();
        self.phase = Phase::Idle;

        let conversation = self.conversation.as_mut()?;
        conversation.append(Role::Assistant, pending.text);
        info!(
            "Session {}: reply completed ({} fragment(s))",
            self.id, pending.fragments
        );
        conversation.history().last()
    }

    /// Abandon the in-progress reply. History keeps the user's message; the
    /// partial text is only kept in the failure marker.
    pub fn fail_reply(&mut self, error: CompletionServiceError) {
        if self.phase != Phase::Streaming {
            return;
        }
        let pending = self.pending.take().unwrap_or_default();
        warn!(
            "Session {}: reply failed after {} fragment(s): {error}",
            self.id, pending.fragments
        );
        self.failed = Some(FailedReply {
            partial: pending.text,
            error,
        });
        self.phase = Phase::Idle;
    }

    /// Apply one stream event
    pub fn apply(&mut self, event: StreamEvent) -> StreamProgress {
        if !self.is_streaming() {
            return StreamProgress::Ignored;
        }
        match event {
            StreamEvent::Fragment(text) => {
                self.push_fragment(&text);
                StreamProgress::Continuing
            }
            StreamEvent::Done => {
                self.finish_reply();
                StreamProgress::Completed
            }
            StreamEvent::Failed(e) => {
                self.fail_reply(e);
                StreamProgress::Failed
            }
        }
    }

    /// Submit `text` and drive the whole streamed reply, calling `on_fragment`
    /// for each fragment as it arrives.
    pub async fn run_exchange<F>(
        &mut self,
        client: &dyn CompletionClient,
        text: &str,
        mut on_fragment: F,
    ) -> Result<ExchangeOutcome, SessionError>
    where
        F: FnMut(&str),
    {
        let history = self.submit(text)?;

        let mut stream = match client.stream_completion(&history).await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail_reply(e);
                return Ok(self.failure_outcome());
            }
        };

        while let Some(event) = stream.next().await {
            if let StreamEvent::Fragment(text) = &event {
                on_fragment(text);
            }
            match self.apply(event) {
                StreamProgress::Completed => {
                    let reply = self
                        .history()
                        .last()
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    return Ok(ExchangeOutcome::Completed(reply));
                }
                StreamProgress::Failed => return Ok(self.failure_outcome()),
                StreamProgress::Continuing | StreamProgress::Ignored => {}
            }
        }

        self.fail_reply(CompletionServiceError::Interrupted);
        Ok(self.failure_outcome())
    }

    fn failure_outcome(&self) -> ExchangeOutcome {
        ExchangeOutcome::Failed(self.failed.clone().unwrap_or(FailedReply {
            partial: String::new(),
            error: CompletionServiceError::Interrupted,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::completion::scripted::ScriptedClient;

    fn session() -> ChatSession {
        ChatSession::new(Arc::new(PersonaRegistry::builtin()))
    }

    fn persona(session: &ChatSession, id: &str) -> Persona {
        session.registry().get_persona(id).unwrap().clone()
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let mut s = session();
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.history().is_empty());
        assert!(s.active_persona().is_none());

        // No persona yet: rendering does not open input
        s.mark_rendered();
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn test_select_initializes_history() {
        let mut s = session();
        let yun = persona(&s, "yun-dongju");

        assert_eq!(s.select_persona("yun-dongju"), Ok(true));
        assert_eq!(s.phase(), Phase::AwaitingInput);
        assert_eq!(
            s.history(),
            [Message::system(yun.system_prompt.clone()), Message::assistant(yun.greeting.clone())]
        );
        assert_eq!(s.active_persona().map(|p| p.id.as_str()), Some("yun-dongju"));
    }

    #[test]
    fn test_unknown_persona_is_an_error() {
        let mut s = session();
        let err = s.select_persona("shakespeare").unwrap_err();
        assert!(matches!(err, SessionError::UnknownPersona(_)));
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_blank_submission_rejected() {
        let mut s = session();
        s.select_persona("kim-sowol").unwrap();

        assert_eq!(s.submit(""), Err(SessionError::EmptyInput));
        assert_eq!(s.submit("   \n\t"), Err(SessionError::EmptyInput));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.phase(), Phase::AwaitingInput);
    }

    #[test]
    fn test_submit_without_persona() {
        let mut s = session();
        assert_eq!(s.submit("hello"), Err(SessionError::NoActivePersona));
    }

    #[test]
    fn test_streaming_blocks_submit_and_persona_switch() {
        let mut s = session();
        s.select_persona("yun-dongju").unwrap();
        let sent = s.submit("hello").unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent.last(), Some(&Message::user("hello")));
        assert_eq!(s.phase(), Phase::Streaming);

        assert_eq!(s.submit("again"), Err(SessionError::Busy));
        assert_eq!(s.select_persona("han-yongun"), Err(SessionError::Busy));
        assert_eq!(s.history().len(), 3);
    }

    #[test]
    fn test_fragments_accumulate_in_order() {
        let mut s = session();
        s.select_persona("yun-dongju").unwrap();
        s.submit("hello").unwrap();

        for part in ["하늘을 ", "우러러 ", "한 점 ", "부끄럼이 없기를"] {
            assert_eq!(
                s.apply(StreamEvent::Fragment(part.to_string())),
                StreamProgress::Continuing
            );
        }
        let pending = s.pending_reply().unwrap();
        assert_eq!(pending.text(), "하늘을 우러러 한 점 부끄럼이 없기를");
        assert_eq!(pending.fragments(), 4);
        // Not in history until done
        assert_eq!(s.history().len(), 3);

        assert_eq!(s.apply(StreamEvent::Done), StreamProgress::Completed);
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.pending_reply().is_none());
        assert_eq!(
            s.history().last(),
            Some(&Message::assistant("하늘을 우러러 한 점 부끄럼이 없기를"))
        );

        s.mark_rendered();
        assert_eq!(s.phase(), Phase::AwaitingInput);
    }

    #[test]
    fn test_events_outside_streaming_are_ignored() {
        let mut s = session();
        s.select_persona("yun-dongju").unwrap();
        assert_eq!(
            s.apply(StreamEvent::Fragment("stray".to_string())),
            StreamProgress::Ignored
        );
        assert_eq!(s.apply(StreamEvent::Done), StreamProgress::Ignored);
        assert!(!s.push_fragment("stray"));
        assert!(s.finish_reply().is_none());
        assert_eq!(s.history().len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_select_submit_reselect() {
        let mut s = session();
        let client = ScriptedClient::replying(&["오늘 밤도 ", "별이 ", "바람에 스치웁니다."]);
        let yun = persona(&s, "yun-dongju");

        s.select_persona("yun-dongju").unwrap();
        let mut seen = Vec::new();
        let outcome = s
            .run_exchange(&client, "hello", |f| seen.push(f.to_string()))
            .await
            .unwrap();

        let reply = "오늘 밤도 별이 바람에 스치웁니다.";
        assert_eq!(outcome, ExchangeOutcome::Completed(reply.to_string()));
        assert_eq!(seen.concat(), reply);
        assert_eq!(
            s.history(),
            [
                Message::system(yun.system_prompt.clone()),
                Message::assistant(yun.greeting.clone()),
                Message::user("hello"),
                Message::assistant(reply),
            ]
        );

        // The client saw the full history, system message first
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], s.history()[..3]);

        // Reselecting the same persona keeps everything
        let before = s.history().to_vec();
        assert_eq!(s.select_persona("yun-dongju"), Ok(false));
        assert_eq!(s.history(), before.as_slice());
    }

    #[tokio::test]
    async fn test_scenario_switch_persona_resets() {
        let mut s = session();
        let client = ScriptedClient::replying(&["reply"]);
        let han = persona(&s, "han-yongun");

        s.select_persona("yun-dongju").unwrap();
        s.run_exchange(&client, "hello", |_| {}).await.unwrap();
        assert_eq!(s.history().len(), 4);

        assert_eq!(s.select_persona("han-yongun"), Ok(true));
        assert_eq!(
            s.history(),
            [Message::system(han.system_prompt.clone()), Message::assistant(han.greeting.clone())]
        );
    }

    #[tokio::test]
    async fn test_successful_exchange_grows_history_by_two() {
        let mut s = session();
        let client = ScriptedClient::replying(&["a", "b", "c"]);
        s.select_persona("kim-sowol").unwrap();

        for turn in 1..=3 {
            let before = s.history().len();
            s.run_exchange(&client, &format!("turn {turn}"), |_| {}).await.unwrap();
            let history = s.history();
            assert_eq!(history.len(), before + 2);
            assert_eq!(history[before].role, Role::User);
            assert_eq!(history[before + 1], Message::assistant("abc"));
        }
    }

    #[tokio::test]
    async fn test_visible_history_never_contains_system() {
        let mut s = session();
        let client = ScriptedClient::replying(&["ok"]);
        assert!(s.visible_history().is_empty());

        s.select_persona("han-yongun").unwrap();
        assert!(s.visible_history().iter().all(|m| m.role != Role::System));

        s.run_exchange(&client, "님은 어디에 있습니까?", |_| {}).await.unwrap();
        let visible = s.visible_history();
        assert_eq!(visible.len(), 3);
        assert!(visible.iter().all(|m| m.role != Role::System));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_user_message() {
        let mut s = session();
        let client = ScriptedClient::with_script(vec![
            StreamEvent::Fragment("그립다 ".to_string()),
            StreamEvent::Fragment("말을".to_string()),
            StreamEvent::Failed(CompletionServiceError::Malformed("bad frame".to_string())),
        ]);
        s.select_persona("kim-sowol").unwrap();

        let outcome = s.run_exchange(&client, "hello", |_| {}).await.unwrap();
        let failed = FailedReply {
            partial: "그립다 말을".to_string(),
            error: CompletionServiceError::Malformed("bad frame".to_string()),
        };
        assert_eq!(outcome, ExchangeOutcome::Failed(failed.clone()));

        assert_eq!(s.history().len(), 3);
        assert_eq!(s.history().last(), Some(&Message::user("hello")));
        assert_eq!(s.failed_reply(), Some(&failed));
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_stream_counts_as_failure() {
        let mut s = session();
        // No terminal event: the producer just goes away
        let client = ScriptedClient::with_script(vec![StreamEvent::Fragment("half".to_string())]);
        s.select_persona("yun-dongju").unwrap();

        let outcome = s.run_exchange(&client, "hello", |_| {}).await.unwrap();
        match outcome {
            ExchangeOutcome::Failed(f) => {
                assert_eq!(f.partial, "half");
                assert_eq!(f.error, CompletionServiceError::Interrupted);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(s.history().len(), 3);
    }

    #[tokio::test]
    async fn test_open_failure_then_manual_resubmit() {
        let mut s = session();
        s.select_persona("yun-dongju").unwrap();

        let broken = ScriptedClient::failing_to_open(CompletionServiceError::Request(
            "401 Unauthorized".to_string(),
        ));
        let outcome = s.run_exchange(&broken, "first", |_| {}).await.unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Failed(_)));
        assert_eq!(s.history().len(), 3);

        // Resubmitting sends the earlier user message along with the new one
        let working = ScriptedClient::replying(&["welcome back"]);
        s.run_exchange(&working, "second", |_| {}).await.unwrap();
        assert!(s.failed_reply().is_none());

        let requests = working.requests();
        let sent = &requests[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2], Message::user("first"));
        assert_eq!(sent[3], Message::user("second"));
        assert_eq!(s.history().len(), 5);
    }

    #[tokio::test]
    async fn test_persona_switch_clears_failure() {
        let mut s = session();
        s.select_persona("yun-dongju").unwrap();
        let broken = ScriptedClient::failing_to_open(CompletionServiceError::Interrupted);
        s.run_exchange(&broken, "hello", |_| {}).await.unwrap();
        assert!(s.failed_reply().is_some());

        // Reselect keeps the marker, a switch clears it
        s.select_persona("yun-dongju").unwrap();
        assert!(s.failed_reply().is_some());
        s.select_persona("kim-sowol").unwrap();
        assert!(s.failed_reply().is_none());
    }

    #[tokio::test]
    async fn test_empty_submission_never_reaches_client() {
        let mut s = session();
        let client = ScriptedClient::replying(&["unused"]);
        s.select_persona("yun-dongju").unwrap();

        let err = s.run_exchange(&client, "  ", |_| {}).await.unwrap_err();
        assert_eq!(err, SessionError::EmptyInput);
        assert!(client.requests().is_empty());
    }
}
