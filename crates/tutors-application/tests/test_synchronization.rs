use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tutors_application::{ChatSession, SessionBackends, SyncOutcome, ToggleStep, TurnOutcome};
use tutors_core::backend::{
    ChatBackend, ChatReply, ChatRequest, ConversationSource, TranslationBackend,
    TranslationRequest,
};
use tutors_core::render::{BubbleKind, Renderer};
use tutors_core::session::{ChatMode, ConversationSnapshot, LanguagePair, MessageRole, Side};
use tutors_core::{Result, TutorsError};

/// Backend whose chat and translate replies are scripted per test.
#[derive(Default)]
struct ScriptedBackend {
    chat_replies: Mutex<VecDeque<Result<ChatReply>>>,
    translations: Mutex<VecDeque<Result<Vec<String>>>>,
    translate_requests: Mutex<Vec<TranslationRequest>>,
}

impl ScriptedBackend {
    fn reply(self, text: &str) -> Self {
        self.chat_replies.lock().unwrap().push_back(Ok(ChatReply {
            conversation_id: "conv-1".to_string(),
            assistant_text: text.to_string(),
        }));
        self
    }

    fn chat_fails(self) -> Self {
        self.chat_replies
            .lock()
            .unwrap()
            .push_back(Err(TutorsError::network("chat", "connection refused")));
        self
    }

    fn translates(self, texts: &[&str]) -> Self {
        self.translations
            .lock()
            .unwrap()
            .push_back(Ok(texts.iter().map(|t| t.to_string()).collect()));
        self
    }

    fn translate_fails(self) -> Self {
        self.translations
            .lock()
            .unwrap()
            .push_back(Err(TutorsError::network("translate", "timed out")));
        self
    }

    fn pending_chat_replies(&self) -> usize {
        self.chat_replies.lock().unwrap().len()
    }

    fn translate_calls(&self) -> Vec<TranslationRequest> {
        self.translate_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_chat(&self, _request: &ChatRequest) -> Result<ChatReply> {
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TutorsError::internal("no scripted chat reply")))
    }
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    async fn translate(&self, request: &TranslationRequest) -> Result<Vec<String>> {
        self.translate_requests.lock().unwrap().push(request.clone());
        self.translations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TutorsError::internal("no scripted translation")))
    }
}

#[async_trait]
impl ConversationSource for ScriptedBackend {
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationSnapshot> {
        Err(TutorsError::not_found("conversation", conversation_id))
    }
}

fn es_en_session(backend: &Arc<ScriptedBackend>) -> ChatSession {
    ChatSession::new(
        LanguagePair::parse("es", "en").unwrap(),
        ChatMode::Chat,
        SessionBackends::shared(backend.clone()),
    )
    .with_renderer(Renderer::utc())
}

fn texts(session: &ChatSession, side: Side) -> Vec<String> {
    session
        .store()
        .sequence(side)
        .iter()
        .map(|m| m.text().to_string())
        .collect()
}

#[tokio::test]
async fn test_toggle_on_empty_conversation_shows_welcome_without_fetch() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut session = es_en_session(&backend);

    let outcome = session.toggle_display_language().await.unwrap();

    assert_eq!(outcome, SyncOutcome::AlreadySynced);
    assert!(backend.translate_calls().is_empty());
    let view = session.render();
    assert!(view.is_welcome());
    assert_eq!(view.display_lang, "en");
    assert_eq!(
        view.bubbles[0].text,
        "Hi! Send a message to start the conversation."
    );
}

#[tokio::test]
async fn test_single_user_message_is_translated_on_toggle() {
    let backend = Arc::new(ScriptedBackend::default().chat_fails().translates(&["Hello"]));
    let mut session = es_en_session(&backend);

    // The failed exchange leaves only the user message
    let outcome = session.send("Hola").await.unwrap().unwrap();
    assert!(matches!(outcome, TurnOutcome::Failed(_)));
    assert_eq!(session.store().len(Side::Primary), 1);
    assert_eq!(session.store().len(Side::Secondary), 0);

    let outcome = session.toggle_display_language().await.unwrap();

    assert_eq!(outcome, SyncOutcome::Merged { appended: 1 });
    let calls = backend.translate_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, vec!["Hola"]);
    assert_eq!(calls[0].source_lang, "es");
    assert_eq!(calls[0].target_lang, "en");
    assert_eq!(texts(&session, Side::Secondary), vec!["Hello"]);
    assert_eq!(
        session.store().len(Side::Primary),
        session.store().len(Side::Secondary)
    );
}

#[tokio::test]
async fn test_misaligned_translation_leaves_transcripts_untouched() {
    let backend = Arc::new(ScriptedBackend::default().reply("¡Hola! ¿Qué tal?").translates(&["Hello"]));
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();
    assert_eq!(session.store().len(Side::Primary), 2);

    let err = session.toggle_display_language().await.unwrap_err();

    assert_eq!(err, TutorsError::translation_mismatch(2, 1));
    assert!(err.is_recoverable());
    assert_eq!(backend.translate_calls()[0].text.len(), 2);
    assert_eq!(session.store().len(Side::Primary), 2);
    assert_eq!(session.store().len(Side::Secondary), 0);

    // The view falls back to the Spanish transcript
    let view = session.render();
    assert!(view.is_fallback());
    assert!(!view.busy);
    assert_eq!(view.bubbles.len(), 2);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_repeated_toggles_issue_one_request() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .reply("¡Hola!")
            .translates(&["Hello", "Hi!"]),
    );
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();

    let outcomes = [
        session.toggle_display_language().await.unwrap(),
        session.toggle_display_language().await.unwrap(),
        session.toggle_display_language().await.unwrap(),
        session.toggle_display_language().await.unwrap(),
    ];

    assert_eq!(outcomes[0], SyncOutcome::Merged { appended: 2 });
    assert!(outcomes[1..].iter().all(|o| *o == SyncOutcome::AlreadySynced));
    assert_eq!(backend.translate_calls().len(), 1);
    assert_eq!(session.store().display_lang(), "es");
}

#[tokio::test]
async fn test_translated_messages_keep_role_order_and_timestamp() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .reply("Muy bien")
            .translates(&["How are you?", "Very well"]),
    );
    let mut session = es_en_session(&backend);
    session.send("¿Qué tal?").await.unwrap();

    session.toggle_display_language().await.unwrap();

    let primary = session.store().sequence(Side::Primary);
    let secondary = session.store().sequence(Side::Secondary);
    assert_eq!(secondary.len(), 2);
    assert_eq!(secondary[0].text(), "How are you?");
    assert_eq!(secondary[1].text(), "Very well");
    for (original, translated) in primary.iter().zip(secondary) {
        assert_eq!(original.role(), translated.role());
        assert_eq!(original.timestamp(), translated.timestamp());
    }
}

#[tokio::test]
async fn test_only_trailing_delta_is_translated_after_new_turns() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .reply("¡Hola!")
            .translates(&["Hello", "Hi!"])
            .reply("Nice to meet you")
            .translates(&["I'm Ana", "Encantada"]),
    );
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();
    session.toggle_display_language().await.unwrap();

    // Continue in English, then come back to Spanish
    session.send("I'm Ana").await.unwrap();
    let mut lengths = vec![(session.store().len(Side::Primary), session.store().len(Side::Secondary))];
    session.toggle_display_language().await.unwrap();
    lengths.push((session.store().len(Side::Primary), session.store().len(Side::Secondary)));

    let calls = backend.translate_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].text, vec!["I'm Ana", "Nice to meet you"]);
    assert_eq!(calls[1].source_lang, "en");
    assert_eq!(calls[1].target_lang, "es");
    assert_eq!(lengths, vec![(2, 4), (4, 4)]);
    assert_eq!(
        texts(&session, Side::Primary),
        vec!["Hola", "¡Hola!", "I'm Ana", "Encantada"]
    );
}

#[tokio::test]
async fn test_translation_failure_keeps_lengths() {
    let backend = Arc::new(ScriptedBackend::default().reply("¡Hola!"));
    backend
        .translations
        .lock()
        .unwrap()
        .push_back(Err(TutorsError::network("translate", "timed out")));
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();

    let err = session.toggle_display_language().await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(session.store().len(Side::Primary), 2);
    assert_eq!(session.store().len(Side::Secondary), 0);
    assert_eq!(session.store().display_lang(), "en");
}

#[tokio::test]
async fn test_second_toggle_during_sync_is_ignored() {
    let backend = Arc::new(ScriptedBackend::default().reply("¡Hola!"));
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();

    let ToggleStep::Translate(plan) = session.begin_toggle().unwrap() else {
        panic!("expected a translation");
    };
    assert!(session.render().busy);
    assert_eq!(
        session.begin_toggle().unwrap(),
        ToggleStep::Finished(SyncOutcome::Ignored)
    );
    assert_eq!(session.store().display_lang(), "en");

    let outcome = session
        .finish_toggle(plan, Ok(vec!["Hello".to_string(), "Hi!".to_string()]))
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Merged { appended: 2 });
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_translation_arriving_after_reset_is_discarded() {
    let backend = Arc::new(ScriptedBackend::default().reply("¡Hola!"));
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();

    let ToggleStep::Translate(plan) = session.begin_toggle().unwrap() else {
        panic!("expected a translation");
    };
    session.start_new_conversation();
    let outcome = session
        .finish_toggle(plan, Ok(vec!["Hello".to_string(), "Hi!".to_string()]))
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Stale);
    assert!(session.store().is_empty());
    assert!(session.render().is_welcome());
}

#[tokio::test]
async fn test_chat_failure_notice_is_never_translated() {
    let backend = Arc::new(ScriptedBackend::default().chat_fails().translates(&["Hello"]));
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();

    let view = session.render();
    let kinds: Vec<_> = view.bubbles.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![BubbleKind::User, BubbleKind::Notice]);

    session.toggle_display_language().await.unwrap();

    assert_eq!(backend.translate_calls()[0].text, vec!["Hola"]);
    let view = session.render();
    assert_eq!(view.bubbles.len(), 1);
    assert_eq!(view.bubbles[0].kind, BubbleKind::User);
    assert_eq!(session.store().sequence(Side::Secondary)[0].role(), MessageRole::User);
}

#[tokio::test]
async fn test_turn_after_failed_sync_catches_up_first() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .reply("¡Hola!")
            .translate_fails()
            .translates(&["Hello", "Hi!"])
            .reply("Fine")
            .translates(&["¿Cómo estás?", "Bien"]),
    );
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();
    assert!(session.toggle_display_language().await.is_err());
    assert_eq!(session.store().len(Side::Secondary), 0);

    // Sending in the lagging transcript translates the missing turns before the turn
    session.send("How are you?").await.unwrap();
    assert_eq!(
        texts(&session, Side::Secondary),
        vec!["Hello", "Hi!", "How are you?", "Fine"]
    );

    let back = session.toggle_display_language().await.unwrap();
    let again = session.toggle_display_language().await.unwrap();

    assert_eq!(back, SyncOutcome::Merged { appended: 2 });
    assert_eq!(again, SyncOutcome::AlreadySynced);
    assert_eq!(
        texts(&session, Side::Primary),
        vec!["Hola", "¡Hola!", "¿Cómo estás?", "Bien"]
    );
    let calls: Vec<Vec<String>> = backend
        .translate_calls()
        .into_iter()
        .map(|call| call.text)
        .collect();
    assert_eq!(
        calls,
        vec![
            vec!["Hola".to_string(), "¡Hola!".to_string()],
            vec!["Hola".to_string(), "¡Hola!".to_string()],
            vec!["How are you?".to_string(), "Fine".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_turn_refused_when_catch_up_fails() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .reply("¡Hola!")
            .translate_fails()
            .translate_fails()
            .reply("Fine"),
    );
    let mut session = es_en_session(&backend);
    session.send("Hola").await.unwrap();
    assert!(session.toggle_display_language().await.is_err());

    let err = session.send("How are you?").await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(session.store().len(Side::Primary), 2);
    assert_eq!(session.store().len(Side::Secondary), 0);
    assert_eq!(backend.pending_chat_replies(), 1);
    assert!(!session.is_busy());

    // The synchronous half refuses as well
    let err = session.begin_turn("How are you?").unwrap_err();
    assert!(matches!(err, TutorsError::Unsynced { missing: 2, .. }));
}
