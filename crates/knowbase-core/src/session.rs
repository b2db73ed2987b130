//! Per-session state: the document store, the index handle, and the chat
//! transcript, with one handler per kind of user interaction.
//!
//! ```text
//! Uninitialized --start--> Empty --upload(new file)--> ReadyToBuild --ensure_index--> Active
//!                                                          ^                          |
//!                                                          +------upload(new file)----+
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use knowbase_llm::provider::{EmbeddingProvider, LlmProvider, Message};
use knowbase_memory::{DocumentError, DocumentStore, IndexBuilder, IndexError, VectorIndex};

use crate::channel::Attachment;
use crate::query::{QueryEngine, QueryError, QueryResult};

/// Number of most recent messages passed to the query engine.
pub const HISTORY_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Empty,
    ReadyToBuild,
    Active,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,

    #[error("no documents uploaded")]
    NoDocuments,

    #[error("documents are not indexed yet")]
    NotReady,

    #[error(transparent)]
    Store(#[from] DocumentError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Names written as new files.
    pub added: Vec<String>,
    /// Names that already existed in the store; their content was kept.
    pub skipped: Vec<String>,
    /// Names refused by the store (empty, hidden, or directory-only).
    pub rejected: Vec<String>,
    /// Documents in the store after the upload.
    pub document_count: usize,
}

impl UploadOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

/// The trailing [`HISTORY_WINDOW`] messages, in original order.
#[must_use]
pub fn history_window(messages: &[Message]) -> &[Message] {
    &messages[messages.len().saturating_sub(HISTORY_WINDOW)..]
}

/// Fold recent turns and the current question into the query text.
#[must_use]
pub fn compose_prompt(window: &[Message], question: &str) -> String {
    let history = window
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Previous conversation:\n{history}\n\nCurrent question: {question}")
}

/// Transcript text for a successful answer.
#[must_use]
pub fn render_reply(result: &QueryResult) -> String {
    let mut out = result.answer.clone();
    let _ = write!(
        out,
        "\n\n_Response time: {:.2}s_",
        result.elapsed.as_secs_f64()
    );
    out
}

/// Transcript text for a failed query.
#[must_use]
pub fn render_error(error: &QueryError) -> String {
    format!("Sorry, I encountered an error: {error}. Please try again.")
}

pub struct SessionContext {
    store: DocumentStore,
    index: Option<Arc<VectorIndex>>,
    history: Vec<Message>,
    state: SessionState,
}

impl SessionContext {
    #[must_use]
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            index: None,
            history: Vec::new(),
            state: SessionState::Uninitialized,
        }
    }

    /// Create a session and clear any documents left by a previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the document directory cannot be cleared.
    pub async fn start(store: DocumentStore) -> Result<Self, SessionError> {
        let mut session = Self::new(store);
        session.initialize().await?;
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns an error if the document directory cannot be cleared.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        let removed = self.store.clear().await?;
        self.index = None;
        self.history.clear();
        self.state = SessionState::Empty;
        tracing::info!(
            dir = %self.store.root().display(),
            removed,
            "session started"
        );
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    #[must_use]
    pub fn index(&self) -> Option<&Arc<VectorIndex>> {
        self.index.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn documents(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.store.list().await?)
    }

    fn invalidate(&mut self) {
        if let Some(old) = self.index.take() {
            tracing::info!(index = %old.id(), "document set changed, discarding index");
        }
        self.state = SessionState::ReadyToBuild;
    }

    /// Store each file that is not already present.
    ///
    /// Any new file discards the current index.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotStarted`] before [`SessionContext::start`],
    /// or a store error if a write fails. Files written before the failure
    /// stay stored and the index is still discarded.
    pub async fn handle_upload(
        &mut self,
        files: &[Attachment],
    ) -> Result<UploadOutcome, SessionError> {
        if self.state == SessionState::Uninitialized {
            return Err(SessionError::NotStarted);
        }

        let mut outcome = UploadOutcome::default();
        for file in files {
            match self.store.add(&file.file_name, &file.data).await {
                Ok(true) => outcome.added.push(file.file_name.clone()),
                Ok(false) => outcome.skipped.push(file.file_name.clone()),
                Err(DocumentError::InvalidName(name)) => {
                    tracing::warn!(name = %name, "rejected upload with invalid name");
                    outcome.rejected.push(name);
                }
                Err(e) => {
                    if outcome.changed() {
                        self.invalidate();
                    }
                    return Err(e.into());
                }
            }
        }

        if outcome.changed() {
            self.invalidate();
        }
        outcome.document_count = self.store.list().await?.len();
        Ok(outcome)
    }

    /// Return the live index, building it first if the document set changed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDocuments`] when nothing has been uploaded
    /// and propagates build failures, leaving the session ready to retry.
    pub async fn ensure_index<E: EmbeddingProvider>(
        &mut self,
        builder: &IndexBuilder<E>,
    ) -> Result<Arc<VectorIndex>, SessionError> {
        if let (SessionState::Active, Some(index)) = (self.state, &self.index) {
            return Ok(Arc::clone(index));
        }
        match self.state {
            SessionState::Uninitialized => Err(SessionError::NotStarted),
            SessionState::Empty => Err(SessionError::NoDocuments),
            SessionState::Active | SessionState::ReadyToBuild => {
                let index = Arc::new(builder.build(&self.store).await?);
                self.index = Some(Arc::clone(&index));
                self.state = SessionState::Active;
                Ok(index)
            }
        }
    }

    /// Answer one user message against the current index.
    ///
    /// The user turn and the rendered reply (answer or error notice) are both
    /// appended to the history. A failed query leaves the session active.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] without touching the history when no
    /// index is live, and [`SessionError::Query`] when retrieval or
    /// generation fails.
    pub async fn handle_message<P: LlmProvider, E: EmbeddingProvider>(
        &mut self,
        text: &str,
        engine: &QueryEngine<P, E>,
    ) -> Result<QueryResult, SessionError> {
        let index = match (&self.state, &self.index) {
            (SessionState::Active, Some(index)) => Arc::clone(index),
            _ => return Err(SessionError::NotReady),
        };

        self.history.push(Message::user(text));
        let prompt = compose_prompt(history_window(&self.history), text);

        match engine.query(&index, &prompt).await {
            Ok(result) => {
                self.history.push(Message::assistant(render_reply(&result)));
                Ok(result)
            }
            Err(e) => {
                tracing::error!(error = %e, "query failed");
                self.history.push(Message::assistant(render_error(&e)));
                Err(e.into())
            }
        }
    }

    /// Content of the most recent assistant turn.
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == knowbase_llm::Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use knowbase_llm::mock::{MockEmbedder, MockProvider};
    use knowbase_memory::IndexerConfig;

    use super::*;

    fn attachment(name: &str, data: &str) -> Attachment {
        Attachment {
            file_name: name.into(),
            data: data.as_bytes().to_vec(),
        }
    }

    fn builder() -> IndexBuilder<MockEmbedder> {
        IndexBuilder::new(MockEmbedder::default(), IndexerConfig::default())
    }

    #[test]
    fn window_keeps_last_six_in_order() {
        let messages: Vec<Message> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("q{i}"))
                } else {
                    Message::assistant(format!("a{i}"))
                }
            })
            .collect();
        let window = history_window(&messages);
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q4", "a5", "q6", "a7", "q8", "a9"]);
    }

    #[test]
    fn window_of_short_history_is_whole_history() {
        let messages = vec![Message::user("only")];
        assert_eq!(history_window(&messages).len(), 1);
        assert!(history_window(&[]).is_empty());
    }

    #[test]
    fn composite_prompt_format() {
        let window = vec![Message::user("hi"), Message::assistant("hello")];
        assert_eq!(
            compose_prompt(&window, "next?"),
            "Previous conversation:\nuser: hi\nassistant: hello\n\nCurrent question: next?"
        );
    }

    #[test]
    fn reply_rendering() {
        let result = QueryResult {
            answer: "Paris".into(),
            sources: Vec::new(),
            elapsed: Duration::from_millis(1234),
        };
        assert_eq!(render_reply(&result), "Paris\n\n_Response time: 1.23s_");

        let err = QueryError::Generation(knowbase_llm::LlmError::Other("down".into()));
        assert_eq!(
            render_error(&err),
            "Sorry, I encountered an error: failed to generate answer: down. Please try again."
        );
    }

    #[tokio::test]
    async fn start_clears_previous_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stale.txt"), "old").unwrap();
        let session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn operations_before_start_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::new(DocumentStore::new(dir.path()));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(matches!(
            session.handle_upload(&[attachment("a.txt", "a")]).await,
            Err(SessionError::NotStarted)
        ));
        assert!(matches!(
            session.ensure_index(&builder()).await,
            Err(SessionError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn empty_session_cannot_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        let b = builder();
        assert!(matches!(
            session.ensure_index(&b).await,
            Err(SessionError::NoDocuments)
        ));
        assert_eq!(b.embedder().batch_count(), 0);
    }

    #[tokio::test]
    async fn upload_outcome_reports_added_skipped_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();

        let first = session
            .handle_upload(&[attachment("a.txt", "a"), attachment(".env", "secret")])
            .await
            .unwrap();
        assert_eq!(first.added, vec!["a.txt"]);
        assert_eq!(first.rejected, vec![".env"]);
        assert_eq!(first.document_count, 1);
        assert_eq!(session.state(), SessionState::ReadyToBuild);

        let second = session
            .handle_upload(&[attachment("a.txt", "changed"), attachment("b.txt", "b")])
            .await
            .unwrap();
        assert_eq!(second.added, vec!["b.txt"]);
        assert_eq!(second.skipped, vec!["a.txt"]);
        assert_eq!(second.document_count, 2);
    }

    #[tokio::test]
    async fn duplicate_only_upload_keeps_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        session
            .handle_upload(&[attachment("a.txt", "alpha")])
            .await
            .unwrap();
        let b = builder();
        let first = session.ensure_index(&b).await.unwrap();

        let outcome = session
            .handle_upload(&[attachment("a.txt", "alpha again")])
            .await
            .unwrap();
        assert!(!outcome.changed());
        assert_eq!(session.state(), SessionState::Active);
        let again = session.ensure_index(&b).await.unwrap();
        assert_eq!(first.id(), again.id());
        assert_eq!(b.embedder().batch_count(), 1);
    }

    #[tokio::test]
    async fn new_upload_discards_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        session
            .handle_upload(&[attachment("a.txt", "alpha")])
            .await
            .unwrap();
        let b = builder();
        let first = session.ensure_index(&b).await.unwrap();

        session
            .handle_upload(&[attachment("b.txt", "beta")])
            .await
            .unwrap();
        assert!(session.index().is_none());
        assert_eq!(session.state(), SessionState::ReadyToBuild);

        let second = session.ensure_index(&b).await.unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(second.document_count(), 2);
    }

    #[tokio::test]
    async fn message_before_index_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        let engine = QueryEngine::new(MockProvider::default(), MockEmbedder::default());
        assert!(matches!(
            session.handle_message("hello", &engine).await,
            Err(SessionError::NotReady)
        ));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn failed_query_is_rendered_and_session_stays_active() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        session
            .handle_upload(&[attachment("a.txt", "alpha")])
            .await
            .unwrap();
        session.ensure_index(&builder()).await.unwrap();

        let engine = QueryEngine::new(MockProvider::failing(), MockEmbedder::default());
        let result = session.handle_message("what?", &engine).await;
        assert!(matches!(
            result,
            Err(SessionError::Query(QueryError::Generation(_)))
        ));
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.history().len(), 2);
        let reply = session.last_reply().unwrap();
        assert!(reply.starts_with("Sorry, I encountered an error: "));
        assert!(reply.ends_with(". Please try again."));
    }

    #[tokio::test]
    async fn successful_query_appends_rendered_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionContext::start(DocumentStore::new(dir.path()))
            .await
            .unwrap();
        session
            .handle_upload(&[attachment("a.txt", "alpha")])
            .await
            .unwrap();
        session.ensure_index(&builder()).await.unwrap();

        let engine = QueryEngine::new(
            MockProvider::with_responses(vec!["the answer".into()]),
            MockEmbedder::default(),
        );
        let result = session.handle_message("question", &engine).await.unwrap();
        assert_eq!(result.answer, "the answer");
        assert_eq!(session.history()[0], Message::user("question"));
        assert!(
            session
                .last_reply()
                .unwrap()
                .starts_with("the answer\n\n_Response time: ")
        );

        let sent = &engine.provider().calls()[0].messages[0].content;
        assert!(sent.contains("Previous conversation:\nuser: question\n\nCurrent question: question"));
    }
}
