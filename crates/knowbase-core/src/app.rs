use knowbase_llm::provider::{EmbeddingProvider, LlmProvider};
use knowbase_memory::IndexBuilder;
use tokio::sync::{mpsc, watch};

use crate::channel::{Attachment, Channel};
use crate::query::QueryEngine;
use crate::session::{SessionContext, SessionError, SessionState};

pub const TITLE: &str = "Personal Knowledge Base Agent";
pub const DEMO_NOTICE: &str = "Demo App - Files are temporary and not persisted between sessions";
pub const LARGE_FILE_TIP: &str = "Tip: Large files (>10MB) may take 30-60s to process";
pub const UPLOAD_PROMPT: &str = "Upload your documents to get started";
pub const FILES_UPLOADED: &str = "Files uploaded!";
pub const PROCESSING_NOTICE: &str =
    "Processing documents... This may take 10-60s depending on file size";
pub const READY_NOTICE: &str = "Ready! Ask me anything.";

const HELP_TEXT: &str = "Commands:\n  \
/upload <path>...  add documents\n  \
/docs              list uploaded documents\n  \
/help              show this help\n\
Anything else is a question about your documents.";

/// Event loop that routes channel input to the session handlers.
pub struct App<C, P, E> {
    channel: C,
    session: SessionContext,
    builder: IndexBuilder<E>,
    engine: QueryEngine<P, E>,
    status_rx: Option<mpsc::UnboundedReceiver<String>>,
    shutdown: watch::Receiver<bool>,
}

async fn shutdown_signal(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl<C: Channel, P: LlmProvider, E: EmbeddingProvider> App<C, P, E> {
    #[must_use]
    pub fn new(
        channel: C,
        session: SessionContext,
        builder: IndexBuilder<E>,
        engine: QueryEngine<P, E>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            channel,
            session,
            builder,
            engine,
            status_rx: None,
            shutdown,
        }
    }

    /// Receiver paired with the status sender given to the index builder.
    #[must_use]
    pub fn with_status_rx(mut self, rx: mpsc::UnboundedReceiver<String>) -> Self {
        self.status_rx = Some(rx);
        self
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Run until the channel closes or shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel fails. Indexing and query failures are
    /// reported to the user and do not stop the loop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.channel.send_status(TITLE).await?;
        self.channel.send_status(DEMO_NOTICE).await?;
        self.channel.send_status(LARGE_FILE_TIP).await?;
        self.channel.send_status(UPLOAD_PROMPT).await?;

        loop {
            let incoming = tokio::select! {
                result = self.channel.recv() => result?,
                () = shutdown_signal(&mut self.shutdown) => {
                    tracing::info!("shutting down");
                    break;
                }
            };
            let Some(msg) = incoming else { break };

            if msg.is_upload() {
                self.handle_upload(&msg.attachments).await?;
                continue;
            }

            let text = msg.text.trim();
            if text.is_empty() {
                continue;
            }
            match text {
                "/docs" => self.handle_docs().await?,
                "/help" => self.channel.send_status(HELP_TEXT).await?,
                _ => self.handle_question(text).await?,
            }
        }

        Ok(())
    }

    async fn handle_upload(&mut self, files: &[Attachment]) -> anyhow::Result<()> {
        let outcome = match self.session.handle_upload(files).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "upload failed");
                self.channel
                    .send_status(&format!("Upload failed: {e}"))
                    .await?;
                return Ok(());
            }
        };

        if outcome.changed() {
            self.channel.send_status(FILES_UPLOADED).await?;
        }
        if !outcome.skipped.is_empty() {
            self.channel
                .send_status(&format!("Already uploaded: {}", outcome.skipped.join(", ")))
                .await?;
        }
        if !outcome.rejected.is_empty() {
            self.channel
                .send_status(&format!("Rejected: {}", outcome.rejected.join(", ")))
                .await?;
        }
        self.channel
            .send_status(&format!("{} document(s) loaded", outcome.document_count))
            .await?;

        if self.session.state() == SessionState::ReadyToBuild {
            self.build_index().await?;
        }
        Ok(())
    }

    /// Build the index, forwarding builder progress while it runs.
    ///
    /// Returns `false` if the build failed; the failure has been reported.
    async fn build_index(&mut self) -> anyhow::Result<bool> {
        self.channel.send_status(PROCESSING_NOTICE).await?;

        let result = {
            let build = self.session.ensure_index(&self.builder);
            tokio::pin!(build);
            loop {
                let Some(rx) = self.status_rx.as_mut() else {
                    break build.await;
                };
                tokio::select! {
                    res = &mut build => break res,
                    Some(notice) = rx.recv() => {
                        self.channel.send_status(&notice).await?;
                    }
                }
            }
        };

        if let Some(rx) = self.status_rx.as_mut() {
            while let Ok(notice) = rx.try_recv() {
                self.channel.send_status(&notice).await?;
            }
        }

        match result {
            Ok(_) => {
                self.channel.send_status(READY_NOTICE).await?;
                Ok(true)
            }
            Err(e) => {
                tracing::error!(error = %e, "index build failed");
                self.channel
                    .send_status(&format!("Failed to process documents: {e}"))
                    .await?;
                Ok(false)
            }
        }
    }

    async fn handle_docs(&mut self) -> anyhow::Result<()> {
        let docs = match self.session.documents().await {
            Ok(docs) => docs,
            Err(e) => {
                self.channel
                    .send_status(&format!("Failed to list documents: {e}"))
                    .await?;
                return Ok(());
            }
        };
        if docs.is_empty() {
            self.channel.send_status(UPLOAD_PROMPT).await?;
        } else {
            let mut text = format!("{} document(s) loaded", docs.len());
            for name in &docs {
                text.push_str("\n  ");
                text.push_str(name);
            }
            self.channel.send_status(&text).await?;
        }
        Ok(())
    }

    async fn handle_question(&mut self, text: &str) -> anyhow::Result<()> {
        match self.session.state() {
            SessionState::Uninitialized | SessionState::Empty => {
                self.channel.send_status(UPLOAD_PROMPT).await?;
                return Ok(());
            }
            SessionState::ReadyToBuild => {
                if !self.build_index().await? {
                    return Ok(());
                }
            }
            SessionState::Active => {}
        }

        self.channel.send_typing().await?;
        match self.session.handle_message(text, &self.engine).await {
            Ok(_) | Err(SessionError::Query(_)) => {
                if let Some(reply) = self.session.last_reply() {
                    self.channel.send(reply).await?;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "message not handled");
                self.channel.send_status(&e.to_string()).await?;
            }
        }
        Ok(())
    }
}
