use std::future::Future;

/// Typed error for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file supplied with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Incoming message from a channel.
///
/// A message with attachments is an upload; its text, if any, is ignored.
#[derive(Debug, Clone, Default)]
pub struct ChannelMessage {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl ChannelMessage {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn upload(attachments: Vec<Attachment>) -> Self {
        Self {
            text: String::new(),
            attachments,
        }
    }

    #[must_use]
    pub fn is_upload(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// Bidirectional conversational interface.
pub trait Channel: Send {
    /// Receive the next message. Returns `None` on EOF or shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn recv(&mut self)
    -> impl Future<Output = Result<Option<ChannelMessage>, ChannelError>> + Send;

    /// Send an assistant turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Send a short system notice (upload confirmations, build progress).
    ///
    /// Defaults to [`Channel::send`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn send_status(&mut self, text: &str) -> impl Future<Output = Result<(), ChannelError>> + Send {
        self.send(text)
    }

    /// Send a typing indicator. No-op by default.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn send_typing(&mut self) -> impl Future<Output = Result<(), ChannelError>> + Send {
        async { Ok(()) }
    }
}
