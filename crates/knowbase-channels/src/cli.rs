use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use knowbase_core::channel::{Attachment, Channel, ChannelError, ChannelMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Quit,
    Upload(Vec<PathBuf>),
    Text(String),
}

fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed == "exit" || trimmed == "quit" {
        return Input::Quit;
    }
    if let Some(rest) = trimmed.strip_prefix("/upload")
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return Input::Upload(rest.split_whitespace().map(PathBuf::from).collect());
    }
    Input::Text(trimmed.to_owned())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Line-oriented terminal channel.
///
/// Questions are plain lines; `/upload <path>...` reads local files and
/// delivers them as attachments. `exit`, `quit`, or end of input closes the
/// channel.
pub struct CliChannel<R, W> {
    reader: R,
    writer: W,
    /// The terminal echoes the user's newline after the prompt.
    echo: bool,
    /// The cursor sits after `You: ` with no newline written yet.
    prompt_open: bool,
}

impl CliChannel<BufReader<Stdin>, Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        let echo = std::io::stdin().is_terminal();
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).with_echo(echo)
    }
}

impl<R, W> std::fmt::Debug for CliChannel<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliChannel").finish_non_exhaustive()
    }
}

impl<R, W> CliChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            echo: false,
            prompt_open: false,
        }
    }

    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        if self.prompt_open {
            self.writer.write_all(b"\n").await?;
            self.prompt_open = false;
        }
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_attachments(&mut self, paths: Vec<PathBuf>) -> Result<Vec<Attachment>, ChannelError> {
        let mut attachments = Vec::with_capacity(paths.len());
        for path in paths {
            match tokio::fs::read(&path).await {
                Ok(data) => attachments.push(Attachment {
                    file_name: file_name_of(&path),
                    data,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read upload");
                    self.write_line(&format!("Cannot read {}: {e}", path.display()))
                        .await?;
                }
            }
        }
        Ok(attachments)
    }
}

impl<R, W> Channel for CliChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<ChannelMessage>, ChannelError> {
        loop {
            if !self.prompt_open {
                self.writer.write_all(b"You: ").await?;
                self.writer.flush().await?;
                self.prompt_open = true;
            }

            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            if self.echo {
                self.prompt_open = false;
            }

            match parse_line(&line) {
                Input::Quit => return Ok(None),
                Input::Text(text) if text.is_empty() => {}
                Input::Text(text) => return Ok(Some(ChannelMessage::text(text))),
                Input::Upload(paths) if paths.is_empty() => {
                    self.write_line("Usage: /upload <path>...").await?;
                }
                Input::Upload(paths) => {
                    let attachments = self.read_attachments(paths).await?;
                    if !attachments.is_empty() {
                        return Ok(Some(ChannelMessage::upload(attachments)));
                    }
                }
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        self.write_line(&format!("Assistant: {text}")).await
    }

    async fn send_status(&mut self, text: &str) -> Result<(), ChannelError> {
        self.write_line(text).await
    }
}
