use super::types::{Chunk, Document};

/// Chunking parameters, measured in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub sentence_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
            sentence_aware: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split a document into chunks of at most `chunk_size` characters.
    ///
    /// Sentence-aware mode packs whole sentences and repeats trailing
    /// sentences up to `chunk_overlap` characters at the start of the next
    /// chunk. Sentences longer than a chunk are cut on character boundaries.
    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.content;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);

        let pieces = if self.config.sentence_aware {
            let pieces: Vec<String> = split_sentences(text)
                .into_iter()
                .flat_map(|s| {
                    if char_len(&s) > size {
                        split_chars(&s, size, 0)
                    } else {
                        vec![s]
                    }
                })
                .collect();
            merge_pieces(&pieces, size, overlap)
        } else {
            split_chars(text, size, overlap)
        };

        pieces
            .into_iter()
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, content)| Chunk {
                content,
                metadata: document.metadata.clone(),
                chunk_index: i,
            })
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let next = chars.peek().copied();

        let paragraph_break = c == '\n' && next == Some('\n');
        let sentence_end = matches!(c, '.' | '?' | '!') && next.is_some_and(char::is_whitespace);

        if paragraph_break {
            current.push('\n');
            chars.next();
        }
        if (paragraph_break || sentence_end) && !current.trim().is_empty() {
            sentences.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
}

/// Pack pieces into chunks no longer than `chunk_size`, carrying trailing
/// pieces of up to `chunk_overlap` characters into the next chunk.
fn merge_pieces(pieces: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: Vec<usize> = Vec::new();
    let mut window_len = 0;

    for (idx, piece) in pieces.iter().enumerate() {
        let len = char_len(piece);
        if !window.is_empty() && window_len + len > chunk_size {
            chunks.push(window.iter().map(|&i| pieces[i].as_str()).collect());

            let mut keep = 0;
            let mut kept_len = 0;
            for &i in window.iter().rev() {
                let l = char_len(&pieces[i]);
                if kept_len + l > chunk_overlap || kept_len + l + len > chunk_size {
                    break;
                }
                kept_len += l;
                keep += 1;
            }
            window.drain(..window.len() - keep);
            window_len = kept_len;
        }
        window.push(idx);
        window_len += len;
    }

    if !window.is_empty() {
        chunks.push(window.iter().map(|&i| pieces[i].as_str()).collect());
    }

    chunks
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
