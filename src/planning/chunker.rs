//! Corpus chunking for the completion service's input limit

use url::Url;

use crate::ingestion::{Corpus, Page};

/// Smallest chunk budget accepted; smaller values are raised to this
pub const MIN_CHUNK_CHARS: usize = 256;

const SECTION_SEPARATOR: &str = "\n\n";

/// A bounded slice of corpus text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence, starting at 0
    pub index: usize,
    pub text: String,
    /// Pages that contributed to this chunk, in corpus order
    pub sources: Vec<Url>,
}

/// Split the corpus into chunks of at most `budget` characters.
///
/// Whole pages are packed together while they fit. A page larger than the
/// budget is split on line boundaries, each piece carrying the page header so
/// the completion service still knows where the text came from.
pub fn chunk_corpus(corpus: &Corpus, budget: usize) -> Vec<Chunk> {
    let budget = budget.max(MIN_CHUNK_CHARS);
    let mut packer = Packer::new(budget);

    for page in corpus.pages.iter().filter(|p| !p.text.trim().is_empty()) {
        let header = page_header(page);
        let section = format!("{header}\n{}", page.text);

        if char_len(&section) <= budget {
            packer.add(section, &page.url);
            continue;
        }

        packer.flush();
        let body_budget = budget.saturating_sub(char_len(&header) + 1).max(MIN_CHUNK_CHARS / 2);
        for piece in split_text(&page.text, body_budget) {
            packer.add_alone(format!("{header}\n{piece}"), &page.url);
        }
    }

    packer.finish()
}

fn page_header(page: &Page) -> String {
    match &page.title {
        Some(title) => format!("Source: {}\nTitle: {title}\n", page.url),
        None => format!("Source: {}\n", page.url),
    }
}

struct Packer {
    budget: usize,
    chunks: Vec<Chunk>,
    text: String,
    sources: Vec<Url>,
}

impl Packer {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            chunks: Vec::new(),
            text: String::new(),
            sources: Vec::new(),
        }
    }

    fn add(&mut self, section: String, source: &Url) {
        let needed = if self.text.is_empty() {
            char_len(&section)
        } else {
            char_len(&self.text) + SECTION_SEPARATOR.len() + char_len(&section)
        };
        if needed > self.budget {
            self.flush();
        }
        if !self.text.is_empty() {
            self.text.push_str(SECTION_SEPARATOR);
        }
        self.text.push_str(&section);
        if !self.sources.contains(source) {
            self.sources.push(source.clone());
        }
    }

    fn add_alone(&mut self, section: String, source: &Url) {
        self.flush();
        self.add(section, source);
        self.flush();
    }

    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        self.chunks.push(Chunk {
            index: self.chunks.len(),
            text: std::mem::take(&mut self.text),
            sources: std::mem::take(&mut self.sources),
        });
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Split on line boundaries; a single line longer than `budget` is cut at
/// character boundaries
fn split_text(text: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line_len = char_len(line);
        if line_len > budget {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = line.chars().collect();
            for slice in chars.chunks(budget) {
                pieces.push(slice.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            line_len
        } else {
            char_len(&current) + 1 + line_len
        };
        if needed > budget {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
