//! Sentence-aware text splitter

use regex::Regex;

const DEFAULT_OVERLAP: usize = 200;

/// Splits text into character-budgeted chunks along sentence boundaries,
/// carrying a tail of the previous chunk forward as overlap.
pub struct SentenceSplitter {
    chunk_size: usize,
    overlap: usize,
    boundary: Regex,
    whitespace: Regex,
}

impl SentenceSplitter {
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: DEFAULT_OVERLAP.min(chunk_size / 4),
            boundary: Regex::new(r"[.!?]+(\s+|$)").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Split `text` into chunks along sentence boundaries. A chunk holds at
    /// most `chunk_size` characters of new text on top of the overlap carried
    /// from its predecessor; a single sentence above the budget is hard-split.
    pub fn split(&self, text: &str) -> Vec<String> {
        let normalized = self.whitespace.replace_all(text.trim(), " ").to_string();
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        // Length of the overlap prefix in `current`; a chunk that is still
        // pure carry must never be flushed on its own.
        let mut carry_len = 0usize;

        for sentence in self.sentences(&normalized) {
            let sentence_len = sentence.chars().count();

            if sentence_len > self.chunk_size {
                if current.chars().count() > carry_len {
                    chunks.push(current.trim().to_string());
                }
                current.clear();
                carry_len = 0;
                chunks.extend(self.hard_split(&sentence));
                continue;
            }

            let current_len = current.chars().count();
            if current_len > carry_len && current_len + sentence_len + 1 > self.chunk_size {
                chunks.push(current.trim().to_string());
                current = tail_chars(&current, self.overlap);
                carry_len = current.chars().count();
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
        }

        if current.chars().count() > carry_len && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut last = 0;

        for boundary in self.boundary.find_iter(text) {
            let sentence = text[last..boundary.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            last = boundary.end();
        }

        let remainder = text[last..].trim();
        if !remainder.is_empty() {
            sentences.push(remainder.to_string());
        }

        sentences
    }

    fn hard_split(&self, sentence: &str) -> Vec<String> {
        let chars: Vec<char> = sentence.chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|window| window.iter().collect::<String>().trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

/// Last `count` characters of `text`, starting at a character boundary.
fn tail_chars(text: &str, count: usize) -> String {
    let total = text.chars().count();
    if count == 0 || total == 0 {
        return String::new();
    }
    text.chars().skip(total.saturating_sub(count)).collect()
}
