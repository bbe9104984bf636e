//! Sentence segmentation and normalization helpers

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

static BULLETS_AND_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[•\t\n]+").expect("valid bullet regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r\f]*\n").expect("valid paragraph regex"));
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*]|\d+[.)])\s+").expect("valid list marker regex"));
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename regex"));

/// Minimum number of whitespace-delimited tokens a sentence needs to be classified
pub const MIN_SENTENCE_TOKENS: usize = 2;

/// Normalize a raw sentence: bullets and whitespace runs become single spaces
pub fn clean_sentence(sentence: &str) -> String {
    let sentence = BULLETS_AND_BREAKS.replace_all(sentence, " ");
    WHITESPACE.replace_all(&sentence, " ").trim().to_string()
}

/// True if a cleaned sentence is long enough to be worth classifying
pub fn is_candidate(cleaned: &str) -> bool {
    cleaned.split_whitespace().count() >= MIN_SENTENCE_TOKENS
}

/// Punctuation that ends a line without it being a soft wrap
const TERMINAL_PUNCTUATION: [char; 5] = ['.', '!', '?', ':', ';'];

/// Splits document text into sentences using Unicode sentence boundaries
///
/// A line break is joined only when it looks like a soft wrap: the line
/// before has no terminal punctuation and the next one starts lowercase.
/// Any other line break, a blank line, a `•` bullet or a line-leading list
/// marker (`-`, `*`, `1.`, `1)`) ends the sentence.
#[derive(Debug, Clone, Default)]
pub struct SentenceSegmenter;

impl SentenceSegmenter {
    pub fn new() -> Self {
        Self
    }

    /// Returns the raw (uncleaned) sentences of `text` in document order
    pub fn segment(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();

        for paragraph in PARAGRAPH_BREAK.split(text) {
            for block in line_blocks(paragraph) {
                sentences.extend(block.unicode_sentences().map(|s| s.to_string()));
            }
        }

        sentences
    }
}

/// Group the lines of one paragraph into blocks that UAX #29 can split further
fn line_blocks(paragraph: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in paragraph.lines() {
        for (i, piece) in line.split('•').enumerate() {
            let piece = piece.trim();
            let (starts_item, piece) = match LIST_MARKER.find(piece) {
                Some(marker) => (true, &piece[marker.end()..]),
                None => (i > 0, piece),
            };

            if starts_item || !is_soft_wrap(&current, piece) {
                flush_block(&mut blocks, &mut current);
            }
            for word in piece.split_whitespace() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
    }

    flush_block(&mut blocks, &mut current);
    blocks
}

fn is_soft_wrap(previous: &str, next: &str) -> bool {
    !previous.is_empty()
        && !previous.ends_with(TERMINAL_PUNCTUATION)
        && next.chars().next().map_or(false, char::is_lowercase)
}

fn flush_block(blocks: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        blocks.push(std::mem::take(current));
    }
}

/// Make an uploaded filename safe to store in the uploads directory
///
/// Accented letters are decomposed to their ASCII base, path separators
/// become word breaks, words are joined with `_`, and every character
/// outside `[A-Za-z0-9_.-]` is dropped. Returns an empty string when nothing
/// safe remains.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_FILENAME_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}
