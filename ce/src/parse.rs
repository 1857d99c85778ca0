//! Heuristic chat-line parsing.
//!
//! A reconstructed line is split into {tag, sender, message}. Upstream text is
//! unreliable (dropped delimiters, stray glyphs, wrapped lines), so every
//! branch here has a fallback that treats ambiguous text as a bare message;
//! parsing never fails.
//!
//! Precedence for sender extraction is fixed and total:
//! 1. colon/semicolon delimiter near the start of the line,
//! 2. first token already known to the sender registry,
//! 3. first token after a recognized tag,
//! 4. no sender.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

/// One structured chat message.
///
/// `translated` is filled by an external collaborator after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParsedMessage {
    pub tag: Option<String>,
    pub sender: Option<String>,
    pub message: String,
    pub translated: String,
}

/// Session-scoped memory of player names seen in earlier snapshots.
///
/// Bounded: once full, the least recently added name is evicted so recently
/// active senders survive the cap. Lookup is case-insensitive; names are
/// stored lowercased.
#[derive(Debug, Clone)]
pub struct SenderRegistry {
    names: VecDeque<String>,
    capacity: usize,
}

impl Default for SenderRegistry {
    fn default() -> Self {
        Self::with_capacity(100)
    }
}

impl SenderRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&mut self, name: &str) {
        let key = name.to_lowercase();
        if self.names.contains(&key) {
            return;
        }
        if self.names.len() >= self.capacity {
            self.names.pop_front();
        }
        self.names.push_back(key);
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.names.iter().any(|n| *n == key)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Channel tags rendered by the chat overlay, optionally bracketed. The match
/// may start a little into the line to tolerate leading recognizer noise.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\[\(\{]?\s*\b(allies|team|all|party|squelch\w*)\b\s*[\]\)\}:]?").unwrap()
});

/// How far into the line a tag or sender delimiter may appear.
const TAG_SEARCH_LIMIT: usize = 18;
const DELIMITER_SEARCH_LIMIT: usize = 28;
/// Sender echoes from the color pass span at most this many leading words.
const ECHO_WORD_LIMIT: usize = 4;

/// Parse one raw line and append the result to `out`.
///
/// A line with neither tag nor sender continues the previous message (the
/// recognizer wraps long messages) instead of producing a new record.
/// `color_sender` is the name found by the independent color-isolation pass,
/// when there was one.
pub fn push_line(
    out: &mut Vec<ParsedMessage>,
    raw: &str,
    color_sender: Option<String>,
    registry: &mut SenderRegistry,
) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }

    let (tag, rest) = extract_tag(raw);

    let (sender, message) = match color_sender {
        // The color pass already isolated the name; the line text may still
        // echo it, so strip the duplicate words.
        Some(name) => {
            let message = strip_name_echo(rest, &name);
            (Some(name), message)
        }
        None => extract_sender(rest, tag.is_some(), registry),
    };

    if let Some(ref name) = sender {
        if name.chars().count() > 2 {
            registry.insert(name);
        }
    }

    let message = clean_message(&message);

    if tag.is_none() && sender.is_none() {
        if let Some(prev) = out.last_mut() {
            if prev.tag.is_some() || prev.sender.is_some() {
                if !message.is_empty() {
                    if !prev.message.is_empty() {
                        prev.message.push(' ');
                    }
                    prev.message.push_str(&message);
                }
                return;
            }
        }
    }

    if message.is_empty() && tag.is_none() && sender.is_none() {
        return;
    }

    out.push(ParsedMessage {
        tag,
        sender,
        message,
        translated: String::new(),
    });
}

/// Find a channel tag near the start of the line. Returns the capitalized tag
/// and the working text with the tag span (and anything before it) removed.
fn extract_tag(raw: &str) -> (Option<String>, &str) {
    let Some(caps) = TAG_RE.captures(raw) else {
        return (None, raw);
    };
    let Some(whole) = caps.get(0) else {
        return (None, raw);
    };
    if whole.start() > TAG_SEARCH_LIMIT {
        return (None, raw);
    }

    let tag = capitalize(caps.get(1).map_or("", |m| m.as_str()));
    (Some(tag), raw[whole.end()..].trim_start())
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn has_word_char(s: &str) -> bool {
    s.chars().any(|c| c.is_alphanumeric() || c == '_')
}

fn extract_sender(
    text: &str,
    has_tag: bool,
    registry: &SenderRegistry,
) -> (Option<String>, String) {
    // (1) Explicit delimiter near the start of the line.
    let delimiter = text
        .char_indices()
        .take(DELIMITER_SEARCH_LIMIT)
        .find(|&(_, c)| c == ':' || c == ';');
    if let Some((idx, _)) = delimiter {
        let (left, right) = text.split_at(idx);
        let left = left.trim();
        let len = left.chars().count();
        if (1..=30).contains(&len) && has_word_char(left) {
            return (Some(left.to_string()), right[1..].trim().to_string());
        }
    }

    let mut tokens = text.split_whitespace();
    let Some(first) = tokens.next() else {
        return (None, text.to_string());
    };
    let rest = || tokens.clone().collect::<Vec<_>>().join(" ");

    // (2) First token already known from earlier snapshots.
    let stripped = first.trim_end_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
    if !stripped.is_empty() && registry.contains(stripped) {
        return (Some(stripped.to_string()), rest());
    }

    // (3) After a tag, a leading bare word is far more likely a name than noise.
    if has_tag {
        let len = first.chars().count();
        if tokens.clone().next().is_some() && (1..=20).contains(&len) && has_word_char(first) {
            return (Some(stripped.to_string()), rest());
        }
    }

    (None, text.to_string())
}

/// Remove leading message words that duplicate the color-pass sender name.
///
/// Both passes can capture the same glyphs; a fuzzy containment check against
/// name fragments longer than 2 characters strips the echo.
fn strip_name_echo(text: &str, name: &str) -> String {
    let fragments: Vec<String> = name
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|f| f.chars().count() > 2)
        .map(|f| f.to_lowercase())
        .collect();
    if fragments.is_empty() {
        return text.to_string();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut skip = 0;
    for word in words.iter().take(ECHO_WORD_LIMIT) {
        let bare = word
            .trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'))
            .to_lowercase();
        let matched = !bare.is_empty()
            && fragments
                .iter()
                .any(|f| f.contains(bare.as_str()) || bare.contains(f.as_str()));
        if !matched {
            break;
        }
        skip += 1;
    }

    words[skip..].join(" ")
}

/// Strip leading stray punctuation left over from recognition; collapse
/// residue with no alphanumeric content to the empty string.
fn clean_message(message: &str) -> String {
    const STRAY: &[char] = &[
        ':', ';', ',', '.', '!', '?', '|', '/', '\\', '-', '_', '~', '^', '\'', '"', '`', ']', ')',
        '}', '>', '*', '=',
    ];
    let trimmed = message.trim_start_matches(|c: char| c.is_whitespace() || STRAY.contains(&c));
    let trimmed = trimmed.trim();

    if trimmed.chars().count() < 2 && !trimmed.chars().any(char::is_alphanumeric) {
        return String::new();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(raw: &str, registry: &mut SenderRegistry) -> Vec<ParsedMessage> {
        let mut out = Vec::new();
        push_line(&mut out, raw, None, registry);
        out
    }

    #[test]
    fn tagged_line_with_delimiter() {
        let mut registry = SenderRegistry::default();
        let out = parse_one("[Allies] Bob: hello there", &mut registry);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag.as_deref(), Some("Allies"));
        assert_eq!(out[0].sender.as_deref(), Some("Bob"));
        assert_eq!(out[0].message, "hello there");
        assert!(registry.contains("bob"));
    }

    #[test]
    fn untagged_line_with_delimiter() {
        let mut registry = SenderRegistry::default();
        let out = parse_one("Bob: hello", &mut registry);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag, None);
        assert_eq!(out[0].sender.as_deref(), Some("Bob"));
        assert_eq!(out[0].message, "hello");
    }

    #[test]
    fn registered_sender_is_recognized_without_delimiter() {
        let mut registry = SenderRegistry::default();
        registry.insert("Bob");
        let out = parse_one("Bob hello there", &mut registry);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sender.as_deref(), Some("Bob"));
        assert_eq!(out[0].message, "hello there");
    }

    #[test]
    fn tag_makes_leading_bare_word_a_sender() {
        let mut registry = SenderRegistry::default();
        let out = parse_one("[Team] Alice gg wp", &mut registry);

        assert_eq!(out[0].tag.as_deref(), Some("Team"));
        assert_eq!(out[0].sender.as_deref(), Some("Alice"));
        assert_eq!(out[0].message, "gg wp");
        assert!(registry.contains("alice"));
    }

    #[test]
    fn bare_line_is_a_message_without_sender() {
        let mut registry = SenderRegistry::default();
        let out = parse_one("hello there", &mut registry);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag, None);
        assert_eq!(out[0].sender, None);
        assert_eq!(out[0].message, "hello there");
    }

    #[test]
    fn continuation_merges_into_previous_message() {
        let mut registry = SenderRegistry::default();
        let mut out = Vec::new();
        push_line(&mut out, "Bob: hello there", None, &mut registry);
        push_line(&mut out, "more text", None, &mut registry);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "hello there more text");
    }

    #[test]
    fn no_merge_when_previous_had_neither_tag_nor_sender() {
        let mut registry = SenderRegistry::default();
        let mut out = Vec::new();
        push_line(&mut out, "loose noise line", None, &mut registry);
        push_line(&mut out, "another one", None, &mut registry);

        assert_eq!(out.len(), 2);
    }

    #[test]
    fn color_pass_sender_echo_is_stripped() {
        let mut registry = SenderRegistry::default();
        let mut out = Vec::new();
        push_line(
            &mut out,
            "[All] Windrunner : top rune",
            Some("Windrunner".to_string()),
            &mut registry,
        );

        assert_eq!(out[0].tag.as_deref(), Some("All"));
        assert_eq!(out[0].sender.as_deref(), Some("Windrunner"));
        assert_eq!(out[0].message, "top rune");
    }

    #[test]
    fn squelched_tag_variant_is_capitalized() {
        let mut registry = SenderRegistry::default();
        let out = parse_one("(squelched) Bob: gl", &mut registry);

        assert_eq!(out[0].tag.as_deref(), Some("Squelched"));
        assert_eq!(out[0].sender.as_deref(), Some("Bob"));
    }

    #[test]
    fn leading_noise_before_tag_is_discarded() {
        let mut registry = SenderRegistry::default();
        let out = parse_one("~| [Allies] Bob: mid missing", &mut registry);

        assert_eq!(out[0].tag.as_deref(), Some("Allies"));
        assert_eq!(out[0].sender.as_deref(), Some("Bob"));
        assert_eq!(out[0].message, "mid missing");
    }

    #[test]
    fn short_symbol_residue_becomes_no_record() {
        let mut registry = SenderRegistry::default();
        let out = parse_one(".", &mut registry);
        assert!(out.is_empty());
    }

    #[test]
    fn registry_evicts_oldest_past_capacity() {
        let mut registry = SenderRegistry::default();
        for i in 0..101 {
            registry.insert(&format!("player{i}"));
        }

        assert_eq!(registry.len(), 100);
        assert!(!registry.contains("player0"));
        assert!(registry.contains("player1"));
        assert!(registry.contains("player100"));
    }

    #[test]
    fn registry_lookup_is_case_insensitive_and_deduplicated() {
        let mut registry = SenderRegistry::default();
        registry.insert("Bob");
        registry.insert("BOB");

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("bOb"));
    }
}
