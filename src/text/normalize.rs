//! Text normalization: tokenize, stop-word removal, synonym collapsing,
//! and stemming.
//!
//! The normalizer is deterministic for a fixed resource configuration and
//! produces a single space-joined token string so the TF-IDF vectorizer can
//! consume it directly. Empty input yields an empty result, never an error.
//!
//! Lexical resources are local bundles: an embedded default stop-word list
//! and synonym table, each overridable from a file that is loaded and
//! validated before the pipeline starts.

use std::collections::HashSet;
use std::path::Path;

use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;

use crate::core::config::ResourceConfig;
use crate::core::errors::{Result, TracelinkError};

/// English stop words removed from every token stream.
static DEFAULT_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such",
        "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "should", "now",
    ]
    .into_iter()
    .collect()
});

/// Small default synonym table. Each entry collapses a word onto the
/// canonical first-sense term used across issue text and commit messages.
static DEFAULT_THESAURUS: &[(&str, &str)] = &[
    ("bug", "error"),
    ("defect", "error"),
    ("fault", "error"),
    ("fix", "repair"),
    ("patch", "repair"),
    ("crash", "failure"),
    ("abort", "failure"),
    ("folder", "directory"),
    ("dir", "directory"),
    ("doc", "document"),
    ("docs", "document"),
    ("config", "configuration"),
    ("refactor", "restructure"),
];

/// Canonical token-stream producer shared by every text consumer.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: HashSet<String>,
    thesaurus: AHashMap<String, String>,
}

impl TextNormalizer {
    /// Build a normalizer from the resource configuration, loading and
    /// validating any configured bundle files up front.
    pub fn from_config(resources: &ResourceConfig) -> Result<Self> {
        let stopwords = match &resources.stopwords_path {
            Some(path) => load_stopwords(path)?,
            None => DEFAULT_STOPWORDS.iter().map(|w| (*w).to_string()).collect(),
        };
        let thesaurus = match &resources.thesaurus_path {
            Some(path) => load_thesaurus(path)?,
            None => DEFAULT_THESAURUS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        };
        Ok(Self {
            stopwords,
            thesaurus,
        })
    }

    /// Normalize free text into a space-joined canonical token string.
    ///
    /// Lower-cases, tokenizes on word boundaries (dropping pure punctuation),
    /// removes stop words, collapses synonyms, and stems each token.
    pub fn normalize(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }

    /// Normalize optional text; `None` behaves like the empty string.
    pub fn normalize_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.normalize(t)).unwrap_or_default()
    }

    /// Normalized tokens as a vector.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter(|token| !self.stopwords.contains(token))
            .map(|token| match self.thesaurus.get(&token) {
                Some(canonical) => canonical.clone(),
                None => token,
            })
            .map(|token| stem(&token))
            .collect()
    }

    /// Normalized tokens as a set, for vocabulary-membership consumers.
    pub fn token_set(&self, text: &str) -> AHashSet<String> {
        self.tokens(text).into_iter().collect()
    }
}

/// Lower-case and split into maximal alphanumeric runs.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn load_stopwords(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TracelinkError::io(format!("Failed to read stop-word bundle: {}", path.display()), e)
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}

fn load_thesaurus(path: &Path) -> Result<AHashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TracelinkError::io(format!("Failed to read thesaurus bundle: {}", path.display()), e)
    })?;
    let mut table = AHashMap::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split('\t');
        match (parts.next(), parts.next()) {
            (Some(word), Some(canonical)) => {
                table.insert(word.to_lowercase(), canonical.to_lowercase());
            }
            _ => {
                return Err(TracelinkError::config_field(
                    format!(
                        "thesaurus line {} is not tab-separated: {:?}",
                        lineno + 1,
                        line
                    ),
                    "resources.thesaurus_path",
                ));
            }
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Porter stemmer
// ---------------------------------------------------------------------------

/// Stem a single lower-case token with the Porter algorithm.
pub fn stem(word: &str) -> String {
    if word.len() <= 2 || !word.is_ascii() {
        return word.to_string();
    }
    let mut w: Vec<u8> = word.bytes().collect();
    step_1a(&mut w);
    step_1b(&mut w);
    step_1c(&mut w);
    step_2(&mut w);
    step_3(&mut w);
    step_4(&mut w);
    step_5(&mut w);
    String::from_utf8(w).unwrap_or_else(|_| word.to_string())
}

fn is_cons(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_cons(w, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences in `w[..len]`.
fn measure(w: &[u8], len: usize) -> usize {
    let mut m = 0;
    let mut prev_vowel = false;
    for i in 0..len {
        let cons = is_cons(w, i);
        if cons && prev_vowel {
            m += 1;
        }
        prev_vowel = !cons;
    }
    m
}

fn has_vowel(w: &[u8], len: usize) -> bool {
    (0..len).any(|i| !is_cons(w, i))
}

fn ends_double_cons(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_cons(w, n - 1)
}

/// consonant-vowel-consonant ending where the final consonant is not w/x/y.
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_cons(w, n - 3)
        && !is_cons(w, n - 2)
        && is_cons(w, n - 1)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

fn ends_with(w: &[u8], suffix: &[u8]) -> bool {
    w.len() >= suffix.len() && &w[w.len() - suffix.len()..] == suffix
}

/// Replace `suffix` with `replacement` when the remaining stem's measure
/// exceeds `min_measure`. Returns true if the suffix matched at all.
fn replace_if(w: &mut Vec<u8>, suffix: &[u8], replacement: &[u8], min_measure: usize) -> bool {
    if !ends_with(w, suffix) {
        return false;
    }
    let stem_len = w.len() - suffix.len();
    if measure(w, stem_len) > min_measure {
        w.truncate(stem_len);
        w.extend_from_slice(replacement);
    }
    true
}

fn step_1a(w: &mut Vec<u8>) {
    if ends_with(w, b"sses") {
        w.truncate(w.len() - 2);
    } else if ends_with(w, b"ies") {
        w.truncate(w.len() - 2);
    } else if !ends_with(w, b"ss") && ends_with(w, b"s") {
        w.truncate(w.len() - 1);
    }
}

fn step_1b(w: &mut Vec<u8>) {
    if ends_with(w, b"eed") {
        if measure(w, w.len() - 3) > 0 {
            w.truncate(w.len() - 1);
        }
        return;
    }
    let stripped = if ends_with(w, b"ed") && has_vowel(w, w.len() - 2) {
        w.truncate(w.len() - 2);
        true
    } else if ends_with(w, b"ing") && has_vowel(w, w.len() - 3) {
        w.truncate(w.len() - 3);
        true
    } else {
        false
    };
    if !stripped {
        return;
    }
    if ends_with(w, b"at") || ends_with(w, b"bl") || ends_with(w, b"iz") {
        w.push(b'e');
    } else if ends_double_cons(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
        w.truncate(w.len() - 1);
    } else if measure(w, w.len()) == 1 && ends_cvc(w) {
        w.push(b'e');
    }
}

fn step_1c(w: &mut Vec<u8>) {
    if ends_with(w, b"y") && has_vowel(w, w.len() - 1) {
        let n = w.len();
        w[n - 1] = b'i';
    }
}

fn step_2(w: &mut Vec<u8>) {
    const RULES: &[(&[u8], &[u8])] = &[
        (b"ational", b"ate"),
        (b"tional", b"tion"),
        (b"enci", b"ence"),
        (b"anci", b"ance"),
        (b"izer", b"ize"),
        (b"abli", b"able"),
        (b"alli", b"al"),
        (b"entli", b"ent"),
        (b"eli", b"e"),
        (b"ousli", b"ous"),
        (b"ization", b"ize"),
        (b"ation", b"ate"),
        (b"ator", b"ate"),
        (b"alism", b"al"),
        (b"iveness", b"ive"),
        (b"fulness", b"ful"),
        (b"ousness", b"ous"),
        (b"aliti", b"al"),
        (b"iviti", b"ive"),
        (b"biliti", b"ble"),
    ];
    for (suffix, replacement) in RULES {
        if replace_if(w, suffix, replacement, 0) {
            return;
        }
    }
}

fn step_3(w: &mut Vec<u8>) {
    const RULES: &[(&[u8], &[u8])] = &[
        (b"icate", b"ic"),
        (b"ative", b""),
        (b"alize", b"al"),
        (b"iciti", b"ic"),
        (b"ical", b"ic"),
        (b"ful", b""),
        (b"ness", b""),
    ];
    for (suffix, replacement) in RULES {
        if replace_if(w, suffix, replacement, 0) {
            return;
        }
    }
}

fn step_4(w: &mut Vec<u8>) {
    const SUFFIXES: &[&[u8]] = &[
        b"al", b"ance", b"ence", b"er", b"ic", b"able", b"ible", b"ant", b"ement", b"ment",
        b"ent", b"ou", b"ism", b"ate", b"iti", b"ous", b"ive", b"ize",
    ];
    // "ion" only drops after s or t
    if ends_with(w, b"ion") {
        let stem_len = w.len() - 3;
        if stem_len >= 1
            && matches!(w[stem_len - 1], b's' | b't')
            && measure(w, stem_len) > 1
        {
            w.truncate(stem_len);
        }
        return;
    }
    for suffix in SUFFIXES {
        if ends_with(w, suffix) {
            let stem_len = w.len() - suffix.len();
            if measure(w, stem_len) > 1 {
                w.truncate(stem_len);
            }
            return;
        }
    }
}

fn step_5(w: &mut Vec<u8>) {
    if ends_with(w, b"e") {
        let stem_len = w.len() - 1;
        let m = measure(w, stem_len);
        if m > 1 {
            w.truncate(stem_len);
        } else if m == 1 {
            w.truncate(stem_len);
            if ends_cvc(w) {
                w.push(b'e');
            }
        }
    }
    if measure(w, w.len()) > 1 && ends_double_cons(w) && w[w.len() - 1] == b'l' {
        w.truncate(w.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_stem_classic_vocabulary() {
        assert_eq!(stem("caresses"), "caress");
        assert_eq!(stem("ponies"), "poni");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("agreed"), "agre");
        assert_eq!(stem("plastered"), "plaster");
        assert_eq!(stem("motoring"), "motor");
        assert_eq!(stem("conflated"), "conflat");
        assert_eq!(stem("hopping"), "hop");
        assert_eq!(stem("happy"), "happi");
        assert_eq!(stem("relational"), "relat");
        assert_eq!(stem("adjustable"), "adjust");
        assert_eq!(stem("rational"), "ration");
        assert_eq!(stem("effective"), "effect");
    }

    #[test]
    fn test_stem_short_words_untouched() {
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("by"), "by");
    }

    fn normalizer() -> TextNormalizer {
        TextNormalizer::from_config(&ResourceConfig::default()).unwrap()
    }

    #[test]
    fn test_normalize_removes_stopwords_and_punctuation() {
        let n = normalizer();
        let out = n.normalize("The NameNode is crashing, again!");
        assert!(!out.contains("the"));
        assert!(!out.contains(','));
        assert!(out.contains("namenod"));
    }

    #[test]
    fn test_normalize_collapses_synonyms() {
        let n = normalizer();
        // "bug" -> "error" -> stemmed
        assert_eq!(n.normalize("bug"), n.normalize("defect"));
    }

    #[test]
    fn test_normalize_empty_input() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize_opt(None), "");
        assert_eq!(n.normalize("... !!! ---"), "");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let n = normalizer();
        let text = "Deleting files under /tmp causes the DataNode to fail";
        assert_eq!(n.normalize(text), n.normalize(text));
    }

    #[test]
    fn test_loads_bundles_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let stop = dir.path().join("stop.txt");
        let thes = dir.path().join("thes.tsv");
        writeln!(std::fs::File::create(&stop).unwrap(), "alpha\nbeta").unwrap();
        writeln!(std::fs::File::create(&thes).unwrap(), "gamma\tdelta").unwrap();

        let config = ResourceConfig {
            stopwords_path: Some(stop),
            thesaurus_path: Some(thes),
        };
        let n = TextNormalizer::from_config(&config).unwrap();
        assert_eq!(n.normalize("alpha gamma"), stem("delta"));
    }

    #[test]
    fn test_malformed_thesaurus_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let thes = dir.path().join("thes.tsv");
        writeln!(std::fs::File::create(&thes).unwrap(), "no-tab-here").unwrap();

        let config = ResourceConfig {
            stopwords_path: None,
            thesaurus_path: Some(thes),
        };
        assert!(TextNormalizer::from_config(&config).is_err());
    }
}
