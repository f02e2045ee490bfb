use std::sync::OnceLock;

use regex::Regex;

use crate::algo::stopwords::StopwordSet;

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"\W+").expect("static pattern compiles"))
}

/// Lower-case `text`, collapse every run of non-word characters into a single
/// space and split into tokens. Word characters are Unicode letters, digits
/// and `_`, so accented Portuguese words stay whole.
pub fn fold_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    non_word()
        .replace_all(&lower, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Canonical text for one repository: name and description, case-folded,
/// stripped of punctuation and of every stopword or blacklisted phrase.
///
/// A missing description contributes nothing; an empty result is valid.
pub fn normalize_repository_text(
    name: &str,
    description: Option<&str>,
    stopwords: &StopwordSet,
) -> String {
    let combined = format!("{name} {}", description.unwrap_or(""));
    let tokens = strip_phrases(fold_tokens(&combined), stopwords.phrases());
    tokens
        .into_iter()
        .filter(|t| !stopwords.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop every contiguous run of tokens equal to one of `phrases`.
fn strip_phrases(tokens: Vec<String>, phrases: &[Vec<String>]) -> Vec<String> {
    if phrases.is_empty() {
        return tokens;
    }
    let mut kept = Vec::with_capacity(tokens.len());
    let mut i = 0;
    'outer: while i < tokens.len() {
        for phrase in phrases {
            let end = i + phrase.len();
            if end <= tokens.len() && tokens[i..end] == phrase[..] {
                i = end;
                continue 'outer;
            }
        }
        kept.push(tokens[i].clone());
        i += 1;
    }
    kept
}

/// Vectorizer analyzer: whitespace tokens of at least two characters, expanded
/// into every word n-gram with `min_n <= n <= max_n`.
pub fn analyze(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect();
    let mut terms = Vec::new();
    for n in min_n.max(1)..=max_n {
        terms.extend(word_ngrams(&tokens, n));
    }
    terms
}

/// Generate word n-grams from a token list. Fewer than `n` tokens yields none.
pub fn word_ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return vec![];
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}
