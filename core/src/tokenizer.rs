use crate::TermFrequencies;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// English stop words, matched against lowercased tokens before stemming.
const ENGLISH_STOP_WORDS: &str = "
    a about above after again against all am an and any are aren't as at
    be because been before being below between both but by
    can can't cannot could couldn't
    did didn't do does doesn't doing don't down during
    each few for from further
    had hadn't has hasn't have haven't having he he'd he'll he's her here here's hers herself
    him himself his how how's
    i i'd i'll i'm i've if in into is isn't it it's its itself
    let's me more most mustn't my myself
    no nor not of off on once only or other ought our ours ourselves out over own
    same she she'd she'll she's should shouldn't so some such
    than that that's the their theirs them themselves then there there's these they they'd
    they'll they're they've this those through to too
    under until up very
    was wasn't we we'd we'll we're we've were weren't what what's when when's where where's
    which while who who's whom why why's with won't would wouldn't
    you you'd you'll you're you've your yours yourself yourselves
";

lazy_static! {
    // a letter followed by letters, digits, underscores or apostrophes
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("word pattern compiles");
    static ref SNOWBALL: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOP_WORDS: HashSet<&'static str> = ENGLISH_STOP_WORDS.split_whitespace().collect();
}

/// Turns raw text into its bag of stems.
///
/// Implementations must be deterministic: the index and every ranking model
/// call the same tokenizer for documents and queries, and scores are only
/// comparable if both sides agree on the stems.
pub trait Tokenizer: Send + Sync {
    fn stems_of(&self, text: &str) -> TermFrequencies;
}

/// NFKC normalization, lowercasing, English stopword removal and Snowball stemming.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStemmer;

impl Tokenizer for EnglishStemmer {
    fn stems_of(&self, text: &str) -> TermFrequencies {
        let mut counts = TermFrequencies::new();
        for stem in tokenize(text) {
            *counts.entry(stem).or_insert(0) += 1;
        }
        counts
    }
}

/// Splits on whitespace only; no normalization. Handy when stems are already known.
#[derive(Debug, Clone, Copy, Default)]
pub struct Whitespace;

impl Tokenizer for Whitespace {
    fn stems_of(&self, text: &str) -> TermFrequencies {
        let mut counts = TermFrequencies::new();
        for word in text.split_whitespace() {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

fn is_stop_word(token: &str) -> bool { STOP_WORDS.contains(token) }

/// Stems of `text` in reading order, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    WORD.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(|token| SNOWBALL.stem(token).to_string())
        .collect()
}
