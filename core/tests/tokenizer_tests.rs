use vsm_core::tokenizer::{StandardTokenizer, Tokenize};

#[test]
fn it_normalizes_and_stems() {
    let words = StandardTokenizer.tokens("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Unicode normalization keeps the accented letter, lowercased
    assert!(words.iter().any(|w| w.starts_with("café")));
}

#[test]
fn it_filters_stopwords() {
    let words = StandardTokenizer.tokens("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"fox".to_string()));
}

