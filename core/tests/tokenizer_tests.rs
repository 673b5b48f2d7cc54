use policy_core::tokenizer::{tokenize, TokenizerConfig};

#[test]
fn it_normalizes_and_stems() {
    let words = tokenize("Running Runners RUN! The café's menu.", &TokenizerConfig::default());
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Unicode normalization keeps the accented form intact but lowercased
    assert!(words.iter().any(|w| w.starts_with("café")));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog", &TokenizerConfig::default());
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn stopwords_and_stemming_can_be_switched_off() {
    let cfg = TokenizerConfig { stem: false, remove_stopwords: false, min_token_len: 1 };
    let words = tokenize("The farmers and the fields", &cfg);
    assert_eq!(words, vec!["the", "farmers", "and", "the", "fields"]);
}

#[test]
fn numbers_alone_are_not_terms() {
    let words = tokenize("Rs 5000 per year", &TokenizerConfig::default());
    assert!(!words.iter().any(|w| w.chars().all(|c| c.is_ascii_digit())));
    assert!(words.contains(&"year".to_string()));
}

#[test]
fn fullwidth_forms_fold_under_nfkc() {
    let words = tokenize("ＬＯＡＮ", &TokenizerConfig::default());
    assert_eq!(words, vec!["loan"]);
}
