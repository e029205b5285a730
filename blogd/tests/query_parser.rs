use blogd::query::parse_query;

#[test]
fn parses_supported_filters_and_terms() {
    let pq = parse_query("django tag:Web author:Admin tips");
    assert_eq!(pq.filters.tag.as_deref(), Some("web"));
    assert_eq!(pq.filters.author.as_deref(), Some("admin"));
    assert_eq!(pq.terms, vec!["django", "tips"]);
    assert_eq!(pq.text(), "django tips");
}

#[test]
fn last_occurrence_wins_for_duplicate_filters() {
    let pq = parse_query("tag:a tag:b author:x author:'Y' rust");
    assert_eq!(pq.filters.tag.as_deref(), Some("b"));
    assert_eq!(pq.filters.author.as_deref(), Some("y"));
    assert_eq!(pq.terms, vec!["rust"]);
}

#[test]
fn unsupported_filter_tokens_become_terms() {
    let pq = parse_query("site:example.com lang:en rust");
    assert_eq!(pq.filters.tag, None);
    assert_eq!(pq.terms, vec!["site:example.com", "lang:en", "rust"]);
}

#[test]
fn empty_filter_values_are_ignored() {
    let pq = parse_query("tag: author:  rust");
    assert_eq!(pq.filters.tag, None);
    assert_eq!(pq.filters.author, None);
    assert_eq!(pq.terms, vec!["rust"]);
}
