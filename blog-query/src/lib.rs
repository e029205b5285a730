pub mod trigram;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    pub tag: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    pub filters: QueryFilters,
}

impl ParsedQuery {
    /// Free text of the query with filters removed, single-space separated.
    pub fn text(&self) -> String {
        self.terms.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Parse raw search text into free-text terms and supported filters.
/// Supported filters: `tag:<slug>`, `author:<name>` (case-insensitive keys).
/// - Tag slugs and author names are lowercased and stripped of surrounding quotes.
/// - Unknown tokens are treated as free-text terms.
/// - Multiple occurrences: the last one wins.
pub fn parse_query(input: &str) -> ParsedQuery {
    let mut terms: Vec<String> = Vec::new();
    let mut tag: Option<String> = None;
    let mut author: Option<String> = None;

    for raw in input.split_whitespace() {
        if let Some((k, v)) = raw.split_once(':') {
            match k.to_ascii_lowercase().as_str() {
                "tag" => {
                    let v = strip_quotes(v).to_lowercase();
                    if !v.is_empty() {
                        tag = Some(v);
                    }
                    continue;
                }
                "author" => {
                    let v = strip_quotes(v).to_lowercase();
                    if !v.is_empty() {
                        author = Some(v);
                    }
                    continue;
                }
                _ => {}
            }
        }
        if !raw.is_empty() {
            terms.push(raw.to_string());
        }
    }

    ParsedQuery {
        terms,
        filters: QueryFilters { tag, author },
    }
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
