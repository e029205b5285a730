//! Value filters applied while rendering pages.

use chrono::{DateTime, Datelike, Timelike, Utc};
use pulldown_cmark::{html, Options, Parser};

/// HTML-escape `& < > " '`.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render markdown to HTML. The result is trusted markup and is not escaped again.
pub fn markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out
}

pub fn pluralize(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "br", "col", "link", "base", "img", "param", "area", "hr", "input",
];

enum Token<'a> {
    Word,
    Tag(&'a str),
}

/// Next word (`[^<>\s]+`) or tag (`<[^>]+?>`) at or after `pos`, with its end offset.
fn next_token(text: &str, mut pos: usize) -> Option<(Token<'_>, usize)> {
    let bytes = text.as_bytes();
    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'<' {
            if let Some(rel) = text[pos + 1..].find('>') {
                if rel > 0 {
                    let end = pos + 1 + rel + 1;
                    return Some((Token::Tag(&text[pos..end]), end));
                }
            }
            pos += 1;
            continue;
        }
        let c = text[pos..].chars().next()?;
        if c == '>' || c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }
        let end = text[pos..]
            .char_indices()
            .find(|&(_, c)| c == '<' || c == '>' || c.is_whitespace())
            .map(|(i, _)| pos + i)
            .unwrap_or(text.len());
        return Some((Token::Word, end));
    }
    None
}

struct TagInfo {
    closing: bool,
    name: String,
    self_closing: bool,
}

fn parse_tag(tag: &str) -> Option<TagInfo> {
    let inner = &tag[1..tag.len() - 1];
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(r) => (true, r),
        None => (false, inner),
    };
    let first_end = rest
        .char_indices()
        .find(|&(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if first_end == 0 {
        return None;
    }
    let (first, after) = rest.split_at(first_end);
    let (name, self_closing) = if after.is_empty() {
        match first.strip_suffix('/') {
            Some(n) if !n.is_empty() => (n, true),
            _ => (first, false),
        }
    } else {
        (first, after.trim_start() == "/")
    };
    Some(TagInfo {
        closing,
        name: name.to_lowercase(),
        self_closing,
    })
}

/// Keep the first `n` words of the text content of `html`. Tags are kept,
/// ` …` follows the last kept word and any element still open at the cut is
/// closed. Text with at most `n` words comes back unchanged; `n == 0` gives
/// an empty string.
pub fn truncatewords_html(html: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let mut pos = 0;
    let mut end_text_pos = 0;
    let mut words = 0;
    let mut open_tags: Vec<String> = Vec::new();

    while words <= n {
        let Some((token, end)) = next_token(html, pos) else {
            break;
        };
        pos = end;
        let tag = match token {
            Token::Word => {
                words += 1;
                if words == n {
                    end_text_pos = pos;
                }
                continue;
            }
            Token::Tag(t) => t,
        };
        if words >= n {
            continue;
        }
        let Some(info) = parse_tag(tag) else { continue };
        if info.self_closing || VOID_ELEMENTS.contains(&info.name.as_str()) {
            continue;
        }
        if info.closing {
            if let Some(i) = open_tags.iter().position(|t| *t == info.name) {
                open_tags.drain(..=i);
            }
        } else {
            open_tags.insert(0, info.name);
        }
    }

    if words <= n {
        return html.to_string();
    }
    let mut out = String::with_capacity(end_text_pos + 16);
    out.push_str(&html[..end_text_pos]);
    out.push_str(" …");
    for tag in &open_tags {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
    out
}

/// Plain text to paragraphs: blank lines separate `<p>` blocks, single
/// newlines become `<br>`. The text is escaped.
pub fn linebreaks(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut paras: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in normalized.split('\n') {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if blank_run > 0 && !current.is_empty() {
            paras.push(current.join("\n"));
            current.clear();
        }
        blank_run = 0;
        current.push(line);
    }
    paras.push(current.join("\n"));
    paras
        .iter()
        .map(|p| format!("<p>{}</p>", escape(p).replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

const MONTHS_AP: [&str; 12] = [
    "Jan.", "Feb.", "March", "April", "May", "June", "July", "Aug.", "Sept.", "Oct.", "Nov.",
    "Dec.",
];

/// `Jan. 5, 2024, 11:30 p.m.` with `noon` and `midnight` spelled out and
/// zero minutes left off.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    let month = MONTHS_AP[dt.month0() as usize];
    let time = match (dt.hour(), dt.minute()) {
        (0, 0) => "midnight".to_string(),
        (12, 0) => "noon".to_string(),
        (h, m) => {
            let suffix = if h < 12 { "a.m." } else { "p.m." };
            let h12 = match h % 12 {
                0 => 12,
                x => x,
            };
            if m == 0 {
                format!("{h12} {suffix}")
            } else {
                format!("{h12}:{m:02} {suffix}")
            }
        }
    };
    format!("{month} {}, {}, {time}", dt.day(), dt.year())
}
