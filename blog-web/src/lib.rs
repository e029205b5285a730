//! Named URL configuration.
//!
//! Patterns look like `<int:year>/<int:month>/<int:day>/<slug:post>/` and are
//! relative to the site root. Routes are grouped under namespaces with
//! [`UrlConf::include`], so `blog:post_search` names the `post_search` route
//! included under the `blog` namespace.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// `[0-9]+`
    Int,
    /// `[-a-zA-Z0-9_]+`
    Slug,
    /// `[^/]+`
    Str,
    /// `.+`
    Path,
}

impl Converter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Converter::Int),
            "slug" => Some(Converter::Slug),
            "str" => Some(Converter::Str),
            "path" => Some(Converter::Path),
            _ => None,
        }
    }

    fn accepts(self, c: char) -> bool {
        match self {
            Converter::Int => c.is_ascii_digit(),
            Converter::Slug => c.is_ascii_alphanumeric() || c == '-' || c == '_',
            Converter::Str => c != '/',
            Converter::Path => true,
        }
    }

    fn accepts_all(self, s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| self.accepts(c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param { name: String, conv: Converter },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unterminated parameter in pattern '{0}'")]
    Unterminated(String),
    #[error("unknown converter '{conv}' in pattern '{pattern}'")]
    UnknownConverter { pattern: String, conv: String },
    #[error("empty parameter name in pattern '{0}'")]
    EmptyName(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoReverseMatch {
    #[error("reverse for '{0}' not found")]
    UnknownName(String),
    #[error("reverse for '{name}' expects {expected} argument(s), got {got}")]
    Arity { name: String, expected: usize, got: usize },
    #[error("reverse for '{name}': argument '{value}' does not match <{param}>")]
    BadArgument { name: String, param: String, value: String },
}

#[derive(Debug, Clone)]
struct Route {
    name: String,
    pattern: String,
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteInfo {
    pub name: String,
    pub pattern: String,
}

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverMatch {
    pub url_name: String,
    pub kwargs: Vec<(String, String)>,
}

impl ResolverMatch {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value captured by an `<int:…>` converter.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse::<i64>().ok())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UrlConf {
    routes: Vec<Route>,
}

impl UrlConf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Routes are matched in insertion order.
    pub fn route(mut self, pattern: &str, name: &str) -> Result<Self, PatternError> {
        let parts = parse_pattern(pattern)?;
        self.routes.push(Route {
            name: name.to_string(),
            pattern: pattern.to_string(),
            parts,
        });
        Ok(self)
    }

    /// Mount every route of `inner` below `prefix`, naming them `namespace:name`.
    pub fn include(mut self, prefix: &str, namespace: &str, inner: UrlConf) -> Result<Self, PatternError> {
        let prefix_parts = parse_pattern(prefix)?;
        for r in inner.routes {
            let mut parts = prefix_parts.clone();
            parts.extend(r.parts);
            self.routes.push(Route {
                name: format!("{namespace}:{}", r.name),
                pattern: format!("{prefix}{}", r.pattern),
                parts: merge_literals(parts),
            });
        }
        Ok(self)
    }

    /// Match an absolute request path (query string already removed).
    pub fn resolve(&self, path: &str) -> Option<ResolverMatch> {
        let rel = path.strip_prefix('/').unwrap_or(path);
        self.routes.iter().find_map(|r| {
            let mut kwargs = Vec::new();
            if match_parts(&r.parts, rel, &mut kwargs) {
                Some(ResolverMatch {
                    url_name: r.name.clone(),
                    kwargs,
                })
            } else {
                None
            }
        })
    }

    /// Build the absolute path of a named route from positional arguments.
    pub fn reverse(&self, name: &str, args: &[&dyn Display]) -> Result<String, NoReverseMatch> {
        let route = self
            .routes
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| NoReverseMatch::UnknownName(name.to_string()))?;
        let expected = route
            .parts
            .iter()
            .filter(|p| matches!(p, Part::Param { .. }))
            .count();
        if expected != args.len() {
            return Err(NoReverseMatch::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }

        let mut out = String::from("/");
        let mut args = args.iter();
        for part in &route.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Param { name: param, conv } => {
                    let value = args.next().map(|a| a.to_string()).unwrap_or_default();
                    if !conv.accepts_all(&value) {
                        return Err(NoReverseMatch::BadArgument {
                            name: name.to_string(),
                            param: param.clone(),
                            value,
                        });
                    }
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|r| RouteInfo {
                name: r.name.clone(),
                pattern: r.pattern.clone(),
            })
            .collect()
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Part>, PatternError> {
    let mut parts = Vec::new();
    let mut rest = pattern;
    while let Some(open) = rest.find('<') {
        if open > 0 {
            parts.push(Part::Literal(rest[..open].to_string()));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('>')
            .ok_or_else(|| PatternError::Unterminated(pattern.to_string()))?;
        let spec = &after[..close];
        let (conv, name) = match spec.split_once(':') {
            Some((c, n)) => (
                Converter::parse(c).ok_or_else(|| PatternError::UnknownConverter {
                    pattern: pattern.to_string(),
                    conv: c.to_string(),
                })?,
                n,
            ),
            None => (Converter::Str, spec),
        };
        if name.is_empty() {
            return Err(PatternError::EmptyName(pattern.to_string()));
        }
        parts.push(Part::Param {
            name: name.to_string(),
            conv,
        });
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        parts.push(Part::Literal(rest.to_string()));
    }
    Ok(parts)
}

fn merge_literals(parts: Vec<Part>) -> Vec<Part> {
    let mut out: Vec<Part> = Vec::with_capacity(parts.len());
    for p in parts {
        match (out.last_mut(), p) {
            (Some(Part::Literal(prev)), Part::Literal(s)) => prev.push_str(&s),
            (_, p) => out.push(p),
        }
    }
    out
}

/// Backtracking matcher: each parameter takes the longest run its converter
/// accepts, shrinking until the remaining parts match.
fn match_parts(parts: &[Part], s: &str, kwargs: &mut Vec<(String, String)>) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return s.is_empty();
    };
    match first {
        Part::Literal(lit) => match s.strip_prefix(lit.as_str()) {
            Some(tail) => match_parts(rest, tail, kwargs),
            None => false,
        },
        Part::Param { name, conv } => {
            let max: usize = s
                .char_indices()
                .find(|(_, c)| !conv.accepts(*c))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            let mut ends: Vec<usize> = s[..max]
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();
            ends.reverse();
            for end in ends {
                let mark = kwargs.len();
                kwargs.push((name.clone(), s[..end].to_string()));
                if match_parts(rest, &s[end..], kwargs) {
                    return true;
                }
                kwargs.truncate(mark);
            }
            false
        }
    }
}
