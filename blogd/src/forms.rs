//! Field declarations, validation and paragraph-style rendering for the
//! search, comment and share forms.

use std::collections::HashMap;

use crate::templates::filters::escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Text,
    Email,
    Textarea,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    pub max_length: Option<usize>,
}

const EMAIL_MAX_LENGTH: usize = 254;

pub const SEARCH_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "query",
    label: "Query",
    widget: Widget::Text,
    required: true,
    max_length: None,
}];

pub const COMMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Name",
        widget: Widget::Text,
        required: true,
        max_length: Some(80),
    },
    FieldSpec {
        name: "email",
        label: "Email",
        widget: Widget::Email,
        required: true,
        max_length: Some(EMAIL_MAX_LENGTH),
    },
    FieldSpec {
        name: "body",
        label: "Body",
        widget: Widget::Textarea,
        required: true,
        max_length: None,
    },
];

pub const SHARE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Name",
        widget: Widget::Text,
        required: true,
        max_length: Some(25),
    },
    FieldSpec {
        name: "email",
        label: "Email",
        widget: Widget::Email,
        required: true,
        max_length: Some(EMAIL_MAX_LENGTH),
    },
    FieldSpec {
        name: "to",
        label: "To",
        widget: Widget::Email,
        required: true,
        max_length: Some(EMAIL_MAX_LENGTH),
    },
    FieldSpec {
        name: "comments",
        label: "Comments",
        widget: Widget::Textarea,
        required: false,
        max_length: None,
    },
];

#[derive(Debug, Clone)]
pub struct Form {
    fields: &'static [FieldSpec],
    data: Option<HashMap<String, String>>,
    cleaned: HashMap<&'static str, String>,
    errors: HashMap<&'static str, Vec<String>>,
}

impl Form {
    pub fn unbound(fields: &'static [FieldSpec]) -> Self {
        Self {
            fields,
            data: None,
            cleaned: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// Bind submitted pairs and validate them. The last value of a repeated
    /// key wins.
    pub fn bound(fields: &'static [FieldSpec], params: &[(String, String)]) -> Self {
        let data: HashMap<String, String> = params.iter().cloned().collect();
        let mut form = Self {
            fields,
            data: Some(data),
            cleaned: HashMap::new(),
            errors: HashMap::new(),
        };
        form.full_clean();
        form
    }

    fn full_clean(&mut self) {
        let Some(data) = &self.data else { return };
        for field in self.fields {
            let value = data.get(field.name).map(|v| v.trim()).unwrap_or("");
            match clean_field(field, value) {
                Ok(v) => {
                    self.cleaned.insert(field.name, v);
                }
                Err(msg) => self.errors.entry(field.name).or_default().push(msg),
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.is_bound() && self.errors.is_empty()
    }

    pub fn cleaned(&self, name: &str) -> Option<&str> {
        self.cleaned.get(name).map(String::as_str)
    }

    pub fn errors(&self, name: &str) -> &[String] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Each field as `<p><label>… <input…></p>`, errors listed above it.
    pub fn as_p(&self) -> String {
        let mut out = String::new();
        for field in self.fields {
            let errors = self.errors(field.name);
            if !errors.is_empty() {
                out.push_str("<ul class=\"errorlist\">");
                for e in errors {
                    out.push_str(&format!("<li>{}</li>", escape(e)));
                }
                out.push_str("</ul>");
            }
            let value = self
                .data
                .as_ref()
                .and_then(|d| d.get(field.name))
                .map(String::as_str);
            out.push_str(&format!(
                "<p><label for=\"id_{name}\">{label}:</label> {widget}</p>",
                name = field.name,
                label = escape(field.label),
                widget = render_widget(field, value),
            ));
        }
        out
    }
}

fn clean_field(field: &FieldSpec, value: &str) -> Result<String, String> {
    if value.is_empty() {
        return if field.required {
            Err("This field is required.".to_string())
        } else {
            Ok(String::new())
        };
    }
    if let Some(max) = field.max_length {
        let len = value.chars().count();
        if len > max {
            return Err(format!(
                "Ensure this value has at most {max} characters (it has {len})."
            ));
        }
    }
    if field.widget == Widget::Email && !is_valid_email(value) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(value.to_string())
}

fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty()
                && !l.starts_with('-')
                && !l.ends_with('-')
                && l.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

fn render_widget(field: &FieldSpec, value: Option<&str>) -> String {
    let required = if field.required { " required" } else { "" };
    let maxlength = field
        .max_length
        .map(|m| format!(" maxlength=\"{m}\""))
        .unwrap_or_default();
    match field.widget {
        Widget::Textarea => format!(
            "<textarea name=\"{name}\" cols=\"40\" rows=\"10\"{required} id=\"id_{name}\">\n{value}</textarea>",
            name = field.name,
            value = escape(value.unwrap_or("")),
        ),
        Widget::Text | Widget::Email => {
            let kind = if field.widget == Widget::Email { "email" } else { "text" };
            let value = value
                .filter(|v| !v.is_empty())
                .map(|v| format!(" value=\"{}\"", escape(v)))
                .unwrap_or_default();
            format!(
                "<input type=\"{kind}\" name=\"{name}\"{value}{maxlength}{required} id=\"id_{name}\">",
                name = field.name,
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchForm(pub Form);

impl SearchForm {
    pub fn unbound() -> Self {
        Self(Form::unbound(SEARCH_FIELDS))
    }

    pub fn bound(params: &[(String, String)]) -> Self {
        Self(Form::bound(SEARCH_FIELDS, params))
    }

    /// Trimmed query text when the form is valid.
    pub fn query(&self) -> Option<&str> {
        if self.0.is_valid() {
            self.0.cleaned("query")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentForm(pub Form);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub name: String,
    pub email: String,
    pub body: String,
}

impl CommentForm {
    pub fn unbound() -> Self {
        Self(Form::unbound(COMMENT_FIELDS))
    }

    pub fn bound(params: &[(String, String)]) -> Self {
        Self(Form::bound(COMMENT_FIELDS, params))
    }

    pub fn comment(&self) -> Option<NewComment> {
        if !self.0.is_valid() {
            return None;
        }
        Some(NewComment {
            name: self.0.cleaned("name")?.to_string(),
            email: self.0.cleaned("email")?.to_string(),
            body: self.0.cleaned("body")?.to_string(),
        })
    }
}

/// Recommend a post to someone by email.
#[derive(Debug, Clone)]
pub struct EmailPostForm(pub Form);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostShare {
    pub name: String,
    pub email: String,
    pub to: String,
    pub comments: String,
}

impl EmailPostForm {
    pub fn unbound() -> Self {
        Self(Form::unbound(SHARE_FIELDS))
    }

    pub fn bound(params: &[(String, String)]) -> Self {
        Self(Form::bound(SHARE_FIELDS, params))
    }

    pub fn share(&self) -> Option<PostShare> {
        if !self.0.is_valid() {
            return None;
        }
        Some(PostShare {
            name: self.0.cleaned("name")?.to_string(),
            email: self.0.cleaned("email")?.to_string(),
            to: self.0.cleaned("to")?.to_string(),
            comments: self.0.cleaned("comments").unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(p: &[(&str, &str)]) -> Vec<(String, String)> {
        p.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn unbound_search_form_renders_one_paragraph() {
        assert_eq!(
            SearchForm::unbound().0.as_p(),
            "<p><label for=\"id_query\">Query:</label> \
             <input type=\"text\" name=\"query\" required id=\"id_query\"></p>"
        );
    }

    #[test]
    fn search_query_is_trimmed() {
        let f = SearchForm::bound(&pairs(&[("query", "  rust  ")]));
        assert_eq!(f.query(), Some("rust"));
        assert!(f.0.as_p().contains("value=\"  rust  \""));
    }

    #[test]
    fn blank_query_is_invalid_and_lists_the_error() {
        let f = SearchForm::bound(&pairs(&[("query", "   ")]));
        assert!(!f.0.is_valid());
        assert_eq!(f.query(), None);
        assert!(f
            .0
            .as_p()
            .starts_with("<ul class=\"errorlist\"><li>This field is required.</li></ul><p>"));
    }

    #[test]
    fn comment_form_validates_each_field() {
        let long = "x".repeat(81);
        let f = CommentForm::bound(&pairs(&[("name", &long), ("email", "nope"), ("body", "")]));
        assert_eq!(
            f.0.errors("name"),
            ["Ensure this value has at most 80 characters (it has 81).".to_string()]
        );
        assert_eq!(f.0.errors("email"), ["Enter a valid email address.".to_string()]);
        assert_eq!(f.0.errors("body"), ["This field is required.".to_string()]);
        assert!(f.comment().is_none());
    }

    #[test]
    fn valid_comment_is_extracted() {
        let f = CommentForm::bound(&pairs(&[
            ("name", "Ann"),
            ("email", "ann@example.com"),
            ("body", "Nice <b>post</b>"),
        ]));
        assert_eq!(
            f.comment(),
            Some(NewComment {
                name: "Ann".into(),
                email: "ann@example.com".into(),
                body: "Nice <b>post</b>".into(),
            })
        );
        assert!(f.0.as_p().contains("Nice &lt;b&gt;post&lt;/b&gt;</textarea>"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a.b@mail.example.org"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn share_form_comments_are_optional() {
        let f = EmailPostForm::bound(&pairs(&[
            ("name", "Ann"),
            ("email", "ann@example.com"),
            ("to", "bob@example.com"),
        ]));
        assert_eq!(
            f.share(),
            Some(PostShare {
                name: "Ann".into(),
                email: "ann@example.com".into(),
                to: "bob@example.com".into(),
                comments: String::new(),
            })
        );
        assert!(f
            .0
            .as_p()
            .contains("<textarea name=\"comments\" cols=\"40\" rows=\"10\" id=\"id_comments\">"));
    }

    #[test]
    fn share_form_name_is_capped_at_25() {
        let long = "n".repeat(26);
        let f = EmailPostForm::bound(&pairs(&[("name", &long), ("email", "ann@example.com"), ("to", "")]));
        assert_eq!(
            f.0.errors("name"),
            ["Ensure this value has at most 25 characters (it has 26).".to_string()]
        );
        assert_eq!(f.0.errors("to"), ["This field is required.".to_string()]);
        assert!(f.share().is_none());
        assert!(EmailPostForm::unbound().share().is_none());
    }
}
