use std::{
    borrow::Cow,
    sync::OnceLock,
};

use regex::Regex;

pub trait StripHtml {
    fn strip_html(&self) -> Cow<'_, str>;
}

// Anki field values are HTML: <b>猫</b>&nbsp; -> 猫
impl StripHtml for str {
    fn strip_html(&self) -> Cow<'_, str> {
        static TAGS: OnceLock<Regex> = OnceLock::new();
        let re = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());

        if !self.contains(['<', '&']) {
            return Cow::Borrowed(self.trim());
        }

        let stripped = re.replace_all(self, "");
        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&amp;", "&");
        Cow::Owned(decoded.trim().to_string())
    }
}

impl StripHtml for String {
    fn strip_html(&self) -> Cow<'_, str> {
        self.as_str().strip_html()
    }
}

/// Make a value match literally in an Anki search query.
///
/// `*` and `_` are wildcards and `"` ends a quoted term, so those are backslash-escaped.
/// Values with whitespace, colons, parentheses or a minus sign are wrapped in quotes.
pub fn quote_search_term(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    if value.chars().any(|c| c.is_whitespace() || matches!(c, ':' | '"' | '(' | ')' | '-')) {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}
