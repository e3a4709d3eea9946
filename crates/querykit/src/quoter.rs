//! Identifier and literal quoting.
//!
//! A [`Quoter`] is configured with a dialect's quote characters and a table prefix.
//! Every method is a pure string transformation.
//!
//! Names that already look quoted or that carry placeholder tokens (`{{table}}`,
//! `[[column]]`) are passed through. This is best effort: malformed nested
//! quoting is not detected.

use std::sync::OnceLock;

use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quoter {
    column_quote: (char, char),
    table_quote: (char, char),
    table_prefix: String,
}

impl Quoter {
    pub fn new(column_quote: (char, char), table_quote: (char, char)) -> Self {
        Self {
            column_quote,
            table_quote,
            table_prefix: String::new(),
        }
    }

    /// Set the prefix substituted for `%` in `{{%table}}` tokens.
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn column_quote(&self) -> (char, char) {
        self.column_quote
    }

    pub fn table_quote(&self) -> (char, char) {
        self.table_quote
    }

    /// Quote a possibly schema-qualified table name (`schema.table`).
    ///
    /// Sub-queries (`(...)`) and names containing `{{` are returned unchanged.
    pub fn quote_table_name(&self, name: &str) -> String {
        if name.starts_with('(') || name.contains("{{") {
            return name.to_string();
        }
        if !name.contains('.') {
            return self.quote_simple_table_name(name);
        }
        name.split('.')
            .map(|part| self.quote_simple_table_name(&self.unquote_simple_table_name(part)))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a column name, which may be prefixed by a table name (`t.col`).
    ///
    /// Names containing `(` or `[[` are treated as expressions and returned unchanged.
    pub fn quote_column_name(&self, name: &str) -> String {
        if name.contains('(') || name.contains("[[") {
            return name.to_string();
        }
        let (prefix, column) = match name.rfind('.') {
            Some(pos) => (
                format!("{}.", self.quote_table_name(&name[..pos])),
                &name[pos + 1..],
            ),
            None => (String::new(), name),
        };
        if column.contains("{{") {
            return name.to_string();
        }
        format!("{prefix}{}", self.quote_simple_column_name(column))
    }

    /// Quote a single table name part. Already-quoted names are returned unchanged.
    pub fn quote_simple_table_name(&self, name: &str) -> String {
        let (start, end) = self.table_quote;
        if name.starts_with(start) {
            name.to_string()
        } else {
            format!("{start}{name}{end}")
        }
    }

    /// Quote a single column name part. `*` and already-quoted names are returned unchanged.
    pub fn quote_simple_column_name(&self, name: &str) -> String {
        let (start, end) = self.column_quote;
        if name == "*" || name.starts_with(start) {
            name.to_string()
        } else {
            format!("{start}{name}{end}")
        }
    }

    pub fn unquote_simple_table_name(&self, name: &str) -> String {
        unquote(name, self.table_quote)
    }

    pub fn unquote_simple_column_name(&self, name: &str) -> String {
        unquote(name, self.column_quote)
    }

    /// Quote a string for literal embedding in SQL.
    ///
    /// Single quotes are doubled; NUL and SUB (0x1A) become `\000` and `\032`.
    pub fn quote_value(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for ch in value.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\0' => out.push_str("\\000"),
                '\u{1a}' => out.push_str("\\032"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
        out
    }

    /// Normalize a table name to the `{{name}}` form.
    ///
    /// Quote characters are stripped first, so calling this twice is a no-op.
    pub fn ensure_name_quoted(&self, name: &str) -> String {
        let stripped: String = name
            .chars()
            .filter(|c| !matches!(c, '\'' | '"' | '`' | '[' | ']'))
            .collect();
        if !stripped.is_empty() && !(stripped.starts_with("{{") && stripped.ends_with("}}")) {
            format!("{{{{{stripped}}}}}")
        } else {
            stripped
        }
    }

    /// Reduce `t.[[col]]` style names to the bare column name.
    pub fn ensure_column_name(&self, name: &str) -> String {
        let name = match name.rfind('.') {
            Some(pos) => &name[pos + 1..],
            None => name,
        };
        match name.strip_prefix("[[").and_then(|n| n.strip_suffix("]]")) {
            Some(inner) if is_token_name(inner) => inner.to_string(),
            _ => name.to_string(),
        }
    }

    /// Resolve `{{table}}`, `{{%table}}` and `[[column]]` tokens in a SQL string.
    ///
    /// `%` inside a table token is replaced by the table prefix.
    pub fn quote_sql(&self, sql: &str) -> String {
        if !sql.contains("{{") && !sql.contains("[[") {
            return sql.to_string();
        }
        token_regex()
            .replace_all(sql, |caps: &Captures<'_>| {
                if let Some(column) = caps.get(3) {
                    return self.quote_column_name(column.as_str());
                }
                let table = caps.get(2).map_or("", |m| m.as_str());
                self.quote_table_name(table)
                    .replace('%', &self.table_prefix)
            })
            .into_owned()
    }

    /// Resolve `{{%table}}` to its prefixed name without quoting.
    pub fn get_raw_table_name(&self, name: &str) -> String {
        if !name.contains("{{") {
            return name.to_string();
        }
        static RAW_RE: OnceLock<Regex> = OnceLock::new();
        let re = RAW_RE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("invalid built-in table token regex"));
        re.replace_all(name, "$1").replace('%', &self.table_prefix)
    }
}

impl Default for Quoter {
    fn default() -> Self {
        Self::new(('"', '"'), ('"', '"'))
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"(\{\{(%?[\w\-. ]+)%?\}\}|\[\[([\w\-. ]+)\]\])")
            .expect("invalid built-in quoting regex")
    })
}

fn is_token_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
}

fn unquote(name: &str, (start, end): (char, char)) -> String {
    match name.strip_prefix(start).and_then(|n| n.strip_suffix(end)) {
        Some(inner) => inner.to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pg() -> Quoter {
        Quoter::default()
    }

    fn mysql() -> Quoter {
        Quoter::new(('`', '`'), ('`', '`'))
    }

    #[test]
    fn quote_table_name_handles_schema() {
        assert_eq!(pg().quote_table_name("customer"), r#""customer""#);
        assert_eq!(pg().quote_table_name("public.customer"), r#""public"."customer""#);
        assert_eq!(pg().quote_table_name(r#""public".customer"#), r#""public"."customer""#);
        assert_eq!(mysql().quote_table_name("db.t"), "`db`.`t`");
    }

    #[test]
    fn quote_table_name_passes_through_tokens_and_subqueries() {
        assert_eq!(pg().quote_table_name("{{%user}}"), "{{%user}}");
        assert_eq!(pg().quote_table_name("(SELECT 1)"), "(SELECT 1)");
        assert_eq!(pg().quote_table_name(r#""already""#), r#""already""#);
    }

    #[test]
    fn quote_column_name_rules() {
        let q = pg();
        assert_eq!(q.quote_column_name("id"), r#""id""#);
        assert_eq!(q.quote_column_name("t.id"), r#""t"."id""#);
        assert_eq!(q.quote_column_name("s.t.id"), r#""s"."t"."id""#);
        assert_eq!(q.quote_column_name("*"), "*");
        assert_eq!(q.quote_column_name("t.*"), r#""t".*"#);
        assert_eq!(q.quote_column_name("COUNT(*)"), "COUNT(*)");
        assert_eq!(q.quote_column_name("[[name]]"), "[[name]]");
        assert_eq!(q.quote_column_name(r#""id""#), r#""id""#);
    }

    #[test]
    fn quote_value_escapes() {
        let q = pg();
        assert_eq!(q.quote_value("it's"), "'it''s'");
        assert_eq!(q.quote_value("a\0b"), "'a\\000b'");
        assert_eq!(q.quote_value("a\u{1a}b"), "'a\\032b'");
    }

    #[test]
    fn ensure_name_quoted_is_idempotent() {
        let q = pg();
        let once = q.ensure_name_quoted(r#""order""#);
        assert_eq!(once, "{{order}}");
        assert_eq!(q.ensure_name_quoted(&once), once);
        assert_eq!(q.ensure_name_quoted("{{%user}}"), "{{%user}}");
        assert_eq!(q.ensure_name_quoted(""), "");
    }

    #[test]
    fn ensure_column_name_strips_tokens() {
        let q = pg();
        assert_eq!(q.ensure_column_name("t.[[name]]"), "name");
        assert_eq!(q.ensure_column_name("[[name]]"), "name");
        assert_eq!(q.ensure_column_name("name"), "name");
    }

    #[test]
    fn quote_sql_resolves_tokens_with_prefix() {
        let q = pg().with_table_prefix("tbl_");
        assert_eq!(
            q.quote_sql("SELECT [[id]] FROM {{%user}} JOIN {{profile}}"),
            r#"SELECT "id" FROM "tbl_user" JOIN "profile""#
        );
        assert_eq!(q.quote_sql("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn raw_table_name_and_unquote() {
        let q = mysql().with_table_prefix("p_");
        assert_eq!(q.get_raw_table_name("{{%user}}"), "p_user");
        assert_eq!(q.get_raw_table_name("user"), "user");
        assert_eq!(q.unquote_simple_table_name("`user`"), "user");
        assert_eq!(q.unquote_simple_column_name("name"), "name");
    }
}
