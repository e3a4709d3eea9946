//! Named to positional placeholder rewriting.
//!
//! Compiled SQL references `:name` placeholders. Drivers want `$1` (PostgreSQL) or `?`
//! (MySQL, SQLite); [`to_positional`] rewrites the SQL and returns the parameters in
//! the order the driver binds them.

use std::collections::HashMap;

use crate::error::{QbError, QbResult};
use crate::value::{Param, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ... A repeated name reuses its index.
    #[default]
    Dollar,
    /// `?`. A repeated name binds its value again.
    Question,
}

/// Rewrite `:name` placeholders in `sql` to `style`.
///
/// Quoted literals and identifiers are copied untouched, as are `::type` casts.
/// A placeholder without a bound value is an error.
pub fn to_positional(
    sql: &str,
    params: &Params,
    style: PlaceholderStyle,
) -> QbResult<(String, Vec<Param>)> {
    let mut out = String::with_capacity(sql.len());
    let mut ordered: Vec<Param> = Vec::with_capacity(params.len());
    let mut indexes: HashMap<&str, usize> = HashMap::new();
    let mut quote: Option<char> = None;

    let bytes = sql.as_bytes();
    let mut chars = sql.char_indices().peekable();
    while let Some((pos, ch)) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                out.push(ch);
            }
            ':' if bytes.get(pos + 1) == Some(&b':') => {
                out.push_str("::");
                chars.next();
            }
            ':' if bytes.get(pos + 1).is_some_and(|b| is_name_byte(*b)) => {
                let start = pos;
                let mut end = pos + 1;
                while bytes.get(end).is_some_and(|b| is_name_byte(*b)) {
                    end += 1;
                    chars.next();
                }
                let name = &sql[start..end];
                let param = params
                    .get(name)
                    .ok_or_else(|| QbError::bind(format!("no value bound for placeholder {name}")))?;
                match style {
                    PlaceholderStyle::Dollar => {
                        let index = match indexes.get(name) {
                            Some(&index) => index,
                            None => {
                                ordered.push(param.clone());
                                indexes.insert(name, ordered.len());
                                ordered.len()
                            }
                        };
                        out.push('$');
                        out.push_str(&index.to_string());
                    }
                    PlaceholderStyle::Question => {
                        ordered.push(param.clone());
                        out.push('?');
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    Ok((out, ordered))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
