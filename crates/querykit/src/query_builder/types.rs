//! Abstract column type resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Turns an abstract column type (`string(64)`, `pk`, `integer NOT NULL`) into the
/// dialect's type SQL. Unknown types are returned unchanged.
pub trait ColumnTypeResolver: fmt::Debug + Send + Sync {
    fn column_type(&self, ty: &str) -> String;
}

/// Lookup-table resolver.
///
/// `name(args)rest` keeps the arguments and the rest; `name rest` keeps the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMap {
    types: BTreeMap<String, String>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a, I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = &'a (K, V)>,
        K: AsRef<str> + 'a,
        V: AsRef<str> + 'a,
    {
        Self {
            types: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }

    /// Add or replace entries.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in overrides {
            self.types.insert(k.into(), v.into());
        }
        self
    }

    pub fn get(&self, ty: &str) -> Option<&str> {
        self.types.get(ty).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ColumnTypeResolver for TypeMap {
    fn column_type(&self, ty: &str) -> String {
        static ARGS_RE: OnceLock<Regex> = OnceLock::new();
        static MODIFIER_RE: OnceLock<Regex> = OnceLock::new();
        static PARENS_RE: OnceLock<Regex> = OnceLock::new();

        if let Some(mapped) = self.get(ty) {
            return mapped.to_string();
        }

        let args_re = ARGS_RE
            .get_or_init(|| Regex::new(r"^(\w+)\((.+?)\)(.*)$").expect("invalid built-in column type regex"));
        if let Some(caps) = args_re.captures(ty) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            if let Some(mapped) = self.get(name) {
                let args = caps.get(2).map_or("", |m| m.as_str());
                let rest = caps.get(3).map_or("", |m| m.as_str());
                let parens = PARENS_RE
                    .get_or_init(|| Regex::new(r"\(.+\)").expect("invalid built-in column type regex"));
                let replaced = parens.replace(mapped, regex::NoExpand(&format!("({args})")));
                return format!("{replaced}{rest}");
            }
            return ty.to_string();
        }

        let modifier_re = MODIFIER_RE
            .get_or_init(|| Regex::new(r"^(\w+)\s+").expect("invalid built-in column type regex"));
        if let Some(caps) = modifier_re.captures(ty) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            if let Some(mapped) = self.get(name) {
                return format!("{mapped}{}", &ty[name.len()..]);
            }
        }
        ty.to_string()
    }
}
