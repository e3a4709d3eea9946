//! Bound values and the placeholder table.
//!
//! A compiled statement is `(sql, Params)`: the SQL references named placeholders
//! (`:pv0`, `:pv1`, ...) and [`Params`] maps each name to the [`Param`] bound to it.

use std::collections::HashMap;

/// Prefix of placeholders allocated by [`Params::bind`].
pub const PARAM_PREFIX: &str = ":pv";

/// A scalar value that can be bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a JSON value (bytes become an array of numbers).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
            Value::Json(j) => j.clone(),
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

impl_value_from!(Bool: bool);
impl_value_from!(Int: i8, i16, i32, i64, u8, u16, u32);
impl_value_from!(Float: f32, f64);
impl_value_from!(String: &str, String);
impl_value_from!(Bytes: Vec<u8>);
impl_value_from!(Json: serde_json::Value);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// How the driver should bind a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Null,
    Bool,
    Int,
    Str,
    /// Large object / binary data.
    Lob,
}

impl ParamType {
    /// Pick the bind type matching a value's runtime type.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => ParamType::Null,
            Value::Bool(_) => ParamType::Bool,
            Value::Int(_) => ParamType::Int,
            Value::Bytes(_) => ParamType::Lob,
            Value::Float(_) | Value::String(_) | Value::Json(_) => ParamType::Str,
        }
    }
}

/// A value together with its bind type.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    value: Value,
    ty: ParamType,
}

impl Param {
    /// Create a parameter with an explicit bind type.
    pub fn new(value: impl Into<Value>, ty: ParamType) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }

    /// Create a parameter whose bind type follows the value.
    pub fn infer(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = ParamType::infer(&value);
        Self { value, ty }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ty(&self) -> ParamType {
        self.ty
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl<T: Into<Value>> From<T> for Param {
    fn from(value: T) -> Self {
        Param::infer(value)
    }
}

/// Ordered placeholder table for one compiled statement.
///
/// Names are unique and always carry the leading `:`. Entries keep insertion order,
/// which is the order clauses were compiled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Param)>,
    index: HashMap<String, usize>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look a placeholder up by name (with or without the leading `:`).
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.index
            .get(normalize_name(name).as_str())
            .map(|&i| &self.entries[i].1)
    }

    /// Bound value of a placeholder, for assertions and logging.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(Param::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(normalize_name(name).as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn into_vec(self) -> Vec<(String, Param)> {
        self.entries
    }

    /// Allocate the next free placeholder for `param` and return its name.
    ///
    /// The name is `:pv{len}`. If that is taken (entries merged from raw
    /// expressions can occupy it), `_0`, `_1`, ... suffixes are tried in turn.
    pub fn bind(&mut self, param: impl Into<Param>) -> String {
        let count = self.entries.len();
        let mut name = format!("{PARAM_PREFIX}{count}");
        let mut additional = 0;
        while self.index.contains_key(&name) {
            name = format!("{PARAM_PREFIX}{count}_{additional}");
            additional += 1;
        }
        self.push(name.clone(), param.into());
        name
    }

    /// Insert a named parameter, renaming it if the name is taken.
    ///
    /// Returns the name actually used: `name` itself, or `name_0`, `name_1`, ...
    pub fn insert_unique(&mut self, name: &str, param: impl Into<Param>) -> String {
        let base = normalize_name(name);
        if !self.index.contains_key(&base) {
            self.push(base.clone(), param.into());
            return base;
        }
        let mut i = 0;
        let mut unique = format!("{base}_{i}");
        while self.index.contains_key(&unique) {
            i += 1;
            unique = format!("{base}_{i}");
        }
        self.push(unique.clone(), param.into());
        unique
    }

    /// Set a named parameter, replacing any existing value under that name.
    pub fn set(&mut self, name: &str, param: impl Into<Param>) {
        let name = normalize_name(name);
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = param.into(),
            None => self.push(name, param.into()),
        }
    }

    fn push(&mut self, name: String, param: Param) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, param));
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a Param);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Param)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    if name.starts_with(':') {
        name.to_string()
    } else {
        format!(":{name}")
    }
}
