//! Query parameters and the query-string appender.

/// A query parameter value: a single scalar or an ordered list of scalars.
///
/// Lists are rendered as indexed keys, `name[0]=a&name[1]=b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multiple(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Append `params` to the query string of `url`.
///
/// Uses `?` or `&` depending on whether the URL already has a query, and
/// keeps any `#fragment` at the end. Names and values are
/// `application/x-www-form-urlencoded`.
pub fn add_params(url: &str, params: &[(String, ParamValue)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        match value {
            ParamValue::Single(value) => {
                query.append_pair(name, value);
            }
            ParamValue::Multiple(values) => {
                for (index, value) in values.iter().enumerate() {
                    query.append_pair(&format!("{name}[{index}]"), value);
                }
            }
        }
    }
    let query = query.finish();
    if query.is_empty() {
        return url.to_string();
    }

    let (base, fragment) = match url.find('#') {
        Some(at) => url.split_at(at),
        None => (url, ""),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{base}{separator}{query}{fragment}")
}

/// Replace the value stored under `name`, or append a new entry.
pub(crate) fn upsert<V>(entries: &mut Vec<(String, V)>, name: String, value: V) {
    match entries.iter_mut().find(|(key, _)| *key == name) {
        Some(entry) => entry.1 = value,
        None => entries.push((name, value)),
    }
}
