//! Query-string construction with the remote platform's quoting rules.
//!
//! The REST API expects string filter values as JSON literals
//! (`_filter_status="running"`), except for the ordering keys and `__in`
//! filters, which take raw values. Numbers and booleans are always raw, and a
//! list becomes one `key=value` pair per element.

/// Keys whose string values are sent raw rather than JSON-quoted.
const RAW_KEYS: [&str; 3] = ["start_time", "sort", "order"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Int(u64),
    Flag(bool),
    List(Vec<String>),
}

/// Ordered query parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string parameter, subject to JSON quoting.
    #[must_use]
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), QueryValue::Text(value.into())));
        self
    }

    /// Adds an integer parameter.
    #[must_use]
    pub fn int(mut self, key: impl Into<String>, value: u64) -> Self {
        self.params.push((key.into(), QueryValue::Int(value)));
        self
    }

    /// Adds a boolean parameter, sent as `true`/`false`.
    #[must_use]
    pub fn flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.params.push((key.into(), QueryValue::Flag(value)));
        self
    }

    /// Adds a list parameter, sent as one pair per element.
    #[must_use]
    pub fn list<I, T>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let values = values.into_iter().map(|value| value.to_string()).collect();
        self.params.push((key.into(), QueryValue::List(values)));
        self
    }

    /// Appends every parameter of `other`.
    #[must_use]
    pub fn extend(mut self, other: Query) -> Self {
        self.params.extend(other.params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encodes the parameters as `(key, value)` pairs, in insertion order.
    pub fn encode(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len());
        for (key, value) in &self.params {
            match value {
                QueryValue::Text(text) if is_raw_key(key) => {
                    pairs.push((key.clone(), text.clone()))
                }
                QueryValue::Text(text) => pairs.push((key.clone(), quote(text))),
                QueryValue::Int(number) => pairs.push((key.clone(), number.to_string())),
                QueryValue::Flag(flag) => pairs.push((key.clone(), flag.to_string())),
                QueryValue::List(items) => {
                    pairs.extend(items.iter().map(|item| (key.clone(), item.clone())));
                }
            }
        }
        pairs
    }
}

fn is_raw_key(key: &str) -> bool {
    RAW_KEYS.contains(&key) || key.contains("__in")
}

fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}
