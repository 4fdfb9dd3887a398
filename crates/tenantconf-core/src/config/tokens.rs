//! `${NAME}` token expansion inside configuration values
//!
//! Values resolved by a lookup may themselves contain tokens; they are
//! expanded recursively up to a fixed depth. Tokens that cannot be resolved
//! (unknown name, malformed name, unterminated token, depth exhausted) are
//! left in the output verbatim.

use serde_json::Value;

use crate::constants::MAX_TOKEN_DEPTH;

const TOKEN_OPEN: &str = "${";
const TOKEN_CLOSE: char = '}';

/// Expands `${NAME}` tokens using a lookup function.
///
/// # Example
///
/// ```
/// use tenantconf_core::config::TokenExpander;
///
/// let expander = TokenExpander::new(|name: &str| match name {
///     "DATA" => Some("${ROOT}/data".to_string()),
///     "ROOT" => Some("/srv".to_string()),
///     _ => None,
/// });
///
/// assert_eq!(expander.expand_str("${DATA}/cache"), "/srv/data/cache");
/// assert_eq!(expander.expand_str("${MISSING}"), "${MISSING}");
/// ```
pub struct TokenExpander<F> {
    lookup: F,
    max_depth: usize,
}

impl<F> TokenExpander<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            max_depth: MAX_TOKEN_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand every string inside `value`, descending into arrays and objects.
    pub fn expand_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.expand_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.expand_value(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.expand_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn expand_str(&self, input: &str) -> String {
        self.expand_at(input, 0)
    }

    fn expand_at(&self, input: &str, depth: usize) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find(TOKEN_OPEN) {
            out.push_str(&rest[..start]);
            let body = &rest[start + TOKEN_OPEN.len()..];

            let Some(end) = body.find(TOKEN_CLOSE) else {
                // Unterminated: keep the remainder as is
                out.push_str(&rest[start..]);
                return out;
            };

            let token_len = TOKEN_OPEN.len() + end + TOKEN_CLOSE.len_utf8();
            let token = &rest[start..start + token_len];
            match self.resolve(&body[..end], depth) {
                Some(expanded) => out.push_str(&expanded),
                None => out.push_str(token),
            }
            rest = &rest[start + token_len..];
        }

        out.push_str(rest);
        out
    }

    fn resolve(&self, name: &str, depth: usize) -> Option<String> {
        if depth >= self.max_depth || !is_token_name(name) {
            return None;
        }
        let raw = (self.lookup)(name)?;
        Some(self.expand_at(&raw, depth + 1))
    }
}

fn is_token_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Render a configuration value for substitution into a string.
///
/// Scalars are rendered; null, arrays and objects have no string form.
pub fn value_as_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
