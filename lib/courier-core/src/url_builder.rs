//! Request URL construction.

use serde_json::Value;

use crate::query::{self, QueryOptions};

/// Append the encoded `query` to `path`.
///
/// The separator is `?` when `path` has no query yet, `&` when it already has
/// parameters. A `?` left dangling at the end is removed. A `null`, `false`,
/// `0` or `""` query leaves `path` as-is, and a query encoding to nothing adds
/// no separator.
///
/// ```
/// use courier_core::{build_url, query::QueryOptions};
/// use serde_json::json;
///
/// let options = QueryOptions::default();
/// assert_eq!(build_url("/todos", Some(&json!({"page": 2})), &options), "/todos?page=2");
/// assert_eq!(build_url("/todos?a=1", Some(&json!({"b": 2})), &options), "/todos?a=1&b=2");
/// assert_eq!(build_url("/todos?", Some(&json!({})), &options), "/todos");
/// ```
#[must_use]
pub fn build_url(path: &str, query: Option<&Value>, options: &QueryOptions) -> String {
    let Some(query) = query.filter(|query| is_truthy(query)) else {
        return path.to_string();
    };

    let encoded = query::stringify(query, options);
    let mut url = path.to_string();
    if !encoded.is_empty() {
        match url.find('?') {
            None => url.push('?'),
            Some(index) if index + 1 < url.len() && !url.ends_with('&') => url.push('&'),
            Some(_) => {}
        }
        url.push_str(&encoded);
    }

    if url.ends_with('?') {
        url.pop();
    }
    url
}

/// `null`, `false`, `0` and `""` leave the path untouched.
fn is_truthy(query: &Value) -> bool {
    match query {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number.abs() > 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Join `base_url` and `path` with exactly one `/`.
///
/// Runs of slashes in the path are collapsed; the `://` of a scheme and
/// anything after `?` or `#` are kept as-is.
///
/// ```
/// use courier_core::resolve_absolute_url;
///
/// assert_eq!(
///     resolve_absolute_url("https://api.x.com/v1/", "//todos//1"),
///     "https://api.x.com/v1/todos/1"
/// );
/// ```
#[must_use]
pub fn resolve_absolute_url(base_url: &str, path: &str) -> String {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    let (scheme, rest) = split_scheme(&joined);
    let split = rest.find(['?', '#']).unwrap_or(rest.len());
    let (route, tail) = rest.split_at(split);

    let mut collapsed = String::with_capacity(joined.len());
    collapsed.push_str(scheme);
    let mut previous_slash = false;
    for ch in route.chars() {
        let is_slash = ch == '/';
        if !(is_slash && previous_slash) {
            collapsed.push(ch);
        }
        previous_slash = is_slash;
    }
    collapsed.push_str(tail);
    collapsed
}

/// Split `scheme://` off the front, if present.
fn split_scheme(url: &str) -> (&str, &str) {
    let Some(index) = url.find("://") else {
        return ("", url);
    };
    let scheme = url.get(..index).unwrap_or_default();
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'));
    if valid {
        url.split_at(index + 3)
    } else {
        ("", url)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::ArrayFormat;

    #[test]
    fn build_url_without_query() {
        let options = QueryOptions::default();
        assert_eq!(build_url("/todos", None, &options), "/todos");
        assert_eq!(build_url("/todos", Some(&Value::Null), &options), "/todos");
        assert_eq!(build_url("/todos?a=1", None, &options), "/todos?a=1");
    }

    #[test]
    fn build_url_separators() {
        let options = QueryOptions::default();
        let query = json!({"b": 2});

        assert_eq!(build_url("/todos", Some(&query), &options), "/todos?b=2");
        assert_eq!(build_url("/todos?", Some(&query), &options), "/todos?b=2");
        assert_eq!(build_url("/todos?a=1", Some(&query), &options), "/todos?a=1&b=2");
        assert_eq!(build_url("/todos?a=1&", Some(&query), &options), "/todos?a=1&b=2");
    }

    #[test]
    fn build_url_empty_query_strips_dangling_question_mark() {
        let options = QueryOptions::default();
        assert_eq!(build_url("/todos", Some(&json!({})), &options), "/todos");
        assert_eq!(build_url("/todos", Some(&json!({"t": []})), &options), "/todos");
        assert_eq!(build_url("/todos?a=1", Some(&json!({})), &options), "/todos?a=1");
    }

    #[test]
    fn build_url_falsy_scalar_query_keeps_path() {
        let options = QueryOptions::default();
        for query in [json!(false), json!(0), json!(0.0), json!("")] {
            assert_eq!(build_url("/p?a=1", Some(&query), &options), "/p?a=1");
            assert_eq!(build_url("/p?", Some(&query), &options), "/p?");
        }
        assert_eq!(build_url("/p?a=1", Some(&json!(true)), &options), "/p?a=1");
        assert_eq!(build_url("/p?a=1", Some(&json!("x")), &options), "/p?a=1");
    }

    #[test]
    fn build_url_uses_array_format() {
        let options = QueryOptions::new(ArrayFormat::Repeat);
        assert_eq!(
            build_url("/todos", Some(&json!({"tag": ["a", "b"]})), &options),
            "/todos?tag=a&tag=b"
        );
    }

    #[test]
    fn resolve_joins_with_single_slash() {
        assert_eq!(
            resolve_absolute_url("https://api.x.com", "todos"),
            "https://api.x.com/todos"
        );
        assert_eq!(
            resolve_absolute_url("https://api.x.com///", "///todos"),
            "https://api.x.com/todos"
        );
        assert_eq!(
            resolve_absolute_url("https://api.x.com/v1", "/a//b///c"),
            "https://api.x.com/v1/a/b/c"
        );
    }

    #[test]
    fn resolve_keeps_query_and_fragment() {
        assert_eq!(
            resolve_absolute_url("https://api.x.com", "/r?next=http://y.com//z#a//b"),
            "https://api.x.com/r?next=http://y.com//z#a//b"
        );
    }

    #[test]
    fn resolve_relative_base() {
        assert_eq!(resolve_absolute_url("/api/", "/todos"), "/api/todos");
        assert_eq!(resolve_absolute_url("", "todos"), "/todos");
    }
}
