//! Header merging.

use std::collections::HashMap;

/// Merge client default headers with request headers.
///
/// Names are lower-cased; on collision the request value wins. Within one map
/// the order of two casings of the same name is unspecified, which is why the
/// request and config builders lower-case names on insert.
#[must_use]
pub fn merge_headers(
    defaults: &HashMap<String, String>,
    request: &HashMap<String, String>,
) -> HashMap<String, String> {
    defaults
        .iter()
        .chain(request)
        .map(|(name, value)| (name.to_lowercase(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn request_headers_override_defaults_case_insensitively() {
        let defaults = headers(&[("X-Api-Version", "1"), ("Accept", "application/json")]);
        let request = headers(&[("x-api-version", "2"), ("X-Trace", "abc")]);

        let merged = merge_headers(&defaults, &request);

        assert_eq!(
            merged,
            headers(&[
                ("x-api-version", "2"),
                ("accept", "application/json"),
                ("x-trace", "abc"),
            ])
        );
    }

    #[test]
    fn empty_inputs() {
        assert!(merge_headers(&HashMap::new(), &HashMap::new()).is_empty());
    }
}
