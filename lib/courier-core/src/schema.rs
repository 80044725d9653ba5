//! Validation seam.
//!
//! A [`Schema`] parses an input into an output or fails with a [`SchemaError`]
//! listing one [`Issue`] per problem. [`Typed`] adapts any
//! [`serde::Deserialize`] type, [`FnSchema`] adapts a closure.
//!
//! Query and body schemas are stored type-erased behind [`ValueSchema`].

use std::fmt;
use std::marker::PhantomData;

use derive_more::{Display, Error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One problem found by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    path: String,
    message: String,
}

impl Issue {
    /// Issue about the value itself.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Issue about a nested field, `path` like `user.tags[0]`.
    #[must_use]
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Dotted path of the offending field, empty for the root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{}", self.prettify())]
pub struct SchemaError {
    #[error(not(source))]
    issues: Vec<Issue>,
}

impl SchemaError {
    /// Failure with a single issue.
    #[must_use]
    pub fn new(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// Failure with several issues.
    #[must_use]
    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Issues found.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Multi-line rendering: one `✖ message` line per issue, followed by
    /// `  → at path` when the issue targets a nested field.
    #[must_use]
    pub fn prettify(&self) -> String {
        self.issues
            .iter()
            .map(|issue| {
                if issue.path.is_empty() {
                    format!("✖ {}", issue.message)
                } else {
                    format!("✖ {}\n  → at {}", issue.message, issue.path)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Issue> for SchemaError {
    fn from(issue: Issue) -> Self {
        Self::new(issue)
    }
}

/// Parses an input into a validated output.
pub trait Schema<I>: Send + Sync {
    /// Validated value.
    type Output;

    /// Validate `input`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing every problem found.
    fn parse(&self, input: I) -> Result<Self::Output, SchemaError>;
}

/// Schema deserializing a JSON value into `T`.
pub struct Typed<T>(PhantomData<fn() -> T>);

/// Shorthand for `Typed::<T>::default()`.
#[must_use]
pub fn typed<T>() -> Typed<T> {
    Typed(PhantomData)
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Typed<T> {}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Typed")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Schema<Value> for Typed<T>
where
    T: DeserializeOwned,
{
    type Output = T;

    fn parse(&self, input: Value) -> Result<Self::Output, SchemaError> {
        serde_path_to_error::deserialize(input).map_err(|err| {
            let message = err.inner().to_string();
            let path = err.path();
            let issue = if path.iter().next().is_none() {
                Issue::new(message)
            } else {
                Issue::at(path.to_string(), message)
            };
            SchemaError::new(issue)
        })
    }
}

/// Schema backed by a closure.
#[derive(Clone, Copy)]
pub struct FnSchema<F>(F);

/// Wrap a closure as a [`Schema`].
pub fn schema_fn<I, O, F>(f: F) -> FnSchema<F>
where
    F: Fn(I) -> Result<O, SchemaError> + Send + Sync,
{
    FnSchema(f)
}

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSchema")
    }
}

impl<I, O, F> Schema<I> for FnSchema<F>
where
    F: Fn(I) -> Result<O, SchemaError> + Send + Sync,
{
    type Output = O;

    fn parse(&self, input: I) -> Result<Self::Output, SchemaError> {
        (self.0)(input)
    }
}

/// Object-safe schema over JSON values, used for query and body validation.
///
/// The validated value replaces the original, so schemas may coerce.
pub trait ValueSchema: Send + Sync {
    /// Validate and possibly transform `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the value is rejected.
    fn coerce(&self, value: Value) -> Result<Value, SchemaError>;
}

impl<S> ValueSchema for S
where
    S: Schema<Value>,
    S::Output: Serialize,
{
    fn coerce(&self, value: Value) -> Result<Value, SchemaError> {
        let output = self.parse(value)?;
        serde_json::to_value(output).map_err(|err| SchemaError::new(Issue::new(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Page {
        page: u32,
        tags: Vec<String>,
    }

    #[test]
    fn typed_schema_accepts_valid_value() {
        let schema = typed::<Page>();

        let_assert!(Ok(page) = schema.parse(json!({"page": 2, "tags": ["a"]})));
        check!(
            page == Page {
                page: 2,
                tags: vec!["a".to_string()]
            }
        );
    }

    #[test]
    fn typed_schema_reports_nested_path() {
        let schema = typed::<Page>();

        let_assert!(Err(err) = schema.parse(json!({"page": 2, "tags": [1]})));
        check!(err.issues().len() == 1);
        check!(err.issues()[0].path() == "tags[0]");
    }

    #[test]
    fn typed_schema_reports_root_issue_without_path() {
        let schema = typed::<Page>();

        let_assert!(Err(err) = schema.parse(json!("nope")));
        check!(err.issues()[0].path().is_empty());
        check!(err.prettify().starts_with("✖ "));
        check!(!err.prettify().contains("→ at"));
    }

    #[test]
    fn prettify_lists_every_issue() {
        let err = SchemaError::from_issues([
            Issue::at("page", "expected a number"),
            Issue::new("unknown field"),
        ]);

        insta::assert_snapshot!(err.prettify(), @r"
        ✖ expected a number
          → at page
        ✖ unknown field
        ");
        check!(err.to_string() == err.prettify());
    }

    #[test]
    fn value_schema_coerces() {
        let schema = schema_fn(|value: Value| match value {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| Issue::new(err.to_string()).into()),
            other => Ok(other),
        });

        let_assert!(Ok(value) = schema.coerce(json!("42")));
        check!(value == json!(42));
        check!(schema.coerce(json!("x")).is_err());
    }

    #[test]
    fn typed_schema_is_a_value_schema() {
        let schema: Box<dyn ValueSchema> = Box::new(typed::<Page>());

        let_assert!(Ok(value) = schema.coerce(json!({"page": 1, "tags": [], "extra": true})));
        check!(value == json!({"page": 1, "tags": []}));
    }
}
