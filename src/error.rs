use thiserror::Error;

/// A malformed host or path template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
  #[error("unbalanced braces in {0:?}")]
  UnbalancedBraces(String),

  #[error("missing name or pattern in {0:?}")]
  MissingNameOrPattern(String),

  #[error("path must start with a slash, got {0:?}")]
  PathWithoutSlash(String),

  /// A variable pattern introduced its own capturing group.
  #[error(
    "route {0:?} contains capture groups in its regexp, only non-capturing groups are accepted: e.g. (?:pattern) instead of (pattern)"
  )]
  CapturingGroups(String),

  #[error("invalid pattern in {template:?}: {source}")]
  InvalidPattern {
    template: String,
    #[source]
    source: regex::Error,
  },
}

/// Two registrations on the same route contradict each other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
  #[error("route already has a host template")]
  HostAlreadySet,

  #[error("route already has a path template")]
  PathAlreadySet,

  #[error("route already has name {current:?}, can't set {requested:?}")]
  NameAlreadySet { current: String, requested: String },

  #[error("duplicated route variable {0:?}")]
  DuplicateVariable(String),
}

/// Bad input when building a URL from a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
  #[error("missing route variable {0:?}")]
  Missing(String),

  #[error("variable {value:?} doesn't match, expected {pattern:?}")]
  Mismatch { value: String, pattern: String },

  #[error("number of parameters must be multiple of 2, got {0}")]
  OddPairs(usize),
}

/// Every error the router can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Conflict(#[from] ConflictError),

  #[error(transparent)]
  Variable(#[from] VariableError),

  #[error("route doesn't have a host or path")]
  NoTemplate,

  #[error("route doesn't have a host")]
  NoHost,

  #[error("route doesn't have a path")]
  NoPath,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_offending_input() {
    let err: Error = TemplateError::UnbalancedBraces("/articles/{id".into()).into();
    assert_eq!(err.to_string(), "unbalanced braces in \"/articles/{id\"");

    let err: Error = VariableError::Missing("id".into()).into();
    assert_eq!(err.to_string(), "missing route variable \"id\"");
  }

  #[test]
  fn sticky_errors_compare_after_clone() {
    let err: Error = ConflictError::DuplicateVariable("v".into()).into();
    assert_eq!(err.clone(), err);
  }
}
