use crate::error::{Error, Result, VariableError};
use crate::router::regex::{RouteRegex, RouteRegexGroup};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Rewrites route variables before a URL is built.
pub type BuildVarsFunc = Arc<dyn Fn(HashMap<String, String>) -> HashMap<String, String> + Send + Sync>;

/// Everything needed to build URLs for a route: its name, host and path
/// templates, build settings and the error that disabled it, if any.
///
/// This is what `Router::get` hands out. The name registry keeps the latest
/// copy of every named route, so any router of a tree can look up any name.
#[derive(Clone, Default)]
pub struct RouteUrl {
  pub(crate) name: Option<String>,

  /// Manager for the variables from host and path.
  pub(crate) regexp: RouteRegexGroup,

  /// The scheme used when building URLs.
  pub(crate) build_scheme: Option<String>,

  pub(crate) build_vars_func: Option<BuildVarsFunc>,

  /// If true, values must match their variable's pattern.
  pub(crate) validate_vars: bool,

  pub(crate) err: Option<Error>,
}

impl RouteUrl {
  /// The settings a subrouter's routes start from.
  pub(crate) fn inherit(&self) -> Self {
    RouteUrl {
      name: None,
      regexp: self.regexp.inherit(),
      build_scheme: self.build_scheme.clone(),
      build_vars_func: self.build_vars_func.clone(),
      validate_vars: self.validate_vars,
      err: None,
    }
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// Returns the error that disabled the route, if any.
  pub fn err(&self) -> Option<&Error> {
    self.err.as_ref()
  }

  /// Builds a URL from `name, value` pairs. Routes with a host template
  /// build an absolute URL.
  pub fn url(&self, pairs: &[&str]) -> Result<String> {
    self.url_with(&pairs_to_map(pairs)?)
  }

  /// Like `url`, from a map of variables.
  pub fn url_with(&self, values: &HashMap<String, String>) -> Result<String> {
    self.check_buildable()?;
    if self.regexp.host.is_none() && self.regexp.path.is_none() {
      return Err(Error::NoTemplate);
    }

    let values = self.prepare_vars(values);
    let mut url = String::new();
    if let Some(host) = &self.regexp.host {
      let host = host.url(&values, self.validate_vars)?;
      url.push_str(self.build_scheme());
      url.push_str("://");
      url.push_str(&host);
    }
    if let Some(path) = &self.regexp.path {
      url.push_str(&path.url(&values, self.validate_vars)?);
    }
    Ok(url)
  }

  /// Builds the host part of the URL, as `scheme://host`.
  pub fn url_host(&self, pairs: &[&str]) -> Result<String> {
    self.url_host_with(&pairs_to_map(pairs)?)
  }

  pub fn url_host_with(&self, values: &HashMap<String, String>) -> Result<String> {
    self.check_buildable()?;
    let host = self.regexp.host.as_ref().ok_or(Error::NoHost)?;

    let values = self.prepare_vars(values);
    let host = host.url(&values, self.validate_vars)?;
    Ok(format!("{}://{}", self.build_scheme(), host))
  }

  /// Builds the path part of the URL.
  pub fn url_path(&self, pairs: &[&str]) -> Result<String> {
    self.url_path_with(&pairs_to_map(pairs)?)
  }

  pub fn url_path_with(&self, values: &HashMap<String, String>) -> Result<String> {
    self.check_buildable()?;
    let path = self.regexp.path.as_ref().ok_or(Error::NoPath)?;

    let values = self.prepare_vars(values);
    Ok(path.url(&values, self.validate_vars)?)
  }

  /// The template used to match the host, e.g. `{subdomain}.domain.com`.
  pub fn host_template(&self) -> Result<&str> {
    self.check_buildable()?;
    self
      .regexp
      .host
      .as_ref()
      .map(RouteRegex::template)
      .ok_or(Error::NoHost)
  }

  /// The template used to match the path, including any parent prefix.
  pub fn path_template(&self) -> Result<&str> {
    self.check_buildable()?;
    self
      .regexp
      .path
      .as_ref()
      .map(RouteRegex::template)
      .ok_or(Error::NoPath)
  }

  fn check_buildable(&self) -> Result<()> {
    match &self.err {
      Some(err) => Err(err.clone()),
      None => Ok(()),
    }
  }

  fn prepare_vars<'v>(&self, values: &'v HashMap<String, String>) -> Cow<'v, HashMap<String, String>> {
    match &self.build_vars_func {
      Some(f) => Cow::Owned(f(values.clone())),
      None => Cow::Borrowed(values),
    }
  }

  fn build_scheme(&self) -> &str {
    self.build_scheme.as_deref().unwrap_or("http")
  }
}

fn pairs_to_map(pairs: &[&str]) -> std::result::Result<HashMap<String, String>, VariableError> {
  if pairs.len() % 2 != 0 {
    return Err(VariableError::OddPairs(pairs.len()));
  }
  Ok(
    pairs
      .chunks(2)
      .map(|pair| (pair[0].to_string(), pair[1].to_string()))
      .collect(),
  )
}
