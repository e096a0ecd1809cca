use crate::error::{TemplateError, VariableError};
use crate::http::{self, Request};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;

/// Where a template is used, which decides its default variable pattern and
/// how it is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexType {
  /// The full request path.
  Path,
  /// The request host. Variables default to anything but a dot.
  Host,
  /// A leading part of the request path.
  Prefix,
}

impl RegexType {
  fn default_pattern(self) -> &'static str {
    match self {
      RegexType::Host => "[^.]+",
      RegexType::Path | RegexType::Prefix => "[^/]+",
    }
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexOptions {
  /// Accept the path with or without its trailing slash.
  pub strict_slash: bool,
}

/// A compiled host or path template.
///
/// The matching regex and the reverse template are produced by the same walk
/// over the template, so reversal and matching always agree on variable order.
#[derive(Debug, Clone)]
pub struct RouteRegex {
  // The unmodified template.
  template: String,
  // The type of match
  regex_type: RegexType,
  // Options for matching
  options: RegexOptions,
  // Expanded regexp.
  regex: Regex,
  // Reverse template: `%s` per variable, literal `%` doubled.
  reverse: String,
  // Variable names.
  var_names: Vec<String>,
  // Variable regexps (validators).
  var_regexes: Vec<Regex>,
  // Wildcard host-port (no strict port match in hostname)
  wildcard_host_port: bool,
}

impl RouteRegex {
  pub fn new(
    template: &str,
    regex_type: RegexType,
    mut options: RegexOptions,
  ) -> Result<Self, TemplateError> {
    if regex_type != RegexType::Path {
      options.strict_slash = false;
    }

    let compiled = compile(
      template,
      regex_type.default_pattern(),
      regex_type == RegexType::Prefix,
      options.strict_slash,
    )?;

    Ok(RouteRegex {
      template: template.to_string(),
      regex_type,
      options,
      wildcard_host_port: regex_type == RegexType::Host && !compiled.literal_colon,
      regex: compiled.regex,
      reverse: compiled.reverse,
      var_names: compiled.var_names,
      var_regexes: compiled.var_regexes,
    })
  }

  pub fn template(&self) -> &str {
    &self.template
  }

  pub fn regex_type(&self) -> RegexType {
    self.regex_type
  }

  pub fn regex(&self) -> &Regex {
    &self.regex
  }

  pub fn reverse(&self) -> &str {
    &self.reverse
  }

  pub fn var_names(&self) -> &[String] {
    &self.var_names
  }

  pub fn var_regexes(&self) -> &[Regex] {
    &self.var_regexes
  }

  pub(crate) fn strict_slash(&self) -> bool {
    self.options.strict_slash
  }

  /// The part of the request this template is matched against. Paths are
  /// percent-decoded unless `encoded` is set.
  pub(crate) fn subject<'r>(&self, req: &'r Request, encoded: bool) -> Option<Cow<'r, str>> {
    match self.regex_type {
      RegexType::Host => {
        let host = http::host(req)?;
        if self.wildcard_host_port {
          Some(http::host_without_port(host).into())
        } else {
          Some(host.into())
        }
      }
      RegexType::Path | RegexType::Prefix if encoded => Some(req.uri().path().into()),
      RegexType::Path | RegexType::Prefix => Some(http::decoded_path(req)),
    }
  }

  pub fn is_match(&self, subject: &str) -> bool {
    self.regex.is_match(subject)
  }

  /// Copies every captured variable of `subject` into `vars`.
  pub fn captures(&self, subject: &str, vars: &mut HashMap<String, String>) -> bool {
    let caps = match self.regex.captures(subject) {
      Some(caps) => caps,
      None => return false,
    };

    for (i, name) in self.var_names.iter().enumerate() {
      if let Some(m) = caps.name(&group_name(i)) {
        vars.insert(name.clone(), m.as_str().to_string());
      }
    }
    true
  }

  /// Builds a concrete host or path from variable values.
  ///
  /// Values are substituted as-is unless `validate` is set, in which case a
  /// result the template would not match is rejected with the first variable
  /// that doesn't fit its own pattern. Path values are percent-encoded, apart
  /// from `/`, so the result is a valid URI path that decodes back to them.
  pub fn url(
    &self,
    values: &HashMap<String, String>,
    validate: bool,
  ) -> Result<String, VariableError> {
    let mut resolved = Vec::with_capacity(self.var_names.len());
    for name in &self.var_names {
      let value = values
        .get(name)
        .ok_or_else(|| VariableError::Missing(name.clone()))?;
      resolved.push(value.as_str());
    }

    if validate && !self.regex.is_match(&expand(&self.reverse, &resolved)) {
      // The full regex is cheaper, individual ones give a better message.
      for (value, regex) in resolved.iter().zip(&self.var_regexes) {
        if !regex.is_match(value) {
          return Err(VariableError::Mismatch {
            value: value.to_string(),
            pattern: regex.as_str().to_string(),
          });
        }
      }
    }

    if self.regex_type == RegexType::Host {
      return Ok(expand(&self.reverse, &resolved));
    }

    let encoded: Vec<Cow<'_, str>> = resolved
      .iter()
      .map(|value| utf8_percent_encode(value, PATH_VALUE).into())
      .collect();
    let encoded: Vec<&str> = encoded.iter().map(|value| value.as_ref()).collect();
    Ok(expand(&self.reverse, &encoded))
  }
}

/// Escaped in path values: controls, space, non-ASCII and the characters that
/// would end the path or start an escape.
const PATH_VALUE: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

struct Compiled {
  regex: Regex,
  reverse: String,
  var_names: Vec<String>,
  var_regexes: Vec<Regex>,
  literal_colon: bool,
}

fn group_name(i: usize) -> String {
  format!("v{}", i)
}

fn invalid(template: &str, source: regex::Error) -> TemplateError {
  TemplateError::InvalidPattern {
    template: template.to_string(),
    source,
  }
}

fn compile(
  template: &str,
  default_pattern: &str,
  is_prefix: bool,
  strict_slash: bool,
) -> Result<Compiled, TemplateError> {
  let spans = brace_spans(template)?;

  let mut tpl = template;
  let mut end_slash = false;
  if strict_slash && tpl.ends_with('/') {
    tpl = &tpl[..tpl.len() - 1];
    end_slash = true;
  }

  let mut pattern = String::from("^");
  let mut reverse = String::new();
  let mut var_names = Vec::with_capacity(spans.len());
  let mut var_regexes = Vec::with_capacity(spans.len());
  let mut literal_colon = false;

  let mut end = 0;
  for (i, &(start, stop)) in spans.iter().enumerate() {
    let raw = &tpl[end..start];
    end = stop;

    let placeholder = &tpl[start + 1..stop - 1];
    let mut parts = placeholder.splitn(2, ':');
    let name = parts.next().unwrap_or("");
    let patt = parts.next().unwrap_or(default_pattern);
    if name.is_empty() || patt.is_empty() {
      return Err(TemplateError::MissingNameOrPattern(
        tpl[start..stop].to_string(),
      ));
    }

    literal_colon |= raw.contains(':');
    pattern.push_str(&regex::escape(raw));
    pattern.push_str(&format!("(?P<{}>{})", group_name(i), patt));
    push_reverse_literal(&mut reverse, raw);
    reverse.push_str("%s");

    var_names.push(name.to_string());
    let validator = Regex::new(&format!("^(?:{})$", patt)).map_err(|e| invalid(template, e))?;
    var_regexes.push(validator);
  }

  let raw = &tpl[end..];
  literal_colon |= raw.contains(':');
  pattern.push_str(&regex::escape(raw));
  if strict_slash {
    pattern.push_str("[/]?");
  }
  if !is_prefix {
    pattern.push('$');
  }

  push_reverse_literal(&mut reverse, raw);
  if end_slash {
    reverse.push('/');
  }

  let regex = Regex::new(&pattern).map_err(|e| invalid(template, e))?;
  if regex.captures_len() - 1 != var_names.len() {
    return Err(TemplateError::CapturingGroups(template.to_string()));
  }

  Ok(Compiled {
    regex,
    reverse,
    var_names,
    var_regexes,
    literal_colon,
  })
}

/// Returns the `[start, end)` byte spans of the outermost `{...}` groups.
fn brace_spans(s: &str) -> Result<Vec<(usize, usize)>, TemplateError> {
  let mut level = 0usize;
  let mut start = 0;
  let mut spans = Vec::new();

  for (i, b) in s.bytes().enumerate() {
    match b {
      b'{' => {
        level += 1;
        if level == 1 {
          start = i;
        }
      }
      b'}' => {
        if level == 0 {
          return Err(TemplateError::UnbalancedBraces(s.to_string()));
        }
        level -= 1;
        if level == 0 {
          spans.push((start, i + 1));
        }
      }
      _ => {}
    }
  }

  if level != 0 {
    return Err(TemplateError::UnbalancedBraces(s.to_string()));
  }
  Ok(spans)
}

fn push_reverse_literal(reverse: &mut String, raw: &str) {
  reverse.push_str(&raw.replace('%', "%%"));
}

/// Fills the `%s` slots of a reverse template in order.
fn expand(reverse: &str, values: &[&str]) -> String {
  let mut out = String::with_capacity(reverse.len());
  let mut values = values.iter();
  let mut chars = reverse.chars();

  while let Some(c) = chars.next() {
    if c != '%' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('s') => out.push_str(values.next().copied().unwrap_or("")),
      Some(other) => out.push(other),
      None => out.push('%'),
    }
  }
  out
}

/// The host and path templates of a route.
///
/// Templates copied from a parent route into a subrouter are marked as
/// inherited: they take part in URL building and in variable uniqueness
/// checks, but the parent has already matched them.
#[derive(Debug, Clone, Default)]
pub struct RouteRegexGroup {
  pub(crate) host: Option<RouteRegex>,
  pub(crate) path: Option<RouteRegex>,
  pub(crate) host_inherited: bool,
  pub(crate) path_inherited: bool,
}

impl RouteRegexGroup {
  pub(crate) fn inherit(&self) -> Self {
    RouteRegexGroup {
      host: self.host.clone(),
      path: self.path.clone(),
      host_inherited: self.host.is_some(),
      path_inherited: self.path.is_some(),
    }
  }

  pub(crate) fn own_host(&self) -> Option<&RouteRegex> {
    self.host.as_ref().filter(|_| !self.host_inherited)
  }

  pub(crate) fn own_path(&self) -> Option<&RouteRegex> {
    self.path.as_ref().filter(|_| !self.path_inherited)
  }
}
