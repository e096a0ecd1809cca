/// Returns the canonical form of a request path.
///
/// `.` and `..` segments are resolved lexically, repeated slashes collapse,
/// the result always starts with `/` and keeps the trailing slash of the
/// input.
pub fn clean_path(p: &str) -> String {
  if p.is_empty() {
    return "/".to_string();
  }

  let mut segments: Vec<&str> = Vec::new();
  for segment in p.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        segments.pop();
      }
      s => segments.push(s),
    }
  }

  let mut cleaned = String::with_capacity(p.len() + 1);
  for segment in &segments {
    cleaned.push('/');
    cleaned.push_str(segment);
  }

  if cleaned.is_empty() || p.ends_with('/') {
    cleaned.push('/');
  }
  cleaned
}
