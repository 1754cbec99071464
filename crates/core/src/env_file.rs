//! Targeted edits of `KEY=value` configuration text.
//!
//! Values are read with `dotenvy`'s parser, the same one that loads the file
//! into the process environment, so quoting, escapes, and inline comments are
//! interpreted identically. [`upsert`] touches only the first line assigning
//! the requested key. Every other line, including its original line ending, is
//! carried over byte for byte. A line matches when, after leading whitespace
//! and an optional `export ` prefix, it begins with `KEY=` (whitespace before
//! the `=` is allowed).

/// Find the line assigning `key` and split it into `(prefix, raw_value, line_ending)`.
fn split_assignment<'a>(line: &'a str, key: &str) -> Option<(&'a str, &'a str, &'a str)> {
    let body_len = line.trim_end_matches(['\n', '\r']).len();
    let (body, ending) = line.split_at(body_len);

    let trimmed = body.trim_start();
    let unexported = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let raw_value = unexported
        .strip_prefix(key)?
        .trim_start_matches([' ', '\t'])
        .strip_prefix('=')?;

    let prefix_len = body.len() - unexported.len();
    Some((&body[..prefix_len], raw_value, ending))
}

/// Read the value assigned to `key` by the first line that sets it.
///
/// Returns the parse error of the first malformed line when `key` is not
/// found, so a broken assignment is not mistaken for a missing one.
pub fn read_value(content: &str, key: &str) -> Result<Option<String>, dotenvy::Error> {
    let mut first_error = None;
    for entry in dotenvy::from_read_iter(content.as_bytes()) {
        match entry {
            Ok((name, value)) if name == key => return Ok(Some(value)),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Return `content` with `key` set to `value`.
///
/// Replaces the first assignment in place, or appends a new line when the
/// key is absent. The written value is always double-quoted.
pub fn upsert(content: &str, key: &str, value: &str) -> String {
    let mut out = String::with_capacity(content.len() + key.len() + value.len() + 4);
    let mut replaced = false;

    for line in content.split_inclusive('\n') {
        if !replaced {
            if let Some((prefix, _, ending)) = split_assignment(line, key) {
                out.push_str(&format!("{prefix}{key}=\"{value}\"{ending}"));
                replaced = true;
                continue;
            }
        }
        out.push_str(line);
    }

    if !replaced {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("{key}=\"{value}\"\n"));
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
