//! Config template materialization.
//!
//! Templates are plain text with `${NAME}` placeholders. Substitution is a
//! single left-to-right pass: each recognized placeholder is replaced by its
//! binding (falling back to the process environment, then to the empty
//! string) and never re-expanded. `$`, `{` and `}` sequences that do not
//! form a placeholder pass through unchanged; there is no escape syntax.

use crate::error::{Result, RunnerError};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Per-run placeholder bindings, keyed by placeholder name.
pub type Bindings = BTreeMap<String, String>;

/// Replace every `${NAME}` in `text` with its bound value.
///
/// `NAME` must match `[A-Za-z_][A-Za-z0-9_]*`; anything else (including an
/// unterminated `${`) is not a placeholder and is copied verbatim.
pub fn substitute(text: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("${") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        match placeholder_name(after) {
            Some(name) => {
                out.push_str(&resolve(name, bindings));
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Leading identifier of `s` if it is immediately closed by `}`.
fn placeholder_name(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let first = *bytes.first()?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut end = 1;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    if bytes.get(end) == Some(&b'}') {
        Some(&s[..end])
    } else {
        None
    }
}

fn resolve(name: &str, bindings: &Bindings) -> String {
    if let Some(value) = bindings.get(name) {
        return value.clone();
    }
    std::env::var(name).unwrap_or_default()
}

/// Materialize the template at `src` into `dst`.
///
/// A missing template is a fatal [`RunnerError::TemplateNotFound`]; the run
/// must abort before the simulator is launched.
pub fn materialize(src: &Path, dst: &Path, bindings: &Bindings) -> Result<()> {
    let text = match fs::read_to_string(src) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RunnerError::TemplateNotFound(src.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    fs::write(dst, substitute(&text, bindings))?;
    debug!(src = %src.display(), dst = %dst.display(), "materialized config");
    Ok(())
}
