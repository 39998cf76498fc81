//! Whitespace trim markers.
//!
//! `{{- ` removes the whitespace before an action and ` -}}` the whitespace
//! after it. The markers are applied to the raw text before parsing so the
//! grammar never has to track them across nested blocks.

use std::borrow::Cow;

/// Apply trim markers, returning the input untouched when it has none.
pub(crate) fn apply_trim_markers(input: &str) -> Cow<'_, str> {
    if !input.contains("{{-") && !input.contains("-}}") {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let text = &rest[..start];
        let action_start = &rest[start..];

        if trims_left(action_start) {
            out.push_str(text.trim_end());
        } else {
            out.push_str(text);
        }

        let Some(len) = action_len(action_start) else {
            // Unterminated action; leave it for the grammar to report.
            out.push_str(action_start);
            return Cow::Owned(out);
        };

        let action = &action_start[..len];
        out.push_str(action);
        rest = &action_start[len..];

        if trims_right(action) {
            rest = rest.trim_start();
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn trims_left(action: &str) -> bool {
    action
        .strip_prefix("{{-")
        .is_some_and(|after| after.starts_with(char::is_whitespace))
}

fn trims_right(action: &str) -> bool {
    action
        .strip_suffix("-}}")
        .is_some_and(|before| before.ends_with(char::is_whitespace))
}

/// Length of the action starting at `s` (which begins with `{{`), up to and
/// including the closing `}}`. Quoted strings may contain `}}`.
fn action_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 2;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i + 2),
            None => {}
        }
        i += 1;
    }
    None
}
