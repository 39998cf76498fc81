//! Per-render bookkeeping for bound arguments.
//!
//! `arg` cannot emit a driver token directly because the final position of
//! a fragment is only known once `set`/`where` have assembled the text. It
//! emits a sentinel instead; [`RenderState::finish`] rewrites sentinels to
//! driver tokens left to right once rendering is done.

use crate::metadata::Metadata;
use crate::placeholder::PlaceholderStyle;
use crate::value::Value;

const SENTINEL_PREFIX: &str = "__batis_arg_";
const SENTINEL_SUFFIX: &str = "__";
const SENTINEL_DIGITS: usize = 8;

/// Arguments collected during one render. Created fresh for every call.
#[derive(Debug, Default)]
pub(crate) struct RenderState {
    args: Vec<Value>,
}

impl RenderState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a bound argument and return its sentinel.
    pub(crate) fn arg(&mut self, value: Value) -> String {
        self.args.push(value);
        sentinel(self.args.len())
    }

    /// Whether `s` is exactly a sentinel issued by this render.
    pub(crate) fn is_sentinel(&self, s: &str) -> bool {
        parse_sentinel(s).is_some_and(|(n, len)| len == s.len() && n <= self.args.len())
    }

    /// Replace every sentinel with the next driver token and collect the
    /// bound values in the same order.
    pub(crate) fn finish(self, rendered: &str, style: &PlaceholderStyle) -> Metadata {
        let sql = rendered.trim();
        let mut prepared = String::with_capacity(sql.len());
        let mut params = Vec::with_capacity(self.args.len());
        let mut rest = sql;

        while let Some(start) = rest.find(SENTINEL_PREFIX) {
            prepared.push_str(&rest[..start]);
            let candidate = &rest[start..];

            match parse_sentinel(candidate) {
                Some((n, len)) if n <= self.args.len() => {
                    params.push(self.args[n - 1].clone());
                    prepared.push_str(&style.token(params.len()));
                    rest = &candidate[len..];
                }
                _ => {
                    prepared.push_str(SENTINEL_PREFIX);
                    rest = &candidate[SENTINEL_PREFIX.len()..];
                }
            }
        }
        prepared.push_str(rest);

        Metadata::new(prepared, Vec::new(), params)
    }
}

fn sentinel(n: usize) -> String {
    format!("{}{:08}{}", SENTINEL_PREFIX, n, SENTINEL_SUFFIX)
}

/// Parse a sentinel at the start of `s`, returning its 1-based number and
/// byte length.
fn parse_sentinel(s: &str) -> Option<(usize, usize)> {
    let digits = s.strip_prefix(SENTINEL_PREFIX)?.get(..SENTINEL_DIGITS)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let len = SENTINEL_PREFIX.len() + SENTINEL_DIGITS;
    if !s[len..].starts_with(SENTINEL_SUFFIX) {
        return None;
    }
    let n: usize = digits.parse().ok()?;
    (n > 0).then_some((n, len + SENTINEL_SUFFIX.len()))
}
