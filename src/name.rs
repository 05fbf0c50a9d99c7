//! Parameter name canonicalization.
//!
//! Every name used as a table key, a registry key or in a comparison goes
//! through `normalize()` first: it must start with a single leading `/`.

/// Separator that every normalized parameter name starts with.
pub const NAME_SEP: char = '/';

/// Prepend `/` when missing; otherwise return the name unchanged.
/// Idempotent: normalize(normalize(n)) == normalize(n).
#[inline]
pub fn normalize(name: &str) -> String {
    if name.starts_with(NAME_SEP) {
        name.to_string()
    } else {
        let mut out = String::with_capacity(name.len() + 1);
        out.push(NAME_SEP);
        out.push_str(name);
        out
    }
}

/// True if `name` is already in canonical form.
#[inline]
pub fn is_normalized(name: &str) -> bool {
    name.starts_with(NAME_SEP)
}
