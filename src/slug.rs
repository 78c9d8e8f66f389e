//! URL-safe slug derivation for entry and category names.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref EDGE_DASHES: Regex = Regex::new(r"(^-+)|(-+$)").unwrap();
}

/// Derive a slug from a display name: lowercase, runs of anything outside
/// `[a-z0-9]` collapsed into a single dash, edges trimmed. An empty result
/// (e.g. an all-symbol name) falls back to "entry" so the value is always
/// usable in a URL path.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let dashed = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let trimmed = EDGE_DASHES.replace_all(&dashed, "");
    if trimmed.is_empty() {
        "entry".to_string()
    } else {
        trimmed.into_owned()
    }
}

/// Derive a slug that does not collide with any existing one, per `taken`.
/// On collision a numeric suffix is appended and incremented until free:
/// "foo-bar", "foo-bar-1", "foo-bar-2", ...
pub fn unique_slug<F>(name: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = slugify(name);
    if !taken(&base) {
        return base;
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
