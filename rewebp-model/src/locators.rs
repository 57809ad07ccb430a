//! Rename locator sets: the string forms that must be substituted in
//! stored content after a file rename.

use serde::{Deserialize, Serialize};
use url::Url;

/// One `(old, new)` substring pair, used verbatim in replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorPair {
    pub old: String,
    pub new: String,
}

impl LocatorPair {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self { old: old.into(), new: new.into() }
    }
}

/// Root-relative locator form (`/2024/05/photo.jpg`).
pub fn relative_locator(rel_path: &str) -> String {
    format!("/{}", rel_path.trim_start_matches('/'))
}

/// The family of string forms denoting one file before and after a
/// rename: full URL, root-relative path, and a protocol-stripped URL
/// when the base URL carries a scheme.
///
/// Replacement is literal substring substitution by contract; a locator
/// that is a prefix of another locator will also be rewritten inside the
/// longer form. That collision is a known limitation of the engine and
/// is deliberately not special-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameLocatorSet {
    pub pairs: Vec<LocatorPair>,
}

impl RenameLocatorSet {
    /// Build the substitution pairs for renaming `old_path` to
    /// `new_path`, both relative to the storage root published at
    /// `base_url`.
    pub fn for_rename(base_url: &Url, old_path: &str, new_path: &str) -> Self {
        let base = base_url.as_str().trim_end_matches('/');
        let old_rel = relative_locator(old_path);
        let new_rel = relative_locator(new_path);
        let old_url = format!("{base}{old_rel}");
        let new_url = format!("{base}{new_rel}");

        let mut pairs = vec![
            LocatorPair::new(old_url.clone(), new_url.clone()),
            LocatorPair::new(old_rel, new_rel),
        ];

        // Content frequently stores scheme-less URLs; cover them when the
        // base URL actually has a scheme to strip.
        let old_bare = strip_protocol(&old_url);
        if old_bare != old_url {
            pairs.push(LocatorPair::new(old_bare, strip_protocol(&new_url)));
        }

        Self { pairs }
    }
}

fn strip_protocol(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .to_string()
}
