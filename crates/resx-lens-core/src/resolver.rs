//! Resolving `BaseName.Key` references to display text

use crate::resource::ResourceFile;
use crate::store::ResourceStore;
use std::borrow::Cow;

/// Appended to a value that was cut at its first line break
pub const TRUNCATION_MARKER: char = '⏎';

/// Dictionaries to search for `base_name`, best first.
///
/// Files named `<base_name>.<preferred_culture>` (any case) come first,
/// then files named exactly `<base_name>`. Within each group files keep
/// load order, so when several projects define the same base name the
/// first loaded one wins.
pub fn dictionaries_for<'a>(
    store: &'a ResourceStore,
    base_name: &str,
    preferred_culture: Option<&str>,
) -> Vec<&'a ResourceFile> {
    let mut dictionaries = Vec::new();

    if let Some(culture) = preferred_culture.filter(|c| !c.is_empty()) {
        let localized = format!("{base_name}.{culture}");
        dictionaries.extend(store.files_with_stem_ignore_case(&localized));
    }

    dictionaries.extend(
        store
            .files_with_stem_ignore_case(base_name)
            .filter(|f| f.stem() == base_name),
    );

    dictionaries
}

/// Raw value of `key` in the first dictionary that defines it
pub fn lookup<'a>(
    store: &'a ResourceStore,
    base_name: &str,
    key: &str,
    preferred_culture: Option<&str>,
) -> Option<&'a str> {
    dictionaries_for(store, base_name, preferred_culture)
        .into_iter()
        .find_map(|dictionary| dictionary.get(key))
}

/// Display text for `key`, or `None` when no dictionary defines it.
///
/// Multi-line values are cut at the first line break and marked with
/// [`TRUNCATION_MARKER`].
pub fn resolve(
    store: &ResourceStore,
    base_name: &str,
    key: &str,
    preferred_culture: Option<&str>,
) -> Option<String> {
    lookup(store, base_name, key, preferred_culture).map(|value| display_text(value).into_owned())
}

/// Apply the single-line display rule to a raw value
///
/// ```
/// use resx_lens_core::display_text;
///
/// assert_eq!(display_text("Line one\nLine two"), "Line one⏎");
/// assert_eq!(display_text("Hi"), "Hi");
/// ```
pub fn display_text(value: &str) -> Cow<'_, str> {
    match value.find(['\r', '\n']) {
        Some(idx) => {
            let mut text = String::with_capacity(idx + TRUNCATION_MARKER.len_utf8());
            text.push_str(&value[..idx]);
            text.push(TRUNCATION_MARKER);
            Cow::Owned(text)
        }
        None => Cow::Borrowed(value),
    }
}

impl ResourceStore {
    /// [`resolve`] using the culture this store was loaded with
    pub fn resolve(&self, base_name: &str, key: &str) -> Option<String> {
        resolve(self, base_name, key, self.preferred_culture())
    }

    /// Resolve a full `BaseName.Key` reference, split at its first `.`
    pub fn resolve_reference(&self, reference: &str) -> Option<String> {
        let (base_name, key) = reference.split_once('.')?;
        self.resolve(base_name, key)
    }
}
