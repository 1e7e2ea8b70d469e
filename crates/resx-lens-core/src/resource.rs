//! Parsing of XML resource dictionaries
//!
//! A resource file is an XML document whose root holds `data` elements:
//!
//! ```xml
//! <root>
//!   <data name="Greeting" xml:space="preserve">
//!     <value>Hi</value>
//!   </data>
//! </root>
//! ```
//!
//! Everything else under the root (`resheader`, schema blocks, metadata) is
//! ignored.

use crate::error::ResourceError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One `name` → `value` pair from a resource file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub value: String,
}

/// A parsed resource file
///
/// Identity is the path. Files are never edited in place: a reload builds a
/// fresh `ResourceFile` and swaps it into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    path: PathBuf,
    stem: String,
    base_name: String,
    culture: Option<String>,
    entries: Vec<ResourceEntry>,
}

impl ResourceFile {
    /// Read and parse a resource file from disk
    pub fn read(path: &Path) -> Result<Self, ResourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parse resource content that was already read (no I/O)
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, ResourceError> {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResourceError::InvalidName(path.clone()))?
            .to_string();

        // Visual Studio writes a BOM; the XML parser rejects it
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let doc = roxmltree::Document::parse(content).map_err(|source| ResourceError::Xml {
            path: path.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for data in doc
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("data"))
        {
            let Some(name) = data.attribute("name") else {
                continue;
            };
            // Binary payloads (images, serialized objects) carry a mimetype
            if data.attribute("mimetype").is_some() {
                continue;
            }
            let value = data
                .children()
                .find(|n| n.has_tag_name("value"))
                .map(|v| {
                    v.descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect::<String>()
                })
                .unwrap_or_default();

            if !seen.insert(name.to_string()) {
                debug!("{}: duplicate resource name {name}, keeping the first", path.display());
                continue;
            }
            entries.push(ResourceEntry {
                name: name.to_string(),
                value,
            });
        }

        let (base_name, culture) = split_culture(&stem);
        let base_name = base_name.to_string();
        let culture = culture.map(str::to_string);

        Ok(Self {
            path,
            stem,
            base_name,
            culture,
            entries,
        })
    }

    /// Build a file directly from entries (no XML involved)
    pub fn from_entries(
        path: impl Into<PathBuf>,
        entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Result<Self, ResourceError> {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResourceError::InvalidName(path.clone()))?
            .to_string();
        let (base_name, culture) = split_culture(&stem);
        let base_name = base_name.to_string();
        let culture = culture.map(str::to_string);

        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .map(|(name, value)| ResourceEntry {
                name: name.into(),
                value: value.into(),
            })
            .filter(|e| seen.insert(e.name.clone()))
            .collect();

        Ok(Self {
            path,
            stem,
            base_name,
            culture,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension, culture segment included (`Strings.fr`)
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// File name without extension and culture segment (`Strings`)
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Culture tag carried in the file name, `None` for the neutral file
    pub fn culture(&self) -> Option<&str> {
        self.culture.as_deref()
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordinal, case-sensitive lookup
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

/// Split a file stem into its logical base name and trailing culture tag.
///
/// ```
/// use resx_lens_core::split_culture;
///
/// assert_eq!(split_culture("Strings.fr-FR"), ("Strings", Some("fr-FR")));
/// assert_eq!(split_culture("Strings"), ("Strings", None));
/// assert_eq!(split_culture("App.Resources"), ("App.Resources", None));
/// ```
pub fn split_culture(stem: &str) -> (&str, Option<&str>) {
    match stem.rsplit_once('.') {
        Some((base, tag)) if !base.is_empty() && looks_like_culture(tag) => (base, Some(tag)),
        _ => (stem, None),
    }
}

/// ISO 639-1 language codes
const TWO_LETTER_LANGUAGES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
    "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv",
    "cy", "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi",
    "fj", "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
    "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja",
    "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw",
    "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml",
    "mn", "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv",
    "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu", "rm", "rn", "ro",
    "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sn", "so", "sq", "sr",
    "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr",
    "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi",
    "yo", "za", "zh", "zu",
];

/// Three-letter languages that .NET ships neutral cultures for
const THREE_LETTER_LANGUAGES: &[&str] = &[
    "agq", "asa", "ast", "bas", "bem", "bez", "brx", "ccp", "ceb", "chr", "ckb", "dav", "dje",
    "dsb", "dua", "dyo", "ebu", "ewo", "fil", "fur", "gsw", "guz", "haw", "hsb", "jgo", "jmc",
    "kab", "kam", "kde", "kea", "khq", "kkj", "kln", "kok", "ksb", "ksf", "ksh", "lag", "lkt",
    "lrc", "luo", "luy", "mas", "mer", "mfe", "mgh", "mgo", "moh", "mua", "mzn", "naq", "nds",
    "nmg", "nnh", "nso", "nus", "nyn", "prg", "quc", "quz", "rof", "rwk", "sah", "saq", "sbp",
    "ses", "shi", "sma", "smj", "smn", "sms", "teo", "tzm", "vai", "vun", "wae", "xog", "yav",
    "yue", "zgh",
];

/// Whether a name segment is a culture tag: a known language code,
/// optionally followed by `-`-separated script/region subtags (`fr`,
/// `fr-FR`, `zh-Hans`, `es-419`, `sr-Latn-RS`).
///
/// Segments that merely look like one (`Strings.dev`, `Help.txt`) are
/// part of the base name.
pub fn looks_like_culture(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let Some(language) = parts.next() else {
        return false;
    };
    let known = match language.len() {
        2 => TWO_LETTER_LANGUAGES.contains(&language),
        3 => THREE_LETTER_LANGUAGES.contains(&language),
        _ => false,
    };
    known
        && parts.all(|sub| {
            (2..=8).contains(&sub.len()) && sub.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRINGS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <data name="Greeting" xml:space="preserve">
    <value>Hi</value>
  </data>
  <data name="Waiting" xml:space="preserve">
    <value>Please wait…</value>
    <comment>shown in the status bar</comment>
  </data>
  <data name="Empty" xml:space="preserve">
    <value />
  </data>
  <data name="Icon" type="System.Resources.ResXFileRef" mimetype="application/x-microsoft.net.object.bytearray.base64">
    <value>AAAA</value>
  </data>
</root>"#;

    #[test]
    fn test_parse_data_elements() {
        let file = ResourceFile::parse("/proj/Strings.resx", STRINGS).unwrap();
        assert_eq!(file.len(), 3);
        assert_eq!(file.get("Greeting"), Some("Hi"));
        assert_eq!(file.get("Waiting"), Some("Please wait…"));
        assert_eq!(file.get("Empty"), Some(""));
        assert_eq!(file.get("Icon"), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let file = ResourceFile::parse("/proj/Strings.resx", STRINGS).unwrap();
        assert_eq!(file.get("greeting"), None);
    }

    #[test]
    fn test_resheader_is_not_an_entry() {
        let file = ResourceFile::parse("/proj/Strings.resx", STRINGS).unwrap();
        assert_eq!(file.get("resmimetype"), None);
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let content = r#"<root>
            <data name="A"><value>first</value></data>
            <data name="A"><value>second</value></data>
        </root>"#;
        let file = ResourceFile::parse("/proj/Dup.resx", content).unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file.get("A"), Some("first"));
    }

    #[test]
    fn test_bom_is_accepted() {
        let content = "\u{feff}<root><data name=\"A\"><value>x</value></data></root>";
        let file = ResourceFile::parse("/proj/Bom.resx", content).unwrap();
        assert_eq!(file.get("A"), Some("x"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = ResourceFile::parse("/proj/Broken.resx", "<root><data name=").unwrap_err();
        assert!(matches!(err, ResourceError::Xml { .. }));
        assert_eq!(err.path(), Path::new("/proj/Broken.resx"));
    }

    #[test]
    fn test_multiline_value_is_kept_verbatim() {
        let content = "<root><data name=\"A\"><value>Line one\nLine two</value></data></root>";
        let file = ResourceFile::parse("/proj/Multi.resx", content).unwrap();
        assert_eq!(file.get("A"), Some("Line one\nLine two"));
    }

    #[test]
    fn test_names_and_culture() {
        let neutral = ResourceFile::parse("/proj/Strings.resx", "<root/>").unwrap();
        assert_eq!(neutral.stem(), "Strings");
        assert_eq!(neutral.base_name(), "Strings");
        assert_eq!(neutral.culture(), None);

        let french = ResourceFile::parse("/proj/Strings.fr-FR.resx", "<root/>").unwrap();
        assert_eq!(french.stem(), "Strings.fr-FR");
        assert_eq!(french.base_name(), "Strings");
        assert_eq!(french.culture(), Some("fr-FR"));
    }

    #[test]
    fn test_culture_shapes() {
        assert!(looks_like_culture("fr"));
        assert!(looks_like_culture("fr-FR"));
        assert!(looks_like_culture("zh-Hans"));
        assert!(looks_like_culture("es-419"));
        assert!(looks_like_culture("sr-Latn-RS"));
        assert!(!looks_like_culture("Resources"));
        assert!(!looks_like_culture("UI"));
        assert!(!looks_like_culture("f"));
        assert!(!looks_like_culture("fr-"));
        assert!(looks_like_culture("fil"));
        assert!(!looks_like_culture("dev"));
        assert!(!looks_like_culture("xx"));
    }

    #[test]
    fn test_from_entries() {
        let file = ResourceFile::from_entries("/proj/Strings.de.resx", [("A", "a"), ("A", "b")])
            .unwrap();
        assert_eq!(file.culture(), Some("de"));
        assert_eq!(file.get("A"), Some("a"));
    }

    #[test]
    fn test_unknown_language_segment_stays_in_base_name() {
        let file = ResourceFile::from_entries("/proj/Strings.dev.resx", [("A", "a")]).unwrap();
        assert_eq!(file.culture(), None);
        assert_eq!(file.base_name(), "Strings.dev");
    }
}
