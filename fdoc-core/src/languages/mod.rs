//! Source kinds.
//!
//! Each supported kind of source unit knows how to hand back the script
//! text worth analysing. Single-file components carry their script inside
//! a `<script>` block; plain modules are script text already.

mod typescript;
mod vue;

use std::borrow::Cow;
use std::path::Path;

pub use typescript::ScriptModule;
pub use vue::{parse_sfc, SfcBlock, SfcDescriptor, VueComponent};

/// Trait for kind-specific extraction of script text.
pub trait SourceLanguage: Send + Sync {
    /// Human readable name, used in logs.
    fn name(&self) -> &'static str;

    /// File extensions (without the dot) this kind handles.
    fn extensions(&self) -> &[&str];

    /// Returns the script section of `source`, or `None` when the unit
    /// has no script to analyse.
    fn script_text<'a>(&self, source: &'a str) -> Option<Cow<'a, str>>;
}

/// Gets the source kind for the given file extension.
///
/// Returns None if we don't support this extension.
pub fn get_language(extension: &str) -> Option<Box<dyn SourceLanguage>> {
    let extension = extension.to_lowercase();
    let languages: [Box<dyn SourceLanguage>; 2] = [Box::new(VueComponent), Box::new(ScriptModule)];
    languages
        .into_iter()
        .find(|language| language.extensions().contains(&extension.as_str()))
}

/// Detects the source kind from a file path.
pub fn detect_language(path: &Path) -> Option<Box<dyn SourceLanguage>> {
    let extension = path.extension()?.to_str()?;
    get_language(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("Foo.vue")).unwrap().name(), "vue");
        assert_eq!(detect_language(Path::new("cart.ts")).unwrap().name(), "script");
        assert_eq!(detect_language(Path::new("cart.JS")).unwrap().name(), "script");
        assert!(detect_language(Path::new("style.css")).is_none());
        assert!(detect_language(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_every_declared_extension_resolves() {
        for language in [&VueComponent as &dyn SourceLanguage, &ScriptModule] {
            for ext in language.extensions() {
                assert_eq!(get_language(ext).unwrap().name(), language.name());
            }
        }
        assert!(get_language("py").is_none());
        assert_eq!(get_language("VUE").unwrap().name(), "vue");
    }
}
