//! Plain TypeScript/JavaScript modules.
//!
//! The whole file is script text.

use crate::languages::SourceLanguage;
use std::borrow::Cow;

pub struct ScriptModule;

impl SourceLanguage for ScriptModule {
    fn name(&self) -> &'static str {
        "script"
    }

    fn extensions(&self) -> &[&str] {
        &["ts", "mts", "cts", "js", "mjs", "cjs"]
    }

    fn script_text<'a>(&self, source: &'a str) -> Option<Cow<'a, str>> {
        if source.trim().is_empty() {
            None
        } else {
            Some(Cow::Borrowed(source))
        }
    }
}
