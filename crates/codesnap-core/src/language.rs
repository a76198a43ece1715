//! Languages a workspace file can be classified as.
//!
//! The set is closed: anything the editor cannot run falls back to a
//! default language instead of failing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// A language the practice editor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    Java,
    C,
}

impl Language {
    /// All languages, in display order.
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::C,
    ];

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
        }
    }

    /// Returns the preferred file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Java => "java",
            Language::C => "c",
        }
    }

    /// Maps a file extension to a language, case-insensitively.
    ///
    /// Returns `None` for anything outside the closed set, including `txt`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Some(Language::Python),
            "js" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            "c" => Some(Language::C),
            _ => None,
        }
    }

    /// Detects the language of a file name, falling back to `fallback`.
    pub fn detect(name: &str, fallback: Language) -> Self {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(fallback)
    }

    /// Starter content for a freshly created file.
    pub fn boilerplate(&self) -> &'static str {
        match self {
            Language::Python => concat!(
                "# Welcome to CodeSnap Learning Workspace! 🎉\n",
                "# Start coding here...\n",
                "\n",
                "print(\"Hello, World!\")",
            ),
            Language::JavaScript => concat!(
                "// Welcome to CodeSnap Learning Workspace! 🎉\n",
                "// Start coding here...\n",
                "\n",
                "console.log(\"Hello, World!\");",
            ),
            Language::Java => concat!(
                "// Welcome to CodeSnap Learning Workspace! 🎉\n",
                "// Start coding here...\n",
                "\n",
                "public class Main {\n",
                "    public static void main(String[] args) {\n",
                "        System.out.println(\"Hello, World!\");\n",
                "    }\n",
                "}",
            ),
            Language::C => concat!(
                "// Welcome to CodeSnap Learning Workspace! 🎉\n",
                "// Start coding here...\n",
                "\n",
                "#include <stdio.h>\n",
                "\n",
                "int main() {\n",
                "    printf(\"Hello, World!\\n\");\n",
                "    return 0;\n",
                "}",
            ),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown language name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s) || lang.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
