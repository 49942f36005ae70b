//! Signature scraping for HSL source text.
//!
//! This is a tolerant pattern, not a parser: it never looks inside function
//! bodies and takes argument lists and return types verbatim.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::BraceMode;
use crate::error::IndexError;

/// One raw `function` signature found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub arguments: String,
    /// Empty when the signature declares no return type.
    pub return_type: String,
    /// 1-indexed line of the `function` keyword.
    pub line_number: usize,
}

pub trait SignatureExtractor: Send + Sync {
    /// Signatures in `text`, in source order.
    fn extract(&self, text: &str) -> Vec<Signature>;
}

// The argument capture is greedy within one line; the regex engine settles on
// the `)` that lets the return type and brace marker match.
const NEXT_LINE_PATTERN: &str = r"(?m)^[ \t]*(?P<kw>function)\s+(?P<name>\w+)\s*\((?P<args>.*)\)\s*(?P<returns>\w*)[ \t]*\r?\n\s*\{";
const SAME_LINE_PATTERN: &str = r"(?m)^[ \t]*(?P<kw>function)\s+(?P<name>\w+)\s*\((?P<args>.*)\)\s*(?P<returns>\w*)\s*\{";

fn signature_regex(mode: BraceMode) -> &'static Regex {
    static NEXT_LINE: OnceLock<Regex> = OnceLock::new();
    static SAME_LINE: OnceLock<Regex> = OnceLock::new();
    match mode {
        BraceMode::NextLine => NEXT_LINE.get_or_init(|| Regex::new(NEXT_LINE_PATTERN).unwrap()),
        BraceMode::SameLine => SAME_LINE.get_or_init(|| Regex::new(SAME_LINE_PATTERN).unwrap()),
    }
}

/// Regex-backed extractor. `BraceMode::NextLine` is the strict default;
/// `BraceMode::SameLine` also accepts `function F() {` on one line.
#[derive(Debug, Clone, Copy)]
pub struct PatternExtractor {
    mode: BraceMode,
}

impl PatternExtractor {
    pub fn new(mode: BraceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> BraceMode {
        self.mode
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(BraceMode::NextLine)
    }
}

impl SignatureExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> Vec<Signature> {
        let re = signature_regex(self.mode);
        let mut out = Vec::new();

        for caps in re.captures_iter(text) {
            let (Some(kw), Some(name)) = (caps.name("kw"), caps.name("name")) else {
                continue;
            };
            let line_number = text[..kw.start()].bytes().filter(|&b| b == b'\n').count() + 1;

            out.push(Signature {
                name: name.as_str().to_string(),
                arguments: caps.name("args").map(|m| m.as_str().trim()).unwrap_or("").to_string(),
                return_type: caps.name("returns").map(|m| m.as_str().trim()).unwrap_or("").to_string(),
                line_number,
            });
        }

        out
    }
}

/// Read `path` in one go and extract its signatures.
///
/// Invalid UTF-8 is replaced, never rejected; only I/O failures are errors.
pub fn extract_file(extractor: &dyn SignatureExtractor, path: &Path) -> Result<Vec<Signature>, IndexError> {
    let bytes = std::fs::read(path).map_err(|source| IndexError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(extractor.extract(&text))
}
