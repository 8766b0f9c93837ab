//! Text-mode template expansion
//!
//! Blocks of the form `{expr: ... :}` are replaced by the text form of their
//! value. Blocks never nest; the first `:}` after an opening `{expr:` closes
//! it. Text outside blocks is copied unchanged.

use regex::Regex;

use super::expr::{self, Scope};
use crate::error::{Error, Result};

/// Matches one block, lazily so adjacent blocks stay separate
const BLOCK_PATTERN: &str = r"(?s)\{expr:(.+?):\}";

/// Replace every expression block in `text`
pub fn expand_text(text: &str, scope: &Scope) -> Result<String> {
    if !has_blocks(text) {
        return Ok(text.to_string());
    }
    let regex = Regex::new(BLOCK_PATTERN).map_err(Error::Regex)?;
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;

    for captures in regex.captures_iter(text) {
        let (Some(block), Some(body)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        out.push_str(&text[copied..block.start()]);

        let value = expr::evaluate_block(body.as_str(), scope)?;
        let rendered = value.to_text().map_err(|message| Error::Template {
            message: format!("Cannot insert `{}` into text: {}", body.as_str().trim(), message),
        })?;
        out.push_str(&rendered);
        copied = block.end();
    }

    out.push_str(&text[copied..]);
    Ok(out)
}

/// Whether `text` contains at least one expression block
pub fn has_blocks(text: &str) -> bool {
    text.contains("{expr:")
}
