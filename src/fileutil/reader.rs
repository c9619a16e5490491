//! Template reading
//!
//! Reads a template file in the configured encoding and applies the
//! source-level cleanup expected before parsing.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

/// Marker that lets a template be previewed in a browser with the devtool
/// script; it is not part of the page.
pub const DEVTOOL_MAGIC_COMMENT: &str = "<!-- <%/* --> <script src=\"js/devtool.js\"></script><meta charset=\"utf-8\"><body> <!-- */%> -->";

static DIRECTIVE_GAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<%@\s+([a-zA-Z]+)\s").expect("directive pattern is valid")
});

/// Read a template file and normalize it for verification
pub fn read_formatted(path: &Path, encoding: &str) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let text = decode(&bytes, encoding)
        .with_context(|| format!("Failed to decode file: {}", path.display()))?;
    Ok(normalize(&text))
}

/// Decode raw bytes using an encoding label.
///
/// Labels: `utf-8`/`utf8`, `latin1`/`binary`/`iso-8859-1`, `ascii` (read as
/// latin1) and `utf16le`/`utf-16le`/`ucs2`/`ucs-2`. Byte order marks are
/// dropped.
pub fn decode(bytes: &[u8], encoding: &str) -> Result<String> {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            Ok(String::from_utf8(bytes.to_vec()).context("Content is not valid UTF-8")?)
        }
        "latin1" | "binary" | "iso-8859-1" | "ascii" => {
            Ok(bytes.iter().map(|&byte| char::from(byte)).collect())
        }
        "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => decode_utf16le(bytes),
        other => bail!(
            "Unsupported encoding '{}' (supported: utf-8, latin1, ascii, utf16le)",
            other
        ),
    }
}

fn decode_utf16le(bytes: &[u8]) -> Result<String> {
    if !bytes.len().is_multiple_of(2) {
        bail!("UTF-16LE content has an odd number of bytes");
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let text: String = char::decode_utf16(units)
        .collect::<Result<_, _>>()
        .context("Content is not valid UTF-16LE")?;
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Strip the devtool marker and close the gap in `<%@ directive`
pub fn normalize(text: &str) -> String {
    let stripped = text.replacen(DEVTOOL_MAGIC_COMMENT, "", 1);
    DIRECTIVE_GAP.replace_all(&stripped, "<%@$1 ").into_owned()
}
