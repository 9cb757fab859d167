//! Byte-order-mark sniffing and text decoding.
//!
//! Configuration files are read as raw bytes. [`UnicodeReader`] peeks at up to
//! four leading bytes, strips a recognised byte order mark and reports which
//! [`Encoding`] the rest of the stream is in. Bytes that are not part of a
//! marker are pushed back in front of the stream untouched, and the caller's
//! default encoding is used.
//!
//! Marker priority:
//!
//! | Bytes | Encoding |
//! |-------|----------|
//! | `EF BB BF` | UTF-8 |
//! | `00 00 FE FF` | UTF-32BE |
//! | `FF FE 00 00` | UTF-32LE |
//! | `FE FF` | UTF-16BE |
//! | `FF FE` | UTF-16LE |
//!
//! The four-byte markers are tested before the two-byte ones because
//! `FF FE 00 00` begins with the UTF-16LE marker.
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::encoding::{Encoding, UnicodeReader};
//!
//! let bytes = b"\xEF\xBB\xBFgeneral {\n}\n";
//! let reader = UnicodeReader::new(&bytes[..], Encoding::Utf16Le).unwrap();
//! assert_eq!(reader.encoding(), Encoding::Utf8);
//! assert!(reader.has_bom());
//! assert_eq!(reader.read_text().unwrap(), "general {\n}\n");
//! ```

use serde::{Deserialize, Serialize};
use std::char::REPLACEMENT_CHARACTER;
use std::fmt;
use std::io::{self, Chain, Cursor, Read};
use std::str::FromStr;

const MAX_BOM_LEN: usize = 4;

/// The Unicode encodings a document can be stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
}

impl Encoding {
    /// Canonical name, as written in configuration and log output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf32Be => "UTF-32BE",
            Encoding::Utf32Le => "UTF-32LE",
        }
    }

    /// Looks an encoding up by name, ignoring case and dashes.
    ///
    /// ```rust
    /// use cfgtree::encoding::Encoding;
    ///
    /// assert_eq!(Encoding::from_name("utf16le"), Some(Encoding::Utf16Le));
    /// assert_eq!(Encoding::from_name("UTF-8"), Some(Encoding::Utf8));
    /// assert_eq!(Encoding::from_name("latin1"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "UTF8" => Some(Encoding::Utf8),
            "UTF16BE" => Some(Encoding::Utf16Be),
            "UTF16LE" => Some(Encoding::Utf16Le),
            "UTF32BE" => Some(Encoding::Utf32Be),
            "UTF32LE" => Some(Encoding::Utf32Le),
            _ => None,
        }
    }

    /// The byte order mark of this encoding.
    #[must_use]
    pub const fn bom(&self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Be => &[0xFE, 0xFF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            Encoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
        }
    }

    /// Decodes `bytes` (without marker). Malformed sequences become U+FFFD.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Encoding::Utf32Be => decode_utf32(bytes, u32::from_be_bytes),
            Encoding::Utf32Le => decode_utf32(bytes, u32::from_le_bytes),
        }
    }

    /// Encodes `text` without a marker.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Encoding::Utf32Be => text.chars().flat_map(|c| (c as u32).to_be_bytes()).collect(),
            Encoding::Utf32Le => text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Encoding::from_name(s).ok_or_else(|| crate::Error::custom(format!("unsupported encoding {s}")))
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    let trailing = !chunks.remainder().is_empty();
    let units = chunks.map(|pair| unit([pair[0], pair[1]]));
    let mut text: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(REPLACEMENT_CHARACTER))
        .collect();
    if trailing {
        text.push(REPLACEMENT_CHARACTER);
    }
    text
}

fn decode_utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> String {
    let chunks = bytes.chunks_exact(4);
    let trailing = !chunks.remainder().is_empty();
    let mut text: String = chunks
        .map(|quad| {
            let code = unit([quad[0], quad[1], quad[2], quad[3]]);
            char::from_u32(code).unwrap_or(REPLACEMENT_CHARACTER)
        })
        .collect();
    if trailing {
        text.push(REPLACEMENT_CHARACTER);
    }
    text
}

/// Result of matching a byte order mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub encoding: Encoding,
    /// Number of marker bytes to strip.
    pub bom_len: usize,
}

/// Matches the leading bytes of a stream against the known markers.
///
/// Returns `None` when no marker matches; nothing should be consumed then.
///
/// ```rust
/// use cfgtree::encoding::{detect, Encoding};
///
/// let hit = detect(&[0xFF, 0xFE, b'a', 0x00]).unwrap();
/// assert_eq!(hit.encoding, Encoding::Utf16Le);
/// assert_eq!(hit.bom_len, 2);
/// assert!(detect(b"abc").is_none());
/// ```
#[must_use]
pub fn detect(prefix: &[u8]) -> Option<Detection> {
    const ORDER: [Encoding; 5] = [
        Encoding::Utf8,
        Encoding::Utf32Be,
        Encoding::Utf32Le,
        Encoding::Utf16Be,
        Encoding::Utf16Le,
    ];

    ORDER
        .iter()
        .find(|enc| prefix.starts_with(enc.bom()))
        .map(|enc| Detection {
            encoding: *enc,
            bom_len: enc.bom().len(),
        })
}

/// A reader that strips a leading byte order mark and remembers the encoding.
///
/// Reading from it yields the raw bytes that follow the marker; use
/// [`UnicodeReader::read_text`] to get decoded text.
pub struct UnicodeReader<R> {
    inner: Chain<Cursor<Vec<u8>>, R>,
    encoding: Encoding,
    has_bom: bool,
}

impl<R: Read> UnicodeReader<R> {
    /// Peeks at the start of `source`, falling back to `default` when no marker is found.
    ///
    /// # Errors
    ///
    /// Returns any error raised while reading the lookahead bytes.
    pub fn new(mut source: R, default: Encoding) -> io::Result<Self> {
        let mut lookahead = [0u8; MAX_BOM_LEN];
        let mut filled = 0;
        while filled < MAX_BOM_LEN {
            match source.read(&mut lookahead[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        let (encoding, bom_len) = match detect(&lookahead[..filled]) {
            Some(hit) => (hit.encoding, hit.bom_len),
            None => (default, 0),
        };
        let pushback = lookahead[bom_len..filled].to_vec();

        Ok(UnicodeReader {
            inner: Cursor::new(pushback).chain(source),
            encoding,
            has_bom: bom_len > 0,
        })
    }

    /// The encoding resolved for this stream.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether a byte order mark was found and stripped.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Reads the remainder of the stream and decodes it.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying reader.
    pub fn read_text(mut self) -> io::Result<String> {
        let mut bytes = Vec::new();
        self.inner.read_to_end(&mut bytes)?;
        Ok(self.encoding.decode(&bytes))
    }
}

impl<R: Read> Read for UnicodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sniff(bytes: &[u8]) -> (Encoding, bool, Vec<u8>) {
        let mut reader = UnicodeReader::new(bytes, Encoding::Utf8).unwrap();
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        (reader.encoding(), reader.has_bom(), rest)
    }

    #[test]
    fn test_each_marker_is_stripped() {
        let cases: [(&[u8], Encoding); 5] = [
            (&[0xEF, 0xBB, 0xBF, b'x'], Encoding::Utf8),
            (&[0xFE, 0xFF, 0x00, b'x'], Encoding::Utf16Be),
            (&[0xFF, 0xFE, b'x', 0x00], Encoding::Utf16Le),
            (&[0x00, 0x00, 0xFE, 0xFF, 0x00, 0x00, 0x00, b'x'], Encoding::Utf32Be),
            (&[0xFF, 0xFE, 0x00, 0x00, b'x', 0x00, 0x00, 0x00], Encoding::Utf32Le),
        ];

        for (bytes, expected) in cases {
            let (encoding, has_bom, rest) = sniff(bytes);
            assert_eq!(encoding, expected);
            assert!(has_bom);
            assert_eq!(rest, &bytes[expected.bom().len()..]);
        }
    }

    #[test]
    fn test_utf16le_wins_without_full_utf32le_marker() {
        let (encoding, _, rest) = sniff(&[0xFF, 0xFE, b'a', 0x00, b'b', 0x00]);
        assert_eq!(encoding, Encoding::Utf16Le);
        assert_eq!(rest, vec![b'a', 0x00, b'b', 0x00]);
    }

    #[test]
    fn test_no_marker_keeps_every_byte() {
        let mut reader = UnicodeReader::new(&b"general {"[..], Encoding::Utf16Be).unwrap();
        assert_eq!(reader.encoding(), Encoding::Utf16Be);
        assert!(!reader.has_bom());
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"general {");
    }

    #[test]
    fn test_short_and_empty_streams() {
        let (encoding, has_bom, rest) = sniff(b"a");
        assert_eq!(encoding, Encoding::Utf8);
        assert!(!has_bom);
        assert_eq!(rest, b"a");

        let (_, has_bom, rest) = sniff(b"");
        assert!(!has_bom);
        assert!(rest.is_empty());

        // Two-byte marker with nothing after it
        let (encoding, has_bom, rest) = sniff(&[0xFE, 0xFF]);
        assert_eq!(encoding, Encoding::Utf16Be);
        assert!(has_bom);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_decode_matches_encode() {
        let text = "général {\n   naïve=日本\n}\n";
        for encoding in [
            Encoding::Utf8,
            Encoding::Utf16Be,
            Encoding::Utf16Le,
            Encoding::Utf32Be,
            Encoding::Utf32Le,
        ] {
            let mut bytes = encoding.bom().to_vec();
            bytes.extend(encoding.encode(text));
            let reader = UnicodeReader::new(&bytes[..], Encoding::Utf8).unwrap();
            assert_eq!(reader.encoding(), encoding);
            assert_eq!(reader.read_text().unwrap(), text);
        }
    }

    #[test]
    fn test_malformed_input_is_replaced() {
        assert_eq!(Encoding::Utf16Le.decode(&[b'a', 0x00, b'b']), "a\u{FFFD}");
        assert_eq!(Encoding::Utf32Be.decode(&[0x00, 0x11, 0x00, 0x00]), "\u{FFFD}");
        assert_eq!(Encoding::Utf8.decode(&[b'o', 0xFF, b'k']), "o\u{FFFD}k");
    }

    #[test]
    fn test_names_round_trip() {
        for encoding in [
            Encoding::Utf8,
            Encoding::Utf16Be,
            Encoding::Utf16Le,
            Encoding::Utf32Be,
            Encoding::Utf32Le,
        ] {
            assert_eq!(encoding.name().parse::<Encoding>().unwrap(), encoding);
        }
        assert!("cp1252".parse::<Encoding>().is_err());
    }
}
