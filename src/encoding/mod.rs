// ── Encodings & line endings ──────────────────────────────────────────────────
//
// Maps the host editor's encoding and line-ending labels (e.g.
// `"Western (Windows 1252)"`, `"Windows"`) onto something that can turn text
// into bytes.  Anything not listed here is unsupported: the estimator refuses
// it rather than guessing.

mod cp437;

use encoding_rs::Encoding;

// ── Encoding ──────────────────────────────────────────────────────────────────

/// The encoding a buffer will be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// The editor's hex view: the file holds the bytes the hex digits spell.
    Hexadecimal,
    /// Every other encoding: text is transformed into bytes.
    Bytes(ByteEncoding),
}

/// A text → bytes transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEncoding {
    /// UTF-8, optionally preceded by `EF BB BF`.
    Utf8 { bom: bool },
    /// UTF-16 little-endian, optionally preceded by `FF FE`.
    Utf16Le { bom: bool },
    /// UTF-16 big-endian, optionally preceded by `FE FF`.
    Utf16Be { bom: bool },
    /// ISO 8859-1: exactly U+0000..=U+00FF, one byte each.
    Latin1,
    /// ISO 8859-9: Latin-1 with six Turkish letters swapped in.
    Latin5,
    /// IBM code page 437.
    Cp437,
    /// KOI8-U (RFC 2319).  `encoding_rs` ships KOI8-RU under this name,
    /// which puts `ў`/`Ў` where RFC 2319 has `╝`/`╬` (0xAE, 0xBE).
    Koi8U,
    /// Windows-125x.  Unlike `encoding_rs`, C1 controls are not encodable.
    Windows(&'static Encoding),
    /// Any other single-byte code page `encoding_rs` knows.
    Legacy(&'static Encoding),
}

impl TextEncoding {
    /// Resolve a host encoding label.  Returns `None` for unknown labels.
    pub fn from_name(name: &str) -> Option<Self> {
        use ByteEncoding::*;

        let enc = match name {
            "Hexadecimal" => return Some(Self::Hexadecimal),

            // The editor reports "Undefined" for buffers it has not yet
            // assigned an encoding; those are saved as UTF-8.
            "Undefined" | "UTF-8" => Utf8 { bom: false },
            "UTF-8 with BOM" => Utf8 { bom: true },
            "UTF-16 LE" => Utf16Le { bom: false },
            "UTF-16 LE with BOM" => Utf16Le { bom: true },
            "UTF-16 BE" => Utf16Be { bom: false },
            "UTF-16 BE with BOM" => Utf16Be { bom: true },

            "Western (Windows 1252)" => Windows(encoding_rs::WINDOWS_1252),
            "Western (ISO 8859-1)" => Latin1,
            "Western (ISO 8859-3)" => Legacy(encoding_rs::ISO_8859_3),
            "Western (ISO 8859-15)" => Legacy(encoding_rs::ISO_8859_15),
            "Western (Mac Roman)" => Legacy(encoding_rs::MACINTOSH),
            "DOS (CP 437)" => Cp437,

            "Arabic (Windows 1256)" => Windows(encoding_rs::WINDOWS_1256),
            "Arabic (ISO 8859-6)" => Legacy(encoding_rs::ISO_8859_6),

            "Baltic (Windows 1257)" => Windows(encoding_rs::WINDOWS_1257),
            "Baltic (ISO 8859-4)" => Legacy(encoding_rs::ISO_8859_4),

            "Celtic (ISO 8859-14)" => Legacy(encoding_rs::ISO_8859_14),

            "Central European (Windows 1250)" => Windows(encoding_rs::WINDOWS_1250),
            "Central European (ISO 8859-2)" => Legacy(encoding_rs::ISO_8859_2),

            "Cyrillic (Windows 1251)" => Windows(encoding_rs::WINDOWS_1251),
            "Cyrillic (Windows 866)" => Legacy(encoding_rs::IBM866),
            "Cyrillic (ISO 8859-5)" => Legacy(encoding_rs::ISO_8859_5),
            "Cyrillic (KOI8-R)" => Legacy(encoding_rs::KOI8_R),
            "Cyrillic (KOI8-U)" => Koi8U,

            "Estonian (ISO 8859-13)" => Legacy(encoding_rs::ISO_8859_13),

            "Greek (Windows 1253)" => Windows(encoding_rs::WINDOWS_1253),
            "Greek (ISO 8859-7)" => Legacy(encoding_rs::ISO_8859_7),

            "Hebrew (Windows 1255)" => Windows(encoding_rs::WINDOWS_1255),
            "Hebrew (ISO 8859-8)" => Legacy(encoding_rs::ISO_8859_8),

            "Nordic (ISO 8859-10)" => Legacy(encoding_rs::ISO_8859_10),

            "Romanian (ISO 8859-16)" => Legacy(encoding_rs::ISO_8859_16),

            "Turkish (Windows 1254)" => Windows(encoding_rs::WINDOWS_1254),
            "Turkish (ISO 8859-9)" => Latin5,

            "Vietnamese (Windows 1258)" => Windows(encoding_rs::WINDOWS_1258),

            _ => return None,
        };
        Some(Self::Bytes(enc))
    }
}

impl ByteEncoding {
    /// Short name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 { .. } => "UTF-8",
            Self::Utf16Le { .. } => "UTF-16LE",
            Self::Utf16Be { .. } => "UTF-16BE",
            Self::Latin1 => "ISO-8859-1",
            Self::Latin5 => "ISO-8859-9",
            Self::Cp437 => "IBM437",
            Self::Koi8U => "KOI8-U",
            Self::Windows(enc) | Self::Legacy(enc) => enc.name(),
        }
    }

    /// Byte-order mark written once at the start of the file.
    pub fn bom(self) -> &'static [u8] {
        match self {
            Self::Utf8 { bom: true } => &[0xEF, 0xBB, 0xBF],
            Self::Utf16Le { bom: true } => &[0xFF, 0xFE],
            Self::Utf16Be { bom: true } => &[0xFE, 0xFF],
            _ => &[],
        }
    }

    /// Append the encoded form of `text` to `out`.
    ///
    /// On failure returns the first character the encoding cannot represent;
    /// `out` may then hold a partial encoding and must be discarded.
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>) -> Result<(), char> {
        match self {
            Self::Utf8 { .. } => out.extend_from_slice(text.as_bytes()),
            Self::Utf16Le { .. } => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            Self::Utf16Be { .. } => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
            Self::Latin1 => encode_per_char(text, out, |c| u8::try_from(u32::from(c)).ok())?,
            Self::Latin5 => encode_per_char(text, out, latin5_byte)?,
            Self::Cp437 => encode_per_char(text, out, cp437::encode_char)?,
            Self::Koi8U => encode_with_overrides(encoding_rs::KOI8_U, text, out, koi8u_override)?,
            Self::Windows(enc) => encode_with_overrides(enc, text, out, |c| {
                // No windows-125x code page assigns a byte to a C1 control.
                ('\u{80}'..='\u{9F}').contains(&c).then_some(None)
            })?,
            Self::Legacy(enc) => encode_with(enc, text, out)?,
        }
        Ok(())
    }
}

fn encode_per_char(
    text: &str,
    out: &mut Vec<u8>,
    map: impl Fn(char) -> Option<u8>,
) -> Result<(), char> {
    out.reserve(text.len());
    for c in text.chars() {
        out.push(map(c).ok_or(c)?);
    }
    Ok(())
}

/// ISO 8859-9 differs from Latin-1 in exactly six positions.
fn latin5_byte(c: char) -> Option<u8> {
    match c {
        '\u{011E}' => Some(0xD0), // Ğ
        '\u{0130}' => Some(0xDD), // İ
        '\u{015E}' => Some(0xDE), // Ş
        '\u{011F}' => Some(0xF0), // ğ
        '\u{0131}' => Some(0xFD), // ı
        '\u{015F}' => Some(0xFE), // ş
        '\u{00D0}' | '\u{00DD}' | '\u{00DE}' | '\u{00F0}' | '\u{00FD}' | '\u{00FE}' => None,
        _ => u8::try_from(u32::from(c)).ok(),
    }
}

/// The two box-drawing characters RFC 2319 keeps where KOI8-RU puts
/// Byelorussian `ў`/`Ў`.
fn koi8u_override(c: char) -> Option<Option<u8>> {
    match c {
        '\u{255D}' => Some(Some(0xAE)), // ╝
        '\u{256C}' => Some(Some(0xBE)), // ╬
        '\u{045E}' | '\u{040E}' => Some(None), // ў Ў
        _ => None,
    }
}

/// Encode with `enc`, except where `over(c)` decides a character itself:
/// `Some(Some(b))` writes `b`, `Some(None)` makes `c` unmappable.
fn encode_with_overrides(
    enc: &'static Encoding,
    text: &str,
    out: &mut Vec<u8>,
    over: impl Fn(char) -> Option<Option<u8>>,
) -> Result<(), char> {
    let mut rest = 0;
    for (i, c) in text.char_indices() {
        let Some(byte) = over(c) else { continue };
        encode_with(enc, &text[rest..i], out)?;
        out.push(byte.ok_or(c)?);
        rest = i + c.len_utf8();
    }
    encode_with(enc, &text[rest..], out)
}

fn encode_with(enc: &'static Encoding, text: &str, out: &mut Vec<u8>) -> Result<(), char> {
    let mut encoder = enc.new_encoder();
    let mut src = text;
    loop {
        let start = out.len();
        let room = encoder
            .max_buffer_length_from_utf8_without_replacement(src.len())
            .unwrap_or(src.len())
            .max(16);
        out.resize(start + room, 0);
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(src, &mut out[start..], true);
        out.truncate(start + written);
        match result {
            encoding_rs::EncoderResult::InputEmpty => return Ok(()),
            encoding_rs::EncoderResult::OutputFull => src = &src[read..],
            encoding_rs::EncoderResult::Unmappable(c) => return Err(c),
        }
    }
}

// ── Line endings ──────────────────────────────────────────────────────────────

/// The newline sequence a buffer will be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Unix,
    /// `\r\n`
    Windows,
    /// `\r`
    Cr,
}

impl LineEnding {
    /// Resolve a host line-ending label.  Returns `None` for unknown labels.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Unix" => Some(Self::Unix),
            "Windows" => Some(Self::Windows),
            "CR" => Some(Self::Cr),
            _ => None,
        }
    }

    /// The host label, the inverse of `from_name`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unix => "Unix",
            Self::Windows => "Windows",
            Self::Cr => "CR",
        }
    }

    /// The bytes substituted for every `\n` in the buffer.
    pub fn sequence(self) -> &'static str {
        match self {
            Self::Unix => "\n",
            Self::Windows => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Rewrite the buffer's normalized `\n` newlines into this convention.
    pub fn apply(self, text: &str) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Unix => std::borrow::Cow::Borrowed(text),
            _ if !text.contains('\n') => std::borrow::Cow::Borrowed(text),
            _ => std::borrow::Cow::Owned(text.replace('\n', self.sequence())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(name: &str, text: &str) -> Result<Vec<u8>, char> {
        let Some(TextEncoding::Bytes(enc)) = TextEncoding::from_name(name) else {
            panic!("{name} is not a byte encoding");
        };
        let mut out = Vec::new();
        enc.encode_into(text, &mut out)?;
        Ok(out)
    }

    #[test]
    fn undefined_is_utf8() {
        assert_eq!(
            TextEncoding::from_name("Undefined"),
            Some(TextEncoding::Bytes(ByteEncoding::Utf8 { bom: false }))
        );
    }

    #[test]
    fn hexadecimal_is_special() {
        assert_eq!(TextEncoding::from_name("Hexadecimal"), Some(TextEncoding::Hexadecimal));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(TextEncoding::from_name("EBCDIC"), None);
        assert_eq!(TextEncoding::from_name("utf-8"), None);
        assert_eq!(LineEnding::from_name("LF"), None);
    }

    #[test]
    fn utf16_has_no_bom_unless_asked() {
        assert_eq!(encode("UTF-16 LE", "hi").unwrap(), b"h\0i\0");
        assert_eq!(encode("UTF-16 BE", "hi").unwrap(), b"\0h\0i");
        let Some(TextEncoding::Bytes(enc)) = TextEncoding::from_name("UTF-16 LE with BOM") else {
            panic!("expected byte encoding");
        };
        assert_eq!(enc.bom(), &[0xFF, 0xFE]);
    }

    #[test]
    fn utf16_astral_uses_surrogate_pair() {
        assert_eq!(encode("UTF-16 LE", "\u{1F600}").unwrap().len(), 4);
    }

    #[test]
    fn latin1_range() {
        assert_eq!(encode("Western (ISO 8859-1)", "é\u{0085}").unwrap(), vec![0xE9, 0x85]);
        assert_eq!(encode("Western (ISO 8859-1)", "a€"), Err('€'));
    }

    #[test]
    fn latin5_swaps_turkish_letters() {
        assert_eq!(encode("Turkish (ISO 8859-9)", "ğı").unwrap(), vec![0xF0, 0xFD]);
        assert_eq!(encode("Turkish (ISO 8859-9)", "ð"), Err('ð'));
    }

    #[test]
    fn windows_1252_euro() {
        assert_eq!(encode("Western (Windows 1252)", "€").unwrap(), vec![0x80]);
    }

    #[test]
    fn legacy_reports_first_unmappable() {
        assert_eq!(encode("Cyrillic (KOI8-R)", "привет 中"), Err('中'));
        assert_eq!(encode("Cyrillic (KOI8-R)", "привет").unwrap().len(), 6);
    }

    #[test]
    fn koi8u_keeps_box_drawing_over_short_u() {
        assert_eq!(encode("Cyrillic (KOI8-U)", "╝╬").unwrap(), vec![0xAE, 0xBE]);
        assert_eq!(encode("Cyrillic (KOI8-U)", "ґі ╝").unwrap(), vec![0xAD, 0xA6, 0x20, 0xAE]);
        assert_eq!(encode("Cyrillic (KOI8-U)", "ab ў"), Err('ў'));
        assert_eq!(encode("Cyrillic (KOI8-U)", "Ў"), Err('Ў'));
        // The first unencodable character wins, whichever path rejects it.
        assert_eq!(encode("Cyrillic (KOI8-U)", "中ў"), Err('中'));
    }

    #[test]
    fn windows_code_pages_reject_c1_controls() {
        assert_eq!(encode("Western (Windows 1252)", "\u{81}"), Err('\u{81}'));
        assert_eq!(encode("Western (Windows 1252)", "a€\u{9F}"), Err('\u{9F}'));
        assert_eq!(encode("Cyrillic (Windows 1251)", "\u{98}"), Err('\u{98}'));
        // ISO 8859 code pages do assign C1.
        assert_eq!(encode("Western (ISO 8859-15)", "\u{81}").unwrap(), vec![0x81]);
    }

    #[test]
    fn cp437_box_drawing() {
        assert_eq!(encode("DOS (CP 437)", "╔═╗").unwrap(), vec![0xC9, 0xCD, 0xBB]);
    }

    #[test]
    fn line_ending_substitution() {
        assert_eq!(LineEnding::Windows.apply("a\nb\n"), "a\r\nb\r\n");
        assert_eq!(LineEnding::Cr.apply("a\nb"), "a\rb");
        assert_eq!(LineEnding::Unix.apply("a\nb"), "a\nb");
    }

    #[test]
    fn line_ending_names_roundtrip() {
        for eol in [LineEnding::Unix, LineEnding::Windows, LineEnding::Cr] {
            assert_eq!(LineEnding::from_name(eol.name()), Some(eol));
        }
    }
}
