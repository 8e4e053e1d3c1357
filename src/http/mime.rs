//! MIME type detection module
//!
//! Baseline `(mime_type, encoding)` guess for a path, before any policy
//! overrides are applied.

/// Fallback sent when no type could be guessed
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Compression suffixes reported as an encoding rather than a type,
/// with the type of the compressed container itself
const ENCODING_SUFFIXES: &[(&str, &str, &str)] = &[
    (".gz", "gzip", "application/gzip"),
    (".bz2", "bzip2", "application/x-bzip2"),
    (".xz", "xz", "application/x-xz"),
    (".br", "br", OCTET_STREAM),
    (".Z", "compress", OCTET_STREAM),
];

/// Guessed content type of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentType {
    pub mime_type: Option<&'static str>,
    pub encoding: Option<&'static str>,
}

impl ContentType {
    /// Value for the `Content-Type` header.
    ///
    /// Compressed files are sent as they are on disk, without a
    /// `Content-Encoding`, so they are labelled with the container type.
    pub fn header_value(&self) -> &'static str {
        match self.encoding {
            Some(encoding) => container_type(encoding),
            None => self.mime_type.unwrap_or(OCTET_STREAM),
        }
    }
}

fn container_type(encoding: &str) -> &'static str {
    ENCODING_SUFFIXES
        .iter()
        .find(|(_, name, _)| *name == encoding)
        .map_or(OCTET_STREAM, |&(_, _, container)| container)
}

/// Guess the content type of a path from its extension.
///
/// A trailing compression suffix is stripped and reported as the encoding,
/// and the type is guessed from what remains.
///
/// # Examples
/// ```
/// use wasm_devserve::http::mime::guess;
/// let ct = guess("dist/bundle.tar.gz");
/// assert_eq!(ct.mime_type, Some("application/x-tar"));
/// assert_eq!(ct.encoding, Some("gzip"));
/// assert_eq!(guess("notes.unknownext").mime_type, None);
/// ```
pub fn guess(path: &str) -> ContentType {
    let (base, encoding) = ENCODING_SUFFIXES
        .iter()
        .find_map(|(suffix, encoding, _)| {
            path.strip_suffix(suffix).map(|base| (base, Some(*encoding)))
        })
        .unwrap_or((path, None));

    ContentType {
        mime_type: mime_guess::from_path(base).first_raw(),
        encoding,
    }
}
