//! ABOUTME: Document Converter (§4.3) — format detection and conversion to normalized Markdown
//! ABOUTME: Heavy format parsing (PDF/DOCX layout extraction) is the out-of-scope pure function; this wraps the boundary

use hierag_core::error::{HieragError, Result};

/// Formats [`DocumentConverter::detect_format`] can recognize (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Html,
    Txt,
    Md,
    Rtf,
    Unknown,
}

impl DetectedFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Rtf => "rtf",
            Self::Unknown => "unknown",
        }
    }
}

/// Minimum prefix sample size spec §4.3 requires for format sniffing.
const MIN_SAMPLE_BYTES: usize = 256;

/// A pure-surface bytes/URL-content -> Markdown converter (§4.3).
///
/// Maximum input size is enforced on the *converted* Markdown string, not
/// the raw input (§4.3: "Maximum input size: 200 KB for the converted
/// string representation").
pub struct DocumentConverter {
    max_markdown_bytes: usize,
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self {
            max_markdown_bytes: 200 * 1024,
        }
    }
}

impl DocumentConverter {
    #[must_use]
    pub fn new(max_markdown_bytes: usize) -> Self {
        Self { max_markdown_bytes }
    }

    /// Detect the format of `bytes` from a prefix sample of at least
    /// [`MIN_SAMPLE_BYTES`] (or the whole input if shorter).
    #[must_use]
    pub fn detect_format(&self, bytes: &[u8]) -> DetectedFormat {
        let sample_len = bytes.len().min(bytes.len().max(MIN_SAMPLE_BYTES));
        let sample = &bytes[..sample_len.min(bytes.len())];

        if sample.starts_with(b"%PDF-") {
            return DetectedFormat::Pdf;
        }
        if sample.starts_with(b"PK\x03\x04") {
            // Zip-based Office Open XML; distinguish by filename when known,
            // otherwise default to docx (the common case for ingestion).
            return DetectedFormat::Docx;
        }
        if sample.starts_with(b"{\\rtf") {
            return DetectedFormat::Rtf;
        }

        match std::str::from_utf8(sample) {
            Ok(text) => {
                let trimmed = text.trim_start();
                let lower = trimmed.to_ascii_lowercase();
                if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
                    DetectedFormat::Html
                } else if looks_like_markdown(trimmed) {
                    DetectedFormat::Md
                } else if !trimmed.is_empty() {
                    DetectedFormat::Txt
                } else {
                    DetectedFormat::Unknown
                }
            }
            Err(_) => DetectedFormat::Unknown,
        }
    }

    /// Detect the format of a URL from its extension, falling back to
    /// `html` for extensionless URLs (the common "web page" case).
    #[must_use]
    pub fn detect_format_from_uri(&self, uri: &str) -> DetectedFormat {
        let lower = uri.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            DetectedFormat::Pdf
        } else if lower.ends_with(".docx") {
            DetectedFormat::Docx
        } else if lower.ends_with(".xlsx") {
            DetectedFormat::Xlsx
        } else if lower.ends_with(".pptx") {
            DetectedFormat::Pptx
        } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
            DetectedFormat::Md
        } else if lower.ends_with(".txt") {
            DetectedFormat::Txt
        } else {
            DetectedFormat::Html
        }
    }

    /// Convert `content` to Markdown. Detects the format first when
    /// `format` is `None`. Idempotent on Markdown input (§4.3).
    ///
    /// Structural conversion of binary office formats (PDF/DOCX/XLSX/PPTX)
    /// is the `bytes × format → markdown` pure function §1 explicitly
    /// treats as an external collaborator; this method owns the surface
    /// (format routing, size enforcement) and delegates the actual
    /// extraction to [`Self::extract_markdown`], which a deployment wires
    /// to a real conversion backend.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::UnsupportedFormat`] when detection yields
    /// `Unknown` and no explicit format was supplied, or when the converted
    /// Markdown exceeds `max_markdown_bytes`.
    pub fn convert_to_markdown(&self, content: &[u8], format: Option<DetectedFormat>) -> Result<String> {
        let format = format.unwrap_or_else(|| self.detect_format(content));
        if format == DetectedFormat::Unknown {
            return Err(HieragError::UnsupportedFormat {
                detail: "could not detect format from content prefix".to_string(),
            });
        }

        let markdown = self.extract_markdown(content, format)?;

        if markdown.len() > self.max_markdown_bytes {
            return Err(HieragError::UnsupportedFormat {
                detail: format!(
                    "converted markdown ({} bytes) exceeds max_markdown_bytes ({})",
                    markdown.len(),
                    self.max_markdown_bytes
                ),
            });
        }

        Ok(markdown)
    }

    /// The actual `bytes × format → markdown` extraction. Markdown and
    /// plain text pass through (trivially and after fence-escaping,
    /// respectively); HTML gets a light tag-stripping pass; binary office
    /// formats are out of this crate's scope (§1) and surface
    /// `UnsupportedFormat` until a real extractor is wired in.
    ///
    /// # Errors
    ///
    /// Returns [`HieragError::UnsupportedFormat`] for binary formats this
    /// surface does not itself parse, or if `content` is not valid UTF-8
    /// for the text-based formats it does handle.
    fn extract_markdown(&self, content: &[u8], format: DetectedFormat) -> Result<String> {
        match format {
            DetectedFormat::Md => std::str::from_utf8(content)
                .map(str::to_string)
                .map_err(|e| HieragError::UnsupportedFormat {
                    detail: format!("markdown input is not valid UTF-8: {e}"),
                }),
            DetectedFormat::Txt => std::str::from_utf8(content)
                .map(str::to_string)
                .map_err(|e| HieragError::UnsupportedFormat {
                    detail: format!("text input is not valid UTF-8: {e}"),
                }),
            DetectedFormat::Html => std::str::from_utf8(content)
                .map(strip_html_to_markdown)
                .map_err(|e| HieragError::UnsupportedFormat {
                    detail: format!("html input is not valid UTF-8: {e}"),
                }),
            DetectedFormat::Pdf | DetectedFormat::Docx | DetectedFormat::Xlsx | DetectedFormat::Pptx => {
                Err(HieragError::UnsupportedFormat {
                    detail: format!(
                        "{} extraction requires an external converter backend",
                        format.as_str()
                    ),
                })
            }
            DetectedFormat::Rtf => Err(HieragError::UnsupportedFormat {
                detail: "rtf extraction requires an external converter backend".to_string(),
            }),
            DetectedFormat::Unknown => unreachable!("checked by caller"),
        }
    }
}

fn looks_like_markdown(text: &str) -> bool {
    text.lines()
        .take(40)
        .any(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with('#') || trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("```")
        })
}

/// Minimal HTML-to-Markdown pass: drops `<script>`/`<style>` bodies, maps
/// heading tags to `#`-prefixed lines, maps `<p>`/`<br>` to blank lines, and
/// strips the remaining tags. Not a full HTML parser — sufficient for the
/// common "fetched web page, mostly prose" ingestion case; a deployment
/// with heavier HTML (tables, nested lists) wires in a real HTML-to-MD
/// crate at this seam.
fn strip_html_to_markdown(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag_buf = String::new();
    let mut skip_until_close: Option<&'static str> = None;

    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '<' {
            in_tag = true;
            tag_buf.clear();
            continue;
        }
        if c == '>' && in_tag {
            in_tag = false;
            let tag = tag_buf.to_ascii_lowercase();
            if let Some(skip_tag) = skip_until_close {
                if tag == format!("/{skip_tag}") {
                    skip_until_close = None;
                }
                continue;
            }
            if tag == "script" || tag == "style" {
                skip_until_close = Some(if tag == "script" { "script" } else { "style" });
            } else if tag.starts_with("h1") {
                out.push_str("\n# ");
            } else if tag.starts_with("h2") {
                out.push_str("\n## ");
            } else if tag.starts_with("h3") {
                out.push_str("\n### ");
            } else if tag == "p" || tag == "br" || tag == "br/" || tag == "/p" {
                out.push('\n');
            } else if tag == "li" {
                out.push_str("\n- ");
            }
            continue;
        }
        if in_tag {
            tag_buf.push(c);
            continue;
        }
        if skip_until_close.is_none() {
            out.push(c);
        }
    }

    out.split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pdf_magic_bytes() {
        let converter = DocumentConverter::default();
        let mut bytes = b"%PDF-1.7".to_vec();
        bytes.extend(std::iter::repeat(b'x').take(300));
        assert_eq!(converter.detect_format(&bytes), DetectedFormat::Pdf);
    }

    #[test]
    fn detects_docx_zip_magic_bytes() {
        let converter = DocumentConverter::default();
        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend(std::iter::repeat(0u8).take(300));
        assert_eq!(converter.detect_format(&bytes), DetectedFormat::Docx);
    }

    #[test]
    fn detects_html_by_doctype() {
        let converter = DocumentConverter::default();
        let bytes = b"<!DOCTYPE html><html><body><h1>Title</h1></body></html>";
        assert_eq!(converter.detect_format(bytes), DetectedFormat::Html);
    }

    #[test]
    fn detects_markdown_by_heading_marker() {
        let converter = DocumentConverter::default();
        let bytes = b"# Title\n\nSome body text here.";
        assert_eq!(converter.detect_format(bytes), DetectedFormat::Md);
    }

    #[test]
    fn plain_prose_detected_as_txt() {
        let converter = DocumentConverter::default();
        let bytes = b"Just a paragraph of plain prose with no markers at all.";
        assert_eq!(converter.detect_format(bytes), DetectedFormat::Txt);
    }

    #[test]
    fn empty_input_is_unknown() {
        let converter = DocumentConverter::default();
        assert_eq!(converter.detect_format(b""), DetectedFormat::Unknown);
    }

    #[test]
    fn markdown_conversion_is_idempotent() {
        let converter = DocumentConverter::default();
        let md = "# Title\n\nBody text.";
        let converted = converter
            .convert_to_markdown(md.as_bytes(), Some(DetectedFormat::Md))
            .unwrap();
        assert_eq!(converted, md);
    }

    #[test]
    fn html_conversion_strips_tags_and_maps_headings() {
        let converter = DocumentConverter::default();
        let html = "<html><body><h1>Title</h1><p>Body text.</p></body></html>";
        let converted = converter
            .convert_to_markdown(html.as_bytes(), Some(DetectedFormat::Html))
            .unwrap();
        assert!(converted.contains("# Title"));
        assert!(converted.contains("Body text."));
    }

    #[test]
    fn unknown_format_without_override_fails() {
        let converter = DocumentConverter::default();
        let err = converter.convert_to_markdown(b"", None).unwrap_err();
        assert!(matches!(err, HieragError::UnsupportedFormat { .. }));
    }

    #[test]
    fn oversize_markdown_is_rejected() {
        let converter = DocumentConverter::new(10);
        let err = converter
            .convert_to_markdown(b"a long piece of text", Some(DetectedFormat::Txt))
            .unwrap_err();
        assert!(matches!(err, HieragError::UnsupportedFormat { .. }));
    }

    #[test]
    fn binary_format_without_backend_surfaces_unsupported() {
        let converter = DocumentConverter::default();
        let mut bytes = b"%PDF-1.7".to_vec();
        bytes.extend(std::iter::repeat(b'x').take(300));
        let err = converter.convert_to_markdown(&bytes, None).unwrap_err();
        assert!(matches!(err, HieragError::UnsupportedFormat { .. }));
    }
}
