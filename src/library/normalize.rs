//! SVG normalization.
//!
//! Streams the document through quick-xml and rewrites only the elements
//! that carry attributes to drop:
//!
//! - `width`/`height` on the root `<svg>` (a `viewBox` is synthesized
//!   first when it is missing and both lengths are plain numbers)
//! - every attribute named in the denylist, on every element
//!
//! Untouched elements are written back byte-for-byte, which keeps the
//! transformation idempotent.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event, attributes::Attribute},
};

use super::error::{Result, ShelfError};

/// Options for [`normalize_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Strip `width`/`height` from the root element.
    pub remove_dimensions: bool,
    /// Attribute names removed from every element.
    pub remove_attrs: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_dimensions: true,
            remove_attrs: vec!["class".to_string()],
        }
    }
}

/// Normalize SVG markup with the default options.
///
/// `path` is only used to label errors.
pub fn normalize(svg: &str, path: &Path) -> Result<String> {
    normalize_with(svg, path, &NormalizeOptions::default())
}

/// Normalize SVG markup.
///
/// Fails with [`ShelfError::MalformedSvg`] when the input is not well
/// formed or its root element is not `<svg>`.
pub fn normalize_with(svg: &str, path: &Path, options: &NormalizeOptions) -> Result<String> {
    let svg = svg.strip_prefix('\u{feff}').unwrap_or(svg);

    let mut reader = Reader::from_str(svg);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));

    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let position = reader.error_position();
                return Err(ShelfError::malformed(path, format_args!("{e} at byte {position}")));
            }
        };

        let event = match event {
            Event::Eof => break,
            Event::Start(elem) | Event::Empty(elem) if depth == 0 && seen_root => {
                return Err(ShelfError::malformed(
                    path,
                    format_args!("multiple root elements (second is <{}>)", name_of(&elem)),
                ));
            }
            Event::Start(elem) => {
                let is_root = check_root(&elem, depth, &mut seen_root, path)?;
                depth += 1;
                Event::Start(rewrite_element(elem, is_root, options, path)?)
            }
            Event::Empty(elem) => {
                let is_root = check_root(&elem, depth, &mut seen_root, path)?;
                Event::Empty(rewrite_element(elem, is_root, options, path)?)
            }
            Event::End(elem) => {
                // Mismatched names are rejected by the reader itself.
                depth = depth.saturating_sub(1);
                Event::End(elem)
            }
            other => other,
        };

        writer
            .write_event(event)
            .map_err(|e| ShelfError::malformed(path, e))?;
    }

    if depth > 0 {
        return Err(ShelfError::malformed(path, "unexpected end of document (unclosed element)"));
    }
    if !seen_root {
        return Err(ShelfError::malformed(path, "no <svg> root element"));
    }

    String::from_utf8(writer.into_inner()).map_err(|e| ShelfError::malformed(path, e))
}

/// Record the root element and verify it is `<svg>`.
fn check_root(elem: &BytesStart<'_>, depth: usize, seen_root: &mut bool, path: &Path) -> Result<bool> {
    if depth != 0 {
        return Ok(false);
    }
    if elem.local_name().as_ref() != b"svg" {
        return Err(ShelfError::malformed(
            path,
            format_args!("root element is <{}>, expected <svg>", name_of(elem)),
        ));
    }
    *seen_root = true;
    Ok(true)
}

fn name_of<'a>(elem: &'a BytesStart<'_>) -> Cow<'a, str> {
    String::from_utf8_lossy(elem.name().into_inner())
}

/// Drop denylisted (and, on the root, sizing) attributes.
///
/// Returns the original element untouched when nothing had to change.
fn rewrite_element<'a>(
    elem: BytesStart<'a>,
    is_root: bool,
    options: &NormalizeOptions,
    path: &Path,
) -> Result<BytesStart<'a>> {
    let mut attrs = Vec::new();
    for attr in elem.attributes() {
        attrs.push(attr.map_err(|e| ShelfError::malformed(path, e))?);
    }

    let strip_dimensions = is_root && options.remove_dimensions;
    let is_dropped = |attr: &Attribute<'_>| {
        let key = attr.key.as_ref();
        (strip_dimensions && (key == b"width" || key == b"height"))
            || options.remove_attrs.iter().any(|name| name.as_bytes() == key)
    };

    if !attrs.iter().any(is_dropped) {
        drop(attrs);
        return Ok(elem);
    }

    let view_box = if strip_dimensions && !attrs.iter().any(|a| a.key.as_ref() == b"viewBox") {
        synthesize_view_box(&attrs)
    } else {
        None
    };

    let name = String::from_utf8_lossy(elem.name().into_inner()).into_owned();
    let mut rewritten = BytesStart::new(name);
    for attr in attrs.iter().filter(|a| !is_dropped(a)) {
        rewritten.push_attribute(Attribute {
            key: attr.key,
            value: requote(&attr.value),
        });
    }
    if let Some(view_box) = view_box {
        rewritten.push_attribute(("viewBox", view_box.as_str()));
    }

    Ok(rewritten.into_owned())
}

/// Build `0 0 W H` from plain numeric `width`/`height` values.
fn synthesize_view_box(attrs: &[Attribute<'_>]) -> Option<String> {
    let find = |key: &[u8]| {
        attrs
            .iter()
            .find(|a| a.key.as_ref() == key)
            .and_then(|a| std::str::from_utf8(&a.value).ok())
            .and_then(plain_length)
    };
    let width = find(b"width")?;
    let height = find(b"height")?;
    Some(format!("0 0 {width} {height}"))
}

/// Accept `24`, `24.5`, `24px`; reject percentages and other units.
fn plain_length(value: &str) -> Option<&str> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    match number.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Some(number),
        _ => None,
    }
}

/// Rewritten attributes are emitted with double quotes, so a literal `"`
/// from a single-quoted value has to become an entity.
fn requote<'a>(value: &'a Cow<'a, [u8]>) -> Cow<'a, [u8]> {
    if !value.contains(&b'"') {
        return Cow::Borrowed(value.as_ref());
    }
    let mut out = Vec::with_capacity(value.len() + 8);
    for &b in value.iter() {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}
