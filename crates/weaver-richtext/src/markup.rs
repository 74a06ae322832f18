//! Tokenizer for the constrained markup subset produced by the codecs and the host.
//!
//! This is not an HTML parser. It recognizes text, start tags with attributes,
//! end tags and comments, and records the byte span of every token so callers
//! can re-emit untouched markup byte-for-byte. Anything that does not look
//! like a well-formed tag is text. Tokenizing never fails.

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark_escape::{FmtWriter, escape_html, escape_html_body_text};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "wbr"];

/// A single markup token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Start(Tag<'a>),
    /// End tag, holding the element name as written.
    End(&'a str),
    /// Comment body, without the `<!--` and `-->` delimiters.
    Comment(&'a str),
}

/// A start tag. Attribute values are kept raw; [`Tag::attr`] decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub attrs: Vec<Attr<'a>>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr<'a> {
    pub name: &'a str,
    /// `None` for bare attributes such as `contenteditable`.
    pub value: Option<&'a str>,
}

/// A token together with the byte range it occupies in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub span: Range<usize>,
}

impl<'a> Tag<'a> {
    /// Case-insensitive element name check.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// True for void elements and `<x/>` tags, which have no matching end tag.
    pub fn is_void(&self) -> bool {
        self.self_closing || VOID_ELEMENTS.iter().any(|v| self.is(v))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Entity-decoded value of the first attribute called `name`.
    ///
    /// Bare attributes yield an empty string.
    pub fn attr(&self, name: &str) -> Option<Cow<'a, str>> {
        let attr = self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(attr.value.map(decode_entities).unwrap_or(Cow::Borrowed("")))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Split markup into tokens covering the whole input contiguously.
pub fn tokenize(src: &str) -> Vec<Spanned<'_>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            if let Some((token, end)) = parse_markup(src, pos) {
                if text_start < pos {
                    tokens.push(Spanned {
                        token: Token::Text(&src[text_start..pos]),
                        span: text_start..pos,
                    });
                }
                tokens.push(Spanned {
                    token,
                    span: pos..end,
                });
                pos = end;
                text_start = end;
                continue;
            }
        }
        pos += 1;
    }

    if text_start < src.len() {
        tokens.push(Spanned {
            token: Token::Text(&src[text_start..]),
            span: text_start..src.len(),
        });
    }

    tokens
}

/// Index of the end tag closing the start tag at `start`, by same-name depth counting.
///
/// Returns `None` for void elements, non-start tokens, and unclosed elements.
pub fn matching_end(tokens: &[Spanned<'_>], start: usize) -> Option<usize> {
    let Token::Start(open) = &tokens.get(start)?.token else {
        return None;
    };
    if open.is_void() {
        return None;
    }

    let mut depth = 0usize;
    for (idx, spanned) in tokens.iter().enumerate().skip(start + 1) {
        match &spanned.token {
            Token::Start(tag) if tag.is(open.name) && !tag.is_void() => depth += 1,
            Token::End(name) if name.eq_ignore_ascii_case(open.name) => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn parse_markup(src: &str, start: usize) -> Option<(Token<'_>, usize)> {
    let bytes = src.as_bytes();
    let rest = &src[start..];

    if let Some(body) = rest.strip_prefix("<!--") {
        let close = body.find("-->")?;
        let body_start = start + 4;
        return Some((
            Token::Comment(&src[body_start..body_start + close]),
            body_start + close + 3,
        ));
    }

    if let Some(after) = rest.strip_prefix("</") {
        let name_len = tag_name_len(after);
        if name_len == 0 {
            return None;
        }
        let close = after[name_len..].find('>')?;
        return Some((Token::End(&after[..name_len]), start + 2 + name_len + close + 1));
    }

    let name_len = tag_name_len(&rest[1..]);
    if name_len == 0 {
        return None;
    }
    let name = &rest[1..1 + name_len];
    let mut cursor = start + 1 + name_len;
    let mut attrs = Vec::new();

    loop {
        cursor = skip_whitespace(bytes, cursor);
        match *bytes.get(cursor)? {
            b'>' => {
                let tag = Tag {
                    name,
                    attrs,
                    self_closing: false,
                };
                return Some((Token::Start(tag), cursor + 1));
            }
            b'/' if bytes.get(cursor + 1) == Some(&b'>') => {
                let tag = Tag {
                    name,
                    attrs,
                    self_closing: true,
                };
                return Some((Token::Start(tag), cursor + 2));
            }
            b'/' => cursor += 1,
            b'"' | b'\'' | b'=' => return None,
            _ => {
                let name_end = cursor
                    + src[cursor..].find(|c: char| {
                        c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/' | '"' | '\'')
                    })?;
                let attr_name = &src[cursor..name_end];
                cursor = skip_whitespace(bytes, name_end);

                if bytes.get(cursor) != Some(&b'=') {
                    attrs.push(Attr {
                        name: attr_name,
                        value: None,
                    });
                    continue;
                }

                cursor = skip_whitespace(bytes, cursor + 1);
                let quote = *bytes.get(cursor)?;
                let value = if quote == b'"' || quote == b'\'' {
                    let close = src[cursor + 1..].find(quote as char)?;
                    let value = &src[cursor + 1..cursor + 1 + close];
                    cursor += close + 2;
                    value
                } else {
                    let end = cursor
                        + src[cursor..].find(|c: char| c.is_ascii_whitespace() || c == '>')?;
                    if end == cursor {
                        return None;
                    }
                    let value = &src[cursor..end];
                    cursor = end;
                    value
                };
                attrs.push(Attr {
                    name: attr_name,
                    value: Some(value),
                });
            }
        }
    }
}

/// Byte length of a tag name at the start of `s`: an ASCII letter, then letters, digits or `-`.
fn tag_name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-'))
        .unwrap_or(bytes.len())
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

/// Decode the entities the codecs and the host emit.
///
/// Unknown or malformed entities are left as written.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];
        let decoded = candidate
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&candidate[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Append `s` escaped for use inside a double-quoted attribute value.
pub fn push_escaped_attr(out: &mut String, s: &str) {
    // Writing into a String cannot fail.
    let _ = escape_html(FmtWriter(&mut *out), s);
}

/// Append `s` escaped for use as element text.
pub fn push_escaped_text(out: &mut String, s: &str) {
    let _ = escape_html_body_text(FmtWriter(&mut *out), s);
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped_text(&mut out, s);
    out
}

/// Split an inline `style` attribute into trimmed `(property, value)` pairs.
pub fn parse_style(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let prop = prop.trim();
        (!prop.is_empty()).then_some((prop, value.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_tag<'a>(tokens: &'a [Spanned<'a>], idx: usize) -> &'a Tag<'a> {
        match &tokens[idx].token {
            Token::Start(tag) => tag,
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn test_spans_cover_input() {
        let src = "a <b class=\"x\">bold</b> <!-- note --> c";
        let tokens = tokenize(src);
        let rebuilt: String = tokens.iter().map(|t| &src[t.span.clone()]).collect();
        assert_eq!(rebuilt, src);
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[5].token, Token::Comment(" note "));
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = tokenize(r#"<span data-key='K' hidden data-n=3 class="a b">"#);
        let tag = start_tag(&tokens, 0);
        assert_eq!(tag.attr("data-key").as_deref(), Some("K"));
        assert_eq!(tag.attr("hidden").as_deref(), Some(""));
        assert_eq!(tag.attr("DATA-N").as_deref(), Some("3"));
        assert!(tag.has_class("b"));
        assert!(!tag.has_class("c"));
        assert!(tag.has_attr("hidden"));
    }

    #[test]
    fn test_quoted_gt_in_value() {
        let tokens = tokenize(r#"<span title="a > b">x</span>"#);
        assert_eq!(tokens.len(), 3);
        assert_eq!(start_tag(&tokens, 0).attr("title").as_deref(), Some("a > b"));
    }

    #[test]
    fn test_self_closing_and_void() {
        let tokens = tokenize("<br><img src=x/><span/>");
        assert!(start_tag(&tokens, 0).is_void());
        assert!(start_tag(&tokens, 1).is_void());
        assert!(start_tag(&tokens, 2).self_closing);
    }

    #[test]
    fn test_malformed_is_text() {
        for src in ["a < b", "<", "<span", "<span class=\"x>", "</>", "<1abc>", "<a =x>"] {
            let tokens = tokenize(src);
            assert_eq!(tokens.len(), 1, "{src}");
            assert_eq!(tokens[0].token, Token::Text(src));
        }
    }

    #[test]
    fn test_matching_end_nested() {
        let src = "<span a><span b>x</span>y</span><span>z</span>";
        let tokens = tokenize(src);
        assert_eq!(matching_end(&tokens, 0), Some(5));
        assert_eq!(matching_end(&tokens, 1), Some(3));
        assert_eq!(matching_end(&tokens, 2), None);
    }

    #[test]
    fn test_matching_end_unclosed() {
        let tokens = tokenize("<span>open");
        assert_eq!(matching_end(&tokens, 0), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("plain"), "plain");
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;&nbsp;"), "AB\u{a0}");
        assert_eq!(decode_entities("AT&T; &bogus; &"), "AT&T; &bogus; &");
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = r#"a "quoted" <tag> & more"#;
        let mut attr = String::new();
        push_escaped_attr(&mut attr, raw);
        assert!(!attr.contains('"'));
        assert_eq!(decode_entities(&attr), raw);
        assert_eq!(decode_entities(&escape_text(raw)), raw);
    }

    #[test]
    fn test_parse_style() {
        let decls: Vec<_> =
            parse_style(" --highlight-background: yellow ;color:red;; bad").collect();
        assert_eq!(
            decls,
            vec![("--highlight-background", "yellow"), ("color", "red")]
        );
    }
}
