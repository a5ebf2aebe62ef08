//! HTML-to-text conversion for letter bodies.
//!
//! Webmail clients wrap every paragraph in a `<div>`. The text of each `<div>`
//! becomes one line of the result; markup outside any `<div>` is dropped.

use crate::error::{MailbotError, Result};

/// Convert an HTML body into newline-separated paragraphs.
///
/// - `<div><div>` and `</div></div>` are collapsed once (no fixpoint, so
///   three levels of nesting still leave two containers)
/// - every `<div>`, nested ones included, contributes its full text content
///   followed by `\n`, in document order
/// - `<script>` and `<style>` contents are skipped
/// - entities are decoded and non-breaking spaces become regular spaces
///
/// Unterminated tags, comments or declarations are an
/// [`MailbotError::Extraction`].
pub fn normalize_html(html: &str) -> Result<String> {
    let collapsed = html
        .replace("<div><div>", "<div>")
        .replace("</div></div>", "</div>");

    let mut blocks: Vec<String> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for token in tokenize(&collapsed)? {
        match token {
            Token::Start {
                name,
                self_closing: false,
            } if name == "div" => {
                open.push(blocks.len());
                blocks.push(String::new());
            }
            Token::End(name) if name == "div" => {
                open.pop();
            }
            Token::Text(text) => {
                for &idx in &open {
                    blocks[idx].push_str(&text);
                }
            }
            _ => {}
        }
    }

    let mut text = String::new();
    for block in &blocks {
        text.push_str(block);
        text.push('\n');
    }
    Ok(text.replace('\u{a0}', " "))
}

#[derive(Debug, PartialEq)]
enum Token {
    Start { name: String, self_closing: bool },
    End(String),
    Text(String),
}

fn malformed(reason: &str) -> MailbotError {
    MailbotError::Extraction(format!("malformed HTML: {reason}"))
}

fn tokenize(html: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = html;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            tokens.push(Token::Text(decode_entities(rest)));
            break;
        };
        if lt > 0 {
            tokens.push(Token::Text(decode_entities(&rest[..lt])));
        }

        let markup = &rest[lt..];
        match markup[1..].chars().next() {
            Some('!') if markup.starts_with("<!--") => {
                let end = markup[4..]
                    .find("-->")
                    .ok_or_else(|| malformed("unterminated comment"))?;
                rest = &markup[4 + end + 3..];
            }
            Some('!') | Some('?') => {
                let end = markup
                    .find('>')
                    .ok_or_else(|| malformed("unterminated declaration"))?;
                rest = &markup[end + 1..];
            }
            Some('/') => {
                let end = find_tag_end(markup)?;
                tokens.push(Token::End(tag_name(&markup[2..end])));
                rest = &markup[end + 1..];
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let end = find_tag_end(markup)?;
                let inner = &markup[1..end];
                let self_closing = inner.trim_end().ends_with('/');
                let name = tag_name(inner);
                rest = &markup[end + 1..];

                if !self_closing && (name == "script" || name == "style") {
                    let close = format!("</{name}");
                    let pos = rest
                        .to_ascii_lowercase()
                        .find(&close)
                        .ok_or_else(|| malformed("unterminated script or style"))?;
                    rest = &rest[pos..];
                }
                tokens.push(Token::Start { name, self_closing });
            }
            // A bare '<' that does not open a tag is text
            _ => {
                tokens.push(Token::Text("<".to_string()));
                rest = &markup[1..];
            }
        }
    }

    Ok(tokens)
}

/// Byte index of the `>` closing the tag that starts at `markup[0]`.
///
/// Quoted attribute values may contain `>`.
fn find_tag_end(markup: &str) -> Result<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in markup.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '>') => return Ok(idx),
            (None, '<') => return Err(malformed("'<' inside a tag")),
            _ => {}
        }
    }
    Err(malformed("unterminated tag"))
}

/// Lowercase element name at the start of a tag body.
fn tag_name(inner: &str) -> String {
    inner
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Decode named and numeric character references.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity_char(&candidate[1..semi]).map(|c| (c, semi)))
        {
            Some((ch, semi)) => {
                result.push(ch);
                rest = &candidate[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn entity_char(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
