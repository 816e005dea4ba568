//! Report Chunker: splits a line-oriented report into transport-sized segments.
//!
//! A rendered segment is `caption\n` followed by whole content lines, each
//! terminated by `\n`. Boundaries fall between lines only. The one exception
//! is a single line that cannot fit even in an otherwise empty segment: it is
//! cut, never inside a character or an HTML entity, since the transport would
//! reject it outright.
//!
//! Lengths are UTF-16 code units, the unit of Telegram's message limit.

use crate::{domain::ChatId, formatting::telegram_len, messaging::port::MessagingPort};

/// Smallest limit that can carry content: `\n`, one unit, `\n`.
const MIN_SEGMENT_LEN: usize = 3;

/// Split `text` into segments of at most `limit` UTF-16 units, each starting
/// with `caption`.
///
/// Empty (or whitespace-only) input yields no segments, as does a limit below
/// three units.
pub fn split_report(text: &str, caption: &str, limit: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if limit < MIN_SEGMENT_LEN {
        tracing::warn!(limit, "segment limit too small to carry any content");
        return Vec::new();
    }

    let caption = fit_caption(caption, limit);
    let header = format!("{caption}\n");
    // At least 2: fit_caption leaves room for one unit plus its newline.
    let budget = limit - telegram_len(&header);

    let mut out: Vec<String> = Vec::new();
    let mut body = String::new();
    let mut body_len = 0usize;

    for line in text.lines() {
        let piece_len = telegram_len(line) + 1;

        if body_len > 0 && body_len + piece_len > budget {
            out.push(format!("{header}{body}"));
            body.clear();
            body_len = 0;
        }

        if piece_len > budget {
            for part in cut_line(line, budget - 1) {
                out.push(format!("{header}{part}\n"));
            }
            continue;
        }

        body.push_str(line);
        body.push('\n');
        body_len += piece_len;
    }

    if body_len > 0 {
        out.push(format!("{header}{body}"));
    }
    out
}

/// Keep the caption to at most half the limit, and always leave room for a
/// surrogate pair plus newline after it.
fn fit_caption(caption: &str, limit: usize) -> String {
    let max = (limit / 2).min(limit.saturating_sub(MIN_SEGMENT_LEN + 1));
    if telegram_len(caption) <= max {
        return caption.to_string();
    }
    let mut out = String::new();
    let mut len = 0usize;
    for c in caption.chars() {
        len += c.len_utf16();
        if len > max {
            break;
        }
        out.push(c);
    }
    out
}

/// Cut an overlong line into parts of at most `max` units.
///
/// Entities such as `&amp;` stay whole unless `max` is narrower than the
/// entity itself. A character wider than `max` (a surrogate pair at the
/// smallest limits) cannot be sent at all and is dropped.
fn cut_line(line: &str, max: usize) -> Vec<String> {
    let mut units: Vec<&str> = Vec::new();
    for atom in atoms(line) {
        if telegram_len(atom) <= max {
            units.push(atom);
            continue;
        }
        for (i, c) in atom.char_indices() {
            if c.len_utf16() <= max {
                units.push(&atom[i..i + c.len_utf8()]);
            }
        }
    }

    let mut parts = Vec::new();
    let mut part = String::new();
    let mut part_len = 0usize;
    for unit in units {
        let len = telegram_len(unit);
        if part_len + len > max && !part.is_empty() {
            parts.push(std::mem::take(&mut part));
            part_len = 0;
        }
        part.push_str(unit);
        part_len += len;
    }
    if !part.is_empty() {
        parts.push(part);
    }
    parts
}

/// Single characters, with `&name;` and `&#123;` entities kept as one atom.
fn atoms(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = line;
    while let Some(c) = rest.chars().next() {
        let len = entity_len(rest).unwrap_or(c.len_utf8());
        out.push(&rest[..len]);
        rest = &rest[len..];
    }
    out
}

fn entity_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let end = body.find(';')?;
    let name = &body[..end];
    let valid = !name.is_empty()
        && name.len() <= 10
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    valid.then_some(end + 2)
}

/// Split and deliver a report in order. Send failures are logged and the
/// remaining segments are still attempted; nothing is retried.
///
/// Returns the number of segments the transport accepted.
pub async fn send_chunked(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    caption: &str,
    text: &str,
    limit: usize,
) -> usize {
    let limit = limit.min(messenger.capabilities().max_message_len);
    let segments = split_report(text, caption, limit);
    let total = segments.len();

    let mut delivered = 0usize;
    for (idx, segment) in segments.iter().enumerate() {
        match messenger.send_html(chat_id, segment).await {
            Ok(_) => delivered += 1,
            Err(e) => tracing::warn!(
                chat_id = chat_id.0,
                segment = idx + 1,
                total,
                "failed to send report segment: {e}"
            ),
        }
    }
    delivered
}
