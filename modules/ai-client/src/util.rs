/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Return the body of the first triple-backtick fenced block, if any.
///
/// A block opens with a fence followed by an optional language tag
/// (```` ```csv ````) and a line break; its body runs to the next fence, or to
/// the end of the text when unterminated. A fence pair on a single line
/// (```` ```a,b,c``` ````) is an inline span: it is returned only when no
/// block follows, so a passing mention like ```` ```csv``` ```` in prose does
/// not hide the real block.
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    const FENCE: &str = "```";

    let mut inline = None;
    let mut pos = 0;
    while let Some(found) = text[pos..].find(FENCE) {
        let after = pos + found + FENCE.len();
        let rest = &text[after..];
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let line = &rest[..line_end];

        if let Some(close) = line.find(FENCE) {
            if inline.is_none() {
                inline = Some(&line[..close]);
            }
            pos = after + close + FENCE.len();
            continue;
        }

        if is_fence_tag(line) {
            let body = &text[(after + line_end + 1).min(text.len())..];
            return Some(match body.find(FENCE) {
                Some(close) => &body[..close],
                None => body,
            });
        }

        // Fence followed by prose on the same line: not an opener.
        pos = after;
    }
    inline
}

fn is_fence_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// The fenced block body if the text has one, otherwise the whole text.
pub fn fenced_or_whole(text: &str) -> &str {
    extract_fenced_block(text).unwrap_or(text)
}
