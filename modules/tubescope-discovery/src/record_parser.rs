//! Quote-aware splitting of one delimited line.
//!
//! Model output is "CSV-ish": quoted fields with embedded commas and doubled
//! quotes are common, but the trailing free-text column is often left
//! unquoted or half-quoted. The splitter therefore supports a cap on the
//! number of structured fields, after which the rest of the line is taken
//! verbatim as one last field.

/// Structured leading columns of a similarity table row:
/// rank, channel name, category, score.
pub const STRUCTURED_FIELDS: usize = 4;

/// Splits one line (no embedded newlines) into fields.
#[derive(Debug, Clone, Copy)]
pub struct RecordSplitter {
    pub delimiter: char,
    pub quote: char,
    /// After this many fields the remainder of the line becomes the final
    /// field, unsplit. `None` splits the whole line.
    pub structured_fields: Option<usize>,
}

impl Default for RecordSplitter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            structured_fields: None,
        }
    }
}

impl RecordSplitter {
    /// Comma/double-quote splitter with the similarity-table tail policy.
    pub fn similarity_table() -> Self {
        Self {
            structured_fields: Some(STRUCTURED_FIELDS),
            ..Self::default()
        }
    }

    /// Split `line` into fields.
    ///
    /// A quote toggles quoted mode, except a doubled quote inside a quoted
    /// field, which is an escaped literal quote. Delimiters only separate
    /// fields outside quotes. Whitespace outside quotes is trimmed; quoted
    /// text is kept exactly.
    pub fn split(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        // Byte span of quoted text within `current`.
        let mut quoted: Option<(usize, usize)> = None;
        let mut in_quotes = false;
        let mut chars = line.char_indices().peekable();

        while let Some((idx, ch)) = chars.next() {
            if ch == self.quote {
                if in_quotes && chars.peek().map(|&(_, next)| next) == Some(self.quote) {
                    current.push(self.quote);
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
                let start = quoted.map_or(current.len(), |(start, _)| start);
                quoted = Some((start, current.len()));
                continue;
            }

            if ch == self.delimiter && !in_quotes {
                fields.push(finish_field(&current, quoted.take()));
                current.clear();

                if self.structured_fields == Some(fields.len()) {
                    let rest = &line[idx + ch.len_utf8()..];
                    fields.push(self.unquote_tail(rest));
                    return fields;
                }
                continue;
            }

            current.push(ch);
            if in_quotes {
                quoted = quoted.map(|(start, _)| (start, current.len()));
            }
        }

        fields.push(finish_field(&current, quoted));
        fields
    }

    /// The free-text tail: strip one surrounding quote pair if present and
    /// collapse doubled quotes inside it. Anything else is kept verbatim,
    /// delimiters included.
    fn unquote_tail(&self, rest: &str) -> String {
        let rest = rest.trim();
        let q = self.quote;
        let quoted = rest.len() >= 2 * q.len_utf8() && rest.starts_with(q) && rest.ends_with(q);
        if !quoted {
            return rest.to_string();
        }

        let inner = &rest[q.len_utf8()..rest.len() - q.len_utf8()];
        let doubled: String = [q, q].iter().collect();
        inner.replace(&doubled, &q.to_string())
    }
}

fn finish_field(current: &str, quoted: Option<(usize, usize)>) -> String {
    match quoted {
        Some((start, end)) => format!(
            "{}{}{}",
            current[..start].trim_start(),
            &current[start..end],
            current[end..].trim_end()
        ),
        None => current.trim().to_string(),
    }
}

/// Split a similarity-table row. `None` when the line does not carry all
/// structured fields; callers skip such lines.
pub fn parse_record_line(line: &str) -> Option<Vec<String>> {
    let fields = RecordSplitter::similarity_table().split(line);
    (fields.len() >= STRUCTURED_FIELDS).then_some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> Vec<String> {
        RecordSplitter::default().split(line)
    }

    #[test]
    fn plain_fields() {
        assert_eq!(split("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn quoted_value_round_trips() {
        for value in ["hello", "Gaming & Let's Plays", "8.5", "x y z", "ünïcödé", "  padded  "] {
            assert_eq!(split(&format!("\"{value}\"")), vec![value.to_string()]);
        }
    }

    #[test]
    fn quoted_delimiter_is_text() {
        assert_eq!(split(r#"1,"a, b",c"#), vec!["1", "a, b", "c"]);
    }

    #[test]
    fn doubled_quote_inside_quotes_is_literal() {
        assert_eq!(split(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn empty_fields_preserved() {
        assert_eq!(split("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn fields_are_trimmed() {
        assert_eq!(split(" a , b ,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn whitespace_inside_quotes_is_kept() {
        assert_eq!(split(r#" "  padded  " ,x"#), vec!["  padded  ", "x"]);
        assert_eq!(split(r#"1," lead",trail "#), vec!["1", " lead", "trail"]);
    }

    #[test]
    fn quoted_notes_keep_inner_whitespace() {
        let fields = parse_record_line(r#"1,Name,Cat,7.5,"  spaced out  ""#).unwrap();
        assert_eq!(fields[4], "  spaced out  ");
    }

    #[test]
    fn unterminated_quote_swallows_rest() {
        assert_eq!(split(r#"a,"b,c"#), vec!["a", "b,c"]);
    }

    #[test]
    fn custom_delimiter() {
        let splitter = RecordSplitter {
            delimiter: '|',
            ..RecordSplitter::default()
        };
        assert_eq!(splitter.split("a|\"b|c\"|d"), vec!["a", "b|c", "d"]);
    }

    #[test]
    fn similarity_row_with_quoted_notes() {
        let fields =
            parse_record_line(r#"1,Name,"Cat, with comma",7.5,"He said ""hi""""#).unwrap();
        assert_eq!(fields, vec!["1", "Name", "Cat, with comma", "7.5", r#"He said "hi""#]);
    }

    #[test]
    fn unquoted_notes_keep_commas() {
        let fields =
            parse_record_line("2,Tech Reviews Pro,Tech,7.2,Similar style, more hardware, fewer vlogs")
                .unwrap();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[4], "Similar style, more hardware, fewer vlogs");
    }

    #[test]
    fn half_quoted_notes_kept_verbatim() {
        let fields = parse_record_line(r#"3,A,B,6,"starts quoted, never closes"#).unwrap();
        assert_eq!(fields[4], r#""starts quoted, never closes"#);
    }

    #[test]
    fn four_fields_without_notes() {
        let fields = parse_record_line("4,Chan,Niche,5.9").unwrap();
        assert_eq!(fields, vec!["4", "Chan", "Niche", "5.9"]);
    }

    #[test]
    fn trailing_delimiter_gives_empty_notes() {
        let fields = parse_record_line("4,Chan,Niche,5.9,").unwrap();
        assert_eq!(fields, vec!["4", "Chan", "Niche", "5.9", ""]);
    }

    #[test]
    fn too_few_fields_rejected() {
        assert_eq!(parse_record_line("1,Only two"), None);
        assert_eq!(parse_record_line("Here are some channels you might like:"), None);
    }
}
