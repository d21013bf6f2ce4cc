//! Splitting whole-file text into physical lines and joining it back.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// The convention of the first line break in `content`. Text without any
    /// line break is treated as `\n`.
    fn detect(content: &str) -> Self {
        match content.find('\n') {
            Some(idx) if content[..idx].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// One physical line and the terminator it had in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) text: String,
    /// `"\n"` or `"\r\n"`; `"\r"` or empty only on a final unterminated line.
    terminator: &'static str,
}

impl Line {
    /// A line added by an edit, terminated with the file's convention.
    pub(crate) fn inserted(text: String, ending: LineEnding) -> Self {
        Self {
            text,
            terminator: ending.as_str(),
        }
    }

    fn parse(raw: &str) -> Self {
        let (text, terminator) = if let Some(text) = raw.strip_suffix("\r\n") {
            (text, "\r\n")
        } else if let Some(text) = raw.strip_suffix('\n') {
            (text, "\n")
        } else if let Some(text) = raw.strip_suffix('\r') {
            (text, "\r")
        } else {
            (raw, "")
        };
        Self {
            text: text.to_owned(),
            terminator,
        }
    }

    fn has_line_break(&self) -> bool {
        self.terminator.ends_with('\n')
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Working copy of a file as a sequence of lines.
///
/// Untouched lines render with their original terminators, so a batch never
/// rewrites line endings it did not address.
#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub(crate) lines: Vec<Line>,
    pub(crate) line_ending: LineEnding,
    trailing_newline: bool,
}

impl Document {
    pub(crate) fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(Line::parse).collect(),
            line_ending: LineEnding::detect(content),
            trailing_newline: content.ends_with('\n'),
        }
    }

    pub(crate) fn render(&self) -> String {
        let ending = self.line_ending.as_str();
        let last = self.lines.len().saturating_sub(1);
        let mut out = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            out.push_str(&line.text);
            let terminator = match (idx == last, line.has_line_break()) {
                (false, true) => line.terminator,
                (false, false) => ending,
                (true, true) if self.trailing_newline => line.terminator,
                (true, false) if self.trailing_newline => ending,
                (true, true) => "",
                (true, false) => line.terminator,
            };
            out.push_str(terminator);
        }
        out
    }
}

/// Split `content` into physical lines, dropping terminators.
///
/// A single trailing line break does not start a new line, so `"a\nb\n"` and
/// `"a\nb"` both have two lines. Empty content has no lines.
#[must_use]
pub fn split_lines(content: &str) -> Vec<&str> {
    content
        .split_inclusive('\n')
        .map(|raw| {
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            line.strip_suffix('\r').unwrap_or(line)
        })
        .collect()
}

/// Split the `content` of an edit operation into the lines it inserts.
///
/// Unlike [`split_lines`], the empty string is one empty line.
pub(crate) fn split_block(content: &str) -> Vec<String> {
    strip_line_terminator(content)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
        .collect()
}

fn strip_line_terminator(content: &str) -> &str {
    match content.strip_suffix('\n') {
        Some(body) => body.strip_suffix('\r').unwrap_or(body),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_ignores_single_trailing_newline() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
    }

    #[test]
    fn split_lines_empty_content_has_no_lines() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn split_lines_strips_carriage_returns() {
        assert_eq!(split_lines("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn split_block_keeps_empty_string_as_one_line() {
        assert_eq!(split_block(""), vec![String::new()]);
        assert_eq!(split_block("x\n"), vec!["x".to_string()]);
        assert_eq!(split_block("x\r\ny"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn document_round_trips_line_endings() {
        for content in [
            "a\nb", "a\nb\n", "a\r\nb\r\n", "a\r\nb", "", "\n", "solo", "a\nb\r\nc", "a\r",
        ] {
            assert_eq!(Document::parse(content).render(), content);
        }
    }

    #[test]
    fn document_drops_trailing_newline_when_emptied() {
        let mut doc = Document::parse("only\n");
        doc.lines.clear();
        assert_eq!(doc.render(), "");
    }

    #[test]
    fn document_lines_match_split_lines() {
        for content in ["a\nb\r\nc\n", "x\ry\n", "tail\r", "\n\n", "a\r\r\n"] {
            let doc = Document::parse(content);
            let texts: Vec<&str> = doc.lines.iter().map(|line| line.text.as_str()).collect();
            assert_eq!(texts, split_lines(content));
        }
    }

    #[test]
    fn untouched_lines_keep_their_terminators() {
        let mut doc = Document::parse("a\nb\r\nc\n");
        doc.lines[0].text = "A".to_string();
        doc.lines.push(Line::inserted("d".to_string(), doc.line_ending));
        assert_eq!(doc.render(), "A\nb\r\nc\nd\n");
    }
}
