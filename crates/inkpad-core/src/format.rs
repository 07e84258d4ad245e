//! Markdown formatting actions over a text selection.
//!
//! These are the editor toolbar / key-binding commands. Each action takes
//! the buffer and a byte-offset [`Selection`] and returns the new buffer
//! with the selection the editor should show afterwards. Inline actions
//! toggle: a selection already wrapped in the markers is unwrapped.

use crate::error::SessionError;

/// Byte range into the buffer. `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Check the range against `text`: in bounds and on char boundaries.
    pub fn validate(&self, text: &str) -> Result<(), SessionError> {
        let ok = self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end);
        if ok {
            Ok(())
        } else {
            Err(SessionError::InvalidRange {
                start: self.start,
                end: self.end,
                len: text.len(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatAction {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Link,
    /// ATX heading level, clamped to 1..=6.
    Heading(u8),
    UnorderedList,
    OrderedList,
    Quote,
    TodoList,
    /// Indent the list item under the caret by two spaces.
    Indent,
    Outdent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub selection: Selection,
}

/// Apply `action` to `selection` of `text`.
///
/// Returns `Ok(None)` when the action does not apply (quoting a blank
/// selection, indenting a line that is not a list item).
pub fn apply(
    text: &str,
    selection: Selection,
    action: FormatAction,
) -> Result<Option<Formatted>, SessionError> {
    selection.validate(text)?;
    let formatted = match action {
        FormatAction::Bold => Some(toggle_wrap(text, selection, "**", "**", 2)),
        FormatAction::Italic => Some(toggle_wrap(text, selection, "*", "*", 1)),
        FormatAction::Strikethrough => Some(toggle_wrap(text, selection, "~~", "~~", 2)),
        FormatAction::Code => Some(toggle_wrap(text, selection, "`", "`", 1)),
        FormatAction::Link => Some(toggle_wrap(text, selection, "[", "]()", 1)),
        FormatAction::Heading(level) => Some(heading(text, selection, level)),
        FormatAction::UnorderedList => Some(map_lines(text, selection, |lines| {
            if lines.iter().all(|l| l.trim().starts_with("- ")) {
                lines.iter().map(|l| strip_bullet(l).to_string()).collect()
            } else {
                lines.iter().map(|l| format!("- {l}")).collect()
            }
        })),
        FormatAction::OrderedList => Some(map_lines(text, selection, |lines| {
            if lines.iter().all(|l| ordered_marker_len(l.trim()).is_some()) {
                lines
                    .iter()
                    .map(|l| l[ordered_marker_len(l).unwrap_or(0)..].to_string())
                    .collect()
            } else {
                lines
                    .iter()
                    .enumerate()
                    .map(|(i, l)| format!("{}. {l}", i + 1))
                    .collect()
            }
        })),
        FormatAction::Quote => {
            if selected(text, selection).trim().is_empty() {
                None
            } else {
                Some(map_lines(text, selection, |lines| {
                    if lines.iter().all(|l| l.trim().starts_with("> ")) {
                        lines.iter().map(|l| strip_quote(l).to_string()).collect()
                    } else {
                        lines.iter().map(|l| format!("> {l}")).collect()
                    }
                }))
            }
        }
        FormatAction::TodoList => {
            if selected(text, selection).trim().is_empty() {
                None
            } else {
                Some(map_lines(text, selection, |lines| {
                    if lines.iter().all(|l| todo_marker_len(l.trim()).is_some()) {
                        lines
                            .iter()
                            .map(|l| l[todo_marker_len(l).unwrap_or(0)..].to_string())
                            .collect()
                    } else {
                        lines.iter().map(|l| format!("- [ ] {l}")).collect()
                    }
                }))
            }
        }
        FormatAction::Indent => indent(text, selection),
        FormatAction::Outdent => outdent(text, selection),
    };
    Ok(formatted)
}

fn selected(text: &str, selection: Selection) -> &str {
    &text[selection.start..selection.end]
}

fn splice(text: &str, start: usize, end: usize, insert: &str) -> String {
    let mut out = String::with_capacity(text.len() - (end - start) + insert.len());
    out.push_str(&text[..start]);
    out.push_str(insert);
    out.push_str(&text[end..]);
    out
}

/// Wrap the selection in `prefix`/`suffix`, or unwrap it when it already
/// carries both. After wrapping, the caret sits `back` bytes before the end
/// of the inserted text (inside `**|**`, inside `[text](|)`).
fn toggle_wrap(text: &str, sel: Selection, prefix: &str, suffix: &str, back: usize) -> Formatted {
    let inner = selected(text, sel);
    let wrapped = inner.len() >= prefix.len() + suffix.len()
        && inner.starts_with(prefix)
        && inner.ends_with(suffix);
    if wrapped {
        let replacement = &inner[prefix.len()..inner.len() - suffix.len()];
        Formatted {
            text: splice(text, sel.start, sel.end, replacement),
            selection: Selection::caret(sel.start + replacement.len()),
        }
    } else {
        let replacement = format!("{prefix}{inner}{suffix}");
        let caret = sel.start + replacement.len() - back;
        Formatted {
            text: splice(text, sel.start, sel.end, &replacement),
            selection: Selection::caret(caret),
        }
    }
}

/// Replace the selected text line by line.
fn map_lines(text: &str, sel: Selection, f: impl FnOnce(&[&str]) -> Vec<String>) -> Formatted {
    let lines: Vec<&str> = selected(text, sel).split('\n').collect();
    let replacement = f(&lines).join("\n");
    Formatted {
        text: splice(text, sel.start, sel.end, &replacement),
        selection: Selection::caret(sel.start + replacement.len()),
    }
}

fn line_start(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map_or(0, |i| i + 1)
}

fn line_end(text: &str, at: usize) -> usize {
    text[at..].find('\n').map_or(text.len(), |i| at + i)
}

/// Turn every line touched by the selection into a heading of `level`,
/// replacing any heading marker already there.
fn heading(text: &str, sel: Selection, level: u8) -> Formatted {
    let prefix = format!("{} ", "#".repeat(level.clamp(1, 6) as usize));
    let start = line_start(text, sel.start);
    let end = line_end(text, sel.end);
    let replacement = text[start..end]
        .split('\n')
        .map(|line| format!("{prefix}{}", strip_heading_marker(line).trim_start()))
        .collect::<Vec<_>>()
        .join("\n");
    Formatted {
        text: splice(text, start, end, &replacement),
        selection: Selection::caret(start + prefix.len()),
    }
}

fn strip_heading_marker(line: &str) -> &str {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    let rest = &line[hashes..];
    if (1..=6).contains(&hashes) && rest.starts_with(char::is_whitespace) {
        rest.trim_start()
    } else {
        line
    }
}

fn strip_bullet(line: &str) -> &str {
    match line.strip_prefix('-') {
        Some(rest) if rest.starts_with(' ') => rest.trim_start_matches(' '),
        _ => line,
    }
}

fn strip_quote(line: &str) -> &str {
    match line.strip_prefix('>') {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => line,
    }
}

/// Length of a leading `1. ` marker including all following whitespace.
fn ordered_marker_len(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || line.as_bytes().get(digits) != Some(&b'.') {
        return None;
    }
    let rest = &line[digits + 1..];
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    Some(line.len() - trimmed.len())
}

/// Length of a leading `- [ ] ` or `- [x] ` marker.
fn todo_marker_len(line: &str) -> Option<usize> {
    ["- [ ] ", "- [x] "]
        .into_iter()
        .find(|m| line.starts_with(m))
        .map(str::len)
}

fn is_list_item(line: &str) -> bool {
    let body = line.trim_start();
    body.starts_with("- ") || ordered_marker_len(body).is_some()
}

fn indent(text: &str, sel: Selection) -> Option<Formatted> {
    let start = line_start(text, sel.start);
    let end = line_end(text, sel.start);
    if !is_list_item(&text[start..end]) {
        return None;
    }
    Some(Formatted {
        text: splice(text, start, start, "  "),
        selection: Selection::new(sel.start + 2, sel.end + 2),
    })
}

fn outdent(text: &str, sel: Selection) -> Option<Formatted> {
    let start = line_start(text, sel.start);
    let end = line_end(text, sel.start);
    let line = &text[start..end];
    if !is_list_item(line) {
        return None;
    }
    let leading = line.len() - line.trim_start().len();
    if leading < 2 || !line.is_char_boundary(2) {
        return None;
    }
    Some(Formatted {
        text: splice(text, start, start + 2, ""),
        selection: Selection::new(
            sel.start.saturating_sub(2).max(start),
            sel.end.saturating_sub(2).max(start),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, start: usize, end: usize, action: FormatAction) -> Formatted {
        apply(text, Selection::new(start, end), action)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn bold_wraps_and_unwraps() {
        let f = run("say hello now", 4, 9, FormatAction::Bold);
        assert_eq!(f.text, "say **hello** now");
        assert_eq!(f.selection, Selection::caret(11));
        let g = run(&f.text, 4, 13, FormatAction::Bold);
        assert_eq!(g.text, "say hello now");
    }

    #[test]
    fn empty_selection_places_caret_between_markers() {
        let f = run("", 0, 0, FormatAction::Bold);
        assert_eq!(f.text, "****");
        assert_eq!(f.selection, Selection::caret(2));
        let link = run("site", 0, 4, FormatAction::Link);
        assert_eq!(link.text, "[site]()");
        assert_eq!(link.selection, Selection::caret(7));
    }

    #[test]
    fn single_marker_is_not_treated_as_wrapped() {
        let f = run("*", 0, 1, FormatAction::Italic);
        assert_eq!(f.text, "***");
    }

    #[test]
    fn heading_replaces_existing_level_on_every_touched_line() {
        let text = "## Old\nplain\nnext";
        let f = run(text, 2, 9, FormatAction::Heading(1));
        assert_eq!(f.text, "# Old\n# plain\nnext");
        assert_eq!(f.selection, Selection::caret(2));
        let capped = run("x", 0, 0, FormatAction::Heading(9));
        assert_eq!(capped.text, "###### x");
    }

    #[test]
    fn lists_toggle() {
        let f = run("a\nb", 0, 3, FormatAction::UnorderedList);
        assert_eq!(f.text, "- a\n- b");
        assert_eq!(run(&f.text, 0, 7, FormatAction::UnorderedList).text, "a\nb");

        let o = run("a\nb", 0, 3, FormatAction::OrderedList);
        assert_eq!(o.text, "1. a\n2. b");
        assert_eq!(run(&o.text, 0, o.text.len(), FormatAction::OrderedList).text, "a\nb");
    }

    #[test]
    fn quote_skips_blank_selection() {
        assert_eq!(apply("  ", Selection::new(0, 2), FormatAction::Quote).unwrap(), None);
        let f = run("x\ny", 0, 3, FormatAction::Quote);
        assert_eq!(f.text, "> x\n> y");
        assert_eq!(run(&f.text, 0, 7, FormatAction::Quote).text, "x\ny");
    }

    #[test]
    fn todo_list_toggles() {
        let f = run("buy milk", 0, 8, FormatAction::TodoList);
        assert_eq!(f.text, "- [ ] buy milk");
        assert_eq!(run("- [x] done", 0, 10, FormatAction::TodoList).text, "done");
    }

    #[test]
    fn indent_and_outdent_list_items() {
        let text = "intro\n- item";
        let f = apply(text, Selection::caret(9), FormatAction::Indent).unwrap().unwrap();
        assert_eq!(f.text, "intro\n  - item");
        assert_eq!(f.selection, Selection::caret(11));
        let g = apply(&f.text, f.selection, FormatAction::Outdent).unwrap().unwrap();
        assert_eq!(g.text, text);
        assert_eq!(apply(text, Selection::caret(2), FormatAction::Indent).unwrap(), None);
        assert_eq!(apply(text, Selection::caret(9), FormatAction::Outdent).unwrap(), None);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(matches!(
            apply("abc", Selection { start: 2, end: 9 }, FormatAction::Bold),
            Err(SessionError::InvalidRange { .. })
        ));
        assert!(apply("你", Selection::new(1, 2), FormatAction::Bold).is_err());
    }
}
