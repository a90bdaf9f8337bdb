//! A backtracking cursor over input text.

use std::{cell::Cell, fmt};

use regex::Regex;
use unicode_width::UnicodeWidthChar;

/// A line/column position in the original input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CursorPosition {
    line: u32,
    col: u32,
}

const TAB_WIDTH: u32 = 8;

impl CursorPosition {
    fn new() -> Self {
        CursorPosition { line: 1, col: 1 }
    }

    /// Computes the position of byte offset `offset` in `input`.
    ///
    /// Offsets past the end of the input are clamped to the end.
    pub fn of(input: &str, offset: usize) -> Self {
        let mut pos = CursorPosition::new();
        let end = offset.min(input.len());
        let mut it = input
            .char_indices()
            .take_while(|&(i, _)| i < end)
            .map(|(_, c)| c)
            .peekable();

        while let Some(c) = it.next() {
            if c == '\r' {
                if let Some('\n') = it.peek() {
                    it.next();
                    pos.newline();
                }
            } else if c == '\n' {
                pos.newline();
            } else if c == '\t' {
                pos.col += TAB_WIDTH;
            } else {
                pos.col += c.width().unwrap_or(0) as u32;
            }
        }

        pos
    }

    /// The line number of the cursor.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The column number of the cursor.
    pub fn col(&self) -> u32 {
        self.col
    }

    fn newline(&mut self) {
        self.line += 1;
        self.col = 1;
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A saved cursor offset, produced by [`Cursor::mark`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

impl Mark {
    /// The byte offset this mark points at.
    pub fn offset(self) -> usize {
        self.0
    }
}

/// A position-tracked view over input text.
///
/// All methods take `&self`; the offset lives in a `Cell` so that nested
/// matchers can share the cursor and rewind it freely. Every `match_*`
/// method leaves the offset untouched when it fails.
pub struct Cursor<'i> {
    input: &'i str,
    pos: Cell<usize>,
}

impl<'i> Cursor<'i> {
    /// Constructs a cursor at the start of `input`.
    pub fn new(input: &'i str) -> Cursor<'i> {
        Cursor {
            input,
            pos: Cell::new(0),
        }
    }

    /// The whole input text.
    pub fn input(&self) -> &'i str {
        self.input
    }

    /// The current byte offset.
    pub fn offset(&self) -> usize {
        self.pos.get()
    }

    /// The line/column of the current offset.
    pub fn cursor_position(&self) -> CursorPosition {
        CursorPosition::of(self.input, self.offset())
    }

    /// Saves the current offset.
    pub fn mark(&self) -> Mark {
        Mark(self.pos.get())
    }

    /// Moves back (or forward) to a previously saved offset.
    pub fn rewind(&self, mark: Mark) {
        self.pos.set(mark.0);
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'i str {
        &self.input[self.pos.get()..]
    }

    /// Check whether the whole input has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos.get() >= self.input.len()
    }

    /// Check whether any input remains.
    pub fn has_more(&self) -> bool {
        !self.is_exhausted()
    }

    /// The next character, without advancing.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advances by one character. Returns `false` at end of input.
    pub fn advance(&self) -> bool {
        match self.peek() {
            Some(c) => {
                self.pos.set(self.pos.get() + c.len_utf8());
                true
            }
            None => false,
        }
    }

    /// Consumes `lit` if the remaining input starts with it.
    pub fn match_literal(&self, lit: &str) -> bool {
        if self.rest().starts_with(lit) {
            self.pos.set(self.pos.get() + lit.len());
            true
        } else {
            false
        }
    }

    /// Consumes one character satisfying `f`.
    pub fn match_char<F>(&self, f: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        match self.peek() {
            Some(c) if f(c) => self.advance(),
            _ => false,
        }
    }

    /// Consumes characters while they satisfy `f`.
    ///
    /// Returns `true` if at least one character was consumed.
    pub fn match_while<F>(&self, f: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos.get();
        while self.match_char(&f) {}
        self.pos.get() > start
    }

    /// Consumes characters up to, but not including, the first one
    /// satisfying `f` (or to the end of input).
    pub fn skip_until<F>(&self, f: F)
    where
        F: Fn(char) -> bool,
    {
        while self.match_char(|c| !f(c)) {}
    }

    /// Consumes a match of `re` if one starts at the current offset.
    ///
    /// `re` must be anchored with `^`; it is run against the remaining input
    /// only. Returns the consumed length.
    pub fn match_regex(&self, re: &Regex) -> Option<usize> {
        let m = re.find(self.rest())?;
        if m.start() != 0 {
            return None;
        }
        self.pos.set(self.pos.get() + m.end());
        Some(m.end())
    }

    /// The text between `mark` and the current offset.
    ///
    /// Returns an empty string if the cursor is behind `mark`.
    pub fn text_since(&self, mark: Mark) -> &'i str {
        let end = self.pos.get();
        if mark.0 >= end {
            ""
        } else {
            &self.input[mark.0..end]
        }
    }
}

impl<'i> fmt::Debug for Cursor<'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.offset())
            .field("rest", &self.rest())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_rewind() {
        let cur = Cursor::new("hello");
        let m = cur.mark();
        assert!(cur.match_literal("hel"));
        assert_eq!(cur.offset(), 3);
        assert_eq!(cur.text_since(m), "hel");
        cur.rewind(m);
        assert_eq!(cur.offset(), 0);
        assert!(!cur.match_literal("world"));
        assert_eq!(cur.offset(), 0);
    }

    #[test]
    fn test_advance_multibyte() {
        let cur = Cursor::new("é!");
        assert!(cur.advance());
        assert_eq!(cur.offset(), 2);
        assert!(cur.advance());
        assert!(cur.is_exhausted());
        assert!(!cur.advance());
    }

    #[test]
    fn test_match_while_and_char() {
        let cur = Cursor::new("  \tx");
        assert!(cur.match_while(|c| c == ' '));
        assert_eq!(cur.offset(), 2);
        assert!(!cur.match_while(|c| c == ' '));
        assert!(cur.match_char(|c| c == '\t'));
        assert!(!cur.match_char(|c| c == '\t'));
        assert_eq!(cur.rest(), "x");
    }

    #[test]
    fn test_skip_until() {
        let cur = Cursor::new("abc\ndef");
        cur.skip_until(|c| c == '\n');
        assert_eq!(cur.rest(), "\ndef");
    }

    #[test]
    fn test_match_regex_anchored() {
        let re = Regex::new(r"^\d+").unwrap();
        let cur = Cursor::new("ab12");
        assert_eq!(cur.match_regex(&re), None);
        cur.advance();
        cur.advance();
        assert_eq!(cur.match_regex(&re), Some(2));
        assert!(cur.is_exhausted());
    }

    #[test]
    fn test_cursor_position() {
        let input = "ab\ncd\r\n\tx";
        assert_eq!(CursorPosition::of(input, 0), CursorPosition { line: 1, col: 1 });
        assert_eq!(CursorPosition::of(input, 4), CursorPosition { line: 2, col: 2 });
        assert_eq!(CursorPosition::of(input, 8), CursorPosition { line: 3, col: 9 });
        assert_eq!(CursorPosition::of(input, 100).line(), 3);
    }
}
