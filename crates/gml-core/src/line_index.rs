//! Offset to line/column lookup

use crate::ast::Position;

/// Line start table for one text. `\r\n`, `\r` and `\n` all end a line.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];

        for (i, &byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => line_starts.push(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
        }

        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Position of a byte offset, clamped into the text and floored to a
    /// character boundary.
    pub fn position(&self, offset: usize) -> Position {
        let mut index = offset.min(self.text.len());
        while !self.text.is_char_boundary(index) {
            index -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= index);
        let line_start = self.line_starts[line - 1];
        let column = self.text[line_start..index].chars().count();

        Position {
            index,
            line,
            column,
        }
    }
}
