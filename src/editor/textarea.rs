//! Minimal multiline text area backing the key/value pane.
//!
//! Holds lines and a cursor; the adapter renders it and feeds it
//! keystrokes. Column positions are in characters, converted to byte
//! offsets at the edit point.

pub struct TextArea {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl TextArea {
    /// Build from a text block, accepting both LF and CRLF line
    /// endings. The cursor starts at the top.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = if text.is_empty() {
            vec![String::new()]
        } else {
            text.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };
        Self {
            lines,
            row: 0,
            col: 0,
        }
    }

    /// The full text, CRLF-joined to match the codec's line convention.
    pub fn text(&self) -> String {
        self.lines.join("\r\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor position as (row, column), both zero-based.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let index = Self::byte_index(&self.lines[self.row], self.col);
        self.lines[self.row].insert(index, c);
        self.col += 1;
    }

    pub fn insert_newline(&mut self) {
        let index = Self::byte_index(&self.lines[self.row], self.col);
        let rest = self.lines[self.row].split_off(index);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Delete the character before the cursor; at a line start, join
    /// with the previous line.
    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let index = Self::byte_index(&self.lines[self.row], self.col);
            self.lines[self.row].remove(index);
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&current);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_text_splits_crlf_and_lf() {
        let area = TextArea::from_text("a=1\r\nb=2\nc=3");
        assert_eq!(area.lines(), &["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn test_empty_text_has_one_blank_line() {
        let area = TextArea::from_text("");
        assert_eq!(area.lines(), &[""]);
        assert_eq!(area.cursor(), (0, 0));
    }

    #[test]
    fn test_text_round_trips_with_crlf() {
        let area = TextArea::from_text("a=1\r\nb=2");
        assert_eq!(area.text(), "a=1\r\nb=2");
    }

    #[test]
    fn test_insert_char_advances_cursor() {
        let mut area = TextArea::from_text("");
        for c in "a=1".chars() {
            area.insert_char(c);
        }
        assert_eq!(area.text(), "a=1");
        assert_eq!(area.cursor(), (0, 3));
    }

    #[test]
    fn test_insert_newline_splits_line() {
        let mut area = TextArea::from_text("ab");
        area.move_right();
        area.insert_newline();
        assert_eq!(area.lines(), &["a", "b"]);
        assert_eq!(area.cursor(), (1, 0));
    }

    #[test]
    fn test_backspace_removes_char() {
        let mut area = TextArea::from_text("ab");
        area.move_end();
        area.backspace();
        assert_eq!(area.text(), "a");
        assert_eq!(area.cursor(), (0, 1));
    }

    #[test]
    fn test_backspace_at_line_start_joins_lines() {
        let mut area = TextArea::from_text("ab\ncd");
        area.move_down();
        area.backspace();
        assert_eq!(area.lines(), &["abcd"]);
        assert_eq!(area.cursor(), (0, 2));
    }

    #[test]
    fn test_backspace_at_origin_is_noop() {
        let mut area = TextArea::from_text("ab");
        area.backspace();
        assert_eq!(area.text(), "ab");
    }

    #[test]
    fn test_vertical_movement_clamps_column() {
        let mut area = TextArea::from_text("long line\nab");
        area.move_end();
        area.move_down();
        assert_eq!(area.cursor(), (1, 2));
    }

    #[test]
    fn test_multibyte_characters_edit_cleanly() {
        let mut area = TextArea::from_text("é=café");
        area.move_end();
        area.backspace();
        assert_eq!(area.text(), "é=caf");
    }
}
