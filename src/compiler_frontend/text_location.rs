use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

/// Where a template node or expression came from.
/// The scope is the template file; positions are zero based.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TextLocation {
    pub scope: PathBuf,
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new(scope: impl Into<PathBuf>, start: CharPosition, end: CharPosition) -> Self {
        Self {
            scope: scope.into(),
            start_pos: start,
            end_pos: end,
        }
    }

    pub fn new_just_line(start: i32) -> Self {
        Self {
            scope: PathBuf::new(),
            start_pos: CharPosition {
                line_number: start,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: start,
                char_column: 120, // Arbitrary number
            },
        }
    }

    /// Narrows this location to a column range inside an expression that starts at `start_pos`.
    /// Used to point translation errors at the offending token rather than the whole print tag.
    pub fn sub_span(&self, column_offset: usize, length: usize) -> Self {
        let start_column = self.start_pos.char_column + column_offset as i32;

        Self {
            scope: self.scope.clone(),
            start_pos: CharPosition {
                line_number: self.start_pos.line_number,
                char_column: start_column,
            },
            end_pos: CharPosition {
                line_number: self.start_pos.line_number,
                char_column: start_column + length.max(1) as i32,
            },
        }
    }
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.scope.display(),
            self.start_pos.line_number + 1,
            self.start_pos.char_column + 1
        )
    }
}
