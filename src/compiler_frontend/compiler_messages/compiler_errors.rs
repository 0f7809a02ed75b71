use crate::compiler_frontend::text_location::{CharPosition, TextLocation};
use rustc_hash::FxHashMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    CompilationStage,

    // Optional suggestions
    PrimarySuggestion,    // One-line fix or top-level idea
    SuggestedInsertion,   // Text that could be inserted
    SuggestedLocation,    // Relative descriptor: "before token X", "after the dot"
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,

    // Includes the template file path and the position of the offending expression.
    pub location: TextLocation,
    pub error_type: ErrorType,

    // Structured detail for richer messages
    pub metadata: FxHashMap<ErrorMetaDataKey, &'static str>,
}

impl CompilerError {
    pub fn new(
        msg: impl Into<String>,
        location: TextLocation,
        error_type: ErrorType,
    ) -> CompilerError {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: FxHashMap::default(),
        }
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: &'static str) {
        self.metadata.insert(key, value);
    }

    /// Create a new syntax error with a clear explanation
    pub fn new_syntax_error(msg: impl Into<String>, location: TextLocation) -> Self {
        CompilerError::new(msg, location, ErrorType::Syntax)
    }

    /// Create a compiler error (internal bug, not user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::Compiler)
    }

    /// Invalid backend options
    pub fn new_config_error(msg: impl Into<String>, location: TextLocation) -> Self {
        CompilerError::new(msg, location, ErrorType::Config)
    }

    /// Create a file system error from a Path
    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError::new(
            msg,
            TextLocation::new(path, CharPosition::default(), CharPosition::default()),
            ErrorType::File,
        )
    }

    /// Errors that mean the backend itself is broken. These must abort compilation
    /// and are never reported as problems with the user's template.
    pub fn is_compiler_bug(&self) -> bool {
        self.error_type == ErrorType::Compiler
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            error_type_to_str(&self.error_type),
            self.msg,
            self.location
        )?;

        if let Some(suggestion) = self.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
            write!(f, " ({})", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// Returns a new CompilerError for a malformed expression.
///
/// Usage: `return_syntax_error!("message", location, { CompilationStage => "Legacy Expression Translation" })`;
#[macro_export]
macro_rules! return_syntax_error {
    ($msg:expr, $loc:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::new_syntax_error(
            $msg, $loc,
        ))
    };
    ($msg:expr, $loc:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {{
        let mut error =
            $crate::compiler_frontend::compiler_errors::CompilerError::new_syntax_error($msg, $loc);
        $(
            error.new_metadata_entry(
                $crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key,
                $value,
            );
        )*
        return Err(error);
    }};
}

/// Returns a new CompilerError for a broken invariant inside the backend.
///
/// Usage: `return_compiler_error!("JavaScript backend: {}", detail)`;
#[macro_export]
macro_rules! return_compiler_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error(
            format!($($arg)*),
        ))
    };
}

/// Returns a new CompilerError for invalid backend options.
#[macro_export]
macro_rules! return_config_error {
    ($msg:expr, $loc:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::new_config_error(
            $msg, $loc,
        ))
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Syntax,
    Config,
    File,
    Compiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Syntax => "Syntax",
        ErrorType::Config => "Malformed Config",
        ErrorType::File => "File",
        ErrorType::Compiler => "Compiler Bug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate_stub(flag: bool) -> Result<(), CompilerError> {
        if flag {
            return_syntax_error!("bad token", TextLocation::new_just_line(3), {
                CompilationStage => "Legacy Expression Translation",
                PrimarySuggestion => "Remove the stray operator",
            });
        }

        return_compiler_error!("JavaScript backend: {} is broken", "stack")
    }

    #[test]
    fn syntax_error_macro_attaches_metadata() {
        let error = translate_stub(true).expect_err("should fail");

        assert_eq!(error.error_type, ErrorType::Syntax);
        assert_eq!(
            error.metadata.get(&ErrorMetaDataKey::CompilationStage),
            Some(&"Legacy Expression Translation")
        );
        assert!(!error.is_compiler_bug());
    }

    #[test]
    fn compiler_error_macro_formats_message() {
        let error = translate_stub(false).expect_err("should fail");

        assert!(error.is_compiler_bug());
        assert_eq!(error.msg, "JavaScript backend: stack is broken");
    }

    #[test]
    fn display_includes_type_location_and_suggestion() {
        let error = translate_stub(true).expect_err("should fail");

        assert_eq!(
            error.to_string(),
            "Syntax: bad token at :4:1 (Remove the stray operator)"
        );
    }
}
