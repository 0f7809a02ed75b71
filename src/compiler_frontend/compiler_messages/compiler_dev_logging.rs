// CODEGEN LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_codegen")]
macro_rules! codegen_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_codegen"))]
macro_rules! codegen_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// IMPORT RESOLUTION LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_imports")]
macro_rules! imports_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_imports"))]
macro_rules! imports_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// LEGACY EXPRESSION TRANSLATION LOGGING
#[macro_export]
#[cfg(feature = "show_translation")]
macro_rules! translation_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_translation"))]
macro_rules! translation_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
