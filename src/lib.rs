//! JavaScript emission backend for Closure-style templates.
//!
//! Consumes an already parsed and checked template tree and produces JavaScript source
//! fragments: output-variable bookkeeping, precedence-aware expression composition,
//! legacy expression translation and import resolution.

pub mod settings;

pub mod compiler_frontend {
    pub mod compiler_messages {
        pub mod compiler_dev_logging;
        pub mod compiler_errors;
    }
    pub use compiler_messages::compiler_errors;

    pub mod template_tree;
    pub mod text_location;
}

pub mod backends {
    pub mod js;
}

pub use backends::js::expr_computability::ExprComputability;
pub use backends::js::gen_js_exprs::GenJsExprs;
pub use backends::js::js_code_builder::JsCodeBuilder;
pub use backends::js::js_expr::{BinaryOp, JsExpr, Precedence, UnaryOp};
pub use backends::js::js_imports::{ExternSymbol, ExternSymbolKind, ImportRequirement, JsImports};
pub use backends::js::legacy_expr::{LocalVariableNames, translate_legacy_expr};
pub use backends::js::velog::LoggingAttributeCall;
pub use compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey, ErrorType};
pub use settings::{BidiGlobalDir, CodeStyle, JsSrcOptions, ModuleStyle};
