//! JavaScript backend for Closure-style templates.
//!
//! This backend does not walk whole files. It provides the pieces a template emitter is
//! built from: deciding what can be an expression, composing expressions with correct
//! precedence, tracking output variables, translating legacy expressions and resolving
//! references to other JavaScript files.

pub mod expr_computability;
pub mod gen_js_exprs;
pub mod js_code_builder;
pub mod js_expr;
pub mod js_imports;
pub mod legacy_expr;
pub mod velog;


use rustc_hash::FxHashSet;

/// JavaScript identifiers already handed out in one scope of generated code.
#[derive(Debug, Clone, Default)]
pub(crate) struct UsedIdentifiers {
    used: FxHashSet<String>,
}

impl UsedIdentifiers {
    pub(crate) fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_owned());
    }

    pub(crate) fn assign_unique_identifier(&mut self, raw: &str) -> String {
        let mut identifier = sanitize_identifier(raw);

        if is_js_reserved(&identifier) {
            identifier = format!("_{}", identifier);
        }

        let mut candidate = identifier.clone();
        let mut suffix = 1usize;

        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", identifier, suffix);
            suffix += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }
}

pub(crate) fn sanitize_identifier(raw: &str) -> String {
    let mut result = String::new();

    for (index, ch) in raw.chars().enumerate() {
        let is_valid = if index == 0 {
            ch == '_' || ch == '$' || ch.is_ascii_alphabetic()
        } else {
            ch == '_' || ch == '$' || ch.is_ascii_alphanumeric()
        };

        if is_valid {
            result.push(ch);
        } else {
            result.push('_');
        }
    }

    if result.is_empty() {
        "_value".to_owned()
    } else {
        result
    }
}

pub(crate) fn is_js_reserved(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "export"
            | "extends"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
            | "enum"
            | "implements"
            | "interface"
            | "let"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "await"
            | "undefined"
            | "null"
            | "true"
            | "false"
            | "NaN"
            | "Infinity"
            | "eval"
            | "arguments"
            // Runtime namespaces generated code reads from
            | "goog"
            | "soy"
    )
}
