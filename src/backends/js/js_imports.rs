//! Resolves references to symbols defined in other JavaScript files.
//!
//! Each reference records that its owning file must be imported, and yields the
//! expression that names the symbol under the configured module style.

use crate::backends::js::js_expr::{JsExpr, escape_js_string};
use crate::backends::js::UsedIdentifiers;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::imports_log;
use crate::return_compiler_error;
use crate::settings::{MODULE_GET_FN, ModuleStyle};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternSymbolKind {
    /// A value exported from a goog.module file.
    ModuleExport,

    /// A function exported from a goog.module file.
    ModuleFunction,

    /// A function hanging off a goog.provide namespace.
    NamespaceFunction,
}

/// A symbol defined elsewhere. `member_path` is either the full dotted name
/// (`foo.bar.baz`) or, for module exports, the name relative to the module (`baz`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternSymbol {
    pub owning_path: String,
    pub member_path: String,
    pub kind: ExternSymbolKind,
}

impl ExternSymbol {
    pub fn new(
        owning_path: impl Into<String>,
        member_path: impl Into<String>,
        kind: ExternSymbolKind,
    ) -> Self {
        Self {
            owning_path: owning_path.into(),
            member_path: member_path.into(),
            kind,
        }
    }

    /// The part of the member path below the owning path. `None` when the member is the
    /// owning file itself.
    pub fn relative_member_path(&self) -> Result<Option<&str>, CompilerError> {
        if self.owning_path.is_empty() {
            return_compiler_error!(
                "JavaScript backend: extern symbol '{}' has no owning path",
                self.member_path
            );
        }

        if self.member_path == self.owning_path {
            return Ok(None);
        }

        let nested = self
            .member_path
            .strip_prefix(self.owning_path.as_str())
            .and_then(|rest| rest.strip_prefix('.'));

        match (nested, self.kind) {
            (Some(rest), _) => Ok(Some(rest)),
            (None, ExternSymbolKind::ModuleExport | ExternSymbolKind::ModuleFunction) => {
                Ok(Some(self.member_path.as_str()))
            }
            (None, ExternSymbolKind::NamespaceFunction) => {
                return_compiler_error!(
                    "JavaScript backend: '{}' is not inside namespace '{}'",
                    self.member_path,
                    self.owning_path
                )
            }
        }
    }
}

/// One file that generated code depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequirement {
    pub owning_path: String,
    pub alias: String,
    pub emitted: bool,
}

impl ImportRequirement {
    pub fn statement(&self, module_style: ModuleStyle) -> String {
        let path = escape_js_string(&self.owning_path);

        match module_style {
            ModuleStyle::GoogModule => format!("const {} = goog.require({});", self.alias, path),
            ModuleStyle::GoogProvide => format!("goog.require({});", path),
        }
    }
}

/// The imports collected while generating one output file, in first-use order.
#[derive(Debug, Clone)]
pub struct JsImports {
    module_style: ModuleStyle,
    requirements: IndexMap<String, ImportRequirement>,
    aliases: UsedIdentifiers,
}

impl JsImports {
    pub fn new(module_style: ModuleStyle) -> Self {
        Self {
            module_style,
            requirements: IndexMap::new(),
            aliases: UsedIdentifiers::default(),
        }
    }

    /// Keeps later aliases from taking `name`, e.g. a local already bound in generated code.
    pub fn reserve_identifier(&mut self, name: &str) {
        self.aliases.reserve(name);
    }

    /// Records that `owning_path` must be imported. Requiring the same path again
    /// returns the existing requirement.
    pub fn require(&mut self, owning_path: &str) -> &ImportRequirement {
        if !self.requirements.contains_key(owning_path) {
            let alias = self
                .aliases
                .assign_unique_identifier(&alias_for_path(owning_path));

            imports_log!("New import requirement: ", owning_path, " as ", alias);

            self.requirements.insert(
                owning_path.to_owned(),
                ImportRequirement {
                    owning_path: owning_path.to_owned(),
                    alias,
                    emitted: false,
                },
            );
        }

        &self.requirements[owning_path]
    }

    /// The expression naming `symbol`, recording its import.
    pub fn reference(&mut self, symbol: &ExternSymbol) -> Result<JsExpr, CompilerError> {
        let relative = symbol.relative_member_path()?;
        let module_style = self.module_style;
        let requirement = self.require(&symbol.owning_path);

        let base = match (module_style, symbol.kind) {
            (ModuleStyle::GoogModule, _) => JsExpr::id(requirement.alias.as_str()),

            (
                ModuleStyle::GoogProvide,
                ExternSymbolKind::ModuleExport | ExternSymbolKind::ModuleFunction,
            ) => JsExpr::dotted_id(MODULE_GET_FN)
                .call(vec![JsExpr::string_literal(&symbol.owning_path)]),

            // Provided namespaces are globals once required
            (ModuleStyle::GoogProvide, ExternSymbolKind::NamespaceFunction) => {
                return Ok(JsExpr::dotted_id(symbol.member_path.as_str()));
            }
        };

        Ok(match relative {
            Some(path) => path
                .split('.')
                .fold(base, |expr, segment| expr.dot_access(segment)),
            None => base,
        })
    }

    /// A call of `symbol` with the given arguments, recording its import.
    pub fn call(
        &mut self,
        symbol: &ExternSymbol,
        args: Vec<JsExpr>,
    ) -> Result<JsExpr, CompilerError> {
        Ok(self.reference(symbol)?.call(args))
    }

    pub fn requirements(&self) -> impl Iterator<Item = &ImportRequirement> {
        self.requirements.values()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Import statements for every requirement, in first-use order.
    pub fn import_statements(&self) -> Vec<String> {
        self.requirements
            .values()
            .map(|requirement| requirement.statement(self.module_style))
            .collect()
    }

    /// Import statements not yet written out. Each is returned once.
    pub fn take_pending_statements(&mut self) -> Vec<String> {
        let module_style = self.module_style;
        let mut statements = Vec::new();

        for requirement in self.requirements.values_mut() {
            if !requirement.emitted {
                statements.push(requirement.statement(module_style));
                requirement.emitted = true;
            }
        }

        statements
    }
}

/// The local name a module-style import gets: `foo.bar` becomes `fooBar`.
pub fn alias_for_path(path: &str) -> String {
    let mut alias = String::with_capacity(path.len());

    for (index, segment) in path.split('.').filter(|s| !s.is_empty()).enumerate() {
        if index == 0 {
            alias.push_str(&segment.to_lowercase());
            continue;
        }

        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            alias.extend(first.to_uppercase());
            alias.push_str(chars.as_str());
        }
    }

    alias
}

#[cfg(test)]
#[path = "tests/js_imports_tests.rs"]
mod js_imports_tests;
