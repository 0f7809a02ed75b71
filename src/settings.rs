use crate::backends::js::js_expr::JsExpr;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::text_location::TextLocation;
use crate::return_config_error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DATA_ROOT_NAME: &str = "opt_data";
pub const INJECTED_DATA_NAME: &str = "opt_ijData";
pub const STRING_BUILDER_CONSTRUCTOR: &str = "soy.StringBuilder";
pub const ASSIGN_DEFAULTS_FN: &str = "soy.$$assignDefaults";
pub const LOGGING_ATTRIBUTE_FN: &str = "soy.velog.$$getLoggingAttribute";
pub const IS_LOCALE_RTL: &str = "soy.$$IS_LOCALE_RTL";
pub const MODULE_GET_FN: &str = "goog.module.get";
pub const RANGE_NAMESPACE: &str = "goog.array";

pub const INDENT_SIZE: usize = 2;
pub const MAX_INDENT: usize = 20;

// Rough guesses to cut down on early reallocation of the output buffer
pub const CODE_BUFFER_CAPACITY: usize = 1024;
pub const OUTPUT_VAR_STACK_CAPACITY: usize = 8;

/// How template output is accumulated in the generated JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStyle {
    /// `output += a + b;`
    #[default]
    Concat,

    /// `output.append(a, b);`
    StringBuilder,
}

/// How cross-file symbols are brought into scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStyle {
    /// `const fooBar = goog.require('foo.bar');` then `fooBar.baz`
    GoogModule,

    /// `goog.require('foo.bar');` then `foo.bar.baz`
    #[default]
    GoogProvide,
}

/// The global text direction, either fixed at compile time or read at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidiGlobalDir {
    #[default]
    Ltr,
    Rtl,
    Dynamic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsSrcOptions {
    pub code_style: CodeStyle,
    pub module_style: ModuleStyle,
    pub bidi_global_dir: BidiGlobalDir,
}

impl JsSrcOptions {
    pub fn new(code_style: CodeStyle, module_style: ModuleStyle) -> Self {
        Self {
            code_style,
            module_style,
            bidi_global_dir: BidiGlobalDir::default(),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CompilerError> {
        match toml::from_str::<JsSrcOptions>(source) {
            Ok(options) => Ok(options),
            Err(error) => {
                let location = match error.span() {
                    Some(span) => config_location(source, span.start),
                    None => TextLocation::default(),
                };

                return_config_error!(
                    format!("Invalid JavaScript backend options: {}", error.message()),
                    location
                )
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let source = fs::read_to_string(path).map_err(|error| {
            CompilerError::file_error(path, format!("Could not read options file: {}", error))
        })?;

        Self::from_toml_str(&source).map_err(|mut error| {
            error.location.scope = path.to_path_buf();
            error
        })
    }

    /// The expression plugins receive when they ask for the global text direction.
    pub fn bidi_dir_expr(&self) -> JsExpr {
        match self.bidi_global_dir {
            BidiGlobalDir::Ltr => JsExpr::number(1),
            BidiGlobalDir::Rtl => JsExpr::number(-1),
            BidiGlobalDir::Dynamic => JsExpr::conditional(
                JsExpr::dotted_id(IS_LOCALE_RTL),
                JsExpr::number(-1),
                JsExpr::number(1),
            ),
        }
    }
}

fn config_location(source: &str, byte_offset: usize) -> TextLocation {
    let before = &source[..byte_offset.min(source.len())];
    let line = before.matches('\n').count() as i32;
    let column = before
        .rsplit('\n')
        .next()
        .map(|segment| segment.chars().count())
        .unwrap_or(0);

    let mut location = TextLocation::new_just_line(line);
    location.start_pos.char_column = column as i32;
    location
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler_frontend::compiler_errors::ErrorType;
    use std::io::Write;

    #[test]
    fn defaults_are_concat_and_provide() {
        let options = JsSrcOptions::default();

        assert_eq!(options.code_style, CodeStyle::Concat);
        assert_eq!(options.module_style, ModuleStyle::GoogProvide);
        assert_eq!(options.bidi_global_dir, BidiGlobalDir::Ltr);
    }

    #[test]
    fn parses_snake_case_options() {
        let options = JsSrcOptions::from_toml_str(
            "code_style = \"string_builder\"\nmodule_style = \"goog_module\"\nbidi_global_dir = \"dynamic\"\n",
        )
        .expect("valid options");

        assert_eq!(options.code_style, CodeStyle::StringBuilder);
        assert_eq!(options.module_style, ModuleStyle::GoogModule);
        assert_eq!(options.bidi_global_dir, BidiGlobalDir::Dynamic);
    }

    #[test]
    fn unknown_keys_are_config_errors() {
        let error = JsSrcOptions::from_toml_str("code_style = \"concat\"\nshould_inline = true\n")
            .expect_err("unknown key");

        assert_eq!(error.error_type, ErrorType::Config);
        assert!(error.msg.contains("should_inline"));
    }

    #[test]
    fn loads_options_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "module_style = \"goog_module\"").expect("write options");

        let options = JsSrcOptions::load(file.path()).expect("load options");

        assert_eq!(options.module_style, ModuleStyle::GoogModule);
        assert_eq!(options.code_style, CodeStyle::Concat);
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = JsSrcOptions::load(&dir.path().join("missing.toml")).expect_err("no file");

        assert_eq!(error.error_type, ErrorType::File);
    }

    #[test]
    fn bidi_dir_expressions() {
        let mut options = JsSrcOptions::default();
        assert_eq!(options.bidi_dir_expr().value, "1");

        options.bidi_global_dir = BidiGlobalDir::Rtl;
        assert_eq!(options.bidi_dir_expr().value, "-1");

        options.bidi_global_dir = BidiGlobalDir::Dynamic;
        assert_eq!(
            options.bidi_dir_expr().value,
            "soy.$$IS_LOCALE_RTL ? -1 : 1"
        );
    }
}
