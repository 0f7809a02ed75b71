//! Line-oriented JavaScript writer that tracks the output variable being built.
//!
//! Template output is accumulated into a variable named by the enclosing context. Nested
//! constructs (call params, let blocks) push a new variable, emit into it, and pop back.

use crate::backends::js::js_expr::{JsExpr, Precedence};
use crate::codegen_log;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::return_compiler_error;
use crate::settings::{
    CODE_BUFFER_CAPACITY, CodeStyle, INDENT_SIZE, MAX_INDENT, OUTPUT_VAR_STACK_CAPACITY,
    STRING_BUILDER_CONSTRUCTOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputVarState {
    /// Nothing emitted for the variable yet.
    Undeclared,

    /// Declared by an enclosing scope without a value. The first write is an assignment.
    Declared,

    Initialized,
}

#[derive(Debug, Clone)]
struct OutputVar {
    name: String,
    state: OutputVarState,
    code_style: CodeStyle,
}

#[derive(Debug)]
pub struct JsCodeBuilder {
    code: String,
    indent: usize,
    code_style: CodeStyle,
    output_vars: Vec<OutputVar>,
}

impl JsCodeBuilder {
    pub fn new(code_style: CodeStyle) -> Self {
        Self {
            code: String::with_capacity(CODE_BUFFER_CAPACITY),
            indent: 0,
            code_style,
            output_vars: Vec::with_capacity(OUTPUT_VAR_STACK_CAPACITY),
        }
    }

    pub fn code_style(&self) -> CodeStyle {
        self.code_style
    }

    pub fn get_code(&self) -> &str {
        &self.code
    }

    pub fn into_code(self) -> String {
        self.code
    }

    // INDENTATION

    pub fn increase_indent(&mut self) -> Result<(), CompilerError> {
        self.change_indent(1)
    }

    pub fn decrease_indent(&mut self) -> Result<(), CompilerError> {
        self.change_indent(-1)
    }

    fn change_indent(&mut self, levels: i32) -> Result<(), CompilerError> {
        let new_indent = self.indent as i32 + levels * INDENT_SIZE as i32;

        if new_indent < 0 || new_indent > MAX_INDENT as i32 {
            return_compiler_error!(
                "JavaScript backend: indent of {} spaces is outside 0..={}",
                new_indent,
                MAX_INDENT
            );
        }

        self.indent = new_indent as usize;
        Ok(())
    }

    /// Runs `callback` one indent level deeper, restoring the level afterwards.
    pub fn with_indent<F, T>(&mut self, callback: F) -> Result<T, CompilerError>
    where
        F: FnOnce(&mut Self) -> Result<T, CompilerError>,
    {
        self.increase_indent()?;
        let result = callback(self);
        self.decrease_indent()?;
        result
    }

    // RAW CODE

    pub fn append(&mut self, parts: &[&str]) -> &mut Self {
        for part in parts {
            self.code.push_str(part);
        }
        self
    }

    pub fn append_line_start(&mut self, parts: &[&str]) -> &mut Self {
        self.push_indent();
        self.append(parts)
    }

    pub fn append_line_end(&mut self, parts: &[&str]) -> &mut Self {
        self.append(parts);
        self.code.push('\n');
        self
    }

    pub fn append_line(&mut self, parts: &[&str]) -> &mut Self {
        self.push_indent();
        self.append_line_end(parts)
    }

    pub fn append_output_var_name(&mut self) -> Result<&mut Self, CompilerError> {
        let name = self.current_output_var("append its name")?.name.clone();
        self.code.push_str(&name);
        Ok(self)
    }

    fn push_indent(&mut self) {
        for _ in 0..self.indent {
            self.code.push(' ');
        }
    }

    // OUTPUT VARIABLE CONTEXTS

    pub fn push_output_var(&mut self, name: &str) {
        self.push_output_var_with_style(name, self.code_style);
    }

    pub fn push_output_var_with_style(&mut self, name: &str, code_style: CodeStyle) {
        codegen_log!("Pushing output var ", name);

        self.output_vars.push(OutputVar {
            name: name.to_owned(),
            state: OutputVarState::Undeclared,
            code_style,
        });
    }

    /// Drops the innermost output variable. Emits nothing.
    pub fn pop_output_var(&mut self) -> Result<(), CompilerError> {
        match self.output_vars.pop() {
            Some(_popped) => {
                codegen_log!("Popped output var ", _popped.name);
                Ok(())
            }
            None => Err(CompilerError::compiler_error(
                "JavaScript backend: popped an output variable with none in scope",
            )),
        }
    }

    /// Emits into a fresh output variable for the duration of `callback`.
    /// The variable is popped even when the callback fails.
    pub fn with_output_var<F, T>(&mut self, name: &str, callback: F) -> Result<T, CompilerError>
    where
        F: FnOnce(&mut Self) -> Result<T, CompilerError>,
    {
        self.push_output_var(name);
        let result = callback(self);
        self.pop_output_var()?;
        result
    }

    pub fn output_var_name(&self) -> Option<&str> {
        self.output_vars.last().map(|var| var.name.as_str())
    }

    pub fn output_var_state(&self) -> Option<OutputVarState> {
        self.output_vars.last().map(|var| var.state)
    }

    pub fn is_output_var_initialized(&self) -> bool {
        self.output_var_state() == Some(OutputVarState::Initialized)
    }

    /// Records that the current variable already holds a value, e.g. because the caller
    /// emitted its declaration by hand.
    pub fn set_output_var_initialized(&mut self) -> Result<(), CompilerError> {
        self.current_output_var_mut("mark it initialized")?.state = OutputVarState::Initialized;
        Ok(())
    }

    /// Records that the current variable was declared without a value in an enclosing scope.
    pub fn set_output_var_declared(&mut self) -> Result<(), CompilerError> {
        let var = self.current_output_var_mut("mark it declared")?;

        if var.state == OutputVarState::Initialized {
            return_compiler_error!(
                "JavaScript backend: output variable '{}' is already initialized",
                var.name
            );
        }

        var.state = OutputVarState::Declared;
        Ok(())
    }

    /// Emits an empty initialization for the current variable unless it already has one.
    pub fn init_output_var_if_necessary(&mut self) -> Result<(), CompilerError> {
        let var = self.current_output_var("initialize it")?.clone();

        if var.state == OutputVarState::Initialized {
            return Ok(());
        }

        let initial_value = match var.code_style {
            CodeStyle::Concat => JsExpr::empty_string(),
            CodeStyle::StringBuilder => {
                JsExpr::construct(STRING_BUILDER_CONSTRUCTOR, Vec::new())
            }
        };

        self.emit_first_assignment(&var, &initial_value);
        self.set_output_var_initialized()
    }

    pub fn append_text(&mut self, text: &str) -> Result<(), CompilerError> {
        self.add_to_output_var(JsExpr::string_literal(text))
    }

    pub fn add_to_output_var(&mut self, expr: JsExpr) -> Result<(), CompilerError> {
        self.add_all_to_output_var(vec![expr])
    }

    /// Appends the values, in order, to the current output variable. The first write
    /// to an uninitialized variable becomes its initialization.
    pub fn add_all_to_output_var(&mut self, exprs: Vec<JsExpr>) -> Result<(), CompilerError> {
        let var = self.current_output_var("append to it")?.clone();

        if exprs.is_empty() {
            return Ok(());
        }

        match (var.code_style, var.state) {
            (CodeStyle::Concat, OutputVarState::Initialized) => {
                let value = JsExpr::concat(exprs);
                let needs_parens = value.precedence == Precedence::LOWEST;
                self.append_line(&[
                    var.name.as_str(),
                    " += ",
                    &*value.operand_text(needs_parens),
                    ";",
                ]);
            }
            (CodeStyle::Concat, _) => {
                let value = JsExpr::concat_force_string(exprs);
                self.emit_first_assignment(&var, &value);
                self.set_output_var_initialized()?;
            }
            (CodeStyle::StringBuilder, OutputVarState::Initialized) => {
                let value = JsExpr::id(var.name.as_str()).method_call("append", exprs);
                self.append_line(&[value.value.as_str(), ";"]);
            }
            (CodeStyle::StringBuilder, _) => {
                let value = JsExpr::construct(STRING_BUILDER_CONSTRUCTOR, exprs);
                self.emit_first_assignment(&var, &value);
                self.set_output_var_initialized()?;
            }
        }

        Ok(())
    }

    fn emit_first_assignment(&mut self, var: &OutputVar, value: &JsExpr) {
        codegen_log!("Initializing output var ", var.name);

        match var.state {
            OutputVarState::Declared => {
                self.append_line(&[var.name.as_str(), " = ", value.value.as_str(), ";"]);
            }
            OutputVarState::Undeclared | OutputVarState::Initialized => {
                self.append_line(&["let ", var.name.as_str(), " = ", value.value.as_str(), ";"]);
            }
        }
    }

    fn current_output_var(&self, action: &str) -> Result<&OutputVar, CompilerError> {
        self.output_vars.last().ok_or_else(|| {
            CompilerError::compiler_error(format!(
                "JavaScript backend: tried to {} with no output variable in scope",
                action
            ))
        })
    }

    fn current_output_var_mut(&mut self, action: &str) -> Result<&mut OutputVar, CompilerError> {
        self.output_vars.last_mut().ok_or_else(|| {
            CompilerError::compiler_error(format!(
                "JavaScript backend: tried to {} with no output variable in scope",
                action
            ))
        })
    }
}

#[cfg(test)]
#[path = "tests/js_code_builder_tests.rs"]
mod js_code_builder_tests;
