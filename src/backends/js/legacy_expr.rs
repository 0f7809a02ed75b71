//! Translation of legacy (V1) template expressions into JavaScript.
//!
//! The legacy syntax is small: data references (`$foo.bar.0`, `$foo[$i]`), literals,
//! word operators (`not`, `and`, `or`), arithmetic and comparison operators, a ternary,
//! and the loop special functions `isFirst`, `isLast` and `index`. Expressions are parsed
//! into a tree and rebuilt with the precedence-aware combinators, so the output carries
//! exactly the parentheses JavaScript needs.

use crate::backends::js::UsedIdentifiers;
use crate::backends::js::js_expr::{BinaryOp, JsExpr, Precedence, UnaryOp};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::template_tree::TemplateExpr;
use crate::compiler_frontend::text_location::TextLocation;
use crate::settings::{DATA_ROOT_NAME, INJECTED_DATA_NAME};
use crate::{return_syntax_error, translation_log};
use rustc_hash::FxHashMap;

// Binary operator levels from loosest to tightest
const BINARY_LEVELS: [Precedence; 6] = [
    Precedence::OR,
    Precedence::AND,
    Precedence::EQUALITY,
    Precedence::RELATIONAL,
    Precedence::ADDITIVE,
    Precedence::MULTIPLICATIVE,
];

const INJECTED_DATA_ROOT: &str = "ij";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFunction {
    IsFirst,
    IsLast,
    Index,
}

impl SpecialFunction {
    fn from_name(name: &str) -> Option<SpecialFunction> {
        match name {
            "isFirst" => Some(SpecialFunction::IsFirst),
            "isLast" => Some(SpecialFunction::IsLast),
            "index" => Some(SpecialFunction::Index),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpecialFunction::IsFirst => "isFirst",
            SpecialFunction::IsLast => "isLast",
            SpecialFunction::Index => "index",
        }
    }
}

/// Local variable bindings visible to translated expressions, innermost scope last.
///
/// Loop variables map to the JavaScript expression that holds their value. Loop special
/// functions live in their own table keyed by variable and function, so no data
/// reference can spell them.
#[derive(Debug, Clone)]
pub struct LocalVariableNames {
    scopes: Vec<LocalScope>,
    used_identifiers: UsedIdentifiers,
}

#[derive(Debug, Clone, Default)]
struct LocalScope {
    variables: FxHashMap<String, JsExpr>,
    special_functions: FxHashMap<(String, SpecialFunction), JsExpr>,
}

impl Default for LocalVariableNames {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalVariableNames {
    pub fn new() -> Self {
        let mut used_identifiers = UsedIdentifiers::default();
        used_identifiers.reserve(DATA_ROOT_NAME);
        used_identifiers.reserve(INJECTED_DATA_NAME);

        Self {
            scopes: vec![LocalScope::default()],
            used_identifiers,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(LocalScope::default());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn add_translation(&mut self, key: &str, translation: JsExpr) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.variables.insert(key.to_owned(), translation);
        }
    }

    pub fn add_special_function(
        &mut self,
        var_name: &str,
        function: SpecialFunction,
        translation: JsExpr,
    ) {
        if let Some(scope) = self.scopes.last_mut() {
            scope
                .special_functions
                .insert((var_name.to_owned(), function), translation);
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsExpr> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(key))
    }

    pub fn get_special_function(
        &self,
        var_name: &str,
        function: SpecialFunction,
    ) -> Option<&JsExpr> {
        let key = (var_name.to_owned(), function);
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.special_functions.get(&key))
    }

    /// Reserves a JavaScript identifier for a local, avoiding reserved words and any name
    /// already handed out.
    pub fn declare_local(&mut self, raw: &str) -> String {
        self.used_identifiers.assign_unique_identifier(raw)
    }

    /// Keeps later locals from taking `name`, e.g. an import alias.
    pub fn reserve_identifier(&mut self, name: &str) {
        self.used_identifiers.reserve(name);
    }
}

/// Translates one legacy expression. Data references resolve through `locals` first and
/// otherwise read from `opt_data`.
pub fn translate_legacy_expr(
    expr: &TemplateExpr,
    locals: &LocalVariableNames,
) -> Result<JsExpr, CompilerError> {
    let tokens = tokenize(&expr.source, &expr.location)?;
    let mut parser = LegacyParser {
        tokens,
        position: 0,
        location: &expr.location,
    };

    let tree = parser.parse_complete()?;
    let translated = to_js(&tree, locals, &expr.location)?;

    translation_log!("Translated legacy expression: ", translated);
    Ok(translated)
}

// TOKENS

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    DataRef(String),
    Word(String),
    Int(i64),
    Float(f64),
    Str(String),
    Dot,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Question,
    Colon,
    Not,
    Op(BinaryOp),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
    length: usize,
}

fn tokenize(source: &str, location: &TextLocation) -> Result<Vec<Token>, CompilerError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut index = 0;

    while index < chars.len() {
        let start = index;
        let ch = chars[index];

        if ch.is_whitespace() {
            index += 1;
            continue;
        }

        let after_dot = matches!(tokens.last(), Some(Token { kind: TokenKind::Dot, .. }));

        let kind = match ch {
            '$' => {
                index += 1;
                let name = take_word(&chars, &mut index);
                if name.is_empty() {
                    return_syntax_error!(
                        "Expected a variable name after '$'",
                        location.sub_span(start, 1),
                        {
                            CompilationStage => "Legacy Expression Translation",
                            SuggestedInsertion => "$name",
                        }
                    );
                }
                TokenKind::DataRef(name)
            }

            c if c.is_ascii_digit() => {
                // Path segments like `$foo.0.1` are always plain integers
                let (kind, end) = lex_number(&chars, index, !after_dot, location)?;
                index = end;
                kind
            }

            c if c == '_' || c.is_alphabetic() => {
                let word = take_word(&chars, &mut index);
                match word.as_str() {
                    "not" if !after_dot => TokenKind::Not,
                    "and" if !after_dot => TokenKind::Op(BinaryOp::And),
                    "or" if !after_dot => TokenKind::Op(BinaryOp::Or),
                    _ => TokenKind::Word(word),
                }
            }

            '\'' => {
                let (value, end) = lex_string(&chars, index, location)?;
                index = end;
                TokenKind::Str(value)
            }

            '.' => {
                index += 1;
                TokenKind::Dot
            }
            '[' => {
                index += 1;
                TokenKind::OpenBracket
            }
            ']' => {
                index += 1;
                TokenKind::CloseBracket
            }
            '(' => {
                index += 1;
                TokenKind::OpenParen
            }
            ')' => {
                index += 1;
                TokenKind::CloseParen
            }
            '?' => {
                index += 1;
                TokenKind::Question
            }
            ':' => {
                index += 1;
                TokenKind::Colon
            }

            _ => {
                let two: String = chars[index..(index + 2).min(chars.len())].iter().collect();
                let one = ch.to_string();

                if let Some(op) = BinaryOp::from_token(&two).filter(|_| two.len() == 2) {
                    index += 2;
                    TokenKind::Op(op)
                } else if let Some(op) = BinaryOp::from_token(&one) {
                    index += 1;
                    TokenKind::Op(op)
                } else {
                    return_syntax_error!(
                        format!("Unexpected character '{}' in expression", ch),
                        location.sub_span(start, 1),
                        {
                            CompilationStage => "Legacy Expression Translation",
                        }
                    );
                }
            }
        };

        tokens.push(Token {
            kind,
            offset: start,
            length: index - start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: chars.len(),
        length: 1,
    });

    Ok(tokens)
}

fn take_word(chars: &[char], index: &mut usize) -> String {
    let mut word = String::new();

    while let Some(&ch) = chars.get(*index) {
        if ch == '_' || ch.is_alphanumeric() {
            word.push(ch);
            *index += 1;
        } else {
            break;
        }
    }

    word
}

fn lex_number(
    chars: &[char],
    start: usize,
    allow_fraction: bool,
    location: &TextLocation,
) -> Result<(TokenKind, usize), CompilerError> {
    let mut index = start;
    while chars.get(index).is_some_and(|ch| ch.is_ascii_digit()) {
        index += 1;
    }

    let has_fraction = allow_fraction
        && chars.get(index) == Some(&'.')
        && chars.get(index + 1).is_some_and(|ch| ch.is_ascii_digit());

    if has_fraction {
        index += 1;
        while chars.get(index).is_some_and(|ch| ch.is_ascii_digit()) {
            index += 1;
        }
    }

    let text: String = chars[start..index].iter().collect();

    if has_fraction {
        match text.parse::<f64>() {
            Ok(value) => Ok((TokenKind::Float(value), index)),
            Err(_) => return_syntax_error!(
                format!("Invalid number '{}'", text),
                location.sub_span(start, index - start)
            ),
        }
    } else {
        match text.parse::<i64>() {
            Ok(value) => Ok((TokenKind::Int(value), index)),
            Err(_) => return_syntax_error!(
                format!("Integer '{}' is too large", text),
                location.sub_span(start, index - start)
            ),
        }
    }
}

fn lex_string(
    chars: &[char],
    start: usize,
    location: &TextLocation,
) -> Result<(String, usize), CompilerError> {
    let mut value = String::new();
    let mut index = start + 1;

    while let Some(&ch) = chars.get(index) {
        match ch {
            '\'' => return Ok((value, index + 1)),
            '\\' => {
                let escaped = match chars.get(index + 1) {
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    Some('"') => '"',
                    _ => {
                        return_syntax_error!(
                            "Unknown escape sequence in string literal",
                            location.sub_span(index, 2),
                            {
                                CompilationStage => "Legacy Expression Translation",
                            }
                        );
                    }
                };
                value.push(escaped);
                index += 2;
            }
            _ => {
                value.push(ch);
                index += 1;
            }
        }
    }

    return_syntax_error!(
        "Unterminated string literal",
        location.sub_span(start, chars.len() - start),
        {
            CompilationStage => "Legacy Expression Translation",
            SuggestedInsertion => "'",
            SuggestedLocation => "at the end of the string",
        }
    )
}

// SYNTAX TREE

#[derive(Debug, Clone, PartialEq)]
enum Access {
    Field(String),
    Index(i64),
    Computed(LegacyExpr),
}

#[derive(Debug, Clone, PartialEq)]
enum LegacyExpr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DataRef {
        root: String,
        accesses: Vec<Access>,
    },
    SpecialCall {
        function: SpecialFunction,
        var_name: String,
        offset: usize,
    },
    Unary(UnaryOp, Box<LegacyExpr>),
    Binary(Box<LegacyExpr>, BinaryOp, Box<LegacyExpr>),
    Conditional(Box<LegacyExpr>, Box<LegacyExpr>, Box<LegacyExpr>),
}

struct LegacyParser<'a> {
    tokens: Vec<Token>,
    position: usize,
    location: &'a TextLocation,
}

impl LegacyParser<'_> {
    fn parse_complete(&mut self) -> Result<LegacyExpr, CompilerError> {
        let expr = self.parse_conditional()?;

        if self.peek().kind != TokenKind::Eof {
            return Err(self.unexpected("end of expression"));
        }

        Ok(expr)
    }

    fn parse_conditional(&mut self) -> Result<LegacyExpr, CompilerError> {
        let condition = self.parse_binary(0)?;

        if self.peek().kind != TokenKind::Question {
            return Ok(condition);
        }

        self.advance();
        let then = self.parse_conditional()?;
        self.expect(TokenKind::Colon, "':'")?;
        let otherwise = self.parse_conditional()?;

        Ok(LegacyExpr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn parse_binary(&mut self, level: usize) -> Result<LegacyExpr, CompilerError> {
        let Some(&level_precedence) = BINARY_LEVELS.get(level) else {
            return self.parse_unary();
        };

        let mut left = self.parse_binary(level + 1)?;

        while let TokenKind::Op(op) = self.peek().kind {
            if op.precedence() != level_precedence {
                break;
            }

            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = LegacyExpr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<LegacyExpr, CompilerError> {
        match self.peek().kind {
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(LegacyExpr::Unary(UnaryOp::Not, Box::new(operand)))
            }
            TokenKind::Op(BinaryOp::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(LegacyExpr::Unary(UnaryOp::Negative, Box::new(operand)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<LegacyExpr, CompilerError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Int(value) => Ok(LegacyExpr::Int(value)),
            TokenKind::Float(value) => Ok(LegacyExpr::Float(value)),
            TokenKind::Str(value) => Ok(LegacyExpr::Str(value)),

            TokenKind::OpenParen => {
                let inner = self.parse_conditional()?;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(inner)
            }

            TokenKind::DataRef(root) => self.parse_accesses(root),

            TokenKind::Word(word) => match word.as_str() {
                "null" => Ok(LegacyExpr::Null),
                "true" => Ok(LegacyExpr::Bool(true)),
                "false" => Ok(LegacyExpr::Bool(false)),
                _ => self.parse_function_call(&word, token.offset, token.length),
            },

            _ => Err(self.unexpected_at(&token, "an expression")),
        }
    }

    fn parse_accesses(&mut self, root: String) -> Result<LegacyExpr, CompilerError> {
        let mut accesses = Vec::new();

        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let segment = self.advance();
                    match segment.kind {
                        TokenKind::Word(name) => accesses.push(Access::Field(name)),
                        TokenKind::Int(index) => accesses.push(Access::Index(index)),
                        _ => {
                            return Err(
                                self.unexpected_at(&segment, "a field name or index after '.'")
                            );
                        }
                    }
                }
                TokenKind::OpenBracket => {
                    self.advance();
                    let index = self.parse_conditional()?;
                    self.expect(TokenKind::CloseBracket, "']'")?;
                    accesses.push(Access::Computed(index));
                }
                _ => break,
            }
        }

        Ok(LegacyExpr::DataRef { root, accesses })
    }

    fn parse_function_call(
        &mut self,
        name: &str,
        offset: usize,
        length: usize,
    ) -> Result<LegacyExpr, CompilerError> {
        let Some(function) = SpecialFunction::from_name(name) else {
            return_syntax_error!(
                format!("Unsupported function or bare word '{}' in expression", name),
                self.location.sub_span(offset, length),
                {
                    CompilationStage => "Legacy Expression Translation",
                    PrimarySuggestion => "Only isFirst, isLast and index can be called here",
                }
            );
        };

        self.expect(TokenKind::OpenParen, "'('")?;

        let argument = self.advance();
        let TokenKind::DataRef(var_name) = argument.kind.clone() else {
            return Err(self.unexpected_at(&argument, "a loop variable such as '$item'"));
        };

        self.expect(TokenKind::CloseParen, "')'")?;

        Ok(LegacyExpr::SpecialCall {
            function,
            var_name,
            offset,
        })
    }

    fn peek(&self) -> &Token {
        // The token list always ends with Eof and the parser never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, description: &str) -> Result<(), CompilerError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn unexpected(&self, expected: &str) -> CompilerError {
        self.unexpected_at(self.peek(), expected)
    }

    fn unexpected_at(&self, token: &Token, expected: &str) -> CompilerError {
        let found = match &token.kind {
            TokenKind::Eof => "end of expression".to_owned(),
            other => format!("{:?}", other),
        };

        let mut error = CompilerError::new_syntax_error(
            format!("Expected {}, found {}", expected, found),
            self.location.sub_span(token.offset, token.length),
        );
        error.new_metadata_entry(
            crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::CompilationStage,
            "Legacy Expression Translation",
        );
        error
    }
}

// TRANSLATION

fn to_js(
    expr: &LegacyExpr,
    locals: &LocalVariableNames,
    location: &TextLocation,
) -> Result<JsExpr, CompilerError> {
    let translated = match expr {
        LegacyExpr::Null => JsExpr::null(),
        LegacyExpr::Bool(value) => JsExpr::boolean(*value),
        LegacyExpr::Int(value) => JsExpr::number(*value),
        LegacyExpr::Float(value) => JsExpr::float(*value),
        LegacyExpr::Str(value) => JsExpr::string_literal(value),

        LegacyExpr::DataRef { root, accesses, .. } => {
            let mut current = match locals.get(root) {
                Some(local) => local.clone(),
                None if root == INJECTED_DATA_ROOT => JsExpr::id(INJECTED_DATA_NAME),
                None => JsExpr::id(DATA_ROOT_NAME).dot_access(root),
            };

            for access in accesses {
                current = match access {
                    Access::Field(name) => current.dot_access(name),
                    Access::Index(index) => current.bracket_access(JsExpr::number(*index)),
                    Access::Computed(index) => {
                        current.bracket_access(to_js(index, locals, location)?)
                    }
                };
            }

            current
        }

        LegacyExpr::SpecialCall {
            function,
            var_name,
            offset,
        } => match locals.get_special_function(var_name, *function) {
            Some(translation) => translation.clone(),
            None => {
                return_syntax_error!(
                    format!(
                        "{}() needs a loop variable, but '${}' is not one",
                        function.name(),
                        var_name
                    ),
                    location.sub_span(*offset, function.name().len()),
                    {
                        CompilationStage => "Legacy Expression Translation",
                    }
                );
            }
        },

        LegacyExpr::Unary(op, operand) => JsExpr::unary(*op, to_js(operand, locals, location)?),

        LegacyExpr::Binary(left, op, right) => JsExpr::combine(
            to_js(left, locals, location)?,
            *op,
            to_js(right, locals, location)?,
        ),

        LegacyExpr::Conditional(condition, then, otherwise) => JsExpr::conditional(
            to_js(condition, locals, location)?,
            to_js(then, locals, location)?,
            to_js(otherwise, locals, location)?,
        ),
    };

    Ok(translated)
}

#[cfg(test)]
#[path = "tests/legacy_expr_tests.rs"]
mod legacy_expr_tests;
