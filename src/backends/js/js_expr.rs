//! Precedence-tagged JavaScript expressions.
//!
//! Every expression carries the binding strength of its outermost operator, so composing
//! two expressions only adds the parentheses JavaScript actually needs.

use std::borrow::Cow;
use std::fmt;

/// Binding strength of the outermost operator of an expression, using JavaScript's own
/// precedence levels. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precedence(u8);

impl Precedence {
    /// Comma expressions and unchecked code whose structure is unknown.
    pub const LOWEST: Precedence = Precedence(0);
    /// Ternary conditionals and arrow functions.
    pub const CONDITIONAL: Precedence = Precedence(1);
    pub const OR: Precedence = Precedence(2);
    pub const AND: Precedence = Precedence(3);
    pub const EQUALITY: Precedence = Precedence(4);
    pub const RELATIONAL: Precedence = Precedence(5);
    pub const ADDITIVE: Precedence = Precedence(6);
    pub const MULTIPLICATIVE: Precedence = Precedence(7);
    pub const UNARY: Precedence = Precedence(8);
    /// Literals, identifiers, member access, calls and anything already parenthesized.
    pub const ATOMIC: Precedence = Precedence(u8::MAX);

    pub fn is_atomic(self) -> bool {
        self == Precedence::ATOMIC
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

struct OperatorInfo {
    token: &'static str,
    precedence: Precedence,
}

// Indexed by `BinaryOp as usize`, keep in declaration order
static BINARY_OPERATORS: [OperatorInfo; 13] = [
    OperatorInfo { token: "||", precedence: Precedence::OR },
    OperatorInfo { token: "&&", precedence: Precedence::AND },
    OperatorInfo { token: "==", precedence: Precedence::EQUALITY },
    OperatorInfo { token: "!=", precedence: Precedence::EQUALITY },
    OperatorInfo { token: "<", precedence: Precedence::RELATIONAL },
    OperatorInfo { token: ">", precedence: Precedence::RELATIONAL },
    OperatorInfo { token: "<=", precedence: Precedence::RELATIONAL },
    OperatorInfo { token: ">=", precedence: Precedence::RELATIONAL },
    OperatorInfo { token: "+", precedence: Precedence::ADDITIVE },
    OperatorInfo { token: "-", precedence: Precedence::ADDITIVE },
    OperatorInfo { token: "*", precedence: Precedence::MULTIPLICATIVE },
    OperatorInfo { token: "/", precedence: Precedence::MULTIPLICATIVE },
    OperatorInfo { token: "%", precedence: Precedence::MULTIPLICATIVE },
];

impl BinaryOp {
    pub const ALL: [BinaryOp; 13] = [
        BinaryOp::Or,
        BinaryOp::And,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::LessThan,
        BinaryOp::GreaterThan,
        BinaryOp::LessThanOrEqual,
        BinaryOp::GreaterThanOrEqual,
        BinaryOp::Plus,
        BinaryOp::Minus,
        BinaryOp::Times,
        BinaryOp::Divide,
        BinaryOp::Modulo,
    ];

    fn info(self) -> &'static OperatorInfo {
        &BINARY_OPERATORS[self as usize]
    }

    pub fn token(self) -> &'static str {
        self.info().token
    }

    pub fn precedence(self) -> Precedence {
        self.info().precedence
    }

    pub fn from_token(token: &str) -> Option<BinaryOp> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negative,
}

impl UnaryOp {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negative => "-",
        }
    }
}

/// A fragment of JavaScript plus the precedence of its outermost operator.
///
/// The text is a complete expression. Values are immutable once built; every
/// composition returns a new expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsExpr {
    pub value: String,
    pub precedence: Precedence,

    // Unescaped contents when this is exactly one string literal
    literal: Option<String>,
}

impl JsExpr {
    pub fn new(value: impl Into<String>, precedence: Precedence) -> Self {
        Self {
            value: value.into(),
            precedence,
            literal: None,
        }
    }

    /// Code that is never inspected. It gets the lowest precedence so that any use of it
    /// as an operand is parenthesized.
    pub fn unchecked(value: impl Into<String>) -> Self {
        Self::new(value, Precedence::LOWEST)
    }

    /// A plain identifier such as `opt_data` or `output`.
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name, Precedence::ATOMIC)
    }

    /// A dotted global name such as `soy.$$IS_LOCALE_RTL`.
    pub fn dotted_id(name: impl Into<String>) -> Self {
        Self::new(name, Precedence::ATOMIC)
    }

    pub fn string_literal(value: &str) -> Self {
        Self {
            value: escape_js_string(value),
            precedence: Precedence::ATOMIC,
            literal: Some(value.to_owned()),
        }
    }

    pub fn empty_string() -> Self {
        Self::string_literal("")
    }

    pub fn number(value: i64) -> Self {
        if value < 0 {
            Self::new(value.to_string(), Precedence::UNARY)
        } else {
            Self::new(value.to_string(), Precedence::ATOMIC)
        }
    }

    pub fn float(value: f64) -> Self {
        if value.is_nan() {
            Self::id("NaN")
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                Self::id("Infinity")
            } else {
                Self::new("-Infinity", Precedence::UNARY)
            }
        } else if value.is_sign_negative() {
            Self::new(value.to_string(), Precedence::UNARY)
        } else {
            Self::new(value.to_string(), Precedence::ATOMIC)
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::id(if value { "true" } else { "false" })
    }

    pub fn null() -> Self {
        Self::id("null")
    }

    /// The raw contents if this expression is a single string literal.
    pub fn as_string_literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    pub fn is_string_literal(&self) -> bool {
        self.literal.is_some()
    }

    /// Joins two operands with a binary operator.
    ///
    /// The left operand is parenthesized when it binds looser than the operator, the right
    /// operand when it binds looser or equally, which keeps left-associative chains
    /// flat while preserving the tree for anything else.
    ///
    /// ```ignore
    /// let a_minus_b = JsExpr::combine(JsExpr::id("a"), BinaryOp::Minus, JsExpr::id("b"));
    /// let sum = JsExpr::combine(JsExpr::id("x"), BinaryOp::Plus, a_minus_b);
    /// assert_eq!(sum.value, "x + (a - b)");
    /// ```
    pub fn combine(left: JsExpr, op: BinaryOp, right: JsExpr) -> JsExpr {
        let precedence = op.precedence();
        let left_needs_parens = left.precedence < precedence;
        let right_needs_parens = right.precedence <= precedence;

        JsExpr::new(
            format!(
                "{} {} {}",
                left.operand_text(left_needs_parens),
                op.token(),
                right.operand_text(right_needs_parens)
            ),
            precedence,
        )
    }

    pub fn plus(self, other: JsExpr) -> JsExpr {
        JsExpr::combine(self, BinaryOp::Plus, other)
    }

    pub fn and(self, other: JsExpr) -> JsExpr {
        JsExpr::combine(self, BinaryOp::And, other)
    }

    pub fn or(self, other: JsExpr) -> JsExpr {
        JsExpr::combine(self, BinaryOp::Or, other)
    }

    pub fn double_equals(self, other: JsExpr) -> JsExpr {
        JsExpr::combine(self, BinaryOp::Equal, other)
    }

    pub fn is_null(self) -> JsExpr {
        JsExpr::combine(self, BinaryOp::Equal, JsExpr::null())
    }

    pub fn is_non_null(self) -> JsExpr {
        JsExpr::combine(self, BinaryOp::NotEqual, JsExpr::null())
    }

    pub fn unary(op: UnaryOp, operand: JsExpr) -> JsExpr {
        // `- -x` must never collapse into the decrement operator
        let needs_parens = operand.precedence < Precedence::UNARY
            || (op == UnaryOp::Negative && operand.value.starts_with('-'));

        JsExpr::new(
            format!("{}{}", op.token(), operand.operand_text(needs_parens)),
            Precedence::UNARY,
        )
    }

    pub fn not(self) -> JsExpr {
        JsExpr::unary(UnaryOp::Not, self)
    }

    pub fn negate(self) -> JsExpr {
        JsExpr::unary(UnaryOp::Negative, self)
    }

    /// `condition ? then : otherwise`. Conditionals nest to the right without parentheses.
    pub fn conditional(condition: JsExpr, then: JsExpr, otherwise: JsExpr) -> JsExpr {
        let condition_parens = condition.precedence <= Precedence::CONDITIONAL;
        let then_parens = then.precedence < Precedence::CONDITIONAL;
        let otherwise_parens = otherwise.precedence < Precedence::CONDITIONAL;

        JsExpr::new(
            format!(
                "{} ? {} : {}",
                condition.operand_text(condition_parens),
                then.operand_text(then_parens),
                otherwise.operand_text(otherwise_parens)
            ),
            Precedence::CONDITIONAL,
        )
    }

    pub fn dot_access(self, field: &str) -> JsExpr {
        let needs_parens = !self.precedence.is_atomic();
        JsExpr::id(format!("{}.{}", self.operand_text(needs_parens), field))
    }

    pub fn bracket_access(self, index: JsExpr) -> JsExpr {
        let needs_parens = !self.precedence.is_atomic();
        JsExpr::id(format!(
            "{}[{}]",
            self.operand_text(needs_parens),
            index.value
        ))
    }

    pub fn call(self, args: impl IntoIterator<Item = JsExpr>) -> JsExpr {
        let needs_parens = !self.precedence.is_atomic();
        JsExpr::id(format!(
            "{}({})",
            self.operand_text(needs_parens),
            join_args(args)
        ))
    }

    pub fn method_call(self, method: &str, args: impl IntoIterator<Item = JsExpr>) -> JsExpr {
        self.dot_access(method).call(args)
    }

    /// `new Constructor(args)`
    pub fn construct(constructor: &str, args: impl IntoIterator<Item = JsExpr>) -> JsExpr {
        JsExpr::id(format!("new {}({})", constructor, join_args(args)))
    }

    /// `(param, ...) => body`
    pub fn arrow_function(params: &[&str], body: JsExpr) -> JsExpr {
        let needs_parens = body.precedence == Precedence::LOWEST || body.value.starts_with('{');
        JsExpr::new(
            format!(
                "({}) => {}",
                params.join(", "),
                body.operand_text(needs_parens)
            ),
            Precedence::CONDITIONAL,
        )
    }

    /// `{key: value, ...}`. Keys that are not plain identifiers are quoted.
    pub fn object_literal(entries: impl IntoIterator<Item = (String, JsExpr)>) -> JsExpr {
        let mut pairs = Vec::new();

        for (key, value) in entries {
            let key = if is_plain_identifier(&key) {
                key
            } else {
                escape_js_string(&key)
            };

            let needs_parens = value.precedence == Precedence::LOWEST;
            pairs.push(format!("{}: {}", key, value.operand_text(needs_parens)));
        }

        JsExpr::id(format!("{{{}}}", pairs.join(", ")))
    }

    /// Left-folds the parts with `+`. No parts yields the empty string.
    pub fn concat(parts: impl IntoIterator<Item = JsExpr>) -> JsExpr {
        let mut parts = parts.into_iter();

        let Some(first) = parts.next() else {
            return JsExpr::empty_string();
        };

        parts.fold(first, JsExpr::plus)
    }

    /// Like `concat`, but guarantees the result is a string even when every part is a number.
    /// One of the first two operands must be a string for `+` to concatenate from the start.
    pub fn concat_force_string(parts: Vec<JsExpr>) -> JsExpr {
        let starts_with_string = parts
            .iter()
            .take(2)
            .any(|part| part.is_string_literal());

        if starts_with_string {
            JsExpr::concat(parts)
        } else {
            JsExpr::concat(std::iter::once(JsExpr::empty_string()).chain(parts))
        }
    }

    pub fn coerce_to_string(self) -> JsExpr {
        if self.is_string_literal() {
            self
        } else {
            JsExpr::empty_string().plus(self)
        }
    }

    pub(crate) fn operand_text(&self, parens: bool) -> Cow<'_, str> {
        if parens {
            Cow::Owned(format!("({})", self.value))
        } else {
            Cow::Borrowed(&self.value)
        }
    }
}

impl fmt::Display for JsExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn join_args(args: impl IntoIterator<Item = JsExpr>) -> String {
    args.into_iter()
        .map(|arg| {
            let needs_parens = arg.precedence == Precedence::LOWEST;
            arg.operand_text(needs_parens).into_owned()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    (first == '_' || first == '$' || first.is_ascii_alphabetic())
        && chars.all(|ch| ch == '_' || ch == '$' || ch.is_ascii_alphanumeric())
}

/// Escapes text into a single-quoted JavaScript string literal.
///
/// Besides quotes and control characters this escapes Unicode format characters (which some
/// tools silently strip) and the `/` in `</`, so the literal is safe inside an inline script.
pub fn escape_js_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');

    let mut previous = '\0';
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '/' if previous == '<' => escaped.push_str("\\/"),
            '\u{2028}' | '\u{2029}' => push_unicode_escape(&mut escaped, ch),
            control if control.is_control() => push_unicode_escape(&mut escaped, control),
            format if is_unicode_format_char(format) => push_unicode_escape(&mut escaped, format),
            normal => escaped.push(normal),
        }
        previous = ch;
    }

    escaped.push('\'');
    escaped
}

fn push_unicode_escape(out: &mut String, ch: char) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{:04X}", unit));
    }
}

// General category Cf
fn is_unicode_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

#[cfg(test)]
#[path = "tests/js_expr_tests.rs"]
mod js_expr_tests;
