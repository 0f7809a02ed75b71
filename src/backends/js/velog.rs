//! Visual element logging attributes.
//!
//! A logged element carries an attribute computed at runtime from its logging id, its
//! optional data and whether it is only logged rather than rendered.

use crate::backends::js::js_expr::JsExpr;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::return_compiler_error;
use crate::settings::LOGGING_ATTRIBUTE_FN;

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingAttributeCall {
    pub id: JsExpr,
    pub data: Option<JsExpr>,
    pub log_only: Option<JsExpr>,
}

impl LoggingAttributeCall {
    pub fn new(id: JsExpr) -> Self {
        Self {
            id,
            data: None,
            log_only: None,
        }
    }

    pub fn with_data(mut self, data: JsExpr) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_log_only(mut self, log_only: JsExpr) -> Self {
        self.log_only = Some(log_only);
        self
    }

    /// Builds the call from positional arguments: id, then optional data and log-only.
    pub fn from_args(args: Vec<JsExpr>) -> Result<Self, CompilerError> {
        let count = args.len();
        let mut args = args.into_iter();

        let (Some(id), 1..=3) = (args.next(), count) else {
            return_compiler_error!(
                "JavaScript backend: logging attribute takes 1 to 3 arguments, got {}",
                count
            );
        };

        Ok(Self {
            id,
            data: args.next(),
            log_only: args.next(),
        })
    }

    /// `soy.velog.$$getLoggingAttribute(id, data, logOnly)` with `null` and `false`
    /// standing in for missing arguments.
    pub fn build(self) -> JsExpr {
        JsExpr::dotted_id(LOGGING_ATTRIBUTE_FN).call([
            self.id,
            self.data.unwrap_or_else(JsExpr::null),
            self.log_only.unwrap_or_else(|| JsExpr::boolean(false)),
        ])
    }
}

#[cfg(test)]
#[path = "tests/velog_tests.rs"]
mod velog_tests;
