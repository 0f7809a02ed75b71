//! Expression generation for subtrees that can be written as JavaScript expressions.
//!
//! Callers ask `ExprComputability` first. Asking for the expressions of a node that isn't
//! computable is a bug in the caller and reported as a compiler error.

use crate::backends::js::expr_computability::ExprComputability;
use crate::backends::js::js_expr::{BinaryOp, JsExpr};
use crate::backends::js::js_imports::{ExternSymbol, ExternSymbolKind, JsImports};
use crate::backends::js::legacy_expr::{LocalVariableNames, SpecialFunction, translate_legacy_expr};
use crate::backends::js::velog::LoggingAttributeCall;
use crate::codegen_log;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::template_tree::{
    CallData, CallNode, CallParam, CallParamContentNode, ForRangeNode, ForeachNode, IfNode,
    LoggingAttributeNode, SwitchNode, TemplateExpr, TemplateNode, reduce_block,
};
use crate::return_compiler_error;
use crate::settings::{
    ASSIGN_DEFAULTS_FN, DATA_ROOT_NAME, INJECTED_DATA_NAME, JsSrcOptions, RANGE_NAMESPACE,
};

pub struct GenJsExprs<'a> {
    computability: ExprComputability,
    locals: &'a mut LocalVariableNames,
    imports: &'a mut JsImports,
}

impl<'a> GenJsExprs<'a> {
    pub fn new(
        options: &JsSrcOptions,
        locals: &'a mut LocalVariableNames,
        imports: &'a mut JsImports,
    ) -> Self {
        Self {
            computability: ExprComputability::new(options.code_style),
            locals,
            imports,
        }
    }

    /// The expressions that make up the output of `node`, in output order.
    pub fn exprs_for(&mut self, node: &TemplateNode) -> Result<Vec<JsExpr>, CompilerError> {
        if !self.computability.is_computable_as_js_expr(node) {
            return_compiler_error!(
                "JavaScript backend: node {} can't be generated as an expression",
                node.id().0
            );
        }

        match node {
            TemplateNode::RawText(text) => {
                if text.text.is_empty() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![JsExpr::string_literal(&text.text)])
                }
            }
            TemplateNode::Print(print) => Ok(vec![self.translate(&print.expr)?]),

            TemplateNode::MsgRef(msg_ref) => {
                Ok(vec![JsExpr::id(msg_ref.definition.msg_var_name.as_str())])
            }
            TemplateNode::MsgPlaceholder(placeholder) => {
                self.exprs_for_block(&placeholder.children)
            }
            TemplateNode::MsgHtmlTag(tag) => self.exprs_for_block(&tag.children),

            TemplateNode::If(if_node) => Ok(vec![self.gen_if(if_node)?]),
            TemplateNode::Switch(switch) => Ok(vec![self.gen_switch(switch)?]),
            TemplateNode::Foreach(foreach) => Ok(vec![self.gen_foreach(foreach)?]),
            TemplateNode::ForRange(for_range) => Ok(vec![self.gen_for_range(for_range)?]),

            TemplateNode::Call(call) => Ok(vec![self.gen_call(call)?]),
            TemplateNode::CallParam(param) => Ok(vec![self.gen_param_value(param)?]),

            TemplateNode::PluginCall(plugin) => {
                let args = plugin
                    .args
                    .iter()
                    .map(|arg| self.translate(arg))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(vec![self.call_extern(&plugin.function, args)?])
            }
            TemplateNode::LoggingAttribute(attribute) => {
                Ok(vec![self.gen_logging_attribute(attribute)?])
            }

            TemplateNode::MsgDef(_)
            | TemplateNode::Let(_)
            | TemplateNode::Log(_)
            | TemplateNode::Debugger(_) => {
                return_compiler_error!(
                    "JavaScript backend: node {} has no expression form",
                    node.id().0
                )
            }
        }
    }

    /// The expressions of every node in a block, after merging adjacent text.
    pub fn exprs_for_block(
        &mut self,
        children: &[TemplateNode],
    ) -> Result<Vec<JsExpr>, CompilerError> {
        let mut exprs = Vec::with_capacity(children.len());

        for child in reduce_block(children) {
            exprs.extend(self.exprs_for(&child)?);
        }

        Ok(exprs)
    }

    /// A block as one expression. An empty block is `''`.
    pub fn expr_for_block(&mut self, children: &[TemplateNode]) -> Result<JsExpr, CompilerError> {
        Ok(JsExpr::concat(self.exprs_for_block(children)?))
    }

    fn translate(&self, expr: &TemplateExpr) -> Result<JsExpr, CompilerError> {
        translate_legacy_expr(expr, &*self.locals)
    }

    /// Locals and import aliases share the file's scope, so neither may take the other's name.
    fn declare_local(&mut self, raw: &str) -> String {
        let name = self.locals.declare_local(raw);
        self.imports.reserve_identifier(&name);
        name
    }

    fn call_extern(
        &mut self,
        symbol: &ExternSymbol,
        args: Vec<JsExpr>,
    ) -> Result<JsExpr, CompilerError> {
        let call = self.imports.call(symbol, args)?;
        let alias = &self.imports.require(&symbol.owning_path).alias;
        self.locals.reserve_identifier(alias);
        Ok(call)
    }

    fn optional_block(
        &mut self,
        children: Option<&Vec<TemplateNode>>,
    ) -> Result<JsExpr, CompilerError> {
        match children {
            Some(children) => self.expr_for_block(children),
            None => Ok(JsExpr::empty_string()),
        }
    }

    // CONTROL FLOW

    fn gen_if(&mut self, if_node: &IfNode) -> Result<JsExpr, CompilerError> {
        let mut result = self.optional_block(if_node.else_branch.as_ref())?;

        for branch in if_node.branches.iter().rev() {
            let condition = self.translate(&branch.condition)?;
            let then = self.expr_for_block(&branch.children)?;
            result = JsExpr::conditional(condition, then, result);
        }

        Ok(result)
    }

    fn gen_switch(&mut self, switch: &SwitchNode) -> Result<JsExpr, CompilerError> {
        let switch_value = self.translate(&switch.expr)?;
        let mut result = self.optional_block(switch.default.as_ref())?;

        for case in switch.cases.iter().rev() {
            let mut condition: Option<JsExpr> = None;

            for case_expr in &case.exprs {
                let test = switch_value.clone().double_equals(self.translate(case_expr)?);
                condition = Some(match condition {
                    Some(previous) => previous.or(test),
                    None => test,
                });
            }

            let Some(condition) = condition else {
                return_compiler_error!(
                    "JavaScript backend: switch {} has a case with no values",
                    switch.id.0
                );
            };

            let then = self.expr_for_block(&case.children)?;
            result = JsExpr::conditional(condition, then, result);
        }

        Ok(result)
    }

    /// `list.map((item, itemIndex) => body).join('')`
    fn gen_foreach(&mut self, foreach: &ForeachNode) -> Result<JsExpr, CompilerError> {
        let list = self.translate(&foreach.list)?;
        let item_var = self.declare_local(&foreach.var_name);
        let index_var = self.declare_local(&format!("{}Index", foreach.var_name));

        codegen_log!("Foreach over ", list, " as ", item_var);

        let index = JsExpr::id(index_var.as_str());
        let last_index = JsExpr::combine(
            list.clone().dot_access("length"),
            BinaryOp::Minus,
            JsExpr::number(1),
        );

        self.locals.enter_scope();
        self.locals
            .add_translation(&foreach.var_name, JsExpr::id(item_var.as_str()));
        self.locals.add_special_function(
            &foreach.var_name,
            SpecialFunction::IsFirst,
            index.clone().double_equals(JsExpr::number(0)),
        );
        self.locals.add_special_function(
            &foreach.var_name,
            SpecialFunction::IsLast,
            index.clone().double_equals(last_index),
        );
        self.locals
            .add_special_function(&foreach.var_name, SpecialFunction::Index, index);

        let body = self.expr_for_block(&foreach.body);
        self.locals.exit_scope();
        let body = body?;

        let mapped = list
            .clone()
            .method_call(
                "map",
                [JsExpr::arrow_function(&[item_var.as_str(), index_var.as_str()], body)],
            )
            .method_call("join", [JsExpr::empty_string()]);

        match &foreach.if_empty {
            Some(if_empty) => {
                let empty = self.expr_for_block(if_empty)?;
                Ok(JsExpr::conditional(list.dot_access("length"), mapped, empty))
            }
            None => Ok(mapped),
        }
    }

    /// `goog.array.range(start, end, step).map((i) => body).join('')`
    fn gen_for_range(&mut self, for_range: &ForRangeNode) -> Result<JsExpr, CompilerError> {
        let end = self.translate(&for_range.end)?;
        let start = match &for_range.start {
            Some(start) => Some(self.translate(start)?),
            None => None,
        };
        let step = match &for_range.step {
            Some(step) => Some(self.translate(step)?),
            None => None,
        };

        // With a single argument the range function treats it as the end
        let args = match (start, step) {
            (None, None) => vec![end],
            (Some(start), None) => vec![start, end],
            (start, Some(step)) => vec![start.unwrap_or_else(|| JsExpr::number(0)), end, step],
        };

        let range_fn = ExternSymbol::new(
            RANGE_NAMESPACE,
            format!("{}.range", RANGE_NAMESPACE),
            ExternSymbolKind::NamespaceFunction,
        );
        let range = self.call_extern(&range_fn, args)?;

        let var = self.declare_local(&for_range.var_name);
        self.locals.enter_scope();
        self.locals
            .add_translation(&for_range.var_name, JsExpr::id(var.as_str()));
        let body = self.expr_for_block(&for_range.body);
        self.locals.exit_scope();

        Ok(range
            .method_call("map", [JsExpr::arrow_function(&[var.as_str()], body?)])
            .method_call("join", [JsExpr::empty_string()]))
    }

    // CALLS

    /// `callee(data, null, opt_ijData)`
    fn gen_call(&mut self, call: &CallNode) -> Result<JsExpr, CompilerError> {
        let data = self.gen_call_data(call)?;

        codegen_log!("Call to ", call.callee, " with data ", data);

        Ok(JsExpr::dotted_id(call.callee.as_str()).call([
            data,
            JsExpr::null(),
            JsExpr::id(INJECTED_DATA_NAME),
        ]))
    }

    fn gen_call_data(&mut self, call: &CallNode) -> Result<JsExpr, CompilerError> {
        let base = match &call.data {
            CallData::None => None,
            CallData::All => Some(JsExpr::id(DATA_ROOT_NAME)),
            CallData::Expr(expr) => Some(self.translate(expr)?),
        };

        if call.params.is_empty() {
            return Ok(base.unwrap_or_else(JsExpr::null));
        }

        let mut entries = Vec::with_capacity(call.params.len());
        for param in &call.params {
            entries.push((param.key().to_owned(), self.gen_param_value(param)?));
        }
        let params = JsExpr::object_literal(entries);

        Ok(match base {
            Some(base) => JsExpr::dotted_id(ASSIGN_DEFAULTS_FN).call([params, base]),
            None => params,
        })
    }

    fn gen_param_value(&mut self, param: &CallParam) -> Result<JsExpr, CompilerError> {
        match param {
            CallParam::Value(value) => self.translate(&value.value),
            CallParam::Content(content) => self.gen_param_content(content),
        }
    }

    /// Content params are strings. Content that needs statements was rendered into its
    /// own variable before the call.
    fn gen_param_content(&mut self, content: &CallParamContentNode) -> Result<JsExpr, CompilerError> {
        if !self.computability.are_children_computable(&content.children) {
            return Ok(JsExpr::id(content.pre_rendered_var_name()));
        }

        let parts = self.exprs_for_block(&content.children)?;
        Ok(JsExpr::concat_force_string(parts))
    }

    fn gen_logging_attribute(
        &mut self,
        attribute: &LoggingAttributeNode,
    ) -> Result<JsExpr, CompilerError> {
        let mut call = LoggingAttributeCall::new(JsExpr::number(attribute.logging_id));

        if let Some(data) = &attribute.data {
            call = call.with_data(self.translate(data)?);
        }
        if let Some(log_only) = &attribute.log_only {
            call = call.with_log_only(self.translate(log_only)?);
        }

        Ok(call.build())
    }
}

#[cfg(test)]
#[path = "tests/gen_js_exprs_tests.rs"]
mod gen_js_exprs_tests;
