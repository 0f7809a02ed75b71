//! Decides which template nodes can be written as a single JavaScript expression, and
//! whether an output variable can be initialized directly from a block's first node.
//!
//! Both answers are pure functions of the node and the code style. The matches are
//! exhaustive on purpose so a new node kind has to be classified before it compiles.

use crate::compiler_frontend::template_tree::{
    CallParam, LetValue, MsgHtmlTagNode, PluginCapability, TemplateNode, reduce_block,
};
use crate::settings::CodeStyle;

#[derive(Debug, Clone, Copy)]
pub struct ExprComputability {
    code_style: CodeStyle,
}

impl ExprComputability {
    pub fn new(code_style: CodeStyle) -> Self {
        Self { code_style }
    }

    pub fn code_style(&self) -> CodeStyle {
        self.code_style
    }

    pub fn is_computable_as_js_expr(&self, node: &TemplateNode) -> bool {
        match node {
            TemplateNode::RawText(_) | TemplateNode::Print(_) => true,

            TemplateNode::MsgRef(msg_ref) => self.are_children_computable(&msg_ref.definition.parts),
            TemplateNode::MsgPlaceholder(placeholder) => {
                self.are_children_computable(&placeholder.children)
            }
            TemplateNode::MsgHtmlTag(tag) => self.is_html_tag_computable(tag),

            TemplateNode::If(if_node) => {
                if_node
                    .branches
                    .iter()
                    .all(|branch| self.is_branch_computable(&branch.children))
                    && if_node
                        .else_branch
                        .as_ref()
                        .is_none_or(|children| self.is_branch_computable(children))
            }
            TemplateNode::Switch(switch) => {
                switch
                    .cases
                    .iter()
                    .all(|case| self.is_branch_computable(&case.children))
                    && switch
                        .default
                        .as_ref()
                        .is_none_or(|children| self.is_branch_computable(children))
            }
            TemplateNode::Foreach(foreach) => {
                self.is_branch_computable(&foreach.body)
                    && foreach
                        .if_empty
                        .as_ref()
                        .is_none_or(|children| self.is_branch_computable(children))
            }
            TemplateNode::ForRange(for_range) => self.is_branch_computable(&for_range.body),

            // Content params are rendered ahead of the call when needed,
            // so the call itself is always one expression when concatenating.
            TemplateNode::Call(_) => self.code_style == CodeStyle::Concat,
            TemplateNode::CallParam(param) => self.is_call_param_computable(param),

            TemplateNode::PluginCall(plugin) => {
                plugin.capability == PluginCapability::InlineExpression
            }
            TemplateNode::LoggingAttribute(_) => true,

            TemplateNode::MsgDef(_)
            | TemplateNode::Let(_)
            | TemplateNode::Log(_)
            | TemplateNode::Debugger(_) => false,
        }
    }

    pub fn are_children_computable(&self, children: &[TemplateNode]) -> bool {
        children
            .iter()
            .all(|child| self.is_computable_as_js_expr(child))
    }

    pub fn is_call_param_computable(&self, param: &CallParam) -> bool {
        match param {
            CallParam::Value(_) => true,
            CallParam::Content(content) => self.are_children_computable(&content.children),
        }
    }

    /// A control-flow branch must collapse into a single node that is itself computable.
    fn is_branch_computable(&self, children: &[TemplateNode]) -> bool {
        let reduced = reduce_block(children);

        match reduced.as_slice() {
            [] => true,
            [only] => self.is_computable_as_js_expr(only),
            _ => false,
        }
    }

    fn is_html_tag_computable(&self, tag: &MsgHtmlTagNode) -> bool {
        match tag.children.as_slice() {
            [] | [TemplateNode::Print(_)] => true,
            children => self.are_children_computable(children),
        }
    }

    /// Whether this node, as the first contribution to an output variable, can produce the
    /// variable's initial value. Control-flow nodes count as one contribution.
    pub fn can_initialize_output_var(&self, node: &TemplateNode) -> bool {
        match node {
            TemplateNode::Call(_) => self.code_style == CodeStyle::Concat,

            TemplateNode::RawText(_)
            | TemplateNode::Print(_)
            | TemplateNode::MsgRef(_)
            | TemplateNode::MsgPlaceholder(_)
            | TemplateNode::MsgHtmlTag(_)
            | TemplateNode::If(_)
            | TemplateNode::Switch(_)
            | TemplateNode::Foreach(_)
            | TemplateNode::ForRange(_)
            | TemplateNode::CallParam(_)
            | TemplateNode::PluginCall(_)
            | TemplateNode::LoggingAttribute(_) => self.is_computable_as_js_expr(node),

            TemplateNode::MsgDef(_)
            | TemplateNode::Let(_)
            | TemplateNode::Log(_)
            | TemplateNode::Debugger(_) => false,
        }
    }

    /// Whether an output variable built from this node must be declared empty before
    /// anything is appended. Container nodes are judged by their first child; any other
    /// node is its own first contribution.
    pub fn needs_explicit_init(&self, node: &TemplateNode) -> bool {
        match node {
            TemplateNode::CallParam(CallParam::Content(content)) => {
                self.block_needs_explicit_init(&content.children)
            }
            TemplateNode::Let(let_node) => match &let_node.value {
                LetValue::Content(children) => self.block_needs_explicit_init(children),
                LetValue::Expr(_) => false,
            },
            TemplateNode::Log(log) => self.block_needs_explicit_init(&log.children),
            TemplateNode::MsgPlaceholder(placeholder) => {
                self.block_needs_explicit_init(&placeholder.children)
            }
            TemplateNode::MsgHtmlTag(tag) => self.block_needs_explicit_init(&tag.children),
            _ => !self.can_initialize_output_var(node),
        }
    }

    pub fn block_needs_explicit_init(&self, children: &[TemplateNode]) -> bool {
        let first = children
            .iter()
            .find(|child| child.raw_text_content() != Some(""));

        match first {
            Some(first) => !self.can_initialize_output_var(first),
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "tests/expr_computability_tests.rs"]
mod expr_computability_tests;
