//! The parsed and checked template body handed to the JavaScript backend.
//!
//! Nodes are immutable here. Expressions are kept as the legacy expression source text
//! they were written in, plus where that text starts.

use crate::backends::js::js_imports::ExternSymbol;
use crate::compiler_frontend::text_location::TextLocation;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// An expression written in the template, not yet translated.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateExpr {
    pub source: String,
    pub location: TextLocation,
}

impl TemplateExpr {
    pub fn new(source: impl Into<String>, location: TextLocation) -> Self {
        Self {
            source: source.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    RawText(RawTextNode),
    Print(PrintNode),

    MsgDef(Rc<MsgDefNode>),
    MsgRef(MsgRefNode),
    MsgPlaceholder(MsgPlaceholderNode),
    MsgHtmlTag(MsgHtmlTagNode),

    If(IfNode),
    Switch(SwitchNode),
    Foreach(ForeachNode),
    ForRange(ForRangeNode),

    Call(CallNode),
    CallParam(CallParam),
    PluginCall(PluginCallNode),
    LoggingAttribute(LoggingAttributeNode),

    Let(LetNode),
    Log(LogNode),
    Debugger(NodeId),
}

impl TemplateNode {
    pub fn id(&self) -> NodeId {
        match self {
            TemplateNode::RawText(node) => node.id,
            TemplateNode::Print(node) => node.id,
            TemplateNode::MsgDef(node) => node.id,
            TemplateNode::MsgRef(node) => node.id,
            TemplateNode::MsgPlaceholder(node) => node.id,
            TemplateNode::MsgHtmlTag(node) => node.id,
            TemplateNode::If(node) => node.id,
            TemplateNode::Switch(node) => node.id,
            TemplateNode::Foreach(node) => node.id,
            TemplateNode::ForRange(node) => node.id,
            TemplateNode::Call(node) => node.id,
            TemplateNode::CallParam(param) => param.id(),
            TemplateNode::PluginCall(node) => node.id,
            TemplateNode::LoggingAttribute(node) => node.id,
            TemplateNode::Let(node) => node.id,
            TemplateNode::Log(node) => node.id,
            TemplateNode::Debugger(id) => *id,
        }
    }

    pub fn raw_text_content(&self) -> Option<&str> {
        match self {
            TemplateNode::RawText(node) => Some(&node.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTextNode {
    pub id: NodeId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintNode {
    pub id: NodeId,
    pub expr: TemplateExpr,
}

/// A translatable message. Its parts are raw text, placeholders and html tags.
#[derive(Debug, Clone, PartialEq)]
pub struct MsgDefNode {
    pub id: NodeId,
    pub msg_var_name: String,
    pub parts: Vec<TemplateNode>,
}

/// A use of a message defined earlier in the same template.
#[derive(Debug, Clone, PartialEq)]
pub struct MsgRefNode {
    pub id: NodeId,
    pub definition: Rc<MsgDefNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MsgPlaceholderNode {
    pub id: NodeId,
    pub name: String,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MsgHtmlTagNode {
    pub id: NodeId,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub id: NodeId,
    pub branches: Vec<IfBranch>,
    pub else_branch: Option<Vec<TemplateNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: TemplateExpr,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchNode {
    pub id: NodeId,
    pub expr: TemplateExpr,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Vec<TemplateNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub exprs: Vec<TemplateExpr>,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeachNode {
    pub id: NodeId,
    pub var_name: String,
    pub list: TemplateExpr,
    pub body: Vec<TemplateNode>,
    pub if_empty: Option<Vec<TemplateNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForRangeNode {
    pub id: NodeId,
    pub var_name: String,
    pub start: Option<TemplateExpr>,
    pub end: TemplateExpr,
    pub step: Option<TemplateExpr>,
    pub body: Vec<TemplateNode>,
}

/// What a template call passes as its data object.
#[derive(Debug, Clone, PartialEq)]
pub enum CallData {
    None,
    All,
    Expr(TemplateExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub id: NodeId,
    pub callee: String,
    pub data: CallData,
    pub params: Vec<CallParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallParam {
    Value(CallParamValueNode),
    Content(CallParamContentNode),
}

impl CallParam {
    pub fn id(&self) -> NodeId {
        match self {
            CallParam::Value(node) => node.id,
            CallParam::Content(node) => node.id,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            CallParam::Value(node) => &node.key,
            CallParam::Content(node) => &node.key,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallParamValueNode {
    pub id: NodeId,
    pub key: String,
    pub value: TemplateExpr,
}

/// A param whose value is a block of template content. When that content can't be
/// written as one expression it is rendered ahead of the call into `param<id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallParamContentNode {
    pub id: NodeId,
    pub key: String,
    pub children: Vec<TemplateNode>,
}

impl CallParamContentNode {
    pub fn pre_rendered_var_name(&self) -> String {
        format!("param{}", self.id.0)
    }
}

/// Whether a plugin function can be emitted inline or needs statements of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginCapability {
    InlineExpression,
    RequiresStatements,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginCallNode {
    pub id: NodeId,
    pub function: ExternSymbol,
    pub args: Vec<TemplateExpr>,
    pub capability: PluginCapability,
}

/// A visual element logging attribute printed inside an html tag.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingAttributeNode {
    pub id: NodeId,
    pub logging_id: i64,
    pub data: Option<TemplateExpr>,
    pub log_only: Option<TemplateExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LetValue {
    Expr(TemplateExpr),
    Content(Vec<TemplateNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetNode {
    pub id: NodeId,
    pub var_name: String,
    pub value: LetValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogNode {
    pub id: NodeId,
    pub children: Vec<TemplateNode>,
}

/// Merges adjacent raw text nodes and drops empty ones, the same way the optimizer would
/// before deciding whether a block is a single node.
pub fn reduce_block(children: &[TemplateNode]) -> Vec<TemplateNode> {
    let mut reduced: Vec<TemplateNode> = Vec::with_capacity(children.len());

    for child in children {
        if let TemplateNode::RawText(text) = child {
            if text.text.is_empty() {
                continue;
            }

            if let Some(TemplateNode::RawText(previous)) = reduced.last_mut() {
                previous.text.push_str(&text.text);
                continue;
            }
        }

        reduced.push(child.clone());
    }

    reduced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: u32, value: &str) -> TemplateNode {
        TemplateNode::RawText(RawTextNode {
            id: NodeId(id),
            text: value.to_owned(),
        })
    }

    fn print(id: u32, source: &str) -> TemplateNode {
        TemplateNode::Print(PrintNode {
            id: NodeId(id),
            expr: TemplateExpr::new(source, TextLocation::new_just_line(0)),
        })
    }

    #[test]
    fn reduce_block_merges_adjacent_text() {
        let reduced = reduce_block(&[text(1, "Hello, "), text(2, ""), text(3, "world")]);

        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].raw_text_content(), Some("Hello, world"));
        assert_eq!(reduced[0].id(), NodeId(1));
    }

    #[test]
    fn reduce_block_keeps_text_around_prints_apart() {
        let reduced = reduce_block(&[text(1, "a"), print(2, "$x"), text(3, "b"), text(4, "c")]);

        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced[2].raw_text_content(), Some("bc"));
    }

    #[test]
    fn content_params_name_their_pre_rendered_var() {
        let param = CallParamContentNode {
            id: NodeId(5),
            key: "goo".to_owned(),
            children: Vec::new(),
        };

        assert_eq!(param.pre_rendered_var_name(), "param5");
        assert_eq!(CallParam::Content(param).key(), "goo");
    }
}
