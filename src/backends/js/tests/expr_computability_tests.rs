use super::*;
use crate::backends::js::js_imports::{ExternSymbol, ExternSymbolKind};
use crate::compiler_frontend::template_tree::{
    CallData, CallNode, CallParamContentNode, CallParamValueNode, ForRangeNode, ForeachNode,
    IfBranch, IfNode, LetNode, LogNode, MsgDefNode, MsgPlaceholderNode, MsgRefNode, NodeId,
    PluginCallNode, PrintNode, RawTextNode, SwitchCase, SwitchNode, TemplateExpr,
};
use crate::compiler_frontend::text_location::TextLocation;
use std::rc::Rc;

fn expr(source: &str) -> TemplateExpr {
    TemplateExpr::new(source, TextLocation::new_just_line(0))
}

fn text(value: &str) -> TemplateNode {
    TemplateNode::RawText(RawTextNode {
        id: NodeId(0),
        text: value.to_owned(),
    })
}

fn print(source: &str) -> TemplateNode {
    TemplateNode::Print(PrintNode {
        id: NodeId(0),
        expr: expr(source),
    })
}

fn let_node() -> TemplateNode {
    TemplateNode::Let(LetNode {
        id: NodeId(0),
        var_name: "tmp".to_owned(),
        value: LetValue::Expr(expr("1")),
    })
}

fn if_node(branches: Vec<(&str, Vec<TemplateNode>)>, else_branch: Option<Vec<TemplateNode>>) -> TemplateNode {
    TemplateNode::If(IfNode {
        id: NodeId(0),
        branches: branches
            .into_iter()
            .map(|(condition, children)| IfBranch {
                condition: expr(condition),
                children,
            })
            .collect(),
        else_branch,
    })
}

fn for_range(body: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::ForRange(ForRangeNode {
        id: NodeId(0),
        var_name: "i".to_owned(),
        start: None,
        end: expr("4"),
        step: None,
        body,
    })
}

fn call(params: Vec<CallParam>) -> TemplateNode {
    TemplateNode::Call(CallNode {
        id: NodeId(0),
        callee: "some.func".to_owned(),
        data: CallData::None,
        params,
    })
}

fn content_param(children: Vec<TemplateNode>) -> CallParam {
    CallParam::Content(CallParamContentNode {
        id: NodeId(5),
        key: "goo".to_owned(),
        children,
    })
}

fn concat() -> ExprComputability {
    ExprComputability::new(CodeStyle::Concat)
}

fn builder() -> ExprComputability {
    ExprComputability::new(CodeStyle::StringBuilder)
}

#[test]
fn text_and_prints_are_computable() {
    assert!(concat().is_computable_as_js_expr(&text("Blah")));
    assert!(concat().is_computable_as_js_expr(&print("$boo.foo")));
    assert!(builder().is_computable_as_js_expr(&print("$boo.foo")));
}

#[test]
fn statement_nodes_are_never_computable() {
    for style in [CodeStyle::Concat, CodeStyle::StringBuilder] {
        let classifier = ExprComputability::new(style);

        assert!(!classifier.is_computable_as_js_expr(&let_node()));
        assert!(!classifier.is_computable_as_js_expr(&TemplateNode::Debugger(NodeId(1))));
        assert!(!classifier.is_computable_as_js_expr(&TemplateNode::Log(LogNode {
            id: NodeId(1),
            children: vec![text("logged")],
        })));
    }
}

#[test]
fn conditional_with_single_node_branches_is_computable() {
    let node = if_node(
        vec![
            ("$boo", vec![text("Blah")]),
            ("not $goo", vec![text("Bleh")]),
        ],
        Some(vec![text("Bluh")]),
    );

    assert!(concat().is_computable_as_js_expr(&node));
}

#[test]
fn conditional_branches_with_adjacent_text_reduce_to_one_node() {
    let node = if_node(vec![("$boo", vec![text("Bl"), text("ah")])], None);

    assert!(concat().is_computable_as_js_expr(&node));
}

#[test]
fn conditional_containing_multi_node_loop_is_not_computable() {
    let loop_node = for_range(vec![text("a"), print("$i"), text("b")]);
    let node = if_node(vec![("$boo", vec![loop_node])], Some(vec![text("Bluh")]));

    assert!(!concat().is_computable_as_js_expr(&node));
}

#[test]
fn conditional_branch_with_two_prints_is_not_computable() {
    let node = if_node(vec![("$boo", vec![print("$a"), print("$b")])], None);

    assert!(!concat().is_computable_as_js_expr(&node));
}

#[test]
fn conditional_containing_let_is_not_computable() {
    let node = if_node(vec![("$boo", vec![let_node()])], None);

    assert!(!concat().is_computable_as_js_expr(&node));
}

#[test]
fn switch_and_foreach_follow_branch_rule() {
    let switch = TemplateNode::Switch(SwitchNode {
        id: NodeId(0),
        expr: expr("$x"),
        cases: vec![SwitchCase {
            exprs: vec![expr("1"), expr("2")],
            children: vec![text("small")],
        }],
        default: Some(vec![print("$x")]),
    });
    assert!(concat().is_computable_as_js_expr(&switch));

    let foreach = TemplateNode::Foreach(ForeachNode {
        id: NodeId(0),
        var_name: "item".to_owned(),
        list: expr("$items"),
        body: vec![print("$item")],
        if_empty: Some(vec![text("none"), print("$a")]),
    });
    assert!(!concat().is_computable_as_js_expr(&foreach));
}

#[test]
fn calls_depend_on_code_style() {
    let node = call(vec![content_param(vec![let_node(), print("$a")])]);

    assert!(concat().is_computable_as_js_expr(&node));
    assert!(!builder().is_computable_as_js_expr(&node));
    assert!(concat().can_initialize_output_var(&node));
    assert!(!builder().can_initialize_output_var(&node));
}

#[test]
fn call_params_follow_their_content() {
    let value = CallParam::Value(CallParamValueNode {
        id: NodeId(3),
        key: "boo".to_owned(),
        value: expr("$x + 1"),
    });
    assert!(concat().is_call_param_computable(&value));

    assert!(concat().is_call_param_computable(&content_param(vec![text("a"), print("$b")])));
    assert!(!concat().is_call_param_computable(&content_param(vec![let_node()])));
}

#[test]
fn message_references_follow_their_definition() {
    let computable = Rc::new(MsgDefNode {
        id: NodeId(1),
        msg_var_name: "MSG_UNNAMED_1".to_owned(),
        parts: vec![
            text("Hello "),
            TemplateNode::MsgPlaceholder(MsgPlaceholderNode {
                id: NodeId(2),
                name: "NAME".to_owned(),
                children: vec![print("$name")],
            }),
        ],
    });
    let msg_ref = TemplateNode::MsgRef(MsgRefNode {
        id: NodeId(3),
        definition: computable,
    });
    assert!(concat().is_computable_as_js_expr(&msg_ref));

    let not_computable = Rc::new(MsgDefNode {
        id: NodeId(4),
        msg_var_name: "MSG_UNNAMED_4".to_owned(),
        parts: vec![TemplateNode::MsgPlaceholder(MsgPlaceholderNode {
            id: NodeId(5),
            name: "X".to_owned(),
            children: vec![let_node()],
        })],
    });
    let msg_ref = TemplateNode::MsgRef(MsgRefNode {
        id: NodeId(6),
        definition: not_computable.clone(),
    });
    assert!(!concat().is_computable_as_js_expr(&msg_ref));
    assert!(!concat().is_computable_as_js_expr(&TemplateNode::MsgDef(not_computable)));
}

#[test]
fn html_tags_with_one_print_are_computable() {
    let single = TemplateNode::MsgHtmlTag(MsgHtmlTagNode {
        id: NodeId(1),
        children: vec![print("$tag")],
    });
    assert!(concat().is_computable_as_js_expr(&single));

    let mixed = TemplateNode::MsgHtmlTag(MsgHtmlTagNode {
        id: NodeId(2),
        children: vec![text("<a href=\""), print("$url"), let_node()],
    });
    assert!(!concat().is_computable_as_js_expr(&mixed));
}

#[test]
fn plugin_calls_follow_declared_capability() {
    let mut plugin = PluginCallNode {
        id: NodeId(1),
        function: ExternSymbol::new("goog.string", "goog.string.trim", ExternSymbolKind::NamespaceFunction),
        args: vec![expr("$s")],
        capability: PluginCapability::InlineExpression,
    };
    assert!(concat().is_computable_as_js_expr(&TemplateNode::PluginCall(plugin.clone())));

    plugin.capability = PluginCapability::RequiresStatements;
    assert!(!concat().is_computable_as_js_expr(&TemplateNode::PluginCall(plugin)));
}

#[test]
fn empty_container_needs_explicit_init() {
    assert!(concat().block_needs_explicit_init(&[]));
    assert!(concat().block_needs_explicit_init(&[text("")]));
    assert!(concat().needs_explicit_init(&TemplateNode::CallParam(content_param(Vec::new()))));
}

#[test]
fn first_child_decides_initialization_not_the_whole_block() {
    let children = vec![text("Hello"), let_node(), print("$name")];

    assert!(!concat().block_needs_explicit_init(&children));
    assert!(!concat().is_call_param_computable(&content_param(children)));
}

#[test]
fn block_starting_with_statement_needs_explicit_init() {
    assert!(concat().block_needs_explicit_init(&[let_node(), print("$a")]));
    assert!(concat().needs_explicit_init(&let_node()));
}

#[test]
fn call_first_child_needs_init_only_for_string_builder() {
    let children = vec![call(Vec::new()), text("after")];

    assert!(!concat().block_needs_explicit_init(&children));
    assert!(builder().block_needs_explicit_init(&children));
}

#[test]
fn control_flow_first_child_counts_as_one_contribution() {
    let computable_if = if_node(vec![("$a", vec![text("x")])], None);
    let statement_if = if_node(vec![("$a", vec![let_node()])], None);

    assert!(!concat().block_needs_explicit_init(&[computable_if, print("$b")]));
    assert!(concat().block_needs_explicit_init(&[statement_if, print("$b")]));
}
