use template_jssrc::compiler_frontend::template_tree::{
    CallData, CallNode, CallParam, CallParamContentNode, ForeachNode, LetNode, LetValue,
    LoggingAttributeNode, NodeId, PluginCallNode, PluginCapability, PrintNode, RawTextNode,
    TemplateExpr, TemplateNode,
};
use template_jssrc::compiler_frontend::text_location::TextLocation;
use template_jssrc::{
    CodeStyle, CompilerError, ExprComputability, ExternSymbol, ExternSymbolKind, GenJsExprs,
    JsCodeBuilder, JsExpr, JsImports, JsSrcOptions, LocalVariableNames, ModuleStyle,
    translate_legacy_expr,
};

fn expr(source: &str) -> TemplateExpr {
    TemplateExpr::new(source, TextLocation::new_just_line(0))
}

fn text(id: u32, value: &str) -> TemplateNode {
    TemplateNode::RawText(RawTextNode {
        id: NodeId(id),
        text: value.to_owned(),
    })
}

fn print(id: u32, source: &str) -> TemplateNode {
    TemplateNode::Print(PrintNode {
        id: NodeId(id),
        expr: expr(source),
    })
}

/// The smallest statement emitter that can drive the backend. Runs of computable nodes
/// are appended in one write, `let` becomes a local declaration and string builder calls
/// become statements.
struct Emitter {
    options: JsSrcOptions,
    builder: JsCodeBuilder,
    locals: LocalVariableNames,
    imports: JsImports,
}

impl Emitter {
    fn new(options: JsSrcOptions) -> Self {
        Self {
            builder: JsCodeBuilder::new(options.code_style),
            locals: LocalVariableNames::new(),
            imports: JsImports::new(options.module_style),
            options,
        }
    }

    fn emit_block(&mut self, children: &[TemplateNode]) -> Result<(), CompilerError> {
        let computability = ExprComputability::new(self.options.code_style);
        let mut pending: Vec<JsExpr> = Vec::new();

        for child in children {
            if let TemplateNode::Call(call) = child {
                self.pre_render_params(call)?;
            }

            if computability.is_computable_as_js_expr(child) {
                let exprs = GenJsExprs::new(&self.options, &mut self.locals, &mut self.imports)
                    .exprs_for(child)?;
                pending.extend(exprs);
                continue;
            }

            self.builder
                .add_all_to_output_var(std::mem::take(&mut pending))?;

            match child {
                TemplateNode::Let(LetNode {
                    var_name,
                    value: LetValue::Expr(value),
                    ..
                }) => {
                    let value = translate_legacy_expr(value, &self.locals)?;
                    let local = self.locals.declare_local(var_name);
                    self.imports.reserve_identifier(&local);
                    self.builder
                        .append_line(&["let ", local.as_str(), " = ", value.value.as_str(), ";"]);
                    self.locals.add_translation(var_name, JsExpr::id(local.as_str()));
                }

                // String builders pass themselves to the callee
                TemplateNode::Call(call) => {
                    self.builder.init_output_var_if_necessary()?;
                    let output = self.builder.output_var_name().unwrap_or_default().to_owned();
                    let invocation = JsExpr::dotted_id(call.callee.as_str()).call([
                        JsExpr::id("opt_data"),
                        JsExpr::id(output.as_str()),
                        JsExpr::id("opt_ijData"),
                    ]);
                    self.builder.append_line(&[invocation.value.as_str(), ";"]);
                }

                _ => panic!("test emitter can't handle node {:?}", child.id()),
            }
        }

        self.builder.add_all_to_output_var(pending)
    }

    /// Renders content params that need statements into their own variables.
    fn pre_render_params(&mut self, call: &CallNode) -> Result<(), CompilerError> {
        let computability = ExprComputability::new(self.options.code_style);

        for param in &call.params {
            let CallParam::Content(content) = param else {
                continue;
            };
            if computability.is_call_param_computable(param) {
                continue;
            }

            let needs_init =
                computability.needs_explicit_init(&TemplateNode::CallParam(param.clone()));

            self.builder.push_output_var(&content.pre_rendered_var_name());
            let result = if needs_init {
                self.builder
                    .init_output_var_if_necessary()
                    .and_then(|_| self.emit_block(&content.children))
            } else {
                self.emit_block(&content.children)
            };
            self.builder.pop_output_var()?;
            result?;
        }

        Ok(())
    }

    fn render_template(
        mut self,
        name: &str,
        body: &[TemplateNode],
    ) -> Result<String, CompilerError> {
        self.builder
            .append_line(&[name, " = function(opt_data, opt_sb, opt_ijData) {"]);
        self.builder.increase_indent()?;

        self.builder.push_output_var("output");
        self.emit_block(body)?;
        self.builder.init_output_var_if_necessary()?;
        self.builder.append_line_start(&["return "]);
        self.builder.append_output_var_name()?;
        self.builder.append_line_end(&[";"]);
        self.builder.pop_output_var()?;

        self.builder.decrease_indent()?;
        self.builder.append_line(&["};"]);

        let mut file = String::new();
        for statement in self.imports.take_pending_statements() {
            file.push_str(&statement);
            file.push('\n');
        }
        file.push_str(self.builder.get_code());
        Ok(file)
    }
}

#[test]
fn concatenation_template_with_pre_rendered_param() {
    let body = vec![
        text(1, "Hello, "),
        print(2, "$name"),
        TemplateNode::PluginCall(PluginCallNode {
            id: NodeId(3),
            function: ExternSymbol::new(
                "foo.strings",
                "foo.strings.shout",
                ExternSymbolKind::ModuleFunction,
            ),
            args: vec![expr("'!'")],
            capability: PluginCapability::InlineExpression,
        }),
        TemplateNode::Call(CallNode {
            id: NodeId(4),
            callee: "ns.greeting".to_owned(),
            data: CallData::None,
            params: vec![CallParam::Content(CallParamContentNode {
                id: NodeId(7),
                key: "body".to_owned(),
                children: vec![
                    TemplateNode::Let(LetNode {
                        id: NodeId(8),
                        var_name: "x".to_owned(),
                        value: LetValue::Expr(expr("$count + 1")),
                    }),
                    print(9, "$x"),
                    text(10, " items"),
                ],
            })],
        }),
    ];

    let options = JsSrcOptions::new(CodeStyle::Concat, ModuleStyle::GoogModule);
    let file = Emitter::new(options)
        .render_template("ns.hello", &body)
        .expect("template should render");

    assert_eq!(
        file,
        "const fooStrings = goog.require('foo.strings');\n\
         ns.hello = function(opt_data, opt_sb, opt_ijData) {\n\
         \x20\x20let param7 = '';\n\
         \x20\x20let x = opt_data.count + 1;\n\
         \x20\x20param7 += x + ' items';\n\
         \x20\x20let output = 'Hello, ' + opt_data.name + fooStrings.shout('!') + ns.greeting({body: param7}, null, opt_ijData);\n\
         \x20\x20return output;\n\
         };\n"
    );
}

#[test]
fn string_builder_template_with_loop_and_logging() {
    let body = vec![
        text(1, "<div "),
        TemplateNode::LoggingAttribute(LoggingAttributeNode {
            id: NodeId(2),
            logging_id: 1,
            data: Some(expr("null")),
            log_only: None,
        }),
        text(3, ">"),
        TemplateNode::Foreach(ForeachNode {
            id: NodeId(4),
            var_name: "item".to_owned(),
            list: expr("$items"),
            body: vec![print(5, "$item")],
            if_empty: None,
        }),
        TemplateNode::Call(CallNode {
            id: NodeId(6),
            callee: "ns.footer".to_owned(),
            data: CallData::All,
            params: Vec::new(),
        }),
        text(7, "</div>"),
    ];

    let options = JsSrcOptions::new(CodeStyle::StringBuilder, ModuleStyle::GoogProvide);
    let file = Emitter::new(options)
        .render_template("ns.list", &body)
        .expect("template should render");

    assert_eq!(
        file,
        "ns.list = function(opt_data, opt_sb, opt_ijData) {\n\
         \x20\x20let output = new soy.StringBuilder('<div ', soy.velog.$$getLoggingAttribute(1, null, false), '>', opt_data.items.map((item, itemIndex) => item).join(''));\n\
         \x20\x20ns.footer(opt_data, output, opt_ijData);\n\
         \x20\x20output.append('<\\/div>');\n\
         \x20\x20return output;\n\
         };\n"
    );
}

#[test]
fn options_from_toml_drive_the_code_style() {
    let options = JsSrcOptions::from_toml_str(
        "code_style = \"string_builder\"\nmodule_style = \"goog_module\"\n",
    )
    .expect("options should parse");

    let file = Emitter::new(options)
        .render_template("ns.empty", &[])
        .expect("template should render");

    assert_eq!(
        file,
        "ns.empty = function(opt_data, opt_sb, opt_ijData) {\n\
         \x20\x20let output = new soy.StringBuilder();\n\
         \x20\x20return output;\n\
         };\n"
    );
}

#[test]
fn translation_errors_surface_with_their_location() {
    let body = vec![print(1, "$a +")];
    let options = JsSrcOptions::new(CodeStyle::Concat, ModuleStyle::GoogProvide);

    let error = Emitter::new(options)
        .render_template("ns.broken", &body)
        .expect_err("malformed expression");

    assert!(!error.is_compiler_bug());
    assert!(error.to_string().starts_with("Syntax"));
}
