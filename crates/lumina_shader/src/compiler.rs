//! GLSL lowering of IR values, blocks and functions.
//!
//! [`ShaderValueCompiler`] turns one value into an expression plus the
//! temporaries it needs. In [`CompileMode::Default`] a typed, non-leaf,
//! non-opaque value is declared once as a temporary and its name is reused
//! for every later visit of the same [`ValueId`] within the visible scopes.
//! Values without an inferable type are always inlined.
//!
//! [`ShaderBlockCompiler`] walks statements and opens one temporary scope per
//! function body and per `if` body.

use rustc_hash::FxHashMap;

use crate::checker::ShaderTypeChecker;
use crate::ir::{BlockId, Callee, FunctionId, ShaderCodeBuilder, Statement, ValueId, ValueKind};
use crate::settings::{CompileMode, ShaderGenSettings};

/// Lowered expression plus the declarations that must precede it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledValue {
    pub pre_statements: Vec<String>,
    pub expression: String,
}

/// Where a value is written relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Full expression of a statement: never hoisted, no parentheses.
    Root,
    /// Operand of an operator or member access: parenthesized.
    Operand,
    /// Inside call arguments or brackets: no parentheses needed.
    Delimited,
}

pub struct ShaderValueCompiler<'b> {
    checker: ShaderTypeChecker<'b>,
    mode: CompileMode,
    temp_prefix: String,
    scopes: Vec<FxHashMap<ValueId, String>>,
    next_temp: usize,
}

impl<'b> ShaderValueCompiler<'b> {
    #[must_use]
    pub fn new(builder: &'b ShaderCodeBuilder, settings: &ShaderGenSettings) -> Self {
        Self {
            checker: ShaderTypeChecker::new(builder),
            mode: settings.compile_mode,
            temp_prefix: settings.temp_prefix.clone(),
            scopes: vec![FxHashMap::default()],
            next_temp: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn builder(&self) -> &'b ShaderCodeBuilder {
        self.checker.builder()
    }

    #[inline]
    pub fn checker(&mut self) -> &mut ShaderTypeChecker<'b> {
        &mut self.checker
    }

    /// Opens a scope; temporaries declared inside are forgotten on
    /// [`pop_scope`](Self::pop_scope).
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// The outermost scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Lowers `value` as a full expression. Its sub-expressions may be
    /// hoisted, the value itself is not.
    pub fn compile(&mut self, value: ValueId) -> CompiledValue {
        let mut pre_statements = Vec::new();
        let expression = self.lower(value, Position::Root, &mut pre_statements);
        CompiledValue {
            pre_statements,
            expression,
        }
    }

    /// Lowers an assignment target. The member and index chain is kept
    /// intact so the write reaches the original storage; index expressions
    /// may still be hoisted.
    pub fn compile_place(&mut self, target: ValueId) -> CompiledValue {
        let mut pre_statements = Vec::new();
        let expression = self.lower_place(target, &mut pre_statements);
        CompiledValue {
            pre_statements,
            expression,
        }
    }

    fn lookup(&self, value: ValueId) -> Option<&String> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&value))
    }

    fn member_name(&self, member: ValueId) -> String {
        let builder = self.builder();
        match builder.value(member).identifier_name() {
            Some(name) => name.to_owned(),
            None => {
                log::warn!("Member access with a non-identifier member {member:?}");
                String::new()
            }
        }
    }

    fn lower_place(&mut self, target: ValueId, pre: &mut Vec<String>) -> String {
        let builder = self.builder();
        match &builder.value(target).kind {
            ValueKind::MemberAccess { base, member } => {
                let base = self.lower_place(*base, pre);
                format!("{base}.{}", self.member_name(*member))
            }
            ValueKind::ArrayAccess { base, index } => {
                let base = self.lower_place(*base, pre);
                let index = self.lower(*index, Position::Delimited, pre);
                format!("{base}[{index}]")
            }
            _ => self.lower(target, Position::Root, pre),
        }
    }

    fn should_hoist(&mut self, value: ValueId, position: Position) -> Option<String> {
        if position == Position::Root || self.mode == CompileMode::InlineAll {
            return None;
        }
        let builder = self.builder();
        if builder.value(value).is_leaf() {
            return None;
        }
        let ty = self.checker.infer_type(value)?;
        if ty.is_opaque() {
            return None;
        }
        Some(builder.type_name(&ty).into_owned())
    }

    fn lower(&mut self, value: ValueId, position: Position, pre: &mut Vec<String>) -> String {
        if let Some(name) = self.lookup(value) {
            return name.clone();
        }

        let hoist_as = self.should_hoist(value, position);
        let bare = hoist_as.is_some() || position != Position::Operand;
        let wrap = |text: String| if bare { text } else { format!("({text})") };

        let builder = self.builder();
        let text = match &builder.value(value).kind {
            ValueKind::Literal(constant) => constant.to_glsl(),
            ValueKind::Identifier(name) => name.clone(),
            ValueKind::Call { callee, args } => {
                let name = match callee {
                    Callee::Function(id) => builder.function(*id).name.as_str(),
                    Callee::Builtin { name, .. } => name.as_str(),
                };
                let args = args
                    .iter()
                    .map(|arg| self.lower(*arg, Position::Delimited, pre))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}({args})")
            }
            ValueKind::Unary { op, operand } => {
                let operand = self.lower(*operand, Position::Operand, pre);
                // `--x` would lex as a decrement.
                if operand.starts_with('-') {
                    wrap(format!("{}({operand})", op.symbol()))
                } else {
                    wrap(format!("{}{operand}", op.symbol()))
                }
            }
            ValueKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower(*lhs, Position::Operand, pre);
                let rhs = self.lower(*rhs, Position::Operand, pre);
                wrap(format!("{lhs} {} {rhs}", op.symbol()))
            }
            ValueKind::MemberAccess { base, member } => {
                let base = self.lower(*base, Position::Operand, pre);
                format!("{base}.{}", self.member_name(*member))
            }
            ValueKind::ArrayAccess { base, index } => {
                let base = self.lower(*base, Position::Operand, pre);
                let index = self.lower(*index, Position::Delimited, pre);
                format!("{base}[{index}]")
            }
            ValueKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let condition = self.lower(*condition, Position::Operand, pre);
                let if_true = self.lower(*if_true, Position::Operand, pre);
                let if_false = self.lower(*if_false, Position::Operand, pre);
                wrap(format!("{condition} ? {if_true} : {if_false}"))
            }
        };

        let Some(type_name) = hoist_as else {
            return text;
        };
        let name = format!("{}{}", self.temp_prefix, self.next_temp);
        self.next_temp += 1;
        pre.push(format!("{type_name} {name} = {text};"));
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(value, name.clone());
        }
        name
    }
}

/// Lowers blocks and whole functions to indented GLSL.
pub struct ShaderBlockCompiler<'b> {
    values: ShaderValueCompiler<'b>,
    settings: ShaderGenSettings,
}

impl<'b> ShaderBlockCompiler<'b> {
    #[must_use]
    pub fn new(builder: &'b ShaderCodeBuilder, settings: &ShaderGenSettings) -> Self {
        Self {
            values: ShaderValueCompiler::new(builder, settings),
            settings: settings.clone(),
        }
    }

    #[inline]
    pub fn value_compiler(&mut self) -> &mut ShaderValueCompiler<'b> {
        &mut self.values
    }

    /// Statements of `block`, one per line, indented to `depth`.
    pub fn compile_block(&mut self, block: BlockId, depth: usize) -> String {
        let mut out = String::new();
        self.write_block(block, depth, &mut out);
        out
    }

    fn write_line(&self, depth: usize, line: &str, out: &mut String) {
        out.push_str(&self.settings.indent(depth));
        out.push_str(line);
        out.push('\n');
    }

    fn write_pre(&self, depth: usize, compiled: &CompiledValue, out: &mut String) {
        for line in &compiled.pre_statements {
            self.write_line(depth, line, out);
        }
    }

    fn write_block(&mut self, block: BlockId, depth: usize, out: &mut String) {
        let builder = self.values.builder();
        for statement in builder.block(block).statements() {
            match statement {
                Statement::Return(None) => self.write_line(depth, "return;", out),
                Statement::Return(Some(value)) => {
                    let value = self.values.compile(*value);
                    self.write_pre(depth, &value, out);
                    self.write_line(depth, &format!("return {};", value.expression), out);
                }
                Statement::Assignment { target, value } => {
                    let target = self.values.compile_place(*target);
                    let value = self.values.compile(*value);
                    self.write_pre(depth, &target, out);
                    self.write_pre(depth, &value, out);
                    self.write_line(
                        depth,
                        &format!("{} = {};", target.expression, value.expression),
                        out,
                    );
                }
                Statement::Call(call) => {
                    let call = self.values.compile(*call);
                    self.write_pre(depth, &call, out);
                    self.write_line(depth, &format!("{};", call.expression), out);
                }
                Statement::If { condition, block } => {
                    let condition = self.values.compile(*condition);
                    self.write_pre(depth, &condition, out);
                    self.write_line(depth, &format!("if ({}) {{", condition.expression), out);
                    self.values.push_scope();
                    self.write_block(*block, depth + 1, out);
                    self.values.pop_scope();
                    self.write_line(depth, "}", out);
                }
            }
        }
    }

    fn signature(&self, function: FunctionId) -> String {
        let builder = self.values.builder();
        let function = builder.function(function);
        let return_type = function
            .signature
            .return_type
            .as_ref()
            .map_or("void".into(), |ty| builder.type_name(ty));
        let parameters = function
            .signature
            .parameters
            .iter()
            .zip(&function.parameters)
            .map(|(ty, param)| {
                let name = builder.value(*param).identifier_name().unwrap_or_default();
                format!("{} {name}", builder.type_name(ty))
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{return_type} {}({parameters})", function.name)
    }

    /// `ret name(params);`
    #[must_use]
    pub fn compile_prototype(&self, function: FunctionId) -> String {
        format!("{};", self.signature(function))
    }

    /// Full definition with body. Temporaries are scoped to the body.
    pub fn compile_function(&mut self, function: FunctionId) -> String {
        let body = self.values.builder().function(function).body;
        let mut out = format!("{} {{\n", self.signature(function));
        self.values.push_scope();
        self.write_block(body, 1, &mut out);
        self.values.pop_scope();
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, FunctionSignature};
    use crate::types::{OpaqueType, ShaderType};

    fn typed(builder: &mut ShaderCodeBuilder, name: &str, ty: ShaderType) -> ValueId {
        let v = builder.make_identifier(name);
        builder.annotate_type(v, ty).unwrap();
        v
    }

    #[test]
    fn test_root_is_bare() {
        let mut builder = ShaderCodeBuilder::new();
        let a = builder.make_identifier("a");
        let b = builder.make_identifier("b");
        let sum = builder.make_add(a, b);

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderValueCompiler::new(&builder, &settings);
        let compiled = compiler.compile(sum);
        assert!(compiled.pre_statements.is_empty());
        assert_eq!(compiled.expression, "a + b");
    }

    #[test]
    fn test_untyped_values_are_inlined() {
        let mut builder = ShaderCodeBuilder::new();
        let a = builder.make_identifier("a");
        let b = builder.make_identifier("b");
        let sum = builder.make_add(a, b);
        let scaled = builder.make_mul(sum, sum);

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderValueCompiler::new(&builder, &settings);
        let compiled = compiler.compile(scaled);
        assert!(compiled.pre_statements.is_empty());
        assert_eq!(compiled.expression, "(a + b) * (a + b)");
    }

    #[test]
    fn test_shared_typed_value_hoisted_once() {
        let mut builder = ShaderCodeBuilder::new();
        let a = typed(&mut builder, "a", ShaderType::VEC3);
        let b = typed(&mut builder, "b", ShaderType::VEC3);
        let sum = builder.make_add(a, b);
        let product = builder.make_mul(sum, sum);

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderValueCompiler::new(&builder, &settings);
        let compiled = compiler.compile(product);
        assert_eq!(compiled.pre_statements, vec!["vec3 _t0 = a + b;"]);
        assert_eq!(compiled.expression, "_t0 * _t0");

        // Memo survives across compile calls in the same scope.
        let again = compiler.compile(sum);
        assert!(again.pre_statements.is_empty());
        assert_eq!(again.expression, "_t0");
    }

    #[test]
    fn test_inline_all_mode() {
        let mut builder = ShaderCodeBuilder::new();
        let a = typed(&mut builder, "a", ShaderType::VEC3);
        let b = typed(&mut builder, "b", ShaderType::VEC3);
        let sum = builder.make_add(a, b);
        let product = builder.make_mul(sum, sum);

        let settings = ShaderGenSettings::default().with_compile_mode(CompileMode::InlineAll);
        let mut compiler = ShaderValueCompiler::new(&builder, &settings);
        let compiled = compiler.compile(product);
        assert!(compiled.pre_statements.is_empty());
        assert_eq!(compiled.expression, "(a + b) * (a + b)");
    }

    #[test]
    fn test_opaque_values_never_hoisted() {
        let mut builder = ShaderCodeBuilder::new();
        let textures = typed(
            &mut builder,
            "textures",
            ShaderType::Opaque(OpaqueType::Sampler2D),
        );
        let i = builder.make_constant(2);
        let tex = builder.make_array_access(textures, i);
        let uv = typed(&mut builder, "uv", ShaderType::VEC2);
        let sample = builder.make_builtin_call("texture", Some(ShaderType::VEC4), [tex, uv]);
        let rgb = builder.make_member_access(sample, "rgb");

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderValueCompiler::new(&builder, &settings);
        let compiled = compiler.compile(rgb);
        assert_eq!(
            compiled.pre_statements,
            vec!["vec4 _t0 = texture(textures[2], uv);"]
        );
        assert_eq!(compiled.expression, "_t0.rgb");
    }

    #[test]
    fn test_function_with_if_scope() {
        let mut builder = ShaderCodeBuilder::new();
        let f = builder.make_or_get_function(
            "attenuate",
            FunctionSignature::new(
                vec![ShaderType::FLOAT, ShaderType::FLOAT],
                Some(ShaderType::FLOAT),
            ),
        );
        let params = builder.function(f).parameters.clone();
        let (distance, range) = (params[0], params[1]);
        builder.start_function(f).unwrap();

        let ratio = builder.make_div(distance, range);
        let one = builder.make_constant(1.0f32);
        let too_far = builder.make_binary(BinaryOp::Greater, ratio, one);
        let then = builder.make_if_statement(too_far).unwrap();
        builder.start_block(then).unwrap();
        let zero = builder.make_constant(0.0f32);
        builder.make_return(Some(zero)).unwrap();
        builder.end_block().unwrap();
        let falloff = builder.make_sub(one, ratio);
        builder.make_return(Some(falloff)).unwrap();
        builder.end_block().unwrap();

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderBlockCompiler::new(&builder, &settings);
        assert_eq!(
            compiler.compile_prototype(f),
            "float attenuate(float arg0, float arg1);"
        );
        assert_eq!(
            compiler.compile_function(f),
            "float attenuate(float arg0, float arg1) {\n\
             \x20   float _t0 = arg0 / arg1;\n\
             \x20   if (_t0 > 1.0) {\n\
             \x20       return 0.0;\n\
             \x20   }\n\
             \x20   return 1.0 - _t0;\n\
             }\n"
        );
    }

    #[test]
    fn test_if_scope_does_not_leak() {
        let mut builder = ShaderCodeBuilder::new();
        let main = builder.make_or_get_function("main", FunctionSignature::entry_point());
        builder.start_function(main).unwrap();
        let a = typed(&mut builder, "a", ShaderType::FLOAT);
        let b = typed(&mut builder, "b", ShaderType::FLOAT);
        let out = builder.make_identifier("outValue");
        let sum = builder.make_add(a, b);
        let twice = builder.make_mul(sum, sum);
        let flag = builder.make_identifier("flag");

        let then = builder.make_if_statement(flag).unwrap();
        builder.start_block(then).unwrap();
        builder.make_assignment(out, twice).unwrap();
        builder.end_block().unwrap();
        builder.make_assignment(out, twice).unwrap();
        builder.end_block().unwrap();

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderBlockCompiler::new(&builder, &settings);
        let body = compiler.compile_block(builder.function(main).body, 0);
        assert_eq!(
            body,
            "if (flag) {\n\
             \x20   float _t0 = a + b;\n\
             \x20   outValue = _t0 * _t0;\n\
             }\n\
             float _t1 = a + b;\n\
             outValue = _t1 * _t1;\n"
        );
    }

    #[test]
    fn test_assignment_place_is_not_hoisted() {
        let mut builder = ShaderCodeBuilder::new();
        let main = builder.make_or_get_function("main", FunctionSignature::entry_point());
        builder.start_function(main).unwrap();
        let lights = typed(&mut builder, "lights", ShaderType::VEC4);
        let i = builder.make_constant(1);
        let element = builder.make_array_access(lights, i);
        let target = builder.make_member_access(element, "w");
        let value = builder.make_constant(0.5f32);
        builder.make_assignment(target, value).unwrap();
        let call = builder.make_builtin_call("barrier", None, []);
        builder.make_call_statement(call).unwrap();
        builder.end_block().unwrap();

        let settings = ShaderGenSettings::default();
        let mut compiler = ShaderBlockCompiler::new(&builder, &settings);
        assert_eq!(
            compiler.compile_block(builder.function(main).body, 0),
            "lights[1].w = 0.5;\nbarrier();\n"
        );
    }

    #[test]
    fn test_negating_negative_literal() {
        let mut builder = ShaderCodeBuilder::new();
        let minus_three = builder.make_constant(-3);
        let int_negated = builder.make_negate(minus_three);
        let minus_half = builder.make_constant(-0.5f32);
        let float_negated = builder.make_negate(minus_half);
        let x = typed(&mut builder, "x", ShaderType::FLOAT);
        let sum = builder.make_add(x, float_negated);

        let settings = ShaderGenSettings::default().with_compile_mode(CompileMode::InlineAll);
        let mut compiler = ShaderValueCompiler::new(&builder, &settings);
        assert_eq!(compiler.compile(int_negated).expression, "-(-3)");
        assert_eq!(compiler.compile(float_negated).expression, "-(-0.5)");
        assert_eq!(compiler.compile(sum).expression, "x + (-(-0.5))");
    }
}
