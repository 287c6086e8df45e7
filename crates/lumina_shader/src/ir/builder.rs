//! Shader IR Builder
//!
//! [`ShaderCodeBuilder`] is the single owner of all IR nodes for one shader
//! generation session. It is an append-only arena: every `make_*` call pushes
//! a fresh node and returns its id, even for structurally identical input.
//! Callers that want sharing keep the id and reuse it.
//!
//! Statement emission goes to the block on top of an explicit block stack:
//!
//! ```rust,ignore
//! let main = builder.make_or_get_function("main", FunctionSignature::entry_point());
//! builder.start_function(main)?;
//! let cond = builder.make_binary(BinaryOp::Less, x, y);
//! let then = builder.make_if_statement(cond)?;
//! builder.start_block(then)?;
//! builder.make_return(None)?;
//! builder.end_block()?;
//! builder.end_block()?;
//! ```

use std::borrow::Cow;

use lumina_core::{LuminaError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::statement::{Block, Function, FunctionSignature, Statement, StructField, StructType};
use super::value::{BinaryOp, Callee, UnaryOp, Value, ValueKind};
use super::{BlockId, FunctionId, StructId, ValueId};
use crate::types::{Constant, ShaderType};

/// Arena and construction API for shader IR.
#[derive(Debug, Default)]
pub struct ShaderCodeBuilder {
    values: Vec<Value>,
    blocks: Vec<Block>,
    functions: Vec<Function>,
    function_names: FxHashMap<String, FunctionId>,
    structs: Vec<StructType>,
    struct_names: FxHashMap<String, StructId>,
    block_stack: Vec<BlockId>,
}

impl ShaderCodeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Allocates a new value node.
    pub fn make_value(&mut self, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value::new(kind));
        id
    }

    pub fn make_constant(&mut self, constant: impl Into<Constant>) -> ValueId {
        self.make_value(ValueKind::Literal(constant.into()))
    }

    /// External name such as a resource accessor or a GLSL builtin variable.
    pub fn make_identifier(&mut self, name: impl Into<String>) -> ValueId {
        self.make_value(ValueKind::Identifier(name.into()))
    }

    /// Identifier carrying a type annotation from creation on.
    pub(crate) fn make_typed_identifier(&mut self, name: impl Into<String>, ty: ShaderType) -> ValueId {
        let id = self.make_identifier(name);
        self.values[id.index()].annotation = Some(ty);
        id
    }

    /// Call to a function declared in this builder.
    pub fn make_call(
        &mut self,
        function: FunctionId,
        args: impl IntoIterator<Item = ValueId>,
    ) -> ValueId {
        self.make_value(ValueKind::Call {
            callee: Callee::Function(function),
            args: args.into_iter().collect(),
        })
    }

    /// Call to a GLSL builtin. `return_type` feeds type inference.
    pub fn make_builtin_call(
        &mut self,
        name: impl Into<String>,
        return_type: Option<ShaderType>,
        args: impl IntoIterator<Item = ValueId>,
    ) -> ValueId {
        self.make_value(ValueKind::Call {
            callee: Callee::Builtin {
                name: name.into(),
                return_type,
            },
            args: args.into_iter().collect(),
        })
    }

    /// Type constructor call such as `vec4(color, 1.0)`.
    pub fn make_construct(
        &mut self,
        ty: ShaderType,
        args: impl IntoIterator<Item = ValueId>,
    ) -> ValueId {
        let name = self.type_name(&ty).into_owned();
        self.make_builtin_call(name, Some(ty), args)
    }

    pub fn make_unary(&mut self, op: UnaryOp, operand: ValueId) -> ValueId {
        self.make_value(ValueKind::Unary { op, operand })
    }

    pub fn make_binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.make_value(ValueKind::Binary { op, lhs, rhs })
    }

    #[inline]
    pub fn make_add(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.make_binary(BinaryOp::Add, lhs, rhs)
    }

    #[inline]
    pub fn make_sub(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.make_binary(BinaryOp::Sub, lhs, rhs)
    }

    #[inline]
    pub fn make_mul(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.make_binary(BinaryOp::Mul, lhs, rhs)
    }

    #[inline]
    pub fn make_div(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.make_binary(BinaryOp::Div, lhs, rhs)
    }

    #[inline]
    pub fn make_negate(&mut self, operand: ValueId) -> ValueId {
        self.make_unary(UnaryOp::Negate, operand)
    }

    /// `base.member`. The member name becomes its own identifier node.
    pub fn make_member_access(&mut self, base: ValueId, member: impl Into<String>) -> ValueId {
        let member = self.make_identifier(member);
        self.make_value(ValueKind::MemberAccess { base, member })
    }

    pub fn make_array_access(&mut self, base: ValueId, index: ValueId) -> ValueId {
        self.make_value(ValueKind::ArrayAccess { base, index })
    }

    /// `condition ? if_true : if_false`
    pub fn make_conditional(
        &mut self,
        condition: ValueId,
        if_true: ValueId,
        if_false: ValueId,
    ) -> ValueId {
        self.make_value(ValueKind::Conditional {
            condition,
            if_true,
            if_false,
        })
    }

    /// Attaches an explicit type, overriding inference for this node.
    pub fn annotate_type(&mut self, value: ValueId, ty: ShaderType) -> Result<()> {
        let node = self
            .values
            .get_mut(value.index())
            .ok_or(LuminaError::InvalidHandle {
                kind: "value",
                index: value.index(),
            })?;
        node.annotation = Some(ty);
        Ok(())
    }

    // ========================================================================
    // Functions & Blocks
    // ========================================================================

    /// Returns the function registered under `name`, creating it first if
    /// needed with one identifier per parameter and an empty body.
    ///
    /// A later call with a different signature still returns the original
    /// function.
    pub fn make_or_get_function(
        &mut self,
        name: &str,
        signature: FunctionSignature,
    ) -> FunctionId {
        if let Some(&id) = self.function_names.get(name) {
            let existing = &self.functions[id.index()];
            if existing.signature != signature {
                log::warn!(
                    "Function '{name}' requested with a different signature; keeping the original"
                );
            }
            return id;
        }

        let parameters = signature
            .parameters
            .iter()
            .enumerate()
            .map(|(i, ty)| self.make_typed_identifier(format!("arg{i}"), ty.clone()))
            .collect::<Vec<_>>();

        let body = self.make_block();
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(Function {
            name: name.to_owned(),
            signature,
            body,
            parameters,
        });
        self.function_names.insert(name.to_owned(), id);
        log::debug!("Declared shader function '{name}'");
        id
    }

    fn make_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block::default());
        id
    }

    /// Makes `block` the current insertion point.
    pub fn start_block(&mut self, block: BlockId) -> Result<()> {
        if block.index() >= self.blocks.len() {
            return Err(LuminaError::InvalidHandle {
                kind: "block",
                index: block.index(),
            });
        }
        self.block_stack.push(block);
        Ok(())
    }

    /// Starts emitting into the body of `function`.
    pub fn start_function(&mut self, function: FunctionId) -> Result<()> {
        let body = self
            .functions
            .get(function.index())
            .ok_or(LuminaError::InvalidHandle {
                kind: "function",
                index: function.index(),
            })?
            .body;
        self.start_block(body)
    }

    /// Pops the current insertion point.
    pub fn end_block(&mut self) -> Result<BlockId> {
        self.block_stack.pop().ok_or(LuminaError::NoActiveBlock)
    }

    #[inline]
    #[must_use]
    pub fn current_block(&self) -> Option<BlockId> {
        self.block_stack.last().copied()
    }

    fn emit(&mut self, statement: Statement) -> Result<()> {
        let current = self.current_block().ok_or(LuminaError::NoActiveBlock)?;
        self.blocks[current.index()].statements.push(statement);
        Ok(())
    }

    pub fn make_return(&mut self, value: Option<ValueId>) -> Result<()> {
        self.emit(Statement::Return(value))
    }

    pub fn make_assignment(&mut self, target: ValueId, value: ValueId) -> Result<()> {
        self.emit(Statement::Assignment { target, value })
    }

    /// Emits `call` as a statement.
    pub fn make_call_statement(&mut self, call: ValueId) -> Result<()> {
        self.emit(Statement::Call(call))
    }

    /// Appends `if (condition) { ... }` to the current block and returns the
    /// nested block. The caller has to [`start_block`](Self::start_block) it.
    pub fn make_if_statement(&mut self, condition: ValueId) -> Result<BlockId> {
        if self.block_stack.is_empty() {
            return Err(LuminaError::NoActiveBlock);
        }
        let block = self.make_block();
        self.emit(Statement::If { condition, block })?;
        Ok(block)
    }

    // ========================================================================
    // Struct Types
    // ========================================================================

    /// Declares a struct type. Names are unique per builder.
    pub fn make_struct_type(
        &mut self,
        name: &str,
        fields: impl IntoIterator<Item = StructField>,
    ) -> Result<StructId> {
        if self.struct_names.contains_key(name) {
            return Err(LuminaError::DuplicateStruct(name.to_owned()));
        }
        let id = StructId(self.structs.len() as u32);
        self.structs.push(StructType {
            name: name.to_owned(),
            fields: fields.into_iter().collect(),
        });
        self.struct_names.insert(name.to_owned(), id);
        Ok(id)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// # Panics
    /// If `id` was not issued by this builder.
    #[inline]
    #[must_use]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    /// # Panics
    /// If `id` was not issued by this builder.
    #[inline]
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// # Panics
    /// If `id` was not issued by this builder.
    #[inline]
    #[must_use]
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    /// # Panics
    /// If `id` was not issued by this builder.
    #[inline]
    #[must_use]
    pub fn struct_type(&self, id: StructId) -> &StructType {
        &self.structs[id.index()]
    }

    #[must_use]
    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    #[must_use]
    pub fn struct_by_name(&self, name: &str) -> Option<StructId> {
        self.struct_names.get(name).copied()
    }

    /// Functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i as u32), f))
    }

    /// Struct types in declaration order.
    pub fn struct_types(&self) -> impl Iterator<Item = (StructId, &StructType)> {
        self.structs
            .iter()
            .enumerate()
            .map(|(i, s)| (StructId(i as u32), s))
    }

    #[inline]
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// GLSL spelling of `ty`, resolving struct names.
    #[must_use]
    pub fn type_name<'a>(&'a self, ty: &ShaderType) -> Cow<'a, str> {
        match ty {
            ShaderType::Struct(id) => Cow::Borrowed(self.struct_type(*id).name.as_str()),
            other => other.builtin_name().unwrap_or(Cow::Borrowed("void")),
        }
    }

    /// Natural byte size with struct fields summed and no padding.
    /// `None` for opaque types.
    #[must_use]
    pub fn type_size(&self, ty: &ShaderType) -> Option<u32> {
        match ty {
            ShaderType::Struct(id) => self
                .struct_type(*id)
                .fields
                .iter()
                .map(|field| self.type_size(&field.ty))
                .sum(),
            other => other.builtin_size(),
        }
    }
}
