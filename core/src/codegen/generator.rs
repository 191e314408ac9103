//! The tree traversal: one fragment per node.

use ecow::EcoString;
use tracing::debug;

use crate::api::CompileOptions;
use crate::asm::{Fragment, Instruction::*};
use crate::codegen::calling::{enter_frame, invocation, leave_frame, return_slot};
use crate::codegen::labeller::LabelSource;
use crate::codegen::memory_manager;
use crate::codegen::operators;
use crate::codegen::print;
use crate::codegen::record::{
    allocate_populated_array, element_address, null_check, sequence_layout, string_literal,
};
use crate::codegen::runtime::{
    DISCARD_RECORD, FOR_IDENTIFIER, FOR_INDEX, FOR_LENGTH, FOR_SEQUENCE, Fault, GLOBAL_MEMORY_BLOCK,
    MAIN_PROGRAM, environment,
};
use crate::codegen::scratch::ScratchContext;
use crate::tree::{
    Binding, Expr, ExprKind, ForKind, Lambda, PrintItem, Program, Signature, Statement, Type,
};

/// Generates the complete program: the runtime environment, the global
/// block, the main code under [`MAIN_PROGRAM`], and (unless disabled) the
/// memory manager.
pub fn generate(program: &Program, options: &CompileOptions) -> Fragment {
    debug!(
        global_scope_size = program.global_scope_size,
        statements = program.body.len(),
        memory_manager = options.memory_manager,
        "Generating program"
    );
    let mut generator = CodeGenerator::new();
    let body = generator.block(&program.body);

    let mut code = Fragment::void();
    if options.memory_manager {
        code.append(memory_manager::initialization());
    }
    code.append(environment(options.memory_manager));
    code.extend([
        DLabel(GLOBAL_MEMORY_BLOCK.into()),
        DataZ(program.global_scope_size),
        Label(MAIN_PROGRAM.into()),
    ]);
    code.append(body);
    code.emit(Halt);
    if options.memory_manager {
        code.append(memory_manager::epilogue());
    }
    code
}

/// The function whose body is being generated.
struct FunctionContext {
    /// `None` for the main program, which cannot return.
    return_label: Option<EcoString>,
    parameter_scope_size: i32,
    result: Type,
    loops: Vec<LoopContext>,
}

struct LoopContext {
    continue_label: EcoString,
    end_label: EcoString,
    /// Scratch words a `for` loop saved on the operand stack.
    bracket: Option<ScratchContext>,
}

pub struct CodeGenerator {
    labels: LabelSource,
    functions: Vec<FunctionContext>,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            labels: LabelSource::new(),
            functions: vec![FunctionContext {
                return_label: None,
                parameter_scope_size: 0,
                result: Type::Void,
                loops: Vec::new(),
            }],
        }
    }

    fn function(&mut self) -> &mut FunctionContext {
        self.functions
            .last_mut()
            .expect("function stack is never empty")
    }

    fn innermost_loop(&mut self) -> &LoopContext {
        self.function()
            .loops
            .last()
            .expect("break or continue outside a loop (type checker bug)")
    }

    // === Statements ===

    pub fn block(&mut self, statements: &[Statement]) -> Fragment {
        let mut code = Fragment::void();
        for statement in statements {
            code.append(self.statement(statement));
        }
        code
    }

    pub fn statement(&mut self, statement: &Statement) -> Fragment {
        match statement {
            Statement::Declaration {
                binding,
                value,
                is_static,
            } => self.declaration(binding, value, *is_static),
            Statement::Assignment { target, value } => {
                let address = self.expression(target);
                assert!(
                    address.is_address(),
                    "assignment to a non-location (type checker bug)"
                );
                let mut code = Fragment::void();
                code.append(address);
                code.append(self.value(value));
                code.store(&target.ty);
                code
            }
            Statement::Print(items) => self.print(items),
            Statement::If {
                condition,
                then_block,
                else_block,
            } => self.if_statement(condition, then_block, else_block.as_deref()),
            Statement::While { condition, body } => self.while_loop(condition, body),
            Statement::For {
                kind,
                variable,
                sequence,
                body,
            } => self.for_loop(*kind, variable, sequence, body),
            Statement::Break => {
                let mut code = Fragment::void();
                code.emit(Jump(self.innermost_loop().end_label.clone()));
                code
            }
            Statement::Continue => {
                let mut code = Fragment::void();
                code.emit(Jump(self.innermost_loop().continue_label.clone()));
                code
            }
            Statement::Return(value) => self.return_statement(value.as_ref()),
            Statement::Call(invocation) => {
                let mut code = Fragment::void();
                code.append(self.value(invocation));
                code.discard_value(&invocation.ty);
                code
            }
            Statement::Release(value) => {
                let mut code = Fragment::void();
                code.append(self.value(value));
                code.emit(Call(DISCARD_RECORD.into()));
                code
            }
            Statement::Block(statements) => self.block(statements),
        }
    }

    /// Address, then value, then store. A static declaration only runs the
    /// first time control reaches it.
    fn declaration(&mut self, binding: &Binding, value: &Expr, is_static: bool) -> Fragment {
        let mut code = Fragment::void();
        let skip = if is_static {
            let skip = self.labels.labeller("static").label("skip");
            code.append(binding.companion_address_code());
            code.extend([LoadC, JumpTrue(skip.clone())]);
            code.append(binding.companion_address_code());
            code.extend([PushI(1), StoreC]);
            Some(skip)
        } else {
            None
        };

        code.append(binding.address_code());
        code.append(self.value(value));
        code.store(&binding.ty);

        if let Some(skip) = skip {
            code.emit(Label(skip));
        }
        code
    }

    fn print(&mut self, items: &[PrintItem]) -> Fragment {
        let mut code = Fragment::void();
        for item in items {
            match item {
                PrintItem::Expression(expr) => {
                    code.append(self.value(expr));
                    print::print_value(&mut code, &expr.ty, &mut self.labels);
                }
                PrintItem::Newline => print::newline(&mut code),
                PrintItem::Space => print::space(&mut code),
                PrintItem::Tab => print::tab(&mut code),
            }
        }
        code
    }

    fn if_statement(
        &mut self,
        condition: &Expr,
        then_block: &[Statement],
        else_block: Option<&[Statement]>,
    ) -> Fragment {
        let labels = self.labels.labeller("if");
        let otherwise = labels.label("else");
        let join = labels.label("join");

        let mut code = Fragment::void();
        code.append(self.value(condition));
        code.emit(JumpFalse(otherwise.clone()));
        code.append(self.block(then_block));
        code.emit(Jump(join.clone()));
        code.emit(Label(otherwise));
        if let Some(else_block) = else_block {
            code.append(self.block(else_block));
        }
        code.emit(Label(join));
        code
    }

    fn while_loop(&mut self, condition: &Expr, body: &[Statement]) -> Fragment {
        let labels = self.labels.labeller("while");
        let start = labels.label("start");
        let end = labels.label("end");

        let mut code = Fragment::void();
        code.emit(Label(start.clone()));
        code.append(self.value(condition));
        code.emit(JumpFalse(end.clone()));
        code.append(self.loop_body(
            body,
            LoopContext {
                continue_label: start.clone(),
                end_label: end.clone(),
                bracket: None,
            },
        ));
        code.emit(Jump(start));
        code.emit(Label(end));
        code
    }

    /// `for` over an array or string. The loop state lives in the `FOR_*`
    /// words, saved on entry and restored at the end label, which is also
    /// where `break` goes.
    fn for_loop(
        &mut self,
        kind: ForKind,
        variable: &Binding,
        sequence: &Expr,
        body: &[Statement],
    ) -> Fragment {
        let (header, length_offset, size) = sequence_layout(&sequence.ty);
        let bracket = ScratchContext::new(&[FOR_IDENTIFIER, FOR_SEQUENCE, FOR_LENGTH, FOR_INDEX]);
        let labels = self.labels.labeller("for");
        let start = labels.label("start");
        let next = labels.label("continue");
        let end = labels.label("end");

        let mut code = bracket.save();
        code.append(variable.address_code());
        code.store_i(FOR_IDENTIFIER);
        code.append(self.value(sequence));
        null_check(&mut code);
        code.emit(Duplicate);
        code.read_i(length_offset);
        code.store_i(FOR_LENGTH);
        code.add_offset(header);
        code.store_i(FOR_SEQUENCE);
        code.emit(PushI(0));
        code.store_i(FOR_INDEX);

        code.emit(Label(start.clone()));
        code.load_i(FOR_LENGTH);
        code.load_i(FOR_INDEX);
        code.extend([Subtract, JumpFalse(end.clone())]);
        code.load_i(FOR_IDENTIFIER);
        match kind {
            ForKind::Index => code.load_i(FOR_INDEX),
            ForKind::Element => {
                code.load_i(FOR_SEQUENCE);
                code.load_i(FOR_INDEX);
                element_address(&mut code, 0, size);
                code.load(&variable.ty);
            }
        }
        code.store(&variable.ty);

        code.append(self.loop_body(
            body,
            LoopContext {
                continue_label: next.clone(),
                end_label: end.clone(),
                bracket: Some(bracket.clone()),
            },
        ));
        code.emit(Label(next));
        code.increment_i(FOR_INDEX);
        code.emit(Jump(start));
        code.emit(Label(end));
        code.append(bracket.restore());
        code
    }

    fn loop_body(&mut self, body: &[Statement], context: LoopContext) -> Fragment {
        self.function().loops.push(context);
        let code = self.block(body);
        self.function().loops.pop();
        code
    }

    /// Unwinds the current function's `for` brackets, innermost first, then
    /// jumps to its shared exit with `[slot value]`.
    fn return_statement(&mut self, value: Option<&Expr>) -> Fragment {
        let mut code = Fragment::void();
        let function = self.function();
        let return_label = function
            .return_label
            .clone()
            .expect("return outside a function (type checker bug)");
        let parameter_scope_size = function.parameter_scope_size;
        let result = function.result.clone();
        for context in function.loops.iter().rev() {
            if let Some(bracket) = &context.bracket {
                code.append(bracket.restore());
            }
        }

        if let Some(value) = value {
            return_slot(&mut code, parameter_scope_size, &result);
            code.append(self.value(value));
        }
        code.emit(Jump(return_label));
        code
    }

    // === Expressions ===

    /// The node's fragment, converted to a value.
    pub fn value(&mut self, expr: &Expr) -> Fragment {
        self.expression(expr).into_value(&expr.ty)
    }

    /// The node's fragment: an address for storage locations, otherwise a value.
    pub fn expression(&mut self, expr: &Expr) -> Fragment {
        let mut code = Fragment::value();
        match &expr.kind {
            ExprKind::Boolean(value) => code.emit(PushI(i32::from(*value))),
            ExprKind::Character(value) => code.emit(PushI(i32::from(*value))),
            ExprKind::Integer(value) => code.emit(PushI(*value)),
            ExprKind::Floating(value) => code.emit(PushF(*value)),
            ExprKind::String(text) => {
                let label = self.labels.labeller("string").label("literal");
                string_literal(&mut code, &label, text);
            }
            ExprKind::Identifier(binding) => return binding.address_code(),
            ExprKind::Operation {
                signature,
                operands,
            } => return self.operation(signature, operands, &expr.ty),
            ExprKind::Comparison { op, lhs, rhs } => {
                let lhs_code = self.value(lhs);
                let rhs_code = self.value(rhs);
                return operators::comparison(*op, &lhs.ty, lhs_code, rhs_code, &mut self.labels);
            }
            ExprKind::PopulatedArray(elements) => {
                let values = elements.iter().map(|element| self.value(element)).collect();
                allocate_populated_array(&mut code, expr.ty.element(), values);
            }
            ExprKind::Lambda(lambda) => return self.lambda(lambda, &expr.ty),
            ExprKind::Invocation { callee, arguments } => {
                let arguments: Vec<(Fragment, &Type)> = arguments
                    .iter()
                    .map(|argument| (self.value(argument), &argument.ty))
                    .collect();
                let callee = self.value(callee);
                invocation(&mut code, callee, arguments, &expr.ty);
            }
            ExprKind::Map { array, lambda } => {
                let array_code = self.value(array);
                let lambda_code = self.value(lambda);
                return operators::map(array_code, &array.ty, lambda_code, &lambda.ty, &mut self.labels);
            }
            ExprKind::Reduce { array, lambda } => {
                let array_code = self.value(array);
                let lambda_code = self.value(lambda);
                return operators::reduce(array_code, &array.ty, lambda_code, &mut self.labels);
            }
            ExprKind::Fold {
                array,
                base,
                lambda,
            } => {
                let array_code = self.value(array);
                let base_code = base.as_deref().map(|base| self.value(base));
                let lambda_code = self.value(lambda);
                return operators::fold(
                    array_code,
                    &array.ty,
                    base_code,
                    lambda_code,
                    &lambda.ty,
                    &mut self.labels,
                );
            }
            ExprKind::Zip {
                first,
                second,
                lambda,
            } => {
                let first_code = self.value(first);
                let second_code = self.value(second);
                let lambda_code = self.value(lambda);
                return operators::zip(
                    first_code,
                    &first.ty,
                    second_code,
                    &second.ty,
                    lambda_code,
                    &lambda.ty,
                    &mut self.labels,
                );
            }
        }
        code
    }

    fn operation(&mut self, signature: &Signature, operands: &[Expr], result: &Type) -> Fragment {
        let operand_types: Vec<&Type> = operands.iter().map(|operand| &operand.ty).collect();
        match signature {
            Signature::Instruction(instruction) => {
                let mut code = self.operand_values(operands);
                code.emit(instruction.clone());
                code
            }
            Signature::Snippet(snippet) => {
                let mut code = self.operand_values(operands);
                operators::snippet(&mut code, *snippet, &operand_types, result, &mut self.labels);
                code
            }
            Signature::Full(generator) => {
                let raw: Vec<Fragment> = operands
                    .iter()
                    .map(|operand| self.expression(operand))
                    .collect();
                operators::full(*generator, raw, &operand_types, &mut self.labels)
            }
        }
    }

    fn operand_values(&mut self, operands: &[Expr]) -> Fragment {
        let mut code = Fragment::value();
        for operand in operands {
            code.append(self.value(operand));
        }
        code
    }

    /// The function body is emitted in line, skipped by a jump; its value is
    /// the address of its entry label.
    fn lambda(&mut self, lambda: &Lambda, ty: &Type) -> Fragment {
        let result = ty.signature().1.clone();
        let labels = self.labels.labeller("lambda");
        let start = labels.label("start");
        let exit = labels.label("return");
        let end = labels.label("end");
        debug!(
            %ty,
            parameter_scope_size = lambda.parameter_scope_size,
            local_scope_size = lambda.local_scope_size,
            "Generating lambda"
        );

        let mut code = Fragment::value();
        code.extend([Jump(end.clone()), Label(start.clone())]);
        enter_frame(&mut code, lambda.local_scope_size);

        self.functions.push(FunctionContext {
            return_label: Some(exit.clone()),
            parameter_scope_size: lambda.parameter_scope_size,
            result: result.clone(),
            loops: Vec::new(),
        });
        code.append(self.block(&lambda.body));
        self.functions.pop();

        // Void functions may fall off the end; anything else is a fault.
        if result != Type::Void {
            code.emit(Jump(Fault::MissingReturn.label().into()));
        }
        code.emit(Label(exit));
        leave_frame(&mut code, lambda.parameter_scope_size, &result);
        code.extend([Label(end), PushD(start)]);
        code
    }
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod generator_test;
