//! Statement-level elaboration.
//!
//! The visitor owns the input bindings, the classical scope stack, the
//! gate and function registries, the qubit allocator and the circuit under
//! construction. Control flow is unrolled here: loops iterate, conditionals
//! pick a branch, gate definitions capture parametric templates, function
//! bodies re-elaborate per call site.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use tracing::debug;

use alsvid_ir::{
    Circuit, Instruction, IrError, NoiseChannel, Observable, Operator, Parameter, QubitId,
    ResultSpec, SquareMatrix,
};

use crate::ast::{
    AssignOp, BinaryOp, Expression, FunctionArg, FunctionDef, IoDirection, LValue,
    ObservableFactor, ObservableSpec, Pragma, Program, ResultPragma, Statement, TypeSpec,
};
use crate::error::{ElabError, ElabResult};
use crate::gate_call::{GateTemplate, TemplateInstruction, TemplateOperator, builtin_registry};
use crate::scope::{ScopeStack, Variable};
use crate::types::{ClassicalType, Value, coerce};

/// Textual qubit expressions resolved to contiguous index lists. Each
/// element `name[i]` is additionally registered as a singleton.
#[derive(Debug, Default)]
pub(crate) struct QubitTable {
    mapping: FxHashMap<String, Vec<u32>>,
}

impl QubitTable {
    pub fn declare(&mut self, name: &str, indices: Vec<u32>) {
        for (i, &q) in indices.iter().enumerate() {
            self.mapping.insert(format!("{name}[{i}]"), vec![q]);
        }
        self.mapping.insert(name.to_string(), indices);
    }

    pub fn get(&self, name: &str) -> Option<&Vec<u32>> {
        self.mapping.get(name)
    }
}

/// Collected body of a gate definition in progress.
#[derive(Debug, Default)]
struct TemplateContext {
    instructions: Vec<TemplateInstruction>,
}

/// Result of walking a statement list.
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Option<Value>),
}

/// The elaborator.
pub struct Visitor {
    scopes: ScopeStack,
    qubits: QubitTable,
    gates: FxHashMap<String, GateTemplate>,
    functions: FxHashMap<String, FunctionDef>,
    inputs: FxHashMap<String, serde_json::Value>,
    circuit: Circuit,
    /// `Some` while a gate body is being captured.
    template: Option<TemplateContext>,
}

impl Visitor {
    /// Create a visitor with the given input bindings. The gate registry
    /// starts out seeded with the builtin gate set.
    pub fn new(inputs: FxHashMap<String, serde_json::Value>) -> Self {
        Self {
            scopes: ScopeStack::new(),
            qubits: QubitTable::default(),
            gates: builtin_registry(),
            functions: FxHashMap::default(),
            inputs,
            circuit: Circuit::new(),
            template: None,
        }
    }

    /// Elaborate a program to a circuit.
    pub fn run(mut self, program: &Program) -> ElabResult<Circuit> {
        match self.walk_statements(&program.statements)? {
            Flow::Normal => {}
            Flow::Break => return Err(ElabError::StrayLoopControl("break")),
            Flow::Continue => return Err(ElabError::StrayLoopControl("continue")),
            Flow::Return(_) => {
                return Err(ElabError::Unsupported("return outside a function".into()));
            }
        }
        debug!(
            qubits = self.circuit.qubit_count(),
            instructions = self.circuit.instructions().len(),
            results = self.circuit.results().len(),
            "elaboration complete"
        );
        Ok(self.circuit)
    }

    // ---- accessors shared with the evaluator and the gate-call engine ----

    pub(crate) fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub(crate) fn scopes_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }

    pub(crate) fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub(crate) fn qubit_register(&self, name: &str) -> Option<Vec<u32>> {
        self.qubits.get(name).cloned()
    }

    pub(crate) fn in_gate_body(&self) -> bool {
        self.template.is_some()
    }

    pub(crate) fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub(crate) fn gate_template(&self, name: &str) -> Option<GateTemplate> {
        self.gates.get(name).cloned()
    }

    pub(crate) fn record_measured(&mut self, qubit: u32) -> ElabResult<()> {
        if self.in_gate_body() {
            return Err(ElabError::Unsupported("measure inside a gate body".into()));
        }
        self.circuit.record_measurement(QubitId(qubit));
        Ok(())
    }

    /// Route an elaborated operator to the right sink: the template body
    /// while defining a gate, the circuit otherwise.
    pub(crate) fn sink(&mut self, operator: TemplateOperator, targets: Vec<u32>) -> ElabResult<()> {
        if let Some(ctx) = &mut self.template {
            ctx.instructions.push(TemplateInstruction {
                operator,
                targets: targets.into_iter().map(|t| t as usize).collect(),
            });
            return Ok(());
        }
        let operator = operator.resolved()?;
        self.emit(operator, targets)
    }

    fn emit(&mut self, operator: Operator, targets: Vec<u32>) -> ElabResult<()> {
        // An unwrapped global phase acts on every allocated qubit.
        let targets: Vec<QubitId> =
            if targets.is_empty() && matches!(operator, Operator::GPhase { .. }) {
                self.circuit.all_qubits().collect()
            } else {
                targets.into_iter().map(QubitId).collect()
            };
        tracing::trace!(name = operator.name(), ?targets, "emit instruction");
        self.circuit.push(Instruction::new(operator, targets))?;
        Ok(())
    }

    // ---- statement walking ----

    pub(crate) fn walk_statements(&mut self, statements: &[Statement]) -> ElabResult<Flow> {
        for statement in statements {
            match self.walk_statement(statement)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn walk_statement(&mut self, statement: &Statement) -> ElabResult<Flow> {
        match statement {
            // The builtin registry already covers the standard include.
            Statement::Include(path) if path == "stdgates.inc" => Ok(Flow::Normal),
            Statement::Include(path) => {
                Err(ElabError::Unsupported(format!("include \"{path}\"")))
            }

            Statement::End => Ok(Flow::Normal),

            Statement::QubitDecl { name, size } => {
                self.declare_qubits(name, size.as_ref())?;
                Ok(Flow::Normal)
            }

            Statement::ClassicalDecl {
                ty,
                name,
                init,
                is_const,
            } => {
                let cty = self.resolve_type(ty)?;
                let mut var = Variable::new(cty.clone());
                match init {
                    Some(expr) => {
                        let value = self.eval(expr)?;
                        var.value = Some(coerce(value, &cty)?);
                    }
                    None if *is_const => {
                        return Err(ElabError::Unsupported(format!(
                            "const declaration of '{name}' requires an initializer"
                        )));
                    }
                    None => {}
                }
                var.is_const = *is_const;
                self.scopes.declare(name.clone(), var);
                Ok(Flow::Normal)
            }

            Statement::IoDecl {
                direction,
                ty,
                name,
            } => {
                if *direction == IoDirection::Output {
                    return Err(ElabError::Unsupported("output declarations".into()));
                }
                self.bind_input(ty, name)?;
                Ok(Flow::Normal)
            }

            Statement::Assignment { target, op, value } => {
                let rhs = self.eval(value)?;
                let computed = match op {
                    AssignOp::Assign => rhs,
                    compound => {
                        let current = self.read_lvalue(target)?;
                        crate::evaluator::apply_binary(binary_of(*compound), current, rhs)?
                    }
                };
                self.store_lvalue(target, computed)?;
                Ok(Flow::Normal)
            }

            Statement::GateDef {
                name,
                params,
                qubits,
                body,
            } => {
                self.define_gate(name, params, qubits, body)?;
                Ok(Flow::Normal)
            }

            Statement::FunctionDef(def) => {
                self.functions.insert(def.name.clone(), def.clone());
                Ok(Flow::Normal)
            }

            Statement::GateCall(call) => {
                self.apply_gate_call(call)?;
                Ok(Flow::Normal)
            }

            Statement::Expr(expr) => {
                // Evaluated for side effects; the value is discarded.
                self.eval(expr)?;
                Ok(Flow::Normal)
            }

            Statement::Measure {
                targets,
                destination,
            } => {
                let lists = self.resolve_target_lists(targets)?;
                for q in lists.into_iter().flatten() {
                    self.record_measured(q)?;
                }
                if let Some(dest) = destination {
                    // Measurement results never reach classical storage;
                    // the destination receives the placeholder.
                    self.store_lvalue(dest, Value::Bool(false))?;
                }
                Ok(Flow::Normal)
            }

            Statement::For {
                ty,
                variable,
                iterable,
                body,
            } => self.walk_for(ty, variable, iterable, body),

            Statement::While { condition, body } => {
                loop {
                    if !self.eval(condition)?.is_truthy()? {
                        break;
                    }
                    match self.walk_statements(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                let branch = if self.eval(condition)?.is_truthy()? {
                    Some(then_body)
                } else {
                    else_body.as_ref()
                };
                match branch {
                    Some(body) => {
                        self.scopes.push();
                        let flow = self.walk_statements(body);
                        self.scopes.pop();
                        flow
                    }
                    None => Ok(Flow::Normal),
                }
            }

            Statement::Switch {
                target,
                cases,
                default,
            } => {
                let selector = self.eval(target)?.as_int()?;
                let mut chosen = None;
                'cases: for case in cases {
                    for label in &case.labels {
                        if self.eval(label)?.as_int()? == selector {
                            chosen = Some(&case.body);
                            break 'cases;
                        }
                    }
                }
                let body = chosen.or(default.as_ref());
                match body {
                    Some(body) => {
                        self.scopes.push();
                        let flow = self.walk_statements(body);
                        self.scopes.pop();
                        flow
                    }
                    None => Ok(Flow::Normal),
                }
            }

            Statement::Break => Ok(Flow::Break),
            Statement::Continue => Ok(Flow::Continue),

            Statement::Return(expr) => {
                let value = match expr {
                    Some(e) => Some(self.eval(e)?),
                    None => None,
                };
                Ok(Flow::Return(value))
            }

            // Timing hints are ignored; the body is walked in order.
            Statement::Box { body } => self.walk_statements(body),

            Statement::Pragma(pragma) => {
                self.handle_pragma(pragma)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn declare_qubits(&mut self, name: &str, size: Option<&Expression>) -> ElabResult<()> {
        if self.in_gate_body() {
            return Err(ElabError::Unsupported(
                "qubit declaration inside a gate body".into(),
            ));
        }
        let size = match size {
            Some(e) => {
                let v = self.eval(e)?.as_int()?;
                u32::try_from(v).ok().filter(|v| *v >= 1).ok_or_else(|| {
                    ElabError::TypeMismatch {
                        expected: "positive register size".into(),
                        found: v.to_string(),
                    }
                })?
            }
            None => 1,
        };
        let first = self.circuit.allocate(size).0;
        debug!(register = name, size, first, "allocated qubits");
        self.qubits.declare(name, (first..first + size).collect());
        Ok(())
    }

    fn walk_for(
        &mut self,
        ty: &TypeSpec,
        variable: &str,
        iterable: &Expression,
        body: &[Statement],
    ) -> ElabResult<Flow> {
        let cty = self.resolve_type(ty)?;
        let items = self.eval_iterable(iterable)?;

        // The induction variable lives in a child scope and disappears
        // when the loop completes.
        self.scopes.push();
        self.scopes
            .declare(variable.to_string(), Variable::new(cty.clone()));

        let mut flow = Flow::Normal;
        for item in items {
            let coerced = match coerce(item, &cty) {
                Ok(v) => v,
                Err(e) => {
                    self.scopes.pop();
                    return Err(e);
                }
            };
            self.scopes
                .get_mut(variable)
                .expect("declared above")
                .value = Some(coerced);
            match self.walk_statements(body) {
                Ok(Flow::Normal | Flow::Continue) => {}
                Ok(Flow::Break) => break,
                Ok(ret @ Flow::Return(_)) => {
                    flow = ret;
                    break;
                }
                Err(e) => {
                    self.scopes.pop();
                    return Err(e);
                }
            }
        }
        self.scopes.pop();
        Ok(flow)
    }

    fn define_gate(
        &mut self,
        name: &str,
        params: &[String],
        qubits: &[String],
        body: &[Statement],
    ) -> ElabResult<()> {
        if self.in_gate_body() {
            return Err(ElabError::Unsupported(
                "gate definition inside a gate body".into(),
            ));
        }

        // Qubit parameters occupy local indices 0..k-1; classical
        // parameters become free symbols in a child scope.
        let saved_qubits = std::mem::take(&mut self.qubits);
        for (i, q) in qubits.iter().enumerate() {
            self.qubits.declare(q, vec![i as u32]);
        }
        self.scopes.push();
        for p in params {
            let mut var = Variable::new(ClassicalType::Float {
                size: crate::types::DEFAULT_FLOAT_WIDTH,
            });
            var.value = Some(Value::Param(Parameter::free(p.clone())));
            var.is_const = true;
            self.scopes.declare(p.clone(), var);
        }
        self.template = Some(TemplateContext::default());

        let walked = self.walk_statements(body);

        let ctx = self.template.take().expect("set above");
        self.scopes.pop();
        self.qubits = saved_qubits;
        walked?;

        debug!(
            gate = name,
            qubits = qubits.len(),
            instructions = ctx.instructions.len(),
            "registered gate definition"
        );
        self.gates.insert(
            name.to_string(),
            GateTemplate {
                params: params.to_vec(),
                qubit_count: qubits.len(),
                body: ctx.instructions,
            },
        );
        Ok(())
    }

    /// Store a value through an assignment target, enforcing constness.
    fn store_lvalue(&mut self, target: &LValue, value: Value) -> ElabResult<()> {
        let (is_const, ty) = {
            let var = self
                .scopes
                .get(&target.name)
                .ok_or_else(|| ElabError::UndefinedIdentifier(target.name.clone()))?;
            (var.is_const, var.ty.clone())
        };
        if is_const {
            return Err(ElabError::ConstAssignment(target.name.clone()));
        }
        if target.indices.is_empty() {
            let coerced = coerce(value, &ty)?;
            self.scopes
                .get_mut(&target.name)
                .expect("checked above")
                .value = Some(coerced);
            Ok(())
        } else {
            self.write_lvalue(target, value)
        }
    }

    fn bind_input(&mut self, ty: &TypeSpec, name: &str) -> ElabResult<()> {
        let cty = self.resolve_type(ty)?;
        let json = self
            .inputs
            .get(name)
            .cloned()
            .ok_or_else(|| ElabError::MissingInput(name.to_string()))?;
        let raw = json_to_value(&json).ok_or_else(|| ElabError::InputCoercion {
            name: name.to_string(),
            ty: cty.to_string(),
            value: json.to_string(),
        })?;
        let value = coerce(raw, &cty).map_err(|_| ElabError::InputCoercion {
            name: name.to_string(),
            ty: cty.to_string(),
            value: json.to_string(),
        })?;
        debug!(input = name, ty = %cty, "bound input variable");
        let mut var = Variable::new(cty);
        var.value = Some(value);
        var.is_const = true;
        self.scopes.declare(name.to_string(), var);
        Ok(())
    }

    /// Re-elaborate a function body in a fresh scope and qubit space.
    /// Qubit arguments register the caller's indices directly, so callee
    /// emissions land in caller coordinates; mutated `mutable array`
    /// arguments are copied back by name.
    pub(crate) fn call_function(&mut self, name: &str, args: &[Expression]) -> ElabResult<Value> {
        if self.in_gate_body() {
            return Err(ElabError::Unsupported(
                "function call inside a gate body".into(),
            ));
        }
        let def = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| ElabError::UnknownFunction(name.to_string()))?;
        if def.args.len() != args.len() {
            return Err(ElabError::FunctionArgCount {
                function: name.to_string(),
                expected: def.args.len(),
                got: args.len(),
            });
        }

        enum Bound {
            Classical {
                name: String,
                ty: ClassicalType,
                value: Value,
                write_back: Option<String>,
            },
            Qubit {
                name: String,
                indices: Vec<u32>,
            },
        }

        // Evaluate arguments in the caller's context.
        let mut bound = Vec::with_capacity(args.len());
        for (formal, actual) in def.args.iter().zip(args) {
            match formal {
                FunctionArg::Classical { ty, name: arg_name } => {
                    let cty = self.resolve_type(ty)?;
                    let value = coerce(self.eval(actual)?, &cty)?;
                    let write_back = match (ty, actual) {
                        (TypeSpec::ArrayRef { mutable: true, .. }, Expression::Identifier(n)) => {
                            Some(n.clone())
                        }
                        _ => None,
                    };
                    bound.push(Bound::Classical {
                        name: arg_name.clone(),
                        ty: cty,
                        value,
                        write_back,
                    });
                }
                FunctionArg::Qubit {
                    name: arg_name,
                    size,
                } => {
                    let indices = self.resolve_qubits(actual)?;
                    if let Some(size_expr) = size {
                        let declared = self.eval(size_expr)?.as_int()?;
                        if declared as usize != indices.len() {
                            return Err(ElabError::TargetCount {
                                kind: format!("qubit argument '{arg_name}'"),
                                expected: declared as usize,
                                got: indices.len(),
                            });
                        }
                    }
                    bound.push(Bound::Qubit {
                        name: arg_name.clone(),
                        indices,
                    });
                }
            }
        }
        let return_type = match &def.return_type {
            Some(ty) => Some(self.resolve_type(ty)?),
            None => None,
        };

        debug!(function = name, "inlining function call");

        // Fresh classical scope and qubit space for the callee.
        let saved_scopes = std::mem::replace(&mut self.scopes, ScopeStack::new());
        let saved_qubits = std::mem::take(&mut self.qubits);
        for arg in &bound {
            match arg {
                Bound::Classical {
                    name, ty, value, ..
                } => {
                    let mut var = Variable::new(ty.clone());
                    var.value = Some(value.clone());
                    self.scopes.declare(name.clone(), var);
                }
                Bound::Qubit { name, indices } => {
                    self.qubits.declare(name, indices.clone());
                }
            }
        }

        let walked = self.walk_statements(&def.body);

        // Capture write-backs before the callee scope disappears.
        let mut write_backs = Vec::new();
        if walked.is_ok() {
            for arg in &bound {
                if let Bound::Classical {
                    name,
                    write_back: Some(caller_name),
                    ..
                } = arg
                {
                    if let Ok(value) = self.scopes.read(name) {
                        write_backs.push((caller_name.clone(), value.clone()));
                    }
                }
            }
        }

        self.scopes = saved_scopes;
        self.qubits = saved_qubits;
        let flow = walked?;

        for (caller_name, value) in write_backs {
            let target = LValue {
                name: caller_name,
                indices: vec![],
            };
            self.store_lvalue(&target, value)?;
        }

        match flow {
            Flow::Return(Some(value)) => match return_type {
                Some(ty) => coerce(value, &ty),
                None => Ok(value),
            },
            Flow::Return(None) | Flow::Normal => Ok(Value::Int(0)),
            Flow::Break => Err(ElabError::StrayLoopControl("break")),
            Flow::Continue => Err(ElabError::StrayLoopControl("continue")),
        }
    }

    // ---- pragmas ----

    fn handle_pragma(&mut self, pragma: &Pragma) -> ElabResult<()> {
        if self.in_gate_body() {
            return Err(ElabError::Unsupported("pragma inside a gate body".into()));
        }
        match pragma {
            Pragma::Verbatim => {
                self.circuit.mark_verbatim();
                Ok(())
            }
            Pragma::Result(result) => self.handle_result_pragma(result),
            Pragma::Unitary { matrix, targets } => {
                let matrix = self.eval_matrix(matrix)?;
                let targets = self.resolve_flat_targets(targets)?;
                if targets.is_empty() {
                    return Err(ElabError::Unsupported(
                        "unitary pragma requires targets".into(),
                    ));
                }
                let instruction =
                    Instruction::unitary(matrix, targets.into_iter().map(QubitId))
                        .map_err(ElabError::from)?;
                self.circuit.push(instruction)?;
                Ok(())
            }
            Pragma::Noise {
                channel,
                args,
                targets,
            } => {
                let mut params = Vec::with_capacity(args.len());
                for arg in args {
                    params.push(self.eval(arg)?.as_float()?);
                }
                let channel = build_channel(channel, &params)?;
                self.emit_noise(channel, targets)
            }
            Pragma::Kraus { matrices, targets } => {
                let mut operators = Vec::with_capacity(matrices.len());
                for m in matrices {
                    operators.push(self.eval_matrix(m)?);
                }
                validate_kraus(&operators)?;
                self.emit_noise(NoiseChannel::Kraus { operators }, targets)
            }
        }
    }

    fn emit_noise(&mut self, channel: NoiseChannel, targets: &[Expression]) -> ElabResult<()> {
        let targets = self.resolve_flat_targets(targets)?;
        if targets.is_empty() {
            return Err(ElabError::Unsupported(
                "noise pragma requires explicit targets".into(),
            ));
        }
        let arity = channel.num_qubits();
        debug!(channel = channel.name(), ?targets, "attached noise channel");
        if arity == 1 && targets.len() > 1 {
            // Single-qubit channels broadcast over register targets.
            for q in targets {
                self.circuit
                    .push(Instruction::noise(channel.clone(), [QubitId(q)]))?;
            }
            Ok(())
        } else if targets.len() == arity {
            self.circuit
                .push(Instruction::noise(channel, targets.into_iter().map(QubitId)))?;
            Ok(())
        } else {
            Err(ElabError::TargetCount {
                kind: format!("noise channel '{}'", channel.name()),
                expected: arity,
                got: targets.len(),
            })
        }
    }

    fn handle_result_pragma(&mut self, result: &ResultPragma) -> ElabResult<()> {
        let spec = match result {
            ResultPragma::StateVector => ResultSpec::StateVector,
            ResultPragma::Amplitude(states) => {
                for state in states {
                    if state.is_empty() || !state.chars().all(|c| c == '0' || c == '1') {
                        return Err(ElabError::TypeMismatch {
                            expected: "basis-state bitstring".into(),
                            found: format!("\"{state}\""),
                        });
                    }
                }
                ResultSpec::Amplitude {
                    states: states.clone(),
                }
            }
            ResultPragma::Probability(targets) => ResultSpec::Probability {
                targets: self.optional_targets(targets)?,
            },
            ResultPragma::DensityMatrix(targets) => ResultSpec::DensityMatrix {
                targets: self.optional_targets(targets)?,
            },
            ResultPragma::Expectation(spec) => {
                let (observable, targets) = self.build_observable(spec)?;
                ResultSpec::Expectation {
                    observable,
                    targets,
                }
            }
            ResultPragma::Variance(spec) => {
                let (observable, targets) = self.build_observable(spec)?;
                ResultSpec::Variance {
                    observable,
                    targets,
                }
            }
            ResultPragma::Sample(spec) => {
                let (observable, targets) = self.build_observable(spec)?;
                ResultSpec::Sample {
                    observable,
                    targets,
                }
            }
        };
        debug!(result = spec.name(), "recorded result request");
        self.circuit.push_result(spec);
        Ok(())
    }

    fn optional_targets(&mut self, targets: &[Expression]) -> ElabResult<Option<Vec<QubitId>>> {
        if targets.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            self.resolve_flat_targets(targets)?
                .into_iter()
                .map(QubitId)
                .collect(),
        ))
    }

    fn resolve_flat_targets(&mut self, targets: &[Expression]) -> ElabResult<Vec<u32>> {
        Ok(self
            .resolve_target_lists(targets)?
            .into_iter()
            .flatten()
            .collect())
    }

    fn build_observable(
        &mut self,
        spec: &ObservableSpec,
    ) -> ElabResult<(Observable, Option<Vec<QubitId>>)> {
        let mut factors = Vec::with_capacity(spec.factors.len());
        let mut factor_targets: Vec<u32> = Vec::new();

        for factor in &spec.factors {
            match factor {
                ObservableFactor::Named { name, target } => {
                    let observable = Observable::from_name(name).ok_or_else(|| {
                        ElabError::Unsupported(format!("observable '{name}'"))
                    })?;
                    if let Some(target) = target {
                        factor_targets.extend(self.resolve_qubits(target)?);
                    }
                    factors.push(observable);
                }
                ObservableFactor::Hermitian { matrix, targets } => {
                    let matrix = self.eval_matrix(matrix)?;
                    for target in targets {
                        factor_targets.extend(self.resolve_qubits(target)?);
                    }
                    factors.push(Observable::Hermitian(matrix));
                }
            }
        }

        let observable = if factors.len() == 1 {
            factors.remove(0)
        } else {
            Observable::Tensor(factors)
        };

        let targets = if !factor_targets.is_empty() {
            Some(factor_targets.into_iter().map(QubitId).collect::<Vec<_>>())
        } else {
            self.optional_targets(&spec.targets)?
        };

        if let Some(targets) = &targets {
            let expected = observable.num_qubits();
            if targets.len() != expected {
                return Err(ElabError::TargetCount {
                    kind: "observable".into(),
                    expected,
                    got: targets.len(),
                });
            }
        }

        Ok((observable, targets))
    }

    fn eval_matrix(&mut self, rows: &[Vec<Expression>]) -> ElabResult<SquareMatrix> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut entries = Vec::with_capacity(row.len());
            for entry in row {
                entries.push(self.eval(entry)?.as_complex()?);
            }
            out.push(entries);
        }
        SquareMatrix::from_rows(out).map_err(ElabError::from)
    }
}

fn binary_of(op: AssignOp) -> BinaryOp {
    match op {
        AssignOp::Assign => unreachable!("plain assignment has no binary form"),
        AssignOp::Add => BinaryOp::Add,
        AssignOp::Sub => BinaryOp::Sub,
        AssignOp::Mul => BinaryOp::Mul,
        AssignOp::Div => BinaryOp::Div,
        AssignOp::BitAnd => BinaryOp::BitAnd,
        AssignOp::BitOr => BinaryOp::BitOr,
        AssignOp::BitXor => BinaryOp::BitXor,
        AssignOp::Shl => BinaryOp::Shl,
        AssignOp::Shr => BinaryOp::Shr,
    }
}

fn json_to_value(json: &serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(Value::Int(i128::from(v)))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::String(s)
            if !s.is_empty() && s.chars().all(|c| c == '0' || c == '1') =>
        {
            Some(Value::Bits(s.chars().map(|c| c == '1').collect()))
        }
        serde_json::Value::Array(items) => {
            let values: Option<Vec<Value>> = items.iter().map(json_to_value).collect();
            Some(Value::Array(values?))
        }
        _ => None,
    }
}

fn build_channel(name: &str, args: &[f64]) -> ElabResult<NoiseChannel> {
    let expect = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(ElabError::ChannelParamCount {
                channel: name.to_string(),
                expected: n,
                got: args.len(),
            })
        }
    };
    let channel = match name {
        "bit_flip" => {
            expect(1)?;
            NoiseChannel::BitFlip {
                probability: args[0],
            }
        }
        "phase_flip" => {
            expect(1)?;
            NoiseChannel::PhaseFlip {
                probability: args[0],
            }
        }
        "pauli_channel" => {
            expect(3)?;
            NoiseChannel::PauliChannel {
                px: args[0],
                py: args[1],
                pz: args[2],
            }
        }
        "depolarizing" => {
            expect(1)?;
            NoiseChannel::Depolarizing {
                probability: args[0],
            }
        }
        "two_qubit_depolarizing" => {
            expect(1)?;
            NoiseChannel::TwoQubitDepolarizing {
                probability: args[0],
            }
        }
        "two_qubit_dephasing" => {
            expect(1)?;
            NoiseChannel::TwoQubitDephasing {
                probability: args[0],
            }
        }
        "amplitude_damping" => {
            expect(1)?;
            NoiseChannel::AmplitudeDamping { gamma: args[0] }
        }
        "generalized_amplitude_damping" => {
            expect(2)?;
            NoiseChannel::GeneralizedAmplitudeDamping {
                gamma: args[0],
                probability: args[1],
            }
        }
        "phase_damping" => {
            expect(1)?;
            NoiseChannel::PhaseDamping { gamma: args[0] }
        }
        other => {
            return Err(ElabError::InvalidChannel(format!(
                "unknown noise channel '{other}'"
            )));
        }
    };
    for p in channel.parameters() {
        if !(0.0..=1.0).contains(&p) {
            return Err(ElabError::InvalidChannel(format!(
                "parameter {p} outside [0, 1] for '{name}'"
            )));
        }
    }
    Ok(channel)
}

/// Kraus operators must agree in dimension and satisfy the completeness
/// relation Σ Kᵢ†Kᵢ = I within numerical tolerance.
fn validate_kraus(operators: &[SquareMatrix]) -> ElabResult<()> {
    let first = operators.first().ok_or(ElabError::Ir(IrError::EmptyKraus))?;
    let dim = first.dim();
    if operators.iter().any(|m| m.dim() != dim) {
        return Err(ElabError::InvalidChannel(
            "kraus operators differ in dimension".into(),
        ));
    }

    let mut sum = vec![Complex64::new(0.0, 0.0); dim * dim];
    for op in operators {
        let product = op.dagger().matmul(op).map_err(ElabError::from)?;
        for (acc, v) in sum.iter_mut().zip(product.elements()) {
            *acc += v;
        }
    }
    let identity = SquareMatrix::identity(dim);
    let deviation = sum
        .iter()
        .zip(identity.elements())
        .map(|(a, b)| (a - b).norm())
        .fold(0.0f64, f64::max);
    if deviation > 1e-6 {
        return Err(ElabError::InvalidChannel(
            "kraus operators do not satisfy the completeness relation".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn elaborate(source: &str) -> ElabResult<Circuit> {
        let program = parse(source).expect("parse");
        Visitor::new(FxHashMap::default()).run(&program)
    }

    #[test]
    fn test_simple_circuit() {
        let circuit = elaborate("qubit[2] q; h q[0]; cnot q[0], q[1];").unwrap();
        assert_eq!(circuit.qubit_count(), 2);
        assert_eq!(circuit.instructions().len(), 2);
        assert_eq!(circuit.instructions()[0].operator.name(), "h");
        assert_eq!(
            circuit.instructions()[1].targets,
            vec![QubitId(0), QubitId(1)]
        );
    }

    #[test]
    fn test_for_loop_unrolls_in_order() {
        let circuit =
            elaborate("qubit[3] q; for uint i in [0:2] { x q[i]; }").unwrap();
        assert_eq!(circuit.instructions().len(), 3);
        for (i, inst) in circuit.instructions().iter().enumerate() {
            assert_eq!(inst.targets, vec![QubitId(i as u32)]);
        }
    }

    #[test]
    fn test_induction_variable_out_of_scope() {
        let err = elaborate("qubit q; for uint i in [0:1] { x q; } x q[i];").unwrap_err();
        assert!(matches!(err, ElabError::UndefinedIdentifier(name) if name == "i"));
    }

    #[test]
    fn test_const_is_immutable() {
        let err = elaborate("const int[8] n = 3; n = 4;").unwrap_err();
        assert!(matches!(err, ElabError::ConstAssignment(name) if name == "n"));
    }

    #[test]
    fn test_while_and_assignment() {
        let circuit = elaborate(
            "qubit q; int[8] n = 0; while (n < 3) { x q; n = n + 1; }",
        )
        .unwrap();
        assert_eq!(circuit.instructions().len(), 3);
    }

    #[test]
    fn test_break_and_continue() {
        let circuit = elaborate(
            "qubit q;
             for uint i in [0:9] {
                 if (i == 2) { break; }
                 if (i == 0) { continue; }
                 x q;
             }",
        )
        .unwrap();
        // Only i == 1 reaches the gate call.
        assert_eq!(circuit.instructions().len(), 1);
    }

    #[test]
    fn test_switch_selects_case() {
        let circuit = elaborate(
            "qubit q; int[8] n = 1;
             switch (n) { case 0 { x q; } case 1, 2 { h q; } default { z q; } }",
        )
        .unwrap();
        assert_eq!(circuit.instructions().len(), 1);
        assert_eq!(circuit.instructions()[0].operator.name(), "h");
    }

    #[test]
    fn test_missing_input_named() {
        let err = elaborate("input int[8] n;").unwrap_err();
        assert!(matches!(err, ElabError::MissingInput(name) if name == "n"));
    }

    #[test]
    fn test_output_unsupported() {
        assert!(matches!(
            elaborate("output int[8] n;"),
            Err(ElabError::Unsupported(_))
        ));
    }

    #[test]
    fn test_measure_records_qubits() {
        let circuit = elaborate("qubit[2] q; bit[2] c; h q[0]; c = measure q;").unwrap();
        assert_eq!(circuit.measured_qubits(), &[QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_unknown_gate() {
        assert!(matches!(
            elaborate("qubit q; warp q;"),
            Err(ElabError::UnknownGate(name)) if name == "warp"
        ));
    }

    #[test]
    fn test_gate_broadcast() {
        let circuit = elaborate("qubit[4] q; h q;").unwrap();
        assert_eq!(circuit.instructions().len(), 4);
        for (i, inst) in circuit.instructions().iter().enumerate() {
            assert_eq!(inst.targets, vec![QubitId(i as u32)]);
        }
    }

    #[test]
    fn test_function_call_emits_at_call_site() {
        let circuit = elaborate(
            "qubit[2] q;
             def flip(qubit a) { x a; }
             flip(q[1]);
             flip(q[0]);",
        )
        .unwrap();
        assert_eq!(circuit.instructions().len(), 2);
        assert_eq!(circuit.instructions()[0].targets, vec![QubitId(1)]);
        assert_eq!(circuit.instructions()[1].targets, vec![QubitId(0)]);
    }

    #[test]
    fn test_function_return_value() {
        let circuit = elaborate(
            "qubit[4] q;
             def pick() -> int[8] { return 2; }
             int[8] n = pick();
             x q[n];",
        )
        .unwrap();
        assert_eq!(circuit.instructions()[0].targets, vec![QubitId(2)]);
    }

    #[test]
    fn test_hardware_qubits_extend_space() {
        let circuit = elaborate("cnot $0, $3;").unwrap();
        assert_eq!(circuit.qubit_count(), 4);
        assert_eq!(
            circuit.instructions()[0].targets,
            vec![QubitId(0), QubitId(3)]
        );
    }

    #[test]
    fn test_input_binding_coercion() {
        let mut inputs = FxHashMap::default();
        inputs.insert("n".to_string(), serde_json::json!(3));
        let program = parse("qubit[4] q; input uint[4] n; x q[n];").expect("parse");
        let circuit = Visitor::new(inputs).run(&program).unwrap();
        assert_eq!(circuit.instructions()[0].targets, vec![QubitId(3)]);
    }

    #[test]
    fn test_verbatim_pragma_records() {
        let circuit = elaborate("#pragma braket verbatim\nqubit q; x q;").unwrap();
        assert!(circuit.is_verbatim());
        assert_eq!(circuit.instructions().len(), 1);
    }
}
