////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{mem::take, sync::Arc};

use compact_str::CompactString;

use crate::{
    compiler::Compiler,
    interpret::{
        Assembly,
        CmdIndex,
        Cmd,
        Command,
        ConstantCmd,
        Decompile,
        FunctionCmd,
        SubroutineCmd,
        SubroutineTarget,
    },
    plugins::{
        AutoCastQuery,
        BinaryOpQuery,
        BoundCallback,
        Cast,
        CompileArg,
        FunctionQuery,
        Resolution,
        UnaryOpQuery,
        CONDITIONAL_OPERATOR,
    },
    report::system_panic,
    runtime::{ExpressionError, ExpressionResult, Scope, Type, Value},
    syntax::NormalizeHook,
};

// Q-jump and T-jump positions of an open conditional operator.
struct ConditionalEntry {
    q_jump: CmdIndex,
    t_jump: CmdIndex,
    constant_q: Option<bool>,
}

/// Builds the bytecode of a single expression from the syntax tree walk
/// performed by the normalizer.
///
/// The result stack holds, for every operand produced so far, the index of
/// the last command that computes this operand. Operator and function
/// resolutions collapse the top entries of the stack into one.
pub(crate) struct Assembler<'a> {
    compiler: &'a Compiler,
    scope: &'a mut Scope<'static>,
    source: Arc<str>,
    depth: usize,
    commands: Vec<Command>,
    results: Vec<CmdIndex>,
    conditionals: Vec<ConditionalEntry>,
    optimizations: usize,
}

impl<'a> NormalizeHook for Assembler<'a> {
    fn literal(&mut self, value: &Value, position: usize, normalized: usize) -> ExpressionResult<()> {
        self.commands.push(Command::constant(
            value.clone(),
            Decompile::Literal,
            position,
            normalized,
        ));

        self.push_result();

        Ok(())
    }

    #[inline(always)]
    fn string(&mut self, text: &str) -> Value {
        self.scope.alloc_str(text)
    }

    fn function(
        &mut self,
        name: &str,
        arity: isize,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<CompactString> {
        let compiler = self.compiler;
        let nested = compiler.nested_function();

        if arity >= 0 && nested.matches(name) {
            self.assemble_nested_function(arity as usize, position, normalized)?;

            return Ok(nested.name.clone());
        }

        let config = compiler.config();
        let args_count = arity.max(0) as usize;
        let args = self.args(args_count);

        let all_args_const = !config.no_optimization && args.iter().all(CompileArg::is_const);

        let mut hints = Vec::new();
        let mut resolved = None;

        for plugin in compiler.plugins() {
            let mut query = FunctionQuery {
                compiler,
                scope: &mut *self.scope,
                name: CompactString::from(name),
                args: &args,
                no_parentheses: arity < 0,
                all_args_const,
                hints: take(&mut hints),
            };

            let result = plugin.try_function(&mut query);

            hints = query.hints;
            let canonical = query.name;

            match result {
                Ok(None) => continue,

                Ok(Some(resolution)) => {
                    resolved = Some((resolution, canonical, CompactString::from(plugin.name())));
                    break;
                }

                Err(error) => return Err(self.plugin_error(plugin.name(), error, position)),
            }
        }

        match resolved {
            Some((Resolution::Constant(value), canonical, plugin)) => {
                let decompile = match args_count > 0 {
                    true => {
                        self.optimizations += 1;
                        Decompile::Optimized
                    }

                    false => Decompile::Literal,
                };

                let start = self.code_start(args_count);

                self.commands.truncate(start);

                let mut command = Command::constant(value, decompile, position, normalized);

                command.plugin = plugin;

                self.commands.push(command);
                self.collapse_results(args_count);

                Ok(canonical)
            }

            Some((Resolution::Callback(callback), canonical, plugin)) => {
                let decompile = match arity < 0 {
                    true => Decompile::Identifier(canonical.clone()),
                    false => Decompile::Function(canonical.clone()),
                };

                self.push_call(&callback, arity, decompile, plugin, position, normalized);
                self.collapse_results(args_count);

                Ok(canonical)
            }

            Some((Resolution::Identity, canonical, plugin)) => {
                if args_count != 1 {
                    system_panic!(
                        "Plugin {plugin:?} resolved function {canonical:?} with {args_count} \
                        arguments as identity.",
                    );
                }

                Ok(canonical)
            }

            None => {
                if arity == 0 && config.allow_compile_time_nested_expressions {
                    match compiler.get_named_at(name, self.depth + 1) {
                        Ok(expression) => {
                            let result_type = expression.result_type();

                            self.commands.push(Command::subroutine(
                                SubroutineTarget::Embedded(expression),
                                result_type,
                                Decompile::Function(CompactString::from(name)),
                                position,
                                normalized,
                            ));

                            self.push_result();

                            return Ok(CompactString::from(name));
                        }

                        Err(error) if is_not_found(&error) => (),

                        Err(error) => return Err(error.with_source(&self.source, position)),
                    }
                }

                let error = match arity < 0 {
                    true => ExpressionError::UnknownIdentifier {
                        name: CompactString::from(name),
                        suggestion: compiler.suggest(name),
                    },

                    false => {
                        let types = args.iter().map(|arg| arg.ty).collect::<Vec<_>>();

                        ExpressionError::UnknownFunction {
                            name: CompactString::from(name),
                            signature: compiler.write_function_signature(&types, false),
                            hints,
                            suggestion: compiler.suggest(name),
                        }
                    }
                };

                Err(error.with_source(&self.source, position))
            }
        }
    }

    fn unary_op(
        &mut self,
        operator: &str,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<CompactString> {
        let compiler = self.compiler;
        let config = compiler.config();

        let operator = match compiler.operators().unary_alias(operator) {
            Some(alias) => alias.symbol.clone(),
            None => CompactString::from(operator),
        };

        let arg_result = self.results.len() - 1;
        let original_type = self.result_type(arg_result);

        if operator == compiler.nested_operator()
            && original_type == Type::String
            && config.allow_compile_time_nested_expressions
        {
            self.assemble_nested_operator(&operator, position, normalized)?;

            return Ok(operator);
        }

        for pass in 0..2 {
            let arg = self.arg(arg_result);
            let arg_is_const = !config.no_optimization && arg.is_const();

            let mut resolved = None;

            for plugin in compiler.plugins() {
                let mut query = UnaryOpQuery {
                    compiler,
                    scope: &mut *self.scope,
                    operator: operator.clone(),
                    arg: &arg,
                    arg_is_const,
                };

                let result = plugin.try_unary_op(&mut query);
                let resolved_operator = query.operator;

                match result {
                    Ok(None) => continue,

                    Ok(Some(resolution)) => {
                        resolved = Some((
                            resolution,
                            resolved_operator,
                            CompactString::from(plugin.name()),
                        ));
                        break;
                    }

                    Err(error) => return Err(self.plugin_error(plugin.name(), error, position)),
                }
            }

            match resolved {
                Some((Resolution::Constant(value), resolved_operator, plugin)) => {
                    self.optimizations += 1;

                    let start = self.code_start(1);

                    self.commands.truncate(start);

                    let mut command =
                        Command::constant(value, Decompile::Optimized, position, normalized);

                    command.plugin = plugin;

                    self.commands.push(command);
                    self.set_last_result();

                    return Ok(resolved_operator);
                }

                Some((Resolution::Callback(callback), resolved_operator, plugin)) => {
                    self.push_call(
                        &callback,
                        1,
                        Decompile::UnaryOp(resolved_operator.clone()),
                        plugin,
                        position,
                        normalized,
                    );

                    self.set_last_result();

                    return Ok(resolved_operator);
                }

                Some((Resolution::Identity, resolved_operator, _)) => return Ok(resolved_operator),

                None if pass == 0 => {
                    let Some((Some(cast), _, plugin)) =
                        self.query_auto_cast(&operator, &[arg], position)?
                    else {
                        break;
                    };

                    self.apply_cast(arg_result, cast, plugin, position, normalized);
                }

                None => break,
            }
        }

        Err(ExpressionError::UnaryOperatorNotDefined {
            operator,
            ty: compiler.type_name(original_type),
        }
        .with_source(&self.source, position))
    }

    fn binary_op(
        &mut self,
        operator: &str,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<CompactString> {
        let compiler = self.compiler;
        let config = compiler.config();

        let operator = match compiler.operators().binary_alias(operator) {
            Some(alias) => alias.symbol.clone(),
            None => CompactString::from(operator),
        };

        let lhs_result = self.results.len() - 2;
        let rhs_result = self.results.len() - 1;

        let lhs_type = self.result_type(lhs_result);
        let rhs_type = self.result_type(rhs_result);

        let mut cast_tried = false;

        loop {
            let lhs = self.arg(lhs_result);
            let rhs = self.arg(rhs_result);

            let lhs_is_const = !config.no_optimization && lhs.is_const();
            let rhs_is_const = !config.no_optimization && rhs.is_const();

            let mut resolved = None;

            for plugin in compiler.plugins() {
                let mut query = BinaryOpQuery {
                    compiler,
                    scope: &mut *self.scope,
                    operator: operator.clone(),
                    lhs: &lhs,
                    rhs: &rhs,
                    lhs_is_const,
                    rhs_is_const,
                };

                let result = plugin.try_binary_op(&mut query);
                let resolved_operator = query.operator;

                match result {
                    Ok(None) => continue,

                    Ok(Some(resolution)) => {
                        resolved = Some((
                            resolution,
                            resolved_operator,
                            CompactString::from(plugin.name()),
                        ));
                        break;
                    }

                    Err(error) => return Err(self.plugin_error(plugin.name(), error, position)),
                }
            }

            match resolved {
                Some((Resolution::Identity, resolved_operator, plugin)) => {
                    self.optimizations += 1;

                    match (lhs_is_const, rhs_is_const) {
                        (true, _) => {
                            let _ = self.commands.remove(self.results[lhs_result]);
                        }

                        (false, true) => {
                            let _ = self.commands.pop();
                        }

                        (false, false) => system_panic!(
                            "Plugin {plugin:?} resolved operator {resolved_operator:?} \
                            with non-constant operands as identity.",
                        ),
                    }

                    self.collapse_results(2);

                    return Ok(resolved_operator);
                }

                Some((Resolution::Constant(value), resolved_operator, plugin)) => {
                    self.optimizations += 1;

                    let start = self.code_start(2);

                    self.commands.truncate(start);

                    let mut command =
                        Command::constant(value, Decompile::Optimized, position, normalized);

                    command.plugin = plugin;

                    self.commands.push(command);
                    self.collapse_results(2);

                    return Ok(resolved_operator);
                }

                Some((Resolution::Callback(callback), resolved_operator, plugin)) => {
                    self.push_call(
                        &callback,
                        2,
                        Decompile::BinaryOp(resolved_operator.clone()),
                        plugin,
                        position,
                        normalized,
                    );

                    self.collapse_results(2);

                    return Ok(resolved_operator);
                }

                None => (),
            }

            if cast_tried {
                break;
            }

            cast_tried = true;

            let Some((lhs_cast, rhs_cast, plugin)) =
                self.query_auto_cast(&operator, &[lhs, rhs], position)?
            else {
                break;
            };

            if lhs_cast.is_none() && rhs_cast.is_none() {
                break;
            }

            if let Some(cast) = lhs_cast {
                self.apply_cast(lhs_result, cast, plugin.clone(), position, normalized);
            }

            if let Some(cast) = rhs_cast {
                self.apply_cast(rhs_result, cast, plugin, position, normalized);
            }
        }

        Err(ExpressionError::BinaryOperatorNotDefined {
            operator,
            lhs: compiler.type_name(lhs_type),
            rhs: compiler.type_name(rhs_type),
        }
        .with_source(&self.source, position))
    }

    fn conditional_q(&mut self, position: usize, normalized: usize) -> ExpressionResult<()> {
        let mut constant_q = None;

        if !self.compiler.config().no_optimization {
            if let Some(last) = self.commands.last() {
                if last.is_constant() {
                    constant_q = last.constant_value().map(Value::is_truthy);

                    self.optimizations += 1;
                    let _ = self.commands.pop();
                }
            }
        }

        let q_jump = self.commands.len();

        self.commands.push(Command::jump(true, position, normalized));
        self.set_last_result();

        self.conditionals.push(ConditionalEntry {
            q_jump,
            t_jump: 0,
            constant_q,
        });

        Ok(())
    }

    fn conditional_t(&mut self, position: usize, normalized: usize) -> ExpressionResult<()> {
        let t_jump = self.commands.len();

        self.commands.push(Command::jump(false, position, normalized));
        self.set_last_result();

        let Some(entry) = self.conditionals.last_mut() else {
            system_panic!("Conditional stack is empty on the true branch end.");
        };

        entry.t_jump = t_jump;

        let distance = self.commands.len() - entry.q_jump;

        self.commands[entry.q_jump].set_distance(distance);

        Ok(())
    }

    fn conditional_f(&mut self, position: usize, normalized: usize) -> ExpressionResult<()> {
        let Some(mut entry) = self.conditionals.pop() else {
            system_panic!("Conditional stack is empty on the false branch end.");
        };

        if self.results.len() < 3 {
            system_panic!("Result stack underflow on the false branch end.");
        }

        let t_result = self.results.len() - 2;
        let f_result = self.results.len() - 1;

        self.results[t_result] = entry.t_jump - 1;

        let distance = self.commands.len() - entry.t_jump;

        self.commands[entry.t_jump].set_distance(distance);

        if self.result_type(t_result) != self.result_type(f_result) {
            let args = [self.arg(t_result), self.arg(f_result)];

            if let Some((t_cast, f_cast, plugin)) =
                self.query_auto_cast(CONDITIONAL_OPERATOR, &args, position)?
            {
                if let Some(cast) = t_cast {
                    if self.apply_cast(t_result, cast, plugin.clone(), position, normalized) {
                        entry.t_jump += 1;

                        let distance = self.commands[entry.q_jump].distance();

                        self.commands[entry.q_jump].set_distance(distance + 1);
                    }
                }

                if let Some(cast) = f_cast {
                    if self.apply_cast(f_result, cast, plugin, position, normalized) {
                        let distance = self.commands[entry.t_jump].distance();

                        self.commands[entry.t_jump].set_distance(distance + 1);
                    }
                }
            }

            let t = self.result_type(t_result);
            let f = self.result_type(f_result);

            if t != f {
                return Err(ExpressionError::IncompatibleTypesInConditional {
                    t: self.compiler.type_name(t),
                    f: self.compiler.type_name(f),
                }
                .with_source(&self.source, position));
            }
        }

        match entry.constant_q {
            Some(false) => {
                let _ = self.commands.drain(entry.q_jump..=entry.t_jump);
            }

            Some(true) => {
                self.commands.truncate(entry.t_jump);
                let _ = self.commands.remove(entry.q_jump);
            }

            None => {
                if let Some(last) = self.commands.last_mut() {
                    last.end_of_conditional = true;
                }
            }
        }

        let _ = self.results.pop();
        let _ = self.results.pop();

        self.set_last_result();

        Ok(())
    }

    #[inline(always)]
    fn error(&mut self, error: ExpressionError, position: usize) -> ExpressionError {
        error.with_source(&self.source, position)
    }
}

impl<'a> Assembler<'a> {
    pub(crate) fn new(
        compiler: &'a Compiler,
        scope: &'a mut Scope<'static>,
        source: Arc<str>,
        depth: usize,
    ) -> Self {
        Self {
            compiler,
            scope,
            source,
            depth,
            commands: Vec::new(),
            results: Vec::new(),
            conditionals: Vec::new(),
            optimizations: 0,
        }
    }

    pub(crate) fn finalize(self) -> Assembly {
        if self.results.len() != 1 || !self.conditionals.is_empty() {
            system_panic!(
                "Unbalanced assembly. Result stack size: {}. Open conditionals: {}.",
                self.results.len(),
                self.conditionals.len(),
            );
        }

        let result_type = self.result_type(0);

        Assembly {
            commands: self.commands,
            result_type,
            optimizations: self.optimizations,
            callback_fall_through: self.compiler.config().callback_exception_fall_through,
            type_names: self.compiler.type_names().clone(),
        }
    }

    // Stack: (name) -> (result)
    // Stack: (name, default) -> (result)
    fn assemble_nested_function(
        &mut self,
        args: usize,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<()> {
        let compiler = self.compiler;
        let function = compiler.nested_function().name.clone();

        let min_args = match compiler.config().allow_compile_time_nested_expressions {
            true => 1,
            false => 2,
        };

        let stack_args = match args {
            3 => 2,
            other => other,
        };

        let mismatch = || ExpressionError::NestedExpressionCallArgumentMismatch {
            function: function.clone(),
        };

        if args < min_args || args > 3 || self.results.len() < stack_args {
            return Err(mismatch().with_source(&self.source, position));
        }

        let name_result = self.results.len() - stack_args;

        if self.result_type(name_result) != Type::String {
            return Err(mismatch().with_source(&self.source, position));
        }

        if stack_args == 2 {
            let target = match args {
                3 => SubroutineTarget::Throw,
                _ => SubroutineTarget::Fallback,
            };

            let result_type = self.result_type(name_result + 1);

            self.commands.push(Command::subroutine(
                target,
                result_type,
                Decompile::Function(function),
                position,
                normalized,
            ));

            self.collapse_results(2);

            return Ok(());
        }

        let name = self.constant_name(name_result, position)?;

        let expression = self.embed(&name, position)?;
        let result_type = expression.result_type();

        self.commands.truncate(self.results[name_result]);

        self.commands.push(Command::subroutine(
            SubroutineTarget::Embedded(expression),
            result_type,
            Decompile::NestedFunction(function),
            position,
            normalized,
        ));

        self.set_last_result();

        Ok(())
    }

    // Stack: (name) -> (result)
    fn assemble_nested_operator(
        &mut self,
        operator: &str,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<()> {
        let name_result = self.results.len() - 1;
        let name = self.constant_name(name_result, position)?;

        let expression = self.embed(&name, position)?;
        let result_type = expression.result_type();

        self.commands.truncate(self.results[name_result]);

        self.commands.push(Command::subroutine(
            SubroutineTarget::Embedded(expression),
            result_type,
            Decompile::Nested(CompactString::from(operator)),
            position,
            normalized,
        ));

        self.set_last_result();

        Ok(())
    }

    fn constant_name(&self, result: usize, position: usize) -> ExpressionResult<Arc<str>> {
        let command = &self.commands[self.results[result]];

        match (command.is_constant(), command.constant_value()) {
            (true, Some(Value::String(name))) => Ok(name.clone()),

            _ => Err(ExpressionError::NamedExpressionNotConstant.with_source(&self.source, position)),
        }
    }

    fn embed(&self, name: &str, position: usize) -> ExpressionResult<crate::compiler::Expression> {
        match self.compiler.get_named_at(name, self.depth + 1) {
            Ok(expression) => Ok(expression),

            Err(error) if is_not_found(&error) => {
                Err(ExpressionError::NestedExpressionNotFoundCompileTime {
                    name: CompactString::from(name),
                }
                .with_source(&self.source, position))
            }

            Err(error) => Err(error.with_source(&self.source, position)),
        }
    }

    // Returns the conversions of the first plugin that accepted the query.
    fn query_auto_cast(
        &mut self,
        operator: &str,
        args: &[CompileArg],
        position: usize,
    ) -> ExpressionResult<Option<(Option<Cast>, Option<Cast>, CompactString)>> {
        let compiler = self.compiler;
        let no_optimization = compiler.config().no_optimization;

        for plugin in compiler.plugins() {
            let mut query = AutoCastQuery {
                compiler,
                scope: &mut *self.scope,
                operator: CompactString::from(operator),
                args,
                is_const: !no_optimization && args.first().map(CompileArg::is_const).unwrap_or(false),
                rhs_is_const: !no_optimization && args.get(1).map(CompileArg::is_const).unwrap_or(false),
                lhs: None,
                rhs: None,
            };

            let result = plugin.try_auto_cast(&mut query);

            let lhs = query.lhs;
            let rhs = query.rhs;

            match result {
                Ok(false) => continue,
                Ok(true) => return Ok(Some((lhs, rhs, CompactString::from(plugin.name())))),
                Err(error) => return Err(self.plugin_error(plugin.name(), error, position)),
            }
        }

        Ok(None)
    }

    // Returns true if a new command was inserted.
    fn apply_cast(
        &mut self,
        result: usize,
        cast: Cast,
        plugin: CompactString,
        position: usize,
        normalized: usize,
    ) -> bool {
        let index = self.results[result];

        match cast {
            Cast::Constant(value) => {
                let command = &mut self.commands[index];

                command.result_type = value.ty();
                command.cmd = Cmd::Constant(ConstantCmd { value });
                command.decompile = Decompile::Optimized;
                command.plugin = plugin;

                false
            }

            Cast::Callback {
                callback,
                name,
                result_type,
                reverse_function,
            } => {
                self.commands.insert(
                    index + 1,
                    Command {
                        cmd: Cmd::Function(FunctionCmd { callback, arity: 1 }),
                        result_type,
                        end_of_conditional: false,
                        position,
                        normalized_position: normalized,
                        decompile: Decompile::AutoCast(reverse_function),
                        plugin,
                        callback_name: name,
                    },
                );

                for entry in &mut self.results[result..] {
                    *entry += 1;
                }

                true
            }
        }
    }

    fn push_call(
        &mut self,
        callback: &BoundCallback,
        arity: isize,
        decompile: Decompile,
        plugin: CompactString,
        position: usize,
        normalized: usize,
    ) {
        self.commands.push(Command {
            cmd: Cmd::Function(FunctionCmd {
                callback: callback.callback,
                arity,
            }),
            result_type: callback.result_type,
            end_of_conditional: false,
            position,
            normalized_position: normalized,
            decompile,
            plugin,
            callback_name: callback.name,
        });
    }

    fn plugin_error(&self, plugin: &str, error: ExpressionError, position: usize) -> ExpressionError {
        let error = match self.compiler.config().plugin_exception_fall_through
            || error.is_compiler_error()
        {
            true => error,

            false => ExpressionError::InPlugin {
                plugin: CompactString::from(plugin),
                cause: Box::new(error),
            },
        };

        error.with_source(&self.source, position)
    }

    // Index of the first command of the `args` top operands.
    #[inline(always)]
    fn code_start(&self, args: usize) -> CmdIndex {
        let len = self.results.len();

        match len.checked_sub(args + 1) {
            Some(previous) => self.results[previous] + 1,
            None => 0,
        }
    }

    #[inline(always)]
    fn result_type(&self, result: usize) -> Type {
        self.commands[self.results[result]].result_type
    }

    fn arg(&self, result: usize) -> CompileArg {
        let command = &self.commands[self.results[result]];

        CompileArg {
            ty: command.result_type,
            constant: match command.is_constant() {
                true => command.constant_value().cloned(),
                false => None,
            },
        }
    }

    fn args(&self, count: usize) -> Vec<CompileArg> {
        if self.results.len() < count {
            system_panic!("Result stack underflow.");
        }

        (self.results.len() - count..self.results.len())
            .map(|result| self.arg(result))
            .collect()
    }

    #[inline(always)]
    fn push_result(&mut self) {
        self.results.push(self.commands.len() - 1);
    }

    #[inline(always)]
    fn set_last_result(&mut self) {
        let last = self.commands.len() - 1;

        match self.results.last_mut() {
            Some(entry) => *entry = last,
            None => self.results.push(last),
        }
    }

    // Replaces the `args` top entries with the last command.
    fn collapse_results(&mut self, args: usize) {
        self.results.truncate(self.results.len() - args);
        self.push_result();
    }
}

impl Command {
    #[inline(always)]
    pub(crate) fn subroutine(
        target: SubroutineTarget,
        result_type: Type,
        decompile: Decompile,
        position: usize,
        normalized_position: usize,
    ) -> Self {
        Self {
            cmd: Cmd::Subroutine(SubroutineCmd { target }),
            result_type,
            end_of_conditional: false,
            position,
            normalized_position,
            decompile,
            plugin: CompactString::default(),
            callback_name: "",
        }
    }
}

#[inline(always)]
fn is_not_found(error: &ExpressionError) -> bool {
    matches!(error.root(), ExpressionError::NamedExpressionNotFound { .. })
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::{CompilationConfig, Compiler},
        runtime::{ExpressionError, Scope, Type, Value},
        testing::{test_compiler, test_scope},
    };

    fn in_plugin(error: &ExpressionError) -> bool {
        match error {
            ExpressionError::InPlugin { .. } => true,
            ExpressionError::WithSource { cause, .. } => in_plugin(cause),
            _ => false,
        }
    }

    #[test]
    fn test_plugin_errors() {
        let compiler = Compiler::new();

        let Err(error) = compiler.compile("Integer(\"abc\")") else {
            panic!("Compilation succeeded.");
        };

        assert!(in_plugin(&error), "{error:?}");
        assert!(matches!(error, ExpressionError::WithSource { .. }));
        assert!(matches!(error.root(), ExpressionError::InvalidArgument { .. }));

        let mut config = CompilationConfig::new();

        config.plugin_exception_fall_through = true;

        let compiler = Compiler::with_config(config);

        let Err(error) = compiler.compile("Integer(\"abc\")") else {
            panic!("Compilation succeeded.");
        };

        assert!(!in_plugin(&error), "{error:?}");
        assert!(error.position().is_some());
        assert!(matches!(error.root(), ExpressionError::InvalidArgument { .. }));
    }

    #[test]
    fn test_constant_folding() {
        let compiler = Compiler::new();

        let expression = compiler.compile("1 + 2").unwrap();

        assert_eq!(expression.program_length(), 1);
        assert!(expression.ctd_optimizations() > 0);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(3)
        );

        let expression = compiler.compile("(2 + 3) * 4 - 10 / 2").unwrap();

        assert_eq!(expression.program_length(), 1);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(15)
        );
    }

    #[test]
    fn test_disabled_optimization() {
        let mut config = CompilationConfig::new();

        config.no_optimization = true;

        let compiler = Compiler::with_config(config);

        let expression = compiler.compile("1 + 2").unwrap();

        assert_eq!(expression.program_length(), 3);
        assert_eq!(expression.ctd_optimizations(), 0);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(3)
        );

        let expression = compiler.compile("true ? 1 : 2").unwrap();

        assert_eq!(expression.program_length(), 5);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(1)
        );
    }

    #[test]
    fn test_short_circuit() {
        let compiler = Compiler::new();

        let expression = compiler.compile("true ? 1 : (1/0)").unwrap();

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(1)
        );

        let expression = compiler.compile("false ? (1/0) : 2").unwrap();

        assert_eq!(expression.program_length(), 1);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(2)
        );
    }

    #[test]
    fn test_unresolved_operator() {
        let compiler = Compiler::new();

        let Err(error) = compiler.compile("\"a\" - 3") else {
            panic!("Compilation succeeded.");
        };

        let ExpressionError::BinaryOperatorNotDefined { operator, lhs, rhs } = error.root() else {
            panic!("Unexpected error: {error}");
        };

        assert_eq!(operator.as_str(), "-");
        assert_eq!(lhs.as_str(), "String");
        assert_eq!(rhs.as_str(), "Integer");
        assert_eq!(error.position(), Some(4));
    }

    #[test]
    fn test_unknown_names() {
        let compiler = Compiler::new();

        let Err(error) = compiler.compile("1 + tru") else {
            panic!("Compilation succeeded.");
        };

        assert!(matches!(
            error.root(),
            ExpressionError::UnknownIdentifier { .. },
        ));

        let Err(error) = compiler.compile("ToUpper(1, 2)") else {
            panic!("Compilation succeeded.");
        };

        let ExpressionError::UnknownFunction {
            name,
            signature,
            hints,
            ..
        } = error.root()
        else {
            panic!("Unexpected error: {error}");
        };

        assert_eq!(name.as_str(), "ToUpper");
        assert_eq!(signature.as_str(), "(Integer, Integer)");
        assert!(!hints.is_empty());
    }

    #[test]
    fn test_conditional_jumps() {
        let compiler = test_compiler();

        for (text, a, expected) in [
            ("a > 3 ? 10 : 20", 5, 10),
            ("a > 3 ? 10 : 20", 1, 20),
            ("a > 3 ? 10 : a > 0 ? 30 : 40", 1, 30),
            ("a > 3 ? 10 : a > 0 ? 30 : 40", -1, 40),
            ("a > 3 ? a > 4 ? 50 : 60 : 70", 5, 50),
            ("a > 3 ? a > 4 ? 50 : 60 : 70", 4, 60),
            ("a > 3 ? a > 4 ? 50 : 60 : 70", 3, 70),
            ("(a > 3 ? 1 : 2) + (a > 0 ? 10 : 20)", 2, 12),
        ] {
            let expression = compiler.compile(text).unwrap();

            assert!(expression.program_length() > 1, "{text}");
            assert_eq!(
                expression.evaluate(&mut test_scope(a, 0, "")).unwrap(),
                Value::Integer(expected),
                "{text}",
            );
        }
    }

    #[test]
    fn test_nested_constant_conditionals() {
        let compiler = test_compiler();

        for (text, expected) in [
            ("true ? (false ? 1 : 2) : 3", 2),
            ("false ? 1 : (true ? 4 : 5)", 4),
            ("true ? 1 : false ? 2 : 3", 1),
            ("false ? 1 : false ? 2 : 3", 3),
            ("(true ? false : true) ? 6 : 7", 7),
        ] {
            let expression = compiler.compile(text).unwrap();

            assert_eq!(expression.program_length(), 1, "{text}");
            assert_eq!(
                expression.evaluate(&mut Scope::new()).unwrap(),
                Value::Integer(expected),
                "{text}",
            );
        }

        for (text, a, expected) in [
            ("true ? (a > 0 ? 8 : 9) : 10", 1, 8),
            ("true ? (a > 0 ? 8 : 9) : 10", 0, 9),
            ("false ? 10 : (a > 0 ? 8 : 9)", 0, 9),
            ("a > 0 ? (true ? 1 : 2) : (false ? 3 : 4)", 0, 4),
        ] {
            let expression = compiler.compile(text).unwrap();

            assert_eq!(
                expression.evaluate(&mut test_scope(a, 0, "")).unwrap(),
                Value::Integer(expected),
                "{text}",
            );
        }
    }

    #[test]
    fn test_conditional_branch_casts() {
        let compiler = test_compiler();

        for (text, a, expected) in [
            ("a > 0 ? 1 : 2.5", 1, 1.0),
            ("a > 0 ? 1 : 2.5", 0, 2.5),
            ("a > 0 ? a : 0.5", 3, 3.0),
            ("a > 0 ? a : 0.5", 0, 0.5),
            ("a > 0 ? 0.5 : a", -2, -2.0),
            ("a > 0 ? a > 1 ? 2 : 1.5 : b", 2, 2.0),
            ("a > 0 ? a > 1 ? 2 : 1.5 : b", 1, 1.5),
            ("a > 0 ? a > 1 ? 2 : 1.5 : b", 0, 7.0),
        ] {
            let expression = compiler.compile(text).unwrap();

            assert_eq!(expression.result_type(), Type::Float, "{text}");
            assert_eq!(
                expression.evaluate(&mut test_scope(a, 7, "")).unwrap(),
                Value::Float(expected),
                "{text}",
            );
        }
    }

    #[test]
    fn test_auto_cast_to_string() {
        let compiler = test_compiler();

        let expression = compiler.compile("1 + \"a\"").unwrap();

        assert_eq!(expression.result_type(), Type::String);
        assert_eq!(expression.program_length(), 1);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::from("1a")
        );

        let expression = compiler.compile("a + \"a\"").unwrap();

        assert_eq!(expression.result_type(), Type::String);
        assert_eq!(expression.program_length(), 4);
        assert_eq!(
            expression.evaluate(&mut test_scope(1, 0, "")).unwrap(),
            Value::from("1a")
        );

        let expression = compiler.compile("s + b").unwrap();

        assert_eq!(
            expression.evaluate(&mut test_scope(0, 2, "x")).unwrap(),
            Value::from("x2")
        );
    }

    #[test]
    fn test_identity_optimization() {
        let compiler = test_compiler();

        for (text, expected) in [("a * 1", 6), ("0 + a", 6), ("a - 0", 6), ("1 * a * 1", 6)] {
            let expression = compiler.compile(text).unwrap();

            assert_eq!(expression.program_length(), 1, "{text}");
            assert!(expression.ctd_optimizations() > 0, "{text}");
            assert_eq!(
                expression.evaluate(&mut test_scope(6, 0, "")).unwrap(),
                Value::Integer(expected),
                "{text}",
            );
        }
    }
}
