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

use std::mem::replace;

use compact_str::CompactString;

use crate::{
    compiler::Expression,
    interpret::{
        Assembly,
        Cmd,
        CmdIndex,
        Command,
        ConstantCmd,
        FunctionCmd,
        JumpCmd,
        JumpIfFalseCmd,
        SubroutineCmd,
        SubroutineTarget,
    },
    report::system_panic,
    runtime::{ExpressionError, ExpressionResult, Scope, Value},
};

/// Evaluates the `expression` program within the `scope`.
///
/// The call is reentrant: nested expressions are evaluated by the recursive
/// calls sharing the same scope. The scope's value stack is restored to its
/// initial height regardless of the outcome.
pub(crate) fn run(expression: &Expression, scope: &mut Scope<'_>) -> ExpressionResult<Value> {
    if scope.nested.iter().any(|nested| nested.same(expression)) {
        let mut chain = scope
            .nested
            .iter()
            .map(|nested| CompactString::from(nested.name()))
            .collect::<Vec<_>>();

        chain.push(CompactString::from(expression.name()));

        return Err(ExpressionError::CircularNestedExpressions { chain });
    }

    let previous = replace(&mut scope.compile_time, Some(expression.clone()));
    scope.nested.push(expression.clone());

    let frame_begin = scope.stack.len();

    let mut engine = Engine {
        expression,
        assembly: expression.assembly(),
        cmd_index: 0,
    };

    let result = engine.execute(scope);

    let _ = scope.nested.pop();
    scope.compile_time = previous;

    match result {
        Ok(()) => {
            if scope.stack.len() != frame_begin + 1 {
                system_panic!(
                    "Unbalanced evaluation stack of {:?}. Expected height: {}. Actual height: {}.",
                    expression.name(),
                    frame_begin + 1,
                    scope.stack.len(),
                );
            }

            Ok(scope.stack.pop().unwrap_or_default())
        }

        Err(error) => {
            scope.stack.truncate(frame_begin);

            Err(error)
        }
    }
}

struct Engine<'a> {
    expression: &'a Expression,
    assembly: &'a Assembly,
    cmd_index: CmdIndex,
}

impl<'a> Engine<'a> {
    fn execute(&mut self, scope: &mut Scope<'_>) -> ExpressionResult<()> {
        loop {
            let Some(command) = self.assembly.commands.get(self.cmd_index) else {
                return Ok(());
            };

            match &command.cmd {
                Cmd::Constant(cmd) => self.execute_constant(scope, cmd),
                Cmd::Function(cmd) => self.execute_function(scope, command, cmd)?,
                Cmd::JumpIfFalse(cmd) => self.execute_jump_if_false(scope, cmd),
                Cmd::Jump(cmd) => self.execute_jump(cmd),
                Cmd::Subroutine(cmd) => self.execute_subroutine(scope, cmd)?,
            }
        }
    }

    #[inline(always)]
    fn execute_constant(&mut self, scope: &mut Scope<'_>, cmd: &ConstantCmd) {
        let ConstantCmd { value } = cmd;

        scope.stack.push(value.clone());

        self.cmd_index += 1;
    }

    fn execute_function(
        &mut self,
        scope: &mut Scope<'_>,
        command: &Command,
        cmd: &FunctionCmd,
    ) -> ExpressionResult<()> {
        let FunctionCmd { callback, .. } = cmd;

        let stack = scope.take_stack();

        let Some(args_begin) = stack.len().checked_sub(cmd.args()) else {
            system_panic!(
                "Evaluation stack underflow in {:?} at command {}.",
                self.expression.name(),
                self.cmd_index,
            );
        };

        let result = callback(scope, &stack[args_begin..]);

        scope.stack = stack;
        scope.stack.truncate(args_begin);

        let value = match result {
            Ok(value) => value,

            Err(error) if self.assembly.callback_fall_through => return Err(error),

            Err(error) => {
                return Err(ExpressionError::InCallback {
                    callback: CompactString::from(command.callback_name),
                    expression: CompactString::from(self.expression.normalized_string()),
                    cause: Box::new(error),
                })
            }
        };

        scope.stack.push(value);

        self.cmd_index += 1;

        Ok(())
    }

    fn execute_jump_if_false(&mut self, scope: &mut Scope<'_>, cmd: &JumpIfFalseCmd) {
        let JumpIfFalseCmd { distance } = cmd;

        let condition = scope.stack.pop().unwrap_or_default();

        match condition.is_truthy() {
            true => self.cmd_index += 1,
            false => self.cmd_index += distance,
        }
    }

    #[inline(always)]
    fn execute_jump(&mut self, cmd: &JumpCmd) {
        let JumpCmd { distance } = cmd;

        self.cmd_index += distance;
    }

    fn execute_subroutine(
        &mut self,
        scope: &mut Scope<'_>,
        cmd: &SubroutineCmd,
    ) -> ExpressionResult<()> {
        let SubroutineCmd { target } = cmd;

        let value = match target {
            SubroutineTarget::Embedded(nested) => {
                run(nested, scope).map_err(|cause| ExpressionError::InNestedExpression {
                    name: CompactString::from(nested.name()),
                    cause: Box::new(cause),
                })?
            }

            SubroutineTarget::Fallback | SubroutineTarget::Throw => {
                self.execute_dynamic(scope, target)?
            }
        };

        scope.stack.push(value);

        self.cmd_index += 1;

        Ok(())
    }

    // Stack: (name, default) -> ()
    // The default value stays on the stack if the fallback applies.
    fn execute_dynamic(
        &mut self,
        scope: &mut Scope<'_>,
        target: &SubroutineTarget,
    ) -> ExpressionResult<Value> {
        let len = scope.stack.len();

        if len < 2 {
            system_panic!(
                "Evaluation stack underflow in {:?} at command {}.",
                self.expression.name(),
                self.cmd_index,
            );
        }

        let expected = scope.stack[len - 1].ty();

        let Value::String(name) = &scope.stack[len - 2] else {
            system_panic!(
                "Nested expression name is not a string in {:?} at command {}.",
                self.expression.name(),
                self.cmd_index,
            );
        };

        let name = CompactString::from(name.as_ref());

        let found = match scope.compiler() {
            Some(compiler) => compiler.get_named(&name),
            None => Err(ExpressionError::NamedExpressionNotFound { name: name.clone() }),
        };

        let nested = match found {
            Ok(nested) => nested,

            Err(error)
                if matches!(
                    error.root(),
                    ExpressionError::NamedExpressionNotFound { .. }
                ) =>
            {
                return match target {
                    SubroutineTarget::Throw => {
                        scope.stack.truncate(len - 2);

                        Err(ExpressionError::NestedExpressionNotFoundEvaluationTime { name })
                    }

                    _ => {
                        let Some(default) = scope.stack.pop() else {
                            return Ok(Value::Void);
                        };

                        scope.stack.truncate(len - 2);

                        Ok(default)
                    }
                };
            }

            Err(error) => {
                scope.stack.truncate(len - 2);

                return Err(ExpressionError::InNestedExpression {
                    name,
                    cause: Box::new(error),
                });
            }
        };

        scope.stack.truncate(len - 2);

        let value = run(&nested, scope).map_err(|cause| ExpressionError::InNestedExpression {
            name: name.clone(),
            cause: Box::new(cause),
        })?;

        let found = value.ty();

        if found != expected {
            return Err(ExpressionError::NestedExpressionResultType {
                name,
                expected: self.assembly.type_name(&expected),
                found: self.assembly.type_name(&found),
            });
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::{CompilationConfig, Compiler},
        runtime::{ExpressionError, Scope, Value},
        testing::{test_compiler, test_compiler_with, test_scope},
    };

    #[test]
    fn test_callback_errors() {
        let compiler = test_compiler();

        let expression = compiler.compile("10 / a").unwrap();

        let Err(error) = expression.evaluate(&mut test_scope(0, 0, "")) else {
            panic!("Evaluation succeeded.");
        };

        assert!(matches!(error, ExpressionError::InCallback { .. }));
        assert!(matches!(error.root(), ExpressionError::DivisionByZero));

        assert_eq!(
            expression.evaluate(&mut test_scope(5, 0, "")).unwrap(),
            Value::Integer(2),
        );
    }

    #[test]
    fn test_callback_errors_fall_through() {
        let mut config = CompilationConfig::new();

        config.callback_exception_fall_through = true;

        let compiler = test_compiler_with(config);

        let expression = compiler.compile("10 / a").unwrap();

        let Err(error) = expression.evaluate(&mut test_scope(0, 0, "")) else {
            panic!("Evaluation succeeded.");
        };

        assert!(matches!(error, ExpressionError::DivisionByZero), "{error:?}");
    }

    #[test]
    fn test_evaluation_time_nested_expressions() {
        let compiler = Compiler::new();

        assert!(!compiler.add_named("Greeting", Some("\"Hello\"")).unwrap());

        let fallback = compiler
            .compile("Expression(\"Greet\" + \"ing\", \"none\")")
            .unwrap();

        let throwing = compiler
            .compile("Expression(\"Missing\", \"\", throw)")
            .unwrap();

        let mut scope = Scope::with_compiler(&compiler);

        assert_eq!(fallback.evaluate(&mut scope).unwrap(), Value::from("Hello"));

        let Err(error) = throwing.evaluate(&mut scope) else {
            panic!("Evaluation succeeded.");
        };

        assert!(matches!(
            error.root(),
            ExpressionError::NestedExpressionNotFoundEvaluationTime { .. },
        ));

        let missing = compiler
            .compile("Expression(\"Missing\", \"none\")")
            .unwrap();

        assert_eq!(missing.evaluate(&mut scope).unwrap(), Value::from("none"));

        let mismatch = compiler.compile("Expression(\"Greeting\", 0)").unwrap();

        let Err(error) = mismatch.evaluate(&mut scope) else {
            panic!("Evaluation succeeded.");
        };

        assert!(matches!(
            error.root(),
            ExpressionError::NestedExpressionResultType { .. },
        ));

        assert_eq!(
            fallback.evaluate(&mut Scope::new()).unwrap(),
            Value::from("none"),
        );
    }

    #[test]
    fn test_circular_nested_expressions() {
        let compiler = Compiler::new();

        assert!(!compiler
            .add_named("Loop", Some("Expression(\"Lo\" + \"op\", 0)"))
            .unwrap());

        let expression = compiler.compile("1 + Expression(\"Loop\", 0)").unwrap();

        let Err(error) = expression.evaluate(&mut Scope::with_compiler(&compiler)) else {
            panic!("Evaluation succeeded.");
        };

        let ExpressionError::CircularNestedExpressions { chain } = error.root() else {
            panic!("Unexpected error: {error}");
        };

        assert_eq!(chain.len(), 3);
        assert_eq!(chain[1], "Loop");
        assert_eq!(chain[2], "Loop");
    }
}
