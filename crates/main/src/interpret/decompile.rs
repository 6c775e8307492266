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

use compact_str::CompactString;

use crate::{
    interpret::{
        Assembly,
        Cmd,
        CmdIndex,
        ConstantCmd,
        Decompile,
        FunctionCmd,
        JumpCmd,
        SubroutineCmd,
        SubroutineTarget,
    },
    report::{debug_unreachable, system_panic},
    runtime::Value,
    syntax::{Ast, Literal, LiteralHint},
};

/// Reconstructs the syntax tree of the optimized program.
///
/// The `throw` is the identifier written as the third argument of the
/// throwing nested-expression call.
pub(crate) fn decompile(assembly: &Assembly, throw: &str) -> Ast {
    let mut results = Vec::<Ast>::with_capacity(assembly.commands.len());
    let mut conditionals = Vec::<(CmdIndex, usize, usize)>::new();
    let mut questions = Vec::<usize>::new();

    for (index, command) in assembly.commands.iter().enumerate() {
        let position = command.position;

        match &command.cmd {
            Cmd::Constant(ConstantCmd { value }) => results.push(literal(value.clone(), position)),

            Cmd::Function(cmd) => {
                let FunctionCmd { arity, .. } = cmd;

                let args = pop_args(&mut results, cmd.args());

                let node = match &command.decompile {
                    Decompile::UnaryOp(operator) => Ast::UnaryOp {
                        operator: operator.clone(),
                        arg: Box::new(single(args)),
                        position,
                    },

                    Decompile::BinaryOp(operator) => {
                        let mut args = args.into_iter();

                        let (Some(lhs), Some(rhs)) = (args.next(), args.next()) else {
                            system_panic!("Binary operator command with missing operands.");
                        };

                        Ast::BinaryOp {
                            operator: operator.clone(),
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                            position,
                        }
                    }

                    Decompile::Identifier(name) if *arity < 0 => Ast::Identifier {
                        name: name.clone(),
                        position,
                    },

                    Decompile::Identifier(name) | Decompile::Function(name) => Ast::Function {
                        name: name.clone(),
                        args,
                        position,
                    },

                    Decompile::AutoCast(Some(function)) => Ast::Function {
                        name: function.clone(),
                        args,
                        position,
                    },

                    Decompile::AutoCast(None) => single(args),

                    _ => debug_unreachable!("Function command with invalid decompile kind."),
                };

                results.push(node);
            }

            Cmd::JumpIfFalse(..) => questions.push(position),

            Cmd::Jump(JumpCmd { distance }) => {
                let question = questions.pop().unwrap_or(position);

                conditionals.push((index + distance - 1, question, position));
            }

            Cmd::Subroutine(SubroutineCmd { target }) => {
                let node = match (target, &command.decompile) {
                    (SubroutineTarget::Embedded(nested), Decompile::Nested(operator)) => {
                        Ast::UnaryOp {
                            operator: operator.clone(),
                            arg: Box::new(literal(Value::from(nested.name()), position)),
                            position,
                        }
                    }

                    (SubroutineTarget::Embedded(nested), Decompile::NestedFunction(function)) => {
                        Ast::Function {
                            name: function.clone(),
                            args: vec![literal(Value::from(nested.name()), position)],
                            position,
                        }
                    }

                    (SubroutineTarget::Embedded(nested), _) => Ast::Function {
                        name: CompactString::from(nested.name()),
                        args: Vec::new(),
                        position,
                    },

                    (SubroutineTarget::Fallback, Decompile::Function(function)) => Ast::Function {
                        name: function.clone(),
                        args: pop_args(&mut results, 2),
                        position,
                    },

                    (SubroutineTarget::Throw, Decompile::Function(function)) => {
                        let mut args = pop_args(&mut results, 2);

                        args.push(Ast::Identifier {
                            name: CompactString::from(throw),
                            position,
                        });

                        Ast::Function {
                            name: function.clone(),
                            args,
                            position,
                        }
                    }

                    _ => debug_unreachable!("Subroutine command with invalid decompile kind."),
                };

                results.push(node);
            }
        }

        while let Some((end, question, colon)) = conditionals.last().copied() {
            if end != index {
                break;
            }

            let _ = conditionals.pop();

            let mut branches = pop_args(&mut results, 3).into_iter();

            let (Some(q), Some(t), Some(f)) = (branches.next(), branches.next(), branches.next())
            else {
                system_panic!("Conditional operator with missing operands.");
            };

            results.push(Ast::Conditional {
                q: Box::new(q),
                t: Box::new(t),
                f: Box::new(f),
                position: question,
                colon_position: colon,
            });
        }
    }

    if results.len() != 1 {
        system_panic!("Decompiled program leaves {} results.", results.len());
    }

    results.pop().unwrap_or(Ast::Literal(Literal {
        value: Value::Void,
        hint: LiteralHint::None,
        position: 0,
    }))
}

#[inline(always)]
fn literal(value: Value, position: usize) -> Ast {
    Ast::Literal(Literal {
        value,
        hint: LiteralHint::None,
        position,
    })
}

fn pop_args(results: &mut Vec<Ast>, count: usize) -> Vec<Ast> {
    let Some(begin) = results.len().checked_sub(count) else {
        system_panic!("Decompilation stack underflow.");
    };

    results.split_off(begin)
}

#[inline(always)]
fn single(args: Vec<Ast>) -> Ast {
    let Some(arg) = args.into_iter().next() else {
        system_panic!("Unary command without an operand.");
    };

    arg
}

#[cfg(test)]
mod tests {
    use crate::testing::{test_compiler, test_scope};

    #[test]
    fn test_optimized_strings() {
        let compiler = test_compiler();

        for (text, optimized) in [
            ("1 + 2 * 3", "7"),
            ("a + 2 * 3", "a + 6"),
            ("a * (1 + 1)", "a * 2"),
            ("true ? a : b", "a"),
            ("a > 0 ? 1 + 1 : b", "a > 0 ? 2 : b"),
            ("(a > 0 ? 1 : 2) + b", "(a > 0 ? 1 : 2) + b"),
            ("a > 0 ? 1 : 2.5", "a > 0 ? 1.0 : 2.5"),
            ("a > 0 ? 2.5 : b", "a > 0 ? 2.5 : Float(b)"),
            ("ToUpper(s) + 1", "ToUpper(s) + \"1\""),
            ("-(a)", "-a"),
            ("a * 1", "a"),
            ("Float(\"nan\") + a", "NaN + a"),
            ("1.0 / 0.0 + a", "Infinity + a"),
            ("b - -1.0 / 0.0", "b - -Infinity"),
            ("-Infinity * a", "-Infinity * a"),
        ] {
            let expression = compiler.compile(text).unwrap();

            assert_eq!(expression.optimized_string(), optimized, "{text}");
        }
    }

    #[test]
    fn test_optimized_round_trip() {
        let compiler = test_compiler();

        for text in [
            "a * 2 + b / 3 - 1",
            "a > b ? s + \"x\" : ToLower(s)",
            "a > 0 ? (b > 0 ? 1 : 2.5) : 3",
            "s * \"*.jpg\" || a == b",
            "(1 + a) * (b - 2) % 4",
            "a << 2 ^ b",
            "~a + -b",
            "Compare(s, \"abc\", true) != 0",
            "Float(\"nan\") + a",
            "1.0 / 0.0 + a",
            "b - -1.0 / 0.0",
            "-9223372036854775807 - 1 + a",
        ] {
            let expression = compiler.compile(text).unwrap();
            let optimized = compiler.compile(expression.optimized_string()).unwrap();

            // NaN results are compared by their rendering.
            for (a, b, s) in [(1, 2, "photo.jpg"), (3, -1, "ABC"), (0, 0, "")] {
                assert_eq!(
                    format!("{:?}", expression.evaluate(&mut test_scope(a, b, s)).unwrap()),
                    format!("{:?}", optimized.evaluate(&mut test_scope(a, b, s)).unwrap()),
                    "{text} / {}",
                    expression.optimized_string(),
                );
            }
        }
    }
}
