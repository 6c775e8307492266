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

use std::fmt::{Arguments, Debug, Formatter};

use ahash::AHashMap;
use compact_str::CompactString;

use crate::{
    compiler::Expression,
    runtime::{Callback, Type, Value},
};

pub(crate) type CmdIndex = usize;

/// A finalized bytecode program of the compiled expression.
#[derive(Clone)]
pub(crate) struct Assembly {
    pub(crate) commands: Vec<Command>,
    pub(crate) result_type: Type,
    pub(crate) optimizations: usize,
    pub(crate) callback_fall_through: bool,
    pub(crate) type_names: AHashMap<Type, CompactString>,
}

impl Assembly {
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn type_name(&self, ty: &Type) -> CompactString {
        if let Some(name) = self.type_names.get(ty) {
            return name.clone();
        }

        match ty.builtin_name() {
            Some(name) => CompactString::from(name),
            None => CompactString::from("<Unknown Type>"),
        }
    }

    pub(crate) fn debug(
        &self,
        formatter: &mut Formatter<'_>,
        mut indent: usize,
        name: &str,
        normalized: &str,
    ) -> std::fmt::Result {
        formatter.write_str("Expression {\n")?;

        indent += 1;

        println(formatter, indent, format_args!("name: {name:?}"))?;
        println(formatter, indent, format_args!("normalized: {normalized:?}"))?;
        println(
            formatter,
            indent,
            format_args!("result: {}", self.type_name(&self.result_type)),
        )?;
        println(
            formatter,
            indent,
            format_args!("optimizations: {}", self.optimizations),
        )?;

        if !self.commands.is_empty() {
            println(formatter, indent, format_args!("commands:"))?;

            indent += 1;

            for (index, command) in self.commands.iter().enumerate() {
                command.debug(formatter, indent, index, self)?;
            }

            indent -= 1;
        }

        indent -= 1;

        println(formatter, indent, format_args!("}}"))?;

        Ok(())
    }
}

/// A single bytecode command together with its static attributes.
#[derive(Clone)]
pub(crate) struct Command {
    pub(crate) cmd: Cmd,
    pub(crate) result_type: Type,
    pub(crate) end_of_conditional: bool,
    pub(crate) position: usize,
    pub(crate) normalized_position: usize,
    pub(crate) decompile: Decompile,
    pub(crate) plugin: CompactString,
    pub(crate) callback_name: &'static str,
}

impl Command {
    #[inline(always)]
    pub(crate) fn constant(
        value: Value,
        decompile: Decompile,
        position: usize,
        normalized_position: usize,
    ) -> Self {
        Self {
            result_type: value.ty(),
            cmd: Cmd::Constant(ConstantCmd { value }),
            end_of_conditional: false,
            position,
            normalized_position,
            decompile,
            plugin: CompactString::default(),
            callback_name: "",
        }
    }

    #[inline(always)]
    pub(crate) fn jump(conditional: bool, position: usize, normalized_position: usize) -> Self {
        Self {
            cmd: match conditional {
                true => Cmd::JumpIfFalse(JumpIfFalseCmd { distance: 0 }),
                false => Cmd::Jump(JumpCmd { distance: 0 }),
            },
            result_type: Type::Void,
            end_of_conditional: false,
            position,
            normalized_position,
            decompile: Decompile::Jump,
            plugin: CompactString::default(),
            callback_name: "",
        }
    }

    /// Returns true if the command pushes a constant that may take part in
    /// constant folding. A constant that ends a conditional branch is not
    /// foldable.
    #[inline(always)]
    pub(crate) fn is_constant(&self) -> bool {
        matches!(&self.cmd, Cmd::Constant(..)) && !self.end_of_conditional
    }

    #[inline(always)]
    pub(crate) fn constant_value(&self) -> Option<&Value> {
        match &self.cmd {
            Cmd::Constant(ConstantCmd { value }) => Some(value),
            _ => None,
        }
    }

    #[inline(always)]
    pub(crate) fn set_distance(&mut self, new_distance: usize) {
        match &mut self.cmd {
            Cmd::JumpIfFalse(JumpIfFalseCmd { distance }) | Cmd::Jump(JumpCmd { distance }) => {
                *distance = new_distance
            }

            _ => (),
        }
    }

    #[inline(always)]
    pub(crate) fn distance(&self) -> usize {
        match &self.cmd {
            Cmd::JumpIfFalse(JumpIfFalseCmd { distance }) | Cmd::Jump(JumpCmd { distance }) => {
                *distance
            }

            _ => 0,
        }
    }

    fn debug(
        &self,
        formatter: &mut Formatter<'_>,
        indent: usize,
        index: CmdIndex,
        assembly: &Assembly,
    ) -> std::fmt::Result {
        let ty = assembly.type_name(&self.result_type);
        let position = self.normalized_position;

        let provenance = match self.plugin.is_empty() {
            true => String::new(),
            false => format!(", plugin {:?}", self.plugin.as_str()),
        };

        match &self.cmd {
            Cmd::Constant(ConstantCmd { value }) => {
                let kind = match &self.decompile {
                    Decompile::Optimized => "optimization constant",
                    _ => "literal constant",
                };

                let eoc = match self.end_of_conditional {
                    true => " eoc",
                    false => "",
                };

                println(
                    formatter,
                    indent,
                    format_args!(
                        "{index}: <{ty}> push {value:?}{eoc} // {kind} at {position}{provenance}"
                    ),
                )
            }

            Cmd::Function(FunctionCmd { arity, .. }) => {
                let callback = self.callback_name;
                let arity = (*arity).max(0);

                let description = match &self.decompile {
                    Decompile::UnaryOp(symbol) => format!("unary operator '{symbol}'"),
                    Decompile::BinaryOp(symbol) => format!("binary operator '{symbol}'"),
                    Decompile::Identifier(symbol) => format!("identifier \"{symbol}\""),
                    Decompile::Function(symbol) => format!("function \"{symbol}(#{arity})\""),
                    Decompile::AutoCast(Some(symbol)) => format!("auto-cast '{symbol}'"),
                    Decompile::AutoCast(None) => String::from("auto-cast"),
                    _ => String::new(),
                };

                println(
                    formatter,
                    indent,
                    format_args!(
                        "{index}: <{ty}> call {callback}(#{arity}) // {description} at \
                        {position}{provenance}"
                    ),
                )
            }

            Cmd::JumpIfFalse(JumpIfFalseCmd { distance }) => println(
                formatter,
                indent,
                format_args!("{index}: if-false {} // '?' at {position}", index + distance),
            ),

            Cmd::Jump(JumpCmd { distance }) => println(
                formatter,
                indent,
                format_args!("{index}: jump {} // ':' at {position}", index + distance),
            ),

            Cmd::Subroutine(SubroutineCmd { target }) => match target {
                SubroutineTarget::Embedded(expression) => println(
                    formatter,
                    indent,
                    format_args!(
                        "{index}: <{ty}> nested {:?} // compile-time nested expression at \
                        {position}",
                        expression.name(),
                    ),
                ),

                SubroutineTarget::Fallback => println(
                    formatter,
                    indent,
                    format_args!(
                        "{index}: <{ty}> nested (name, default) // evaluation-time nested \
                        expression at {position}"
                    ),
                ),

                SubroutineTarget::Throw => println(
                    formatter,
                    indent,
                    format_args!(
                        "{index}: <{ty}> nested (name, type, throw) // evaluation-time nested \
                        expression at {position}"
                    ),
                ),
            },
        }
    }
}

#[derive(Clone)]
pub(crate) enum Cmd {
    Constant(ConstantCmd),
    Function(FunctionCmd),
    JumpIfFalse(JumpIfFalseCmd),
    Jump(JumpCmd),
    Subroutine(SubroutineCmd),
}

// Stack: () -> (value)
#[derive(Clone)]
pub(crate) struct ConstantCmd {
    pub(crate) value: Value,
}

// Stack: (args..) -> (result)
// Negative arity denotes an identifier (no arguments, no parentheses).
#[derive(Clone)]
pub(crate) struct FunctionCmd {
    pub(crate) callback: Callback,
    pub(crate) arity: isize,
}

impl FunctionCmd {
    #[inline(always)]
    pub(crate) fn args(&self) -> usize {
        self.arity.max(0) as usize
    }
}

// Stack: (condition) -> ()
#[derive(Clone)]
pub(crate) struct JumpIfFalseCmd {
    pub(crate) distance: usize,
}

// Stack: () -> ()
#[derive(Clone)]
pub(crate) struct JumpCmd {
    pub(crate) distance: usize,
}

// Embedded: () -> (result)
// Fallback and Throw: (name, default) -> (result)
#[derive(Clone)]
pub(crate) struct SubroutineCmd {
    pub(crate) target: SubroutineTarget,
}

#[derive(Clone)]
pub(crate) enum SubroutineTarget {
    Embedded(Expression),
    Fallback,
    Throw,
}

/// Describes how a command is turned back into a syntax tree node.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum Decompile {
    Literal,
    Optimized,
    Jump,
    UnaryOp(CompactString),
    BinaryOp(CompactString),
    Identifier(CompactString),
    Function(CompactString),
    AutoCast(Option<CompactString>),
    Nested(CompactString),
    NestedFunction(CompactString),
}

impl Debug for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Command")
            .field("result_type", &self.result_type)
            .field("decompile", &self.decompile)
            .field("constant", &self.constant_value())
            .field("distance", &self.distance())
            .finish()
    }
}

#[inline(always)]
fn println(formatter: &mut Formatter<'_>, indent: usize, fmt: Arguments) -> std::fmt::Result {
    formatter.write_str(&"    ".repeat(indent))?;
    formatter.write_fmt(fmt)?;
    formatter.write_str("\n")?;

    Ok(())
}
