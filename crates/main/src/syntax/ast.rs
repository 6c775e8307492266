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

use crate::{compiler::NormalizationConfig, runtime::Value};

/// A syntax tree of the expression.
///
/// Every node keeps the byte offset of its term in the source text. The
/// positions are used to attribute the compilation errors and the program
/// commands to the source.
#[derive(Clone, Debug)]
pub enum Ast {
    /// A number, string, or boolean literal.
    Literal(Literal),

    /// An identifier: a name written without parentheses.
    Identifier {
        /// The name as written in the source.
        name: CompactString,

        /// The offset of the name.
        position: usize,
    },

    /// A function call.
    Function {
        /// The function name as written in the source.
        name: CompactString,

        /// The call arguments.
        args: Vec<Ast>,

        /// The offset of the function name.
        position: usize,
    },

    /// A unary operator application.
    UnaryOp {
        /// The operator symbol or its alphabetic alias.
        operator: CompactString,

        /// The operand.
        arg: Box<Ast>,

        /// The offset of the operator.
        position: usize,
    },

    /// A binary operator application.
    ///
    /// The subscript `a[b]` is represented by the `[]` operator.
    BinaryOp {
        /// The operator symbol or its alphabetic alias.
        operator: CompactString,

        /// The left-hand side operand.
        lhs: Box<Ast>,

        /// The right-hand side operand.
        rhs: Box<Ast>,

        /// The offset of the operator.
        position: usize,
    },

    /// The conditional operator `q ? t : f`.
    Conditional {
        /// The condition.
        q: Box<Ast>,

        /// The result if the condition is true.
        t: Box<Ast>,

        /// The result if the condition is false.
        f: Box<Ast>,

        /// The offset of the `?` symbol.
        position: usize,

        /// The offset of the `:` symbol.
        colon_position: usize,
    },
}

/// A literal value of the [Ast].
#[derive(Clone, Debug)]
pub struct Literal {
    /// The value of the literal.
    pub value: Value,

    /// The format of the literal in the source text.
    pub hint: LiteralHint,

    /// The offset of the literal.
    pub position: usize,
}

/// The source format of a number literal, which the normalizer may preserve.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum LiteralHint {
    /// Decimal integers, plain floats, and non-number literals.
    #[default]
    None,

    /// A float written with the exponent.
    Scientific,

    /// An integer written with the `0x` prefix.
    Hexadecimal,

    /// An integer written with the `0o` prefix.
    Octal,

    /// An integer written with the `0b` prefix.
    Binary,
}

impl Ast {
    /// Returns the source offset of the node.
    #[inline(always)]
    pub fn position(&self) -> usize {
        match self {
            Self::Literal(literal) => literal.position,
            Self::Identifier { position, .. }
            | Self::Function { position, .. }
            | Self::UnaryOp { position, .. }
            | Self::BinaryOp { position, .. }
            | Self::Conditional { position, .. } => *position,
        }
    }

    /// Applies the syntax-level simplifications enabled in the `config`.
    ///
    /// Currently, this folds the `+` and `-` unary operators applied to the
    /// number literals into the literals.
    pub fn optimize(self, config: &NormalizationConfig) -> Self {
        if !config.remove_redundant_unary_ops_on_number_literals {
            return self;
        }

        self.fold_signs()
    }

    fn fold_signs(self) -> Self {
        match self {
            Self::Literal(..) | Self::Identifier { .. } => self,

            Self::Function {
                name,
                args,
                position,
            } => Self::Function {
                name,
                args: args.into_iter().map(Self::fold_signs).collect(),
                position,
            },

            Self::UnaryOp {
                operator,
                arg,
                position,
            } => {
                let arg = arg.fold_signs();

                let Self::Literal(literal) = arg else {
                    return Self::UnaryOp {
                        operator,
                        arg: Box::new(arg),
                        position,
                    };
                };

                let value = match (operator.as_str(), &literal.value) {
                    ("+", Value::Integer(_) | Value::Float(_)) => Some(literal.value.clone()),
                    ("-", Value::Integer(value)) => Some(Value::Integer(value.wrapping_neg())),
                    ("-", Value::Float(value)) => Some(Value::Float(-value)),
                    _ => None,
                };

                match value {
                    Some(value) => Self::Literal(Literal {
                        value,
                        hint: literal.hint,
                        position,
                    }),

                    None => Self::UnaryOp {
                        operator,
                        arg: Box::new(Self::Literal(literal)),
                        position,
                    },
                }
            }

            Self::BinaryOp {
                operator,
                lhs,
                rhs,
                position,
            } => Self::BinaryOp {
                operator,
                lhs: Box::new(lhs.fold_signs()),
                rhs: Box::new(rhs.fold_signs()),
                position,
            },

            Self::Conditional {
                q,
                t,
                f,
                position,
                colon_position,
            } => Self::Conditional {
                q: Box::new(q.fold_signs()),
                t: Box::new(t.fold_signs()),
                f: Box::new(f.fold_signs()),
                position,
                colon_position,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::NormalizationConfig,
        runtime::{Arena, Value},
        syntax::{Ast, DefaultParser, OperatorTable, Parser},
    };

    #[test]
    fn test_sign_folding() {
        let mut operators = OperatorTable::new(true);

        let _ = operators.add_unary("-");
        let _ = operators.add_unary("+");
        let _ = operators.add_binary("*", 900);

        let ast = DefaultParser
            .parse("- -3 * +2.5", &operators, &mut Arena::new())
            .unwrap();

        let Ast::BinaryOp { lhs, rhs, .. } = ast.optimize(&NormalizationConfig::new()) else {
            panic!("Binary operator expected.");
        };

        let Ast::Literal(lhs) = *lhs else {
            panic!("Literal expected.");
        };

        let Ast::Literal(rhs) = *rhs else {
            panic!("Literal expected.");
        };

        assert_eq!(lhs.value, Value::Integer(3));
        assert_eq!(lhs.position, 0);
        assert_eq!(rhs.value, Value::Float(2.5));
    }
}
