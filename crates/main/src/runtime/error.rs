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

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter},
    result::Result as StdResult,
    sync::Arc,
};

use compact_str::CompactString;

/// A result of the compilation and evaluation APIs, which can either be a
/// normal value or an [ExpressionError].
pub type ExpressionResult<T> = StdResult<T, ExpressionError>;

/// An error raised while compiling or evaluating an expression.
///
/// Most variants describe the problem itself. The `In*` variants and
/// [WithSource](Self::WithSource) are context wrappers around the underlying
/// error; use [root](Self::root) to get to the innermost cause.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ExpressionError {
    /// The source text of the expression is empty.
    EmptyExpressionString,

    /// The parser could not recognize the expression syntax.
    Syntax {
        /// A description of what the parser expected.
        expected: &'static str,

        /// Byte offset in the source text where the problem was found.
        position: usize,
    },

    /// The symbol is not registered as a unary operator in the compiler.
    UnknownUnaryOperatorSymbol {
        /// The unrecognized symbol.
        operator: CompactString,
    },

    /// The symbol is not registered as a binary operator in the compiler.
    UnknownBinaryOperatorSymbol {
        /// The unrecognized symbol.
        operator: CompactString,
    },

    /// No plugin resolved the identifier.
    UnknownIdentifier {
        /// The identifier.
        name: CompactString,

        /// A similar known identifier, if any.
        suggestion: Option<CompactString>,
    },

    /// No plugin resolved the function call with the given argument types.
    UnknownFunction {
        /// The function name.
        name: CompactString,

        /// The rendered argument types of the call.
        signature: CompactString,

        /// The signatures of the functions with a matching name but
        /// non-applicable arguments.
        hints: Vec<CompactString>,

        /// A similar known function name, if any.
        suggestion: Option<CompactString>,
    },

    /// No plugin defines the unary operator for the operand type.
    UnaryOperatorNotDefined {
        /// The operator symbol.
        operator: CompactString,

        /// The name of the operand type.
        ty: CompactString,
    },

    /// No plugin defines the binary operator for the operand types, even
    /// after the auto-cast attempt.
    BinaryOperatorNotDefined {
        /// The operator symbol.
        operator: CompactString,

        /// The name of the left-hand side operand type.
        lhs: CompactString,

        /// The name of the right-hand side operand type.
        rhs: CompactString,
    },

    /// A function with parameters was written without the parentheses.
    MissingFunctionParentheses {
        /// The function name.
        name: CompactString,
    },

    /// An identifier was written with the empty parentheses.
    IdentifierWithFunctionParentheses {
        /// The identifier.
        name: CompactString,
    },

    /// The branches of the conditional operator have different types and no
    /// auto-cast reconciles them.
    IncompatibleTypesInConditional {
        /// The name of the true-branch type.
        t: CompactString,

        /// The name of the false-branch type.
        f: CompactString,
    },

    /// The nested expression name must be a constant string when the
    /// nested-expression call does not specify the result type.
    NamedExpressionNotConstant,

    /// The named expression is neither cached nor provided by the repository.
    NamedExpressionNotFound {
        /// The expression name.
        name: CompactString,
    },

    /// The nested expression referred at compile time does not exist.
    NestedExpressionNotFoundCompileTime {
        /// The expression name.
        name: CompactString,
    },

    /// The nested-expression function was called with a wrong number of
    /// arguments or with a non-string name argument.
    NestedExpressionCallArgumentMismatch {
        /// The nested-expression function name.
        function: CompactString,
    },

    /// The nested expression referred at evaluation time does not exist.
    NestedExpressionNotFoundEvaluationTime {
        /// The expression name.
        name: CompactString,
    },

    /// The nested expression resolved at evaluation time returned a value of
    /// an unexpected type.
    NestedExpressionResultType {
        /// The expression name.
        name: CompactString,

        /// The name of the expected type.
        expected: CompactString,

        /// The name of the returned type.
        found: CompactString,
    },

    /// The nested expression calls itself directly or through other nested
    /// expressions.
    CircularNestedExpressions {
        /// The names of the expressions in the call chain, from the outermost
        /// to the repeated one.
        chain: Vec<CompactString>,
    },

    /// Nested compilation went deeper than the configured limit.
    NestingDepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// An operator with the same symbol and operand types is already
    /// registered.
    OperatorRedefinition {
        /// The operator symbol.
        operator: CompactString,

        /// The name of the left-hand side (or single) operand type.
        lhs: CompactString,

        /// The name of the right-hand side operand type (Void for the unary
        /// operators).
        rhs: CompactString,
    },

    /// Integer division or remainder by zero.
    DivisionByZero,

    /// A built-in function received an argument outside of its domain.
    InvalidArgument {
        /// The function name.
        function: CompactString,

        /// The problem description.
        message: CompactString,
    },

    /// A host-defined error raised by a plugin or a callback.
    Custom(Arc<dyn StdError + Send + Sync>),

    /// The error was raised by a compiler plugin during the resolution of an
    /// operator or function.
    InPlugin {
        /// The name of the plugin.
        plugin: CompactString,

        /// The underlying error.
        cause: Box<ExpressionError>,
    },

    /// The error was raised by a callback during evaluation.
    InCallback {
        /// The debug name of the callback.
        callback: CompactString,

        /// The normalized source text of the evaluated expression.
        expression: CompactString,

        /// The underlying error.
        cause: Box<ExpressionError>,
    },

    /// The error was raised while evaluating a nested expression.
    InNestedExpression {
        /// The nested expression name.
        name: CompactString,

        /// The underlying error.
        cause: Box<ExpressionError>,
    },

    /// The error is attributed to a position in the expression source text.
    WithSource {
        /// The source text of the expression.
        source: Arc<str>,

        /// Byte offset of the offending term in the source text.
        position: usize,

        /// The underlying error.
        cause: Box<ExpressionError>,
    },
}

impl Display for ExpressionError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyExpressionString => formatter.write_str("Expression string is empty."),

            Self::Syntax { expected, position } => formatter.write_fmt(format_args!(
                "Syntax error: {expected} at position {position}."
            )),

            Self::UnknownUnaryOperatorSymbol { operator } => {
                formatter.write_fmt(format_args!("Unknown unary operator '{operator}'."))
            }

            Self::UnknownBinaryOperatorSymbol { operator } => {
                formatter.write_fmt(format_args!("Unknown binary operator '{operator}'."))
            }

            Self::UnknownIdentifier { name, suggestion } => {
                formatter.write_fmt(format_args!("Unknown identifier \"{name}\"."))?;

                if let Some(suggestion) = suggestion {
                    formatter.write_fmt(format_args!(" Did you mean \"{suggestion}\"?"))?;
                }

                Ok(())
            }

            Self::UnknownFunction {
                name,
                signature,
                hints,
                suggestion,
            } => {
                formatter.write_fmt(format_args!("Unknown function '{name}{signature}'."))?;

                for hint in hints {
                    formatter.write_fmt(format_args!(
                        "\nFound function \"{hint}\". Arguments not applicable."
                    ))?;
                }

                if let Some(suggestion) = suggestion {
                    formatter.write_fmt(format_args!("\nDid you mean \"{suggestion}\"?"))?;
                }

                Ok(())
            }

            Self::UnaryOperatorNotDefined { operator, ty } => formatter.write_fmt(format_args!(
                "Operator '{operator}' not defined for type \"{ty}\"."
            )),

            Self::BinaryOperatorNotDefined { operator, lhs, rhs } => {
                formatter.write_fmt(format_args!(
                    "Operator '{operator}' not defined for types \"{lhs}\" and \"{rhs}\"."
                ))
            }

            Self::MissingFunctionParentheses { name } => formatter.write_fmt(format_args!(
                "Missing pair of empty parentheses '()' with call to function '{name}'."
            )),

            Self::IdentifierWithFunctionParentheses { name } => formatter.write_fmt(
                format_args!("Function parentheses '()' not allowed with identifier '{name}'."),
            ),

            Self::IncompatibleTypesInConditional { t, f } => formatter.write_fmt(format_args!(
                "Incompatible types for conditional expression operator <{t}> : <{f}>."
            )),

            Self::NamedExpressionNotConstant => formatter.write_str(
                "Expression name has to be constant, if no expression return type is given.",
            ),

            Self::NamedExpressionNotFound { name } => {
                formatter.write_fmt(format_args!("Named expression \"{name}\" not found."))
            }

            Self::NestedExpressionNotFoundCompileTime { name } => formatter.write_fmt(
                format_args!("Compile-time defined nested expression \"{name}\" not found."),
            ),

            Self::NestedExpressionCallArgumentMismatch { function } => {
                formatter.write_fmt(format_args!(
                    "Erroneous arguments given with nested expression function \"{function}\"."
                ))
            }

            Self::NestedExpressionNotFoundEvaluationTime { name } => formatter.write_fmt(
                format_args!("Evaluation-time defined nested expression \"{name}\" not found."),
            ),

            Self::NestedExpressionResultType {
                name,
                expected,
                found,
            } => formatter.write_fmt(format_args!(
                "Nested expression \"{name}\" returned wrong result type. \
                Expected \"{expected}\", found \"{found}\"."
            )),

            Self::CircularNestedExpressions { chain } => {
                formatter.write_str("Circular nested expressions detected: ")?;

                let mut first = true;

                for name in chain {
                    if !first {
                        formatter.write_str(" -> ")?;
                    }

                    first = false;

                    formatter.write_fmt(format_args!("\"{name}\""))?;
                }

                formatter.write_str(".")
            }

            Self::NestingDepthExceeded { limit } => formatter.write_fmt(format_args!(
                "Nested expressions compilation exceeds the depth limit of {limit}."
            )),

            Self::OperatorRedefinition { operator, lhs, rhs } => {
                formatter.write_fmt(format_args!(
                    "Operator '{operator}' for types \"{lhs}\" and \"{rhs}\" is already defined."
                ))
            }

            Self::DivisionByZero => formatter.write_str("Integer division by zero."),

            Self::InvalidArgument { function, message } => formatter.write_fmt(format_args!(
                "Invalid argument of function '{function}': {message}"
            )),

            Self::Custom(error) => Display::fmt(error, formatter),

            Self::InPlugin { plugin, cause } => formatter.write_fmt(format_args!(
                "Exception in compiler plugin \"{plugin}\": {cause}"
            )),

            Self::InCallback {
                callback,
                expression,
                cause,
            } => formatter.write_fmt(format_args!(
                "Exception in callback function \"{callback}\" while evaluating \
                expression \"{expression}\": {cause}"
            )),

            Self::InNestedExpression { name, cause } => formatter.write_fmt(format_args!(
                "{cause}\nWhen evaluating nested expression \"{name}\"."
            )),

            Self::WithSource {
                source,
                position,
                cause,
            } => {
                let column = match source.get(..*position) {
                    Some(prefix) => prefix.chars().count(),
                    None => source.chars().count(),
                };

                formatter.write_fmt(format_args!(
                    "{cause}\nExpression: {{{source}}}\n            {caret:>width$}",
                    caret = "^",
                    width = column + 2,
                ))
            }
        }
    }
}

impl StdError for ExpressionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Custom(error) => Some(error.as_ref()),
            Self::InPlugin { cause, .. }
            | Self::InCallback { cause, .. }
            | Self::InNestedExpression { cause, .. }
            | Self::WithSource { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl ExpressionError {
    /// Wraps a host-defined error.
    #[inline(always)]
    pub fn custom(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(error))
    }

    /// Returns the innermost error, skipping the context wrappers.
    pub fn root(&self) -> &Self {
        let mut current = self;

        loop {
            match current {
                Self::InPlugin { cause, .. }
                | Self::InCallback { cause, .. }
                | Self::InNestedExpression { cause, .. }
                | Self::WithSource { cause, .. } => current = cause,

                _ => return current,
            }
        }
    }

    /// Returns true if the error describes a compilation or evaluation
    /// diagnostic of the expression compiler itself, as opposed to a failure
    /// raised by host code, built-in function domain checks, or integer
    /// division.
    pub fn is_compiler_error(&self) -> bool {
        !matches!(
            self.root(),
            Self::Custom(_) | Self::DivisionByZero | Self::InvalidArgument { .. }
        )
    }

    /// Returns the source position of the outermost
    /// [WithSource](Self::WithSource) wrapper, if any.
    pub fn position(&self) -> Option<usize> {
        let mut current = self;

        loop {
            match current {
                Self::WithSource { position, .. } => return Some(*position),
                Self::Syntax { position, .. } => return Some(*position),

                Self::InPlugin { cause, .. }
                | Self::InCallback { cause, .. }
                | Self::InNestedExpression { cause, .. } => current = cause,

                _ => return None,
            }
        }
    }

    #[inline(always)]
    pub(crate) fn with_source(self, source: &Arc<str>, position: usize) -> Self {
        Self::WithSource {
            source: source.clone(),
            position,
            cause: Box::new(self),
        }
    }

    #[inline(always)]
    pub fn invalid_argument(function: &str, message: &str) -> Self {
        Self::InvalidArgument {
            function: CompactString::from(function),
            message: CompactString::from(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use compact_str::CompactString;

    use crate::runtime::ExpressionError;

    #[test]
    fn test_error_root() {
        let error = ExpressionError::BinaryOperatorNotDefined {
            operator: CompactString::from("-"),
            lhs: CompactString::from("String"),
            rhs: CompactString::from("Integer"),
        }
        .with_source(&Arc::from("\"a\" - 3"), 4);

        assert!(matches!(
            error.root(),
            ExpressionError::BinaryOperatorNotDefined { .. }
        ));
        assert_eq!(error.position(), Some(4));
        assert!(error.is_compiler_error());
        assert!(!ExpressionError::DivisionByZero.is_compiler_error());
    }

    #[test]
    fn test_error_caret() {
        let error = ExpressionError::UnknownIdentifier {
            name: CompactString::from("foo"),
            suggestion: None,
        }
        .with_source(&Arc::from("1 + foo"), 4);

        let text = error.to_string();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("Unknown identifier \"foo\"."));
        assert_eq!(lines.next(), Some("Expression: {1 + foo}"));

        let caret = lines.next().unwrap_or_default();

        assert_eq!(caret.find('^'), Some("Expression: {1 + ".len()));
    }

    #[test]
    fn test_invalid_argument_message() {
        let error = ExpressionError::invalid_argument("Integer", "The string is not an integer literal.");

        assert_eq!(
            error.to_string(),
            "Invalid argument of function 'Integer': The string is not an integer literal.",
        );
    }
}
