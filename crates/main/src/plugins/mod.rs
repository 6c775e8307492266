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

//! Compiler plugins: the resolution protocol of the operators, functions,
//! identifiers, and auto-casts.
//!
//! The [Compiler](crate::compiler::Compiler) keeps an ordered chain of
//! [CompilerPlugin] objects. For every operator application, function call,
//! or identifier found in the expression, the compiler consults the plugins in
//! priority order, and the first plugin that accepts the query wins.
//!
//! A plugin resolves a query into one of the [Resolution] outcomes: a
//! constant (the compiler folds the operands away), a callback (the compiler
//! emits a call command), or an identity (the non-constant operand is the
//! result as is).
//!
//! Most plugins do not implement the protocol by hand. They fill the tables of
//! the [Calculus] engine and delegate the queries to it.

mod arithmetics;
mod autocast;
mod calculus;
mod elvis;
mod strings;

use std::fmt::{Debug, Formatter};

use compact_str::CompactString;

pub use crate::plugins::{
    arithmetics::Arithmetics,
    autocast::AutoCast,
    calculus::{
        AutoCastEntry,
        CallbackEntry,
        Calculus,
        ConstantIdentifier,
        FunctionBody,
        FunctionEntry,
        FunctionName,
        OperatorKey,
        Optimization,
        OptimizationSide,
        Signature,
    },
    elvis::ElvisOperator,
    strings::Strings,
};
use crate::{
    compiler::Compiler,
    runtime::{Callback, ExpressionResult, Scope, Type, Value},
};

/// A compiler plugin.
///
/// Every method receives a query object, and returns `Ok(None)` (or
/// `Ok(false)`) if the plugin does not recognize the query. The default
/// implementations decline every query.
///
/// Plugins must be deterministic and free of side effects except for the
/// named resources they store in the compile-time scope.
pub trait CompilerPlugin: Send + Sync {
    /// The name of the plugin used in the diagnostics.
    fn name(&self) -> &str;

    /// The names of the functions and identifiers known to the plugin.
    ///
    /// The compiler uses them to suggest a similar name when an identifier
    /// or a function cannot be resolved.
    fn known_names(&self) -> Vec<CompactString> {
        Vec::new()
    }

    /// Resolves a function call or an identifier.
    #[allow(unused_variables)]
    fn try_function(&self, query: &mut FunctionQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        Ok(None)
    }

    /// Resolves a unary operator application.
    #[allow(unused_variables)]
    fn try_unary_op(&self, query: &mut UnaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        Ok(None)
    }

    /// Resolves a binary operator application.
    #[allow(unused_variables)]
    fn try_binary_op(&self, query: &mut BinaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        Ok(None)
    }

    /// Proposes implicit conversions of the operands of an operator that no
    /// plugin resolved for the original operand types.
    ///
    /// Returns true if the query is accepted. The accepted query may still
    /// leave both [AutoCastQuery::lhs] and [AutoCastQuery::rhs] empty, which
    /// means that no conversion applies.
    #[allow(unused_variables)]
    fn try_auto_cast(&self, query: &mut AutoCastQuery<'_>) -> ExpressionResult<bool> {
        Ok(false)
    }
}

/// A static description of a compile-time operand.
#[derive(Clone, Debug)]
pub struct CompileArg {
    /// The static type of the operand.
    pub ty: Type,

    /// The value of the operand if it is a compile-time constant.
    pub constant: Option<Value>,
}

impl CompileArg {
    /// Returns true if the operand is a compile-time constant.
    #[inline(always)]
    pub fn is_const(&self) -> bool {
        self.constant.is_some()
    }
}

/// A callback bound to a call command.
#[derive(Clone, Copy)]
pub struct BoundCallback {
    /// The function to call at evaluation time.
    pub callback: Callback,

    /// The static type of the callback result.
    pub result_type: Type,

    /// The debug name of the callback shown in the program listing.
    pub name: &'static str,
}

/// An outcome of an accepted resolution query.
#[derive(Clone)]
pub enum Resolution {
    /// The operation is folded into the constant value.
    Constant(Value),

    /// The operation is performed by the callback at evaluation time.
    Callback(BoundCallback),

    /// The non-constant operand is the result as is (for example `x * 1`).
    Identity,
}

/// An implicit conversion proposed by [CompilerPlugin::try_auto_cast].
#[derive(Clone)]
pub enum Cast {
    /// The constant operand is replaced by the converted value.
    Constant(Value),

    /// A conversion call is inserted after the operand.
    Callback {
        /// The conversion function.
        callback: Callback,

        /// The debug name of the conversion function.
        name: &'static str,

        /// The type of the converted operand.
        result_type: Type,

        /// The name of the expression function performing the same
        /// conversion, used when the program is turned back into the
        /// expression text.
        reverse_function: Option<CompactString>,
    },
}

impl Debug for BoundCallback {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BoundCallback")
            .field("result_type", &self.result_type)
            .field("name", &self.name)
            .finish()
    }
}

impl Debug for Resolution {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(value) => formatter.debug_tuple("Constant").field(value).finish(),
            Self::Callback(callback) => formatter.debug_tuple("Callback").field(callback).finish(),
            Self::Identity => formatter.write_str("Identity"),
        }
    }
}

impl Debug for Cast {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(value) => formatter.debug_tuple("Constant").field(value).finish(),

            Self::Callback {
                name,
                result_type,
                reverse_function,
                ..
            } => formatter
                .debug_struct("Callback")
                .field("name", name)
                .field("result_type", result_type)
                .field("reverse_function", reverse_function)
                .finish(),
        }
    }
}

/// A function or identifier resolution query.
pub struct FunctionQuery<'a> {
    /// The compiler that performs the compilation.
    pub compiler: &'a Compiler,

    /// The compile-time scope of the expression.
    pub scope: &'a mut Scope<'static>,

    /// The function name as written in the expression. The accepting plugin
    /// replaces it with the canonical name.
    pub name: CompactString,

    /// The call arguments.
    pub args: &'a [CompileArg],

    /// True if the name was written as an identifier without parentheses.
    pub no_parentheses: bool,

    /// True if all arguments are constants and the folding is allowed.
    pub all_args_const: bool,

    /// The signatures of the functions with a matching name but not
    /// applicable arguments, collected for the diagnostics.
    pub hints: Vec<CompactString>,
}

/// A unary operator resolution query.
pub struct UnaryOpQuery<'a> {
    /// The compiler that performs the compilation.
    pub compiler: &'a Compiler,

    /// The compile-time scope of the expression.
    pub scope: &'a mut Scope<'static>,

    /// The operator symbol. The accepting plugin may replace an alias with
    /// the resolved operator.
    pub operator: CompactString,

    /// The operand.
    pub arg: &'a CompileArg,

    /// True if the operand is a constant and the folding is allowed.
    pub arg_is_const: bool,
}

/// A binary operator resolution query.
pub struct BinaryOpQuery<'a> {
    /// The compiler that performs the compilation.
    pub compiler: &'a Compiler,

    /// The compile-time scope of the expression.
    pub scope: &'a mut Scope<'static>,

    /// The operator symbol. The accepting plugin may replace an alias with
    /// the resolved operator.
    pub operator: CompactString,

    /// The left-hand side operand.
    pub lhs: &'a CompileArg,

    /// The right-hand side operand.
    pub rhs: &'a CompileArg,

    /// True if the left-hand side is a constant and the folding is allowed.
    pub lhs_is_const: bool,

    /// True if the right-hand side is a constant and the folding is allowed.
    pub rhs_is_const: bool,
}

/// An auto-cast query.
///
/// The operator is either a unary or binary operator symbol, or the special
/// [CONDITIONAL_OPERATOR] symbol when the branches of a conditional expression
/// have different types.
pub struct AutoCastQuery<'a> {
    /// The compiler that performs the compilation.
    pub compiler: &'a Compiler,

    /// The compile-time scope of the expression.
    pub scope: &'a mut Scope<'static>,

    /// The operator symbol.
    pub operator: CompactString,

    /// One operand for the unary operators, two operands otherwise.
    pub args: &'a [CompileArg],

    /// True if the first operand is a constant.
    pub is_const: bool,

    /// True if the second operand is a constant.
    pub rhs_is_const: bool,

    /// The conversion of the first operand.
    pub lhs: Option<Cast>,

    /// The conversion of the second operand.
    pub rhs: Option<Cast>,
}

/// The operator symbol of the [AutoCastQuery] issued for the branches of the
/// conditional operator.
pub const CONDITIONAL_OPERATOR: &str = "Q?T:F";

/// Invokes the `callback` with the constant arguments in the compile-time
/// scope.
///
/// Returns None if one of the arguments is not a constant.
pub fn invoke_at_compile_time(
    scope: &mut Scope<'static>,
    callback: Callback,
    args: &[CompileArg],
) -> Option<ExpressionResult<Value>> {
    let mut values = Vec::with_capacity(args.len());

    for arg in args {
        values.push(arg.constant.clone()?);
    }

    Some(callback(scope, &values))
}
