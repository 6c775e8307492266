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
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

use lady_deirdre::sync::Shared;

use crate::{
    interpret::{run, Assembly},
    runtime::{ExpressionResult, Scope, Type, Value},
};

/// A compiled expression.
///
/// The object is a cheap-to-clone shared handle. It owns the bytecode
/// program and the compile-time [Scope] of the expression, both immutable
/// once the compilation finishes, so the same expression can be evaluated
/// from multiple threads as long as every thread uses its own evaluation
/// scope.
///
/// The [Debug] implementation of this object prints the
/// [listing](Self::listing) of the program.
#[derive(Clone)]
pub struct Expression(Shared<ExpressionInner>);

impl Debug for Expression {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.as_ref();

        inner
            .assembly
            .debug(formatter, 0, &inner.name, &inner.normalized)
    }
}

impl Display for Expression {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0.as_ref().normalized)
    }
}

impl Expression {
    pub(crate) fn new(
        name: &str,
        original: Arc<str>,
        normalized: String,
        optimized: String,
        assembly: Assembly,
        scope: Scope<'static>,
    ) -> Self {
        Self(Shared::new(ExpressionInner {
            name: name.into(),
            original,
            normalized,
            optimized,
            assembly,
            scope,
        }))
    }

    /// The name of the expression.
    ///
    /// Expressions compiled by [Compiler::compile](crate::compiler::Compiler::compile)
    /// are named "ANONYMOUS". Named expressions carry the name they were
    /// registered with.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.0.as_ref().name
    }

    /// The source text of the expression as it was given to the compiler.
    #[inline(always)]
    pub fn original_string(&self) -> &str {
        &self.0.as_ref().original
    }

    /// The source text printed back from the syntax tree according to the
    /// compiler's [NormalizationConfig](crate::compiler::NormalizationConfig).
    #[inline(always)]
    pub fn normalized_string(&self) -> &str {
        &self.0.as_ref().normalized
    }

    /// The source text reconstructed from the optimized program.
    ///
    /// Compiling this text yields a program that evaluates to the same
    /// results as this expression.
    #[inline(always)]
    pub fn optimized_string(&self) -> &str {
        &self.0.as_ref().optimized
    }

    /// The static type of the evaluation result.
    #[inline(always)]
    pub fn result_type(&self) -> Type {
        self.0.as_ref().assembly.result_type
    }

    /// The number of bytecode commands of the program.
    #[inline(always)]
    pub fn program_length(&self) -> usize {
        self.0.as_ref().assembly.len()
    }

    /// The number of compile-time optimizations (constant foldings,
    /// identity removals, constant conditions) applied to the program.
    #[inline(always)]
    pub fn ctd_optimizations(&self) -> usize {
        self.0.as_ref().assembly.optimizations
    }

    /// Renders the bytecode listing of the program for debugging.
    #[inline(always)]
    pub fn listing(&self) -> String {
        format!("{self:#?}")
    }

    /// Evaluates the expression within the `scope`.
    ///
    /// Strings the evaluation allocates in the scope's arena stay there
    /// until the scope is [reset](Scope::reset), unless the evaluation fails.
    /// A failed evaluation releases them.
    pub fn evaluate(&self, scope: &mut Scope<'_>) -> ExpressionResult<Value> {
        let snapshot = scope.arena().snapshot();

        scope.stack.clear();
        scope.nested.clear();

        let result = run(self, scope);

        if result.is_err() {
            scope.arena_mut().rollback(snapshot);
        }

        result
    }

    #[inline(always)]
    pub(crate) fn compile_time_scope(&self) -> &Scope<'static> {
        &self.0.as_ref().scope
    }

    #[inline(always)]
    pub(crate) fn assembly(&self) -> &Assembly {
        &self.0.as_ref().assembly
    }

    #[inline(always)]
    pub(crate) fn same(&self, other: &Self) -> bool {
        std::ptr::eq(self.0.as_ref(), other.0.as_ref())
    }
}

struct ExpressionInner {
    name: Box<str>,
    original: Arc<str>,
    normalized: String,
    optimized: String,
    assembly: Assembly,
    scope: Scope<'static>,
}
