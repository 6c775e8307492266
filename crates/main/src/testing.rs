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

use crate::{
    compiler::{CompilationConfig, CompilePriority, Compiler},
    plugins::{CallbackEntry, Calculus, FunctionBody, FunctionName, Signature},
    runtime::{ExpressionError, ExpressionResult, Scope, Type, Value},
};

// Host variables of the test expressions.
pub(crate) struct TestContext {
    a: i64,
    b: i64,
    s: String,
}

// A default compiler that additionally resolves the identifiers `a` and `b`
// (integers) and `s` (string) from the scope's TestContext.
pub(crate) fn test_compiler() -> Compiler {
    test_compiler_with(CompilationConfig::new())
}

pub(crate) fn test_compiler_with(config: CompilationConfig) -> Compiler {
    let mut compiler = Compiler::with_config(config);
    let mut calculus = Calculus::new("TestVariables");

    let variables: [(&str, CallbackEntry); 3] = [
        ("a", CallbackEntry::volatile(var_a, "var_a", Type::Integer)),
        ("b", CallbackEntry::volatile(var_b, "var_b", Type::Integer)),
        ("s", CallbackEntry::volatile(var_s, "var_s", Type::String)),
    ];

    for (name, entry) in variables {
        calculus.add_function(
            FunctionName::new(name),
            Signature::Identifier,
            FunctionBody::Callback(entry),
        );
    }

    compiler.insert_plugin(Box::new(calculus), CompilePriority::CUSTOM);

    compiler
}

pub(crate) fn test_scope(a: i64, b: i64, s: &str) -> Scope<'static> {
    let mut scope = Scope::new();

    scope.set_context(TestContext {
        a,
        b,
        s: String::from(s),
    });

    scope
}

fn var_a(scope: &mut Scope<'_>, _args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(context(scope, "a")?.a))
}

fn var_b(scope: &mut Scope<'_>, _args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(context(scope, "b")?.b))
}

fn var_s(scope: &mut Scope<'_>, _args: &[Value]) -> ExpressionResult<Value> {
    let text = context(scope, "s")?.s.clone();

    Ok(scope.alloc_str(&text))
}

fn context<'a>(scope: &'a Scope<'_>, variable: &str) -> ExpressionResult<&'a TestContext> {
    scope
        .context::<TestContext>()
        .ok_or_else(|| ExpressionError::invalid_argument(variable, "Missing test context."))
}
