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

//! # Ad Astra Expressions
//!
//! An embeddable compiler and virtual machine of the single-line
//! expressions: arithmetics, string operations, comparisons, conditional
//! operators, and calls into the host-provided functions.
//!
//! The host application configures a [Compiler](compiler::Compiler) once,
//! registers its own functions and identifiers through the
//! [compiler plugins](plugins), and compiles the expression texts into
//! [Expression](compiler::Expression) objects. A compiled expression is a
//! flat bytecode program that is evaluated within an evaluation
//! [Scope](runtime::Scope) many times, possibly from multiple threads.
//!
//! ```
//! use ad_astra_expressions::{
//!     compiler::{CompilePriority, Compiler},
//!     plugins::{CallbackEntry, Calculus, FunctionBody, FunctionName, Signature},
//!     runtime::{ExpressionResult, Scope, Type, Value},
//! };
//!
//! fn price(scope: &mut Scope<'_>, _args: &[Value]) -> ExpressionResult<Value> {
//!     Ok(Value::Integer(*scope.context::<i64>().unwrap_or(&0)))
//! }
//!
//! let mut host = Calculus::new("Host");
//!
//! host.add_function(
//!     FunctionName::new("Price"),
//!     Signature::Identifier,
//!     FunctionBody::Callback(CallbackEntry::volatile(price, "price", Type::Integer)),
//! );
//!
//! let mut compiler = Compiler::new();
//!
//! compiler.insert_plugin(Box::new(host), CompilePriority::CUSTOM);
//!
//! let expression = compiler.compile("price*(1+1) > 100 ? \"expensive\" : \"cheap\"").unwrap();
//!
//! assert_eq!(
//!     expression.normalized_string(),
//!     "Price * (1 + 1) > 100 ? \"expensive\" : \"cheap\"",
//! );
//!
//! let mut scope = Scope::new();
//!
//! scope.set_context(70i64);
//!
//! assert_eq!(expression.evaluate(&mut scope).unwrap(), Value::from("expensive"));
//! ```
//!
//! The crate is organized as follows:
//!
//!  - The [syntax] module contains the parser and the syntax tree.
//!  - The [compiler] module contains the compiler, its configuration, the
//!    compiled expressions, and the named expressions.
//!  - The [plugins] module defines the resolution protocol of the operators
//!    and functions, and the built-in plugins.
//!  - The [runtime] module contains the runtime values and the scopes.

#![doc(html_root_url = "https://docs.rs/ad-astra-expressions")]

pub mod compiler;
mod interpret;
pub mod plugins;
mod report;
pub mod runtime;
pub mod syntax;

#[cfg(test)]
mod testing;
