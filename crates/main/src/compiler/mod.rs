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

//! The expression compiler and the compiled expressions.
//!
//! The [Compiler] turns the expression text into an [Expression]: it parses
//! the text, prints the normalized string, assembles the bytecode program
//! consulting the plugin chain, and finally reconstructs the optimized
//! string from the program.
//!
//! ```
//! use ad_astra_expressions::{
//!     compiler::Compiler,
//!     runtime::{Scope, Value},
//! };
//!
//! let compiler = Compiler::new();
//!
//! compiler.add_named("Limit", Some("10 * 10")).unwrap();
//!
//! let expression = compiler.compile("limit() > 50 ? \"big\" : \"small\"").unwrap();
//!
//! assert_eq!(expression.normalized_string(), "limit() > 50 ? \"big\" : \"small\"");
//! assert_eq!(expression.evaluate(&mut Scope::new()).unwrap(), Value::from("big"));
//! ```

mod compiler;
mod config;
mod expression;
mod named;

pub use crate::compiler::{
    compiler::{Compiler, ANONYMOUS},
    config::{
        BuiltInPlugins,
        CompilationConfig,
        CompilePriority,
        NormalizationConfig,
        NumberRadix,
        VerbalOperators,
    },
    expression::Expression,
    named::{ExpressionRepository, InMemoryRepository},
};

pub(crate) static COMPILER_LOG: &'static str = "ad-astra-expressions::$compiler";
pub(crate) static TYPES_LOG: &'static str = "ad-astra-expressions::$types";
pub(crate) static NAMED_LOG: &'static str = "ad-astra-expressions::$named";
