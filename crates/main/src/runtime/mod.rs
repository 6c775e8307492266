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

//! Runtime building blocks shared by the compiler and the virtual machine.
//!
//! The [Value] is the boxed runtime value used for the constants, the
//! evaluation stack, and the callback arguments. The [Scope] is the
//! execution context: the compiler creates one compile-time scope per
//! compiled expression, and the host creates evaluation scopes for the
//! evaluation runs.
//!
//! ```
//! use ad_astra_expressions::{
//!     compiler::Compiler,
//!     runtime::{Scope, Value},
//! };
//!
//! let compiler = Compiler::new();
//! let expression = compiler.compile("2 * 21").unwrap();
//!
//! let mut scope = Scope::new();
//!
//! assert_eq!(expression.evaluate(&mut scope).unwrap(), Value::Integer(42));
//! ```

mod error;
mod scope;
mod value;

pub use crate::runtime::{
    error::{ExpressionError, ExpressionResult},
    scope::{Arena, ArenaSnapshot, Scope, ScopeKind},
    value::{format_float, Callback, CustomValue, Type, Value},
};
