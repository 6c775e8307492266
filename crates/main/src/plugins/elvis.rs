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
    plugins::{BinaryOpQuery, BoundCallback, CompilerPlugin, Resolution},
    runtime::{ExpressionResult, Scope, Value},
};

/// Built-in plugin of the Elvis operator `A ?: B`.
///
/// The operator returns `A` if it is truthy, and `B` otherwise. It applies to
/// any pair of operands of the same type, including the host-defined types.
#[derive(Default)]
pub struct ElvisOperator;

impl ElvisOperator {
    /// The operator symbol.
    pub const SYMBOL: &'static str = "?:";
}

impl CompilerPlugin for ElvisOperator {
    #[inline(always)]
    fn name(&self) -> &str {
        "ElvisOperator"
    }

    fn try_binary_op(&self, query: &mut BinaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        if query.operator != Self::SYMBOL || query.lhs.ty != query.rhs.ty {
            return Ok(None);
        }

        if query.lhs_is_const {
            if let Some(lhs) = &query.lhs.constant {
                if lhs.is_truthy() {
                    return Ok(Some(Resolution::Constant(lhs.clone())));
                }

                return Ok(Some(match (&query.rhs.constant, query.rhs_is_const) {
                    (Some(rhs), true) => Resolution::Constant(rhs.clone()),
                    _ => Resolution::Identity,
                }));
            }
        }

        Ok(Some(Resolution::Callback(BoundCallback {
            callback: elvis,
            result_type: query.lhs.ty,
            name: "elvis",
        })))
    }
}

fn elvis(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let mut args = args.iter();

    let lhs = args.next().cloned().unwrap_or_default();
    let rhs = args.next().cloned().unwrap_or_default();

    match lhs.is_truthy() {
        true => Ok(lhs),
        false => Ok(rhs),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::Compiler,
        runtime::{Scope, Value},
    };

    #[test]
    fn test_elvis_operator() {
        let compiler = Compiler::new();

        let expression = compiler.compile("\"\" ?: \"default\"").unwrap();

        assert_eq!(expression.program_length(), 1);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::from("default"),
        );

        let expression = compiler.compile("5 ?: 7").unwrap();

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(5),
        );

        let expression = compiler.compile("0 ? : 7").unwrap();

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(7),
        );
    }
}
