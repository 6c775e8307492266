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

use crate::{
    plugins::{
        AutoCastEntry,
        AutoCastQuery,
        CallbackEntry,
        Calculus,
        CompilerPlugin,
        CONDITIONAL_OPERATOR,
    },
    runtime::{ExpressionResult, Scope, Type, Value},
};

/// Built-in plugin of the implicit numeric promotions.
///
/// Booleans are promoted to integers when the other operand is an integer,
/// and booleans or integers are promoted to floats when the other operand is
/// a float. The promotion applies to the binary operators and to the
/// branches of the conditional operator.
///
/// Booleans are also promoted to integers for the bitwise and shift
/// operators applied to two booleans, and for the unary `~` operator.
pub struct AutoCast {
    calculus: Calculus,
}

impl Default for AutoCast {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl AutoCast {
    /// Creates the plugin.
    pub fn new() -> Self {
        let mut calculus = Calculus::new("AutoCast");

        let bool_to_int = CallbackEntry::pure(bool_to_int, "bool_to_int", Type::Integer);
        let to_float = CallbackEntry::pure(to_float, "to_float", Type::Float);

        let integer = Some(CompactString::from("Integer"));
        let float = Some(CompactString::from("Float"));

        calculus.add_auto_cast(AutoCastEntry {
            ty: Some(Type::Boolean),
            other: Some(Type::Integer),
            operators: Vec::new(),
            declined: Vec::new(),
            cast: bool_to_int,
            reverse_function: integer.clone(),
        });

        for ty in [Type::Boolean, Type::Integer] {
            calculus.add_auto_cast(AutoCastEntry {
                ty: Some(ty),
                other: Some(Type::Float),
                operators: Vec::new(),
                declined: Vec::new(),
                cast: to_float,
                reverse_function: float.clone(),
            });
        }

        calculus.add_auto_cast(AutoCastEntry {
            ty: Some(Type::Boolean),
            other: Some(Type::Boolean),
            operators: ["<<", ">>", "&", "|", "^"]
                .into_iter()
                .map(CompactString::from)
                .collect(),
            declined: vec![CompactString::from(CONDITIONAL_OPERATOR)],
            cast: bool_to_int,
            reverse_function: integer.clone(),
        });

        calculus.add_auto_cast(AutoCastEntry {
            ty: Some(Type::Boolean),
            other: None,
            operators: vec![CompactString::from("~")],
            declined: Vec::new(),
            cast: bool_to_int,
            reverse_function: integer,
        });

        Self { calculus }
    }
}

impl CompilerPlugin for AutoCast {
    #[inline(always)]
    fn name(&self) -> &str {
        self.calculus.name()
    }

    #[inline(always)]
    fn try_auto_cast(&self, query: &mut AutoCastQuery<'_>) -> ExpressionResult<bool> {
        self.calculus.resolve_auto_cast(query)
    }
}

fn bool_to_int(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(
        args.first()
            .and_then(Value::to_integer)
            .unwrap_or_default(),
    ))
}

fn to_float(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Float(
        args.first().and_then(Value::to_float).unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::{CompilationConfig, Compiler},
        runtime::{Scope, Type, Value},
    };

    #[test]
    fn test_conditional_promotion() {
        let compiler = Compiler::new();

        let expression = compiler.compile("1 > 2 ? 1 : 2.5").unwrap();

        assert_eq!(expression.result_type(), Type::Float);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_bitwise_boolean_promotion() {
        let mut config = CompilationConfig::new();

        config.allow_bitwise_boolean_operations = false;

        let compiler = Compiler::with_config(config);

        let expression = compiler.compile("true | false").unwrap();

        assert_eq!(expression.result_type(), Type::Integer);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(1)
        );

        let expression = compiler.compile("~false").unwrap();

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(-1)
        );
    }
}
