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
    compiler::CompilationConfig,
    plugins::{
        BinaryOpQuery,
        CallbackEntry,
        Calculus,
        CompilerPlugin,
        FunctionBody,
        FunctionName,
        FunctionQuery,
        Optimization,
        OptimizationSide,
        Resolution,
        Signature,
        UnaryOpQuery,
    },
    report::system_panic,
    runtime::{ExpressionError, ExpressionResult, Scope, Type, Value},
};

const ARITHMETIC: [Type; 3] = [Type::Boolean, Type::Integer, Type::Float];

/// Built-in plugin of the boolean, integer and floating-point arithmetic.
///
/// Provides:
///
///  - Constants `true`, `false`, `yes`, `no`, `on`, `off`, and the float
///    constants `NaN` and `Infinity`.
///  - Functions `Boolean(..)`, `Integer(x)` and `Float(x)` converting between
///    the arithmetic types.
///  - Unary operators `+`, `-`, `!` and `~`.
///  - Binary operators `* / % + -`, comparisons, and boolean `&& ||` over all
///    combinations of Boolean, Integer and Float operands. The result is a
///    Float if one of the operands is a Float, otherwise an Integer.
///  - Shift operators `<< >>` and bitwise operators `& ^ |` on integers.
///  - Optimizations of the operations with one constant operand, such as
///    `x * 1`, `x + 0` or `x || true`.
///
/// If [CompilationConfig::allow_bitwise_boolean_operations] is set, the
/// bitwise operators `& | ~` applied to booleans are aliases of `&& || !`.
pub struct Arithmetics {
    calculus: Calculus,
}

impl Arithmetics {
    /// The name of the not-a-number float constant.
    pub const NAN: &'static str = "NaN";

    /// The name of the positive infinity float constant.
    pub const INFINITY: &'static str = "Infinity";

    /// Creates the plugin tables according to the compilation configuration.
    pub fn new(config: &CompilationConfig) -> Self {
        match Self::build(config) {
            Ok(calculus) => Self { calculus },
            Err(error) => system_panic!("Arithmetics tables setup failure. {error}"),
        }
    }

    fn build(config: &CompilationConfig) -> ExpressionResult<Calculus> {
        let mut calculus = Calculus::new("Arithmetics");

        for (name, value) in [
            ("true", true),
            ("false", false),
            ("yes", true),
            ("no", false),
            ("on", true),
            ("off", false),
        ] {
            calculus.add_constant(FunctionName::new(name), value);
        }

        calculus.add_constant(FunctionName::new(Self::NAN), f64::NAN);
        calculus.add_constant(FunctionName::new(Self::INFINITY), f64::INFINITY);

        calculus.add_function(
            FunctionName::abbreviated("Boolean", 4),
            Signature::Variadic(Vec::new()),
            FunctionBody::Callback(CallbackEntry::pure(to_boolean, "to_boolean", Type::Boolean)),
        );

        for ty in ARITHMETIC {
            calculus.add_function(
                FunctionName::abbreviated("Integer", 3),
                Signature::Fixed(vec![ty]),
                FunctionBody::Callback(CallbackEntry::pure(to_int, "to_int", Type::Integer)),
            );
        }

        for ty in ARITHMETIC {
            calculus.add_function(
                FunctionName::new("Float"),
                Signature::Fixed(vec![ty]),
                FunctionBody::Callback(CallbackEntry::pure(to_float, "to_float", Type::Float)),
            );
        }

        calculus.add_unary_op("+", Type::Integer, CallbackEntry::pure(pos, "pos", Type::Integer))?;
        calculus.add_unary_op("+", Type::Float, CallbackEntry::pure(pos, "pos", Type::Float))?;
        calculus.add_unary_op("+", Type::Boolean, CallbackEntry::pure(pos_b, "pos_b", Type::Integer))?;
        calculus.add_unary_op("-", Type::Integer, CallbackEntry::pure(neg_i, "neg_i", Type::Integer))?;
        calculus.add_unary_op("-", Type::Float, CallbackEntry::pure(neg_f, "neg_f", Type::Float))?;
        calculus.add_unary_op("-", Type::Boolean, CallbackEntry::pure(neg_b, "neg_b", Type::Integer))?;

        for ty in ARITHMETIC {
            calculus.add_unary_op("!", ty, CallbackEntry::pure(bool_not, "bool_not", Type::Boolean))?;
        }

        calculus.add_unary_op("~", Type::Integer, CallbackEntry::pure(bit_not, "bit_not", Type::Integer))?;

        for lhs in ARITHMETIC {
            for rhs in ARITHMETIC {
                let floats = lhs == Type::Float || rhs == Type::Float;

                for (operator, int_entry, float_entry) in [
                    (
                        "*",
                        CallbackEntry::pure(mul_i, "mul_i", Type::Integer),
                        CallbackEntry::pure(mul_f, "mul_f", Type::Float),
                    ),
                    (
                        "/",
                        CallbackEntry::pure(div_i, "div_i", Type::Integer),
                        CallbackEntry::pure(div_f, "div_f", Type::Float),
                    ),
                    (
                        "%",
                        CallbackEntry::pure(mod_i, "mod_i", Type::Integer),
                        CallbackEntry::pure(mod_f, "mod_f", Type::Float),
                    ),
                    (
                        "+",
                        CallbackEntry::pure(add_i, "add_i", Type::Integer),
                        CallbackEntry::pure(add_f, "add_f", Type::Float),
                    ),
                    (
                        "-",
                        CallbackEntry::pure(sub_i, "sub_i", Type::Integer),
                        CallbackEntry::pure(sub_f, "sub_f", Type::Float),
                    ),
                    (
                        "<",
                        CallbackEntry::pure(sm_i, "sm_i", Type::Boolean),
                        CallbackEntry::pure(sm_f, "sm_f", Type::Boolean),
                    ),
                    (
                        "<=",
                        CallbackEntry::pure(smeq_i, "smeq_i", Type::Boolean),
                        CallbackEntry::pure(smeq_f, "smeq_f", Type::Boolean),
                    ),
                    (
                        ">",
                        CallbackEntry::pure(gt_i, "gt_i", Type::Boolean),
                        CallbackEntry::pure(gt_f, "gt_f", Type::Boolean),
                    ),
                    (
                        ">=",
                        CallbackEntry::pure(gteq_i, "gteq_i", Type::Boolean),
                        CallbackEntry::pure(gteq_f, "gteq_f", Type::Boolean),
                    ),
                    (
                        "==",
                        CallbackEntry::pure(eq_i, "eq_i", Type::Boolean),
                        CallbackEntry::pure(eq_f, "eq_f", Type::Boolean),
                    ),
                    (
                        "!=",
                        CallbackEntry::pure(neq_i, "neq_i", Type::Boolean),
                        CallbackEntry::pure(neq_f, "neq_f", Type::Boolean),
                    ),
                ] {
                    let entry = match floats {
                        true => float_entry,
                        false => int_entry,
                    };

                    calculus.add_binary_op(operator, lhs, rhs, entry)?;
                }

                calculus.add_binary_op(
                    "&&",
                    lhs,
                    rhs,
                    CallbackEntry::pure(bool_and, "bool_and", Type::Boolean),
                )?;

                calculus.add_binary_op(
                    "||",
                    lhs,
                    rhs,
                    CallbackEntry::pure(bool_or, "bool_or", Type::Boolean),
                )?;
            }
        }

        for (lhs, rhs) in [
            (Type::Boolean, Type::Integer),
            (Type::Integer, Type::Boolean),
            (Type::Integer, Type::Integer),
        ] {
            calculus.add_binary_op("<<", lhs, rhs, CallbackEntry::pure(shl, "shl", Type::Integer))?;
            calculus.add_binary_op(">>", lhs, rhs, CallbackEntry::pure(shr, "shr", Type::Integer))?;
        }

        calculus.add_binary_op(
            "&",
            Type::Integer,
            Type::Integer,
            CallbackEntry::pure(bit_and, "bit_and", Type::Integer),
        )?;
        calculus.add_binary_op(
            "^",
            Type::Integer,
            Type::Integer,
            CallbackEntry::pure(bit_xor, "bit_xor", Type::Integer),
        )?;
        calculus.add_binary_op(
            "|",
            Type::Integer,
            Type::Integer,
            CallbackEntry::pure(bit_or, "bit_or", Type::Integer),
        )?;

        if config.allow_bitwise_boolean_operations {
            calculus.add_unary_alias("~", Type::Boolean, "!")?;

            for (lhs, rhs) in [
                (Type::Boolean, Type::Boolean),
                (Type::Boolean, Type::Integer),
                (Type::Boolean, Type::Float),
                (Type::Integer, Type::Boolean),
                (Type::Float, Type::Boolean),
            ] {
                calculus.add_binary_alias("&", lhs, rhs, "&&")?;
                calculus.add_binary_alias("|", lhs, rhs, "||")?;
            }
        }

        let both_sides = [
            ("||", Type::Boolean, Value::Boolean(true), Some(Value::Boolean(true))),
            ("||", Type::Boolean, Value::Boolean(false), None),
            ("&&", Type::Boolean, Value::Boolean(true), None),
            ("&&", Type::Boolean, Value::Boolean(false), Some(Value::Boolean(false))),
            ("+", Type::Integer, Value::Integer(0), None),
            ("+", Type::Float, Value::Float(0.0), None),
            ("*", Type::Integer, Value::Integer(0), Some(Value::Integer(0))),
            ("*", Type::Integer, Value::Integer(1), None),
            ("*", Type::Float, Value::Float(0.0), Some(Value::Float(0.0))),
            ("*", Type::Float, Value::Float(1.0), None),
        ];

        for (operator, ty, constant, result) in both_sides {
            calculus.add_optimization(Optimization {
                side: OptimizationSide::Both,
                operator: operator.into(),
                ty,
                constant,
                result,
            });
        }

        let rhs_side = [
            ("-", Type::Integer, Value::Integer(0), None),
            ("-", Type::Float, Value::Float(0.0), None),
            ("/", Type::Integer, Value::Integer(1), None),
            ("/", Type::Float, Value::Integer(1), None),
            ("/", Type::Float, Value::Float(1.0), None),
            ("%", Type::Integer, Value::Integer(1), Some(Value::Integer(0))),
        ];

        for (operator, ty, constant, result) in rhs_side {
            calculus.add_optimization(Optimization {
                side: OptimizationSide::Rhs,
                operator: operator.into(),
                ty,
                constant,
                result,
            });
        }

        Ok(calculus)
    }

    /// Gives access to the underlying tables, for example to list the known
    /// function names.
    #[inline(always)]
    pub fn calculus(&self) -> &Calculus {
        &self.calculus
    }
}

impl CompilerPlugin for Arithmetics {
    #[inline(always)]
    fn name(&self) -> &str {
        self.calculus.name()
    }

    fn known_names(&self) -> Vec<CompactString> {
        self.calculus.known_names().map(CompactString::from).collect()
    }

    #[inline(always)]
    fn try_function(&self, query: &mut FunctionQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        self.calculus.resolve_function(query)
    }

    #[inline(always)]
    fn try_unary_op(&self, query: &mut UnaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        self.calculus.resolve_unary_op(query)
    }

    fn try_binary_op(&self, query: &mut BinaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        // Integer division by a constant zero stays a runtime operation, so
        // that an untaken conditional branch does not fail the compilation.
        if query.operator == "/" || query.operator == "%" {
            let zero_divisor = match &query.rhs.constant {
                Some(Value::Integer(0)) | Some(Value::Boolean(false)) => {
                    query.lhs.ty != Type::Float
                }
                _ => false,
            };

            if zero_divisor {
                query.lhs_is_const = false;
                query.rhs_is_const = false;
            }
        }

        self.calculus.resolve_binary_op(query)
    }
}

#[inline(always)]
fn integer(args: &[Value], index: usize) -> i64 {
    args.get(index)
        .and_then(Value::to_integer)
        .unwrap_or_default()
}

#[inline(always)]
fn float(args: &[Value], index: usize) -> f64 {
    args.get(index).and_then(Value::to_float).unwrap_or_default()
}

#[inline(always)]
fn truthy(args: &[Value], index: usize) -> bool {
    args.get(index).map(Value::is_truthy).unwrap_or_default()
}

macro_rules! binary {
    ($name:ident, $read:ident, |$lhs:ident, $rhs:ident| $body:expr) => {
        fn $name(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
            let $lhs = $read(args, 0);
            let $rhs = $read(args, 1);

            Ok(Value::from($body))
        }
    };
}

fn to_boolean(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(truthy(args, 0)))
}

fn to_int(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(integer(args, 0)))
}

fn to_float(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Float(float(args, 0)))
}

fn pos(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(args.first().cloned().unwrap_or_default())
}

fn pos_b(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(integer(args, 0)))
}

fn neg_b(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(-integer(args, 0)))
}

fn neg_i(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(integer(args, 0).wrapping_neg()))
}

fn neg_f(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Float(-float(args, 0)))
}

fn bool_not(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(!truthy(args, 0)))
}

fn bit_not(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(!integer(args, 0)))
}

binary!(mul_i, integer, |lhs, rhs| lhs.wrapping_mul(rhs));
binary!(mul_f, float, |lhs, rhs| lhs * rhs);
binary!(add_i, integer, |lhs, rhs| lhs.wrapping_add(rhs));
binary!(add_f, float, |lhs, rhs| lhs + rhs);
binary!(sub_i, integer, |lhs, rhs| lhs.wrapping_sub(rhs));
binary!(sub_f, float, |lhs, rhs| lhs - rhs);
binary!(div_f, float, |lhs, rhs| lhs / rhs);
binary!(mod_f, float, |lhs, rhs| lhs % rhs);
binary!(sm_i, integer, |lhs, rhs| lhs < rhs);
binary!(sm_f, float, |lhs, rhs| lhs < rhs);
binary!(smeq_i, integer, |lhs, rhs| lhs <= rhs);
binary!(smeq_f, float, |lhs, rhs| lhs <= rhs);
binary!(gt_i, integer, |lhs, rhs| lhs > rhs);
binary!(gt_f, float, |lhs, rhs| lhs > rhs);
binary!(gteq_i, integer, |lhs, rhs| lhs >= rhs);
binary!(gteq_f, float, |lhs, rhs| lhs >= rhs);
binary!(eq_i, integer, |lhs, rhs| lhs == rhs);
binary!(eq_f, float, |lhs, rhs| (lhs - rhs).abs() <= f64::EPSILON);
binary!(neq_i, integer, |lhs, rhs| lhs != rhs);
binary!(neq_f, float, |lhs, rhs| (lhs - rhs).abs() > f64::EPSILON);
binary!(bool_and, truthy, |lhs, rhs| lhs && rhs);
binary!(bool_or, truthy, |lhs, rhs| lhs || rhs);
binary!(shl, integer, |lhs, rhs| lhs.wrapping_shl(rhs as u32));
binary!(shr, integer, |lhs, rhs| lhs.wrapping_shr(rhs as u32));
binary!(bit_and, integer, |lhs, rhs| lhs & rhs);
binary!(bit_xor, integer, |lhs, rhs| lhs ^ rhs);
binary!(bit_or, integer, |lhs, rhs| lhs | rhs);

fn div_i(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let lhs = integer(args, 0);
    let rhs = integer(args, 1);

    if rhs == 0 {
        return Err(ExpressionError::DivisionByZero);
    }

    Ok(Value::Integer(lhs.wrapping_div(rhs)))
}

fn mod_i(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let lhs = integer(args, 0);
    let rhs = integer(args, 1);

    if rhs == 0 {
        return Err(ExpressionError::DivisionByZero);
    }

    Ok(Value::Integer(lhs.wrapping_rem(rhs)))
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::Compiler,
        runtime::{ExpressionError, Scope, Type, Value},
    };

    fn evaluate(source: &str) -> Value {
        let compiler = Compiler::new();

        let expression = compiler
            .compile(source)
            .unwrap_or_else(|error| panic!("{source}: {error}"));

        expression
            .evaluate(&mut Scope::new())
            .unwrap_or_else(|error| panic!("{source}: {error}"))
    }

    #[test]
    fn test_arithmetics_constants() {
        assert_eq!(evaluate("1 + 2 * 3"), Value::Integer(7));
        assert_eq!(evaluate("(1 + 2) * 3"), Value::Integer(9));
        assert_eq!(evaluate("7 / 2"), Value::Integer(3));
        assert_eq!(evaluate("7 % 4"), Value::Integer(3));
        assert_eq!(evaluate("7.0 / 2"), Value::Float(3.5));
        assert_eq!(evaluate("true + true"), Value::Integer(2));
        assert_eq!(evaluate("-true"), Value::Integer(-1));
        assert_eq!(evaluate("1 << 4"), Value::Integer(16));
        assert_eq!(evaluate("6 & 3"), Value::Integer(2));
        assert_eq!(evaluate("6 ^ 3"), Value::Integer(5));
        assert_eq!(evaluate("6 | 3"), Value::Integer(7));
        assert_eq!(evaluate("~0"), Value::Integer(-1));
        assert_eq!(evaluate("0.1 + 0.2 == 0.3"), Value::Boolean(true));
        assert_eq!(evaluate("3 > 2.5"), Value::Boolean(true));
        assert_eq!(evaluate("yes && off"), Value::Boolean(false));
        assert_eq!(evaluate("true & false"), Value::Boolean(false));
        assert_eq!(evaluate("~true"), Value::Boolean(false));
        assert_eq!(evaluate("Integer(3.9)"), Value::Integer(3));
        assert_eq!(evaluate("Float(2)"), Value::Float(2.0));
        assert_eq!(evaluate("Boolean(0.0)"), Value::Boolean(false));
        assert_eq!(evaluate("int(true)"), Value::Integer(1));
    }

    #[test]
    fn test_arithmetics_folding() {
        let compiler = Compiler::new();

        let expression = compiler.compile("2 * 3 + 4").unwrap();

        assert_eq!(expression.program_length(), 1);
        assert!(expression.ctd_optimizations() > 0);
        assert_eq!(expression.result_type(), Type::Integer);
    }

    #[test]
    fn test_arithmetics_division_by_zero() {
        let compiler = Compiler::new();

        let expression = compiler.compile("1 / 0").unwrap();

        assert_eq!(expression.program_length(), 3);

        let error = expression.evaluate(&mut Scope::new()).unwrap_err();

        assert!(matches!(error.root(), ExpressionError::DivisionByZero));
        assert!(!error.is_compiler_error());
    }
}
