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
    compiler::{Compiler, NormalizationConfig, NumberRadix, VerbalOperators},
    plugins::{Arithmetics, FunctionName},
    runtime::{format_float, ExpressionError, ExpressionResult, Value},
    syntax::{operators::OperatorAlias, Ast, LiteralHint, OperatorTable},
};

const SUBSCRIPT: &str = "[]";

/// Receives the terms of the syntax tree in the evaluation order while the
/// [Normalizer] prints the tree.
///
/// Operands are reported before the operators and functions that consume
/// them. The returned names are the canonical names of the functions and
/// the resolved operator symbols, which the normalizer may write instead of
/// the names found in the source.
pub(crate) trait NormalizeHook {
    fn literal(&mut self, value: &Value, position: usize, normalized: usize) -> ExpressionResult<()>;

    // Creates the string value of a nested expression name written as an
    // identifier.
    #[inline(always)]
    fn string(&mut self, text: &str) -> Value {
        Value::from(text)
    }

    // The arity is negative for the identifiers.
    fn function(
        &mut self,
        name: &str,
        arity: isize,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<CompactString>;

    fn unary_op(
        &mut self,
        operator: &str,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<CompactString>;

    fn binary_op(
        &mut self,
        operator: &str,
        position: usize,
        normalized: usize,
    ) -> ExpressionResult<CompactString>;

    fn conditional_q(&mut self, position: usize, normalized: usize) -> ExpressionResult<()>;

    fn conditional_t(&mut self, position: usize, normalized: usize) -> ExpressionResult<()>;

    fn conditional_f(&mut self, position: usize, normalized: usize) -> ExpressionResult<()>;

    #[inline(always)]
    fn error(&mut self, error: ExpressionError, _position: usize) -> ExpressionError {
        error
    }
}

impl NormalizeHook for () {
    #[inline(always)]
    fn literal(&mut self, _value: &Value, _position: usize, _normalized: usize) -> ExpressionResult<()> {
        Ok(())
    }

    #[inline(always)]
    fn function(
        &mut self,
        name: &str,
        _arity: isize,
        _position: usize,
        _normalized: usize,
    ) -> ExpressionResult<CompactString> {
        Ok(CompactString::from(name))
    }

    #[inline(always)]
    fn unary_op(
        &mut self,
        operator: &str,
        _position: usize,
        _normalized: usize,
    ) -> ExpressionResult<CompactString> {
        Ok(CompactString::from(operator))
    }

    #[inline(always)]
    fn binary_op(
        &mut self,
        operator: &str,
        _position: usize,
        _normalized: usize,
    ) -> ExpressionResult<CompactString> {
        Ok(CompactString::from(operator))
    }

    #[inline(always)]
    fn conditional_q(&mut self, _position: usize, _normalized: usize) -> ExpressionResult<()> {
        Ok(())
    }

    #[inline(always)]
    fn conditional_t(&mut self, _position: usize, _normalized: usize) -> ExpressionResult<()> {
        Ok(())
    }

    #[inline(always)]
    fn conditional_f(&mut self, _position: usize, _normalized: usize) -> ExpressionResult<()> {
        Ok(())
    }
}

/// Prints the syntax tree into the normalized expression string according to
/// the compiler's [NormalizationConfig], and reports the tree terms to the
/// hook.
pub(crate) struct Normalizer<'a, H: NormalizeHook> {
    config: &'a NormalizationConfig,
    operators: &'a OperatorTable,
    nested_function: &'a FunctionName,
    nested_operator: &'a str,
    throw: &'a str,
    identifiers_as_names: bool,
    hook: &'a mut H,
    output: String,
}

impl<'a, H: NormalizeHook> Normalizer<'a, H> {
    pub(crate) fn new(compiler: &'a Compiler, hook: &'a mut H) -> Self {
        Self {
            config: compiler.normalization(),
            operators: compiler.operators(),
            nested_function: compiler.nested_function(),
            nested_operator: compiler.nested_operator(),
            throw: compiler.throw_identifier(),
            identifiers_as_names: compiler.config().allow_identifiers_for_nested_expressions,
            hook,
            output: String::new(),
        }
    }

    pub(crate) fn normalize(mut self, ast: &Ast) -> ExpressionResult<String> {
        self.write(ast)?;

        Ok(self.output)
    }

    fn write(&mut self, ast: &Ast) -> ExpressionResult<()> {
        match ast {
            Ast::Literal(literal) => {
                let normalized = self.output.len();

                self.write_literal(&literal.value, literal.hint);

                self.hook.literal(&literal.value, literal.position, normalized)
            }

            Ast::Identifier { name, position } => {
                let normalized = self.output.len();

                let canonical = self.hook.function(name, -1, *position, normalized)?;

                match self.config.replace_function_names {
                    true => self.output.push_str(&canonical),
                    false => self.output.push_str(name),
                }

                Ok(())
            }

            Ast::Function {
                name,
                args,
                position,
            } => {
                if self.nested_function.matches(name) {
                    return self.write_nested_function(name, args, *position);
                }

                let normalized = self.output.len();

                self.output.push_str(name);
                self.open_args(args.is_empty());

                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        self.write_comma();
                    }

                    self.write(arg)?;
                }

                self.close_args(args.is_empty());

                let canonical =
                    self.hook
                        .function(name, args.len() as isize, *position, normalized)?;

                self.replace_name(normalized, name, &canonical);

                Ok(())
            }

            Ast::UnaryOp {
                operator,
                arg,
                position,
            } => self.write_unary_op(operator, arg, *position),

            Ast::BinaryOp {
                operator,
                lhs,
                rhs,
                position,
            } if *operator == SUBSCRIPT => {
                let brackets = !matches!(
                    lhs.as_ref(),
                    Ast::Literal(..) | Ast::Identifier { .. } | Ast::Function { .. },
                ) && !is_subscript(lhs);

                self.write_operand(lhs, brackets)?;

                let normalized = self.output.len();

                self.output.push('[');
                self.space_if(self.config.subscript_inner_bracket_spaces);
                self.write(rhs)?;
                self.space_if(self.config.subscript_inner_bracket_spaces);
                self.output.push(']');

                let _ = self.hook.binary_op(operator, *position, normalized)?;

                Ok(())
            }

            Ast::BinaryOp {
                operator,
                lhs,
                rhs,
                position,
            } => self.write_binary_op(operator, lhs, rhs, *position),

            Ast::Conditional {
                q,
                t,
                f,
                position,
                colon_position,
            } => {
                let spaces = self.config.conditional_op_spaces;
                let redundant = self.config.redundant_conditional_brackets;

                self.write_operand(q, matches!(q.as_ref(), Ast::Conditional { .. }))?;

                self.space_if(spaces);

                let question = self.output.len();

                self.hook.conditional_q(*position, question)?;

                self.output.push('?');
                self.space_if(spaces);

                self.write_operand(t, redundant && matches!(t.as_ref(), Ast::Conditional { .. }))?;

                self.space_if(spaces);

                let colon = self.output.len();

                self.hook.conditional_t(*colon_position, colon)?;

                self.output.push(':');
                self.space_if(spaces);

                self.write_operand(f, redundant && matches!(f.as_ref(), Ast::Conditional { .. }))?;

                self.hook.conditional_f(*position, question)
            }
        }
    }

    fn write_nested_function(
        &mut self,
        name: &str,
        args: &[Ast],
        position: usize,
    ) -> ExpressionResult<()> {
        let throws = match args.len() {
            1 | 2 => false,

            3 => match &args[2] {
                Ast::Identifier { name, .. } if name.eq_ignore_ascii_case(self.throw) => true,
                _ => return Err(self.argument_mismatch(position)),
            },

            _ => return Err(self.argument_mismatch(position)),
        };

        let normalized = self.output.len();

        self.output.push_str(name);
        self.open_args(false);

        match &args[0] {
            Ast::Identifier {
                name: nested,
                position,
            } if self.identifiers_as_names => self.write_name_literal(nested, *position, false)?,

            other => self.write(other)?,
        }

        if let Some(default) = args.get(1) {
            self.write_comma();
            self.write(default)?;
        }

        if throws {
            self.write_comma();
            self.output.push_str(self.throw);
        }

        self.close_args(false);

        let canonical = self
            .hook
            .function(name, args.len() as isize, position, normalized)?;

        self.replace_name(normalized, name, &canonical);

        Ok(())
    }

    fn write_unary_op(&mut self, operator: &str, arg: &Ast, position: usize) -> ExpressionResult<()> {
        let alias = self.operators.unary_alias(operator);

        let symbol = match alias {
            Some(alias) => alias.symbol.as_str(),
            None => operator,
        };

        let nested_name = match arg {
            Ast::Identifier { name, position } if symbol == self.nested_operator && self.identifiers_as_names => {
                Some((name, *position))
            }

            _ => None,
        };

        let normalized = self.output.len();
        let text = self.operator_text(operator, alias);
        let verbal = is_word(&text);

        self.output.push_str(&text);

        match nested_name {
            Some((name, name_position)) => {
                self.space_if(verbal || self.config.unary_op_space);

                self.write_name_literal(
                    name,
                    name_position,
                    self.config.quote_unary_nested_expression_operator_argument,
                )?;
            }

            None => {
                let brackets = match arg {
                    Ast::BinaryOp { .. } => !is_subscript(arg),
                    Ast::Conditional { .. } => true,
                    Ast::UnaryOp { .. } => self.config.redundant_unary_op_brackets,
                    _ => false,
                };

                self.space_if(
                    verbal
                        || self.config.unary_op_space
                        || (!brackets && self.starts_with_symbol(arg)),
                );

                self.write_operand(arg, brackets)?;
            }
        }

        let resolved = self.hook.unary_op(operator, position, normalized)?;

        if !verbal && self.config.replace_alias_operators {
            self.replace_name(normalized, &text, &resolved);
        }

        Ok(())
    }

    fn write_binary_op(
        &mut self,
        operator: &str,
        lhs: &Ast,
        rhs: &Ast,
        position: usize,
    ) -> ExpressionResult<()> {
        let precedence = self.precedence(operator);
        let redundant = self.config.redundant_binary_op_brackets;

        let lhs_brackets = match lhs {
            Ast::BinaryOp { operator, .. } if !is_subscript(lhs) => {
                redundant || self.precedence(operator) < precedence
            }

            Ast::Conditional { .. } => true,

            _ => false,
        };

        let rhs_brackets = match rhs {
            Ast::BinaryOp { operator, .. } if !is_subscript(rhs) => {
                redundant || self.precedence(operator) <= precedence
            }

            Ast::Conditional { .. } => true,

            _ => false,
        };

        self.write_operand(lhs, lhs_brackets)?;

        let alias = self.operators.binary_alias(operator);
        let text = self.operator_text(operator, alias);
        let verbal = is_word(&text);
        let spaces = verbal || self.config.binary_op_spaces;

        self.space_if(spaces);

        let normalized = self.output.len();

        self.output.push_str(&text);

        self.space_if(spaces || (!rhs_brackets && self.starts_with_symbol(rhs)));

        self.write_operand(rhs, rhs_brackets)?;

        let resolved = self.hook.binary_op(operator, position, normalized)?;

        if !verbal && self.config.replace_alias_operators {
            self.replace_name(normalized, &text, &resolved);
        }

        Ok(())
    }

    fn write_operand(&mut self, ast: &Ast, brackets: bool) -> ExpressionResult<()> {
        if !brackets {
            return self.write(ast);
        }

        self.output.push('(');
        self.space_if(self.config.inner_bracket_spaces);
        self.write(ast)?;
        self.space_if(self.config.inner_bracket_spaces);
        self.output.push(')');

        Ok(())
    }

    fn write_name_literal(&mut self, name: &str, position: usize, quote: bool) -> ExpressionResult<()> {
        let normalized = self.output.len();
        let value = self.hook.string(name);

        match quote {
            true => write_string(&mut self.output, name),
            false => self.output.push_str(name),
        }

        self.hook.literal(&value, position, normalized)
    }

    fn write_literal(&mut self, value: &Value, hint: LiteralHint) {
        match value {
            Value::Void => (),

            Value::Boolean(value) => self.output.push_str(match value {
                true => "true",
                false => "false",
            }),

            Value::Integer(value) => {
                let text = match self.integer_radix(hint) {
                    LiteralHint::Hexadecimal => format!("0x{value:X}"),
                    LiteralHint::Octal => format!("0o{value:o}"),
                    LiteralHint::Binary => format!("0b{value:b}"),
                    _ => format!("{value}"),
                };

                self.output.push_str(&text);
            }

            Value::Float(value) if value.is_nan() => self.output.push_str(Arithmetics::NAN),

            Value::Float(value) if value.is_infinite() => {
                if value.is_sign_negative() {
                    self.output.push('-');
                }

                self.output.push_str(Arithmetics::INFINITY);
            }

            Value::Float(value) => {
                let text = match hint == LiteralHint::Scientific
                    && self.config.keep_scientific_format
                    && value.is_finite()
                {
                    true => format!("{value:e}"),
                    false => format_float(*value),
                };

                self.output.push_str(&text);
            }

            Value::String(string) => write_string(&mut self.output, string),

            Value::Custom(..) => self.output.push_str(&value.to_string()),
        }
    }

    fn integer_radix(&self, hint: LiteralHint) -> LiteralHint {
        match self.config.number_radix {
            NumberRadix::Keep => hint,
            NumberRadix::Decimal => LiteralHint::None,
            NumberRadix::Hexadecimal => LiteralHint::Hexadecimal,
            NumberRadix::Octal => LiteralHint::Octal,
            NumberRadix::Binary => LiteralHint::Binary,
        }
    }

    fn operator_text(&self, operator: &str, alias: Option<&OperatorAlias>) -> CompactString {
        let Some(alias) = alias else {
            return CompactString::from(operator);
        };

        match self.config.verbal_operators {
            VerbalOperators::Keep => CompactString::from(operator),
            VerbalOperators::Symbolic => alias.symbol.clone(),
            VerbalOperators::LowerCase => CompactString::from(operator.to_lowercase()),
            VerbalOperators::UpperCase => CompactString::from(operator.to_uppercase()),
            VerbalOperators::DefinedLetterCase => alias.defined.clone(),
        }
    }

    // True if the printed operand begins with an operator symbol, which would
    // merge with the preceding operator symbol.
    fn starts_with_symbol(&self, ast: &Ast) -> bool {
        match ast {
            Ast::Literal(literal) => match &literal.value {
                Value::Integer(value) => {
                    *value < 0
                        && !matches!(
                            self.integer_radix(literal.hint),
                            LiteralHint::Hexadecimal | LiteralHint::Octal | LiteralHint::Binary,
                        )
                }
                Value::Float(value) => value.is_sign_negative() && !value.is_nan(),
                _ => false,
            },

            Ast::UnaryOp { operator, .. } => {
                let alias = self.operators.unary_alias(operator);

                !is_word(&self.operator_text(operator, alias))
            }

            Ast::BinaryOp { lhs, .. } => self.starts_with_symbol(lhs),

            _ => false,
        }
    }

    #[inline(always)]
    fn precedence(&self, operator: &str) -> i32 {
        self.operators.binary_precedence(operator).unwrap_or(0)
    }

    fn replace_name(&mut self, start: usize, written: &str, canonical: &str) {
        if !self.config.replace_function_names || written == canonical {
            return;
        }

        if self.output.get(start..start + written.len()) != Some(written) {
            return;
        }

        self.output
            .replace_range(start..start + written.len(), canonical);
    }

    fn open_args(&mut self, empty: bool) {
        self.space_if(self.config.function_space_before_opening_bracket);
        self.output.push('(');
        self.space_if(!empty && self.config.function_inner_bracket_spaces);
    }

    fn close_args(&mut self, empty: bool) {
        self.space_if(!empty && self.config.function_inner_bracket_spaces);
        self.output.push(')');
    }

    fn write_comma(&mut self) {
        self.space_if(self.config.function_space_before_comma);
        self.output.push(',');
        self.space_if(self.config.function_space_after_comma);
    }

    #[inline(always)]
    fn space_if(&mut self, condition: bool) {
        if condition {
            self.output.push(' ');
        }
    }

    fn argument_mismatch(&mut self, position: usize) -> ExpressionError {
        let error = ExpressionError::NestedExpressionCallArgumentMismatch {
            function: self.nested_function.name.clone(),
        };

        self.hook.error(error, position)
    }
}

#[inline(always)]
fn is_word(text: &str) -> bool {
    text.starts_with(|ch: char| ch.is_alphabetic())
}

#[inline(always)]
fn is_subscript(ast: &Ast) -> bool {
    matches!(ast, Ast::BinaryOp { operator, .. } if *operator == SUBSCRIPT)
}

fn write_string(output: &mut String, string: &str) {
    output.push('"');

    for ch in string.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\t' => output.push_str("\\t"),
            '\r' => output.push_str("\\r"),
            other => output.push(other),
        }
    }

    output.push('"');
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::{NormalizationConfig, NumberRadix, VerbalOperators},
        runtime::ExpressionError,
        testing::test_compiler,
    };

    fn normalize_all(config: Option<NormalizationConfig>, cases: &[(&str, &str)]) {
        let mut compiler = test_compiler();

        if let Some(config) = config {
            compiler.set_normalization(config);
        }

        for (text, expected) in cases {
            let expression = compiler
                .compile(text)
                .unwrap_or_else(|error| panic!("{text}: {error}"));

            assert_eq!(expression.normalized_string(), *expected, "{text}");
        }
    }

    #[test]
    fn test_default_normalization() {
        normalize_all(
            None,
            &[
                ("1+2", "1 + 2"),
                ("a*(b+1)", "a * (b + 1)"),
                ("((a))", "a"),
                ("(a*b)+1", "a * b + 1"),
                ("a-(b-1)", "a - (b - 1)"),
                ("(a-b)-1", "a - b - 1"),
                ("a>0?b:1", "a > 0 ? b : 1"),
                ("(a>0?b:1)+1", "(a > 0 ? b : 1) + 1"),
                ("toupper( s )", "ToUpper(s)"),
                ("substr(s,1,2)", "Substring(s, 1, 2)"),
                ("not (a > b)", "NOT (a > b)"),
                ("a > 0 and b < 0", "a > 0 AND b < 0"),
                ("- -a", "- -a"),
                ("-(a+1)", "-(a + 1)"),
                ("0x1f + 0b101 + 0o17", "0x1F + 0b101 + 0o17"),
                ("2.5e-3 * a", "2.5e-3 * a"),
                ("-5 + a", "-5 + a"),
                ("\"a\\\"b\" + s", "\"a\\\"b\" + s"),
                ("s[a]", "s[a]"),
                ("a?:b", "a ?: b"),
                ("expr(Name, 0)", "Expression(Name, 0)"),
                ("EXPRESSION(\"Name\", 0, Throw)", "Expression(\"Name\", 0, throw)"),
            ],
        );
    }

    #[test]
    fn test_verbal_operator_modes() {
        let mut config = NormalizationConfig::new();

        config.verbal_operators = VerbalOperators::Symbolic;

        normalize_all(
            Some(config.clone()),
            &[
                ("not (a > b) or b == 1", "!(a > b) || b == 1"),
                ("a gt b", "a > b"),
            ],
        );

        config.verbal_operators = VerbalOperators::DefinedLetterCase;

        normalize_all(Some(config.clone()), &[("a GREATER b", "a Greater b")]);

        config.verbal_operators = VerbalOperators::LowerCase;

        normalize_all(Some(config.clone()), &[("a Smaller b", "a smaller b")]);

        config.verbal_operators = VerbalOperators::Keep;

        normalize_all(Some(config), &[("a sMaLLer b", "a sMaLLer b")]);
    }

    #[test]
    fn test_spacing_and_radix() {
        let mut config = NormalizationConfig::new();

        config.binary_op_spaces = false;
        config.conditional_op_spaces = false;
        config.function_space_after_comma = false;
        config.number_radix = NumberRadix::Hexadecimal;

        normalize_all(
            Some(config),
            &[
                ("a - -1", "a-0xFFFFFFFFFFFFFFFF"),
                ("a - 255", "a-0xFF"),
                ("a > 0 ? 1 : 2", "a>0x0?0x1:0x2"),
                ("Substring(s, 1, 2)", "Substring(s,0x1,0x2)"),
            ],
        );

        let mut config = NormalizationConfig::new();

        config.redundant_binary_op_brackets = true;
        config.function_inner_bracket_spaces = true;
        config.replace_function_names = false;

        normalize_all(
            Some(config),
            &[
                ("a * b + 1", "(a * b) + 1"),
                ("toupper(s)", "toupper( s )"),
            ],
        );
    }

    #[test]
    fn test_nested_call_arguments() {
        let compiler = test_compiler();

        for text in ["Expression()", "Expression(\"A\", 1, 2)", "Expression(\"A\", 1, 2, 3)"] {
            let Err(error) = compiler.compile(text) else {
                panic!("{text}: compilation succeeded.");
            };

            assert!(
                matches!(
                    error.root(),
                    ExpressionError::NestedExpressionCallArgumentMismatch { .. },
                ),
                "{text}: {error}",
            );
        }
    }
}
