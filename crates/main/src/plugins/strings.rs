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

use std::{cmp::Ordering, sync::Arc};

use compact_str::{format_compact, CompactString};

use crate::{
    plugins::{
        AutoCastEntry,
        AutoCastQuery,
        BinaryOpQuery,
        CallbackEntry,
        Calculus,
        CompilerPlugin,
        FunctionBody,
        FunctionName,
        FunctionQuery,
        Resolution,
        Signature,
        UnaryOpQuery,
        CONDITIONAL_OPERATOR,
    },
    report::system_panic,
    runtime::{ExpressionError, ExpressionResult, Scope, Type, Value},
};

/// Built-in plugin of the string operations.
///
/// Provides:
///
///  - Constants `NewLine` and `Tabulator`.
///  - Functions `String(..)`, `ToUpper`, `ToLower`, `Compare`, `StartsWith`,
///    `EndsWith`, `Substring`, `IndexOf`, `Count`, `Trim`, `TrimStart`,
///    `TrimEnd`, `Integer(s)`, `Float(s)`, `Hexadecimal`, `Octal`, `Binary`,
///    `Replace`, `Repeat`, and `WildcardMatch`.
///  - Unary operators `+` (upper case), `-` (lower case), and `!` (emptiness
///    test).
///  - Binary string concatenation `+`, comparisons, wildcard matching `*`,
///    and the subscript `[]` returning the character at an index.
///  - Auto-cast of any non-string operand to string for the `+` operator and
///    for the conditional branches, when the other operand is a string.
///
/// When the wildcard pattern is a constant, the compiled pattern is stored in
/// the compile-time scope of the expression and reused by every evaluation.
pub struct Strings {
    calculus: Calculus,
}

impl Default for Strings {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Strings {
    /// Creates the plugin tables.
    pub fn new() -> Self {
        match Self::build() {
            Ok(calculus) => Self { calculus },
            Err(error) => system_panic!("Strings tables setup failure. {error}"),
        }
    }

    fn build() -> ExpressionResult<Calculus> {
        use Type::{Boolean as B, Integer as I, String as S};

        let mut calculus = Calculus::new("Strings");

        calculus.add_constant(FunctionName::abbreviated("NewLine", 4), "\n");
        calculus.add_constant(FunctionName::abbreviated("Tabulator", 3), "\t");

        let functions: [(&str, usize, Signature, CallbackEntry); 31] = [
            ("String", 3, Signature::Variadic(vec![]), pure(concat, "concat", S)),
            ("ToUpper", 3, Signature::Fixed(vec![S]), pure(to_upper, "to_upper", S)),
            ("ToLower", 3, Signature::Fixed(vec![S]), pure(to_lower, "to_lower", S)),
            ("Compare", 4, Signature::Fixed(vec![S, S]), pure(compare, "compare", I)),
            ("Compare", 4, Signature::Fixed(vec![S, S, B]), pure(compare, "compare", I)),
            ("StartsWith", 7, Signature::Fixed(vec![S, S]), pure(starts_with, "starts_with", B)),
            ("StartsWith", 7, Signature::Fixed(vec![S, S, B]), pure(starts_with, "starts_with", B)),
            ("EndsWith", 5, Signature::Fixed(vec![S, S]), pure(ends_with, "ends_with", B)),
            ("EndsWith", 5, Signature::Fixed(vec![S, S, B]), pure(ends_with, "ends_with", B)),
            ("Substring", 4, Signature::Fixed(vec![S, I]), pure(substring, "substring", S)),
            ("Substring", 4, Signature::Fixed(vec![S, I, I]), pure(substring, "substring", S)),
            ("IndexOf", 5, Signature::Fixed(vec![S, S]), pure(index_of, "index_of", I)),
            ("Count", 5, Signature::Fixed(vec![S, S]), pure(count, "count", I)),
            ("Trim", 4, Signature::Fixed(vec![S]), pure(trim, "trim", S)),
            ("Trim", 4, Signature::Fixed(vec![S, S]), pure(trim, "trim", S)),
            ("TrimStart", 5, Signature::Fixed(vec![S]), pure(trim_start, "trim_start", S)),
            ("TrimStart", 5, Signature::Fixed(vec![S, S]), pure(trim_start, "trim_start", S)),
            ("TrimEnd", 5, Signature::Fixed(vec![S]), pure(trim_end, "trim_end", S)),
            ("TrimEnd", 5, Signature::Fixed(vec![S, S]), pure(trim_end, "trim_end", S)),
            ("Integer", 3, Signature::Fixed(vec![S]), pure(parse_int, "parse_int", I)),
            ("Float", 5, Signature::Fixed(vec![S]), pure(parse_float, "parse_float", Type::Float)),
            ("Hexadecimal", 3, Signature::Fixed(vec![I]), pure(hexadecimal, "hexadecimal", S)),
            ("Hexadecimal", 3, Signature::Fixed(vec![I, I]), pure(hexadecimal, "hexadecimal", S)),
            ("Octal", 3, Signature::Fixed(vec![I]), pure(octal, "octal", S)),
            ("Octal", 3, Signature::Fixed(vec![I, I]), pure(octal, "octal", S)),
            ("Binary", 3, Signature::Fixed(vec![I]), pure(binary, "binary", S)),
            ("Binary", 3, Signature::Fixed(vec![I, I]), pure(binary, "binary", S)),
            ("Replace", 4, Signature::Fixed(vec![S, S, S]), pure(replace, "replace", S)),
            ("Repeat", 6, Signature::Fixed(vec![S, I]), pure(repeat, "repeat", S)),
            (WILDCARD_MATCH, 8, Signature::Fixed(vec![S, S]), pure(wildcard_match, "wildcard_match", B)),
            (WILDCARD_MATCH, 8, Signature::Fixed(vec![S, S, B]), pure(wildcard_match, "wildcard_match", B)),
        ];

        for (name, min_len, signature, entry) in functions {
            calculus.add_function(
                FunctionName::abbreviated(name, min_len),
                signature,
                FunctionBody::Callback(entry),
            );
        }

        calculus.add_unary_op("+", S, pure(to_upper, "to_upper", S))?;
        calculus.add_unary_op("-", S, pure(to_lower, "to_lower", S))?;
        calculus.add_unary_op("!", S, pure(is_empty, "is_empty", B))?;

        calculus.add_binary_op("+", S, S, pure(concat, "concat", S))?;
        calculus.add_binary_op("<", S, S, pure(sm, "sm", B))?;
        calculus.add_binary_op("<=", S, S, pure(smeq, "smeq", B))?;
        calculus.add_binary_op(">", S, S, pure(gt, "gt", B))?;
        calculus.add_binary_op(">=", S, S, pure(gteq, "gteq", B))?;
        calculus.add_binary_op("==", S, S, pure(eq, "eq", B))?;
        calculus.add_binary_op("!=", S, S, pure(neq, "neq", B))?;
        calculus.add_binary_op("*", S, S, pure(wildcard_match, "wildcard_match", B))?;
        calculus.add_binary_op("[]", S, I, pure(char_at, "char_at", S))?;

        calculus.add_auto_cast(AutoCastEntry {
            ty: None,
            other: Some(S),
            operators: vec![
                CompactString::from("+"),
                CompactString::from(CONDITIONAL_OPERATOR),
            ],
            declined: Vec::new(),
            cast: pure(to_string, "to_string", S),
            reverse_function: Some(CompactString::from("String")),
        });

        Ok(calculus)
    }

    /// Gives access to the underlying tables.
    #[inline(always)]
    pub fn calculus(&self) -> &Calculus {
        &self.calculus
    }
}

impl CompilerPlugin for Strings {
    #[inline(always)]
    fn name(&self) -> &str {
        self.calculus.name()
    }

    fn known_names(&self) -> Vec<CompactString> {
        self.calculus.known_names().map(CompactString::from).collect()
    }

    fn try_function(&self, query: &mut FunctionQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        let resolution = self.calculus.resolve_function(query)?;

        if let Some(Resolution::Callback(..)) = &resolution {
            if query.name == WILDCARD_MATCH {
                let ignore_case = match query.args.get(2) {
                    None => Some(false),
                    Some(arg) => arg.constant.as_ref().map(Value::is_truthy),
                };

                if let (Some(pattern), Some(ignore_case)) = (
                    query.args.get(1).and_then(|arg| arg.constant.as_ref()),
                    ignore_case,
                ) {
                    cache_pattern(query.scope, pattern, ignore_case);
                }
            }
        }

        Ok(resolution)
    }

    #[inline(always)]
    fn try_unary_op(&self, query: &mut UnaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        self.calculus.resolve_unary_op(query)
    }

    fn try_binary_op(&self, query: &mut BinaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        let resolution = self.calculus.resolve_binary_op(query)?;

        if let Some(Resolution::Callback(..)) = &resolution {
            if query.operator == "*" {
                if let Some(pattern) = &query.rhs.constant {
                    cache_pattern(query.scope, pattern, false);
                }
            }
        }

        Ok(resolution)
    }

    #[inline(always)]
    fn try_auto_cast(&self, query: &mut AutoCastQuery<'_>) -> ExpressionResult<bool> {
        self.calculus.resolve_auto_cast(query)
    }
}

const WILDCARD_MATCH: &str = "WildcardMatch";

#[inline(always)]
fn pure(callback: crate::runtime::Callback, name: &'static str, result_type: Type) -> CallbackEntry {
    CallbackEntry::pure(callback, name, result_type)
}

/// A compiled wildcard pattern: `*` matches any sequence of characters, and
/// `?` matches any single character.
#[derive(Debug)]
struct WildcardPattern {
    pattern: Vec<char>,
    ignore_case: bool,
}

impl WildcardPattern {
    fn new(pattern: &str, ignore_case: bool) -> Self {
        let pattern = match ignore_case {
            true => pattern.to_lowercase().chars().collect(),
            false => pattern.chars().collect(),
        };

        Self {
            pattern,
            ignore_case,
        }
    }

    #[inline(always)]
    fn key(pattern: &str, ignore_case: bool) -> CompactString {
        match ignore_case {
            true => format_compact!("_wcI{pattern}"),
            false => format_compact!("_wcS{pattern}"),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let text = match self.ignore_case {
            true => text.to_lowercase().chars().collect::<Vec<_>>(),
            false => text.chars().collect::<Vec<_>>(),
        };

        let pattern = &self.pattern;

        let mut text_index = 0;
        let mut pattern_index = 0;
        let mut backtrack = None;

        while text_index < text.len() {
            match pattern.get(pattern_index) {
                Some('*') => {
                    pattern_index += 1;
                    backtrack = Some((pattern_index, text_index));
                    continue;
                }

                Some(ch) if *ch == '?' || *ch == text[text_index] => {
                    pattern_index += 1;
                    text_index += 1;
                    continue;
                }

                _ => (),
            }

            let Some((star_pattern, star_text)) = backtrack else {
                return false;
            };

            pattern_index = star_pattern;
            text_index = star_text + 1;
            backtrack = Some((star_pattern, text_index));
        }

        pattern[pattern_index..].iter().all(|ch| *ch == '*')
    }
}

fn cache_pattern(scope: &mut Scope<'static>, pattern: &Value, ignore_case: bool) {
    let Some(pattern) = pattern.as_str() else {
        return;
    };

    let key = WildcardPattern::key(pattern, ignore_case);

    if scope.resource(&key).is_some() {
        return;
    }

    let _ = scope.set_resource(key, Arc::new(WildcardPattern::new(pattern, ignore_case)));
}

#[inline(always)]
fn string(args: &[Value], index: usize) -> &str {
    args.get(index).and_then(Value::as_str).unwrap_or_default()
}

#[inline(always)]
fn integer(args: &[Value], index: usize) -> i64 {
    args.get(index)
        .and_then(Value::to_integer)
        .unwrap_or_default()
}

#[inline(always)]
fn flag(args: &[Value], index: usize) -> bool {
    args.get(index).map(Value::is_truthy).unwrap_or_default()
}

fn to_string(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = args.first().map(ToString::to_string).unwrap_or_default();

    Ok(scope.alloc_str(&text))
}

fn concat(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let mut text = String::new();

    for arg in args {
        text.push_str(&arg.to_string());
    }

    Ok(scope.alloc_str(&text))
}

fn to_upper(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(scope.alloc_str(&string(args, 0).to_uppercase()))
}

fn to_lower(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(scope.alloc_str(&string(args, 0).to_lowercase()))
}

fn is_empty(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(string(args, 0).is_empty()))
}

fn ordering(args: &[Value]) -> Ordering {
    let lhs = string(args, 0);
    let rhs = string(args, 1);

    match flag(args, 2) {
        true => lhs.to_lowercase().cmp(&rhs.to_lowercase()),
        false => lhs.cmp(rhs),
    }
}

fn compare(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Integer(match ordering(args) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

fn sm(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(ordering(args).is_lt()))
}

fn smeq(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(ordering(args).is_le()))
}

fn gt(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(ordering(args).is_gt()))
}

fn gteq(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(ordering(args).is_ge()))
}

fn eq(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(string(args, 0) == string(args, 1)))
}

fn neq(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    Ok(Value::Boolean(string(args, 0) != string(args, 1)))
}

fn starts_with(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let prefix = string(args, 1);

    Ok(Value::Boolean(match flag(args, 2) {
        true => text.to_lowercase().starts_with(&prefix.to_lowercase()),
        false => text.starts_with(prefix),
    }))
}

fn ends_with(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let suffix = string(args, 1);

    Ok(Value::Boolean(match flag(args, 2) {
        true => text.to_lowercase().ends_with(&suffix.to_lowercase()),
        false => text.ends_with(suffix),
    }))
}

fn substring(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let start = usize::try_from(integer(args, 1)).unwrap_or_default();

    let length = match args.len() > 2 {
        true => usize::try_from(integer(args, 2)).unwrap_or_default(),
        false => usize::MAX,
    };

    let result = text.chars().skip(start).take(length).collect::<String>();

    Ok(scope.alloc_str(&result))
}

fn char_at(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);

    let result = match usize::try_from(integer(args, 1)) {
        Ok(index) => text.chars().nth(index).map(String::from).unwrap_or_default(),
        Err(_) => String::new(),
    };

    Ok(scope.alloc_str(&result))
}

fn index_of(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let needle = string(args, 1);

    let index = match text.find(needle) {
        Some(byte) => text[..byte].chars().count() as i64,
        None => -1,
    };

    Ok(Value::Integer(index))
}

fn count(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let needle = string(args, 1);

    let count = match needle.is_empty() {
        true => 0,
        false => text.matches(needle).count() as i64,
    };

    Ok(Value::Integer(count))
}

const WHITESPACES: &str = " \n\r\t";

#[inline(always)]
fn trim_set(args: &[Value]) -> &str {
    match args.len() > 1 {
        true => string(args, 1),
        false => WHITESPACES,
    }
}

fn trim(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let set = trim_set(args);
    let result = string(args, 0).trim_matches(|ch: char| set.contains(ch));

    Ok(scope.alloc_str(result))
}

fn trim_start(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let set = trim_set(args);
    let result = string(args, 0).trim_start_matches(|ch: char| set.contains(ch));

    Ok(scope.alloc_str(result))
}

fn trim_end(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let set = trim_set(args);
    let result = string(args, 0).trim_end_matches(|ch: char| set.contains(ch));

    Ok(scope.alloc_str(result))
}

fn parse_int(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0).trim();

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let lower = digits.to_ascii_lowercase();

    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(octal) = lower.strip_prefix("0o") {
        i64::from_str_radix(octal, 8)
    } else if let Some(binary) = lower.strip_prefix("0b") {
        i64::from_str_radix(binary, 2)
    } else {
        lower.parse::<i64>()
    };

    match parsed {
        Ok(value) if negative => Ok(Value::Integer(value.wrapping_neg())),
        Ok(value) => Ok(Value::Integer(value)),
        Err(_) => Err(ExpressionError::invalid_argument(
            "Integer",
            "The string is not an integer literal.",
        )),
    }
}

fn parse_float(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    match string(args, 0).trim().parse::<f64>() {
        Ok(value) => Ok(Value::Float(value)),
        Err(_) => Err(ExpressionError::invalid_argument(
            "Float",
            "The string is not a float literal.",
        )),
    }
}

fn radix(scope: &mut Scope<'_>, args: &[Value], digits: String) -> Value {
    let width = usize::try_from(integer(args, 1)).unwrap_or_default();

    match digits.len() < width {
        true => scope.alloc_str(&format!("{}{digits}", "0".repeat(width - digits.len()))),
        false => scope.alloc_str(&digits),
    }
}

fn hexadecimal(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let digits = format!("{:X}", integer(args, 0));

    Ok(radix(scope, args, digits))
}

fn octal(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let digits = format!("{:o}", integer(args, 0));

    Ok(radix(scope, args, digits))
}

fn binary(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let digits = format!("{:b}", integer(args, 0));

    Ok(radix(scope, args, digits))
}

fn replace(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let from = string(args, 1);
    let to = string(args, 2);

    match from.is_empty() {
        true => Ok(scope.alloc_str(text)),
        false => Ok(scope.alloc_str(&text.replace(from, to))),
    }
}

fn repeat(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let times = usize::try_from(integer(args, 1)).unwrap_or_default();

    Ok(scope.alloc_str(&string(args, 0).repeat(times)))
}

fn wildcard_match(scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
    let text = string(args, 0);
    let pattern = string(args, 1);
    let ignore_case = flag(args, 2);

    let key = WildcardPattern::key(pattern, ignore_case);

    let cached = scope
        .resource(&key)
        .and_then(|resource| resource.downcast_ref::<WildcardPattern>());

    let matches = match cached {
        Some(compiled) => compiled.matches(text),
        None => WildcardPattern::new(pattern, ignore_case).matches(text),
    };

    Ok(Value::Boolean(matches))
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::Compiler,
        plugins::strings::WildcardPattern,
        runtime::{Scope, Type, Value},
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
    fn test_wildcard_pattern() {
        assert!(WildcardPattern::new("*ldca*", false).matches("wildcard"));
        assert!(!WildcardPattern::new("*LDCA*", false).matches("wildcard"));
        assert!(WildcardPattern::new("*LDCA*", true).matches("wildcard"));
        assert!(WildcardPattern::new("w?ld*d", false).matches("wildcard"));
        assert!(WildcardPattern::new("*", false).matches(""));
        assert!(!WildcardPattern::new("?", false).matches(""));
        assert!(WildcardPattern::new("*.jpg", false).matches("MyPhoto.jpg"));
        assert!(!WildcardPattern::new("*.jpg", false).matches("MyPhoto.png"));
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(evaluate("\"ab\" + \"cd\""), Value::from("abcd"));
        assert_eq!(evaluate("ToUpper(\"abc\")"), Value::from("ABC"));
        assert_eq!(evaluate("-\"ABC\""), Value::from("abc"));
        assert_eq!(evaluate("!\"\""), Value::Boolean(true));
        assert_eq!(evaluate("Compare(\"a\", \"B\", true)"), Value::Integer(-1));
        assert_eq!(evaluate("StartsWith(\"Hello\", \"he\", true)"), Value::Boolean(true));
        assert_eq!(evaluate("EndsWith(\"Hello\", \"LO\")"), Value::Boolean(false));
        assert_eq!(evaluate("Substring(\"Hello\", 1, 3)"), Value::from("ell"));
        assert_eq!(evaluate("IndexOf(\"Hello\", \"l\")"), Value::Integer(2));
        assert_eq!(evaluate("Count(\"Hello\", \"l\")"), Value::Integer(2));
        assert_eq!(evaluate("Trim(\"  x \")"), Value::from("x"));
        assert_eq!(evaluate("TrimStart(\"--x--\", \"-\")"), Value::from("x--"));
        assert_eq!(evaluate("Integer(\"0x1F\")"), Value::Integer(31));
        assert_eq!(evaluate("Float(\"2.5\")"), Value::Float(2.5));
        assert_eq!(evaluate("Hexadecimal(255, 4)"), Value::from("00FF"));
        assert_eq!(evaluate("Binary(5)"), Value::from("101"));
        assert_eq!(evaluate("Replace(\"aXbX\", \"X\", \"-\")"), Value::from("a-b-"));
        assert_eq!(evaluate("Repeat(\"ab\", 3)"), Value::from("ababab"));
        assert_eq!(evaluate("\"Hello\"[1]"), Value::from("e"));
        assert_eq!(evaluate("String(1, \"-\", 2.0, true)"), Value::from("1-2.0true"));
        assert_eq!(evaluate("\"abc\" < \"abd\""), Value::Boolean(true));
        assert_eq!(evaluate("\"abc\" == \"abc\""), Value::Boolean(true));
        assert_eq!(evaluate("\"x\" + 1"), Value::from("x1"));
        assert_eq!(evaluate("WildcardMatch(\"wildcard\", \"*LDCA*\", true)"), Value::Boolean(true));
    }

    #[test]
    fn test_wildcard_resource() {
        let compiler = Compiler::new();

        compiler.add_named("Name", Some("\"photo.jpg\"")).unwrap();

        let expression = compiler.compile("Expression(\"Name\", \"\") * \"*.jpg\"").unwrap();

        assert_eq!(expression.result_type(), Type::Boolean);

        let mut scope = Scope::with_compiler(&compiler);

        assert_eq!(expression.evaluate(&mut scope).unwrap(), Value::Boolean(true));
    }
}
