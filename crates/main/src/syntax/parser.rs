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

use std::sync::Arc;

use compact_str::CompactString;
use lady_deirdre::lexis::{SourceCode, TokenBuffer};

use crate::{
    runtime::{Arena, ExpressionError, ExpressionResult, Value},
    syntax::{token::ExprToken, Ast, Literal, LiteralHint, OperatorTable},
};

/// A parser of the expression source text.
///
/// The parser receives the operator table of the compiler, because the set of
/// the operators and their precedences is configured at runtime. String
/// literals must be allocated in the `arena`, which is the arena of the
/// compile-time scope of the expression.
pub trait Parser: Send + Sync {
    /// Parses the `text` into a syntax tree.
    fn parse(&self, text: &str, operators: &OperatorTable, arena: &mut Arena) -> ExpressionResult<Ast>;
}

/// The built-in [Parser].
///
/// Recognizes decimal, hexadecimal (`0x`), octal (`0o`) and binary (`0b`)
/// integers, floats with an optional exponent, double-quoted strings,
/// identifiers, function calls, the registered unary and binary operators
/// (including their alphabetic aliases), the subscript `a[b]`, and the
/// conditional operator `q ? t : f`.
#[derive(Clone, Copy, Default, Debug)]
pub struct DefaultParser;

impl Parser for DefaultParser {
    fn parse(&self, text: &str, operators: &OperatorTable, arena: &mut Arena) -> ExpressionResult<Ast> {
        let source = Arc::<str>::from(text);

        let mut parser = ParseState::new(text, operators, arena)
            .map_err(|(error, position)| error.with_source(&source, position))?;

        parser
            .parse_root()
            .map_err(|(error, position)| error.with_source(&source, position))
    }
}

type ParseResult<T> = Result<T, (ExpressionError, usize)>;

struct Lexeme<'a> {
    token: ExprToken,
    string: &'a str,
    position: usize,
}

struct ParseState<'a> {
    end: usize,
    lexemes: Vec<Lexeme<'a>>,
    cursor: usize,
    offset: usize,
    operators: &'a OperatorTable,
    arena: &'a mut Arena,
}

impl<'a> ParseState<'a> {
    fn new(text: &'a str, operators: &'a OperatorTable, arena: &'a mut Arena) -> ParseResult<Self> {
        let buffer = TokenBuffer::<ExprToken>::from(text);

        let mut lexemes = Vec::new();
        let mut position = 0;

        for chunk in buffer.chunks(..) {
            let length = chunk.string.len();

            match chunk.token {
                ExprToken::Whitespace => (),

                ExprToken::Unknown => {
                    let expected = match chunk.string.starts_with('"') {
                        true => "closing quote of the string literal",
                        false => "valid character",
                    };

                    return Err((ExpressionError::Syntax { expected, position }, position));
                }

                token => {
                    let Some(string) = text.get(position..position + length) else {
                        break;
                    };

                    lexemes.push(Lexeme {
                        token,
                        string,
                        position,
                    })
                }
            }

            position += length;
        }

        Ok(Self {
            end: text.len(),
            lexemes,
            cursor: 0,
            offset: 0,
            operators,
            arena,
        })
    }

    fn parse_root(&mut self) -> ParseResult<Ast> {
        if self.lexemes.is_empty() {
            return Err((ExpressionError::EmptyExpressionString, 0));
        }

        let ast = self.parse_conditional()?;

        if self.cursor < self.lexemes.len() {
            let position = self.position();

            return Err((
                ExpressionError::Syntax {
                    expected: "end of expression",
                    position,
                },
                position,
            ));
        }

        Ok(ast)
    }

    fn parse_conditional(&mut self) -> ParseResult<Ast> {
        let q = self.parse_binary(0)?;

        let Some((head, position)) = self.symbol_head() else {
            return Ok(q);
        };

        if !head.starts_with('?') {
            return Ok(q);
        }

        self.advance_symbol(1);

        let t = self.parse_conditional()?;

        let colon_position = match self.symbol_head() {
            Some((head, position)) if head.starts_with(':') => position,
            _ => return Err(self.expected("':' of the conditional operator")),
        };

        self.advance_symbol(1);

        let f = self.parse_conditional()?;

        Ok(Ast::Conditional {
            q: Box::new(q),
            t: Box::new(t),
            f: Box::new(f),
            position,
            colon_position,
        })
    }

    fn parse_binary(&mut self, min_precedence: i32) -> ParseResult<Ast> {
        let mut lhs = self.parse_simple(false)?;

        loop {
            let Some((operator, length, precedence, position)) = self.peek_binary()? else {
                break;
            };

            if precedence < min_precedence {
                break;
            }

            match length {
                0 => self.advance(),
                _ => self.advance_symbol(length),
            }

            let rhs = self.parse_binary(precedence + 1)?;

            lhs = Ast::BinaryOp {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                position,
            };
        }

        Ok(lhs)
    }

    // Returns the operator, the number of symbol characters to consume (zero
    // for a word operator), the precedence, and the position.
    fn peek_binary(&self) -> ParseResult<Option<(CompactString, usize, i32, usize)>> {
        let Some(lexeme) = self.lexemes.get(self.cursor) else {
            return Ok(None);
        };

        match lexeme.token {
            ExprToken::Ident => {
                let Some(precedence) = self
                    .operators
                    .binary_alias(lexeme.string)
                    .and_then(|_| self.operators.binary_precedence(lexeme.string))
                else {
                    return Ok(None);
                };

                Ok(Some((
                    CompactString::from(lexeme.string),
                    0,
                    precedence,
                    lexeme.position,
                )))
            }

            ExprToken::Symbol => {
                let Some((run, position)) = self.symbol_head() else {
                    return Ok(None);
                };

                if run.starts_with('?') {
                    return Ok(self.peek_elvis(run, position));
                }

                if run.starts_with(':') {
                    return Ok(None);
                }

                let Some(operator) = self.operators.binary_prefix(run) else {
                    return Err((
                        ExpressionError::UnknownBinaryOperatorSymbol {
                            operator: CompactString::from(run),
                        },
                        position,
                    ));
                };

                let precedence = self.operators.binary_precedence(operator).unwrap_or(0);

                Ok(Some((
                    CompactString::from(operator),
                    operator.len(),
                    precedence,
                    position,
                )))
            }

            _ => Ok(None),
        }
    }

    // The Elvis operator is written as "?:", or as "?" followed by ":" after
    // a blank.
    fn peek_elvis(&self, run: &str, position: usize) -> Option<(CompactString, usize, i32, usize)> {
        const ELVIS: &str = "?:";

        let precedence = self.operators.binary_precedence(ELVIS)?;

        let split = run == "?"
            && self
                .lexemes
                .get(self.cursor + 1)
                .map(|next| next.token == ExprToken::Symbol && next.string.starts_with(':'))
                .unwrap_or(false);

        if !run.starts_with(ELVIS) && !split {
            return None;
        }

        Some((CompactString::from(ELVIS), ELVIS.len(), precedence, position))
    }

    // A `negated` operand is the argument of the unary minus, so a decimal
    // literal may reach the magnitude of i64::MIN.
    fn parse_simple(&mut self, negated: bool) -> ParseResult<Ast> {
        let Some(lexeme) = self.lexemes.get(self.cursor) else {
            return Err(self.expected("operand"));
        };

        let token = lexeme.token;
        let position = lexeme.position;
        let string = lexeme.string;

        let simple = match token {
            ExprToken::ParenOpen => {
                self.advance();

                let inner = self.parse_conditional()?;

                self.expect(ExprToken::ParenClose, "')'")?;

                inner
            }

            ExprToken::Symbol => {
                let Some((run, position)) = self.symbol_head() else {
                    return Err(self.expected("operand"));
                };

                let Some(operator) = self.operators.unary_prefix(run) else {
                    return Err((
                        ExpressionError::UnknownUnaryOperatorSymbol {
                            operator: CompactString::from(run),
                        },
                        position,
                    ));
                };

                let operator = CompactString::from(operator);

                self.advance_symbol(operator.len());

                let arg = self.parse_simple(operator == "-")?;

                return Ok(Ast::UnaryOp {
                    operator,
                    arg: Box::new(arg),
                    position,
                });
            }

            ExprToken::Ident if self.operators.unary_alias(string).is_some() => {
                self.advance();

                let arg = self.parse_simple(false)?;

                return Ok(Ast::UnaryOp {
                    operator: CompactString::from(string),
                    arg: Box::new(arg),
                    position,
                });
            }

            ExprToken::Ident => {
                self.advance();

                match self.peek_token() {
                    Some(ExprToken::ParenOpen) => {
                        self.advance();

                        let args = self.parse_args()?;

                        Ast::Function {
                            name: CompactString::from(string),
                            args,
                            position,
                        }
                    }

                    _ => Ast::Identifier {
                        name: CompactString::from(string),
                        position,
                    },
                }
            }

            ExprToken::Int => {
                self.advance();

                Ast::Literal(parse_integer(string, negated, position)?)
            }

            ExprToken::Float => {
                self.advance();

                let Ok(value) = string.parse::<f64>() else {
                    return Err((
                        ExpressionError::Syntax {
                            expected: "float literal",
                            position,
                        },
                        position,
                    ));
                };

                let hint = match string.contains(['e', 'E']) {
                    true => LiteralHint::Scientific,
                    false => LiteralHint::None,
                };

                Ast::Literal(Literal {
                    value: Value::Float(value),
                    hint,
                    position,
                })
            }

            ExprToken::String => {
                self.advance();

                let text = unescape(string);

                Ast::Literal(Literal {
                    value: Value::String(self.arena.alloc_str(&text)),
                    hint: LiteralHint::None,
                    position,
                })
            }

            _ => return Err(self.expected("operand")),
        };

        self.parse_subscripts(simple)
    }

    fn parse_subscripts(&mut self, mut simple: Ast) -> ParseResult<Ast> {
        const SUBSCRIPT: &str = "[]";

        while let Some(lexeme) = self.lexemes.get(self.cursor) {
            if lexeme.token != ExprToken::BracketOpen
                || self.operators.binary_precedence(SUBSCRIPT).is_none()
            {
                break;
            }

            let position = lexeme.position;

            self.advance();

            let index = self.parse_conditional()?;

            self.expect(ExprToken::BracketClose, "']'")?;

            simple = Ast::BinaryOp {
                operator: CompactString::from(SUBSCRIPT),
                lhs: Box::new(simple),
                rhs: Box::new(index),
                position,
            };
        }

        Ok(simple)
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Ast>> {
        let mut args = Vec::new();

        if self.peek_token() == Some(ExprToken::ParenClose) {
            self.advance();

            return Ok(args);
        }

        loop {
            args.push(self.parse_conditional()?);

            match self.peek_token() {
                Some(ExprToken::Comma) => self.advance(),

                Some(ExprToken::ParenClose) => {
                    self.advance();

                    return Ok(args);
                }

                _ => return Err(self.expected("',' or ')'")),
            }
        }
    }

    #[inline(always)]
    fn peek_token(&self) -> Option<ExprToken> {
        match self.offset {
            0 => self.lexemes.get(self.cursor).map(|lexeme| lexeme.token),
            _ => Some(ExprToken::Symbol),
        }
    }

    // The unconsumed part of the current symbol run, and its position.
    fn symbol_head(&self) -> Option<(&'a str, usize)> {
        let lexeme = self.lexemes.get(self.cursor)?;

        if lexeme.token != ExprToken::Symbol {
            return None;
        }

        Some((lexeme.string.get(self.offset..)?, lexeme.position + self.offset))
    }

    // Consumes the characters of the symbol runs. The consumption may cross
    // the boundary of adjacent runs.
    fn advance_symbol(&mut self, mut length: usize) {
        while length > 0 {
            let Some(lexeme) = self.lexemes.get(self.cursor) else {
                return;
            };

            let rest = lexeme.string.len() - self.offset;

            if length < rest {
                self.offset += length;
                return;
            }

            length -= rest;
            self.advance();
        }
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.cursor += 1;
        self.offset = 0;
    }

    fn expect(&mut self, token: ExprToken, expected: &'static str) -> ParseResult<()> {
        if self.peek_token() != Some(token) {
            return Err(self.expected(expected));
        }

        self.advance();

        Ok(())
    }

    #[inline(always)]
    fn position(&self) -> usize {
        match self.lexemes.get(self.cursor) {
            Some(lexeme) => lexeme.position + self.offset,
            None => self.end,
        }
    }

    #[inline(always)]
    fn expected(&self, expected: &'static str) -> (ExpressionError, usize) {
        let position = self.position();

        (ExpressionError::Syntax { expected, position }, position)
    }
}

fn parse_integer(string: &str, negated: bool, position: usize) -> ParseResult<Literal> {
    let prefix = string.get(0..2).map(|prefix| prefix.to_ascii_lowercase());

    let (digits, radix, hint) = match prefix.as_deref() {
        Some("0x") => (&string[2..], 16, LiteralHint::Hexadecimal),
        Some("0o") => (&string[2..], 8, LiteralHint::Octal),
        Some("0b") => (&string[2..], 2, LiteralHint::Binary),
        _ => (string, 10, LiteralHint::None),
    };

    let out_of_range = (
        ExpressionError::Syntax {
            expected: "integer literal within the 64-bit range",
            position,
        },
        position,
    );

    let Ok(value) = u64::from_str_radix(digits, radix) else {
        return Err(out_of_range);
    };

    // Radix literals are bit patterns and may set the sign bit.
    let limit = match negated {
        true => i64::MIN.unsigned_abs(),
        false => i64::MAX.unsigned_abs(),
    };

    if radix == 10 && value > limit {
        return Err(out_of_range);
    }

    Ok(Literal {
        value: Value::Integer(value as i64),
        hint,
        position,
    })
}

fn unescape(string: &str) -> String {
    let inner = string
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(string);

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use crate::{
        runtime::{Arena, ExpressionError, Value},
        syntax::{Ast, DefaultParser, LiteralHint, OperatorTable, Parser},
    };

    fn operators() -> OperatorTable {
        let mut table = OperatorTable::new(true);

        for operator in ["+", "-", "!", "~", "*"] {
            let _ = table.add_unary(operator);
        }

        for (operator, precedence) in [
            ("*", 900),
            ("+", 800),
            ("-", 800),
            ("<", 600),
            ("<=", 600),
            ("==", 500),
            ("&&", 440),
            ("||", 430),
            ("?:", 200),
            ("[]", 100),
        ] {
            let _ = table.add_binary(operator, precedence);
        }

        table.add_unary_alias("Not", "!");
        table.add_binary_alias("And", "&&");

        table
    }

    fn parse(text: &str) -> Ast {
        DefaultParser
            .parse(text, &operators(), &mut Arena::new())
            .unwrap_or_else(|error| panic!("{text}: {error}"))
    }

    fn parse_error(text: &str) -> ExpressionError {
        match DefaultParser.parse(text, &operators(), &mut Arena::new()) {
            Ok(ast) => panic!("{text}: parsed into {ast:?}"),
            Err(error) => error,
        }
    }

    // Renders the tree in a fully bracketed form.
    fn render(ast: &Ast) -> String {
        match ast {
            Ast::Literal(literal) => match &literal.value {
                Value::String(string) => format!("{string:?}"),
                other => other.to_string(),
            },

            Ast::Identifier { name, .. } => name.to_string(),

            Ast::Function { name, args, .. } => format!(
                "{name}({})",
                args.iter().map(render).collect::<Vec<_>>().join(", "),
            ),

            Ast::UnaryOp { operator, arg, .. } => format!("{operator}[{}]", render(arg)),

            Ast::BinaryOp {
                operator, lhs, rhs, ..
            } => format!("({} {operator} {})", render(lhs), render(rhs)),

            Ast::Conditional { q, t, f, .. } => {
                format!("({} ? {} : {})", render(q), render(t), render(f))
            }
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(render(&parse("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(render(&parse("1 - 2 - 3")), "((1 - 2) - 3)");
        assert_eq!(render(&parse("a < b && c == d")), "((a < b) && (c == d))");
        assert_eq!(render(&parse("a || b && c")), "(a || (b && c))");
        assert_eq!(render(&parse("(1 + 2) * 3")), "((1 + 2) * 3)");
        assert_eq!(render(&parse("a ?: b + 1")), "(a ?: (b + 1))");
        assert_eq!(render(&parse("a ? : b")), "(a ?: b)");
    }

    #[test]
    fn test_operator_splitting() {
        assert_eq!(render(&parse("a*-b")), "(a * -[b])");
        assert_eq!(render(&parse("a<=-1")), "(a <= -[1])");
        assert_eq!(render(&parse("--a")), "-[-[a]]");
        assert_eq!(render(&parse("!!a")), "![![a]]");
        assert_eq!(render(&parse("not a and b")), "(not[a] and b)");
        assert_eq!(render(&parse("*\"Name\" + 1")), "(*[\"Name\"] + 1)");
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(render(&parse("a ? 1 : 2")), "(a ? 1 : 2)");
        assert_eq!(
            render(&parse("a ? b ? 1 : 2 : c ? 3 : 4")),
            "(a ? (b ? 1 : 2) : (c ? 3 : 4))",
        );
        assert_eq!(render(&parse("a<b?-1:1")), "((a < b) ? -[1] : 1)");

        let Ast::Conditional {
            position,
            colon_position,
            ..
        } = parse("a ? 1 : 2")
        else {
            panic!("Conditional expected.");
        };

        assert_eq!(position, 2);
        assert_eq!(colon_position, 6);
    }

    #[test]
    fn test_functions_and_subscripts() {
        assert_eq!(render(&parse("f()")), "f()");
        assert_eq!(render(&parse("f(1, g(2), x)")), "f(1, g(2), x)");
        assert_eq!(render(&parse("s[1 + 1]")), "(s [] (1 + 1))");
        assert_eq!(render(&parse("-s[0]")), "-[(s [] 0)]");
    }

    #[test]
    fn test_literals() {
        let Ast::Literal(literal) = parse("0x1F") else {
            panic!("Literal expected.");
        };

        assert_eq!(literal.value, Value::Integer(31));
        assert_eq!(literal.hint, LiteralHint::Hexadecimal);

        let Ast::Literal(literal) = parse("0b101") else {
            panic!("Literal expected.");
        };

        assert_eq!(literal.value, Value::Integer(5));
        assert_eq!(literal.hint, LiteralHint::Binary);

        let Ast::Literal(literal) = parse("2.5e2") else {
            panic!("Literal expected.");
        };

        assert_eq!(literal.value, Value::Float(250.0));
        assert_eq!(literal.hint, LiteralHint::Scientific);

        let Ast::Literal(literal) = parse("\"a\\\"b\\n\"") else {
            panic!("Literal expected.");
        };

        assert_eq!(literal.value, Value::from("a\"b\n"));

        let Ast::Literal(literal) = parse("0xFFFFFFFFFFFFFFFF") else {
            panic!("Literal expected.");
        };

        assert_eq!(literal.value, Value::Integer(-1));

        let Ast::Literal(literal) = parse("9223372036854775807") else {
            panic!("Literal expected.");
        };

        assert_eq!(literal.value, Value::Integer(i64::MAX));

        let Ast::UnaryOp { operator, arg, .. } = parse("-9223372036854775808") else {
            panic!("Unary operator expected.");
        };

        assert_eq!(operator.as_str(), "-");
        assert_eq!(render(&arg), i64::MIN.to_string());

        for text in ["9223372036854775808", "18446744073709551615", "1 - 9223372036854775808"] {
            assert!(
                matches!(
                    parse_error(text).root(),
                    ExpressionError::Syntax {
                        expected: "integer literal within the 64-bit range",
                        ..
                    },
                ),
                "{text}",
            );
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse_error("").root(),
            ExpressionError::EmptyExpressionString,
        ));
        assert!(matches!(
            parse_error("   ").root(),
            ExpressionError::EmptyExpressionString,
        ));

        let error = parse_error("1 + ");

        assert!(matches!(error.root(), ExpressionError::Syntax { .. }));
        assert_eq!(error.position(), Some(4));

        let error = parse_error("(1 + 2");

        assert!(matches!(
            error.root(),
            ExpressionError::Syntax { expected: "')'", .. },
        ));

        let error = parse_error("1 2");

        assert!(matches!(
            error.root(),
            ExpressionError::Syntax {
                expected: "end of expression",
                position: 2,
            },
        ));

        assert!(matches!(
            parse_error("1 % 2").root(),
            ExpressionError::UnknownBinaryOperatorSymbol { .. },
        ));
        assert!(matches!(
            parse_error("/1").root(),
            ExpressionError::UnknownUnaryOperatorSymbol { .. },
        ));
        assert!(matches!(
            parse_error("a ? 1").root(),
            ExpressionError::Syntax { .. },
        ));
        assert!(matches!(
            parse_error("\"abc").root(),
            ExpressionError::Syntax { .. },
        ));
    }
}
