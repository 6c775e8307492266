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

use lady_deirdre::lexis::Token;

/// Lexical tokens of the expression language.
///
/// Operator symbols are scanned as runs of the operator characters: the
/// parser splits a run into the registered operators, because the set of
/// operators is configured at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Token)]
#[repr(u8)]
#[non_exhaustive]
pub enum ExprToken {
    EOI = 0,

    Unknown = 1,

    #[rule("(")]
    ParenOpen,

    #[rule(")")]
    ParenClose,

    #[rule("[")]
    BracketOpen,

    #[rule("]")]
    BracketClose,

    #[rule(",")]
    Comma,

    #[rule([
        '+', '-', '*', '/', '%', '<', '>', '=', '!', '&', '|', '^', '~', '?', ':', '@', '#', '$'
    ]+)]
    #[describe("operator")]
    Symbol,

    #[rule(['a'..'z', 'A'..'Z', '_'] ['a'..'z', 'A'..'Z', '0'..'9', '_']*)]
    #[describe("identifier")]
    Ident,

    #[rule(
        | ['0'..'9']+
        | '0' ['x', 'X'] ['0'..'9', 'a'..'f', 'A'..'F']+
        | '0' ['o', 'O'] ['0'..'7']+
        | '0' ['b', 'B'] ['0', '1']+
    )]
    #[describe("number")]
    Int,

    #[rule(
        ['0'..'9']+
        (
            | '.' ['0'..'9']+ (['e', 'E'] ['-', '+']? ['0'..'9']+)?
            | ['e', 'E'] ['-', '+']? ['0'..'9']+
        )
    )]
    #[priority(1)]
    #[describe("number")]
    Float,

    #[rule('"' (^['"', '\\'] | '\\' .)* '"')]
    #[describe("string")]
    String,

    #[rule([' ', '\t', '\n', '\r', '\x0c']+)]
    #[describe("blank")]
    Whitespace,
}

impl Default for ExprToken {
    #[inline(always)]
    fn default() -> Self {
        Self::Unknown
    }
}

#[cfg(test)]
mod tests {
    use lady_deirdre::lexis::{SourceCode, Token, TokenBuffer};

    use crate::syntax::token::ExprToken;

    fn tokens(text: &str) -> Vec<(ExprToken, String)> {
        let buffer = TokenBuffer::<ExprToken>::from(text);

        buffer
            .chunks(..)
            .filter(|chunk| chunk.token != ExprToken::Whitespace)
            .map(|chunk| (chunk.token, chunk.string.to_string()))
            .collect()
    }

    #[test]
    fn test_expression_tokens() {
        assert_eq!(
            tokens("Abs(x1) >= 0x1F && \"a\\\"b\" != 2.5e-3"),
            vec![
                (ExprToken::Ident, String::from("Abs")),
                (ExprToken::ParenOpen, String::from("(")),
                (ExprToken::Ident, String::from("x1")),
                (ExprToken::ParenClose, String::from(")")),
                (ExprToken::Symbol, String::from(">=")),
                (ExprToken::Int, String::from("0x1F")),
                (ExprToken::Symbol, String::from("&&")),
                (ExprToken::String, String::from("\"a\\\"b\"")),
                (ExprToken::Symbol, String::from("!=")),
                (ExprToken::Float, String::from("2.5e-3")),
            ],
        );

        assert_eq!(
            tokens("a?-1:2"),
            vec![
                (ExprToken::Ident, String::from("a")),
                (ExprToken::Symbol, String::from("?-")),
                (ExprToken::Int, String::from("1")),
                (ExprToken::Symbol, String::from(":")),
                (ExprToken::Int, String::from("2")),
            ],
        );
    }

    #[test]
    fn test_token_descriptions() {
        assert_eq!(
            "Symbol",
            <ExprToken as Token>::rule_name(ExprToken::Symbol as u8).unwrap()
        );

        assert_eq!(
            "operator",
            <ExprToken as Token>::rule_description(ExprToken::Symbol as u8, false).unwrap()
        );
    }
}
