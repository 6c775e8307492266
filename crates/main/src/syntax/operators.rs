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

use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;

/// A word that stands for an operator symbol (e.g. `And` for `&&`).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OperatorAlias {
    /// The alias as it was defined, in its defined letter case.
    pub defined: CompactString,

    /// The operator symbol the alias stands for.
    pub symbol: CompactString,
}

/// The set of the operators recognized by the parser.
///
/// The table is populated by the
/// [Compiler](crate::compiler::Compiler) setup and is shared between the
/// parser, which uses it to split operator symbols and to resolve the
/// binding strength of the binary operators, and the assembler, which
/// resolves the alphabetic aliases before querying the plugins.
#[derive(Clone, Debug)]
pub struct OperatorTable {
    unary: AHashSet<CompactString>,
    binary: AHashMap<CompactString, i32>,
    unary_aliases: AHashMap<CompactString, OperatorAlias>,
    binary_aliases: AHashMap<CompactString, OperatorAlias>,
    ignore_case: bool,
}

impl Default for OperatorTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(true)
    }
}

impl OperatorTable {
    /// Creates an empty table.
    ///
    /// If `ignore_case` is true, the alphabetic aliases are matched
    /// regardless of their letter case.
    pub fn new(ignore_case: bool) -> Self {
        Self {
            unary: AHashSet::new(),
            binary: AHashMap::new(),
            unary_aliases: AHashMap::new(),
            binary_aliases: AHashMap::new(),
            ignore_case,
        }
    }

    /// Returns true if the alphabetic aliases are matched regardless of their
    /// letter case.
    #[inline(always)]
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Registers a unary operator symbol.
    ///
    /// Returns false if the symbol is already registered.
    #[inline(always)]
    pub fn add_unary(&mut self, operator: &str) -> bool {
        self.unary.insert(CompactString::from(operator))
    }

    /// Registers a binary operator symbol with its precedence. Operators with
    /// a higher precedence bind stronger.
    ///
    /// Returns the previous precedence if the symbol is already registered.
    #[inline(always)]
    pub fn add_binary(&mut self, operator: &str, precedence: i32) -> Option<i32> {
        self.binary.insert(CompactString::from(operator), precedence)
    }

    /// Registers an alphabetic alias of a unary operator.
    pub fn add_unary_alias(&mut self, alias: &str, operator: &str) {
        let _ = self.unary_aliases.insert(
            alias.to_lowercase().into(),
            OperatorAlias {
                defined: CompactString::from(alias),
                symbol: CompactString::from(operator),
            },
        );
    }

    /// Registers an alphabetic alias of a binary operator.
    pub fn add_binary_alias(&mut self, alias: &str, operator: &str) {
        let _ = self.binary_aliases.insert(
            alias.to_lowercase().into(),
            OperatorAlias {
                defined: CompactString::from(alias),
                symbol: CompactString::from(operator),
            },
        );
    }

    /// Returns true if the symbol is a registered unary operator.
    #[inline(always)]
    pub fn is_unary(&self, operator: &str) -> bool {
        self.unary.contains(operator)
    }

    /// Returns the precedence of the binary operator symbol or alias.
    pub fn binary_precedence(&self, operator: &str) -> Option<i32> {
        if let Some(precedence) = self.binary.get(operator) {
            return Some(*precedence);
        }

        let alias = self.binary_alias(operator)?;

        self.binary.get(alias.symbol.as_str()).copied()
    }

    /// Looks up the alias of a unary operator.
    #[inline(always)]
    pub fn unary_alias(&self, word: &str) -> Option<&OperatorAlias> {
        Self::alias(&self.unary_aliases, word, self.ignore_case)
    }

    /// Looks up the alias of a binary operator.
    #[inline(always)]
    pub fn binary_alias(&self, word: &str) -> Option<&OperatorAlias> {
        Self::alias(&self.binary_aliases, word, self.ignore_case)
    }

    /// Iterates over the registered binary operator symbols and their
    /// precedences.
    #[inline(always)]
    pub fn binary_operators(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.binary
            .iter()
            .map(|(operator, precedence)| (operator.as_str(), *precedence))
    }

    // Returns the longest registered binary prefix of the symbol run.
    pub(super) fn binary_prefix<'s>(&self, run: &'s str) -> Option<&'s str> {
        (1..=run.len())
            .rev()
            .filter_map(|length| run.get(..length))
            .find(|prefix| self.binary.contains_key(*prefix))
    }

    // Returns the shortest registered unary prefix of the symbol run.
    pub(super) fn unary_prefix<'s>(&self, run: &'s str) -> Option<&'s str> {
        (1..=run.len())
            .filter_map(|length| run.get(..length))
            .find(|prefix| self.unary.contains(*prefix))
    }

    fn alias<'t>(
        aliases: &'t AHashMap<CompactString, OperatorAlias>,
        word: &str,
        ignore_case: bool,
    ) -> Option<&'t OperatorAlias> {
        if !word.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            return None;
        }

        let alias = aliases.get(word.to_lowercase().as_str())?;

        match ignore_case || alias.defined == word {
            true => Some(alias),
            false => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::OperatorTable;

    #[test]
    fn test_operator_table() {
        let mut table = OperatorTable::new(true);

        assert!(table.add_unary("-"));
        assert!(!table.add_unary("-"));
        assert_eq!(table.add_binary("<", 600), None);
        assert_eq!(table.add_binary("<=", 600), None);
        assert_eq!(table.add_binary("<<", 700), None);

        table.add_binary_alias("Smaller", "<");
        table.add_unary_alias("Not", "!");

        assert_eq!(table.binary_precedence("smaller"), Some(600));
        assert_eq!(table.binary_prefix("<<-"), Some("<<"));
        assert_eq!(table.binary_prefix("<-"), Some("<"));
        assert_eq!(table.binary_prefix("-"), None);
        assert_eq!(table.unary_prefix("--"), Some("-"));

        let Some(alias) = table.unary_alias("NOT") else {
            panic!("Alias not found.");
        };

        assert_eq!(alias.defined, "Not");
        assert_eq!(alias.symbol, "!");

        let mut strict = OperatorTable::new(false);

        strict.add_unary_alias("Not", "!");

        assert!(strict.unary_alias("Not").is_some());
        assert!(strict.unary_alias("NOT").is_none());
    }
}
