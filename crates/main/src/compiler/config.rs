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

/// Options of the [Compiler](crate::compiler::Compiler) that affect parsing,
/// operator resolution, and optimization.
///
/// The operator and alias switches take effect when the compiler is
/// [set up](crate::compiler::Compiler::setup_defaults). The rest of the
/// options are consulted on every compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct CompilationConfig {
    /// Registers the unary operators `+`, `-`, `!`, `~`, and `*`.
    ///
    /// The default value is `true`.
    pub default_unary_operators: bool,

    /// Registers the built-in binary operators with their precedences.
    ///
    /// The default value is `true`.
    pub default_binary_operators: bool,

    /// Registers the verbal operator aliases such as `Not`, `And`, `Or`,
    /// `Smaller`, or `Equals`.
    ///
    /// The default value is `true`.
    pub default_alphabetic_operator_aliases: bool,

    /// If set, the verbal aliases are recognized regardless of their letter
    /// case.
    ///
    /// The default value is `true`.
    pub alphabetic_operators_ignore_case: bool,

    /// Makes the assignment operator `=` a synonym of the equality operator
    /// `==`.
    ///
    /// The default value is `true`.
    pub alias_equals_operator_with_assign_operator: bool,

    /// Makes the bitwise operators `~`, `&`, and `|` applicable to the
    /// boolean operands as the synonyms of `!`, `&&`, and `||`.
    ///
    /// The default value is `true`.
    pub allow_bitwise_boolean_operations: bool,

    /// Allows calling parameterless functions without the parentheses, as
    /// if they were identifiers.
    ///
    /// The default value is `true`.
    pub allow_omitting_parentheses_of_parameterless_functions: bool,

    /// Allows writing the identifiers with the empty parentheses, as if they
    /// were parameterless functions.
    ///
    /// The default value is `true`.
    pub allow_empty_parentheses_for_identifier_functions: bool,

    /// Allows the nested expressions referred to by a constant name to be
    /// resolved and embedded at compile time.
    ///
    /// When disabled, only the two- and three-argument forms of the nested
    /// expression function are available, and they are always resolved at
    /// evaluation time.
    ///
    /// The default value is `true`.
    pub allow_compile_time_nested_expressions: bool,

    /// Allows the names of the nested expressions to be written as
    /// identifiers rather than string literals: `*Name` instead of
    /// `*"Name"`.
    ///
    /// The default value is `true`.
    pub allow_identifiers_for_nested_expressions: bool,

    /// If set, the names of the named expressions are case-sensitive.
    ///
    /// The default value is `false`.
    pub case_sensitive_named_expressions: bool,

    /// If set, the errors raised by the plugins are passed to the caller as
    /// they are, without the plugin context.
    ///
    /// The default value is `false`.
    pub plugin_exception_fall_through: bool,

    /// If set, the errors raised by the callbacks during evaluation are
    /// passed to the caller as they are, without the callback context.
    ///
    /// The default value is `false`.
    pub callback_exception_fall_through: bool,

    /// Disables constant folding and the other compile-time optimizations.
    ///
    /// The default value is `false`.
    pub no_optimization: bool,

    /// The maximum depth of the nested expressions compiled within one
    /// compilation.
    ///
    /// The default value is `32`.
    pub max_nesting_depth: usize,
}

impl Default for CompilationConfig {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationConfig {
    /// The default constructor for this configuration object.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            default_unary_operators: true,
            default_binary_operators: true,
            default_alphabetic_operator_aliases: true,
            alphabetic_operators_ignore_case: true,
            alias_equals_operator_with_assign_operator: true,
            allow_bitwise_boolean_operations: true,
            allow_omitting_parentheses_of_parameterless_functions: true,
            allow_empty_parentheses_for_identifier_functions: true,
            allow_compile_time_nested_expressions: true,
            allow_identifiers_for_nested_expressions: true,
            case_sensitive_named_expressions: false,
            plugin_exception_fall_through: false,
            callback_exception_fall_through: false,
            no_optimization: false,
            max_nesting_depth: 32,
        }
    }
}

/// Options of the normalized expression strings.
///
/// The compiler prints every compiled expression back into a normalized
/// string (see [Expression::normalized_string](crate::compiler::Expression::normalized_string)).
/// The same options apply to the optimized strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct NormalizationConfig {
    /// Replaces the function and identifier names as written (possibly
    /// abbreviated or in a different letter case) with their canonical
    /// names.
    ///
    /// The default value is `true`.
    pub replace_function_names: bool,

    /// Replaces the symbolic operators with the operators they were
    /// resolved to, for example `=` with `==`.
    ///
    /// The default value is `false`.
    pub replace_alias_operators: bool,

    /// The rendering of the verbal operator aliases.
    ///
    /// The default value is [VerbalOperators::UpperCase].
    pub verbal_operators: VerbalOperators,

    /// Quotes the name of the nested expression applied to the nested
    /// expression operator when the name was written as an identifier.
    ///
    /// The default value is `false`.
    pub quote_unary_nested_expression_operator_argument: bool,

    /// Folds the `+` and `-` unary operators applied to the number literals
    /// into the literals.
    ///
    /// The default value is `true`.
    pub remove_redundant_unary_ops_on_number_literals: bool,

    /// Writes a space between a unary operator and its operand.
    ///
    /// The default value is `false`.
    pub unary_op_space: bool,

    /// Surrounds the binary operators with spaces.
    ///
    /// The default value is `true`.
    pub binary_op_spaces: bool,

    /// Surrounds the `?` and `:` symbols of the conditional operator with
    /// spaces.
    ///
    /// The default value is `true`.
    pub conditional_op_spaces: bool,

    /// The default value is `false`.
    pub function_space_before_opening_bracket: bool,

    /// Writes the spaces after the opening and before the closing bracket of
    /// the non-empty argument lists.
    ///
    /// The default value is `false`.
    pub function_inner_bracket_spaces: bool,

    /// The default value is `false`.
    pub function_space_before_comma: bool,

    /// The default value is `true`.
    pub function_space_after_comma: bool,

    /// Writes the spaces inside the grouping brackets.
    ///
    /// The default value is `false`.
    pub inner_bracket_spaces: bool,

    /// Writes the spaces inside the subscript brackets.
    ///
    /// The default value is `false`.
    pub subscript_inner_bracket_spaces: bool,

    /// Brackets the binary operator operands even if the precedences make
    /// them redundant.
    ///
    /// The default value is `false`.
    pub redundant_binary_op_brackets: bool,

    /// Brackets the unary operator operands that are unary operators
    /// themselves.
    ///
    /// The default value is `false`.
    pub redundant_unary_op_brackets: bool,

    /// Brackets the conditional operators nested in the branches of a
    /// conditional operator.
    ///
    /// The default value is `false`.
    pub redundant_conditional_brackets: bool,

    /// Keeps the exponent notation of the float literals written with the
    /// exponent.
    ///
    /// The default value is `true`.
    pub keep_scientific_format: bool,

    /// The radix of the integer literals.
    ///
    /// The default value is [NumberRadix::Keep].
    pub number_radix: NumberRadix,
}

impl Default for NormalizationConfig {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizationConfig {
    /// The default constructor for this configuration object.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            replace_function_names: true,
            replace_alias_operators: false,
            verbal_operators: VerbalOperators::UpperCase,
            quote_unary_nested_expression_operator_argument: false,
            remove_redundant_unary_ops_on_number_literals: true,
            unary_op_space: false,
            binary_op_spaces: true,
            conditional_op_spaces: true,
            function_space_before_opening_bracket: false,
            function_inner_bracket_spaces: false,
            function_space_before_comma: false,
            function_space_after_comma: true,
            inner_bracket_spaces: false,
            subscript_inner_bracket_spaces: false,
            redundant_binary_op_brackets: false,
            redundant_unary_op_brackets: false,
            redundant_conditional_brackets: false,
            keep_scientific_format: true,
            number_radix: NumberRadix::Keep,
        }
    }
}

/// The rendering of the verbal operator aliases in the normalized strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerbalOperators {
    /// As written in the source.
    Keep,

    /// Replaced with the operator symbols.
    Symbolic,

    LowerCase,

    #[default]
    UpperCase,

    /// In the letter case the alias was registered with.
    DefinedLetterCase,
}

/// The radix of the integer literals in the normalized strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberRadix {
    /// As written in the source.
    #[default]
    Keep,
    Decimal,
    Hexadecimal,
    Octal,
    Binary,
}

/// A selection of the built-in plugins installed by
/// [Compiler::setup_defaults](crate::compiler::Compiler::setup_defaults).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct BuiltInPlugins {
    /// The [ElvisOperator](crate::plugins::ElvisOperator) plugin.
    pub elvis_operator: bool,

    /// The [AutoCast](crate::plugins::AutoCast) plugin.
    pub auto_cast: bool,

    /// The [Strings](crate::plugins::Strings) plugin.
    pub strings: bool,

    /// The [Arithmetics](crate::plugins::Arithmetics) plugin.
    pub arithmetics: bool,
}

impl Default for BuiltInPlugins {
    #[inline(always)]
    fn default() -> Self {
        Self::all()
    }
}

impl BuiltInPlugins {
    /// Selects every built-in plugin.
    #[inline(always)]
    pub const fn all() -> Self {
        Self {
            elvis_operator: true,
            auto_cast: true,
            strings: true,
            arithmetics: true,
        }
    }

    /// Selects none of the built-in plugins.
    #[inline(always)]
    pub const fn none() -> Self {
        Self {
            elvis_operator: false,
            auto_cast: false,
            strings: false,
            arithmetics: false,
        }
    }
}

/// The priorities of the built-in plugins.
///
/// The compiler consults the plugins with higher priorities first. Custom
/// plugins usually take precedence over the built-in ones.
pub struct CompilePriority;

impl CompilePriority {
    pub const ELVIS: i32 = 100;
    pub const AUTO_CAST: i32 = 200;
    pub const STRINGS: i32 = 300;
    pub const ARITHMETICS: i32 = 400;
    pub const CUSTOM: i32 = 1000;
}
