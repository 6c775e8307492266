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

use std::fmt::{Debug, Formatter};

use ahash::AHashMap;
use compact_str::CompactString;

use crate::{
    plugins::{
        invoke_at_compile_time,
        AutoCastQuery,
        BinaryOpQuery,
        BoundCallback,
        Cast,
        CompilerPlugin,
        FunctionQuery,
        Resolution,
        UnaryOpQuery,
    },
    runtime::{Callback, ExpressionError, ExpressionResult, Type, Value},
};

/// A name pattern of the functions and the constant identifiers.
///
/// The pattern accepts the full name, and the abbreviations of the name down
/// to the `min_len` characters. The zero `min_len` disables the
/// abbreviations.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionName {
    /// The canonical name written into the normalized expression string.
    pub name: CompactString,

    /// The minimal length of the accepted abbreviations.
    pub min_len: usize,

    /// If true, the name is matched case-insensitively.
    pub ignore_case: bool,
}

impl FunctionName {
    /// Creates a case-insensitive pattern without abbreviations.
    #[inline(always)]
    pub fn new(name: &str) -> Self {
        Self {
            name: CompactString::from(name),
            min_len: 0,
            ignore_case: true,
        }
    }

    /// Creates a case-insensitive pattern that accepts the abbreviations of
    /// at least `min_len` characters.
    #[inline(always)]
    pub fn abbreviated(name: &str, min_len: usize) -> Self {
        Self {
            name: CompactString::from(name),
            min_len,
            ignore_case: true,
        }
    }

    /// Returns true if `candidate` matches this pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        let full = candidate.len() == self.name.len();

        if !full && (self.min_len == 0 || candidate.len() < self.min_len) {
            return false;
        }

        let Some(prefix) = self.name.get(0..candidate.len()) else {
            return false;
        };

        match self.ignore_case {
            true => prefix.eq_ignore_ascii_case(candidate),
            false => prefix == candidate,
        }
    }
}

/// The parameter list of a [FunctionEntry].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Signature {
    /// The function is an identifier: it has no parameters, and it is
    /// normally written without the parentheses.
    Identifier,

    /// The function accepts exactly the listed types.
    Fixed(Vec<Type>),

    /// The function accepts the listed types followed by any number of
    /// arguments of any type.
    Variadic(Vec<Type>),
}

impl Signature {
    #[inline(always)]
    fn required(&self) -> &[Type] {
        match self {
            Self::Identifier => &[],
            Self::Fixed(types) | Self::Variadic(types) => types,
        }
    }

    fn accepts(&self, given: &[Type]) -> bool {
        let required = self.required();

        let shared_are_same = required
            .iter()
            .zip(given.iter())
            .all(|(required, given)| required == given);

        if !shared_are_same {
            return false;
        }

        match self {
            Self::Variadic(_) => given.len() >= required.len(),
            _ => given.len() == required.len(),
        }
    }
}

/// A runtime callback registered in the [Calculus] tables.
#[derive(Clone, Copy)]
pub struct CallbackEntry {
    /// The callback function.
    pub callback: Callback,

    /// The debug name of the callback shown in the program listing.
    pub name: &'static str,

    /// The type of the values the callback returns.
    pub result_type: Type,

    /// If true, the callback is a pure function of its arguments, and the
    /// compiler invokes it right away when all arguments are constants.
    pub compile_time_invokable: bool,
}

impl Debug for CallbackEntry {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CallbackEntry")
            .field("name", &self.name)
            .field("result_type", &self.result_type)
            .field("compile_time_invokable", &self.compile_time_invokable)
            .finish()
    }
}

impl CallbackEntry {
    /// Creates a compile-time invokable entry.
    #[inline(always)]
    pub fn pure(callback: Callback, name: &'static str, result_type: Type) -> Self {
        Self {
            callback,
            name,
            result_type,
            compile_time_invokable: true,
        }
    }

    /// Creates an entry that is always invoked at evaluation time.
    #[inline(always)]
    pub fn volatile(callback: Callback, name: &'static str, result_type: Type) -> Self {
        Self {
            callback,
            name,
            result_type,
            compile_time_invokable: false,
        }
    }

    #[inline(always)]
    fn bound(&self) -> BoundCallback {
        BoundCallback {
            callback: self.callback,
            result_type: self.result_type,
            name: self.name,
        }
    }
}

/// The implementation of a [FunctionEntry].
#[derive(Clone, Debug)]
pub enum FunctionBody {
    /// The function is a constant: every call is replaced by the value.
    Constant(Value),

    /// The function is computed by the callback.
    Callback(CallbackEntry),
}

/// A function registered in the [Calculus].
#[derive(Clone, Debug)]
pub struct FunctionEntry {
    /// The name pattern.
    pub name: FunctionName,

    /// The accepted argument types.
    pub signature: Signature,

    /// The implementation.
    pub body: FunctionBody,
}

/// A constant identifier registered in the [Calculus] (e.g. `true`).
#[derive(Clone, Debug)]
pub struct ConstantIdentifier {
    /// The name pattern.
    pub name: FunctionName,

    /// The value of the identifier.
    pub value: Value,
}

/// A key of the operator tables: the operator symbol and the operand types.
///
/// The right-hand side type of the unary operators is [Type::Void].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct OperatorKey {
    /// The operator symbol.
    pub operator: CompactString,

    /// The type of the left-hand side (or the single) operand.
    pub lhs: Type,

    /// The type of the right-hand side operand.
    pub rhs: Type,
}

impl OperatorKey {
    /// Creates a key of the unary operator.
    #[inline(always)]
    pub fn unary(operator: &str, arg: Type) -> Self {
        Self {
            operator: CompactString::from(operator),
            lhs: arg,
            rhs: Type::Void,
        }
    }

    /// Creates a key of the binary operator.
    #[inline(always)]
    pub fn binary(operator: &str, lhs: Type, rhs: Type) -> Self {
        Self {
            operator: CompactString::from(operator),
            lhs,
            rhs,
        }
    }

    fn redefinition(&self) -> ExpressionError {
        ExpressionError::OperatorRedefinition {
            operator: self.operator.clone(),
            lhs: CompactString::from(self.lhs.builtin_name().unwrap_or("Custom")),
            rhs: CompactString::from(self.rhs.builtin_name().unwrap_or("Custom")),
        }
    }
}

/// Which operand of the binary operator is the constant one in an
/// [Optimization] rule.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OptimizationSide {
    /// The left-hand side is the constant.
    Lhs,

    /// The right-hand side is the constant.
    Rhs,

    /// Either side may be the constant.
    Both,
}

impl OptimizationSide {
    #[inline(always)]
    fn covers(self, lhs_is_const: bool) -> bool {
        match self {
            Self::Lhs => lhs_is_const,
            Self::Rhs => !lhs_is_const,
            Self::Both => true,
        }
    }
}

/// A rule applied to the binary operators with exactly one constant
/// operand, such as `x * 1` or `x || true`.
#[derive(Clone, Debug)]
pub struct Optimization {
    /// The side of the constant operand.
    pub side: OptimizationSide,

    /// The operator symbol.
    pub operator: CompactString,

    /// The type of the non-constant operand.
    pub ty: Type,

    /// The value of the constant operand.
    pub constant: Value,

    /// The result of the operation, or None if the result is the non-constant
    /// operand itself.
    pub result: Option<Value>,
}

/// An implicit conversion rule applied by [Calculus::try_auto_cast].
#[derive(Clone, Debug)]
pub struct AutoCastEntry {
    /// The type of the operand that is converted. None matches any type
    /// except the conversion result type.
    pub ty: Option<Type>,

    /// The required type of the other operand of a binary operator (or of the
    /// other conditional branch). None matches any type and the unary
    /// operators.
    pub other: Option<Type>,

    /// The operators the conversion applies to. The empty list means all
    /// operators not listed in [declined](Self::declined).
    pub operators: Vec<CompactString>,

    /// The operators the conversion never applies to.
    pub declined: Vec<CompactString>,

    /// The conversion function.
    pub cast: CallbackEntry,

    /// The expression function that performs the same conversion, used to
    /// write the optimized expression string.
    pub reverse_function: Option<CompactString>,
}

impl AutoCastEntry {
    fn applies(&self, operator: &str, ty: &Type, other: Option<&Type>) -> bool {
        match &self.ty {
            Some(expected) if expected != ty => return false,
            None if ty == &self.cast.result_type => return false,
            _ => (),
        }

        if let Some(expected) = &self.other {
            if other != Some(expected) {
                return false;
            }
        }

        if self.declined.iter().any(|declined| declined.as_str() == &*operator) {
            return false;
        }

        self.operators.is_empty() || self.operators.iter().any(|accepted| accepted.as_str() == &*operator)
    }

    fn to_cast(&self, constant: Option<ExpressionResult<Value>>) -> ExpressionResult<Cast> {
        if let Some(value) = constant {
            return Ok(Cast::Constant(value?));
        }

        Ok(Cast::Callback {
            callback: self.cast.callback,
            name: self.cast.name,
            result_type: self.cast.result_type,
            reverse_function: self.reverse_function.clone(),
        })
    }
}

/// A table-driven implementation of the [CompilerPlugin] protocol.
///
/// The Calculus keeps the constant identifiers, the functions, the operator
/// maps, the operator aliases, the constant-operand optimization rules, and
/// the auto-cast rules. The built-in plugins are thin wrappers that fill
/// these tables, and the host plugins can do the same.
pub struct Calculus {
    name: CompactString,
    constant_identifiers: Vec<ConstantIdentifier>,
    functions: Vec<FunctionEntry>,
    unary_ops: AHashMap<OperatorKey, CallbackEntry>,
    binary_ops: AHashMap<OperatorKey, CallbackEntry>,
    unary_aliases: AHashMap<OperatorKey, CompactString>,
    binary_aliases: AHashMap<OperatorKey, CompactString>,
    optimizations: AHashMap<(CompactString, Type), Vec<Optimization>>,
    auto_casts: Vec<AutoCastEntry>,
}

impl Debug for Calculus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Calculus")
            .field("name", &self.name)
            .field("constant_identifiers", &self.constant_identifiers.len())
            .field("functions", &self.functions.len())
            .field("unary_ops", &self.unary_ops.len())
            .field("binary_ops", &self.binary_ops.len())
            .field("auto_casts", &self.auto_casts.len())
            .finish()
    }
}

impl Calculus {
    /// Creates empty tables of the plugin with the specified name.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            constant_identifiers: Vec::new(),
            functions: Vec::new(),
            unary_ops: AHashMap::new(),
            binary_ops: AHashMap::new(),
            unary_aliases: AHashMap::new(),
            binary_aliases: AHashMap::new(),
            optimizations: AHashMap::new(),
            auto_casts: Vec::new(),
        }
    }

    /// Registers a constant identifier.
    #[inline(always)]
    pub fn add_constant(&mut self, name: FunctionName, value: impl Into<Value>) {
        self.constant_identifiers.push(ConstantIdentifier {
            name,
            value: value.into(),
        });
    }

    /// Registers a function.
    ///
    /// Functions are matched in the registration order. A function whose
    /// name matches but whose signature does not accept the arguments is
    /// reported in the diagnostics if no other function matches.
    #[inline(always)]
    pub fn add_function(&mut self, name: FunctionName, signature: Signature, body: FunctionBody) {
        self.functions.push(FunctionEntry {
            name,
            signature,
            body,
        });
    }

    /// Registers a unary operator for the operand type.
    pub fn add_unary_op(
        &mut self,
        operator: &str,
        arg: Type,
        entry: CallbackEntry,
    ) -> ExpressionResult<()> {
        let key = OperatorKey::unary(operator, arg);

        if self.unary_ops.contains_key(&key) {
            return Err(key.redefinition());
        }

        let _ = self.unary_ops.insert(key, entry);

        Ok(())
    }

    /// Registers a binary operator for the operand types.
    pub fn add_binary_op(
        &mut self,
        operator: &str,
        lhs: Type,
        rhs: Type,
        entry: CallbackEntry,
    ) -> ExpressionResult<()> {
        let key = OperatorKey::binary(operator, lhs, rhs);

        if self.binary_ops.contains_key(&key) {
            return Err(key.redefinition());
        }

        let _ = self.binary_ops.insert(key, entry);

        Ok(())
    }

    /// Makes the unary `alias` operator a synonym of the `operator` for the
    /// operand type.
    pub fn add_unary_alias(&mut self, alias: &str, arg: Type, operator: &str) -> ExpressionResult<()> {
        let key = OperatorKey::unary(alias, arg);

        if self.unary_aliases.contains_key(&key) {
            return Err(key.redefinition());
        }

        let _ = self.unary_aliases.insert(key, CompactString::from(operator));

        Ok(())
    }

    /// Makes the binary `alias` operator a synonym of the `operator` for the
    /// operand types.
    pub fn add_binary_alias(
        &mut self,
        alias: &str,
        lhs: Type,
        rhs: Type,
        operator: &str,
    ) -> ExpressionResult<()> {
        let key = OperatorKey::binary(alias, lhs, rhs);

        if self.binary_aliases.contains_key(&key) {
            return Err(key.redefinition());
        }

        let _ = self.binary_aliases.insert(key, CompactString::from(operator));

        Ok(())
    }

    /// Registers a constant-operand optimization rule.
    pub fn add_optimization(&mut self, optimization: Optimization) {
        self.optimizations
            .entry((optimization.operator.clone(), optimization.ty))
            .or_default()
            .push(optimization);
    }

    /// Registers an auto-cast rule.
    #[inline(always)]
    pub fn add_auto_cast(&mut self, entry: AutoCastEntry) {
        self.auto_casts.push(entry);
    }

    /// Returns the name of the plugin.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all registered function and constant names.
    pub fn known_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.constant_identifiers
            .iter()
            .map(|entry| entry.name.name.as_str())
            .chain(self.functions.iter().map(|entry| entry.name.name.as_str()))
    }

    /// Resolves a function or identifier query against the tables.
    pub fn resolve_function(
        &self,
        query: &mut FunctionQuery<'_>,
    ) -> ExpressionResult<Option<Resolution>> {
        let config = query.compiler.config();

        if query.args.is_empty() {
            for entry in &self.constant_identifiers {
                if !entry.name.matches(&query.name) {
                    continue;
                }

                if query.no_parentheses && !config.allow_omitting_parentheses_of_parameterless_functions
                {
                    return Err(ExpressionError::MissingFunctionParentheses {
                        name: entry.name.name.clone(),
                    });
                }

                if !query.no_parentheses && !config.allow_empty_parentheses_for_identifier_functions
                {
                    return Err(ExpressionError::IdentifierWithFunctionParentheses {
                        name: entry.name.name.clone(),
                    });
                }

                query.name = entry.name.name.clone();

                return Ok(Some(Resolution::Constant(entry.value.clone())));
            }
        }

        let given = query.args.iter().map(|arg| arg.ty).collect::<Vec<_>>();

        for entry in &self.functions {
            if !entry.name.matches(&query.name) {
                continue;
            }

            if !entry.signature.accepts(&given) {
                let mut hint = entry.name.name.clone();

                if let Signature::Fixed(types) | Signature::Variadic(types) = &entry.signature {
                    let variadic = matches!(&entry.signature, Signature::Variadic(..));

                    hint.push_str(&query.compiler.write_function_signature(types, variadic));
                }

                query.hints.push(hint);

                continue;
            }

            let is_identifier = matches!(&entry.signature, Signature::Identifier);

            if query.no_parentheses
                && !is_identifier
                && !config.allow_omitting_parentheses_of_parameterless_functions
            {
                return Err(ExpressionError::MissingFunctionParentheses {
                    name: entry.name.name.clone(),
                });
            }

            if !query.no_parentheses
                && is_identifier
                && !config.allow_empty_parentheses_for_identifier_functions
            {
                return Err(ExpressionError::IdentifierWithFunctionParentheses {
                    name: entry.name.name.clone(),
                });
            }

            query.name = entry.name.name.clone();

            let callback = match &entry.body {
                FunctionBody::Constant(value) => {
                    return Ok(Some(Resolution::Constant(value.clone())))
                }

                FunctionBody::Callback(callback) => callback,
            };

            if query.all_args_const && callback.compile_time_invokable {
                if let Some(value) =
                    invoke_at_compile_time(query.scope, callback.callback, query.args)
                {
                    let value = value?;

                    debug_assert_eq!(
                        value.ty(),
                        callback.result_type,
                        "Function {:?} of plugin {:?} returned a value of unexpected type.",
                        entry.name.name,
                        self.name,
                    );

                    return Ok(Some(Resolution::Constant(value)));
                }
            }

            return Ok(Some(Resolution::Callback(callback.bound())));
        }

        Ok(None)
    }

    /// Resolves a unary operator query against the tables.
    pub fn resolve_unary_op(
        &self,
        query: &mut UnaryOpQuery<'_>,
    ) -> ExpressionResult<Option<Resolution>> {
        let arg = query.arg.ty;

        if let Some(operator) = self.unary_aliases.get(&OperatorKey::unary(&query.operator, arg)) {
            query.operator = operator.clone();
        }

        let Some(entry) = self.unary_ops.get(&OperatorKey::unary(&query.operator, arg)) else {
            return Ok(None);
        };

        if query.arg_is_const && entry.compile_time_invokable {
            if let Some(value) =
                invoke_at_compile_time(query.scope, entry.callback, std::slice::from_ref(query.arg))
            {
                return Ok(Some(Resolution::Constant(value?)));
            }
        }

        Ok(Some(Resolution::Callback(entry.bound())))
    }

    /// Resolves a binary operator query against the tables.
    pub fn resolve_binary_op(
        &self,
        query: &mut BinaryOpQuery<'_>,
    ) -> ExpressionResult<Option<Resolution>> {
        let lhs = query.lhs.ty;
        let rhs = query.rhs.ty;

        if query.operator == "=" && query.compiler.config().alias_equals_operator_with_assign_operator
        {
            query.operator = CompactString::from("==");
        } else if let Some(operator) = self
            .binary_aliases
            .get(&OperatorKey::binary(&query.operator, lhs, rhs))
        {
            query.operator = operator.clone();
        }

        let Some(entry) = self
            .binary_ops
            .get(&OperatorKey::binary(&query.operator, lhs, rhs))
        else {
            return Ok(None);
        };

        match (query.lhs_is_const, query.rhs_is_const) {
            (true, true) if entry.compile_time_invokable => {
                let args = [query.lhs.clone(), query.rhs.clone()];

                if let Some(value) = invoke_at_compile_time(query.scope, entry.callback, &args) {
                    return Ok(Some(Resolution::Constant(value?)));
                }
            }

            (true, false) | (false, true) => {
                let lhs_is_const = query.lhs_is_const;

                let (ty, constant) = match lhs_is_const {
                    true => (rhs, query.lhs.constant.as_ref()),
                    false => (lhs, query.rhs.constant.as_ref()),
                };

                if let Some(resolution) = self.optimize(&query.operator, ty, constant, lhs_is_const)
                {
                    return Ok(Some(resolution));
                }
            }

            _ => (),
        }

        Ok(Some(Resolution::Callback(entry.bound())))
    }

    fn optimize(
        &self,
        operator: &str,
        ty: Type,
        constant: Option<&Value>,
        lhs_is_const: bool,
    ) -> Option<Resolution> {
        let constant = constant?;

        let rules = self
            .optimizations
            .get(&(CompactString::from(operator), ty))?;

        let rule = rules.iter().find(|rule| {
            rule.side.covers(lhs_is_const)
                && rule.constant.ty() == constant.ty()
                && &rule.constant == constant
        })?;

        Some(match &rule.result {
            None => Resolution::Identity,
            Some(value) => Resolution::Constant(value.clone()),
        })
    }

    /// Resolves an auto-cast query against the auto-cast rules.
    ///
    /// Each operand is converted by the first applicable rule. Constant
    /// operands are converted at compile time.
    pub fn resolve_auto_cast(&self, query: &mut AutoCastQuery<'_>) -> ExpressionResult<bool> {
        let operator = query.operator.clone();

        let lhs_type = query.args.first().map(|arg| arg.ty);
        let rhs_type = query.args.get(1).map(|arg| arg.ty);

        let mut accepted = false;

        if let Some(ty) = &lhs_type {
            if let Some(entry) = self.find_auto_cast(&operator, ty, rhs_type.as_ref()) {
                let constant = match query.is_const && entry.cast.compile_time_invokable {
                    true => invoke_at_compile_time(query.scope, entry.cast.callback, &query.args[0..1]),
                    false => None,
                };

                query.lhs = Some(entry.to_cast(constant)?);
                accepted = true;
            }
        }

        if let Some(ty) = &rhs_type {
            if let Some(entry) = self.find_auto_cast(&operator, ty, lhs_type.as_ref()) {
                let constant = match query.rhs_is_const && entry.cast.compile_time_invokable {
                    true => invoke_at_compile_time(query.scope, entry.cast.callback, &query.args[1..2]),
                    false => None,
                };

                query.rhs = Some(entry.to_cast(constant)?);
                accepted = true;
            }
        }

        Ok(accepted)
    }

    #[inline(always)]
    fn find_auto_cast(&self, operator: &str, ty: &Type, other: Option<&Type>) -> Option<&AutoCastEntry> {
        self.auto_casts
            .iter()
            .find(|entry| entry.applies(operator, ty, other))
    }
}

impl CompilerPlugin for Calculus {
    #[inline(always)]
    fn name(&self) -> &str {
        &self.name
    }

    fn known_names(&self) -> Vec<CompactString> {
        Calculus::known_names(self).map(CompactString::from).collect()
    }

    #[inline(always)]
    fn try_function(&self, query: &mut FunctionQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        self.resolve_function(query)
    }

    #[inline(always)]
    fn try_unary_op(&self, query: &mut UnaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        self.resolve_unary_op(query)
    }

    #[inline(always)]
    fn try_binary_op(&self, query: &mut BinaryOpQuery<'_>) -> ExpressionResult<Option<Resolution>> {
        self.resolve_binary_op(query)
    }

    #[inline(always)]
    fn try_auto_cast(&self, query: &mut AutoCastQuery<'_>) -> ExpressionResult<bool> {
        self.resolve_auto_cast(query)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        plugins::{CallbackEntry, Calculus, FunctionName, Signature},
        runtime::{ExpressionError, ExpressionResult, Scope, Type, Value},
    };

    fn twice(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
        Ok(Value::Integer(args[0].to_integer().unwrap_or_default() * 2))
    }

    #[test]
    fn test_function_name_matching() {
        let name = FunctionName::abbreviated("Expression", 4);

        assert!(name.matches("Expression"));
        assert!(name.matches("expression"));
        assert!(name.matches("EXPR"));
        assert!(name.matches("expres"));
        assert!(!name.matches("exp"));
        assert!(!name.matches("Expressions"));
        assert!(!name.matches("exprx"));

        let exact = FunctionName::new("Trim");

        assert!(exact.matches("TRIM"));
        assert!(!exact.matches("Tri"));
    }

    #[test]
    fn test_signature_matching() {
        let fixed = Signature::Fixed(vec![Type::Integer, Type::String]);

        assert!(fixed.accepts(&[Type::Integer, Type::String]));
        assert!(!fixed.accepts(&[Type::Integer]));
        assert!(!fixed.accepts(&[Type::String, Type::Integer]));

        let variadic = Signature::Variadic(vec![Type::String]);

        assert!(variadic.accepts(&[Type::String]));
        assert!(variadic.accepts(&[Type::String, Type::Float, Type::Boolean]));
        assert!(!variadic.accepts(&[]));

        assert!(Signature::Identifier.accepts(&[]));
        assert!(!Signature::Identifier.accepts(&[Type::Integer]));
    }

    #[test]
    fn test_operator_redefinition() {
        let mut calculus = Calculus::new("Test");

        let entry = CallbackEntry::pure(twice, "twice", Type::Integer);

        assert!(calculus.add_unary_op("+", Type::Integer, entry).is_ok());
        assert!(calculus.add_unary_op("+", Type::Float, entry).is_ok());
        assert!(calculus
            .add_binary_op("+", Type::Integer, Type::Float, entry)
            .is_ok());
        assert!(calculus
            .add_binary_op("+", Type::Float, Type::Integer, entry)
            .is_ok());

        let Err(ExpressionError::OperatorRedefinition { operator, lhs, rhs }) =
            calculus.add_binary_op("+", Type::Integer, Type::Float, entry)
        else {
            panic!("Redefinition accepted.");
        };

        assert_eq!(operator, "+");
        assert_eq!(lhs, "Integer");
        assert_eq!(rhs, "Float");

        assert!(matches!(
            calculus.add_unary_op("+", Type::Integer, entry),
            Err(ExpressionError::OperatorRedefinition { .. }),
        ));
    }
}
