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

use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, Mutex},
};

use ahash::AHashMap;
use compact_str::CompactString;
use log::{debug, trace, warn};
use strsim::normalized_damerau_levenshtein;

use crate::{
    compiler::{
        BuiltInPlugins,
        CompilationConfig,
        CompilePriority,
        Expression,
        ExpressionRepository,
        NormalizationConfig,
        COMPILER_LOG,
        NAMED_LOG,
        TYPES_LOG,
    },
    interpret::{decompile, Assembler},
    plugins::{Arithmetics, AutoCast, CompilerPlugin, ElvisOperator, FunctionName, Strings},
    runtime::{ExpressionError, ExpressionResult, Scope, Type},
    syntax::{DefaultParser, Normalizer, OperatorTable, Parser},
};

/// The name of the expressions compiled by [Compiler::compile].
pub const ANONYMOUS: &str = "ANONYMOUS";

const SUGGESTION_THRESHOLD: f64 = 0.5;

static DEFAULT_UNARY_OPERATORS: [&str; 5] = ["+", "-", "!", "~", "*"];

static DEFAULT_BINARY_OPERATORS: [(&str, i32); 20] = [
    ("*", 900),
    ("/", 900),
    ("%", 900),
    ("+", 800),
    ("-", 800),
    ("<<", 700),
    (">>", 700),
    ("<", 600),
    ("<=", 600),
    (">", 600),
    (">=", 600),
    ("==", 500),
    ("!=", 500),
    ("&", 470),
    ("^", 460),
    ("|", 450),
    ("&&", 440),
    ("||", 430),
    ("=", 300),
    ("?:", 200),
];

static DEFAULT_BINARY_ALIASES: [(&str, &str); 14] = [
    ("And", "&&"),
    ("Or", "||"),
    ("Sm", "<"),
    ("Smaller", "<"),
    ("Smeq", "<="),
    ("Smaller_Or_Equal", "<="),
    ("Gt", ">"),
    ("Greater", ">"),
    ("Gteq", ">="),
    ("Greater_Or_Equal", ">="),
    ("Eq", "=="),
    ("Equals", "=="),
    ("Neq", "!="),
    ("Not_Equals", "!="),
];

/// The expression compiler.
///
/// The compiler owns the operator table, the ordered chain of the
/// [CompilerPlugin]s, the registry of the type names used in the
/// diagnostics, and the cache of the named expressions.
///
/// ```
/// use ad_astra_expressions::{
///     compiler::Compiler,
///     runtime::{Scope, Value},
/// };
///
/// let compiler = Compiler::new();
///
/// let expression = compiler.compile("ToUpper(\"ab\") + 3 * 2").unwrap();
///
/// assert_eq!(expression.normalized_string(), "ToUpper(\"ab\") + 3 * 2");
/// assert_eq!(expression.optimized_string(), "\"AB6\"");
/// assert_eq!(
///     expression.evaluate(&mut Scope::new()).unwrap(),
///     Value::from("AB6"),
/// );
/// ```
///
/// The setup functions take `&mut self`, while the compilation and the
/// named expression functions take `&self`, so a configured compiler can be
/// shared between threads.
pub struct Compiler {
    config: CompilationConfig,
    normalization: NormalizationConfig,
    parser: Box<dyn Parser>,
    operators: OperatorTable,
    plugins: Vec<PluginEntry>,
    type_names: AHashMap<Type, CompactString>,
    nested_function: FunctionName,
    nested_operator: CompactString,
    throw: CompactString,
    named: Mutex<AHashMap<CompactString, Expression>>,
    repository: Option<Box<dyn ExpressionRepository>>,
}

struct PluginEntry {
    priority: i32,
    plugin: Box<dyn CompilerPlugin>,
}

impl Default for Compiler {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Compiler {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let named = self
            .named
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        formatter
            .debug_struct("Compiler")
            .field("config", &self.config)
            .field("normalization", &self.normalization)
            .field("operators", &self.operators)
            .field(
                "plugins",
                &self
                    .plugins
                    .iter()
                    .map(|entry| (entry.plugin.name(), entry.priority))
                    .collect::<Vec<_>>(),
            )
            .field("type_names", &self.type_names)
            .field("named", &named.keys().collect::<Vec<_>>())
            .field("repository", &self.repository.is_some())
            .finish()
    }
}

impl Compiler {
    /// Creates a compiler with the default configuration, the default
    /// operators, and all built-in plugins.
    #[inline(always)]
    pub fn new() -> Self {
        Self::with_config(CompilationConfig::new())
    }

    /// Creates a compiler with the specified configuration, the operators
    /// enabled by the configuration, and all built-in plugins.
    pub fn with_config(config: CompilationConfig) -> Self {
        let mut compiler = Self::empty(config);

        compiler.setup_defaults(BuiltInPlugins::all());

        compiler
    }

    /// Creates a compiler without operators and plugins.
    ///
    /// Such a compiler recognizes literals only. Use
    /// [setup_defaults](Self::setup_defaults) and the other setup functions
    /// to configure it.
    pub fn empty(config: CompilationConfig) -> Self {
        Self {
            config,
            normalization: NormalizationConfig::new(),
            parser: Box::new(DefaultParser),
            operators: OperatorTable::new(config.alphabetic_operators_ignore_case),
            plugins: Vec::new(),
            type_names: AHashMap::new(),
            nested_function: FunctionName::abbreviated("Expression", 4),
            nested_operator: CompactString::from("*"),
            throw: CompactString::from("throw"),
            named: Mutex::new(AHashMap::new()),
            repository: None,
        }
    }

    /// Registers the default operators and aliases enabled by the
    /// [CompilationConfig], and installs the selected built-in plugins.
    pub fn setup_defaults(&mut self, plugins: BuiltInPlugins) {
        if self.config.default_unary_operators {
            for operator in DEFAULT_UNARY_OPERATORS {
                let _ = self.operators.add_unary(operator);
            }
        }

        if self.config.default_binary_operators {
            for (operator, precedence) in DEFAULT_BINARY_OPERATORS {
                let _ = self.operators.add_binary(operator, precedence);
            }

            let _ = self.operators.add_binary("[]", 100);
        }

        if self.config.default_alphabetic_operator_aliases {
            self.operators.add_unary_alias("Not", "!");

            for (alias, operator) in DEFAULT_BINARY_ALIASES {
                self.operators.add_binary_alias(alias, operator);
            }
        }

        if plugins.elvis_operator {
            self.insert_plugin(Box::new(ElvisOperator), CompilePriority::ELVIS);
        }

        if plugins.auto_cast {
            self.insert_plugin(Box::new(AutoCast::new()), CompilePriority::AUTO_CAST);
        }

        if plugins.strings {
            self.insert_plugin(Box::new(Strings::new()), CompilePriority::STRINGS);
        }

        if plugins.arithmetics {
            self.insert_plugin(
                Box::new(Arithmetics::new(&self.config)),
                CompilePriority::ARITHMETICS,
            );
        }
    }

    /// Returns the compilation configuration.
    #[inline(always)]
    pub fn config(&self) -> &CompilationConfig {
        &self.config
    }

    /// Returns the normalization configuration.
    #[inline(always)]
    pub fn normalization(&self) -> &NormalizationConfig {
        &self.normalization
    }

    /// Replaces the normalization configuration of the subsequent
    /// compilations.
    #[inline(always)]
    pub fn set_normalization(&mut self, config: NormalizationConfig) {
        self.normalization = config;
    }

    /// Replaces the parser of the subsequent compilations.
    ///
    /// The default parser is [DefaultParser].
    #[inline(always)]
    pub fn set_parser(&mut self, parser: impl Parser + 'static) {
        self.parser = Box::new(parser);
    }

    /// Returns the operator table of the compiler.
    #[inline(always)]
    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    /// Registers a unary operator symbol.
    ///
    /// Returns false if the operator is already registered.
    #[inline(always)]
    pub fn add_unary_operator(&mut self, operator: &str) -> bool {
        self.operators.add_unary(operator)
    }

    /// Registers a binary operator symbol with its precedence.
    ///
    /// Returns the previous precedence of the operator, if it was already
    /// registered.
    #[inline(always)]
    pub fn add_binary_operator(&mut self, operator: &str, precedence: i32) -> Option<i32> {
        self.operators.add_binary(operator, precedence)
    }

    /// Registers a verbal alias of a unary operator.
    #[inline(always)]
    pub fn add_alphabetic_unary_alias(&mut self, alias: &str, operator: &str) {
        self.operators.add_unary_alias(alias, operator);
    }

    /// Registers a verbal alias of a binary operator.
    #[inline(always)]
    pub fn add_alphabetic_binary_alias(&mut self, alias: &str, operator: &str) {
        self.operators.add_binary_alias(alias, operator);
    }

    /// Returns the precedence of the binary operator or its verbal alias.
    #[inline(always)]
    pub fn binary_operator_precedence(&self, operator: &str) -> Option<i32> {
        self.operators.binary_precedence(operator)
    }

    /// Inserts the plugin into the chain.
    ///
    /// The plugins with higher priority are consulted first. Among the
    /// plugins of the same priority, the earlier inserted one goes first.
    pub fn insert_plugin(&mut self, plugin: Box<dyn CompilerPlugin>, priority: i32) {
        let index = self
            .plugins
            .iter()
            .position(|entry| entry.priority < priority)
            .unwrap_or(self.plugins.len());

        self.plugins
            .insert(index, PluginEntry { priority, plugin });
    }

    /// Removes the first plugin with the specified name from the chain.
    pub fn remove_plugin(&mut self, name: &str) -> Option<Box<dyn CompilerPlugin>> {
        let index = self
            .plugins
            .iter()
            .position(|entry| entry.plugin.name() == name)?;

        Some(self.plugins.remove(index).plugin)
    }

    /// Iterates over the plugin chain in the consultation order.
    #[inline(always)]
    pub fn plugins(&self) -> impl Iterator<Item = &dyn CompilerPlugin> + '_ {
        self.plugins.iter().map(|entry| entry.plugin.as_ref())
    }

    /// Registers the display name of a type used in the diagnostics.
    ///
    /// The built-in types have default names. Host types should be
    /// registered by the plugins that introduce them.
    #[inline(always)]
    pub fn add_type(&mut self, ty: Type, name: impl Into<CompactString>) {
        let _ = self.type_names.insert(ty, name.into());
    }

    /// Returns the display name of the type.
    pub fn type_name(&self, ty: Type) -> CompactString {
        if let Some(name) = self.type_names.get(&ty) {
            return name.clone();
        }

        if let Some(name) = ty.builtin_name() {
            return CompactString::from(name);
        }

        warn!(target: TYPES_LOG, "Type {ty:?} has no registered name.");

        CompactString::from("<Unknown Type>")
    }

    #[inline(always)]
    pub(crate) fn type_names(&self) -> &AHashMap<Type, CompactString> {
        &self.type_names
    }

    /// Renders the argument types in the form `(Integer, String)`. Variadic
    /// signatures end with `...`.
    pub fn write_function_signature(&self, types: &[Type], variadic: bool) -> CompactString {
        let mut result = CompactString::from("(");

        for (index, ty) in types.iter().enumerate() {
            if index > 0 {
                result.push_str(", ");
            }

            result.push_str(&self.type_name(*ty));
        }

        if variadic {
            if !types.is_empty() {
                result.push_str(", ");
            }

            result.push_str("...");
        }

        result.push(')');

        result
    }

    #[inline(always)]
    pub(crate) fn nested_function(&self) -> &FunctionName {
        &self.nested_function
    }

    #[inline(always)]
    pub(crate) fn nested_operator(&self) -> &str {
        &self.nested_operator
    }

    #[inline(always)]
    pub(crate) fn throw_identifier(&self) -> &str {
        &self.throw
    }

    // Picks the most similar name known to the plugins.
    pub(crate) fn suggest(&self, name: &str) -> Option<CompactString> {
        let pattern = name.to_lowercase();

        let mut best = None::<(f64, CompactString)>;

        for plugin in self.plugins() {
            for known in plugin.known_names() {
                let closeness = normalized_damerau_levenshtein(&pattern, &known.to_lowercase());

                if closeness < SUGGESTION_THRESHOLD {
                    continue;
                }

                if let Some((score, _)) = &best {
                    if *score >= closeness {
                        continue;
                    }
                }

                best = Some((closeness, known));
            }
        }

        best.map(|(_, known)| known)
    }

    /// Compiles the expression `text` into an anonymous [Expression].
    #[inline(always)]
    pub fn compile(&self, text: &str) -> ExpressionResult<Expression> {
        self.compile_at(ANONYMOUS, text, 0)
    }

    pub(crate) fn compile_at(
        &self,
        name: &str,
        text: &str,
        depth: usize,
    ) -> ExpressionResult<Expression> {
        if depth > self.config.max_nesting_depth {
            return Err(ExpressionError::NestingDepthExceeded {
                limit: self.config.max_nesting_depth,
            });
        }

        if text.trim().is_empty() {
            return Err(ExpressionError::EmptyExpressionString);
        }

        match depth {
            0 => trace!(target: COMPILER_LOG, "Compiling {name:?}: {text:?}."),
            _ => debug!(target: COMPILER_LOG, "Compiling nested {name:?} at depth {depth}: {text:?}."),
        }

        let source = Arc::<str>::from(text);
        let mut scope = Scope::compile_time();

        let ast = self
            .parser
            .parse(text, &self.operators, scope.arena_mut())?
            .optimize(&self.normalization);

        let mut assembler = Assembler::new(self, &mut scope, source.clone(), depth);

        let normalized = Normalizer::new(self, &mut assembler).normalize(&ast)?;

        let assembly = assembler.finalize();

        let optimized = {
            let ast = decompile(&assembly, &self.throw);

            Normalizer::new(self, &mut ()).normalize(&ast)?
        };

        scope.lock();

        trace!(
            target: COMPILER_LOG,
            "Compiled {name:?}: {} commands, {} optimizations.",
            assembly.len(),
            assembly.optimizations,
        );

        Ok(Expression::new(
            name, source, normalized, optimized, assembly, scope,
        ))
    }

    /// Sets the source of the named expressions missing in the compiler's
    /// cache.
    #[inline(always)]
    pub fn set_repository(&mut self, repository: impl ExpressionRepository + 'static) {
        self.repository = Some(Box::new(repository));
    }

    /// Compiles the `text` and stores it in the named expression cache, or
    /// removes the named expression from the cache if the `text` is None.
    ///
    /// Returns true if an existing expression was replaced or removed.
    ///
    /// The expressions compiled before this call keep the nested expressions
    /// they have embedded.
    pub fn add_named(&self, name: &str, text: Option<&str>) -> ExpressionResult<bool> {
        let Some(text) = text else {
            return Ok(self.remove_named(name).is_some());
        };

        let expression = self.compile_at(name, text, 0)?;

        let mut named = self
            .named
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        let previous = named.insert(self.named_key(name), expression);

        debug!(target: NAMED_LOG, "Named expression {name:?} added.");

        Ok(previous.is_some())
    }

    /// Removes the named expression from the cache.
    pub fn remove_named(&self, name: &str) -> Option<Expression> {
        let mut named = self
            .named
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        let removed = named.remove(self.named_key(name).as_str());

        if removed.is_some() {
            debug!(target: NAMED_LOG, "Named expression {name:?} removed.");
        }

        removed
    }

    /// Returns the named expression from the cache, or compiles it from the
    /// repository text.
    #[inline(always)]
    pub fn get_named(&self, name: &str) -> ExpressionResult<Expression> {
        self.get_named_at(name, 0)
    }

    pub(crate) fn get_named_at(&self, name: &str, depth: usize) -> ExpressionResult<Expression> {
        let key = self.named_key(name);

        {
            let named = self
                .named
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());

            if let Some(expression) = named.get(key.as_str()) {
                return Ok(expression.clone());
            }
        }

        let text = match &self.repository {
            Some(repository) => repository.get(name),
            None => None,
        };

        let Some(text) = text else {
            return Err(ExpressionError::NamedExpressionNotFound {
                name: CompactString::from(name),
            });
        };

        let expression = self.compile_at(name, &text, depth)?;

        let mut named = self
            .named
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        debug!(target: NAMED_LOG, "Named expression {name:?} loaded from the repository.");

        Ok(named.entry(key).or_insert(expression).clone())
    }

    #[inline(always)]
    fn named_key(&self, name: &str) -> CompactString {
        match self.config.case_sensitive_named_expressions {
            true => CompactString::from(name),
            false => CompactString::from(name.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        compiler::{
            BuiltInPlugins,
            CompilationConfig,
            CompilePriority,
            Compiler,
            InMemoryRepository,
            ANONYMOUS,
        },
        plugins::{CallbackEntry, Calculus, FunctionBody, FunctionName, Signature},
        runtime::{ExpressionError, ExpressionResult, Scope, Type, Value},
        testing::{test_compiler, test_scope},
    };

    fn triple(_scope: &mut Scope<'_>, args: &[Value]) -> ExpressionResult<Value> {
        Ok(Value::Integer(args[0].to_integer().unwrap_or_default() * 3))
    }

    #[test]
    fn test_named_expressions() {
        let compiler = Compiler::new();

        assert!(!compiler.add_named("X", Some("21*2")).unwrap());

        let expression = compiler.compile("X()").unwrap();

        assert_eq!(expression.name(), ANONYMOUS);
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(42)
        );

        assert_eq!(compiler.get_named("x").unwrap().name(), "X");
        assert!(compiler.add_named("X", None).unwrap());

        let Err(error) = compiler.get_named("X") else {
            panic!("Named expression found.");
        };

        assert!(matches!(error, ExpressionError::NamedExpressionNotFound { .. }));

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(42)
        );
    }

    #[test]
    fn test_case_sensitive_names() {
        let mut config = CompilationConfig::new();

        config.case_sensitive_named_expressions = true;

        let compiler = Compiler::with_config(config);

        assert!(!compiler.add_named("Limit", Some("10")).unwrap());
        assert!(compiler.get_named("Limit").is_ok());
        assert!(compiler.get_named("limit").is_err());
    }

    #[test]
    fn test_nested_expression_forms() {
        let compiler = test_compiler();

        assert!(!compiler.add_named("Double", Some("a * 2")).unwrap());

        for text in [
            "*\"Double\" + 1",
            "*Double + 1",
            "Expression(\"Double\") + 1",
            "expr(Double) + 1",
            "Double() + 1",
        ] {
            let expression = compiler.compile(text).unwrap();

            assert_eq!(expression.result_type(), Type::Integer, "{text}");
            assert_eq!(
                expression.evaluate(&mut test_scope(5, 0, "")).unwrap(),
                Value::Integer(11),
                "{text}",
            );
        }

        let Err(error) = compiler.compile("*\"Missing\"") else {
            panic!("Compilation succeeded.");
        };

        assert!(matches!(
            error.root(),
            ExpressionError::NestedExpressionNotFoundCompileTime { .. },
        ));

        let Err(error) = compiler.compile("*ToLower(s)") else {
            panic!("Compilation succeeded.");
        };

        assert!(matches!(
            error.root(),
            ExpressionError::NamedExpressionNotConstant,
        ));
    }

    #[test]
    fn test_repository_lookup() {
        let repository = Arc::new(InMemoryRepository::new());

        let _ = repository.insert("Base", "100");
        let _ = repository.insert("Derived", "Base() + 1");

        let mut compiler = Compiler::new();

        compiler.set_repository(repository.clone());

        let expression = compiler.compile("Derived() * 2").unwrap();

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(202)
        );

        let _ = repository.remove("Base");

        assert!(compiler.get_named("Base").is_ok());
        assert!(compiler.remove_named("Base").is_some());
        assert!(compiler.get_named("Base").is_err());
    }

    #[test]
    fn test_nesting_depth_limit() {
        let repository = Arc::new(InMemoryRepository::new());

        let _ = repository.insert("Ping", "Pong() + 1");
        let _ = repository.insert("Pong", "Ping() + 1");

        let mut config = CompilationConfig::new();

        config.max_nesting_depth = 8;

        let mut compiler = Compiler::with_config(config);

        compiler.set_repository(repository);

        let Err(error) = compiler.compile("Ping()") else {
            panic!("Compilation succeeded.");
        };

        assert!(matches!(
            error.root(),
            ExpressionError::NestingDepthExceeded { limit: 8 },
        ));
    }

    #[test]
    fn test_plugin_priorities() {
        let mut compiler = Compiler::new();

        let mut calculus = Calculus::new("Override");

        calculus.add_function(
            FunctionName::abbreviated("ToUpper", 3),
            Signature::Fixed(vec![Type::Integer]),
            FunctionBody::Callback(CallbackEntry::pure(triple, "triple", Type::Integer)),
        );

        compiler.insert_plugin(Box::new(calculus), CompilePriority::CUSTOM);

        let names = compiler.plugins().map(|plugin| plugin.name()).collect::<Vec<_>>();

        assert_eq!(
            names,
            vec!["Override", "Arithmetics", "Strings", "AutoCast", "ElvisOperator"],
        );

        let expression = compiler.compile("ToUpper(5)").unwrap();

        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(15)
        );

        assert!(compiler.remove_plugin("Override").is_some());
        assert!(compiler.remove_plugin("Override").is_none());
        assert!(compiler.compile("ToUpper(5)").is_err());
    }

    #[test]
    fn test_diagnostics() {
        let mut compiler = Compiler::empty(CompilationConfig::new());

        compiler.setup_defaults(BuiltInPlugins::all());

        assert_eq!(
            compiler.write_function_signature(&[Type::Integer, Type::String], false),
            "(Integer, String)",
        );
        assert_eq!(
            compiler.write_function_signature(&[Type::Float], true),
            "(Float, ...)",
        );
        assert_eq!(compiler.write_function_signature(&[], false), "()");
        assert_eq!(compiler.type_name(Type::Boolean), "Boolean");

        compiler.add_type(Type::Boolean, "Bool");

        assert_eq!(compiler.type_name(Type::Boolean), "Bool");

        let Err(error) = compiler.compile("\"a\" - 3") else {
            panic!("Compilation succeeded.");
        };

        let ExpressionError::BinaryOperatorNotDefined { operator, lhs, rhs } = error.root() else {
            panic!("Unexpected error: {error}");
        };

        assert_eq!(operator.as_str(), "-");
        assert_eq!(lhs.as_str(), "String");
        assert_eq!(rhs.as_str(), "Integer");

        let Err(error) = compiler.compile("ToUpperr(\"a\")") else {
            panic!("Compilation succeeded.");
        };

        let ExpressionError::UnknownFunction { suggestion, .. } = error.root() else {
            panic!("Unexpected error: {error}");
        };

        assert_eq!(suggestion.as_deref(), Some("ToUpper"));

        assert!(matches!(
            compiler.compile("  "),
            Err(ExpressionError::EmptyExpressionString),
        ));
    }

    #[test]
    fn test_custom_type_names() {
        let mut compiler = Compiler::new();

        let ty = Type::of::<u8>();

        assert_eq!(compiler.type_name(ty).as_str(), "<Unknown Type>");

        compiler.add_type(ty, "Byte");

        assert_eq!(compiler.type_name(ty).as_str(), "Byte");
    }

    #[test]
    fn test_compile_time_scope_lock() {
        let compiler = test_compiler();

        let expression = compiler.compile("ToUpper(s) + \"x\"").unwrap();

        assert!(expression.compile_time_scope().arena().is_locked());
        assert!(expression.compile_time_scope().is_compile_time());

        let mut scope = test_scope(0, 0, "abc");

        assert_eq!(expression.evaluate(&mut scope).unwrap(), Value::from("ABCx"));
        assert!(!scope.arena().is_locked());
    }

    #[test]
    fn test_operator_setup() {
        let mut compiler = Compiler::new();

        assert_eq!(compiler.binary_operator_precedence("*"), Some(900));
        assert_eq!(compiler.binary_operator_precedence("greater"), Some(600));
        assert_eq!(compiler.binary_operator_precedence("**"), None);
        assert_eq!(compiler.add_binary_operator("&&", 440), Some(440));
        assert!(!compiler.add_unary_operator("!"));

        compiler.add_alphabetic_binary_alias("Plus", "+");

        let expression = compiler.compile("1 plus 2").unwrap();

        assert_eq!(expression.normalized_string(), "1 PLUS 2");
        assert_eq!(
            expression.evaluate(&mut Scope::new()).unwrap(),
            Value::Integer(3)
        );

        let bare = Compiler::empty(CompilationConfig::new());

        assert!(bare.compile("1 + 2").is_err());
        assert_eq!(
            bare.compile("\"text\"")
                .unwrap()
                .evaluate(&mut Scope::new())
                .unwrap(),
            Value::from("text"),
        );
    }
}
