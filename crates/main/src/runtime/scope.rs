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
    any::Any,
    fmt::{Debug, Formatter},
    mem::take,
    sync::Arc,
};

use ahash::AHashMap;
use compact_str::CompactString;

use crate::{
    compiler::{Compiler, Expression},
    runtime::Value,
};

/// A string arena of the [Scope].
///
/// The arena owns the strings created during compilation (string literals,
/// folded constants) or during evaluation (callback results). The
/// compile-time arena is locked once the compilation finishes: allocating
/// from a locked arena is a debug-time assertion failure.
pub struct Arena {
    strings: Vec<Arc<str>>,
    allocated: usize,
    high_water_mark: usize,
    locked: bool,
}

impl Default for Arena {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Arena {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Arena")
            .field("strings", &self.strings.len())
            .field("allocated", &self.allocated)
            .field("high_water_mark", &self.high_water_mark)
            .field("locked", &self.locked)
            .finish()
    }
}

impl Arena {
    /// Creates an empty unlocked arena.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            strings: Vec::new(),
            allocated: 0,
            high_water_mark: 0,
            locked: false,
        }
    }

    /// Copies `text` into the arena and returns a shared handle to the copy.
    pub fn alloc_str(&mut self, text: &str) -> Arc<str> {
        debug_assert!(!self.locked, "Allocation from a locked arena.");

        let string = Arc::<str>::from(text);

        self.allocated += string.len();
        self.high_water_mark = self.high_water_mark.max(self.allocated);
        self.strings.push(string.clone());

        string
    }

    /// Returns a marker of the current arena state for the
    /// [rollback](Self::rollback) function.
    #[inline(always)]
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            strings: self.strings.len(),
            allocated: self.allocated,
        }
    }

    /// Releases every string allocated after the `snapshot` was taken.
    pub fn rollback(&mut self, snapshot: ArenaSnapshot) {
        if snapshot.strings > self.strings.len() {
            return;
        }

        self.strings.truncate(snapshot.strings);
        self.allocated = snapshot.allocated;
    }

    /// Releases all strings but keeps the capacity observed so far.
    pub fn reset(&mut self) {
        let capacity = self.strings.capacity();

        self.strings.clear();
        self.strings.reserve(capacity);
        self.allocated = 0;
    }

    /// Total length of the strings currently held by the arena.
    #[inline(always)]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// The maximum value [allocated](Self::allocated) ever reached.
    #[inline(always)]
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Returns true if the arena rejects further allocations.
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline(always)]
    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }
}

/// A state marker of the [Arena], created by [Arena::snapshot].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ArenaSnapshot {
    strings: usize,
    allocated: usize,
}

/// A lifecycle kind of the [Scope].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScopeKind {
    /// The scope created once per compilation. It lives as long as the
    /// compiled [Expression] and stores the constants and the named resources
    /// of the program.
    CompileTime,

    /// The scope created by the host for the evaluation runs. It can be
    /// [reset](Scope::reset) and reused between the runs.
    Evaluation,
}

/// An execution context of the compiled expressions.
///
/// The compiler creates one compile-time scope per compiled expression, and
/// passes it to the callbacks invoked during constant folding. The host
/// creates evaluation scopes and passes them to [Expression::evaluate].
///
/// The `'c` lifetime is the lifetime of the optional [Compiler] reference
/// that the evaluation scope uses to resolve nested expressions whose names
/// are known at evaluation time only.
pub struct Scope<'c> {
    kind: ScopeKind,
    arena: Arena,
    pub(crate) stack: Vec<Value>,
    resources: AHashMap<CompactString, Arc<dyn Any + Send + Sync>>,
    pub(crate) compile_time: Option<Expression>,
    compiler: Option<&'c Compiler>,
    pub(crate) nested: Vec<Expression>,
    context: Option<Box<dyn Any + Send + Sync>>,
}

impl Default for Scope<'static> {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> Debug for Scope<'c> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Scope")
            .field("kind", &self.kind)
            .field("arena", &self.arena)
            .field("stack", &self.stack)
            .field("resources", &self.resources.len())
            .field("compiler", &self.compiler.is_some())
            .field("context", &self.context.is_some())
            .finish()
    }
}

impl Scope<'static> {
    /// Creates an evaluation scope without the compiler reference.
    ///
    /// Nested expressions referred to by names computed at evaluation time
    /// cannot be resolved by this scope: the two-argument nested-expression
    /// form falls back to its default value, and the three-argument form
    /// fails.
    #[inline(always)]
    pub fn new() -> Self {
        Self::with_kind(ScopeKind::Evaluation, None)
    }

    #[inline(always)]
    pub(crate) fn compile_time() -> Self {
        Self::with_kind(ScopeKind::CompileTime, None)
    }
}

impl<'c> Scope<'c> {
    /// Creates an evaluation scope that resolves evaluation-time nested
    /// expressions through the `compiler`.
    #[inline(always)]
    pub fn with_compiler(compiler: &'c Compiler) -> Self {
        Self::with_kind(ScopeKind::Evaluation, Some(compiler))
    }

    #[inline(always)]
    fn with_kind(kind: ScopeKind, compiler: Option<&'c Compiler>) -> Self {
        Self {
            kind,
            arena: Arena::new(),
            stack: Vec::new(),
            resources: AHashMap::new(),
            compile_time: None,
            compiler,
            nested: Vec::new(),
            context: None,
        }
    }

    /// Returns the lifecycle kind of this scope.
    #[inline(always)]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Returns true if this is a compile-time scope, which means that the
    /// callback receiving it is being invoked for constant folding.
    #[inline(always)]
    pub fn is_compile_time(&self) -> bool {
        self.kind == ScopeKind::CompileTime
    }

    /// Copies `text` into the scope's arena and returns it as a string value.
    #[inline(always)]
    pub fn alloc_str(&mut self, text: &str) -> Value {
        Value::String(self.arena.alloc_str(text))
    }

    /// Gives access to the scope's arena.
    #[inline(always)]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[inline(always)]
    pub(crate) fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the compiler reference of the evaluation scope.
    #[inline(always)]
    pub fn compiler(&self) -> Option<&'c Compiler> {
        self.compiler
    }

    /// Returns the expression currently evaluated within this scope.
    #[inline(always)]
    pub fn expression(&self) -> Option<&Expression> {
        self.compile_time.as_ref()
    }

    /// Looks up a named resource.
    ///
    /// In the compile-time scope this is the scope's own resource map. In the
    /// evaluation scope the lookup goes to the compile-time scope of the
    /// currently evaluated expression.
    pub fn resource(&self, key: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        match self.kind {
            ScopeKind::CompileTime => self.resources.get(key),
            ScopeKind::Evaluation => self
                .compile_time
                .as_ref()?
                .compile_time_scope()
                .resources
                .get(key),
        }
    }

    /// Stores a named resource in the compile-time scope.
    ///
    /// Returns false if the scope is an evaluation scope or is already
    /// locked. Evaluation scopes do not keep resources between the runs.
    pub fn set_resource(
        &mut self,
        key: impl Into<CompactString>,
        resource: Arc<dyn Any + Send + Sync>,
    ) -> bool {
        if self.kind != ScopeKind::CompileTime || self.arena.is_locked() {
            return false;
        }

        let _ = self.resources.insert(key.into(), resource);

        true
    }

    /// Attaches the host data to this scope, replacing the previous one.
    ///
    /// The callbacks reach the data through the [context](Self::context)
    /// function. This is the usual way to expose the variables of the host
    /// to the identifier functions.
    #[inline(always)]
    pub fn set_context<T: Any + Send + Sync>(&mut self, context: T) {
        self.context = Some(Box::new(context));
    }

    /// Returns the host data attached to this scope, if the data is of type
    /// `T`.
    #[inline(always)]
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.as_ref()?.downcast_ref::<T>()
    }

    #[inline(always)]
    pub fn context_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.context.as_mut()?.downcast_mut::<T>()
    }

    /// Detaches the host data from this scope.
    #[inline(always)]
    pub fn take_context(&mut self) -> Option<Box<dyn Any + Send + Sync>> {
        self.context.take()
    }

    /// Clears the value stack, the nested call chain, and the arena, keeping
    /// their capacities. Named resources of the compile-time scope and the host
    /// context are kept.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.nested.clear();
        self.compile_time = None;
        self.arena.reset();
    }

    #[inline(always)]
    pub(crate) fn lock(&mut self) {
        self.arena.lock();
    }

    #[inline(always)]
    pub(crate) fn take_stack(&mut self) -> Vec<Value> {
        take(&mut self.stack)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::runtime::{Arena, Scope, ScopeKind, Value};

    #[test]
    fn test_arena_rollback() {
        let mut arena = Arena::new();

        let _ = arena.alloc_str("abc");
        let snapshot = arena.snapshot();
        let _ = arena.alloc_str("defgh");

        assert_eq!(arena.allocated(), 8);

        arena.rollback(snapshot);

        assert_eq!(arena.allocated(), 3);
        assert_eq!(arena.high_water_mark(), 8);

        arena.reset();

        assert_eq!(arena.allocated(), 0);
        assert_eq!(arena.high_water_mark(), 8);
    }

    #[test]
    fn test_scope_resources() {
        let mut compile_time = Scope::compile_time();

        assert_eq!(compile_time.kind(), ScopeKind::CompileTime);
        assert!(compile_time.set_resource("key", Arc::new(5usize)));
        assert_eq!(
            compile_time
                .resource("key")
                .and_then(|resource| resource.downcast_ref::<usize>()),
            Some(&5),
        );

        compile_time.lock();

        assert!(!compile_time.set_resource("other", Arc::new(1usize)));

        let mut evaluation = Scope::new();

        assert!(!evaluation.is_compile_time());
        assert!(!evaluation.set_resource("key", Arc::new(5usize)));
        assert!(evaluation.resource("key").is_none());
        assert_eq!(evaluation.alloc_str("xyz"), Value::from("xyz"));

        evaluation.set_context(String::from("host"));
        evaluation.reset();

        assert_eq!(evaluation.arena().allocated(), 0);
        assert_eq!(evaluation.context::<String>().map(String::as_str), Some("host"));
        assert!(evaluation.context::<usize>().is_none());

        if let Some(context) = evaluation.context_mut::<String>() {
            context.push('!');
        }

        assert_eq!(
            evaluation
                .take_context()
                .and_then(|context| context.downcast::<String>().ok())
                .map(|context| *context),
            Some(String::from("host!")),
        );
    }
}
