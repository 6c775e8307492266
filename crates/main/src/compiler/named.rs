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
    sync::{Arc, RwLock},
};

use ahash::AHashMap;
use compact_str::CompactString;
use log::debug;

use crate::compiler::NAMED_LOG;

/// A source of the named expression texts.
///
/// The [Compiler](crate::compiler::Compiler) consults the repository when a
/// named expression is requested but is not in the compiler's cache yet.
/// The compiler compiles the returned text and caches the result, so the
/// repository is asked at most once per name until the name is
/// [removed](crate::compiler::Compiler::remove_named) from the cache.
pub trait ExpressionRepository: Send + Sync {
    /// Returns the source text of the expression with the specified `name`,
    /// or None if the repository does not define it.
    fn get(&self, name: &str) -> Option<String>;
}

impl<R: ExpressionRepository + ?Sized> ExpressionRepository for Arc<R> {
    #[inline(always)]
    fn get(&self, name: &str) -> Option<String> {
        self.as_ref().get(name)
    }
}

/// A map-backed [ExpressionRepository].
///
/// ```
/// use std::sync::Arc;
///
/// use ad_astra_expressions::{
///     compiler::{Compiler, InMemoryRepository},
///     runtime::{Scope, Value},
/// };
///
/// let repository = Arc::new(InMemoryRepository::new());
///
/// repository.insert("Answer", "6 * 7");
///
/// let mut compiler = Compiler::new();
///
/// compiler.set_repository(repository.clone());
///
/// let expression = compiler.compile("Answer() + 1").unwrap();
///
/// assert_eq!(expression.evaluate(&mut Scope::new()).unwrap(), Value::Integer(43));
/// ```
pub struct InMemoryRepository {
    ignore_case: bool,
    texts: RwLock<AHashMap<CompactString, String>>,
}

impl Default for InMemoryRepository {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for InMemoryRepository {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let texts = self
            .texts
            .read()
            .unwrap_or_else(|poison| poison.into_inner());

        formatter
            .debug_struct("InMemoryRepository")
            .field("ignore_case", &self.ignore_case)
            .field("texts", &*texts)
            .finish()
    }
}

impl ExpressionRepository for InMemoryRepository {
    fn get(&self, name: &str) -> Option<String> {
        let texts = self
            .texts
            .read()
            .unwrap_or_else(|poison| poison.into_inner());

        let text = texts.get(self.key(name).as_str()).cloned();

        debug!(
            target: NAMED_LOG,
            "Repository lookup of {name:?}: {}.",
            match text.is_some() {
                true => "found",
                false => "missing",
            },
        );

        text
    }
}

impl InMemoryRepository {
    /// Creates an empty repository with case-insensitive names.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            ignore_case: true,
            texts: RwLock::new(AHashMap::new()),
        }
    }

    /// Creates an empty repository with case-sensitive names.
    #[inline(always)]
    pub fn case_sensitive() -> Self {
        Self {
            ignore_case: false,
            texts: RwLock::new(AHashMap::new()),
        }
    }

    /// Stores the expression `text` under the `name`.
    ///
    /// Returns the previous text stored under this name.
    pub fn insert(&self, name: &str, text: impl Into<String>) -> Option<String> {
        let mut texts = self
            .texts
            .write()
            .unwrap_or_else(|poison| poison.into_inner());

        texts.insert(self.key(name), text.into())
    }

    /// Removes the expression stored under the `name`.
    pub fn remove(&self, name: &str) -> Option<String> {
        let mut texts = self
            .texts
            .write()
            .unwrap_or_else(|poison| poison.into_inner());

        texts.remove(self.key(name).as_str())
    }

    #[inline(always)]
    fn key(&self, name: &str) -> CompactString {
        match self.ignore_case {
            true => CompactString::from(name.to_lowercase()),
            false => CompactString::from(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::{ExpressionRepository, InMemoryRepository};

    #[test]
    fn test_in_memory_repository() {
        let repository = InMemoryRepository::new();

        assert_eq!(repository.insert("Limit", "100"), None);
        assert_eq!(repository.get("LIMIT").as_deref(), Some("100"));
        assert_eq!(repository.insert("limit", "200").as_deref(), Some("100"));
        assert_eq!(repository.remove("Limit").as_deref(), Some("200"));
        assert_eq!(repository.get("Limit"), None);

        let strict = InMemoryRepository::case_sensitive();

        let _ = strict.insert("Limit", "100");

        assert_eq!(strict.get("Limit").as_deref(), Some("100"));
        assert_eq!(strict.get("limit"), None);
    }
}
