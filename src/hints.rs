// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scoped type hints for the compiler
//!
//! The compiler records what it believes a variable (or a named expression's
//! return type) will hold while it walks nested blocks. Each hint kind has its
//! own stack of frames; lookups go from the innermost frame outward.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::error::EV0005;
use crate::core::{EventValueError, Result, TypeName};

type HintSet = SmallVec<[TypeName; 2]>;
type Frame = FxHashMap<String, HintSet>;

/// Which hint stack an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintKind {
    /// Candidate types of a variable, keyed by variable name
    VariableHints,
    /// Single expected return type, keyed by expression name
    ReturnTypeHints,
}

impl HintKind {
    pub const ALL: [HintKind; 2] = [HintKind::VariableHints, HintKind::ReturnTypeHints];

    fn index(self) -> usize {
        match self {
            HintKind::VariableHints => 0,
            HintKind::ReturnTypeHints => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            HintKind::VariableHints => "variable hint",
            HintKind::ReturnTypeHints => "return type hint",
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-compilation stack of hint frames. Never shared between compilations.
#[derive(Debug, Clone)]
pub struct ScopedHintStore {
    stacks: [Vec<Frame>; 2],
}

impl Default for ScopedHintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedHintStore {
    /// Store with a single empty root frame per kind
    pub fn new() -> Self {
        Self {
            stacks: [vec![Frame::default()], vec![Frame::default()]],
        }
    }

    fn stack(&self, kind: HintKind) -> &Vec<Frame> {
        &self.stacks[kind.index()]
    }

    fn stack_mut(&mut self, kind: HintKind) -> &mut Vec<Frame> {
        &mut self.stacks[kind.index()]
    }

    pub fn enter_scope(&mut self, kind: HintKind) {
        self.stack_mut(kind).push(Frame::default());
        log::trace!("entered {kind} scope, depth {}", self.depth(kind));
    }

    /// Pop the innermost frame. The root frame stays.
    pub fn exit_scope(&mut self, kind: HintKind) -> Result<()> {
        let stack = self.stack_mut(kind);
        if stack.len() <= 1 {
            log::error!("attempted to exit the root {kind} scope");
            return Err(EventValueError::HintScopeUnderflow {
                error_code: EV0005,
                kind: kind.name(),
            });
        }
        stack.pop();
        log::trace!("exited {kind} scope, depth {}", self.depth(kind));
        Ok(())
    }

    /// Record a hint in the innermost frame.
    ///
    /// Empty sets and sets naming the any type carry no information and are
    /// dropped. Return-type hints keep only the first type.
    pub fn add_hint<I, T>(&mut self, kind: HintKind, key: impl Into<String>, types: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        let mut hints: HintSet = types.into_iter().map(Into::into).collect();
        if kind == HintKind::ReturnTypeHints {
            hints.truncate(1);
        }
        if hints.is_empty() || hints.iter().any(TypeName::is_any) {
            return;
        }

        let key = key.into();
        log::trace!("{kind} for {key}: {hints:?}");
        if let Some(frame) = self.stack_mut(kind).last_mut() {
            frame.insert(key, hints);
        }
    }

    /// Innermost hint for `key`
    pub fn lookup(&self, kind: HintKind, key: &str) -> Option<&[TypeName]> {
        self.stack(kind)
            .iter()
            .rev()
            .find_map(|frame| frame.get(key))
            .map(|hints| hints.as_slice())
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&[TypeName]> {
        self.lookup(HintKind::VariableHints, name)
    }

    pub fn lookup_return_type(&self, name: &str) -> Option<&TypeName> {
        self.lookup(HintKind::ReturnTypeHints, name)
            .and_then(|hints| hints.first())
    }

    /// Drop every frame of one kind and start over from an empty root
    pub fn clear(&mut self, kind: HintKind) {
        let stack = self.stack_mut(kind);
        stack.clear();
        stack.push(Frame::default());
    }

    pub fn clear_all(&mut self) {
        for kind in HintKind::ALL {
            self.clear(kind);
        }
    }

    /// Number of frames, root included
    pub fn depth(&self, kind: HintKind) -> usize {
        self.stack(kind).len()
    }
}
