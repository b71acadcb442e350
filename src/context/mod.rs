// Copyright 2015-2023 Swim Inc.
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

//! Contexts are zero-sized policy tags threaded through every pack and unpack
//! call. A context never carries data; it exists so that format bindings,
//! per-field choices and reconstruction policies can differ between callers
//! that share the same types.

use std::any::TypeId;
use std::cell::Cell;

use crate::format::typed::TypeDescriptor;


/// A named policy bundle. Implementations are zero-sized tags; the engine
/// dispatches on the type, never on a value.
///
/// `DefaultContext` is the fallback for call sites that pass no context. User
/// hooks must not special-case it; bind behavior to a dedicated context type
/// instead.
pub trait Context: Copy + Default + Send + Sync + 'static {
    /// A human-readable name, used in diagnostics.
    const NAME: &'static str;

    /// Whether a self-describing value naming `descriptor` may be
    /// reconstructed under this context. Consulted by the `Typed` format
    /// before any constructor runs. The permissive default accepts all.
    fn permits(descriptor: &TypeDescriptor) -> bool {
        let _ = descriptor;
        true
    }
}

/// The distinguished fallback context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultContext;

impl Context for DefaultContext {
    const NAME: &'static str = "default";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    name: &'static str,
    id: TypeId,
}

thread_local! {
    static AMBIENT: Cell<Option<Token>> = const { Cell::new(None) };
}

/// Install `C` as the ambient context for the current thread until the
/// returned guard is dropped, at which point the previous ambient context is
/// restored. Two threads each see their own ambient context.
pub fn set_ambient<C: Context>() -> ContextGuard {
    let token = Token {
        name: C::NAME,
        id: TypeId::of::<C>(),
    };
    let previous = AMBIENT.with(|cell| cell.replace(Some(token)));
    ContextGuard { previous }
}

/// Whether the ambient context for this thread is `C`. With no guard
/// installed the ambient context is [`DefaultContext`].
pub fn ambient_is<C: Context>() -> bool {
    AMBIENT.with(|cell| match cell.get() {
        Some(token) => token.id == TypeId::of::<C>(),
        None => TypeId::of::<C>() == TypeId::of::<DefaultContext>(),
    })
}

/// The name of the ambient context for this thread.
pub fn ambient_name() -> &'static str {
    AMBIENT.with(|cell| match cell.get() {
        Some(token) => token.name,
        None => DefaultContext::NAME,
    })
}

/// Restores the previously ambient context on drop.
#[derive(Debug)]
pub struct ContextGuard {
    previous: Option<Token>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        AMBIENT.with(|cell| cell.set(previous));
    }
}
