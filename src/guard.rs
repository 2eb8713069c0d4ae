// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-request-renderers.
//
// tracing-request-renderers is free software: you can redistribute it and/or modify it under the
// terms of the GNU General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
//
// tracing-request-renderers is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// tracing-request-renderers.  If not, see <http://www.gnu.org/licenses/>.

//! Scoped reentrancy guards.
//!
//! Reading request state can come back around to us: a session store might render request values
//! for its own diagnostics while we read from it, and those values include the session. A
//! [`ReentrancyGuard`] marks a named scope as active on the current thread for as long as it
//! lives; a second acquisition of the same scope on the same thread is refused until the first
//! guard is dropped.

use crate::error::{Error, Result};

use std::cell::RefCell;
use std::marker::PhantomData;

thread_local! {
    static ACTIVE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Holds `scope` for the current thread; released on drop.
///
/// Neither [`Send`] nor [`Sync`]: it must be dropped on the thread that acquired it.
#[must_use = "the scope is released as soon as the guard is dropped"]
pub struct ReentrancyGuard {
    scope: &'static str,
    _not_send: PhantomData<*const ()>,
}

impl ReentrancyGuard {
    /// Mark `scope` as active on this thread, or fail with [`Error::Reentrant`] if it already is.
    pub fn acquire(scope: &'static str) -> Result<ReentrancyGuard> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&scope) {
                Err(Error::Reentrant { scope })
            } else {
                active.push(scope);
                Ok(ReentrancyGuard {
                    scope,
                    _not_send: PhantomData,
                })
            }
        })
    }
    pub fn is_active(scope: &'static str) -> bool {
        ACTIVE
            .try_with(|active| active.borrow().contains(&scope))
            .unwrap_or(false)
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        // The thread-local may already be gone if we're dropped during thread teardown.
        let _ = ACTIVE.try_with(|active| active.borrow_mut().retain(|s| *s != self.scope));
    }
}
