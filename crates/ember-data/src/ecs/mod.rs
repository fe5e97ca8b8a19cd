// Copyright 2025 eraflo
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

//! Implements Ember's entity container.
//!
//! An [`Entity`] owns an ordered set of boxed [`Component`]s. Before activation the
//! entity resolves the services its components provide and require into an
//! activation order, then drives every component through
//! `init → activate → deactivate` in that order.
//!
//! Entities are single-owner objects: they do no internal locking, and callers
//! must serialize access to a given entity themselves.

mod component;
mod entity;
mod error;

pub use component::*;
pub use entity::*;
pub use error::*;

#[cfg(test)]
mod tests;
