// SPDX-FileCopyrightText: 2026 Stonegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-local key-value persistence trait.

/// Device-local string key-value store backing the session store and the
/// history ledger. Last-write-wins; no transactional guarantees. The
/// store is private to the device profile and independent of
/// authentication.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}
