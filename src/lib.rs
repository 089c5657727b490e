//! Weak-reference string interning for workloads that churn through large
//! numbers of short, highly repetitive strings.
//!
//! Interning collapses content-equal strings into a single shared
//! allocation. Unlike an arena-style interner, the cache in this crate
//! holds every string only through a non-owning weak handle: interning a
//! string never extends its lifetime, and once the last
//! [`InternedString`] for a given content is dropped the allocation is
//! freed and its cache slot becomes reusable. This makes the interner
//! safe to keep alive for the whole process while the strings flowing
//! through it come and go with their owners.
//!
//! The main entry points:
//!
//! - [`intern`] / [`intern_concat`]: deduplicate a string, or a
//!   prefix/suffix pair without building the joined string first.
//! - [`builder()`]: a pooled [`StringBuilder`] for accumulating text that
//!   is interned once complete.
//! - [`register_interning_callback`]: install a fast-path matcher that
//!   maps frequent candidates to hard-coded literals before the cache is
//!   consulted.
//! - [`enable_diagnostics`] / [`create_diagnostic_report`]: opt-in usage
//!   statistics describing hit rates and the memory interning saved.
//!
//! All of these delegate to the process-wide [`Interner::global`]
//! instance; embedders that want separately scoped caches can construct
//! their own [`Interner`].
//!
//! # Example
//!
//! ```
//! let configuration = weak_interner::intern("Debug");
//! let again = weak_interner::intern("Debug");
//! assert!(configuration.ptr_eq(&again));
//!
//! let qualified = weak_interner::intern_concat("Debug", "|AnyCPU");
//! assert_eq!(qualified, "Debug|AnyCPU");
//! ```

mod builder;
mod cache;
mod candidate;
mod interned;
mod interner;
#[cfg(feature = "serde-1")]
mod serde_impl;

pub use self::{
    builder::StringBuilder,
    cache::{CacheDebugInfo, WeakStringCache},
    candidate::InternableStr,
    interned::InternedString,
    interner::{Interner, InterningCallback, InterningDecision},
};

/// Interns the given string through the process-wide interner.
///
/// Returns a canonical string equal in content to `text`.
#[cfg_attr(feature = "inline-more", inline)]
pub fn intern(text: &str) -> InternedString {
    Interner::global().intern(text)
}

/// Interns the concatenation of `prefix` and `suffix` through the
/// process-wide interner, materializing the joined string only on a cache
/// miss.
#[cfg_attr(feature = "inline-more", inline)]
pub fn intern_concat(prefix: &str, suffix: &str) -> InternedString {
    Interner::global().intern_concat(prefix, suffix)
}

/// Returns a new or recycled [`StringBuilder`].
///
/// Dropping the builder returns its buffer to a bounded pool.
pub fn builder() -> StringBuilder {
    StringBuilder::new()
}

/// Enables diagnostics in the process-wide interner. Call
/// [`create_diagnostic_report`] to retrieve the gathered data.
pub fn enable_diagnostics() {
    Interner::global().enable_diagnostics();
}

/// Retrieves the diagnostic data describing the current state of the
/// process-wide interner. Make sure to call [`enable_diagnostics`]
/// beforehand.
pub fn create_diagnostic_report() -> String {
    Interner::global().create_diagnostic_report()
}

/// Registers a fast-path interning callback on the process-wide interner.
pub fn register_interning_callback(callback: InterningCallback) {
    Interner::global().register_interning_callback(callback);
}

/// Removes a previously registered interning callback from the
/// process-wide interner, compared by identity.
pub fn unregister_interning_callback(callback: InterningCallback) {
    Interner::global().unregister_interning_callback(callback);
}
