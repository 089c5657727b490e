use crate::{
    cache::{CacheDebugInfo, WeakStringCache},
    candidate::InternableStr,
    interned::InternedString,
};
use core::{
    cmp::Reverse,
    fmt::Write as _,
    sync::atomic::{AtomicBool, Ordering},
};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Number of top payoff candidates listed in the diagnostic report.
const TOP_CANDIDATES: usize = 15;

/// Decision made by an [`InterningCallback`] that claims a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterningDecision {
    /// The candidate's content maps to this hard-coded literal.
    ///
    /// The literal is returned as-is, bypassing the weak cache and never
    /// allocating.
    Literal(&'static str),
    /// The candidate must not be interned.
    ///
    /// A fresh uncached string is returned instead.
    Skip,
}

/// A fast-path predicate consulted before the weak cache.
///
/// Callbacks are evaluated in registration order and the first one to
/// return `Some` claims the candidate. They exist to short-circuit a small
/// set of frequent literals ("TRUE", "Debug", target names and the like)
/// that profiling has shown to dominate an interning workload.
///
/// Callbacks must not call back into the interner.
pub type InterningCallback = fn(&InternableStr<'_>) -> Option<InterningDecision>;

#[derive(Default)]
struct Statistics {
    /// Times the regular interning path found the string in the cache.
    hits: u64,
    /// Times the regular interning path added the string to the cache.
    misses: u64,
    /// Times an interning callback claimed the candidate.
    callback_claims: u64,
    /// Strings eliminated by interning.
    eliminated_strings: u64,
    /// Characters eliminated across all strings.
    eliminated_chars: u64,
    /// UTF-8 bytes eliminated across all strings.
    eliminated_bytes: u64,
    /// Maps strings that went through the interning path to the number of
    /// times they have been seen. The higher the count the better the
    /// payoff of interning them.
    call_counts: HashMap<InternedString, u64>,
}

/// Orchestrates interning through a [`WeakStringCache`].
///
/// The interner applies the hard-coded-literal fast path, delegates
/// unclaimed candidates to the weak cache, and optionally gathers usage
/// statistics. With diagnostics disabled the hot path takes no lock and
/// performs no allocation beyond what a cache miss itself requires.
///
/// One process-wide instance is available through [`Interner::global`];
/// the crate-root free functions delegate to it. Independent instances
/// can be created for engines that want separately scoped caches.
pub struct Interner {
    cache: WeakStringCache,
    /// Whether to gather statistics. One-way: set by
    /// [`enable_diagnostics`](Self::enable_diagnostics), never cleared.
    gather_statistics: AtomicBool,
    statistics: Mutex<Option<Statistics>>,
    callbacks: Mutex<Vec<InterningCallback>>,
    /// Mirrors `!callbacks.is_empty()` so the hot path can skip the lock.
    has_callbacks: AtomicBool,
}

static GLOBAL: Lazy<Interner> = Lazy::new(Interner::new);

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Creates a new interner with an empty cache and disabled diagnostics.
    pub fn new() -> Self {
        Self {
            cache: WeakStringCache::new(),
            gather_statistics: AtomicBool::new(false),
            statistics: Mutex::new(None),
            callbacks: Mutex::new(Vec::new()),
            has_callbacks: AtomicBool::new(false),
        }
    }

    /// Returns the process-wide interner instance.
    pub fn global() -> &'static Interner {
        &GLOBAL
    }

    /// Interns the given string.
    ///
    /// Returns a canonical string equal in content to `text`; repeated
    /// calls with equal content return the same underlying allocation for
    /// as long as at least one holder keeps it alive.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn intern(&self, text: &str) -> InternedString {
        self.intern_candidate(&InternableStr::Single(text))
    }

    /// Interns the concatenation of `prefix` and `suffix` without building
    /// the joined string first.
    ///
    /// Only an eventual cache miss materializes the concatenation.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn intern_concat(&self, prefix: &str, suffix: &str) -> InternedString {
        self.intern_candidate(&InternableStr::Pair(prefix, suffix))
    }

    /// Interns the text viewed by `candidate`.
    pub fn intern_candidate(&self, candidate: &InternableStr<'_>) -> InternedString {
        if candidate.is_empty() {
            return InternedString::EMPTY;
        }
        if self.has_callbacks.load(Ordering::Acquire) {
            if let Some(claimed) = self.apply_callbacks(candidate) {
                debug_validate(candidate, &claimed);
                return claimed;
            }
        }
        let (interned, hit) = self.cache.get_or_create(candidate);
        debug_validate(candidate, &interned);
        if self.gather_statistics.load(Ordering::Acquire) {
            self.record(candidate, &interned, hit);
        }
        interned
    }

    fn apply_callbacks(&self, candidate: &InternableStr<'_>) -> Option<InternedString> {
        let decision = {
            let callbacks = self.callbacks.lock();
            callbacks
                .iter()
                .find_map(|callback| callback(candidate))
        }?;
        let claimed = match decision {
            InterningDecision::Literal(literal) => InternedString::from_static(literal),
            InterningDecision::Skip => InternedString::from_arc(candidate.materialize_shared()),
        };
        if self.gather_statistics.load(Ordering::Acquire) {
            let mut guard = self.statistics.lock();
            if let Some(statistics) = guard.as_mut() {
                statistics.callback_claims += 1;
            }
        }
        Some(claimed)
    }

    fn record(&self, candidate: &InternableStr<'_>, interned: &InternedString, hit: bool) {
        let mut guard = self.statistics.lock();
        let Some(statistics) = guard.as_mut() else {
            return;
        };
        if hit {
            statistics.hits += 1;
        } else {
            statistics.misses += 1;
        }
        if let Some(count) = statistics.call_counts.get_mut(interned.as_str()) {
            *count += 1;
        } else {
            statistics.call_counts.insert(interned.clone(), 1);
        }
        if !candidate.identical_to(interned.as_str()) {
            // The candidate's own backing can now be released; account for
            // the memory interning saved.
            statistics.eliminated_strings += 1;
            statistics.eliminated_chars += candidate.chars().count() as u64;
            statistics.eliminated_bytes += candidate.len() as u64;
        }
    }

    /// Registers `callback` at the end of the fast-path callback list.
    pub fn register_interning_callback(&self, callback: InterningCallback) {
        let mut callbacks = self.callbacks.lock();
        callbacks.push(callback);
        self.has_callbacks.store(true, Ordering::Release);
    }

    /// Removes the first registration of `callback`, compared by identity.
    ///
    /// A no-op if the callback was never registered.
    pub fn unregister_interning_callback(&self, callback: InterningCallback) {
        let mut callbacks = self.callbacks.lock();
        if let Some(index) = callbacks.iter().position(|&registered| registered == callback) {
            callbacks.remove(index);
        }
        self.has_callbacks
            .store(!callbacks.is_empty(), Ordering::Release);
    }

    /// Starts gathering interning statistics.
    ///
    /// A one-way transition: once enabled, statistics accumulate for the
    /// lifetime of the interner. Idempotent.
    pub fn enable_diagnostics(&self) {
        let mut statistics = self.statistics.lock();
        if statistics.is_none() {
            *statistics = Some(Statistics::default());
        }
        self.gather_statistics.store(true, Ordering::Release);
        tracing::debug!("interning diagnostics enabled");
    }

    /// Returns a human-readable snapshot of the interning statistics.
    ///
    /// Contains a short marker instead if
    /// [`enable_diagnostics`](Self::enable_diagnostics) was never called.
    pub fn create_diagnostic_report(&self) -> String {
        const TITLE: &str = "Weak String Interning";

        if !self.gather_statistics.load(Ordering::Acquire) {
            return format!("{TITLE} - enable_diagnostics() has not been called");
        }
        let guard = self.statistics.lock();
        let Some(statistics) = guard.as_ref() else {
            return format!("{TITLE} - enable_diagnostics() has not been called");
        };

        let mut report = String::with_capacity(1024);
        let _ = writeln!(report, "{:=^80}", format!(" {TITLE} "));
        let rows = [
            ("WeakStringCache Hits", statistics.hits, "hits"),
            ("WeakStringCache Misses", statistics.misses, "misses"),
            ("Interning Callback Claims", statistics.callback_claims, "claims"),
            ("Eliminated Strings*", statistics.eliminated_strings, "strings"),
            ("Eliminated Chars", statistics.eliminated_chars, "chars"),
            ("Eliminated Bytes (UTF-8)", statistics.eliminated_bytes, "bytes"),
        ];
        for (label, value, unit) in rows {
            let _ = writeln!(report, "||{label:>50}|{value:>20}|{unit:>8}|");
        }
        let _ = writeln!(
            report,
            "*Elimination assumes interned candidates were unique allocations.",
        );
        let _ = writeln!(report, "|{:-^81}|", "");

        let mut ranked = statistics
            .call_counts
            .iter()
            .filter(|(_, &count)| count > 1)
            .collect::<Vec<_>>();
        ranked.sort_by_key(|(string, &count)| Reverse(count * string.len() as u64));
        let _ = writeln!(report, "Top candidates by interning payoff:");
        for (string, count) in ranked.into_iter().take(TOP_CANDIDATES) {
            let _ = writeln!(
                report,
                "({count} instances x each {} chars) {string}",
                string.len(),
            );
        }
        let _ = writeln!(report);

        let info = self.cache_debug_info();
        let _ = writeln!(report, "WeakStringCache statistics:");
        let _ = writeln!(
            report,
            "String count live/collected/total = {}/{}/{}",
            info.live,
            info.collected,
            info.total(),
        );
        report
    }

    /// Classifies the cache's entries as live or collected.
    pub fn cache_debug_info(&self) -> CacheDebugInfo {
        self.cache.debug_info()
    }

    /// Releases all entries from the underlying weak cache.
    ///
    /// The interner stays fully usable; subsequent calls repopulate the
    /// cache. Interned strings held elsewhere are unaffected.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

/// Debug-only consistency check: the interned result must equal the
/// independently materialized candidate content. A mismatch means the
/// hash or equality implementation silently corrupted data and must
/// abort, never be downgraded to a warning.
///
/// Compiled out under `test-allocations` so the allocation-profiling
/// tests observe the production hot path.
#[cfg(all(debug_assertions, not(feature = "test-allocations")))]
fn debug_validate(candidate: &InternableStr<'_>, interned: &InternedString) {
    assert_eq!(
        interned.as_str(),
        candidate.materialize(),
        "interned string diverged from its candidate",
    );
}

#[cfg(not(all(debug_assertions, not(feature = "test-allocations"))))]
fn debug_validate(_candidate: &InternableStr<'_>, _interned: &InternedString) {}
