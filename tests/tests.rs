use weak_interner::{InternableStr, InternedString, Interner, InterningDecision};

/// Builds the report row the interner emits for a labeled counter, so
/// assertions track the report's formatting exactly.
fn report_row(label: &str, value: u64, unit: &str) -> String {
    format!("||{label:>50}|{value:>20}|{unit:>8}|")
}

#[test]
fn interning_is_idempotent() {
    let interner = Interner::new();
    let first = interner.intern("ResolveAssemblyReference");
    let second = interner.intern("ResolveAssemblyReference");
    assert!(first.ptr_eq(&second));
    assert_eq!(second, "ResolveAssemblyReference");
}

#[test]
fn structural_hash_matches_for_every_segmentation() {
    let text = "Configuration=Debug;Platform=AnyCPU";
    let whole = InternableStr::Single(text).structural_hash();
    for split in 0..=text.len() {
        let (head, tail) = text.split_at(split);
        assert_eq!(InternableStr::Pair(head, tail).structural_hash(), whole);
    }
}

#[test]
fn concatenated_candidates_return_the_prior_instance() {
    let interner = Interner::new();
    let whole = interner.intern("Hello");
    let joined = interner.intern_concat("Hel", "lo");
    assert_eq!(joined, "Hello");
    assert!(whole.ptr_eq(&joined));
}

#[test]
fn empty_string_is_canonical() {
    let interner = Interner::new();
    let empty = interner.intern("");
    assert!(empty.is_empty());
    assert!(empty.ptr_eq(&interner.intern("")));
    assert!(empty.ptr_eq(&interner.intern_concat("", "")));

    // Enabling diagnostics must not disturb the empty-string fast path.
    interner.enable_diagnostics();
    assert!(empty.ptr_eq(&interner.intern("")));
    assert_eq!(interner.cache_debug_info().total(), 0);
}

#[test]
fn concurrent_interning_converges_on_one_instance() {
    let interner = Interner::new();
    let results = std::thread::scope(|scope| {
        let handles = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (0..64)
                        .map(|_| interner.intern("Microsoft.Common.CurrentVersion.targets"))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });
    let first = &results[0];
    assert!(results.iter().all(|interned| interned.ptr_eq(first)));
    assert_eq!(interner.cache_debug_info().total(), 1);
}

#[test]
fn dropping_the_last_holder_invalidates_the_entry() {
    let interner = Interner::new();
    let only_holder = interner.intern("TransientOutputPath");
    let info = interner.cache_debug_info();
    assert_eq!((info.live, info.collected), (1, 0));

    drop(only_holder);
    let info = interner.cache_debug_info();
    assert_eq!((info.live, info.collected), (0, 1));

    // Re-interning equal content materializes a fresh instance into the
    // stale slot, and subsequent calls converge on it.
    let fresh = interner.intern("TransientOutputPath");
    let again = interner.intern("TransientOutputPath");
    assert!(fresh.ptr_eq(&again));
    let info = interner.cache_debug_info();
    assert_eq!((info.live, info.collected), (1, 0));
}

#[test]
fn diagnostic_report_lifecycle() {
    let disabled_marker = "enable_diagnostics() has not been called";

    let interner = Interner::new();
    assert!(interner.create_diagnostic_report().contains(disabled_marker));

    interner.enable_diagnostics();
    let keep = ["Debug", "Release", "Debug", "Debug", "Release", "x64"]
        .iter()
        .map(|text| interner.intern(text))
        .collect::<Vec<_>>();

    let report = interner.create_diagnostic_report();
    assert!(!report.contains(disabled_marker));
    assert!(report.contains(&report_row("WeakStringCache Hits", 3, "hits")));
    assert!(report.contains(&report_row("WeakStringCache Misses", 3, "misses")));
    assert!(report.contains("Eliminated Strings"));
    // "Debug" (3 x 5 chars) ranks above "Release" (2 x 7 chars).
    let debug_rank = report.find("(3 instances x each 5 chars) Debug").unwrap();
    let release_rank = report.find("(2 instances x each 7 chars) Release").unwrap();
    assert!(debug_rank < release_rank);
    // "x64" was seen once and must not be ranked.
    assert!(!report.contains("chars) x64"));
    assert!(report.contains("String count live/collected/total = 3/0/3"));
    drop(keep);
}

#[test]
fn elimination_counters_accumulate() {
    let interner = Interner::new();
    interner.enable_diagnostics();

    // The miss materializes a new allocation, the hit collapses a
    // duplicate; both differ from the candidate's backing text.
    let first = interner.intern("grüße");
    let second = interner.intern("grüße");
    assert!(first.ptr_eq(&second));

    let report = interner.create_diagnostic_report();
    assert!(report.contains(&report_row("Eliminated Strings*", 2, "strings")));
    assert!(report.contains(&report_row("Eliminated Chars", 10, "chars")));
    assert!(report.contains(&report_row("Eliminated Bytes (UTF-8)", 14, "bytes")));
}

static TRUE_LITERAL: &str = "TRUE";

fn true_literal_matcher(candidate: &InternableStr<'_>) -> Option<InterningDecision> {
    if candidate.len() == 4 && candidate.starts_with_ordinal(TRUE_LITERAL) {
        return Some(InterningDecision::Literal(TRUE_LITERAL));
    }
    None
}

#[test]
fn literal_callbacks_take_precedence_over_the_cache() {
    let interner = Interner::new();
    interner.enable_diagnostics();
    interner.register_interning_callback(true_literal_matcher);

    let claimed = interner.intern("TRUE");
    assert!(claimed.ptr_eq(&InternedString::from_static(TRUE_LITERAL)));

    // The claim bypassed the weak cache and its hit/miss counters.
    let report = interner.create_diagnostic_report();
    assert!(report.contains(&report_row("WeakStringCache Hits", 0, "hits")));
    assert!(report.contains(&report_row("WeakStringCache Misses", 0, "misses")));
    assert!(report.contains(&report_row("Interning Callback Claims", 1, "claims")));
    assert_eq!(interner.cache_debug_info().total(), 0);

    // Without the callback the same call is serviced by the weak cache.
    interner.unregister_interning_callback(true_literal_matcher);
    let uncached = interner.intern("TRUE");
    assert_eq!(uncached, "TRUE");
    assert!(!claimed.ptr_eq(&uncached));
    let report = interner.create_diagnostic_report();
    assert!(report.contains(&report_row("WeakStringCache Misses", 1, "misses")));
}

#[test]
fn builders_intern_their_accumulated_content() {
    let mut builder = weak_interner::builder();
    builder.append("obj/").append("Debug/").append("net8.0");
    assert_eq!(builder.len(), "obj/Debug/net8.0".len());

    let built = builder.intern();
    assert_eq!(built, "obj/Debug/net8.0");

    // The builder's content and a plain intern of the same text converge.
    let direct = weak_interner::intern("obj/Debug/net8.0");
    assert!(built.ptr_eq(&direct));

    builder.clear();
    assert!(builder.is_empty());
}

#[test]
fn global_free_functions_share_one_interner() {
    let first = weak_interner::intern("global-shared-value");
    let second = weak_interner::intern("global-shared-value");
    assert!(first.ptr_eq(&second));

    let joined = weak_interner::intern_concat("global-", "shared-value");
    assert!(first.ptr_eq(&joined));

    static MARKER: &str = "global-literal-marker";
    fn claim_marker(candidate: &InternableStr<'_>) -> Option<InterningDecision> {
        if candidate.len() == MARKER.len() && candidate.starts_with_ordinal(MARKER) {
            return Some(InterningDecision::Literal(MARKER));
        }
        None
    }
    weak_interner::register_interning_callback(claim_marker);
    let claimed = weak_interner::intern(MARKER);
    assert!(claimed.ptr_eq(&InternedString::from_static(MARKER)));
    weak_interner::unregister_interning_callback(claim_marker);
}
