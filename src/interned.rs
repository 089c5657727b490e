use core::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};
use std::sync::Arc;

/// A canonical string produced by interning.
///
/// Equal-content intern calls return clones of the same `InternedString`,
/// so cloning is cheap and content comparisons of repeated values collapse
/// to pointer comparisons in practice. The interner itself holds the
/// underlying allocation only weakly: once every `InternedString` for a
/// given content is dropped, the allocation is freed and the cache entry
/// goes stale.
///
/// Strings claimed by an interning callback (and the canonical empty
/// string) are backed by `'static` literals and never allocate.
#[derive(Clone)]
pub struct InternedString {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    /// Shared allocation produced by the weak cache.
    Shared(Arc<str>),
    /// Hard-coded literal claimed by an interning callback.
    Static(&'static str),
}

impl InternedString {
    /// The canonical empty string. Never allocates.
    pub(crate) const EMPTY: Self = Self {
        repr: Repr::Static(""),
    };

    /// Wraps a shared allocation handed out by the weak cache.
    #[cfg_attr(feature = "inline-more", inline)]
    pub(crate) fn from_arc(string: Arc<str>) -> Self {
        Self {
            repr: Repr::Shared(string),
        }
    }

    /// Wraps a `'static` literal without allocating.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn from_static(string: &'static str) -> Self {
        Self {
            repr: Repr::Static(string),
        }
    }

    /// Returns the string contents.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Shared(string) => string,
            Repr::Static(string) => string,
        }
    }

    /// Returns the length of the string in bytes.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Returns `true` if the string is empty.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Returns `true` if `self` and `other` are backed by the same text in
    /// memory, not merely equal in content.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.as_str(), other.as_str())
    }
}

impl Deref for InternedString {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for InternedString {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for InternedString {
    #[inline]
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl PartialEq for InternedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.as_str() == other.as_str()
    }
}

impl Eq for InternedString {}

impl PartialEq<str> for InternedString {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for InternedString {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for InternedString {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedString {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for InternedString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_strings_share_their_literal() {
        let literal: &'static str = "TRUE";
        let interned = InternedString::from_static(literal);
        assert!(core::ptr::eq(interned.as_str(), literal));
        assert_eq!(interned, "TRUE");
    }

    #[test]
    fn clones_are_identical() {
        let interned = InternedString::from_arc(Arc::from("Hello"));
        let clone = interned.clone();
        assert!(interned.ptr_eq(&clone));
        assert_eq!(interned, clone);
    }

    #[test]
    fn equality_is_content_based_across_allocations() {
        let lhs = InternedString::from_arc(Arc::from("Hello"));
        let rhs = InternedString::from_arc(Arc::from("Hello"));
        assert!(!lhs.ptr_eq(&rhs));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn hash_matches_str_hash() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(value: &(impl Hash + ?Sized)) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let interned = InternedString::from_arc(Arc::from("Win32"));
        assert_eq!(hash_of(&interned), hash_of("Win32"));
    }

    #[test]
    fn empty_is_canonical() {
        assert!(InternedString::EMPTY.is_empty());
        assert!(InternedString::EMPTY.ptr_eq(&InternedString::EMPTY.clone()));
    }
}
