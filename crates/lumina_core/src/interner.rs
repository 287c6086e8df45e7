//! String Interner
//!
//! Interns capability names into compact [`Symbol`]s so capability tables can
//! be keyed and compared by integer. Each interner is an owned object; there is
//! no process-wide pool, so independent shader configurations never share
//! symbol spaces.

use lasso::{Rodeo, Spur};

/// Compact integer identifier for an interned string.
pub type Symbol = Spur;

/// Owned string interner.
#[derive(Debug, Default)]
pub struct Interner {
    rodeo: Rodeo,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns a string, returning the existing symbol if already present.
    #[inline]
    pub fn intern(&mut self, s: &str) -> Symbol {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up an existing symbol without interning.
    #[inline]
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.rodeo.get(s)
    }

    /// Resolves a symbol produced by this interner.
    #[inline]
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.rodeo.resolve(&sym)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let mut interner = Interner::new();
        let s1 = interner.intern("camera.view");
        let s2 = interner.intern("camera.view");
        let s3 = interner.intern("vertex.normal");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(interner.resolve(s1), "camera.view");
        assert_eq!(interner.resolve(s3), "vertex.normal");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_get() {
        let mut interner = Interner::new();
        let _ = interner.intern("existing");

        assert!(interner.get("existing").is_some());
        assert!(interner.get("non_existing").is_none());
    }
}
