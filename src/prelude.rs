//! Shared collection aliases, stack growth and math helpers.
//!
//! The rest of the crate imports hash maps and ordered maps from here so the
//! hasher choice lives in one place.

// ═══════════════════════════════════════════════════════════════════════════════
// Hash collections
// ═══════════════════════════════════════════════════════════════════════════════

pub use rustc_hash::{FxHashMap, FxHashSet};

// ═══════════════════════════════════════════════════════════════════════════════
// IndexMap - insertion ordered, FxHasher
// ═══════════════════════════════════════════════════════════════════════════════

pub type IndexMap<K, V> =
    indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Create an empty IndexMap
#[inline]
pub fn index_map_new<K, V>() -> IndexMap<K, V>
where
    K: core::hash::Hash + Eq,
{
    indexmap::IndexMap::with_hasher(Default::default())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Stack growth
// ═══════════════════════════════════════════════════════════════════════════════

/// Grow the stack once less than this much remains (100KB)
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment (1MB)
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment when the current one is
/// nearly exhausted. Wraps the recursive parts of parsing and value
/// conversion; their nesting limits bound the total.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Math functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Math operations backed by libm so results do not depend on the host libc.
pub mod math {
    #[inline]
    pub fn floor(x: f64) -> f64 {
        libm::floor(x)
    }

    #[inline]
    pub fn ceil(x: f64) -> f64 {
        libm::ceil(x)
    }

    #[inline]
    pub fn trunc(x: f64) -> f64 {
        libm::trunc(x)
    }

    #[inline]
    pub fn powf(base: f64, exp: f64) -> f64 {
        libm::pow(base, exp)
    }

    #[inline]
    pub fn sqrt(x: f64) -> f64 {
        libm::sqrt(x)
    }

    #[inline]
    pub fn ln(x: f64) -> f64 {
        libm::log(x)
    }

    #[inline]
    pub fn exp(x: f64) -> f64 {
        libm::exp(x)
    }

    #[inline]
    pub fn sin(x: f64) -> f64 {
        libm::sin(x)
    }

    #[inline]
    pub fn cos(x: f64) -> f64 {
        libm::cos(x)
    }

    #[inline]
    pub fn tan(x: f64) -> f64 {
        libm::tan(x)
    }

    #[inline]
    pub fn asin(x: f64) -> f64 {
        libm::asin(x)
    }

    #[inline]
    pub fn acos(x: f64) -> f64 {
        libm::acos(x)
    }

    #[inline]
    pub fn atan(x: f64) -> f64 {
        libm::atan(x)
    }

    #[inline]
    pub fn atan2(y: f64, x: f64) -> f64 {
        libm::atan2(y, x)
    }

    #[inline]
    pub fn fmod(x: f64, y: f64) -> f64 {
        libm::fmod(x, y)
    }

    /// Euclidean remainder (modulo) - always returns positive result
    #[inline]
    pub fn rem_euclid(x: f64, y: f64) -> f64 {
        let r = libm::fmod(x, y);
        if r < 0.0 { r + y.abs() } else { r }
    }
}
