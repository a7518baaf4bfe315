//! Data source locators and locator sets.
//!
//! A [`Locator`] addresses a value nested inside container data sources,
//! e.g. `primvars.points.primvarValue`. The empty locator addresses the
//! whole prim.
//!
//! A [`LocatorSet`] is kept normalized: members are sorted and no member
//! is a strict ancestor of another. Inserting a locator already covered by
//! an ancestor is a no-op; inserting an ancestor drops the members it
//! covers.

use std::fmt;

use smallvec::SmallVec;

use crate::util::{Error, Result, Token};

// ============================================================================
// Locator
// ============================================================================

/// Immutable path of tokens into nested containers.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator {
    tokens: SmallVec<[Token; 4]>,
}

impl Locator {
    /// The empty locator (whole prim).
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a locator from tokens.
    pub fn new<I: IntoIterator<Item = Token>>(tokens: I) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Create a locator from static names.
    pub fn from_static(names: &[&'static str]) -> Self {
        Self::new(names.iter().copied().map(Token::from_static))
    }

    /// Parse a dot separated locator, e.g. `primvars.points`.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        let mut tokens = SmallVec::new();
        for element in text.split('.') {
            if element.is_empty() {
                return Err(Error::InvalidLocator(text.to_string()));
            }
            tokens.push(Token::new(element));
        }
        Ok(Self { tokens })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn element(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    #[inline]
    pub fn elements(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn first_element(&self) -> Option<&Token> {
        self.tokens.first()
    }

    #[inline]
    pub fn last_element(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Return a new locator with `name` appended.
    pub fn append(&self, name: &Token) -> Locator {
        let mut tokens = self.tokens.clone();
        tokens.push(name.clone());
        Self { tokens }
    }

    /// Return a new locator with all of `other` appended.
    pub fn append_locator(&self, other: &Locator) -> Locator {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self { tokens }
    }

    /// Return a new locator with `name` prepended.
    pub fn prepend(&self, name: &Token) -> Locator {
        let mut tokens = SmallVec::with_capacity(self.tokens.len() + 1);
        tokens.push(name.clone());
        tokens.extend(self.tokens.iter().cloned());
        Self { tokens }
    }

    /// Locator without its last element.
    pub fn parent(&self) -> Locator {
        let n = self.tokens.len().saturating_sub(1);
        Self::new(self.tokens[..n].iter().cloned())
    }

    /// Locator without its first element.
    pub fn remove_first(&self) -> Locator {
        Self::new(self.tokens.iter().skip(1).cloned())
    }

    /// Check if `prefix` equals this locator or one of its ancestors.
    #[inline]
    pub fn has_prefix(&self, prefix: &Locator) -> bool {
        self.tokens.starts_with(&prefix.tokens)
    }

    /// Check if either locator is a prefix of the other.
    #[inline]
    pub fn intersects(&self, other: &Locator) -> bool {
        self.has_prefix(other) || other.has_prefix(self)
    }

    /// Longest common prefix.
    pub fn common_prefix(&self, other: &Locator) -> Locator {
        Self::new(
            self.tokens
                .iter()
                .zip(other.tokens.iter())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a.clone()),
        )
    }

    /// Replace `old_prefix` with `new_prefix`; unchanged if not prefixed.
    pub fn replace_prefix(&self, old_prefix: &Locator, new_prefix: &Locator) -> Locator {
        if !self.has_prefix(old_prefix) {
            return self.clone();
        }
        let mut tokens: SmallVec<[Token; 4]> = new_prefix.tokens.clone();
        tokens.extend(self.tokens[old_prefix.tokens.len()..].iter().cloned());
        Self { tokens }
    }
}

impl<const N: usize> From<[Token; N]> for Locator {
    fn from(tokens: [Token; N]) -> Self {
        Self::new(tokens)
    }
}

impl From<Token> for Locator {
    fn from(token: Token) -> Self {
        Self::new([token])
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(token.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({})", self)
    }
}

// ============================================================================
// LocatorSet
// ============================================================================

/// Normalized set of locators.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LocatorSet {
    locators: SmallVec<[Locator; 8]>,
}

impl LocatorSet {
    /// Create an empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing the empty locator; intersects every non-empty set.
    pub fn universal() -> Self {
        let mut set = Self::new();
        set.insert(Locator::empty());
        set
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Members in sorted order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
        self.locators.iter()
    }

    /// Insert a locator, keeping the set normalized.
    pub fn insert(&mut self, locator: Locator) {
        if self.locators.iter().any(|m| locator.has_prefix(m)) {
            return;
        }
        self.locators.retain(|m| !m.has_prefix(&locator));
        let pos = self
            .locators
            .binary_search(&locator)
            .unwrap_or_else(|pos| pos);
        self.locators.insert(pos, locator);
    }

    /// Insert every member of `other`.
    pub fn insert_set(&mut self, other: &LocatorSet) {
        for locator in other.iter() {
            self.insert(locator.clone());
        }
    }

    /// Check if `locator` is a member or a descendant of a member.
    pub fn contains(&self, locator: &Locator) -> bool {
        self.locators.iter().any(|m| locator.has_prefix(m))
    }

    /// Check if any member intersects `locator`.
    pub fn intersects_locator(&self, locator: &Locator) -> bool {
        self.locators.iter().any(|m| m.intersects(locator))
    }

    /// Check if any member of `self` intersects any member of `other`.
    pub fn intersects(&self, other: &LocatorSet) -> bool {
        self.locators.iter().any(|m| other.intersects_locator(m))
    }

    /// Members narrowed to the part overlapping `locator`.
    pub fn intersection(&self, locator: &Locator) -> LocatorSet {
        let mut result = LocatorSet::new();
        for member in self.iter() {
            if member.has_prefix(locator) {
                result.insert(member.clone());
            } else if locator.has_prefix(member) {
                result.insert(locator.clone());
            }
        }
        result
    }

    /// Rewrite members under `old_prefix` to live under `new_prefix`.
    pub fn replace_prefix(&self, old_prefix: &Locator, new_prefix: &Locator) -> LocatorSet {
        self.iter()
            .map(|l| l.replace_prefix(old_prefix, new_prefix))
            .collect()
    }
}

impl FromIterator<Locator> for LocatorSet {
    fn from_iter<I: IntoIterator<Item = Locator>>(iter: I) -> Self {
        let mut set = LocatorSet::new();
        for locator in iter {
            set.insert(locator);
        }
        set
    }
}

impl From<Locator> for LocatorSet {
    fn from(locator: Locator) -> Self {
        let mut set = LocatorSet::new();
        set.insert(locator);
        set
    }
}

impl<'a> IntoIterator for &'a LocatorSet {
    type Item = &'a Locator;
    type IntoIter = std::slice::Iter<'a, Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for LocatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.locators.iter().map(|l| l.to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(text: &str) -> Locator {
        Locator::parse(text).expect("valid locator")
    }

    #[test]
    fn test_append_and_split() {
        let prefix = loc("primvars.points");
        let full = prefix.append(&Token::new("primvarValue"));
        assert_eq!(full.to_string(), "primvars.points.primvarValue");
        assert_eq!(full.parent(), prefix);
        assert_eq!(full.remove_first(), loc("points.primvarValue"));
        assert_eq!(full.last_element(), Some(&Token::new("primvarValue")));
        assert!(full.has_prefix(&prefix));
        assert!(!prefix.has_prefix(&full));
        assert!(Locator::parse("a..b").is_err());
    }

    #[test]
    fn test_replace_prefix_and_common() {
        let l = loc("a.b.c");
        assert_eq!(l.replace_prefix(&loc("a.b"), &loc("x")), loc("x.c"));
        assert_eq!(l.replace_prefix(&loc("q"), &loc("x")), l);
        assert_eq!(l.common_prefix(&loc("a.b.d")), loc("a.b"));
        assert_eq!(loc("b").prepend(&Token::new("a")), loc("a.b"));
    }

    #[test]
    fn test_set_normalization() {
        let mut set = LocatorSet::new();
        set.insert(loc("primvars.points.primvarValue"));
        set.insert(loc("xform"));
        set.insert(loc("primvars.points"));
        assert_eq!(set.len(), 2);
        set.insert(loc("primvars.points.indices"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&loc("primvars.points.primvarValue")));
        assert!(!set.contains(&loc("primvars")));
    }

    #[test]
    fn test_set_intersects() {
        let empty = LocatorSet::new();
        let set: LocatorSet = [loc("primvars.points")].into_iter().collect();
        assert!(!empty.intersects(&set));
        assert!(!set.intersects(&empty));
        assert!(set.intersects(&LocatorSet::from(loc("primvars"))));
        assert!(set.intersects(&LocatorSet::from(loc("primvars.points.primvarValue"))));
        assert!(!set.intersects(&LocatorSet::from(loc("primvars.normals"))));
        assert!(LocatorSet::universal().intersects(&set));
        assert!(!LocatorSet::universal().intersects(&empty));
    }

    #[test]
    fn test_intersection() {
        let set: LocatorSet = [loc("a.b"), loc("c")].into_iter().collect();
        let narrowed = set.intersection(&loc("a"));
        assert_eq!(narrowed, LocatorSet::from(loc("a.b")));
        let widened = set.intersection(&loc("c.d"));
        assert_eq!(widened, LocatorSet::from(loc("c.d")));
    }
}
