//! Absolute scene paths.
//!
//! A [`Path`] names a prim (`/World/mesh`) or a property on a prim
//! (`/World/mesh.points`). The empty path is distinct from the absolute
//! root `/` and is used as the "no path" value.
//!
//! Paths compare element-wise, so an ancestor sorts immediately before
//! its descendants. Sorted path vectors can therefore answer "is this
//! path pruned by any prefix" with a single binary search.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{Error, Result, Token};

#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct PathRepr {
    prims: Vec<Token>,
    property: Option<Token>,
}

/// Absolute prim or property path. Cheap to clone.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Option<Arc<PathRepr>>);

impl Path {
    /// The empty path.
    #[inline]
    pub const fn empty() -> Self {
        Self(None)
    }

    /// The absolute root path `/`.
    pub fn absolute_root() -> Self {
        Self::from_parts(Vec::new(), None)
    }

    fn from_parts(prims: Vec<Token>, property: Option<Token>) -> Self {
        Self(Some(Arc::new(PathRepr { prims, property })))
    }

    /// Parse a path from text.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        let Some(body) = text.strip_prefix('/') else {
            return Err(Error::invalid_path(text, "path must be absolute"));
        };
        if body.is_empty() {
            return Ok(Self::absolute_root());
        }

        let (prim_part, property) = match body.rsplit_once('.') {
            Some((prims, prop)) => {
                if prop.is_empty() || prop.contains('/') {
                    return Err(Error::invalid_path(text, "malformed property name"));
                }
                (prims, Some(Token::new(prop)))
            }
            None => (body, None),
        };

        let mut prims = Vec::new();
        if !prim_part.is_empty() {
            for element in prim_part.split('/') {
                if element.is_empty() {
                    return Err(Error::invalid_path(text, "empty element"));
                }
                if element.contains('.') {
                    return Err(Error::invalid_path(text, "'.' in prim name"));
                }
                prims.push(Token::new(element));
            }
        }
        if prims.is_empty() && property.is_some() {
            return Err(Error::invalid_path(text, "property on absolute root"));
        }
        Ok(Self::from_parts(prims, property))
    }

    /// Check if this is the empty path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Check if this is `/`.
    #[inline]
    pub fn is_absolute_root(&self) -> bool {
        matches!(&self.0, Some(r) if r.prims.is_empty() && r.property.is_none())
    }

    /// Check if this names a prim (including `/`).
    #[inline]
    pub fn is_prim_path(&self) -> bool {
        matches!(&self.0, Some(r) if r.property.is_none())
    }

    /// Check if this names a property.
    #[inline]
    pub fn is_property_path(&self) -> bool {
        matches!(&self.0, Some(r) if r.property.is_some())
    }

    /// Number of prim elements plus one for a property.
    pub fn element_count(&self) -> usize {
        match &self.0 {
            Some(r) => r.prims.len() + usize::from(r.property.is_some()),
            None => 0,
        }
    }

    /// Prim name elements.
    pub fn prim_elements(&self) -> &[Token] {
        match &self.0 {
            Some(r) => &r.prims,
            None => &[],
        }
    }

    /// Last element name: the property name, the prim name, or empty for `/`.
    pub fn name(&self) -> Token {
        match &self.0 {
            Some(r) => r
                .property
                .clone()
                .or_else(|| r.prims.last().cloned())
                .unwrap_or_default(),
            None => Token::EMPTY,
        }
    }

    /// Parent path. The parent of a property path is its prim; the parent
    /// of `/` is the empty path.
    pub fn parent(&self) -> Path {
        let Some(r) = &self.0 else {
            return Self::empty();
        };
        if r.property.is_some() {
            return Self::from_parts(r.prims.clone(), None);
        }
        if r.prims.is_empty() {
            return Self::empty();
        }
        Self::from_parts(r.prims[..r.prims.len() - 1].to_vec(), None)
    }

    /// Prim portion of this path.
    pub fn prim_path(&self) -> Path {
        if self.is_property_path() {
            self.parent()
        } else {
            self.clone()
        }
    }

    /// Append a child prim. Only valid on prim paths.
    pub fn append_child(&self, name: &Token) -> Path {
        match &self.0 {
            Some(r) if r.property.is_none() && !name.is_empty() => {
                let mut prims = r.prims.clone();
                prims.push(name.clone());
                Self::from_parts(prims, None)
            }
            _ => {
                crate::coding_error!("cannot append child '{}' to <{}>", name, self);
                Self::empty()
            }
        }
    }

    /// Append a property. Only valid on non-root prim paths.
    pub fn append_property(&self, name: &Token) -> Path {
        match &self.0 {
            Some(r) if r.property.is_none() && !r.prims.is_empty() && !name.is_empty() => {
                Self::from_parts(r.prims.clone(), Some(name.clone()))
            }
            _ => {
                crate::coding_error!("cannot append property '{}' to <{}>", name, self);
                Self::empty()
            }
        }
    }

    /// Check if `prefix` is this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        let (Some(me), Some(p)) = (&self.0, &prefix.0) else {
            return false;
        };
        if p.property.is_some() {
            return me == p;
        }
        me.prims.starts_with(&p.prims)
    }

    /// Sort `paths`, drop duplicates and drop every path that has another
    /// member as a prefix.
    pub fn remove_descendent_paths(paths: &mut Vec<Path>) {
        paths.sort();
        paths.dedup();
        let mut kept: Vec<Path> = Vec::with_capacity(paths.len());
        for path in paths.drain(..) {
            match kept.last() {
                Some(last) if path.has_prefix(last) => {}
                _ => kept.push(path),
            }
        }
        *paths = kept;
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(r) = &self.0 else {
            return Ok(());
        };
        if r.prims.is_empty() {
            return f.write_str("/");
        }
        for element in &r.prims {
            write!(f, "/{}", element)?;
        }
        if let Some(property) = &r.property {
            write!(f, ".{}", property)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self)
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
