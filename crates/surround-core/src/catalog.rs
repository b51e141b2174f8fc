use crate::arena::{Arena, ArenaId};

/// Identifier of a [`DelimiterKind`] within its [`Catalog`].
pub type KindId = ArenaId<DelimiterKind>;

/// One catalog entry describing a category of paired or bounded token.
///
/// A kind is *balanced* when its open and close tokens are textually
/// identical (a quote mark, `$…$` math fences). Balanced kinds cannot be
/// matched open/close-style: whether a given occurrence opens or closes a
/// span depends on context that only the global merge has, so the per-line
/// pass defers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterKind {
    open: String,
    close: Option<String>,
    triple: Option<String>,
    priority: i32,
    spans_lines: bool,
    balanced: bool,
}

impl DelimiterKind {
    pub fn new(
        open: impl Into<String>,
        close: Option<&str>,
        triple: Option<&str>,
        priority: i32,
        spans_lines: bool,
    ) -> Self {
        let open = open.into();
        let close = close.map(str::to_owned);
        let balanced = close.as_deref() == Some(open.as_str());

        Self {
            open,
            close,
            triple: triple.map(str::to_owned),
            priority,
            spans_lines,
            balanced,
        }
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> Option<&str> {
        self.close.as_deref()
    }

    pub fn triple(&self) -> Option<&str> {
        self.triple.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn spans_lines(&self) -> bool {
        self.spans_lines
    }

    pub fn is_balanced(&self) -> bool {
        self.balanced
    }

    pub fn has_triple(&self) -> bool {
        self.triple.is_some()
    }
}

/// An immutable, ordered set of delimiter kinds.
///
/// Catalog order is significant: when several kinds could match at the same
/// column, the scanner accepts the first one in catalog order. Higher
/// `priority` values win during stack reduction, independent of catalog
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    kinds: Arena<DelimiterKind>,
}

impl Catalog {
    pub fn new(kinds: Vec<DelimiterKind>) -> Self {
        let mut arena = Arena::new(kinds.len());
        for kind in kinds {
            arena.alloc(kind);
        }
        Self { kinds: arena }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn get(&self, id: KindId) -> Option<&DelimiterKind> {
        self.kinds.get(id)
    }

    /// All kind ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = KindId> + use<> {
        self.kinds.ids()
    }

    /// Looks up a kind by its open token.
    pub fn kind_of(&self, open: &str) -> Option<KindId> {
        self.ids().find(|&id| self[id].open() == open)
    }
}

impl std::ops::Index<KindId> for Catalog {
    type Output = DelimiterKind;

    fn index(&self, index: KindId) -> &Self::Output {
        &self.kinds[index]
    }
}

impl Default for Catalog {
    /// A general-purpose catalog: single and triple quotes, block and line
    /// comments, the three bracket families and `$…$` fences.
    fn default() -> Self {
        Self::new(vec![
            DelimiterKind::new("\"", Some("\""), Some("\"\"\""), 20, false),
            DelimiterKind::new("'", Some("'"), Some("'''"), 20, false),
            DelimiterKind::new("/*", Some("*/"), None, 10, true),
            DelimiterKind::new("//", None, None, 5, false),
            DelimiterKind::new("(", Some(")"), None, 0, true),
            DelimiterKind::new("[", Some("]"), None, 0, true),
            DelimiterKind::new("{", Some("}"), None, 0, true),
            DelimiterKind::new("$", Some("$"), None, 0, true),
        ])
    }
}
