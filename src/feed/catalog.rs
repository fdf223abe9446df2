//! Fixed catalog of feed categories.
//!
//! The catalog is defined client-side, not derived from the server, and the
//! selection can only ever hold keys from it.

/// One of the seven known feed categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    AlumniNews,
    KnowSarvalians,
    Reunions,
    Events,
    SchoolNews,
    SchoolDevelopment,
    HelpSarvailians,
}

impl CategoryKey {
    /// All categories in chip display order.
    pub const ALL: [CategoryKey; 7] = [
        CategoryKey::AlumniNews,
        CategoryKey::KnowSarvalians,
        CategoryKey::Reunions,
        CategoryKey::Events,
        CategoryKey::SchoolNews,
        CategoryKey::SchoolDevelopment,
        CategoryKey::HelpSarvailians,
    ];

    /// Machine key sent as the `category` query parameter.
    pub fn slug(self) -> &'static str {
        match self {
            Self::AlumniNews => "alumni-news",
            Self::KnowSarvalians => "know-sarvalians",
            Self::Reunions => "reunions",
            Self::Events => "events",
            Self::SchoolNews => "school-news",
            Self::SchoolDevelopment => "school-development",
            Self::HelpSarvailians => "help-sarvailians",
        }
    }

    /// Chip label.
    pub fn label(self) -> &'static str {
        match self {
            Self::AlumniNews => "Alumni News",
            Self::KnowSarvalians => "Know Sarvalians",
            Self::Reunions => "Reunions",
            Self::Events => "Events",
            Self::SchoolNews => "School News",
            Self::SchoolDevelopment => "School Development",
            Self::HelpSarvailians => "Help Sarvailians",
        }
    }

    /// Look up a category by slug (case-insensitive).
    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.slug().eq_ignore_ascii_case(slug))
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Ordered set of selected categories, in the order the user picked them.
///
/// Empty means "all categories".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    keys: Vec<CategoryKey>,
}

impl CategorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key` if absent, remove it if present. Returns true if it is now selected.
    pub fn toggle(&mut self, key: CategoryKey) -> bool {
        if let Some(pos) = self.keys.iter().position(|k| *k == key) {
            self.keys.remove(pos);
            false
        } else {
            self.keys.push(key);
            true
        }
    }

    pub fn contains(&self, key: CategoryKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[CategoryKey] {
        &self.keys
    }
}

impl FromIterator<CategoryKey> for CategorySelection {
    fn from_iter<I: IntoIterator<Item = CategoryKey>>(iter: I) -> Self {
        let mut selection = Self::new();
        for key in iter {
            if !selection.contains(key) {
                selection.keys.push(key);
            }
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seven_unique_slugs() {
        let mut slugs: Vec<&str> = CategoryKey::ALL.iter().map(|k| k.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), 7);
    }

    #[test]
    fn test_from_slug() {
        assert_eq!(CategoryKey::from_slug("events"), Some(CategoryKey::Events));
        assert_eq!(
            CategoryKey::from_slug(" School-News "),
            Some(CategoryKey::SchoolNews)
        );
        assert_eq!(CategoryKey::from_slug("sports"), None);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut sel = CategorySelection::new();
        assert!(sel.toggle(CategoryKey::Events));
        assert!(sel.toggle(CategoryKey::Reunions));
        assert_eq!(sel.keys(), &[CategoryKey::Events, CategoryKey::Reunions]);
        assert!(!sel.toggle(CategoryKey::Events));
        assert_eq!(sel.keys(), &[CategoryKey::Reunions]);
    }

    #[test]
    fn test_from_iter_drops_duplicates() {
        let sel: CategorySelection = [
            CategoryKey::Events,
            CategoryKey::Events,
            CategoryKey::Reunions,
        ]
        .into_iter()
        .collect();
        assert_eq!(sel.keys(), &[CategoryKey::Events, CategoryKey::Reunions]);
    }
}
