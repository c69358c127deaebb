use std::fmt;

/// The two halves of the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Foreign-language feeds, translated before rendering.
    Global,
    /// Chinese-language feeds, rendered as-is.
    Domestic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Global => write!(f, "global"),
            Category::Domestic => write!(f, "domestic"),
        }
    }
}
