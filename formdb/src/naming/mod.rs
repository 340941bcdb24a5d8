//! Identifier policies for generated tables and columns.
//!
//! The decomposition engine only talks to [`NamingStrategy`], so a policy can
//! be swapped (for example to fit a dialect's identifier length limit)
//! without touching the table layout logic.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maps schema positions to table and column identifiers.
pub trait NamingStrategy {
    /// Name of the table holding the document's top-level fields.
    fn root_table(&self, schema_id: &str, revision: i32) -> String;

    /// Name of a table owned by `owner`. `path` is the joined chain of
    /// ancestor section segments (empty at the top level).
    fn child_table(&self, owner: &str, path: &str, name: &str) -> String;

    /// A field name as it appears inside table names and section paths.
    fn path_segment(&self, name: &str) -> String;

    /// A field name as a column identifier.
    fn column(&self, name: &str) -> String;
}

/// How field names are turned into column identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNaming {
    /// Use the field name verbatim (quoted by the emitter)
    #[default]
    Raw,
    /// Replace spaces with underscores
    Underscore,
}

/// `data_<id>_r<revision>` for the root, `<owner>[_<path>]_<name>` below it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNaming {
    pub columns: ColumnNaming,
}

impl DefaultNaming {
    pub fn new(columns: ColumnNaming) -> Self {
        DefaultNaming { columns }
    }
}

impl NamingStrategy for DefaultNaming {
    fn root_table(&self, schema_id: &str, revision: i32) -> String {
        format!("data_{schema_id}_r{revision}")
    }

    fn child_table(&self, owner: &str, path: &str, name: &str) -> String {
        let segment = self.path_segment(name);
        if path.is_empty() {
            format!("{owner}_{segment}")
        } else {
            format!("{owner}_{path}_{segment}")
        }
    }

    fn path_segment(&self, name: &str) -> String {
        name.replace(' ', "-")
    }

    fn column(&self, name: &str) -> String {
        match self.columns {
            ColumnNaming::Raw => name.to_string(),
            ColumnNaming::Underscore => name.replace(' ', "_"),
        }
    }
}

/// Wraps another strategy and shortens table names longer than `max_len`.
///
/// A shortened name keeps as many leading characters as fit, followed by
/// `_` and the first 16 hex digits of the full name's SHA-256. Published
/// DDL stores these names, so the digest must not depend on the toolchain.
#[derive(Debug, Clone)]
pub struct HashedNaming<N> {
    inner: N,
    max_len: usize,
}

const HASH_SUFFIX_LEN: usize = 17;

impl<N: NamingStrategy> HashedNaming<N> {
    pub fn new(inner: N, max_len: usize) -> Self {
        HashedNaming {
            inner,
            max_len: max_len.max(HASH_SUFFIX_LEN + 1),
        }
    }

    fn shorten(&self, name: String) -> String {
        if name.chars().count() <= self.max_len {
            return name;
        }

        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        let digest = hex::encode(hasher.finalize());

        let prefix: String = name.chars().take(self.max_len - HASH_SUFFIX_LEN).collect();
        let short = format!("{prefix}_{}", &digest[..HASH_SUFFIX_LEN - 1]);
        log::warn!(
            "Identifier '{}' exceeds {} characters, using '{}'",
            name,
            self.max_len,
            short
        );
        short
    }
}

impl<N: NamingStrategy> NamingStrategy for HashedNaming<N> {
    fn root_table(&self, schema_id: &str, revision: i32) -> String {
        self.shorten(self.inner.root_table(schema_id, revision))
    }

    fn child_table(&self, owner: &str, path: &str, name: &str) -> String {
        self.shorten(self.inner.child_table(owner, path, name))
    }

    fn path_segment(&self, name: &str) -> String {
        self.inner.path_segment(name)
    }

    fn column(&self, name: &str) -> String {
        self.shorten(self.inner.column(name))
    }
}

/// Append a section segment to an ancestor path.
pub fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}_{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_table_name() {
        let naming = DefaultNaming::default();
        assert_eq!(naming.root_table("abc", 3), "data_abc_r3");
    }

    #[test]
    fn test_child_table_without_path() {
        let naming = DefaultNaming::default();
        assert_eq!(
            naming.child_table("data_abc_r1", "", "unit price"),
            "data_abc_r1_unit-price"
        );
    }

    #[test]
    fn test_child_table_with_path() {
        let naming = DefaultNaming::default();
        let path = join_path(&join_path("", &naming.path_segment("line items")), "tax");
        assert_eq!(path, "line-items_tax");
        assert_eq!(
            naming.child_table("data_abc_r1_line-items_tax", &path, "rates"),
            "data_abc_r1_line-items_tax_line-items_tax_rates"
        );
    }

    #[test]
    fn test_column_policies() {
        assert_eq!(DefaultNaming::new(ColumnNaming::Raw).column("inv no"), "inv no");
        assert_eq!(
            DefaultNaming::new(ColumnNaming::Underscore).column("inv no"),
            "inv_no"
        );
    }

    #[test]
    fn test_hashed_naming_keeps_short_names() {
        let naming = HashedNaming::new(DefaultNaming::default(), 64);
        assert_eq!(naming.root_table("abc", 1), "data_abc_r1");
    }

    #[test]
    fn test_hashed_naming_shortens_long_names() {
        let naming = HashedNaming::new(DefaultNaming::default(), 40);
        let owner = "data_733bee1b-f79a-4cb7-b675-842317b994b5_r1";
        let a = naming.child_table(owner, "", "attachment");
        let b = naming.child_table(owner, "", "attachments");

        assert_eq!(a.chars().count(), 40);
        assert!(a.starts_with("data_733bee1b-f79a-4cb"));
        assert_ne!(a, b);
        assert_eq!(a, naming.child_table(owner, "", "attachment"));
    }

    #[test]
    fn test_hashed_name_is_pinned() {
        let naming = HashedNaming::new(DefaultNaming::default(), 40);
        let owner = "data_733bee1b-f79a-4cb7-b675-842317b994b5_r1";
        assert_eq!(
            naming.child_table(owner, "", "attachment"),
            "data_733bee1b-f79a-4cb7_faefa37eb9e53e8b"
        );
    }
}
