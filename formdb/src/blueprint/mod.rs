use serde::Serialize;

/// Primary key column present in every generated table
pub const ID_COLUMN: &str = "id";
/// Column linking a child row to its owner's `id`
pub const PARENT_ID_COLUMN: &str = "parent_id";
/// Column holding the item of a repeated scalar field
pub const VALUE_COLUMN: &str = "value";
pub const FILENAME_COLUMN: &str = "filename";
pub const FILEPATH_COLUMN: &str = "filepath";

/// Row identifiers are UUID strings
pub const ID_LENGTH: u32 = 36;
pub const FILENAME_LENGTH: u32 = 200;

/// Logical column type, independent of any SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "size", rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    FixedChar(u32),
    Text,
    Boolean,
    /// Digits after the decimal point
    Decimal(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// In-memory description of one table, before it is rendered to SQL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TableBlueprint {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub unique_keys: Vec<Vec<String>>,
}

impl TableBlueprint {
    pub fn new(name: impl Into<String>) -> Self {
        TableBlueprint {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A table keyed by `id`, with nothing else in it yet.
    pub fn keyed(name: impl Into<String>) -> Self {
        let mut table = TableBlueprint::new(name);
        table.add_column(ID_COLUMN, ColumnType::FixedChar(ID_LENGTH), false);
        table.add_primary_key(&[ID_COLUMN]);
        table
    }

    /// A keyed table whose `parent_id` references `parent`'s `id`.
    pub fn child_of(name: impl Into<String>, parent: &TableBlueprint) -> Self {
        let mut table = TableBlueprint::new(name);
        table.add_column(ID_COLUMN, ColumnType::FixedChar(ID_LENGTH), false);
        table.add_column(PARENT_ID_COLUMN, ColumnType::FixedChar(ID_LENGTH), false);
        table.add_primary_key(&[ID_COLUMN]);
        table.add_foreign_key(PARENT_ID_COLUMN, &parent.name, ID_COLUMN);
        table
    }

    pub fn add_column(&mut self, name: impl Into<String>, column_type: ColumnType, nullable: bool) {
        self.columns.push(Column {
            name: name.into(),
            column_type,
            nullable,
        });
    }

    pub fn add_primary_key(&mut self, columns: &[&str]) {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
    }

    pub fn add_foreign_key(
        &mut self,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        });
    }

    pub fn add_unique_key(&mut self, columns: &[&str]) {
        self.unique_keys
            .push(columns.iter().map(|c| c.to_string()).collect());
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Tables this one holds a foreign key into, in declaration order.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys.iter().map(|fk| fk.referenced_table.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_table() {
        let table = TableBlueprint::keyed("data_x_r1");
        assert_eq!(table.column_names(), vec!["id"]);
        assert_eq!(table.primary_key, vec!["id"]);
        assert!(table.foreign_keys.is_empty());

        let id = table.column("id").unwrap();
        assert_eq!(id.column_type, ColumnType::FixedChar(36));
        assert!(!id.nullable);
    }

    #[test]
    fn test_child_table_links_to_parent() {
        let root = TableBlueprint::keyed("data_x_r1");
        let child = TableBlueprint::child_of("data_x_r1_tags", &root);

        assert_eq!(child.column_names(), vec!["id", "parent_id"]);
        assert!(!child.column("parent_id").unwrap().nullable);
        assert_eq!(
            child.foreign_keys,
            vec![ForeignKey {
                column: "parent_id".into(),
                referenced_table: "data_x_r1".into(),
                referenced_column: "id".into(),
            }]
        );
        assert_eq!(child.referenced_tables().collect::<Vec<_>>(), vec!["data_x_r1"]);
    }

    #[test]
    fn test_unique_keys_accumulate() {
        let mut table = TableBlueprint::keyed("t");
        table.add_column("a", ColumnType::Integer, true);
        table.add_unique_key(&["a"]);
        table.add_unique_key(&["id", "a"]);
        assert_eq!(table.unique_keys.len(), 2);
        assert_eq!(table.unique_keys[1], vec!["id", "a"]);
    }
}
