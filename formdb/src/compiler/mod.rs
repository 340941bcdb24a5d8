//! Document schema to relational schema compiler.
//!
//! Scalar fields become columns of the table that owns them. Repeated
//! scalars, files and sections each get a child table keyed by `id` and
//! linked to the owner through `parent_id`. Child tables are collected in
//! post-order and emitted back to front, so a table is always created
//! after the table its foreign key points at.

mod sequence;

pub use sequence::{emission_order, sequence};

use crate::blueprint::{
    ColumnType, TableBlueprint, FILENAME_COLUMN, FILENAME_LENGTH, FILEPATH_COLUMN,
    PARENT_ID_COLUMN, VALUE_COLUMN,
};
use crate::config::CompilerConfig;
use crate::ddl::{DdlEmitter, MySqlEmitter};
use crate::error::{FormDbError, Result};
use crate::naming::{join_path, DefaultNaming, HashedNaming, NamingStrategy};
use crate::schema::{Document, Item, StringItem};

/// The tables a document decomposes into.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub root: TableBlueprint,
    /// Descendant tables in post-order, in field declaration order
    pub children: Vec<TableBlueprint>,
}

impl Decomposition {
    /// All tables, root first, then children in post-order.
    pub fn tables(&self) -> Vec<&TableBlueprint> {
        std::iter::once(&self.root).chain(self.children.iter()).collect()
    }

    pub fn table_count(&self) -> usize {
        1 + self.children.len()
    }
}

/// Compiles documents with a fixed naming policy and SQL dialect.
pub struct Compiler {
    naming: Box<dyn NamingStrategy + Send + Sync>,
    emitter: Box<dyn DdlEmitter + Send + Sync>,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(DefaultNaming::default(), MySqlEmitter::default())
    }
}

impl Compiler {
    pub fn new(
        naming: impl NamingStrategy + Send + Sync + 'static,
        emitter: impl DdlEmitter + Send + Sync + 'static,
    ) -> Self {
        Compiler {
            naming: Box::new(naming),
            emitter: Box::new(emitter),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        let naming = DefaultNaming::new(config.naming.columns);
        let emitter = MySqlEmitter {
            engine: config.mysql.engine.clone(),
            charset: config.mysql.charset.clone(),
            collation: config.mysql.collation.clone(),
        };

        match config.naming.max_identifier_len {
            Some(max_len) => Compiler::new(HashedNaming::new(naming, max_len), emitter),
            None => Compiler::new(naming, emitter),
        }
    }

    pub fn decompose(&self, doc: &Document) -> Result<Decomposition> {
        decompose(doc, self.naming.as_ref())
    }

    /// Produce the `CREATE TABLE` script for a document. Nothing is returned
    /// unless every table decomposes and renders.
    pub fn compile(&self, doc: &Document) -> Result<String> {
        let decomposition = self.decompose(doc)?;
        sequence(
            &decomposition.root,
            &decomposition.children,
            self.emitter.as_ref(),
        )
    }
}

/// Compile with the default naming policy and the MySQL dialect.
pub fn compile(doc: &Document) -> Result<String> {
    Compiler::default().compile(doc)
}

/// Split a document into its root table and descendant tables.
pub fn decompose(doc: &Document, naming: &dyn NamingStrategy) -> Result<Decomposition> {
    let mut root = TableBlueprint::keyed(naming.root_table(&doc.id, doc.revision));
    let children = decompose_items(&doc.items, &mut root, &Scope::default(), naming)?;

    log::debug!(
        "Decomposed schema '{}' r{} into {} tables",
        doc.name,
        doc.revision,
        children.len() + 1
    );

    Ok(Decomposition { root, children })
}

/// Where an item sits below the root.
#[derive(Default)]
struct Scope {
    /// Sanitized section segments joined with `_`, used in table names
    path: String,
    /// Raw section names joined with `/`, used in error reports
    trail: String,
}

impl Scope {
    fn enter(&self, section: &str, naming: &dyn NamingStrategy) -> Scope {
        let trail = if self.trail.is_empty() {
            section.to_string()
        } else {
            format!("{}/{section}", self.trail)
        };
        Scope {
            path: join_path(&self.path, &naming.path_segment(section)),
            trail,
        }
    }
}

fn decompose_items(
    items: &[Item],
    owner: &mut TableBlueprint,
    scope: &Scope,
    naming: &dyn NamingStrategy,
) -> Result<Vec<TableBlueprint>> {
    let mut tables = Vec::new();
    for item in items {
        tables.extend(decompose_item(item, owner, scope, naming)?);
    }
    Ok(tables)
}

/// Place one item: either a column on `owner`, or the tables it needs,
/// returned with the item's own table last.
fn decompose_item(
    item: &Item,
    owner: &mut TableBlueprint,
    scope: &Scope,
    naming: &dyn NamingStrategy,
) -> Result<Vec<TableBlueprint>> {
    let path = scope.path.as_str();
    match item {
        Item::Integer(i) => {
            let field = Field::new(&i.name, ColumnType::Integer, i.optional, i.array);
            scalar(owner, path, naming, field)
        }
        Item::Boolean(i) => {
            let field = Field::new(&i.name, ColumnType::Boolean, i.optional, i.array);
            scalar(owner, path, naming, field)
        }
        Item::String(i) => {
            let field = Field::new(&i.name, string_type(i), i.optional, i.array);
            scalar(owner, path, naming, field)
        }
        Item::Decimal(i) => {
            let field = Field::new(&i.name, ColumnType::Decimal(i.precision), i.optional, i.array);
            scalar(owner, path, naming, field)
        }
        Item::File(file) => {
            let name = naming.child_table(&owner.name, path, &file.name);
            let mut table = TableBlueprint::child_of(name, owner);
            table.add_column(FILENAME_COLUMN, ColumnType::FixedChar(FILENAME_LENGTH), false);
            table.add_column(FILEPATH_COLUMN, ColumnType::Text, false);
            if !file.array {
                table.add_unique_key(&[PARENT_ID_COLUMN]);
            }
            Ok(vec![table])
        }
        Item::Section(section) => {
            let name = naming.child_table(&owner.name, path, &section.name);
            let mut table = TableBlueprint::child_of(name, owner);
            let inner = scope.enter(&section.name, naming);

            let mut tables = decompose_items(&section.items, &mut table, &inner, naming)?;
            if !section.array {
                table.add_unique_key(&[PARENT_ID_COLUMN]);
            }
            tables.push(table);
            Ok(tables)
        }
        Item::Foreign { kind, name } => Err(FormDbError::UnrecognizedItemKind {
            path: scope.trail.clone(),
            name: name.clone(),
            kind: kind.clone(),
        }),
    }
}

/// The parts of a scalar item that decide where it is stored.
struct Field<'a> {
    name: &'a str,
    column_type: ColumnType,
    optional: bool,
    array: bool,
}

impl<'a> Field<'a> {
    fn new(name: &'a str, column_type: ColumnType, optional: bool, array: bool) -> Self {
        Field {
            name,
            column_type,
            optional,
            array,
        }
    }
}

/// A scalar is a column on its owner, unless it repeats, in which case it
/// gets a `value` table of its own.
fn scalar(
    owner: &mut TableBlueprint,
    path: &str,
    naming: &dyn NamingStrategy,
    field: Field<'_>,
) -> Result<Vec<TableBlueprint>> {
    if !field.array {
        owner.add_column(naming.column(field.name), field.column_type, field.optional);
        return Ok(Vec::new());
    }

    let name = naming.child_table(&owner.name, path, field.name);
    let mut table = TableBlueprint::child_of(name, owner);
    table.add_column(VALUE_COLUMN, field.column_type, field.optional);
    Ok(vec![table])
}

fn string_type(item: &StringItem) -> ColumnType {
    match item.length_limit {
        Some(len) => ColumnType::FixedChar(len),
        None => ColumnType::Text,
    }
}
