use crate::blueprint::{ColumnType, TableBlueprint};
use crate::error::{FormDbError, Result};

/// Renders one table blueprint into one `CREATE TABLE` statement.
///
/// Rendering must be a pure function of the blueprint: columns in insertion
/// order, one deterministically named constraint per foreign key.
pub trait DdlEmitter {
    fn render(&self, table: &TableBlueprint) -> Result<String>;
}

/// Fixed display width for integer columns and total digits for decimals
pub const NUMERIC_WIDTH: u32 = 11;
const MAX_CHAR_LENGTH: u32 = 255;

/// MySQL / InnoDB dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlEmitter {
    pub engine: String,
    pub charset: String,
    pub collation: String,
}

impl Default for MySqlEmitter {
    fn default() -> Self {
        MySqlEmitter {
            engine: "innodb".into(),
            charset: "utf8mb4".into(),
            collation: "utf8mb4_unicode_ci".into(),
        }
    }
}

impl MySqlEmitter {
    fn column_type(&self, table: &TableBlueprint, column_type: ColumnType) -> Result<String> {
        let sql = match column_type {
            ColumnType::Integer => format!("int({NUMERIC_WIDTH})"),
            ColumnType::FixedChar(len) => {
                if len > MAX_CHAR_LENGTH {
                    return Err(render_error(
                        table,
                        format!("char length {len} exceeds {MAX_CHAR_LENGTH}"),
                    ));
                }
                format!("char({len}) COLLATE {}", self.collation)
            }
            ColumnType::Text => format!("text COLLATE {}", self.collation),
            ColumnType::Boolean => "tinyint(1)".to_string(),
            ColumnType::Decimal(precision) => {
                if precision > NUMERIC_WIDTH {
                    return Err(render_error(
                        table,
                        format!("decimal precision {precision} exceeds {NUMERIC_WIDTH} digits"),
                    ));
                }
                format!("decimal({NUMERIC_WIDTH},{precision})")
            }
        };
        Ok(sql)
    }

    fn check_keys(&self, table: &TableBlueprint) -> Result<()> {
        let keyed = table
            .primary_key
            .iter()
            .chain(table.unique_keys.iter().flatten())
            .chain(table.foreign_keys.iter().map(|fk| &fk.column));

        for column in keyed {
            if table.column(column).is_none() {
                return Err(render_error(
                    table,
                    format!("key references unknown column '{column}'"),
                ));
            }
        }
        Ok(())
    }
}

impl DdlEmitter for MySqlEmitter {
    fn render(&self, table: &TableBlueprint) -> Result<String> {
        if table.name.is_empty() {
            return Err(render_error(table, "table name is empty".into()));
        }
        if table.columns.is_empty() {
            return Err(render_error(table, "table has no columns".into()));
        }
        self.check_keys(table)?;

        let mut lines = Vec::with_capacity(table.columns.len() + 1 + table.foreign_keys.len());

        for column in &table.columns {
            let null = if column.nullable { "DEFAULT NULL" } else { "NOT NULL" };
            lines.push(format!(
                "{} {} {}",
                quote(&column.name),
                self.column_type(table, column.column_type)?,
                null
            ));
        }

        if !table.primary_key.is_empty() {
            lines.push(format!("PRIMARY KEY({})", quote_list(&table.primary_key)));
        }

        for unique in &table.unique_keys {
            lines.push(format!(
                "UNIQUE KEY {} ({})",
                quote(&unique.join("_")),
                quote_list(unique)
            ));
        }

        for (i, fk) in table.foreign_keys.iter().enumerate() {
            lines.push(format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                quote(&format!("{}_ibfk_{}", table.name, i + 1)),
                quote(&fk.column),
                quote(&fk.referenced_table),
                quote(&fk.referenced_column)
            ));
        }

        log::debug!("Rendered table '{}' with {} columns", table.name, table.columns.len());

        Ok(format!(
            "CREATE TABLE {}(\n{}\n) ENGINE={} DEFAULT CHARSET={} COLLATE={};",
            quote(&table.name),
            lines.join(",\n"),
            self.engine,
            self.charset,
            self.collation
        ))
    }
}

fn render_error(table: &TableBlueprint, cause: String) -> FormDbError {
    FormDbError::Render {
        table: table.name.clone(),
        cause,
    }
}

fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn quote_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}
