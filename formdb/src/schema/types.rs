use serde::{Deserialize, Serialize};

/// Top-level document type definition, the input to the table compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable schema identifier, used to derive the root table name
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub revision: i32,
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        revision: i32,
        name: impl Into<String>,
        items: Vec<Item>,
    ) -> Self {
        Document {
            id: id.into(),
            revision,
            name: name.into(),
            items,
        }
    }
}

/// A single field of a document. The set of kinds is closed; `Foreign`
/// only ever comes out of deserializing a `type` this crate does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawItem", into = "RawItem")]
pub enum Item {
    Integer(ScalarItem),
    String(StringItem),
    Boolean(ScalarItem),
    Decimal(DecimalItem),
    File(FileItem),
    Section(SectionItem),
    Foreign { kind: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalarItem {
    pub name: String,
    pub optional: bool,
    pub array: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringItem {
    pub name: String,
    pub optional: bool,
    pub array: bool,
    /// `Some(n)` stores the value as `CHAR(n)`, `None` as `TEXT`
    pub length_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecimalItem {
    pub name: String,
    pub optional: bool,
    pub array: bool,
    /// Digits after the decimal point
    pub precision: u32,
}

/// An uploaded file. Always stored in its own table; `array` decides
/// whether a parent may own more than one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileItem {
    pub name: String,
    pub optional: bool,
    pub array: bool,
}

/// A group of nested items, stored in its own table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionItem {
    pub name: String,
    pub optional: bool,
    pub array: bool,
    pub items: Vec<Item>,
}

impl Item {
    pub fn integer(name: impl Into<String>) -> Self {
        Item::Integer(ScalarItem {
            name: name.into(),
            ..Default::default()
        })
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Item::Boolean(ScalarItem {
            name: name.into(),
            ..Default::default()
        })
    }

    pub fn string(name: impl Into<String>) -> Self {
        Item::String(StringItem {
            name: name.into(),
            ..Default::default()
        })
    }

    pub fn fixed_string(name: impl Into<String>, length_limit: u32) -> Self {
        Item::String(StringItem {
            name: name.into(),
            length_limit: Some(length_limit),
            ..Default::default()
        })
    }

    pub fn decimal(name: impl Into<String>, precision: u32) -> Self {
        Item::Decimal(DecimalItem {
            name: name.into(),
            precision,
            ..Default::default()
        })
    }

    pub fn file(name: impl Into<String>) -> Self {
        Item::File(FileItem {
            name: name.into(),
            ..Default::default()
        })
    }

    pub fn section(name: impl Into<String>, items: Vec<Item>) -> Self {
        Item::Section(SectionItem {
            name: name.into(),
            items,
            ..Default::default()
        })
    }

    /// Mark the item as repeating.
    pub fn repeated(mut self) -> Self {
        if let Some((_, array)) = self.flags_mut() {
            *array = true;
        }
        self
    }

    /// Mark the item as optional.
    pub fn optional(mut self) -> Self {
        if let Some((optional, _)) = self.flags_mut() {
            *optional = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Integer(i) | Item::Boolean(i) => &i.name,
            Item::String(i) => &i.name,
            Item::Decimal(i) => &i.name,
            Item::File(i) => &i.name,
            Item::Section(i) => &i.name,
            Item::Foreign { name, .. } => name,
        }
    }

    /// The `type` tag this item serializes with.
    pub fn kind(&self) -> &str {
        match self {
            Item::Integer(_) => "integer",
            Item::String(_) => "string",
            Item::Boolean(_) => "boolean",
            Item::Decimal(_) => "decimal",
            Item::File(_) => "file",
            Item::Section(_) => "section",
            Item::Foreign { kind, .. } => kind,
        }
    }

    fn flags_mut(&mut self) -> Option<(&mut bool, &mut bool)> {
        match self {
            Item::Integer(i) | Item::Boolean(i) => Some((&mut i.optional, &mut i.array)),
            Item::String(i) => Some((&mut i.optional, &mut i.array)),
            Item::Decimal(i) => Some((&mut i.optional, &mut i.array)),
            Item::File(i) => Some((&mut i.optional, &mut i.array)),
            Item::Section(i) => Some((&mut i.optional, &mut i.array)),
            Item::Foreign { .. } => None,
        }
    }
}

/// Wire shape of an item: a flat map keyed by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    optional: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    length_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    items: Vec<Item>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let RawItem {
            kind,
            name,
            optional,
            array,
            length_limit,
            precision,
            items,
        } = raw;

        match kind.to_ascii_lowercase().as_str() {
            "integer" | "int" => Item::Integer(ScalarItem { name, optional, array }),
            "boolean" | "bool" => Item::Boolean(ScalarItem { name, optional, array }),
            "string" | "str" => Item::String(StringItem {
                name,
                optional,
                array,
                length_limit,
            }),
            "decimal" => Item::Decimal(DecimalItem {
                name,
                optional,
                array,
                precision: precision.unwrap_or(0),
            }),
            "file" => Item::File(FileItem { name, optional, array }),
            "section" => Item::Section(SectionItem {
                name,
                optional,
                array,
                items,
            }),
            _ => Item::Foreign { kind, name },
        }
    }
}

impl From<Item> for RawItem {
    fn from(item: Item) -> Self {
        let mut raw = RawItem {
            kind: item.kind().to_string(),
            name: item.name().to_string(),
            optional: false,
            array: false,
            length_limit: None,
            precision: None,
            items: Vec::new(),
        };

        match item {
            Item::Integer(i) | Item::Boolean(i) => {
                raw.optional = i.optional;
                raw.array = i.array;
            }
            Item::String(i) => {
                raw.optional = i.optional;
                raw.array = i.array;
                raw.length_limit = i.length_limit;
            }
            Item::Decimal(i) => {
                raw.optional = i.optional;
                raw.array = i.array;
                raw.precision = Some(i.precision);
            }
            Item::File(i) => {
                raw.optional = i.optional;
                raw.array = i.array;
            }
            Item::Section(i) => {
                raw.optional = i.optional;
                raw.array = i.array;
                raw.items = i.items;
            }
            Item::Foreign { .. } => {}
        }

        raw
    }
}
