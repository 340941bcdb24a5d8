use crate::error::Result;
use super::types::Document;
use std::path::Path;

/// Parse a schema file into a Document. `.json` files are read as JSON,
/// everything else as YAML.
pub fn parse_schema(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        parse_schema_json(&content)
    } else {
        parse_schema_str(&content)
    }
}

/// Parse a schema YAML string into a Document
pub fn parse_schema_str(content: &str) -> Result<Document> {
    let doc: Document = serde_yaml::from_str(content)?;
    Ok(doc)
}

/// Parse a schema JSON string into a Document
pub fn parse_schema_json(content: &str) -> Result<Document> {
    let doc: Document = serde_json::from_str(content)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Item;
    use std::io::Write;

    const INVOICE: &str = r#"
id: 733bee1b-f79a-4cb7-b675-842317b994b5
revision: 1
name: invoice
items:
  - { type: integer, name: qty }
  - { type: string, name: "inv no", length_limit: 6 }
  - { type: file, name: attachment }
  - { type: boolean, name: isMandatory }
  - { type: decimal, name: "total price", precision: 2 }
  - type: section
    name: items
    array: true
    items:
      - { type: string, name: description }
      - { type: integer, name: qty }
      - { type: decimal, name: "unit price" }
"#;

    #[test]
    fn test_parse_yaml_document() {
        let doc = parse_schema_str(INVOICE).unwrap();
        assert_eq!(doc.name, "invoice");
        assert_eq!(doc.revision, 1);
        assert_eq!(doc.items.len(), 6);
        assert_eq!(doc.items[1], Item::fixed_string("inv no", 6));
        assert_eq!(doc.items[4], Item::decimal("total price", 2));

        match &doc.items[5] {
            Item::Section(section) => {
                assert!(section.array);
                assert_eq!(section.items.len(), 3);
                assert_eq!(section.items[2], Item::decimal("unit price", 0));
            }
            other => panic!("Expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_becomes_foreign() {
        let doc = parse_schema_str(
            r#"
name: survey
items:
  - { type: date, name: signed_on }
"#,
        )
        .unwrap();
        assert_eq!(
            doc.items[0],
            Item::Foreign {
                kind: "date".into(),
                name: "signed_on".into()
            }
        );
    }

    #[test]
    fn test_kind_aliases_and_flags() {
        let doc = parse_schema_str(
            r#"
name: flags
items:
  - { type: int, name: a, optional: true }
  - { type: bool, name: b, array: true }
  - { type: STR, name: c }
"#,
        )
        .unwrap();
        assert_eq!(doc.items[0], Item::integer("a").optional());
        assert_eq!(doc.items[1], Item::boolean("b").repeated());
        assert_eq!(doc.items[2], Item::string("c"));
    }

    #[test]
    fn test_parse_json_matches_yaml() {
        let yaml = parse_schema_str(INVOICE).unwrap();
        let json = serde_json::to_string(&yaml).unwrap();
        assert_eq!(parse_schema_json(&json).unwrap(), yaml);
    }

    #[test]
    fn test_parse_schema_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.json");
        let json = serde_json::to_string(&parse_schema_str(INVOICE).unwrap()).unwrap();
        std::fs::File::create(&path)
            .unwrap()
            .write_all(json.as_bytes())
            .unwrap();

        let doc = parse_schema(&path).unwrap();
        assert_eq!(doc.id, "733bee1b-f79a-4cb7-b675-842317b994b5");
    }

    #[test]
    fn test_missing_name_is_error() {
        assert!(parse_schema_str("items: []").is_err());
    }
}
