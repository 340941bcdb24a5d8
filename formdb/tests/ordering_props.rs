//! Property tests for the table compiler.
//!
//! Random document trees (sections nested up to five levels) are compiled to
//! SQL, and the rendered text is checked directly: a table referenced by a
//! foreign key must be created before the table that references it.

use formdb::schema::{Document, Item};
use formdb::{compile, Compiler, FormDbError};
use proptest::prelude::*;
use regex::Regex;

fn field_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}( [a-z]{1,4})?"
}

fn leaf_item() -> impl Strategy<Value = Item> {
    (field_name(), 0..5u8, any::<bool>(), any::<bool>(), 1u32..100, 0u32..8).prop_map(
        |(name, kind, optional, array, len, precision)| {
            let item = match kind {
                0 => Item::integer(name),
                1 => Item::boolean(name),
                2 if len % 2 == 0 => Item::fixed_string(name, len),
                2 => Item::string(name),
                3 => Item::decimal(name, precision),
                _ => Item::file(name),
            };
            let item = if optional { item.optional() } else { item };
            if array {
                item.repeated()
            } else {
                item
            }
        },
    )
}

fn item_tree() -> impl Strategy<Value = Item> {
    leaf_item().prop_recursive(5, 64, 6, |inner| {
        (field_name(), any::<bool>(), prop::collection::vec(inner, 0..6)).prop_map(
            |(name, array, items)| {
                let section = Item::section(name, items);
                if array {
                    section.repeated()
                } else {
                    section
                }
            },
        )
    })
}

fn document() -> impl Strategy<Value = Document> {
    ("[0-9a-f]{8}", 1i32..5, prop::collection::vec(item_tree(), 0..8))
        .prop_map(|(id, revision, items)| Document::new(id, revision, "generated", items))
}

/// (table name, referenced tables) per statement, in emission order
fn parse_statements(sql: &str) -> Vec<(String, Vec<String>)> {
    let create = Regex::new(r"^CREATE TABLE `([^`]+)`\(").unwrap();
    let references = Regex::new(r"REFERENCES `([^`]+)`").unwrap();

    sql.split("\n\n")
        .filter(|s| !s.is_empty())
        .map(|statement| {
            let name = create
                .captures(statement)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| panic!("Not a CREATE TABLE statement: {statement}"));
            let refs = references
                .captures_iter(statement)
                .map(|c| c[1].to_string())
                .collect();
            (name, refs)
        })
        .collect()
}

fn bury(item: Item, depth: usize) -> Item {
    (0..depth).fold(item, |inner, level| {
        Item::section(format!("level {level}"), vec![inner])
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn referenced_tables_are_created_first(doc in document()) {
        let sql = compile(&doc).unwrap();
        let statements = parse_statements(&sql);

        for (pos, (table, refs)) in statements.iter().enumerate() {
            for target in refs {
                let first = statements.iter().position(|(name, _)| name == target);
                prop_assert!(
                    matches!(first, Some(p) if p < pos),
                    "{} references {} which is not created before it",
                    table,
                    target
                );
            }
        }
    }

    #[test]
    fn every_blueprint_is_emitted_once_root_first(doc in document()) {
        let compiler = Compiler::default();
        let decomposition = compiler.decompose(&doc).unwrap();
        let statements = parse_statements(&compiler.compile(&doc).unwrap());

        prop_assert_eq!(statements.len(), decomposition.table_count());
        prop_assert_eq!(&statements[0].0, &format!("data_{}_r{}", doc.id, doc.revision));
        prop_assert!(statements[0].1.is_empty());
        for (_, refs) in &statements[1..] {
            prop_assert_eq!(refs.len(), 1);
        }
    }

    #[test]
    fn compile_is_idempotent(doc in document()) {
        prop_assert_eq!(compile(&doc).unwrap(), compile(&doc).unwrap());
    }

    #[test]
    fn foreign_item_anywhere_fails(
        doc in document(),
        depth in 0usize..5,
        at in any::<prop::sample::Index>(),
    ) {
        let mut doc = doc;
        let foreign = Item::Foreign { kind: "signature".into(), name: "signed by".into() };
        let index = at.index(doc.items.len() + 1);
        doc.items.insert(index, bury(foreign, depth));

        let result = compile(&doc);
        prop_assert!(
            matches!(
                result,
                Err(FormDbError::UnrecognizedItemKind { ref name, .. }) if name == "signed by"
            ),
            "expected UnrecognizedItemKind, got {:?}",
            result
        );
    }
}
