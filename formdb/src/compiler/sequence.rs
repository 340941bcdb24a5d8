use crate::blueprint::TableBlueprint;
use crate::ddl::DdlEmitter;
use crate::error::{FormDbError, Result};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Order tables so that every table comes after each table it references.
///
/// `children` is expected in post-order (a container after everything it
/// contributes). The preferred order is the root followed by `children`
/// back to front; a Kahn topological sort over the foreign-key edges,
/// breaking ties by that preferred position, returns exactly the preferred
/// order whenever it is already valid. References to tables outside the set
/// are ignored.
pub fn emission_order<'a>(
    root: &'a TableBlueprint,
    children: &'a [TableBlueprint],
) -> Result<Vec<&'a TableBlueprint>> {
    let preferred: Vec<&TableBlueprint> = std::iter::once(root)
        .chain(children.iter().rev())
        .collect();

    // Duplicate names resolve to the earliest table in preferred order
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for (i, table) in preferred.iter().enumerate() {
        index_of.entry(table.name.as_str()).or_insert(i);
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); preferred.len()];
    let mut pending = vec![0usize; preferred.len()];
    for (i, table) in preferred.iter().enumerate() {
        for target in table.referenced_tables() {
            match index_of.get(target) {
                Some(&t) if t != i => {
                    dependents[t].push(i);
                    pending[i] += 1;
                }
                _ => {}
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut ordered = Vec::with_capacity(preferred.len());
    while let Some(Reverse(i)) = ready.pop() {
        ordered.push(preferred[i]);
        for &dependent in &dependents[i] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if ordered.len() < preferred.len() {
        let stuck: Vec<&str> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(i, _)| preferred[i].name.as_str())
            .collect();
        return Err(FormDbError::DependencyCycle(stuck.join(", ")));
    }

    Ok(ordered)
}

/// Render the root and its descendant tables into one SQL script, each
/// statement followed by a blank line.
pub fn sequence(
    root: &TableBlueprint,
    children: &[TableBlueprint],
    emitter: &dyn DdlEmitter,
) -> Result<String> {
    let mut sql = String::new();
    for table in emission_order(root, children)? {
        sql.push_str(&emitter.render(table)?);
        sql.push_str("\n\n");
    }
    Ok(sql)
}
