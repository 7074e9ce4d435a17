//! Aggregation and incremental renumbering.
//!
//! Aggregation concatenates each table's rows across documents in scan
//! order, never reordering, filtering or deduplicating. The allocator then
//! assigns a contiguous block of sequence numbers continuing from the
//! master's tracked maximum.

use crate::domain::{
    ConsolidationBatch, Row, SequenceRange, SourceDocument, TableBatch, TableKind, TableMap,
    TABLE_KINDS,
};

/// Drain one table kind from every document, preserving document order and
/// intra-document row order.
pub fn aggregate(docs: &mut [SourceDocument], kind: TableKind) -> Vec<Row> {
    let mut rows = Vec::new();
    for doc in docs {
        rows.append(&mut doc.tables[kind]);
    }
    rows
}

/// Assign `last + 1, last + 2, ...` in sequence order, mutating rows in
/// place. Returns the assigned inclusive range, or `None` for no rows.
pub fn renumber(rows: &mut [Row], last: u64) -> Option<SequenceRange> {
    if rows.is_empty() {
        return None;
    }
    let mut next = last + 1;
    for row in rows.iter_mut() {
        row.seq = next;
        next += 1;
    }
    tracing::debug!(
        count = rows.len(),
        first = last + 1,
        last = next - 1,
        "rows renumbered"
    );
    Some(SequenceRange { first: last + 1, last: next - 1 })
}

/// Aggregate and renumber all three tables, consuming the documents.
pub fn build_batch(
    mut docs: Vec<SourceDocument>,
    last_sequences: &TableMap<u64>,
) -> ConsolidationBatch {
    let mut batch = ConsolidationBatch::default();
    for kind in TABLE_KINDS {
        let mut rows = aggregate(&mut docs, kind);
        let range = renumber(&mut rows, last_sequences[kind]);
        batch.tables[kind] = TableBatch { rows, range };
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;
    use std::path::PathBuf;

    fn doc(name: &str, prospects: &[&str]) -> SourceDocument {
        let mut tables: TableMap<Vec<Row>> = TableMap::default();
        tables[TableKind::Prospects] = prospects
            .iter()
            .map(|v| Row::new(vec![FieldValue::Text(v.to_string())]))
            .collect();
        SourceDocument { path: PathBuf::from(name), tables }
    }

    fn first_field(row: &Row) -> &str {
        match &row.fields[0] {
            FieldValue::Text(s) => s,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_preserves_scan_and_row_order() {
        let mut docs = vec![doc("a", &["a1", "a2"]), doc("b", &[]), doc("c", &["c1"])];
        let rows = aggregate(&mut docs, TableKind::Prospects);
        let order: Vec<&str> = rows.iter().map(first_field).collect();
        assert_eq!(order, vec!["a1", "a2", "c1"]);
    }

    #[test]
    fn test_renumber_is_contiguous_from_last() {
        let mut rows: Vec<Row> =
            (0..4).map(|i| Row::new(vec![FieldValue::Text(format!("r{i}"))])).collect();
        let range = renumber(&mut rows, 17).unwrap();
        assert_eq!(range, SequenceRange { first: 18, last: 21 });
        let assigned: Vec<u64> = rows.iter().map(|r| r.seq).collect();
        assert_eq!(assigned, vec![18, 19, 20, 21]);
    }

    #[test]
    fn test_renumber_empty_is_none() {
        let mut rows: Vec<Row> = Vec::new();
        assert_eq!(renumber(&mut rows, 5), None);
    }

    #[test]
    fn test_build_batch_tracks_independent_sequences() {
        let mut d1 = doc("a", &["p1"]);
        d1.tables[TableKind::Planning].push(Row::new(vec![FieldValue::Empty]));
        d1.tables[TableKind::Planning].push(Row::new(vec![FieldValue::Empty]));
        let docs = vec![d1, doc("b", &["p2", "p3"])];

        let mut last: TableMap<u64> = TableMap::default();
        last[TableKind::Prospects] = 100;
        last[TableKind::Planning] = 7;

        let batch = build_batch(docs, &last);
        assert_eq!(
            batch.tables[TableKind::Prospects].range,
            Some(SequenceRange { first: 101, last: 103 })
        );
        assert_eq!(
            batch.tables[TableKind::Planning].range,
            Some(SequenceRange { first: 8, last: 9 })
        );
        assert_eq!(batch.tables[TableKind::WeeklyActivity].range, None);
        assert!(batch.tables[TableKind::WeeklyActivity].rows.is_empty());
    }
}
