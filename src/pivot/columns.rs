//! Station column ordering.
//!
//! Stations are sorted by descending failure total with a stable sort, so
//! equal totals keep their prior relative order and labels never influence
//! the result. Grand Total is appended last and is never a sort candidate.

use crate::models::{ColumnKey, PivotTable};
use std::cmp::Reverse;
use tracing::debug;

/// Column sequence for rendering: stations by descending total, then
/// Grand Total
pub fn order_columns(table: &PivotTable) -> Vec<ColumnKey> {
    station_order(table)
        .into_iter()
        .map(|i| ColumnKey::Station(table.stations[i].clone()))
        .chain(std::iter::once(ColumnKey::GrandTotal))
        .collect()
}

/// Current station indices sorted by descending total
fn station_order(table: &PivotTable) -> Vec<usize> {
    let totals = table.station_totals();
    let mut order: Vec<usize> = (0..table.stations.len()).collect();
    order.sort_by_key(|&i| Reverse(totals[i]));

    debug!(
        "Station totals (sorted): {:?}",
        order
            .iter()
            .take(10)
            .map(|&i| (&table.stations[i], totals[i]))
            .collect::<Vec<_>>()
    );
    order
}

/// Lay the table's station cells out in the given column order
pub fn apply_column_order(mut table: PivotTable, columns: &[ColumnKey]) -> PivotTable {
    let order: Vec<usize> = columns
        .iter()
        .filter_map(|key| match key {
            ColumnKey::Station(name) => table.station_index(name),
            ColumnKey::GrandTotal => None,
        })
        .collect();

    if order.len() != table.stations.len() {
        debug!(
            "Column order names {} of {} stations; keeping current layout",
            order.len(),
            table.stations.len()
        );
        return table;
    }

    table.stations = order.iter().map(|&i| table.stations[i].clone()).collect();
    for group in &mut table.groups {
        for row in group
            .models
            .iter_mut()
            .chain(std::iter::once(&mut group.total))
        {
            row.cells = order.iter().map(|&i| row.cells[i]).collect();
        }
    }
    table
}
