//! Heat-map tier ranking.
//!
//! Three maximum designations are computed independently over model-row
//! cells: red for the global maximum, orange for each group's maximum and
//! yellow for the maximum among each group's top models. Total rows and the
//! Grand Total column never take part. Zero counts are never highlighted;
//! every cell tied at a maximum receives the tier. Where tiers overlap the
//! higher one wins (red > orange > yellow).

use crate::config::{HighlightConfig, YellowScope};
use crate::models::{PivotGroup, PivotRow, PivotTable, Tier};
use std::cmp::Reverse;
use tracing::debug;

/// Annotate every model-row cell with its heat-map tier
pub fn rank(mut table: PivotTable, config: &HighlightConfig) -> PivotTable {
    for group in &mut table.groups {
        for row in group.models.iter_mut().chain(std::iter::once(&mut group.total)) {
            for cell in &mut row.cells {
                cell.tier = Tier::None;
            }
        }
    }

    let global_max = max_count(table.groups.iter().flat_map(|g| g.models.iter()));

    for group in &mut table.groups {
        mark_yellow(group, config);

        let group_max = max_count(group.models.iter());
        if let Some(max) = group_max {
            mark_rows(group.models.iter_mut(), max, Tier::Orange);
        }

        if let Some(max) = global_max {
            mark_rows(group.models.iter_mut(), max, Tier::Red);
        }
    }

    debug!(
        "Ranked pivot: {} red, {} orange, {} yellow cells",
        count_tier(&table, Tier::Red),
        count_tier(&table, Tier::Orange),
        count_tier(&table, Tier::Yellow)
    );
    table
}

/// Indices of the group's leading models by Grand Total, ties in row order
pub fn top_model_indices(group: &PivotGroup, top_models: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..group.models.len()).collect();
    indices.sort_by_key(|&i| Reverse(group.models[i].grand_total));
    indices.truncate(top_models);
    indices
}

fn mark_yellow(group: &mut PivotGroup, config: &HighlightConfig) {
    let top = top_model_indices(group, config.top_models);

    match config.yellow_scope {
        YellowScope::Slice => {
            let slice_max = max_count(top.iter().map(|&i| &group.models[i]));
            if let Some(max) = slice_max {
                mark_rows(
                    group
                        .models
                        .iter_mut()
                        .enumerate()
                        .filter(|(i, _)| top.contains(i))
                        .map(|(_, row)| row),
                    max,
                    Tier::Yellow,
                );
            }
        }
        YellowScope::PerModelRow => {
            for &i in &top {
                let row = &mut group.models[i];
                if let Some(max) = max_count(std::iter::once(&*row)) {
                    mark_rows(std::iter::once(row), max, Tier::Yellow);
                }
            }
        }
    }
}

/// Highest positive count among the rows' station cells
fn max_count<'a>(rows: impl Iterator<Item = &'a PivotRow>) -> Option<u64> {
    rows.flat_map(|row| row.counts())
        .max()
        .filter(|&max| max > 0)
}

/// Raise every cell equal to `max` to at least `tier`
fn mark_rows<'a>(rows: impl Iterator<Item = &'a mut PivotRow>, max: u64, tier: Tier) {
    for row in rows {
        for cell in &mut row.cells {
            if cell.count == max {
                cell.tier = cell.tier.max(tier);
            }
        }
    }
}

/// Number of cells carrying exactly `tier`
pub fn count_tier(table: &PivotTable, tier: Tier) -> usize {
    table
        .groups
        .iter()
        .flat_map(|g| g.rows())
        .flat_map(|r| r.cells.iter())
        .filter(|c| c.tier == tier)
        .count()
}
