use crate::postal_code;
use crate::types::{AggregateRow, RankedSelection};
use tracing::{trace, warn};

/// Selects the `k` rows with the highest `total_amount`, keeping only valid postal codes.
///
/// Upstream is asked to order rows ascending by total, so the top `k` are the tail of
/// the filtered sequence. Ties straddling the cut are decided by input position: the
/// later row wins. If upstream ordering is ever violated the rows are re-sorted with a
/// stable sort first, which leaves already ascending input untouched and keeps the
/// same positional tie-break.
pub fn select_top_k(rows: Vec<AggregateRow>, k: usize) -> RankedSelection {
    if k == 0 {
        return RankedSelection::new(Vec::new());
    }

    let mut valid: Vec<AggregateRow> = rows
        .into_iter()
        .filter(|row| {
            let ok = postal_code::is_valid(&row.postal_code);
            if !ok {
                trace!(postal_code = %row.postal_code, "Dropping invalid postal code");
            }
            ok
        })
        .collect();

    if !is_ascending(&valid) {
        warn!("Aggregate rows were not ordered by total amount; re-sorting before selection");
        valid.sort_by(|a, b| a.total_amount.cmp(&b.total_amount));
    }

    if valid.len() > k {
        let excess = valid.len() - k;
        valid.drain(..excess);
    }
    RankedSelection::new(valid)
}

fn is_ascending(rows: &[AggregateRow]) -> bool {
    rows.windows(2)
        .all(|pair| pair[0].total_amount <= pair[1].total_amount)
}
