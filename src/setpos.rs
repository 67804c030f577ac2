use jiff::Timestamp;

/// Select the candidates at the given positions.
///
/// `candidates` must be every candidate of one window in ascending order.
/// Positive positions count from the start (with `1` being the first) and
/// negative positions count from the end (with `-1` being the last).
/// Positions outside of the window are ignored. The result is sorted and
/// free of duplicates.
pub(crate) fn select(
    candidates: &[Timestamp],
    positions: &[i16],
) -> Vec<Timestamp> {
    let len = candidates.len() as i64;
    let mut selected: Vec<Timestamp> = positions
        .iter()
        .filter_map(|&pos| {
            let pos = i64::from(pos);
            let index = if pos < 0 { len + pos } else { pos - 1 };
            let index = usize::try_from(index).ok()?;
            candidates.get(index).copied()
        })
        .collect();
    selected.sort();
    selected.dedup();
    selected
}
