pub mod criterion;
pub mod selector;
pub mod snapshot;

pub use criterion::RankCriterion;
pub use selector::BoundedSelector;
pub use snapshot::{format_bytes, format_cpu_time, RankedEntry, TopSnapshot};

use crate::error::SelectorError;
use crate::process::ProcessRecord;

/// One ranking pass: streams `records` through a fresh selector and returns
/// exactly `top_n` slots, best first.
pub fn rank<'a, I>(
    records: I,
    criterion: RankCriterion,
    top_n: usize,
) -> Result<Vec<Option<RankedEntry>>, SelectorError>
where
    I: IntoIterator<Item = &'a ProcessRecord>,
{
    let mut selector = BoundedSelector::new(top_n, |a: &&ProcessRecord, b: &&ProcessRecord| {
        criterion.compare(a, b)
    })?;
    for record in records {
        selector.insert(record);
    }

    let mut slots = vec![None; top_n];
    selector.drain_into(&mut slots);
    Ok(slots
        .into_iter()
        .map(|slot| slot.map(RankedEntry::from))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_amount(pid: u32, amount: f32) -> ProcessRecord {
        let mut r = ProcessRecord::new(pid);
        r.amount = amount;
        r
    }

    #[test]
    fn test_rank_by_cpu() {
        let records: Vec<ProcessRecord> = [5.0, 1.0, 9.0, 3.0, 7.0]
            .iter()
            .enumerate()
            .map(|(i, &a)| with_amount(i as u32 + 1, a))
            .collect();

        let ranked = rank(&records, RankCriterion::Cpu, 2).unwrap();
        let amounts: Vec<f32> = ranked.iter().flatten().map(|e| e.cpu_percent).collect();
        assert_eq!(amounts, vec![9.0, 7.0]);
    }

    #[test]
    fn test_rank_pads_short_lists() {
        let records = vec![with_amount(1, 1.0)];
        let ranked = rank(&records, RankCriterion::Cpu, 3).unwrap();
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].is_some());
        assert!(ranked[1].is_none() && ranked[2].is_none());
    }

    #[test]
    fn test_rank_rejects_zero() {
        let records: Vec<ProcessRecord> = Vec::new();
        assert_eq!(
            rank(&records, RankCriterion::Memory, 0),
            Err(SelectorError::ZeroCapacity)
        );
    }
}
