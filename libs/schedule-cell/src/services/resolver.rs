// libs/schedule-cell/src/services/resolver.rs
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use shared_models::scheduling::ScheduleBlock;

/// First block whose `[start, end)` contains `time`. Blocks are expected to
/// belong to a single doctor and weekday already.
pub fn find_block_containing(blocks: &[ScheduleBlock], time: NaiveTime) -> Option<&ScheduleBlock> {
    blocks.iter().find(|block| block.contains_time(time))
}

/// Splits a block's span on `date` into consecutive intervals of
/// `slot_minutes`. A trailing remainder shorter than one slot is dropped.
pub fn partition_block(
    block: &ScheduleBlock,
    date: NaiveDate,
    slot_minutes: i64,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut slots = Vec::new();
    if slot_minutes <= 0 {
        return slots;
    }

    let (block_start, block_end) = block.span_on(date);
    let step = Duration::minutes(slot_minutes);

    let mut current = block_start;
    while current < block_end {
        let slot_end = current + step;
        if slot_end > block_end {
            break;
        }
        slots.push((current, slot_end));
        current = slot_end;
    }

    slots
}
