//! Greyed-out regions of a column: the lunch break and the late afternoon
//! when the doctor is not taking appointments. Both only ever cover free slots.

use chrono::NaiveTime;
use serde::Serialize;

use crate::occupancy::SlotAssignment;
use crate::span::{block_span, BlockSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosedKind {
    Break,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedBlock {
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
    pub kind: ClosedKind,
    pub position: BlockSpan,
}

impl ClosedBlock {
    fn new(start_index: usize, end_index: usize, kind: ClosedKind, unit: u32) -> Self {
        Self {
            start_index,
            end_index,
            kind,
            position: block_span(start_index, end_index - start_index + 1, unit),
        }
    }
}

pub fn closed_blocks(
    grid: &SlotAssignment,
    unavailable_from: Option<NaiveTime>,
    break_time: Option<NaiveTime>,
    unit_slot_height: u32,
) -> Vec<ClosedBlock> {
    let mut blocks = Vec::new();

    let break_index = break_time
        .and_then(|t| grid.window.index_of(t))
        .filter(|&i| grid.is_free(i));
    if let Some(index) = break_index {
        blocks.push(ClosedBlock::new(index, index, ClosedKind::Break, unit_slot_height));
    }

    if let Some(from) = unavailable_from.and_then(|t| grid.window.first_index_at_or_after(t)) {
        let mut run_start: Option<usize> = None;
        for index in from..grid.slots.len() {
            let closable = grid.is_free(index) && Some(index) != break_index;
            match (closable, run_start) {
                (true, None) => run_start = Some(index),
                (false, Some(start)) => {
                    blocks.push(ClosedBlock::new(start, index - 1, ClosedKind::Unavailable, unit_slot_height));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            blocks.push(ClosedBlock::new(
                start,
                grid.slots.len() - 1,
                ClosedKind::Unavailable,
                unit_slot_height,
            ));
        }
    }

    blocks.sort_by_key(|b| b.start_index);
    blocks
}
