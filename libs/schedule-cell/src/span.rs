use serde::Serialize;

/// Vertical placement of a block inside a column, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSpan {
    pub top: u32,
    pub height: u32,
}

/// Maps a run of `span` slots starting at `start_index` to pixels, given the
/// height of one slot.
pub fn block_span(start_index: usize, span: usize, unit_slot_height: u32) -> BlockSpan {
    BlockSpan {
        top: start_index as u32 * unit_slot_height,
        height: span as u32 * unit_slot_height,
    }
}
