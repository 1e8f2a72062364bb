pub mod closed;
pub mod controller;
pub mod draft;
pub mod handlers;
pub mod models;
pub mod occupancy;
pub mod router;
pub mod services;
pub mod slot;
pub mod span;
pub mod view_state;
pub mod week;

pub use controller::{RefreshOutcome, RefreshTicket, ScheduleController, ScheduleSource};
pub use draft::{draft_for_slot, slot_to_draft};
pub use models::ScheduleError;
pub use occupancy::{compute_grid, SlotAssignment, SlotDescriptor};
pub use slot::OperatingWindow;
pub use span::{block_span, BlockSpan};
pub use view_state::{ModalState, NavigationAction, ScheduleViewState, ViewMode};
pub use week::week_window;
