pub mod schedule;
pub mod source;

pub use schedule::ScheduleService;
pub use source::ClinicScheduleSource;
