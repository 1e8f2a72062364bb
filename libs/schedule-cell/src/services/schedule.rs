use chrono::NaiveDate;
use tracing::debug;

use appointment_cell::models::AppointmentDraft;
use shared_config::AppConfig;
use shared_models::RecordId;

use crate::controller::{ScheduleController, ScheduleSource};
use crate::models::{ColumnView, DayScheduleView, GridLayout, ScheduleError, WeekScheduleView};
use crate::services::source::ClinicScheduleSource;
use crate::slot::OperatingWindow;
use crate::view_state::{ScheduleViewState, ViewMode};
use crate::week::week_window;

/// Builds the day and week views served to the browser. Each call takes a
/// fresh snapshot from the source.
pub struct ScheduleService<S> {
    source: S,
    window: OperatingWindow,
    layout: GridLayout,
}

impl ScheduleService<ClinicScheduleSource> {
    pub fn new(config: &AppConfig) -> Result<Self, ScheduleError> {
        Ok(Self::with_source(
            ClinicScheduleSource::new(config),
            OperatingWindow::from_config(config)?,
            GridLayout::from_config(config),
        ))
    }
}

impl<S: ScheduleSource> ScheduleService<S> {
    pub fn with_source(source: S, window: OperatingWindow, layout: GridLayout) -> Self {
        Self { source, window, layout }
    }

    async fn load(&self, state: ScheduleViewState) -> Result<ScheduleController, ScheduleError> {
        let mut controller = ScheduleController::new(self.window, state);
        controller.refresh(&self.source).await?;
        Ok(controller)
    }

    fn total_height(&self) -> u32 {
        self.window.slot_count() as u32 * self.layout.slot_height
    }

    pub async fn day_view(
        &self,
        date: NaiveDate,
        doctor_id: Option<RecordId>,
    ) -> Result<DayScheduleView, ScheduleError> {
        debug!("Building day view for {}", date);

        let mut state = ScheduleViewState::new(date);
        state.select_doctor(doctor_id.clone());
        let controller = self.load(state).await?;

        if let Some(requested) = doctor_id {
            if controller.state.selected_doctor.as_ref() != Some(&requested) {
                return Err(ScheduleError::UnknownDoctor(requested));
            }
        }

        let columns = controller
            .day_grids()?
            .into_iter()
            .map(|(doctor, grid)| ColumnView::build(doctor, grid, &self.layout))
            .collect();

        Ok(DayScheduleView {
            date,
            labels: self.window.labels(),
            layout: self.layout,
            total_height: self.total_height(),
            columns,
        })
    }

    pub async fn week_view(&self, date: NaiveDate, doctor_id: RecordId) -> Result<WeekScheduleView, ScheduleError> {
        debug!("Building week view for doctor {} around {}", doctor_id, date);

        let mut state = ScheduleViewState::new(date);
        state.set_mode(ViewMode::Week);
        state.select_doctor(Some(doctor_id.clone()));
        let controller = self.load(state).await?;

        // An unknown id is dropped on refresh; do not silently show someone else.
        if controller.state.selected_doctor.as_ref() != Some(&doctor_id) {
            return Err(ScheduleError::UnknownDoctor(doctor_id));
        }

        let (doctor, grids) = controller.week_grids()?;
        let week = week_window(date);
        let days = grids
            .into_iter()
            .map(|grid| ColumnView::build(doctor.clone(), grid, &self.layout))
            .collect();

        Ok(WeekScheduleView {
            week_start: week[0],
            week_end: week[6],
            doctor,
            labels: self.window.labels(),
            layout: self.layout,
            total_height: self.total_height(),
            days,
        })
    }

    pub async fn draft(
        &self,
        doctor_id: &RecordId,
        date: NaiveDate,
        slot_index: usize,
    ) -> Result<AppointmentDraft, ScheduleError> {
        let mut controller = self.load(ScheduleViewState::new(date)).await?;
        controller.open_slot(doctor_id, date, slot_index)
    }

    pub fn window(&self) -> &OperatingWindow {
        &self.window
    }
}
