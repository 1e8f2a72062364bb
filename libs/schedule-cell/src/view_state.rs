//! Navigation state of the schedule screen.
//!
//! The whole screen is described by one serializable value; every change goes
//! through a named transition so the browser can round-trip it through
//! `POST /schedule/navigate`.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use appointment_cell::models::AppointmentDraft;
use shared_models::RecordId;

use crate::week::week_window;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Day,
    Week,
}

impl ViewMode {
    fn step(&self) -> Duration {
        match self {
            ViewMode::Day => Duration::days(1),
            ViewMode::Week => Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ModalState {
    #[default]
    None,
    NewAppointment(AppointmentDraft),
    Detail(RecordId),
    ConfirmDelete(RecordId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleViewState {
    pub date: NaiveDate,
    pub mode: ViewMode,
    pub selected_doctor: Option<RecordId>,
    #[serde(default)]
    pub modal: ModalState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NavigationAction {
    Previous,
    Next,
    Today,
    SetMode { mode: ViewMode },
    SelectDoctor { doctor_id: Option<RecordId> },
    OpenDraft { draft: AppointmentDraft },
    OpenDetail { appointment_id: RecordId },
    ConfirmDelete { appointment_id: RecordId },
    CloseModal,
}

impl ScheduleViewState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            mode: ViewMode::Day,
            selected_doctor: None,
            modal: ModalState::None,
        }
    }

    pub fn previous(&mut self) {
        self.date -= self.mode.step();
    }

    pub fn next(&mut self) {
        self.date += self.mode.step();
    }

    pub fn today(&mut self, today: NaiveDate) {
        self.date = today;
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// `None` shows every doctor in day view.
    pub fn select_doctor(&mut self, doctor_id: Option<RecordId>) {
        self.selected_doctor = doctor_id;
    }

    pub fn open_draft(&mut self, draft: AppointmentDraft) {
        self.modal = ModalState::NewAppointment(draft);
    }

    pub fn open_detail(&mut self, appointment_id: RecordId) {
        self.modal = ModalState::Detail(appointment_id);
    }

    pub fn confirm_delete(&mut self, appointment_id: RecordId) {
        self.modal = ModalState::ConfirmDelete(appointment_id);
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::None;
    }

    pub fn apply(&mut self, action: NavigationAction, today: NaiveDate) {
        match action {
            NavigationAction::Previous => self.previous(),
            NavigationAction::Next => self.next(),
            NavigationAction::Today => self.today(today),
            NavigationAction::SetMode { mode } => self.set_mode(mode),
            NavigationAction::SelectDoctor { doctor_id } => self.select_doctor(doctor_id),
            NavigationAction::OpenDraft { draft } => self.open_draft(draft),
            NavigationAction::OpenDetail { appointment_id } => self.open_detail(appointment_id),
            NavigationAction::ConfirmDelete { appointment_id } => self.confirm_delete(appointment_id),
            NavigationAction::CloseModal => self.close_modal(),
        }
    }

    pub fn visible_days(&self) -> Vec<NaiveDate> {
        match self.mode {
            ViewMode::Day => vec![self.date],
            ViewMode::Week => week_window(self.date).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn stepping_follows_the_mode() {
        let mut state = ScheduleViewState::new(date(14));

        state.next();
        assert_eq!(state.date, date(15));

        state.set_mode(ViewMode::Week);
        state.previous();
        assert_eq!(state.date, date(8));

        state.today(date(14));
        assert_eq!(state.date, date(14));
    }

    #[test]
    fn week_mode_shows_seven_days() {
        let mut state = ScheduleViewState::new(date(14));
        assert_eq!(state.visible_days(), vec![date(14)]);

        state.set_mode(ViewMode::Week);
        let days = state.visible_days();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(12));
    }

    #[test]
    fn modal_transitions() {
        let mut state = ScheduleViewState::new(date(14));

        state.open_detail(RecordId::Numeric(4));
        assert_eq!(state.modal, ModalState::Detail(RecordId::Numeric(4)));

        state.confirm_delete(RecordId::Numeric(4));
        assert_eq!(state.modal, ModalState::ConfirmDelete(RecordId::Numeric(4)));

        state.close_modal();
        assert_eq!(state.modal, ModalState::None);
    }

    #[test]
    fn actions_arrive_as_json() {
        let mut state: ScheduleViewState = serde_json::from_value(json!({
            "date": "2025-05-14",
            "mode": "week",
            "selectedDoctor": 2
        }))
        .unwrap();
        assert_eq!(state.modal, ModalState::None);

        let action: NavigationAction = serde_json::from_value(json!({ "type": "next" })).unwrap();
        state.apply(action, date(1));
        assert_eq!(state.date, date(21));

        let action: NavigationAction =
            serde_json::from_value(json!({ "type": "openDetail", "appointmentId": "a-9" })).unwrap();
        state.apply(action, date(1));
        assert_eq!(state.modal, ModalState::Detail(RecordId::Text("a-9".to_string())));

        state.apply(NavigationAction::Today, date(1));
        assert_eq!(state.date, date(1));
    }
}
