use axum::{extract::State, Json};

use crate::{app::AppState, model::StudyHallOut, service::study_hall::PomodoroTimer};

pub async fn study_hall(State(state): State<AppState>) -> Json<StudyHallOut> {
    let timer = PomodoroTimer::new(&state.study_hall);
    Json(StudyHallOut {
        focus_minutes: state.study_hall.focus_minutes,
        break_minutes: state.study_hall.break_minutes,
        timer: timer.snapshot(),
    })
}
