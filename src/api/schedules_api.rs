use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveTime, Utc};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{NewSchedule, Schedule, ScheduleContentType};
use crate::AppState;

/// Parses an `HH:mm` time-of-day string; `HH:mm:ss` is accepted too.
fn parse_time_of_day(value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| {
            ApiError::Validation(format!(
                "Invalid time of day '{}' (expected HH:mm)",
                value
            ))
        })
}

fn validate(payload: &NewSchedule) -> Result<(NaiveTime, NaiveTime), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Schedule name is required".to_string()));
    }

    match payload.content_type {
        ScheduleContentType::Playlist if payload.playlist_id.is_none() => {
            return Err(ApiError::Validation(
                "playlist_id is required for playlist schedules".to_string(),
            ));
        }
        ScheduleContentType::SingleImage if payload.media_id.is_none() => {
            return Err(ApiError::Validation(
                "media_id is required for single-image schedules".to_string(),
            ));
        }
        _ => {}
    }

    if let Some(day) = payload.day_of_week {
        if day > 6 {
            return Err(ApiError::Validation(
                "day_of_week must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ));
        }
    }

    let start_time = parse_time_of_day(&payload.start_time)?;
    let end_time = parse_time_of_day(&payload.end_time)?;

    // start > end is legal: the window wraps past midnight.
    Ok((start_time, end_time))
}

pub async fn list_schedules(State(state): State<AppState>) -> Json<Vec<Schedule>> {
    let mut schedules: Vec<Schedule> = state
        .store
        .schedules
        .read()
        .await
        .values()
        .cloned()
        .collect();
    schedules.sort_by_key(|s| s.id);
    Json(schedules)
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
) -> Result<Json<Schedule>, ApiError> {
    state
        .store
        .schedules
        .read()
        .await
        .get(&schedule_id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotFound("Schedule"))
}

/// No overlap validation happens here: the table is a flat list of
/// declarative rules and the resolver settles conflicts by priority.
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(new_schedule): Json<NewSchedule>,
) -> Result<Json<Schedule>, ApiError> {
    let (start_time, end_time) = validate(&new_schedule)?;

    let now = Utc::now().naive_utc();
    let schedule = Schedule {
        id: state.store.next_schedule_id(),
        name: new_schedule.name,
        content_type: new_schedule.content_type,
        playlist_id: new_schedule.playlist_id,
        media_id: new_schedule.media_id,
        start_time,
        end_time,
        day_of_week: new_schedule.day_of_week,
        is_active: new_schedule.is_active,
        priority: new_schedule.priority,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .schedules
        .write()
        .await
        .insert(schedule.id, schedule.clone());

    state.snapshots.persist(&state.store).await;

    Ok(Json(schedule))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
    Json(updates): Json<NewSchedule>,
) -> Result<Json<Schedule>, ApiError> {
    let (start_time, end_time) = validate(&updates)?;

    let schedule = {
        let mut schedules = state.store.schedules.write().await;
        let schedule = schedules
            .get_mut(&schedule_id)
            .ok_or(ApiError::NotFound("Schedule"))?;

        schedule.name = updates.name;
        schedule.content_type = updates.content_type;
        schedule.playlist_id = updates.playlist_id;
        schedule.media_id = updates.media_id;
        schedule.start_time = start_time;
        schedule.end_time = end_time;
        schedule.day_of_week = updates.day_of_week;
        schedule.is_active = updates.is_active;
        schedule.priority = updates.priority;
        schedule.updated_at = Utc::now().naive_utc();
        schedule.clone()
    };

    state.snapshots.persist(&state.store).await;

    Ok(Json(schedule))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state
        .store
        .schedules
        .write()
        .await
        .remove(&schedule_id)
        .is_none()
    {
        return Err(ApiError::NotFound("Schedule"));
    }

    state.snapshots.persist(&state.store).await;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ToggleActiveRequest {
    pub is_active: bool,
}

pub async fn toggle_schedule_active(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
    Json(req): Json<ToggleActiveRequest>,
) -> Result<Json<Schedule>, ApiError> {
    let schedule = {
        let mut schedules = state.store.schedules.write().await;
        let schedule = schedules
            .get_mut(&schedule_id)
            .ok_or(ApiError::NotFound("Schedule"))?;

        schedule.is_active = req.is_active;
        schedule.updated_at = Utc::now().naive_utc();
        schedule.clone()
    };

    state.snapshots.persist(&state.store).await;

    Ok(Json(schedule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_mm_and_hh_mm_ss() {
        assert_eq!(
            parse_time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("22:00:15").unwrap(),
            NaiveTime::from_hms_opt(22, 0, 15).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_time_strings() {
        assert!(parse_time_of_day("9am").is_err());
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[test]
    fn rejects_mismatched_content_reference() {
        let payload = NewSchedule {
            name: "Evening".to_string(),
            content_type: ScheduleContentType::Playlist,
            playlist_id: None,
            media_id: Some(3),
            start_time: "18:00".to_string(),
            end_time: "22:00".to_string(),
            day_of_week: None,
            is_active: true,
            priority: 0,
        };
        assert!(validate(&payload).is_err());
    }

    #[test]
    fn accepts_midnight_wrapping_window() {
        let payload = NewSchedule {
            name: "Overnight".to_string(),
            content_type: ScheduleContentType::SingleImage,
            playlist_id: None,
            media_id: Some(1),
            start_time: "22:00".to_string(),
            end_time: "02:00".to_string(),
            day_of_week: Some(4),
            is_active: true,
            priority: 1,
        };
        let (start, end) = validate(&payload).unwrap();
        assert!(start > end);
    }
}
