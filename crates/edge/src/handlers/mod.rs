mod facial_recognition;
mod voice_assistant;

pub(crate) use facial_recognition::facial_recognition;
pub(crate) use voice_assistant::voice_assistant;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::EdgeError;

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, EdgeError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| EdgeError::BadRequest(rejection.body_text()))
}
