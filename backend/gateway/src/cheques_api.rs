//! Cheque endpoints: upload + process, review queue, review patch.

use std::path::Path as FsPath;
use std::time::Instant;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use chequeforge_core::ChequeImage;
use chequeforge_core::types::image_mime_type;
use chequeforge_extraction::SecondaryStatus;
use chequeforge_store::{ChequeRecord, ReviewPatch};
use logging::ExtractionEvent;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "chequeImage";

/// Handler for `POST /api/cheques/process`.
pub async fn process_cheque(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ChequeRecord>), ApiError> {
    let image = read_cheque_image(&mut multipart).await?;
    let saved = state.uploads.save(&image).await?;
    let started = Instant::now();

    let run = match state.pipeline.run(&image).await {
        Ok(run) => run,
        Err(e) => {
            error!(file = %image.file_name, error = %e, "Cheque processing failed");
            state.uploads.remove(&saved).await;
            return Err(e.into());
        }
    };

    let record = ChequeRecord::new(run.record, saved.url.clone());
    if let Err(e) = state.store.insert(&record).await {
        state.uploads.remove(&saved).await;
        return Err(e.into());
    }

    let id = record.id.to_string();
    if let SecondaryStatus::Failed { source, message } = &run.secondary {
        state.events.log_event(
            &id,
            ExtractionEvent::SecondaryFailed {
                source: source.clone(),
                message: message.clone(),
            },
        );
    }
    state.events.log_event(
        &id,
        ExtractionEvent::ChequeProcessed {
            needs_review: record.needs_review(),
            notes: record.extraction.review_notes.len(),
            recognizer: state.pipeline.recognizer_name().to_string(),
            secondary: state.pipeline.secondary_name().map(str::to_string),
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
    );

    if record.needs_review() {
        state.events.log_event(
            &id,
            ExtractionEvent::ReviewRequested {
                notes: record.extraction.review_notes.iter().map(str::to_string).collect(),
            },
        );
        if let Some(webhook) = &state.webhook {
            webhook.notify(record.clone());
        }
    }

    Ok((StatusCode::CREATED, Json(record)))
}

async fn read_cheque_image(multipart: &mut Multipart) -> Result<ChequeImage, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("cheque").to_string();
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| image_mime_type(FsPath::new(&file_name)).to_string());
        let bytes = field.bytes().await?;
        return Ok(ChequeImage::from_bytes(bytes.to_vec(), mime_type, file_name)?);
    }
    Err(ApiError::bad_request("No file uploaded."))
}

/// Handler for `GET /api/cheques/review`.
pub async fn list_pending_review(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<ChequeRecord>>, ApiError> {
    Ok(Json(state.store.list_pending_review().await?))
}

/// Handler for `PUT /api/cheques/review/:id`.
pub async fn apply_review(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<ChequeRecord>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid cheque id."))?;
    let fields = patch.fields().iter().map(|f| f.key().to_string()).collect();

    let record = state.store.apply_review(id, patch).await?;
    state
        .events
        .log_event(&record.id.to_string(), ExtractionEvent::ReviewCompleted { fields });
    info!(id = %record.id, "Cheque reviewed");
    Ok(Json(record))
}
