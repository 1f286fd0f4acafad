//! Upload endpoints: profile pictures and videos with thumbnails

use auth::AuthUser;
use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, internal},
    models::Video,
    state::AppState,
    uploads::{PROFILE_PICTURE, StoredObject, THUMBNAIL, UploadedFile, VIDEO},
};

/// Replace the caller's profile picture with the uploaded `file` field
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            if file.is_some() {
                return Err(ApiError::Validation("Only one file is allowed".to_string()));
            }
            file = Some(PROFILE_PICTURE.read(field).await?);
        }
    }
    let file = file.ok_or_else(|| ApiError::Validation("A file is required".to_string()))?;

    let stored = PROFILE_PICTURE
        .store(state.storage.as_ref(), file)
        .await
        .map_err(internal("Error uploading profile picture"))?;

    let updated = match state
        .user_repository
        .update_profile_picture(auth_user.id, &stored.url)
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            discard_objects(&state, &[&stored]).await;
            return Err(internal("Error uploading profile picture")(e));
        }
    };

    if !updated {
        discard_objects(&state, &[&stored]).await;
        return Err(ApiError::NotFound);
    }

    info!("Updated profile picture for user {}", auth_user.id);

    Ok(Json(json!({
        "message": "Profile picture updated successfully",
        "profilePictureUrl": stored.url,
        "success": true,
    })))
}

/// Publish a video: `title`, `description`, `video` and `thumbnail` fields
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart?;

    let mut title = None;
    let mut description = None;
    let mut video_file = None;
    let mut thumbnail_file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "description" => description = Some(field.text().await?),
            "video" => {
                if video_file.is_some() {
                    return Err(ApiError::Validation(
                        "Only one video file is allowed".to_string(),
                    ));
                }
                video_file = Some(VIDEO.read(field).await?);
            }
            "thumbnail" => {
                if thumbnail_file.is_some() {
                    return Err(ApiError::Validation(
                        "Only one thumbnail file is allowed".to_string(),
                    ));
                }
                thumbnail_file = Some(THUMBNAIL.read(field).await?);
            }
            _ => {}
        }
    }

    let (Some(video_file), Some(thumbnail_file)) = (video_file, thumbnail_file) else {
        return Err(ApiError::Validation(
            "Both video and thumbnail files are required.".to_string(),
        ));
    };
    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("title is required".to_string()))?;
    let description = description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("description is required".to_string()))?;

    let video = publish_video(
        &state,
        auth_user.id,
        title,
        description,
        video_file,
        thumbnail_file,
    )
    .await?;

    info!("User {} uploaded video {}", auth_user.id, video.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Video uploaded successfully",
            "video": video,
            "success": true,
        })),
    ))
}

/// Store both files, stage the video record, then link it to its owner.
///
/// Each step undoes the earlier ones when it fails, so a failed request
/// leaves neither orphaned objects nor an unowned video behind.
async fn publish_video(
    state: &AppState,
    user_id: Uuid,
    title: String,
    description: String,
    video_file: UploadedFile,
    thumbnail_file: UploadedFile,
) -> ApiResult<Video> {
    let video_object = VIDEO
        .store(state.storage.as_ref(), video_file)
        .await
        .map_err(internal("Error uploading video"))?;

    let thumbnail_object = match THUMBNAIL.store(state.storage.as_ref(), thumbnail_file).await {
        Ok(object) => object,
        Err(e) => {
            discard_objects(state, &[&video_object]).await;
            return Err(internal("Error uploading video")(e));
        }
    };

    let video = Video {
        id: Uuid::new_v4(),
        video_url: video_object.url.clone(),
        title,
        description,
        thumbnail_url: thumbnail_object.url.clone(),
        created_at: Utc::now(),
    };

    if let Err(e) = state.video_repository.create(&video).await {
        discard_objects(state, &[&video_object, &thumbnail_object]).await;
        return Err(internal("Error uploading video")(e));
    }

    let linked = state.user_repository.append_video(user_id, video.id).await;
    match linked {
        Ok(true) => Ok(video),
        Ok(false) => {
            discard_video(state, &video, &[&video_object, &thumbnail_object]).await;
            Err(ApiError::NotFound)
        }
        Err(e) => {
            discard_video(state, &video, &[&video_object, &thumbnail_object]).await;
            Err(internal("Error uploading video")(e))
        }
    }
}

async fn discard_video(state: &AppState, video: &Video, objects: &[&StoredObject]) {
    warn!("Discarding staged video {}", video.id);
    if let Err(e) = state.video_repository.delete(video.id).await {
        error!("Failed to delete staged video {}: {}", video.id, e);
    }
    discard_objects(state, objects).await;
}

/// Best-effort removal of uploaded objects
async fn discard_objects(state: &AppState, objects: &[&StoredObject]) {
    for object in objects {
        if let Err(e) = state.storage.delete(&object.key).await {
            error!("Failed to delete orphaned object {}: {}", object.key, e);
        }
    }
}
