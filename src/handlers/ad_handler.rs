use actix_web::{delete, get, patch, post, put, web, HttpResponse};

use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{AdCut, AdDetail, AdPayload};
use crate::store::AdStore;

/// Rejects tag ids that do not name a stored tag.
async fn ensure_tags_exist(store: &dyn AdStore, ids: &[i32]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found = store.existing_tag_ids(ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| format!("Invalid pk \"{id}\" - object does not exist."))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let mut errors = FieldErrors::new();
    errors.insert("tag_id".to_string(), missing);
    Err(AppError::Validation(errors))
}

#[post("/ads")]
pub async fn create_ad(
    store: web::Data<dyn AdStore>,
    payload: web::Json<AdPayload>,
) -> AppResult<HttpResponse> {
    let new_ad = payload.into_inner().into_new_ad().map_err(AppError::Validation)?;
    ensure_tags_exist(store.get_ref(), &new_ad.tag_id).await?;

    let ad = store.create_ad(new_ad).await?;
    tracing::info!(ad_id = ad.id, "ad created");

    Ok(HttpResponse::Created().json(AdDetail::from(ad)))
}

#[get("/ads")]
pub async fn list_ads(store: web::Data<dyn AdStore>) -> AppResult<HttpResponse> {
    let ads: Vec<AdCut> = store
        .list_ads()
        .await?
        .into_iter()
        .map(AdCut::from)
        .collect();

    Ok(HttpResponse::Ok().json(ads))
}

#[get("/ads/{id}")]
pub async fn get_ad(
    path: web::Path<i32>,
    store: web::Data<dyn AdStore>,
) -> AppResult<HttpResponse> {
    let ad = store
        .get_ad(path.into_inner())
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(HttpResponse::Ok().json(AdDetail::from(ad)))
}

#[put("/ads/{id}")]
pub async fn update_ad(
    path: web::Path<i32>,
    store: web::Data<dyn AdStore>,
    payload: web::Json<AdPayload>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    // Unknown ids are a 404 even when the body is also invalid.
    if store.get_ad(id).await?.is_none() {
        return Err(AppError::not_found());
    }

    let new_ad = payload.into_inner().into_new_ad().map_err(AppError::Validation)?;
    ensure_tags_exist(store.get_ref(), &new_ad.tag_id).await?;

    let ad = store
        .update_ad(id, new_ad.into())
        .await?
        .ok_or_else(AppError::not_found)?;
    tracing::info!(ad_id = id, "ad replaced");

    Ok(HttpResponse::Ok().json(AdDetail::from(ad)))
}

#[patch("/ads/{id}")]
pub async fn partial_update_ad(
    path: web::Path<i32>,
    store: web::Data<dyn AdStore>,
    payload: web::Json<AdPayload>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if store.get_ad(id).await?.is_none() {
        return Err(AppError::not_found());
    }

    let changes = payload.into_inner().into_changes().map_err(AppError::Validation)?;
    if let Some(tag_id) = &changes.tag_id {
        ensure_tags_exist(store.get_ref(), tag_id).await?;
    }

    let ad = store
        .update_ad(id, changes)
        .await?
        .ok_or_else(AppError::not_found)?;
    tracing::info!(ad_id = id, "ad updated");

    Ok(HttpResponse::Ok().json(AdDetail::from(ad)))
}

#[delete("/ads/{id}")]
pub async fn delete_ad(
    path: web::Path<i32>,
    store: web::Data<dyn AdStore>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !store.delete_ad(id).await? {
        return Err(AppError::not_found());
    }
    tracing::info!(ad_id = id, "ad deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Cut projection of one ad; leaves the view counter alone.
#[get("/ads/{id}/fast")]
pub async fn fast_look(
    path: web::Path<i32>,
    store: web::Data<dyn AdStore>,
) -> AppResult<HttpResponse> {
    let ad = store
        .get_ad(path.into_inner())
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(HttpResponse::Ok().json(AdCut::from(ad)))
}

/// Full projection of one ad, counting the read as a view.
///
/// The increment does not hand back the row, so the ad is read again after
/// it. An ad deleted between the two steps is reported as not found.
#[get("/ads/{id}/full")]
pub async fn entire_look(
    path: web::Path<i32>,
    store: web::Data<dyn AdStore>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !store.increment_views(id).await? {
        return Err(AppError::not_found());
    }

    let ad = store.get_ad(id).await?.ok_or_else(AppError::not_found)?;
    tracing::debug!(ad_id = id, views = ad.views, "ad viewed");

    Ok(HttpResponse::Ok().json(AdDetail::from(ad)))
}
