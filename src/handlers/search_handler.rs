use actix_web::{get, web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::filters::AdFilter;
use crate::models::AdDetail;
use crate::store::AdStore;

/// `min_price`/`max_price`, repeated `tag_id` and `created_min`/`created_max`,
/// all optional and combined with AND.
#[get("/ads/search")]
pub async fn search_ads(
    query: web::Query<Vec<(String, String)>>,
    store: web::Data<dyn AdStore>,
) -> AppResult<HttpResponse> {
    let filter = AdFilter::from_query(&query).map_err(AppError::Validation)?;
    tracing::debug!(?filter, "searching ads");

    let ads: Vec<AdDetail> = store
        .search_ads(&filter)
        .await?
        .into_iter()
        .map(AdDetail::from)
        .collect();

    Ok(HttpResponse::Ok().json(ads))
}
