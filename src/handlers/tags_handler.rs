use actix_web::{get, web, HttpResponse};

use crate::error::AppResult;
use crate::store::AdStore;

#[get("/tags")]
pub async fn get_tags(store: web::Data<dyn AdStore>) -> AppResult<HttpResponse> {
    let tags = store.list_tags().await?;

    Ok(HttpResponse::Ok().json(tags))
}
