use actix_web::web;

use crate::error::AppError;
use crate::handlers::ad_handler::{
    create_ad, delete_ad, entire_look, fast_look, get_ad, list_ads, partial_update_ad, update_ad,
};
use crate::handlers::search_handler::search_ads;
use crate::handlers::tags_handler::get_tags;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
        )
        // before /ads/{id}, which would otherwise claim "search"
        .service(search_ads)
        .service(create_ad)
        .service(list_ads)
        .service(get_ad)
        .service(update_ad)
        .service(partial_update_ad)
        .service(delete_ad)
        .service(fast_look)
        .service(entire_look)
        .service(get_tags);
}
