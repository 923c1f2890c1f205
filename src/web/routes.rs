use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/router")
            .service(
                web::resource("/ask")
                    .route(web::post().to(handlers::ask))
                    .route(web::head().to(handlers::ask_probe)),
            )
            .route("/auth", web::post().to(handlers::auth)),
    )
    .service(
        web::scope("/mongoose/api")
            .route("/health", web::get().to(handlers::health))
            .route("/auth", web::post().to(handlers::auth))
            .route("/query", web::post().to(handlers::query))
            .route("/token", web::post().to(handlers::token)),
    );
}
