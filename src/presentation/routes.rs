use crate::presentation::books::create_book;
use crate::presentation::handlers::{
    health_check, index, json_error_handler, query_error_handler,
};
use crate::presentation::users::{
    delete_user, filter_users, get_user, list_users, login, register, update_user,
};
use actix_web::web;

pub const ROUTES: &str = "GET /, GET /api/health, POST /api/user/reg, POST /api/user/login, \
GET /api/user, GET /api/user/filter, GET|PUT|DELETE /api/user/{id}, POST /api/book";

/// Route table shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_check))
                .route("/book", web::post().to(create_book))
                .service(
                    web::scope("/user")
                        .service(web::resource(["", "/"]).route(web::get().to(list_users)))
                        .route("/reg", web::post().to(register))
                        .route("/login", web::post().to(login))
                        // must precede /{id}
                        .route("/filter", web::get().to(filter_users))
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(get_user))
                                .route(web::put().to(update_user))
                                .route(web::delete().to(delete_user)),
                        ),
                ),
        );
}
