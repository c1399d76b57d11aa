use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    auth::{self, service::AccountService},
    comments::{self, service::CommentService},
    config::settings::Settings,
    staff,
};

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
    pub accounts: AccountService,
    pub settings: Settings,
}

impl FromRef<AppState> for CommentService {
    fn from_ref(app_state: &AppState) -> CommentService {
        app_state.comments.clone()
    }
}

impl FromRef<AppState> for AccountService {
    fn from_ref(app_state: &AppState) -> AccountService {
        app_state.accounts.clone()
    }
}

impl FromRef<AppState> for Settings {
    fn from_ref(app_state: &AppState) -> Settings {
        app_state.settings.clone()
    }
}

pub fn app(app_state: AppState) -> Router {
    let account_router = Router::new()
        .route("/check-username", get(auth::handler::check_username))
        .route("/sign-up", post(auth::handler::signup))
        .route("/sign-in", post(auth::handler::login))
        .route("/me", get(auth::handler::get_me));

    let comment_router = Router::new()
        .route("/", post(comments::handler::create_comment))
        .route(
            "/:id",
            get(comments::handler::get_comment)
                .put(comments::handler::update_comment)
                .delete(comments::handler::delete_comment),
        );

    let product_router = Router::new()
        .route("/:id/comments", get(comments::handler::get_product_comments))
        .route(
            "/:id/comments/roots",
            get(comments::handler::get_product_roots),
        )
        .route(
            "/:id/comments/unanswered",
            get(comments::handler::get_product_unanswered),
        );

    let staff_router = Router::new().route("/", post(staff::handler::create_staff));

    let admin_router =
        Router::new().route("/comments/status", get(comments::handler::get_root_statuses));

    Router::new()
        .route("/", get(|| async { "Medion API" }))
        .nest("/api/accounts", account_router)
        .nest("/api/comments", comment_router)
        .nest("/api/products", product_router)
        .nest("/api/staff", staff_router)
        .nest("/api/admin", admin_router)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
