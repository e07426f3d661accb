// src/routes.rs

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, english, math, media, questions, ratings},
    state::AppState,
    utils::session::{admin_middleware, auth_middleware},
};

/// Builds the application router.
///
/// Public routes are grouped separately from routes behind the session
/// middleware; admin routes additionally pass the role check.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/challenge", post(auth::issue_challenge))
        .route("/challenge/verify", post(auth::verify_challenge))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let question_routes = Router::new()
        .route("/", get(questions::list_questions))
        .route("/export", get(questions::export_questions))
        .merge(
            Router::new()
                .route("/", post(questions::create_question))
                .route("/import", post(questions::import_questions))
                .route("/{id}", put(questions::update_question))
                .route("/{id}", delete(questions::delete_question))
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let rating_routes = Router::new()
        .route("/{question_id}", get(ratings::list_ratings))
        .merge(
            Router::new()
                .route("/{question_id}", post(ratings::submit_rating))
                .route("/{question_id}", delete(ratings::delete_rating))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let english_routes = Router::new()
        .route("/compose", post(english::compose))
        .route("/compositions/{id}", get(english::get_composition))
        .route("/history", get(english::history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let math_routes = Router::new()
        .route("/parse", post(math::parse))
        .route("/evaluate", post(math::eval));

    let media_routes = Router::new()
        .route("/", get(media::list_media))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/audio", post(media::upload_audio))
                .route("/{id}", delete(media::delete_media))
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .route("/media/{*key}", get(media::serve_media))
        .nest("/api/auth", auth_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/ratings", rating_routes)
        .nest("/api/english", english_routes)
        .nest("/api/math", math_routes)
        .nest("/api/media", media_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
