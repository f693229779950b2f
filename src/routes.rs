// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, auth, lists, practice, students},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public auth routes (teacher OTP, student code login).
/// * Teacher routes for lists, students, imports and analytics.
/// * Student routes for practice and own progress.
/// * Global Trace and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            header::HeaderValue::from_static("http://localhost:5173"),
            header::HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/otp/request", post(auth::request_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/student", post(auth::student_login));

    // Auth first, then the role check
    let teacher_routes = Router::new()
        .route("/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/lists/{id}",
            get(lists::get_list)
                .put(lists::update_list)
                .delete(lists::delete_list),
        )
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/{id}", delete(students::delete_student))
        .route(
            "/students/{id}/attempts/import",
            post(students::import_attempts),
        )
        .route("/students/{id}/progress", get(analytics::student_progress))
        .route(
            "/students/{id}/progress/summary",
            post(analytics::generate_summary),
        )
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route("/lists", get(practice::my_lists))
        .route("/lists/{id}/exercise", get(practice::get_exercise))
        .route("/attempts", post(practice::submit_attempt))
        .route("/progress", get(analytics::my_progress))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/student", student_routes)
        .nest("/api", teacher_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
