use crate::helper::admin_helpers::{self, AdminHelperError};
use crate::helper::input_helpers::RecipeInput;
use crate::helper::public_helpers;
use crate::middleware::AuthenticatedUser;
use crate::models::PublicUser;
use crate::DbPool;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
struct SetupForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/setup", web::post().to(handle_setup))
        .route("/auth/login", web::post().to(handle_login))
        .route("/auth/logout", web::post().to(handle_logout))
        .route("/auth/me", web::get().to(current_user));
}

pub fn config_recipes(cfg: &mut web::ServiceConfig) {
    cfg.route("/recipes", web::post().to(create_recipe))
        .route("/recipes/{id}", web::put().to(update_recipe))
        .route("/recipes/{id}", web::delete().to(delete_recipe));
}

fn log_in_session(session: &Session, user_id: i32, email: &str, role: &str) {
    // Cookie-session inserts only fail on serialization, which these types
    // cannot; a failure here would mean a broken session backend.
    let _ = session.insert("user_id", user_id);
    let _ = session.insert("email", email);
    let _ = session.insert("role", role);
}

/// One-time admin bootstrap. Refused with 400 once any admin exists; on
/// success the new admin is signed in immediately.
async fn handle_setup(
    session: Session,
    pool: web::Data<DbPool>,
    form: web::Json<SetupForm>,
) -> impl Responder {
    if form.email.trim().is_empty() || form.password.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Email and password are required" }));
    }

    let name = if form.name.trim().is_empty() {
        "Admin"
    } else {
        form.name.trim()
    };

    match admin_helpers::bootstrap_admin(&pool, name, &form.email, &form.password) {
        Ok(user) => {
            log_in_session(&session, user.id, &user.email, &user.role);
            HttpResponse::Created().json(serde_json::json!({
                "message": "Administrator account created",
                "user": PublicUser::from(&user),
            }))
        }
        Err(AdminHelperError::AdminAlreadyExists) => HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "An administrator account already exists" })),
        Err(AdminHelperError::Database(rusqlite::Error::SqliteFailure(e, _)))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "This email is already in use" }))
        }
        Err(e) => {
            log::error!("Admin setup failed: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

/// Credential check. Unknown email, wrong password and deactivated account
/// all produce the same 401 so nothing leaks which check failed.
async fn handle_login(
    session: Session,
    pool: web::Data<DbPool>,
    form: web::Json<LoginForm>,
) -> impl Responder {
    match public_helpers::verify_user_credentials(&pool, &form.email, &form.password) {
        Some(user) => {
            log_in_session(&session, user.id, &user.email, &user.role);
            public_helpers::record_login(&pool, &user.email);
            HttpResponse::Ok().json(serde_json::json!({ "user": PublicUser::from(&user) }))
        }
        None => HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "Invalid credentials" })),
    }
}

async fn handle_logout(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Ok().json(serde_json::json!({ "message": "Logged out" }))
}

async fn current_user(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "user": user }))
}

async fn create_recipe(
    _user: AuthenticatedUser,
    db: web::Data<Database>,
    input: web::Json<RecipeInput>,
) -> impl Responder {
    match admin_helpers::create_recipe(&db, input.into_inner()) {
        Ok(recipe) => HttpResponse::Created().json(serde_json::json!({ "recipe": recipe })),
        Err(e) => {
            log::error!("Failed to create recipe: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

async fn update_recipe(
    _user: AuthenticatedUser,
    db: web::Data<Database>,
    id: web::Path<String>,
    input: web::Json<RecipeInput>,
) -> impl Responder {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "error": "Recipe not found" }))
        }
    };

    match admin_helpers::update_recipe(&db, id, input.into_inner()) {
        Ok(Some(recipe)) => HttpResponse::Ok().json(serde_json::json!({ "recipe": recipe })),
        Ok(None) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Recipe not found" }))
        }
        Err(e) => {
            log::error!("Failed to update recipe {}: {}", id, e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

async fn delete_recipe(
    _user: AuthenticatedUser,
    db: web::Data<Database>,
    id: web::Path<String>,
) -> impl Responder {
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "error": "Recipe not found" }))
        }
    };

    match admin_helpers::delete_recipe(&db, id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "message": "Recipe deleted" })),
        Ok(false) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Recipe not found" }))
        }
        Err(e) => {
            log::error!("Failed to delete recipe {}: {}", id, e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;
    use crate::mailer::Mailer;
    use crate::routes;
    use crate::setup::db_setup;
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::cookie::Key;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use r2d2_sqlite::SqliteConnectionManager;
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> (web::Data<redb::Database>, web::Data<crate::DbPool>) {
        let db = redb::Database::create(dir.path().join("recipes.db")).unwrap();
        db_setup::setup_recipes_db(&db).unwrap();

        let manager = SqliteConnectionManager::file(dir.path().join("users.db"));
        let pool = r2d2::Pool::builder().max_size(2).build(manager).unwrap();
        {
            let mut conn = pool.get().unwrap();
            db_setup::setup_users_db(&mut conn).unwrap();
        }

        (web::Data::new(db), web::Data::new(pool))
    }

    fn test_mailer() -> web::Data<Mailer> {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@example.com".to_string(),
            from_name: "Recette".to_string(),
            contact_recipient: "owner@example.com".to_string(),
        };
        web::Data::new(Mailer::new(&config).unwrap())
    }

    macro_rules! test_app {
        ($db:expr, $pool:expr) => {
            test::init_service(
                App::new()
                    .app_data($db.clone())
                    .app_data($pool.clone())
                    .app_data(test_mailer())
                    .service(
                        web::scope("/api")
                            .wrap(SessionMiddleware::builder(
                                CookieSessionStore::default(),
                                Key::from(&[0u8; 64]),
                            )
                            .cookie_secure(false)
                            .build())
                            .configure(routes::public::config_api)
                            .configure(routes::admin::config_auth)
                            .configure(routes::admin::config_recipes),
                    ),
            )
            .await
        };
    }

    fn session_cookie<B>(
        response: &actix_web::dev::ServiceResponse<B>,
    ) -> actix_web::cookie::Cookie<'static> {
        response
            .response()
            .cookies()
            .next()
            .expect("expected a session cookie")
            .into_owned()
    }

    #[actix_web::test]
    async fn setup_then_login_then_create_recipe() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        let app = test_app!(db, pool);

        // Bootstrap the first admin; the response carries a session.
        let request = test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": "hunter22",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // A second setup attempt is refused.
        let request = test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(serde_json::json!({
                "email": "other@example.com",
                "password": "password",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Log in and create a recipe with the session cookie.
        let request = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({
                "email": "Ada@Example.com",
                "password": "hunter22",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);

        let request = test::TestRequest::post()
            .uri("/api/recipes")
            .cookie(cookie)
            .set_json(serde_json::json!({ "title": "Classic Chocolate Chip Cookies" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["recipe"]["slug"], "classic-chocolate-chip-cookies");
        assert_eq!(body["recipe"]["is_published"], false);
    }

    #[actix_web::test]
    async fn mutating_routes_require_a_session() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        let app = test_app!(db, pool);

        let request = test::TestRequest::post()
            .uri("/api/recipes")
            .set_json(serde_json::json!({ "title": "Sneaky" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = test::TestRequest::delete()
            .uri(&format!("/api/recipes/{}", Uuid::new_v4()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_failures_are_uniform() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        {
            let conn = pool.get().unwrap();
            crate::models::db_operations::users_db_operations::create_user(
                &conn, "Ada", "ada@example.com", "hunter22", "admin",
            )
            .unwrap();
            conn.execute(
                "UPDATE users SET is_active = 0 WHERE email = 'ada@example.com'",
                [],
            )
            .unwrap();
        }
        let app = test_app!(db, pool);

        for payload in [
            serde_json::json!({ "email": "ghost@example.com", "password": "hunter22" }),
            serde_json::json!({ "email": "ada@example.com", "password": "wrong" }),
            serde_json::json!({ "email": "ada@example.com", "password": "hunter22" }),
        ] {
            let request = test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(payload)
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body: serde_json::Value = test::read_body_json(response).await;
            assert_eq!(body["error"], "Invalid credentials");
        }
    }

    #[actix_web::test]
    async fn retitling_a_recipe_keeps_its_slug() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        let app = test_app!(db, pool);

        let request = test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(serde_json::json!({ "email": "ada@example.com", "password": "hunter22" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        let cookie = session_cookie(&response);

        let request = test::TestRequest::post()
            .uri("/api/recipes")
            .cookie(cookie.clone())
            .set_json(serde_json::json!({ "title": "Onion Soup" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        let body: serde_json::Value = test::read_body_json(response).await;
        let id = body["recipe"]["id"].as_str().unwrap().to_string();

        let request = test::TestRequest::put()
            .uri(&format!("/api/recipes/{}", id))
            .cookie(cookie)
            .set_json(serde_json::json!({ "title": "French Onion Soup" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["recipe"]["slug"], "onion-soup");
        assert_eq!(body["recipe"]["title"], "French Onion Soup");
    }

    #[actix_web::test]
    async fn deleting_a_missing_recipe_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        let app = test_app!(db, pool);

        let request = test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(serde_json::json!({ "email": "ada@example.com", "password": "hunter22" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        let cookie = session_cookie(&response);

        let request = test::TestRequest::delete()
            .uri(&format!("/api/recipes/{}", Uuid::new_v4()))
            .cookie(cookie.clone())
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // A non-UUID id is equally a 404, not a 500.
        let request = test::TestRequest::delete()
            .uri("/api/recipes/not-a-uuid")
            .cookie(cookie)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
