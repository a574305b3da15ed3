use crate::helper::input_helpers::{self, ContactMessage};
use crate::helper::public_helpers;
use crate::mailer::{Mailer, MailerError};
use crate::middleware::session_is_authenticated;
use crate::models::db_operations::recipes_db_operations::ListFilter;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize)]
pub struct RecipeListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    category: Option<String>,
    search: Option<String>,
    featured: Option<String>,
    all: Option<String>,
}

#[derive(Serialize)]
struct Pagination {
    page: u32,
    limit: u32,
    total: u64,
    pages: u64,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/is_server_active", web::get().to(is_server_active))
        .route("/recipes", web::get().to(list_recipes))
        .route("/recipes/{id_or_slug}", web::get().to(get_recipe))
        .route("/contact", web::post().to(submit_contact));
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn list_recipes(
    db: web::Data<Database>,
    session: Session,
    query: web::Query<RecipeListQuery>,
) -> impl Responder {
    let include_drafts = query.all.as_deref().map_or(false, |v| !v.is_empty());

    // Drafts are only visible to an authenticated caller; an anonymous
    // request asking for them fails loudly instead of silently narrowing.
    if include_drafts && !session_is_authenticated(&session) {
        return HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "Authentication required to list drafts" }));
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let filter = ListFilter {
        include_drafts,
        featured_only: query.featured.as_deref() == Some("true"),
        category: query.category.clone(),
        search: query.search.clone(),
        page,
        limit,
    };

    match public_helpers::fetch_recipes(&db, &filter) {
        Ok((recipes, total)) => {
            let pages = total.div_ceil(limit as u64);
            HttpResponse::Ok().json(serde_json::json!({
                "recipes": recipes,
                "pagination": Pagination { page, limit, total, pages },
            }))
        }
        Err(e) => {
            log::error!("Failed to list recipes: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

async fn get_recipe(db: web::Data<Database>, id_or_slug: web::Path<String>) -> impl Responder {
    match public_helpers::fetch_recipe_for_display(&db, &id_or_slug) {
        Ok(Some(recipe)) => HttpResponse::Ok().json(serde_json::json!({ "recipe": recipe })),
        Ok(None) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Recipe not found" }))
        }
        Err(e) => {
            log::error!("Failed to fetch recipe '{}': {}", id_or_slug, e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

async fn submit_contact(
    mailer: web::Data<Mailer>,
    form: web::Json<ContactMessage>,
) -> impl Responder {
    // Required fields are checked before the relay is ever touched.
    if let Err(message) = input_helpers::validate_contact(&form) {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": message }));
    }

    match mailer.send_contact_message(&form).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        // A submitter address that does not parse is caller input, not a
        // relay failure.
        Err(MailerError::Address(_)) => HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Invalid email address." })),
        Err(e) => {
            log::error!("Contact relay failed for '{}': {}", form.email, e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to send the message" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;
    use crate::helper::input_helpers::RecipeInput;
    use crate::models::db_operations::recipes_db_operations;
    use crate::routes;
    use crate::setup::db_setup;
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::cookie::Key;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use r2d2_sqlite::SqliteConnectionManager;
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> (web::Data<Database>, web::Data<crate::DbPool>) {
        let db = Database::create(dir.path().join("recipes.db")).unwrap();
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

    fn seed_recipe(db: &Database, title: &str, published: bool) {
        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "title": title,
            "isPublished": published,
        }))
        .unwrap();
        recipes_db_operations::create_recipe(db, input).unwrap();
    }

    #[actix_web::test]
    async fn drafts_require_a_session_and_never_leak_anonymously() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        seed_recipe(&db, "Published Tart", true);
        seed_recipe(&db, "Secret Draft", false);
        let app = test_app!(db, pool);

        // Asking for drafts without a session is refused outright.
        let request = test::TestRequest::get()
            .uri("/api/recipes?all=1")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // The plain anonymous listing only ever sees the published recipe.
        let request = test::TestRequest::get().uri("/api/recipes").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["recipes"][0]["title"], "Published Tart");

        // With a session, the same query includes the draft.
        let request = test::TestRequest::post()
            .uri("/api/auth/setup")
            .set_json(serde_json::json!({ "email": "ada@example.com", "password": "hunter22" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response
            .response()
            .cookies()
            .next()
            .expect("expected a session cookie")
            .into_owned();

        let request = test::TestRequest::get()
            .uri("/api/recipes?all=1")
            .cookie(cookie)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["pagination"]["total"], 2);
    }

    #[actix_web::test]
    async fn contact_with_empty_message_is_rejected_before_the_relay() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        let app = test_app!(db, pool);

        // The relay in this app points at an unreachable host; a 400 here
        // proves validation fired before any send was attempted.
        let request = test::TestRequest::post()
            .uri("/api/contact")
            .set_json(serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "message": "",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "Name, email and message are required.");
    }

    #[actix_web::test]
    async fn contact_with_malformed_email_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let (db, pool) = test_state(&dir);
        let app = test_app!(db, pool);

        // Message building fails on the reply-to parse, before the
        // transport is touched, so no network is involved here either.
        let request = test::TestRequest::post()
            .uri("/api/contact")
            .set_json(serde_json::json!({
                "name": "Ada",
                "email": "not an address",
                "message": "Bonjour",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "Invalid email address.");
    }
}
