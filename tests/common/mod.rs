use axum_test::{TestServer, TestServerConfig};
use serde_json::json;
use sqlx::{MySql, Pool};
use uuid::Uuid;

use courtbook::config::{AppEnv, Config};
use courtbook::services::hashing::Argon2Config;

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub db: Pool<MySql>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

        let db = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let config = Config {
            database_url: database_url.clone(),
            db_max_connections: 5,
            app_env: AppEnv::Development,
            // Cheap hashing keeps the suite fast; production cost comes
            // from the environment.
            argon2: Argon2Config {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        };

        let app = courtbook::create_app(db.clone(), config).await;
        let server_config = TestServerConfig {
            // Session cookies issued by login are replayed automatically.
            save_cookies: true,
            ..TestServerConfig::default()
        };
        let server =
            TestServer::new_with_config(app, server_config).expect("Failed to create test server");

        Self { server, db }
    }

    pub async fn cleanup(&self) {
        // Clean up test data after each test
        sqlx::query("DELETE FROM bookings").execute(&self.db).await.ok();
        sqlx::query("DELETE FROM courts").execute(&self.db).await.ok();
        sqlx::query("DELETE FROM venues").execute(&self.db).await.ok();
        sqlx::query("DELETE FROM sessions").execute(&self.db).await.ok();
        sqlx::query("DELETE FROM password_resets")
            .execute(&self.db)
            .await
            .ok();
        sqlx::query("DELETE FROM otp_codes").execute(&self.db).await.ok();
        sqlx::query("DELETE FROM users").execute(&self.db).await.ok();
    }

    /// Registers a user through the API and returns their id.
    pub async fn register_user(&self, email: &str) -> String {
        let response = self
            .server
            .post("/auth/register")
            .json(&json!({
                "email": email,
                "password": test_password(),
                "full_name": "Test User"
            }))
            .await;

        let body: serde_json::Value = response.json();
        body["user"]["id"]
            .as_str()
            .expect("register response missing user id")
            .to_string()
    }

    /// Registers and logs in; the session cookie lands in the server jar.
    pub async fn login_user(&self, email: &str) -> String {
        let user_id = self.register_user(email).await;
        let response = self
            .server
            .post("/auth/login")
            .json(&json!({
                "email": email,
                "password": test_password()
            }))
            .await;
        assert_eq!(response.status_code(), 200, "login failed during setup");
        user_id
    }

    /// Inserts a venue + court directly and returns the court id.
    pub async fn seed_court(&self, hourly_rate: &str) -> String {
        let venue_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO venues (id, owner_id, name, address, is_approved) VALUES (?, ?, ?, ?, TRUE)",
        )
        .bind(&venue_id)
        .bind(Uuid::new_v4().to_string())
        .bind("Test Arena")
        .bind("1 Test Street")
        .execute(&self.db)
        .await
        .expect("Failed to seed venue");

        let court_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO courts (id, venue_id, name, sport_type, hourly_rate) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&court_id)
        .bind(&venue_id)
        .bind("Court 1")
        .bind("badminton")
        .bind(hourly_rate)
        .execute(&self.db)
        .await
        .expect("Failed to seed court");

        court_id
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4())
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}
