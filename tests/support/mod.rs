//! Shared integration-test server bootstrap helpers.
#![allow(dead_code)]

use axum_test::TestServer;
use pasty::commands::serve;
use pasty::config::Config;
use pasty::App;
use tempfile::TempDir;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse";

pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("test.db").display()
    );
    config.database.max_connections = 1;
    config.limits.max_upload_size = 64 * 1024;
    config.admin.username = Some(ADMIN_USERNAME.to_owned());
    config.admin.password = Some(ADMIN_PASSWORD.to_owned());
    config
}

pub async fn setup_test_server() -> (TestServer, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let app = App::connect(test_config(&dir)).await.expect("connect");
    let router = serve::router(app).expect("router");
    let server = TestServer::new(router.into_make_service()).expect("server");
    (server, dir)
}
