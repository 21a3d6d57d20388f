use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use once_cell::sync::OnceCell;
use salvo::prelude::*;
use tracing::info;

use crate::config::Config;
use crate::db::DatabaseManager;

pub mod handlers;
pub mod routes;

use self::routes::create_router;

#[derive(Clone)]
pub struct WebState {
    pub db_manager: Arc<DatabaseManager>,
    pub started_at: Instant,
}

static WEB_STATE: OnceCell<WebState> = OnceCell::new();

pub fn web_state() -> &'static WebState {
    WEB_STATE
        .get()
        .expect("web state is not initialized before handler execution")
}

fn init_web_state(db_manager: Arc<DatabaseManager>) {
    let _ = WEB_STATE.set(WebState {
        db_manager,
        started_at: Instant::now(),
    });
}

#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
}

impl WebServer {
    pub fn new(config: Arc<Config>, db_manager: Arc<DatabaseManager>) -> Self {
        init_web_state(db_manager);
        Self { config }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("Starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor).serve(create_router()).await;

        Ok(())
    }
}
