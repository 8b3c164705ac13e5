use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;
use std::io;

use oasis_chain::api::{self, AppState};
use oasis_chain::config::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    info!(
        "mining genesis block (difficulty_bits={})",
        config.difficulty_bits
    );
    let state = AppState::from_config(&config).map_err(io::Error::other)?;
    {
        let bc = state.blockchain.lock().expect("mutex poisoned");
        for summary in bc.summaries() {
            info!("\n{summary}");
        }
    }

    println!(
        "⛓️ Starting blockchain API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
