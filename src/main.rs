mod config;
mod model;
mod web;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use config::{load_config, OperatorConfig, ServerSettings};
use model::PassiveModel;
use web::routes;

// App state structure; read-only after start-up
struct AppState {
    config: Arc<OperatorConfig>,
    model: PassiveModel,
}

impl AppState {
    fn new(config: OperatorConfig) -> Self {
        let config = Arc::new(config);
        Self {
            model: PassiveModel::new(config.clone()),
            config,
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();

    let settings = ServerSettings::from_env();

    let debug = settings.as_ref().map(|s| s.debug).unwrap_or(false);
    let default_level = if debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_level));

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid router settings: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Starting Mongoose Router on port {}", settings.port);

    let operator_config = load_config(&settings.config_path).await;
    info!("Mongoose config: {}", operator_config);
    info!("Debug mode: {}", settings.debug);

    let app_state = Data::new(AppState::new(operator_config));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((settings.host.as_str(), settings.port));

    match server {
        Ok(server) => server.run().await,
        Err(e) => {
            error!("Failed to bind {}:{}: {}", settings.host, settings.port, e);
            Err(e)
        }
    }
}
