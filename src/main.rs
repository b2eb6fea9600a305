use mytube::app::App;
use mytube::config::Config;
use mytube::errors::AppError;
use mytube::player::PlayerController;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::load()?;
    let mut app = App::new(&config, PlayerController::new()).await?;
    app.run().await
}
