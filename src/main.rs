use env_logger::Env;
use jobwatch::configuration::get_configuration;
use jobwatch::startup::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    run(configuration).await?;

    Ok(())
}
