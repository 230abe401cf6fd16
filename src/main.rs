use codecollab::config::Config;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    codecollab::telemetry::init()?;
    let config = Config::from_env()?;
    tracing::info!(host = %config.host, port = config.port, "starting CodeCollab");

    codecollab::rocket_instance(config)
        .launch()
        .await
        .map_err(|err| anyhow::anyhow!("server stopped with an error: {err}"))?;
    Ok(())
}
