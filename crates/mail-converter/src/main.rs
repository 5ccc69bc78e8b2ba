use incident_telemetry::get_subscriber;
use incident_telemetry::init_subscriber;
use mail_converter::configuration::get_configuration;
use mail_converter::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().expect("failed to read configuration");
    let subscriber = get_subscriber("mail-converter", &configuration.log_level, std::io::stdout);
    init_subscriber(subscriber);

    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
