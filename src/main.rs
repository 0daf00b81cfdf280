use vantage_console_lib::serial::SerialError;

#[tokio::main]
async fn main() {
    if let Err(e) = vantage_console_lib::run().await {
        log::error!("{:#}", e);
        let code = e.downcast_ref::<SerialError>().map_or(1, SerialError::exit_code);
        std::process::exit(code);
    }
}
