use std::path::PathBuf;
use clap::{ArgGroup, Parser};

use crate::config::{ConfigError, SessionConfig};
use crate::station::{Command, FirmwareQuery};

#[derive(Debug, Clone, Parser)]
#[command(name = "vantage-console", version)]
#[command(about = "Query and control a Davis Vantage Pro console over a serial link")]
#[command(group(
    ArgGroup::new("request")
        .args(["firmware_version", "set_backlight", "model"])
        .multiple(false)
))]
pub struct Cli {
    /// Serial port the console is attached to (e.g. /dev/ttyUSB0 or COM3)
    #[arg(short, long, required_unless_present = "list_ports")]
    pub port: Option<String>,

    /// Log protocol traffic
    #[arg(long)]
    pub verbose: bool,

    /// Query the console firmware version
    #[arg(short = 'f', long)]
    pub firmware_version: bool,

    /// Switch the console backlight on (1) or off (0)
    #[arg(short = 'b', long, value_name = "0|1", value_parser = parse_switch)]
    pub set_backlight: Option<bool>,

    /// Query the station model
    #[arg(short, long)]
    pub model: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// JSON file with session settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Firmware query form understood by the console
    #[arg(long, value_enum)]
    pub firmware_query: Option<FirmwareQuery>,

    /// Byte offset of the model code in the model reply
    #[arg(long, value_name = "N")]
    pub model_offset: Option<usize>,

    /// How long to wait for the console to start answering
    #[arg(long, value_name = "MS")]
    pub reply_timeout_ms: Option<u64>,
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(format!("expected 0 or 1, got '{}'", other)),
    }
}

impl Cli {
    /// The one command this invocation services, if any
    pub fn command(&self) -> Option<Command> {
        if self.firmware_version {
            Some(Command::GetFirmwareVersion)
        } else if let Some(on) = self.set_backlight {
            Some(Command::SetBacklight(on))
        } else if self.model {
            Some(Command::GetModel)
        } else {
            None
        }
    }

    /// Defaults, then the config file, then command line overrides
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };

        if let Some(form) = self.firmware_query {
            config.firmware_query = form;
        }
        if let Some(offset) = self.model_offset {
            config.model_offset = offset;
        }
        if let Some(ms) = self.reply_timeout_ms {
            config.reply_timeout_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("vantage-console").chain(args.iter().copied()))
    }

    #[test]
    fn port_is_required() {
        assert!(parse(&["-f"]).is_err());
        assert!(parse(&["--list-ports"]).is_ok());
    }

    #[test]
    fn maps_flags_to_commands() {
        let command = |args: &[&str]| parse(args).unwrap().command();

        assert_eq!(command(&["-p", "/dev/ttyUSB0", "-f"]), Some(Command::GetFirmwareVersion));
        assert_eq!(command(&["-p", "/dev/ttyUSB0", "-m"]), Some(Command::GetModel));
        assert_eq!(command(&["-p", "/dev/ttyUSB0", "-b", "1"]), Some(Command::SetBacklight(true)));
        assert_eq!(
            command(&["--port", "COM3", "--set-backlight", "0"]),
            Some(Command::SetBacklight(false))
        );
        assert_eq!(command(&["-p", "/dev/ttyUSB0"]), None);
    }

    #[test]
    fn backlight_accepts_only_zero_or_one() {
        assert!(parse(&["-p", "/dev/ttyUSB0", "-b", "2"]).is_err());
        assert!(parse(&["-p", "/dev/ttyUSB0", "-b", "on"]).is_err());
    }

    #[test]
    fn one_request_per_invocation() {
        assert!(parse(&["-p", "/dev/ttyUSB0", "-f", "-m"]).is_err());
        assert!(parse(&["-p", "/dev/ttyUSB0", "-m", "-b", "1"]).is_err());
    }

    #[test]
    fn command_line_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "model_offset": 3, "firmware_query": "wrd", "reply_timeout_ms": 900 }}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = ["-p", "/dev/ttyUSB0", "-m", "--config", path.as_str(), "--model-offset", "0"];
        let cli = parse(&args).unwrap();
        let config = cli.session_config().unwrap();
        assert_eq!(config.model_offset, 0);
        assert_eq!(config.firmware_query, FirmwareQuery::Wrd);
        assert_eq!(config.reply_timeout_ms, 900);
    }

    #[test]
    fn firmware_query_flag() {
        let cli = parse(&["-p", "/dev/ttyUSB0", "-f", "--firmware-query", "wrd"]).unwrap();
        assert_eq!(cli.session_config().unwrap().firmware_query, FirmwareQuery::Wrd);
    }
}
