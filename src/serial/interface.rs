use std::io::{Read, Write};
use std::time::Duration;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use super::{ByteChannel, Result, SerialDeviceInfo, SerialError};

// Davis consoles talk 19200 8N1
pub const BAUD_RATE: u32 = 19200;

const PORT_TIMEOUT: Duration = Duration::from_millis(1000);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct SerialInterface {
    port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialInterface {
    /// List the serial ports present on this machine
    pub fn discover_ports() -> Result<Vec<SerialDeviceInfo>> {
        let ports = serialport::available_ports()?;
        let mut devices = Vec::new();

        for port in ports {
            let mut device = SerialDeviceInfo {
                port_name: port.port_name.clone(),
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            };
            if let SerialPortType::UsbPort(usb_info) = port.port_type {
                device.vid = Some(usb_info.vid);
                device.pid = Some(usb_info.pid);
                device.serial_number = usb_info.serial_number;
                device.manufacturer = usb_info.manufacturer;
                device.product = usb_info.product;
            }
            devices.push(device);
        }

        Ok(devices)
    }

    /// Open `port_name` at `baud_rate`, 8 data bits, no parity, one stop bit
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => SerialError::PortNotFound(port_name.to_string()),
                _ => SerialError::ConnectionFailed(format!("{}: {}", port_name, e)),
            })?;

        log::info!("Opened {} at {} baud", port_name, baud_rate);
        Ok(Self {
            port,
            port_name: port_name.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ByteChannel for SerialInterface {
    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.port.write_all(data).map_err(SerialError::IoError)?;
        log::debug!("TX {} [{}]", hex::encode(data), data.len());
        Ok(data.len())
    }

    async fn drain(&mut self) -> Result<()> {
        self.port.flush().map_err(SerialError::IoError)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(0);
        }

        let want = pending.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => {
                log::debug!("RX {} [{}]", hex::encode(&buf[..n]), n);
                Ok(n)
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    async fn readable(&mut self) -> Result<()> {
        while self.port.bytes_to_read()? == 0 {
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Ok(())
    }
}

impl Drop for SerialInterface {
    fn drop(&mut self) {
        log::debug!("Closing {}", self.port_name);
    }
}
