use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use ember_core::Fix;

use crate::nmea::parse_rmc;

/// Line-oriented NMEA feed. Serial is the real receiver; the file variant
/// replays a recorded log for bench rigs and tests.
pub enum NmeaSource {
    Serial(BufReader<SerialStream>),
    File(BufReader<File>),
}

impl NmeaSource {
    pub fn serial(dev: &str, baud: u32) -> Result<Self> {
        let port = tokio_serial::new(dev, baud)
            .open_native_async()
            .with_context(|| format!("open serial {}", dev))?;
        Ok(Self::Serial(BufReader::new(port)))
    }

    pub fn file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("open nmea file {}", path))?;
        Ok(Self::File(BufReader::new(File::from_std(f))))
    }

    /// Read until the next active-status fix. Unrecognized sentences, parse
    /// failures, and void fixes are skipped without touching any state.
    pub async fn next_fix(&mut self) -> Result<Fix> {
        let mut line = String::new();
        loop {
            line.clear();
            match self {
                NmeaSource::Serial(r) => {
                    read_serial_line(r, &mut line).await?;
                }
                NmeaSource::File(r) => {
                    let n = r.read_line(&mut line).await.context("file read")?;
                    if n == 0 {
                        // EOF on replay: idle and poll again
                        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                        continue;
                    }
                }
            }
            if let Some(fix) = parse_rmc(line.trim()) {
                if fix.valid {
                    return Ok(fix);
                }
            }
        }
    }
}

// EOF on a serial port means it went away (closed pty, driver-signalled
// disconnect). Surface it as an error so the ingest loop logs and backs off
// instead of spinning on empty reads.
async fn read_serial_line<R: tokio::io::AsyncBufRead + Unpin>(
    r: &mut R,
    line: &mut String,
) -> Result<()> {
    let n = r.read_line(line).await.context("serial read")?;
    anyhow::ensure!(n > 0, "serial line source closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn replay(lines: &str) -> NmeaSource {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(lines.as_bytes()).unwrap();
        let (_, path) = f.keep().unwrap();
        NmeaSource::file(path.to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn skips_noise_until_active_fix() {
        let mut src = replay(
            "not nmea at all\n\
             $GPGGA,123519,3606.000,N,12824.000,E,1,08,0.9,545.4,M,,,,*47\n\
             $GPRMC,123519,V,3606.000,N,12824.000,E,0.0,0.0,230394,,\n\
             $GPRMC,123520,A,3606.000,N,12824.000,E,0.0,0.0,230394,,\n",
        );
        let fix = src.next_fix().await.unwrap();
        assert!(fix.valid);
        assert!((fix.lat - 36.10).abs() < 1e-6);
        assert!((fix.lon - 128.40).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(NmeaSource::file("/nonexistent/replay.nmea").is_err());
    }

    #[tokio::test]
    async fn serial_eof_is_a_read_error() {
        let mut reader = BufReader::new(&b""[..]);
        let mut line = String::new();
        assert!(read_serial_line(&mut reader, &mut line).await.is_err());
    }

    #[tokio::test]
    async fn serial_line_is_read_through() {
        let mut reader = BufReader::new(&b"$GPRMC,x\n"[..]);
        let mut line = String::new();
        read_serial_line(&mut reader, &mut line).await.unwrap();
        assert_eq!(line, "$GPRMC,x\n");
    }
}
