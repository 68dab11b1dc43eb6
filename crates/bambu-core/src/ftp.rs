//! Implicit FTPS client for listing print files on the printer's storage.
//!
//! The printer runs an FTP server wrapped in TLS from the first byte (port
//! 990). Data connections use passive mode and are themselves TLS, resuming
//! the control channel's session.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use rumqttc::tokio_rustls::TlsConnector;
use rumqttc::tokio_rustls::client::TlsStream;
use rustls::pki_types::ServerName;
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::tls;

/// Directories searched for print files.
pub const LISTED_DIRECTORIES: &[&str] = &["/", "/cache"];

/// A print file stored on the printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintFile {
    /// File name without directory.
    pub name: String,
    /// Absolute path on the printer.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time as Unix seconds.
    pub timestamp: i64,
}

impl PrintFile {
    /// Modification time, if the timestamp is representable.
    pub fn last_modified(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.timestamp).ok()
    }
}

/// Whether a file name looks like something the printer can print.
///
/// ```
/// use bambu_core::ftp::is_print_file;
///
/// assert!(is_print_file("benchy.gcode.3mf"));
/// assert!(is_print_file("PLATE_1.GCODE"));
/// assert!(!is_print_file("timelapse.mp4"));
/// ```
pub fn is_print_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".gcode") || lower.ends_with(".3mf")
}

/// List print files in [`LISTED_DIRECTORIES`].
///
/// Directories the server reports as missing (550) are skipped.
#[tracing::instrument(level = "info", skip(access_code))]
pub async fn list_print_files(host: &str, port: u16, access_code: &str) -> Result<Vec<PrintFile>> {
    let mut client = FtpsClient::connect(host, port).await?;
    client.login(crate::connection::PRINTER_USERNAME, access_code).await?;

    let now = OffsetDateTime::now_utc();
    let mut files = Vec::new();
    for dir in LISTED_DIRECTORIES {
        match client.list(dir).await? {
            Some(listing) => files.extend(parse_listing(dir, &listing, now)),
            None => debug!(dir, "Directory not present"),
        }
    }
    client.quit().await;

    info!(count = files.len(), "Listed print files");
    Ok(files)
}

#[derive(Debug)]
struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    fn expect(self, accepted: &[u16]) -> Result<Self> {
        if accepted.contains(&self.code) {
            Ok(self)
        } else {
            Err(Error::ftp(self.code, self.text))
        }
    }
}

struct FtpsClient {
    control: BufReader<TlsStream<TcpStream>>,
    connector: TlsConnector,
    server_name: ServerName<'static>,
    peer_ip: IpAddr,
}

impl FtpsClient {
    async fn connect(host: &str, port: u16) -> Result<Self> {
        let connector = TlsConnector::from(Arc::new(tls::insecure_client_config()?));
        let server_name = tls::server_name(host)?;

        let tcp = TcpStream::connect((host, port)).await?;
        let peer_ip = tcp.peer_addr()?.ip();
        let stream = connector.connect(server_name.clone(), tcp).await?;
        debug!(%peer_ip, "FTPS control channel established");

        let mut client = Self {
            control: BufReader::new(stream),
            connector,
            server_name,
            peer_ip,
        };
        client.read_reply().await?.expect(&[220])?;
        Ok(client)
    }

    async fn login(&mut self, user: &str, password: &str) -> Result<()> {
        let reply = self.command(&format!("USER {user}")).await?;
        if reply.code != 230 {
            reply.expect(&[331])?;
            self.command(&format!("PASS {password}"))
                .await?
                .expect(&[230])?;
        }
        self.command("PBSZ 0").await?.expect(&[200])?;
        self.command("PROT P").await?.expect(&[200])?;
        Ok(())
    }

    /// `LIST` a directory. Returns `None` when it does not exist.
    async fn list(&mut self, dir: &str) -> Result<Option<String>> {
        let pasv = self.command("PASV").await?.expect(&[227])?;
        let addr = parse_pasv(&pasv.text, self.peer_ip)?;
        let data = TcpStream::connect(addr).await?;

        self.send(&format!("LIST {dir}")).await?;
        let reply = self.read_reply().await?;
        if reply.code == 550 {
            return Ok(None);
        }
        reply.expect(&[125, 150])?;

        let mut data = self.connector.connect(self.server_name.clone(), data).await?;
        let mut raw = Vec::new();
        match data.read_to_end(&mut raw).await {
            Ok(_) => {}
            // Some servers close the data socket without a TLS close_notify.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {}
            Err(e) => return Err(e.into()),
        }
        drop(data);

        self.read_reply().await?.expect(&[226, 250])?;
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    async fn quit(&mut self) {
        if let Err(e) = self.command("QUIT").await {
            debug!(error = %e, "QUIT failed");
        }
    }

    async fn command(&mut self, command: &str) -> Result<Reply> {
        self.send(command).await?;
        self.read_reply().await
    }

    async fn send(&mut self, command: &str) -> Result<()> {
        if command.starts_with("PASS ") {
            debug!("--> PASS ****");
        } else {
            debug!("--> {command}");
        }
        let stream = self.control.get_mut();
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut text = String::new();
        let mut code: Option<u16> = None;
        loop {
            let mut line = String::new();
            if self.control.read_line(&mut line).await? == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "FTP control channel closed",
                )
                .into());
            }
            let line = line.trim_end_matches(['\r', '\n']);
            debug!("<-- {line}");

            match code {
                None => {
                    let parsed = reply_code(line).ok_or_else(|| Error::ftp(0, line))?;
                    text.push_str(line.get(4..).unwrap_or_default());
                    if line.as_bytes().get(3) != Some(&b'-') {
                        return Ok(Reply { code: parsed, text });
                    }
                    code = Some(parsed);
                }
                Some(expected) => {
                    text.push('\n');
                    text.push_str(line);
                    if reply_code(line) == Some(expected) && line.as_bytes().get(3) == Some(&b' ') {
                        return Ok(Reply {
                            code: expected,
                            text,
                        });
                    }
                }
            }
        }
    }
}

fn reply_code(line: &str) -> Option<u16> {
    let digits = line.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse the address from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
///
/// An all-zero host means "same host as the control connection".
fn parse_pasv(text: &str, control_ip: IpAddr) -> Result<SocketAddr> {
    let invalid = || Error::ftp(227, format!("unparseable PASV reply: {text}"));
    let start = text.find('(').ok_or_else(invalid)? + 1;
    let end = text[start..].find(')').ok_or_else(invalid)? + start;
    let parts: Vec<u8> = text[start..end]
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid())?;
    let [a, b, c, d, hi, lo] = parts[..] else {
        return Err(invalid());
    };

    let ip = Ipv4Addr::new(a, b, c, d);
    let ip = if ip.is_unspecified() {
        control_ip
    } else {
        IpAddr::V4(ip)
    };
    Ok(SocketAddr::new(ip, u16::from(hi) << 8 | u16::from(lo)))
}

/// Parse a Unix-style `LIST` listing, keeping only print files.
fn parse_listing(dir: &str, listing: &str, now: OffsetDateTime) -> Vec<PrintFile> {
    listing
        .lines()
        .filter_map(|line| parse_list_line(line, now))
        .filter(|(name, _, _)| is_print_file(name))
        .map(|(name, size, timestamp)| PrintFile {
            path: join_path(dir, &name),
            name,
            size,
            timestamp,
        })
        .collect()
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Parse one listing line into `(name, size, unix timestamp)`.
///
/// Directories, links and `total` lines yield `None`.
fn parse_list_line(line: &str, now: OffsetDateTime) -> Option<(String, u64, i64)> {
    let line = line.trim_end();
    if !line.starts_with('-') {
        return None;
    }

    let mut rest = line;
    let mut fields = [""; 8];
    for field in &mut fields {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        *field = &rest[..end];
        rest = &rest[end..];
    }
    let name = rest.trim_start();
    if name.is_empty() {
        return None;
    }

    let size = fields[4].parse().ok()?;
    let timestamp = parse_list_time(fields[5], fields[6], fields[7], now).unwrap_or(0);
    Some((name.to_string(), size, timestamp))
}

/// `Mon DD HH:MM` (within the last year) or `Mon DD YYYY`, interpreted as UTC.
fn parse_list_time(month: &str, day: &str, time_or_year: &str, now: OffsetDateTime) -> Option<i64> {
    let month = parse_month(month)?;
    let day: u8 = day.parse().ok()?;

    if let Some((hour, minute)) = time_or_year.split_once(':') {
        let time = Time::from_hms(hour.parse().ok()?, minute.parse().ok()?, 0).ok()?;
        let at = |year: i32| -> Option<i64> {
            let date = Date::from_calendar_date(year, month, day).ok()?;
            Some(PrimitiveDateTime::new(date, time).assume_utc().unix_timestamp())
        };
        let this_year = at(now.year())?;
        // Allow a day of clock skew before assuming last year.
        if this_year > now.unix_timestamp() + 86_400 {
            at(now.year() - 1)
        } else {
            Some(this_year)
        }
    } else {
        let year: i32 = time_or_year.parse().ok()?;
        let date = Date::from_calendar_date(year, month, day).ok()?;
        Some(date.midnight().assume_utc().unix_timestamp())
    }
}

fn parse_month(name: &str) -> Option<Month> {
    let month = match name.to_ascii_lowercase().as_str() {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const LISTING: &str = "\
-rw-rw-rw-   1 root  root   2519045 Mar 14 09:26 Rpi_4_Case.gcode.3mf\r
drwxrwxrwx   1 root  root         0 Jan  1  2024 timelapse\r
-rw-rw-rw-   1 root  root      1024 Dec 30  2023 notes.txt\r
-rw-rw-rw-   1 root  root    802311 Nov  2  2023 plate 1 copy.GCODE\r
lrwxrwxrwx   1 root  root        10 Jan  1  2024 link.3mf -> x.3mf\r
";

    #[test]
    fn test_parse_listing_filters_and_parses() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let files = parse_listing("/", LISTING, now);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "Rpi_4_Case.gcode.3mf");
        assert_eq!(files[0].path, "/Rpi_4_Case.gcode.3mf");
        assert_eq!(files[0].size, 2519045);
        assert_eq!(
            files[0].timestamp,
            datetime!(2024-03-14 09:26 UTC).unix_timestamp()
        );

        assert_eq!(files[1].name, "plate 1 copy.GCODE");
        assert_eq!(files[1].size, 802311);
        assert_eq!(
            files[1].last_modified(),
            Some(datetime!(2023-11-02 00:00 UTC))
        );
    }

    #[test]
    fn test_recent_time_in_future_means_last_year() {
        let now = datetime!(2024-01-10 12:00 UTC);
        let line = "-rw-r--r-- 1 u g 10 Dec 31 23:00 a.gcode";
        let (_, _, ts) = parse_list_line(line, now).unwrap();
        assert_eq!(ts, datetime!(2023-12-31 23:00 UTC).unix_timestamp());
    }

    #[test]
    fn test_subdirectory_paths() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let files = parse_listing(
            "/cache",
            "-rw-r--r-- 1 u g 10 May 31 10:00 job.3mf",
            now,
        );
        assert_eq!(files[0].path, "/cache/job.3mf");
    }

    #[test]
    fn test_unparseable_time_is_zero() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let (_, size, ts) =
            parse_list_line("-rw-r--r-- 1 u g 42 Foo 99 xx:yy odd.3mf", now).unwrap();
        assert_eq!(size, 42);
        assert_eq!(ts, 0);
    }

    #[test]
    fn test_short_line_is_skipped() {
        let now = datetime!(2024-06-01 12:00 UTC);
        assert!(parse_list_line("-rw-r--r-- 1 u g 42", now).is_none());
        assert!(parse_list_line("total 8", now).is_none());
    }

    #[test]
    fn test_parse_pasv() {
        let control: IpAddr = "192.168.1.50".parse().unwrap();
        let addr = parse_pasv("Entering Passive Mode (192,168,1,50,195,80).", control).unwrap();
        assert_eq!(addr, "192.168.1.50:50000".parse().unwrap());

        let addr = parse_pasv("Entering Passive Mode (0,0,0,0,4,1)", control).unwrap();
        assert_eq!(addr, "192.168.1.50:1025".parse().unwrap());

        assert!(parse_pasv("Entering Passive Mode", control).is_err());
        assert!(parse_pasv("(1,2,3)", control).is_err());
        assert!(parse_pasv("(1,2,3,4,5,300)", control).is_err());
    }

    #[test]
    fn test_reply_code() {
        assert_eq!(reply_code("220 Welcome"), Some(220));
        assert_eq!(reply_code("230-multi"), Some(230));
        assert_eq!(reply_code("ab"), None);
        assert_eq!(reply_code("xyz nope"), None);
    }

    #[test]
    fn test_is_print_file() {
        assert!(is_print_file("a.3MF"));
        assert!(is_print_file("b.gcode"));
        assert!(!is_print_file("c.gcode.bak"));
        assert!(!is_print_file("3mf"));
    }

    proptest::proptest! {
        #[test]
        fn test_listing_parser_never_panics(listing in "\\PC{0,400}") {
            let now = datetime!(2024-06-01 12:00 UTC);
            for file in parse_listing("/cache", &listing, now) {
                proptest::prop_assert!(is_print_file(&file.name));
                proptest::prop_assert!(file.path.starts_with("/cache/"));
            }
        }
    }
}
