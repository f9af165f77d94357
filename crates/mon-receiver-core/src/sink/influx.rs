//! InfluxDB 1.x store
//!
//! Talks to the HTTP API directly:
//! - `GET /ping` for health checks
//! - `POST /write?db=<database>&precision=u` with line protocol for writes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use super::{Measurement, StoreConnector, StoreError, TimeSeriesStore};

/// Default InfluxDB endpoint
pub const DEFAULT_INFLUX_URL: &str = "http://localhost:8086";

/// Default database name
pub const DEFAULT_DATABASE: &str = "hdvent_data";

/// InfluxDB connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    /// Base URL of the HTTP API
    pub url: String,
    /// Target database
    pub database: String,
    /// Optional basic-auth user
    pub username: Option<String>,
    /// Optional basic-auth password
    pub password: Option<String>,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Honour HTTP(S)_PROXY environment variables
    pub use_system_proxy: bool,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INFLUX_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: None,
            password: None,
            timeout_ms: 5000,
            use_system_proxy: false,
        }
    }
}

/// Render a batch as line protocol, one point per line
pub fn line_protocol(points: &[Measurement]) -> String {
    points
        .iter()
        .filter_map(Measurement::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One HTTP client bound to one InfluxDB server
pub struct InfluxStore {
    client: Client,
    config: InfluxConfig,
    closed: AtomicBool,
}

impl InfluxStore {
    /// Build a client; does not touch the network
    pub fn connect(config: InfluxConfig) -> Result<Self, StoreError> {
        let mut builder = Client::builder()
            .user_agent(concat!("mon-receiver/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            closed: AtomicBool::new(false),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_deref()),
            None => request,
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Relaxed) {
            Err(StoreError::NotConnected)
        } else {
            Ok(())
        }
    }
}

fn check_status(response: Response) -> Result<(), StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(StoreError::Status {
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}

impl TimeSeriesStore for InfluxStore {
    fn write_points(&self, points: &[Measurement]) -> Result<(), StoreError> {
        self.ensure_open()?;

        let body = line_protocol(points);
        if body.is_empty() {
            return Ok(());
        }

        let request = self
            .client
            .post(self.endpoint("write"))
            .query(&[("db", self.config.database.as_str()), ("precision", "u")])
            .body(body);
        check_status(self.authorize(request).send()?)
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let request = self.client.get(self.endpoint("ping"));
        check_status(self.authorize(request).send()?)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Opens [`InfluxStore`] connections from a fixed configuration
#[derive(Debug, Clone)]
pub struct InfluxConnector {
    config: InfluxConfig,
}

impl InfluxConnector {
    /// Connector for `config`
    pub fn new(config: InfluxConfig) -> Self {
        Self { config }
    }
}

impl StoreConnector for InfluxConnector {
    fn connect(&self) -> Result<Arc<dyn TimeSeriesStore>, StoreError> {
        Ok(Arc::new(InfluxStore::connect(self.config.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Packet;
    use chrono::{TimeZone, Utc};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one HTTP request, answering with `status_line`; returns the request
    fn serve_once(status_line: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                let done = line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status_line
            )
            .unwrap();
            format!("{}{}", head, String::from_utf8_lossy(&body))
        });

        (url, handle)
    }

    fn config(url: String) -> InfluxConfig {
        InfluxConfig {
            url,
            ..InfluxConfig::default()
        }
    }

    fn measurement(name: &str, value: f32) -> Measurement {
        let at = Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap();
        Measurement::from_packet(Packet::new(name, value).unwrap(), at)
    }

    #[test]
    fn test_line_protocol_batch() {
        let points = vec![
            measurement("flow", 1.5),
            measurement("pres", f32::INFINITY),
            measurement("pres", 20.0),
        ];
        let t = Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap().timestamp_micros();

        assert_eq!(
            line_protocol(&points),
            format!("flow value=1.5 {t}\npres value=20 {t}")
        );
    }

    #[test]
    fn test_ping() {
        let (url, server) = serve_once("HTTP/1.1 204 No Content");
        let store = InfluxStore::connect(config(url)).unwrap();

        store.ping().unwrap();
        assert!(server.join().unwrap().starts_with("GET /ping "));
    }

    #[test]
    fn test_write_sends_line_protocol() {
        let (url, server) = serve_once("HTTP/1.1 204 No Content");
        let store = InfluxStore::connect(config(url)).unwrap();

        store.write_points(&[measurement("flow", 2.5)]).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /write?db=hdvent_data&precision=u "));
        assert!(request.ends_with("flow value=2.5 1585699200000000"));
    }

    #[test]
    fn test_write_rejected_status() {
        let (url, server) = serve_once("HTTP/1.1 400 Bad Request");
        let store = InfluxStore::connect(config(url)).unwrap();

        let err = store.write_points(&[measurement("flow", 2.5)]).unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 400, .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_closed_store_refuses() {
        let store = InfluxStore::connect(InfluxConfig::default()).unwrap();
        store.close();
        assert!(matches!(store.ping(), Err(StoreError::NotConnected)));
    }
}
