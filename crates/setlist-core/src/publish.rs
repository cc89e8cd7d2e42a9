//! Publishing a session to an external upload target.
//!
//! The push is a small metadata message: a fixed label and the session
//! date. Track rows are only attached when explicitly enabled. Failures are
//! reported once; retrying is the caller's decision.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PublishConfig;
use crate::error::PublishError;
use crate::session::PlaylistSession;
use crate::track::TrackRow;

/// Default timeout for publish requests.
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 30;

/// Longest slice of a rejection body kept in the error message.
const MAX_REASON_LEN: usize = 200;

/// Message sent to the upload target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRequest {
    /// Fixed label identifying the show or list.
    pub label: String,
    /// Session date.
    pub date: String,
    /// Track rows, when the gateway is configured to include them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackRow>>,
}

/// Delivers publish requests somewhere.
///
/// This trait allows for mocking in tests.
#[cfg_attr(test, mockall::automock)]
pub trait PublishTarget: Send + Sync {
    /// Human-readable description of the destination, for logs.
    fn describe(&self) -> String;

    /// Send one request.
    fn send(&self, request: &PublishRequest) -> Result<(), PublishError>;
}

/// Posts publish requests as JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPublishTarget {
    endpoint: String,
    timeout: Duration,
    use_proxy: bool,
}

impl HttpPublishTarget {
    /// Create a target for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
            use_proxy: true,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect directly, ignoring proxy environment variables.
    #[must_use]
    pub const fn without_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    fn unreachable(&self, reason: impl Into<String>) -> PublishError {
        PublishError::Unreachable {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}

impl PublishTarget for HttpPublishTarget {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    fn send(&self, request: &PublishRequest) -> Result<(), PublishError> {
        let mut builder = reqwest::blocking::Client::builder().timeout(self.timeout);
        if !self.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| self.unreachable(format!("Failed to create HTTP client: {e}")))?;

        let response = client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| self.unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        let body = body.trim();
        let reason = if body.is_empty() {
            status.to_string()
        } else {
            let excerpt: String = body.chars().take(MAX_REASON_LEN).collect();
            format!("{status}: {excerpt}")
        };
        Err(PublishError::Rejected { reason })
    }
}

/// Stand-in target used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTarget;

impl PublishTarget for UnconfiguredTarget {
    fn describe(&self) -> String {
        "<unconfigured>".to_string()
    }

    fn send(&self, _request: &PublishRequest) -> Result<(), PublishError> {
        Err(PublishError::Unreachable {
            endpoint: self.describe(),
            reason: "no publish endpoint configured".to_string(),
        })
    }
}

/// Pushes session metadata to a [`PublishTarget`].
pub struct PublishGateway {
    target: Box<dyn PublishTarget>,
    include_tracks: bool,
}

impl std::fmt::Debug for PublishGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishGateway")
            .field("target", &self.target.describe())
            .field("include_tracks", &self.include_tracks)
            .finish()
    }
}

impl PublishGateway {
    /// Create a gateway sending label and date only.
    pub fn new(target: Box<dyn PublishTarget>) -> Self {
        Self {
            target,
            include_tracks: false,
        }
    }

    /// Build a gateway from configuration.
    ///
    /// Without an endpoint every push fails as unreachable.
    #[must_use]
    pub fn from_config(config: &PublishConfig) -> Self {
        let target: Box<dyn PublishTarget> = match &config.endpoint {
            Some(endpoint) => Box::new(
                HttpPublishTarget::new(endpoint.clone())
                    .with_timeout(Duration::from_secs(config.timeout_secs)),
            ),
            None => Box::new(UnconfiguredTarget),
        };
        Self::new(target).with_tracks(config.include_tracks)
    }

    /// Attach track rows to every push.
    #[must_use]
    pub const fn with_tracks(mut self, include_tracks: bool) -> Self {
        self.include_tracks = include_tracks;
        self
    }

    /// Push `label` and `date` for the given session.
    pub fn push(
        &self,
        session: &PlaylistSession,
        label: &str,
        date: &str,
    ) -> Result<(), PublishError> {
        if !session.has_data() {
            return Err(PublishError::NoData);
        }

        let request = PublishRequest {
            label: label.to_string(),
            date: date.to_string(),
            tracks: self.include_tracks.then(|| session.rows()),
        };

        debug!(
            "Publishing '{}' ({}) to {}",
            request.label,
            request.date,
            self.target.describe()
        );

        self.target.send(&request).inspect_err(|e| {
            warn!("Publish to {} failed: {}", self.target.describe(), e);
        })?;

        info!("Published '{}' for {}", label, date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MockPlaylistLoader;
    use crate::session::LoadedPlaylist;
    use crate::track::{Playtime, TrackRecord};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use std::thread::{self, JoinHandle};

    fn session_with(tracks: Vec<TrackRecord>) -> PlaylistSession {
        let mut loader = MockPlaylistLoader::new();
        loader.expect_load().returning(move |_| {
            Ok(LoadedPlaylist {
                name: "Ruff Cut".to_string(),
                date: "2018-05-12".to_string(),
                tracks: tracks.clone(),
            })
        });
        let mut session = PlaylistSession::new();
        session
            .load(Path::new("set.csv"), &loader)
            .expect("Load should succeed");
        session
    }

    fn loaded_session() -> PlaylistSession {
        session_with(vec![TrackRecord::new("A", "Song1", Playtime::ZERO)])
    }

    /// Serve one HTTP exchange on a local port.
    ///
    /// Answers with `status_line` and `body`, and yields the raw request
    /// (head and body) once the exchange is over.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Should bind local port");
        let url = format!(
            "http://{}/publish",
            listener.local_addr().expect("Should have address")
        );

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("Should accept connection");
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("Should read header line");
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().expect("Should parse length");
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).expect("Should read body");

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream
                .write_all(response.as_bytes())
                .expect("Should write response");
            stream.flush().expect("Should flush response");

            head + &String::from_utf8_lossy(&payload)
        });

        (url, handle)
    }

    fn request() -> PublishRequest {
        PublishRequest {
            label: "Ruff Cut".to_string(),
            date: "2018-05-12".to_string(),
            tracks: None,
        }
    }

    #[test]
    fn test_push_sends_label_and_date_only() {
        let mut target = MockPublishTarget::new();
        target.expect_describe().returning(|| "mock".to_string());
        target
            .expect_send()
            .withf(|req| req.label == "Ruff Cut" && req.date == "12.5." && req.tracks.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let gateway = PublishGateway::new(Box::new(target));
        gateway
            .push(&loaded_session(), "Ruff Cut", "12.5.")
            .expect("Push should succeed");
    }

    #[test]
    fn test_push_with_tracks() {
        let mut target = MockPublishTarget::new();
        target.expect_describe().returning(|| "mock".to_string());
        target
            .expect_send()
            .withf(|req| req.tracks.as_ref().is_some_and(|t| t.len() == 1 && t[0].position == 1))
            .times(1)
            .returning(|_| Ok(()));

        let gateway = PublishGateway::new(Box::new(target)).with_tracks(true);
        gateway
            .push(&loaded_session(), "Ruff Cut", "2018-05-12")
            .expect("Push should succeed");
    }

    #[test]
    fn test_push_empty_session_is_no_data_without_sending() {
        let mut target = MockPublishTarget::new();
        target.expect_describe().returning(|| "mock".to_string());
        target.expect_send().times(0);

        let gateway = PublishGateway::new(Box::new(target));
        let result = gateway.push(&PlaylistSession::new(), "Ruff Cut", "");
        assert_eq!(result, Err(PublishError::NoData));
    }

    #[test]
    fn test_push_reports_rejection_without_retry() {
        let mut target = MockPublishTarget::new();
        target.expect_describe().returning(|| "mock".to_string());
        target.expect_send().times(1).returning(|_| {
            Err(PublishError::Rejected {
                reason: "403 Forbidden".to_string(),
            })
        });

        let gateway = PublishGateway::new(Box::new(target));
        let result = gateway.push(&loaded_session(), "Ruff Cut", "");
        assert!(matches!(result, Err(PublishError::Rejected { .. })));
    }

    #[test]
    fn test_unconfigured_target_is_unreachable() {
        let gateway = PublishGateway::from_config(&PublishConfig::default());
        let result = gateway.push(&loaded_session(), "Ruff Cut", "");
        assert!(matches!(result, Err(PublishError::Unreachable { .. })));
    }

    #[test]
    fn test_push_loaded_session_without_tracks() {
        let mut target = MockPublishTarget::new();
        target.expect_describe().returning(|| "mock".to_string());
        target
            .expect_send()
            .withf(|req| req.tracks.as_ref().is_some_and(Vec::is_empty))
            .times(1)
            .returning(|_| Ok(()));

        let gateway = PublishGateway::new(Box::new(target)).with_tracks(true);
        gateway
            .push(&session_with(Vec::new()), "Ruff Cut", "2018-05-12")
            .expect("Push should succeed");
    }

    #[test]
    fn test_http_target_posts_json() {
        let (url, server) = serve_once("200 OK", "");
        let target = HttpPublishTarget::new(url)
            .with_timeout(Duration::from_secs(5))
            .without_proxy();

        target.send(&request()).expect("Send should succeed");

        let received = server.join().expect("Server thread should finish");
        assert!(received.starts_with("POST /publish "));
        assert!(received.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(received.contains(r#""label":"Ruff Cut""#));
        assert!(received.contains(r#""date":"2018-05-12""#));
    }

    #[test]
    fn test_http_target_maps_error_status_to_rejected() {
        let (url, server) = serve_once("403 Forbidden", "label not allowed");
        let target = HttpPublishTarget::new(url)
            .with_timeout(Duration::from_secs(5))
            .without_proxy();

        let err = target.send(&request()).expect_err("Should be rejected");
        server.join().expect("Server thread should finish");

        let PublishError::Rejected { reason } = &err else {
            panic!("Expected rejection, got {err:?}");
        };
        assert!(reason.contains("403"));
        assert!(reason.contains("label not allowed"));
        assert!(!crate::Error::from(err).is_retryable());
    }

    #[test]
    fn test_http_target_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Should bind local port");
        let url = format!(
            "http://{}/publish",
            listener.local_addr().expect("Should have address")
        );
        drop(listener);

        let target = HttpPublishTarget::new(url.clone())
            .with_timeout(Duration::from_secs(5))
            .without_proxy();
        let err = target.send(&request()).expect_err("Nothing is listening");

        assert!(matches!(
            &err,
            PublishError::Unreachable { endpoint, .. } if *endpoint == url
        ));
        assert!(crate::Error::from(err).is_retryable());
    }

    #[test]
    fn test_request_json_omits_tracks_by_default() {
        let request = PublishRequest {
            label: "Ruff Cut".to_string(),
            date: "2018-05-12".to_string(),
            tracks: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["label"], "Ruff Cut");
        assert_eq!(json["date"], "2018-05-12");
        assert!(json.get("tracks").is_none());
    }
}
