//! BCB SGS API integration.
//!
//! The SGS endpoint returns the full history of a series as a JSON array of
//! `{ "data": "DD/MM/YYYY", "valor": "..." }` objects. No authentication.

use reqwest::blocking::Client;

use crate::domain::RawObservation;
use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "http://api.bcb.gov.br";

/// Anything that can produce the raw observations of a series code.
///
/// The orchestrator only talks to this trait, so tests can substitute an
/// in-memory source for the HTTP client.
pub trait SeriesSource {
    fn fetch_series(&self, code: u32) -> Result<Vec<RawObservation>, AppError>;
}

impl<S: SeriesSource + ?Sized> SeriesSource for &S {
    fn fetch_series(&self, code: u32) -> Result<Vec<RawObservation>, AppError> {
        (**self).fetch_series(code)
    }
}

pub struct BcbClient {
    client: Client,
    base_url: String,
}

impl BcbClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn series_url(&self, code: u32) -> String {
        format!(
            "{}/dados/serie/bcdata.sgs.{code}/dados?formato=json",
            self.base_url
        )
    }
}

impl SeriesSource for BcbClient {
    fn fetch_series(&self, code: u32) -> Result<Vec<RawObservation>, AppError> {
        let url = self.series_url(code);
        tracing::debug!(%url, "requesting series");

        let resp = self.client.get(&url).send()?.error_for_status()?;
        let body = resp.text()?;

        serde_json::from_str(&body)
            .map_err(|e| AppError::payload(format!("failed to parse series {code} response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    /// Serve exactly one HTTP response and report the request line back.
    fn one_shot_server(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(request_line.trim_end().to_string()).unwrap();
        });

        (base_url, rx)
    }

    #[test]
    fn series_url_follows_sgs_template() {
        let client = BcbClient::new("http://api.bcb.gov.br/");
        assert_eq!(
            client.series_url(4189),
            "http://api.bcb.gov.br/dados/serie/bcdata.sgs.4189/dados?formato=json"
        );
    }

    #[test]
    fn fetch_series_parses_payload() {
        let (base_url, rx) = one_shot_server(
            "200 OK",
            r#"[{"data":"02/01/2024","valor":"11.75"},{"data":"03/01/2024","valor":"11.75"}]"#,
        );
        let client = BcbClient::new(base_url);

        let raw = client.fetch_series(4189).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0], RawObservation::new("02/01/2024", "11.75"));

        let request_line = rx.recv().unwrap();
        assert_eq!(
            request_line,
            "GET /dados/serie/bcdata.sgs.4189/dados?formato=json HTTP/1.1"
        );
    }

    #[test]
    fn http_error_status_is_a_failure() {
        let (base_url, _rx) = one_shot_server("503 Service Unavailable", "{}");
        let err = BcbClient::new(base_url).fetch_series(433).unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "unexpected error: {err}");
    }

    #[test]
    fn malformed_body_is_a_payload_failure() {
        let (base_url, _rx) = one_shot_server("200 OK", "<html>maintenance</html>");
        let err = BcbClient::new(base_url).fetch_series(433).unwrap_err();
        assert!(matches!(err, AppError::Payload(_)), "unexpected error: {err}");
    }

    #[test]
    fn unreachable_host_is_a_failure() {
        // Bind then drop to get a port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = BcbClient::new(format!("http://127.0.0.1:{port}"))
            .fetch_series(433)
            .unwrap_err();
        assert!(matches!(err, AppError::Http(_)));
    }
}
