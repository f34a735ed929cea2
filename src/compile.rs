//! Remote scene compilation
//!
//! Source text goes to a compiler service; the scene it returns is loaded
//! into the stage. Failures are logged and leave the current scene alone.
//! A result that arrives after the stage was disposed is discarded.

use std::cell::RefCell;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::config::StageConfig;
use crate::error::{Result, StageError};
use crate::scene::{LoadReport, SceneDescription};
use crate::stage::Stage;

/// Turns source text into a scene description
#[allow(async_fn_in_trait)]
pub trait CompileTransport {
    async fn compile(&self, source: &str) -> Result<SceneDescription>;
}

/// POSTs `source` as a form field to the compiler endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| StageError::Config(format!("invalid compile url '{}': {}", url, e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| StageError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn from_config(config: &StageConfig) -> Result<Self> {
        Self::new(&config.compile_url, config.compile_timeout())
    }

    fn map_err(&self, err: reqwest::Error) -> StageError {
        if err.is_timeout() {
            StageError::CompileTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            err.into()
        }
    }
}

impl CompileTransport for HttpTransport {
    async fn compile(&self, source: &str) -> Result<SceneDescription> {
        log::debug!("Compiling {} bytes via {}", source.len(), self.url);
        let response = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .form(&[("source", source)])
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::CompileStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_err(e))?;
        SceneDescription::from_json(&body)
    }
}

/// Result of one compile request
#[derive(Debug)]
pub enum CompileOutcome {
    /// Scene loaded into the stage
    Loaded(LoadReport),
    /// Compilation or loading failed; the stage kept its scene
    Failed(StageError),
    /// Stage was disposed before the result arrived
    Discarded,
}

impl CompileOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, CompileOutcome::Loaded(_))
    }
}

/// Compiles source and feeds the resulting scene to a stage
#[derive(Debug, Clone)]
pub struct CompileClient<T> {
    transport: T,
}

impl<T: CompileTransport> CompileClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Compile `source` and load the result
    ///
    /// The stage is not borrowed while the request is in flight, and its
    /// state is re-checked once the response arrives.
    pub async fn compile(&self, source: &str, stage: &RefCell<Stage>) -> CompileOutcome {
        let result = self.transport.compile(source).await;

        let mut stage = stage.borrow_mut();
        if stage.is_disposed() {
            log::info!("Discarding compile result: simulation was disposed");
            return CompileOutcome::Discarded;
        }

        let scene = match result {
            Ok(scene) => scene,
            Err(e) => {
                log::error!("Compile failed: {}", e);
                return CompileOutcome::Failed(e);
            }
        };

        match stage.load(scene) {
            Ok(report) => {
                log::info!("Compiled scene loaded ({} bodies)", report.committed);
                CompileOutcome::Loaded(report)
            }
            Err(e) => {
                log::error!("Compiled scene could not be loaded: {}", e);
                CompileOutcome::Failed(e)
            }
        }
    }
}

impl CompileClient<HttpTransport> {
    pub fn from_config(config: &StageConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::from_config(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyId;
    use crate::sim::LifecyclePhase;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::rc::Rc;
    use std::sync::mpsc;

    const FIRST: &str = r#"{ "bodies": [
        { "shape": "circle", "position": { "x": 1, "y": 2 }, "name": "a" },
        { "shape": "rectangle", "position": { "x": 3, "y": 4 }, "name": "b" }
    ] }"#;

    const SECOND: &str = r#"{ "bodies": [
        { "shape": "circle", "position": { "x": 9, "y": 9 }, "name": "z" }
    ] }"#;

    struct FixedTransport(&'static str);

    impl CompileTransport for FixedTransport {
        async fn compile(&self, _source: &str) -> Result<SceneDescription> {
            SceneDescription::from_json(self.0)
        }
    }

    struct TimeoutTransport;

    impl CompileTransport for TimeoutTransport {
        async fn compile(&self, _source: &str) -> Result<SceneDescription> {
            Err(StageError::CompileTimeout { timeout_ms: 5000 })
        }
    }

    /// Disposes the stage while the request is "in flight"
    struct DisposingTransport(Rc<RefCell<Stage>>);

    impl CompileTransport for DisposingTransport {
        async fn compile(&self, _source: &str) -> Result<SceneDescription> {
            self.0.borrow_mut().dispose();
            SceneDescription::from_json(SECOND)
        }
    }

    fn loaded_stage() -> RefCell<Stage> {
        let mut stage = Stage::default();
        stage.load_json(FIRST).unwrap();
        RefCell::new(stage)
    }

    fn body_ids(stage: &Stage) -> Vec<Option<BodyId>> {
        stage.bodies().unwrap().iter().map(|b| b.id()).collect()
    }

    #[tokio::test]
    async fn test_successful_compile_loads_scene() {
        let stage = loaded_stage();
        let client = CompileClient::new(FixedTransport(SECOND));

        let outcome = client.compile("ball = circle", &stage).await;
        assert!(outcome.is_loaded());
        let stage = stage.borrow();
        assert_eq!(stage.variables().names(), vec!["z"]);
        assert_eq!(stage.phase(), LifecyclePhase::Ready);
    }

    #[tokio::test]
    async fn test_failed_compile_keeps_scene() {
        let stage = loaded_stage();
        let names_before: Vec<String> = stage.borrow().variables().names().into_iter().map(String::from).collect();
        let ids_before = body_ids(&stage.borrow());

        let client = CompileClient::new(TimeoutTransport);
        let outcome = client.compile("anything", &stage).await;

        assert!(matches!(
            outcome,
            CompileOutcome::Failed(StageError::CompileTimeout { timeout_ms: 5000 })
        ));
        let stage = stage.borrow();
        let names_after: Vec<String> = stage.variables().names().into_iter().map(String::from).collect();
        assert_eq!(names_after, names_before);
        assert_eq!(body_ids(&stage), ids_before);
    }

    #[tokio::test]
    async fn test_result_after_dispose_is_discarded() {
        let stage = Rc::new(loaded_stage());
        let client = CompileClient::new(DisposingTransport(stage.clone()));

        let outcome = client.compile("anything", &stage).await;
        assert!(matches!(outcome, CompileOutcome::Discarded));
        let stage = stage.borrow();
        assert_eq!(stage.phase(), LifecyclePhase::Disposed);
        assert!(!stage.variables().contains("z"));
    }

    #[tokio::test]
    async fn test_undecodable_response_keeps_scene() {
        let stage = loaded_stage();
        let client = CompileClient::new(FixedTransport("<html>oops</html>"));
        let outcome = client.compile("x", &stage).await;
        assert!(matches!(outcome, CompileOutcome::Failed(StageError::Decode(_))));
        assert_eq!(stage.borrow().variables().names(), vec!["a", "b"]);
    }

    #[test]
    fn test_http_transport_rejects_relative_url() {
        let err = HttpTransport::new("/compile", Duration::from_millis(5000)).unwrap_err();
        assert!(matches!(err, StageError::Config(_)));
    }

    /// Serve one HTTP response on a local port; yields the request body
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/compile", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((key, value)) = line.split_once(':') {
                    if key.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request_body).into_owned());

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        (url, rx)
    }

    #[tokio::test]
    async fn test_http_transport_posts_source() {
        let (url, rx) = serve_once("HTTP/1.1 200 OK", SECOND);
        let transport = HttpTransport::new(&url, Duration::from_millis(5000)).unwrap();

        let scene = transport.compile("ball = circle(1, 2)").await.unwrap();
        assert_eq!(scene.bodies.unwrap().len(), 1);
        let request_body = rx.recv().unwrap();
        assert!(request_body.starts_with("source="));
    }

    #[tokio::test]
    async fn test_http_transport_error_status() {
        let (url, _rx) = serve_once("HTTP/1.1 500 Internal Server Error", "{}");
        let transport = HttpTransport::new(&url, Duration::from_millis(5000)).unwrap();

        let err = transport.compile("x").await.unwrap_err();
        assert!(matches!(err, StageError::CompileStatus { status: 500 }));
    }

    #[tokio::test]
    async fn test_http_transport_timeout() {
        // Accepts the connection at the OS level but never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/compile", listener.local_addr().unwrap());
        let transport = HttpTransport::new(&url, Duration::from_millis(200)).unwrap();

        let err = transport.compile("x").await.unwrap_err();
        assert!(matches!(err, StageError::CompileTimeout { timeout_ms: 200 }));
        drop(listener);
    }
}
