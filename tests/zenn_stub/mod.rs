use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ZennStubConfig {
    pub book_id: String,
    pub build_id: String,
    /// Book page omits the build id when set, to exercise the fatal path.
    pub omit_build_id: bool,
    pub chapters: Vec<StubChapter>,
}

#[derive(Debug, Clone)]
pub struct StubChapter {
    pub id: u64,
    pub title: String,
    /// `None` makes the chapter body endpoint answer 500.
    pub body_html: Option<String>,
}

pub struct ZennStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ZennStub {
    pub fn spawn(config: ZennStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start zenn stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let page_path = format!("/{}", config.book_id);
            let data_path = format!("/_next/data/{}/{}.json", config.build_id, config.book_id);

            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();

                if path == page_path {
                    let body = if config.omit_build_id {
                        "<html><body>no next data here</body></html>".to_owned()
                    } else {
                        format!(
                            "<html><script>{{\"props\":{{}},\"buildId\":\"{}\"}}</script></html>",
                            config.build_id
                        )
                    };
                    let _ = request.respond(tiny_http::Response::from_string(body));
                    continue;
                }

                if path == data_path {
                    let chapters = config
                        .chapters
                        .iter()
                        .enumerate()
                        .map(|(idx, ch)| {
                            serde_json::json!({
                                "id": ch.id,
                                "title": ch.title,
                                "slug": format!("ch-{}", idx + 1),
                                "position": idx + 1,
                            })
                        })
                        .collect::<Vec<_>>();
                    let body = serde_json::json!({
                        "pageProps": { "chapters": chapters }
                    });
                    let _ = request.respond(json_response(body.to_string()));
                    continue;
                }

                if let Some(raw_id) = path.strip_prefix("/api/chapters/") {
                    let chapter = raw_id
                        .parse::<u64>()
                        .ok()
                        .and_then(|id| config.chapters.iter().find(|ch| ch.id == id));
                    match chapter.and_then(|ch| ch.body_html.clone()) {
                        Some(body_html) => {
                            let body = serde_json::json!({
                                "chapter": { "body_html": body_html }
                            });
                            let _ = request.respond(json_response(body.to_string()));
                        }
                        None => {
                            let _ = request.respond(
                                tiny_http::Response::from_string("chapter unavailable")
                                    .with_status_code(500),
                            );
                        }
                    }
                    continue;
                }

                let _ = request
                    .respond(tiny_http::Response::from_string("not found").with_status_code(404));
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

fn json_response(body: String) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(body).with_header(header)
}

impl Drop for ZennStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
