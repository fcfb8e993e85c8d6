use super::ModelArgs;
use crate::{
    fetch::HttpFetcher,
    handler::{Handler, Reply},
};
use anyhow::Result;
use clap::Parser;
use std::{io::Read, sync::Arc, time::Duration};
use tiny_http::{Header, Method, Request, Response, Server};

/// Request bodies only carry a URL, anything larger is rejected with 413.
const MAX_REQUEST_BYTES: u64 = 64 * 1024;

const CORS_HEADERS: [&str; 3] = [
    "Access-Control-Allow-Origin: *",
    "Access-Control-Allow-Methods: GET, POST, PUT, DELETE",
    "Access-Control-Allow-Headers: Content-Type",
];

/// Serve predictions over HTTP.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct Args {
    #[clap(flatten)]
    models: ModelArgs,

    /// Load every model before accepting requests.
    #[clap(long)]
    preload: bool,

    #[clap(short, long, default_value = "5000")]
    port: u16,

    #[clap(short, long, default_value = "8")]
    threads: u16,

    #[clap(long, default_value = "0.0.0.0")]
    host: String,

    /// Give up fetching an image after this many seconds. Waits indefinitely when unset.
    #[clap(long)]
    fetch_timeout_secs: Option<u64>,

    /// Largest image download accepted, in bytes.
    #[clap(long, default_value = "20971520")]
    max_image_bytes: u64,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Predict(Option<String>),
    Preflight,
    MethodNotAllowed,
    NotFound,
}

fn route(method: &Method, url: &str) -> Route {
    if *method == Method::Options {
        return Route::Preflight;
    }

    let path = url.split('?').next().unwrap_or_default();
    let model_type = match path.strip_prefix("/predict") {
        Some("") | Some("/") => None,
        Some(rest) => match rest.strip_prefix('/') {
            Some(name) if !name.contains('/') => Some(name.to_owned()),
            _ => return Route::NotFound,
        },
        None => return Route::NotFound,
    };

    if *method != Method::Post {
        return Route::MethodNotAllowed;
    }

    Route::Predict(model_type)
}

fn with_headers<R: Read>(mut response: Response<R>, json: bool) -> Response<R> {
    for header in CORS_HEADERS {
        if let Ok(header) = header.parse::<Header>() {
            response.add_header(header);
        }
    }

    if json {
        if let Ok(header) = "Content-Type: application/json".parse::<Header>() {
            response.add_header(header);
        }
    }

    response
}

fn too_large() -> Reply {
    let body = serde_json::json!({
        "error": format!("request body is larger than {} bytes", MAX_REQUEST_BYTES)
    });

    Reply {
        status: 413,
        body: body.to_string().into_bytes(),
        json: true,
    }
}

fn respond(handler: &Handler, mut request: Request) -> std::io::Result<()> {
    let reply = match route(request.method(), request.url()) {
        Route::Predict(model_type) => {
            let declared = request.body_length().map_or(0, |len| len as u64);
            let mut body = vec![];
            request
                .as_reader()
                .take(MAX_REQUEST_BYTES + 1)
                .read_to_end(&mut body)?;

            if declared > MAX_REQUEST_BYTES || body.len() as u64 > MAX_REQUEST_BYTES {
                log::warn!("rejected request body over {} bytes", MAX_REQUEST_BYTES);
                too_large()
            } else {
                handler.handle(model_type.as_deref(), &body)
            }
        }
        Route::Preflight => Reply {
            status: 204,
            body: vec![],
            json: false,
        },
        Route::MethodNotAllowed => Reply {
            status: 405,
            body: b"Method Not Allowed".to_vec(),
            json: false,
        },
        Route::NotFound => Reply {
            status: 404,
            body: b"Not Found".to_vec(),
            json: false,
        },
    };

    let response = Response::from_data(reply.body).with_status_code(reply.status);
    request.respond(with_headers(response, reply.json))
}

fn run_server(server: Arc<Server>, handler: Arc<Handler>) {
    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_owned();

        if let Err(e) = respond(&handler, request) {
            log::warn!("failed responding to {} {}: {}", method, url, e);
        }
    }
}

pub(super) fn serve(config: Args) -> Result<()> {
    let pipeline = config.models.pipeline();
    if config.preload {
        pipeline.store().preload(pipeline.registry())?;
    }

    let fetcher = HttpFetcher::new(
        config.fetch_timeout_secs.map(Duration::from_secs),
        config.max_image_bytes,
    );
    let handler = Arc::new(Handler::new(pipeline, fetcher));

    let addr = format!("{}:{}", config.host, config.port);
    let server = Server::http(&addr).map_err(|e| anyhow::anyhow!("failed binding {}: {}", addr, e))?;
    let server = Arc::new(server);

    log::info!(
        "serving on {} with {} threads, models from {:?} ({} cache)",
        addr,
        config.threads,
        config.models.models_dir,
        handler.pipeline().store().policy()
    );

    let mut workers = vec![];
    for _ in 1..config.threads.max(1) {
        let server = server.clone();
        let handler = handler.clone();
        workers.push(std::thread::spawn(move || run_server(server, handler)));
    }

    run_server(server, handler);

    for worker in workers {
        if worker.join().is_err() {
            log::error!("worker thread panicked");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{respond, route, Route, MAX_REQUEST_BYTES};
    use crate::{fetch::HttpFetcher, handler::Handler};
    use lesion_core::{CachePolicy, ModelStore, Pipeline, Registry};
    use std::{sync::Arc, thread::JoinHandle, time::Duration};
    use tiny_http::{Method, Server};

    /// Bind an ephemeral port and answer `count` requests on a background thread.
    fn spawn_server(count: usize) -> (String, JoinHandle<()>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(Registry::new(dir.path())),
            ModelStore::new(CachePolicy::Cached),
        );
        let handler = Handler::new(
            pipeline,
            HttpFetcher::new(Some(Duration::from_secs(5)), 1024),
        );

        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let worker = std::thread::spawn(move || {
            for _ in 0..count {
                let request = server.recv().unwrap();
                respond(&handler, request).unwrap();
            }
        });

        (format!("http://{}", addr), worker, dir)
    }

    fn send(request: ureq::Request, body: Option<&str>) -> ureq::Response {
        let result = match body {
            Some(body) => request.send_string(body),
            None => request.call(),
        };

        match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => panic!("request failed: {}", e),
        }
    }

    fn assert_cors(response: &ureq::Response) {
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE")
        );
        assert_eq!(
            response.header("Access-Control-Allow-Headers"),
            Some("Content-Type")
        );
    }

    #[test]
    fn test_http_responses() {
        let (base, worker, _dir) = spawn_server(7);
        let predict = |path: &str| ureq::post(&format!("{}{}", base, path));

        let response = send(
            predict("/predict/unknown"),
            Some(r#"{"url": "http://127.0.0.1:1/lesion.png"}"#),
        );
        assert_eq!(response.status(), 400);
        assert_cors(&response);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(&response.into_string().unwrap()).unwrap();
        assert!(body["error"].as_str().unwrap().contains("unknown"));

        let response = send(predict("/predict/skin"), Some("{}"));
        assert_eq!(response.status(), 400);
        assert_cors(&response);
        assert_eq!(response.into_string().unwrap(), r#"{"error":"missing url"}"#);

        let response = send(
            ureq::request("OPTIONS", &format!("{}/predict/skin", base)),
            None,
        );
        assert_eq!(response.status(), 204);
        assert_cors(&response);

        let response = send(ureq::get(&format!("{}/predict/skin", base)), None);
        assert_eq!(response.status(), 405);
        assert_cors(&response);

        let response = send(
            predict("/predict/skin"),
            Some(r#"{"url": "http://127.0.0.1:1/lesion.png"}"#),
        );
        assert_eq!(response.status(), 500);
        assert_cors(&response);
        assert_eq!(response.into_string().unwrap(), "Internal Server Error");

        let response = send(predict("/nope"), Some("{}"));
        assert_eq!(response.status(), 404);
        assert_cors(&response);

        let oversized = format!(
            r#"{{"url": "http://127.0.0.1:1/lesion.png", "pad": "{}"}}"#,
            "x".repeat(MAX_REQUEST_BYTES as usize)
        );
        let response = send(predict("/predict/skin"), Some(&oversized));
        assert_eq!(response.status(), 413);
        assert_cors(&response);

        worker.join().unwrap();
    }

    #[test]
    fn test_route_predict() {
        assert_eq!(
            route(&Method::Post, "/predict/skin"),
            Route::Predict(Some("skin".to_owned()))
        );
        assert_eq!(
            route(&Method::Post, "/predict/unknown?x=1"),
            Route::Predict(Some("unknown".to_owned()))
        );
        assert_eq!(route(&Method::Post, "/predict"), Route::Predict(None));
        assert_eq!(route(&Method::Post, "/predict/"), Route::Predict(None));
    }

    #[test]
    fn test_route_other() {
        assert_eq!(route(&Method::Options, "/predict/skin"), Route::Preflight);
        assert_eq!(route(&Method::Get, "/predict/skin"), Route::MethodNotAllowed);
        assert_eq!(route(&Method::Post, "/predictions"), Route::NotFound);
        assert_eq!(route(&Method::Post, "/predict/skin/extra"), Route::NotFound);
        assert_eq!(route(&Method::Get, "/"), Route::NotFound);
    }
}
