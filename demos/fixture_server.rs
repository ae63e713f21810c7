use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use formpart::{Constraints, Field, SizeLimit};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

// A fixture upload endpoint: decodes the submitted form and echoes a
// summary of every field back to the test.
async fn handle(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| formpart::parse_boundary(ct).ok());

    let boundary = match boundary {
        Some(boundary) => boundary,
        None => return Ok(reply(StatusCode::BAD_REQUEST, "expected multipart/form-data".to_owned())),
    };

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => return Ok(reply(StatusCode::BAD_REQUEST, format!("failed to read body: {}", err))),
    };

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(15 * 1024 * 1024));

    let form = match formpart::decode_with_constraints(body, &boundary, &constraints) {
        Ok(form) => form,
        Err(err) => return Ok(reply(StatusCode::BAD_REQUEST, err.to_string())),
    };

    let mut summary = String::new();
    for field in &form {
        match field {
            Field::Value(value) => {
                summary.push_str(&format!("{:?} = {:?}\n", value.name(), value.value()));
            }
            Field::File(file) => {
                summary.push_str(&format!(
                    "{:?} <- {} ({} bytes)\n",
                    file.name(),
                    file.file_name(),
                    file.data().len()
                ));
            }
        }
    }

    Ok(reply(StatusCode::OK, summary))
}

fn reply(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(Bytes::from(body)));
    *res.status_mut() = status;
    res
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    let listener = TcpListener::bind(addr).await?;
    println!("Fixture server is running at: {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service_fn(handle)).await {
                eprintln!("server error: {}", err);
            }
        });
    }
}
