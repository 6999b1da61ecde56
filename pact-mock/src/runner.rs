use crate::{data::RequestData, error::Error, session::SessionData, util};
use hyper::{
    body,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use std::{
    convert::Infallible,
    net::{SocketAddr, TcpListener},
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio::{runtime::Builder, sync::watch};
use tracing::{debug, error, info, warn};

/// A mock provider endpoint served from its own runtime thread.
#[derive(Debug)]
pub(crate) struct RunningServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    join_handle: Option<JoinHandle<Result<(), Error>>>,
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops accepting connections, lets in-flight requests drain and joins the server thread.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        let join_handle = match self.join_handle.take() {
            Some(join_handle) => join_handle,
            None => return Ok(()),
        };

        // The receiver is gone only when the server already stopped on its own.
        let _ = self.shutdown.send(true);

        let result = join_handle.join().map_err(|_| Error::ServerPanicked)?;
        info!(addr = %self.addr, "mock provider stopped");
        result
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(error = %e, "mock provider didn't shut down cleanly");
        }
    }
}

pub(crate) fn start(
    port: u16,
    session: Arc<Mutex<SessionData>>,
    drain_timeout: Duration,
) -> Result<RunningServer, Error> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("pact-mock-worker")
        .enable_all()
        .build()?;
    let (shutdown, signal) = watch::channel(false);

    let join_handle = thread::Builder::new()
        .name(format!("pact-mock-{}", addr.port()))
        .spawn(move || {
            runtime.block_on(serve(listener, session, signal, drain_timeout))
        })?;

    info!(%addr, "mock provider listening");

    Ok(RunningServer {
        addr,
        shutdown,
        join_handle: Some(join_handle),
    })
}

async fn serve(
    listener: TcpListener,
    session: Arc<Mutex<SessionData>>,
    signal: watch::Receiver<bool>,
    drain_timeout: Duration,
) -> Result<(), Error> {
    let server = Server::from_tcp(listener)?.serve(make_service_fn(move |_| {
        let session = session.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(req, session.clone())))
        }
    }));

    let mut graceful_signal = signal.clone();
    let graceful = server.with_graceful_shutdown(async move {
        let _ = graceful_signal.changed().await;
    });

    let mut deadline_signal = signal;
    let deadline = async move {
        let _ = deadline_signal.changed().await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = graceful => {
            if let Err(e) = &result {
                error!(error = %e, "mock provider server error");
            }
            Ok(result?)
        }
        _ = deadline => {
            warn!(?drain_timeout, "in-flight requests didn't drain in time, closing anyway");
            Ok(())
        }
    }
}

async fn handle_request(
    mut request: Request<Body>,
    session: Arc<Mutex<SessionData>>,
) -> Result<Response<Body>, Infallible> {
    let result = match read_request_data(&mut request).await {
        Ok(request_data) => respond(&session, &request_data),
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Ok(response),
        Err(e) => {
            error!(error = %e, "couldn't answer request");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            Ok(response)
        }
    }
}

fn respond(
    session: &Mutex<SessionData>,
    request_data: &RequestData,
) -> Result<Response<Body>, Error> {
    debug!(method = %request_data.method, uri = %request_data.uri, "request received");
    let response_data = session.lock()?.dispatch(request_data);

    let mut response_builder = Response::builder().status(response_data.status_code);

    util::put_headers(
        response_builder.headers_mut().ok_or(Error::InvalidBody)?,
        &response_data.headers,
    )?;

    Ok(response_builder.body(response_data.body.into())?)
}

async fn read_request_data(request: &mut Request<Body>) -> Result<RequestData, Error> {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let headers = util::extract_headers(request.headers());

    let body = body::to_bytes(request.body_mut())
        .await
        .map_err(|_| Error::InvalidBody)?;

    Ok(RequestData {
        method,
        uri,
        headers,
        body: String::from_utf8_lossy(&body).into(),
    })
}
