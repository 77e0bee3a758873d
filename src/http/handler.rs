//! Method dispatch and response assembly.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::http::files::{ResolveError, StaticFiles};
use crate::http::producer::FileProducer;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Turns a request for a supported method into a response.
pub type Handler = fn(&Dispatcher, &Request) -> anyhow::Result<Response>;

/// Resolves requests against the document root.
///
/// Methods are looked up by exact name in a fixed table; anything not in
/// it gets 405 without further inspection.
pub struct Dispatcher {
    files: StaticFiles,
    server_name: String,
    handlers: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    pub fn new(files: StaticFiles, server_name: impl Into<String>) -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert("GET", do_get);
        handlers.insert("HEAD", do_head);

        Self {
            files,
            server_name: server_name.into(),
            handlers,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StaticFiles::new(&config.static_files),
            config.server.server_name.clone(),
        )
    }

    /// Produces the response for `request`.
    ///
    /// An `Err` means no response can be sent (e.g. a file with an unknown
    /// content type); the caller should drop the connection.
    pub fn dispatch(&self, request: &Request) -> anyhow::Result<Response> {
        match self.handlers.get(request.method.as_str()) {
            Some(handler) => handler(self, request),
            None => Ok(self.error(StatusCode::MethodNotAllowed, &request.version)),
        }
    }

    pub fn error(&self, status: StatusCode, version: &str) -> Response {
        Response::error(status, version, &self.server_name)
    }

    fn send_head(&self, request: &Request, with_body: bool) -> anyhow::Result<Response> {
        let file = match self.files.open(&request.target) {
            Ok(file) => file,
            Err(ResolveError::Forbidden(path)) => {
                debug!(path = %path.display(), "Directory has no index");
                return Ok(self.error(StatusCode::Forbidden, &request.version));
            }
            Err(ResolveError::NotFound(path)) => {
                debug!(path = %path.display(), "File not found");
                return Ok(self.error(StatusCode::NotFound, &request.version));
            }
            Err(e) => return Err(e.into()),
        };

        let builder = ResponseBuilder::new(StatusCode::Ok)
            .version(&request.version)
            .standard_headers(&self.server_name)
            .header("Content-Type", file.content_type)
            .header("Content-Length", file.len);

        if !with_body {
            return Ok(builder.build());
        }

        let producer = FileProducer::with_chunk_size(file.file, self.files.chunk_size());
        Ok(builder.body(producer).build())
    }
}

fn do_get(dispatcher: &Dispatcher, request: &Request) -> anyhow::Result<Response> {
    dispatcher.send_head(request, true)
}

fn do_head(dispatcher: &Dispatcher, request: &Request) -> anyhow::Result<Response> {
    dispatcher.send_head(request, false)
}
