//! Bundled host bus: a stand-in for the host middleware so the node binary
//! is usable on its own.
//!
//! It pairs an in-process `MemoryRegistry` with a tiny_http endpoint:
//! - POST /save_param      {"param": "..."} -> {"success": bool}
//! - GET  /param/<name>    live registry value as JSON (404 if absent)
//! - PUT  /param/<name>    JSON body -> registry set (204)
//! - GET  /params          every live registry entry as a JSON object
//! - GET  /metrics         Prometheus text
//! - GET  /health | /ready
//!
//! Routing is a plain function of (method, url, body) so it can be exercised
//! without a socket. Requests are handled one at a time by `serve()`.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use tiny_http::{Header, Response, Server};

use crate::metrics;
use crate::node::{ParamNode, SaveRequest};
use crate::registry::{MemoryRegistry, ParamRegistry};
use crate::table::ParamValue;

const PARAM_PREFIX: &str = "/param/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusReply {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl BusReply {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            body,
            content_type: "application/json",
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain; charset=utf-8",
        }
    }
}

pub struct HostBus {
    node: Arc<ParamNode>,
    registry: Arc<MemoryRegistry>,
}

impl HostBus {
    pub fn new(node: Arc<ParamNode>, registry: Arc<MemoryRegistry>) -> Self {
        Self { node, registry }
    }

    pub fn route(&self, method: &str, url: &str, body: &str) -> BusReply {
        let path = url.split('?').next().unwrap_or("");

        match (method, path) {
            ("GET", "/") | ("GET", "/health") | ("GET", "/ready") => BusReply::text(200, "OK\n"),
            ("GET", "/metrics") => BusReply {
                status: 200,
                body: metrics::render_prometheus(),
                content_type: "text/plain; version=0.0.4",
            },
            ("POST", "/save_param") => self.save_param(body),
            ("GET", "/params") => match self
                .registry
                .snapshot()
                .and_then(|m| serde_json::to_string(&m).map_err(Into::into))
            {
                Ok(s) => BusReply::json(200, s),
                Err(e) => BusReply::text(500, format!("{e:#}\n")),
            },
            (m, p) if p.starts_with(PARAM_PREFIX) && p.len() > PARAM_PREFIX.len() => {
                // keep the leading '/' of the parameter name
                let name = &p[PARAM_PREFIX.len() - 1..];
                match m {
                    "GET" => self.get_param(name),
                    "PUT" => self.put_param(name, body),
                    _ => BusReply::text(405, "method not allowed\n"),
                }
            }
            _ => BusReply::text(404, "not found\n"),
        }
    }

    fn save_param(&self, body: &str) -> BusReply {
        let req: SaveRequest = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => return BusReply::text(400, format!("bad save request: {e}\n")),
        };
        let resp = self.node.serve_save(&req);
        match serde_json::to_string(&resp) {
            Ok(s) => BusReply::json(200, s),
            Err(e) => BusReply::text(500, format!("{e}\n")),
        }
    }

    fn get_param(&self, name: &str) -> BusReply {
        match self.registry.get(name) {
            Ok(Some(v)) => match serde_json::to_string(&v) {
                Ok(s) => BusReply::json(200, s),
                Err(e) => BusReply::text(500, format!("value is not representable as json: {e}\n")),
            },
            Ok(None) => BusReply::text(404, "no such parameter\n"),
            Err(e) => BusReply::text(500, format!("{e:#}\n")),
        }
    }

    fn put_param(&self, name: &str, body: &str) -> BusReply {
        let value: ParamValue = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => return BusReply::text(400, format!("bad json value: {e}\n")),
        };
        match self.registry.set(name, value) {
            Ok(()) => BusReply::text(204, ""),
            Err(e) => BusReply::text(500, format!("{e:#}\n")),
        }
    }

    /// Blocking accept loop; runs until the process is terminated.
    pub fn serve(&self, addr: &str) -> Result<()> {
        let server = Server::http(addr).map_err(|e| anyhow!("bind http at {}: {}", addr, e))?;
        info!("host bus listening on {}", addr);

        loop {
            let mut rq = match server.recv() {
                Ok(rq) => rq,
                Err(e) => {
                    warn!("http recv error: {}", e);
                    continue;
                }
            };

            let method = rq.method().as_str().to_string();
            let url = rq.url().to_string();
            let mut body = String::new();
            if let Err(e) = rq.as_reader().read_to_string(&mut body) {
                warn!("{} {}: read body: {}", method, url, e);
                let _ = rq.respond(Response::from_string("bad body\n").with_status_code(400));
                continue;
            }

            let reply = self.route(&method, &url, &body);
            let mut resp = Response::from_string(reply.body).with_status_code(reply.status);
            if let Ok(ct) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
                resp.add_header(ct);
            }
            if let Err(e) = rq.respond(resp) {
                error!("{} {}: respond: {}", method, url, e);
            }
        }
    }
}
