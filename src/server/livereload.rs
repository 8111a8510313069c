// src/server/livereload.rs

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Messages pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Swap one stylesheet in place; `path` is relative to the server root.
    Css { path: String },
}

/// Handle for pushing live-reload messages.
///
/// Created once per process and cloned into every task context and into the
/// dev server. Pushing while no browser is connected is a no-op.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<ReloadMessage>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Ask every client to reload the page. Returns how many were notified.
    pub fn reload(&self) -> usize {
        self.push(ReloadMessage::Reload)
    }

    /// Ask every client to re-fetch the stylesheet at `path`.
    pub fn inject_css(&self, path: impl Into<String>) -> usize {
        self.push(ReloadMessage::Css { path: path.into() })
    }

    fn push(&self, msg: ReloadMessage) -> usize {
        match self.tx.send(msg) {
            Ok(n) => {
                debug!(clients = n, "live-reload message sent");
                n
            }
            Err(broadcast::error::SendError(msg)) => {
                debug!(?msg, "no live-reload clients connected");
                0
            }
        }
    }
}

/// Browser side of live reload, served at [`CLIENT_PATH`](super::CLIENT_PATH).
pub const CLIENT_JS: &str = r#"(function () {
  var scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';

  function refreshCss(path) {
    var name = path.split('/').pop();
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    var matched = false;
    for (var i = 0; i < links.length; i++) {
      var href = (links[i].getAttribute('href') || '').split('?')[0];
      if (href.split('/').pop() === name) {
        links[i].setAttribute('href', href + '?livereload=' + Date.now());
        matched = true;
      }
    }
    if (!matched) {
      location.reload();
    }
  }

  function connect() {
    var ws = new WebSocket(scheme + location.host + '/__assetdag/ws');
    ws.onmessage = function (event) {
      var msg = JSON.parse(event.data);
      if (msg.type === 'reload') {
        location.reload();
      } else if (msg.type === 'css') {
        refreshCss(msg.path);
      }
    };
    ws.onclose = function () {
      setTimeout(connect, 1000);
    };
  }

  connect();
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_without_clients_are_no_ops() {
        let lr = LiveReload::new();
        assert_eq!(lr.client_count(), 0);
        assert_eq!(lr.reload(), 0);
        assert_eq!(lr.inject_css("css/styles.min.css"), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_messages_in_order() {
        let lr = LiveReload::new();
        let mut rx = lr.subscribe();

        assert_eq!(lr.inject_css("css/styles.min.css"), 1);
        assert_eq!(lr.reload(), 1);

        assert_eq!(
            rx.recv().await.unwrap(),
            ReloadMessage::Css {
                path: "css/styles.min.css".into()
            }
        );
        assert_eq!(rx.recv().await.unwrap(), ReloadMessage::Reload);
    }

    #[test]
    fn messages_serialize_with_a_type_tag() {
        assert_eq!(
            serde_json::to_string(&ReloadMessage::Reload).unwrap(),
            r#"{"type":"reload"}"#
        );
        assert_eq!(
            serde_json::to_string(&ReloadMessage::Css { path: "css/a.css".into() }).unwrap(),
            r#"{"type":"css","path":"css/a.css"}"#
        );
    }
}
