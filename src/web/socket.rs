//! WebSocket wrapper. Every callback reports through `app::socket_event`
//! tagged with the connection id it was opened for.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use super::app;
use crate::error::Result;
use crate::source::SocketEvent;

pub struct SocketHandle {
    ws: WebSocket,
    id: u64,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl SocketHandle {
    pub fn connect(url: &str, id: u64) -> Result<Self> {
        let ws = WebSocket::new(url)?;

        let on_open = Closure::wrap(Box::new(move |_: Event| {
            app::socket_event(id, SocketEvent::Open);
        }) as Box<dyn FnMut(Event)>);
        let on_message = Closure::wrap(Box::new(move |evt: MessageEvent| {
            if let Some(text) = evt.data().as_string() {
                app::socket_event(id, SocketEvent::Message(text));
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        let on_close = Closure::wrap(Box::new(move |_: CloseEvent| {
            app::socket_event(id, SocketEvent::Close);
        }) as Box<dyn FnMut(CloseEvent)>);
        let on_error = Closure::wrap(Box::new(move |evt: Event| {
            app::socket_event(id, SocketEvent::Error(evt.type_()));
        }) as Box<dyn FnMut(Event)>);

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Self {
            ws,
            id,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sends only while the socket is open; returns whether it did.
    pub fn send_text(&self, data: &str) -> bool {
        self.ws.ready_state() == WebSocket::OPEN && self.ws.send_with_str(data).is_ok()
    }
}

impl Drop for SocketHandle {
    // handlers go first so the closures are never called after being freed
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        self.ws.close().ok();
    }
}

/// `ws:`/`wss:` URL on the page's own host.
pub fn socket_url(protocol: &str, host: &str, path: &str) -> String {
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    let path = path.trim_start_matches('/');
    format!("{scheme}://{host}/{path}")
}

#[cfg(test)]
mod tests {
    use super::socket_url;

    #[test]
    fn test_socket_url_follows_page_protocol() {
        assert_eq!(
            socket_url("https:", "example.com", "/v1/emotion_classification/game-ws"),
            "wss://example.com/v1/emotion_classification/game-ws"
        );
        assert_eq!(
            socket_url("http:", "localhost:8000", "game-ws"),
            "ws://localhost:8000/game-ws"
        );
    }
}
