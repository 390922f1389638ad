use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tungstenite::Message;

use super::message::{FeedMessage, decode_message};

#[derive(Debug)]
pub enum FeedEvent {
    Connected,
    Disconnected,
    Message(FeedMessage),
}

enum SessionEnd {
    Closed,
    ReceiverGone,
}

pub fn spawn_feed(url: String, reconnect_delay: Duration) -> Receiver<FeedEvent> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        loop {
            match run_session(&url, &tx) {
                Ok(SessionEnd::ReceiverGone) => return,
                Ok(SessionEnd::Closed) => info!(%url, "feed closed by server"),
                Err(error) => warn!(%url, "feed session failed: {error:#}"),
            }

            if tx.send(FeedEvent::Disconnected).is_err() {
                return;
            }
            thread::sleep(reconnect_delay);
        }
    });

    rx
}

fn run_session(url: &str, tx: &Sender<FeedEvent>) -> Result<SessionEnd> {
    let (mut socket, _response) =
        tungstenite::connect(url).with_context(|| format!("failed to connect to {url}"))?;
    info!(%url, "feed connected");

    if tx.send(FeedEvent::Connected).is_err() {
        return Ok(SessionEnd::ReceiverGone);
    }

    loop {
        let frame = socket.read().context("failed to read from feed socket")?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    debug!("dropping non UTF-8 feed frame");
                    continue;
                }
            },
            Message::Close(_) => return Ok(SessionEnd::Closed),
            _ => continue,
        };

        match decode_message(&text) {
            Ok(message) => {
                if tx.send(FeedEvent::Message(message)).is_err() {
                    let _ = socket.close(None);
                    return Ok(SessionEnd::ReceiverGone);
                }
            }
            Err(error) => debug!(%error, "dropping malformed feed message"),
        }
    }
}
