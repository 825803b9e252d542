use anyhow::Result;
use base64::Engine;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use voicelink::{
    ClientOptions, MicSource, NatsTransport, Session, SessionEvent, TransportChannel, ViewState,
};

/// Print the parts of the view that changed since the last render
fn render(view: &ViewState, prev: &ViewState) {
    if view.status != prev.status || view.connected != prev.connected {
        let conn = if view.connected { "online" } else { "offline" };
        println!("[{}] {} ({})", view.state, view.status, conn);
    }

    if view.response_text != prev.response_text {
        if let Some(text) = &view.response_text {
            println!("agent: {}", text);
        }
    }

    if view.tts_audio != prev.tts_audio {
        if let Some(b64) = &view.tts_audio {
            match base64::engine::general_purpose::STANDARD.decode(b64) {
                Ok(bytes) => println!("speech: {} bytes of WAV audio", bytes.len()),
                Err(e) => warn!("reply audio was not valid base64: {}", e),
            }
        }
    }
}

// One logical event loop; suspension only at async boundaries.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let options = ClientOptions::default();
    info!("voicelink v0.1.0");
    info!(
        session_id = %options.session_id,
        chunk_interval_ms = options.chunk_interval.as_millis() as u64,
        server = %options.server_url,
        "starting"
    );

    let (transport, mut transport_rx) =
        NatsTransport::connect(&options.server_url, options.session_id.clone()).await?;
    let transport: Arc<dyn TransportChannel> = Arc::new(transport);

    let (session, handle) = Session::new(options, Box::new(MicSource::new()), transport);

    // Inbound transport events feed the session's ordered queue.
    let bridge_events = handle.events.clone();
    let bridge = tokio::spawn(async move {
        while let Some(event) = transport_rx.recv().await {
            if bridge_events.send(event.into()).await.is_err() {
                break;
            }
        }
    });

    // Render on every applied event.
    let mut view_rx = handle.view.clone();
    tokio::spawn(async move {
        let mut prev = view_rx.borrow().clone();
        while view_rx.changed().await.is_ok() {
            let view = view_rx.borrow_and_update().clone();
            render(&view, &prev);
            prev = view;
        }
    });

    let session_task = tokio::spawn(session.run());

    println!("Press Enter to start/stop recording (Ctrl-D to quit).");

    let events = handle.events.clone();
    let view = handle.view.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(_)) = lines.next_line().await {
        let pressed = view.borrow().control_pressed;
        let event = if pressed {
            SessionEvent::StopPressed
        } else {
            SessionEvent::StartPressed
        };
        if events.send(event).await.is_err() {
            break;
        }
    }

    // Drop every event sender so the session drains its queue and halts
    // capture on the way out.
    drop(events);
    drop(handle);
    bridge.abort();

    if let Err(e) = session_task.await {
        warn!("session task failed: {}", e);
    }

    Ok(())
}
