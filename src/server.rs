use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

pub async fn run(host: &str, port: u16, max_connections: usize) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((host, port)).await?;
    let store = Store::new();

    serve(listener, store, max_connections).await
}

/// Accept loop: one task per connection, admission bounded by a semaphore so
/// at most `max_connections` loops run at once. Further connection attempts
/// queue at accept time until a slot frees.
pub async fn serve(
    listener: TcpListener,
    store: Store,
    max_connections: usize,
) -> Result<(), Error> {
    let connection_permits = Arc::new(Semaphore::new(max_connections));

    info!("minidb server listening on {}", listener.local_addr()?);

    loop {
        let permit = connection_permits.clone().acquire_owned().await?;
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store).await {
                error!("connection aborted: {}", e);
            }
            drop(permit);
        });
    }
}

/// Per-connection loop: read a frame, dispatch it, write the response,
/// repeat. Exits silently on clean disconnect; a malformed frame or transport
/// failure aborts the connection with no further frames processed.
#[instrument(
    name = "connection",
    skip(stream, store),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(frame) = conn.read_frame().await? {
        debug!("Received frame from client: {:?}", frame);
        let response = dispatch(frame, &store);
        debug!("Sending response to client: {:?}", response);

        conn.write_frame(&response).await?;
    }

    info!("Connection closed");
    Ok(())
}

/// The dispatch boundary. A request that fails to parse, names an unknown
/// command, or whose handler fails is answered with an Error frame; none of
/// those terminate the connection. Only the transport layer can do that.
fn dispatch(frame: Frame, store: &Store) -> Frame {
    let command = match Command::try_from(frame) {
        Ok(command) => command,
        Err(err) => return Frame::Error(err.to_string()),
    };

    match command.exec(store.clone()) {
        Ok(response) => response,
        Err(err) => Frame::Error(format!("ERR {}", err)),
    }
}
