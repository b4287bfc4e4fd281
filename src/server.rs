use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::connection::Connection;
use crate::Error;

pub async fn run(port: u16) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address).await {
                error!("Connection error: {}", e);
            }
        });
    }
}

/// Drives one connection until the stream ends, a protocol error occurs, or a
/// write fails. Decode failures close the connection without a wire-level
/// error reply; only well-framed unrecognized commands are answered with one.
#[instrument(
    name = "connection",
    skip(stream),
    fields(connection_id, client_address)
)]
async fn handle_connection(stream: TcpStream, client_address: SocketAddr) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(frame) = conn.read_frame().await? {
        debug!("Received frame from client: {:?}", frame);
        let cmd = Command::try_from(frame)?;
        let res = cmd.exec()?;
        debug!("Sending response to client: {:?}", res);
        let res: Vec<u8> = res.into();

        conn.writer.write_all(&res).await?;
    }

    debug!("Connection closed");
    Ok(())
}
