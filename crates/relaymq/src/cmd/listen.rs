use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use relaymq_client::{Client, ClientError};

use crate::cmd::ListenArgs;
use crate::exit::{client_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = Client::connect(&args.connect.host, args.connect.port)
        .map_err(|err| client_error("connect failed", err))?;

    if args.ack {
        client
            .request_ack()
            .map_err(|err| client_error("ack-mode request failed", err))?;
    }
    for destination in &args.destinations {
        client
            .subscribe(destination.clone())
            .map_err(|err| client_error("subscribe failed", err))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let socket = client
        .try_clone_stream()
        .map_err(|err| client_error("socket clone failed", err))?;
    install_ctrlc_handler(running.clone(), socket)?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let msg = match client.read_message() {
            Ok(msg) => msg,
            Err(ClientError::Frame(relaymq_frame::FrameError::ConnectionClosed)) => break,
            Err(err) => return Err(client_error("receive failed", err)),
        };

        print_message(&msg, format);
        printed = printed.saturating_add(1);

        if args.ack {
            if let Some(id) = msg.id {
                client
                    .ack(id)
                    .map_err(|err| client_error("ack failed", err))?;
            }
        }

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    Ok(SUCCESS)
}

// Flipping the flag alone is not enough: the loop spends almost all of
// its time blocked in a read that retries EINTR. Shutting the socket
// down makes that read surface ConnectionClosed, which the loop treats
// as a clean stop.
fn install_ctrlc_handler(running: Arc<AtomicBool>, socket: TcpStream) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = socket.shutdown(Shutdown::Both);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
