use bytes::BytesMut;
use clap::Parser;
use log::trace;
use rtc_turn::client::*;
use sansio::Protocol;
use shared::error::{Error, Result};
use shared::{TransportContext, TransportMessage, TransportProtocol};
use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, UdpSocket};
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

// RUST_LOG=trace cargo run --package rtc-turn --example turn_client_udp -- --host 127.0.0.1 --user user=pass --debug

#[derive(Parser)]
#[command(name = "TURN Client UDP")]
#[command(version = "0.1.0")]
#[command(about = "Allocates a relay, permits a local pinger and echoes what it relays", long_about = None)]
struct Cli {
    #[arg(long, default_value_t = format!("127.0.0.1"))]
    host: String,
    #[arg(long, default_value_t = 3478)]
    port: u16,
    #[arg(long)]
    user: String,
    #[arg(long, default_value_t = format!("webrtc.rs"))]
    realm: String,

    #[arg(short, long)]
    debug: bool,
    #[arg(long, default_value_t = format!("INFO"))]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.debug {
        let log_level = log::LevelFilter::from_str(&cli.log_level).unwrap_or(log::LevelFilter::Info);
        env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}:{} [{}] {} - {}",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.level(),
                    chrono::Local::now().format("%H:%M:%S.%6f"),
                    record.args()
                )
            })
            .filter(None, log_level)
            .init();
    }

    let (username, password) = cli
        .user
        .split_once('=')
        .ok_or_else(|| Error::Other("--user must be user=pass".to_owned()))?;

    // TURN client won't create a local listening socket by itself.
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    let pinger = UdpSocket::bind("127.0.0.1:0")?;
    let local_addr = socket.local_addr()?;
    let peer_addr = pinger.local_addr()?;
    let mut pinger = Some(pinger);

    let turn_server_addr = format!("{}:{}", cli.host, cli.port);
    let mut client = Client::new(
        ClientConfig {
            stun_serv_addr: turn_server_addr.clone(),
            turn_serv_addr: turn_server_addr,
            local_addr,
            transport_protocol: TransportProtocol::UDP,
            username: username.to_owned(),
            password: password.to_owned(),
            realm: cli.realm,
            software: String::new(),
            rto: Duration::ZERO,
        },
        Instant::now(),
    )?;

    client.allocate()?;
    client.send_binding_request()?;
    let mut relayed_addr = None;

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    println!("Press Ctrl-C to stop");
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .map_err(|err| Error::Other(err.to_string()))?;

    let mut buf = vec![0u8; 2048];
    while stop_rx.try_recv().is_err() {
        while let Some(transmit) = client.poll_write() {
            socket.send_to(&transmit.message, transmit.transport.peer_addr)?;
            trace!(
                "socket.sent {} to {}",
                transmit.message.len(),
                transmit.transport.peer_addr
            );
        }

        while let Some(event) = client.poll_event() {
            match event {
                Event::TransactionTimeout(tid) => {
                    return Err(Error::Other(format!("transaction {tid} timed out")));
                }
                Event::BindingResponse(_, reflexive_addr) => {
                    println!("reflexive address {reflexive_addr}");
                }
                Event::BindingError(_, err) => return Err(err),
                Event::AllocateResponse(_, addr) => {
                    println!("relayed address {addr}");
                    relayed_addr = Some(addr);
                    client.relay(addr)?.create_permission(peer_addr)?;
                }
                Event::AllocateError(_, err) => return Err(err),
                Event::CreatePermissionResponse(_, addr) => {
                    println!("CreatePermission for peer addr {addr} is granted");
                    if let (Some(pinger), Some(relayed_addr)) = (pinger.take(), relayed_addr) {
                        do_ping_test(pinger, relayed_addr);
                    }
                }
                Event::CreatePermissionError(_, err) => return Err(err),
                Event::DataIndication(from, data) => {
                    println!("relay read: {:?} from {}", &data[..], from);
                    if let Some(relayed_addr) = relayed_addr {
                        client.relay(relayed_addr)?.send_to(&data[..], from)?;
                    }
                }
            }
        }

        let mut eto = Instant::now() + Duration::from_millis(100);
        if let Some(to) = client.poll_timeout()
            && to < eto
        {
            eto = to;
        }

        let delay_from_now = eto.saturating_duration_since(Instant::now());
        if delay_from_now.is_zero() {
            client.handle_timeout(Instant::now())?;
            continue;
        }

        socket.set_read_timeout(Some(delay_from_now))?;
        match socket.recv_from(&mut buf) {
            Ok((n, peer_addr)) => {
                trace!("read_socket_input {n} from {peer_addr}");
                client.handle_read(TransportMessage {
                    now: Instant::now(),
                    transport: TransportContext {
                        local_addr,
                        peer_addr,
                        transport_protocol: TransportProtocol::UDP,
                    },
                    message: BytesMut::from(&buf[..n]),
                })?;
            }
            // Expected error for set_read_timeout(). One for windows, one for the rest.
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(err) => return Err(err.into()),
        }

        client.handle_timeout(Instant::now())?;
    }

    client.close()?;
    while let Some(transmit) = client.poll_write() {
        socket.send_to(&transmit.message, transmit.transport.peer_addr)?;
    }

    Ok(())
}

fn do_ping_test(pinger: UdpSocket, relayed_addr: SocketAddr) {
    thread::spawn(move || {
        let mut buf = vec![0u8; 1500];
        for i in 0..10 {
            let msg = format!("ping {i}");
            println!("sending {msg} to {relayed_addr}");
            if pinger.send_to(msg.as_bytes(), relayed_addr).is_err() {
                break;
            }

            let Ok((n, from)) = pinger.recv_from(&mut buf) else {
                break;
            };
            println!(
                "pinger read-loop: {} from {from}",
                String::from_utf8_lossy(&buf[..n])
            );

            thread::sleep(Duration::from_secs(1));
        }
        println!("ping completed");
    });
}
